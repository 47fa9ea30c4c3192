//! Selector parsing.
//!
//! [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
//!
//! "The grammar of Selectors is defined in terms of CSS syntax."
//!
//! Parses the selector dialect into the model of the parent module:
//! type, universal, class, id and attribute selectors, pseudo-classes and
//! pseudo-elements, placeholder selectors (`%name`), the parent reference
//! (`&`), wrapped pseudo-selectors (`:not(...)`), the four combinators,
//! and comma-separated selector lists.

use std::iter::Peekable;
use std::str::Chars;

use super::{
    AttributeSelector, Combinator, ComplexMember, ComplexSelector, CompoundSelector, SelectorList,
    SimpleSelector,
};
use crate::error::CompileError;

/// Pseudo-selectors whose argument is itself a selector list.
const WRAPPED_PSEUDOS: &[&str] = &["not", "matches", "is", "where", "has"];

/// Pseudo-element names that may be written with a single colon.
/// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
/// "For legacy reasons, ::before, ::after, ::first-line and ::first-letter
/// can also be written with a single colon."
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// Check if a character can start an identifier.
/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Check if a character can continue an identifier.
/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

/// Parse a comma-separated selector list.
///
/// `line` is the source line the selector text starts on, used in error
/// messages. A selector preceded by a line break within the list gets its
/// `line_feed` formatting hint set.
pub fn parse_selector_list(input: &str, line: usize) -> Result<SelectorList, CompileError> {
    let mut members = Vec::new();

    for segment in split_on_commas(input) {
        let line_feed = segment
            .chars()
            .take_while(char::is_ascii_whitespace)
            .any(|c| c == '\n');
        let mut complex = parse_complex(segment.trim(), line)?;
        complex.line_feed = line_feed;
        members.push(complex);
    }

    if members.is_empty() {
        return Err(CompileError::Parse {
            line,
            message: "empty selector".to_string(),
        });
    }

    Ok(SelectorList::from_members(members))
}

/// Split selector text on top-level commas, respecting parentheses and
/// brackets (so `:not(.a, .b)` stays intact).
fn split_on_commas(input: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&input[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&input[start..]);
    segments
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors
/// separated by combinators."
fn parse_complex(input: &str, line: usize) -> Result<ComplexSelector, CompileError> {
    /// Flush the pending compound selector into the member sequence.
    fn flush_compound(
        compound: &mut Vec<SimpleSelector>,
        members: &mut Vec<ComplexMember>,
    ) -> bool {
        if compound.is_empty() {
            return false;
        }
        members.push(ComplexMember::Compound(CompoundSelector::from_simples(
            std::mem::take(compound),
        )));
        true
    }

    let error = |message: String| CompileError::Parse { line, message };

    if input.is_empty() {
        return Err(error("empty selector".to_string()));
    }

    let mut members: Vec<ComplexMember> = Vec::new();
    let mut compound: Vec<SimpleSelector> = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
            // "A descendant combinator is whitespace that separates two
            // compound selectors." Represented by adjacency: flush the
            // compound unless an explicit combinator follows.
            c if c.is_ascii_whitespace() => {
                while chars.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                match chars.peek() {
                    None | Some('>' | '+' | '~') => {}
                    Some(_) => {
                        let _ = flush_compound(&mut compound, &mut members);
                    }
                }
            }

            // [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
            '>' | '+' | '~' => {
                if !flush_compound(&mut compound, &mut members)
                    && !matches!(members.last(), Some(ComplexMember::Compound(_)))
                {
                    return Err(error(format!("combinator '{c}' without a left-hand side")));
                }
                let combinator = match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                };
                members.push(ComplexMember::Combinator(combinator));
                while chars.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
            }

            // [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
            '.' => {
                let name = consume_ident(&mut chars);
                if name.is_empty() {
                    return Err(error("expected identifier after '.'".to_string()));
                }
                compound.push(SimpleSelector::Class(name));
            }

            // [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
            '#' => {
                let name = consume_ident(&mut chars);
                if name.is_empty() {
                    return Err(error("expected identifier after '#'".to_string()));
                }
                compound.push(SimpleSelector::Id(name));
            }

            // Placeholder selector: usable only as an @extend target.
            '%' => {
                let name = consume_ident(&mut chars);
                if name.is_empty() {
                    return Err(error("expected identifier after '%'".to_string()));
                }
                compound.push(SimpleSelector::Placeholder(name));
            }

            // Parent reference, resolved during evaluation.
            '&' => compound.push(SimpleSelector::Parent),

            // [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
            '*' => compound.push(SimpleSelector::Universal),

            // [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
            // [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
            ':' => {
                let is_element = chars.peek() == Some(&':');
                if is_element {
                    let _ = chars.next();
                }

                let name = consume_ident(&mut chars);
                if name.is_empty() {
                    return Err(error("expected identifier after ':'".to_string()));
                }

                let argument = if chars.peek() == Some(&'(') {
                    let _ = chars.next();
                    Some(consume_balanced(&mut chars).ok_or_else(|| {
                        error(format!("unbalanced parentheses in ':{name}(...)'"))
                    })?)
                } else {
                    None
                };

                let lower = name.to_ascii_lowercase();
                if is_element {
                    compound.push(SimpleSelector::PseudoElement(name));
                } else if let Some(argument) = argument {
                    if WRAPPED_PSEUDOS.contains(&lower.as_str()) {
                        let selectors = parse_selector_list(&argument, line)?;
                        compound.push(SimpleSelector::Wrapped { name, selectors });
                    } else {
                        compound.push(SimpleSelector::PseudoClass {
                            name,
                            argument: Some(argument),
                        });
                    }
                } else if LEGACY_PSEUDO_ELEMENTS.contains(&lower.as_str()) {
                    compound.push(SimpleSelector::PseudoElement(name));
                } else {
                    compound.push(SimpleSelector::PseudoClass {
                        name,
                        argument: None,
                    });
                }
            }

            // [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
            '[' => {
                compound.push(SimpleSelector::Attribute(parse_attribute(
                    &mut chars, line,
                )?));
            }

            // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
            c if is_ident_start_char(c) || c == '-' => {
                let mut name = String::new();
                name.push(c);
                name.push_str(&consume_ident(&mut chars));
                compound.push(SimpleSelector::Type(name));
            }

            _ => return Err(error(format!("unexpected character '{c}' in selector"))),
        }
    }

    let _ = flush_compound(&mut compound, &mut members);

    match members.last() {
        None => Err(error("empty selector".to_string())),
        Some(ComplexMember::Combinator(_)) => {
            Err(error("selector ends with a combinator".to_string()))
        }
        Some(ComplexMember::Compound(_)) => Ok(ComplexSelector::from_members(members)),
    }
}

/// Consume an identifier from the stream.
fn consume_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if is_ident_char(c) {
            ident.push(c);
            let _ = chars.next();
        } else {
            break;
        }
    }
    ident
}

/// Consume the contents of a parenthesized group, assuming the opening
/// parenthesis has been consumed. Returns `None` on unbalanced input.
fn consume_balanced(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut contents = String::new();
    let mut depth = 1u32;
    for c in chars.by_ref() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(contents);
                }
            }
            _ => {}
        }
        contents.push(c);
    }
    None
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// Parse an attribute selector, assuming the opening `[` has been
/// consumed.
fn parse_attribute(
    chars: &mut Peekable<Chars<'_>>,
    line: usize,
) -> Result<AttributeSelector, CompileError> {
    let error = |message: String| CompileError::Parse { line, message };

    skip_whitespace(chars);
    let name = consume_ident(chars);
    if name.is_empty() {
        return Err(error("expected attribute name after '['".to_string()));
    }
    skip_whitespace(chars);

    match chars.next() {
        Some(']') => Ok(AttributeSelector::Exists(name)),
        Some('=') => {
            let value = parse_attr_value(chars)
                .ok_or_else(|| error(format!("expected value in '[{name}=...]'")))?;
            expect_close_bracket(chars, line)?;
            Ok(AttributeSelector::Equals(name, value))
        }
        Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
            if chars.next() != Some('=') {
                return Err(error(format!("expected '=' after '{op}' in '[{name}...]'")));
            }
            let value = parse_attr_value(chars)
                .ok_or_else(|| error(format!("expected value in '[{name}{op}=...]'")))?;
            expect_close_bracket(chars, line)?;
            Ok(match op {
                '~' => AttributeSelector::Includes(name, value),
                '|' => AttributeSelector::DashMatch(name, value),
                '^' => AttributeSelector::PrefixMatch(name, value),
                '$' => AttributeSelector::SuffixMatch(name, value),
                _ => AttributeSelector::SubstringMatch(name, value),
            })
        }
        _ => Err(error(format!("malformed attribute selector '[{name}...'"))),
    }
}

/// Parse an attribute value inside `[attr=value]`.
/// Handles both quoted (`"val"`, `'val'`) and unquoted ident values.
fn parse_attr_value(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    skip_whitespace(chars);

    match chars.peek() {
        Some(&q @ ('"' | '\'')) => {
            let _ = chars.next();
            let mut value = String::new();
            for c in chars.by_ref() {
                if c == q {
                    return Some(value);
                }
                value.push(c);
            }
            None // unterminated string
        }
        Some(_) => {
            let mut value = String::new();
            while chars
                .peek()
                .is_some_and(|&c| is_ident_char(c) || c == '.')
            {
                value.push(c_next(chars));
            }
            if value.is_empty() { None } else { Some(value) }
        }
        None => None,
    }
}

/// Advance the stream; the caller has peeked the next character.
fn c_next(chars: &mut Peekable<Chars<'_>>) -> char {
    chars.next().unwrap_or('\0')
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
        let _ = chars.next();
    }
}

fn expect_close_bracket(chars: &mut Peekable<Chars<'_>>, line: usize) -> Result<(), CompileError> {
    skip_whitespace(chars);
    if chars.next() == Some(']') {
        Ok(())
    } else {
        Err(CompileError::Parse {
            line,
            message: "expected ']' to close attribute selector".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound() {
        let list = parse_selector_list("div.highlight#main", 1).unwrap();
        assert_eq!(list.members.len(), 1);
        assert_eq!(list.to_string(), "div.highlight#main");
    }

    #[test]
    fn test_parse_combinators() {
        let list = parse_selector_list("div.container > ul.nav li a.active", 1).unwrap();
        assert_eq!(list.to_string(), "div.container > ul.nav li a.active");

        let compact = parse_selector_list("div>p", 1).unwrap();
        assert_eq!(compact.to_string(), "div > p");
    }

    #[test]
    fn test_parse_list() {
        let list = parse_selector_list(".a, .b.c, #d", 1).unwrap();
        assert_eq!(list.members.len(), 3);
        assert_eq!(list.to_string(), ".a, .b.c, #d");
    }

    #[test]
    fn test_parse_placeholder_and_parent() {
        let list = parse_selector_list("%base", 1).unwrap();
        assert_eq!(list.to_string(), "%base");
        assert!(list.members[0].has_placeholder());

        let parent = parse_selector_list("&:hover", 1).unwrap();
        assert_eq!(parent.to_string(), "&:hover");
        assert!(parent.members[0].has_parent_ref());
    }

    #[test]
    fn test_parse_wrapped_pseudo() {
        let list = parse_selector_list(":not(.a, .b)", 1).unwrap();
        assert_eq!(list.to_string(), ":not(.a, .b)");

        // Non-wrapped functional pseudo-classes keep a raw argument.
        let nth = parse_selector_list(":nth-child(2n+1)", 1).unwrap();
        assert_eq!(nth.to_string(), ":nth-child(2n+1)");
    }

    #[test]
    fn test_parse_pseudo_elements() {
        let list = parse_selector_list("p::first-line", 1).unwrap();
        assert_eq!(list.to_string(), "p::first-line");

        // Legacy single-colon spellings normalize to pseudo-elements.
        let legacy = parse_selector_list("p:before", 1).unwrap();
        assert_eq!(legacy.to_string(), "p::before");
    }

    #[test]
    fn test_parse_attributes() {
        for (input, output) in [
            ("[href]", "[href]"),
            ("[type=text]", "[type=text]"),
            ("[type=\"text\"]", "[type=text]"),
            ("[class~=active]", "[class~=active]"),
            ("[lang|=en]", "[lang|=en]"),
            ("[href^=https]", "[href^=https]"),
            ("[src$=\".png\"]", "[src$=.png]"),
            ("[data-theme*=dark]", "[data-theme*=dark]"),
        ] {
            let list = parse_selector_list(input, 1).unwrap();
            assert_eq!(list.to_string(), output, "for {input}");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_selector_list("", 1).is_err());
        assert!(parse_selector_list("> div", 1).is_err());
        assert!(parse_selector_list(".a >", 1).is_err());
        assert!(parse_selector_list(".a { b", 1).is_err());
        assert!(parse_selector_list(":not(.a", 1).is_err());
    }

    #[test]
    fn test_line_feed_hint() {
        let list = parse_selector_list(".a,\n.b", 1).unwrap();
        assert!(!list.members[0].line_feed);
        assert!(list.members[1].line_feed);
    }
}
