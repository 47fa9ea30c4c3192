//! CSS emission.
//!
//! Three output styles, selected on the command line:
//!
//! - `nested` (default): declarations indented, closing brace on the last
//!   declaration's line, rules inside `@media` indented one level;
//! - `expanded`: every declaration and brace on its own line;
//! - `echo`: pretty-prints the parsed (pre-evaluation) tree, for
//!   inspecting the parser.

use std::fmt::Write;

use strum_macros::Display;

use crate::parser::{Declaration, Item, Ruleset, RuleItem, Stylesheet};

/// The output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum OutputStyle {
    /// Sass's nested style.
    #[default]
    #[strum(serialize = "nested")]
    Nested,
    /// One declaration per line, braces on their own lines.
    #[strum(serialize = "expanded")]
    Expanded,
    /// Echo the parse tree.
    #[strum(serialize = "echo")]
    Echo,
}

impl OutputStyle {
    /// Parse a style name as written on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nested" => Some(Self::Nested),
            "expanded" => Some(Self::Expanded),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }
}

/// Emit a flattened stylesheet as CSS.
#[must_use]
pub fn emit(stylesheet: &Stylesheet, style: OutputStyle) -> String {
    let mut out = String::new();
    emit_items(&mut out, &stylesheet.items, style, 0);
    out
}

fn emit_items(out: &mut String, items: &[Item], style: OutputStyle, indent: usize) {
    for item in items {
        match item {
            Item::Ruleset(ruleset) => emit_ruleset(out, ruleset, style, indent),
            Item::Media(media) => {
                emit_block(out, &format!("@media {}", media.query), &media.items, style, indent);
            }
            Item::Supports(supports) => {
                emit_block(
                    out,
                    &format!("@supports {}", supports.condition),
                    &supports.items,
                    style,
                    indent,
                );
            }
            Item::AtRule { name, prelude } => {
                pad(out, indent);
                if prelude.is_empty() {
                    let _ = writeln!(out, "@{name};");
                } else {
                    let _ = writeln!(out, "@{name} {prelude};");
                }
                blank_line(out, indent);
            }
            Item::Comment(text) => {
                pad(out, indent);
                let _ = writeln!(out, "{text}");
                blank_line(out, indent);
            }
        }
    }
}

/// Emit a `@media`/`@supports` shell around nested items.
fn emit_block(out: &mut String, header: &str, items: &[Item], style: OutputStyle, indent: usize) {
    if items_are_empty(items) {
        return;
    }

    pad(out, indent);
    let _ = writeln!(out, "{header} {{");
    let mut inner = String::new();
    emit_items(&mut inner, items, style, indent + 1);
    // Drop the inner trailing blank line before closing.
    let inner = inner.trim_end_matches('\n');
    out.push_str(inner);
    match style {
        OutputStyle::Nested => {
            let _ = writeln!(out, " }}");
        }
        _ => {
            let _ = writeln!(out);
            pad(out, indent);
            let _ = writeln!(out, "}}");
        }
    }
    blank_line(out, indent);
}

/// Whether a block would produce no output at all.
fn items_are_empty(items: &[Item]) -> bool {
    items.iter().all(|item| match item {
        Item::Ruleset(ruleset) => !ruleset
            .body
            .iter()
            .any(|i| matches!(i, RuleItem::Declaration(_))),
        Item::Media(media) => items_are_empty(&media.items),
        Item::Supports(supports) => items_are_empty(&supports.items),
        Item::AtRule { .. } | Item::Comment(_) => false,
    })
}

fn emit_ruleset(out: &mut String, ruleset: &Ruleset, style: OutputStyle, indent: usize) {
    let declarations: Vec<&RuleItem> = ruleset
        .body
        .iter()
        .filter(|item| matches!(item, RuleItem::Declaration(_) | RuleItem::Comment(_)))
        .collect();
    // A ruleset with no declarations produces no output.
    if !declarations
        .iter()
        .any(|item| matches!(item, RuleItem::Declaration(_)))
    {
        return;
    }

    pad(out, indent);
    let _ = writeln!(out, "{} {{", ruleset.selectors);

    for (index, item) in declarations.iter().enumerate() {
        let last = index + 1 == declarations.len();
        pad(out, indent + 1);
        match item {
            RuleItem::Declaration(declaration) => {
                let _ = write!(out, "{}", declaration_text(declaration));
            }
            RuleItem::Comment(text) => {
                let _ = write!(out, "{text}");
            }
            _ => {}
        }
        if last && style == OutputStyle::Nested {
            let _ = writeln!(out, " }}");
        } else {
            let _ = writeln!(out);
        }
    }

    if style != OutputStyle::Nested {
        pad(out, indent);
        let _ = writeln!(out, "}}");
    }
    blank_line(out, indent);
}

fn declaration_text(declaration: &Declaration) -> String {
    if declaration.important {
        format!("{}: {} !important;", declaration.name, declaration.value)
    } else {
        format!("{}: {};", declaration.name, declaration.value)
    }
}

/// Pretty-print the parsed tree, before evaluation.
#[must_use]
pub fn echo(stylesheet: &Stylesheet) -> String {
    let mut out = String::new();
    for item in &stylesheet.items {
        echo_item(&mut out, item, 0);
    }
    out
}

fn echo_item(out: &mut String, item: &Item, indent: usize) {
    match item {
        Item::Ruleset(ruleset) => echo_ruleset(out, ruleset, indent),
        Item::Media(media) => {
            pad(out, indent);
            let _ = writeln!(out, "@media {} {{", media.query);
            for inner in &media.items {
                echo_item(out, inner, indent + 1);
            }
            pad(out, indent);
            let _ = writeln!(out, "}}");
        }
        Item::Supports(supports) => {
            pad(out, indent);
            let _ = writeln!(out, "@supports {} {{", supports.condition);
            for inner in &supports.items {
                echo_item(out, inner, indent + 1);
            }
            pad(out, indent);
            let _ = writeln!(out, "}}");
        }
        Item::AtRule { name, prelude } => {
            pad(out, indent);
            if prelude.is_empty() {
                let _ = writeln!(out, "@{name};");
            } else {
                let _ = writeln!(out, "@{name} {prelude};");
            }
        }
        Item::Comment(text) => {
            pad(out, indent);
            let _ = writeln!(out, "{text}");
        }
    }
}

fn echo_ruleset(out: &mut String, ruleset: &Ruleset, indent: usize) {
    pad(out, indent);
    let _ = writeln!(out, "{} {{", ruleset.selectors);
    for item in &ruleset.body {
        match item {
            RuleItem::Declaration(declaration) => {
                pad(out, indent + 1);
                let _ = writeln!(out, "{}", declaration_text(declaration));
            }
            RuleItem::Extend {
                selectors, optional, ..
            } => {
                pad(out, indent + 1);
                if *optional {
                    let _ = writeln!(out, "@extend {selectors} !optional;");
                } else {
                    let _ = writeln!(out, "@extend {selectors};");
                }
            }
            RuleItem::Ruleset(nested) => echo_ruleset(out, nested, indent + 1),
            RuleItem::Media { query, body, .. } => {
                pad(out, indent + 1);
                let _ = writeln!(out, "@media {query} {{");
                for inner in body {
                    match inner {
                        RuleItem::Declaration(declaration) => {
                            pad(out, indent + 2);
                            let _ = writeln!(out, "{}", declaration_text(declaration));
                        }
                        RuleItem::Ruleset(nested) => echo_ruleset(out, nested, indent + 2),
                        _ => {}
                    }
                }
                pad(out, indent + 1);
                let _ = writeln!(out, "}}");
            }
            RuleItem::Comment(text) => {
                pad(out, indent + 1);
                let _ = writeln!(out, "{text}");
            }
        }
    }
    pad(out, indent);
    let _ = writeln!(out, "}}");
}

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

/// Separate top-level items with a blank line; nested items stay packed.
fn blank_line(out: &mut String, indent: usize) {
    if indent == 0 {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn flatten(source: &str) -> Stylesheet {
        let sheet = parse(source).unwrap();
        let (flat, _) = crate::eval::evaluate(&sheet).unwrap();
        flat
    }

    #[test]
    fn test_emit_nested() {
        let flat = flatten(".a { color: red; margin: 0; }");
        assert_eq!(
            emit(&flat, OutputStyle::Nested),
            ".a {\n  color: red;\n  margin: 0; }\n\n"
        );
    }

    #[test]
    fn test_emit_expanded() {
        let flat = flatten(".a { color: red; }");
        assert_eq!(
            emit(&flat, OutputStyle::Expanded),
            ".a {\n  color: red;\n}\n\n"
        );
    }

    #[test]
    fn test_emit_media_nested() {
        let flat = flatten("@media screen { .a { color: red; } }");
        assert_eq!(
            emit(&flat, OutputStyle::Nested),
            "@media screen {\n  .a {\n    color: red; } }\n\n"
        );
    }

    #[test]
    fn test_empty_ruleset_produces_nothing() {
        let flat = flatten(".a { }");
        assert_eq!(emit(&flat, OutputStyle::Nested), "");
    }

    #[test]
    fn test_important_round_trips() {
        let flat = flatten(".a { color: red !important; }");
        assert!(emit(&flat, OutputStyle::Nested).contains("color: red !important;"));
    }

    #[test]
    fn test_echo_round_trips_structure() {
        let sheet = parse(".a {\n  color: red;\n  .b { @extend .c; }\n}").unwrap();
        let text = echo(&sheet);
        assert_eq!(
            text,
            ".a {\n  color: red;\n  .b {\n    @extend .c;\n  }\n}\n"
        );
    }
}
