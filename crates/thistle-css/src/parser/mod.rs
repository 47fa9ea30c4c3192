//! Stylesheet parser.
//!
//! A recursive-descent parser for the SCSS dialect: rulesets with nested
//! rulesets, declarations, `@extend` statements, `@media` and `@supports`
//! blocks, passthrough at-rules, and comments. Selector text is handed to
//! [`crate::selector::parse`]; declaration values are preserved verbatim
//! (expression evaluation is outside this compiler's scope).

use thistle_common::warning::warn_once;

use crate::error::CompileError;
use crate::selector::{parse_selector_list, SelectorList};

/// A parsed stylesheet: the root of the rule tree.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Top-level items in source order.
    pub items: Vec<Item>,
}

/// A top-level (or media-level) item.
#[derive(Debug, Clone)]
pub enum Item {
    /// A ruleset.
    Ruleset(Ruleset),
    /// An `@media` block.
    Media(MediaBlock),
    /// An `@supports` block.
    Supports(SupportsBlock),
    /// Any other at-rule, passed through verbatim (`@charset`,
    /// `@import`, ...).
    AtRule {
        /// The at-keyword, without the `@`.
        name: String,
        /// The prelude text, trimmed.
        prelude: String,
    },
    /// A preserved `/* ... */` comment.
    Comment(String),
}

/// An `@media` block.
#[derive(Debug, Clone)]
pub struct MediaBlock {
    /// The media query text, trimmed.
    pub query: String,
    /// The contained items.
    pub items: Vec<Item>,
    /// 1-based source line of the `@media`.
    pub line: usize,
}

/// An `@supports` block.
#[derive(Debug, Clone)]
pub struct SupportsBlock {
    /// The support condition text, trimmed.
    pub condition: String,
    /// The contained items.
    pub items: Vec<Item>,
    /// 1-based source line of the `@supports`.
    pub line: usize,
}

/// A ruleset: a selector list and a block of rule items.
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// The selector list.
    pub selectors: SelectorList,
    /// The block contents in source order. After evaluation only
    /// declarations and comments remain.
    pub body: Vec<RuleItem>,
    /// 1-based source line of the selector.
    pub line: usize,
}

/// One item inside a ruleset block.
#[derive(Debug, Clone)]
pub enum RuleItem {
    /// A declaration.
    Declaration(Declaration),
    /// An `@extend` statement.
    Extend {
        /// The extend targets; each member must be a compound selector.
        selectors: SelectorList,
        /// Whether the statement carried `!optional`.
        optional: bool,
        /// 1-based source line of the `@extend`.
        line: usize,
    },
    /// A nested ruleset.
    Ruleset(Ruleset),
    /// A nested `@media` block; its body applies to the enclosing rule's
    /// selector and is bubbled to the top level during evaluation.
    Media {
        /// The media query text, trimmed.
        query: String,
        /// The nested block contents.
        body: Vec<RuleItem>,
        /// 1-based source line of the `@media`.
        line: usize,
    },
    /// A preserved `/* ... */` comment.
    Comment(String),
}

/// A CSS declaration (e.g. `color: red`). The value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The property value, trimmed, without any `!important`.
    pub value: String,
    /// Whether the declaration has `!important`.
    pub important: bool,
    /// 1-based source line.
    pub line: usize,
}

/// Parse a stylesheet.
pub fn parse(source: &str) -> Result<Stylesheet, CompileError> {
    let mut parser = Parser::new(source);
    let items = parser.parse_items(true)?;
    Ok(Stylesheet { items })
}

/// What terminated a statement-text scan.
enum Stop {
    Semicolon,
    OpenBrace,
    CloseBrace,
    Eof,
}

struct Parser {
    chars: Vec<char>,
    position: usize,
    line: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    /// Skip whitespace and `//` line comments; stop at anything else.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    let _ = self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        let _ = self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Consume a `/* ... */` comment, returning its full text.
    fn consume_block_comment(&mut self) -> Result<String, CompileError> {
        let start_line = self.line;
        let mut text = String::from("/*");
        let _ = self.advance(); // '/'
        let _ = self.advance(); // '*'
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    let _ = self.advance();
                    text.push_str("*/");
                    return Ok(text);
                }
                Some(c) => text.push(c),
                None => {
                    return Err(CompileError::Parse {
                        line: start_line,
                        message: "unterminated comment".to_string(),
                    });
                }
            }
        }
    }

    /// Consume an identifier.
    fn consume_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                ident.push(c);
                let _ = self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Scan statement text up to an unnested `;`, `{` or `}`, respecting
    /// quotes, parentheses and brackets. The terminator is not consumed.
    fn scan_statement_text(&mut self) -> (String, Stop) {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return (text, Stop::Eof),
                Some(';') if depth == 0 => return (text, Stop::Semicolon),
                Some('{') if depth == 0 => return (text, Stop::OpenBrace),
                Some('}') if depth == 0 => return (text, Stop::CloseBrace),
                Some(q @ ('"' | '\'')) => {
                    text.push(q);
                    let _ = self.advance();
                    while let Some(c) = self.advance() {
                        text.push(c);
                        if c == q {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        let _ = self.advance();
                    }
                }
                Some(c) => {
                    match c {
                        '(' | '[' => depth += 1,
                        ')' | ']' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    text.push(c);
                    let _ = self.advance();
                }
            }
        }
    }

    /// Skip a balanced `{ ... }` block, assuming the `{` has not yet been
    /// consumed.
    fn skip_block(&mut self) -> Result<(), CompileError> {
        let start_line = self.line;
        let _ = self.advance(); // '{'
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(CompileError::Parse {
                        line: start_line,
                        message: "unterminated block".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse a list of items until `}` (or end of input at the top
    /// level).
    fn parse_items(&mut self, top_level: bool) -> Result<Vec<Item>, CompileError> {
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    if top_level {
                        return Ok(items);
                    }
                    return Err(self.error("unexpected end of input, expected '}'"));
                }
                Some('}') => {
                    if top_level {
                        return Err(self.error("unexpected '}'"));
                    }
                    let _ = self.advance();
                    return Ok(items);
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    items.push(Item::Comment(self.consume_block_comment()?));
                }
                Some('@') => {
                    let _ = self.advance();
                    let line = self.line;
                    let name = self.consume_ident();
                    match name.as_str() {
                        "media" | "supports" => {
                            let (prelude, stop) = self.scan_statement_text();
                            if !matches!(stop, Stop::OpenBrace) {
                                return Err(self.error(format!("expected '{{' after @{name}")));
                            }
                            let _ = self.advance(); // '{'
                            let inner = self.parse_items(false)?;
                            if name == "media" {
                                items.push(Item::Media(MediaBlock {
                                    query: prelude.trim().to_string(),
                                    items: inner,
                                    line,
                                }));
                            } else {
                                items.push(Item::Supports(SupportsBlock {
                                    condition: prelude.trim().to_string(),
                                    items: inner,
                                    line,
                                }));
                            }
                        }
                        _ => {
                            let (prelude, stop) = self.scan_statement_text();
                            match stop {
                                Stop::Semicolon => {
                                    let _ = self.advance();
                                    items.push(Item::AtRule {
                                        name,
                                        prelude: prelude.trim().to_string(),
                                    });
                                }
                                Stop::OpenBrace => {
                                    warn_once(
                                        "parser",
                                        &format!("skipping unsupported at-rule '@{name}'"),
                                    );
                                    self.skip_block()?;
                                }
                                Stop::CloseBrace | Stop::Eof => {
                                    items.push(Item::AtRule {
                                        name,
                                        prelude: prelude.trim().to_string(),
                                    });
                                }
                            }
                        }
                    }
                }
                Some(_) => {
                    let line = self.line;
                    let (text, stop) = self.scan_statement_text();
                    match stop {
                        Stop::OpenBrace => {
                            let selectors = parse_selector_list(&text, line)?;
                            let _ = self.advance(); // '{'
                            let body = self.parse_rule_body()?;
                            items.push(Item::Ruleset(Ruleset {
                                selectors,
                                body,
                                line,
                            }));
                        }
                        _ => {
                            return Err(CompileError::Parse {
                                line,
                                message: format!(
                                    "expected a rule, found '{}'",
                                    text.trim()
                                ),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Parse the contents of a ruleset block, consuming the closing `}`.
    fn parse_rule_body(&mut self) -> Result<Vec<RuleItem>, CompileError> {
        let mut body = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.error("unexpected end of input, expected '}'")),
                Some('}') => {
                    let _ = self.advance();
                    return Ok(body);
                }
                Some(';') => {
                    let _ = self.advance();
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    body.push(RuleItem::Comment(self.consume_block_comment()?));
                }
                Some('@') => {
                    let _ = self.advance();
                    let line = self.line;
                    let name = self.consume_ident();
                    match name.as_str() {
                        "extend" => {
                            let (text, stop) = self.scan_statement_text();
                            if matches!(stop, Stop::OpenBrace) {
                                return Err(self.error("expected ';' after @extend"));
                            }
                            if matches!(stop, Stop::Semicolon) {
                                let _ = self.advance();
                            }
                            let mut target = text.trim();
                            let optional = target.ends_with("!optional");
                            if optional {
                                target =
                                    target[..target.len() - "!optional".len()].trim_end();
                            }
                            let selectors = parse_selector_list(target, line)?;
                            body.push(RuleItem::Extend {
                                selectors,
                                optional,
                                line,
                            });
                        }
                        "media" => {
                            let (prelude, stop) = self.scan_statement_text();
                            if !matches!(stop, Stop::OpenBrace) {
                                return Err(self.error("expected '{' after @media"));
                            }
                            let _ = self.advance(); // '{'
                            let inner = self.parse_rule_body()?;
                            body.push(RuleItem::Media {
                                query: prelude.trim().to_string(),
                                body: inner,
                                line,
                            });
                        }
                        _ => {
                            let (_, stop) = self.scan_statement_text();
                            match stop {
                                Stop::Semicolon => {
                                    let _ = self.advance();
                                    warn_once(
                                        "parser",
                                        &format!("ignoring '@{name}' inside a rule"),
                                    );
                                }
                                Stop::OpenBrace => {
                                    warn_once(
                                        "parser",
                                        &format!("skipping unsupported at-rule '@{name}'"),
                                    );
                                    self.skip_block()?;
                                }
                                Stop::CloseBrace | Stop::Eof => {
                                    return Err(self.error(format!(
                                        "expected ';' after '@{name}'"
                                    )));
                                }
                            }
                        }
                    }
                }
                Some(_) => {
                    let line = self.line;
                    let (text, stop) = self.scan_statement_text();
                    match stop {
                        Stop::OpenBrace => {
                            // A nested ruleset: the scanned text is its
                            // selector.
                            let selectors = parse_selector_list(&text, line)?;
                            let _ = self.advance(); // '{'
                            let inner = self.parse_rule_body()?;
                            body.push(RuleItem::Ruleset(Ruleset {
                                selectors,
                                body: inner,
                                line,
                            }));
                        }
                        Stop::Semicolon | Stop::CloseBrace => {
                            if matches!(stop, Stop::Semicolon) {
                                let _ = self.advance();
                            }
                            if !text.trim().is_empty() {
                                body.push(RuleItem::Declaration(parse_declaration(
                                    &text, line,
                                )?));
                            }
                        }
                        Stop::Eof => {
                            return Err(self.error("unexpected end of input, expected '}'"));
                        }
                    }
                }
            }
        }
    }
}

/// Split `name: value` at the first colon.
fn parse_declaration(text: &str, line: usize) -> Result<Declaration, CompileError> {
    let Some(colon) = text.find(':') else {
        return Err(CompileError::Parse {
            line,
            message: format!("expected ':' in declaration '{}'", text.trim()),
        });
    };
    let name = text[..colon].trim();
    if name.is_empty() {
        return Err(CompileError::Parse {
            line,
            message: "declaration with empty property name".to_string(),
        });
    }

    let mut value = text[colon + 1..].trim();
    let important = value.ends_with("!important");
    if important {
        value = value[..value.len() - "!important".len()].trim_end();
    }

    Ok(Declaration {
        name: name.to_string(),
        value: value.to_string(),
        important,
        line,
    })
}
