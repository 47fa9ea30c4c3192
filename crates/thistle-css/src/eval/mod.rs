//! Nesting evaluation.
//!
//! Flattens the parsed rule tree into the flat form the extension engine
//! walks: nested rulesets are resolved against their parents' selector
//! lists (splicing parent references where present), nested `@media`
//! blocks bubble to the top level under the enclosing rule's selector,
//! and every `@extend` statement is registered in the extension subset
//! map along with its media context.

use crate::error::CompileError;
use crate::extend::{Extension, ExtensionSubsetMap};
use crate::parser::{Item, MediaBlock, Ruleset, RuleItem, Stylesheet, SupportsBlock};
use crate::selector::{ComplexMember, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};

/// Evaluate a parsed stylesheet: returns the flattened tree and the
/// populated subset map.
pub fn evaluate(
    stylesheet: &Stylesheet,
) -> Result<(Stylesheet, ExtensionSubsetMap), CompileError> {
    let mut subset_map = ExtensionSubsetMap::new();
    let items = evaluate_items(&stylesheet.items, None, &mut subset_map)?;
    Ok((Stylesheet { items }, subset_map))
}

fn evaluate_items(
    items: &[Item],
    media_query: Option<&str>,
    subset_map: &mut ExtensionSubsetMap,
) -> Result<Vec<Item>, CompileError> {
    let mut out = Vec::new();

    for item in items {
        match item {
            Item::Ruleset(ruleset) => {
                flatten_ruleset(ruleset, None, media_query, subset_map, &mut out)?;
            }
            Item::Media(media) => {
                let combined = combine_queries(media_query, &media.query);
                let inner = evaluate_items(&media.items, Some(&combined), subset_map)?;
                out.push(Item::Media(MediaBlock {
                    query: combined,
                    items: inner,
                    line: media.line,
                }));
            }
            Item::Supports(supports) => {
                let inner = evaluate_items(&supports.items, media_query, subset_map)?;
                out.push(Item::Supports(SupportsBlock {
                    condition: supports.condition.clone(),
                    items: inner,
                    line: supports.line,
                }));
            }
            Item::AtRule { name, prelude } => out.push(Item::AtRule {
                name: name.clone(),
                prelude: prelude.clone(),
            }),
            Item::Comment(text) => out.push(Item::Comment(text.clone())),
        }
    }

    Ok(out)
}

/// Flatten one ruleset: resolve its selector list, register its
/// `@extend`s, emit its declarations, then recurse into nested rulesets
/// and bubble nested media blocks.
fn flatten_ruleset(
    ruleset: &Ruleset,
    parent: Option<&SelectorList>,
    media_query: Option<&str>,
    subset_map: &mut ExtensionSubsetMap,
    out: &mut Vec<Item>,
) -> Result<(), CompileError> {
    let resolved = resolve_selectors(&ruleset.selectors, parent, ruleset.line)?;

    let mut flat_body: Vec<RuleItem> = Vec::new();
    let mut nested_rules: Vec<&Ruleset> = Vec::new();
    let mut nested_media: Vec<(&str, &Vec<RuleItem>, usize)> = Vec::new();

    for item in &ruleset.body {
        match item {
            RuleItem::Declaration(declaration) => {
                flat_body.push(RuleItem::Declaration(declaration.clone()));
            }
            RuleItem::Comment(text) => flat_body.push(RuleItem::Comment(text.clone())),
            RuleItem::Extend {
                selectors,
                optional,
                line,
            } => {
                register_extends(&resolved, selectors, *optional, media_query, *line, subset_map)?;
            }
            RuleItem::Ruleset(nested) => nested_rules.push(nested),
            RuleItem::Media { query, body, line } => {
                nested_media.push((query.as_str(), body, *line));
            }
        }
    }

    out.push(Item::Ruleset(Ruleset {
        selectors: resolved.clone(),
        body: flat_body,
        line: ruleset.line,
    }));

    for nested in nested_rules {
        flatten_ruleset(nested, Some(&resolved), media_query, subset_map, out)?;
    }

    // Nested media bubbles to the top level: its body applies to the
    // enclosing rule's selector inside the (combined) query.
    for (query, body, line) in nested_media {
        let combined = combine_queries(media_query, query);
        let synthetic = Ruleset {
            selectors: ruleset.selectors.clone(),
            body: body.clone(),
            line,
        };
        let mut inner = Vec::new();
        flatten_ruleset(&synthetic, parent, Some(&combined), subset_map, &mut inner)?;
        out.push(Item::Media(MediaBlock {
            query: combined,
            items: inner,
            line,
        }));
    }

    Ok(())
}

/// Register one `@extend` statement: one entry per (resolved complex
/// selector of the enclosing rule) x (compound target). Each target must
/// be a single compound selector.
fn register_extends(
    resolved: &SelectorList,
    targets: &SelectorList,
    optional: bool,
    media_query: Option<&str>,
    line: usize,
    subset_map: &mut ExtensionSubsetMap,
) -> Result<(), CompileError> {
    for target in &targets.members {
        let compound = match (target.members.len(), target.members.first()) {
            (1, Some(ComplexMember::Compound(compound))) => compound,
            _ => {
                return Err(CompileError::InvalidExtendTarget {
                    target: target.to_string(),
                    line,
                });
            }
        };
        for extender in &resolved.members {
            subset_map.insert(Extension::new(
                extender.clone(),
                compound.clone(),
                optional,
                media_query.map(str::to_string),
                line,
            ));
        }
    }
    Ok(())
}

/// Resolve a selector list against the enclosing rule's resolved list:
/// the Cartesian product of parent and child members.
fn resolve_selectors(
    selectors: &SelectorList,
    parent: Option<&SelectorList>,
    line: usize,
) -> Result<SelectorList, CompileError> {
    let Some(parent) = parent else {
        if selectors.members.iter().any(ComplexSelector::has_parent_ref) {
            return Err(CompileError::TopLevelParentRef { line });
        }
        return Ok(selectors.clone());
    };

    let mut resolved = Vec::new();
    for parent_member in &parent.members {
        for child in &selectors.members {
            resolved.push(resolve_one(parent_member, child));
        }
    }
    Ok(SelectorList::from_members(resolved))
}

/// Resolve one complex selector against one parent member. A compound
/// containing `&` splices the parent selector in its place; otherwise the
/// parent is prepended with a descendant combinator (adjacency).
fn resolve_one(parent: &ComplexSelector, child: &ComplexSelector) -> ComplexSelector {
    if !child.has_parent_ref() {
        let mut members = parent.members.clone();
        members.extend(child.members.iter().cloned());
        let mut sel = ComplexSelector::from_members(members);
        sel.line_feed = child.line_feed || parent.line_feed;
        return sel;
    }

    let mut members: Vec<ComplexMember> = Vec::new();
    for member in &child.members {
        match member {
            ComplexMember::Compound(compound) if compound.has_parent_ref() => {
                // Everything before the parent's innermost compound, then
                // that compound merged with the remainder of this one.
                let stripped: Vec<SimpleSelector> = compound
                    .simple_selectors
                    .iter()
                    .filter(|s| !matches!(s, SimpleSelector::Parent))
                    .cloned()
                    .collect();
                if parent.members.len() > 1 {
                    members.extend(parent.members[..parent.members.len() - 1].iter().cloned());
                }
                let mut merged = match parent.innermost_compound() {
                    Some(inner) => inner.clone(),
                    None => CompoundSelector::new(),
                };
                merged.simple_selectors.extend(stripped);
                members.push(ComplexMember::Compound(merged));
            }
            other => members.push(other.clone()),
        }
    }
    let mut sel = ComplexSelector::from_members(members);
    sel.line_feed = child.line_feed || parent.line_feed;
    sel
}

/// Combine an outer and inner media query.
fn combine_queries(outer: Option<&str>, inner: &str) -> String {
    match outer {
        Some(outer) => format!("{outer} and {inner}"),
        None => inner.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn flattened_selectors(source: &str) -> Vec<String> {
        let sheet = parse(source).unwrap();
        let (flat, _) = evaluate(&sheet).unwrap();
        flat.items
            .iter()
            .filter_map(|item| match item {
                Item::Ruleset(r) => Some(r.selectors.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_nesting_descendant() {
        let selectors = flattened_selectors(".a { color: red; .b { color: blue; } }");
        assert_eq!(selectors, vec![".a", ".a .b"]);
    }

    #[test]
    fn test_nesting_parent_ref() {
        let selectors = flattened_selectors(".a { &.c { x: y; } &:hover { x: y; } }");
        assert_eq!(selectors, vec![".a", ".a.c", ".a:hover"]);
    }

    #[test]
    fn test_nesting_parent_ref_in_context() {
        let selectors = flattened_selectors(".a .b { & .c { x: y; } }");
        assert_eq!(selectors, vec![".a .b", ".a .b .c"]);
    }

    #[test]
    fn test_nesting_cartesian_product() {
        let selectors = flattened_selectors(".a, .b { .c, .d { x: y; } }");
        assert_eq!(
            selectors,
            vec![".a, .b", ".a .c, .a .d, .b .c, .b .d"]
        );
    }

    #[test]
    fn test_top_level_parent_ref_fails() {
        let sheet = parse("& .a { x: y; }").unwrap();
        assert!(matches!(
            evaluate(&sheet),
            Err(CompileError::TopLevelParentRef { .. })
        ));
    }

    #[test]
    fn test_extend_registration() {
        let sheet = parse(".a { @extend .b, .c !optional; }").unwrap();
        let (_, map) = evaluate(&sheet).unwrap();
        let extensions: Vec<_> = map.iter().collect();
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions[0].extender.to_string(), ".a");
        assert_eq!(extensions[0].extendee.to_string(), ".b");
        // `!optional` applies to the whole statement.
        assert!(extensions[0].optional);
        assert!(extensions[1].optional);
    }

    #[test]
    fn test_extend_target_must_be_compound() {
        let sheet = parse(".a { @extend .b .c; }").unwrap();
        assert!(matches!(
            evaluate(&sheet),
            Err(CompileError::InvalidExtendTarget { .. })
        ));
    }

    #[test]
    fn test_extend_records_media_context() {
        let sheet = parse("@media screen { .b { @extend .a; } }").unwrap();
        let (_, map) = evaluate(&sheet).unwrap();
        let extensions: Vec<_> = map.iter().collect();
        assert_eq!(extensions[0].media_query.as_deref(), Some("screen"));
    }

    #[test]
    fn test_nested_media_bubbles() {
        let sheet = parse(".a { color: red; @media screen { color: blue; } }").unwrap();
        let (flat, _) = evaluate(&sheet).unwrap();
        assert_eq!(flat.items.len(), 2);
        let Item::Media(media) = &flat.items[1] else {
            panic!("expected a bubbled media block");
        };
        assert_eq!(media.query, "screen");
        let Item::Ruleset(inner) = &media.items[0] else {
            panic!("expected a ruleset inside the media block");
        };
        assert_eq!(inner.selectors.to_string(), ".a");
    }

    #[test]
    fn test_media_query_combination() {
        let sheet =
            parse("@media screen { .a { @media (min-width: 10px) { x: y; } } }").unwrap();
        let (flat, _) = evaluate(&sheet).unwrap();
        let Item::Media(outer) = &flat.items[0] else {
            panic!("expected a media block");
        };
        let Item::Media(bubbled) = &outer.items[1] else {
            panic!("expected a bubbled media block");
        };
        assert_eq!(bubbled.query, "screen and (min-width: 10px)");
    }
}
