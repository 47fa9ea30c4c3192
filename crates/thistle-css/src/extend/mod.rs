//! The selector extension engine.
//!
//! Implements the `@extend` directive by rewriting selector lists so that
//! every rule targeting an extendee also matches its extenders, while
//! preserving specificity discipline and cascade equivalence.
//!
//! The engine is driven bottom-up: the tree walker visits every ruleset,
//! and for each complex selector with an applicable extension rewrites it
//! through the subset map. Candidate rewrites that fail unification or
//! whose combinator structures cannot be reconciled are silently dropped;
//! the algorithm explores a space of candidates and discards the invalid
//! majority. Only cross-media extension and unsatisfied non-optional
//! extends surface as errors.

use std::cell::Cell;
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::CompileError;
use crate::parser::{Item, Ruleset, Stylesheet};
use crate::selector::{
    ComplexMember, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector, Sources,
};

mod weave;

use weave::{paths, trim, weave};

/// The compound-selector keys already consumed on the current recursion
/// path. Guards against infinite extension loops on mutually-extending
/// selectors.
type SeenSet = BTreeSet<Vec<String>>;

/// A single `@extend` registration: in `.a { @extend .b; }`, `.a` is the
/// extender and `.b` the extendee.
#[derive(Debug)]
pub struct Extension {
    /// The complex selector of the rule whose `@extend` introduced the
    /// mapping.
    pub extender: ComplexSelector,
    /// The compound selector to be matched (and subtracted before
    /// unification).
    pub extendee: CompoundSelector,
    /// Whether the `@extend` carried `!optional`.
    pub optional: bool,
    /// The enclosing media query of the `@extend`, if any.
    pub media_query: Option<String>,
    /// 1-based source line of the `@extend` statement.
    pub line: usize,
    /// Set once the extendee has been consumed to satisfy the extend.
    extended: Cell<bool>,
}

impl Extension {
    /// Create an unconsumed extension.
    #[must_use]
    pub fn new(
        extender: ComplexSelector,
        extendee: CompoundSelector,
        optional: bool,
        media_query: Option<String>,
        line: usize,
    ) -> Self {
        Self {
            extender,
            extendee,
            optional,
            media_query,
            line,
            extended: Cell::new(false),
        }
    }

    /// Whether the extendee has been consumed.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.extended.get()
    }
}

/// Index from an extendee's simple-selector set to its extenders.
///
/// Keyed by the extendee's canonical simple-selector vector; a lookup by
/// a compound selector returns every registration whose extendee is a
/// subset of the queried compound. Iteration order is insertion order
/// throughout, which keeps the engine's output byte-reproducible.
#[derive(Debug, Default)]
pub struct ExtensionSubsetMap {
    entries: IndexMap<Vec<String>, Vec<Extension>>,
}

impl ExtensionSubsetMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no extensions have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register an extension under its extendee's canonical key.
    pub fn insert(&mut self, extension: Extension) {
        self.entries
            .entry(extension.extendee.key())
            .or_default()
            .push(extension);
    }

    /// Every registration whose extendee is a subset of `compound`'s
    /// simple-selector set, in insertion order.
    #[must_use]
    pub fn get(&self, compound: &CompoundSelector) -> Vec<&Extension> {
        let members = compound.member_set();
        let mut found = Vec::new();
        for (key, extensions) in &self.entries {
            if !key.is_empty() && key.iter().all(|simple| members.contains(simple)) {
                found.extend(extensions.iter());
            }
        }
        found
    }

    /// All registrations, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.values().flatten()
    }
}

/// Rewrite a compound selector through the subset map.
///
/// For every group of registrations sharing an extender: gather the
/// extendees' simple selectors, subtract them from `compound`, unify the
/// extender's innermost compound with the remainder, and graft the result
/// onto a copy of the extender. Each survivor is then recursively
/// extended (the composite extendee key guards the recursion). Returns
/// the alternatives *excluding* the unextended original.
fn extend_compound_selector(
    compound: &CompoundSelector,
    subset_map: &ExtensionSubsetMap,
    seen: &SeenSet,
    is_replace: bool,
) -> Vec<ComplexSelector> {
    let entries = subset_map.get(compound);

    // Group the registrations by extender, in first-seen order.
    let mut groups: Vec<(&ComplexSelector, Vec<&Extension>)> = Vec::new();
    for extension in entries {
        match groups
            .iter_mut()
            .find(|(extender, _)| extender.eq_members(&extension.extender, true))
        {
            Some((_, group)) => group.push(extension),
            None => groups.push((&extension.extender, vec![extension])),
        }
    }

    let mut holder: Vec<(CompoundSelector, ComplexSelector)> = Vec::new();

    for (extender, group) in groups {
        // The composite extendee: every simple selector from every
        // extendee in the group, to be subtracted from the compound.
        let mut subtracted = CompoundSelector::new();
        for extension in &group {
            for simple in &extension.extendee.simple_selectors {
                subtracted.simple_selectors.push(simple.clone());
            }
            extension.extended.set(true);
            if extension.extendee.line_feed {
                subtracted.line_feed = true;
            }
        }

        let self_without = compound.minus(&subtracted);

        let innermost = match extender.innermost_compound() {
            Some(inner) => inner.clone(),
            None => CompoundSelector::new(),
        };
        let Some(unified) = innermost.unify_with(&self_without) else {
            continue;
        };
        if unified.is_empty() {
            continue;
        }

        // Extenders come straight from the parsed tree; sources only ever
        // appear on selectors the engine itself produced.
        debug_assert!(
            extender.sources().is_empty(),
            "subset-map extender carries sources"
        );

        let mut new_selector = extender.clone();
        new_selector.replace_innermost(unified);

        // The new selector's sources are the compound's sources plus the
        // extender that produced it.
        let mut new_sources = compound.sources.clone();
        new_sources.insert(extender);
        new_selector.add_sources(&new_sources);

        if subtracted.line_feed {
            new_selector.line_feed = true;
        }

        holder.push((subtracted, new_selector));
    }

    let mut extended: Vec<ComplexSelector> = Vec::new();

    for (subtracted, new_selector) in holder {
        let key = subtracted.key();
        if seen.contains(&key) {
            continue;
        }
        let mut recurse_seen = seen.clone();
        let _ = recurse_seen.insert(key);

        let recursed =
            extend_complex_selector(&new_selector, subset_map, &recurse_seen, is_replace, false);
        for selector in recursed {
            if !extended.iter().any(|e| e.eq_members(&selector, false)) {
                extended.push(selector);
            }
        }
    }

    extended
}

/// Rewrite a complex selector through the subset map.
///
/// Each compound position contributes a list of alternatives (the
/// unextended compound survives unless some extension already covers it);
/// the Cartesian product of the positions yields candidate paths, each
/// path is woven into its valid interleavings, and the union is trimmed.
fn extend_complex_selector(
    complex: &ComplexSelector,
    subset_map: &ExtensionSubsetMap,
    seen: &SeenSet,
    is_replace: bool,
    is_original: bool,
) -> Vec<ComplexSelector> {
    let mut choices: Vec<Vec<ComplexSelector>> = Vec::new();

    for member in &complex.members {
        match member {
            // Combinators pass through as single-member alternatives.
            ComplexMember::Combinator(combinator) => {
                choices.push(vec![ComplexSelector::from_combinator(*combinator)]);
            }
            ComplexMember::Compound(compound) => {
                let extended =
                    extend_compound_selector(compound, subset_map, seen, is_replace);

                let mut own = compound.clone();
                if is_original && !complex.has_placeholder() {
                    // The original selector is a source of its own
                    // compound: it was here before any extension.
                    let mut self_source = Sources::new();
                    self_source.insert(complex);
                    own.sources.extend_from(&self_source);
                }
                let own = ComplexSelector::from_compound(own);

                // First Law of Extend: the result of extending a selector
                // must still match everything the original matched, so
                // the unextended variant survives unless an extension
                // already covers it.
                let covered = extended.iter().any(|e| e.is_superselector_of(&own));
                let mut alternatives = extended;
                if !covered {
                    alternatives.insert(0, own);
                }
                choices.push(alternatives);
            }
        }
    }

    let all_paths = paths(&choices);

    let mut weaves: Vec<Vec<ComplexSelector>> = Vec::with_capacity(all_paths.len());
    for path in &all_paths {
        weaves.push(weave(path));
    }

    trim(weaves, is_replace).into_iter().flatten().collect()
}

/// Whether any compound of `complex` has an applicable registration,
/// recursing into wrapped-selector arguments. Reports a fatal error when
/// a registration would cross a media boundary.
fn complex_selector_has_extension(
    complex: &ComplexSelector,
    subset_map: &ExtensionSubsetMap,
    seen: &SeenSet,
    media_query: Option<&str>,
) -> Result<bool, CompileError> {
    let mut has_extension = false;

    for compound in complex.compounds() {
        if !seen.contains(&compound.key()) {
            for simple in &compound.simple_selectors {
                let SimpleSelector::Wrapped { selectors, .. } = simple else {
                    continue;
                };
                for inner in &selectors.members {
                    if complex_selector_has_extension(inner, subset_map, seen, media_query)? {
                        has_extension = true;
                        break;
                    }
                }
            }
        }

        let entries = subset_map.get(compound);
        for extension in &entries {
            let Some(extension_media) = extension.media_query.as_deref() else {
                continue;
            };
            if media_query == Some(extension_media) {
                continue;
            }
            return Err(CompileError::CrossMediaExtend {
                target: extension.extendee.to_string(),
                line: extension.line,
            });
        }
        if !entries.is_empty() {
            has_extension = true;
        }
    }

    Ok(has_extension)
}

/// Rewrite a whole selector list, returning the new list and whether any
/// selector was actually extended.
pub fn extend_selector_list(
    list: &SelectorList,
    subset_map: &ExtensionSubsetMap,
    is_replace: bool,
    seen: &SeenSet,
    media_query: Option<&str>,
) -> Result<(SelectorList, bool), CompileError> {
    let mut new_list = SelectorList::new();
    let mut extended_something = false;

    for selector in &list.members {
        // Checking the subset map is much cheaper than running the
        // extension machinery, so untouched selectors short-circuit.
        if !complex_selector_has_extension(selector, subset_map, seen, media_query)? {
            new_list.push_unique(selector.clone());
            continue;
        }

        extended_something = true;

        let extended =
            extend_complex_selector(selector, subset_map, seen, is_replace, true);

        if !selector.has_placeholder()
            && !extended.iter().any(|e| e.eq_members(selector, true))
        {
            // The original did not survive extension; keep it alone.
            new_list.push_unique(selector.clone());
            continue;
        }

        let result_count = extended.len();
        for (index, result) in extended.into_iter().enumerate() {
            // `@extend !replace`: drop the first (original) result unless
            // it is the only one.
            if is_replace && index == 0 && result_count > 1 {
                continue;
            }
            new_list.push_unique(result);
        }
    }

    let mut new_list = remove_placeholders(&new_list);
    unwrap_extended_wrappers(&mut new_list, subset_map, seen, media_query)?;

    Ok((new_list, extended_something))
}

/// Recursively extend the inner selector lists of wrapped selectors
/// (`:not(...)`) in every compound head of the list, cloning each wrapper
/// per inner result.
fn unwrap_extended_wrappers(
    list: &mut SelectorList,
    subset_map: &ExtensionSubsetMap,
    seen: &SeenSet,
    media_query: Option<&str>,
) -> Result<(), CompileError> {
    for complex in &mut list.members {
        for member in &mut complex.members {
            let ComplexMember::Compound(head) = member else {
                continue;
            };
            if !head.has_wrapped() || seen.contains(&head.key()) {
                continue;
            }
            let mut recurse_seen = seen.clone();
            let _ = recurse_seen.insert(head.key());

            let mut new_simples: Vec<SimpleSelector> = Vec::new();
            for simple in &head.simple_selectors {
                let SimpleSelector::Wrapped { name, selectors } = simple else {
                    new_simples.push(simple.clone());
                    continue;
                };
                if selectors.is_empty() {
                    // An emptied wrapper loses its parentheses.
                    new_simples.push(SimpleSelector::Type(name.clone()));
                    continue;
                }
                let (inner, _) = extend_selector_list(
                    selectors,
                    subset_map,
                    false,
                    &recurse_seen,
                    media_query,
                )?;
                for inner_selector in inner.members {
                    // Only the leading compound of each inner result is
                    // kept; nested wrappers inside it are left alone.
                    match inner_selector.members.into_iter().next() {
                        Some(ComplexMember::Compound(first)) if !first.has_wrapped() => {
                            new_simples.push(SimpleSelector::Wrapped {
                                name: name.clone(),
                                selectors: SelectorList::from_members(vec![
                                    ComplexSelector::from_compound(first),
                                ]),
                            });
                        }
                        _ => {}
                    }
                }
            }
            head.simple_selectors = new_simples;
        }
    }
    Ok(())
}

/// Drop every complex selector that carries a placeholder anywhere
/// (including inside wrapped-selector arguments).
#[must_use]
pub fn remove_placeholders(list: &SelectorList) -> SelectorList {
    SelectorList::from_members(
        list.members
            .iter()
            .filter(|selector| !selector.has_placeholder())
            .cloned()
            .collect(),
    )
}

/// Whether a ruleset's block would produce output: extension is skipped
/// for rulesets whose block is empty after evaluation, since pulling
/// selectors onto them changes nothing.
fn should_extend_ruleset(ruleset: &Ruleset) -> bool {
    !ruleset.body.is_empty()
}

/// Walk the rule tree, rewriting every ruleset's selector list through
/// the subset map, then verify that every non-optional extend was
/// satisfied somewhere in the tree.
pub fn extend_stylesheet(
    stylesheet: &mut Stylesheet,
    subset_map: &ExtensionSubsetMap,
) -> Result<(), CompileError> {
    if !subset_map.is_empty() {
        extend_items(&mut stylesheet.items, subset_map, None)?;
    }

    for extension in subset_map.iter() {
        if extension.is_extended() || extension.optional {
            continue;
        }
        return Err(CompileError::UnsatisfiedExtend {
            extender: extension.extender.to_string(),
            target: extension.extendee.to_string(),
        });
    }

    Ok(())
}

/// Visit a flattened item list, rewriting ruleset selector lists in
/// place. Media and supports blocks recurse into their children but are
/// not rewritten at this level.
fn extend_items(
    items: &mut [Item],
    subset_map: &ExtensionSubsetMap,
    media_query: Option<&str>,
) -> Result<(), CompileError> {
    for item in items {
        match item {
            Item::Ruleset(ruleset) => {
                if !should_extend_ruleset(ruleset) {
                    continue;
                }
                let seen = SeenSet::new();
                let (new_list, extended_something) = extend_selector_list(
                    &ruleset.selectors,
                    subset_map,
                    false,
                    &seen,
                    media_query,
                )?;
                if extended_something {
                    ruleset.selectors = new_list;
                }
            }
            Item::Media(media) => {
                let query = media.query.clone();
                extend_items(&mut media.items, subset_map, Some(&query))?;
            }
            Item::Supports(supports) => {
                extend_items(&mut supports.items, subset_map, media_query)?;
            }
            Item::AtRule { .. } | Item::Comment(_) => {}
        }
    }
    Ok(())
}

/// The final placeholder pass: strip placeholder-bearing selectors from
/// every ruleset and drop rulesets whose selector list becomes empty.
pub fn remove_placeholder_rules(stylesheet: &mut Stylesheet) {
    remove_placeholder_items(&mut stylesheet.items);
}

fn remove_placeholder_items(items: &mut Vec<Item>) {
    items.retain_mut(|item| match item {
        Item::Ruleset(ruleset) => {
            ruleset.selectors = remove_placeholders(&ruleset.selectors);
            !ruleset.selectors.is_empty()
        }
        Item::Media(media) => {
            remove_placeholder_items(&mut media.items);
            !media.items.is_empty()
        }
        Item::Supports(supports) => {
            remove_placeholder_items(&mut supports.items);
            !supports.items.is_empty()
        }
        Item::AtRule { .. } | Item::Comment(_) => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse::parse_selector_list;

    fn complex(input: &str) -> ComplexSelector {
        let mut list = parse_selector_list(input, 1).unwrap();
        list.members.remove(0)
    }

    fn compound(input: &str) -> CompoundSelector {
        match complex(input).members.into_iter().next() {
            Some(ComplexMember::Compound(c)) => c,
            _ => panic!("not a compound"),
        }
    }

    fn map_of(pairs: &[(&str, &str)]) -> ExtensionSubsetMap {
        let mut map = ExtensionSubsetMap::new();
        for (extender, extendee) in pairs {
            map.insert(Extension::new(
                complex(extender),
                compound(extendee),
                false,
                None,
                1,
            ));
        }
        map
    }

    fn extend_list(input: &str, map: &ExtensionSubsetMap) -> String {
        let list = parse_selector_list(input, 1).unwrap();
        let (extended, _) =
            extend_selector_list(&list, map, false, &SeenSet::new(), None).unwrap();
        extended.to_string()
    }

    #[test]
    fn test_subset_map_lookup() {
        let map = map_of(&[(".y", ".a.b")]);
        // The extendee's key is a subset of the queried compound.
        assert_eq!(map.get(&compound(".a.b.x")).len(), 1);
        assert_eq!(map.get(&compound(".a.x")).len(), 0);
        assert_eq!(map.get(&compound(".b.a")).len(), 1);
    }

    #[test]
    fn test_extend_simple() {
        let map = map_of(&[(".a", ".b")]);
        assert_eq!(extend_list(".b", &map), ".b, .a");
    }

    #[test]
    fn test_extend_in_context() {
        let map = map_of(&[(".a", ".b")]);
        assert_eq!(extend_list(".x .b", &map), ".x .b, .x .a");
    }

    #[test]
    fn test_extend_unifies_remainder() {
        let map = map_of(&[(".a", ".b")]);
        assert_eq!(extend_list(".x.b", &map), ".x.b, .x.a");
    }

    #[test]
    fn test_extend_complex_extender() {
        let map = map_of(&[(".a .b", ".c")]);
        assert_eq!(extend_list(".c", &map), ".c, .a .b");
    }

    #[test]
    fn test_extend_weaves_contexts() {
        let map = map_of(&[(".a .b", ".c")]);
        assert_eq!(extend_list(".x .c", &map), ".x .c, .x .a .b, .a .x .b");
    }

    #[test]
    fn test_extend_compound_extendee() {
        let map = map_of(&[(".y", ".a.b")]);
        assert_eq!(extend_list(".a.b.x", &map), ".a.b.x, .x.y");
    }

    #[test]
    fn test_extend_unification_failure_drops_candidate() {
        // span cannot unify with div, so the candidate vanishes silently.
        let map = map_of(&[("span.a", "div.b")]);
        assert_eq!(extend_list("div.b", &map), "div.b");
    }

    #[test]
    fn test_extend_untouched_selector_passes_through() {
        let map = map_of(&[(".a", ".b")]);
        assert_eq!(extend_list(".nope", &map), ".nope");
    }

    #[test]
    fn test_mutual_extension_terminates() {
        let map = map_of(&[(".a", ".b"), (".b", ".a")]);
        let result = extend_list(".a, .b", &map);
        // Termination plus both originals surviving is the contract; the
        // exact order falls out of the subset-map insertion order.
        assert!(result.contains(".a"));
        assert!(result.contains(".b"));
    }

    #[test]
    fn test_extend_placeholder() {
        let map = map_of(&[(".btn", "%base")]);
        assert_eq!(extend_list("%base", &map), ".btn");
    }

    #[test]
    fn test_extend_inside_wrapped() {
        // The extended inner list clones the wrapper once per result,
        // all on the same compound.
        let map = map_of(&[(".b", ".a")]);
        assert_eq!(extend_list(":not(.a)", &map), ":not(.a):not(.b)");
    }

    #[test]
    fn test_extension_consumption_flag() {
        let map = map_of(&[(".a", ".b")]);
        let _ = extend_list(".b", &map);
        assert!(map.iter().all(Extension::is_extended));
    }

    #[test]
    fn test_replace_drops_original() {
        // A replacing extension keeps only the generated selectors,
        // unless the original is all there is.
        let map = map_of(&[(".a", ".b")]);
        let list = parse_selector_list(".b", 1).unwrap();
        let (extended, _) =
            extend_selector_list(&list, &map, true, &SeenSet::new(), None).unwrap();
        assert_eq!(extended.to_string(), ".a");

        let untouched = parse_selector_list(".c", 1).unwrap();
        let (kept, _) =
            extend_selector_list(&untouched, &map, true, &SeenSet::new(), None).unwrap();
        assert_eq!(kept.to_string(), ".c");
    }

    #[test]
    fn test_idempotent_on_empty_map() {
        let map = ExtensionSubsetMap::new();
        assert_eq!(extend_list(".a .b, .c", &map), ".a .b, .c");
    }

    #[test]
    fn test_sources_monotonicity() {
        let map = map_of(&[(".a", ".b")]);
        let list = parse_selector_list(".b", 1).unwrap();
        let (extended, _) =
            extend_selector_list(&list, &map, false, &SeenSet::new(), None).unwrap();
        // The generated selector remembers the extender that produced it.
        let generated = &extended.members[1];
        assert!(!generated.sources().is_empty());
    }
}
