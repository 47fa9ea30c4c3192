//! Selector model per [Selectors Level 4](https://www.w3.org/TR/selectors-4/),
//! extended with the preprocessor-only forms: placeholder selectors
//! (`%name`), parent references (`&`), and wrapped pseudo-selectors whose
//! argument is itself a selector list (`:not(...)`).
//!
//! The model is shared between the parser, the nesting evaluator, and the
//! `@extend` engine. Complex selectors are stored in the "members" form:
//! a flat sequence of compound selectors and explicit combinators, with the
//! descendant combinator implied by adjacency. This is the shape the weave
//! algorithms operate on directly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use strum_macros::Display;

/// Selector algebra: unification and superselector predicates.
pub mod algebra;
/// Selector parsing.
pub mod parse;

pub use parse::parse_selector_list;

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// Attribute selector matching based on element attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]` — "Represents an element with the att attribute"
    Exists(String),
    /// `[attr=value]` — exact value match.
    Equals(String, String),
    /// `[attr~=value]` — whitespace-separated word match.
    Includes(String, String),
    /// `[attr|=value]` — exact match or prefix followed by `-`.
    DashMatch(String, String),
    /// `[attr^=value]` — value prefix match.
    PrefixMatch(String, String),
    /// `[attr$=value]` — value suffix match.
    SuffixMatch(String, String),
    /// `[attr*=value]` — value substring match.
    SubstringMatch(String, String),
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists(name) => write!(f, "[{name}]"),
            Self::Equals(name, val) => write!(f, "[{name}={val}]"),
            Self::Includes(name, val) => write!(f, "[{name}~={val}]"),
            Self::DashMatch(name, val) => write!(f, "[{name}|={val}]"),
            Self::PrefixMatch(name, val) => write!(f, "[{name}^={val}]"),
            Self::SuffixMatch(name, val) => write!(f, "[{name}$={val}]"),
            Self::SubstringMatch(name, val) => write!(f, "[{name}*={val}]"),
        }
    }
}

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// A simple selector is a single condition on an element, plus the
/// preprocessor-only forms that never reach the output CSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector is the name of a document language element type."
    Type(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    /// "The universal selector is a single asterisk (*)."
    Universal,

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    /// "The class selector is given as a full stop (. U+002E) immediately
    /// followed by an identifier."
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    /// "An ID selector is a hash (#, U+0023) immediately followed by the
    /// ID value."
    Id(String),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    ///
    /// A pseudo-class with an optional raw argument (`:hover`,
    /// `:nth-child(2n)`). Arguments are carried verbatim; only wrapped
    /// pseudo-selectors get a parsed inner selector list.
    PseudoClass {
        /// The pseudo-class name, without the leading colon.
        name: String,
        /// The raw argument between parentheses, if any.
        argument: Option<String>,
    },

    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    ///
    /// A pseudo-element (`::before`). The legacy single-colon spellings of
    /// `before`, `after`, `first-line` and `first-letter` parse to this
    /// variant as well.
    PseudoElement(String),

    /// A placeholder selector (`%name`): usable only as an `@extend`
    /// target, removed from every selector list before output.
    Placeholder(String),

    /// The parent reference `&`, resolved against the enclosing rule's
    /// selector during evaluation. Never survives into the extend engine.
    Parent,

    /// A pseudo-selector whose argument is itself a selector list
    /// (`:not(.foo, .bar)`). The inner list participates in `@extend`.
    Wrapped {
        /// The pseudo name, without the leading colon.
        name: String,
        /// The parsed inner selector list.
        selectors: SelectorList,
    },
}

impl SimpleSelector {
    /// Whether this member must stay at the end of a compound selector
    /// during unification. Pseudo-classes, pseudo-elements and wrapped
    /// selectors all count.
    #[must_use]
    pub const fn is_pseudo(&self) -> bool {
        matches!(
            self,
            Self::PseudoClass { .. } | Self::PseudoElement(_) | Self::Wrapped { .. }
        )
    }

    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    ///
    /// The scalar specificity contribution of this simple selector.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match self {
            // "count the number of ID selectors in the selector (= A)"
            Self::Id(_) => Specificity(Specificity::ID_WEIGHT),
            // "count the number of class selectors, attributes selectors,
            // and pseudo-classes in the selector (= B)"
            // Placeholders weigh like classes; they only matter inside trim
            // before placeholder removal runs.
            Self::Class(_)
            | Self::Attribute(_)
            | Self::PseudoClass { .. }
            | Self::Wrapped { .. }
            | Self::Placeholder(_) => Specificity(Specificity::CLASS_WEIGHT),
            // "count the number of type selectors and pseudo-elements
            // in the selector (= C)"
            Self::Type(_) | Self::PseudoElement(_) => Specificity(Specificity::TYPE_WEIGHT),
            // "ignore the universal selector"
            Self::Universal | Self::Parent => Specificity(0),
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => write!(f, "{name}"),
            Self::Universal => write!(f, "*"),
            Self::Class(name) => write!(f, ".{name}"),
            Self::Id(name) => write!(f, "#{name}"),
            Self::Attribute(attr) => write!(f, "{attr}"),
            Self::PseudoClass {
                name,
                argument: Some(arg),
            } => write!(f, ":{name}({arg})"),
            Self::PseudoClass {
                name,
                argument: None,
            } => write!(f, ":{name}"),
            Self::PseudoElement(name) => write!(f, "::{name}"),
            Self::Placeholder(name) => write!(f, "%{name}"),
            Self::Parent => write!(f, "&"),
            Self::Wrapped { name, selectors } => write!(f, ":{name}({selectors})"),
        }
    }
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
///
/// "A selector's specificity is calculated for a given element as follows:
///  - count the number of ID selectors in the selector (= A)
///  - count the number of class selectors, attributes selectors, and
///    pseudo-classes in the selector (= B)
///  - count the number of type selectors and pseudo-elements in the
///    selector (= C)"
///
/// The extension engine compares specificities summed across the compound
/// selectors of a complex selector, so the three counts are collapsed into
/// a single weighted scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32);

impl Specificity {
    /// Weight of an ID selector.
    pub const ID_WEIGHT: u32 = 10_000;
    /// Weight of a class, attribute or pseudo-class selector.
    pub const CLASS_WEIGHT: u32 = 100;
    /// Weight of a type selector or pseudo-element.
    pub const TYPE_WEIGHT: u32 = 1;

    /// Create a specificity from a raw weighted value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Sum two specificities.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

/// The set of original complex selectors whose `@extend` contributed to
/// producing a selector.
///
/// Sources participate in trim (the "Second Law of Extend") and are
/// propagated through unification and extension. Identity is by canonical
/// string form so that it survives cloning; the stored value is the
/// source's specificity, which is all trim consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources(BTreeMap<String, Specificity>);

impl Sources {
    /// An empty source set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no sources have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a complex selector as a source.
    pub fn insert(&mut self, source: &ComplexSelector) {
        let _ = self.0.insert(source.to_string(), source.specificity());
    }

    /// Merge another source set into this one.
    pub fn extend_from(&mut self, other: &Sources) {
        for (key, spec) in &other.0 {
            let _ = self.0.insert(key.clone(), *spec);
        }
    }

    /// The highest specificity among the sources, folded over `init`.
    #[must_use]
    pub fn max_specificity(&self, init: Specificity) -> Specificity {
        self.0.values().fold(init, |acc, s| acc.max(*s))
    }
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
///
/// Invariants: at most one type (or universal) selector, and if present it
/// is first. Members are treated as an unordered set for equality, but
/// order is preserved for emission.
#[derive(Debug, Clone, Default)]
pub struct CompoundSelector {
    /// The simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
    /// The `@extend` sources that produced this compound.
    pub sources: Sources,
    /// Formatting hint: the compound followed a line break in the input.
    pub line_feed: bool,
}

impl CompoundSelector {
    /// An empty compound selector (used as a neutral unification operand).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a compound from simple selectors.
    #[must_use]
    pub fn from_simples(simple_selectors: Vec<SimpleSelector>) -> Self {
        Self {
            simple_selectors,
            sources: Sources::new(),
            line_feed: false,
        }
    }

    /// Whether the compound has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.simple_selectors.is_empty()
    }

    /// The canonical key of this compound: the sorted string forms of its
    /// members. Used as the subset-map key and for the recursion guard.
    #[must_use]
    pub fn key(&self) -> Vec<String> {
        let mut key: Vec<String> = self
            .simple_selectors
            .iter()
            .map(ToString::to_string)
            .collect();
        key.sort();
        key
    }

    /// The members as a set of canonical strings, for subset tests.
    #[must_use]
    pub fn member_set(&self) -> BTreeSet<String> {
        self.simple_selectors
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.simple_selectors
            .iter()
            .fold(Specificity::default(), |acc, s| acc.plus(s.specificity()))
    }

    /// The type (or universal) selector of this compound, if any.
    /// By invariant it can only be the first member.
    #[must_use]
    pub fn base(&self) -> Option<&SimpleSelector> {
        match self.simple_selectors.first() {
            Some(first @ (SimpleSelector::Type(_) | SimpleSelector::Universal)) => Some(first),
            _ => None,
        }
    }

    /// The pseudo-element members, as canonical strings.
    #[must_use]
    pub fn pseudo_elements(&self) -> BTreeSet<String> {
        self.simple_selectors
            .iter()
            .filter(|s| matches!(s, SimpleSelector::PseudoElement(_)))
            .map(ToString::to_string)
            .collect()
    }

    /// The non-base, non-pseudo-element members, as canonical strings.
    #[must_use]
    pub fn rest(&self) -> BTreeSet<String> {
        self.simple_selectors
            .iter()
            .enumerate()
            .filter(|(index, s)| {
                !(*index == 0 && self.base().is_some())
                    && !matches!(s, SimpleSelector::PseudoElement(_))
            })
            .map(|(_, s)| s.to_string())
            .collect()
    }

    /// Whether any member is a placeholder selector, recursing into
    /// wrapped selector arguments.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.simple_selectors.iter().any(|s| match s {
            SimpleSelector::Placeholder(_) => true,
            SimpleSelector::Wrapped { selectors, .. } => {
                selectors.members.iter().any(ComplexSelector::has_placeholder)
            }
            _ => false,
        })
    }

    /// Whether any member is a wrapped selector.
    #[must_use]
    pub fn has_wrapped(&self) -> bool {
        self.simple_selectors
            .iter()
            .any(|s| matches!(s, SimpleSelector::Wrapped { .. }))
    }

    /// Whether any member is the parent reference `&`.
    #[must_use]
    pub fn has_parent_ref(&self) -> bool {
        self.simple_selectors
            .iter()
            .any(|s| matches!(s, SimpleSelector::Parent))
    }

    /// The members of `self` that do not occur in `other`. Sources are
    /// retained.
    #[must_use]
    pub fn minus(&self, other: &CompoundSelector) -> CompoundSelector {
        CompoundSelector {
            simple_selectors: self
                .simple_selectors
                .iter()
                .filter(|s| !other.simple_selectors.contains(s))
                .cloned()
                .collect(),
            sources: self.sources.clone(),
            line_feed: self.line_feed,
        }
    }
}

impl PartialEq for CompoundSelector {
    /// Members compare as an unordered set; sources and formatting hints
    /// do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CompoundSelector {}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for simple in &self.simple_selectors {
            write!(f, "{simple}")?;
        }
        Ok(())
    }
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// "A combinator is punctuation that represents a particular kind of
/// relationship between the selectors on either side."
///
/// Only the explicit combinators are represented; the descendant
/// combinator is implied by two adjacent compound members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Combinator {
    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// "A child combinator is a greater-than sign (>)."
    #[strum(serialize = ">")]
    Child,

    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    /// "A next-sibling combinator is a plus sign (+)."
    #[strum(serialize = "+")]
    NextSibling,

    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    /// "A subsequent-sibling combinator is a tilde (~)."
    #[strum(serialize = "~")]
    SubsequentSibling,
}

/// One member of a complex selector: a compound selector or an explicit
/// combinator between two compounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexMember {
    /// An explicit combinator.
    Combinator(Combinator),
    /// A compound selector.
    Compound(CompoundSelector),
}

impl ComplexMember {
    /// Whether this member is a combinator.
    #[must_use]
    pub const fn is_combinator(&self) -> bool {
        matches!(self, Self::Combinator(_))
    }

    /// The compound selector, if this member is one.
    #[must_use]
    pub const fn as_compound(&self) -> Option<&CompoundSelector> {
        match self {
            Self::Compound(compound) => Some(compound),
            Self::Combinator(_) => None,
        }
    }
}

impl fmt::Display for ComplexMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combinator(c) => write!(f, "{c}"),
            Self::Compound(compound) => write!(f, "{compound}"),
        }
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors
/// separated by combinators."
///
/// Stored left-to-right as a flat member sequence; `.a > .b .c` is
/// `[.a, >, .b, .c]`.
#[derive(Debug, Clone, Default)]
pub struct ComplexSelector {
    /// The member sequence.
    pub members: Vec<ComplexMember>,
    /// Formatting hint: the selector followed a line break in the input.
    pub line_feed: bool,
}

impl ComplexSelector {
    /// Build a complex selector from members.
    #[must_use]
    pub fn from_members(members: Vec<ComplexMember>) -> Self {
        Self {
            members,
            line_feed: false,
        }
    }

    /// A complex selector consisting of a single compound.
    #[must_use]
    pub fn from_compound(compound: CompoundSelector) -> Self {
        Self::from_members(vec![ComplexMember::Compound(compound)])
    }

    /// A complex selector consisting of a lone combinator. Only produced
    /// transiently by the extension driver, never by the parser.
    #[must_use]
    pub fn from_combinator(combinator: Combinator) -> Self {
        Self::from_members(vec![ComplexMember::Combinator(combinator)])
    }

    /// The compound members, in order.
    pub fn compounds(&self) -> impl Iterator<Item = &CompoundSelector> {
        self.members.iter().filter_map(ComplexMember::as_compound)
    }

    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    ///
    /// The specificity of the whole chain: the sum over its compounds.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.compounds()
            .fold(Specificity::default(), |acc, c| acc.plus(c.specificity()))
    }

    /// The union of the sources recorded on the chain's compounds.
    #[must_use]
    pub fn sources(&self) -> Sources {
        let mut sources = Sources::new();
        for compound in self.compounds() {
            sources.extend_from(&compound.sources);
        }
        sources
    }

    /// Record the given sources on every compound in the chain.
    pub fn add_sources(&mut self, sources: &Sources) {
        for member in &mut self.members {
            if let ComplexMember::Compound(compound) = member {
                compound.sources.extend_from(sources);
            }
        }
    }

    /// The innermost (last) compound of the chain, if the chain ends in
    /// one.
    #[must_use]
    pub fn innermost_compound(&self) -> Option<&CompoundSelector> {
        match self.members.last() {
            Some(ComplexMember::Compound(compound)) => Some(compound),
            _ => None,
        }
    }

    /// Replace the innermost compound with `compound`, preserving the
    /// combinator in front of it. If the chain does not end in a compound
    /// the new compound is appended instead.
    pub fn replace_innermost(&mut self, compound: CompoundSelector) {
        match self.members.last_mut() {
            Some(last @ ComplexMember::Compound(_)) => *last = ComplexMember::Compound(compound),
            _ => self.members.push(ComplexMember::Compound(compound)),
        }
    }

    /// Whether any compound in the chain carries a placeholder selector.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.compounds().any(CompoundSelector::has_placeholder)
    }

    /// Whether any compound in the chain carries a parent reference.
    #[must_use]
    pub fn has_parent_ref(&self) -> bool {
        self.compounds().any(CompoundSelector::has_parent_ref)
    }

    /// Structural equality of the member sequences.
    ///
    /// With `order_dependent`, compounds compare member-for-member in
    /// order; otherwise compounds compare as unordered sets. Sources and
    /// formatting hints never participate.
    #[must_use]
    pub fn eq_members(&self, other: &Self, order_dependent: bool) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| match (a, b) {
                    (ComplexMember::Combinator(x), ComplexMember::Combinator(y)) => x == y,
                    (ComplexMember::Compound(x), ComplexMember::Compound(y)) => {
                        if order_dependent {
                            x.simple_selectors == y.simple_selectors
                        } else {
                            x == y
                        }
                    }
                    _ => false,
                })
    }

    /// Whether this selector matches a superset of the elements `other`
    /// matches. See [`algebra::complex_is_superselector`].
    #[must_use]
    pub fn is_superselector_of(&self, other: &Self) -> bool {
        algebra::complex_is_superselector(&self.members, &other.members)
    }
}

impl PartialEq for ComplexSelector {
    fn eq(&self, other: &Self) -> bool {
        self.eq_members(other, false)
    }
}

impl Eq for ComplexSelector {}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, member) in self.members.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{member}")?;
        }
        Ok(())
    }
}

/// [§ 4.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A selector list is a comma-separated list of selectors."
#[derive(Debug, Clone, Default)]
pub struct SelectorList {
    /// The complex selectors, in source order.
    pub members: Vec<ComplexSelector>,
}

impl SelectorList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from complex selectors.
    #[must_use]
    pub fn from_members(members: Vec<ComplexSelector>) -> Self {
        Self { members }
    }

    /// Whether the list has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Append a selector unless a structurally equal one is already
    /// present (duplicate elimination by structural equality).
    pub fn push_unique(&mut self, selector: ComplexSelector) {
        if !self
            .members
            .iter()
            .any(|m| m.eq_members(&selector, true))
        {
            self.members.push(selector);
        }
    }
}

impl PartialEq for SelectorList {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for SelectorList {}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, member) in self.members.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> SimpleSelector {
        SimpleSelector::Class(name.to_string())
    }

    #[test]
    fn test_compound_equality_is_unordered() {
        let a = CompoundSelector::from_simples(vec![class("a"), class("b")]);
        let b = CompoundSelector::from_simples(vec![class("b"), class("a")]);
        assert_eq!(a, b);

        let c = CompoundSelector::from_simples(vec![class("a"), class("c")]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_compound_equality_ignores_sources() {
        let a = CompoundSelector::from_simples(vec![class("a")]);
        let mut b = a.clone();
        b.sources
            .insert(&ComplexSelector::from_compound(a.clone()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_specificity_weights() {
        let compound = CompoundSelector::from_simples(vec![
            SimpleSelector::Type("div".to_string()),
            class("x"),
            SimpleSelector::Id("main".to_string()),
        ]);
        assert_eq!(compound.specificity(), Specificity(10_101));
    }

    #[test]
    fn test_complex_display() {
        let complex = ComplexSelector::from_members(vec![
            ComplexMember::Compound(CompoundSelector::from_simples(vec![class("a")])),
            ComplexMember::Combinator(Combinator::Child),
            ComplexMember::Compound(CompoundSelector::from_simples(vec![class("b")])),
            ComplexMember::Compound(CompoundSelector::from_simples(vec![class("c")])),
        ]);
        assert_eq!(complex.to_string(), ".a > .b .c");
    }

    #[test]
    fn test_sources_max_specificity() {
        let mut sources = Sources::new();
        let one = ComplexSelector::from_compound(CompoundSelector::from_simples(vec![class("a")]));
        let two = ComplexSelector::from_compound(CompoundSelector::from_simples(vec![
            SimpleSelector::Id("x".to_string()),
        ]));
        sources.insert(&one);
        sources.insert(&two);
        assert_eq!(
            sources.max_specificity(Specificity::default()),
            Specificity(Specificity::ID_WEIGHT)
        );
    }

    #[test]
    fn test_push_unique_deduplicates() {
        let mut list = SelectorList::new();
        let sel = ComplexSelector::from_compound(CompoundSelector::from_simples(vec![class("a")]));
        list.push_unique(sel.clone());
        list.push_unique(sel);
        assert_eq!(list.members.len(), 1);
    }
}
