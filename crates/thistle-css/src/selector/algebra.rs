//! Selector algebra: unification and superselector predicates.
//!
//! Unification merges two compound selectors into the most specific
//! compound matching exactly the elements matched by both, or rejects when
//! the intersection is empty. The superselector predicate decides whether
//! one selector matches a superset of the elements another matches. Both
//! are the workhorses of the `@extend` engine: unification builds merged
//! selectors, superselector tests drive trimming and the weave's
//! longest-common-subsequence backbone.

use super::{
    Combinator, ComplexMember, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};

impl CompoundSelector {
    /// Merge `self` into `other`, producing the compound selector that
    /// matches exactly the elements matched by both, or `None` if the
    /// intersection is empty.
    ///
    /// The result is based on `other`'s members with `self`'s members
    /// merged in, so `.a` unified into `.x` yields `.x.a`. Rules:
    ///
    /// - type selectors unify when equal; `*` unifies with anything,
    ///   yielding the other; the type selector stays first;
    /// - two distinct pseudo-elements reject;
    /// - other members merge as a set, inserted before the first pseudo
    ///   member of the base;
    /// - wrapped selectors of the same name unify by concatenating their
    ///   argument lists.
    ///
    /// Sources of both operands are unioned onto the result.
    #[must_use]
    pub fn unify_with(&self, other: &CompoundSelector) -> Option<CompoundSelector> {
        let mut members = other.simple_selectors.clone();

        for simple in &self.simple_selectors {
            match simple {
                SimpleSelector::Type(_) | SimpleSelector::Universal => {
                    members = unify_base(simple, members)?;
                }
                SimpleSelector::PseudoElement(_) => {
                    // At most one pseudo-element may survive; a second,
                    // different one makes the compound unmatchable.
                    let existing = members
                        .iter()
                        .find(|m| matches!(m, SimpleSelector::PseudoElement(_)));
                    match existing {
                        Some(e) if e == simple => {}
                        Some(_) => return None,
                        None => members.push(simple.clone()),
                    }
                }
                SimpleSelector::Wrapped { name, selectors } => {
                    merge_wrapped(&mut members, name, selectors);
                }
                _ => {
                    if !members.contains(simple) {
                        insert_before_pseudos(&mut members, simple.clone());
                    }
                }
            }
        }

        let mut sources = other.sources.clone();
        sources.extend_from(&self.sources);

        Some(CompoundSelector {
            simple_selectors: members,
            sources,
            line_feed: self.line_feed || other.line_feed,
        })
    }

    /// Whether every element matched by `other` is matched by `self`.
    ///
    /// "base compatible, pseudo-elements equal, and the rest a subset":
    /// the type selector of `self`, if any, must equal `other`'s; the
    /// pseudo-elements must agree exactly; every remaining member of
    /// `self` must occur in `other`.
    #[must_use]
    pub fn is_superselector_of(&self, other: &CompoundSelector) -> bool {
        let base_compatible = match self.base() {
            None | Some(SimpleSelector::Universal) => true,
            Some(base) => other.base() == Some(base),
        };

        base_compatible
            && self.pseudo_elements() == other.pseudo_elements()
            && self.rest().is_subset(&other.rest())
    }
}

/// Unify a type or universal selector into a member list. The base
/// position is always the front of a compound.
fn unify_base(
    base: &SimpleSelector,
    mut members: Vec<SimpleSelector>,
) -> Option<Vec<SimpleSelector>> {
    match members.first() {
        Some(existing @ (SimpleSelector::Type(_) | SimpleSelector::Universal)) => {
            let merged = match (base, existing) {
                (SimpleSelector::Universal, other) => other.clone(),
                (other, SimpleSelector::Universal) => other.clone(),
                (SimpleSelector::Type(a), SimpleSelector::Type(b)) if a == b => base.clone(),
                _ => return None,
            };
            members[0] = merged;
        }
        _ => members.insert(0, base.clone()),
    }
    Some(members)
}

/// Merge a wrapped selector into a member list: a wrapped selector of the
/// same name absorbs the incoming argument list by concatenation (no deep
/// recursion through the wrapped contents).
fn merge_wrapped(members: &mut Vec<SimpleSelector>, name: &str, selectors: &SelectorList) {
    for member in members.iter_mut() {
        if let SimpleSelector::Wrapped {
            name: existing_name,
            selectors: existing,
        } = member
        {
            if existing_name == name {
                if existing != selectors {
                    for inner in &selectors.members {
                        existing.push_unique(inner.clone());
                    }
                }
                return;
            }
        }
    }
    insert_before_pseudos(
        members,
        SimpleSelector::Wrapped {
            name: name.to_string(),
            selectors: selectors.clone(),
        },
    );
}

/// Insert a simple selector before the first pseudo member, or at the end
/// when there is none. Pseudo selectors stay at the tail of a compound.
fn insert_before_pseudos(members: &mut Vec<SimpleSelector>, simple: SimpleSelector) {
    let position = members
        .iter()
        .position(SimpleSelector::is_pseudo)
        .unwrap_or(members.len());
    members.insert(position, simple);
}

/// Whether the member sequence `a` matches a superset of the elements the
/// member sequence `b` matches.
///
/// A forward walk: the head compound of `a` must be a compound
/// superselector of some position in `b`, and the combinators must agree
/// up to the containments the descendant and subsequent-sibling
/// combinators grant — descendant may stand for child, `~` for `+`, and
/// equal combinators always match. A child or sibling pair in `a` must be
/// matched contiguously: `.foo > .baz` is not a superselector of
/// `.foo > .bar > .baz` even though `.baz` covers `.bar > .baz`.
#[must_use]
pub fn complex_is_superselector(a: &[ComplexMember], b: &[ComplexMember]) -> bool {
    // Sequences with trailing combinators are neither superselectors nor
    // subselectors of anything.
    if matches!(a.last(), Some(ComplexMember::Combinator(_)))
        || matches!(b.last(), Some(ComplexMember::Combinator(_)))
    {
        return false;
    }

    let mut i1 = 0;
    let mut i2 = 0;
    loop {
        let remaining1 = a.len() - i1;
        let remaining2 = b.len() - i2;
        if remaining1 == 0 || remaining2 == 0 {
            return false;
        }

        // More complex selectors are never superselectors of less complex
        // ones.
        if remaining1 > remaining2 {
            return false;
        }

        // Sequences with leading combinators are unsupported.
        let Some(compound1) = a[i1].as_compound() else {
            return false;
        };
        if b[i2].is_combinator() {
            return false;
        }

        if remaining1 == 1 {
            let Some(ComplexMember::Compound(last2)) = b.last() else {
                return false;
            };
            return compound1.is_superselector_of(last2);
        }

        // Find the first position in `b` (excluding the final compound)
        // that `compound1` covers.
        let mut after = i2 + 1;
        while after < b.len() {
            if let Some(compound2) = b[after - 1].as_compound() {
                if compound1.is_superselector_of(compound2) {
                    break;
                }
            }
            after += 1;
        }
        if after == b.len() {
            return false;
        }

        match &a[i1 + 1] {
            ComplexMember::Combinator(combinator1) => {
                let ComplexMember::Combinator(combinator2) = &b[after] else {
                    return false;
                };
                // `.foo ~ .bar` is a superselector of `.foo + .bar`, but
                // otherwise the combinators must match.
                if *combinator1 == Combinator::SubsequentSibling {
                    if *combinator2 == Combinator::Child {
                        return false;
                    }
                } else if combinator1 != combinator2 {
                    return false;
                }
                // A child/sibling pair must match contiguously.
                if remaining1 == 3 && remaining2 > 3 {
                    return false;
                }
                i1 += 2;
                i2 = after + 1;
            }
            ComplexMember::Compound(_) => {
                if let ComplexMember::Combinator(combinator2) = &b[after] {
                    // The implied descendant combinator covers an explicit
                    // child, but not a sibling relationship.
                    if *combinator2 != Combinator::Child {
                        return false;
                    }
                    i2 = after + 1;
                } else {
                    i2 = after;
                }
                i1 += 1;
            }
        }
    }
}

/// Whether `a` is a superselector of `b` when both are treated as prefixes
/// of a longer selector: a synthetic trailing descendant compound is
/// appended to both before the comparison.
#[must_use]
pub fn parent_superselector(a: &[ComplexMember], b: &[ComplexMember]) -> bool {
    let temp = ComplexMember::Compound(CompoundSelector::from_simples(vec![
        SimpleSelector::Type("temp".to_string()),
    ]));
    let mut a2 = a.to_vec();
    a2.push(temp.clone());
    let mut b2 = b.to_vec();
    b2.push(temp);
    complex_is_superselector(&a2, &b2)
}

impl ComplexSelector {
    /// [`parent_superselector`] over whole complex selectors.
    #[must_use]
    pub fn is_parent_superselector_of(&self, other: &Self) -> bool {
        parent_superselector(&self.members, &other.members)
    }
}
