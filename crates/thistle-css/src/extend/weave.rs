//! The combinator-aware selector weaver.
//!
//! `subweave` merges two complex selectors into every valid interleaving
//! that matches the intersection of what both match, preserving each
//! side's combinator structure. It works in four movements: merge the
//! leading combinators, merge the trailing combinator/compound pairs case
//! by case, align the remaining groups along a longest-common-subsequence
//! backbone, and take the Cartesian product of the resulting choice
//! slots. `weave` folds `subweave` over a whole path of selectors,
//! building all prefixes left to right.
//!
//! `trim` removes woven selectors dominated by a more specific
//! superselector in another group (the "Second Law of Extend": a
//! generated selector must never be less specific than the extending
//! selector that produced it).

use std::collections::VecDeque;

use crate::selector::algebra::parent_superselector;
use crate::selector::{Combinator, ComplexMember, ComplexSelector, CompoundSelector, Specificity};

/// A member sequence: the working form of a complex selector.
pub(crate) type Seq = Vec<ComplexMember>;

/// A grouped member sequence: `[compound, combinator*]` chunks.
type Group = Vec<ComplexMember>;

/// One slot of the diff sequence: the alternative member sequences to
/// choose from at that position.
type Choices = Vec<Seq>;

/// Computes a single longest common subsequence for `x` and `y`.
///
/// The comparator returns the canonicalized representative of two
/// equivalent elements, or `None` when they differ. If there is more than
/// one longest common subsequence, the one returned is that which starts
/// first in `x`.
pub(crate) fn lcs<T: Clone>(x: &[T], y: &[T], comparator: &dyn Fn(&T, &T) -> Option<T>) -> Vec<T> {
    // Standard dynamic-programming table, 1-based.
    let mut table = vec![vec![0usize; y.len() + 1]; x.len() + 1];
    for i in 1..=x.len() {
        for j in 1..=y.len() {
            table[i][j] = if comparator(&x[i - 1], &y[j - 1]).is_some() {
                table[i - 1][j - 1] + 1
            } else {
                table[i][j - 1].max(table[i - 1][j])
            };
        }
    }

    let mut out = Vec::new();
    lcs_backtrace(&table, x, y, x.len(), y.len(), comparator, &mut out);
    out
}

/// Reads out an LCS from the memoization table.
fn lcs_backtrace<T: Clone>(
    table: &[Vec<usize>],
    x: &[T],
    y: &[T],
    i: usize,
    j: usize,
    comparator: &dyn Fn(&T, &T) -> Option<T>,
    out: &mut Vec<T>,
) {
    if i == 0 || j == 0 {
        return;
    }
    if let Some(representative) = comparator(&x[i - 1], &y[j - 1]) {
        lcs_backtrace(table, x, y, i - 1, j - 1, comparator, out);
        out.push(representative);
        return;
    }
    if table[i][j - 1] > table[i - 1][j] {
        lcs_backtrace(table, x, y, i, j - 1, comparator, out);
    } else {
        lcs_backtrace(table, x, y, i - 1, j, comparator, out);
    }
}

/// Every way to pick one element from each slot, in order.
///
/// For each slot, each alternative is appended to every accumulated path
/// before the next alternative is considered; an empty slot annihilates
/// the product.
pub(crate) fn paths<T: Clone>(choices: &[Vec<T>]) -> Vec<Vec<T>> {
    choices.iter().fold(vec![Vec::new()], |acc, slot| {
        slot.iter()
            .flat_map(|alternative| {
                acc.iter().map(move |path| {
                    let mut extended = path.clone();
                    extended.push(alternative.clone());
                    extended
                })
            })
            .collect()
    })
}

/// Takes initial subsequences of `seq1` and `seq2`, cut off where
/// `stop` first holds on the remaining sequence, and returns all
/// orderings of those subsequences. Destructively removes the consumed
/// prefixes.
///
/// Returns `[]` if both chunks are empty, the singleton of the non-empty
/// one if only one is, and both concatenation orders otherwise.
fn chunks(
    seq1: &mut Vec<Group>,
    seq2: &mut Vec<Group>,
    stop: &dyn Fn(&[Group]) -> bool,
) -> Vec<Vec<Group>> {
    let mut chunk1 = Vec::new();
    while !seq1.is_empty() && !stop(seq1) {
        chunk1.push(seq1.remove(0));
    }
    let mut chunk2 = Vec::new();
    while !seq2.is_empty() && !stop(seq2) {
        chunk2.push(seq2.remove(0));
    }

    match (chunk1.is_empty(), chunk2.is_empty()) {
        (true, true) => Vec::new(),
        (true, false) => vec![chunk2],
        (false, true) => vec![chunk1],
        (false, false) => {
            let mut first = chunk1.clone();
            first.extend(chunk2.iter().cloned());
            let mut second = chunk2;
            second.extend(chunk1);
            vec![first, second]
        }
    }
}

/// Regroup a member sequence into `[compound, combinator*]` chunks, so
/// that a group boundary never separates a combinator from the compounds
/// it relates.
fn group_selectors(seq: &[ComplexMember]) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current: Group = Vec::new();

    for (index, member) in seq.iter().enumerate() {
        current.push(member.clone());
        let glued = member.is_combinator()
            || seq.get(index + 1).is_some_and(ComplexMember::is_combinator);
        if !glued {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Strip the leading combinators off a sequence.
fn take_leading_combinators(seq: &mut Seq) -> Vec<Combinator> {
    let mut ops = Vec::new();
    while let Some(ComplexMember::Combinator(c)) = seq.first() {
        ops.push(*c);
        let _ = seq.remove(0);
    }
    ops
}

/// Strip the trailing combinators off a sequence, innermost first.
fn take_trailing_combinators(seq: &mut Seq) -> Vec<Combinator> {
    let mut ops = Vec::new();
    while let Some(ComplexMember::Combinator(c)) = seq.last() {
        ops.push(*c);
        let _ = seq.pop();
    }
    ops
}

/// Merge the leading combinators of two sequences. One side's leading
/// combinators must be a subsequence of the other's; the longer run wins.
/// Returns `None` when the sequences cannot be merged.
fn merge_initial_ops(seq1: &mut Seq, seq2: &mut Seq) -> Option<Seq> {
    let ops1 = take_leading_combinators(seq1);
    let ops2 = take_leading_combinators(seq2);

    let ops_lcs = lcs(&ops1, &ops2, &|a, b| (a == b).then_some(*a));
    if ops_lcs != ops1 && ops_lcs != ops2 {
        return None;
    }

    let longer = if ops1.len() > ops2.len() { ops1 } else { ops2 };
    Some(longer.into_iter().map(ComplexMember::Combinator).collect())
}

/// Merge the trailing combinator/compound pairs of two sequences into
/// `res`, front to back. This is a bunch of special cases for the
/// interactions between different combinators; see each arm.
///
/// Returns `None` when the sequences cannot be merged at all (which
/// rejects the whole weave).
fn merge_final_ops(seq1: &mut Seq, seq2: &mut Seq, res: &mut VecDeque<Choices>) -> Option<()> {
    let ops1 = take_trailing_combinators(seq1);
    let ops2 = take_trailing_combinators(seq2);

    if ops1.is_empty() && ops2.is_empty() {
        return Some(());
    }

    if ops1.len() > 1 || ops2.len() > 1 {
        // If there are multiple operators, something hacky's going on. If
        // one is a supersequence of the other, use that, otherwise give up.
        let ops_lcs = lcs(&ops1, &ops2, &|a, b| (a == b).then_some(*a));
        if ops_lcs != ops1 && ops_lcs != ops2 {
            return None;
        }
        let longer = if ops1.len() > ops2.len() { &ops1 } else { &ops2 };
        // The runs were collected innermost-first; pushing front restores
        // document order.
        for op in longer {
            res.push_front(vec![vec![ComplexMember::Combinator(*op)]]);
        }
        return Some(());
    }

    match (ops1.first(), ops2.first()) {
        (Some(&op1), Some(&op2)) => {
            let Some(ComplexMember::Compound(sel1)) = seq1.pop() else {
                return None;
            };
            let Some(ComplexMember::Compound(sel2)) = seq2.pop() else {
                return None;
            };

            use Combinator::{Child, NextSibling, SubsequentSibling};
            match (op1, op2) {
                (SubsequentSibling, SubsequentSibling) => {
                    if sel1.is_superselector_of(&sel2) {
                        push_pair(res, sel2, SubsequentSibling);
                    } else if sel2.is_superselector_of(&sel1) {
                        push_pair(res, sel1, SubsequentSibling);
                    } else {
                        // Neither covers the other: emit both orders, plus
                        // the unified compound when unification holds.
                        let merged = sel1.unify_with(&sel2);
                        let mut slot: Choices = vec![
                            pair_seq(&sel1, SubsequentSibling, &sel2, SubsequentSibling),
                            pair_seq(&sel2, SubsequentSibling, &sel1, SubsequentSibling),
                        ];
                        if let Some(merged) = merged {
                            slot.push(vec![
                                ComplexMember::Compound(merged),
                                ComplexMember::Combinator(SubsequentSibling),
                            ]);
                        }
                        res.push_front(slot);
                    }
                }
                (SubsequentSibling, NextSibling) | (NextSibling, SubsequentSibling) => {
                    let (tilde_sel, plus_sel) = if op1 == SubsequentSibling {
                        (sel1, sel2)
                    } else {
                        (sel2, sel1)
                    };

                    if tilde_sel.is_superselector_of(&plus_sel) {
                        push_pair(res, plus_sel, NextSibling);
                    } else {
                        let merged = plus_sel.unify_with(&tilde_sel);
                        let mut slot: Choices = vec![pair_seq(
                            &tilde_sel,
                            SubsequentSibling,
                            &plus_sel,
                            NextSibling,
                        )];
                        if let Some(merged) = merged {
                            slot.push(vec![
                                ComplexMember::Compound(merged),
                                ComplexMember::Combinator(NextSibling),
                            ]);
                        }
                        res.push_front(slot);
                    }
                }
                (Child, SubsequentSibling | NextSibling) => {
                    // Keep the sibling pair in the result; the child pair
                    // goes back on its sequence for further processing.
                    push_pair(res, sel2, op2);
                    seq1.push(ComplexMember::Compound(sel1));
                    seq1.push(ComplexMember::Combinator(op1));
                }
                (SubsequentSibling | NextSibling, Child) => {
                    push_pair(res, sel1, op1);
                    seq2.push(ComplexMember::Compound(sel2));
                    seq2.push(ComplexMember::Combinator(op2));
                }
                _ if op1 == op2 => {
                    // Equal combinators: the trailing compounds must unify.
                    let merged = sel1.unify_with(&sel2)?;
                    push_pair(res, merged, op1);
                }
                // Combinator mixes with no merge rule cannot be unified.
                _ => return None,
            }
            merge_final_ops(seq1, seq2, res)
        }
        (Some(&op1), None) => {
            // Drain seq1. A trailing child pair absorbs a final
            // superselector on the other side.
            if op1 == Combinator::Child {
                if let (Some(ComplexMember::Compound(last2)), Some(ComplexMember::Compound(last1))) =
                    (seq2.last(), seq1.last())
                {
                    if last2.is_superselector_of(last1) {
                        let _ = seq2.pop();
                    }
                }
            }
            res.push_front(vec![vec![ComplexMember::Combinator(op1)]]);
            let last = seq1.pop()?;
            res.push_front(vec![vec![last]]);
            merge_final_ops(seq1, seq2, res)
        }
        (None, Some(&op2)) => {
            if op2 == Combinator::Child {
                if let (Some(ComplexMember::Compound(last1)), Some(ComplexMember::Compound(last2))) =
                    (seq1.last(), seq2.last())
                {
                    if last1.is_superselector_of(last2) {
                        let _ = seq1.pop();
                    }
                }
            }
            res.push_front(vec![vec![ComplexMember::Combinator(op2)]]);
            let last = seq2.pop()?;
            res.push_front(vec![vec![last]]);
            merge_final_ops(seq1, seq2, res)
        }
        (None, None) => Some(()),
    }
}

/// Push a `[compound, combinator]` pair onto the front of the result as
/// two single-alternative slots.
fn push_pair(res: &mut VecDeque<Choices>, compound: CompoundSelector, combinator: Combinator) {
    res.push_front(vec![vec![ComplexMember::Combinator(combinator)]]);
    res.push_front(vec![vec![ComplexMember::Compound(compound)]]);
}

/// A `[a, op_a, b, op_b]` alternative.
fn pair_seq(
    a: &CompoundSelector,
    op_a: Combinator,
    b: &CompoundSelector,
    op_b: Combinator,
) -> Seq {
    vec![
        ComplexMember::Compound(a.clone()),
        ComplexMember::Combinator(op_a),
        ComplexMember::Compound(b.clone()),
        ComplexMember::Combinator(op_b),
    ]
}

/// Merge two member sequences into every valid interleaving that matches
/// the intersection of what both match. Returns `None` when the
/// sequences' combinator structures cannot be reconciled.
pub(crate) fn subweave(one: &[ComplexMember], two: &[ComplexMember]) -> Option<Vec<Seq>> {
    // The trivial cases: an empty side contributes nothing to interleave.
    if one.is_empty() {
        return Some(vec![two.to_vec()]);
    }
    if two.is_empty() {
        return Some(vec![one.to_vec()]);
    }

    let mut seq1: Seq = one.to_vec();
    let mut seq2: Seq = two.to_vec();

    let init = merge_initial_ops(&mut seq1, &mut seq2)?;

    let mut fin: VecDeque<Choices> = VecDeque::new();
    merge_final_ops(&mut seq1, &mut seq2, &mut fin)?;

    let mut group1 = group_selectors(&seq1);
    let mut group2 = group_selectors(&seq2);

    // Align the groups along a longest common subsequence. Two groups are
    // equivalent if they are equal under ordered member equality, or if
    // one is a parent-superselector of the other, in which case the more
    // specific one is the representative. This biases weaves toward
    // preserving specificity.
    let comparator = |g1: &Group, g2: &Group| -> Option<Group> {
        let c1 = ComplexSelector::from_members(g1.clone());
        let c2 = ComplexSelector::from_members(g2.clone());
        if c1.eq_members(&c2, true) {
            return Some(g1.clone());
        }
        if g1.first().is_some_and(ComplexMember::is_combinator)
            || g2.first().is_some_and(ComplexMember::is_combinator)
        {
            return None;
        }
        if parent_superselector(g1, g2) {
            return Some(g2.clone());
        }
        if parent_superselector(g2, g1) {
            return Some(g1.clone());
        }
        None
    };
    let mut seq_lcs: VecDeque<Group> = lcs(&group2, &group1, &comparator).into();

    let mut diff: Vec<Choices> = vec![vec![init]];

    while let Some(front) = seq_lcs.front().cloned() {
        let stop = |rest: &[Group]| -> bool {
            match rest.first() {
                Some(group) => parent_superselector(group, &front),
                None => false,
            }
        };
        let chunked = chunks(&mut group1, &mut group2, &stop);
        diff.push(chunked.into_iter().map(flatten_groups).collect());
        let _ = seq_lcs.pop_front();
        diff.push(vec![front]);
        if !group1.is_empty() {
            let _ = group1.remove(0);
        }
        if !group2.is_empty() {
            let _ = group2.remove(0);
        }
    }

    let drained = chunks(&mut group1, &mut group2, &|rest: &[Group]| rest.is_empty());
    diff.push(drained.into_iter().map(flatten_groups).collect());

    diff.extend(fin);

    // Drop slots with no alternatives; they would annihilate the product.
    diff.retain(|slot| !slot.is_empty());

    Some(
        paths(&diff)
            .into_iter()
            .map(|path| path.concat())
            .collect(),
    )
}

/// Flatten a permutation of groups into a single member sequence.
fn flatten_groups(groups: Vec<Group>) -> Seq {
    groups.concat()
}

/// Merge a whole path of complex selectors into every valid interleaving,
/// building all prefixes left to right. Each selector's innermost member
/// stays in final position; the rest interleaves with the accumulated
/// prefixes via [`subweave`]. A single rejected subweave empties the
/// whole result.
pub(crate) fn weave(path: &[ComplexSelector]) -> Vec<ComplexSelector> {
    let line_feed = path.iter().any(|sel| sel.line_feed);

    let mut befores: Vec<Seq> = vec![Vec::new()];

    for current in path {
        let mut members = current.members.clone();
        let Some(last) = members.pop() else {
            continue;
        };

        let mut next: Vec<Seq> = Vec::new();
        for before in &befores {
            let Some(sub) = subweave(before, &members) else {
                return Vec::new();
            };
            for mut woven in sub {
                woven.push(last.clone());
                next.push(woven);
            }
        }
        befores = next;
    }

    befores
        .into_iter()
        .map(|members| {
            let mut sel = ComplexSelector::from_members(members);
            sel.line_feed = line_feed;
            sel
        })
        .collect()
}

/// Remove selectors dominated by a more specific superselector in another
/// group.
///
/// A selector is dropped iff some *other* group contains a selector that
/// is both a superselector of it and at least as specific as the most
/// specific of its sources (or of the selector itself, for a replacing
/// extend). Groups over the 100-group cutoff skip trimming entirely; the
/// quadratic comparison is not worth it there, and the cutoff is
/// user-visible behavior.
pub(crate) fn trim(
    seqses: Vec<Vec<ComplexSelector>>,
    is_replace: bool,
) -> Vec<Vec<ComplexSelector>> {
    if seqses.len() > 100 {
        return seqses;
    }

    // Keep the results in a separate vector so a selector is never
    // compared against an already-trimmed copy of its own group; two
    // identical selectors must not mutually trim one another.
    let mut result = seqses.clone();

    for (index, seqs1) in seqses.iter().enumerate() {
        let mut kept: Vec<ComplexSelector> = Vec::new();

        for seq1 in seqs1 {
            let init = if is_replace {
                seq1.specificity()
            } else {
                Specificity::default()
            };
            let max_specificity = seq1.sources().max_specificity(init);

            let dominated = result.iter().enumerate().any(|(other_index, seqs2)| {
                other_index != index
                    && seqs2.iter().any(|seq2| {
                        seq2.specificity() >= max_specificity && seq2.is_superselector_of(seq1)
                    })
            });

            if !dominated {
                kept.push(seq1.clone());
            }
        }

        result[index] = kept;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse::parse_selector_list;

    fn complex(input: &str) -> ComplexSelector {
        let mut list = parse_selector_list(input, 1).unwrap();
        list.members.remove(0)
    }

    fn weave_strings(inputs: &[&str]) -> Vec<String> {
        let path: Vec<ComplexSelector> = inputs.iter().map(|s| complex(s)).collect();
        weave(&path).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_lcs_plain() {
        let x = [1, 2, 3, 4, 5];
        let y = [2, 4, 5, 6];
        let eq = |a: &i32, b: &i32| (a == b).then_some(*a);
        assert_eq!(lcs(&x, &y, &eq), vec![2, 4, 5]);

        let empty: Vec<i32> = Vec::new();
        assert_eq!(lcs(&empty, &y, &eq), Vec::<i32>::new());
    }

    #[test]
    fn test_paths_order() {
        let slots = vec![vec!["a1", "a2"], vec!["b1", "b2"]];
        let result = paths(&slots);
        // Each alternative extends every accumulated path before the next
        // alternative is considered.
        assert_eq!(
            result,
            vec![
                vec!["a1", "b1"],
                vec!["a2", "b1"],
                vec!["a1", "b2"],
                vec!["a2", "b2"],
            ]
        );
    }

    #[test]
    fn test_paths_empty_slot_annihilates() {
        let slots: Vec<Vec<&str>> = vec![vec!["a"], Vec::new()];
        assert!(paths(&slots).is_empty());
    }

    #[test]
    fn test_group_selectors() {
        let sel = complex(".a > .b .c");
        let groups = group_selectors(&sel.members);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            ComplexSelector::from_members(groups[0].clone()).to_string(),
            ".a > .b"
        );
        assert_eq!(
            ComplexSelector::from_members(groups[1].clone()).to_string(),
            ".c"
        );
    }

    #[test]
    fn test_subweave_disjoint() {
        let one = complex(".x");
        let two = complex(".a");
        let result = subweave(&one.members, &two.members).unwrap();
        let strings: Vec<String> = result
            .into_iter()
            .map(|m| ComplexSelector::from_members(m).to_string())
            .collect();
        assert_eq!(strings, vec![".x .a", ".a .x"]);
    }

    #[test]
    fn test_subweave_empty_side() {
        let one = complex(".x");
        let result = subweave(&one.members, &[]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            ComplexSelector::from_members(result[0].clone()).to_string(),
            ".x"
        );
    }

    #[test]
    fn test_weave_shared_prefix() {
        // A shared leading compound is folded onto the LCS backbone
        // instead of being duplicated or interleaved.
        let strings = weave_strings(&[".a .x", ".a .y"]);
        assert_eq!(strings, vec![".a .x .y"]);
    }

    #[test]
    fn test_weave_simple() {
        let strings = weave_strings(&[".x", ".a .b"]);
        assert_eq!(strings, vec![".x .a .b", ".a .x .b"]);
    }

    #[test]
    fn test_weave_child_combinator_kept() {
        // The trailing child pair is consumed by the final-ops merge and
        // stays glued in place; no interleaving crosses it.
        let strings = weave_strings(&[".x", ".a > .b"]);
        assert_eq!(strings, vec![".x .a > .b"]);
    }

    #[test]
    fn test_merge_final_sibling_pairs() {
        // `~ ~` on distinct compounds produces both orders plus the
        // unified compound.
        let mut seq1 = complex(".a ~ .x").members;
        let mut seq2 = complex(".b ~ .x").members;
        // Pop the shared innermost compound off both, as weave does.
        let _ = seq1.pop();
        let _ = seq2.pop();
        let mut res: VecDeque<Choices> = VecDeque::new();
        merge_final_ops(&mut seq1, &mut seq2, &mut res).unwrap();
        assert_eq!(res.len(), 1);
        let slot = &res[0];
        let strings: Vec<String> = slot
            .iter()
            .map(|alt| ComplexSelector::from_members(alt.clone()).to_string())
            .collect();
        assert_eq!(strings, vec![".a ~ .b ~", ".b ~ .a ~", ".b.a ~"]);
    }

    #[test]
    fn test_trim_drops_dominated() {
        // `.x.y` in one group is dominated by the broader, equally
        // specific `.x` in another only when `.x` is at least as specific
        // as the dominated selector's sources.
        let broad = complex(".x");
        let mut narrow = complex(".x.y");
        let mut sources = crate::selector::Sources::new();
        sources.insert(&complex(".z"));
        if let Some(ComplexMember::Compound(c)) = narrow.members.first_mut() {
            c.sources = sources;
        }

        let trimmed = trim(vec![vec![broad.clone()], vec![narrow]], false);
        assert_eq!(trimmed[0].len(), 1);
        // .x (specificity 100) >= max source specificity (100) and is a
        // superselector of .x.y, so the narrow selector is dropped.
        assert!(trimmed[1].is_empty());
    }

    #[test]
    fn test_trim_identical_selectors_leave_one_survivor() {
        // Two identical selectors in different groups must not mutually
        // trim one another: the first group's copy falls to the untrimmed
        // second group, whose copy then survives against the now-empty
        // first.
        let sel = complex(".a");
        let trimmed = trim(vec![vec![sel.clone()], vec![sel.clone()]], false);
        assert!(trimmed[0].is_empty());
        assert_eq!(trimmed[1].len(), 1);
    }

    #[test]
    fn test_trim_cutoff() {
        let groups: Vec<Vec<ComplexSelector>> = (0..101).map(|_| vec![complex(".a")]).collect();
        let trimmed = trim(groups.clone(), false);
        assert_eq!(trimmed.len(), groups.len());
        assert!(trimmed.iter().all(|g| g.len() == 1));
    }
}
