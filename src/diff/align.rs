//! Clause alignment between two documents.
//!
//! Labels that occur exactly once on both sides are matched directly. Every
//! other clause goes through an LCS over normalized bodies, and whatever the
//! LCS leaves between two anchors is paired up positionally.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::clause::Clause;

/// How a clause of one document relates to the other document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Clause `a` of A aligned with clause `b` of B
    Both(usize, usize),
    /// Clause of A with no counterpart
    OnlyA(usize),
    /// Clause of B with no counterpart
    OnlyB(usize),
}

/// Align clauses of `a` against clauses of `b`.
///
/// `bodies_a`/`bodies_b` are the normalized bodies, indexed like the clauses.
pub fn align(a: &[Clause], b: &[Clause], bodies_a: &[String], bodies_b: &[String]) -> Vec<Pairing> {
    let keys_a = key_counts(a);
    let keys_b = key_counts(b);
    let mut pairings = Vec::new();

    let b_by_key: HashMap<String, usize> = b
        .iter()
        .filter_map(|clause| clause.key().map(|k| (k, clause.index)))
        .collect();

    let mut pool_a = Vec::new();
    for clause in a {
        match label_status(clause, &keys_a, &keys_b) {
            LabelStatus::Matched(key) => {
                if let Some(&j) = b_by_key.get(&key) {
                    pairings.push(Pairing::Both(clause.index, j));
                }
            }
            LabelStatus::Unmatched => pairings.push(Pairing::OnlyA(clause.index)),
            LabelStatus::Pooled => pool_a.push(clause.index),
        }
    }

    let mut pool_b = Vec::new();
    for clause in b {
        match label_status(clause, &keys_b, &keys_a) {
            // Already paired from the A side
            LabelStatus::Matched(_) => {}
            LabelStatus::Unmatched => pairings.push(Pairing::OnlyB(clause.index)),
            LabelStatus::Pooled => pool_b.push(clause.index),
        }
    }

    pairings.extend(align_pool(&pool_a, &pool_b, bodies_a, bodies_b));
    pairings
}

enum LabelStatus {
    /// Label unique on both sides
    Matched(String),
    /// Label unique on this side and absent on the other
    Unmatched,
    /// Unlabeled or duplicated somewhere
    Pooled,
}

fn label_status(
    clause: &Clause,
    own: &HashMap<String, usize>,
    other: &HashMap<String, usize>,
) -> LabelStatus {
    let Some(key) = clause.key() else {
        return LabelStatus::Pooled;
    };
    match (own.get(&key).copied(), other.get(&key).copied()) {
        (Some(1), Some(1)) => LabelStatus::Matched(key),
        (Some(1), None) => LabelStatus::Unmatched,
        _ => LabelStatus::Pooled,
    }
}

fn key_counts(clauses: &[Clause]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for key in clauses.iter().filter_map(Clause::key) {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// LCS alignment of two pools of clause indices.
///
/// Ties in the LCS walk skip the clause with the smaller index in its own
/// document, then the one with the smaller body, so swapping the inputs
/// mirrors the result.
fn align_pool(
    pool_a: &[usize],
    pool_b: &[usize],
    bodies_a: &[String],
    bodies_b: &[String],
) -> Vec<Pairing> {
    let n = pool_a.len();
    let m = pool_b.len();
    let body_a = |i: usize| bodies_a[pool_a[i]].as_str();
    let body_b = |j: usize| bodies_b[pool_b[j]].as_str();

    // suffix[i][j] = LCS length of pool_a[i..] and pool_b[j..]
    let mut suffix = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            suffix[i][j] = if body_a(i) == body_b(j) {
                suffix[i + 1][j + 1] + 1
            } else {
                suffix[i + 1][j].max(suffix[i][j + 1])
            };
        }
    }

    let mut pairings = Vec::new();
    let mut gap_a = Vec::new();
    let mut gap_b = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < n && j < m {
        if body_a(i) == body_b(j) {
            flush_gap(&mut gap_a, &mut gap_b, &mut pairings);
            pairings.push(Pairing::Both(pool_a[i], pool_b[j]));
            i += 1;
            j += 1;
            continue;
        }

        let skip_a = match suffix[i + 1][j].cmp(&suffix[i][j + 1]) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match pool_a[i].cmp(&pool_b[j]) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => body_a(i) < body_b(j),
            },
        };
        if skip_a {
            gap_a.push(pool_a[i]);
            i += 1;
        } else {
            gap_b.push(pool_b[j]);
            j += 1;
        }
    }
    gap_a.extend_from_slice(&pool_a[i..]);
    gap_b.extend_from_slice(&pool_b[j..]);
    flush_gap(&mut gap_a, &mut gap_b, &mut pairings);
    pairings
}

/// Pair unmatched clauses between two anchors positionally.
fn flush_gap(gap_a: &mut Vec<usize>, gap_b: &mut Vec<usize>, out: &mut Vec<Pairing>) {
    let paired = gap_a.len().min(gap_b.len());
    out.extend(
        gap_a
            .iter()
            .zip(gap_b.iter())
            .map(|(&a, &b)| Pairing::Both(a, b)),
    );
    out.extend(gap_a[paired..].iter().map(|&a| Pairing::OnlyA(a)));
    out.extend(gap_b[paired..].iter().map(|&b| Pairing::OnlyB(b)));
    gap_a.clear();
    gap_b.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::clause::normalize_body;

    fn clauses(items: &[(Option<&str>, &str)]) -> Vec<Clause> {
        items
            .iter()
            .enumerate()
            .map(|(index, (label, body))| Clause {
                index,
                label: label.map(str::to_string),
                title: String::new(),
                body: body.to_string(),
                page_index: 0,
                start: 0,
                end: 0,
            })
            .collect()
    }

    fn bodies(clauses: &[Clause]) -> Vec<String> {
        clauses.iter().map(Clause::normalized_body).collect()
    }

    fn run(a: &[Clause], b: &[Clause]) -> Vec<Pairing> {
        let mut p = align(a, b, &bodies(a), &bodies(b));
        p.sort_by_key(|p| format!("{:?}", p));
        p
    }

    #[test]
    fn test_unique_labels_match() {
        let a = clauses(&[(Some("제1조"), "x"), (Some("제2조"), "y")]);
        let b = clauses(&[(Some("제2조"), "y"), (Some("제 3 조"), "z")]);
        let p = run(&a, &b);
        assert!(p.contains(&Pairing::Both(1, 0)));
        assert!(p.contains(&Pairing::OnlyA(0)));
        assert!(p.contains(&Pairing::OnlyB(1)));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_unlabeled_clauses_use_lcs() {
        let a = clauses(&[(None, "alpha"), (None, "beta"), (None, "gamma")]);
        let b = clauses(&[(None, "alpha"), (None, "gamma")]);
        let p = align(&a, &b, &bodies(&a), &bodies(&b));
        assert_eq!(
            p,
            vec![Pairing::Both(0, 0), Pairing::OnlyA(1), Pairing::Both(2, 1)]
        );
    }

    #[test]
    fn test_gap_pairs_positionally() {
        let a = clauses(&[(None, "same"), (None, "old one"), (None, "end")]);
        let b = clauses(&[(None, "same"), (None, "new one"), (None, "extra"), (None, "end")]);
        let p = align(&a, &b, &bodies(&a), &bodies(&b));
        assert_eq!(
            p,
            vec![
                Pairing::Both(0, 0),
                Pairing::Both(1, 1),
                Pairing::OnlyB(2),
                Pairing::Both(2, 3)
            ]
        );
    }

    #[test]
    fn test_duplicate_labels_are_pooled() {
        let a = clauses(&[(Some("Article 1"), "a"), (Some("Article 1"), "b")]);
        let b = clauses(&[(Some("article 1"), "b")]);
        let p = align(&a, &b, &bodies(&a), &bodies(&b));
        assert_eq!(p, vec![Pairing::OnlyA(0), Pairing::Both(1, 0)]);
    }

    #[test]
    fn test_alignment_is_symmetric() {
        let a = clauses(&[(None, "p"), (None, "q"), (None, "r")]);
        let b = clauses(&[(None, "r"), (None, "q"), (None, "p")]);
        let forward = run(&a, &b);
        let mut backward: Vec<Pairing> = align(&b, &a, &bodies(&b), &bodies(&a))
            .into_iter()
            .map(|p| match p {
                Pairing::Both(x, y) => Pairing::Both(y, x),
                Pairing::OnlyA(x) => Pairing::OnlyB(x),
                Pairing::OnlyB(y) => Pairing::OnlyA(y),
            })
            .collect();
        backward.sort_by_key(|p| format!("{:?}", p));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_normalized_bodies_compare_equal() {
        assert_eq!(normalize_body("a  b\n"), normalize_body(" a b"));
    }
}
