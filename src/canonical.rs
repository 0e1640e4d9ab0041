/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Canonical labeling and isomorphism testing for cluster diagrams.
//!
//! # Score
//!
//! For a labeling of `n` points and each offset `i = 1..=n/2`:
//!
//! ```text
//! score[i] = Σ_node 2^(n-1-node) · [bond(node, (node + i) mod n)]
//! ```
//!
//! Every unordered pair appears under exactly one (node, offset) slot and each
//! node owns a distinct bit, so the score vector encodes the adjacency of that
//! labeling exactly. The canonical labeling is the field-point permutation with
//! the lexicographically largest score; two diagrams are isomorphic iff their
//! canonical scores agree.
//!
//! # Search
//!
//! Exhaustive over field-point permutations, roots pinned in place. Positions
//! are filled in order; once positions `0..=k` are placed, the top `k` bits of
//! `score[1]` are fixed, and a branch whose fixed bits already fall below the
//! best complete labeling is cut. Ties at the end are automorphisms.
//!
//! The search is exponential in the field-point count. Diagrams in practice
//! stay at or below about ten points.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

use heapless::Vec as HVec;
use tracing::trace;

use crate::diagram::{BondBasis, ClusterDiagram, MAX_POINTS};

/// Offsets in a score vector for the largest diagram.
pub const MAX_SCORE_LEN: usize = MAX_POINTS / 2;

// ─── Score ───────────────────────────────────────────────────────────────────

/// Bit-packed bond signature of one labeling, offsets `1..=n/2` in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Score(HVec<u64, MAX_SCORE_LEN>);

impl Score {
    /// Score of an adjacency bit matrix under its own labeling.
    pub fn of_adjacency(adjacency: &[u64]) -> Self {
        let n = adjacency.len();
        let mut values = HVec::new();
        for offset in 1..=n / 2 {
            let mut value = 0u64;
            for (node, &row) in adjacency.iter().enumerate() {
                let other = (node + offset) % n;
                if (row >> other) & 1 == 1 {
                    value |= 1u64 << (n - 1 - node);
                }
            }
            // n ≤ MAX_POINTS, so n/2 offsets always fit.
            let _ = values.push(value);
        }
        Self(values)
    }

    /// Per-offset values; index 0 is offset 1.
    pub fn values(&self) -> &[u64] {
        self.0.as_slice()
    }

    /// Number of offsets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for a one-point diagram.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Hash for Score {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values().hash(state);
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.values().cmp(other.values())
    }
}

/// Hash key identifying an isomorphism class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    /// Total points.
    pub num_body: usize,
    /// Root points.
    pub num_root_points: usize,
    /// Bond basis.
    pub basis: BondBasis,
    /// Score of the canonical labeling.
    pub score: Score,
}

// ─── Ordering strategy ───────────────────────────────────────────────────────

/// Sort order for diagram lists, passed explicitly to the algebra.
pub trait DiagramOrdering {
    /// Compare two diagrams; `Less` sorts first.
    fn compare(&self, a: &ClusterDiagram, b: &ClusterDiagram) -> Ordering;
}

/// Most bonds first, then larger diagrams, then higher score of the current labeling.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalOrdering;

impl DiagramOrdering for CanonicalOrdering {
    fn compare(&self, a: &ClusterDiagram, b: &ClusterDiagram) -> Ordering {
        b.num_connections()
            .cmp(&a.num_connections())
            .then_with(|| b.num_body().cmp(&a.num_body()))
            .then_with(|| b.num_root_points().cmp(&a.num_root_points()))
            .then_with(|| b.calc_score().cmp(&a.calc_score()))
    }
}

// ─── Search ──────────────────────────────────────────────────────────────────

struct Search<'a> {
    adjacency: &'a [u64],
    n: usize,
    /// `order[pos]` is the original point placed at position `pos`.
    order: Vec<usize>,
    used: u64,
    best: Option<(Score, Vec<usize>)>,
    ties: u64,
    visited: u64,
}

impl<'a> Search<'a> {
    fn bonded(&self, p: usize, q: usize) -> bool {
        (self.adjacency[self.order[p]] >> self.order[q]) & 1 == 1
    }

    fn current_score(&self) -> Score {
        let relabeled: Vec<u64> = (0..self.n)
            .map(|p| {
                (0..self.n).fold(0u64, |acc, q| {
                    if self.bonded(p, q) {
                        acc | (1u64 << q)
                    } else {
                        acc
                    }
                })
            })
            .collect();
        Score::of_adjacency(&relabeled)
    }

    /// Top `fixed` bits of the best labeling's `score[1]`.
    fn best_prefix(&self, fixed: usize) -> Option<u64> {
        let (score, _) = self.best.as_ref()?;
        let first = *score.values().first()?;
        Some(first >> (self.n - fixed))
    }

    /// `prefix` holds the `score[1]` bits of nodes `0..pos-1`.
    fn extend(&mut self, pos: usize, prefix: u64) {
        if pos == self.n {
            self.visited += 1;
            let score = self.current_score();
            match &self.best {
                Some((best, _)) => match score.cmp(best) {
                    Ordering::Greater => {
                        self.best = Some((score, self.order.clone()));
                        self.ties = 1;
                    }
                    Ordering::Equal => self.ties += 1,
                    Ordering::Less => {}
                },
                None => {
                    self.best = Some((score, self.order.clone()));
                    self.ties = 1;
                }
            }
            return;
        }
        for point in 0..self.n {
            if (self.used >> point) & 1 == 1 {
                continue;
            }
            self.order[pos] = point;
            let mut next_prefix = prefix;
            if pos > 0 && self.n >= 2 {
                let bit = u64::from(self.bonded(pos - 1, pos));
                next_prefix = (prefix << 1) | bit;
                if let Some(best) = self.best_prefix(pos) {
                    if next_prefix < best {
                        continue;
                    }
                }
            }
            self.used |= 1u64 << point;
            self.extend(pos + 1, next_prefix);
            self.used &= !(1u64 << point);
        }
    }
}

/// Canonical labeling of `diagram` and its automorphism count.
///
/// Returns `order` with `order[pos]` = original point now at `pos`.
fn search_canonical(diagram: &ClusterDiagram) -> (Vec<usize>, u64) {
    let n = diagram.num_body();
    let roots = diagram.num_root_points();
    let adjacency = diagram.adjacency();
    let mut search = Search {
        adjacency: &adjacency,
        n,
        order: (0..n).collect(),
        used: 0,
        best: None,
        ties: 0,
        visited: 0,
    };
    // Roots stay pinned; their score[1] bits are common to every branch.
    let mut prefix = 0u64;
    for r in 0..roots {
        search.used |= 1u64 << r;
        if r > 0 {
            prefix = (prefix << 1) | u64::from(search.bonded(r - 1, r));
        }
    }
    search.extend(roots, prefix);
    trace!(
        num_body = n,
        num_root_points = roots,
        visited = search.visited,
        automorphisms = search.ties,
        "canonical search finished"
    );
    let order = search
        .best
        .map(|(_, order)| order)
        .unwrap_or_else(|| (0..n).collect());
    (order, search.ties.max(1))
}

impl ClusterDiagram {
    /// Score vector of the current labeling.
    pub fn calc_score(&self) -> Score {
        Score::of_adjacency(&self.adjacency())
    }

    /// Compare the current labeling against `candidate`, highest offset weight first.
    ///
    /// Returns `true` as soon as this labeling scores strictly higher at some
    /// offset and `false` as soon as it scores lower. An exact match counts an
    /// identical permutation and returns `false`.
    pub fn score_greater_than(&mut self, candidate: &Score) -> bool {
        let own = self.calc_score();
        for (mine, theirs) in own.values().iter().zip(candidate.values()) {
            match mine.cmp(theirs) {
                Ordering::Greater => return true,
                Ordering::Less => return false,
                Ordering::Equal => {}
            }
        }
        match own.len().cmp(&candidate.len()) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => {
                self.increment_identical_permutations();
                false
            }
        }
    }

    /// Copy in canonical labeling, with `num_identical_permutations` set to
    /// the automorphism count over field-point permutations.
    pub fn canonical(&self) -> ClusterDiagram {
        let (order, automorphisms) = search_canonical(self);
        let adjacency = self.adjacency();
        let n = self.num_body();
        let relabeled: Vec<u64> = (0..n)
            .map(|p| {
                (0..n).fold(0u64, |acc, q| {
                    if (adjacency[order[p]] >> order[q]) & 1 == 1 {
                        acc | (1u64 << q)
                    } else {
                        acc
                    }
                })
            })
            .collect();
        let mut out = self.from_adjacency_like(&relabeled);
        out.set_num_identical_permutations(automorphisms);
        out
    }

    /// Score of the canonical labeling.
    pub fn canonical_score(&self) -> Score {
        self.canonical().calc_score()
    }

    /// Key shared by every diagram in this diagram's isomorphism class.
    pub fn canonical_key(&self) -> CanonicalKey {
        CanonicalKey {
            num_body: self.num_body(),
            num_root_points: self.num_root_points(),
            basis: self.basis(),
            score: self.canonical_score(),
        }
    }

    /// `true` if some field-point relabeling maps `self` onto `other`.
    ///
    /// Point counts, root counts and bond basis must agree.
    pub fn is_isomorph_of(&self, other: &ClusterDiagram) -> bool {
        if self.num_body() != other.num_body()
            || self.num_root_points() != other.num_root_points()
            || self.basis() != other.basis()
            || self.num_connections() != other.num_connections()
        {
            return false;
        }
        self.canonical_score() == other.canonical_score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_of_triangle() {
        let d = ClusterDiagram::full_star(3, 0).unwrap();
        // n=3, one offset; every node bonded to its successor.
        assert_eq!(d.calc_score().values(), &[0b111]);
    }

    #[test]
    fn test_score_of_single_point_is_empty() {
        let d = ClusterDiagram::empty(1, 0).unwrap();
        assert!(d.calc_score().is_empty());
    }

    #[test]
    fn test_canonical_prefers_early_bonds() {
        // Single bond between the last two points moves to (0, 1).
        let d = ClusterDiagram::from_bonds(4, 0, &[(2, 3)]).unwrap();
        let c = d.canonical();
        assert!(c.is_connected(0, 1));
        assert_eq!(c.num_connections(), 1);
    }

    #[test]
    fn test_roots_are_never_moved() {
        let d = ClusterDiagram::from_bonds(3, 1, &[(1, 2)]).unwrap();
        let c = d.canonical();
        // Root 0 stays isolated; the field bond stays between the field points.
        assert!(c.connections(0).is_empty());
        assert!(c.is_connected(1, 2));
    }

    #[test]
    fn test_automorphisms_of_triangle() {
        let d = ClusterDiagram::full_star(3, 0).unwrap();
        assert_eq!(d.canonical().num_identical_permutations(), 6);
        let rooted = ClusterDiagram::full_star(3, 1).unwrap();
        assert_eq!(rooted.canonical().num_identical_permutations(), 2);
    }

    #[test]
    fn test_automorphisms_of_ring_of_four() {
        let d = ClusterDiagram::from_bonds(4, 0, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert_eq!(d.canonical().num_identical_permutations(), 8);
    }

    #[test]
    fn test_relabeled_chains_are_isomorphic() {
        let a = ClusterDiagram::from_bonds(4, 0, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let b = ClusterDiagram::from_bonds(4, 0, &[(2, 0), (0, 3), (3, 1)]).unwrap();
        assert!(a.is_isomorph_of(&b));
        assert!(b.is_isomorph_of(&a));
        assert!(a.is_isomorph_of(&a));
    }

    #[test]
    fn test_star_and_chain_are_not_isomorphic() {
        let chain = ClusterDiagram::from_bonds(4, 0, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let star = ClusterDiagram::from_bonds(4, 0, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        assert!(!chain.is_isomorph_of(&star));
        assert!(!star.is_isomorph_of(&chain));
    }

    #[test]
    fn test_root_position_is_significant() {
        // Root 0 bonded vs root 1 bonded to the field point.
        let a = ClusterDiagram::from_bonds(3, 2, &[(0, 2)]).unwrap();
        let b = ClusterDiagram::from_bonds(3, 2, &[(1, 2)]).unwrap();
        assert!(!a.is_isomorph_of(&b));
    }

    #[test]
    fn test_mismatched_root_counts_not_isomorphic() {
        let a = ClusterDiagram::full_star(3, 0).unwrap();
        let b = ClusterDiagram::full_star(3, 1).unwrap();
        assert!(!a.is_isomorph_of(&b));
    }

    #[test]
    fn test_score_greater_than_counts_ties() {
        let mut d = ClusterDiagram::from_bonds(3, 0, &[(0, 1)]).unwrap();
        let own = d.calc_score();
        assert!(!d.score_greater_than(&own));
        assert_eq!(d.num_identical_permutations(), 2);

        let lower = ClusterDiagram::from_bonds(3, 0, &[(1, 2)]).unwrap().calc_score();
        assert!(d.score_greater_than(&lower));
        let higher = ClusterDiagram::full_star(3, 0).unwrap().calc_score();
        assert!(!d.score_greater_than(&higher));
        assert_eq!(d.num_identical_permutations(), 2);
    }

    #[test]
    fn test_canonical_key_is_shared_by_relabelings() {
        let a = ClusterDiagram::from_bonds(5, 1, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let b = a.permuted(&[0, 4, 2, 3, 1]).unwrap();
        assert_eq!(a.canonical_key(), b.canonical_key());
        let boltzmann = a.clone().with_basis(BondBasis::Boltzmann);
        assert_ne!(a.canonical_key(), boltzmann.canonical_key());
        let unrooted = ClusterDiagram::from_bonds(5, 0, &a.bonds()).unwrap();
        assert_ne!(a.canonical_key(), unrooted.canonical_key());
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let d = ClusterDiagram::from_bonds(5, 1, &[(0, 3), (3, 4), (4, 1), (2, 1)]).unwrap();
        let c = d.canonical();
        let cc = c.canonical();
        assert_eq!(c.bonds(), cc.bonds());
        assert_eq!(c.num_identical_permutations(), cc.num_identical_permutations());
    }

    #[test]
    fn test_canonical_ordering_puts_more_bonds_first() {
        let few = ClusterDiagram::from_bonds(3, 0, &[(0, 1)]).unwrap();
        let many = ClusterDiagram::full_star(3, 0).unwrap();
        assert_eq!(CanonicalOrdering.compare(&many, &few), Ordering::Less);
    }
}
