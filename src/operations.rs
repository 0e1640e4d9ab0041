/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Algebra over sets of cluster diagrams.
//!
//! Every operation takes its inputs by reference and returns new diagrams;
//! nothing handed in is modified. Merging happens on canonical copies.
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`ClusterOperations::product`] | roots identified, field points concatenated, weights multiplied |
//! | [`ClusterOperations::convolution`] | one root of each factor fused into a new field point |
//! | [`ClusterOperations::reduce`] | canonicalize, sort, merge by hash bucket |
//! | [`ClusterOperations::add_equivalents`] | canonicalize, merge by pairwise comparison |
//! | [`ClusterOperations::integrate`] | last root becomes a field point |
//! | [`ClusterOperations::sum`] / [`ClusterOperations::difference`] | concatenation then merge |
//! | [`ClusterOperations::make_ree_hoover`] | f-diagram → signed f/e full stars |
//! | [`ClusterOperations::to_e`] | f-diagram → signed e-diagrams |
//!
//! # Merge contract
//!
//! After `reduce` or `add_equivalents` there is at most one diagram per
//! isomorphism class, its weight is the exact sum of the weights of all
//! isomorphic inputs, and classes whose weights cancel to zero are gone.

use hashbrown::HashMap;
use tracing::debug;

use crate::canonical::{CanonicalKey, CanonicalOrdering, DiagramOrdering, Score};
use crate::diagram::{BondBasis, ClusterDiagram};
use crate::error::{ClusterError, ClusterResult};
use crate::rational::RationalWeight;

/// Largest number of pairs a single Ree-Hoover or e-bond expansion may toggle.
pub const MAX_EXPANSION_PAIRS: usize = 20;

/// Stateless diagram-set algebra parameterised by a sort strategy.
#[derive(Clone, Debug, Default)]
pub struct ClusterOperations<O: DiagramOrdering = CanonicalOrdering> {
    ordering: O,
}

impl ClusterOperations<CanonicalOrdering> {
    /// Algebra with the default [`CanonicalOrdering`].
    pub fn new() -> Self {
        Self {
            ordering: CanonicalOrdering,
        }
    }
}

fn require_multiplicative_basis(
    operation: &'static str,
    d1: &ClusterDiagram,
    d2: &ClusterDiagram,
) -> ClusterResult<BondBasis> {
    // Undrawn pairs of a Ree-Hoover diagram are e-bonds, so gluing two of them
    // would silently drop the cross e-bonds.
    for d in [d1, d2] {
        if d.basis() == BondBasis::ReeHoover {
            return Err(ClusterError::IncompatibleBasis {
                operation,
                basis: d.basis().name(),
            });
        }
    }
    if d1.basis() != d2.basis() {
        return Err(ClusterError::IncompatibleBasis {
            operation,
            basis: d2.basis().name(),
        });
    }
    Ok(d1.basis())
}

fn same_shape(a: &ClusterDiagram, b: &ClusterDiagram) -> bool {
    a.num_body() == b.num_body()
        && a.num_root_points() == b.num_root_points()
        && a.basis() == b.basis()
        && a.num_connections() == b.num_connections()
}

impl<O: DiagramOrdering> ClusterOperations<O> {
    /// Algebra with a caller-supplied sort strategy.
    pub fn with_ordering(ordering: O) -> Self {
        Self { ordering }
    }

    /// The sort strategy in use.
    pub fn ordering(&self) -> &O {
        &self.ordering
    }

    /// Sort in place by the strategy.
    pub fn sort(&self, list: &mut [ClusterDiagram]) {
        list.sort_by(|a, b| self.ordering.compare(a, b));
    }

    // ── products ───────────────────────────────────────────────────────────

    /// Product of two diagrams sharing their root points.
    ///
    /// Field points of `d2` are numbered after those of `d1`. Both factors
    /// bonding the same root pair is an error.
    pub fn product(&self, d1: &ClusterDiagram, d2: &ClusterDiagram) -> ClusterResult<ClusterDiagram> {
        let roots = d1.num_root_points();
        if roots != d2.num_root_points() {
            return Err(ClusterError::RootCountMismatch {
                left: roots,
                right: d2.num_root_points(),
            });
        }
        let basis = require_multiplicative_basis("product", d1, d2)?;
        for (i, j) in d2.bonds() {
            if j < roots && d1.is_connected(i, j) {
                return Err(ClusterError::ConflictingRootBonds(i, j));
            }
        }

        let f1 = d1.num_field_points();
        let n = roots + f1 + d2.num_field_points();
        let mut out = ClusterDiagram::empty(n, roots)?.with_basis(basis);
        for (i, j) in d1.bonds() {
            out.add_connection(i, j)?;
        }
        let shift = |p: usize| if p < roots { p } else { p + f1 };
        for (i, j) in d2.bonds() {
            out.add_connection(shift(i), shift(j))?;
        }
        out.set_weight(d1.weight() * d2.weight());
        out.set_ree_hoover_factor(d1.ree_hoover_factor() * d2.ree_hoover_factor());
        Ok(out)
    }

    /// Every pairwise product of two sets, merged.
    pub fn product_sets(
        &self,
        s1: &[ClusterDiagram],
        s2: &[ClusterDiagram],
    ) -> ClusterResult<Vec<ClusterDiagram>> {
        let mut out = Vec::with_capacity(s1.len() * s2.len());
        for a in s1 {
            for b in s2 {
                out.push(self.product(a, b)?);
            }
        }
        Ok(self.add_equivalents(&out))
    }

    /// Convolution of two two-root diagrams.
    ///
    /// Root 1 of `d1` and root 0 of `d2` fuse into a new field point. The
    /// result has root 0 from `d1`, root 1 from `d2`, the fused point at
    /// index 2, then the field points of `d1`, then those of `d2`.
    pub fn convolution(
        &self,
        d1: &ClusterDiagram,
        d2: &ClusterDiagram,
    ) -> ClusterResult<ClusterDiagram> {
        if d1.num_root_points() != 2 || d2.num_root_points() != 2 {
            return Err(ClusterError::ConvolutionRoots {
                left: d1.num_root_points(),
                right: d2.num_root_points(),
            });
        }
        let basis = require_multiplicative_basis("convolution", d1, d2)?;
        let f1 = d1.num_field_points();
        let n = 3 + f1 + d2.num_field_points();
        let mut out = ClusterDiagram::empty(n, 2)?.with_basis(basis);

        let map1 = |p: usize| match p {
            0 => 0,
            1 => 2,
            k => k + 1,
        };
        let map2 = |p: usize| match p {
            0 => 2,
            1 => 1,
            k => k + 1 + f1,
        };
        for (i, j) in d1.bonds() {
            out.add_connection(map1(i), map1(j))?;
        }
        for (i, j) in d2.bonds() {
            out.add_connection(map2(i), map2(j))?;
        }
        out.set_weight(d1.weight() * d2.weight());
        out.set_ree_hoover_factor(d1.ree_hoover_factor() * d2.ree_hoover_factor());
        Ok(out)
    }

    /// Every pairwise convolution of two sets, merged.
    pub fn convolution_sets(
        &self,
        s1: &[ClusterDiagram],
        s2: &[ClusterDiagram],
    ) -> ClusterResult<Vec<ClusterDiagram>> {
        let mut out = Vec::with_capacity(s1.len() * s2.len());
        for a in s1 {
            for b in s2 {
                out.push(self.convolution(a, b)?);
            }
        }
        Ok(self.add_equivalents(&out))
    }

    // ── merging ────────────────────────────────────────────────────────────

    /// Canonicalize, sort, and merge isomorphic diagrams through a hash bucket.
    ///
    /// Output follows the sort strategy.
    pub fn reduce(&self, list: &[ClusterDiagram]) -> Vec<ClusterDiagram> {
        let mut work: Vec<ClusterDiagram> = list.iter().map(ClusterDiagram::canonical).collect();
        self.sort(&mut work);

        let mut index: HashMap<CanonicalKey, usize> = HashMap::with_capacity(work.len());
        let mut out: Vec<ClusterDiagram> = Vec::with_capacity(work.len());
        for d in work {
            let key = CanonicalKey {
                num_body: d.num_body(),
                num_root_points: d.num_root_points(),
                basis: d.basis(),
                score: d.calc_score(),
            };
            match index.get(&key) {
                Some(&slot) => {
                    let merged = out[slot].weight() + d.weight();
                    out[slot].set_weight(merged);
                }
                None => {
                    index.insert(key, out.len());
                    out.push(d);
                }
            }
        }
        let before = out.len();
        out.retain(|d| !d.weight().is_zero());
        debug!(
            input = list.len(),
            classes = before,
            output = out.len(),
            "reduced diagram set"
        );
        out
    }

    /// Merge isomorphic diagrams by pairwise comparison against the kept list.
    ///
    /// Each kept diagram is held in its highest-scoring (canonical) labeling.
    /// A newcomer is matched with [`ClusterDiagram::score_greater_than`]
    /// against each kept score: an exact tie is a twin. Output follows first
    /// occurrence in `list`.
    pub fn add_equivalents(&self, list: &[ClusterDiagram]) -> Vec<ClusterDiagram> {
        let mut kept: Vec<(ClusterDiagram, Score)> = Vec::with_capacity(list.len());
        for d in list {
            let canonical = d.canonical();
            // Scratch copy whose tie counter starts at zero.
            let mut challenger = canonical.clone();
            challenger.set_num_identical_permutations(0);
            let twin = kept.iter_mut().find(|(existing, existing_score)| {
                same_shape(existing, &challenger)
                    && !challenger.score_greater_than(existing_score)
                    && challenger.num_identical_permutations() > 0
            });
            match twin {
                Some((existing, _)) => {
                    let merged = existing.weight() + canonical.weight();
                    existing.set_weight(merged);
                }
                None => {
                    let score = canonical.calc_score();
                    kept.push((canonical, score));
                }
            }
        }
        let classes = kept.len();
        let out: Vec<ClusterDiagram> = kept
            .into_iter()
            .map(|(d, _)| d)
            .filter(|d| !d.weight().is_zero())
            .collect();
        debug!(
            input = list.len(),
            classes,
            output = out.len(),
            "merged equivalent diagrams"
        );
        out
    }

    // ── set arithmetic ─────────────────────────────────────────────────────

    /// Integrate over the highest-index root point of every diagram.
    pub fn integrate(&self, list: &[ClusterDiagram]) -> ClusterResult<Vec<ClusterDiagram>> {
        let mut out = Vec::with_capacity(list.len());
        for d in list {
            let mut copy = d.clone();
            copy.demote_last_root()?;
            out.push(copy);
        }
        Ok(self.add_equivalents(&out))
    }

    /// `set1 + set2`, merged.
    pub fn sum(&self, set1: &[ClusterDiagram], set2: &[ClusterDiagram]) -> Vec<ClusterDiagram> {
        let all: Vec<ClusterDiagram> = set1.iter().chain(set2.iter()).cloned().collect();
        self.add_equivalents(&all)
    }

    /// `set1 − set2`, merged.
    pub fn difference(&self, set1: &[ClusterDiagram], set2: &[ClusterDiagram]) -> Vec<ClusterDiagram> {
        let all: Vec<ClusterDiagram> = set1
            .iter()
            .cloned()
            .chain(self.negate(set2))
            .collect();
        self.add_equivalents(&all)
    }

    /// Copy of `list` with every weight multiplied by `factor`.
    pub fn scale(&self, list: &[ClusterDiagram], factor: RationalWeight) -> Vec<ClusterDiagram> {
        if factor.is_zero() {
            return Vec::new();
        }
        list.iter()
            .map(|d| {
                let mut copy = d.clone();
                copy.set_weight(d.weight() * factor);
                copy
            })
            .collect()
    }

    /// Copy of `list` with every weight negated.
    pub fn negate(&self, list: &[ClusterDiagram]) -> Vec<ClusterDiagram> {
        self.scale(list, -RationalWeight::one())
    }

    /// Sum of all weights in `list`.
    pub fn total_weight(&self, list: &[ClusterDiagram]) -> RationalWeight {
        list.iter().map(ClusterDiagram::weight).sum()
    }

    // ── basis changes ──────────────────────────────────────────────────────

    /// Rewrite an f-bond diagram as signed Ree-Hoover diagrams.
    ///
    /// Each of the `k` unbonded pairs is written as `e − f`; the `2^k` terms
    /// draw the chosen subset as f-bonds and leave the rest as implicit
    /// e-bonds. Odd subsets carry a negated weight. Terms are returned
    /// unmerged, in subset-bitmask order.
    pub fn make_ree_hoover(&self, d: &ClusterDiagram) -> ClusterResult<Vec<ClusterDiagram>> {
        if d.basis() != BondBasis::Mayer {
            return Err(ClusterError::IncompatibleBasis {
                operation: "make_ree_hoover",
                basis: d.basis().name(),
            });
        }
        let missing = d.missing_bonds();
        let k = missing.len();
        if k > MAX_EXPANSION_PAIRS {
            return Err(ClusterError::TooManyPairs {
                pairs: k,
                max: MAX_EXPANSION_PAIRS,
            });
        }
        let mut out = Vec::with_capacity(1 << k);
        for mask in 0u32..(1u32 << k) {
            let mut term = d.clone().with_basis(BondBasis::ReeHoover);
            for (bit, &(i, j)) in missing.iter().enumerate() {
                if (mask >> bit) & 1 == 1 {
                    term.add_connection(i, j)?;
                }
            }
            let sign: i32 = if mask.count_ones() % 2 == 1 { -1 } else { 1 };
            term.set_weight(d.weight() * RationalWeight::from_integer(i64::from(sign)));
            term.set_ree_hoover_factor(d.ree_hoover_factor() * sign);
            term.set_num_identical_permutations(1);
            out.push(term);
        }
        Ok(out)
    }

    /// Ree-Hoover expansion of every diagram in `list`, merged.
    pub fn make_ree_hoover_set(&self, list: &[ClusterDiagram]) -> ClusterResult<Vec<ClusterDiagram>> {
        let mut all = Vec::new();
        for d in list {
            all.extend(self.make_ree_hoover(d)?);
        }
        Ok(self.add_equivalents(&all))
    }

    /// Rewrite an f-bond diagram in e-bonds, replacing each `f` by `e − 1`.
    ///
    /// Bonds are expanded one at a time; every step doubles the term list,
    /// keeping the bond (now an e-bond) or dropping it with a negated weight.
    /// The finished terms are merged.
    pub fn to_e(&self, d: &ClusterDiagram) -> ClusterResult<Vec<ClusterDiagram>> {
        if d.basis() != BondBasis::Mayer {
            return Err(ClusterError::IncompatibleBasis {
                operation: "to_e",
                basis: d.basis().name(),
            });
        }
        let bonds = d.bonds();
        if bonds.len() > MAX_EXPANSION_PAIRS {
            return Err(ClusterError::TooManyPairs {
                pairs: bonds.len(),
                max: MAX_EXPANSION_PAIRS,
            });
        }
        let mut terms = vec![d.clone().with_basis(BondBasis::Boltzmann)];
        for (i, j) in bonds {
            let mut next = Vec::with_capacity(terms.len() * 2);
            for term in terms {
                let mut dropped = term.clone();
                dropped.delete_connection(i, j)?;
                dropped.set_weight(-term.weight());
                next.push(term);
                next.push(dropped);
            }
            terms = next;
        }
        Ok(self.add_equivalents(&terms))
    }

    /// e-bond expansion of every diagram in `list`, merged.
    pub fn to_e_set(&self, list: &[ClusterDiagram]) -> ClusterResult<Vec<ClusterDiagram>> {
        let mut all = Vec::new();
        for d in list {
            all.extend(self.to_e(d)?);
        }
        Ok(self.add_equivalents(&all))
    }
}
