/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Lowered bond tables for numeric evaluation.
//!
//! A [`ClusterBonds`] is the read-only, evaluator-facing form of one diagram:
//! an `n × n` table mapping each point pair to a bond-type index (or no bond).
//! Bond-type indices live in two spaces, matching [`crate::sum::ClusterSum`]:
//!
//! ```text
//! [0, P)      physical:  f-bond of provider p        → index p
//! [P, 2P)     implied:   e-bond of provider p (f + 1) → index P + p
//! ```
//!
//! # Permutation averaging
//!
//! With permutations enabled the table also stores every relabeling of the
//! points that yields a *different* index table (identity first). `value`
//! then averages the bond product over those relabelings. This is a purely
//! syntactic symmetry, weaker than diagram isomorphism.

use hashbrown::HashSet;

use crate::diagram::{BondKind, ClusterDiagram};
use crate::error::{ClusterError, ClusterResult};

/// Largest point count for which the permutation table may be built.
pub const MAX_SYMMETRIZED_POINTS: usize = 9;

// ─── BondTypeMap ─────────────────────────────────────────────────────────────

/// Mapping from [`BondKind`] to evaluator bond-type index for one provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BondTypeMap {
    provider: usize,
    num_providers: usize,
}

impl BondTypeMap {
    /// f-bonds of `provider` map to `provider`, e-bonds to `num_providers + provider`.
    pub fn for_provider(provider: usize, num_providers: usize) -> ClusterResult<Self> {
        if provider >= num_providers {
            return Err(ClusterError::BondTypeOutOfRange {
                index: provider,
                limit: num_providers,
            });
        }
        Ok(Self {
            provider,
            num_providers,
        })
    }

    /// Evaluator index of `kind`.
    pub fn index_of(&self, kind: BondKind) -> usize {
        match kind {
            BondKind::Mayer => self.provider,
            BondKind::Boltzmann => self.num_providers + self.provider,
        }
    }

    /// Size of the full index space, physical plus implied.
    pub fn bond_type_count(&self) -> usize {
        2 * self.num_providers
    }
}

// ─── PairValues ──────────────────────────────────────────────────────────────

/// Dense `pair → bond type → value` table, symmetric in the pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairValues {
    point_count: usize,
    bond_types: usize,
    data: Vec<f64>,
}

impl PairValues {
    /// All-zero table.
    pub fn new(point_count: usize, bond_types: usize) -> Self {
        Self {
            point_count,
            bond_types,
            data: vec![0.0; point_count * point_count * bond_types],
        }
    }

    fn offset(&self, i: usize, j: usize, bond_type: usize) -> usize {
        (i * self.point_count + j) * self.bond_types + bond_type
    }

    /// Value for pair `(i, j)` under `bond_type`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, bond_type: usize) -> f64 {
        self.data[self.offset(i, j, bond_type)]
    }

    /// Store `value` for `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, bond_type: usize, value: f64) {
        let a = self.offset(i, j, bond_type);
        let b = self.offset(j, i, bond_type);
        self.data[a] = value;
        self.data[b] = value;
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of bond types per pair.
    pub fn bond_types(&self) -> usize {
        self.bond_types
    }
}

// ─── ClusterBonds ────────────────────────────────────────────────────────────

/// Bond-type index table of one diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterBonds {
    point_count: usize,
    /// Row-major `n × n`; `None` is no bond.
    bond_index: Vec<Option<usize>>,
    /// `(i, j, type)` with `i < j`, lexicographic.
    bonded: Vec<(usize, usize, usize)>,
    permutations: Option<Vec<Vec<usize>>>,
}

/// Advance `perm` to the next lexicographic permutation; `false` after the last.
fn next_permutation(perm: &mut [usize]) -> bool {
    if perm.len() < 2 {
        return false;
    }
    let mut i = perm.len() - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = perm.len() - 1;
    while perm[j] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j);
    perm[i..].reverse();
    true
}

impl ClusterBonds {
    /// Build from one pair list per bond type; group `t` gets index `t`.
    pub fn new(
        point_count: usize,
        bond_groups: &[Vec<(usize, usize)>],
        use_permutations: bool,
    ) -> ClusterResult<Self> {
        let mut bond_index = vec![None; point_count * point_count];
        for (bond_type, group) in bond_groups.iter().enumerate() {
            for &(i, j) in group {
                if i == j || i >= point_count || j >= point_count {
                    return Err(ClusterError::InvalidBond(i, j, point_count));
                }
                if bond_index[i * point_count + j].is_some() {
                    return Err(ClusterError::PairAssignedTwice(i.min(j), i.max(j)));
                }
                bond_index[i * point_count + j] = Some(bond_type);
                bond_index[j * point_count + i] = Some(bond_type);
            }
        }
        let mut bonded = Vec::new();
        for i in 0..point_count {
            for j in (i + 1)..point_count {
                if let Some(t) = bond_index[i * point_count + j] {
                    bonded.push((i, j, t));
                }
            }
        }
        let mut bonds = Self {
            point_count,
            bond_index,
            bonded,
            permutations: None,
        };
        if use_permutations {
            if point_count > MAX_SYMMETRIZED_POINTS {
                return Err(ClusterError::InvalidPointCount {
                    num_body: point_count,
                    num_root_points: 0,
                    max: MAX_SYMMETRIZED_POINTS,
                });
            }
            bonds.permutations = Some(bonds.distinct_relabelings());
        }
        Ok(bonds)
    }

    /// Lower a diagram through `map`; undrawn Ree-Hoover pairs become e-bonds.
    pub fn from_diagram(
        diagram: &ClusterDiagram,
        map: &BondTypeMap,
        use_permutations: bool,
    ) -> ClusterResult<Self> {
        let mut groups = vec![Vec::new(); map.bond_type_count()];
        let basis = diagram.basis();
        groups[map.index_of(basis.edge_kind())].extend(diagram.bonds());
        if let Some(kind) = basis.missing_kind() {
            groups[map.index_of(kind)].extend(diagram.missing_bonds());
        }
        Self::new(diagram.num_body(), &groups, use_permutations)
    }

    /// Identity plus each relabeling whose index table is new.
    fn distinct_relabelings(&self) -> Vec<Vec<usize>> {
        let mut perm: Vec<usize> = (0..self.point_count).collect();
        let mut seen: HashSet<Vec<(usize, usize, usize)>> = HashSet::new();
        let mut kept = Vec::new();
        loop {
            let mut image: Vec<(usize, usize, usize)> = self
                .bonded
                .iter()
                .map(|&(i, j, t)| {
                    let (a, b) = (perm[i], perm[j]);
                    (a.min(b), a.max(b), t)
                })
                .collect();
            image.sort_unstable();
            if seen.insert(image) {
                kept.push(perm.clone());
            }
            if !next_permutation(&mut perm) {
                break;
            }
        }
        kept
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Bond type between `i` and `j`, if bonded.
    pub fn bond_index(&self, i: usize, j: usize) -> Option<usize> {
        self.bond_index
            .get(i * self.point_count + j)
            .copied()
            .flatten()
    }

    /// Bonded pairs `(i, j, type)` with `i < j`.
    pub fn bonded_pairs(&self) -> &[(usize, usize, usize)] {
        &self.bonded
    }

    /// Stored relabelings; empty when averaging is off.
    pub fn permutations(&self) -> &[Vec<usize>] {
        self.permutations.as_deref().unwrap_or(&[])
    }

    /// `true` if `value` averages over relabelings.
    pub fn uses_permutations(&self) -> bool {
        self.permutations.is_some()
    }

    /// Largest bond type index used, if any bond exists.
    pub fn max_bond_type(&self) -> Option<usize> {
        self.bonded.iter().map(|&(_, _, t)| t).max()
    }

    /// Every `(i, j, type)` with `i < j` that `value` may read.
    pub fn referenced(&self) -> Vec<(usize, usize, usize)> {
        match &self.permutations {
            None => self.bonded.clone(),
            Some(perms) => {
                let mut all: HashSet<(usize, usize, usize)> = HashSet::new();
                for perm in perms {
                    for &(i, j, t) in &self.bonded {
                        let (a, b) = (perm[i], perm[j]);
                        all.insert((a.min(b), a.max(b), t));
                    }
                }
                let mut out: Vec<_> = all.into_iter().collect();
                out.sort_unstable();
                out
            }
        }
    }

    #[inline]
    fn product(&self, values: &PairValues, perm: Option<&[usize]>) -> f64 {
        let mut acc = 1.0;
        for &(i, j, t) in &self.bonded {
            let v = match perm {
                Some(p) => values.get(p[i], p[j], t),
                None => values.get(i, j, t),
            };
            if v == 0.0 {
                return 0.0;
            }
            acc *= v;
        }
        acc
    }

    /// Bond product for `values`, averaged over relabelings when enabled.
    pub fn value(&self, values: &PairValues) -> f64 {
        match &self.permutations {
            None => self.product(values, None),
            Some(perms) => {
                let total: f64 = perms.iter().map(|p| self.product(values, Some(p))).sum();
                total / perms.len() as f64
            }
        }
    }
}
