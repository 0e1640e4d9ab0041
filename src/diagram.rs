/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Cluster diagrams: labeled graphs over root and field points.
//!
//! A [`ClusterDiagram`] stands for one term of the virial series: points are
//! molecules, drawn edges are bond functions, and the exact
//! [`RationalWeight`] is the term's combinatorial coefficient.
//!
//! # Points
//!
//! Points `0..num_root_points` are roots: fixed external coordinates that are
//! never exchanged with field points. The remaining points are field points,
//! integrated over and freely relabeled by canonicalization.
//!
//! # Bond basis
//!
//! What an edge (and a missing edge) means is carried by [`BondBasis`]:
//!
//! | Basis | drawn edge | undrawn pair |
//! |-------|------------|--------------|
//! | `Mayer` | f-bond | nothing |
//! | `ReeHoover` | f-bond | e-bond |
//! | `Boltzmann` | e-bond | nothing |
//!
//! # Invariants
//! - Point and root counts are fixed at construction.
//! - `i ∈ connections(j)` ⇔ `j ∈ connections(i)`; no self-bonds.
//! - `num_connections` equals the number of bonded pairs `i < j`.
//! - Adding an existing bond or deleting a missing one is an error.

use crate::error::{ClusterError, ClusterResult};
use crate::rational::RationalWeight;

/// Largest diagram supported; one `u64` adjacency row per point.
pub const MAX_POINTS: usize = 64;

/// The two bond functions of the Mayer expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BondKind {
    /// Mayer f-bond, `f = e^{-βu} − 1`.
    Mayer,
    /// Boltzmann e-bond, `e = 1 + f`.
    Boltzmann,
}

/// Interpretation of drawn and undrawn pairs in a diagram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BondBasis {
    /// Drawn edges are f-bonds; undrawn pairs carry no factor.
    #[default]
    Mayer,
    /// Drawn edges are f-bonds; every undrawn pair is an e-bond.
    ReeHoover,
    /// Drawn edges are e-bonds; undrawn pairs carry no factor.
    Boltzmann,
}

impl BondBasis {
    /// Bond function of a drawn edge.
    pub fn edge_kind(&self) -> BondKind {
        match self {
            Self::Mayer | Self::ReeHoover => BondKind::Mayer,
            Self::Boltzmann => BondKind::Boltzmann,
        }
    }

    /// Bond function implied on an undrawn pair, if any.
    pub fn missing_kind(&self) -> Option<BondKind> {
        match self {
            Self::ReeHoover => Some(BondKind::Boltzmann),
            Self::Mayer | Self::Boltzmann => None,
        }
    }

    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mayer => "Mayer",
            Self::ReeHoover => "ReeHoover",
            Self::Boltzmann => "Boltzmann",
        }
    }
}

/// A weighted cluster diagram.
///
/// With the `serde` feature the diagram serializes as a
/// `snapshot::DiagramRecord` and is rebuilt through the validating
/// constructors on the way back in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        try_from = "crate::snapshot::DiagramRecord",
        into = "crate::snapshot::DiagramRecord"
    )
)]
pub struct ClusterDiagram {
    num_body: usize,
    num_root_points: usize,
    /// Neighbour list per point.
    connections: Vec<Vec<usize>>,
    num_connections: usize,
    weight: RationalWeight,
    /// Automorphisms under field-point permutations; 1 until canonicalized.
    num_identical_permutations: u64,
    ree_hoover_factor: i32,
    basis: BondBasis,
}

impl ClusterDiagram {
    /// Diagram with no bonds and unit weight.
    pub fn empty(num_body: usize, num_root_points: usize) -> ClusterResult<Self> {
        if num_body == 0 || num_body > MAX_POINTS || num_root_points > num_body {
            return Err(ClusterError::InvalidPointCount {
                num_body,
                num_root_points,
                max: MAX_POINTS,
            });
        }
        Ok(Self {
            num_body,
            num_root_points,
            connections: vec![Vec::new(); num_body],
            num_connections: 0,
            weight: RationalWeight::one(),
            num_identical_permutations: 1,
            ree_hoover_factor: 1,
            basis: BondBasis::Mayer,
        })
    }

    /// Every pair bonded, root-root pairs included.
    pub fn full_star(num_body: usize, num_root_points: usize) -> ClusterResult<Self> {
        let mut d = Self::empty(num_body, num_root_points)?;
        for i in 0..num_body {
            for j in (i + 1)..num_body {
                d.add_connection(i, j)?;
            }
        }
        Ok(d)
    }

    /// Diagram with exactly the listed bonds.
    ///
    /// Listing a pair twice (in either orientation) is a
    /// [`ClusterError::DuplicateConnection`].
    pub fn from_bonds(
        num_body: usize,
        num_root_points: usize,
        bonds: &[(usize, usize)],
    ) -> ClusterResult<Self> {
        let mut d = Self::empty(num_body, num_root_points)?;
        for &(i, j) in bonds {
            d.add_connection(i, j)?;
        }
        Ok(d)
    }

    /// Multiplicative identity for [`crate::operations::ClusterOperations::product`]:
    /// only root points, no bonds, weight 1.
    pub fn unity(num_root_points: usize) -> ClusterResult<Self> {
        Self::empty(num_root_points, num_root_points)
    }

    /// Same topology reinterpreted in another bond basis.
    pub fn with_basis(mut self, basis: BondBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Same topology with a different weight.
    pub fn with_weight(mut self, weight: RationalWeight) -> Self {
        self.weight = weight;
        self
    }

    // ── accessors ──────────────────────────────────────────────────────────

    /// Total number of points.
    pub fn num_body(&self) -> usize {
        self.num_body
    }

    /// Number of root points (`0..num_root_points`).
    pub fn num_root_points(&self) -> usize {
        self.num_root_points
    }

    /// Number of field points.
    pub fn num_field_points(&self) -> usize {
        self.num_body - self.num_root_points
    }

    /// Number of bonded pairs.
    pub fn num_connections(&self) -> usize {
        self.num_connections
    }

    /// Number of point pairs, bonded or not.
    pub fn num_pairs(&self) -> usize {
        self.num_body * (self.num_body - 1) / 2
    }

    /// Combinatorial coefficient.
    pub fn weight(&self) -> RationalWeight {
        self.weight
    }

    /// Replace the coefficient.
    pub fn set_weight(&mut self, weight: RationalWeight) {
        self.weight = weight;
    }

    /// Automorphism count found by the last canonicalization.
    pub fn num_identical_permutations(&self) -> u64 {
        self.num_identical_permutations
    }

    pub(crate) fn set_num_identical_permutations(&mut self, count: u64) {
        self.num_identical_permutations = count;
    }

    pub(crate) fn increment_identical_permutations(&mut self) {
        self.num_identical_permutations += 1;
    }

    /// Sign accumulated by Ree-Hoover bond substitution.
    pub fn ree_hoover_factor(&self) -> i32 {
        self.ree_hoover_factor
    }

    pub(crate) fn set_ree_hoover_factor(&mut self, factor: i32) {
        self.ree_hoover_factor = factor;
    }

    /// Bond basis of this diagram.
    pub fn basis(&self) -> BondBasis {
        self.basis
    }

    /// `true` if `point` is a root point.
    pub fn is_root(&self, point: usize) -> bool {
        point < self.num_root_points
    }

    /// Neighbours of `point`, in insertion order unless [`Self::sort`] was called.
    pub fn connections(&self, point: usize) -> &[usize] {
        self.connections.get(point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `true` if `i` and `j` are bonded.
    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        i < self.num_body && self.connections[i].contains(&j)
    }

    /// All bonds as `(i, j)` with `i < j`, in lexicographic order.
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.num_connections);
        for i in 0..self.num_body {
            let mut row: Vec<usize> = self.connections[i].iter().copied().filter(|&j| j > i).collect();
            row.sort_unstable();
            out.extend(row.into_iter().map(|j| (i, j)));
        }
        out
    }

    /// All unbonded pairs `(i, j)` with `i < j`, in lexicographic order.
    pub fn missing_bonds(&self) -> Vec<(usize, usize)> {
        let adj = self.adjacency();
        let mut out = Vec::with_capacity(self.num_pairs() - self.num_connections);
        for i in 0..self.num_body {
            for j in (i + 1)..self.num_body {
                if (adj[i] >> j) & 1 == 0 {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// Adjacency as one bit row per point: bit `j` of row `i` is set iff bonded.
    pub fn adjacency(&self) -> Vec<u64> {
        self.connections
            .iter()
            .map(|row| row.iter().fold(0u64, |acc, &j| acc | (1u64 << j)))
            .collect()
    }

    // ── mutation ───────────────────────────────────────────────────────────

    fn check_pair(&self, i: usize, j: usize) -> ClusterResult<()> {
        if i == j || i >= self.num_body || j >= self.num_body {
            return Err(ClusterError::InvalidBond(i, j, self.num_body));
        }
        Ok(())
    }

    /// Bond `i` and `j`.
    pub fn add_connection(&mut self, i: usize, j: usize) -> ClusterResult<()> {
        self.check_pair(i, j)?;
        if self.connections[i].contains(&j) {
            return Err(ClusterError::DuplicateConnection(i, j));
        }
        self.connections[i].push(j);
        self.connections[j].push(i);
        self.num_connections += 1;
        Ok(())
    }

    /// Remove the bond between `i` and `j`.
    pub fn delete_connection(&mut self, i: usize, j: usize) -> ClusterResult<()> {
        self.check_pair(i, j)?;
        let Some(pos_i) = self.connections[i].iter().position(|&k| k == j) else {
            return Err(ClusterError::MissingConnection(i, j));
        };
        self.connections[i].remove(pos_i);
        if let Some(pos_j) = self.connections[j].iter().position(|&k| k == i) {
            self.connections[j].remove(pos_j);
        }
        self.num_connections -= 1;
        Ok(())
    }

    /// Exchange the labels of points `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) -> ClusterResult<()> {
        if i >= self.num_body || j >= self.num_body {
            return Err(ClusterError::InvalidBond(i, j, self.num_body));
        }
        if i == j {
            return Ok(());
        }
        for row in self.connections.iter_mut() {
            for k in row.iter_mut() {
                if *k == i {
                    *k = j;
                } else if *k == j {
                    *k = i;
                }
            }
        }
        self.connections.swap(i, j);
        Ok(())
    }

    /// Sort each point's neighbour list ascending.
    ///
    /// Per-node ordering only; see [`Self::canonical`] for graph-level
    /// canonicalization.
    pub fn sort(&mut self) {
        for row in self.connections.iter_mut() {
            row.sort_unstable();
        }
    }

    /// Full star minus the root-root bonds; automorphism count back to 1.
    pub fn reset(&mut self) {
        for row in self.connections.iter_mut() {
            row.clear();
        }
        self.num_connections = 0;
        for i in 0..self.num_body {
            for j in (i + 1)..self.num_body {
                if j < self.num_root_points {
                    continue;
                }
                self.connections[i].push(j);
                self.connections[j].push(i);
                self.num_connections += 1;
            }
        }
        self.num_identical_permutations = 1;
    }

    /// Turn the highest-index root point into a field point.
    pub(crate) fn demote_last_root(&mut self) -> ClusterResult<()> {
        if self.num_root_points == 0 {
            return Err(ClusterError::NoRootPoints);
        }
        self.num_root_points -= 1;
        self.num_identical_permutations = 1;
        Ok(())
    }

    /// Copy relabeled by `perm`, where point `p` becomes `perm[p]`.
    ///
    /// Any bijection is accepted, including ones that move roots; the
    /// root count is kept, so callers choose what the new roots are.
    pub fn permuted(&self, perm: &[usize]) -> ClusterResult<Self> {
        if perm.len() != self.num_body {
            return Err(ClusterError::InvalidPermutation(self.num_body));
        }
        let mut seen = 0u64;
        for &p in perm {
            if p >= self.num_body || (seen >> p) & 1 == 1 {
                return Err(ClusterError::InvalidPermutation(self.num_body));
            }
            seen |= 1u64 << p;
        }
        let mut connections = vec![Vec::new(); self.num_body];
        for (i, row) in self.connections.iter().enumerate() {
            connections[perm[i]] = row.iter().map(|&j| perm[j]).collect();
        }
        for row in connections.iter_mut() {
            row.sort_unstable();
        }
        Ok(Self {
            connections,
            ..self.clone()
        })
    }

    /// Rebuild from an adjacency bit matrix, keeping this diagram's metadata.
    pub(crate) fn from_adjacency_like(&self, adjacency: &[u64]) -> Self {
        let n = adjacency.len();
        let mut connections = vec![Vec::new(); n];
        let mut count = 0;
        for (i, &row) in adjacency.iter().enumerate() {
            for j in 0..n {
                if (row >> j) & 1 == 1 {
                    connections[i].push(j);
                    if i < j {
                        count += 1;
                    }
                }
            }
        }
        Self {
            num_body: n,
            connections,
            num_connections: count,
            ..self.clone()
        }
    }
}
