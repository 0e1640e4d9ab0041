/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Portable snapshot of a generated diagram set.
//!
//! Building a closure expansion or a Ree-Hoover set to high order is the
//! expensive step of a virial calculation; the set itself is small. A
//! [`DiagramSetSnapshot`] captures a finished set as plain records (bond
//! list, exact weight as numerator/denominator, basis, symmetry bookkeeping)
//! so it can be serialized with any serde format and restored later.
//!
//! Restoring re-validates every record through the normal constructors, so a
//! hand-edited snapshot cannot produce an inconsistent diagram. A bare
//! [`ClusterDiagram`] serializes through the same [`DiagramRecord`] form.
//!
//! This module requires the `serde` feature.

use crate::diagram::{BondBasis, ClusterDiagram};
use crate::error::{ClusterError, ClusterResult};
use crate::rational::RationalWeight;

/// Current snapshot format version.
pub const DIAGRAM_SET_VERSION: u16 = 1;

/// A serializable diagram set.
///
/// # Example
///
/// ```rust,ignore
/// use virial_clusters::snapshot::DiagramSetSnapshot;
///
/// let snapshot = DiagramSetSnapshot::from_diagrams("B4", &diagrams);
/// let json = serde_json::to_string(&snapshot).unwrap();
/// let restored: DiagramSetSnapshot = serde_json::from_str(&json).unwrap();
/// let diagrams = restored.to_diagrams()?;
/// ```
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct DiagramSetSnapshot {
    /// Format version; [`DIAGRAM_SET_VERSION`] for new snapshots.
    pub version: u16,
    /// Free-form label, e.g. `"PY c_3"`.
    pub label: String,
    /// Diagrams in set order.
    pub diagrams: Vec<DiagramRecord>,
}

/// Serializable form of one [`ClusterDiagram`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct DiagramRecord {
    /// Total points.
    pub num_body: usize,
    /// Root points.
    pub num_root_points: usize,
    /// Bonds `(i, j)` with `i < j`.
    pub bonds: Vec<(usize, usize)>,
    /// Weight numerator.
    pub weight_numer: i64,
    /// Weight denominator, non-zero.
    pub weight_denom: i64,
    /// Bond basis.
    pub basis: BondBasis,
    /// Automorphism count.
    pub num_identical_permutations: u64,
    /// Ree-Hoover sign ledger.
    pub ree_hoover_factor: i32,
}

impl From<&ClusterDiagram> for DiagramRecord {
    fn from(d: &ClusterDiagram) -> Self {
        Self {
            num_body: d.num_body(),
            num_root_points: d.num_root_points(),
            bonds: d.bonds(),
            weight_numer: d.weight().numer(),
            weight_denom: d.weight().denom(),
            basis: d.basis(),
            num_identical_permutations: d.num_identical_permutations(),
            ree_hoover_factor: d.ree_hoover_factor(),
        }
    }
}

impl From<ClusterDiagram> for DiagramRecord {
    fn from(d: ClusterDiagram) -> Self {
        Self::from(&d)
    }
}

impl TryFrom<DiagramRecord> for ClusterDiagram {
    type Error = ClusterError;

    fn try_from(record: DiagramRecord) -> ClusterResult<Self> {
        record.to_diagram()
    }
}

impl DiagramRecord {
    /// Rebuild the diagram, validating points, bonds and weight.
    pub fn to_diagram(&self) -> ClusterResult<ClusterDiagram> {
        let weight = RationalWeight::new(self.weight_numer, self.weight_denom)?;
        let mut d = ClusterDiagram::from_bonds(self.num_body, self.num_root_points, &self.bonds)?
            .with_basis(self.basis)
            .with_weight(weight);
        d.set_num_identical_permutations(self.num_identical_permutations);
        d.set_ree_hoover_factor(self.ree_hoover_factor);
        Ok(d)
    }
}

impl DiagramSetSnapshot {
    /// Capture `diagrams` under `label`.
    pub fn from_diagrams(label: impl Into<String>, diagrams: &[ClusterDiagram]) -> Self {
        Self {
            version: DIAGRAM_SET_VERSION,
            label: label.into(),
            diagrams: diagrams.iter().map(DiagramRecord::from).collect(),
        }
    }

    /// Restore the diagram set.
    pub fn to_diagrams(&self) -> ClusterResult<Vec<ClusterDiagram>> {
        self.diagrams.iter().map(DiagramRecord::to_diagram).collect()
    }

    /// Number of diagrams in the snapshot.
    pub fn diagram_count(&self) -> usize {
        self.diagrams.len()
    }

    /// Exact sum of the stored weights.
    pub fn total_weight(&self) -> ClusterResult<RationalWeight> {
        self.diagrams
            .iter()
            .map(|r| RationalWeight::new(r.weight_numer, r.weight_denom))
            .sum()
    }
}
