/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Standard bond patterns and hard-sphere reference values.
//!
//! Small helpers used to build test clusters and to check sampled results:
//! bond lists for chains, rings and complete graphs, the hard-sphere virial
//! coefficients through eighth order, and the biconnected Mayer diagram sets
//! of `B2`, `B3` and `B4`.

use std::f64::consts::PI;

use crate::diagram::ClusterDiagram;
use crate::error::{ClusterError, ClusterResult};
use crate::mayer::MayerFunction;
use crate::rational::RationalWeight;
use crate::sum::{ClusterSum, EvaluatorConfig};

/// Largest order with a built-in diagram set.
pub const MAX_STANDARD_ORDER: usize = 4;

// ─── Bond patterns ───────────────────────────────────────────────────────────

/// `0-1-2-…-(n-1)`.
pub fn chain(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|i| (i - 1, i)).collect()
}

/// Chain closed by `(0, n-1)` when `n > 2`.
pub fn ring(n: usize) -> Vec<(usize, usize)> {
    let mut bonds = chain(n);
    if n > 2 {
        bonds.push((0, n - 1));
    }
    bonds
}

/// Every pair `i < j`.
pub fn full(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

// ─── Hard-sphere references ──────────────────────────────────────────────────

/// Reduced hard-sphere coefficients `B_n / B2^(n-1)` for `n = 5..=8`.
const HS_REDUCED_HIGHER: [f64; 4] = [0.110252, 0.03888198, 0.01302354, 0.0041832];

/// Second virial coefficient of hard spheres, `2πσ³/3`.
pub fn b2_hs(sigma: f64) -> f64 {
    2.0 * PI * sigma.powi(3) / 3.0
}

/// `B_n / B2^(n-1)` for hard spheres, `n = 2..=8`.
pub fn hs_reduced_virial(n: usize) -> Option<f64> {
    match n {
        2 => Some(1.0),
        3 => Some(5.0 / 8.0),
        4 => {
            let acos = (1.0 / 3.0_f64.sqrt()).acos();
            Some(
                219.0 * 2.0_f64.sqrt() / (2240.0 * PI) - 89.0 / 280.0
                    + 4131.0 / (2240.0 * PI) * acos,
            )
        }
        5..=8 => Some(HS_REDUCED_HIGHER[n - 5]),
        _ => None,
    }
}

/// Hard-sphere `B_n` at diameter `sigma`, `n = 2..=8`.
pub fn hs_virial(n: usize, sigma: f64) -> Option<f64> {
    let reduced = hs_reduced_virial(n)?;
    Some(reduced * b2_hs(sigma).powi(n as i32 - 1))
}

// ─── Virial diagram sets ─────────────────────────────────────────────────────

fn factorial(n: usize) -> i64 {
    (1..=n as i64).product()
}

/// Biconnected Mayer diagrams of `B_n`, canonical, weighted
/// `−(n−1)/n! × labeled count`.
pub fn virial_diagrams(n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
    let shapes: Vec<(Vec<(usize, usize)>, i64)> = match n {
        2 => vec![(full(2), 1)],
        3 => vec![(full(3), 1)],
        4 => {
            let mut diagonal = ring(4);
            diagonal.push((0, 2));
            vec![(ring(4), 3), (diagonal, 6), (full(4), 1)]
        }
        _ => {
            return Err(ClusterError::InvalidPointCount {
                num_body: n,
                num_root_points: 0,
                max: MAX_STANDARD_ORDER,
            })
        }
    };
    let prefactor = RationalWeight::new(1 - n as i64, factorial(n))?;
    shapes
        .into_iter()
        .map(|(bonds, labeled)| {
            let d = ClusterDiagram::from_bonds(n, 0, &bonds)?
                .with_weight(prefactor * RationalWeight::from_integer(labeled));
            Ok(d.canonical())
        })
        .collect()
}

/// [`ClusterSum`] over [`virial_diagrams`] with a single provider.
pub fn virial_cluster(
    n: usize,
    provider: Box<dyn MayerFunction>,
    config: EvaluatorConfig,
) -> ClusterResult<ClusterSum> {
    ClusterSum::from_diagrams(&virial_diagrams(n)?, vec![provider], config)
}
