/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Pairwise-value providers and the configurations they read.
//!
//! The evaluator never sees a potential directly. It asks a
//! [`MayerFunction`] for `f(r²)` on each pair it needs, after handing the
//! provider the current [`Configuration`] so that providers with their own
//! per-configuration state (cell lists, orientation caches) can refresh it.
//!
//! # Invariants
//! - A configuration's `id` changes whenever any coordinate changes.
//! - Two configurations with equal `id` are treated as identical.

use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only view of a set of point coordinates.
pub trait Configuration {
    /// Identity of this exact coordinate set.
    fn id(&self) -> u64;

    /// Number of points.
    fn point_count(&self) -> usize;

    /// Squared distance between points `i` and `j`.
    fn squared_distance(&self, i: usize, j: usize) -> f64;
}

/// Supplier of Mayer f-bond values.
pub trait MayerFunction {
    /// `f = e^{-βu(r)} − 1` for `pair` at squared separation `r2`.
    fn f(&mut self, pair: (usize, usize), r2: f64, beta: f64) -> f64;

    /// Called once per new configuration before any `f` on it.
    fn set_configuration(&mut self, _configuration: &dyn Configuration) {}
}

// ─── PointConfiguration ──────────────────────────────────────────────────────

static NEXT_CONFIGURATION_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_CONFIGURATION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Points in three dimensions with a process-unique id per coordinate set.
#[derive(Clone, Debug, PartialEq)]
pub struct PointConfiguration {
    id: u64,
    positions: Vec<[f64; 3]>,
}

impl PointConfiguration {
    /// Configuration at `positions`.
    pub fn new(positions: Vec<[f64; 3]>) -> Self {
        Self {
            id: next_id(),
            positions,
        }
    }

    /// `n` points at the origin.
    pub fn at_origin(n: usize) -> Self {
        Self::new(vec![[0.0; 3]; n])
    }

    /// Position of point `i`.
    pub fn position(&self, i: usize) -> [f64; 3] {
        self.positions[i]
    }

    /// All positions.
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    /// Move point `i` to `position`; the id changes.
    pub fn move_point(&mut self, i: usize, position: [f64; 3]) {
        self.positions[i] = position;
        self.id = next_id();
    }

    /// Translate point `i` by `delta`; the id changes.
    pub fn displace(&mut self, i: usize, delta: [f64; 3]) {
        let p = &mut self.positions[i];
        for (x, d) in p.iter_mut().zip(delta) {
            *x += d;
        }
        self.id = next_id();
    }
}

impl Configuration for PointConfiguration {
    fn id(&self) -> u64 {
        self.id
    }

    fn point_count(&self) -> usize {
        self.positions.len()
    }

    fn squared_distance(&self, i: usize, j: usize) -> f64 {
        let (a, b) = (self.positions[i], self.positions[j]);
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }
}

// ─── HardSphereMayer ─────────────────────────────────────────────────────────

/// Hard spheres of diameter `sigma`: `f = −1` on overlap, else `0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HardSphereMayer {
    sigma: f64,
    sigma2: f64,
}

impl HardSphereMayer {
    /// Hard-sphere provider of diameter `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            sigma2: sigma * sigma,
        }
    }

    /// Sphere diameter.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for HardSphereMayer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MayerFunction for HardSphereMayer {
    fn f(&mut self, _pair: (usize, usize), r2: f64, _beta: f64) -> f64 {
        if r2 < self.sigma2 {
            -1.0
        } else {
            0.0
        }
    }
}
