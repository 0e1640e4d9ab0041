/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Weighted cluster sums evaluated on sampled configurations.
//!
//! [`ClusterSum`] is the quantity a Mayer-sampling walker integrates: a
//! weighted sum of [`ClusterBonds`] products, where pair values come from
//! one [`MayerFunction`] per physical bond type.
//!
//! # Caching
//!
//! The sum keeps two slots, *current* and *previous*, each tagged with the
//! configuration id it was computed for:
//!
//! ```text
//! id == current.id   → return current.total           (no provider calls)
//! id == previous.id  → swap slots, return the total   (rejected trial move)
//! otherwise          → previous ← current, recompute into current
//! ```
//!
//! A recompute asks the providers only for the `(pair, bond type)` entries
//! some cluster actually reads. Implied e-bond entries are `f + 1` of the
//! matching physical entry.
//!
//! # Invariants
//! - All clusters share one point count.
//! - Every bond type index is `< 2 × providers`.
//! - A non-finite total is an error; the failed configuration is not cached
//!   and the last good configuration stays current.

use std::sync::Arc;

use tracing::{debug, error};

use crate::bonds::{BondTypeMap, ClusterBonds, PairValues};
use crate::diagram::ClusterDiagram;
use crate::error::{ClusterError, ClusterResult};
use crate::mayer::{Configuration, MayerFunction};

// ─── EvaluatorConfig ─────────────────────────────────────────────────────────

/// Evaluation parameters for [`ClusterSum`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluatorConfig {
    /// Temperature in the providers' energy units; `β = 1 / T`.  Default: 1.0.
    pub temperature: f64,

    /// Average each cluster over its distinct relabelings.  Default: false.
    pub use_permutations: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            use_permutations: false,
        }
    }
}

// ─── Cache slot ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Slot {
    id: Option<u64>,
    values: PairValues,
    total: f64,
}

impl Slot {
    fn new(point_count: usize, bond_types: usize) -> Self {
        Self {
            id: None,
            values: PairValues::new(point_count, bond_types),
            total: 0.0,
        }
    }
}

// ─── ClusterSum ──────────────────────────────────────────────────────────────

/// Weighted sum of clusters with a two-slot configuration cache.
pub struct ClusterSum {
    clusters: Arc<[ClusterBonds]>,
    weights: Arc<[f64]>,
    /// `(i, j, provider)` pairs the clusters read, `i < j`.
    needed: Arc<[(usize, usize, usize)]>,
    providers: Vec<Box<dyn MayerFunction>>,
    point_count: usize,
    temperature: f64,
    beta: f64,
    current: Slot,
    previous: Slot,
    provider_evaluations: u64,
}

fn validate_temperature(temperature: f64) -> ClusterResult<f64> {
    if temperature > 0.0 && temperature.is_finite() {
        Ok(1.0 / temperature)
    } else {
        Err(ClusterError::InvalidTemperature(temperature))
    }
}

impl ClusterSum {
    /// Sum of `weights[k] × clusters[k]` over `providers`.
    pub fn new(
        clusters: Vec<ClusterBonds>,
        weights: Vec<f64>,
        providers: Vec<Box<dyn MayerFunction>>,
        config: EvaluatorConfig,
    ) -> ClusterResult<Self> {
        if clusters.len() != weights.len() {
            return Err(ClusterError::WeightCountMismatch {
                clusters: clusters.len(),
                weights: weights.len(),
            });
        }
        if providers.is_empty() {
            return Err(ClusterError::NoProviders);
        }
        let beta = validate_temperature(config.temperature)?;
        let num_providers = providers.len();
        let limit = 2 * num_providers;
        let point_count = clusters.first().map_or(0, ClusterBonds::point_count);

        let mut needed = Vec::new();
        for cluster in &clusters {
            if cluster.point_count() != point_count {
                return Err(ClusterError::PointCountMismatch {
                    expected: point_count,
                    found: cluster.point_count(),
                });
            }
            for (i, j, t) in cluster.referenced() {
                if t >= limit {
                    return Err(ClusterError::BondTypeOutOfRange { index: t, limit });
                }
                needed.push((i, j, t % num_providers));
            }
        }
        needed.sort_unstable();
        needed.dedup();
        debug!(
            clusters = clusters.len(),
            providers = num_providers,
            entries = needed.len(),
            "cluster sum built"
        );

        Ok(Self {
            clusters: clusters.into(),
            weights: weights.into(),
            needed: needed.into(),
            providers,
            point_count,
            temperature: config.temperature,
            beta,
            current: Slot::new(point_count, limit),
            previous: Slot::new(point_count, limit),
            provider_evaluations: 0,
        })
    }

    /// Lower `diagrams` for provider 0 and weight them by their exact weights.
    pub fn from_diagrams(
        diagrams: &[ClusterDiagram],
        providers: Vec<Box<dyn MayerFunction>>,
        config: EvaluatorConfig,
    ) -> ClusterResult<Self> {
        if providers.is_empty() {
            return Err(ClusterError::NoProviders);
        }
        let map = BondTypeMap::for_provider(0, providers.len())?;
        let clusters = diagrams
            .iter()
            .map(|d| ClusterBonds::from_diagram(d, &map, config.use_permutations))
            .collect::<ClusterResult<Vec<_>>>()?;
        let weights = diagrams.iter().map(|d| d.weight().to_f64()).collect();
        Self::new(clusters, weights, providers, config)
    }

    /// Independent walker over the same clusters with its own providers and cache.
    pub fn with_providers(&self, providers: Vec<Box<dyn MayerFunction>>) -> ClusterResult<Self> {
        if providers.len() != self.providers.len() {
            return Err(ClusterError::ProviderCountMismatch {
                expected: self.providers.len(),
                found: providers.len(),
            });
        }
        let bond_types = 2 * providers.len();
        Ok(Self {
            clusters: Arc::clone(&self.clusters),
            weights: Arc::clone(&self.weights),
            needed: Arc::clone(&self.needed),
            providers,
            point_count: self.point_count,
            temperature: self.temperature,
            beta: self.beta,
            current: Slot::new(self.point_count, bond_types),
            previous: Slot::new(self.point_count, bond_types),
            provider_evaluations: 0,
        })
    }

    /// Weighted cluster sum at `configuration`.
    pub fn value(&mut self, configuration: &dyn Configuration) -> ClusterResult<f64> {
        if configuration.point_count() != self.point_count {
            return Err(ClusterError::PointCountMismatch {
                expected: self.point_count,
                found: configuration.point_count(),
            });
        }
        let id = configuration.id();
        if self.current.id == Some(id) {
            return Ok(self.current.total);
        }
        if self.previous.id == Some(id) {
            std::mem::swap(&mut self.current, &mut self.previous);
            return Ok(self.current.total);
        }

        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.id = None;
        self.recompute(configuration);

        let total: f64 = self
            .clusters
            .iter()
            .zip(self.weights.iter())
            .map(|(cluster, &w)| w * cluster.value(&self.current.values))
            .sum();
        if !total.is_finite() {
            error!(value = total, configuration = id, "non-finite cluster value");
            // Last good configuration back in front; the failed slot stays unclaimed.
            std::mem::swap(&mut self.current, &mut self.previous);
            return Err(ClusterError::NonFiniteValue {
                value: total,
                configuration: id,
            });
        }
        self.current.id = Some(id);
        self.current.total = total;
        Ok(total)
    }

    fn recompute(&mut self, configuration: &dyn Configuration) {
        let num_providers = self.providers.len();
        for provider in &mut self.providers {
            provider.set_configuration(configuration);
        }
        for &(i, j, p) in self.needed.iter() {
            let r2 = configuration.squared_distance(i, j);
            let f = self.providers[p].f((i, j), r2, self.beta);
            self.current.values.set(i, j, p, f);
            self.current.values.set(i, j, num_providers + p, f + 1.0);
        }
        self.provider_evaluations += self.needed.len() as u64;
        debug!(
            configuration = configuration.id(),
            entries = self.needed.len(),
            "pair values recomputed"
        );
    }

    /// Change the temperature; drops both cached slots.
    pub fn set_temperature(&mut self, temperature: f64) -> ClusterResult<()> {
        self.beta = validate_temperature(temperature)?;
        self.temperature = temperature;
        self.current.id = None;
        self.previous.id = None;
        Ok(())
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Clusters in this sum.
    pub fn clusters(&self) -> &[ClusterBonds] {
        &self.clusters
    }

    /// Cluster weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Points per configuration.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of provider `f` calls made so far.
    pub fn provider_evaluations(&self) -> u64 {
        self.provider_evaluations
    }
}

impl std::fmt::Debug for ClusterSum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterSum")
            .field("clusters", &self.clusters.len())
            .field("providers", &self.providers.len())
            .field("point_count", &self.point_count)
            .field("temperature", &self.temperature)
            .field("provider_evaluations", &self.provider_evaluations)
            .finish()
    }
}
