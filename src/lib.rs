/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! # virial-clusters
//!
//! Cluster-diagram algebra and Mayer-sampling evaluation for virial coefficients.
//!
//! ---
//!
//! A virial coefficient is a weighted sum of cluster integrals, one per
//! diagram: points are molecules, edges are Mayer `f` (or Boltzmann `e`)
//! bonds. This crate does the two halves of that bookkeeping:
//!
//! **Symbolic.** Diagrams carry exact rational weights. Sets of diagrams are
//! combined (product, convolution, sum, root integration), expanded
//! (Ree-Hoover, `f → e − 1`) and merged up to relabeling of field points.
//! Canonicalization finds the unique highest-scoring labeling of a diagram
//! and its automorphism count, so isomorphic terms collapse with their
//! weights summed exactly.
//!
//! **Numeric.** A finished set is lowered to bond-index tables and summed on
//! sampled configurations. The evaluator caches the current and previous
//! configuration so that a rejected Monte-Carlo move costs nothing.
//!
//! ## The pipeline
//!
//! ```text
//! generator → ClusterDiagram → ClusterOperations → ClusterBonds → ClusterSum → f64
//!                   ↑                 ↑                                ↑
//!              canonical        ClosureExpansion                MayerFunction
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`rational`] | [`RationalWeight`] | Exact diagram coefficients |
//! | [`diagram`] | [`ClusterDiagram`], [`BondBasis`] | Labeled diagram with roots, bonds and weight |
//! | [`canonical`] | [`Score`], [`CanonicalOrdering`] | Canonical labeling and automorphism count |
//! | [`operations`] | [`ClusterOperations`] | Set algebra, merging, Ree-Hoover and e-bond expansion |
//! | [`closure`] | [`ClosureExpansion`], [`Closure`] | Order-by-order PY / HNC correlation functions |
//! | [`bonds`] | [`ClusterBonds`], [`BondTypeMap`] | Evaluator-facing bond-index tables |
//! | [`mayer`] | [`MayerFunction`], [`Configuration`] | Pair-value providers and coordinates |
//! | [`sum`] | [`ClusterSum`], [`EvaluatorConfig`] | Weighted cluster sum with trial-move cache |
//! | [`standard`] | [`standard::virial_cluster`] | Bond patterns and hard-sphere references |
//! | [`error`] | [`ClusterError`] | Every failure the crate reports |
//! | `snapshot` | `DiagramSetSnapshot` | Serialisable diagram set (requires `serde` feature) |
//!
//! ## Example
//!
//! ```rust
//! use virial_clusters::{ClusterDiagram, ClusterOperations, RationalWeight};
//!
//! let ops = ClusterOperations::new();
//! let sixth = RationalWeight::new(1, 6).unwrap();
//! let tri = ClusterDiagram::full_star(3, 0).unwrap().with_weight(sixth);
//! let merged = ops.add_equivalents(&[tri.clone(), tri.clone(), tri]);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].weight(), RationalWeight::new(1, 2).unwrap());
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for merge sizes and recomputes,
//! `trace` for the canonical search, `error` for non-finite values) and never
//! installs a subscriber.
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bonds;
pub mod canonical;
pub mod closure;
pub mod diagram;
pub mod error;
pub mod mayer;
pub mod operations;
pub mod rational;
pub mod standard;
pub mod sum;

#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use bonds::{BondTypeMap, ClusterBonds, PairValues};
pub use canonical::{CanonicalKey, CanonicalOrdering, DiagramOrdering, Score};
pub use closure::{Closure, ClosureExpansion};
pub use diagram::{BondBasis, BondKind, ClusterDiagram, MAX_POINTS};
pub use error::{ClusterError, ClusterResult};
pub use mayer::{Configuration, HardSphereMayer, MayerFunction, PointConfiguration};
pub use operations::ClusterOperations;
pub use rational::RationalWeight;
pub use sum::{ClusterSum, EvaluatorConfig};
