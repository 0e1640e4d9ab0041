/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Error types for diagram algebra and cluster evaluation.
//!
//! Two families live here:
//!
//! - **Precondition violations**: mismatched root counts, duplicate bonds,
//!   integrating a rootless diagram, weight/cluster count mismatch. These are
//!   caller bugs and are never retried.
//! - **Numeric degeneracy**: a non-finite cluster value. Surfaced to the
//!   simulation driver instead of being zeroed.
//!
//! Exact zeros (a zero product term, a weight that cancels during a merge) are
//! not errors and never appear here.

use thiserror::Error;

/// Result alias used across the crate.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Every failure the diagram algebra and evaluator can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    // ========== Construction ==========
    /// Point counts outside `1..=MAX_POINTS` or more roots than points.
    #[error("invalid point count: {num_body} points with {num_root_points} root points (max {max})")]
    InvalidPointCount {
        /// Requested total point count.
        num_body: usize,
        /// Requested root point count.
        num_root_points: usize,
        /// Largest supported diagram.
        max: usize,
    },

    /// A bond endpoint is out of range or bonds a point to itself.
    #[error("invalid bond ({0}, {1}) for a diagram of {2} points")]
    InvalidBond(usize, usize, usize),

    /// `add_connection` on a pair that is already bonded.
    #[error("points {0} and {1} are already connected")]
    DuplicateConnection(usize, usize),

    /// `delete_connection` on a pair that is not bonded.
    #[error("points {0} and {1} are not connected")]
    MissingConnection(usize, usize),

    /// A permutation that is not a bijection on the diagram's points.
    #[error("invalid permutation of {0} points")]
    InvalidPermutation(usize),

    /// Rational weight with a zero denominator.
    #[error("rational weight denominator must be non-zero")]
    ZeroDenominator,

    // ========== Algebra preconditions ==========
    /// `product` on diagrams with different root counts.
    #[error("root point count mismatch: {left} vs {right}")]
    RootCountMismatch {
        /// Roots of the left operand.
        left: usize,
        /// Roots of the right operand.
        right: usize,
    },

    /// Both `product` operands bond the same pair of root points.
    #[error("both factors bond root points {0} and {1}")]
    ConflictingRootBonds(usize, usize),

    /// `convolution` needs exactly two root points on each operand.
    #[error("convolution requires two root points per diagram, got {left} and {right}")]
    ConvolutionRoots {
        /// Roots of the left operand.
        left: usize,
        /// Roots of the right operand.
        right: usize,
    },

    /// The operation is undefined for this bond basis (or mix of bases).
    #[error("operation `{operation}` is not defined for bond basis {basis}")]
    IncompatibleBasis {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Basis of the offending operand.
        basis: &'static str,
    },

    /// `integrate` on a diagram with no root point left.
    #[error("cannot integrate a diagram with no root points")]
    NoRootPoints,

    /// Ree-Hoover expansion over more unbonded pairs than supported.
    #[error("Ree-Hoover expansion over {pairs} unbonded pairs exceeds the limit of {max}")]
    TooManyPairs {
        /// Unbonded pairs in the diagram.
        pairs: usize,
        /// Largest supported expansion.
        max: usize,
    },

    /// The closure recursion has no validated form for this approximation.
    #[error("closure approximation {0} is not supported by the order-by-order expansion")]
    ClosureUnsupported(&'static str),

    // ========== Evaluator ==========
    /// Cluster and weight lists differ in length.
    #[error("{weights} weights supplied for {clusters} clusters")]
    WeightCountMismatch {
        /// Number of clusters.
        clusters: usize,
        /// Number of weights.
        weights: usize,
    },

    /// Clusters in one sum disagree on the number of points.
    #[error("cluster point count mismatch: expected {expected}, found {found}")]
    PointCountMismatch {
        /// Point count of the first cluster.
        expected: usize,
        /// Offending point count.
        found: usize,
    },

    /// A bond type index outside the provider index space.
    #[error("bond type {index} is outside the {limit} available bond types")]
    BondTypeOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of valid indices.
        limit: usize,
    },

    /// A point pair assigned to more than one bond group.
    #[error("pair ({0}, {1}) appears in more than one bond group")]
    PairAssignedTwice(usize, usize),

    /// Cluster sum needs at least one pairwise-value provider.
    #[error("cluster sum requires at least one pairwise-value provider")]
    NoProviders,

    /// A replacement provider list of the wrong length.
    #[error("expected {expected} pairwise-value providers, got {found}")]
    ProviderCountMismatch {
        /// Providers the bond tables were built for.
        expected: usize,
        /// Providers supplied.
        found: usize,
    },

    /// Temperature must be strictly positive and finite.
    #[error("invalid temperature {0}")]
    InvalidTemperature(f64),

    /// Accumulated cluster value is NaN or infinite.
    #[error("non-finite cluster value {value} for configuration {configuration}")]
    NonFiniteValue {
        /// The offending value.
        value: f64,
        /// Identifier of the configuration that produced it.
        configuration: u64,
    },
}
