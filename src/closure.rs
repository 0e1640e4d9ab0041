/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Order-by-order density expansion of the pair correlation functions.
//!
//! Every function here is a two-root diagram set; the order-`n` term has `n`
//! field points (one density factor each). With `f` the root-root f-bond:
//!
//! ```text
//! c₀ = h₀ = f          η₀ = ∅          w₀ = 1
//! η_n = Σ_{i=0}^{n-1} c_i ⊗ h_{n-1-i}                 (Ornstein–Zernike)
//! h_n = w_n + f·w_n                                   (n ≥ 1)
//! c_n = h_n − η_n
//! ```
//!
//! The closure fixes `w`, the cavity function `y = g·e^{βu}`:
//!
//! | Closure | `w_n` | bridge `b_n` |
//! |---------|-------|--------------|
//! | Percus-Yevick | `η_n` | `ln(1+η) − η` at order n |
//! | HNC | `(1/n) Σ_{k=1}^{n} k · η_k · w_{n-k}` (the series of `e^η`) | ∅ |
//!
//! Each order is memoised; higher orders pull in every lower one.
//!
//! [`Closure::None`] has no validated order-by-order form and every getter
//! reports [`ClusterError::ClosureUnsupported`].

use hashbrown::HashMap;
use tracing::debug;

use crate::canonical::{CanonicalOrdering, DiagramOrdering};
use crate::diagram::ClusterDiagram;
use crate::error::{ClusterError, ClusterResult};
use crate::operations::ClusterOperations;
use crate::rational::RationalWeight;

/// Closure approximation folded into the expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Closure {
    /// Unapproximated: bridge diagrams kept exactly. Not supported.
    None,
    /// Percus-Yevick: `c = f · y`.
    #[default]
    PercusYevick,
    /// Hypernetted chain: bridge function dropped.
    Hnc,
}

impl Closure {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::PercusYevick => "PY",
            Self::Hnc => "HNC",
        }
    }
}

type Memo = HashMap<usize, Vec<ClusterDiagram>>;

/// Memoised closure-equation recursion.
pub struct ClosureExpansion<O: DiagramOrdering = CanonicalOrdering> {
    closure: Closure,
    ops: ClusterOperations<O>,
    c: Memo,
    h: Memo,
    eta: Memo,
    w: Memo,
    log_one_plus_eta: Memo,
    b: Memo,
}

impl ClosureExpansion<CanonicalOrdering> {
    /// Expansion under `closure` with the default diagram ordering.
    pub fn new(closure: Closure) -> Self {
        Self::with_operations(closure, ClusterOperations::new())
    }
}

fn f_bond() -> ClusterResult<ClusterDiagram> {
    ClusterDiagram::from_bonds(2, 2, &[(0, 1)])
}

fn ratio(numer: usize, denom: usize) -> ClusterResult<RationalWeight> {
    RationalWeight::new(numer as i64, denom as i64)
}

impl<O: DiagramOrdering> ClosureExpansion<O> {
    /// Expansion using a caller-supplied algebra.
    pub fn with_operations(closure: Closure, ops: ClusterOperations<O>) -> Self {
        Self {
            closure,
            ops,
            c: Memo::new(),
            h: Memo::new(),
            eta: Memo::new(),
            w: Memo::new(),
            log_one_plus_eta: Memo::new(),
            b: Memo::new(),
        }
    }

    /// Closure in use.
    pub fn closure(&self) -> Closure {
        self.closure
    }

    /// Algebra in use.
    pub fn operations(&self) -> &ClusterOperations<O> {
        &self.ops
    }

    /// Number of memoised orders across all functions.
    pub fn cached_orders(&self) -> usize {
        self.c.len()
            + self.h.len()
            + self.eta.len()
            + self.w.len()
            + self.log_one_plus_eta.len()
            + self.b.len()
    }

    /// Drop every memoised order.
    pub fn clear(&mut self) {
        self.c.clear();
        self.h.clear();
        self.eta.clear();
        self.w.clear();
        self.log_one_plus_eta.clear();
        self.b.clear();
    }

    fn require_supported(&self) -> ClusterResult<()> {
        if self.closure == Closure::None {
            return Err(ClusterError::ClosureUnsupported(self.closure.name()));
        }
        Ok(())
    }

    /// Direct correlation function `c`, order `n`.
    pub fn get_c(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        self.require_supported()?;
        if let Some(hit) = self.c.get(&n) {
            return Ok(hit.clone());
        }
        let value = if n == 0 {
            vec![f_bond()?]
        } else {
            let h = self.get_h(n)?;
            let eta = self.get_eta(n)?;
            self.ops.difference(&h, &eta)
        };
        debug!(order = n, closure = self.closure.name(), diagrams = value.len(), "c order");
        self.c.insert(n, value.clone());
        Ok(value)
    }

    /// Total correlation function `h = g − 1`, order `n`.
    pub fn get_h(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        self.require_supported()?;
        if let Some(hit) = self.h.get(&n) {
            return Ok(hit.clone());
        }
        let value = if n == 0 {
            vec![f_bond()?]
        } else {
            let w = self.get_w(n)?;
            let fw = self.ops.product_sets(&[f_bond()?], &w)?;
            self.ops.sum(&w, &fw)
        };
        debug!(order = n, closure = self.closure.name(), diagrams = value.len(), "h order");
        self.h.insert(n, value.clone());
        Ok(value)
    }

    /// Indirect (series) correlation function `η = h − c`, order `n`.
    pub fn get_eta(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        self.require_supported()?;
        if let Some(hit) = self.eta.get(&n) {
            return Ok(hit.clone());
        }
        let mut terms = Vec::new();
        for i in 0..n {
            let c = self.get_c(i)?;
            let h = self.get_h(n - 1 - i)?;
            for a in &c {
                for b in &h {
                    terms.push(self.ops.convolution(a, b)?);
                }
            }
        }
        let value = self.ops.add_equivalents(&terms);
        debug!(order = n, closure = self.closure.name(), diagrams = value.len(), "eta order");
        self.eta.insert(n, value.clone());
        Ok(value)
    }

    /// Cavity-function series `w` (the closure's `y`), order `n`.
    pub fn get_w(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        self.require_supported()?;
        if let Some(hit) = self.w.get(&n) {
            return Ok(hit.clone());
        }
        let value = if n == 0 {
            vec![ClusterDiagram::unity(2)?]
        } else {
            match self.closure {
                Closure::PercusYevick => self.get_eta(n)?,
                Closure::Hnc => {
                    let mut terms = Vec::new();
                    for k in 1..=n {
                        let eta = self.get_eta(k)?;
                        let w = self.get_w(n - k)?;
                        let prod = self.ops.product_sets(&eta, &w)?;
                        terms.extend(self.ops.scale(&prod, ratio(k, n)?));
                    }
                    self.ops.add_equivalents(&terms)
                }
                Closure::None => return Err(ClusterError::ClosureUnsupported(self.closure.name())),
            }
        };
        debug!(order = n, closure = self.closure.name(), diagrams = value.len(), "w order");
        self.w.insert(n, value.clone());
        Ok(value)
    }

    /// Series of `ln(1 + η)`, order `n`.
    fn get_log_one_plus_eta(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        if let Some(hit) = self.log_one_plus_eta.get(&n) {
            return Ok(hit.clone());
        }
        // n·L_n = n·η_n − Σ_{k=1}^{n-1} k·L_k·η_{n-k}
        let value = if n == 0 {
            Vec::new()
        } else {
            let mut terms = self.get_eta(n)?;
            for k in 1..n {
                let log = self.get_log_one_plus_eta(k)?;
                let eta = self.get_eta(n - k)?;
                let prod = self.ops.product_sets(&log, &eta)?;
                terms.extend(self.ops.scale(&prod, -ratio(k, n)?));
            }
            self.ops.add_equivalents(&terms)
        };
        self.log_one_plus_eta.insert(n, value.clone());
        Ok(value)
    }

    /// Bridge function `b`, order `n`.
    pub fn get_b(&mut self, n: usize) -> ClusterResult<Vec<ClusterDiagram>> {
        self.require_supported()?;
        if let Some(hit) = self.b.get(&n) {
            return Ok(hit.clone());
        }
        let value = match self.closure {
            Closure::Hnc => Vec::new(),
            Closure::PercusYevick if n == 0 => Vec::new(),
            Closure::PercusYevick => {
                let log = self.get_log_one_plus_eta(n)?;
                let eta = self.get_eta(n)?;
                self.ops.difference(&log, &eta)
            }
            Closure::None => return Err(ClusterError::ClosureUnsupported(self.closure.name())),
        };
        debug!(order = n, closure = self.closure.name(), diagrams = value.len(), "b order");
        self.b.insert(n, value.clone());
        Ok(value)
    }
}
