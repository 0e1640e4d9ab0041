/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Python FFI bindings via PyO3.
//!
//! Exposes diagram construction, the set algebra, Ree-Hoover expansion and the
//! closure recursion to Python. Numeric evaluation stays on the Rust side,
//! since providers are Rust trait objects.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from virial_clusters import ClusterDiagram, ClusterOperations, ClosureExpansion
//!
//! ops = ClusterOperations()
//! tri = ClusterDiagram(3, 0, [(0, 1), (0, 2), (1, 2)], 1, 6)
//! merged = ops.add_equivalents([tri, tri, tri])
//! print(merged[0].weight)       # (1, 2)
//!
//! py = ClosureExpansion("PY")
//! print(len(py.get_c(2)))
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::closure::{Closure, ClosureExpansion};
use crate::diagram::{BondBasis, ClusterDiagram};
use crate::error::ClusterError;
use crate::operations::ClusterOperations;
use crate::rational::RationalWeight;

fn to_py_err(e: ClusterError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn py_list(list: Vec<ClusterDiagram>) -> Vec<PyClusterDiagram> {
    list.into_iter().map(|inner| PyClusterDiagram { inner }).collect()
}

fn inner_list(list: Vec<PyClusterDiagram>) -> Vec<ClusterDiagram> {
    list.into_iter().map(|d| d.inner).collect()
}

// ── ClusterDiagram ───────────────────────────────────────────────────────────

/// A weighted cluster diagram.
#[pyclass(name = "ClusterDiagram")]
#[derive(Clone)]
pub struct PyClusterDiagram {
    inner: ClusterDiagram,
}

#[pymethods]
impl PyClusterDiagram {
    /// Create a diagram.
    ///
    /// Args:
    ///     num_body: total number of points
    ///     num_root_points: leading points held fixed (default 0)
    ///     bonds: list of (i, j) pairs (default none)
    ///     numerator, denominator: exact weight (default 1/1)
    ///     basis: "Mayer", "ReeHoover" or "Boltzmann" (default "Mayer")
    #[new]
    #[pyo3(signature = (num_body, num_root_points=0, bonds=None, numerator=1, denominator=1, basis="Mayer"))]
    pub fn new(
        num_body: usize,
        num_root_points: usize,
        bonds: Option<Vec<(usize, usize)>>,
        numerator: i64,
        denominator: i64,
        basis: &str,
    ) -> PyResult<Self> {
        let basis = match basis {
            "Mayer" => BondBasis::Mayer,
            "ReeHoover" => BondBasis::ReeHoover,
            "Boltzmann" => BondBasis::Boltzmann,
            other => {
                return Err(PyValueError::new_err(format!("unknown bond basis {other:?}")))
            }
        };
        let weight = RationalWeight::new(numerator, denominator).map_err(to_py_err)?;
        let inner = ClusterDiagram::from_bonds(num_body, num_root_points, &bonds.unwrap_or_default())
            .map_err(to_py_err)?
            .with_weight(weight)
            .with_basis(basis);
        Ok(Self { inner })
    }

    /// Total number of points.
    #[getter]
    pub fn num_body(&self) -> usize {
        self.inner.num_body()
    }

    /// Number of root points.
    #[getter]
    pub fn num_root_points(&self) -> usize {
        self.inner.num_root_points()
    }

    /// Bonds as (i, j) pairs with i < j.
    #[getter]
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        self.inner.bonds()
    }

    /// Weight as (numerator, denominator).
    #[getter]
    pub fn weight(&self) -> (i64, i64) {
        let w = self.inner.weight();
        (w.numer(), w.denom())
    }

    /// Weight as a float.
    #[getter]
    pub fn weight_float(&self) -> f64 {
        self.inner.weight().to_f64()
    }

    /// Automorphism count under field-point permutations.
    #[getter]
    pub fn num_identical_permutations(&self) -> u64 {
        self.inner.num_identical_permutations()
    }

    /// Bond basis name.
    #[getter]
    pub fn basis(&self) -> &'static str {
        self.inner.basis().name()
    }

    /// Canonical relabeling with its automorphism count.
    pub fn canonical(&self) -> Self {
        Self {
            inner: self.inner.canonical(),
        }
    }

    /// True if `other` is the same diagram up to field-point relabeling.
    pub fn is_isomorph_of(&self, other: &PyClusterDiagram) -> bool {
        self.inner.is_isomorph_of(&other.inner)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!(
            "ClusterDiagram(num_body={}, num_root_points={}, bonds={:?}, weight={}, basis={})",
            self.inner.num_body(),
            self.inner.num_root_points(),
            self.inner.bonds(),
            self.inner.weight(),
            self.inner.basis().name(),
        )
    }
}

// ── ClusterOperations ────────────────────────────────────────────────────────

/// Diagram-set algebra with the canonical ordering.
#[pyclass(name = "ClusterOperations")]
#[derive(Clone, Default)]
pub struct PyClusterOperations {
    inner: ClusterOperations,
}

#[pymethods]
impl PyClusterOperations {
    /// Construct the operations object.
    #[new]
    pub fn new() -> Self {
        Self::default()
    }

    /// Product of two diagrams sharing their roots.
    pub fn product(&self, d1: &PyClusterDiagram, d2: &PyClusterDiagram) -> PyResult<PyClusterDiagram> {
        let inner = self.inner.product(&d1.inner, &d2.inner).map_err(to_py_err)?;
        Ok(PyClusterDiagram { inner })
    }

    /// Convolution of two two-root diagrams.
    pub fn convolution(
        &self,
        d1: &PyClusterDiagram,
        d2: &PyClusterDiagram,
    ) -> PyResult<PyClusterDiagram> {
        let inner = self.inner.convolution(&d1.inner, &d2.inner).map_err(to_py_err)?;
        Ok(PyClusterDiagram { inner })
    }

    /// Canonicalize and merge isomorphic diagrams.
    pub fn reduce(&self, diagrams: Vec<PyClusterDiagram>) -> Vec<PyClusterDiagram> {
        py_list(self.inner.reduce(&inner_list(diagrams)))
    }

    /// Merge isomorphic diagrams pairwise.
    pub fn add_equivalents(&self, diagrams: Vec<PyClusterDiagram>) -> Vec<PyClusterDiagram> {
        py_list(self.inner.add_equivalents(&inner_list(diagrams)))
    }

    /// Turn the last root of each diagram into a field point, then merge.
    pub fn integrate(&self, diagrams: Vec<PyClusterDiagram>) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.integrate(&inner_list(diagrams)).map(py_list).map_err(to_py_err)
    }

    /// Merged union of two sets.
    pub fn sum(&self, a: Vec<PyClusterDiagram>, b: Vec<PyClusterDiagram>) -> Vec<PyClusterDiagram> {
        py_list(self.inner.sum(&inner_list(a), &inner_list(b)))
    }

    /// Merged `a − b`.
    pub fn difference(
        &self,
        a: Vec<PyClusterDiagram>,
        b: Vec<PyClusterDiagram>,
    ) -> Vec<PyClusterDiagram> {
        py_list(self.inner.difference(&inner_list(a), &inner_list(b)))
    }

    /// Ree-Hoover expansion of a Mayer-basis set.
    pub fn make_ree_hoover(&self, diagrams: Vec<PyClusterDiagram>) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner
            .make_ree_hoover_set(&inner_list(diagrams))
            .map(py_list)
            .map_err(to_py_err)
    }

    /// Rewrite a Mayer-basis set in e-bonds.
    pub fn to_e(&self, diagrams: Vec<PyClusterDiagram>) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.to_e_set(&inner_list(diagrams)).map(py_list).map_err(to_py_err)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> &'static str {
        "ClusterOperations()"
    }
}

// ── ClosureExpansion ─────────────────────────────────────────────────────────

/// Memoised closure-equation expansion.
#[pyclass(name = "ClosureExpansion")]
pub struct PyClosureExpansion {
    inner: ClosureExpansion,
}

#[pymethods]
impl PyClosureExpansion {
    /// Create an expansion for "PY" or "HNC" ("NONE" is accepted but every order errors).
    #[new]
    #[pyo3(signature = (closure="PY"))]
    pub fn new(closure: &str) -> PyResult<Self> {
        let closure = match closure {
            "PY" => Closure::PercusYevick,
            "HNC" => Closure::Hnc,
            "NONE" => Closure::None,
            other => return Err(PyValueError::new_err(format!("unknown closure {other:?}"))),
        };
        Ok(Self {
            inner: ClosureExpansion::new(closure),
        })
    }

    /// Direct correlation function at order `n`.
    pub fn get_c(&mut self, n: usize) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.get_c(n).map(py_list).map_err(to_py_err)
    }

    /// Total correlation function at order `n`.
    pub fn get_h(&mut self, n: usize) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.get_h(n).map(py_list).map_err(to_py_err)
    }

    /// Indirect (series) function at order `n`.
    pub fn get_eta(&mut self, n: usize) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.get_eta(n).map(py_list).map_err(to_py_err)
    }

    /// Cavity-function series at order `n`.
    pub fn get_w(&mut self, n: usize) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.get_w(n).map(py_list).map_err(to_py_err)
    }

    /// Bridge function at order `n`.
    pub fn get_b(&mut self, n: usize) -> PyResult<Vec<PyClusterDiagram>> {
        self.inner.get_b(n).map(py_list).map_err(to_py_err)
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("ClosureExpansion({:?})", self.inner.closure().name())
    }
}

// ── Module ───────────────────────────────────────────────────────────────────

/// Python module entry point.
#[pymodule]
pub fn virial_clusters(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyClusterDiagram>()?;
    m.add_class::<PyClusterOperations>()?;
    m.add_class::<PyClosureExpansion>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
