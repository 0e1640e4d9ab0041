//! Diagram algebra integration tests.
//!
//! Exercises the public algebra end to end: exact merging, weight
//! conservation, and the numeric identities behind the Ree-Hoover and
//! e-bond rewrites, checked by evaluating both sides through `ClusterBonds`.

use virial_clusters::standard::{chain, full, ring};
use virial_clusters::{
    BondBasis, BondTypeMap, ClosureExpansion, Closure, ClusterBonds, ClusterDiagram,
    ClusterOperations, PairValues, RationalWeight,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn w(n: i64, d: i64) -> RationalWeight {
    RationalWeight::new(n, d).unwrap()
}

/// Deterministic, pair-dependent f values with e = f + 1.
fn asymmetric_values(n: usize) -> PairValues {
    let mut v = PairValues::new(n, 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let f = -0.9 + 0.13 * (i as f64) + 0.07 * (j as f64) * (j as f64);
            v.set(i, j, 0, f);
            v.set(i, j, 1, f + 1.0);
        }
    }
    v
}

fn uniform_values(n: usize, f: f64) -> PairValues {
    let mut v = PairValues::new(n, 2);
    for i in 0..n {
        for j in (i + 1)..n {
            v.set(i, j, 0, f);
            v.set(i, j, 1, f + 1.0);
        }
    }
    v
}

fn weighted_value(diagrams: &[ClusterDiagram], values: &PairValues) -> f64 {
    let map = BondTypeMap::for_provider(0, 1).unwrap();
    diagrams
        .iter()
        .map(|d| {
            let bonds = ClusterBonds::from_diagram(d, &map, false).unwrap();
            d.weight().to_f64() * bonds.value(values)
        })
        .sum()
}

// ── Merging ──────────────────────────────────────────────────────────────────

#[test]
fn test_three_relabeled_triangles_merge_to_one_half() {
    let ops = ClusterOperations::new();
    let tri = ClusterDiagram::from_bonds(3, 0, &full(3))
        .unwrap()
        .with_weight(w(1, 6));
    let merged = ops.add_equivalents(&[tri.clone(), tri.clone(), tri]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].weight(), w(1, 2));
    assert_eq!(merged[0].num_identical_permutations(), 6);
}

#[test]
fn test_merge_conserves_total_weight() {
    let ops = ClusterOperations::new();
    let mut list = Vec::new();
    // Every labeling of a 4-point chain plus a few rings and stars.
    let base = ClusterDiagram::from_bonds(4, 0, &chain(4)).unwrap();
    let perms = [[0, 1, 2, 3], [1, 0, 2, 3], [2, 3, 0, 1], [3, 1, 0, 2], [0, 2, 1, 3]];
    for (k, p) in perms.iter().enumerate() {
        list.push(base.permuted(p).unwrap().with_weight(w(k as i64 + 1, 7)));
    }
    list.push(ClusterDiagram::from_bonds(4, 0, &ring(4)).unwrap().with_weight(w(-2, 3)));
    list.push(ClusterDiagram::from_bonds(4, 0, &full(4)).unwrap().with_weight(w(5, 11)));

    let before = ops.total_weight(&list);
    let pairwise = ops.add_equivalents(&list);
    let hashed = ops.reduce(&list);
    assert_eq!(ops.total_weight(&pairwise), before);
    assert_eq!(ops.total_weight(&hashed), before);
    assert_eq!(pairwise.len(), 3);
    assert_eq!(hashed.len(), 3);
}

#[test]
fn test_cancelling_weights_vanish() {
    let ops = ClusterOperations::new();
    let a = ClusterDiagram::from_bonds(3, 0, &chain(3)).unwrap();
    let b = a.permuted(&[2, 0, 1]).unwrap().with_weight(w(-1, 1));
    assert!(ops.add_equivalents(&[a.clone(), b.clone()]).is_empty());
    assert!(ops.difference(&[a.clone()], &[a]).is_empty());
}

#[test]
fn test_isomorphism_is_reflexive_and_symmetric() {
    let a = ClusterDiagram::from_bonds(5, 1, &[(0, 1), (1, 2), (2, 3), (3, 4), (1, 4)]).unwrap();
    let b = a.permuted(&[0, 3, 4, 1, 2]).unwrap();
    assert!(a.is_isomorph_of(&a));
    assert!(a.is_isomorph_of(&b));
    assert!(b.is_isomorph_of(&a));
    let moved_root = a.permuted(&[1, 0, 2, 3, 4]).unwrap();
    assert!(!a.is_isomorph_of(&moved_root));
}

#[test]
fn test_product_with_unity_is_identity() {
    let ops = ClusterOperations::new();
    let d = ClusterDiagram::from_bonds(4, 2, &[(0, 2), (2, 3), (1, 3)])
        .unwrap()
        .with_weight(w(3, 4));
    let p = ops.product(&d, &ClusterDiagram::unity(2).unwrap()).unwrap();
    assert!(p.is_isomorph_of(&d));
    assert_eq!(p.weight(), d.weight());
}

#[test]
fn test_convolution_then_integrate() {
    let ops = ClusterOperations::new();
    let f = ClusterDiagram::from_bonds(2, 2, &[(0, 1)]).unwrap();
    let chain2 = ops.convolution(&f, &f).unwrap();
    assert_eq!(chain2.num_body(), 3);
    assert_eq!(chain2.bonds(), vec![(0, 2), (1, 2)]);

    // Integrating root 1 of the two-bond chain leaves a one-root chain.
    let integrated = ops.integrate(&[chain2]).unwrap();
    assert_eq!(integrated.len(), 1);
    assert_eq!(integrated[0].num_root_points(), 1);
    assert_eq!(integrated[0].num_connections(), 2);
}

// ── Ree-Hoover and e-bond identities ─────────────────────────────────────────

#[test]
fn test_ree_hoover_single_bond_terms() {
    let ops = ClusterOperations::new();
    let d = ClusterDiagram::from_bonds(3, 0, &[(0, 1)]).unwrap();
    let terms = ops.make_ree_hoover(&d).unwrap();
    let weights: Vec<_> = terms.iter().map(|t| t.weight()).collect();
    assert_eq!(weights, vec![w(1, 1), w(-1, 1), w(-1, 1), w(1, 1)]);
    assert!(terms.iter().all(|t| t.basis() == BondBasis::ReeHoover));
}

#[test]
fn test_ree_hoover_numeric_completeness() {
    let ops = ClusterOperations::new();
    let d = ClusterDiagram::from_bonds(4, 0, &ring(4)).unwrap().with_weight(w(-3, 8));
    let values = asymmetric_values(4);
    let direct = weighted_value(std::slice::from_ref(&d), &values);
    let expanded = weighted_value(&ops.make_ree_hoover(&d).unwrap(), &values);
    assert!((direct - expanded).abs() < 1e-12, "{direct} vs {expanded}");
}

#[test]
fn test_merged_ree_hoover_set_on_symmetric_values() {
    let ops = ClusterOperations::new();
    let d = ClusterDiagram::from_bonds(4, 0, &chain(4)).unwrap();
    let values = uniform_values(4, -0.35);
    let direct = weighted_value(std::slice::from_ref(&d), &values);
    let merged = ops.make_ree_hoover_set(&[d]).unwrap();
    assert!((weighted_value(&merged, &values) - direct).abs() < 1e-12);
}

#[test]
fn test_to_e_numeric_identity() {
    let ops = ClusterOperations::new();
    let d = ClusterDiagram::from_bonds(4, 0, &ring(4)).unwrap();
    let values = uniform_values(4, -0.6);
    let direct = weighted_value(std::slice::from_ref(&d), &values);
    let e_terms = ops.to_e(&d).unwrap();
    assert!(e_terms.iter().all(|t| t.basis() == BondBasis::Boltzmann));
    assert!((weighted_value(&e_terms, &values) - direct).abs() < 1e-12);
}

// ── Closure recursion ────────────────────────────────────────────────────────

#[test]
fn test_py_and_hnc_agree_through_first_order() {
    let mut py = ClosureExpansion::new(Closure::PercusYevick);
    let mut hnc = ClosureExpansion::new(Closure::Hnc);
    for n in 0..2 {
        let (a, b) = (py.get_c(n).unwrap(), hnc.get_c(n).unwrap());
        assert_eq!(a.len(), b.len(), "order {n}");
        for (x, y) in a.iter().zip(&b) {
            assert!(x.is_isomorph_of(y));
            assert_eq!(x.weight(), y.weight());
        }
    }
    assert_ne!(py.get_c(2).unwrap().len(), hnc.get_c(2).unwrap().len());
}

#[test]
fn test_closure_orders_conserve_field_points() {
    let mut py = ClosureExpansion::new(Closure::PercusYevick);
    for n in 0..4 {
        for d in py.get_h(n).unwrap() {
            assert_eq!(d.num_root_points(), 2);
            assert_eq!(d.num_field_points(), n);
        }
    }
}
