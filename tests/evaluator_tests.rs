//! Cluster-sum integration tests.
//!
//! Builds evaluators from generated diagram sets and checks them on fixed
//! hard-sphere configurations, including the trial-move cache contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use virial_clusters::standard::{b2_hs, hs_virial, virial_cluster, virial_diagrams};
use virial_clusters::{
    ClusterOperations, ClusterSum, Configuration, EvaluatorConfig, HardSphereMayer, MayerFunction,
    PointConfiguration,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

struct CountingHardSphere {
    calls: Arc<AtomicUsize>,
    configurations: Arc<AtomicUsize>,
    inner: HardSphereMayer,
}

impl MayerFunction for CountingHardSphere {
    fn f(&mut self, pair: (usize, usize), r2: f64, beta: f64) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.f(pair, r2, beta)
    }

    fn set_configuration(&mut self, _configuration: &dyn Configuration) {
        self.configurations.fetch_add(1, Ordering::SeqCst);
    }
}

fn counting() -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Box<dyn MayerFunction>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let configurations = Arc::new(AtomicUsize::new(0));
    let provider = CountingHardSphere {
        calls: Arc::clone(&calls),
        configurations: Arc::clone(&configurations),
        inner: HardSphereMayer::new(1.0),
    };
    (calls, configurations, Box::new(provider))
}

/// Square of side `side` in the xy-plane.
fn square(side: f64) -> PointConfiguration {
    PointConfiguration::new(vec![
        [0.0, 0.0, 0.0],
        [side, 0.0, 0.0],
        [side, side, 0.0],
        [0.0, side, 0.0],
    ])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_b4_on_square_configuration() {
    // Side 0.9: edges overlap, diagonals (≈1.27) do not.
    // Ring: f⁴ = 1 → −3/8. Ring + diagonal and K4 contain a zero factor.
    let mut b4 = virial_cluster(4, Box::new(HardSphereMayer::new(1.0)), EvaluatorConfig::default())
        .unwrap();
    let v = b4.value(&square(0.9)).unwrap();
    assert!((v + 3.0 / 8.0).abs() < 1e-15, "got {v}");
}

#[test]
fn test_permutation_averaging_on_square() {
    // A labeled ring matches the square in 1 of its 3 distinct relabelings.
    let config = EvaluatorConfig {
        use_permutations: true,
        ..EvaluatorConfig::default()
    };
    let mut b4 = virial_cluster(4, Box::new(HardSphereMayer::new(1.0)), config).unwrap();
    let v = b4.value(&square(0.9)).unwrap();
    assert!((v + 1.0 / 8.0).abs() < 1e-15, "got {v}");
}

#[test]
fn test_rejected_trial_move_costs_no_provider_calls() {
    let (calls, configurations, provider) = counting();
    let mut b4 = virial_cluster(4, provider, EvaluatorConfig::default()).unwrap();
    let a = square(0.9);
    let mut b = a.clone();
    b.move_point(3, [0.0, 5.0, 0.0]);

    let va = b4.value(&a).unwrap();
    let after_a = calls.load(Ordering::SeqCst);
    assert_eq!(after_a, 6);
    let vb = b4.value(&b).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 12);
    assert_eq!(vb, 0.0);
    assert_ne!(va, vb);

    // Move rejected: the walker re-evaluates A.
    assert_eq!(b4.value(&a).unwrap(), va);
    assert_eq!(calls.load(Ordering::SeqCst), 12);
    assert_eq!(configurations.load(Ordering::SeqCst), 2);
}

#[test]
fn test_walkers_share_clusters_but_not_caches() {
    let (calls_a, _, provider_a) = counting();
    let (calls_b, _, provider_b) = counting();
    let mut first = virial_cluster(3, provider_a, EvaluatorConfig::default()).unwrap();
    let mut second = first.with_providers(vec![provider_b]).unwrap();
    let cfg = PointConfiguration::at_origin(3);
    assert_eq!(first.value(&cfg).unwrap(), second.value(&cfg).unwrap());
    assert_eq!(calls_a.load(Ordering::SeqCst), 3);
    assert_eq!(calls_b.load(Ordering::SeqCst), 3);
    assert_eq!(first.clusters().len(), second.clusters().len());
}

#[test]
fn test_ree_hoover_set_evaluates_like_mayer_set() {
    // On any configuration the Ree-Hoover rewrite of B4 has the same value.
    let ops = ClusterOperations::new();
    let mayer = virial_diagrams(4).unwrap();
    let ree_hoover = ops.make_ree_hoover_set(&mayer).unwrap();
    let config = EvaluatorConfig {
        use_permutations: true,
        ..EvaluatorConfig::default()
    };
    let mut direct =
        ClusterSum::from_diagrams(&mayer, vec![Box::new(HardSphereMayer::new(1.0))], config).unwrap();
    let mut rewritten =
        ClusterSum::from_diagrams(&ree_hoover, vec![Box::new(HardSphereMayer::new(1.0))], config)
            .unwrap();
    for cfg in [
        square(0.9),
        square(0.6),
        PointConfiguration::new(vec![[0.0; 3], [0.8, 0.0, 0.0], [1.6, 0.0, 0.0], [2.4, 0.0, 0.0]]),
        PointConfiguration::at_origin(4),
    ] {
        let a = direct.value(&cfg).unwrap();
        let b = rewritten.value(&cfg).unwrap();
        assert!((a - b).abs() < 1e-12, "{a} vs {b}");
    }
}

#[test]
fn test_hard_sphere_references() {
    let b2 = b2_hs(1.0);
    assert!((b2 - 2.0943951023931953).abs() < 1e-12);
    let b3 = hs_virial(3, 1.0).unwrap();
    assert!((b3 - 0.625 * b2 * b2).abs() < 1e-12);
    assert!(hs_virial(8, 1.0).is_some());
}
