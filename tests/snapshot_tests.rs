//! Diagram-set snapshot round-trip tests.
//!
//! Verifies that a generated closure-expansion set survives JSON
//! serialization and restores to the same diagrams with the same weights.

#[cfg(feature = "serde")]
mod tests {
    use virial_clusters::snapshot::{DiagramSetSnapshot, DIAGRAM_SET_VERSION};
    use virial_clusters::{Closure, ClosureExpansion, ClusterOperations, RationalWeight};

    #[test]
    fn test_closure_set_round_trip() {
        let mut py = ClosureExpansion::new(Closure::PercusYevick);
        let c2 = py.get_c(2).unwrap();
        let snapshot = DiagramSetSnapshot::from_diagrams("PY c_2", &c2);
        assert_eq!(snapshot.version, DIAGRAM_SET_VERSION);
        assert_eq!(snapshot.diagram_count(), c2.len());

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: DiagramSetSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);

        let diagrams = restored.to_diagrams().unwrap();
        assert_eq!(diagrams.len(), c2.len());
        for (a, b) in diagrams.iter().zip(&c2) {
            assert!(a.is_isomorph_of(b));
            assert_eq!(a.weight(), b.weight());
            assert_eq!(a.num_identical_permutations(), b.num_identical_permutations());
        }

        let ops = ClusterOperations::new();
        assert_eq!(restored.total_weight().unwrap(), ops.total_weight(&c2));
    }

    #[test]
    fn test_diagram_serde_derive() {
        let d = virial_clusters::ClusterDiagram::full_star(3, 1)
            .unwrap()
            .with_weight(RationalWeight::new(-1, 3).unwrap());
        let json = serde_json::to_string(&d).unwrap();
        let back: virial_clusters::ClusterDiagram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_corrupt_diagram_json_rejected() {
        // Out-of-range neighbour.
        let json = r#"{"num_body":2,"num_root_points":0,"bonds":[[0,70]],
            "weight_numer":1,"weight_denom":1,"basis":"Mayer",
            "num_identical_permutations":1,"ree_hoover_factor":1}"#;
        assert!(serde_json::from_str::<virial_clusters::ClusterDiagram>(json).is_err());

        // Pair listed in both orientations.
        let json = r#"{"num_body":3,"num_root_points":0,"bonds":[[0,1],[1,0]],
            "weight_numer":1,"weight_denom":1,"basis":"Mayer",
            "num_identical_permutations":1,"ree_hoover_factor":1}"#;
        assert!(serde_json::from_str::<virial_clusters::ClusterDiagram>(json).is_err());

        // Zero denominator.
        let json = r#"{"num_body":2,"num_root_points":0,"bonds":[[0,1]],
            "weight_numer":1,"weight_denom":0,"basis":"Mayer",
            "num_identical_permutations":1,"ree_hoover_factor":1}"#;
        assert!(serde_json::from_str::<virial_clusters::ClusterDiagram>(json).is_err());
    }

    #[test]
    fn test_corrupt_snapshot_rejected() {
        let json = r#"{"version":1,"label":"bad","diagrams":[{"num_body":2,"num_root_points":0,
            "bonds":[[0,5]],"weight_numer":1,"weight_denom":1,"basis":"Mayer",
            "num_identical_permutations":1,"ree_hoover_factor":1}]}"#;
        let snapshot: DiagramSetSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.to_diagrams().is_err());
    }
}
