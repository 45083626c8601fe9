use std::collections::BTreeMap;
use swarm_localization::common::{AgentId, DomainError, LocalFrame};
use swarm_localization::domains::gossip::{GossipPayload, UNKNOWN_DISTANCE};
use swarm_localization::domains::triangulation::{
    DistanceSubMatrix, SubTriangulation, Triangulation, TRUSTED_NEIGHBOURS,
};

fn id(n: u32) -> AgentId {
    AgentId(n)
}

fn diagonal() -> f64 {
    200f64.sqrt()
}

fn payload(sender: u32, distances: &[(u32, f64)]) -> GossipPayload {
    let distances: BTreeMap<AgentId, f64> = distances.iter().map(|(s, d)| (id(*s), *d)).collect();
    GossipPayload {
        sender: id(sender),
        distances: Some(distances),
        frame: None,
    }
}

/// Owner 0 learns the full square 0:(0,0) 1:(0,10) 2:(10,0) 3:(10,10).
fn square_triangulation() -> SubTriangulation {
    let mut tri = SubTriangulation::new(id(0), 0.1, 64);
    tri.update_information(id(1), 10.0, &payload(1, &[])).unwrap();
    tri.update_information(id(2), 10.0, &payload(2, &[])).unwrap();
    tri.update_information(id(3), diagonal(), &payload(3, &[])).unwrap();
    tri.update_information(id(1), 10.0, &payload(1, &[(2, diagonal()), (3, 10.0)]))
        .unwrap();
    tri.update_information(id(2), 10.0, &payload(2, &[(3, 10.0)]))
        .unwrap();
    tri
}

fn sorted_pairwise(frame: &LocalFrame) -> Vec<f64> {
    let points: Vec<_> = frame.iter().map(|(_, p)| p).collect();
    let mut distances = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            distances.push(points[i].distance(&points[j]));
        }
    }
    distances.sort_by(|a, b| a.total_cmp(b));
    distances
}

#[test]
fn test_pruning_keeps_first_three_known_per_row() {
    let ids: Vec<AgentId> = (0..6).map(id).collect();
    let rows: Vec<Vec<f64>> = (0..6)
        .map(|i| {
            (0..6)
                .map(|j| if i == j { 0.0 } else { 1.0 + (i + j) as f64 })
                .collect()
        })
        .collect();
    let matrix = DistanceSubMatrix::from_rows(&ids, &rows).unwrap();

    let pruned = matrix.pruned(TRUSTED_NEIGHBOURS);
    assert_eq!(
        pruned.row(0),
        vec![0.0, 2.0, 3.0, 4.0, UNKNOWN_DISTANCE, UNKNOWN_DISTANCE]
    );
    let kept = pruned.row(0).iter().filter(|d| **d > 0.0).count();
    assert_eq!(kept, 3);

    for i in 0..6 {
        assert_eq!(pruned.get(i, i), 0.0);
        for j in 0..6 {
            assert_eq!(pruned.get(i, j), pruned.get(j, i));
        }
    }
}

#[test]
fn test_pruning_skips_unknown_entries() {
    let ids: Vec<AgentId> = (0..5).map(id).collect();
    let u = UNKNOWN_DISTANCE;
    let rows = vec![
        vec![0.0, u, 2.0, u, 4.0],
        vec![u, 0.0, 1.0, 1.0, 1.0],
        vec![2.0, 1.0, 0.0, 1.0, 1.0],
        vec![u, 1.0, 1.0, 0.0, 1.0],
        vec![4.0, 1.0, 1.0, 1.0, 0.0],
    ];
    let matrix = DistanceSubMatrix::from_rows(&ids, &rows).unwrap();
    assert_eq!(matrix.pruned(3).row(0), vec![0.0, u, 2.0, u, 4.0]);
}

#[test]
fn test_matrix_grows_without_reusing_indices() {
    let mut matrix = DistanceSubMatrix::new(id(7));
    assert_eq!(matrix.ensure_index(id(3)), 1);
    assert_eq!(matrix.ensure_index(id(1)), 2);
    assert_eq!(matrix.ensure_index(id(3)), 1);
    assert_eq!(matrix.dim(), 3);
    assert_eq!(matrix.id_at(0), Some(id(7)));

    matrix.set(id(7), id(1), 5.0).unwrap();
    assert_eq!(matrix.get(0, 2), 5.0);
    assert_eq!(matrix.get(2, 0), 5.0);
    assert_eq!(matrix.get(1, 2), UNKNOWN_DISTANCE);
    assert_eq!(matrix.get(2, 2), 0.0);

    assert!(matches!(
        matrix.set(id(7), id(1), -2.0),
        Err(DomainError::InvalidInput { .. })
    ));
    assert!(matches!(
        matrix.set(id(7), id(42), 1.0),
        Err(DomainError::InvariantViolation { .. })
    ));
}

#[test]
fn test_square_is_recovered_up_to_congruence() {
    let mut tri = square_triangulation();
    let output = tri.update_triangulation().unwrap();

    assert_eq!(output.frame.len(), 4);
    assert_eq!(output.xs.len(), 4);
    assert_eq!(output.frame.get(id(0)).map(|p| (p.x, p.y)), Some((0.0, 0.0)));

    let expected = [10.0, 10.0, 10.0, 10.0, diagonal(), diagonal()];
    for (got, want) in sorted_pairwise(&output.frame).iter().zip(expected) {
        assert!((got - want).abs() < 1e-3, "got {} want {}", got, want);
    }
}

#[test]
fn test_mirror_ambiguity_yields_several_candidates() {
    let tri = square_triangulation();
    let candidates = tri.candidates().unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.placed_count() == 4));
}

#[test]
fn test_selection_is_stable_across_updates() {
    let mut tri = square_triangulation();
    let first = tri.update_triangulation().unwrap();
    let second = tri.update_triangulation().unwrap();
    assert_eq!(first.frame, second.frame);
}

#[test]
fn test_no_peers_is_insufficient_data() {
    let mut tri = SubTriangulation::new(id(0), 0.1, 8);
    assert!(matches!(
        tri.update_triangulation(),
        Err(DomainError::InsufficientData { .. })
    ));
}

#[test]
fn test_contradiction_keeps_previous_constellation() {
    let mut tri = square_triangulation();
    tri.update_triangulation().unwrap();
    let before = tri.previous_constellation().cloned();

    tri.update_information(id(1), 100.0, &payload(1, &[])).unwrap();
    let result = tri.update_triangulation();
    assert!(matches!(result, Err(DomainError::DegenerateGeometry { .. })));
    assert_eq!(tri.previous_constellation().cloned(), before);
}

#[test]
fn test_unknown_subjects_and_bad_distances_are_ignored() {
    let mut tri = SubTriangulation::new(id(0), 0.1, 8);
    tri.update_information(id(1), 3.0, &payload(1, &[(5, 4.0), (0, 99.0)]))
        .unwrap();
    assert_eq!(tri.matrix().dim(), 2);
    // The peer's claim about us never overrides our own measurement.
    assert_eq!(tri.matrix().get(0, 1), 3.0);

    assert!(matches!(
        tri.update_information(id(2), -1.0, &payload(2, &[])),
        Err(DomainError::InvalidInput { .. })
    ));
    assert_eq!(tri.matrix().dim(), 2);

    // Two agents only: owner and the axis point.
    let output = tri.update_triangulation().unwrap();
    assert_eq!(output.frame.len(), 2);
    assert_eq!(output.frame.get(id(1)).map(|p| p.x), Some(3.0));
}
