use std::collections::BTreeMap;
use swarm_localization::common::{AgentId, LocalFrame, Position2D};
use swarm_localization::domains::gossip::{
    DistanceGossipStore, GossipPayload, PeerFrameCache, UNKNOWN_DISTANCE,
};

fn id(n: u32) -> AgentId {
    AgentId(n)
}

#[test]
fn test_record_is_symmetric() {
    let mut store = DistanceGossipStore::new(id(0), 10.0);
    store.record(id(0), id(1), 4.0);
    store.record(id(2), id(0), 7.5);
    store.record(id(3), id(1), 2.0);
    store.record(id(1), id(3), 2.5);

    for (a, b) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
        assert_eq!(store.distance(id(a), id(b)), store.distance(id(b), id(a)));
    }
    assert_eq!(store.distance(id(3), id(1)), Some(2.5));
    assert_eq!(store.len(), 3);
}

#[test]
fn test_unusable_distances_are_dropped() {
    let mut store = DistanceGossipStore::new(id(0), 10.0);
    assert!(!store.record(id(0), id(1), -1.0));
    assert!(!store.record(id(0), id(1), f64::NAN));
    assert!(!store.record(id(0), id(0), 3.0));
    assert!(store.is_empty());
    assert_eq!(store.distance_or_unknown(id(0), id(1)), UNKNOWN_DISTANCE);

    assert!(store.record(id(0), id(1), 0.0));
    assert_eq!(store.distance(id(1), id(0)), Some(0.0));
}

#[test]
fn test_aging_and_staleness() {
    let mut store = DistanceGossipStore::new(id(0), 1.0);
    store.record(id(0), id(1), 3.0);
    assert!(!store.is_stale(id(0), id(1), 1.0));
    assert!(store.is_stale(id(0), id(2), 1.0));

    store.age_all(0.6);
    store.age_all(0.6);
    assert!(store.is_stale(id(1), id(0), 1.0));
    assert!(!store.is_stale(id(1), id(0), 2.0));
    assert!((store.clock() - 1.2).abs() < 1e-12);

    // Re-recording resets the age.
    store.record(id(1), id(0), 3.1);
    assert!(!store.is_stale(id(0), id(1), 1.0));
    assert_eq!(store.observation(id(0), id(1)).map(|o| o.age), Some(0.0));
}

#[test]
fn test_non_positive_age_delta_is_ignored() {
    let mut store = DistanceGossipStore::new(id(0), 1.0);
    store.record(id(0), id(1), 3.0);
    store.age_all(-5.0);
    store.age_all(0.0);
    assert_eq!(store.clock(), 0.0);
    assert_eq!(store.observation(id(0), id(1)).map(|o| o.age), Some(0.0));
}

#[test]
fn test_snapshot_only_contains_fresh_owner_pairs() {
    let mut store = DistanceGossipStore::new(id(0), 1.0);
    store.record(id(0), id(1), 1.0);
    store.age_all(2.0);
    store.record(id(2), id(0), 2.0);
    store.record(id(1), id(2), 3.0);

    let snapshot = store.snapshot_for_sending();
    let expected: BTreeMap<AgentId, f64> = [(id(2), 2.0)].into_iter().collect();
    assert_eq!(snapshot, expected);
}

#[test]
fn test_prune_and_mark_unknown() {
    let mut store = DistanceGossipStore::new(id(0), 1.0);
    store.record(id(0), id(1), 1.0);
    store.record(id(0), id(2), 2.0);
    store.age_all(1.5);
    store.record(id(0), id(3), 3.0);

    assert_eq!(store.prune_stale(1.0), 2);
    assert_eq!(store.len(), 1);

    store.mark_unknown(id(3), id(0));
    assert!(store.is_empty());
    assert!(store.is_stale(id(0), id(3), 100.0));
}

#[test]
fn test_peer_frame_cache_ttl() {
    let mut frame = LocalFrame::anchored(id(1));
    frame.insert(id(2), Position2D::new(3.0, 4.0));

    let mut cache = PeerFrameCache::new(Some(0.5));
    cache.insert(id(1), frame.clone());
    assert_eq!(cache.get(id(1)), Some(&frame));

    cache.age_all(0.75);
    assert!(cache.get(id(1)).is_none());
    assert!(cache.fresh_frames().is_empty());
    assert_eq!(cache.len(), 1);

    cache.insert(id(1), frame.clone());
    assert_eq!(cache.fresh_frames().len(), 1);

    let mut forever = PeerFrameCache::new(None);
    forever.insert(id(1), frame);
    forever.age_all(1e9);
    assert!(forever.get(id(1)).is_some());
}

#[test]
fn test_payload_filters_malformed_entries() {
    let distances: BTreeMap<AgentId, f64> = [
        (id(1), 5.0),
        (id(2), -1.0),
        (id(3), f64::INFINITY),
        (id(4), 0.0),
        (id(9), 2.0),
    ]
    .into_iter()
    .collect();

    let mut frame = LocalFrame::anchored(id(9));
    frame.insert(id(5), Position2D::new(f64::NAN, 1.0));

    let payload = GossipPayload {
        sender: id(9),
        distances: Some(distances),
        frame: Some(frame),
    };

    let usable: Vec<(AgentId, f64)> = payload.usable_distances().collect();
    assert_eq!(usable, vec![(id(1), 5.0), (id(4), 0.0)]);

    let usable_frame = payload.usable_frame().expect("owner point survives");
    assert_eq!(usable_frame.len(), 1);
    assert!(usable_frame.contains(id(9)));

    assert!(GossipPayload::empty(id(3)).is_empty());
    assert!(GossipPayload::empty(id(3)).usable_frame().is_none());
}
