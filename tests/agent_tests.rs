use std::sync::{Arc, Mutex};
use swarm_localization::adapters::inbound::SharedPositions;
use swarm_localization::adapters::outbound::init_noop_logger;
use swarm_localization::common::{AgentId, DomainError, DomainResult, LocalFrame, Position2D};
use swarm_localization::config::SimulationConfig;
use swarm_localization::domains::agent::{AgentEvent, AgentNode, AgentStatus};
use swarm_localization::domains::communication::{PolicyKind, Roster, SilentCommunication};
use swarm_localization::domains::gossip::{GossipPayload, PayloadMode};
use swarm_localization::domains::logger::DomainLogger;
use swarm_localization::domains::triangulation::{Triangulation, TriangulationOutput};
use tokio::sync::mpsc;

fn id(n: u32) -> AgentId {
    AgentId(n)
}

/// Every tick exchanges with someone: p = refresh_rate / communication_frequency = 1.
fn chatty_settings() -> SimulationConfig {
    SimulationConfig {
        refresh_rate: 1.0,
        triangulation_refresh_rate: 1.0,
        communication_frequency: 1.0,
        time_to_live: 1_000.0,
        seed: Some(42),
        ..SimulationConfig::default()
    }
}

fn square_oracle() -> SharedPositions {
    SharedPositions::from_placements(vec![
        (id(0), Position2D::new(0.0, 0.0)),
        (id(1), Position2D::new(0.0, 10.0)),
        (id(2), Position2D::new(10.0, 0.0)),
        (id(3), Position2D::new(10.0, 10.0)),
    ])
}

fn swarm(settings: &SimulationConfig, n: u32) -> (Vec<AgentNode>, Roster) {
    let nodes: Vec<AgentNode> = (0..n)
        .map(|i| AgentNode::from_config(id(i), settings, init_noop_logger()))
        .collect();
    let roster = Roster::new(nodes.iter().map(|node| node.handle()).collect());
    (nodes, roster)
}

fn sorted_pairwise(frame: &LocalFrame) -> Vec<f64> {
    let points: Vec<Position2D> = frame.iter().map(|(_, p)| p).collect();
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
fn test_square_swarm_converges_to_congruent_frames() {
    for reconstruct in [false, true] {
        let settings = SimulationConfig {
            reconstruct,
            ..chatty_settings()
        };
        let oracle = square_oracle();
        let (mut nodes, roster) = swarm(&settings, 4);

        for _ in 0..60 {
            for node in nodes.iter_mut() {
                node.communication_tick(&roster, &oracle);
            }
            for node in nodes.iter_mut() {
                node.triangulation_tick();
            }
        }

        let diagonal = 200f64.sqrt();
        let expected = [10.0, 10.0, 10.0, 10.0, diagonal, diagonal];
        for node in &nodes {
            let frame = node.frame();
            assert_eq!(frame.len(), 4, "{} has {:?}", node.id(), frame);
            assert_eq!(frame.get(node.id()), Some(&Position2D::ORIGIN));
            for (got, want) in sorted_pairwise(frame).iter().zip(expected) {
                assert!((got - want).abs() < 1e-3, "{}: got {} want {}", node.id(), got, want);
            }
            // Published state matches the node's own view.
            assert_eq!(&roster.get(node.id()).unwrap().published_frame(), frame);
        }
    }
}

#[test]
fn test_paused_agent_skips_both_ticks() {
    let oracle = square_oracle();
    let (mut nodes, roster) = swarm(&chatty_settings(), 4);
    let node = &mut nodes[0];

    node.pause();
    assert_eq!(node.status(), AgentStatus::Paused);
    assert!(node.communication_tick(&roster, &oracle).is_none());
    assert!(node.triangulation_tick().is_none());
    assert!(node.store().is_empty());
    assert_eq!(node.store().clock(), 0.0);

    node.resume();
    assert!(node.communication_tick(&roster, &oracle).is_some());
    assert_eq!(node.exchanges(), 1);
    assert_eq!(node.store().len(), 1);
}

#[test]
fn test_starved_agent_keeps_single_point_frame() {
    let settings = SimulationConfig {
        policy: PolicyKind::Silent,
        ..chatty_settings()
    };
    let oracle = square_oracle();
    let (mut nodes, roster) = swarm(&settings, 4);
    let node = &mut nodes[1];

    assert!(!node.communication_tick(&roster, &oracle).unwrap().is_established());
    let result = node.triangulation_tick().unwrap();
    assert!(matches!(result, Err(DomainError::InsufficientData { .. })));

    assert_eq!(node.frame(), &LocalFrame::anchored(id(1)));
    assert_eq!(roster.get(id(1)).unwrap().published_frame(), LocalFrame::anchored(id(1)));
    assert!(node.payload().is_empty());
}

#[test]
fn test_payload_modes() {
    let oracle = square_oracle();
    for mode in [PayloadMode::DistancesOnly, PayloadMode::DistancesAndFrame] {
        let settings = SimulationConfig {
            payload: mode,
            time_to_live: 3.0,
            ..chatty_settings()
        };
        let (mut nodes, roster) = swarm(&settings, 4);
        let node = &mut nodes[0];

        node.communication_tick(&roster, &oracle);
        assert!(node.payload().frame.is_none());
        node.triangulation_tick().unwrap().unwrap();

        let payload = node.payload();
        assert_eq!(payload.sender, id(0));
        assert_eq!(payload.distances.as_ref().map(|d| d.len()), Some(1));
        assert_eq!(payload.frame.is_some(), mode == PayloadMode::DistancesAndFrame);
        assert_eq!(roster.get(id(0)).unwrap().published_payload(), payload);
    }
}

#[test]
fn test_advertised_frame_expires_with_time_to_live() {
    let settings = SimulationConfig {
        time_to_live: 2.5,
        ..chatty_settings()
    };
    let oracle = square_oracle();
    let (mut nodes, roster) = swarm(&settings, 4);
    let node = &mut nodes[0];

    node.communication_tick(&roster, &oracle);
    node.triangulation_tick().unwrap().unwrap();
    assert_eq!(node.frame_age(), Some(0.0));

    node.communication_tick(&roster, &oracle);
    node.communication_tick(&roster, &oracle);
    assert!(node.payload().frame.is_some());

    node.communication_tick(&roster, &oracle);
    assert_eq!(node.frame_age(), Some(3.0));
    assert!(node.payload().frame.is_none());
    assert!(roster.get(id(0)).unwrap().published_payload().frame.is_none());
}

#[test]
fn test_peer_claims_never_override_own_measurement() {
    let oracle = square_oracle();
    let (mut nodes, roster) = swarm(&chatty_settings(), 2);

    // Agent 1 measures agent 0 at the true 10, then advertises it.
    nodes[1].communication_tick(&roster, &oracle);
    // Move agent 0: its own measurement now differs from what 1 advertises.
    oracle.move_agent(id(0), Position2D::new(0.0, 4.0)).unwrap();
    nodes[0].communication_tick(&roster, &oracle);

    assert_eq!(nodes[0].store().distance(id(0), id(1)), Some(6.0));
    assert_eq!(nodes[1].store().distance(id(0), id(1)), Some(10.0));
}

#[test]
fn test_events_are_emitted() {
    let (sender, mut receiver) = mpsc::channel(64);
    let oracle = square_oracle();
    let settings = chatty_settings();
    let mut nodes: Vec<AgentNode> = (0..3)
        .map(|i| AgentNode::from_config(id(i), &settings, init_noop_logger()))
        .collect();
    nodes[0] = AgentNode::from_config(id(0), &settings, init_noop_logger()).with_events(sender);
    let roster = Roster::new(nodes.iter().map(|n| n.handle()).collect());

    let node = &mut nodes[0];
    node.triangulation_tick();
    node.communication_tick(&roster, &oracle);
    node.triangulation_tick();
    node.pause();
    node.pause();

    let mut kinds = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        kinds.push(match event {
            AgentEvent::TriangulationSkipped { .. } => "skipped",
            AgentEvent::ExchangeCompleted { agent_id, .. } => {
                assert_eq!(agent_id, id(0));
                "exchange"
            }
            AgentEvent::FrameUpdated { frame, .. } => {
                assert_eq!(frame.len(), 2);
                "frame"
            }
            AgentEvent::StatusChanged { status, .. } => {
                assert_eq!(status, AgentStatus::Paused);
                "status"
            }
        });
    }
    assert_eq!(kinds, vec!["skipped", "exchange", "frame", "status"]);
}

struct BrokenTriangulation;

impl Triangulation for BrokenTriangulation {
    fn owner(&self) -> AgentId {
        id(0)
    }

    fn update_information(&mut self, _peer: AgentId, _distance: f64, _payload: &GossipPayload) -> DomainResult<()> {
        Ok(())
    }

    fn update_triangulation(&mut self) -> DomainResult<TriangulationOutput> {
        Err(DomainError::invariant("index map and matrix disagree"))
    }
}

struct Capture(Mutex<Vec<String>>);

impl DomainLogger for Capture {
    fn info(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("INFO:{}", msg));
    }
    fn warn(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("WARN:{}", msg));
    }
    fn error(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("ERR:{}", msg));
    }
}

#[test]
fn test_invariant_violation_is_reported_loudly() {
    let capture = Arc::new(Capture(Mutex::new(Vec::new())));
    let mut node = AgentNode::new(
        id(0),
        chatty_settings(),
        Box::new(SilentCommunication),
        Box::new(BrokenTriangulation),
        capture.clone(),
    );

    let result = node.triangulation_tick().unwrap();
    assert!(matches!(result, Err(DomainError::InvariantViolation { .. })));
    assert_eq!(node.frame(), &LocalFrame::anchored(id(0)));

    let messages = capture.0.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("ERR:agent 0: triangulation aborted"));
}
