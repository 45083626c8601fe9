use swarm_localization::common::ApplicationError;
use swarm_localization::config::{AgentPlacement, Config};
use swarm_localization::domains::communication::PolicyKind;
use swarm_localization::domains::gossip::PayloadMode;
use tempfile::TempDir;

const SAMPLE: &str = r#"
[simulation]
refresh_rate = 0.02
triangulation_refresh_rate = 0.1
triangulation_precision = 0.05
communication_frequency = 1.0
communication_radius = 12.5
time_to_live = 4.0
peer_frame_ttl = 8.0
policy = "delaunay"
payload = "distances_only"
reconstruct = false
seed = 17

[logging]
level = "debug"

[[agents]]
id = 1
x = 0.0
y = 0.0

[[agents]]
id = 2
x = 3.0
y = 4.0
"#;

fn invalid_field(config: &Config) -> Option<String> {
    match config.validate() {
        Err(ApplicationError::InvalidConfiguration { field, .. }) => Some(field),
        _ => None,
    }
}

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.simulation.policy, PolicyKind::Global);
    assert_eq!(config.simulation.payload, PayloadMode::DistancesAndFrame);
    assert_eq!(config.placements().len(), 4);
}

#[test]
fn test_toml_is_parsed() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    assert!(config.validate().is_ok());

    let sim = &config.simulation;
    assert_eq!(sim.refresh_rate, 0.02);
    assert_eq!(sim.communication_radius, 12.5);
    assert_eq!(sim.peer_frame_ttl, Some(8.0));
    assert_eq!(sim.policy, PolicyKind::Delaunay);
    assert_eq!(sim.payload, PayloadMode::DistancesOnly);
    assert!(!sim.reconstruct);
    assert_eq!(sim.seed, Some(17));
    // Unset keys keep their defaults.
    assert_eq!(sim.max_constellations, 64);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.buffer_capacity, 1024);

    assert_eq!(
        config.placements(),
        vec![
            AgentPlacement { id: 1, x: 0.0, y: 0.0 },
            AgentPlacement { id: 2, x: 3.0, y: 4.0 },
        ]
    );
}

#[test]
fn test_unknown_policy_is_a_parse_error() {
    let broken = SAMPLE.replace("\"delaunay\"", "\"telepathy\"");
    assert!(Config::from_toml_str(&broken).is_err());
}

#[test]
fn test_validation_rejects_unschedulable_values() {
    let mut config = Config::default();
    config.simulation.refresh_rate = 0.0;
    assert_eq!(invalid_field(&config).as_deref(), Some("simulation.refresh_rate"));

    let mut config = Config::default();
    config.simulation.triangulation_refresh_rate = -1.0;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.triangulation_refresh_rate")
    );

    let mut config = Config::default();
    config.simulation.triangulation_precision = 0.0;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.triangulation_precision")
    );

    let mut config = Config::default();
    config.simulation.communication_frequency = f64::NAN;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.communication_frequency")
    );

    let mut config = Config::default();
    config.simulation.communication_radius = -3.0;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.communication_radius")
    );

    let mut config = Config::default();
    config.simulation.peer_frame_ttl = Some(0.0);
    assert_eq!(invalid_field(&config).as_deref(), Some("simulation.peer_frame_ttl"));

    // Positive, but rounds to a zero-length timer period.
    let mut config = Config::default();
    config.simulation.refresh_rate = 1e-10;
    assert_eq!(invalid_field(&config).as_deref(), Some("simulation.refresh_rate"));

    let mut config = Config::default();
    config.simulation.triangulation_refresh_rate = 1e30;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.triangulation_refresh_rate")
    );

    let mut config = Config::default();
    config.simulation.duration_secs = 1e30;
    assert_eq!(invalid_field(&config).as_deref(), Some("simulation.duration_secs"));

    let mut config = Config::default();
    config.simulation.max_constellations = 0;
    assert_eq!(
        invalid_field(&config).as_deref(),
        Some("simulation.max_constellations")
    );
}

#[test]
fn test_validation_rejects_duplicate_agents() {
    let mut config = Config::default();
    config.agents = vec![
        AgentPlacement { id: 4, x: 0.0, y: 0.0 },
        AgentPlacement { id: 4, x: 1.0, y: 0.0 },
    ];
    assert_eq!(invalid_field(&config).as_deref(), Some("agents"));
}

#[tokio::test]
async fn test_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("swarm.toml");
    tokio::fs::write(&path, SAMPLE).await.unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.simulation.policy, PolicyKind::Delaunay);

    assert!(Config::from_file(dir.path().join("missing.toml")).await.is_err());
}

#[test]
fn test_layered_load_with_environment_override() {
    let dir = TempDir::new().unwrap();

    // A missing file is not an error: everything falls back to defaults.
    let config = Config::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.simulation.communication_radius, 15.0);

    let path = dir.path().join("swarm.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    std::env::set_var("SWARM__SIMULATION__COMMUNICATION_RADIUS", "42.5");
    let loaded = Config::load(&path);
    std::env::remove_var("SWARM__SIMULATION__COMMUNICATION_RADIUS");

    let config = loaded.unwrap();
    assert_eq!(config.simulation.communication_radius, 42.5);
    assert_eq!(config.simulation.policy, PolicyKind::Delaunay);
    assert_eq!(config.agents.len(), 2);
}
