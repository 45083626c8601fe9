use crate::common::{AgentId, Position2D};

/// Port to the surrounding simulation's ground truth. Agents only read it.
pub trait GroundTruth: Send + Sync {
    /// True distance between two agents, `None` when the pair is unknown.
    fn distance(&self, a: AgentId, b: AgentId) -> Option<f64>;

    /// True positions, for policies that reason about physical adjacency.
    /// Oracles that only know distances return nothing.
    fn positions(&self) -> Vec<(AgentId, Position2D)> {
        Vec::new()
    }
}
