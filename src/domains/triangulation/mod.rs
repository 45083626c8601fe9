pub mod matrix;
pub mod placement;
pub mod sub_triangulation;

pub use matrix::*;
pub use placement::*;
pub use sub_triangulation::*;

use crate::common::{AgentId, DomainResult, LocalFrame};
use crate::domains::gossip::GossipPayload;

/// A triangulation step's result: point columns plus the id-keyed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationOutput {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub frame: LocalFrame,
}

impl TriangulationOutput {
    pub fn from_frame(frame: LocalFrame) -> Self {
        let (xs, ys) = frame.xy();
        Self { xs, ys, frame }
    }
}

/// Seam between an agent and whatever turns gossip into geometry.
pub trait Triangulation: Send {
    fn owner(&self) -> AgentId;

    /// Feeds one exchange: the measured distance to `peer` plus what it advertised.
    fn update_information(
        &mut self,
        peer: AgentId,
        distance: f64,
        payload: &GossipPayload,
    ) -> DomainResult<()>;

    /// Recomputes the local frame. Errors mean "no update"; the previously
    /// accepted state is left untouched.
    fn update_triangulation(&mut self) -> DomainResult<TriangulationOutput>;

    /// Advances the age of any time-limited state the implementation keeps.
    fn age(&mut self, _delta: f64) {}
}
