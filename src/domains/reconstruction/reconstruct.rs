use crate::common::{AgentId, DomainResult, LocalFrame};
use crate::domains::gossip::{GossipPayload, PeerFrameCache};
use crate::domains::triangulation::{SubTriangulation, Triangulation, TriangulationOutput};

use super::merger::{FrameMerger, MergeReport};

/// Sub-triangulation followed by reconstruction against the frames peers
/// advertised.
#[derive(Debug, Clone)]
pub struct ReconstructTriangulation {
    local: SubTriangulation,
    peer_frames: PeerFrameCache,
    merger: FrameMerger,
    last_report: Option<MergeReport>,
}

impl ReconstructTriangulation {
    pub fn new(local: SubTriangulation, peer_frame_ttl: Option<f64>) -> Self {
        Self {
            local,
            peer_frames: PeerFrameCache::new(peer_frame_ttl),
            merger: FrameMerger::new(),
            last_report: None,
        }
    }

    pub fn local(&self) -> &SubTriangulation {
        &self.local
    }

    pub fn peer_frames(&self) -> &PeerFrameCache {
        &self.peer_frames
    }

    pub fn last_report(&self) -> Option<&MergeReport> {
        self.last_report.as_ref()
    }

    pub fn reconcile(&self, own: &LocalFrame) -> MergeReport {
        self.merger
            .merge_with_report(own, &self.peer_frames.fresh_frames())
    }
}

impl Triangulation for ReconstructTriangulation {
    fn owner(&self) -> AgentId {
        self.local.owner()
    }

    fn update_information(
        &mut self,
        peer: AgentId,
        distance: f64,
        payload: &GossipPayload,
    ) -> DomainResult<()> {
        if peer != self.owner() {
            if let Some(frame) = payload.usable_frame() {
                self.peer_frames.insert(peer, frame);
            }
        }
        self.local.update_information(peer, distance, payload)
    }

    fn update_triangulation(&mut self) -> DomainResult<TriangulationOutput> {
        let own = self.local.update_triangulation()?;
        let report = self.reconcile(&own.frame);
        let output = TriangulationOutput::from_frame(report.frame.clone());
        self.last_report = Some(report);
        Ok(output)
    }

    fn age(&mut self, delta: f64) {
        self.peer_frames.age_all(delta);
    }
}
