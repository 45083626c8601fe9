use crate::common::{AgentId, DomainError, DomainResult, LocalFrame};
use crate::domains::gossip::GossipPayload;
use ordered_float::OrderedFloat;

use super::matrix::{DistanceSubMatrix, TRUSTED_NEIGHBOURS};
use super::placement::{candidate_constellations, Constellation, PlacementParams};
use super::{Triangulation, TriangulationOutput};

/// The local triangulator: a bounded distance sub-matrix turned into 2D
/// placements, kept stable across updates by preferring the candidate
/// closest to the previously accepted constellation.
#[derive(Debug, Clone)]
pub struct SubTriangulation {
    matrix: DistanceSubMatrix,
    params: PlacementParams,
    neighbour_cap: usize,
    previous: Option<Constellation>,
}

impl SubTriangulation {
    pub fn new(owner: AgentId, precision: f64, max_constellations: usize) -> Self {
        Self {
            matrix: DistanceSubMatrix::new(owner),
            params: PlacementParams {
                precision,
                max_constellations,
            },
            neighbour_cap: TRUSTED_NEIGHBOURS,
            previous: None,
        }
    }

    pub fn matrix(&self) -> &DistanceSubMatrix {
        &self.matrix
    }

    pub fn previous_constellation(&self) -> Option<&Constellation> {
        self.previous.as_ref()
    }

    /// The matrix as the placement step sees it.
    pub fn pruned_matrix(&self) -> DistanceSubMatrix {
        self.matrix.pruned(self.neighbour_cap)
    }

    pub fn candidates(&self) -> DomainResult<Vec<Constellation>> {
        candidate_constellations(&self.pruned_matrix(), self.params)
    }

    /// First candidate when nothing was accepted yet, otherwise the one with
    /// the smallest displacement from the previous constellation (residual,
    /// then order, break ties).
    pub fn select(&self, candidates: Vec<Constellation>) -> Option<Constellation> {
        match &self.previous {
            None => candidates.into_iter().next(),
            Some(previous) => candidates
                .into_iter()
                .enumerate()
                .min_by_key(|(i, c)| {
                    (
                        OrderedFloat(c.displacement_from(previous)),
                        OrderedFloat(c.residual),
                        *i,
                    )
                })
                .map(|(_, c)| c),
        }
    }

    fn frame_of(&self, constellation: &Constellation) -> DomainResult<LocalFrame> {
        let mut frame = LocalFrame::new();
        for (index, position) in constellation.positions.iter().enumerate() {
            let Some(position) = position else { continue };
            let id = self.matrix.id_at(index).ok_or_else(|| {
                DomainError::invariant(format!("constellation index {} has no agent id", index))
            })?;
            frame.insert(id, *position);
        }
        Ok(frame)
    }
}

impl Triangulation for SubTriangulation {
    fn owner(&self) -> AgentId {
        self.matrix.owner()
    }

    fn update_information(
        &mut self,
        peer: AgentId,
        distance: f64,
        payload: &GossipPayload,
    ) -> DomainResult<()> {
        let owner = self.matrix.owner();
        if peer == owner {
            return Ok(());
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(DomainError::invalid(format!(
                "measured distance {} to {} is not usable",
                distance, peer
            )));
        }

        self.matrix.ensure_index(peer);
        self.matrix.set(owner, peer, distance)?;

        // Our own measurement of the peer wins; agents never seen are ignored.
        for (subject, d) in payload.usable_distances() {
            if subject != owner && self.matrix.index_of(subject).is_some() {
                self.matrix.set(peer, subject, d)?;
            }
        }
        Ok(())
    }

    fn update_triangulation(&mut self) -> DomainResult<TriangulationOutput> {
        let candidates = self.candidates()?;
        let chosen = self
            .select(candidates)
            .ok_or_else(|| DomainError::degenerate("placement produced no constellation"))?;

        let frame = self.frame_of(&chosen)?;
        tracing::debug!(
            owner = %self.matrix.owner(),
            placed = chosen.placed_count(),
            residual = chosen.residual,
            "sub-triangulation accepted"
        );
        self.previous = Some(chosen);
        Ok(TriangulationOutput::from_frame(frame))
    }
}
