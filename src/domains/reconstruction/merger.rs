//! Reconciles an agent's own frame with frames advertised by peers.
//!
//! Each peer frame lives in its own rotated, translated and possibly
//! mirrored coordinate system. Points known to both frames (landmarks) fix
//! a rigid transform; the transformed peer frame then contributes only the
//! points the running frame does not know yet.

use crate::common::{AgentId, DomainError, DomainResult, LocalFrame, Position2D};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::transform::RigidTransform2D;

/// A peer frame expressed in the running frame's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub transform: RigidTransform2D,
    /// Summed positional error over the landmarks.
    pub error: f64,
    pub landmarks: usize,
    pub frame: LocalFrame,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub frame: LocalFrame,
    pub merged_peers: Vec<AgentId>,
    pub skipped_peers: Vec<(AgentId, DomainError)>,
    pub added_points: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameMerger {
    min_landmarks: usize,
}

impl Default for FrameMerger {
    fn default() -> Self {
        Self { min_landmarks: 2 }
    }
}

impl FrameMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimates the direct and the mirrored transform of `peer` onto
    /// `running` and keeps the one with the lower landmark error.
    pub fn align(&self, peer: &LocalFrame, running: &LocalFrame) -> DomainResult<Alignment> {
        let landmarks = peer.common_ids(running);
        if landmarks.len() < self.min_landmarks {
            return Err(DomainError::insufficient(format!(
                "{} common point(s), need {}",
                landmarks.len(),
                self.min_landmarks
            )));
        }

        let mut source = Vec::with_capacity(landmarks.len());
        let mut target = Vec::with_capacity(landmarks.len());
        for id in &landmarks {
            match (peer.get(*id), running.get(*id)) {
                (Some(s), Some(t)) => {
                    source.push(*s);
                    target.push(*t);
                }
                _ => return Err(DomainError::invariant(format!("landmark {} vanished", id))),
            }
        }

        let direct = RigidTransform2D::estimate(&source, &target, false)
            .map(|t| (t.total_error(&source, &target), t));
        let mirrored = RigidTransform2D::estimate(&source, &target, true)
            .map(|t| (t.total_error(&source, &target), t));

        let (error, transform) = match (direct, mirrored) {
            (Ok(d), Ok(m)) => {
                if m.0 < d.0 {
                    m
                } else {
                    d
                }
            }
            (Ok(d), Err(_)) => d,
            (Err(_), Ok(m)) => m,
            (Err(e), Err(_)) => return Err(e),
        };

        let frame = peer
            .iter()
            .map(|(id, p)| (id, transform.apply(p)))
            .collect();

        Ok(Alignment {
            transform,
            error,
            landmarks: landmarks.len(),
            frame,
        })
    }

    pub fn merge(&self, own: &LocalFrame, peers: &BTreeMap<AgentId, LocalFrame>) -> LocalFrame {
        self.merge_with_report(own, peers).frame
    }

    /// Folds peer frames into `own`, best-connected peers first. Points the
    /// running frame already holds are never overwritten.
    pub fn merge_with_report(
        &self,
        own: &LocalFrame,
        peers: &BTreeMap<AgentId, LocalFrame>,
    ) -> MergeReport {
        let mut report = MergeReport {
            frame: own.clone(),
            ..MergeReport::default()
        };
        if own.is_empty() {
            return report;
        }

        let mut ordered: Vec<(AgentId, &LocalFrame, usize)> = peers
            .iter()
            .map(|(id, frame)| (*id, frame, frame.common_ids(own).len()))
            .collect();
        ordered.sort_by_key(|(id, _, common)| (Reverse(*common), *id));

        for (peer_id, peer_frame, _) in ordered {
            let alignment = match self.align(peer_frame, &report.frame) {
                Ok(alignment) => alignment,
                Err(e) => {
                    tracing::debug!(peer = %peer_id, error = %e, "peer frame skipped");
                    report.skipped_peers.push((peer_id, e));
                    continue;
                }
            };

            let fresh: Vec<(AgentId, Position2D)> = alignment
                .frame
                .iter()
                .filter(|(id, p)| !report.frame.contains(*id) && p.is_finite())
                .collect();

            tracing::debug!(
                peer = %peer_id,
                landmarks = alignment.landmarks,
                error = alignment.error,
                mirrored = alignment.transform.mirrored,
                added = fresh.len(),
                "peer frame merged"
            );

            report.added_points += fresh.len();
            for (id, p) in fresh {
                report.frame.insert(id, p);
            }
            report.merged_peers.push(peer_id);
        }

        report
    }
}
