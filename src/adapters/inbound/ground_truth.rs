use crate::common::{AgentId, DomainError, DomainResult, Position2D};
use crate::domains::communication::GroundTruth;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// True positions of every agent, as maintained by the surrounding
/// simulation. Distances are Euclidean and always current.
#[derive(Debug, Default)]
pub struct SharedPositions {
    positions: RwLock<BTreeMap<AgentId, Position2D>>,
}

impl SharedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_placements(placements: impl IntoIterator<Item = (AgentId, Position2D)>) -> Self {
        Self {
            positions: RwLock::new(placements.into_iter().collect()),
        }
    }

    /// Places or moves an agent. Non-finite positions are rejected.
    pub fn move_agent(&self, id: AgentId, position: Position2D) -> DomainResult<()> {
        if !position.is_finite() {
            return Err(DomainError::invalid(format!(
                "position ({}, {}) for {} is not finite",
                position.x, position.y, id
            )));
        }
        let mut positions = self
            .positions
            .write()
            .map_err(|_| DomainError::invariant("ground truth lock poisoned"))?;
        positions.insert(id, position);
        Ok(())
    }

    pub fn position(&self, id: AgentId) -> Option<Position2D> {
        self.positions.read().ok()?.get(&id).copied()
    }
}

impl GroundTruth for SharedPositions {
    fn distance(&self, a: AgentId, b: AgentId) -> Option<f64> {
        let positions = self.positions.read().ok()?;
        Some(positions.get(&a)?.distance(positions.get(&b)?))
    }

    fn positions(&self) -> Vec<(AgentId, Position2D)> {
        match self.positions.read() {
            Ok(positions) => positions.iter().map(|(id, p)| (*id, *p)).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Explicit symmetric distances without any positions, for scenarios where
/// only ranging data exists.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    distances: HashMap<(AgentId, AgentId), f64>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: AgentId, b: AgentId, distance: f64) -> DomainResult<()> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(DomainError::invalid(format!(
                "distance {} between {} and {} is not usable",
                distance, a, b
            )));
        }
        self.distances.insert(ordered(a, b), distance);
        Ok(())
    }

    pub fn with(mut self, a: AgentId, b: AgentId, distance: f64) -> DomainResult<Self> {
        self.insert(a, b, distance)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

impl GroundTruth for DistanceTable {
    fn distance(&self, a: AgentId, b: AgentId) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        self.distances.get(&ordered(a, b)).copied()
    }
}

fn ordered(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
