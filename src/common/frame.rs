use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a swarm member, stable for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(value: u32) -> Self {
        AgentId(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub const ORIGIN: Position2D = Position2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Reflection across the X axis.
    pub fn mirrored(&self) -> Position2D {
        Position2D::new(self.x, -self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One agent's belief about relative swarm geometry, expressed in its own
/// arbitrary coordinate system.
///
/// Ordered by `AgentId` so iteration (and therefore merging) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalFrame {
    points: BTreeMap<AgentId, Position2D>,
}

impl LocalFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame that only knows its owner, placed at the origin.
    pub fn anchored(owner: AgentId) -> Self {
        let mut frame = Self::new();
        frame.insert(owner, Position2D::ORIGIN);
        frame
    }

    pub fn insert(&mut self, id: AgentId, position: Position2D) -> Option<Position2D> {
        self.points.insert(id, position)
    }

    pub fn get(&self, id: AgentId) -> Option<&Position2D> {
        self.points.get(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.points.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, Position2D)> + '_ {
        self.points.iter().map(|(id, p)| (*id, *p))
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.points.keys().copied()
    }

    /// Agents known to both frames ("landmarks"), in ascending id order.
    pub fn common_ids(&self, other: &LocalFrame) -> Vec<AgentId> {
        self.points
            .keys()
            .filter(|id| other.points.contains_key(id))
            .copied()
            .collect()
    }

    /// Columns of x and y values in id order, the shape renderers consume.
    pub fn xy(&self) -> (Vec<f64>, Vec<f64>) {
        self.points.values().map(|p| (p.x, p.y)).unzip()
    }

    /// Drops points with non-finite coordinates; returns how many were removed.
    pub fn retain_finite(&mut self) -> usize {
        let before = self.points.len();
        self.points.retain(|_, p| p.is_finite());
        before - self.points.len()
    }
}

impl FromIterator<(AgentId, Position2D)> for LocalFrame {
    fn from_iter<T: IntoIterator<Item = (AgentId, Position2D)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
