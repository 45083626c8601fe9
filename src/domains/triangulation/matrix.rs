use crate::common::{AgentId, DomainError, DomainResult};
use crate::domains::gossip::UNKNOWN_DISTANCE;
use std::collections::HashMap;

/// Only three reference distances are needed to place a point in 2D.
pub const TRUSTED_NEIGHBOURS: usize = 3;

/// Whether a matrix entry can be used as a geometric constraint. Zero is
/// treated as unmeasured: a coincident pair cannot anchor a placement.
pub fn is_known(distance: f64) -> bool {
    distance.is_finite() && distance > 0.0
}

/// Symmetric distance matrix over a growing set of agents.
///
/// Index 0 is always the owner. Indices are handed out on first sight and
/// never reused, so a constellation computed earlier can be compared
/// index-by-index with a later one.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSubMatrix {
    id_to_index: HashMap<AgentId, usize>,
    index_to_id: Vec<AgentId>,
    values: Vec<f64>,
}

impl DistanceSubMatrix {
    pub fn new(owner: AgentId) -> Self {
        let mut id_to_index = HashMap::new();
        id_to_index.insert(owner, 0);
        Self {
            id_to_index,
            index_to_id: vec![owner],
            values: vec![0.0],
        }
    }

    /// Builds a matrix from explicit rows, indexing agents in the given order.
    pub fn from_rows(ids: &[AgentId], rows: &[Vec<f64>]) -> DomainResult<Self> {
        let owner = *ids
            .first()
            .ok_or_else(|| DomainError::invalid("matrix needs at least the owner"))?;
        if rows.len() != ids.len() || rows.iter().any(|r| r.len() != ids.len()) {
            return Err(DomainError::invalid("rows do not form a square matrix over the ids"));
        }

        let mut matrix = Self::new(owner);
        for id in &ids[1..] {
            matrix.ensure_index(*id);
        }
        if matrix.dim() != ids.len() {
            return Err(DomainError::invalid("duplicate agent id in matrix ids"));
        }
        for i in 0..ids.len() {
            for j in 0..ids.len() {
                if i != j {
                    matrix.values[i * ids.len() + j] = rows[i][j];
                }
            }
        }
        Ok(matrix)
    }

    pub fn owner(&self) -> AgentId {
        self.index_to_id[0]
    }

    pub fn dim(&self) -> usize {
        self.index_to_id.len()
    }

    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<AgentId> {
        self.index_to_id.get(index).copied()
    }

    pub fn ids(&self) -> &[AgentId] {
        &self.index_to_id
    }

    /// Returns the index of `id`, appending a row and column if unseen.
    pub fn ensure_index(&mut self, id: AgentId) -> usize {
        if let Some(index) = self.id_to_index.get(&id) {
            return *index;
        }

        let old_dim = self.dim();
        let new_dim = old_dim + 1;
        let mut grown = vec![UNKNOWN_DISTANCE; new_dim * new_dim];
        for i in 0..old_dim {
            grown[i * new_dim..i * new_dim + old_dim]
                .copy_from_slice(&self.values[i * old_dim..(i + 1) * old_dim]);
        }
        grown[old_dim * new_dim + old_dim] = 0.0;

        self.values = grown;
        self.index_to_id.push(id);
        self.id_to_index.insert(id, old_dim);
        old_dim
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let dim = self.dim();
        if i >= dim || j >= dim {
            return UNKNOWN_DISTANCE;
        }
        self.values[i * dim + j]
    }

    /// The entry if it is a usable constraint.
    pub fn known(&self, i: usize, j: usize) -> Option<f64> {
        let d = self.get(i, j);
        (i != j && is_known(d)).then_some(d)
    }

    /// Sets the distance between two indexed agents, both halves at once.
    pub fn set(&mut self, a: AgentId, b: AgentId, distance: f64) -> DomainResult<()> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(DomainError::invalid(format!(
                "distance {} between {} and {} is not a measurement",
                distance, a, b
            )));
        }
        let i = self
            .index_of(a)
            .ok_or_else(|| DomainError::invariant(format!("{} is not indexed", a)))?;
        let j = self
            .index_of(b)
            .ok_or_else(|| DomainError::invariant(format!("{} is not indexed", b)))?;
        if i == j {
            return Ok(());
        }

        let dim = self.dim();
        self.values[i * dim + j] = distance;
        self.values[j * dim + i] = distance;
        Ok(())
    }

    /// Keeps, per row, only the first `cap` known entries to the right of the
    /// diagonal (lowest column index first) and mirrors the result, so every
    /// other off-diagonal entry becomes unknown.
    pub fn pruned(&self, cap: usize) -> DistanceSubMatrix {
        let dim = self.dim();
        let mut values = vec![UNKNOWN_DISTANCE; dim * dim];

        for i in 0..dim {
            values[i * dim + i] = 0.0;
            let mut kept = 0;
            for j in (i + 1)..dim {
                let d = self.values[i * dim + j];
                if is_known(d) && kept < cap {
                    values[i * dim + j] = d;
                    values[j * dim + i] = d;
                    kept += 1;
                }
            }
        }

        DistanceSubMatrix {
            id_to_index: self.id_to_index.clone(),
            index_to_id: self.index_to_id.clone(),
            values,
        }
    }

    pub fn row(&self, i: usize) -> Vec<f64> {
        let dim = self.dim();
        if i >= dim {
            return Vec::new();
        }
        self.values[i * dim..(i + 1) * dim].to_vec()
    }
}
