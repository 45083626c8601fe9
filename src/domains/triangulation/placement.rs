//! Incremental placement of points from a (pruned) distance matrix.
//!
//! Point 0 is fixed at the origin and the first point with a known distance
//! to it is laid on the positive X axis. Every further point is placed by
//! intersecting the circles around two already placed references; any extra
//! known distances are used to reject the wrong intersection. When only two
//! references exist the placement branches, which is how the reflection
//! ambiguity of distance-only data shows up as several constellations.

use crate::common::{DomainError, DomainResult, Position2D};
use ordered_float::OrderedFloat;

use super::matrix::DistanceSubMatrix;

/// One candidate layout, indexed like the matrix it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Constellation {
    pub positions: Vec<Option<Position2D>>,
    /// Sum of absolute distance errors over the constraints used to
    /// disambiguate placements.
    pub residual: f64,
}

impl Constellation {
    fn seeded(dim: usize) -> Self {
        Self {
            positions: vec![None; dim],
            residual: 0.0,
        }
    }

    pub fn get(&self, index: usize) -> Option<Position2D> {
        self.positions.get(index).copied().flatten()
    }

    pub fn placed_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }

    /// Summed point-wise displacement over indices placed in both.
    pub fn displacement_from(&self, previous: &Constellation) -> f64 {
        self.positions
            .iter()
            .zip(previous.positions.iter())
            .filter_map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(a.distance(b)),
                _ => None,
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementParams {
    /// Absolute tolerance for accepting a placement against a distance.
    pub precision: f64,
    /// Upper bound on simultaneously tracked constellations.
    pub max_constellations: usize,
}

/// Computes every constellation consistent with `matrix`.
///
/// Fails with `InsufficientData` when the owner has no usable distance and
/// with `DegenerateGeometry` when every branch hits a contradiction.
pub fn candidate_constellations(
    matrix: &DistanceSubMatrix,
    params: PlacementParams,
) -> DomainResult<Vec<Constellation>> {
    let dim = matrix.dim();
    if dim < 2 {
        return Err(DomainError::insufficient("no peers indexed yet"));
    }

    let (axis_index, axis_distance) = (1..dim)
        .find_map(|j| matrix.known(0, j).map(|d| (j, d)))
        .ok_or_else(|| DomainError::insufficient("owner has no known distance"))?;

    let mut seed = Constellation::seeded(dim);
    seed.positions[0] = Some(Position2D::ORIGIN);
    seed.positions[axis_index] = Some(Position2D::new(axis_distance, 0.0));

    let mut branches = vec![seed];
    let mut attempted = vec![false; dim];
    attempted[0] = true;
    attempted[axis_index] = true;

    while let Some(next) = next_point(matrix, &branches[0], &attempted) {
        attempted[next] = true;

        let mut grown = Vec::with_capacity(branches.len() * 2);
        let mut contradictions = 0usize;
        for branch in &branches {
            match place_point(matrix, branch, next, params.precision) {
                Placement::Candidates(candidates) => {
                    for (position, residual) in candidates {
                        let mut child = branch.clone();
                        child.positions[next] = Some(position);
                        child.residual += residual;
                        grown.push(child);
                    }
                }
                Placement::Unplaceable => grown.push(branch.clone()),
                Placement::Contradiction => contradictions += 1,
            }
        }

        if grown.is_empty() {
            return Err(DomainError::degenerate(format!(
                "point {} contradicts all {} constellation(s)",
                next, contradictions
            )));
        }

        if grown.len() > params.max_constellations {
            grown.sort_by_key(|c| OrderedFloat(c.residual));
            grown.truncate(params.max_constellations.max(1));
        }
        branches = grown;
    }

    Ok(branches)
}

/// The unattempted point with the most known distances to placed points
/// (at least two), lowest index first.
fn next_point(matrix: &DistanceSubMatrix, branch: &Constellation, attempted: &[bool]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for k in 0..matrix.dim() {
        if attempted[k] {
            continue;
        }
        let refs = (0..matrix.dim())
            .filter(|&r| branch.get(r).is_some() && matrix.known(k, r).is_some())
            .count();
        if refs >= 2 && best.map_or(true, |(_, n)| refs > n) {
            best = Some((k, refs));
        }
    }
    best.map(|(k, _)| k)
}

enum Placement {
    Candidates(Vec<(Position2D, f64)>),
    Unplaceable,
    Contradiction,
}

fn place_point(matrix: &DistanceSubMatrix, branch: &Constellation, k: usize, precision: f64) -> Placement {
    let refs: Vec<(Position2D, f64)> = (0..matrix.dim())
        .filter_map(|r| Some((branch.get(r)?, matrix.known(k, r)?)))
        .collect();

    let Some(&(p1, r1)) = refs.first() else {
        return Placement::Unplaceable;
    };
    // Second reference must be distinguishable from the first.
    let Some(second) = refs.iter().skip(1).position(|(p, _)| p.distance(&p1) > precision) else {
        return Placement::Unplaceable;
    };
    let (p2, r2) = refs[second + 1];

    let Some(intersections) = circle_intersections(p1, r1, p2, r2, precision) else {
        return Placement::Contradiction;
    };

    let checks: Vec<(Position2D, f64)> = refs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 0 && *i != second + 1)
        .map(|(_, c)| *c)
        .collect();

    let candidates: Vec<(Position2D, f64)> = intersections
        .into_iter()
        .filter_map(|candidate| {
            let mut residual = 0.0;
            for (anchor, expected) in &checks {
                let error = (candidate.distance(anchor) - expected).abs();
                if error > precision {
                    return None;
                }
                residual += error;
            }
            Some((candidate, residual))
        })
        .collect();

    if candidates.is_empty() {
        Placement::Contradiction
    } else {
        Placement::Candidates(candidates)
    }
}

/// Intersections of two circles. Near-misses within `precision` are snapped
/// to the tangent point; intersections closer together than `precision`
/// collapse to one.
fn circle_intersections(
    p1: Position2D,
    r1: f64,
    p2: Position2D,
    r2: f64,
    precision: f64,
) -> Option<Vec<Position2D>> {
    let d = p1.distance(&p2);
    if d <= f64::EPSILON {
        return None;
    }

    let gap = (d - (r1 + r2)).max((r1 - r2).abs() - d);
    if gap > precision {
        return None;
    }

    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();

    let ux = (p2.x - p1.x) / d;
    let uy = (p2.y - p1.y) / d;
    let base = Position2D::new(p1.x + a * ux, p1.y + a * uy);

    let upper = Position2D::new(base.x - h * uy, base.y + h * ux);
    if 2.0 * h <= precision {
        return Some(vec![upper]);
    }
    let lower = Position2D::new(base.x + h * uy, base.y - h * ux);
    Some(vec![upper, lower])
}
