use crate::common::{DomainError, DomainResult, Position2D};

/// Below this spread a point set cannot fix a rotation.
const MIN_SPREAD: f64 = 1e-12;

/// Rotation plus translation, optionally preceded by a reflection across the
/// X axis. No scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform2D {
    pub theta: f64,
    pub tx: f64,
    pub ty: f64,
    pub mirrored: bool,
}

impl RigidTransform2D {
    pub fn apply(&self, point: Position2D) -> Position2D {
        let p = if self.mirrored { point.mirrored() } else { point };
        let (sin, cos) = self.theta.sin_cos();
        Position2D::new(
            self.tx + p.x * cos - p.y * sin,
            self.ty + p.x * sin + p.y * cos,
        )
    }

    /// Least-squares rigid transform mapping `source` onto `target`
    /// (closed form for 2D point-to-point registration).
    pub fn estimate(source: &[Position2D], target: &[Position2D], mirrored: bool) -> DomainResult<Self> {
        if source.len() != target.len() {
            return Err(DomainError::invariant(format!(
                "{} source points paired with {} target points",
                source.len(),
                target.len()
            )));
        }
        if source.len() < 2 {
            return Err(DomainError::insufficient(
                "a rigid transform needs at least two correspondences",
            ));
        }

        let source: Vec<Position2D> = source
            .iter()
            .map(|p| if mirrored { p.mirrored() } else { *p })
            .collect();

        let n = source.len() as f64;
        let (scx, scy) = source.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let (tcx, tcy) = target.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let (scx, scy, tcx, tcy) = (scx / n, scy / n, tcx / n, tcy / n);

        let mut dot = 0.0;
        let mut cross = 0.0;
        let mut source_spread = 0.0;
        let mut target_spread = 0.0;
        for (s, t) in source.iter().zip(target) {
            let (sx, sy) = (s.x - scx, s.y - scy);
            let (qx, qy) = (t.x - tcx, t.y - tcy);
            dot += sx * qx + sy * qy;
            cross += sx * qy - sy * qx;
            source_spread += sx * sx + sy * sy;
            target_spread += qx * qx + qy * qy;
        }

        if source_spread < MIN_SPREAD || target_spread < MIN_SPREAD {
            return Err(DomainError::degenerate(
                "correspondences collapse to a single point",
            ));
        }

        let theta = cross.atan2(dot);
        let (sin, cos) = theta.sin_cos();
        Ok(Self {
            theta,
            tx: tcx - (scx * cos - scy * sin),
            ty: tcy - (scx * sin + scy * cos),
            mirrored,
        })
    }

    /// Summed Euclidean error of the transformed source against the target.
    pub fn total_error(&self, source: &[Position2D], target: &[Position2D]) -> f64 {
        source
            .iter()
            .zip(target)
            .map(|(s, t)| self.apply(*s).distance(t))
            .sum()
    }
}
