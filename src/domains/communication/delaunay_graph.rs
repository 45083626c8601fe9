//! Delaunay neighbour graph over agents' true positions (Bowyer-Watson).

use crate::common::{AgentId, Position2D};
use petgraph::graphmap::UnGraphMap;

pub type NeighbourGraph = UnGraphMap<AgentId, ()>;

/// Relative tolerance for collinearity and circumcircle tests.
const EPS: f64 = 1e-12;

/// Builds the Delaunay graph of `points`.
///
/// Two points give a single edge; collinear sets are chained in order along
/// their line; agents sharing a position are linked to the first agent seen
/// there.
pub fn delaunay_graph(points: &[(AgentId, Position2D)]) -> NeighbourGraph {
    let mut graph = NeighbourGraph::new();

    let mut unique: Vec<(AgentId, Position2D)> = Vec::with_capacity(points.len());
    for (id, p) in points.iter().filter(|(_, p)| p.is_finite()) {
        graph.add_node(*id);
        match unique.iter().find(|(_, q)| q.distance(p) <= EPS) {
            Some((twin, _)) => {
                graph.add_edge(*twin, *id, ());
            }
            None => unique.push((*id, *p)),
        }
    }

    match unique.len() {
        0 | 1 => {}
        2 => {
            graph.add_edge(unique[0].0, unique[1].0, ());
        }
        _ if is_collinear(&unique) => chain(&mut graph, &mut unique),
        _ => {
            let positions: Vec<Position2D> = unique.iter().map(|(_, p)| *p).collect();
            for [a, b, c] in bowyer_watson(&positions) {
                graph.add_edge(unique[a].0, unique[b].0, ());
                graph.add_edge(unique[b].0, unique[c].0, ());
                graph.add_edge(unique[c].0, unique[a].0, ());
            }
        }
    }

    graph
}

fn scale(points: &[(AgentId, Position2D)]) -> f64 {
    let (min_x, max_x, min_y, max_y) = bounds(points.iter().map(|(_, p)| *p));
    (max_x - min_x).max(max_y - min_y).max(1.0)
}

fn bounds(points: impl Iterator<Item = Position2D>) -> (f64, f64, f64, f64) {
    points.fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(a, b, c, d), p| (a.min(p.x), b.max(p.x), c.min(p.y), d.max(p.y)),
    )
}

fn is_collinear(points: &[(AgentId, Position2D)]) -> bool {
    let origin = points[0].1;
    let Some(far) = points
        .iter()
        .map(|(_, p)| *p)
        .max_by(|a, b| a.distance(&origin).total_cmp(&b.distance(&origin)))
    else {
        return true;
    };
    let (dx, dy) = (far.x - origin.x, far.y - origin.y);
    let tolerance = EPS * scale(points).powi(2) * 1e3;
    points
        .iter()
        .all(|(_, p)| (dx * (p.y - origin.y) - dy * (p.x - origin.x)).abs() <= tolerance)
}

fn chain(graph: &mut NeighbourGraph, points: &mut [(AgentId, Position2D)]) {
    let origin = points[0].1;
    let far = points
        .iter()
        .map(|(_, p)| *p)
        .fold(origin, |best, p| if p.distance(&origin) > best.distance(&origin) { p } else { best });
    let (dx, dy) = (far.x - origin.x, far.y - origin.y);
    points.sort_by(|(_, a), (_, b)| {
        let ta = (a.x - origin.x) * dx + (a.y - origin.y) * dy;
        let tb = (b.x - origin.x) * dx + (b.y - origin.y) * dy;
        ta.total_cmp(&tb)
    });
    for pair in points.windows(2) {
        graph.add_edge(pair[0].0, pair[1].0, ());
    }
}

fn circumcircle_contains(a: Position2D, b: Position2D, c: Position2D, p: Position2D) -> bool {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() <= f64::MIN_POSITIVE {
        return false;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let center = Position2D::new(
        (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    );
    let r2 = (a.x - center.x).powi(2) + (a.y - center.y).powi(2);
    let p2 = (p.x - center.x).powi(2) + (p.y - center.y).powi(2);
    p2 < r2 * (1.0 - EPS)
}

/// Triangles over indices of `points`; super-triangle vertices removed.
fn bowyer_watson(points: &[Position2D]) -> Vec<[usize; 3]> {
    let n = points.len();
    let (min_x, max_x, min_y, max_y) = bounds(points.iter().copied());
    let delta = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid = Position2D::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    let mut vertices = points.to_vec();
    vertices.push(Position2D::new(mid.x - 20.0 * delta, mid.y - delta));
    vertices.push(Position2D::new(mid.x, mid.y + 20.0 * delta));
    vertices.push(Position2D::new(mid.x + 20.0 * delta, mid.y - delta));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for i in 0..n {
        let p = vertices[i];
        let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
            .into_iter()
            .partition(|t| circumcircle_contains(vertices[t[0]], vertices[t[1]], vertices[t[2]], p));

        let edges: Vec<(usize, usize)> = bad
            .iter()
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .collect();
        let boundary = edges.iter().filter(|&&(a, b)| {
            edges
                .iter()
                .filter(|&&(c, d)| (a == c && b == d) || (a == d && b == c))
                .count()
                == 1
        });

        triangles = good;
        for &(a, b) in boundary {
            triangles.push([a, b, i]);
        }
    }

    triangles.retain(|t| t.iter().all(|&v| v < n));
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_triangle_is_fully_connected() {
        let points = vec![
            (AgentId(0), Position2D::new(0.0, 0.0)),
            (AgentId(1), Position2D::new(4.0, 0.0)),
            (AgentId(2), Position2D::new(0.0, 3.0)),
        ];
        let graph = delaunay_graph(&points);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn collinear_points_form_a_chain() {
        let points = vec![
            (AgentId(0), Position2D::new(0.0, 0.0)),
            (AgentId(1), Position2D::new(2.0, 0.0)),
            (AgentId(2), Position2D::new(1.0, 0.0)),
        ];
        let graph = delaunay_graph(&points);
        assert!(graph.contains_edge(AgentId(0), AgentId(2)));
        assert!(graph.contains_edge(AgentId(2), AgentId(1)));
        assert!(!graph.contains_edge(AgentId(0), AgentId(1)));
    }
}
