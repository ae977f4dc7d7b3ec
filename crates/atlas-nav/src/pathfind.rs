//! A* pathfinding over a [`NavGraph`].
//!
//! Ties in the open set break deterministically: lower `f`, then lower
//! `g`, then lower face id — so two clients requesting the same route get
//! the same answer regardless of insertion order into the heap.
use crate::graph::NavGraph;
use atlas_core::FaceId;
use petgraph::Direction;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub face_path: Vec<FaceId>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    f: f64,
    g: f64,
    face: FaceId,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the lowest f, then the
        // lowest g, then the lowest face id first.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.g.partial_cmp(&self.g).unwrap_or(Ordering::Equal))
            .then_with(|| other.face.cmp(&self.face))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Euclidean centroid distance scaled by the graph's
/// [`NavGraph::min_cost_per_unit_distance`] so the heuristic never exceeds
/// the true cost of any path to `goal`, given the minimum possible
/// per-edge cost.
fn heuristic(nav: &NavGraph, face: FaceId, goal: FaceId) -> f64 {
    let (x1, y1) = nav.node(face).centroid;
    let (x2, y2) = nav.node(goal).centroid;
    let distance = ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt();
    distance * nav.min_cost_per_unit_distance
}

/// Find the lowest-cost face path from `start` to `goal`, or `None` if
/// either endpoint is impassable or no route exists.
pub fn find_path(nav: &NavGraph, start: FaceId, goal: FaceId) -> Option<PathResult> {
    if !nav.is_passable(start) || !nav.is_passable(goal) {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            face_path: vec![start],
            total_cost: 0.0,
        });
    }

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<FaceId, f64> = HashMap::new();
    let mut came_from: HashMap<FaceId, FaceId> = HashMap::new();

    g_score.insert(start, 0.0);
    open.push(Candidate {
        f: heuristic(nav, start, goal),
        g: 0.0,
        face: start,
    });

    while let Some(current) = open.pop() {
        if current.face == goal {
            let mut face_path = vec![goal];
            let mut cursor = goal;
            while let Some(&prev) = came_from.get(&cursor) {
                face_path.push(prev);
                cursor = prev;
            }
            face_path.reverse();
            return Some(PathResult {
                face_path,
                total_cost: current.g,
            });
        }
        if current.g > *g_score.get(&current.face).unwrap_or(&f64::INFINITY) {
            continue;
        }

        let node = nav.node_of(current.face);
        for edge in nav.graph.edges_directed(node, Direction::Outgoing) {
            let neighbor_face = nav.graph[edge.target()].face;
            let tentative_g = current.g + *edge.weight();
            if tentative_g < *g_score.get(&neighbor_face).unwrap_or(&f64::INFINITY) {
                g_score.insert(neighbor_face, tentative_g);
                came_from.insert(neighbor_face, current.face);
                open.push(Candidate {
                    f: tentative_g + heuristic(nav, neighbor_face, goal),
                    g: tentative_g,
                    face: neighbor_face,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_nav_graph;
    use atlas_terrain::coerce::RawControls;
    use atlas_terrain::controls::normalize_movement;

    #[test]
    fn path_to_self_is_trivial() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        let Some(&start) = nav.land_face_ids.first() else {
            return;
        };
        let result = find_path(&nav, start, start).unwrap();
        assert_eq!(result.face_path, vec![start]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn ocean_endpoints_have_no_path() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        let ocean_face = (0..terrain.mesh.face_count() as FaceId)
            .find(|&f| !terrain.water.is_land[f as usize]);
        if let Some(ocean_face) = ocean_face {
            if let Some(&land_face) = nav.land_face_ids.first() {
                assert!(find_path(&nav, ocean_face, land_face).is_none());
            }
        }
    }

    #[test]
    fn pathfinding_is_deterministic() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        if nav.land_face_ids.len() < 2 {
            return;
        }
        let start = nav.land_face_ids[0];
        let goal = *nav.land_face_ids.last().unwrap();
        let a = find_path(&nav, start, goal);
        let b = find_path(&nav, start, goal);
        assert_eq!(a, b);
    }

    #[test]
    fn found_path_endpoints_match_request() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        if nav.land_face_ids.len() < 2 {
            return;
        }
        let start = nav.land_face_ids[0];
        let goal = *nav.land_face_ids.last().unwrap();
        if let Some(result) = find_path(&nav, start, goal) {
            assert_eq!(*result.face_path.first().unwrap(), start);
            assert_eq!(*result.face_path.last().unwrap(), goal);
        }
    }
}
