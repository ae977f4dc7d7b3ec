//! Navigation graph construction: one node per mesh face, one directed
//! edge per passable adjacency, weighted by the movement cost
//! formula below. Built once per terrain build and reused across every
//! `actor_move` request until the next `terrain_publish`.
use atlas_core::FaceId;
use atlas_terrain::{MovementConfig, TerrainBuildOutput};
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, Copy)]
pub struct NavNode {
    pub face: FaceId,
    pub centroid: (f64, f64),
    pub is_land: bool,
    pub elevation: f64,
}

/// Edge step cost, or `None` if the destination is impassable: ocean, or
/// land at/above `movement.impassable_threshold`.
/// `elev_from` anchors the lowland floor so a descent from high ground
/// back to the same lowland elevation is free of gain penalty; only the
/// climb above `min(elev_from, lowland_threshold)` costs extra. A flat
/// multiplicative `river_penalty` applies when the edge itself was walked
/// by a traced river, not merely when the destination face sits on one.
pub fn step_cost(elev_from: f64, elev_to: f64, is_land: bool, is_river: bool, movement: &MovementConfig) -> Option<f64> {
    if !is_land || elev_to >= movement.impassable_threshold {
        return None;
    }
    let lowland_floor = elev_from.min(movement.lowland_threshold);
    let gain = (elev_to - lowland_floor).max(0.0);
    let base = 1.0 + movement.elevation_gain_k * gain.powf(movement.elevation_power);
    let river_multiplier = if is_river { 1.0 + movement.river_penalty } else { 1.0 };
    Some(base * river_multiplier)
}

#[derive(Debug)]
pub struct NavGraph {
    pub graph: DiGraph<NavNode, f64>,
    pub face_to_node: Vec<NodeIndex>,
    pub land_face_ids: Vec<FaceId>,
    /// The lowest `edge_cost / euclidean_centroid_distance` ratio over every
    /// built edge. Multiplying a straight-line centroid distance by this
    /// factor yields a heuristic that never exceeds the true per-distance
    /// cost of any edge on the graph, which is what keeps A*'s heuristic
    /// admissible regardless of `movement`'s tuning.
    pub min_cost_per_unit_distance: f64,
}

impl NavGraph {
    pub fn node_of(&self, face: FaceId) -> NodeIndex {
        self.face_to_node[face as usize]
    }
    pub fn node(&self, face: FaceId) -> &NavNode {
        &self.graph[self.node_of(face)]
    }
    pub fn is_passable(&self, face: FaceId) -> bool {
        self.node(face).is_land
    }

    /// Weight of the directed edge `from -> to`, or `None` if no such edge
    /// exists (destination impassable, or faces not adjacent).
    pub fn edge_cost(&self, from: FaceId, to: FaceId) -> Option<f64> {
        let from_node = self.node_of(from);
        let to_node = self.node_of(to);
        self.graph
            .edges_directed(from_node, petgraph::Direction::Outgoing)
            .find(|edge| edge.target() == to_node)
            .map(|edge| *edge.weight())
    }
}

/// Build the navigation graph from a terrain build's mesh, water, elevation
/// and river fields, using `movement` for edge weights.
pub fn build_nav_graph(terrain: &TerrainBuildOutput, movement: &MovementConfig) -> NavGraph {
    let face_count = terrain.mesh.face_count();
    let mut graph = DiGraph::with_capacity(face_count, face_count * 4);
    let mut face_to_node = Vec::with_capacity(face_count);

    for face in 0..face_count as FaceId {
        let node = graph.add_node(NavNode {
            face,
            centroid: terrain.mesh.centroid(face),
            is_land: terrain.water.is_land[face as usize],
            elevation: terrain.elevation[face as usize],
        });
        face_to_node.push(node);
    }

    let mut min_cost_per_unit_distance = f64::INFINITY;
    for face in 0..face_count as FaceId {
        let elev_from = terrain.elevation[face as usize];
        let from_centroid = terrain.mesh.centroid(face);
        for &neighbor in terrain.mesh.neighbors_of(face) {
            let elev_to = terrain.elevation[neighbor as usize];
            let is_land = terrain.water.is_land[neighbor as usize];
            let is_river = terrain.rivers.is_river_edge(face, neighbor);
            if let Some(cost) = step_cost(elev_from, elev_to, is_land, is_river, movement) {
                graph.add_edge(face_to_node[face as usize], face_to_node[neighbor as usize], cost);
                let to_centroid = terrain.mesh.centroid(neighbor);
                let distance = ((from_centroid.0 - to_centroid.0).powi(2) + (from_centroid.1 - to_centroid.1).powi(2)).sqrt();
                if distance > 1e-9 {
                    min_cost_per_unit_distance = min_cost_per_unit_distance.min(cost / distance);
                }
            }
        }
    }
    if !min_cost_per_unit_distance.is_finite() {
        min_cost_per_unit_distance = 0.0;
    }

    let mut land_face_ids: Vec<FaceId> = (0..face_count as FaceId)
        .filter(|&f| terrain.water.is_land[f as usize])
        .collect();
    land_face_ids.sort_unstable();

    log::debug!(
        "nav graph built: {} faces, {} land faces, {} edges",
        face_count,
        land_face_ids.len(),
        graph.edge_count()
    );

    NavGraph {
        graph,
        face_to_node,
        land_face_ids,
        min_cost_per_unit_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_terrain::coerce::RawControls;
    use atlas_terrain::controls::normalize_movement;

    #[test]
    fn land_face_ids_are_sorted_and_unique() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        let mut sorted = nav.land_face_ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, nav.land_face_ids);
    }

    #[test]
    fn ocean_faces_have_no_outgoing_edges_into_them() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        for face in 0..terrain.mesh.face_count() as FaceId {
            if !terrain.water.is_land[face as usize] {
                let node = nav.node_of(face);
                assert_eq!(nav.graph.edges_directed(node, petgraph::Direction::Incoming).count(), 0);
            }
        }
    }

    #[test]
    fn step_cost_rises_with_elevation_above_lowland() {
        let movement = normalize_movement(&RawControls::new());
        let low = step_cost(movement.lowland_threshold, movement.lowland_threshold, true, false, &movement).unwrap();
        let mid = (movement.lowland_threshold + movement.impassable_threshold) / 2.0;
        let higher = step_cost(movement.lowland_threshold, mid, true, false, &movement).unwrap();
        assert!(higher > low);
    }

    #[test]
    fn step_cost_is_none_at_or_above_impassable_threshold() {
        let movement = normalize_movement(&RawControls::new());
        assert!(step_cost(movement.lowland_threshold, movement.impassable_threshold, true, false, &movement).is_none());
    }

    #[test]
    fn river_faces_cost_more_than_equivalent_dry_faces() {
        let movement = normalize_movement(&RawControls::new());
        let dry = step_cost(movement.lowland_threshold, movement.lowland_threshold, true, false, &movement).unwrap();
        let river = step_cost(movement.lowland_threshold, movement.lowland_threshold, true, true, &movement).unwrap();
        assert!(river > dry || movement.river_penalty == 0.0);
    }

    #[test]
    fn descending_from_a_peak_back_to_lowland_is_not_penalized() {
        let movement = normalize_movement(&RawControls::new());
        let cost = step_cost(0.9, movement.lowland_threshold, true, false, &movement).unwrap();
        assert_eq!(cost, 1.0);
    }

    #[test]
    fn river_penalty_is_keyed_on_the_walked_edge_not_the_destination_face() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        for face in 0..terrain.mesh.face_count() as FaceId {
            if !nav.is_passable(face) {
                continue;
            }
            for &neighbor in terrain.mesh.neighbors_of(face) {
                if !nav.is_passable(neighbor) {
                    continue;
                }
                let cost = match nav.edge_cost(face, neighbor) {
                    Some(cost) => cost,
                    None => continue,
                };
                let expected = step_cost(
                    terrain.elevation[face as usize],
                    terrain.elevation[neighbor as usize],
                    true,
                    terrain.rivers.is_river_edge(face, neighbor),
                    &movement,
                )
                .unwrap();
                assert_eq!(cost, expected);
                if terrain.rivers.river_faces[neighbor as usize] && !terrain.rivers.is_river_edge(face, neighbor) {
                    // Destination sits on a river but this particular edge
                    // was never walked by a trace: no penalty applied.
                    let dry = step_cost(terrain.elevation[face as usize], terrain.elevation[neighbor as usize], true, false, &movement).unwrap();
                    assert_eq!(cost, dry);
                }
            }
        }
    }

    #[test]
    fn edge_cost_matches_the_built_edge_weight() {
        let terrain = atlas_terrain::build(&RawControls::new()).unwrap();
        let movement = normalize_movement(&RawControls::new());
        let nav = build_nav_graph(&terrain, &movement);
        if let Some(&face) = nav.land_face_ids.first() {
            for &neighbor in terrain.mesh.neighbors_of(face) {
                if nav.is_passable(neighbor) {
                    assert!(nav.edge_cost(face, neighbor).unwrap() > 0.0);
                }
            }
        }
    }
}
