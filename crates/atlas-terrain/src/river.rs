//! River tracing: step 4 of the terrain pipeline.
//!
//! Each river is a steepest-descent walk from a high-elevation land face to
//! the ocean, seeded from the `River` sub-stream. `controls.river_meander`
//! occasionally trades the steepest neighbor for the second-steepest one so
//! paths aren't perfectly straight.
use std::collections::HashSet;

use crate::controls::Controls;
use crate::mesh::Mesh;
use crate::water::WaterField;
use atlas_core::FaceId;
use atlas_rng::Seeded;
use atlas_rng::Step;

const MAX_RIVER_LENGTH: usize = 512;

#[derive(Debug, Clone)]
pub struct RiverField {
    pub river_faces: Vec<bool>,
    /// Every `(from, to)` transition a traced river actually walked, stored
    /// in both directions. A face can carry water (appear in
    /// `river_faces`) while a given edge out of it never carried any —
    /// only the transitions a walk took belong here, which is what the
    /// movement cost formula keys on.
    pub river_edges: HashSet<(FaceId, FaceId)>,
}

impl RiverField {
    pub fn is_river_edge(&self, from: FaceId, to: FaceId) -> bool {
        self.river_edges.contains(&(from, to))
    }
}

/// Trace `controls.river_count` rivers from land faces at or above
/// `controls.river_min_elevation` down to the ocean.
pub fn trace_rivers(mesh: &Mesh, water: &WaterField, elevation: &[f64], controls: &Controls) -> RiverField {
    let mut river_faces = vec![false; mesh.face_count()];
    let mut river_edges = HashSet::new();
    if controls.river_count == 0 {
        return RiverField { river_faces, river_edges };
    }

    let sources: Vec<usize> = water
        .is_land
        .iter()
        .enumerate()
        .filter(|(i, &land)| land && elevation[*i] >= controls.river_min_elevation)
        .map(|(i, _)| i)
        .collect();
    if sources.is_empty() {
        return RiverField { river_faces, river_edges };
    }

    let mut rng = Seeded::from_seed_step(controls.seed, Step::River);
    for _ in 0..controls.river_count {
        let mut face = sources[rng.next_below(sources.len() as u32) as usize];
        river_faces[face] = true;
        let mut visited = vec![false; mesh.face_count()];
        visited[face] = true;

        for _ in 0..MAX_RIVER_LENGTH {
            if !water.is_land[face] {
                break;
            }
            let mut downhill: Vec<usize> = mesh
                .neighbors_of(face as atlas_core::FaceId)
                .iter()
                .map(|&n| n as usize)
                .filter(|&n| !visited[n] && elevation[n] <= elevation[face])
                .collect();
            if downhill.is_empty() {
                break;
            }
            downhill.sort_by(|&a, &b| elevation[a].partial_cmp(&elevation[b]).unwrap());
            let next = if downhill.len() > 1 && rng.next_f64() < controls.river_meander {
                downhill[1]
            } else {
                downhill[0]
            };
            let (from, to) = (face as FaceId, next as FaceId);
            river_edges.insert((from, to));
            river_edges.insert((to, from));
            face = next;
            visited[face] = true;
            river_faces[face] = true;
        }
    }

    RiverField { river_faces, river_edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawControls;
    use crate::controls::normalize;
    use crate::mesh::build_mesh;
    use crate::mountain::elevate;
    use crate::water::classify;

    fn build(raw: &RawControls) -> (Mesh, WaterField, Vec<f64>, Controls) {
        let controls = normalize(raw);
        let mesh = build_mesh(640, 480, &controls);
        let water = classify(&mesh, 640, 480, &controls);
        let elevation = elevate(&mesh, &water, 640, 480, &controls);
        (mesh, water, elevation, controls)
    }

    #[test]
    fn tracing_is_deterministic() {
        let (mesh, water, elevation, controls) = build(&RawControls::new());
        let a = trace_rivers(&mesh, &water, &elevation, &controls);
        let b = trace_rivers(&mesh, &water, &elevation, &controls);
        assert_eq!(a.river_faces, b.river_faces);
    }

    #[test]
    fn zero_river_count_marks_nothing() {
        let mut raw = RawControls::new();
        raw.insert("riverCount".into(), serde_json::json!(0));
        let (mesh, water, elevation, controls) = build(&raw);
        let rivers = trace_rivers(&mesh, &water, &elevation, &controls);
        assert!(rivers.river_faces.iter().all(|&r| !r));
    }

    #[test]
    fn river_faces_are_a_subset_of_land() {
        let (mesh, water, elevation, controls) = build(&RawControls::new());
        let rivers = trace_rivers(&mesh, &water, &elevation, &controls);
        for (i, &is_river) in rivers.river_faces.iter().enumerate() {
            if !is_river || water.is_land[i] {
                continue;
            }
            // A river's final step may spill onto the ocean face it
            // terminates at, but that ocean face must have been reached
            // from a marked land neighbor, never appear in isolation.
            let has_marked_land_neighbor = mesh
                .neighbors_of(i as atlas_core::FaceId)
                .iter()
                .any(|&n| rivers.river_faces[n as usize] && water.is_land[n as usize]);
            assert!(has_marked_land_neighbor, "ocean river face {i} has no marked land neighbor");
        }
    }

    #[test]
    fn river_edges_are_symmetric_and_only_connect_marked_faces() {
        let (mesh, water, elevation, controls) = build(&RawControls::new());
        let rivers = trace_rivers(&mesh, &water, &elevation, &controls);
        for &(from, to) in &rivers.river_edges {
            assert!(rivers.is_river_edge(to, from), "edge {from}->{to} has no reverse entry");
            assert!(rivers.river_faces[from as usize]);
            assert!(rivers.river_faces[to as usize]);
        }
    }

    #[test]
    fn river_edge_count_never_exceeds_the_number_of_walked_transitions() {
        // Every edge comes from a single walked (from, next) step, stored
        // in both directions, so the set can't grow past twice the number
        // of faces actually marked by a trace.
        let (mesh, water, elevation, controls) = build(&RawControls::new());
        let rivers = trace_rivers(&mesh, &water, &elevation, &controls);
        let marked = rivers.river_faces.iter().filter(|&&r| r).count();
        assert!(rivers.river_edges.len() <= marked * 2);
    }
}
