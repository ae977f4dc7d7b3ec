//! Intermediate-point refinement.
//!
//! Walks every mesh edge whose endpoint elevations differ by more than
//! `controls.intermediate_threshold` and inserts a perturbed midpoint,
//! repeating for up to `controls.intermediate_max_iterations` rounds or
//! until a round inserts nothing. Two independent RNG sub-streams drive the
//! perturbation: `Refinement` (keyed on `intermediate_seed`, so client-side
//! detail choices don't depend on the base terrain seed) and
//! `RefinementFromGeneration` (keyed on the terrain seed, so the jitter
//! still tracks which generation it was computed against).
use atlas_rng::Seeded;
use atlas_rng::Step;
use atlas_terrain::Controls;
use atlas_terrain::TerrainBuildOutput;
use std::collections::HashSet;

/// A refinement point inserted between two mesh faces, with an elevation
/// interpolated and jittered from its parents.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediatePoint {
    pub position: (f64, f64),
    pub elevation: f64,
    pub parent_a: u32,
    pub parent_b: u32,
}

/// One traced river's render geometry: its marked faces' centroids, in
/// visitation order, expressed in refined coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverPolyline {
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default)]
pub struct RefinementOutput {
    pub points: Vec<IntermediatePoint>,
    pub rivers: Vec<RiverPolyline>,
}

/// Refine `base` per `controls.intermediate_*`. Pure function of its
/// inputs: the same base terrain and controls always produce the same
/// points, which is what lets the refinement cache key on a fingerprint
/// instead of rebuilding every time.
pub fn refine(base: &TerrainBuildOutput, controls: &Controls) -> RefinementOutput {
    let rivers = river_polylines(base);

    let mut points = Vec::new();
    if controls.intermediate_max_iterations == 0 {
        return RefinementOutput { points, rivers };
    }

    let mut rng_local = Seeded::from_seed_step(controls.intermediate_seed, Step::Refinement);
    let mut rng_generation =
        Seeded::from_seed_step(controls.seed, Step::RefinementFromGeneration);

    let mut seen_edges: HashSet<(u32, u32)> = HashSet::new();
    for iteration in 0..controls.intermediate_max_iterations {
        let mut inserted_this_round = 0u32;
        for face in 0..base.mesh.face_count() as u32 {
            for &neighbor in base.mesh.neighbors_of(face) {
                if neighbor <= face {
                    continue;
                }
                let edge = (face, neighbor);
                if seen_edges.contains(&edge) {
                    continue;
                }
                let elevation_a = base.elevation[face as usize];
                let elevation_b = base.elevation[neighbor as usize];
                let delta = (elevation_a - elevation_b).abs();
                if delta <= controls.intermediate_threshold {
                    continue;
                }

                let (xa, ya) = base.mesh.centroid(face);
                let (xb, yb) = base.mesh.centroid(neighbor);
                let midpoint = ((xa + xb) / 2.0, (ya + yb) / 2.0);
                let base_elevation = (elevation_a + elevation_b) / 2.0;

                let rel_jitter = (rng_local.next_f64() - 0.5) * 2.0 * controls.intermediate_rel_magnitude * delta;
                let abs_jitter = (rng_generation.next_f64() - 0.5) * 2.0 * controls.intermediate_abs_magnitude / 100.0;
                let elevation = (base_elevation + rel_jitter + abs_jitter).clamp(0.0, 1.0);

                points.push(IntermediatePoint {
                    position: midpoint,
                    elevation,
                    parent_a: face,
                    parent_b: neighbor,
                });
                seen_edges.insert(edge);
                inserted_this_round += 1;
            }
        }
        log::debug!("refinement iteration {iteration}: {inserted_this_round} points inserted");
        if inserted_this_round == 0 {
            break;
        }
    }

    RefinementOutput { points, rivers }
}

/// Group `base.rivers.river_faces` into per-trace polylines by walking
/// connected components of the mask over mesh adjacency. Traversal order
/// (lowest unvisited face id first, depth-first from there) is a pure
/// function of `base`, so two equal builds always produce identical
/// polylines in identical order.
fn river_polylines(base: &TerrainBuildOutput) -> Vec<RiverPolyline> {
    let mask = &base.rivers.river_faces;
    let mut visited = vec![false; mask.len()];
    let mut polylines = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        let mut order = Vec::new();
        let mut stack = vec![start as u32];
        visited[start] = true;
        while let Some(face) = stack.pop() {
            order.push(face);
            for &neighbor in base.mesh.neighbors_of(face) {
                if mask[neighbor as usize] && !visited[neighbor as usize] {
                    visited[neighbor as usize] = true;
                    stack.push(neighbor);
                }
            }
        }
        let points = order.iter().map(|&face| base.mesh.centroid(face)).collect();
        polylines.push(RiverPolyline { points });
    }

    polylines
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_terrain::coerce::RawControls;

    fn build(raw: &RawControls) -> TerrainBuildOutput {
        atlas_terrain::build(raw).expect("default controls must build")
    }

    #[test]
    fn refinement_is_deterministic() {
        let raw = RawControls::new();
        let base = build(&raw);
        let controls = atlas_terrain::controls::normalize(&raw);
        let a = refine(&base, &controls);
        let b = refine(&base, &controls);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn zero_max_iterations_inserts_no_points_but_still_traces_rivers() {
        let mut raw = RawControls::new();
        raw.insert("intermediateMaxIterations".into(), serde_json::json!(0));
        let base = build(&raw);
        let controls = atlas_terrain::controls::normalize(&raw);
        let refined = refine(&base, &controls);
        assert!(refined.points.is_empty());
        let expected_rivers = base.rivers.river_faces.iter().filter(|&&r| r).count() > 0;
        assert_eq!(!refined.rivers.is_empty(), expected_rivers);
    }

    #[test]
    fn river_polylines_are_deterministic_and_cover_every_marked_face() {
        let raw = RawControls::new();
        let base = build(&raw);
        let controls = atlas_terrain::controls::normalize(&raw);
        let a = refine(&base, &controls);
        let b = refine(&base, &controls);
        assert_eq!(a.rivers, b.rivers);

        let covered: usize = a.rivers.iter().map(|p| p.points.len()).sum();
        let marked = base.rivers.river_faces.iter().filter(|&&r| r).count();
        assert_eq!(covered, marked);
    }

    #[test]
    fn every_point_elevation_stays_in_unit_range() {
        let raw = RawControls::new();
        let base = build(&raw);
        let controls = atlas_terrain::controls::normalize(&raw);
        let refined = refine(&base, &controls);
        assert!(refined.points.iter().all(|p| (0.0..=1.0).contains(&p.elevation)));
    }

    #[test]
    fn differing_intermediate_seed_can_change_point_elevations() {
        let raw_a = RawControls::new();
        let mut raw_b = RawControls::new();
        raw_b.insert("intermediateSeed".into(), serde_json::json!(99));
        let base = build(&raw_a);
        let controls_a = atlas_terrain::controls::normalize(&raw_a);
        let controls_b = atlas_terrain::controls::normalize(&raw_b);
        let refined_a = refine(&base, &controls_a);
        let refined_b = refine(&base, &controls_b);
        assert_eq!(refined_a.points.len(), refined_b.points.len());
        if !refined_a.points.is_empty() {
            assert_ne!(refined_a.points, refined_b.points);
        }
    }
}
