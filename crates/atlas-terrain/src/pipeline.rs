//! Pipeline orchestration: runs the fixed build order mesh → water →
//! mountain → river → province and assembles the result a
//! `terrain_publish` turns into a broadcast snapshot.
use crate::coerce::RawControls;
use crate::controls::{Controls, MovementConfig, normalize, normalize_dimensions, normalize_movement};
use crate::error::TerrainBuildError;
use crate::fingerprint::{generation_fingerprint, refinement_fingerprint};
use crate::mesh::{Mesh, build_mesh};
use crate::mountain::elevate;
use crate::province::{Provinces, assign_provinces};
use crate::river::{RiverField, trace_rivers};
use crate::water::{WaterField, classify};

#[derive(Debug, Clone)]
pub struct TerrainBuildOutput {
    pub controls: Controls,
    pub movement: MovementConfig,
    pub map_width: u32,
    pub map_height: u32,
    pub mesh: Mesh,
    pub water: WaterField,
    pub elevation: Vec<f64>,
    pub rivers: RiverField,
    pub provinces: Provinces,
    pub generation_fingerprint: String,
    pub refinement_fingerprint: String,
}

/// Run the full deterministic pipeline over a raw, partial control payload.
pub fn build(raw: &RawControls) -> Result<TerrainBuildOutput, TerrainBuildError> {
    let controls = normalize(raw);
    let movement = normalize_movement(raw);
    let (map_width, map_height) = normalize_dimensions(raw);

    let mesh = build_mesh(map_width, map_height, &controls);
    if mesh.face_count() == 0 {
        log::warn!("terrain build produced a degenerate mesh for seed {}", controls.seed);
        return Err(TerrainBuildError::DegenerateMesh);
    }
    log::debug!(
        "terrain build: seed={} faces={} provinces={}",
        controls.seed,
        mesh.face_count(),
        controls.province_count
    );

    let water = classify(&mesh, map_width, map_height, &controls);
    let elevation = elevate(&mesh, &water, map_width, map_height, &controls);
    let rivers = trace_rivers(&mesh, &water, &elevation, &controls);
    let provinces = assign_provinces(&mesh, &controls);

    let generation = generation_fingerprint(&controls);
    let refinement = refinement_fingerprint(&controls);

    Ok(TerrainBuildOutput {
        controls,
        movement,
        map_width,
        map_height,
        mesh,
        water,
        elevation,
        rivers,
        provinces,
        generation_fingerprint: generation,
        refinement_fingerprint: refinement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_builds_successfully() {
        let output = build(&RawControls::new()).expect("default controls must build");
        assert_eq!(output.elevation.len(), output.mesh.face_count());
        assert_eq!(output.rivers.river_faces.len(), output.mesh.face_count());
        assert_eq!(output.provinces.province_of.len(), output.mesh.face_count());
    }

    #[test]
    fn equal_payloads_build_bitwise_equal_fingerprints() {
        let a = build(&RawControls::new()).unwrap();
        let b = build(&RawControls::new()).unwrap();
        assert_eq!(a.generation_fingerprint, b.generation_fingerprint);
        assert_eq!(a.refinement_fingerprint, b.refinement_fingerprint);
        assert_eq!(a.elevation, b.elevation);
    }

    #[test]
    fn changing_seed_changes_generation_fingerprint() {
        let mut raw = RawControls::new();
        raw.insert("seed".into(), serde_json::json!(42));
        let a = build(&RawControls::new()).unwrap();
        let b = build(&raw).unwrap();
        assert_ne!(a.generation_fingerprint, b.generation_fingerprint);
    }
}
