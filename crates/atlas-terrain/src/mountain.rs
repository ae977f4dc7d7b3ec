//! Mountain elevation: step 3 of the terrain pipeline.
//!
//! Mutates the face elevation array in place conceptually — here it
//! returns a fresh `Vec<f64>` seeded from the baseline water
//! classification, since every pipeline step is a pure function of its
//! inputs with no hidden state.
use crate::controls::Controls;
use crate::mesh::Mesh;
use crate::water::WaterField;
use atlas_rng::Seeded;
use atlas_rng::Step;

const OCEAN_ELEVATION: f64 = 0.0;
const LAND_BASELINE_ELEVATION: f64 = 0.1;

/// Derive every face's elevation in `[0, 1]` from the water classification
/// plus `controls.mountain_count` radial peaks.
pub fn elevate(mesh: &Mesh, water: &WaterField, map_width: u32, map_height: u32, controls: &Controls) -> Vec<f64> {
    let mut elevation: Vec<f64> = water
        .is_land
        .iter()
        .map(|&land| if land { LAND_BASELINE_ELEVATION } else { OCEAN_ELEVATION })
        .collect();

    let land_faces: Vec<usize> = water
        .is_land
        .iter()
        .enumerate()
        .filter(|(_, &land)| land)
        .map(|(i, _)| i)
        .collect();
    if land_faces.is_empty() || controls.mountain_count == 0 {
        return elevation;
    }

    let mut rng = Seeded::from_seed_step(controls.seed, Step::Mountain);
    let map_diag = ((map_width as f64).powi(2) + (map_height as f64).powi(2)).sqrt();
    let radius = (controls.mountain_radius_frac * map_diag).max(1.0);
    let plateau_cut = controls.mountain_peak_elevation * (1.0 - controls.plateau_flatten);

    for _ in 0..controls.mountain_count {
        let peak_face = land_faces[rng.next_below(land_faces.len() as u32) as usize];
        let jitter = 1.0 - controls.ridge_jitter * rng.next_f64() * 0.5;
        let peak_elevation = (controls.mountain_peak_elevation * jitter).clamp(0.0, 1.0);
        let (px, py) = mesh.centroid(peak_face as u32);

        for (i, &(x, y)) in mesh.centroids.iter().enumerate() {
            if !water.is_land[i] {
                continue;
            }
            let dist = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            if dist > radius {
                continue;
            }
            let falloff = (1.0 - dist / radius).max(0.0).powf(controls.mountain_falloff);
            let mut contribution = peak_elevation * falloff;
            if contribution > plateau_cut {
                // Pull plateau-top contributions towards the peak value so
                // summit faces read as a flattened cap rather than a cone tip.
                let excess = (contribution - plateau_cut) * controls.plateau_flatten;
                contribution = plateau_cut + excess;
            }
            elevation[i] = elevation[i].max(contribution);
        }
    }

    for e in &mut elevation {
        *e = e.clamp(0.0, 1.0);
    }
    elevation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawControls;
    use crate::controls::normalize;
    use crate::mesh::build_mesh;
    use crate::water::classify;

    #[test]
    fn elevation_is_deterministic() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        let water = classify(&mesh, 640, 480, &controls);
        let a = elevate(&mesh, &water, 640, 480, &controls);
        let b = elevate(&mesh, &water, 640, 480, &controls);
        assert_eq!(a, b);
    }

    #[test]
    fn ocean_faces_stay_at_zero_elevation() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        let water = classify(&mesh, 640, 480, &controls);
        let elevation = elevate(&mesh, &water, 640, 480, &controls);
        for (i, &land) in water.is_land.iter().enumerate() {
            if !land {
                assert_eq!(elevation[i], OCEAN_ELEVATION);
            }
        }
    }

    #[test]
    fn zero_mountain_count_leaves_land_at_baseline() {
        let mut raw = RawControls::new();
        raw.insert("mountainCount".into(), serde_json::json!(0));
        let controls = normalize(&raw);
        let mesh = build_mesh(640, 480, &controls);
        let water = classify(&mesh, 640, 480, &controls);
        let elevation = elevate(&mesh, &water, 640, 480, &controls);
        for (i, &land) in water.is_land.iter().enumerate() {
            if land {
                assert_eq!(elevation[i], LAND_BASELINE_ELEVATION);
            }
        }
    }

    #[test]
    fn elevation_is_always_in_unit_range() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        let water = classify(&mesh, 640, 480, &controls);
        let elevation = elevate(&mesh, &water, 640, 480, &controls);
        assert!(elevation.iter().all(|e| (0.0..=1.0).contains(e)));
    }
}
