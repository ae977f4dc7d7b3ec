//! Water classification: step 2 of the terrain pipeline.
//!
//! Produces `isLand`/`oceanWater` per face from a small deterministic
//! value-noise field. The specific noise function driving elevation is an
//! external collaborator this system treats as out of scope; this is the
//! minimal in-house fractal noise needed to classify land vs. ocean from
//! the `Water` sub-stream without pulling in a dedicated noise crate.
use crate::controls::Controls;
use crate::mesh::Mesh;
use atlas_rng::Seeded;
use atlas_rng::Step;
use atlas_rng::fnv1a32;

fn lattice_value(ix: i64, iy: i64, seed: u32) -> f64 {
    let mut bytes = Vec::with_capacity(12);
    bytes.extend_from_slice(&(ix as i32).to_le_bytes());
    bytes.extend_from_slice(&(iy as i32).to_le_bytes());
    bytes.extend_from_slice(&seed.to_le_bytes());
    (fnv1a32(&bytes) as f64) / (u32::MAX as f64)
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn value_noise(x: f64, y: f64, seed: u32) -> f64 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let tx = smoothstep(x - x0 as f64);
    let ty = smoothstep(y - y0 as f64);
    let v00 = lattice_value(x0, y0, seed);
    let v10 = lattice_value(x0 + 1, y0, seed);
    let v01 = lattice_value(x0, y0 + 1, seed);
    let v11 = lattice_value(x0 + 1, y0 + 1, seed);
    let a = v00 + (v10 - v00) * tx;
    let b = v01 + (v11 - v01) * tx;
    a + (b - a) * ty
}

/// Fractal sum of `value_noise` octaves, normalized to `[0, 1]`.
fn fbm(x: f64, y: f64, seed: u32, octaves: u32, frequency: f64) -> f64 {
    let mut amplitude = 1.0;
    let mut freq = frequency.max(0.001);
    let mut sum = 0.0;
    let mut norm = 0.0;
    for octave in 0..octaves.max(1) {
        sum += value_noise(x * freq, y * freq, seed.wrapping_add(octave)) * amplitude;
        norm += amplitude;
        amplitude *= 0.5;
        freq *= 2.0;
    }
    if norm > 0.0 { sum / norm } else { 0.0 }
}

/// Per-face classification output.
#[derive(Debug, Clone)]
pub struct WaterField {
    pub is_land: Vec<bool>,
    pub ocean_water: Vec<bool>,
}

/// Classify every face in `mesh` as land or ocean.
pub fn classify(mesh: &Mesh, map_width: u32, map_height: u32, controls: &Controls) -> WaterField {
    let mut rng = Seeded::from_seed_step(controls.seed, Step::Water);
    let noise_seed = rng.next_u32();

    let cx = map_width as f64 / 2.0;
    let cy = map_height as f64 / 2.0;
    let max_radius = (cx * cx + cy * cy).sqrt().max(1.0);

    let mut is_land = Vec::with_capacity(mesh.face_count());
    for &(x, y) in &mesh.centroids {
        let nx = x / map_width.max(1) as f64;
        let ny = y / map_height.max(1) as f64;
        let value = fbm(
            nx,
            ny,
            noise_seed,
            controls.water_noise_octaves,
            controls.water_noise_frequency,
        );
        let radial = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() / max_radius;
        let pushdown = radial.clamp(0.0, 1.0) * controls.ocean_falloff;
        is_land.push(value - pushdown > controls.water_level);
    }
    let ocean_water = is_land.iter().map(|land| !land).collect();
    WaterField { is_land, ocean_water }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawControls;
    use crate::controls::normalize;
    use crate::mesh::build_mesh;

    #[test]
    fn classification_is_deterministic() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        let a = classify(&mesh, 640, 480, &controls);
        let b = classify(&mesh, 640, 480, &controls);
        assert_eq!(a.is_land, b.is_land);
    }

    #[test]
    fn produces_some_land_and_some_ocean_at_defaults() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        let field = classify(&mesh, 640, 480, &controls);
        assert!(field.is_land.iter().any(|&l| l));
        assert!(field.is_land.iter().any(|&l| !l));
    }

    #[test]
    fn ocean_water_is_exactly_the_complement_of_is_land() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(320, 320, &controls);
        let field = classify(&mesh, 320, 320, &controls);
        for (land, ocean) in field.is_land.iter().zip(field.ocean_water.iter()) {
            assert_eq!(*land, !*ocean);
        }
    }
}
