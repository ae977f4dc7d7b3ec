//! Control normalization: clamps/coerces a raw, partial client payload
//! into a fully populated [`Controls`] + [`MovementConfig`] pair, and
//! derives the generation/refinement fingerprints from the result.
use crate::coerce::RawControls;
use crate::coerce::{boolean, integer, number};
use serde::Deserialize;
use serde::Serialize;

/// Fully normalized, clamped terrain controls. Every field affects
/// mesh/water/mountain/river/province generation and is included in the
/// generation fingerprint, *except* the five `intermediate_*` fields
/// (refinement-only, §4.D) and the rendering toggles at the bottom of the
/// struct (excluded from both fingerprints).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub seed: u32,

    pub mesh_spacing: f64,

    pub water_level: f64,
    pub water_noise_octaves: u32,
    pub water_noise_frequency: f64,
    pub ocean_falloff: f64,

    pub mountain_count: u32,
    pub mountain_peak_elevation: f64,
    pub mountain_falloff: f64,
    pub mountain_radius_frac: f64,
    pub ridge_jitter: f64,
    pub plateau_flatten: f64,

    pub river_count: u32,
    pub river_min_elevation: f64,
    pub river_meander: f64,

    pub province_count: u32,
    pub province_relax_iterations: u32,

    // Refinement-only fields (exactly the refinement fingerprint subset).
    pub intermediate_seed: u32,
    pub intermediate_max_iterations: u32,
    pub intermediate_threshold: f64,
    pub intermediate_rel_magnitude: f64,
    pub intermediate_abs_magnitude: f64,

    // Rendering toggles: excluded from both fingerprints.
    pub show_dual_graph: bool,
    pub show_overlay: bool,
    pub province_border_width: f64,
    pub camera_fov: f64,
}

/// Movement tuning, published alongside `controls` but never fingerprinted
/// — it governs navigation-graph cost, not generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementConfig {
    pub time_per_face_seconds: f64,
    pub lowland_threshold: f64,
    pub impassable_threshold: f64,
    pub elevation_power: f64,
    pub elevation_gain_k: f64,
    pub river_penalty: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        normalize_movement(&RawControls::new())
    }
}

/// Normalize a raw, partial control payload into [`Controls`].
pub fn normalize(raw: &RawControls) -> Controls {
    Controls {
        seed: integer(raw, "seed", 1, 0, u32::MAX),

        mesh_spacing: number(raw, "meshSpacing", 16.0, 4.0, 64.0),

        water_level: number(raw, "waterLevel", 0.45, 0.0, 1.0),
        water_noise_octaves: integer(raw, "waterNoiseOctaves", 4, 1, 6),
        water_noise_frequency: number(raw, "waterNoiseFrequency", 2.0, 0.5, 8.0),
        ocean_falloff: number(raw, "oceanFalloff", 0.15, 0.0, 1.0),

        mountain_count: integer(raw, "mountainCount", 6, 0, 24),
        mountain_peak_elevation: number(raw, "mountainPeakElevation", 0.9, 0.2, 1.0),
        mountain_falloff: number(raw, "mountainFalloff", 2.2, 0.1, 5.0),
        mountain_radius_frac: number(raw, "mountainRadiusFrac", 0.12, 0.01, 1.0),
        ridge_jitter: number(raw, "ridgeJitter", 0.3, 0.0, 1.0),
        plateau_flatten: number(raw, "plateauFlatten", 0.2, 0.0, 1.0),

        river_count: integer(raw, "riverCount", 10, 0, 40),
        river_min_elevation: number(raw, "riverMinElevation", 0.35, 0.0, 1.0),
        river_meander: number(raw, "riverMeander", 0.4, 0.0, 1.0),

        province_count: integer(raw, "provinceCount", 12, 1, 64),
        province_relax_iterations: integer(raw, "provinceRelaxIterations", 2, 0, 8),

        intermediate_seed: integer(raw, "intermediateSeed", 1, 0, u32::MAX),
        intermediate_max_iterations: integer(raw, "intermediateMaxIterations", 3, 0, 8),
        intermediate_threshold: number(raw, "intermediateThreshold", 0.02, 0.0, 1.0),
        intermediate_rel_magnitude: number(raw, "intermediateRelMagnitude", 0.5, 0.0, 2.0),
        intermediate_abs_magnitude: number(raw, "intermediateAbsMagnitude", 4.0, 0.0, 64.0),

        show_dual_graph: boolean(raw, "showDualGraph", false),
        show_overlay: boolean(raw, "showOverlay", false),
        province_border_width: number(raw, "provinceBorderWidth", 2.0, 0.0, 16.0),
        camera_fov: number(raw, "cameraFov", 60.0, 10.0, 120.0),
    }
}

/// Normalize the movement sub-record. The navigation graph requires
/// `lowlandThreshold < impassableThreshold`; when a client payload would
/// violate it we pull `lowlandThreshold` down just below
/// `impassableThreshold` rather than reject the whole publish.
pub fn normalize_movement(raw: &RawControls) -> MovementConfig {
    let impassable_threshold = number(raw, "impassableThreshold", 0.85, 0.05, 1.0);
    let mut lowland_threshold = number(raw, "lowlandThreshold", 0.5, 0.0, 1.0);
    if lowland_threshold >= impassable_threshold {
        lowland_threshold = (impassable_threshold - 0.01).max(0.0);
    }
    MovementConfig {
        time_per_face_seconds: number(raw, "timePerFaceSeconds", 0.6, 0.05, 10.0),
        lowland_threshold,
        impassable_threshold,
        elevation_power: number(raw, "elevationPower", 1.5, 0.1, 4.0),
        elevation_gain_k: number(raw, "elevationGainK", 2.0, 0.0, 10.0),
        river_penalty: number(raw, "riverPenalty", 1.0, 0.0, 5.0),
    }
}

/// Integer map dimensions, clamped to `[256, 4096]`.
pub fn normalize_dimensions(raw: &RawControls) -> (u32, u32) {
    (
        integer(raw, "mapWidth", atlas_core::DEFAULT_MAP_WIDTH, atlas_core::MAP_DIMENSION_MIN, atlas_core::MAP_DIMENSION_MAX),
        integer(raw, "mapHeight", atlas_core::DEFAULT_MAP_HEIGHT, atlas_core::MAP_DIMENSION_MIN, atlas_core::MAP_DIMENSION_MAX),
    )
}
