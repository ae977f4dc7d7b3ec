//! Stable fingerprints over [`Controls`].
//!
//! Both fingerprints are canonical strings built from a fixed field order
//! and bit-exact float formatting (`to_bits()` in hex, not decimal), so two
//! fingerprints compare equal iff every included field is bitwise-equal —
//! never "close enough".
use crate::controls::Controls;

fn push_f64(out: &mut String, name: &str, value: f64) {
    out.push_str(name);
    out.push('=');
    out.push_str(&format!("{:016x}", value.to_bits()));
    out.push(';');
}

fn push_u32(out: &mut String, name: &str, value: u32) {
    out.push_str(name);
    out.push('=');
    out.push_str(&value.to_string());
    out.push(';');
}

fn push_bool(out: &mut String, name: &str, value: bool) {
    out.push_str(name);
    out.push('=');
    out.push(if value { '1' } else { '0' });
    out.push(';');
}

/// Canonical string over every generation-affecting field. Excludes the
/// five `intermediate_*` refinement fields and the rendering toggles.
pub fn generation_fingerprint(c: &Controls) -> String {
    let mut out = String::new();
    push_u32(&mut out, "seed", c.seed);
    push_f64(&mut out, "mesh_spacing", c.mesh_spacing);
    push_f64(&mut out, "water_level", c.water_level);
    push_u32(&mut out, "water_noise_octaves", c.water_noise_octaves);
    push_f64(&mut out, "water_noise_frequency", c.water_noise_frequency);
    push_f64(&mut out, "ocean_falloff", c.ocean_falloff);
    push_u32(&mut out, "mountain_count", c.mountain_count);
    push_f64(&mut out, "mountain_peak_elevation", c.mountain_peak_elevation);
    push_f64(&mut out, "mountain_falloff", c.mountain_falloff);
    push_f64(&mut out, "mountain_radius_frac", c.mountain_radius_frac);
    push_f64(&mut out, "ridge_jitter", c.ridge_jitter);
    push_f64(&mut out, "plateau_flatten", c.plateau_flatten);
    push_u32(&mut out, "river_count", c.river_count);
    push_f64(&mut out, "river_min_elevation", c.river_min_elevation);
    push_f64(&mut out, "river_meander", c.river_meander);
    push_u32(&mut out, "province_count", c.province_count);
    push_u32(&mut out, "province_relax_iterations", c.province_relax_iterations);
    out
}

/// Canonical string over exactly the five refinement-subset fields.
pub fn refinement_fingerprint(c: &Controls) -> String {
    let mut out = String::new();
    push_u32(&mut out, "intermediate_seed", c.intermediate_seed);
    push_u32(
        &mut out,
        "intermediate_max_iterations",
        c.intermediate_max_iterations,
    );
    push_f64(&mut out, "intermediate_threshold", c.intermediate_threshold);
    push_f64(
        &mut out,
        "intermediate_rel_magnitude",
        c.intermediate_rel_magnitude,
    );
    push_f64(
        &mut out,
        "intermediate_abs_magnitude",
        c.intermediate_abs_magnitude,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::RawControls;
    use crate::controls::normalize;
    use serde_json::json;

    #[test]
    fn equal_controls_fingerprint_equal() {
        let raw = RawControls::new();
        let a = normalize(&raw);
        let b = normalize(&raw);
        assert_eq!(generation_fingerprint(&a), generation_fingerprint(&b));
        assert_eq!(refinement_fingerprint(&a), refinement_fingerprint(&b));
    }

    #[test]
    fn rendering_toggles_do_not_affect_either_fingerprint() {
        let raw_a = RawControls::new();
        let mut raw_b = RawControls::new();
        raw_b.insert("showDualGraph".into(), json!(true));
        raw_b.insert("provinceBorderWidth".into(), json!(9.0));
        raw_b.insert("cameraFov".into(), json!(100.0));
        let a = normalize(&raw_a);
        let b = normalize(&raw_b);
        assert_eq!(generation_fingerprint(&a), generation_fingerprint(&b));
        assert_eq!(refinement_fingerprint(&a), refinement_fingerprint(&b));
    }

    #[test]
    fn generation_field_change_changes_generation_fingerprint_only() {
        let raw_a = RawControls::new();
        let mut raw_b = RawControls::new();
        raw_b.insert("seed".into(), json!(2));
        let a = normalize(&raw_a);
        let b = normalize(&raw_b);
        assert_ne!(generation_fingerprint(&a), generation_fingerprint(&b));
        assert_eq!(refinement_fingerprint(&a), refinement_fingerprint(&b));
    }

    #[test]
    fn refinement_field_change_changes_refinement_fingerprint_only() {
        let raw_a = RawControls::new();
        let mut raw_b = RawControls::new();
        raw_b.insert("intermediateMaxIterations".into(), json!(5));
        let a = normalize(&raw_a);
        let b = normalize(&raw_b);
        assert_eq!(generation_fingerprint(&a), generation_fingerprint(&b));
        assert_ne!(refinement_fingerprint(&a), refinement_fingerprint(&b));
    }
}
