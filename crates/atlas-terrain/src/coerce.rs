//! Raw-value coercion rules shared by every field in [`crate::controls`].
//!
//! Missing or non-finite values fall back to a default; booleans coerce
//! via truthiness only when the value is already a JSON boolean, otherwise
//! they fall back too. We take the raw client payload as an untyped JSON
//! object precisely so a client sending the wrong JSON type for a field
//! degrades to that field's default instead of failing the whole
//! `terrain_publish`.
use serde_json::Map;
use serde_json::Value;

/// A partial, untyped control payload as received from a client.
pub type RawControls = Map<String, Value>;

/// Coerce a numeric field: present + finite number -> clamped value,
/// anything else (missing, string, bool, non-finite) -> `default`.
pub fn number(raw: &RawControls, key: &str, default: f64, min: f64, max: f64) -> f64 {
    let value = raw
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default);
    value.clamp(min, max)
}

/// Coerce an integer-valued field with half-to-even rounding before
/// clamping.
pub fn integer(raw: &RawControls, key: &str, default: u32, min: u32, max: u32) -> u32 {
    let value = raw
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .map(|v| v.round_ties_even())
        .unwrap_or(default as f64);
    value.clamp(min as f64, max as f64) as u32
}

/// Coerce a boolean field: present and a JSON bool -> its truthiness,
/// anything else -> `default`. Numbers/strings never coerce to bool.
pub fn boolean(raw: &RawControls, key: &str, default: bool) -> bool {
    match raw.get(key) {
        Some(Value::Bool(b)) => *b,
        _ => default,
    }
}
