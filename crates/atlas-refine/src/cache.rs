//! Single-slot refinement cache.
//!
//! Keyed on `(generationFingerprint, refinementFingerprint)`. A hit on both
//! returns the cached pair untouched; a hit on generation alone reuses the
//! cached base terrain and recomputes only the refinement; anything else
//! rebuilds from scratch and evicts whatever was cached before it.
use std::rc::Rc;

use atlas_terrain::TerrainBuildError;
use atlas_terrain::TerrainBuildOutput;
use atlas_terrain::coerce::RawControls;
use atlas_terrain::controls::normalize;

use crate::refine::{RefinementOutput, refine};

struct CacheEntry {
    generation_fingerprint: String,
    refinement_fingerprint: String,
    base: Rc<TerrainBuildOutput>,
    refined: Rc<RefinementOutput>,
}

/// Per-client cache slot. One `Room` connection owns one of these.
///
/// `base`/`refined` are held behind `Rc` so a full cache hit returns the
/// same allocation it returned last time — a pointer clone, not a deep
/// copy of the mesh/elevation/refinement vectors — matching the "no
/// recomputation" law literally rather than just by equal fingerprints.
#[derive(Default)]
pub struct RefinementCache {
    slot: Option<CacheEntry>,
}

impl RefinementCache {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Drop the slot. The next `resolve()` call is guaranteed to be a full
    /// miss regardless of what fingerprints it's asked about.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Resolve a raw `terrain_publish` payload against the cache, returning
    /// the base terrain and its refinement. Rebuilds or partially rebuilds
    /// as the fingerprints dictate, covering all four cases: full hit,
    /// partial hit reusing the base, full miss, and independent
    /// invalidation of either fingerprint.
    pub fn resolve(
        &mut self,
        raw: &RawControls,
    ) -> Result<(Rc<TerrainBuildOutput>, Rc<RefinementOutput>), TerrainBuildError> {
        let controls = normalize(raw);
        let generation_fingerprint = atlas_terrain::generation_fingerprint(&controls);
        let refinement_fingerprint = atlas_terrain::refinement_fingerprint(&controls);

        if let Some(entry) = &self.slot {
            if entry.generation_fingerprint == generation_fingerprint {
                if entry.refinement_fingerprint == refinement_fingerprint {
                    log::debug!("refinement cache hit: generation and refinement both match");
                    return Ok((Rc::clone(&entry.base), Rc::clone(&entry.refined)));
                }
                log::debug!("refinement cache partial hit: reusing base terrain, recomputing refinement");
                let base = Rc::clone(&entry.base);
                let refined = Rc::new(refine(&base, &controls));
                self.slot = Some(CacheEntry {
                    generation_fingerprint,
                    refinement_fingerprint,
                    base: Rc::clone(&base),
                    refined: Rc::clone(&refined),
                });
                return Ok((base, refined));
            }
        }

        log::debug!("refinement cache miss: rebuilding base terrain");
        let base = Rc::new(atlas_terrain::build(raw)?);
        let refined = Rc::new(refine(&base, &controls));
        self.slot = Some(CacheEntry {
            generation_fingerprint,
            refinement_fingerprint,
            base: Rc::clone(&base),
            refined: Rc::clone(&refined),
        });
        Ok((base, refined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_payloads_hit_the_cache_without_changing_the_slot() {
        let mut cache = RefinementCache::new();
        let mut raw = RawControls::new();
        raw.insert("seed".into(), json!(9001));
        let (base_a, refined_a) = cache.resolve(&raw).unwrap();
        let (base_b, refined_b) = cache.resolve(&raw).unwrap();
        // A full hit returns the exact same allocation, not an equal copy.
        assert!(Rc::ptr_eq(&base_a, &base_b));
        assert!(Rc::ptr_eq(&refined_a, &refined_b));
    }

    #[test]
    fn clear_drops_the_slot_so_the_next_resolve_is_a_full_miss() {
        let mut cache = RefinementCache::new();
        let mut raw = RawControls::new();
        raw.insert("seed".into(), json!(7));
        let (base_a, refined_a) = cache.resolve(&raw).unwrap();
        assert!(cache.slot.is_some());

        cache.clear();
        assert!(cache.slot.is_none());

        let (base_b, refined_b) = cache.resolve(&raw).unwrap();
        assert!(!Rc::ptr_eq(&base_a, &base_b));
        assert!(!Rc::ptr_eq(&refined_a, &refined_b));
    }

    #[test]
    fn toggling_a_rendering_control_leaves_the_cached_result_identical() {
        let mut cache = RefinementCache::new();
        let mut raw_a = RawControls::new();
        raw_a.insert("seed".into(), json!(42));
        let (base_a, refined_a) = cache.resolve(&raw_a).unwrap();

        let mut raw_b = raw_a.clone();
        raw_b.insert("showDualGraph".into(), json!(true));
        raw_b.insert("provinceBorderWidth".into(), json!(9.0));
        let (base_b, refined_b) = cache.resolve(&raw_b).unwrap();

        assert!(Rc::ptr_eq(&base_a, &base_b));
        assert!(Rc::ptr_eq(&refined_a, &refined_b));
    }

    #[test]
    fn incrementing_max_iterations_produces_a_distinct_refinement_object() {
        let mut cache = RefinementCache::new();
        let mut raw_a = RawControls::new();
        raw_a.insert("seed".into(), json!(1338));
        let (base_a, refined_a) = cache.resolve(&raw_a).unwrap();

        let mut raw_b = raw_a.clone();
        raw_b.insert("intermediateMaxIterations".into(), json!(4));
        let (base_b, refined_b) = cache.resolve(&raw_b).unwrap();

        assert!(Rc::ptr_eq(&base_a, &base_b), "same generation fingerprint must reuse the base");
        assert!(!Rc::ptr_eq(&refined_a, &refined_b));
    }

    #[test]
    fn two_different_generation_seeds_produce_different_cache_outputs() {
        let mut cache = RefinementCache::new();
        let mut raw_a = RawControls::new();
        raw_a.insert("seed".into(), json!(1));
        let (base_a, _) = cache.resolve(&raw_a).unwrap();

        let mut raw_b = RawControls::new();
        raw_b.insert("seed".into(), json!(2));
        let (base_b, _) = cache.resolve(&raw_b).unwrap();

        assert_ne!(base_a.generation_fingerprint, base_b.generation_fingerprint);
        assert!(!Rc::ptr_eq(&base_a, &base_b));
    }

    #[test]
    fn the_cache_holds_exactly_one_slot() {
        let mut cache = RefinementCache::new();
        let raw_a = RawControls::new();
        let mut raw_b = RawControls::new();
        raw_b.insert("seed".into(), json!(123));
        cache.resolve(&raw_a).unwrap();
        let (base_b, _) = cache.resolve(&raw_b).unwrap();
        // Re-resolving raw_a after raw_b evicted it must rebuild, not hit —
        // proven indirectly: the slot now reflects raw_b's fingerprint.
        assert_eq!(
            cache.slot.as_ref().unwrap().generation_fingerprint,
            base_b.generation_fingerprint
        );
    }
}
