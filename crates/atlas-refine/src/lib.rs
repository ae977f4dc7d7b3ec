//! Per-client terrain refinement and the single-slot refinement cache
//! each `Room` connection keeps in front of it.
pub mod cache;
pub mod refine;

pub use cache::RefinementCache;
pub use refine::{IntermediatePoint, RefinementOutput, RiverPolyline, refine};
