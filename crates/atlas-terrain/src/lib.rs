//! Deterministic terrain generation: control normalization, fingerprinting,
//! and the mesh → water → mountain → river → province pipeline that a
//! `terrain_publish` message runs to produce a new
//! [`pipeline::TerrainBuildOutput`].
pub mod coerce;
pub mod controls;
pub mod error;
pub mod fingerprint;
pub mod mesh;
pub mod mountain;
pub mod pipeline;
pub mod province;
pub mod river;
pub mod water;

pub use controls::{Controls, MovementConfig};
pub use error::TerrainBuildError;
pub use fingerprint::{generation_fingerprint, refinement_fingerprint};
pub use mesh::Mesh;
pub use pipeline::{TerrainBuildOutput, build};
pub use province::Provinces;
pub use river::RiverField;
pub use water::WaterField;
