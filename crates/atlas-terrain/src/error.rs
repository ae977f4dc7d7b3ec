//! Terrain build failures: a closed, typed enum rather than a panic or a
//! bare string, so the room layer can map a failure directly onto a
//! `terrain_publish_invalid` wire reason.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerrainBuildError {
    /// `mapWidth`/`mapHeight` fell outside `[MAP_DIMENSION_MIN, MAP_DIMENSION_MAX]`
    /// even after clamping — only reachable if a caller bypasses
    /// `normalize_dimensions`.
    InvalidDimensions { width: u32, height: u32 },
    /// The lattice mesh produced zero faces; nothing downstream can run.
    DegenerateMesh,
}

impl fmt::Display for TerrainBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainBuildError::InvalidDimensions { width, height } => {
                write!(f, "invalid map dimensions {width}x{height}")
            }
            TerrainBuildError::DegenerateMesh => write!(f, "mesh produced zero faces"),
        }
    }
}

impl std::error::Error for TerrainBuildError {}
