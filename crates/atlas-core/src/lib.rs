//! Shared identity types, type aliases, and runtime utilities for the
//! authoritative terrain-world room server.
//!
//! Every other crate in the workspace depends on this one for `ID<T>`, a
//! handful of dimensional type aliases, and the wire-level numeric
//! constants. Nothing here is domain logic.
#![allow(dead_code)]

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// A face of the dual mesh; the unit of actor position and movement.
pub type FaceId = u32;
/// Server wall-clock, milliseconds since the room's process started an
/// arbitrary but monotonically increasing epoch (callers only ever compare
/// two `ServerMillis`, never interpret one in isolation).
pub type ServerMillis = i64;
/// Monotonic per-terrain version counter (starts at 1 on first publish).
pub type TerrainVersion = u32;
/// Monotonic per-actor observable-revision counter.
pub type StateSeq = u64;
/// Monotonic per-room broadcast counter.
pub type SnapshotSeq = u64;
/// Monotonic per-actor command counter, strictly increasing across accepted
/// commands from that actor's owner.
pub type CommandId = u64;
/// 16-bit fixed point fraction in `[0, 65535]` representing `[0, 1]`.
pub type Q16 = u16;

// ============================================================================
// TRAITS
// ============================================================================
/// Identifies a domain entity by its stable, type-tagged id.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPE
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over `uuid::Uuid`.
///
/// A `Player` and an `Actor` share the same underlying uuid (`actorId ==
/// ownerId`), so `ID<Actor>` is produced from `ID<Player>` via
/// [`ID::cast`] rather than minted separately.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast `ID<T>` to `ID<U>` while preserving the underlying uuid.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self {
            inner: uuid::Uuid::deserialize(deserializer)?,
            marker: PhantomData,
        })
    }
}

// ============================================================================
// WIRE / SNAPSHOT CONSTANTS
// ============================================================================
/// Interval between heartbeat `world_snapshot` broadcasts.
pub const SNAPSHOT_INTERVAL_MS: i64 = 500;
/// Cap on retained chat/launch history entries per room.
pub const MAX_HISTORY: usize = 100;
/// Default published map width in pixels.
pub const DEFAULT_MAP_WIDTH: u32 = 1560;
/// Default published map height in pixels.
pub const DEFAULT_MAP_HEIGHT: u32 = 844;
/// Inclusive upper bound of the Q16 fixed-point range.
pub const Q16_MAX: u32 = 65535;
/// Inclusive bounds on published map dimensions.
pub const MAP_DIMENSION_MIN: u32 = 256;
pub const MAP_DIMENSION_MAX: u32 = 4096;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with a timestamped log file.
/// Creates a `logs/` directory relative to the process's working directory.
#[cfg(feature = "server")]
pub fn init_logging() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register a Ctrl+C handler for immediate (non-graceful) termination.
/// The room has no in-flight work worth draining on interrupt — every
/// mutation is already durable-or-discardable at the granularity of a
/// single message, so a hard exit is safe.
#[cfg(feature = "server")]
pub fn install_interrupt_handler() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("listen for ctrl-c");
        println!();
        log::warn!("interrupt received, exiting");
        std::process::exit(0);
    });
}
