//! Authoritative room state machine: connections, host election, terrain
//! versioning, actor ownership, command validation, route planning,
//! time-based movement, and snapshot fan-out.
//!
//! [`Room`] is deliberately synchronous and owns no I/O: every inbound
//! event (`connect`, `disconnect`, a parsed [`wire::ClientMessage`], or an
//! alarm firing) is a plain method call that returns the [`Outbound`]
//! events the caller must deliver. The async bridge between a socket and
//! this state machine lives one layer up, in `atlas-hosting`.
pub mod actor;
pub mod alarm;
pub mod player;
pub mod room;
pub mod terrain;
pub mod wire;

pub use actor::Actor;
pub use player::Player;
pub use room::{Outbound, Room};
pub use terrain::TerrainRuntime;
pub use wire::{ClientMessage, RejectReason, ServerMessage};
