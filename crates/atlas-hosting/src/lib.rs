//! Async WebSocket hosting for the authoritative room: a tokio task
//! wraps the synchronous [`atlas_room::Room`] and an actix-web front
//! door bridges client sockets to it.
pub mod runtime;
pub mod server;

pub use runtime::RoomHandle;
pub use server::Server;
