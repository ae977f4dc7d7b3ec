//! Hosting server binary.
//!
//! Runs the HTTP/WebSocket front door for the single authoritative room.
use atlas_hosting::Server;

#[tokio::main]
async fn main() {
    atlas_core::init_logging();
    atlas_core::install_interrupt_handler();
    Server::run().await.expect("hosting server exited");
}
