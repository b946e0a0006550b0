pub mod config;
pub mod control_plane;
pub mod error;
pub mod namespace;
pub mod reconciler;
pub mod resource;
pub mod router;
pub mod server;
pub mod status;
pub mod store;
pub mod stub;
pub mod sync;
pub mod watch;
