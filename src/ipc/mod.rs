//! Unix-socket IPC: the daemon's status and control surface.

pub mod client;
pub mod protocol;
pub mod server;
