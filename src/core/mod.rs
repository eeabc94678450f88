//! Core module: configuration, shared state and server assembly

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::{Server, router};
pub use state::ServerState;
