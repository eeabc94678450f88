//! 24ozKw store backend
//!
//! Single-binary e-commerce service: product catalog, categories,
//! accounts with JWT auth, wishlist, image upload, and the order
//! pipeline (pricing, stock reservation, invoice email, WhatsApp
//! confirmation) on an embedded SurrealDB.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use crate::auth::CurrentUser;
pub use crate::core::{Config, Server, ServerState};
pub use crate::utils::{AppError, AppResult};
