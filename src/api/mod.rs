//! API route modules
//!
//! - [`health`] - liveness probe
//! - [`auth`] - register / login / refresh / me
//! - [`categories`] - category listing and admin CRUD
//! - [`products`] - catalog listing, search and admin CRUD
//! - [`orders`] - checkout and order management
//! - [`wishlist`] - per-user wishlist toggle
//! - [`upload`] - admin image upload

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod upload;
pub mod wishlist;
