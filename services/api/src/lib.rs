//! services/api/src/lib.rs
//!
//! The HTTP face of the cinema booking backend: configuration, the Postgres,
//! Argon2 and JWT adapters, and the axum router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
