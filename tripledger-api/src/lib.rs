//! # Tripledger API Server Library
//!
//! Axum HTTP server for the tripledger trip expense tracker.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, auth middleware
//! - `config`: Configuration loaded from environment variables
//! - `error`: Error taxonomy and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
