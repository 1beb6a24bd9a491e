//! # Tripledger Shared Library
//!
//! Shared types and business logic used by the tripledger API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD/aggregation queries
//! - `auth`: Password hashing and JWT token utilities
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the tripledger shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
