/// Authentication utilities
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token generation and validation
///
/// Tokens are short-lived (1 hour) and carry the user id and username.
/// The signing secret is supplied by the caller from startup
/// configuration; nothing in this module reads ambient process state.

pub mod jwt;
pub mod password;
