/// API route handlers
///
/// Handlers are grouped by resource. Every protected handler receives
/// the acting user through request extensions, placed there by the
/// bearer-token middleware, and scopes all persistence calls to it.

pub mod auth;
pub mod categories;
pub mod destinations;
pub mod expenses;
pub mod health;
pub mod payment_methods;
pub mod reports;
pub mod trips;
