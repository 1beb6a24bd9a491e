/// Database layer for tripledger
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner

pub mod migrations;
pub mod pool;
