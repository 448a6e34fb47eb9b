/// Database layer
///
/// - `pool`: connection pool construction with health check
/// - `migrations`: embedded migration runner

pub mod migrations;
pub mod pool;
