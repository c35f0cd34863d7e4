use std::sync::OnceLock;

use crate::{FlakeId, SnowflakeGenerator};

static DEFAULT_GENERATOR: OnceLock<SnowflakeGenerator> = OnceLock::new();

/// The process-wide default generator: node 0, default [`crate::FlakeConfig`],
/// system clock.
///
/// Built on first use and reused for the lifetime of the process.
///
/// # Panics
///
/// Panics if the default generator cannot be constructed. Node 0 is valid
/// for every layout, so this indicates a broken build rather than a runtime
/// condition.
pub fn global() -> &'static SnowflakeGenerator {
    DEFAULT_GENERATOR.get_or_init(|| match SnowflakeGenerator::new(0) {
        Ok(generator) => generator,
        Err(err) => panic!("failed to build default generator: {err}"),
    })
}

/// Generates an ID from the process-wide default generator.
///
/// ```
/// let a = flakeid::generate();
/// let b = flakeid::generate();
/// assert!(a < b);
/// ```
pub fn generate() -> FlakeId {
    global().next_id()
}
