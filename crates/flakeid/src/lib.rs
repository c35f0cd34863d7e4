//! Snowflake-style 64-bit identifiers.
//!
//! A [`FlakeId`] packs a millisecond timestamp, a node id and a per-millisecond
//! sequence into one `i64`:
//!
//! ```text
//! [ time since epoch | node (node_bits) | sequence (step_bits) ]
//! ```
//!
//! IDs are produced by a [`SnowflakeGenerator`], or by the process-wide
//! default through [`generate`].
//!
//! ```
//! use flakeid::{FlakeConfig, SnowflakeGenerator};
//!
//! let generator = SnowflakeGenerator::with_config(5, FlakeConfig::default()).unwrap();
//! let id = generator.next_id();
//! assert_eq!(id.node(generator.layout()), 5);
//!
//! let other = flakeid::generate();
//! assert_eq!(other.node(flakeid::global().layout()), 0);
//! ```
//!
//! # Feature flags
//!
//! - `tracing` (default): emits `tracing` events on sequence exhaustion and
//!   clock regression.
//! - `serde`: `Serialize`/`Deserialize` for [`FlakeId`] plus string helpers in
//!   [`serde_helpers`].

mod config;
mod error;
mod generator;
mod global;
mod id;
#[cfg(feature = "serde")]
pub mod serde_helpers;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::global::*;
pub use crate::id::*;
pub use crate::time::*;
