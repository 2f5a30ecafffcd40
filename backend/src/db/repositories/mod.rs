//! Document store implementations.
//!
//! - `local`: In-memory document store for tests, local development and
//!   seeded deployments
#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "local-repo")]
pub use local::{ConnectionState, LocalRepository};
