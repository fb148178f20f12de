//! Service operations invoked by the transport layer.
//!
//! User-scoped functions take the already authenticated caller id. Mutations take
//! the per-entity lock, load a snapshot, run the core engine and write back
//! with a version check, retrying a few times before giving up.

pub mod chat;
pub mod locks;
pub mod pk;
pub mod profile;
pub mod progress;
pub mod social;

/// Versioned writes attempted before reporting a conflict.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 3;
