//! vigil-registry — shared target registry for Vigil.
//!
//! Holds every registered probe [`Target`] keyed by identifier, together
//! with an index of registered endpoints that keeps registration unique per
//! endpoint. The [`Registry`] is `Clone` + `Send` + `Sync` (backed by an
//! `Arc` around a readers-writer lock) and is shared by the HTTP API, the
//! scheduler, and the daemon's shutdown path.
//!
//! # Snapshots
//!
//! The registry can be dumped to and loaded from a JSON array of targets.
//! Loading is best-effort at startup: a missing or corrupt file leaves the
//! registry empty.

pub mod duration;
pub mod error;
pub mod id;
pub mod registry;
pub mod types;

pub use duration::{ParseDurationError, format_duration, parse_duration};
pub use error::{RegistryError, RegistryResult};
pub use id::{is_target_id, new_target_id};
pub use registry::Registry;
pub use types::*;
