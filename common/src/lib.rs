//! exrates Common Types
//!
//! Shared types used across the exrates workspace: currency codes, the
//! immutable rate snapshot served by the cache, and time utilities.

pub mod identifiers;
pub mod snapshot;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use snapshot::*;
pub use error::*;
pub use time::*;
