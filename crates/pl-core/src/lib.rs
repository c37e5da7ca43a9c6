//! pl-core: shared foundation for pumplab.
//!
//! Contains:
//! - ids (control keys)
//! - numeric (Real + tolerances + parsing of displayed control values)
//! - snapshot (ordered key -> value capture of every control)
//! - error (non-numeric control values)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod snapshot;

pub use error::{PlError, PlResult};
pub use ids::*;
pub use numeric::*;
pub use snapshot::Snapshot;
