//! Error types for Corral
//!
//! A single cloneable error enum is shared by every layer of the engine:
//! operations return it, execution units store it, the failure channel
//! carries it and supervision reports copy it. Cloneability is what lets one
//! failure be observed from all of those places at once.

mod constructors;
mod conversions;
mod types;

pub(crate) use conversions::panic_message;
pub use types::{CorralError, CorralResult, ResultExt};
