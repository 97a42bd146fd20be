//! v1 API Data Transfer Objects.
//!
//! Wire types only; they convert from the domain models in `src/models/`
//! and never leak into the services.

pub mod chunks;
pub mod timeline;

pub use chunks::*;
pub use timeline::*;
