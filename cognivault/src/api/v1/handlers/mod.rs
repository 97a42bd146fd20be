pub mod chunks;
pub(crate) mod health;
pub mod timeline;

pub use health::health_check;
