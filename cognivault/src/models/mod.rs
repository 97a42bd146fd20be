mod chunk;
mod timeline;

pub use chunk::*;
pub use timeline::*;
