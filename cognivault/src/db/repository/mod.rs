mod chunks;

pub use chunks::ChunkRepository;
