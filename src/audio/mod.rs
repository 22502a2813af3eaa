pub mod chunker;
pub mod encoder;
pub mod gate;
pub mod pipeline;

pub use chunker::{AudioChunk, ChunkAccumulator};
pub use encoder::{encode_sample, encode_samples, PCM_SCALE};
pub use gate::{GateEdge, NoiseGate};
pub use pipeline::CapturePipeline;
