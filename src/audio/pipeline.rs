use super::chunker::ChunkAccumulator;
use super::encoder::encode_samples;
use super::gate::{GateEdge, NoiseGate};
use crate::stream::StreamSession;
use std::time::Duration;
use tracing::debug;

/// Capture-side pipeline: encodes raw sample batches, accumulates them
/// into fixed-interval chunks, and (optionally) drives hands-free
/// start/stop through a noise gate.
///
/// Runs entirely on the capture clock; handing a finished chunk to the
/// session is a non-blocking channel send, so a slow socket never stalls
/// the capture loop.
pub struct CapturePipeline {
    chunker: ChunkAccumulator,
    gate: Option<NoiseGate>,
}

impl CapturePipeline {
    pub fn new(chunk_interval: Duration, gate: Option<NoiseGate>) -> Self {
        Self {
            chunker: ChunkAccumulator::new(chunk_interval),
            gate,
        }
    }

    /// Process one capture tick worth of raw samples ([-1.0, 1.0]).
    pub fn on_samples(&mut self, session: &StreamSession, samples: &[f32], dt: Duration) {
        if let Some(gate) = &mut self.gate {
            match gate.feed(samples, dt) {
                Some(GateEdge::Start) => {
                    debug!("noise gate opened (level {:.4})", gate.level());
                    session.start();
                }
                Some(GateEdge::Stop) => {
                    debug!("noise gate closed");
                    session.stop();
                }
                None => {}
            }
        }

        self.chunker.push(&encode_samples(samples));

        if let Some(chunk) = self.chunker.tick(dt) {
            session.send_audio(chunk);
        }
    }

    /// Drop any partial chunk. Called when the session goes away.
    pub fn reset(&mut self) {
        self.chunker.reset();
    }
}
