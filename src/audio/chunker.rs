use std::time::Duration;

/// One transmission unit of encoded audio, sent as a single binary
/// WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Encoded PCM bytes (16-bit little-endian)
    pub bytes: Vec<u8>,
}

impl AudioChunk {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Accumulates encoded bytes and releases them on a fixed wall-clock
/// cadence, decoupling the capture rate from the send rate.
///
/// The elapsed timer only advances while the buffer is non-empty, so the
/// first chunk after a quiet period carries a full interval of audio
/// rather than firing immediately.
#[derive(Debug)]
pub struct ChunkAccumulator {
    buffer: Vec<u8>,
    elapsed: Duration,
    interval: Duration,
}

impl ChunkAccumulator {
    /// Default emission interval (100 ms).
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(interval: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            elapsed: Duration::ZERO,
            interval,
        }
    }

    /// Append encoded bytes to the pending buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Advance the clock by one capture tick.
    ///
    /// Returns the accumulated chunk once a full interval of time has
    /// passed with data buffered. Never returns an empty chunk.
    pub fn tick(&mut self, dt: Duration) -> Option<AudioChunk> {
        if self.buffer.is_empty() {
            return None;
        }

        self.elapsed += dt;
        if self.elapsed < self.interval {
            return None;
        }

        self.elapsed = Duration::ZERO;
        Some(AudioChunk {
            bytes: std::mem::take(&mut self.buffer),
        })
    }

    /// Discard buffered bytes and restart the timer. Used when a session
    /// disconnects with a partial chunk in flight.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.elapsed = Duration::ZERO;
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}
