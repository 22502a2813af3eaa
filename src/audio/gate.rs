use std::time::Duration;

/// Activation edge produced by the noise gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEdge {
    /// Ambient level rose above the threshold
    Start,
    /// Ambient level stayed below the threshold for the quiet duration
    Stop,
}

/// Amplitude-threshold gate for hands-free streaming activation.
///
/// Smooths the per-batch mean amplitude with an exponential moving
/// average (0.1 new / 0.9 old) and emits a single Start edge when the
/// level crosses the threshold, then a single Stop edge after the level
/// has stayed quiet for the configured duration.
#[derive(Debug)]
pub struct NoiseGate {
    threshold: f32,
    quiet_duration: Duration,
    level: f32,
    quiet_time: Duration,
    open: bool,
}

impl NoiseGate {
    const SMOOTHING: f32 = 0.1;

    pub fn new(threshold: f32, quiet_duration: Duration) -> Self {
        Self {
            threshold,
            quiet_duration,
            level: 0.0,
            quiet_time: Duration::ZERO,
            open: false,
        }
    }

    /// Current smoothed noise level.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Whether the gate is currently open (streaming active).
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Fold one capture batch into the gate and evaluate the transition
    /// rules. At most one edge is produced per tick.
    pub fn feed(&mut self, samples: &[f32], dt: Duration) -> Option<GateEdge> {
        let batch_avg = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
        };
        self.level = Self::SMOOTHING * batch_avg + (1.0 - Self::SMOOTHING) * self.level;

        if self.level > self.threshold {
            self.quiet_time = Duration::ZERO;
            if !self.open {
                self.open = true;
                return Some(GateEdge::Start);
            }
        } else {
            self.quiet_time += dt;
            if self.quiet_time > self.quiet_duration {
                self.quiet_time = Duration::ZERO;
                if self.open {
                    self.open = false;
                    return Some(GateEdge::Stop);
                }
            }
        }

        None
    }
}
