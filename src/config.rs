use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub gate: GateConfig,
    pub responses: ResponsesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API host, without scheme (e.g. "dev-train.example.com/api")
    pub host: String,
    /// Bearer token; must be non-empty before any network call
    pub token: String,
    pub model_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Send cadence for accumulated audio
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Hands-free activation on ambient level
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_gate_threshold")]
    pub threshold: f32,
    /// Silence needed before auto-stop, in seconds
    #[serde(default = "default_quiet_duration")]
    pub quiet_duration_secs: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesConfig {
    /// Path to the intent → reply JSON file
    pub path: String,
}

fn default_user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4())
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_chunk_interval_ms() -> u64 {
    100
}

fn default_gate_threshold() -> f32 {
    0.02
}

fn default_quiet_duration() -> f32 {
    1.5
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk_interval_ms: default_chunk_interval_ms(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_gate_threshold(),
            quiet_duration_secs: default_quiet_duration(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
