use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portico_stream::audio::{CapturePipeline, NoiseGate};
use portico_stream::conversation::{Conversation, Presenter};
use portico_stream::stream::{event_queue, Intent, StreamSession};
use portico_stream::{Config, IntentResponseTable, ModelClient};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "portico-stream", about = "Real-time speech intent client")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, default_value = "config/portico-stream")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a WAV file through the realtime prediction socket
    Stream {
        /// Path to a mono or stereo WAV file
        wav: PathBuf,
    },
    /// Create a model and print its id
    CreateModel {
        name: String,
        #[arg(long, default_value = "en-us")]
        language: String,
    },
    /// Train the configured model on a file of intent statements
    Train {
        /// Newline-separated training statements
        intents_file: PathBuf,
    },
    /// Print the configured model's status
    Status,
    /// Batch-predict intents from text statements
    Predict {
        statements: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Commands::Stream { wav } => stream_file(&cfg, &wav).await,
        Commands::CreateModel { name, language } => {
            let client = ModelClient::new(&cfg.api)?;
            let id = client.create_model(&name, &language).await?;
            println!("{}", id);
            Ok(())
        }
        Commands::Train { intents_file } => {
            let client = ModelClient::new(&cfg.api)?;
            let text = std::fs::read_to_string(&intents_file)
                .with_context(|| format!("Failed to read {:?}", intents_file))?;
            let intents: Vec<String> = text.lines().map(str::to_string).collect();
            let status = client.train_model(&cfg.api.model_id, &intents).await?;
            println!("{}", status);
            Ok(())
        }
        Commands::Status => {
            let client = ModelClient::new(&cfg.api)?;
            let status = client.model_status(&cfg.api.model_id).await?;
            println!("{}", status);
            Ok(())
        }
        Commands::Predict { statements } => {
            let client = ModelClient::new(&cfg.api)?;
            let predictions = client.predict_from_text(&cfg.api.model_id, &statements).await?;
            for sentence in predictions {
                println!("{}", sentence.statement);
                for intent in &sentence.prediction {
                    println!("  label: {} ({:.2})", intent.label, intent.confidence);
                }
            }
            Ok(())
        }
    }
}

/// Console presentation: transcripts on stdout, status lines remembered
/// for the session loop.
#[derive(Default)]
struct ConsolePresenter {
    last_status: Option<String>,
}

impl Presenter for ConsolePresenter {
    fn status(&mut self, status: &str) {
        info!("session status: {}", status);
        self.last_status = Some(status.to_string());
    }

    fn hypothesis(&mut self, text: &str) {
        print!("\r{}", text);
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }

    fn recognition(&mut self, text: &str, label: &str) {
        println!("\n{} (label: {})", text, label);
    }

    fn intents(&mut self, _intents: &[Intent]) {}

    fn response(&mut self, reply: &str) {
        println!(">> {}", reply);
    }
}

impl ConsolePresenter {
    fn is_ready(&self) -> bool {
        self.last_status.as_deref() == Some("ready")
    }

    fn is_failed(&self) -> bool {
        matches!(self.last_status.as_deref(), Some("failed") | Some("disconnected"))
    }
}

async fn stream_file(cfg: &Config, wav: &PathBuf) -> Result<()> {
    let responses = IntentResponseTable::load(&cfg.responses.path)?;
    let samples = read_wav_mono(wav, cfg.audio.sample_rate)?;
    info!(
        "streaming {:?}: {:.1}s of audio",
        wav,
        samples.len() as f64 / cfg.audio.sample_rate as f64
    );

    let (events, event_rx) = event_queue();
    let session = StreamSession::connect(&cfg.api, cfg.audio.sample_rate, events).await?;
    let mut conversation = Conversation::new(event_rx, responses, ConsolePresenter::default());

    // Wait for the server to accept the session.
    let accepted = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            conversation.tick();
            if conversation.presenter().is_ready() {
                return true;
            }
            if conversation.presenter().is_failed() {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("Timed out waiting for the server to accept the session")?;
    if !accepted {
        anyhow::bail!("server rejected the session");
    }

    let gate = cfg.gate.enabled.then(|| {
        NoiseGate::new(
            cfg.gate.threshold,
            Duration::from_secs_f32(cfg.gate.quiet_duration_secs),
        )
    });
    if gate.is_none() {
        session.start();
    }
    let mut pipeline = CapturePipeline::new(
        Duration::from_millis(cfg.audio.chunk_interval_ms),
        gate,
    );

    // Emulate the capture cadence: one batch every 10 ms.
    let tick = Duration::from_millis(10);
    let batch_len = (cfg.audio.sample_rate / 100).max(1) as usize;
    let mut interval = tokio::time::interval(tick);
    for batch in samples.chunks(batch_len) {
        interval.tick().await;
        pipeline.on_samples(&session, batch, tick);
        conversation.tick();
    }

    session.stop();

    // Give the server a moment to deliver trailing results.
    let drain_deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < drain_deadline {
        if !conversation.tick() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    session.disconnect();
    session.closed().await;

    info!("{} utterances recognized", conversation.utterances().len());
    Ok(())
}

/// Load a WAV file as normalized mono samples.
fn read_wav_mono(path: &PathBuf, expected_rate: u32) -> Result<Vec<f32>> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {:?}", path))?;
    let spec = reader.spec();

    if spec.sample_rate != expected_rate {
        warn!(
            "WAV sample rate {} differs from configured {}; streaming as-is",
            spec.sample_rate, expected_rate
        );
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to decode WAV samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode WAV samples")?
        }
    };

    // Average interleaved channels down to mono.
    if spec.channels > 1 {
        let channels = spec.channels as usize;
        Ok(samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect())
    } else {
        Ok(samples)
    }
}
