pub mod audio;
pub mod config;
pub mod conversation;
pub mod models;
pub mod responses;
pub mod stream;

pub use audio::{AudioChunk, CapturePipeline, ChunkAccumulator, GateEdge, NoiseGate};
pub use config::Config;
pub use conversation::{Conversation, Presenter, Utterance};
pub use models::{ModelClient, SentencePrediction};
pub use responses::{IntentResponse, IntentResponseTable};
pub use stream::{
    event_queue, EventReceiver, EventSender, Intent, IntentResult, SessionEvent, StreamSession,
    StreamState, Transcript,
};
