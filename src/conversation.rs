//! Consumer-side application of streaming results.
//!
//! `Conversation` drains the event queue one event per tick and turns
//! results into plain-data calls on a `Presenter`. It never inspects the
//! presentation layer beyond that trait.

use crate::responses::IntentResponseTable;
use crate::stream::{EventReceiver, Intent, IntentResult, SessionEvent};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Presentation seam. Implementations render text fields, print to a
/// console, or record calls in tests.
pub trait Presenter {
    /// Connection / streaming status line
    fn status(&mut self, status: &str);
    /// Interim transcript hypothesis
    fn hypothesis(&mut self, text: &str);
    /// Finalized utterance with its top intent label
    fn recognition(&mut self, text: &str, label: &str);
    /// Current ordered intent candidates
    fn intents(&mut self, intents: &[Intent]);
    /// Canned reply for a recognized intent
    fn response(&mut self, reply: &str);
}

/// One finalized utterance.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

/// Applies session events to a presenter, in arrival order, at the
/// consumer's own cadence.
pub struct Conversation<P: Presenter> {
    events: EventReceiver,
    responses: IntentResponseTable,
    presenter: P,
    utterances: Vec<Utterance>,
}

impl<P: Presenter> Conversation<P> {
    pub fn new(events: EventReceiver, responses: IntentResponseTable, presenter: P) -> Self {
        Self {
            events,
            responses,
            presenter,
            utterances: Vec::new(),
        }
    }

    /// Apply at most one queued event. Returns false when the queue was
    /// empty.
    pub fn tick(&mut self) -> bool {
        match self.events.poll() {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Finalized utterances collected so far.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => self.presenter.status("connected"),
            SessionEvent::Ready { .. } => self.presenter.status("ready"),
            SessionEvent::Failed { server_id } => {
                warn!("server rejected session {}", server_id);
                self.presenter.status("failed");
            }
            SessionEvent::StreamingStarted => self.presenter.status("streaming"),
            SessionEvent::StreamingStopped => self.presenter.status("waiting"),
            SessionEvent::TransportError(message) => {
                self.presenter.status(&format!("error: {}", message));
            }
            SessionEvent::Disconnected => self.presenter.status("disconnected"),
            SessionEvent::Intent(result) => self.apply_result(result),
        }
    }

    fn apply_result(&mut self, result: IntentResult) {
        self.presenter.hypothesis(&result.transcript.text);
        self.presenter.intents(&result.intents);

        if !result.is_final {
            return;
        }

        // A final result should carry at least one intent; the server
        // has been seen to break this, so an empty list is non-actionable.
        let top = match result.intents.first() {
            Some(intent) => intent,
            None => {
                warn!("final result with no intents: {:?}", result.transcript.text);
                return;
            }
        };

        self.presenter.recognition(&result.transcript.text, &top.label);
        self.utterances.push(Utterance {
            text: result.transcript.text.clone(),
            label: top.label.clone(),
            timestamp: Utc::now(),
        });

        if let Some(reply) = self.responses.reply_for(&top.label) {
            self.presenter.response(reply);
        }
    }
}
