//! Per-message conversation state machine.
//!
//! `Conversation` is a plain value: every operation returns the UI
//! [`Effect`]s it implies and never touches the UI itself. Indicator hides
//! are only emitted while the indicator is visible, so each indicator is
//! cleared exactly once.

use std::fmt;

use stride_protocol::Signal;
use tracing::debug;

/// Where one outgoing message is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    /// No request in flight.
    Idle,
    /// Request sent, loading indicator shown, nothing received yet.
    AwaitingFirstToken,
    /// Server acknowledged with a ping; thinking indicator shown.
    Thinking,
    /// Assistant text is arriving.
    Streaming,
    /// `Done` received; the answer is final.
    Finalized,
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingFirstToken => write!(f, "awaiting-first-token"),
            Self::Thinking => write!(f, "thinking"),
            Self::Streaming => write!(f, "streaming"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// One call on the rendering sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RenderUserMessage(String),
    ShowLoading,
    HideLoading,
    ShowThinking,
    HideThinking,
    /// Full accumulated assistant text, not just the newest delta.
    UpsertAssistantMessage(String),
    RenderError(String),
}

/// The assistant's answer for one outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantMessageView {
    text: String,
}

impl AssistantMessageView {
    fn append(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug)]
pub struct Conversation {
    phase: ConversationPhase,
    view: Option<AssistantMessageView>,
    loading_visible: bool,
    thinking_visible: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            phase: ConversationPhase::Idle,
            view: None,
            loading_visible: false,
            thinking_visible: false,
        }
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn view(&self) -> Option<&AssistantMessageView> {
        self.view.as_ref()
    }

    /// Accumulated assistant text, if any text arrived.
    pub fn assistant_text(&self) -> Option<&str> {
        self.view.as_ref().map(AssistantMessageView::text)
    }

    /// The user sent `text`: `Idle → AwaitingFirstToken`.
    pub fn begin(&mut self, text: &str) -> Vec<Effect> {
        if self.phase != ConversationPhase::Idle {
            debug!(phase = %self.phase, "begin ignored: request already in flight");
            return Vec::new();
        }
        self.view = None;
        self.loading_visible = true;
        self.phase = ConversationPhase::AwaitingFirstToken;
        vec![Effect::RenderUserMessage(text.to_string()), Effect::ShowLoading]
    }

    /// Apply one decoded signal.
    pub fn apply(&mut self, signal: Signal) -> Vec<Effect> {
        use ConversationPhase::*;

        match (self.phase, signal) {
            (Idle, signal) => {
                debug!(kind = signal.kind(), "signal outside an active request ignored");
                Vec::new()
            }
            (Finalized, signal @ (Signal::Ping | Signal::Delta { .. } | Signal::Done)) => {
                debug!(kind = signal.kind(), "signal after done ignored");
                Vec::new()
            }

            // an error is surfaced in every active phase, including after done
            (AwaitingFirstToken | Thinking | Streaming | Finalized, Signal::Error { message }) => {
                let mut effects = self.clear_indicators();
                effects.push(Effect::RenderError(message));
                self.phase = Idle;
                effects
            }

            (AwaitingFirstToken, Signal::Ping) => {
                self.thinking_visible = true;
                self.phase = Thinking;
                vec![Effect::ShowThinking]
            }
            // one indicator at most, and none once real text has started
            (Thinking | Streaming, Signal::Ping) => Vec::new(),

            (AwaitingFirstToken | Thinking, Signal::Delta { text }) => {
                let mut effects = self.clear_indicators();
                let view = self.view.get_or_insert_with(AssistantMessageView::default);
                view.append(&text);
                effects.push(Effect::UpsertAssistantMessage(view.text.clone()));
                self.phase = Streaming;
                effects
            }
            (Streaming, Signal::Delta { text }) => {
                let view = self.view.get_or_insert_with(AssistantMessageView::default);
                view.append(&text);
                vec![Effect::UpsertAssistantMessage(view.text.clone())]
            }

            (AwaitingFirstToken | Thinking | Streaming, Signal::Done) => {
                let mut effects = self.clear_indicators();
                if let Some(view) = &self.view {
                    effects.push(Effect::UpsertAssistantMessage(view.text.clone()));
                }
                self.phase = Finalized;
                effects
            }
        }
    }

    /// One-shot answer: the whole text arrives at once and is final.
    pub fn reply(&mut self, text: String) -> Vec<Effect> {
        if matches!(self.phase, ConversationPhase::Idle | ConversationPhase::Finalized) {
            debug!(phase = %self.phase, "reply ignored");
            return Vec::new();
        }
        let mut effects = self.clear_indicators();
        effects.push(Effect::UpsertAssistantMessage(text.clone()));
        self.view = Some(AssistantMessageView { text });
        self.phase = ConversationPhase::Finalized;
        effects
    }

    /// Transport or read failure: surface `message` and go back to `Idle`.
    pub fn fail(&mut self, message: String) -> Vec<Effect> {
        let mut effects = self.clear_indicators();
        effects.push(Effect::RenderError(message));
        self.phase = ConversationPhase::Idle;
        effects
    }

    /// The request is over: drop leftover indicators and go back to `Idle`.
    pub fn complete(&mut self) -> Vec<Effect> {
        let effects = self.clear_indicators();
        self.phase = ConversationPhase::Idle;
        effects
    }

    fn clear_indicators(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.thinking_visible {
            self.thinking_visible = false;
            effects.push(Effect::HideThinking);
        }
        if self.loading_visible {
            self.loading_visible = false;
            effects.push(Effect::HideLoading);
        }
        effects
    }
}
