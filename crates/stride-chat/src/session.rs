use futures_util::{Stream, StreamExt};
use stride_core::types::RequestId;
use stride_protocol::{Signal, StreamDecoder};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::ChatError;
use crate::phase::{Conversation, ConversationPhase, Effect};
use crate::sink::RenderSink;

/// How one outgoing message ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was read to the end.
    Completed,
    /// The server sent an `error` frame; reading stopped there.
    ServerError(String),
    /// The request failed or the body broke off.
    TransportError(String),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Completed)
    }
}

/// Summary handed back once a session reaches its terminal phase.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub request_id: RequestId,
    pub outcome: Outcome,
    /// Accumulated assistant text, if any arrived.
    pub assistant_text: Option<String>,
    /// Number of signals decoded, including ignored ones.
    pub signals: usize,
    pub phase: ConversationPhase,
}

/// State for exactly one outgoing message.
///
/// Owns the decoder and the conversation; consumed on the terminal
/// transition so nothing leaks into the next request.
#[derive(Debug)]
pub struct ChatSession {
    request_id: RequestId,
    decoder: StreamDecoder,
    conversation: Conversation,
    signals: usize,
}

impl ChatSession {
    /// Render the user's message and show the loading indicator.
    pub fn start<S: RenderSink + ?Sized>(message: &str, sink: &mut S) -> Self {
        let mut session = Self {
            request_id: RequestId::new(),
            decoder: StreamDecoder::new(),
            conversation: Conversation::new(),
            signals: 0,
        };
        debug!(request_id = %session.request_id, len = message.len(), "chat request started");
        let effects = session.conversation.begin(message);
        apply_all(&effects, sink);
        session
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn phase(&self) -> ConversationPhase {
        self.conversation.phase()
    }

    /// Consume a streaming response body until it ends, breaks, or the
    /// server reports an error.
    pub async fn run<St, B, S>(self, stream: St, sink: &mut S) -> SessionReport
    where
        St: Stream<Item = Result<B, ChatError>>,
        B: AsRef<[u8]>,
        S: RenderSink + ?Sized,
    {
        let span = info_span!("chat_stream", request_id = %self.request_id);
        self.drive(stream, sink).instrument(span).await
    }

    async fn drive<St, B, S>(mut self, stream: St, sink: &mut S) -> SessionReport
    where
        St: Stream<Item = Result<B, ChatError>>,
        B: AsRef<[u8]>,
        S: RenderSink + ?Sized,
    {
        futures_util::pin_mut!(stream);

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    // undelimited trailing text is dropped, not parsed
                    warn!(
                        error = %e,
                        buffered = self.decoder.buffered().len(),
                        "stream read failed"
                    );
                    return self.fail(&e, sink);
                }
            };

            for signal in self.decoder.feed(chunk.as_ref()) {
                if let Some(message) = self.dispatch(signal, sink) {
                    return self.finish_with(Outcome::ServerError(message));
                }
            }
        }

        for signal in self.decoder.finish() {
            if let Some(message) = self.dispatch(signal, sink) {
                return self.finish_with(Outcome::ServerError(message));
            }
        }

        let effects = self.conversation.complete();
        apply_all(&effects, sink);
        self.finish_with(Outcome::Completed)
    }

    /// One-shot path: the full answer arrived in a single response.
    pub fn reply<S: RenderSink + ?Sized>(
        mut self,
        answer: String,
        sink: &mut S,
    ) -> SessionReport {
        self.signals += 1;
        let effects = self.conversation.reply(answer);
        apply_all(&effects, sink);
        let effects = self.conversation.complete();
        apply_all(&effects, sink);
        self.finish_with(Outcome::Completed)
    }

    /// The request could not be made or its body broke off.
    pub fn fail<S: RenderSink + ?Sized>(
        mut self,
        error: &ChatError,
        sink: &mut S,
    ) -> SessionReport {
        let message = format!("Error: {}", error.user_message());
        let effects = self.conversation.fail(message.clone());
        apply_all(&effects, sink);
        self.finish_with(Outcome::TransportError(message))
    }

    /// Apply one signal. Returns the server's message when it aborted the
    /// response.
    fn dispatch<S: RenderSink + ?Sized>(
        &mut self,
        signal: Signal,
        sink: &mut S,
    ) -> Option<String> {
        self.signals += 1;
        let server_error = match &signal {
            Signal::Error { message } => Some(message.clone()),
            _ => None,
        };

        let effects = self.conversation.apply(signal);
        apply_all(&effects, sink);

        match server_error {
            Some(message) if self.conversation.phase() == ConversationPhase::Idle => {
                warn!(error = %message, "coach reported an error mid-stream");
                Some(message)
            }
            _ => None,
        }
    }

    fn finish_with(self, outcome: Outcome) -> SessionReport {
        let report = SessionReport {
            assistant_text: self.conversation.assistant_text().map(str::to_string),
            request_id: self.request_id,
            outcome,
            signals: self.signals,
            phase: self.conversation.phase(),
        };
        info!(
            request_id = %report.request_id,
            outcome = ?report.outcome,
            signals = report.signals,
            chars = report.assistant_text.as_ref().map_or(0, |t| t.chars().count()),
            "chat request finished"
        );
        report
    }
}

fn apply_all<S: RenderSink + ?Sized>(effects: &[Effect], sink: &mut S) {
    for effect in effects {
        effect.apply_to(sink);
    }
}
