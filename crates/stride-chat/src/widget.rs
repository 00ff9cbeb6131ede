//! Chat widget — one backend, one sink, one request at a time.
//!
//! `send` takes `&mut self`, so a second message cannot start before the
//! first has reached its terminal phase. The sink's input control is
//! disabled for the same span.

use tracing::debug;

use crate::backend::ChatBackend;
use crate::session::{ChatSession, SessionReport};
use crate::sink::RenderSink;

pub struct ChatWidget<B, S> {
    backend: B,
    sink: S,
    stream: bool,
}

impl<B: ChatBackend, S: RenderSink> ChatWidget<B, S> {
    /// `stream` selects the streaming endpoint; otherwise the one-shot one.
    pub fn new(backend: B, sink: S, stream: bool) -> Self {
        Self {
            backend,
            sink,
            stream,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    pub fn set_streaming(&mut self, stream: bool) {
        self.stream = stream;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Send one user message and render the answer.
    ///
    /// Blank input is ignored and returns `None`. Every failure is rendered
    /// through the sink; the report says how the request ended.
    pub async fn send(&mut self, input: &str) -> Option<SessionReport> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }

        debug!(backend = self.backend.name(), stream = self.stream, "sending chat message");
        self.sink.set_input_enabled(false);
        let report = if self.stream {
            self.send_streaming(message).await
        } else {
            self.send_once(message).await
        };
        self.sink.set_input_enabled(true);
        Some(report)
    }

    async fn send_streaming(&mut self, message: &str) -> SessionReport {
        let session = ChatSession::start(message, &mut self.sink);
        match self.backend.open_stream(message).await {
            Ok(body) => session.run(body, &mut self.sink).await,
            Err(e) => session.fail(&e, &mut self.sink),
        }
    }

    async fn send_once(&mut self, message: &str) -> SessionReport {
        let session = ChatSession::start(message, &mut self.sink);
        match self.backend.send_message(message).await {
            Ok(answer) => session.reply(answer, &mut self.sink),
            Err(e) => session.fail(&e, &mut self.sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures_util::stream::{self, StreamExt};

    use super::*;
    use crate::backend::ByteStream;
    use crate::error::ChatError;
    use crate::phase::Effect;
    use crate::session::Outcome;
    use crate::sink::testing::RecordingSink;

    enum Reply {
        Stream(Vec<Result<Vec<u8>, ChatError>>),
        Answer(Result<String, ChatError>),
        Refuse(ChatError),
    }

    /// Hands out pre-scripted replies in order and records what was sent.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Reply>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn next(&self, message: &str) -> Reply {
            self.sent.lock().unwrap().push(message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send_message(&self, message: &str) -> Result<String, ChatError> {
            match self.next(message) {
                Reply::Answer(answer) => answer,
                Reply::Refuse(e) => Err(e),
                Reply::Stream(_) => panic!("stream reply scripted for one-shot request"),
            }
        }

        async fn open_stream(&self, message: &str) -> Result<ByteStream, ChatError> {
            match self.next(message) {
                Reply::Stream(chunks) => Ok(stream::iter(chunks).boxed()),
                Reply::Refuse(e) => Err(e),
                Reply::Answer(_) => panic!("one-shot reply scripted for stream request"),
            }
        }
    }

    fn body(text: &str) -> Vec<Result<Vec<u8>, ChatError>> {
        text.as_bytes()
            .chunks(5)
            .map(|c| Ok(c.to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn blank_input_sends_nothing() {
        let mut widget =
            ChatWidget::new(ScriptedBackend::default(), RecordingSink::default(), true);
        assert!(widget.send("   \n").await.is_none());
        assert!(widget.sink().effects.is_empty());
        assert!(widget.sink().input_enabled.is_empty());
    }

    #[tokio::test]
    async fn streamed_answer_is_rendered_and_input_reenabled() {
        let backend = ScriptedBackend::with(vec![Reply::Stream(body(
            "data: {\"delta\":\"Hi\",\"done\":false,\"error\":\"\"}\n\n\
             data: {\"delta\":\" there\",\"done\":false,\"error\":\"\"}\n\n\
             data: {\"delta\":\"\",\"done\":true,\"error\":\"\"}\n\n",
        ))]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), true);

        let report = widget.send("  hello coach ").await.expect("report");

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.assistant_text.as_deref(), Some("Hi there"));
        assert_eq!(widget.backend.sent.lock().unwrap().as_slice(), ["hello coach"]);
        assert_eq!(
            widget.sink().effects[0],
            Effect::RenderUserMessage("hello coach".to_string())
        );
        assert_eq!(widget.sink().last_assistant_text(), Some("Hi there"));
        assert_eq!(widget.sink().input_enabled, vec![false, true]);
    }

    #[tokio::test]
    async fn refused_stream_is_a_transport_error() {
        let backend = ScriptedBackend::with(vec![Reply::Refuse(ChatError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
        })]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), true);

        let report = widget.send("hello").await.expect("report");

        assert_eq!(
            report.outcome,
            Outcome::TransportError("Error: Internal Server Error".to_string())
        );
        assert_eq!(
            widget.sink().effects,
            vec![
                Effect::RenderUserMessage("hello".to_string()),
                Effect::ShowLoading,
                Effect::HideLoading,
                Effect::RenderError("Error: Internal Server Error".to_string()),
            ]
        );
        assert_eq!(widget.sink().input_enabled, vec![false, true]);
    }

    #[tokio::test]
    async fn one_shot_path_renders_answer_once() {
        let backend =
            ScriptedBackend::with(vec![Reply::Answer(Ok("Easy 30 minutes.".to_string()))]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), false);
        assert!(!widget.is_streaming());

        let report = widget.send("plan?").await.expect("report");

        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(
            widget.sink().effects,
            vec![
                Effect::RenderUserMessage("plan?".to_string()),
                Effect::ShowLoading,
                Effect::HideLoading,
                Effect::UpsertAssistantMessage("Easy 30 minutes.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn one_shot_failure_is_rendered() {
        let backend = ScriptedBackend::with(vec![Reply::Answer(Err(ChatError::Read(
            "body closed".to_string(),
        )))]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), false);

        let report = widget.send("plan?").await.expect("report");

        assert!(report.outcome.is_error());
        assert_eq!(widget.sink().errors(), vec!["Error: body closed"]);
    }

    #[tokio::test]
    async fn next_message_starts_fresh_after_server_error() {
        let backend = ScriptedBackend::with(vec![
            Reply::Stream(body("data: {\"delta\":\"half\"}\n\ndata: {\"error\":\"boom\"}\n\n")),
            Reply::Stream(body("data: {\"delta\":\"whole\"}\n\ndata: {\"done\":true}\n\n")),
        ]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), true);

        let first = widget.send("one").await.expect("report");
        assert_eq!(first.outcome, Outcome::ServerError("boom".to_string()));

        let second = widget.send("two").await.expect("report");
        assert_eq!(second.outcome, Outcome::Completed);
        assert_eq!(second.assistant_text.as_deref(), Some("whole"));
        assert_ne!(first.request_id, second.request_id);
    }

    #[tokio::test]
    async fn streaming_flag_switches_endpoint() {
        let backend = ScriptedBackend::with(vec![
            Reply::Answer(Ok("ok".to_string())),
            Reply::Stream(body("data: {\"delta\":\"streamed\"}\n\n")),
        ]);
        let mut widget = ChatWidget::new(backend, RecordingSink::default(), true);

        widget.set_streaming(false);
        let report = widget.send("x").await.expect("report");
        assert_eq!(report.assistant_text.as_deref(), Some("ok"));

        widget.sink_mut().effects.clear();
        widget.set_streaming(true);
        let report = widget.send("y").await.expect("report");
        assert_eq!(report.assistant_text.as_deref(), Some("streamed"));
        assert_eq!(widget.sink().last_assistant_text(), Some("streamed"));
    }
}
