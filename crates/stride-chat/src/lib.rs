//! stride-chat — coach chat client.
//!
//! Wires the stream decoder from `stride-protocol` to a phase state machine
//! and hands the resulting UI effects to a [`RenderSink`]. The sink is the
//! only thing that knows how messages and indicators look.
//!
//! ```rust,no_run
//! use stride_chat::{ChatWidget, HttpBackend, RenderSink};
//! # async fn demo(sink: impl RenderSink) -> Result<(), stride_chat::ChatError> {
//! let config = stride_core::config::ClientConfig::default();
//! let backend = HttpBackend::new(&config)?;
//! let mut widget = ChatWidget::new(backend, sink, config.stream);
//! widget.send("How did my long run go?").await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod phase;
pub mod session;
pub mod sink;
pub mod widget;

pub use backend::{normalize_answer, ByteStream, ChatBackend, HttpBackend};
pub use error::ChatError;
pub use phase::{AssistantMessageView, Conversation, ConversationPhase, Effect};
pub use session::{ChatSession, Outcome, SessionReport};
pub use sink::RenderSink;
pub use widget::ChatWidget;
