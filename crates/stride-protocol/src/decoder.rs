use tracing::{debug, warn};

use crate::frames::{frame_payload, FrameBuffer};
use crate::signal::Signal;
use crate::utf8::Utf8Decoder;

/// Turns raw response chunks into [`Signal`]s.
///
/// One decoder per response. Frames are only parsed once their terminating
/// blank line has arrived, so the output does not depend on how the network
/// split the bytes.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    utf8: Utf8Decoder,
    buffer: FrameBuffer,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk and return the signals of every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Signal> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let mut text = String::new();
        self.utf8.decode_into(chunk, &mut text);
        self.buffer.push_str(&text);

        self.buffer
            .drain_frames()
            .iter()
            .filter_map(|frame| parse_frame(frame))
            .collect()
    }

    /// End of stream: parse a trailing frame that never got its delimiter.
    pub fn finish(&mut self) -> Vec<Signal> {
        let mut text = String::new();
        self.utf8.flush_into(&mut text);
        self.buffer.push_str(&text);

        match self.buffer.take_trailing() {
            Some(frame) => {
                debug!(len = frame.len(), "parsing undelimited trailing frame");
                parse_frame(&frame).into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Text received but not yet resolved into a complete frame.
    pub fn buffered(&self) -> &str {
        self.buffer.as_str()
    }

    /// True when nothing is buffered, neither text nor a partial character.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.utf8.is_empty()
    }
}

/// Parse one frame into zero or one signal. Malformed payloads are logged
/// and dropped.
fn parse_frame(frame: &str) -> Option<Signal> {
    let payload = frame_payload(frame)?;

    let value: serde_json::Value = match serde_json::from_str(&payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, payload = %payload, "failed to parse SSE JSON");
            return None;
        }
    };

    let signal = Signal::classify(&value);
    match &signal {
        Some(s) => debug!(kind = s.kind(), "stream signal"),
        None => debug!(payload = %payload, "frame carried no recognised field"),
    }
    signal
}
