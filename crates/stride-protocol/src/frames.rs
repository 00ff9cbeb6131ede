//! Frame splitting and payload extraction.
//!
//! A frame is everything up to the next blank line. Inside a frame only
//! `data: ` lines matter; `event:`, `id:` and `: comment` lines are skipped.

/// Separates frames on the wire.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Marks a payload line inside a frame.
pub const DATA_PREFIX: &str = "data: ";

/// Decoded text that has not been resolved into complete frames yet.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    text: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Remove and return every complete frame, oldest first.
    /// Text after the last delimiter stays buffered.
    pub fn drain_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = self.text[consumed..].find(FRAME_DELIMITER) {
            let end = consumed + pos;
            frames.push(self.text[consumed..end].to_string());
            consumed = end + FRAME_DELIMITER.len();
        }
        if consumed > 0 {
            self.text.drain(..consumed);
        }
        frames
    }

    /// Take the undelimited remainder if it holds anything but whitespace.
    /// The buffer is empty afterwards either way.
    pub fn take_trailing(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.text);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Join the non-empty `data: ` lines of one frame with `'\n'`.
///
/// Returns `None` when the frame has no payload at all, which is how
/// keep-alive comment frames (`: ping`) and bare `data: ` lines look.
pub fn frame_payload(frame: &str) -> Option<String> {
    let lines: Vec<&str> = frame
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .split('\n')
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .filter(|rest| !rest.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_frames_are_drained_in_order() {
        let mut buf = FrameBuffer::new();
        buf.push_str("data: 1\n\ndata: 2\n\ndata: 3");
        assert_eq!(buf.drain_frames(), vec!["data: 1", "data: 2"]);
        assert_eq!(buf.as_str(), "data: 3");
    }

    #[test]
    fn delimiter_split_across_pushes() {
        let mut buf = FrameBuffer::new();
        buf.push_str("data: 1\n");
        assert!(buf.drain_frames().is_empty());
        buf.push_str("\ndata: 2");
        assert_eq!(buf.drain_frames(), vec!["data: 1"]);
        assert_eq!(buf.as_str(), "data: 2");
    }

    #[test]
    fn extra_newlines_produce_empty_frames() {
        let mut buf = FrameBuffer::new();
        buf.push_str("data: 1\n\n\n\ndata: 2\n\n");
        let frames = buf.drain_frames();
        assert_eq!(frames, vec!["data: 1", "", "data: 2"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_whitespace_is_not_a_frame() {
        let mut buf = FrameBuffer::new();
        buf.push_str("\n  ");
        assert_eq!(buf.take_trailing(), None);
        assert!(buf.is_empty());

        buf.push_str("data: {}\n");
        assert_eq!(buf.take_trailing().as_deref(), Some("data: {}\n"));
    }

    #[test]
    fn payload_joins_multiple_data_lines() {
        let frame = "event: message\ndata: {\"delta\":\ndata: \"hi\"}\nid: 7";
        assert_eq!(
            frame_payload(frame).as_deref(),
            Some("{\"delta\":\n\"hi\"}")
        );
    }

    #[test]
    fn comment_frame_has_no_payload() {
        assert_eq!(frame_payload(": ping"), None);
        assert_eq!(frame_payload(""), None);
    }

    #[test]
    fn empty_data_lines_are_dropped() {
        assert_eq!(frame_payload("data: "), None);
        assert_eq!(frame_payload("data: \ndata: \n"), None);
        assert_eq!(frame_payload("data: \ndata: 1").as_deref(), Some("1"));
    }

    #[test]
    fn byte_order_mark_is_trimmed() {
        assert_eq!(frame_payload("\u{FEFF}data: 1").as_deref(), Some("1"));
    }

    #[test]
    fn leading_blank_line_is_trimmed() {
        assert_eq!(frame_payload("\ndata: 1").as_deref(), Some("1"));
    }
}
