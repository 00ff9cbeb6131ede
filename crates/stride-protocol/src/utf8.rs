//! Incremental UTF-8 decoding across chunk boundaries.
//!
//! Network reads split bytes wherever they like, including in the middle of
//! a multi-byte character. The decoder holds back an incomplete trailing
//! sequence until the next chunk completes it. Bytes that can never form a
//! valid character are replaced with U+FFFD, one replacement per maximal
//! invalid subpart. A byte order mark at the very start of the stream is
//! dropped.

/// Substituted for every invalid or truncated byte sequence.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Byte order mark, stripped once from the start of the stream.
pub const BOM: char = '\u{FEFF}';

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of a character whose tail has not arrived yet (at most 3).
    pending: Vec<u8>,
    /// Set once the first character has been decoded.
    started: bool,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and append the text to `out`.
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut String) {
        if bytes.is_empty() {
            return;
        }
        let start = out.len();
        self.decode_raw(bytes, out);
        self.strip_bom(out, start);
    }

    fn decode_raw(&mut self, bytes: &[u8], out: &mut String) {
        let joined;
        let mut input: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            self.pending.extend_from_slice(bytes);
            joined = std::mem::take(&mut self.pending);
            &joined
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            input = &rest[len..];
                        }
                        None => {
                            // truncated sequence at the end: wait for more bytes
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// End of input: a held-back partial character becomes U+FFFD.
    pub fn flush_into(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.started = true;
            out.push(REPLACEMENT);
        }
    }

    fn strip_bom(&mut self, out: &mut String, start: usize) {
        if self.started || out.len() == start {
            return;
        }
        self.started = true;
        if out[start..].starts_with(BOM) {
            out.replace_range(start..start + BOM.len_utf8(), "");
        }
    }

    /// True when no partial character is held back.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
