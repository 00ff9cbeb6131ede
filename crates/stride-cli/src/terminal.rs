//! Terminal rendering sink.
//!
//! Messages go to `out`; the loading/thinking indicators share a single
//! status line on `status` that is redrawn in place. The assistant text is
//! append-only within one answer, so an upsert only writes the new suffix.

use std::io::Write;

use stride_chat::RenderSink;

const CLEAR_LINE: &str = "\r\x1b[2K";
const LOADING: &str = "coach is typing…";
const THINKING: &str = "coach is thinking…";

pub struct TerminalSink<W: Write, E: Write> {
    out: W,
    status: E,
    /// Draw indicators at all (off when the status stream is not a TTY).
    indicators: bool,
    loading: bool,
    thinking: bool,
    /// Assistant text already written for the current answer.
    printed: String,
    assistant_open: bool,
}

impl<W: Write, E: Write> TerminalSink<W, E> {
    pub fn new(out: W, status: E, indicators: bool) -> Self {
        Self {
            out,
            status,
            indicators,
            loading: false,
            thinking: false,
            printed: String::new(),
            assistant_open: false,
        }
    }

    /// Close the current assistant line. Call after every request.
    pub fn end_turn(&mut self) {
        if self.assistant_open {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
        self.assistant_open = false;
        self.printed.clear();
    }

    fn redraw_status(&mut self) {
        if !self.indicators {
            return;
        }
        let label = if self.thinking {
            THINKING
        } else if self.loading {
            LOADING
        } else {
            ""
        };
        let _ = write!(self.status, "{CLEAR_LINE}{label}");
        let _ = self.status.flush();
    }

    fn close_assistant_line(&mut self) {
        if self.assistant_open {
            let _ = writeln!(self.out);
            self.assistant_open = false;
        }
    }

    #[cfg(test)]
    fn into_parts(self) -> (W, E) {
        (self.out, self.status)
    }
}

impl<W: Write + Send, E: Write + Send> RenderSink for TerminalSink<W, E> {
    fn render_user_message(&mut self, text: &str) {
        self.close_assistant_line();
        let _ = writeln!(self.out, "you> {text}");
        let _ = self.out.flush();
    }

    fn show_loading(&mut self) {
        self.loading = true;
        self.redraw_status();
    }

    fn hide_loading(&mut self) {
        self.loading = false;
        self.redraw_status();
    }

    fn show_thinking(&mut self) {
        self.thinking = true;
        self.redraw_status();
    }

    fn hide_thinking(&mut self) {
        self.thinking = false;
        self.redraw_status();
    }

    fn upsert_assistant_message(&mut self, accumulated: &str) {
        if !self.assistant_open {
            let _ = write!(self.out, "coach> ");
            self.assistant_open = true;
            self.printed.clear();
        }
        match accumulated.strip_prefix(self.printed.as_str()) {
            Some(suffix) => {
                let _ = write!(self.out, "{suffix}");
            }
            None => {
                // not an extension of what is on screen: print it afresh
                let _ = write!(self.out, "\ncoach> {accumulated}");
            }
        }
        let _ = self.out.flush();
        self.printed = accumulated.to_string();
    }

    fn render_error(&mut self, text: &str) {
        self.close_assistant_line();
        let _ = writeln!(self.out, "error> {text}");
        let _ = self.out.flush();
    }
}
