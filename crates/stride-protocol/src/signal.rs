use serde_json::Value;

/// One classified event from the coach stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The server gave up on the request; the message is shown to the user.
    Error { message: String },

    /// The server is alive but still working (tool calls, reasoning).
    Ping,

    /// Incremental assistant text.
    Delta { text: String },

    /// The response is complete.
    Done,
}

impl Signal {
    /// Short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::Ping => "ping",
            Self::Delta { .. } => "delta",
            Self::Done => "done",
        }
    }

    /// Classify a parsed payload.
    ///
    /// The server serializes every field on every frame
    /// (`{"delta":"","done":false,"error":""}`), so a field only counts when
    /// it holds a truthy value. Checked in order: `error`, the three thinking
    /// markers (`ping`, `type: "ping"`, `status: "thinking"`), `delta`, `done`.
    pub fn classify(payload: &Value) -> Option<Signal> {
        let obj = payload.as_object()?;

        if let Some(message) = obj.get("error").and_then(text_of) {
            return Some(Signal::Error { message });
        }

        let ping = obj.get("ping").is_some_and(truthy)
            || obj.get("type").and_then(Value::as_str) == Some("ping")
            || obj.get("status").and_then(Value::as_str) == Some("thinking");
        if ping {
            return Some(Signal::Ping);
        }

        if let Some(text) = obj.get("delta").and_then(text_of) {
            return Some(Signal::Delta { text });
        }

        if obj.get("done").is_some_and(truthy) {
            return Some(Signal::Done);
        }

        None
    }
}

/// `null`, `false`, `0` and `""` count as absent.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text carried by a truthy field; non-strings render as their JSON text.
fn text_of(value: &Value) -> Option<String> {
    if !truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
