/// Failures between the client and the coach endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The response body broke off while it was being read.
    #[error("Stream read failed: {0}")]
    Read(String),
}

impl ChatError {
    /// Text shown to the user after the `Error: ` prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { reason, .. } => reason.clone(),
            Self::Http(e) => e.to_string(),
            Self::Read(detail) => detail.clone(),
        }
    }
}
