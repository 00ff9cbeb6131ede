use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrideError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrideError {
    /// Short error code string used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, StrideError>;
