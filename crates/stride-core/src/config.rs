use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Coach API defaults — must match the dashboard server routes
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MESSAGE_PATH: &str = "/coach/message";
pub const DEFAULT_STREAM_PATH: &str = "/coach/stream";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300; // agent runs with tool calls can be slow

/// Top-level config (stride.toml + STRIDE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrideConfig {
    #[serde(default)]
    pub client: ClientConfig,
}

/// Coach chat endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_message_path")]
    pub message_path: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    /// Use the streaming endpoint (default: true).
    /// Override with env var: STRIDE_CLIENT__STREAM=false
    #[serde(default = "bool_true")]
    pub stream: bool,
    /// Limit on establishing the connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Limit on the gap between two reads. A stream that keeps sending may
    /// run for as long as it needs.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            message_path: default_message_path(),
            stream_path: default_stream_path(),
            stream: true,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Full URL of the one-shot endpoint.
    pub fn message_url(&self) -> String {
        join_url(&self.base_url, &self.message_path)
    }

    /// Full URL of the streaming endpoint.
    pub fn stream_url(&self) -> String {
        join_url(&self.base_url, &self.stream_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn bool_true() -> bool {
    true
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_message_path() -> String {
    DEFAULT_MESSAGE_PATH.to_string()
}
fn default_stream_path() -> String {
    DEFAULT_STREAM_PATH.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

impl StrideConfig {
    /// Load config from a TOML file with STRIDE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.stride/stride.toml
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        tracing::debug!(path = %path, "loading config");

        let config: StrideConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("STRIDE_").split("__"))
            .extract()
            .map_err(|e| crate::error::StrideError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.stride/stride.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_point_at_local_coach() {
        let cfg = StrideConfig::default();
        assert!(cfg.client.stream);
        assert_eq!(cfg.client.stream_url(), "http://127.0.0.1:8080/coach/stream");
        assert_eq!(
            cfg.client.message_url(),
            "http://127.0.0.1:8080/coach/message"
        );
    }

    #[test]
    fn url_join_tolerates_slashes() {
        let cfg = ClientConfig {
            base_url: "http://coach.local/".to_string(),
            stream_path: "coach/stream".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(cfg.stream_url(), "http://coach.local/coach/stream");
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = StrideConfig::load(Some("does-not-exist.toml")).expect("load");
            assert_eq!(cfg.client.base_url, DEFAULT_BASE_URL);
            assert_eq!(cfg.client.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
            assert_eq!(cfg.client.read_timeout_secs, DEFAULT_READ_TIMEOUT_SECS);
            Ok(())
        });
    }

    #[test]
    fn file_and_env_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "stride.toml",
                r#"
                [client]
                base_url = "http://10.0.0.5:9000"
                stream = true
                "#,
            )?;
            jail.set_env("STRIDE_CLIENT__STREAM", "false");

            let cfg = StrideConfig::load(Some("stride.toml")).expect("load");
            assert_eq!(cfg.client.base_url, "http://10.0.0.5:9000");
            assert!(!cfg.client.stream, "env must override file");
            assert_eq!(cfg.client.stream_path, DEFAULT_STREAM_PATH);
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("stride.toml", "[client]\nread_timeout_secs = \"soon\"\n")?;
            let err = StrideConfig::load(Some("stride.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }
}
