use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use stride_chat::{ChatWidget, HttpBackend};
use stride_core::config::StrideConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod terminal;

use terminal::TerminalSink;

/// Chat with the Stride running coach.
#[derive(Debug, Parser)]
#[command(name = "stride-chat", version)]
struct Cli {
    /// Config file (default: STRIDE_CONFIG, then ~/.stride/stride.toml).
    #[arg(long)]
    config: Option<String>,

    /// Coach server base URL, overrides the config file.
    #[arg(long)]
    url: Option<String>,

    /// Wait for the whole answer instead of streaming it.
    #[arg(long)]
    no_stream: bool,

    /// Send this message and exit. Without it, every stdin line is sent.
    message: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stride_cli=info,stride_chat=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // load config: --config > STRIDE_CONFIG env > ~/.stride/stride.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("STRIDE_CONFIG").ok());
    let mut config = StrideConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        StrideConfig::default()
    });
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if cli.no_stream {
        config.client.stream = false;
    }

    let backend = HttpBackend::new(&config.client)?;
    let sink = TerminalSink::new(
        std::io::stdout(),
        std::io::stderr(),
        std::io::stderr().is_terminal(),
    );
    let mut widget = ChatWidget::new(backend, sink, config.client.stream);
    info!(
        url = %config.client.base_url,
        stream = config.client.stream,
        "stride chat client ready"
    );

    if let Some(message) = cli.message {
        let report = widget.send(&message).await;
        widget.sink_mut().end_turn();
        let failed = report.is_some_and(|r| r.outcome.is_error());
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        widget.send(&line).await;
        widget.sink_mut().end_turn();
    }

    Ok(ExitCode::SUCCESS)
}
