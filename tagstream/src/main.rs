// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tagstream::config;
use tagstream::conversation::Conversation;
use tagstream::session::{ChannelObserver, SessionObserver, SessionStatus, StreamingMode};
use tagstream::transport::ReplayTransport;

#[derive(Parser)]
#[command(
    name = "tagstream",
    about = "Replay a recorded response stream through the configured blocks and hooks"
)]
struct Cli {
    /// Path to the tagstream.yaml config file
    #[arg(long, default_value = "tagstream.yaml", env = "TAGSTREAM_CONFIG")]
    config: PathBuf,

    /// JSON array of chunk strings, as received from the transport
    #[arg(long, env = "TAGSTREAM_CHUNKS")]
    chunks: PathBuf,

    /// Override the configured streaming mode (auto, delta, cumulative)
    #[arg(long)]
    mode: Option<StreamingMode>,

    /// Request text recorded as the user message
    #[arg(long, default_value = "replay")]
    request: String,

    /// Delay between chunks, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Print session events as JSON lines before the final message
    #[arg(long)]
    events: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = config::FileSource::new(&cli.config);
    let config = match config::load_config(&source) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = %config.version,
        blocks = config.blocks.len(),
        hooks = config.hooks.len(),
        contract_hash = %config.contract_hash,
        "config loaded"
    );

    let chunks = match read_chunks(&cli.chunks).await {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::error!(path = %cli.chunks.display(), "failed to read chunks: {e}");
            std::process::exit(1);
        }
    };

    let transport = ReplayTransport::new(chunks)
        .with_delay(Some(Duration::from_millis(cli.delay_ms)));

    let mut settings = config.session.clone();
    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }

    let (observer, mut events) = ChannelObserver::new();
    let observer: Arc<dyn SessionObserver> = Arc::new(observer);

    let conversation = match Conversation::from_config(&config, Arc::new(transport)) {
        Ok(c) => c.with_settings(settings).with_observer(observer),
        Err(e) => {
            tracing::error!("invalid block configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = conversation.send(&cli.request).await;

    if cli.events {
        while let Ok(event) = events.try_recv() {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("failed to encode event: {e}"),
            }
        }
    }

    match result {
        Ok(outcome) => {
            if outcome.status == SessionStatus::Cancelled {
                tracing::warn!("session cancelled");
            }
            if let Some(message) = outcome.message {
                println!("{}", message.content());
            }
        }
        Err(e) => {
            tracing::error!("stream failed: {e}");
            if let Some(partial) = e.partial() {
                println!("{}", partial.content());
            }
            std::process::exit(1);
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ChunkFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("expected a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

async fn read_chunks(path: &std::path::Path) -> Result<Vec<String>, ChunkFileError> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
