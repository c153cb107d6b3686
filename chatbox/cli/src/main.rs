//! Chatbox - Terminal Chat Widget
//!
//! A line-oriented front end for `chatbox-core`. Type a message and the
//! reply streams in below it; commands act on numbered messages.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (~/.config/chatbox/widget.toml if present)
//! chatbox
//!
//! # Point at another chat endpoint
//! chatbox --endpoint https://chat.example.com/chat
//!
//! # Fixed user id, verbose logging
//! CHATBOX_USER_ID=alice RUST_LOG=debug chatbox
//! ```
//!
//! Logs go to stderr; the transcript goes to stdout.

mod commands;
mod transcript;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatbox_core::{
    default_config_path, load_config_from_path, ChatWindow, ConfigOverrides, ContextAction,
    ExchangeOutcome, Feedback, MessageId, ProviderName, UserId,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use commands::{Command, HELP};
use transcript::Transcript;

/// Chatbox - streaming chat in the terminal
#[derive(Parser, Debug)]
#[command(name = "chatbox")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATBOX_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// User identifier sent with every request (random if unset)
    #[arg(short = 'u', long, env = "CHATBOX_USER_ID")]
    user_id: Option<String>,

    /// Chat endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// Provider hint (openai, claude, ollama)
    #[arg(short = 'p', long, value_parser = parse_provider)]
    provider: Option<ProviderName>,

    /// Number of follow-up suggestions to request
    #[arg(long, value_name = "N")]
    follow_ups: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CHATBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_provider(s: &str) -> Result<ProviderName, String> {
    ProviderName::parse(s).ok_or_else(|| format!("unknown provider {s:?}"))
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.endpoint {
            overrides = overrides.with_chat_endpoint(url.clone());
        }
        if let Some(provider) = self.provider {
            overrides = overrides.with_provider(provider);
        }
        if let Some(count) = self.follow_ups {
            overrides = overrides.with_follow_up_questions(count);
        }
        overrides
    }
}

/// Initialize logging to stderr with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chatbox={level},chatbox_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Write to stdout without blocking the runtime
async fn say(text: &str) {
    let mut stdout = tokio::io::stdout();
    let _ = stdout.write_all(text.as_bytes()).await;
    let _ = stdout.write_all(b"\n").await;
    let _ = stdout.flush().await;
}

/// Print new transcript text whenever the conversation changes
async fn render_loop(window: ChatWindow) {
    let mut changes = window.subscribe();
    let mut transcript = Transcript::new(window.config().follow_ups_enabled());
    let mut stdout = tokio::io::stdout();

    loop {
        let text = transcript.render(&window.messages());
        if !text.is_empty() {
            if stdout.write_all(text.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
        if changes.changed().await.is_err() {
            break;
        }
    }
}

/// Resolve a 1-based message number
fn message_at(window: &ChatWindow, number: usize) -> Option<MessageId> {
    window
        .messages()
        .get(number.checked_sub(1)?)
        .map(|m| m.id.clone())
}

/// Apply feedback and report the result
async fn feedback(window: &ChatWindow, number: usize, vote: Feedback) {
    let Some(id) = message_at(window, number) else {
        say(&format!("no message {number}")).await;
        return;
    };
    if !window.toggle_feedback(&id, vote) {
        say(&format!("message {number} cannot take feedback")).await;
        return;
    }
    if let Some(message) = window.store().get(&id) {
        let state = if message.is_liked() {
            "liked"
        } else if message.is_disliked() {
            "disliked"
        } else {
            "no vote"
        };
        say(&format!("[{number}] {state}")).await;
    }
}

/// Print a message's text for the terminal's own copy/share
async fn context_action(window: &ChatWindow, number: usize, action: ContextAction) {
    match message_at(window, number).and_then(|id| window.context_action(&id, action)) {
        Some(text) => say(&text).await,
        None => say(&format!("no message {number}")).await,
    }
}

/// Upload a photo from disk on a background task
async fn upload_photo(window: &ChatWindow, path: &Path) {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            say(&format!("cannot read {}: {e}", path.display())).await;
            return;
        }
    };
    let file_name = path
        .file_name()
        .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());

    let window = window.clone();
    tokio::spawn(async move {
        if let Err(e) = window.upload_photo(&file_name, bytes).await {
            say(&format!("photo upload failed: {e}")).await;
        }
    });
}

/// Report exchanges that ended without a complete reply
fn report(handle: tokio::task::JoinHandle<ExchangeOutcome>) {
    tokio::spawn(async move {
        match handle.await {
            Ok(ExchangeOutcome::StreamEnded {
                interrupted: true, ..
            }) => say("\n(reply interrupted)").await,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Exchange task failed"),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = load_config_from_path(args.config.clone().or_else(default_config_path))
        .context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;

    info!(
        source = %config.source(),
        chat_endpoint = %config.chat_endpoint,
        provider = config.provider_name.as_str(),
        "Configuration loaded"
    );

    let user_id = UserId::new(
        args.user_id
            .clone()
            .unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4())),
    );
    let window = ChatWindow::connect(config, user_id).context("Failed to open chat window")?;
    let render = tokio::spawn(render_loop(window.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Say(text) => report(window.spawn_send(text)),
            Command::Like(n) => feedback(&window, n, Feedback::Like).await,
            Command::Dislike(n) => feedback(&window, n, Feedback::Dislike).await,
            Command::Follow(n) => match window.spawn_follow_up(n - 1) {
                Some(handle) => report(handle),
                None => say(&format!("no follow-up {n}")).await,
            },
            Command::Copy(n) => context_action(&window, n, ContextAction::Copy).await,
            Command::Share(n) => context_action(&window, n, ContextAction::Share).await,
            Command::Photo(path) => upload_photo(&window, &path).await,
            Command::Help => say(HELP).await,
            Command::Quit => break,
            Command::Empty => {}
            Command::Invalid(hint) => say(&hint).await,
        }
    }

    let outcome = window.close().await;
    render.abort();
    say(&format!(
        "\nsession {} saved locally: {}, uploaded: {}",
        window.session_id(),
        outcome.persisted,
        outcome.uploaded
    ))
    .await;

    Ok(())
}
