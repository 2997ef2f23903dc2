//! Small line-driven host for trying the silence store by hand.
//!
//! Reads `<channel> <user> <message>` lines from stdin. `/silence true [secs]`
//! and `/silence false` from an admin silence or release the channel; any
//! other message gets a reply unless the channel is silenced.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use hush_utils::config::Config;
use hush_utils::hush_db::{CancellationToken, LoggingGate, Released, SilenceStore, RELEASE_ACTION};
use hush_utils::logging::start_tracing;
use hush_utils::policy::{capabilities_to_disable, is_admin, SilenceCommand, SILENCE_COMMAND};

/// What this host has switched on in every channel.
const ACTIONS: &[&str] = &["reply", RELEASE_ACTION];
const COMMANDS: &[&str] = &["help", SILENCE_COMMAND];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    start_tracing(&config.logs()?)?;
    let _watcher = config.init()?;

    let store = config.open_store(Arc::new(LoggingGate)).await?;
    let cancel = CancellationToken::new();
    let sweeper = config.spawn_sweeper(&store, cancel.clone())?;
    info!(target: "Hush", "Ready, reading <channel> <user> <message> lines");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Err(e) = handle(&config, &store, &cancel, &line).await {
                        error!(target: "Hush", "Error handling {line:?}, {e}");
                    }
                }
                None => break,
            },
        }
    }

    cancel.cancel();
    if let Some(sweeper) = sweeper {
        sweeper.await?;
    }
    Ok(())
}

async fn handle(
    config: &Config,
    store: &Arc<SilenceStore>,
    cancel: &CancellationToken,
    line: &str,
) -> anyhow::Result<()> {
    let mut parts = line.trim().splitn(3, ' ');
    let (Some(channel), Some(user)) = (parts.next(), parts.next()) else {
        return Err(anyhow!("Expected <channel> <user> <message>"));
    };
    let message = parts.next().unwrap_or_default();

    match SilenceCommand::parse(message) {
        Some(_) if !is_admin(user, &config.permissions()?) => {
            println!("[{channel}] {user} may not do that");
        }
        Some(SilenceCommand::Enable(duration)) => {
            let disabled =
                capabilities_to_disable(ACTIONS, COMMANDS, config.adjustment()?.disable_command);
            if store
                .add(channel, duration, disabled.actions, disabled.commands)
                .await?
            {
                println!("[{channel}] silenced");
                watch(config, store, cancel, channel)?;
            } else {
                println!("[{channel}] already silenced");
            }
        }
        Some(SilenceCommand::Disable) => {
            let lifted = store.remove(channel).await?;
            println!("[{channel}] {}", if lifted { "released" } else { "was not silenced" });
        }
        Some(SilenceCommand::Unknown(other)) => {
            println!("[{channel}] unknown silence option {other:?}");
        }
        None if store.is_silenced(channel).await? => {}
        None => println!("[{channel}] reply to {user}: {message}"),
    }
    Ok(())
}

/// Announces when the silence on `channel` ends on its own.
fn watch(
    config: &Config,
    store: &Arc<SilenceStore>,
    cancel: &CancellationToken,
    channel: &str,
) -> anyhow::Result<()> {
    let poll = config.silence()?.poll_interval();
    let store = Arc::clone(store);
    let cancel = cancel.clone();
    let channel = channel.to_string();
    tokio::spawn(async move {
        match store.wait_for_release(&channel, poll, &cancel).await {
            Ok(Released::Expired) => println!("[{channel}] silence expired"),
            Ok(_) => {}
            Err(e) => error!(target: "Hush", "Error watching {channel}, {e}"),
        }
    });
    Ok(())
}
