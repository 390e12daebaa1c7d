//! Parlor - chat board games
//!
//! `parlor play` reads a simulated chat from stdin, one event per line:
//!
//! - `alice: /c4_play bob` opens a new group and invites bob
//! - `alice: /sudoku_play` opens a solo group
//! - `alice@g1: 4` or `alice@g1: /c4_repeat` talks inside group `g1`
//! - `alice@g1: /leave` removes alice from `g1`

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use parlor::{ChatTransport, Parlor, ParlorConfig, Request, SessionStore, SqliteStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ParlorConfig::from_file(path)?,
        None => ParlorConfig::default(),
    };
    if let Some(database) = cli.database {
        config = config.with_database_path(database);
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    match cli.command {
        Command::Play { bot_id } => {
            if let Some(bot_id) = bot_id {
                config = config.with_bot_id(bot_id);
            }
            run_play(config).await
        }
        Command::Sessions => list_sessions(&config),
    }
}

/// Prints replies instead of sending them.
#[derive(Debug, Default)]
struct ConsoleTransport {
    delivered: AtomicUsize,
}

impl ConsoleTransport {
    fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl ChatTransport for ConsoleTransport {
    fn send_text(&self, group_ref: &str, text: &str) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        println!("[{}]\n{}\n", group_ref, text);
    }

    fn display_name(&self, player: &str) -> String {
        player.to_string()
    }
}

/// One line of the simulated chat.
#[derive(Debug, PartialEq, Eq)]
enum Event {
    /// Text typed outside any game group.
    Direct { player: String, text: String },
    /// Text typed inside a group.
    InGroup { player: String, group: String, text: String },
}

fn parse_event(line: &str) -> Option<Event> {
    let (who, text) = line.split_once(':')?;
    let text = text.trim().to_string();
    match who.trim().split_once('@') {
        Some((player, group)) => Some(Event::InGroup {
            player: player.trim().to_string(),
            group: group.trim().to_string(),
            text,
        }),
        None => Some(Event::Direct {
            player: who.trim().to_string(),
            text,
        }),
    }
}

/// Group bookkeeping the real chat network would do.
#[derive(Debug, Default)]
struct Groups {
    members: HashMap<String, Vec<String>>,
    created: usize,
}

impl Groups {
    fn open(&mut self, members: Vec<String>) -> String {
        self.created += 1;
        let group = format!("g{}", self.created);
        self.members.insert(group.clone(), members);
        group
    }

    fn remove(&mut self, group: &str, player: &str) -> usize {
        let members = self.members.entry(group.to_string()).or_default();
        members.retain(|m| m != player);
        members.len()
    }
}

#[instrument(skip_all, fields(database = %config.database_path()))]
async fn run_play(config: ParlorConfig) -> Result<()> {
    let store = SqliteStore::open(config.database_path().clone())?;
    let console = Arc::new(ConsoleTransport::default());
    let parlor = Arc::new(Parlor::new(Arc::new(store), console.clone(), &config)?);
    info!("Reading chat events from stdin");

    let mut groups = Groups::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" {
            break;
        }
        let Some(event) = parse_event(line) else {
            warn!(line, "Unrecognised event");
            continue;
        };
        debug!(?event, "Event received");
        let before = console.delivered();
        let reply = dispatch(&parlor, &mut groups, event).await?;
        // Replies the parlor did not post anywhere go back to the sender.
        if let Some((player, text)) = reply
            && console.delivered() == before
        {
            println!("[to {}]\n{}\n", player, text);
        }
    }

    info!("Chat closed");
    Ok(())
}

/// Hands one event to the parlor. Returns the sender and the reply, if any.
async fn dispatch(parlor: &Arc<Parlor>, groups: &mut Groups, event: Event) -> Result<Option<(String, String)>> {
    let parlor = Arc::clone(parlor);
    match event {
        Event::Direct { player, text } => {
            let Some(Request::Play { game, invitee }) = Request::parse(&text) else {
                return Ok(Some((player, "Send /<game>_play to start".to_string())));
            };
            if game.seats() == 1 {
                let group = groups.open(vec![player.clone()]);
                let sender = player.clone();
                let reply = blocking(move || parlor.on_solo_play(game, &player, &group)).await?;
                Ok(Some((sender, reply)))
            } else if let Some(invitee) = invitee {
                let group = groups.open(vec![player.clone(), invitee.clone()]);
                let sender = player.clone();
                let reply = blocking(move || parlor.on_invite(game, &player, &invitee, &group)).await?;
                Ok(Some((sender, reply)))
            } else {
                Ok(Some((player, "Missing address".to_string())))
            }
        }
        Event::InGroup { player, group, text } if text == "/leave" => {
            let remaining = groups.remove(&group, &player);
            let membership =
                blocking(move || parlor.on_group_membership_changed(&group, &player, remaining, false)).await?;
            info!(deleted = membership.deleted, leave_group = membership.leave_group, "Member left");
            Ok(None)
        }
        Event::InGroup { player, group, text } => {
            let sender = player.clone();
            let reply = blocking(move || parlor.on_message(&group, &player, &text)).await?;
            Ok(reply.map(|reply| (sender, reply)))
        }
    }
}

async fn blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> Result<T> {
    tokio::task::spawn_blocking(work)
        .await
        .context("Session task failed")
}

fn list_sessions(config: &ParlorConfig) -> Result<()> {
    let store = SqliteStore::open(config.database_path().clone())?;
    let sessions = store.list()?;
    if sessions.is_empty() {
        println!("No sessions");
    }
    for session in sessions {
        let state = if session.is_running() { "playing" } else { "idle" };
        println!("{:<40} {:<12} {}", session.key().to_string(), session.group_ref(), state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        assert_eq!(
            parse_event("alice: /c4_play bob"),
            Some(Event::Direct {
                player: "alice".to_string(),
                text: "/c4_play bob".to_string()
            })
        );
        assert_eq!(
            parse_event("bob@g1: 4"),
            Some(Event::InGroup {
                player: "bob".to_string(),
                group: "g1".to_string(),
                text: "4".to_string()
            })
        );
        assert_eq!(parse_event("no separator"), None);
    }

    #[test]
    fn test_groups_count_remaining() {
        let mut groups = Groups::default();
        let group = groups.open(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(group, "g1");
        assert_eq!(groups.remove(&group, "a"), 1);
    }
}
