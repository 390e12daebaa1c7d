//! Parlor - persistent turn-based board games for chat groups
//!
//! Players invite each other with a slash command, the bot opens a group
//! for the pair and every message that looks like a move is applied to the
//! session's board. Sessions outlive single games and are stored in SQLite.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] with [`SqliteStore`] and [`MemoryStore`]
//! - **Manager**: [`SessionManager`] runs one game's sessions under per-key locks
//! - **Adapter**: [`Parlor`] maps chat events onto managers and posts replies
//!   through a [`ChatTransport`]
//!
//! # Example
//!
//! ```
//! use parlor::{MemoryStore, PlainNames, SessionKey, SessionManager};
//! use parlor_rules::{Connect4, GameKind};
//! use std::sync::Arc;
//!
//! let manager: SessionManager<Connect4> =
//!     SessionManager::new(Arc::new(MemoryStore::new()), Arc::new(PlainNames));
//! let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");
//! manager.create(key.clone(), "group-1", "alice")?;
//! let reply = manager.submit_move(&key, "alice", "4")?;
//! assert!(reply.contains("bob it's your turn"));
//! # Ok::<(), parlor::SessionError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod adapter;
mod config;
mod db;
mod error;
mod locks;
mod manager;
mod narration;
mod store;

// Crate-level exports - Sessions and storage
pub use db::{NewSessionRow, SessionRow, SqliteStore, StoreError};
pub use store::{GroupRef, MemoryStore, PlayerId, Session, SessionKey, SessionStore};

// Crate-level exports - Session management
pub use error::{ErrorClass, SessionError};
pub use locks::KeyLocks;
pub use manager::{BoardFactory, SessionManager};
pub use narration::{DisplayNames, PlainNames};

// Crate-level exports - Chat lifecycle
pub use adapter::{ChatTransport, Command, Membership, Parlor, Request};
pub use config::{ConfigError, ParlorConfig};
