//! Chat lifecycle: turns chat events into session operations.

use parlor_rules::{
    BoardVariant, ChainReaction, Checkers, Chess, Connect4, GameKind, Lines, Reversi, Sudoku,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigError, ParlorConfig};
use crate::locks::KeyLocks;
use crate::narration::{self, DisplayNames};
use crate::{PlayerId, Session, SessionError, SessionKey, SessionManager, SessionStore};

/// Outbound side of the chat network.
pub trait ChatTransport: Send + Sync {
    /// Posts `text` into a group. Delivery failures are the transport's
    /// concern.
    fn send_text(&self, group_ref: &str, text: &str);

    /// Human readable name of a player.
    fn display_name(&self, player: &str) -> String;
}

struct TransportNames(Arc<dyn ChatTransport>);

impl DisplayNames for TransportNames {
    fn display_name(&self, player: &str) -> String {
        self.0.display_name(player)
    }
}

/// In-group commands shared by every game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// Start another game in the group (`/x_new`, `/x_play` for solo games).
    New,
    /// Give up the running game.
    Surrender,
    /// Show the board again.
    Repeat,
}

/// A slash command addressed to the parlor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `/x_play [invitee]`: invite a friend, or start a solo game.
    Play {
        /// Game named by the prefix.
        game: GameKind,
        /// Second player, if given.
        invitee: Option<PlayerId>,
    },
    /// `/x_new`, `/x_surrender`, `/x_repeat`.
    Command {
        /// Game named by the prefix.
        game: GameKind,
        /// What to do.
        command: Command,
    },
}

impl Request {
    /// Parses `/prefix_verb [argument]`. Anything else is not a request.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let (prefix, verb) = words.next()?.strip_prefix('/')?.rsplit_once('_')?;
        let game = GameKind::from_prefix(prefix)?;
        let argument = words.next().map(str::to_string);
        match verb {
            "play" => Some(Request::Play { game, invitee: argument }),
            _ => verb
                .parse::<Command>()
                .ok()
                .map(|command| Request::Command { game, command }),
        }
    }
}

/// What happened after a member left a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Membership {
    /// The group's session was deleted.
    pub deleted: bool,
    /// The bot should leave the group too.
    pub leave_group: bool,
}

/// Type-erased [`SessionManager`], one per hosted game.
trait GameDesk: Send + Sync {
    fn create(&self, key: SessionKey, group_ref: &str, first_mover: &str) -> Result<String, SessionError>;
    fn start(&self, key: &SessionKey, player: &str) -> Result<String, SessionError>;
    fn restart(&self, key: &SessionKey) -> Result<String, SessionError>;
    fn submit_move(&self, key: &SessionKey, player: &str, token: &str) -> Result<String, SessionError>;
    fn resign(&self, key: &SessionKey, player: &str) -> Result<String, SessionError>;
    fn repeat(&self, key: &SessionKey) -> Result<String, SessionError>;
    fn dissolve(&self, key: &SessionKey) -> Result<bool, SessionError>;
    fn looks_like_move(&self, text: &str) -> bool;
}

impl<V: BoardVariant> GameDesk for SessionManager<V> {
    fn create(&self, key: SessionKey, group_ref: &str, first_mover: &str) -> Result<String, SessionError> {
        SessionManager::create(self, key, group_ref, first_mover)
    }

    fn start(&self, key: &SessionKey, player: &str) -> Result<String, SessionError> {
        SessionManager::start(self, key, player)
    }

    fn restart(&self, key: &SessionKey) -> Result<String, SessionError> {
        SessionManager::restart(self, key)
    }

    fn submit_move(&self, key: &SessionKey, player: &str, token: &str) -> Result<String, SessionError> {
        SessionManager::submit_move(self, key, player, token)
    }

    fn resign(&self, key: &SessionKey, player: &str) -> Result<String, SessionError> {
        SessionManager::resign(self, key, player)
    }

    fn repeat(&self, key: &SessionKey) -> Result<String, SessionError> {
        SessionManager::repeat(self, key)
    }

    fn dissolve(&self, key: &SessionKey) -> Result<bool, SessionError> {
        SessionManager::dissolve(self, key)
    }

    fn looks_like_move(&self, text: &str) -> bool {
        V::looks_like_move(text)
    }
}

/// The chat-facing entry point.
///
/// Every handler returns the reply it produced. Replies that belong to a
/// game group are also posted there through the [`ChatTransport`].
pub struct Parlor {
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn ChatTransport>,
    names: Arc<dyn DisplayNames>,
    bot_id: PlayerId,
    desks: HashMap<GameKind, Box<dyn GameDesk>>,
}

impl Parlor {
    /// Builds a parlor hosting the games enabled in `config`.
    #[instrument(skip_all, fields(bot_id = %config.bot_id()))]
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn ChatTransport>,
        config: &ParlorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let names: Arc<dyn DisplayNames> = Arc::new(TransportNames(Arc::clone(&transport)));
        let locks = KeyLocks::new();
        let rows = *config.chain_reaction_rows();
        let cols = *config.chain_reaction_cols();

        let mut desks: HashMap<GameKind, Box<dyn GameDesk>> = HashMap::new();
        for &game in config.enabled_games() {
            let desk: Box<dyn GameDesk> = match game {
                GameKind::ChainReaction => Box::new(
                    desk::<ChainReaction>(&store, &names, &locks).with_board_factory(move || {
                        ChainReaction::with_size(rows, cols).unwrap_or_else(ChainReaction::new)
                    }),
                ),
                GameKind::Reversi => Box::new(desk::<Reversi>(&store, &names, &locks)),
                GameKind::Connect4 => Box::new(desk::<Connect4>(&store, &names, &locks)),
                GameKind::Checkers => Box::new(desk::<Checkers>(&store, &names, &locks)),
                GameKind::Chess => Box::new(desk::<Chess>(&store, &names, &locks)),
                GameKind::Sudoku => Box::new(desk::<Sudoku>(&store, &names, &locks)),
                GameKind::Lines => Box::new(desk::<Lines>(&store, &names, &locks)),
            };
            desks.insert(game, desk);
        }
        info!(games = desks.len(), "Parlor ready");

        Ok(Self {
            store,
            transport,
            names,
            bot_id: config.bot_id().clone(),
            desks,
        })
    }

    fn deliver(&self, group_ref: &str, text: &str) {
        self.transport.send_text(group_ref, text);
    }

    fn session_in(&self, group_ref: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.store.find_by_group(group_ref)?)
    }

    fn report(&self, game: GameKind, e: &SessionError) -> String {
        match e {
            SessionError::Store(_) => error!(error = %e, class = %e.class(), "Session operation failed"),
            _ => debug!(error = %e, class = %e.class(), "Session operation refused"),
        }
        narration::error_text(game, e)
    }

    /// A player asked to play `game` with `invitee` in the new group
    /// `group_ref`. Solo games ignore the invitee.
    #[instrument(skip(self))]
    pub fn on_invite(&self, game: GameKind, initiator: &str, invitee: &str, group_ref: &str) -> String {
        if game.seats() == 1 {
            return self.on_solo_play(game, initiator, group_ref);
        }
        let Some(desk) = self.desks.get(&game) else {
            return narration::unavailable(game);
        };
        if invitee == self.bot_id {
            return self.report(game, &SessionError::BotInvited);
        }
        if initiator == invitee {
            return self.report(game, &SessionError::SelfPlay);
        }

        let key = SessionKey::pair(game, initiator, invitee);
        match desk.create(key.clone(), group_ref, initiator) {
            Ok(text) => {
                self.deliver(group_ref, &text);
                text
            }
            Err(SessionError::SessionExists) => {
                let text = narration::existing_group(invitee, self.names.as_ref());
                match self.store.get(&key) {
                    Ok(Some(existing)) => self.deliver(existing.group_ref(), &text),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Could not look up existing group"),
                }
                text
            }
            Err(e) => self.report(game, &e),
        }
    }

    /// A player started a solo game from `group_ref`. An existing session
    /// gets a fresh board in the group it already has.
    #[instrument(skip(self))]
    pub fn on_solo_play(&self, game: GameKind, player: &str, group_ref: &str) -> String {
        if game.seats() != 1 {
            return narration::missing_invitee();
        }
        let Some(desk) = self.desks.get(&game) else {
            return narration::unavailable(game);
        };

        let key = SessionKey::solo(game, player);
        match self.open_solo(desk.as_ref(), &key, player, group_ref) {
            Ok((group, text)) => {
                self.deliver(&group, &text);
                text
            }
            Err(e) => self.report(game, &e),
        }
    }

    /// Restarts or creates a solo session. Returns the group the reply
    /// belongs in.
    fn open_solo(
        &self,
        desk: &dyn GameDesk,
        key: &SessionKey,
        player: &str,
        group_ref: &str,
    ) -> Result<(String, String), SessionError> {
        if let Some(existing) = self.store.get(key)? {
            let text = desk.restart(key)?;
            return Ok((existing.group_ref().clone(), text));
        }
        if let Some(occupant) = self.session_in(group_ref)? {
            debug!(occupant = %occupant.key(), "Group already hosts a session");
            return Err(SessionError::GroupTaken);
        }
        let text = desk.create(key.clone(), group_ref, player)?;
        Ok((group_ref.to_string(), text))
    }

    /// Ordinary text in a group. Returns `None` when the text is not a move
    /// for a running game there, so other handlers can see it.
    #[instrument(skip(self))]
    pub fn on_move_text(&self, group_ref: &str, player: &str, text: &str) -> Option<String> {
        let session = match self.session_in(group_ref) {
            Ok(Some(session)) if session.is_running() => session,
            Ok(_) => return None,
            Err(e) => {
                error!(error = %e, "Session lookup failed");
                return None;
            }
        };
        let game = session.key().game();
        let desk = self.desks.get(&game)?;
        let token = text.trim();
        if !desk.looks_like_move(token) {
            return None;
        }

        let reply = desk
            .submit_move(session.key(), player, token)
            .unwrap_or_else(|e| self.report(game, &e));
        self.deliver(group_ref, &reply);
        Some(reply)
    }

    /// A `/x_new`, `/x_surrender` or `/x_repeat` command sent in a group.
    #[instrument(skip(self))]
    pub fn on_command(&self, group_ref: &str, player: &str, game: GameKind, command: Command) -> String {
        let reply = self
            .run_command(group_ref, player, game, command)
            .unwrap_or_else(|e| self.report(game, &e));
        self.deliver(group_ref, &reply);
        reply
    }

    fn run_command(
        &self,
        group_ref: &str,
        player: &str,
        game: GameKind,
        command: Command,
    ) -> Result<String, SessionError> {
        let session = self.session_in(group_ref)?.ok_or(SessionError::UnknownSession)?;
        let key = session.key();
        if key.game() != game || !key.contains(player) {
            return Err(SessionError::NotAParty);
        }
        let desk = self.desks.get(&game).ok_or(SessionError::UnknownSession)?;

        match command {
            Command::New if key.is_solo() => desk.restart(key),
            Command::New => desk.start(key, player),
            Command::Surrender => desk.resign(key, player),
            Command::Repeat => desk.repeat(key),
        }
    }

    /// Someone left a group. The session is deleted when the bot itself, or
    /// one of the players, was removed, or when too few members remain.
    ///
    /// `remaining_members` counts the people left besides the bot.
    #[instrument(skip(self))]
    pub fn on_group_membership_changed(
        &self,
        group_ref: &str,
        removed: &str,
        remaining_members: usize,
        removed_is_self: bool,
    ) -> Membership {
        let session = match self.session_in(group_ref) {
            Ok(Some(session)) => session,
            Ok(None) => return Membership::default(),
            Err(e) => {
                error!(error = %e, "Session lookup failed");
                return Membership::default();
            }
        };
        let key = session.key();
        let dissolve = removed_is_self || key.contains(removed) || remaining_members < key.game().seats();
        if !dissolve {
            return Membership::default();
        }

        let deleted = match self.desks.get(&key.game()) {
            Some(desk) => desk.dissolve(key),
            None => self.store.delete(key).map_err(SessionError::from),
        };
        match deleted {
            Ok(deleted) => {
                info!(key = %key, removed, "Group dissolved");
                Membership {
                    deleted,
                    leave_group: !removed_is_self,
                }
            }
            Err(e) => {
                error!(key = %key, error = %e, "Could not delete session");
                Membership::default()
            }
        }
    }

    /// Routes a message typed in a group: commands first, then moves.
    pub fn on_message(&self, group_ref: &str, player: &str, text: &str) -> Option<String> {
        match Request::parse(text) {
            Some(Request::Command { game, command }) => Some(self.on_command(group_ref, player, game, command)),
            Some(Request::Play { game, .. }) if game.seats() == 1 => Some(self.on_solo_play(game, player, group_ref)),
            Some(Request::Play { .. }) => None,
            None => self.on_move_text(group_ref, player, text),
        }
    }
}

fn desk<V: BoardVariant>(
    store: &Arc<dyn SessionStore>,
    names: &Arc<dyn DisplayNames>,
    locks: &KeyLocks,
) -> SessionManager<V> {
    SessionManager::new(Arc::clone(store), Arc::clone(names)).with_locks(locks.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            Request::parse("/c4_play bob"),
            Some(Request::Play {
                game: GameKind::Connect4,
                invitee: Some("bob".to_string())
            })
        );
        assert_eq!(
            Request::parse("/chr_surrender"),
            Some(Request::Command {
                game: GameKind::ChainReaction,
                command: Command::Surrender
            })
        );
        assert_eq!(
            Request::parse("/sudoku_play"),
            Some(Request::Play {
                game: GameKind::Sudoku,
                invitee: None
            })
        );
        assert_eq!(Request::parse("/c4_dance"), None);
        assert_eq!(Request::parse("/go_new"), None);
        assert_eq!(Request::parse("e4"), None);
    }
}
