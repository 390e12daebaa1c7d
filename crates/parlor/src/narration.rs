//! Chat text produced for players.

use chrono::TimeDelta;
use parlor_rules::{BoardVariant, GameKind, Outcome, Seat};

use crate::{Session, SessionError};

/// Resolves chat identities to the names shown in narration.
pub trait DisplayNames: Send + Sync {
    /// Human readable name of a player.
    fn display_name(&self, player: &str) -> String;
}

/// Uses player ids as their names.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainNames;

impl DisplayNames for PlainNames {
    fn display_name(&self, player: &str) -> String {
        player.to_string()
    }
}

fn play_again(game: GameKind) -> String {
    let verb = if game.seats() == 1 { "play" } else { "new" };
    format!("▶️ Play again? /{}_{}", game.command_prefix(), verb)
}

fn seat_line<V: BoardVariant>(session: &Session, seat: Seat, names: &dyn DisplayNames) -> String {
    let name = session
        .player_in(seat)
        .map(|p| names.display_name(p))
        .unwrap_or_default();
    format!("{}: {}", V::seat_symbol(seat), name)
}

/// Board plus whose turn it is.
pub fn turn_prompt<V: BoardVariant>(board: &V, session: &Session, names: &dyn DisplayNames) -> String {
    let mut text = String::new();
    if let Some(notice) = board.notice() {
        text.push_str(&notice);
        text.push_str("\n\n");
    }
    if let Some(seat) = board.turn()
        && !session.key().is_solo()
    {
        let name = session
            .player_in(seat)
            .map(|p| names.display_name(p))
            .unwrap_or_default();
        text.push_str(&format!("{} {} it's your turn...\n\n", V::seat_symbol(seat), name));
    }
    text.push_str(&board.render());
    text
}

/// Announcement for a fresh game.
pub fn game_started<V: BoardVariant>(board: &V, session: &Session, names: &dyn DisplayNames) -> String {
    let mut text = String::from("▶️ Game started!\n");
    if !session.key().is_solo() {
        text.push_str(&seat_line::<V>(session, Seat::First, names));
        text.push('\n');
        text.push_str(&seat_line::<V>(session, Seat::Second, names));
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&turn_prompt(board, session, names));
    text
}

/// Invitation posted to a new two-player group.
pub fn invitation<V: BoardVariant>(board: &V, session: &Session, invitee: &str, names: &dyn DisplayNames) -> String {
    let initiator = session
        .player_in(Seat::First)
        .map(|p| names.display_name(p))
        .unwrap_or_default();
    format!(
        "Hello {},\nYou have been invited by {} to play {}\n\n{}\n{}\n\n{}",
        names.display_name(invitee),
        initiator,
        V::KIND.title(),
        seat_line::<V>(session, Seat::First, names),
        seat_line::<V>(session, Seat::Second, names),
        turn_prompt(board, session, names),
    )
}

/// Greeting posted to a new single-player group.
pub fn solo_welcome<V: BoardVariant>(board: &V, session: &Session, names: &dyn DisplayNames) -> String {
    format!(
        "Hello {}, in this group you can play {}.\n\n{}",
        names.display_name(session.first_mover()),
        V::KIND.title(),
        turn_prompt(board, session, names),
    )
}

/// Final result of a game. `elapsed` is reported for solved puzzles.
pub fn game_over<V: BoardVariant>(
    board: &V,
    session: &Session,
    names: &dyn DisplayNames,
    elapsed: Option<TimeDelta>,
) -> String {
    let headline = match (board.result(), session.key().is_solo()) {
        (Outcome::Win(_), true) => {
            let mut line = String::from("🏆 Game over. You Win!!!");
            if let Some(elapsed) = elapsed {
                let seconds = elapsed.num_seconds().max(0);
                line.push_str(&format!("\n⏱️ {}:{:02}", seconds / 60, seconds % 60));
            }
            line
        }
        (Outcome::Win(seat), false) => {
            let name = session
                .player_in(seat)
                .map(|p| names.display_name(p))
                .unwrap_or_default();
            format!("🏆 Game over.\n{} {} Wins!!!", V::seat_symbol(seat), name)
        }
        (_, true) => "🏁 Game over.".to_string(),
        (_, false) => "🤝 Game over.\nIt is a draw!".to_string(),
    };
    format!("{}\n\n{}\n\n{}", headline, board.render(), play_again(V::KIND))
}

/// A player gave up.
pub fn surrender(game: GameKind, player: &str, names: &dyn DisplayNames) -> String {
    format!(
        "🏳️ Game Over.\n{} surrenders.\n\n{}",
        names.display_name(player),
        play_again(game)
    )
}

/// The stored board could not be read and was dropped.
pub fn state_lost(game: GameKind) -> String {
    format!(
        "⚠️ The saved game could not be read and was discarded.\n\n{}",
        play_again(game)
    )
}

/// Reply to an invitation without an invitee.
pub fn missing_invitee() -> String {
    "Missing address".to_string()
}

/// Reply for a game this parlor does not host.
pub fn unavailable(game: GameKind) -> String {
    format!("{} is not available here", game.title())
}

/// Reminder that the players already share a group.
pub fn existing_group(other: &str, names: &dyn DisplayNames) -> String {
    format!("You already have a game group with {}", names.display_name(other))
}

/// Player-facing text for an error.
pub fn error_text(game: GameKind, error: &SessionError) -> String {
    match error {
        SessionError::NotAParty | SessionError::UnknownSession => {
            "This is not your game group".to_string()
        }
        SessionError::NotYourTurn => "⏳ It's not your turn".to_string(),
        SessionError::Move(reason) => format!("❌ Invalid move! {}", reason),
        SessionError::AlreadyRunning => "There is a game running already".to_string(),
        SessionError::NoGame => format!("There is no game running. {}", play_again(game)),
        SessionError::SessionExists => "You already have a game group for this".to_string(),
        SessionError::GroupTaken => "This group already has a game, start a new one elsewhere".to_string(),
        SessionError::SelfPlay => "You can't play with yourself".to_string(),
        SessionError::BotInvited => "Sorry, I don't want to play".to_string(),
        SessionError::Corrupted(_) => state_lost(game),
        SessionError::Store(_) => "⚠️ Something went wrong, please try again later".to_string(),
    }
}
