//! Turn selection rule.
//!
//! Rotation is round-robin over the session's fixed turn order, skipping
//! players who are no longer in the game.

use crate::state::{PlayerId, Session};

/// First player in turn order who is still in the game.
pub fn first_eligible(session: &Session) -> Option<PlayerId> {
    session
        .turn_order
        .iter()
        .copied()
        .find(|&player| session.is_in_game(player))
}

/// Player whose turn follows `current`.
///
/// Searches from the slot after `current`, wrapping around; `current` itself
/// is the last candidate. When nobody is in the game the first id of the turn
/// order is returned so rotation never stalls. `None` only for an empty order.
pub fn next_eligible(session: &Session, current: Option<PlayerId>) -> Option<PlayerId> {
    let order = &session.turn_order;
    let fallback = order.first().copied()?;
    let start = current
        .and_then(|current| order.iter().position(|&id| id == current))
        .map_or(0, |index| index + 1);

    let next = (0..order.len())
        .map(|offset| order[(start + offset) % order.len()])
        .find(|&player| session.is_in_game(player));
    Some(next.unwrap_or(fallback))
}
