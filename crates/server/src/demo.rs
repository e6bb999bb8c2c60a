//! The demo session the server hosts.

use anyhow::Result;

use game_core::{
    DiceKind, GameMode, GridLayout, Placeable, PlaceableId, PlaceableKind, Player, PlayerId,
    Position, Session, SessionId,
};

pub const SESSION: SessionId = SessionId(1);

/// Small arena with a lake, a door, and a teleport pair.
const ARENA: &[&str] = &[
    "T.....*.",
    "..##..*.",
    "..#.~~..",
    "....~~D.",
    ".d..~~..",
    "..*.....",
    ".##...#.",
    "......T.",
];

pub fn session(seed: u64) -> Result<(Session, GridLayout)> {
    let layout = GridLayout::from_rows(ARENA)?;
    let session = Session::new(SESSION, layout.size(), GameMode::Elimination)
        .with_seed(seed)
        .with_player(
            Player::new(PlayerId(1), Position::new(1, 0))
                .with_health(8)
                .scripted(),
        )
        .with_player(
            Player::new(PlayerId(2), Position::new(7, 7))
                .with_health(8)
                .with_dice(DiceKind::D6, DiceKind::D6)
                .scripted(),
        )
        .with_player(
            Player::new(PlayerId(3), Position::new(0, 7))
                .with_health(10)
                .with_attack(3)
                .with_defense(5)
                .scripted(),
        )
        .with_placeable(Placeable::new(
            PlaceableId(1),
            PlaceableKind::Boat,
            Position::new(3, 3),
        ))
        .with_placeable(Placeable::new(
            PlaceableId(2),
            PlaceableKind::Sanctuary,
            Position::new(4, 5),
        ));
    Ok((session, layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_arena_is_valid() {
        let (session, layout) = session(1).unwrap();
        assert_eq!(layout.size(), 8);
        assert_eq!(session.turn_order, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
        for player in session.players.values() {
            assert!(layout.tile(player.position).is_some_and(|t| t.is_spawnable()));
        }
        assert_eq!(
            layout.teleport_destination(Position::new(0, 0)),
            Some(Position::new(6, 7))
        );
    }
}
