use std::fmt;

/// Identifier of a game session (one match on one map).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identifier of a participant inside a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a placeable object (boat, sanctuary, flag marker).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceableId(pub u32);

impl fmt::Display for PlaceableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "placeable-{}", self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
///
/// The origin is the top-left corner; `y` grows downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position one tile away in the given orientation.
    pub fn step(self, orientation: Orientation) -> Self {
        let (dx, dy) = orientation.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbours, in [`Orientation::ALL`] order.
    pub fn neighbors(self) -> [Position; 4] {
        Orientation::ALL.map(|orientation| self.step(orientation))
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True when `other` shares an edge with this tile.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }

    /// True when the position lies inside a square map of side `size`.
    pub fn within(self, size: u32) -> bool {
        let size = size as i64;
        (0..size).contains(&(self.x as i64)) && (0..size).contains(&(self.y as i64))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction of a single-step move.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::Left,
        Orientation::Right,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (0, -1),
            Orientation::Down => (0, 1),
            Orientation::Left => (-1, 0),
            Orientation::Right => (1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_screen_coordinates() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step(Orientation::Up), Position::new(5, 4));
        assert_eq!(origin.step(Orientation::Down), Position::new(5, 6));
        assert_eq!(origin.step(Orientation::Left), Position::new(4, 5));
        assert_eq!(origin.step(Orientation::Right), Position::new(6, 5));
    }

    #[test]
    fn within_rejects_negative_and_edge_coordinates() {
        assert!(Position::new(0, 0).within(10));
        assert!(Position::new(9, 9).within(10));
        assert!(!Position::new(10, 0).within(10));
        assert!(!Position::new(-1, 3).within(10));
    }

    #[test]
    fn orientation_parses_case_insensitively() {
        assert_eq!("UP".parse::<Orientation>(), Ok(Orientation::Up));
        assert_eq!(Orientation::Right.as_ref(), "right");
    }
}
