//! Cardinal directions and the aggregate shorthand used by tile data.
//!
//! Row 0 is the bottom row in world space, so NORTH moves to `row + 1`
//! and EAST moves to `col + 1`.

use std::fmt;
use std::str::FromStr;

/// One of the four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in propagation order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Dense index, usable for `[T; 4]` tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// (row, col) offset of the neighbor in this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (1, 0),
            Direction::East => (0, 1),
            Direction::South => (-1, 0),
            Direction::West => (0, -1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of directions, as named by a single constraint in tile data.
///
/// Parses the plain direction names plus the shorthand `ALL`,
/// `HORIZONTAL`, `VERTICAL` and `N_<DIR>` ("every direction except").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet { bits: 0 };
    pub const ALL: DirectionSet = DirectionSet { bits: 0b1111 };

    pub fn single(direction: Direction) -> Self {
        Self {
            bits: 1 << direction.index(),
        }
    }

    pub fn horizontal() -> Self {
        Self::single(Direction::East).with(Direction::West)
    }

    pub fn vertical() -> Self {
        Self::single(Direction::North).with(Direction::South)
    }

    /// Every direction except `direction`.
    pub fn all_except(direction: Direction) -> Self {
        Self {
            bits: Self::ALL.bits & !(1 << direction.index()),
        }
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.bits |= 1 << direction.index();
        self
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.bits & (1 << direction.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

/// Error for a direction keyword that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction '{}'", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for DirectionSet {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let set = match s.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Self::single(Direction::North),
            "SOUTH" => Self::single(Direction::South),
            "EAST" => Self::single(Direction::East),
            "WEST" => Self::single(Direction::West),
            "ALL" => Self::ALL,
            "HORIZONTAL" => Self::horizontal(),
            "VERTICAL" => Self::vertical(),
            "N_NORTH" => Self::all_except(Direction::North),
            "N_SOUTH" => Self::all_except(Direction::South),
            "N_EAST" => Self::all_except(Direction::East),
            "N_WEST" => Self::all_except(Direction::West),
            _ => return Err(UnknownDirection(s.to_string())),
        };
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_are_involutive() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            let (dr, dc) = d.offset();
            let (or, oc) = d.opposite().offset();
            assert_eq!((dr + or, dc + oc), (0, 0));
        }
    }

    #[test]
    fn test_parse_shorthand() {
        let all: DirectionSet = "ALL".parse().unwrap();
        assert_eq!(all.iter().count(), 4);

        let h: DirectionSet = "horizontal".parse().unwrap();
        assert!(h.contains(Direction::East) && h.contains(Direction::West));
        assert!(!h.contains(Direction::North));

        let v: DirectionSet = "VERTICAL".parse().unwrap();
        assert_eq!(
            v.iter().collect::<Vec<_>>(),
            vec![Direction::North, Direction::South]
        );

        for (keyword, excluded) in [
            ("N_NORTH", Direction::North),
            ("N_SOUTH", Direction::South),
            ("N_EAST", Direction::East),
            ("N_WEST", Direction::West),
        ] {
            let set: DirectionSet = keyword.parse().unwrap();
            assert!(!set.contains(excluded), "{} kept {}", keyword, excluded);
            assert_eq!(set.iter().count(), 3, "{} should keep three directions", keyword);
            assert_eq!(set, DirectionSet::all_except(excluded));
        }
    }

    #[test]
    fn test_parse_unknown_direction() {
        let err = "UP".parse::<DirectionSet>().unwrap_err();
        assert_eq!(err, UnknownDirection("UP".to_string()));
    }
}
