use std::fmt;

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod belief;
pub mod config;
pub mod environment;
pub mod game;
pub mod knowledge;
pub mod map;

/// The cell the agent starts in, and the only cell it can climb out from.
pub const START: Position = Position { row: 0, col: 0 };

/// Represents a 2D grid coordinate, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns the position one step away in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant.
    /// The upper bound is checked by the grid, not here.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dr, dc) = direction.delta();
        Some(Position {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// The four facings, in counter-clockwise order starting from `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    /// (row, col) delta of a single step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn turn_left(self) -> Direction {
        Self::ALL[(self.index() + 1) % 4]
    }

    pub fn turn_right(self) -> Direction {
        Self::ALL[(self.index() + 3) % 4]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// A local, momentary observation available at the agent's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Percept {
    Breeze,
    Stench,
    Glitter,
    Bump,
    Scream,
}

impl Percept {
    pub const ALL: [Percept; 5] = [
        Percept::Breeze,
        Percept::Stench,
        Percept::Glitter,
        Percept::Bump,
        Percept::Scream,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Percept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Percept::Breeze => "Breeze",
            Percept::Stench => "Stench",
            Percept::Glitter => "Glitter",
            Percept::Bump => "Bump",
            Percept::Scream => "Scream",
        };
        f.write_str(label)
    }
}

/// A set of percepts, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerceptSet(u8);

impl PerceptSet {
    pub const fn empty() -> Self {
        PerceptSet(0)
    }

    pub fn insert(&mut self, percept: Percept) {
        self.0 |= percept.bit();
    }

    pub fn with(mut self, percept: Percept) -> Self {
        self.insert(percept);
        self
    }

    pub fn union(self, other: PerceptSet) -> Self {
        PerceptSet(self.0 | other.0)
    }

    pub fn contains(&self, percept: Percept) -> bool {
        self.0 & percept.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the contained percepts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Percept> + '_ {
        Percept::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl FromIterator<Percept> for PerceptSet {
    fn from_iter<I: IntoIterator<Item = Percept>>(iter: I) -> Self {
        let mut set = PerceptSet::empty();
        for percept in iter {
            set.insert(percept);
        }
        set
    }
}

impl fmt::Display for PerceptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let labels: Vec<String> = self.iter().map(|p| p.to_string()).collect();
        f.write_str(&labels.join(", "))
    }
}
