use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::Position;

/// A proposition the agent has asserted about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fact {
    Safe(Position),
    MaybePit(Position),
    MaybeWumpus(Position),
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Safe(pos) => write!(f, "Safe({pos})"),
            Fact::MaybePit(pos) => write!(f, "MaybePit({pos})"),
            Fact::MaybeWumpus(pos) => write!(f, "MaybeWumpus({pos})"),
        }
    }
}

/// Append-only log of asserted facts.
///
/// Facts are never retracted, so the log may hold both `MaybePit(r,c)` and a
/// later `Safe(r,c)`. It records what was concluded and in which order; the
/// belief grid stays the authority on a cell's current status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactStore {
    log: Vec<Fact>,
    #[serde(skip)]
    known: HashSet<Fact>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fact. Returns `false` if it was already known.
    pub fn tell(&mut self, fact: Fact) -> bool {
        if self.known.insert(fact) {
            self.log.push(fact);
            true
        } else {
            false
        }
    }

    pub fn ask(&self, fact: &Fact) -> bool {
        self.known.contains(fact)
    }

    /// Facts in the order they were first asserted.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
