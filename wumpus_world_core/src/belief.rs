use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    Percept, PerceptSet, Position, START,
    knowledge::{Fact, FactStore},
    map::Grid,
};

/// The agent's assessment of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeliefStatus {
    #[default]
    Unknown,
    Safe,
    MaybePit,
    MaybeWumpus,
}

impl BeliefStatus {
    fn fact(self, pos: Position) -> Option<Fact> {
        match self {
            BeliefStatus::Unknown => None,
            BeliefStatus::Safe => Some(Fact::Safe(pos)),
            BeliefStatus::MaybePit => Some(Fact::MaybePit(pos)),
            BeliefStatus::MaybeWumpus => Some(Fact::MaybeWumpus(pos)),
        }
    }
}

/// What the agent knows about one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefCell {
    pub status: BeliefStatus,
    /// Percepts last observed while standing here.
    pub percepts: PerceptSet,
    pub visited: bool,
}

/// The agent's internal map, refreshed from percepts after every turn.
#[derive(Debug, Clone)]
pub struct BeliefMap {
    cells: Grid<BeliefCell>,
    facts: FactStore,
}

impl BeliefMap {
    /// A map where only the start cell is known (visited and safe).
    pub fn new(size: usize) -> Self {
        let mut map = BeliefMap {
            cells: Grid::new(size, size),
            facts: FactStore::new(),
        };
        map.cells[START].visited = true;
        map.assign(START, BeliefStatus::Safe);
        map
    }

    pub fn cells(&self) -> &Grid<BeliefCell> {
        &self.cells
    }

    pub fn cell(&self, pos: Position) -> Option<&BeliefCell> {
        self.cells.get(pos)
    }

    pub fn status(&self, pos: Position) -> BeliefStatus {
        self.cells[pos].status
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    pub fn mark_visited(&mut self, pos: Position) {
        self.cells[pos].visited = true;
    }

    /// Stores the percepts observed at `pos` and leaves every status alone.
    pub fn record(&mut self, pos: Position, percepts: PerceptSet) {
        self.cells[pos].percepts = percepts;
    }

    /// Folds the percepts observed at `pos` into the map.
    ///
    /// Returns the number of cells whose status changed.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the grid.
    pub fn update(&mut self, pos: Position, percepts: PerceptSet) -> usize {
        let mut changed = 0;

        self.cells[pos].percepts = percepts;
        // Standing here alive rules out both hazards.
        changed += usize::from(self.assign(pos, BeliefStatus::Safe));

        let neighbors: Vec<Position> = self.cells.neighbors(pos).collect();
        let breeze = percepts.contains(Percept::Breeze);
        let stench = percepts.contains(Percept::Stench);

        // Promotions only ever start from Unknown, so a suspicion of one
        // hazard is never overwritten by a suspicion of the other.
        if breeze {
            changed += self.promote_unknown(&neighbors, BeliefStatus::MaybePit);
        }
        if stench {
            changed += self.promote_unknown(&neighbors, BeliefStatus::MaybeWumpus);
        }
        if !breeze {
            changed += self.clear_suspicion(&neighbors, BeliefStatus::MaybePit);
        }
        if !stench {
            changed += self.clear_suspicion(&neighbors, BeliefStatus::MaybeWumpus);
        }

        changed
    }

    fn promote_unknown(&mut self, neighbors: &[Position], to: BeliefStatus) -> usize {
        let mut changed = 0;
        for &neighbor in neighbors {
            if self.cells[neighbor].status == BeliefStatus::Unknown {
                changed += usize::from(self.assign(neighbor, to));
            }
        }
        changed
    }

    /// Absence of a percept is decisive: neighbors suspected of the matching
    /// hazard, and neighbors still unknown, become safe.
    fn clear_suspicion(&mut self, neighbors: &[Position], suspicion: BeliefStatus) -> usize {
        let mut changed = 0;
        for &neighbor in neighbors {
            let status = self.cells[neighbor].status;
            if status == suspicion || status == BeliefStatus::Unknown {
                changed += usize::from(self.assign(neighbor, BeliefStatus::Safe));
            }
        }
        changed
    }

    /// Sets a status and records the matching fact. Returns whether the status changed.
    fn assign(&mut self, pos: Position, status: BeliefStatus) -> bool {
        let previous = std::mem::replace(&mut self.cells[pos].status, status);
        if let Some(fact) = status.fact(pos) {
            self.facts.tell(fact);
        }
        if previous != status {
            trace!(%pos, ?previous, ?status, "Belief changed");
        }
        previous != status
    }
}
