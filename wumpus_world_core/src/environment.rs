use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Percept, PerceptSet, Position, START,
    config::{ConfigError, GRID_SIZE_RANGE, GameConfig},
    map::Grid,
};

/// The ground-truth tags carried by one cell.
///
/// Hazards (`pit`, `wumpus`, `gold`) are fixed at generation time; the
/// percept tags are derived from them and only ever removed by
/// [`Environment::kill_wumpus`] and [`Environment::remove_gold`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub pit: bool,
    pub wumpus: bool,
    pub gold: bool,
    pub breeze: bool,
    pub stench: bool,
    pub glitter: bool,
}

impl Cell {
    /// The perceivable subset of this cell's tags.
    pub fn percepts(&self) -> PerceptSet {
        let mut percepts = PerceptSet::empty();
        if self.breeze {
            percepts.insert(Percept::Breeze);
        }
        if self.stench {
            percepts.insert(Percept::Stench);
        }
        if self.glitter {
            percepts.insert(Percept::Glitter);
        }
        percepts
    }

    fn is_free(&self) -> bool {
        !(self.pit || self.wumpus || self.gold)
    }
}

/// Represents errors found while parsing a fixed map layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Layout is empty.")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Layout size must be between 4 and 10, got {0}")]
    Size(usize),
    #[error("Unknown map code '{token}' at position ({row}, {col}).")]
    UnknownToken {
        token: String,
        row: usize,
        col: usize,
    },
    #[error("The start ('ST') must be at (0, 0), found one at ({row}, {col}).")]
    StartMisplaced { row: usize, col: usize },
    #[error("No start position ('ST') found at (0, 0).")]
    MissingStart,
    #[error("Expected exactly one wumpus ('WU'), found {0}.")]
    WumpusCount(usize),
    #[error("Expected exactly one gold ('GD'), found {0}.")]
    GoldCount(usize),
}

/// The physical hazard layout of one game.
///
/// Answers point queries about the ground truth. Never looks at what the
/// agent believes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    cells: Grid<Cell>,
    wumpus: Position,
    gold: Position,
    pit_count: usize,
    wumpus_alive: bool,
    gold_collected: bool,
}

impl Environment {
    fn empty(size: usize) -> Self {
        Environment {
            cells: Grid::new(size, size),
            wumpus: START,
            gold: START,
            pit_count: 0,
            wumpus_alive: true,
            gold_collected: false,
        }
    }

    /// Builds a random layout for `config`.
    ///
    /// Every cell except the start is shuffled, then the wumpus, the gold and
    /// the pits take cells from the front in that order. When the grid runs
    /// out of free cells the remaining pits are dropped with a warning.
    pub fn generate<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self, ConfigError> {
        let size = config.grid_size;
        if !GRID_SIZE_RANGE.contains(&size) {
            return Err(ConfigError::GridSize(size));
        }

        let mut environment = Environment::empty(size);
        let mut candidates: Vec<Position> = environment
            .cells
            .enumerate()
            .map(|(pos, _)| pos)
            .filter(|pos| *pos != START)
            .collect();
        candidates.shuffle(rng);
        let mut candidates = candidates.into_iter();

        // Grids of at least 4x4 always have room for these two.
        if let Some(pos) = candidates.next() {
            environment.place_wumpus(pos);
        }
        if let Some(pos) = candidates.next() {
            environment.place_gold(pos);
        }

        for placed in 0..config.pit_count {
            match candidates.next() {
                Some(pos) => environment.place_pit(pos),
                None => {
                    warn!(
                        requested = config.pit_count,
                        placed, "Not enough unique locations for all pits"
                    );
                    break;
                }
            }
        }

        debug!(
            size,
            wumpus = %environment.wumpus,
            gold = %environment.gold,
            pits = environment.pit_count,
            "Generated environment"
        );
        Ok(environment)
    }

    /// Loads a fixed layout from its text form.
    ///
    /// One row per line, cells separated by whitespace:
    /// `ST` start (only at (0, 0)), `BL` blank, `PT` pit, `WU` wumpus, `GD` gold.
    pub fn from_layout(layout: &str) -> Result<Self, LayoutError> {
        let rows: Vec<Vec<&str>> = layout
            .trim()
            .lines()
            .map(|line| line.split_whitespace().collect())
            .collect();
        if rows.is_empty() || rows[0].is_empty() {
            return Err(LayoutError::Empty);
        }

        let size = rows.len();
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != size {
                return Err(LayoutError::NotSquare {
                    row,
                    expected: size,
                    found: tokens.len(),
                });
            }
        }
        if !GRID_SIZE_RANGE.contains(&size) {
            return Err(LayoutError::Size(size));
        }

        let mut environment = Environment::empty(size);
        let mut start_found = false;
        let mut wumpus_count = 0;
        let mut gold_count = 0;

        for (row, tokens) in rows.iter().enumerate() {
            for (col, token) in tokens.iter().enumerate() {
                let pos = Position { row, col };
                match *token {
                    "ST" if pos == START => start_found = true,
                    "ST" => return Err(LayoutError::StartMisplaced { row, col }),
                    "BL" => {}
                    "PT" => environment.place_pit(pos),
                    "WU" => {
                        wumpus_count += 1;
                        environment.place_wumpus(pos);
                    }
                    "GD" => {
                        gold_count += 1;
                        environment.place_gold(pos);
                    }
                    unknown => {
                        return Err(LayoutError::UnknownToken {
                            token: unknown.to_string(),
                            row,
                            col,
                        });
                    }
                }
            }
        }

        if !start_found {
            return Err(LayoutError::MissingStart);
        }
        if wumpus_count != 1 {
            return Err(LayoutError::WumpusCount(wumpus_count));
        }
        if gold_count != 1 {
            return Err(LayoutError::GoldCount(gold_count));
        }
        Ok(environment)
    }

    fn place_wumpus(&mut self, pos: Position) {
        self.cells[pos].wumpus = true;
        self.wumpus = pos;
        self.tag_neighbors(pos, |cell| cell.stench = true);
    }

    fn place_gold(&mut self, pos: Position) {
        let cell = &mut self.cells[pos];
        cell.gold = true;
        cell.glitter = true;
        self.gold = pos;
    }

    fn place_pit(&mut self, pos: Position) {
        debug_assert!(self.cells[pos].is_free());
        self.cells[pos].pit = true;
        self.pit_count += 1;
        self.tag_neighbors(pos, |cell| cell.breeze = true);
    }

    fn tag_neighbors(&mut self, pos: Position, tag: impl Fn(&mut Cell)) {
        let neighbors: Vec<Position> = self.cells.neighbors(pos).collect();
        for neighbor in neighbors {
            tag(&mut self.cells[neighbor]);
        }
    }

    /// Side length of the (square) grid.
    pub fn size(&self) -> usize {
        self.cells.rows()
    }

    pub fn cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos)
    }

    /// Number of pits actually placed.
    pub fn pit_count(&self) -> usize {
        self.pit_count
    }

    pub fn wumpus_location(&self) -> Position {
        self.wumpus
    }

    pub fn gold_location(&self) -> Position {
        self.gold
    }

    pub fn is_wumpus_alive(&self) -> bool {
        self.wumpus_alive
    }

    pub fn is_gold_collected(&self) -> bool {
        self.gold_collected
    }

    pub fn is_valid_location(&self, pos: Position) -> bool {
        self.cells.is_valid(pos)
    }

    /// Breeze, Stench and Glitter present at `pos`. Empty when out of range.
    pub fn percepts_at(&self, pos: Position) -> PerceptSet {
        self.cells
            .get(pos)
            .map(Cell::percepts)
            .unwrap_or_default()
    }

    pub fn has_pit(&self, pos: Position) -> bool {
        self.cells.get(pos).is_some_and(|cell| cell.pit)
    }

    /// False once the wumpus has been killed, even though its cell keeps the tag.
    pub fn has_wumpus(&self, pos: Position) -> bool {
        self.wumpus_alive && self.cells.get(pos).is_some_and(|cell| cell.wumpus)
    }

    pub fn has_gold(&self, pos: Position) -> bool {
        !self.gold_collected && self.cells.get(pos).is_some_and(|cell| cell.gold)
    }

    /// Clears Gold and Glitter at `pos`. Does nothing if the gold is elsewhere.
    pub fn remove_gold(&mut self, pos: Position) {
        if let Some(cell) = self.cells.get_mut(pos)
            && cell.gold
        {
            cell.gold = false;
            cell.glitter = false;
            self.gold_collected = true;
        }
    }

    /// Marks the wumpus dead and strips Stench from every cell.
    pub fn kill_wumpus(&mut self) {
        self.wumpus_alive = false;
        for cell in self.cells.iter_mut() {
            cell.stench = false;
        }
    }
}
