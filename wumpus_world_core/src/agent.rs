use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Direction, Percept, PerceptSet, Position, START,
    belief::BeliefMap,
    game::{Command, GameView},
};

/// Trait for anything that picks the next command from a read-only view of the game.
///
/// The coordinator stays the only mutator: a policy proposes, `Game::apply` decides.
pub trait Policy {
    fn choose_command(&mut self, view: &GameView<'_>) -> Command;
}

/// A policy that picks any command at random.
#[derive(Debug)]
pub struct RandomWalker {
    rng: StdRng,
}

impl RandomWalker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomWalker {
    fn choose_command(&mut self, view: &GameView<'_>) -> Command {
        // Standing on glitter or back home with the gold, take the obvious action.
        if view.percepts.contains(Percept::Glitter) {
            return Command::GrabGold;
        }
        if view.agent.has_gold && view.agent.position() == START {
            return Command::ClimbOut;
        }

        match self.rng.random_range(0..8) {
            0..4 => Command::Move(Direction::ALL[self.rng.random_range(0..4)]),
            4 => Command::TurnLeft,
            5 => Command::TurnRight,
            6 if view.agent.has_arrow => Command::Shoot,
            _ => Command::Move(view.agent.direction),
        }
    }
}

/// Read-only snapshot of the agent's physical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub score: i64,
    pub has_arrow: bool,
    pub has_gold: bool,
}

impl AgentState {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

/// The player inside the cave: physical state plus its belief map.
#[derive(Debug, Clone)]
pub struct Agent {
    position: Position,
    facing: Direction,
    has_arrow: bool,
    has_gold: bool,
    score: i64,
    percepts: PerceptSet,
    beliefs: BeliefMap,
}

impl Agent {
    pub fn new(grid_size: usize) -> Self {
        Agent {
            position: START,
            facing: Direction::Right,
            has_arrow: true,
            has_gold: false,
            score: 0,
            percepts: PerceptSet::empty(),
            beliefs: BeliefMap::new(grid_size),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn has_arrow(&self) -> bool {
        self.has_arrow
    }

    pub fn has_gold(&self) -> bool {
        self.has_gold
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn percepts(&self) -> PerceptSet {
        self.percepts
    }

    pub fn beliefs(&self) -> &BeliefMap {
        &self.beliefs
    }

    pub fn state(&self) -> AgentState {
        AgentState {
            row: self.position.row,
            col: self.position.col,
            direction: self.facing,
            score: self.score,
            has_arrow: self.has_arrow,
            has_gold: self.has_gold,
        }
    }

    pub fn add_score(&mut self, amount: i64) {
        self.score += amount;
    }

    /// Steps onto `target`, paying `cost`. The caller checks bounds.
    pub fn move_to(&mut self, target: Position, cost: i64) {
        self.position = target;
        self.score += cost;
        self.beliefs.mark_visited(target);
    }

    pub fn turn_left(&mut self) {
        self.facing = self.facing.turn_left();
    }

    pub fn turn_right(&mut self) {
        self.facing = self.facing.turn_right();
    }

    /// Spends the arrow and pays `cost`. Returns `false` if it was already spent.
    pub fn fire_arrow(&mut self, cost: i64) -> bool {
        if !self.has_arrow {
            return false;
        }
        self.has_arrow = false;
        self.score += cost;
        true
    }

    pub fn take_gold(&mut self, reward: i64) {
        self.has_gold = true;
        self.score += reward;
    }

    pub fn perceive(&mut self, percepts: PerceptSet) {
        self.percepts = percepts;
    }

    /// Stores the current percepts on the current cell without inferring anything.
    pub fn record_percepts(&mut self) {
        self.beliefs.record(self.position, self.percepts);
    }

    /// Runs the belief update for the current cell with the current percepts.
    pub fn infer(&mut self) -> usize {
        self.beliefs.update(self.position, self.percepts)
    }
}
