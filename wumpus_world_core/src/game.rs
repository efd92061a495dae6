use std::fmt;

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Direction, Percept, PerceptSet, Position, START,
    agent::{Agent, AgentState},
    belief::BeliefCell,
    config::{ConfigError, GameConfig},
    environment::Environment,
    knowledge::FactStore,
    map::Grid,
};

pub const GAME_OVER_MESSAGE: &str = "The game is over. Please reset to play again.";

/// Lifecycle of a session. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Running,
    Won,
    Lost,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Running => "Running",
            GameState::Won => "Won",
            GameState::Lost => "Lost",
        };
        f.write_str(name)
    }
}

/// Commands the player (or a policy) can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    TurnLeft,
    TurnRight,
    Shoot,
    GrabGold,
    ClimbOut,
}

/// What a command did. In-game commands never fail; they report here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// True when the game is over after this command.
    pub terminal: bool,
    pub message: String,
}

/// A consistent, read-only picture of the game after the last completed turn.
#[derive(Debug)]
pub struct GameView<'a> {
    pub beliefs: &'a Grid<BeliefCell>,
    pub facts: &'a FactStore,
    pub agent: AgentState,
    pub state: GameState,
    pub percepts: PerceptSet,
    pub message: &'a str,
}

/// Drives one game session: applies commands to the agent and the
/// environment, settles the consequences and refreshes the agent's beliefs.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    environment: Environment,
    agent: Agent,
    state: GameState,
    rng: StdRng,
    /// Fixed layout to restore on reset, if the game was built from one.
    layout: Option<Environment>,
    last_message: String,
}

impl Game {
    /// Starts a random game seeded from the operating system.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Starts a reproducible random game.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let environment = Environment::generate(&config, &mut rng)?;
        Ok(Self::start(config, environment, rng, None))
    }

    /// Starts a game on a fixed layout. `reset` restores the same layout.
    pub fn from_environment(
        config: GameConfig,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if environment.size() != config.grid_size {
            return Err(ConfigError::LayoutMismatch {
                layout: environment.size(),
                configured: config.grid_size,
            });
        }
        if environment.pit_count() != config.pit_count {
            return Err(ConfigError::LayoutPitMismatch {
                layout: environment.pit_count(),
                configured: config.pit_count,
            });
        }
        let layout = Some(environment.clone());
        Ok(Self::start(config, environment, StdRng::from_os_rng(), layout))
    }

    fn start(
        config: GameConfig,
        environment: Environment,
        rng: StdRng,
        layout: Option<Environment>,
    ) -> Self {
        let agent = Agent::new(config.grid_size);
        let mut game = Game {
            config,
            environment,
            agent,
            state: GameState::Running,
            rng,
            layout,
            last_message: String::new(),
        };
        info!(
            size = game.config.grid_size,
            pits = game.environment.pit_count(),
            "Game started"
        );
        game.refresh(PerceptSet::empty());
        game
    }

    /// Throws away the current session and builds a fresh one in place.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.environment = match &self.layout {
            Some(layout) => layout.clone(),
            None => Environment::generate(&self.config, &mut self.rng)?,
        };
        self.agent = Agent::new(self.config.grid_size);
        self.state = GameState::Running;
        self.last_message.clear();
        info!(pits = self.environment.pit_count(), "Game reset");
        self.refresh(PerceptSet::empty());
        Ok(())
    }

    /// Processes one command to completion.
    ///
    /// Once the game is over every command is rejected without touching any state.
    pub fn apply(&mut self, command: Command) -> ActionOutcome {
        if self.state != GameState::Running {
            return ActionOutcome {
                terminal: true,
                message: GAME_OVER_MESSAGE.to_string(),
            };
        }

        debug!(?command, position = %self.agent.position(), "Processing command");
        let mut events = PerceptSet::empty();
        let message = match command {
            Command::Move(direction) => self.move_agent(direction, &mut events),
            Command::TurnLeft => {
                self.agent.turn_left();
                format!("Now facing {}.", self.agent.facing())
            }
            Command::TurnRight => {
                self.agent.turn_right();
                format!("Now facing {}.", self.agent.facing())
            }
            Command::Shoot => self.shoot_arrow(&mut events),
            Command::GrabGold => self.grab_gold(),
            Command::ClimbOut => self.climb_out(),
        };
        self.refresh(events);

        let terminal = self.state != GameState::Running;
        if terminal {
            info!(state = %self.state, score = self.agent.score(), "Game over");
        }
        self.last_message.clone_from(&message);
        ActionOutcome { terminal, message }
    }

    /// Percept query at the current cell followed by the belief update.
    ///
    /// `events` carries the one-off percepts (Bump, Scream) of the turn.
    /// A dead agent still records what it sensed on the fatal cell but draws
    /// no conclusions, so that cell keeps whatever status it had.
    fn refresh(&mut self, events: PerceptSet) {
        let percepts = self
            .environment
            .percepts_at(self.agent.position())
            .union(events);
        self.agent.perceive(percepts);
        if self.state == GameState::Running {
            let changed = self.agent.infer();
            debug!(%percepts, changed, "Beliefs refreshed");
        } else {
            self.agent.record_percepts();
        }
    }

    fn target(&self, direction: Direction) -> Option<Position> {
        self.environment.cells().step(self.agent.position(), direction)
    }

    fn move_agent(&mut self, direction: Direction, events: &mut PerceptSet) -> String {
        let Some(target) = self.target(direction) else {
            events.insert(Percept::Bump);
            return "Bumped into a wall!".to_string();
        };

        let scoring = self.config.scoring;
        self.agent.move_to(target, scoring.move_cost);

        if self.environment.has_pit(target) {
            self.agent.add_score(scoring.fall_in_pit_cost);
            self.state = GameState::Lost;
            "You fell into a pit! Game Over.".to_string()
        } else if self.environment.has_wumpus(target) {
            self.agent.add_score(scoring.wumpus_kill_cost);
            self.state = GameState::Lost;
            "The Wumpus ate you! Game Over.".to_string()
        } else {
            String::new()
        }
    }

    /// The arrow flies exactly one cell in the facing direction.
    fn shoot_arrow(&mut self, events: &mut PerceptSet) -> String {
        let scoring = self.config.scoring;
        if !self.agent.fire_arrow(scoring.shoot_cost) {
            return "No arrows left!".to_string();
        }

        match self.target(self.agent.facing()) {
            Some(target) if self.environment.has_wumpus(target) => {
                self.environment.kill_wumpus();
                self.agent.add_score(scoring.wumpus_defeat_reward);
                events.insert(Percept::Scream);
                info!(%target, "Wumpus killed");
                "You shot the Wumpus! It screamed!".to_string()
            }
            Some(_) => "Your arrow flew into the void.".to_string(),
            None => "You shot at a wall.".to_string(),
        }
    }

    fn grab_gold(&mut self) -> String {
        let here = self.agent.position();
        if !self.environment.has_gold(here) {
            return "No gold here to grab.".to_string();
        }
        self.agent.take_gold(self.config.scoring.grab_gold_reward);
        self.environment.remove_gold(here);
        "You grabbed the gold!".to_string()
    }

    fn climb_out(&mut self) -> String {
        if self.agent.position() == START && self.agent.has_gold() {
            self.agent.add_score(self.config.scoring.climb_out_reward);
            self.state = GameState::Won;
            "You successfully climbed out with the gold! You Win!".to_string()
        } else {
            "You can only climb out from the starting point with the gold!".to_string()
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent.state()
    }

    pub fn belief_grid(&self) -> &Grid<BeliefCell> {
        self.agent.beliefs().cells()
    }

    pub fn facts(&self) -> &FactStore {
        self.agent.beliefs().facts()
    }

    pub fn percepts(&self) -> PerceptSet {
        self.agent.percepts()
    }

    /// Ground truth. Renderers should stick to [`Game::view`].
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    pub fn view(&self) -> GameView<'_> {
        GameView {
            beliefs: self.belief_grid(),
            facts: self.facts(),
            agent: self.agent_state(),
            state: self.state,
            percepts: self.percepts(),
            message: &self.last_message,
        }
    }
}
