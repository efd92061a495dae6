use wumpus_world_core::{
    Direction, Percept, Position, START,
    belief::BeliefStatus,
    config::{GameConfig, Scoring},
    environment::Environment,
    game::{Command, GAME_OVER_MESSAGE, Game, GameState},
};

fn game_from(layout: &str) -> Game {
    let environment = Environment::from_layout(layout).expect("valid layout");
    let config = GameConfig::new(environment.size(), environment.pit_count()).expect("valid config");
    Game::from_environment(config, environment).expect("game")
}

#[test]
fn test_four_plain_moves_cost_four() {
    let mut game = game_from(
        "
        ST BL BL GD
        BL BL BL BL
        BL BL BL BL
        WU BL BL BL
        ",
    );

    for direction in [
        Direction::Right,
        Direction::Right,
        Direction::Down,
        Direction::Down,
    ] {
        let outcome = game.apply(Command::Move(direction));
        assert!(!outcome.terminal);
        assert_eq!(outcome.message, "");
    }
    assert_eq!(game.agent_state().position(), Position::new(2, 2));

    let outcome = game.apply(Command::GrabGold);
    assert_eq!(outcome.message, "No gold here to grab.");

    assert_eq!(game.agent_state().score, -4);
    assert_eq!(game.state(), GameState::Running);
}

#[test]
fn test_walking_into_the_wumpus_loses() {
    let mut game = game_from(
        "
        ST WU BL BL
        BL BL BL BL
        BL BL BL GD
        BL BL BL BL
        ",
    );
    let scoring = Scoring::default();

    let outcome = game.apply(Command::Move(Direction::Right));
    assert!(outcome.terminal);
    assert_eq!(outcome.message, "The Wumpus ate you! Game Over.");
    assert_eq!(game.state(), GameState::Lost);
    assert_eq!(
        game.agent_state().score,
        scoring.move_cost + scoring.wumpus_kill_cost
    );

    // Everything after the end is rejected.
    let before = game.agent_state();
    for command in [
        Command::Move(Direction::Down),
        Command::Shoot,
        Command::GrabGold,
        Command::ClimbOut,
        Command::TurnLeft,
    ] {
        let outcome = game.apply(command);
        assert!(outcome.terminal);
        assert_eq!(outcome.message, GAME_OVER_MESSAGE);
    }
    assert_eq!(game.agent_state(), before);
    assert_eq!(game.state(), GameState::Lost);
}

#[test]
fn test_grabbing_gold_once() {
    let mut game = game_from(
        "
        ST GD BL BL
        BL BL BL BL
        BL BL BL BL
        BL BL WU BL
        ",
    );

    game.apply(Command::Move(Direction::Right));
    assert!(game.percepts().contains(Percept::Glitter));
    let score_before = game.agent_state().score;

    let outcome = game.apply(Command::GrabGold);
    assert_eq!(outcome.message, "You grabbed the gold!");
    assert!(game.agent_state().has_gold);
    assert_eq!(game.agent_state().score, score_before + 1000);
    assert!(game.environment().is_gold_collected());
    assert!(!game.percepts().contains(Percept::Glitter));

    let outcome = game.apply(Command::GrabGold);
    assert!(!outcome.terminal);
    assert_eq!(outcome.message, "No gold here to grab.");
    assert_eq!(game.agent_state().score, score_before + 1000);
}

const GOLD_NEXT_DOOR: &str = "
    ST GD BL BL
    BL BL BL BL
    BL BL BL BL
    BL BL BL WU
";

#[test]
fn test_climbing_out_with_the_gold_wins() {
    let mut game = game_from(GOLD_NEXT_DOOR);

    game.apply(Command::Move(Direction::Right));
    game.apply(Command::GrabGold);
    game.apply(Command::Move(Direction::Left));
    let outcome = game.apply(Command::ClimbOut);

    assert!(outcome.terminal);
    assert_eq!(
        outcome.message,
        "You successfully climbed out with the gold! You Win!"
    );
    assert_eq!(game.state(), GameState::Won);
    assert_eq!(game.agent_state().score, -1 + 1000 - 1 + 10);
}

#[test]
fn test_climbing_out_needs_gold_and_the_start() {
    let mut game = game_from(GOLD_NEXT_DOOR);
    let refused = "You can only climb out from the starting point with the gold!";

    let outcome = game.apply(Command::ClimbOut);
    assert!(!outcome.terminal);
    assert_eq!(outcome.message, refused);
    assert_eq!(game.state(), GameState::Running);

    game.apply(Command::Move(Direction::Right));
    game.apply(Command::GrabGold);
    let outcome = game.apply(Command::ClimbOut);
    assert!(!outcome.terminal);
    assert_eq!(outcome.message, refused);
    assert_eq!(game.state(), GameState::Running);
    assert_eq!(game.agent_state().score, -1 + 1000);
}

#[test]
fn test_shooting_the_wumpus() {
    let mut game = game_from(
        "
        ST WU BL BL
        BL BL BL BL
        BL BL BL GD
        BL BL BL BL
        ",
    );
    assert!(game.percepts().contains(Percept::Stench));
    assert_eq!(
        game.belief_grid()[Position::new(0, 1)].status,
        BeliefStatus::MaybeWumpus
    );

    let outcome = game.apply(Command::Shoot);
    assert!(!outcome.terminal);
    assert_eq!(outcome.message, "You shot the Wumpus! It screamed!");
    assert!(game.percepts().contains(Percept::Scream));
    assert!(!game.percepts().contains(Percept::Stench));
    assert!(!game.agent_state().has_arrow);
    assert_eq!(game.agent_state().score, -10 + 500);
    assert!(!game.environment().is_wumpus_alive());
    assert!(game.environment().cells().iter().all(|cell| !cell.stench));
    // No more stench at the start clears the suspicion.
    assert_eq!(
        game.belief_grid()[Position::new(0, 1)].status,
        BeliefStatus::Safe
    );

    let outcome = game.apply(Command::Shoot);
    assert_eq!(outcome.message, "No arrows left!");
    assert_eq!(game.agent_state().score, -10 + 500);

    // The corpse is harmless.
    let outcome = game.apply(Command::Move(Direction::Right));
    assert!(!outcome.terminal);
    assert_eq!(game.state(), GameState::Running);
}

#[test]
fn test_arrow_reaches_only_one_cell() {
    let mut game = game_from(
        "
        ST BL WU BL
        BL BL BL BL
        BL BL BL GD
        BL BL BL BL
        ",
    );
    let outcome = game.apply(Command::Shoot);
    assert_eq!(outcome.message, "Your arrow flew into the void.");
    assert!(game.environment().is_wumpus_alive());
    assert!(!game.percepts().contains(Percept::Scream));
}

#[test]
fn test_safe_walk_builds_belief_map() {
    let mut game = game_from(
        "
        ST BL BL BL
        BL BL PT BL
        BL BL BL BL
        WU BL BL GD
        ",
    );

    game.apply(Command::Move(Direction::Right));
    // (0, 1) has no breeze: nothing else learned yet about (1, 2).
    game.apply(Command::Move(Direction::Right));
    // (0, 2) is breezy: its unknown neighbors are suspects.
    let view = game.view();
    assert!(view.percepts.contains(Percept::Breeze));
    assert_eq!(view.beliefs[Position::new(0, 3)].status, BeliefStatus::MaybePit);
    assert_eq!(view.beliefs[Position::new(1, 2)].status, BeliefStatus::MaybePit);
    assert!(view.beliefs[Position::new(0, 2)].visited);
    assert!(view.facts.iter().any(|fact| fact.to_string() == "MaybePit(1,2)"));

    // Every visited cell so far is known safe.
    for (pos, cell) in view.beliefs.enumerate() {
        if cell.visited {
            assert_eq!(cell.status, BeliefStatus::Safe, "{pos}");
        }
    }
    assert!(view.beliefs[START].visited);
}

#[test]
fn test_bumping_reports_the_wall_and_keeps_cell_percepts() {
    let mut game = game_from(
        "
        ST PT BL BL
        BL BL BL BL
        BL BL BL GD
        BL BL WU BL
        ",
    );
    let outcome = game.apply(Command::Move(Direction::Left));
    assert_eq!(outcome.message, "Bumped into a wall!");
    assert!(game.percepts().contains(Percept::Bump));
    assert!(game.percepts().contains(Percept::Breeze));
    assert_eq!(game.view().message, "Bumped into a wall!");
}

#[test]
fn test_fatal_cell_keeps_its_percepts_and_suspicion() {
    let mut game = game_from(
        "
        ST PT PT BL
        BL BL BL BL
        BL BL BL GD
        BL BL WU BL
        ",
    );
    let fatal = Position::new(0, 1);
    assert_eq!(game.belief_grid()[fatal].status, BeliefStatus::MaybePit);

    let outcome = game.apply(Command::Move(Direction::Right));
    assert_eq!(outcome.message, "You fell into a pit! Game Over.");

    let cell = game.belief_grid()[fatal];
    assert!(cell.visited);
    assert_eq!(cell.status, BeliefStatus::MaybePit);
    assert!(cell.percepts.contains(Percept::Breeze));
    assert_eq!(game.percepts(), cell.percepts);
    // Nothing was inferred from the fatal cell.
    assert_eq!(
        game.belief_grid()[Position::new(1, 1)].status,
        BeliefStatus::Unknown
    );
}
