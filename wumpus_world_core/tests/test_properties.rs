use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use wumpus_world_core::{
    Direction, Percept, PerceptSet, Position, START,
    belief::{BeliefMap, BeliefStatus},
    config::GameConfig,
    environment::Environment,
    game::{Command, Game, GameState},
};

const COMMANDS: [Command; 9] = [
    Command::Move(Direction::Right),
    Command::Move(Direction::Up),
    Command::Move(Direction::Left),
    Command::Move(Direction::Down),
    Command::TurnLeft,
    Command::TurnRight,
    Command::Shoot,
    Command::GrabGold,
    Command::ClimbOut,
];

/// A valid (grid size, pit count) pair plus an RNG seed.
fn valid_config() -> impl Strategy<Value = (usize, usize, u64)> {
    (4usize..=10).prop_flat_map(|size| {
        (
            Just(size),
            0..=GameConfig::max_pits(size),
            any::<u64>(),
        )
    })
}

fn percept_set() -> impl Strategy<Value = PerceptSet> {
    prop::collection::vec(prop::sample::select(Percept::ALL.to_vec()), 0..4)
        .prop_map(|percepts| percepts.into_iter().collect())
}

fn generate(size: usize, pits: usize, seed: u64) -> Environment {
    let config = GameConfig::new(size, pits).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    Environment::generate(&config, &mut rng).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_hazards_are_unique_and_away_from_start((size, pits, seed) in valid_config()) {
        let env = generate(size, pits, seed);
        let cells = env.cells();

        prop_assert_eq!(cells.iter().filter(|c| c.wumpus).count(), 1);
        prop_assert_eq!(cells.iter().filter(|c| c.gold).count(), 1);
        prop_assert_eq!(cells.iter().filter(|c| c.pit).count(), pits);
        prop_assert_eq!(env.pit_count(), pits);

        for cell in cells.iter() {
            let hazards = [cell.pit, cell.wumpus, cell.gold].iter().filter(|h| **h).count();
            prop_assert!(hazards <= 1);
        }
        let start = env.cell(START).unwrap();
        prop_assert!(!start.pit && !start.wumpus && !start.gold);
    }

    #[test]
    fn percept_tags_match_neighboring_hazards((size, pits, seed) in valid_config()) {
        let env = generate(size, pits, seed);
        let cells = env.cells();

        for (pos, cell) in cells.enumerate() {
            let near_pit = cells.neighbors(pos).any(|n| cells[n].pit);
            let near_wumpus = cells.neighbors(pos).any(|n| cells[n].wumpus);
            prop_assert_eq!(cell.breeze, near_pit, "breeze at {}", pos);
            prop_assert_eq!(cell.stench, near_wumpus, "stench at {}", pos);
            prop_assert_eq!(cell.glitter, cell.gold, "glitter at {}", pos);
        }
    }

    #[test]
    fn killing_the_wumpus_removes_every_stench((size, pits, seed) in valid_config()) {
        let mut env = generate(size, pits, seed);
        let wumpus = env.wumpus_location();
        prop_assert!(env.has_wumpus(wumpus));

        env.kill_wumpus();
        prop_assert!(!env.has_wumpus(wumpus));
        for (pos, _) in env.cells().enumerate() {
            prop_assert!(!env.percepts_at(pos).contains(Percept::Stench));
        }
    }

    #[test]
    fn repeated_belief_update_changes_nothing(
        size in 4usize..=10,
        updates in prop::collection::vec((0usize..10, 0usize..10, percept_set()), 1..30),
    ) {
        let mut map = BeliefMap::new(size);
        let mut last = None;
        for (row, col, percepts) in updates {
            let pos = Position::new(row % size, col % size);
            map.update(pos, percepts);
            last = Some((pos, percepts));
        }
        let (pos, percepts) = last.unwrap();
        let before = map.cells().clone();
        let facts = map.facts().len();

        prop_assert_eq!(map.update(pos, percepts), 0);
        prop_assert_eq!(map.cells(), &before);
        prop_assert_eq!(map.facts().len(), facts);
    }

    #[test]
    fn observed_cells_never_regress(
        size in 4usize..=10,
        updates in prop::collection::vec((0usize..10, 0usize..10, percept_set()), 1..40),
    ) {
        let mut map = BeliefMap::new(size);
        let mut observed = vec![START];
        for (row, col, percepts) in updates {
            let pos = Position::new(row % size, col % size);
            map.update(pos, percepts);
            observed.push(pos);
            for seen in &observed {
                prop_assert_eq!(map.status(*seen), BeliefStatus::Safe);
            }
        }
    }

    #[test]
    fn played_games_keep_belief_invariants(
        (size, pits, seed) in valid_config(),
        commands in prop::collection::vec(prop::sample::select(COMMANDS.to_vec()), 0..80),
    ) {
        let mut game = Game::with_seed(GameConfig::new(size, pits).unwrap(), seed).unwrap();
        for command in commands {
            let outcome = game.apply(command);
            prop_assert_eq!(outcome.terminal, game.state() != GameState::Running);
            if outcome.terminal {
                break;
            }

            let beliefs = game.belief_grid();
            for (pos, cell) in beliefs.enumerate() {
                if !cell.visited {
                    continue;
                }
                prop_assert_eq!(cell.status, BeliefStatus::Safe, "visited {}", pos);
                let breeze = cell.percepts.contains(Percept::Breeze);
                let stench = cell.percepts.contains(Percept::Stench);
                for neighbor in beliefs.neighbors(pos) {
                    let status = beliefs[neighbor].status;
                    if !breeze {
                        prop_assert_ne!(status, BeliefStatus::MaybePit, "{} next to {}", neighbor, pos);
                    }
                    if !breeze && !stench {
                        prop_assert_eq!(status, BeliefStatus::Safe, "{} next to {}", neighbor, pos);
                    }
                }
            }
        }
    }
}
