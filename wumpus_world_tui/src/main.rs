use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wumpus_world_core::{
    Direction as Heading, Percept, Position,
    agent::{Policy, RandomWalker},
    belief::{BeliefCell, BeliefStatus},
    config::GameConfig,
    environment::Environment,
    game::{Command, Game, GameState, GameView},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Grid size (N x N), between 4 and 10
    #[arg(short, long, default_value_t = 5)]
    size: usize,

    /// Number of pits
    #[arg(short, long, default_value_t = 3)]
    pits: usize,

    /// Seed for a reproducible cave
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed layout file to play instead of a random cave
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

struct App {
    /// The game session; the only state the UI ever mutates, and only through commands.
    game: Game,
    /// Drives the agent on every tick while set.
    autopilot: Option<RandomWalker>,
    /// Seed for the next autopilot.
    autopilot_seed: u64,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let game = match &args.map {
            Some(map_file) => {
                let text = std::fs::read_to_string(map_file)
                    .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
                let environment =
                    Environment::from_layout(&text).context("Failed to load map layout")?;
                let config = GameConfig::new(environment.size(), environment.pit_count())?;
                Game::from_environment(config, environment)?
            }
            None => {
                let config = GameConfig::new(args.size, args.pits)
                    .context("Configuration error")?;
                match args.seed {
                    Some(seed) => Game::with_seed(config, seed)?,
                    None => Game::new(config)?,
                }
            }
        };

        let autopilot_seed = args.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default()
        });

        Ok(App {
            game,
            autopilot: None,
            autopilot_seed,
            should_quit: false,
        })
    }

    fn command(&mut self, command: Command) {
        let outcome = self.game.apply(command);
        if outcome.terminal {
            self.autopilot = None;
        }
    }

    /// Lets the autopilot play one command.
    fn tick(&mut self) {
        let Some(policy) = self.autopilot.as_mut() else {
            return;
        };
        let command = policy.choose_command(&self.game.view());
        self.command(command);
    }

    fn toggle_autopilot(&mut self) {
        if self.autopilot.take().is_some() || self.game.state() != GameState::Running {
            return;
        }
        self.autopilot_seed = self.autopilot_seed.wrapping_add(1);
        self.autopilot = Some(RandomWalker::new(self.autopilot_seed));
    }

    fn reset(&mut self) -> Result<()> {
        self.autopilot = None;
        self.game.reset()?;
        Ok(())
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    info!(size = args.size, pits = args.pits, map = ?args.map, "Starting");

    // Build the game before touching the terminal so config errors print normally.
    let mut app = App::new(&args)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Sends tracing output to a file; stderr belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wumpus_world_core=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn key_command(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Up | KeyCode::Char('k') => Command::Move(Heading::Up),
        KeyCode::Down | KeyCode::Char('j') => Command::Move(Heading::Down),
        KeyCode::Left | KeyCode::Char('h') => Command::Move(Heading::Left),
        KeyCode::Right | KeyCode::Char('l') => Command::Move(Heading::Right),
        KeyCode::Char('z') => Command::TurnLeft,
        KeyCode::Char('x') => Command::TurnRight,
        KeyCode::Char(' ') | KeyCode::Char('f') => Command::Shoot,
        KeyCode::Char('g') => Command::GrabGold,
        KeyCode::Char('c') => Command::ClimbOut,
        _ => return None,
    };
    Some(command)
}

/// Runs the main loop of the TUI application.
///
/// Keyboard commands and autopilot ticks go through the same loop, so turns
/// never interleave.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, &app.game.view(), app.autopilot.is_some()))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                        KeyCode::Char('r') => app.reset()?,
                        KeyCode::Char('p') => app.toggle_autopilot(),
                        code => {
                            if let Some(command) = key_command(code) {
                                app.command(command);
                            }
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, view: &GameView<'_>, autopilot: bool) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(frame.area());
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_layout[0]);

    render_map(frame, top[0], view);
    render_status(frame, top[1], view, autopilot);

    let help_text = Paragraph::new(
        "Arrows/hjkl move  z/x turn  space shoot  g grab  c climb  p autopilot  r reset  q quit",
    )
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[1]);
}

fn agent_glyph(heading: Heading) -> &'static str {
    match heading {
        Heading::Right => ">",
        Heading::Up => "^",
        Heading::Left => "<",
        Heading::Down => "v",
    }
}

/// One belief cell as a styled span.
fn belief_span(cell: &BeliefCell) -> Span<'static> {
    let danger = cell.percepts.contains(Percept::Breeze) || cell.percepts.contains(Percept::Stench);
    match cell.status {
        BeliefStatus::Safe if cell.visited && danger => {
            Span::styled(" ! ", Style::default().fg(Color::LightRed))
        }
        BeliefStatus::Safe if cell.visited => Span::styled(" . ", Style::default().fg(Color::Green)),
        BeliefStatus::Safe => Span::styled(" o ", Style::default().fg(Color::LightGreen)),
        BeliefStatus::MaybePit => Span::styled(" P?", Style::default().fg(Color::Gray)),
        BeliefStatus::MaybeWumpus => Span::styled(" W?", Style::default().fg(Color::Red)),
        BeliefStatus::Unknown => Span::styled(" # ", Style::default().fg(Color::DarkGray)),
    }
}

/// Renders the agent's belief map onto the frame.
fn render_map(frame: &mut Frame, area: Rect, view: &GameView<'_>) {
    let beliefs = view.beliefs;
    let agent = view.agent.position();

    let mut lines: Vec<Line> = Vec::with_capacity(beliefs.rows());
    for row in 0..beliefs.rows() {
        let mut spans: Vec<Span> = Vec::with_capacity(beliefs.cols());
        for col in 0..beliefs.cols() {
            let pos = Position::new(row, col);
            if pos == agent {
                spans.push(Span::styled(
                    format!(" {} ", agent_glyph(view.agent.direction)),
                    Style::default().fg(Color::Yellow).bold(),
                ));
            } else {
                spans.push(belief_span(&beliefs[pos]));
            }
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Wumpus World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Renders score, inventory, percepts and the last message.
fn render_status(frame: &mut Frame, area: Rect, view: &GameView<'_>, autopilot: bool) {
    let agent = &view.agent;
    let state_style = match view.state {
        GameState::Running => Style::default(),
        GameState::Won => Style::default().fg(Color::Green).bold(),
        GameState::Lost => Style::default().fg(Color::Red).bold(),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(view.state.to_string(), state_style),
        ]),
        Line::from(format!("Score: {}", agent.score)),
        Line::from(format!("Facing: {}", agent.direction)),
        Line::from(format!("Arrow: {}", yes_no(agent.has_arrow))),
        Line::from(format!("Gold: {}", yes_no(agent.has_gold))),
        Line::from(format!("Percepts: {}", view.percepts)),
        Line::from(format!("Facts known: {}", view.facts.len())),
        Line::from(format!("Autopilot: {}", if autopilot { "on" } else { "off" })),
        Line::from(""),
    ];
    if !view.message.is_empty() {
        lines.push(Line::from(Span::styled(
            view.message.to_string(),
            Style::default().fg(Color::Cyan),
        )));
    }
    match view.state {
        GameState::Won => lines.push(Line::from(format!(
            "Congratulations! You won with a score of {}!",
            agent.score
        ))),
        GameState::Lost => lines.push(Line::from(format!(
            "You lost! Final score: {}",
            agent.score
        ))),
        GameState::Running => {}
    }

    let status = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Game Status"));
    frame.render_widget(status, area);
}
