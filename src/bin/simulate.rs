use chrono::{SecondsFormat, Utc};
use clap::Parser;
use pacman_grid_engine::config::{Difficulty, EngineConfig};
use pacman_grid_engine::driver;
use pacman_grid_engine::error::{ConfigError, DriverError, GridError, LevelError};
use pacman_grid_engine::grid::Grid;
use pacman_grid_engine::level::Level;
use pacman_grid_engine::navigation::{find_nearest, shortest_path};
use pacman_grid_engine::types::{
    Coord, Direction, EntityClass, EntityId, EntityKind, GhostKind, LevelEvent, LevelSnapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PLAYER_STEP_MS: u64 = 200;

const DEMO_BOARD: &[&str] = &[
    "###############",
    "#......#......#",
    "#.###.###.###.#",
    "#......P......#",
    "#.###.#B#.###.#",
    "#.....KIC.....#",
    "#.###.###.###.#",
    "#.............#",
    "###############",
];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Tick budget before the run is called a timeout.
    #[arg(long, default_value_t = 2_400)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    difficulty: Option<String>,
    /// JSON engine config; flags above override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run on the tokio driver against the wall clock.
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum SimulateError {
    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("level driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Cleared,
    Lost,
    Timeout,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "finishedAt")]
    finished_at: String,
    mode: &'static str,
    seed: u64,
    difficulty: Difficulty,
    outcome: Outcome,
    #[serde(rename = "elapsedMs")]
    elapsed_ms: u64,
    score: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "remainingPellets")]
    remaining_pellets: usize,
    snapshot: LevelSnapshot,
}

#[derive(Debug, Default)]
struct Tally {
    pellets_eaten: u32,
    outcome: Option<Outcome>,
}

impl Tally {
    fn record(&mut self, event: &LevelEvent) {
        match event {
            LevelEvent::PelletEaten { .. } => self.pellets_eaten += 1,
            LevelEvent::LevelWon => {
                self.outcome.get_or_insert(Outcome::Cleared);
            }
            LevelEvent::LevelLost => {
                self.outcome.get_or_insert(Outcome::Lost);
            }
            _ => {}
        }
    }

    fn finished(&self) -> bool {
        self.outcome.is_some()
    }
}

struct DemoLevel {
    level: Level,
    tick_ms: u64,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let summary = match run(&cli).await {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "simulation_failed");
            std::process::exit(2);
        }
    };

    println!(
        "{}",
        serde_json::to_string(&summary).expect("run summary should serialize")
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(error = %err, path = %path.display(), "summary_write_failed");
            std::process::exit(2);
        }
        info!(path = %path.display(), "summary_written");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

async fn run(cli: &Cli) -> Result<RunSummary, SimulateError> {
    let config = resolve_config(cli)?;
    let seed = config.seed;
    let difficulty = config.difficulty;
    let demo = build_demo_level(config)?;
    info!(seed, ?difficulty, ticks = cli.ticks, realtime = cli.realtime, "run_started");

    let mut rng = StdRng::seed_from_u64(seed);
    let (mode, level, tally, elapsed_ms) = if cli.realtime {
        let (level, tally, elapsed_ms) = run_realtime(demo, cli.ticks, &mut rng).await?;
        ("realtime", level, tally, elapsed_ms)
    } else {
        let (level, tally, elapsed_ms) = run_stepped(demo, cli.ticks, &mut rng)?;
        ("stepped", level, tally, elapsed_ms)
    };

    let snapshot = level.snapshot();
    let score: u32 = snapshot.players.iter().map(|player| player.score).sum();
    let summary = RunSummary {
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        mode,
        seed,
        difficulty,
        outcome: tally.outcome.unwrap_or(Outcome::Timeout),
        elapsed_ms,
        score,
        pellets_eaten: tally.pellets_eaten,
        remaining_pellets: snapshot.remaining_pellets,
        snapshot,
    };
    info!(outcome = ?summary.outcome, score, elapsed_ms, "run_finished");
    Ok(summary)
}

fn resolve_config(cli: &Cli) -> Result<EngineConfig, SimulateError> {
    let mut config = match cli.config.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| SimulateError::Read {
                path: path.clone(),
                source,
            })?;
            EngineConfig::from_json_str(&raw)?
        }
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(raw) = cli.difficulty.as_deref() {
        config.difficulty = Difficulty::parse(raw)
            .ok_or_else(|| SimulateError::UnknownDifficulty(raw.to_string()))?;
    }
    config.validate()?;
    Ok(config)
}

/// Reads a board drawn as rows of `#` walls, `.` pellets, `P` start cells
/// and `B`/`K`/`I`/`C` ghosts.
fn read_board(rows: &[&str]) -> Result<(Grid, Vec<EntityId>, Vec<Coord>), GridError> {
    let height = rows.len() as i32;
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
    let cells = || {
        rows.iter().enumerate().flat_map(|(y, row)| {
            row.bytes()
                .enumerate()
                .map(move |(x, ch)| (Coord::new(x as i32, y as i32), ch))
        })
    };

    let walls = cells().filter(|(_, ch)| *ch == b'#').map(|(at, _)| at);
    let mut grid = Grid::with_walls(width, height, walls)?;
    let mut ghosts = Vec::new();
    let mut start_cells = Vec::new();
    for (at, ch) in cells() {
        match ch {
            b'.' => {
                grid.spawn(EntityKind::Pellet, at)?;
            }
            b'P' => start_cells.push(at),
            b'B' | b'K' | b'I' | b'C' => {
                let kind = match ch {
                    b'B' => GhostKind::Blinky,
                    b'K' => GhostKind::Pinky,
                    b'I' => GhostKind::Inky,
                    _ => GhostKind::Clyde,
                };
                ghosts.push(grid.spawn(EntityKind::Ghost(kind), at)?);
            }
            _ => {}
        }
    }
    Ok((grid, ghosts, start_cells))
}

fn build_demo_level(config: EngineConfig) -> Result<DemoLevel, SimulateError> {
    let tick_ms = config.tick_ms;
    let (grid, ghosts, start_cells) = read_board(DEMO_BOARD)?;
    let level = Level::new(grid, ghosts, start_cells, config)?;
    Ok(DemoLevel { level, tick_ms })
}

/// Heads for the nearest reachable pellet.
fn seek_pellet(grid: &Grid, player: EntityId) -> Option<Direction> {
    let from = grid.position(player)?;
    let pellet = find_nearest(grid, EntityClass::Pellet, from)?;
    let to = grid.position(pellet)?;
    shortest_path(grid, from, to, Some(player))?.first().copied()
}

fn random_direction(rng: &mut StdRng) -> Direction {
    Direction::ALL[rng.random_range(0..Direction::ALL.len())]
}

fn run_stepped(
    demo: DemoLevel,
    ticks: u64,
    rng: &mut StdRng,
) -> Result<(Level, Tally, u64), SimulateError> {
    let DemoLevel { mut level, tick_ms } = demo;
    let player = level.create_player();
    level.register_player(player)?;
    level.start();

    let mut tally = Tally::default();
    let mut elapsed_ms = 0u64;
    let mut next_player_ms = 0u64;
    for _ in 0..ticks {
        elapsed_ms += tick_ms;
        if elapsed_ms >= next_player_ms {
            let dir = seek_pellet(level.grid(), player).unwrap_or_else(|| random_direction(rng));
            level.move_entity(player, dir)?;
            next_player_ms = elapsed_ms + PLAYER_STEP_MS;
        }
        level.tick(tick_ms)?;
        for event in level.drain_events() {
            tally.record(&event);
        }
        if tally.finished() {
            break;
        }
    }
    level.stop();
    Ok((level, tally, elapsed_ms))
}

async fn run_realtime(
    demo: DemoLevel,
    ticks: u64,
    rng: &mut StdRng,
) -> Result<(Level, Tally, u64), SimulateError> {
    let DemoLevel { level, tick_ms } = demo;
    let budget = Duration::from_millis(ticks.saturating_mul(tick_ms));
    let (handle, task) = driver::spawn(level, Duration::from_millis(tick_ms));
    let mut events = handle.subscribe();
    let player = handle.join().await?;
    handle.start().await?;

    let started = tokio::time::Instant::now();
    let deadline = tokio::time::sleep(budget);
    tokio::pin!(deadline);
    let mut pace = tokio::time::interval(Duration::from_millis(PLAYER_STEP_MS));
    let mut tally = Tally::default();

    while !tally.finished() {
        tokio::select! {
            _ = &mut deadline => break,
            _ = pace.tick() => {
                let planned = handle
                    .query(move |level| seek_pellet(level.grid(), player))
                    .await?;
                let dir = planned.unwrap_or_else(|| random_direction(rng));
                handle.move_entity(player, dir).await?;
            }
            event = events.recv() => match event {
                Ok(event) => tally.record(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event_stream_lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await?;
    let level = task.await?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok((level, tally, elapsed_ms))
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
