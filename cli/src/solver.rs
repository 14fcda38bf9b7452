use std::path::PathBuf;

use jigsaw_core::{
    Board, BoardEvent, Corner, MemoryScene, Point, PuzzleConfig, Rect, Rotation, RotationRequest,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::PuzzleArgs;

#[derive(clap::Subcommand)]
pub(super) enum SolveCommand {
    /// Scatter the pieces beside the board, then drag each one home.
    Run {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        /// Seed for scattering and visiting order; random when omitted.
        #[arg(long)]
        solver_seed: Option<u64>,
        /// Random offset added to every drop, in pixels.
        #[arg(long, default_value_t = 1.0)]
        jitter_px: f64,
        /// Number of drag_by calls per move.
        #[arg(long, default_value_t = 4)]
        drag_steps: u32,
        #[arg(long)]
        json: bool,
        /// Write the final scene as SVG.
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct SolveOptions {
    pub seed: u64,
    pub jitter_px: f64,
    pub drag_steps: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct SolveReport {
    pub pieces: usize,
    pub seed: u64,
    pub moves: usize,
    pub rotations: usize,
    pub snaps: usize,
    pub groups: usize,
    pub completed: bool,
}

pub(super) fn run(command: SolveCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SolveCommand::Run {
            puzzle,
            solver_seed,
            jitter_px,
            drag_steps,
            json,
            svg,
        } => {
            let config = puzzle.resolve()?;
            let options = SolveOptions {
                seed: solver_seed.unwrap_or_else(|| rand::rng().random()),
                jitter_px,
                drag_steps,
            };
            let (board, report) = solve(&config, options)?;
            if let Some(path) = svg {
                let width = config.width * 2.0 + scatter_gap(&config);
                std::fs::write(&path, board.scene().to_svg(width, config.height))?;
                info!("wrote {}", path.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} pieces, seed {:#x}: {} moves, {} rotations, {} snaps, {} group(s) left, {}",
                    report.pieces,
                    report.seed,
                    report.moves,
                    report.rotations,
                    report.snaps,
                    report.groups,
                    if report.completed { "completed" } else { "unfinished" }
                );
            }
            Ok(())
        }
    }
}

fn scatter_gap(config: &PuzzleConfig) -> f64 {
    config.width.min(config.height) * 0.1
}

/// Runs a scripted player against a fresh in-memory board.
pub(crate) fn solve(
    config: &PuzzleConfig,
    options: SolveOptions,
) -> Result<(Board<MemoryScene>, SolveReport), Box<dyn std::error::Error>> {
    let mut board = Board::from_config(config, MemoryScene::new())?;
    let mut rng = StdRng::seed_from_u64(options.seed);

    let gap = scatter_gap(config);
    let area = Rect::from_points(
        Point::new(config.width + gap, 0.0),
        Point::new(config.width * 2.0 + gap, config.height),
    );
    board.scatter(rng.random(), area)?;

    let limit = board.snap_tolerance() * 0.4;
    let jitter = if options.jitter_px.abs() > limit {
        warn!(
            "jitter {:.2}px clamped to {:.2}px to stay within snap tolerance",
            options.jitter_px, limit
        );
        limit
    } else {
        options.jitter_px.abs()
    };
    let steps = options.drag_steps.max(1);

    let mut order: Vec<usize> = (0..board.grid().len()).collect();
    order.shuffle(&mut rng);

    let mut report = SolveReport {
        pieces: board.grid().len(),
        seed: options.seed,
        moves: 0,
        rotations: 0,
        snaps: 0,
        groups: 0,
        completed: false,
    };

    for piece in order {
        if board.is_complete() {
            break;
        }
        report.rotations += turn_upright(&mut board, piece)?;

        let home = board.grid().piece_by_id(piece)?.bounds().min;
        let current = board.absolute_corner(piece, Corner::TopLeft)?;
        let offset = if jitter > 0.0 {
            Point::new(
                rng.random_range(-jitter..=jitter),
                rng.random_range(-jitter..=jitter),
            )
        } else {
            Point::ZERO
        };
        let delta = home + offset - current;

        let target = board.top_level(piece)?;
        if !board.begin_drag(target)? {
            debug!("piece {piece} is busy, skipping");
            continue;
        }
        let step = delta.scale(1.0 / f64::from(steps));
        for _ in 0..steps {
            board.drag_by(target, step)?;
        }
        board.drop_target(target)?;
        report.moves += 1;
    }

    report.snaps = board
        .take_events()
        .iter()
        .filter(|event| matches!(event, BoardEvent::Snapped { .. }))
        .count();
    report.groups = board.group_count();
    report.completed = board.is_complete();
    info!(
        "solver finished after {} moves, completed: {}",
        report.moves, report.completed
    );
    Ok((board, report))
}

/// Rotates the object holding `piece` until it sits at 0 degrees.
fn turn_upright(
    board: &mut Board<MemoryScene>,
    piece: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut turns = 0;
    let wait = board.settings().rotation_duration_ms + 1.0;
    while board.absolute_rotation(piece)? != Rotation::Deg0 && turns < 4 {
        let target = board.top_level(piece)?;
        match board.request_rotation(target)? {
            RotationRequest::Started => board.tick(wait)?,
            RotationRequest::Rejected(reason) => {
                warn!("rotation of piece {piece} rejected: {reason:?}");
                break;
            }
        }
        turns += 1;
    }
    Ok(turns)
}
