use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jigsaw_core::geometry::path_data;
use jigsaw_core::{
    difficulties, render_grid, Grid, OrientationMode, PathCommand, Point, PuzzleConfig, Rect,
    Side,
};
use serde::Serialize;

mod solver;

#[derive(Parser)]
#[command(name = "jigsaw", version, about = "Generate jigsaw cut patterns and exercise the snap engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the cut pattern of a puzzle as SVG or JSON.
    Generate {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
        format: OutputFormat,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List piece-count options for an image size.
    Difficulties {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Scatter a puzzle and let the built-in solver put it back together.
    Solve {
        #[command(subcommand)]
        command: solver::SolveCommand,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Svg,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Fixed,
    TwoFold,
    FourFold,
}

impl From<OrientationArg> for OrientationMode {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Fixed => OrientationMode::Fixed,
            OrientationArg::TwoFold => OrientationMode::TwoFold,
            OrientationArg::FourFold => OrientationMode::FourFold,
        }
    }
}

/// Puzzle settings: an optional TOML file, overridden by flags.
#[derive(clap::Args)]
struct PuzzleArgs {
    #[arg(long, env = "JIGSAW_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    rows: Option<u32>,
    #[arg(long)]
    cols: Option<u32>,
    /// Decimal or 0x-prefixed hex.
    #[arg(long, env = "JIGSAW_SEED")]
    seed: Option<String>,
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,
    #[arg(long)]
    snap_tolerance: Option<f64>,
    #[arg(long)]
    rotation_ms: Option<f64>,
}

impl PuzzleArgs {
    fn resolve(&self) -> Result<PuzzleConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => PuzzleConfig::load(path)?,
            None => PuzzleConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(raw) = self.seed.as_deref() {
            config.seed = parse_seed_arg(raw)?;
        }
        if let Some(orientation) = self.orientation {
            config.orientation = orientation.into();
        }
        if let Some(ratio) = self.snap_tolerance {
            config.snap_tolerance_ratio = ratio;
        }
        if let Some(ms) = self.rotation_ms {
            config.rotation_duration_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct PuzzleJson {
    width: f64,
    height: f64,
    rows: u32,
    cols: u32,
    seed: u32,
    pieces: Vec<PieceJson>,
}

#[derive(Serialize)]
struct PieceJson {
    id: usize,
    row: u32,
    col: u32,
    bounds: Rect,
    origin: Point,
    neighbors: [Option<usize>; 4],
    top: Vec<PathCommand>,
    right: Vec<PathCommand>,
    bottom: Vec<PathCommand>,
    left: Vec<PathCommand>,
    path: String,
}

fn grid_json(grid: &Grid) -> PuzzleJson {
    PuzzleJson {
        width: grid.width(),
        height: grid.height(),
        rows: grid.rows(),
        cols: grid.cols(),
        seed: grid.seed(),
        pieces: grid
            .pieces()
            .iter()
            .map(|piece| PieceJson {
                id: piece.id(),
                row: piece.row(),
                col: piece.col(),
                bounds: piece.bounds(),
                origin: piece.origin(),
                neighbors: grid.neighbors(piece.id()),
                top: piece.boundary(Side::Top),
                right: piece.boundary(Side::Right),
                bottom: piece.boundary(Side::Bottom),
                left: piece.boundary(Side::Left),
                path: path_data(&piece.outline()),
            })
            .collect(),
    }
}

fn write_output(output: Option<&PathBuf>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            puzzle,
            format,
            output,
        } => {
            let config = puzzle.resolve()?;
            let grid = Grid::generate(config.width, config.height, config.rows, config.cols, config.seed)?;
            let text = match format {
                OutputFormat::Svg => render_grid(&grid),
                OutputFormat::Json => {
                    let mut json = serde_json::to_string_pretty(&grid_json(&grid))?;
                    json.push('\n');
                    json
                }
            };
            write_output(output.as_ref(), &text)?;
        }
        Commands::Difficulties { width, height } => {
            let choices = difficulties(width, height);
            if choices.is_empty() {
                eprintln!("no grid fits a {width}x{height} image");
            }
            for choice in choices {
                println!("{}", choice.label());
            }
        }
        Commands::Solve { command } => solver::run(command)?,
        Commands::Config { puzzle } => {
            let config = puzzle.resolve()?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn parse_seed_arg(raw: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u32>()?
    };
    Ok(value)
}
