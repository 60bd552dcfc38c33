#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line inspector for Ricochet Squad battlefields.
//!
//! Answers the questions a renderer would ask the core (movement ranges,
//! walking paths and ricochet chains) without opening a window.

mod battlefield;
mod report;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ricochet_core::TileCoord;
use ricochet_world::GameConfig;

use crate::{battlefield::Battlefield, report::Report};

/// Inspect movement ranges, walking paths and ricochet chains.
#[derive(Debug, Parser)]
#[command(name = "ricochet", version)]
struct Cli {
    /// TOML file overriding the default match configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Battlefield layout shared by every subcommand.
#[derive(Debug, Args)]
struct FieldArgs {
    /// Number of tile columns.
    #[arg(long, default_value_t = 10)]
    columns: u32,

    /// Number of tile rows.
    #[arg(long, default_value_t = 6)]
    rows: u32,

    /// Obstacle tile as COLUMN,ROW. Repeat for several obstacles.
    #[arg(long = "obstacle", value_name = "COLUMN,ROW", value_parser = parse_tile)]
    obstacles: Vec<TileCoord>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tiles reachable from a tile within a number of steps.
    Range {
        #[command(flatten)]
        field: FieldArgs,

        /// Starting tile as COLUMN,ROW.
        #[arg(long, value_name = "COLUMN,ROW", value_parser = parse_tile)]
        from: TileCoord,

        /// Maximum number of steps.
        #[arg(long, default_value_t = 4)]
        depth: u32,
    },
    /// Print the shortest walking path between two tiles.
    Path {
        #[command(flatten)]
        field: FieldArgs,

        /// Starting tile as COLUMN,ROW.
        #[arg(long, value_name = "COLUMN,ROW", value_parser = parse_tile)]
        from: TileCoord,

        /// Destination tile as COLUMN,ROW.
        #[arg(long, value_name = "COLUMN,ROW", value_parser = parse_tile)]
        to: TileCoord,
    },
    /// Trace a bullet fired from a tile and list every surface it stops at.
    Shot {
        #[command(flatten)]
        field: FieldArgs,

        /// Shooter tile as COLUMN,ROW.
        #[arg(long, value_name = "COLUMN,ROW", value_parser = parse_tile)]
        from: TileCoord,

        /// Aim angle in degrees; 0 points along increasing columns and 90
        /// along increasing rows.
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,

        /// Number of ricochets before the bullet stops.
        #[arg(long, default_value_t = 1)]
        ricochets: u32,

        /// Enemy tile as COLUMN,ROW. Repeat for several enemies.
        #[arg(long = "enemy", value_name = "COLUMN,ROW", value_parser = parse_tile)]
        enemies: Vec<TileCoord>,
    },
}

fn parse_tile(value: &str) -> Result<TileCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected COLUMN,ROW but got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|error| format!("invalid column `{column}`: {error}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|error| format!("invalid row `{row}`: {error}"))?;
    Ok(TileCoord::new(column, row))
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

fn battlefield(field: FieldArgs, config: &GameConfig) -> Result<Battlefield> {
    Battlefield::new(field.columns, field.rows, field.obstacles, config)
}

fn run(command: Command, config: &GameConfig) -> Result<Report> {
    match command {
        Command::Range { field, from, depth } => {
            let tiles = battlefield(field, config)?.range(from, depth)?;
            Ok(Report::Range {
                from,
                depth,
                tiles: tiles.into_iter().collect(),
            })
        }
        Command::Path { field, from, to } => {
            let steps = battlefield(field, config)?.path(from, to)?;
            Ok(Report::Path { from, to, steps })
        }
        Command::Shot {
            field,
            from,
            angle,
            ricochets,
            enemies,
        } => {
            let targets = battlefield(field, config)?.shot(
                from,
                angle.to_radians(),
                ricochets,
                &enemies,
            )?;
            Ok(Report::Shot {
                from,
                angle_degrees: angle,
                targets,
            })
        }
    }
}

/// Entry point for the Ricochet Squad command-line inspector.
fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let report = run(cli.command, &config)?;
    println!("{}", report.render(cli.json)?);
    Ok(())
}
