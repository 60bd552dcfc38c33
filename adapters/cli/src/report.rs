//! Text and JSON rendering of query results.

use std::fmt;

use anyhow::{Context, Result};
use ricochet_core::{Target, TargetKind, TileCoord};
use serde::Serialize;

/// Result of a single subcommand.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub(crate) enum Report {
    Range {
        from: TileCoord,
        depth: u32,
        tiles: Vec<TileCoord>,
    },
    Path {
        from: TileCoord,
        to: TileCoord,
        steps: Vec<TileCoord>,
    },
    Shot {
        from: TileCoord,
        angle_degrees: f64,
        targets: Vec<Target>,
    },
}

impl Report {
    pub(crate) fn render(&self, json: bool) -> Result<String> {
        if json {
            serde_json::to_string_pretty(self).context("failed to encode the report as JSON")
        } else {
            Ok(self.to_string())
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { from, depth, tiles } => {
                writeln!(f, "{} tiles within {depth} steps of {from}:", tiles.len())?;
                write!(f, "{}", join(tiles))
            }
            Self::Path { from, to, steps } if steps.is_empty() => {
                write!(f, "{from} is already at {to}")
            }
            Self::Path { from, to, steps } => {
                writeln!(f, "{} steps from {from} to {to}:", steps.len())?;
                write!(f, "{}", join(steps))
            }
            Self::Shot {
                from,
                angle_degrees,
                targets,
            } => {
                write!(f, "shot from {from} at {angle_degrees} degrees")?;
                for (index, target) in targets.iter().enumerate() {
                    write!(
                        f,
                        "\n{}. {} at ({:.2}, {:.2}) in tile {} after {:.2}",
                        index + 1,
                        describe(target.kind),
                        target.point.x,
                        target.point.y,
                        target.tile,
                        target.distance
                    )?;
                }
                Ok(())
            }
        }
    }
}

fn join(tiles: &[TileCoord]) -> String {
    tiles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(kind: TargetKind) -> String {
    match kind {
        TargetKind::Border => "border".to_owned(),
        TargetKind::Obstacle => "obstacle".to_owned(),
        TargetKind::Character(character) => format!("hit {character}"),
        TargetKind::Destination => "destination".to_owned(),
    }
}
