//! Ad-hoc battlefield assembled from command-line arguments.

use std::collections::BTreeSet;

use anyhow::{bail, ensure, Context, Result};
use ricochet_core::{
    CharacterClass, CharacterId, CharacterSnapshot, CharacterView, Ray, Target, TeamId, TileCoord,
    TileGrid,
};
use ricochet_system_pathing::shortest_path;
use ricochet_system_reachability::compute_reachable;
use ricochet_system_targeting::{resolve_shot_path, Config as TargetingConfig, Scene};
use ricochet_world::GameConfig;

const SHOOTER_TEAM: TeamId = TeamId::new(0);
const ENEMY_TEAM: TeamId = TeamId::new(1);

/// Grid and obstacles; every query treats obstacles as the only blockers.
#[derive(Debug)]
pub(crate) struct Battlefield {
    grid: TileGrid,
    obstacles: BTreeSet<TileCoord>,
    targeting: TargetingConfig,
}

impl Battlefield {
    pub(crate) fn new(
        columns: u32,
        rows: u32,
        obstacles: Vec<TileCoord>,
        config: &GameConfig,
    ) -> Result<Self> {
        ensure!(
            columns > 0 && rows > 0,
            "the grid needs at least one column and one row"
        );
        ensure!(
            config.tile_size > 0.0 && config.tile_size.is_finite(),
            "tile size {} must be positive and finite",
            config.tile_size
        );

        let grid = TileGrid::new(columns, rows, config.tile_size);
        let mut blocked = BTreeSet::new();
        for tile in obstacles {
            ensure!(grid.contains(tile), "obstacle {tile} is outside the grid");
            if !blocked.insert(tile) {
                log::warn!("obstacle {tile} was listed more than once");
            }
        }
        log::debug!("battlefield {columns}x{rows} with {} obstacles", blocked.len());

        Ok(Self {
            grid,
            obstacles: blocked,
            targeting: config.targeting,
        })
    }

    fn check_open(&self, tile: TileCoord, role: &str) -> Result<()> {
        ensure!(self.grid.contains(tile), "{role} tile {tile} is outside the grid");
        ensure!(
            !self.obstacles.contains(&tile),
            "{role} tile {tile} holds an obstacle"
        );
        Ok(())
    }

    pub(crate) fn range(&self, from: TileCoord, depth: u32) -> Result<BTreeSet<TileCoord>> {
        self.check_open(from, "start")?;
        let open = |tile: TileCoord| !self.obstacles.contains(&tile);
        Ok(compute_reachable(&self.grid, from, depth, open, open))
    }

    pub(crate) fn path(&self, from: TileCoord, to: TileCoord) -> Result<Vec<TileCoord>> {
        self.check_open(from, "start")?;
        self.check_open(to, "destination")?;
        let open = |tile: TileCoord| !self.obstacles.contains(&tile);
        shortest_path(&self.grid, from, to, open, open)
            .with_context(|| format!("cannot walk from {from} to {to}"))
    }

    /// Resolves a bullet fired by a team 0 rifleman on `from` at rifleman
    /// enemies standing on `enemies`.
    pub(crate) fn shot(
        &self,
        from: TileCoord,
        angle: f64,
        ricochets: u32,
        enemies: &[TileCoord],
    ) -> Result<Vec<Target>> {
        self.check_open(from, "shooter")?;
        let mut occupied = BTreeSet::from([from]);
        for &tile in enemies {
            self.check_open(tile, "enemy")?;
            if !occupied.insert(tile) {
                bail!("tile {tile} is occupied twice");
            }
        }

        let mut snapshots = vec![rifleman(CharacterId::new(SHOOTER_TEAM, 0), from, angle)];
        snapshots.extend(
            (0u32..)
                .zip(enemies)
                .map(|(index, &tile)| rifleman(CharacterId::new(ENEMY_TEAM, index), tile, 0.0)),
        );
        let characters = CharacterView::from_snapshots(snapshots);
        let scene = Scene {
            grid: &self.grid,
            obstacles: &self.obstacles,
            characters: &characters,
        };

        let origin = self.grid.tile_center(from);
        let ray = Ray::from_angle(origin, angle);
        let targets =
            resolve_shot_path(self.targeting, &scene, ray, from, SHOOTER_TEAM, ricochets)
                .with_context(|| format!("cannot resolve the shot from {from}"))?;
        log::debug!("shot from {origin} stopped {} times", targets.len());
        Ok(targets)
    }
}

fn rifleman(id: CharacterId, tile: TileCoord, aim_angle: f64) -> CharacterSnapshot {
    let config = CharacterClass::Rifleman.config();
    CharacterSnapshot {
        id,
        class: CharacterClass::Rifleman,
        tile,
        health: config.max_health,
        max_health: config.max_health,
        aim_angle,
        has_moved: false,
        has_shot: false,
        is_finished: false,
    }
}
