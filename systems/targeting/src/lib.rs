#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves where shots land.
//!
//! Bullets are ray-marched through the grid until they strike an obstacle,
//! an enemy character or the play-area border, and then reflected until the
//! ricochet budget runs out. Splash projectiles skip the march entirely and
//! land on the tile the player picked.

use std::collections::{BTreeSet, HashMap, HashSet};

use glam::DVec2;
use ricochet_core::{
    geometry::{detect_ray_segment_collision, reflect, COLLISION_EPSILON},
    CharacterId, CharacterView, LineSegment, ProjectileDetails, Ray, Target, TargetKind, TeamId,
    TileCoord, TileGrid,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MARCH_STEP_FRACTION: f64 = 0.75;
const DEFAULT_BORDER_INSET_FRACTION: f64 = 0.05;

/// Tuning parameters of the shot resolver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance between march samples, as a fraction of the tile size.
    pub march_step_fraction: f64,
    /// Distance a border ricochet is pushed back into the grid, as a fraction
    /// of the tile size.
    pub border_inset_fraction: f64,
}

impl Config {
    /// Creates a configuration from explicit fractions of the tile size.
    #[must_use]
    pub const fn new(march_step_fraction: f64, border_inset_fraction: f64) -> Self {
        Self {
            march_step_fraction,
            border_inset_fraction,
        }
    }

    fn march_step(&self, tile_size: f64) -> f64 {
        self.march_step_fraction * tile_size
    }

    fn border_inset(&self, tile_size: f64) -> f64 {
        self.border_inset_fraction * tile_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MARCH_STEP_FRACTION, DEFAULT_BORDER_INSET_FRACTION)
    }
}

/// Failures raised while resolving a shot.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TargetingError {
    /// The ray never met the border, so the grid is not a closed rectangle
    /// around the origin.
    #[error("ray from {origin} along {direction} never reaches the grid border")]
    RayEscapedGrid {
        /// Origin of the offending ray.
        origin: DVec2,
        /// Direction of the offending ray.
        direction: DVec2,
    },
    /// A reflection produced a zero-length direction.
    #[error("ricochet at {0} produced no direction")]
    DegenerateReflection(DVec2),
}

/// Immutable snapshot of everything a shot can collide with.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Battlefield layout.
    pub grid: &'a TileGrid,
    /// Tiles blocked by obstacles.
    pub obstacles: &'a BTreeSet<TileCoord>,
    /// Characters on the battlefield; dead ones are ignored.
    pub characters: &'a CharacterView,
}

/// Damage dealt to a single character by a splash projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplashHit {
    /// Character caught in the blast.
    pub character: CharacterId,
    /// Manhattan distance from the impact tile.
    pub distance: u32,
    /// Damage after falloff.
    pub damage: f64,
}

/// Shot resolver that reuses scratch buffers between queries.
#[derive(Debug, Default)]
pub struct Targeting {
    config: Config,
    checked: HashSet<TileCoord>,
    occupants: HashMap<TileCoord, CharacterId>,
}

impl Targeting {
    /// Creates a new resolver with the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            checked: HashSet::new(),
            occupants: HashMap::new(),
        }
    }

    /// Finds the first surface the ray strikes.
    ///
    /// Samples are taken every march step; at each sample the sampled tile
    /// and its four neighbours are checked, skipping tiles checked before and
    /// the start tile. The nearest hit among the tiles of the first
    /// productive sample wins, so a farther tile is never consulted once a
    /// candidate exists. Without any hit the border is returned.
    pub fn find_first_target(
        &mut self,
        scene: &Scene<'_>,
        ray: Ray,
        start_tile: TileCoord,
        shooter_team: TeamId,
    ) -> Result<Target, TargetingError> {
        self.prepare_occupants(scene.characters);
        self.march(scene, ray, start_tile, shooter_team)
    }

    /// Resolves the full ricochet chain of a bullet into `out`.
    ///
    /// The output buffer is cleared first. The chain ends at the first
    /// character hit or once `max_ricochets` reflections were spent, so it
    /// never holds more than `max_ricochets + 1` targets. Border hits stop
    /// the current leg without ending the chain.
    pub fn resolve_shot_path(
        &mut self,
        scene: &Scene<'_>,
        ray: Ray,
        start_tile: TileCoord,
        shooter_team: TeamId,
        max_ricochets: u32,
        out: &mut Vec<Target>,
    ) -> Result<(), TargetingError> {
        out.clear();
        self.prepare_occupants(scene.characters);

        let mut ray = ray;
        let mut start_tile = start_tile;
        let mut bounces_left = max_ricochets;

        loop {
            let target = self.march(scene, ray, start_tile, shooter_team)?;
            out.push(target);

            if target.character().is_some() || bounces_left == 0 {
                return Ok(());
            }
            let Some(normal) = target.normal else {
                return Ok(());
            };

            let direction = reflect(ray.direction(), normal);
            let mut origin = target.point;
            if target.is_border() {
                origin += normal * self.config.border_inset(scene.grid.tile_size());
                start_tile = scene.grid.clamp(scene.grid.continuous_to_tile(origin));
            } else {
                start_tile = target.tile;
            }

            ray = Ray::new(origin, direction)
                .ok_or(TargetingError::DegenerateReflection(target.point))?;
            bounces_left -= 1;
        }
    }

    fn prepare_occupants(&mut self, characters: &CharacterView) {
        self.occupants.clear();
        for character in characters.living() {
            let _ = self.occupants.insert(character.tile, character.id);
        }
    }

    fn march(
        &mut self,
        scene: &Scene<'_>,
        ray: Ray,
        start_tile: TileCoord,
        shooter_team: TeamId,
    ) -> Result<Target, TargetingError> {
        let grid = scene.grid;
        let border = border_target(grid, ray)?;

        let step = self.config.march_step(grid.tile_size());
        if step.is_nan() || step <= 0.0 {
            return Ok(border);
        }

        self.checked.clear();
        let _ = self.checked.insert(start_tile);

        let sample_count = (border.distance / step).ceil() as u64;
        for index in 0..=sample_count {
            let distance = (index as f64 * step).min(border.distance);
            let sampled = grid.continuous_to_tile(ray.point_at(distance));

            let mut best: Option<Target> = None;
            for tile in std::iter::once(sampled).chain(sampled.neighbors()) {
                if !grid.contains(tile) || !self.checked.insert(tile) {
                    continue;
                }
                let Some(candidate) = self.hit_in_tile(scene, ray, tile, shooter_team) else {
                    continue;
                };
                if best.map_or(true, |current| candidate.distance < current.distance) {
                    best = Some(candidate);
                }
            }

            if let Some(target) = best {
                return Ok(target);
            }
        }

        Ok(border)
    }

    fn hit_in_tile(
        &self,
        scene: &Scene<'_>,
        ray: Ray,
        tile: TileCoord,
        shooter_team: TeamId,
    ) -> Option<Target> {
        let edges = scene.grid.tile_edges(tile);

        if scene.obstacles.contains(&tile) {
            let front_faces = edges
                .iter()
                .filter(|edge| !edge.faces_away_from(ray.direction()));
            return nearest_hit(ray, front_faces)
                .map(|hit| hit.into_target(ray, tile, TargetKind::Obstacle));
        }

        let character = *self.occupants.get(&tile)?;
        if character.team() == shooter_team {
            return None;
        }
        nearest_hit(ray, edges.iter())
            .map(|hit| hit.into_target(ray, tile, TargetKind::Character(character)))
    }
}

/// Convenience wrapper resolving a single ricochet chain.
pub fn resolve_shot_path(
    config: Config,
    scene: &Scene<'_>,
    ray: Ray,
    start_tile: TileCoord,
    shooter_team: TeamId,
    max_ricochets: u32,
) -> Result<Vec<Target>, TargetingError> {
    let mut out = Vec::new();
    Targeting::new(config).resolve_shot_path(
        scene,
        ray,
        start_tile,
        shooter_team,
        max_ricochets,
        &mut out,
    )?;
    Ok(out)
}

/// Target of a splash projectile thrown from `origin` onto `destination`.
#[must_use]
pub fn resolve_splash(grid: &TileGrid, origin: TileCoord, destination: TileCoord) -> Target {
    let from = grid.tile_center(origin);
    let to = grid.tile_center(destination);
    let ray = Ray::new(from, to - from).unwrap_or_else(|| Ray::from_angle(from, 0.0));
    Target {
        tile: destination,
        point: to,
        normal: None,
        ray,
        kind: TargetKind::Destination,
        distance: from.distance(to),
    }
}

/// Damage dealt by a splash projectile landing on `impact`.
///
/// Every living character within the projectile's radius is hit, whatever
/// its team. Damage is multiplied by the falloff once per tile of Manhattan
/// distance. Bullets produce no splash.
#[must_use]
pub fn splash_damage(
    impact: TileCoord,
    projectile: &ProjectileDetails,
    characters: &CharacterView,
) -> Vec<SplashHit> {
    let ProjectileDetails::Splash {
        damage,
        radius,
        damage_falloff_per_tile,
        ..
    } = *projectile
    else {
        return Vec::new();
    };

    characters
        .living()
        .filter_map(|character| {
            let distance = character.tile.manhattan_distance(impact);
            (distance <= radius).then(|| SplashHit {
                character: character.id,
                distance,
                damage: damage * damage_falloff_per_tile.powi(distance as i32),
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Hit {
    point: DVec2,
    normal: DVec2,
    distance: f64,
}

impl Hit {
    fn into_target(self, ray: Ray, tile: TileCoord, kind: TargetKind) -> Target {
        Target {
            tile,
            point: self.point,
            normal: Some(self.normal),
            ray,
            kind,
            distance: self.distance,
        }
    }
}

fn nearest_hit<'s>(ray: Ray, edges: impl Iterator<Item = &'s LineSegment>) -> Option<Hit> {
    edges
        .filter_map(|edge| {
            let point = detect_ray_segment_collision(&ray, edge)?;
            let distance = point.distance(ray.origin());
            (distance > COLLISION_EPSILON).then_some(Hit {
                point,
                normal: edge.normal(),
                distance,
            })
        })
        .min_by(|left, right| left.distance.total_cmp(&right.distance))
}

fn border_target(grid: &TileGrid, ray: Ray) -> Result<Target, TargetingError> {
    let borders = grid.border_segments();
    let hit = nearest_hit(ray, borders.iter()).ok_or(TargetingError::RayEscapedGrid {
        origin: ray.origin(),
        direction: ray.direction(),
    })?;
    let tile = grid.clamp(grid.continuous_to_tile(hit.point));
    Ok(hit.into_target(ray, tile, TargetKind::Border))
}
