//! Match configuration supplied when the world is created.

use ricochet_core::TeamId;
use ricochet_system_targeting::Config as TargetingConfig;
use serde::{Deserialize, Serialize};

/// Tunable parameters of a match.
///
/// Every field has a default, so partial configuration files only override
/// what they name.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of a tile in continuous units.
    pub tile_size: f64,
    /// Characters each team places before combat starts.
    pub units_per_team: u32,
    /// Maximum walking distance from the flag at which characters spawn.
    pub spawn_radius: u32,
    /// Team that places first and acts first in combat.
    pub first_team: TeamId,
    /// Movement animation speed in continuous units per second. Non-positive
    /// values make moves complete instantly.
    pub move_speed: f64,
    /// Projectile animation speed in continuous units per second.
    /// Non-positive values make shots resolve instantly.
    pub projectile_speed: f64,
    /// Shot resolver tuning.
    pub targeting: TargetingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            units_per_team: 3,
            spawn_radius: 2,
            first_team: TeamId::new(0),
            move_speed: 192.0,
            projectile_speed: 768.0,
            targeting: TargetingConfig::default(),
        }
    }
}
