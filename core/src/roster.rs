//! Playable character classes together with their weapons and abilities.

use serde::{Deserialize, Serialize};

/// Health restored by a single use of [`AbilityKind::Heal`].
pub const HEAL_AMOUNT: f64 = 30.0;

/// Projectile fired by a character's weapon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProjectileDetails {
    /// Point hit travelling in a straight line that ricochets off surfaces.
    Bullet {
        /// Damage dealt to the first enemy struck.
        damage: f64,
        /// Number of reflections allowed before the bullet stops.
        num_ricochets: u32,
    },
    /// Area hit landing on a chosen tile without reflecting.
    Splash {
        /// Damage dealt at the impact tile.
        damage: f64,
        /// Manhattan radius, in tiles, of the affected area.
        radius: u32,
        /// Multiplier applied once per tile of distance from the impact.
        damage_falloff_per_tile: f64,
        /// Maximum number of tiles the projectile may be thrown.
        range: u32,
    },
}

impl ProjectileDetails {
    /// Base damage of the projectile.
    #[must_use]
    pub const fn damage(&self) -> f64 {
        match self {
            Self::Bullet { damage, .. } | Self::Splash { damage, .. } => *damage,
        }
    }

    /// Reports whether the projectile reflects off surfaces.
    #[must_use]
    pub const fn ricochets(&self) -> bool {
        matches!(self, Self::Bullet { .. })
    }
}

/// Abilities characters may activate during their turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Allows the character to move again this turn.
    Dash,
    /// Grants the next shot this turn one additional ricochet.
    Overcharge,
    /// Restores health to the user or an adjacent teammate.
    Heal,
}

/// Static configuration describing how an ability may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Ability described by the configuration.
    pub kind: AbilityKind,
    /// Free abilities may be combined with shooting in the same turn.
    pub is_free: bool,
    /// Total uses per match, or `None` when unlimited.
    pub max_uses: Option<u32>,
    /// Turns the ability stays unavailable after use.
    pub cooldown_turns: u32,
}

/// Types of characters that can be placed onto the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterClass {
    /// Balanced infantry with a single ricochet.
    Rifleman,
    /// Heavy hitter that cannot fire after moving.
    Sniper,
    /// Throws splash explosives onto a chosen tile.
    Grenadier,
    /// Fast mover whose bullets bounce many times.
    Scout,
    /// Support class able to heal teammates.
    Medic,
}

impl CharacterClass {
    /// Every selectable class in menu order.
    pub const ALL: [Self; 5] = [
        Self::Rifleman,
        Self::Sniper,
        Self::Grenadier,
        Self::Scout,
        Self::Medic,
    ];

    /// Returns the gameplay configuration of the class.
    #[must_use]
    pub fn config(self) -> CharacterConfig {
        match self {
            Self::Rifleman => CharacterConfig {
                max_health: 100.0,
                max_move_distance: 4,
                can_fire_after_moving: true,
                projectile: ProjectileDetails::Bullet {
                    damage: 35.0,
                    num_ricochets: 1,
                },
                abilities: vec![AbilityConfig {
                    kind: AbilityKind::Overcharge,
                    is_free: true,
                    max_uses: None,
                    cooldown_turns: 2,
                }],
            },
            Self::Sniper => CharacterConfig {
                max_health: 80.0,
                max_move_distance: 3,
                can_fire_after_moving: false,
                projectile: ProjectileDetails::Bullet {
                    damage: 60.0,
                    num_ricochets: 2,
                },
                abilities: vec![AbilityConfig {
                    kind: AbilityKind::Overcharge,
                    is_free: true,
                    max_uses: Some(2),
                    cooldown_turns: 1,
                }],
            },
            Self::Grenadier => CharacterConfig {
                max_health: 110.0,
                max_move_distance: 3,
                can_fire_after_moving: true,
                projectile: ProjectileDetails::Splash {
                    damage: 50.0,
                    radius: 2,
                    damage_falloff_per_tile: 0.5,
                    range: 5,
                },
                abilities: Vec::new(),
            },
            Self::Scout => CharacterConfig {
                max_health: 70.0,
                max_move_distance: 6,
                can_fire_after_moving: true,
                projectile: ProjectileDetails::Bullet {
                    damage: 25.0,
                    num_ricochets: 3,
                },
                abilities: vec![AbilityConfig {
                    kind: AbilityKind::Dash,
                    is_free: true,
                    max_uses: Some(1),
                    cooldown_turns: 0,
                }],
            },
            Self::Medic => CharacterConfig {
                max_health: 90.0,
                max_move_distance: 4,
                can_fire_after_moving: true,
                projectile: ProjectileDetails::Bullet {
                    damage: 20.0,
                    num_ricochets: 1,
                },
                abilities: vec![AbilityConfig {
                    kind: AbilityKind::Heal,
                    is_free: false,
                    max_uses: None,
                    cooldown_turns: 2,
                }],
            },
        }
    }
}

/// Gameplay configuration shared by every character of a class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Health the character spawns with.
    pub max_health: f64,
    /// Maximum number of tiles the character may move per turn.
    pub max_move_distance: u32,
    /// Whether the weapon may be fired after moving in the same turn.
    pub can_fire_after_moving: bool,
    /// Weapon fired when shooting.
    pub projectile: ProjectileDetails,
    /// Abilities the character may activate.
    pub abilities: Vec<AbilityConfig>,
}
