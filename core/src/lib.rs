#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ricochet Squad engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters (player input or an AI
//! opponent) submit [`Action`] values, the world validates and executes them
//! via its `apply` entry point, and then reports [`Event`] values describing
//! what changed. Systems only ever see immutable snapshots such as
//! [`CharacterView`] and answer with fresh values.

pub mod geometry;
pub mod grid;
pub mod roster;

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{LineSegment, Ray};
pub use grid::{TileCoord, TileGrid};
pub use roster::{AbilityConfig, AbilityKind, CharacterClass, CharacterConfig, ProjectileDetails};

/// Index of a team taking part in the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Creates a new team identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Identity of a character: its team and its placement index within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId {
    team: TeamId,
    index: u32,
}

impl CharacterId {
    /// Creates a new character identifier.
    #[must_use]
    pub const fn new(team: TeamId, index: u32) -> Self {
        Self { team, index }
    }

    /// Team the character belongs to.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Placement index of the character within its team.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} character {}", self.team, self.index)
    }
}

/// Actions a player or AI may submit to the world.
///
/// The set is closed; the world matches it exhaustively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Chooses the class of the next character to place.
    SelectCharacterClass {
        /// Class to place.
        class: CharacterClass,
    },
    /// Selects a tile: places a character, moves, or picks a grenade
    /// destination depending on phase and selection state.
    SelectTile {
        /// Tile chosen by the player.
        tile: TileCoord,
    },
    /// Selects one of the acting team's characters.
    SelectCharacter {
        /// Character to select.
        character: CharacterId,
    },
    /// Switches what the selected character is preparing to do.
    SelectCharacterState {
        /// Requested selection state.
        state: CharacterState,
    },
    /// Points the selected character's weapon.
    Aim {
        /// Aim angle in radians from the positive x axis.
        angle: f64,
    },
    /// Fires the selected character's weapon.
    Shoot,
    /// Activates an ability of the selected character.
    UseAbility {
        /// Ability and its parameters.
        params: AbilityParams,
    },
    /// Ends the selected character's turn regardless of remaining actions.
    EndCharacterTurn,
}

impl Action {
    /// Short label naming the action variant.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectCharacterClass { .. } => "SelectCharacterClass",
            Self::SelectTile { .. } => "SelectTile",
            Self::SelectCharacter { .. } => "SelectCharacter",
            Self::SelectCharacterState { .. } => "SelectCharacterState",
            Self::Aim { .. } => "Aim",
            Self::Shoot => "Shoot",
            Self::UseAbility { .. } => "UseAbility",
            Self::EndCharacterTurn => "EndCharacterTurn",
        }
    }
}

/// Parameters supplied when activating an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityParams {
    /// Ability to activate.
    pub kind: AbilityKind,
    /// Optional character the ability is aimed at; defaults to the user.
    pub target: Option<CharacterId>,
}

impl AbilityParams {
    /// Parameters activating `kind` on the user.
    #[must_use]
    pub const fn on_self(kind: AbilityKind) -> Self {
        Self { kind, target: None }
    }
}

/// What the selected character is preparing to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterState {
    /// Selected without a pending action.
    #[default]
    Idle,
    /// Choosing a destination tile.
    Moving,
    /// Aiming the weapon.
    Aiming,
}

/// Stage of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Teams alternate placing characters around their flags.
    Placement,
    /// Teams alternate turns fighting.
    Combat,
    /// The match is over.
    Finished {
        /// Team that won the match.
        winner: TeamId,
    },
}

/// Kind of surface a shot stopped at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// The play-area border; not a hit.
    Border,
    /// An obstacle edge.
    Obstacle,
    /// A character's bounding edge.
    Character(CharacterId),
    /// Fixed destination of a splash projectile.
    Destination,
}

/// Result of a collision query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Tile containing the surface that was hit.
    pub tile: TileCoord,
    /// Hit point in continuous coordinates.
    pub point: DVec2,
    /// Surface normal at the hit, absent for splash destinations.
    pub normal: Option<DVec2>,
    /// Ray that produced the hit.
    pub ray: Ray,
    /// Kind of surface that was hit.
    pub kind: TargetKind,
    /// Distance travelled along the ray to reach the hit point.
    pub distance: f64,
}

impl Target {
    /// Reports whether the shot stopped at the play-area border.
    #[must_use]
    pub const fn is_border(&self) -> bool {
        matches!(self.kind, TargetKind::Border)
    }

    /// Character struck by the shot, if any.
    #[must_use]
    pub const fn character(&self) -> Option<CharacterId> {
        match self.kind {
            TargetKind::Character(character) => Some(character),
            _ => None,
        }
    }
}

/// Immutable representation of a single character used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterSnapshot {
    /// Identity of the character.
    pub id: CharacterId,
    /// Class the character was placed as.
    pub class: CharacterClass,
    /// Tile currently occupied.
    pub tile: TileCoord,
    /// Remaining health.
    pub health: f64,
    /// Health the character spawned with.
    pub max_health: f64,
    /// Current aim angle in radians.
    pub aim_angle: f64,
    /// Whether the character has moved this turn.
    pub has_moved: bool,
    /// Whether the character has shot this turn.
    pub has_shot: bool,
    /// Whether the character has no legal actions left this turn.
    pub is_finished: bool,
}

impl CharacterSnapshot {
    /// Reports whether the character is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Read-only snapshot describing every character on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct CharacterView {
    snapshots: Vec<CharacterSnapshot>,
}

impl CharacterView {
    /// Creates a new character view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CharacterSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every captured snapshot in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CharacterSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the characters that are still alive.
    pub fn living(&self) -> impl Iterator<Item = &CharacterSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_alive())
    }

    /// Living character occupying the tile, if any.
    #[must_use]
    pub fn living_at(&self, tile: TileCoord) -> Option<&CharacterSnapshot> {
        self.living().find(|snapshot| snapshot.tile == tile)
    }

    /// Snapshot of the requested character, if it exists.
    #[must_use]
    pub fn get(&self, id: CharacterId) -> Option<&CharacterSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CharacterSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a team's flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagSnapshot {
    /// Team owning the flag.
    pub team: TeamId,
    /// Tile the flag starts on and must be defended at.
    pub home: TileCoord,
    /// Tile the flag currently occupies.
    pub tile: TileCoord,
    /// Enemy character carrying the flag, if any.
    pub carrier: Option<CharacterId>,
}

/// Static level description supplied when a match starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tiles blocked by obstacles.
    pub obstacles: Vec<TileCoord>,
    /// Flag home tile of each team, indexed by team.
    pub flags: Vec<TileCoord>,
}

/// Events reported by the world after processing actions.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The match entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// A team's turn began.
    TeamTurnStarted {
        /// Team that may now act.
        team: TeamId,
    },
    /// A class was chosen for the next placement.
    CharacterClassSelected {
        /// Team placing the character.
        team: TeamId,
        /// Chosen class.
        class: CharacterClass,
    },
    /// A character was placed onto the battlefield.
    CharacterPlaced {
        /// Identifier assigned to the character.
        character: CharacterId,
        /// Class of the character.
        class: CharacterClass,
        /// Tile the character was placed on.
        tile: TileCoord,
    },
    /// A character became selected.
    CharacterSelected {
        /// Selected character.
        character: CharacterId,
    },
    /// The selection was cleared.
    SelectionCleared,
    /// The selected character switched selection state.
    CharacterStateChanged {
        /// Selected character.
        character: CharacterId,
        /// New selection state.
        state: CharacterState,
    },
    /// A character moved between tiles.
    CharacterMoved {
        /// Character that moved.
        character: CharacterId,
        /// Tile left behind.
        from: TileCoord,
        /// Tile reached.
        to: TileCoord,
        /// Tiles walked through, excluding `from` and ending at `to`.
        path: Vec<TileCoord>,
    },
    /// A character changed its aim.
    AimChanged {
        /// Character aiming.
        character: CharacterId,
        /// New aim angle in radians.
        angle: f64,
    },
    /// A splash weapon destination was chosen.
    DestinationSelected {
        /// Character throwing the projectile.
        character: CharacterId,
        /// Destination tile.
        tile: TileCoord,
    },
    /// A character fired its weapon.
    ShotFired {
        /// Shooter.
        character: CharacterId,
        /// Surfaces the projectile stopped at, in order.
        targets: Vec<Target>,
    },
    /// A character lost health.
    CharacterDamaged {
        /// Damaged character.
        character: CharacterId,
        /// Health removed.
        amount: f64,
        /// Health left afterwards.
        remaining: f64,
    },
    /// A character regained health.
    CharacterHealed {
        /// Healed character.
        character: CharacterId,
        /// Health restored.
        amount: f64,
    },
    /// A character died.
    CharacterKilled {
        /// Character that died.
        character: CharacterId,
    },
    /// A character activated an ability.
    AbilityUsed {
        /// Character using the ability.
        character: CharacterId,
        /// Ability that was used.
        ability: AbilityKind,
    },
    /// A character has no further actions this turn.
    CharacterTurnEnded {
        /// Character whose turn ended.
        character: CharacterId,
    },
    /// A character picked up an enemy flag.
    FlagPickedUp {
        /// Team owning the flag.
        flag: TeamId,
        /// Character now carrying it.
        carrier: CharacterId,
    },
    /// A carried flag was dropped.
    FlagDropped {
        /// Team owning the flag.
        flag: TeamId,
        /// Tile the flag now lies on.
        tile: TileCoord,
    },
    /// A dropped flag was returned to its home tile.
    FlagReturned {
        /// Team owning the flag.
        flag: TeamId,
    },
    /// An enemy flag was brought home.
    FlagCaptured {
        /// Team owning the captured flag.
        flag: TeamId,
        /// Character that captured it.
        carrier: CharacterId,
    },
    /// A team lost its last living character.
    TeamEliminated {
        /// Eliminated team.
        team: TeamId,
    },
    /// The in-flight movement or projectile animation finished.
    AnimationFinished,
}

/// Reasons an action may be rejected. Rejected actions never mutate state.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ActionError {
    /// A movement or projectile animation is still playing.
    #[error("an animation is still in progress")]
    AnimationInProgress,
    /// The match is over.
    #[error("the match is over")]
    GameOver,
    /// The action does not apply to the current phase.
    #[error("{action} is not allowed during {phase:?}")]
    WrongPhase {
        /// Name of the rejected action.
        action: &'static str,
        /// Phase the match is in.
        phase: Phase,
    },
    /// The action requires a selected character.
    #[error("no character is selected")]
    NoCharacterSelected,
    /// A placement tile was chosen before a class.
    #[error("no character class is selected")]
    NoClassSelected,
    /// The referenced character does not exist.
    #[error("{0} does not exist")]
    UnknownCharacter(CharacterId),
    /// The character does not belong to the acting team.
    #[error("{character} cannot act during the turn of {team}")]
    NotYourTurn {
        /// Character that was referenced.
        character: CharacterId,
        /// Team whose turn it is.
        team: TeamId,
    },
    /// The character is dead.
    #[error("{0} is dead")]
    CharacterDead(CharacterId),
    /// The character has no actions left this turn.
    #[error("{0} has finished its turn")]
    TurnOver(CharacterId),
    /// The character already moved this turn.
    #[error("{0} has already moved this turn")]
    AlreadyMoved(CharacterId),
    /// The character may not shoot right now.
    #[error("{0} cannot shoot right now")]
    CannotShoot(CharacterId),
    /// The aim angle is infinite or NaN.
    #[error("aim angle {0} is not a finite number")]
    InvalidAimAngle(f64),
    /// The tile lies outside the grid.
    #[error("tile {0} is outside the grid")]
    TileOutOfBounds(TileCoord),
    /// The tile is not among the currently selectable tiles.
    #[error("tile {0} cannot be selected right now")]
    TileNotSelectable(TileCoord),
    /// The destination exceeds the character's movement budget.
    #[error("tile {tile} is {distance} tiles away but the limit is {limit}")]
    MoveTooFar {
        /// Requested destination.
        tile: TileCoord,
        /// Manhattan distance to the destination.
        distance: u32,
        /// Maximum movement distance.
        limit: u32,
    },
    /// A splash weapon was fired without a destination.
    #[error("no destination tile is selected")]
    NoDestinationSelected,
    /// The character does not have the ability.
    #[error("{character} has no {ability:?} ability")]
    UnknownAbility {
        /// Character that was asked to use the ability.
        character: CharacterId,
        /// Requested ability.
        ability: AbilityKind,
    },
    /// The ability is exhausted, cooling down, or already spent this turn.
    #[error("{ability:?} is not available for {character}")]
    AbilityUnavailable {
        /// Character that was asked to use the ability.
        character: CharacterId,
        /// Requested ability.
        ability: AbilityKind,
    },
    /// The ability target is not a valid recipient.
    #[error("{0} cannot receive this ability")]
    InvalidAbilityTarget(CharacterId),
    /// The acting team has already placed all of its characters.
    #[error("{0} has no characters left to place")]
    PlacementComplete(TeamId),
}
