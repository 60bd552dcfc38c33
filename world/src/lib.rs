#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Ricochet Squad.
//!
//! The world owns every character, flag and obstacle. Adapters submit
//! [`Action`] values through [`apply`], which validates them completely
//! before touching any state, and drive in-flight animations with
//! [`advance`]. Everything else reads the world through [`query`].

mod animation;
mod board;
mod characters;
mod config;
mod flags;

use std::{collections::BTreeSet, time::Duration};

use ricochet_core::{
    roster::HEAL_AMOUNT, AbilityKind, AbilityParams, Action, ActionError, CharacterClass,
    CharacterId, CharacterState, Event, LevelData, Phase, ProjectileDetails, Ray, Target, TeamId,
    TileCoord, TileGrid,
};
use ricochet_system_pathing::{PathError, Pathing};
use ricochet_system_reachability::Reachability;
use ricochet_system_targeting::{resolve_splash, splash_damage, Scene, Targeting, TargetingError};
use thiserror::Error;

pub use config::GameConfig;

use crate::{animation::Animation, board::Board, characters::Character, flags::Flag};

/// Failures reported by [`apply`] and by world queries.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum WorldError {
    /// The action is not legal in the current state.
    #[error(transparent)]
    Rejected(#[from] ActionError),
    /// A reachable destination produced no walking path.
    #[error("movement planning failed: {0}")]
    Path(#[from] PathError),
    /// The shot could not be resolved against the battlefield.
    #[error("shot resolution failed: {0}")]
    Targeting(#[from] TargetingError),
}

/// Reasons a level or configuration cannot start a match.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid has no tiles.
    #[error("the grid must have at least one column and one row")]
    EmptyGrid,
    /// The tile size is not a positive finite number.
    #[error("tile size {0} must be positive and finite")]
    InvalidTileSize(f64),
    /// A match needs at least two teams, one per flag.
    #[error("a level needs at least two flags but has {0}")]
    TooFewFlags(usize),
    /// Every team must field at least one character.
    #[error("teams must place at least one character")]
    NoUnitsPerTeam,
    /// The configured first team has no flag.
    #[error("team {team} cannot start because the level only has {teams} teams")]
    UnknownFirstTeam {
        /// Configured first team.
        team: TeamId,
        /// Number of teams in the level.
        teams: u32,
    },
    /// An obstacle or flag lies outside the grid.
    #[error("tile {0} is outside the grid")]
    OutOfBounds(TileCoord),
    /// Two static occupants share a tile.
    #[error("tile {0} holds more than one obstacle or flag")]
    Overlap(TileCoord),
    /// The spawn area around a flag cannot fit the team.
    #[error("{team} can only spawn on {available} tiles but needs {required}")]
    SpawnAreaTooSmall {
        /// Team whose spawn area is too small.
        team: TeamId,
        /// Free tiles in the spawn area.
        available: usize,
        /// Characters the team has to place.
        required: u32,
    },
    /// Two spawn areas overlap.
    #[error("{first} and {second} could both spawn on {tile}")]
    SharedSpawnTile {
        /// Team whose flag comes first in the level.
        first: TeamId,
        /// Team whose spawn area reaches the same tile.
        second: TeamId,
        /// Lowest shared tile.
        tile: TileCoord,
    },
}

/// Which range to compute for [`query::reachable_tiles`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// Tiles the character may walk to this turn.
    Movement,
    /// Tiles the character may throw a splash projectile onto.
    Grenade,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Selection {
    character: CharacterId,
    state: CharacterState,
}

#[derive(Debug)]
struct Scratch {
    reachability: Reachability,
    pathing: Pathing,
    targeting: Targeting,
}

/// Represents the authoritative Ricochet Squad match state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    grid: TileGrid,
    obstacles: BTreeSet<TileCoord>,
    flags: Vec<Flag>,
    characters: Vec<Character>,
    phase: Phase,
    current_team: TeamId,
    pending_class: Option<CharacterClass>,
    selection: Option<Selection>,
    selectable: BTreeSet<TileCoord>,
    animation: Option<Animation>,
    turn_check_pending: bool,
    capturing_team: Option<TeamId>,
    scratch: Scratch,
}

impl World {
    /// Creates a match in the placement phase.
    ///
    /// Team `n` owns the `n`-th flag of the level; the configured first team
    /// places first.
    pub fn new(level: LevelData, config: GameConfig) -> Result<Self, LevelError> {
        if !config.tile_size.is_finite() || config.tile_size <= 0.0 {
            return Err(LevelError::InvalidTileSize(config.tile_size));
        }
        if level.columns == 0 || level.rows == 0 {
            return Err(LevelError::EmptyGrid);
        }
        if level.flags.len() < 2 {
            return Err(LevelError::TooFewFlags(level.flags.len()));
        }
        if config.units_per_team == 0 {
            return Err(LevelError::NoUnitsPerTeam);
        }
        let teams = u32::try_from(level.flags.len()).unwrap_or(u32::MAX);
        if config.first_team.get() >= teams {
            return Err(LevelError::UnknownFirstTeam {
                team: config.first_team,
                teams,
            });
        }

        let grid = TileGrid::new(level.columns, level.rows, config.tile_size);

        let mut obstacles = BTreeSet::new();
        for tile in level.obstacles {
            if !grid.contains(tile) {
                return Err(LevelError::OutOfBounds(tile));
            }
            if !obstacles.insert(tile) {
                return Err(LevelError::Overlap(tile));
            }
        }

        let mut flags: Vec<Flag> = Vec::with_capacity(level.flags.len());
        for (team, home) in (0..teams).zip(level.flags) {
            if !grid.contains(home) {
                return Err(LevelError::OutOfBounds(home));
            }
            if obstacles.contains(&home) || flags.iter().any(|flag| flag.home == home) {
                return Err(LevelError::Overlap(home));
            }
            flags.push(Flag::new(TeamId::new(team), home));
        }

        let mut world = Self {
            grid,
            obstacles,
            flags,
            characters: Vec::new(),
            phase: Phase::Placement,
            current_team: config.first_team,
            pending_class: None,
            selection: None,
            selectable: BTreeSet::new(),
            animation: None,
            turn_check_pending: false,
            capturing_team: None,
            scratch: Scratch {
                reachability: Reachability::new(),
                pathing: Pathing::new(),
                targeting: Targeting::new(config.targeting),
            },
            config,
        };

        let radius = world.config.spawn_radius;
        let required = world.config.units_per_team;
        let mut claimed: Vec<(TeamId, BTreeSet<TileCoord>)> = Vec::new();
        for index in 0..world.flags.len() {
            let (board, scratch) = world.split();
            let flag = board.flags[index];
            let mut spawn = BTreeSet::new();
            board.spawn_range(flag.home, radius, &mut scratch.reachability, &mut spawn);
            if spawn.len() < required as usize {
                return Err(LevelError::SpawnAreaTooSmall {
                    team: flag.team,
                    available: spawn.len(),
                    required,
                });
            }
            // Spawn areas must be disjoint so no team can fill another's tiles.
            for (other, area) in &claimed {
                if let Some(&tile) = area.intersection(&spawn).next() {
                    return Err(LevelError::SharedSpawnTile {
                        first: *other,
                        second: flag.team,
                        tile,
                    });
                }
            }
            claimed.push((flag.team, spawn));
        }

        world.refresh_selectable();
        log::info!(
            "match created: {teams} teams on a {}x{} grid, {} characters each",
            world.grid.columns(),
            world.grid.rows(),
            world.config.units_per_team
        );
        Ok(world)
    }

    fn board(&self) -> Board<'_> {
        Board {
            grid: &self.grid,
            obstacles: &self.obstacles,
            characters: &self.characters,
            flags: &self.flags,
        }
    }

    fn split(&mut self) -> (Board<'_>, &mut Scratch) {
        (
            Board {
                grid: &self.grid,
                obstacles: &self.obstacles,
                characters: &self.characters,
                flags: &self.flags,
            },
            &mut self.scratch,
        )
    }

    fn character_index(&self, id: CharacterId) -> Option<usize> {
        self.characters.iter().position(|character| character.id == id)
    }

    fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }

    fn placed_count(&self, team: TeamId) -> u32 {
        let placed = self
            .characters
            .iter()
            .filter(|character| character.id.team() == team)
            .count();
        u32::try_from(placed).unwrap_or(u32::MAX)
    }

    fn team_count(&self) -> u32 {
        u32::try_from(self.flags.len()).unwrap_or(u32::MAX)
    }

    /// Teams following the current one in turn order, ending with itself.
    fn teams_after_current(&self) -> impl Iterator<Item = TeamId> {
        let teams = self.team_count();
        let current = self.current_team.get();
        (1..=teams).map(move |offset| TeamId::new((current + offset) % teams))
    }

    fn selected(&self) -> Result<(usize, Selection), ActionError> {
        let selection = self.selection.ok_or(ActionError::NoCharacterSelected)?;
        let index = self
            .character_index(selection.character)
            .ok_or(ActionError::UnknownCharacter(selection.character))?;
        Ok((index, selection))
    }

    fn range_of(&mut self, index: usize, kind: RangeKind) -> BTreeSet<TileCoord> {
        let mut out = BTreeSet::new();
        let (board, scratch) = self.split();
        let character = &board.characters[index];
        match kind {
            RangeKind::Movement => {
                board.movement_range(character, &mut scratch.reachability, &mut out);
            }
            RangeKind::Grenade => {
                board.grenade_range(character, &mut scratch.reachability, &mut out);
            }
        }
        out
    }

    fn refresh_selectable(&mut self) {
        let mut selectable = std::mem::take(&mut self.selectable);
        selectable.clear();

        match self.phase {
            Phase::Placement => {
                let radius = self.config.spawn_radius;
                let team = self.current_team;
                let (board, scratch) = self.split();
                if let Some(flag) = board.flags.iter().find(|flag| flag.team == team) {
                    let reachability = &mut scratch.reachability;
                    board.spawn_range(flag.home, radius, reachability, &mut selectable);
                }
            }
            Phase::Combat => {
                let selected = self.selection.and_then(|selection| {
                    let index = self.character_index(selection.character)?;
                    Some((index, selection.state))
                });
                if let Some((index, state)) = selected {
                    let (board, scratch) = self.split();
                    let character = &board.characters[index];
                    let reachability = &mut scratch.reachability;
                    match state {
                        CharacterState::Moving if character.can_move() => {
                            board.movement_range(character, reachability, &mut selectable);
                        }
                        CharacterState::Aiming if character.can_shoot() => {
                            board.grenade_range(character, reachability, &mut selectable);
                        }
                        _ => {}
                    }
                }
            }
            Phase::Finished { .. } => {}
        }

        self.selectable = selectable;
    }

    fn dispatch(&mut self, action: Action, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        if matches!(self.phase, Phase::Finished { .. }) {
            return Err(ActionError::GameOver.into());
        }
        if self.animation.is_some() {
            return Err(ActionError::AnimationInProgress.into());
        }

        match (self.phase, action) {
            (Phase::Placement, Action::SelectCharacterClass { class }) => {
                self.select_class(class, out_events)
            }
            (Phase::Placement, Action::SelectTile { tile }) => {
                self.place_character(tile, out_events)
            }
            (Phase::Combat, Action::SelectCharacter { character }) => {
                self.select_character(character, out_events)
            }
            (Phase::Combat, Action::SelectCharacterState { state }) => {
                self.select_state(state, out_events)
            }
            (Phase::Combat, Action::SelectTile { tile }) => self.select_tile(tile, out_events),
            (Phase::Combat, Action::Aim { angle }) => self.aim(angle, out_events),
            (Phase::Combat, Action::Shoot) => self.shoot(out_events),
            (Phase::Combat, Action::UseAbility { params }) => self.use_ability(params, out_events),
            (Phase::Combat, Action::EndCharacterTurn) => self.end_character_turn(out_events),
            (phase, action) => Err(ActionError::WrongPhase {
                action: action.name(),
                phase,
            }
            .into()),
        }
    }

    fn select_class(
        &mut self,
        class: CharacterClass,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let team = self.current_team;
        if self.placed_count(team) >= self.config.units_per_team {
            return Err(ActionError::PlacementComplete(team).into());
        }

        self.pending_class = Some(class);
        out_events.push(Event::CharacterClassSelected { team, class });
        Ok(())
    }

    fn place_character(
        &mut self,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        if !self.grid.contains(tile) {
            return Err(ActionError::TileOutOfBounds(tile).into());
        }
        let class = self.pending_class.ok_or(ActionError::NoClassSelected)?;
        if !self.selectable.contains(&tile) {
            return Err(ActionError::TileNotSelectable(tile).into());
        }

        let team = self.current_team;
        let id = CharacterId::new(team, self.placed_count(team));
        self.characters.push(Character::new(id, class, tile));
        self.pending_class = None;
        out_events.push(Event::CharacterPlaced {
            character: id,
            class,
            tile,
        });
        log::debug!("{id} placed as {class:?} at {tile}");

        let units = self.config.units_per_team;
        let next = self
            .teams_after_current()
            .find(|team| self.placed_count(*team) < units);
        match next {
            Some(team) => {
                self.current_team = team;
                out_events.push(Event::TeamTurnStarted { team });
            }
            None => {
                self.phase = Phase::Combat;
                out_events.push(Event::PhaseChanged { phase: self.phase });
                log::info!("placement complete, combat begins");
                self.start_team_turn(self.config.first_team, out_events);
            }
        }

        self.refresh_selectable();
        Ok(())
    }

    fn start_team_turn(&mut self, team: TeamId, out_events: &mut Vec<Event>) {
        self.current_team = team;
        self.selection = None;
        for character in self
            .characters
            .iter_mut()
            .filter(|character| character.id.team() == team)
        {
            character.start_turn();
        }
        out_events.push(Event::TeamTurnStarted { team });
        log::info!("{team} begins its turn");
    }

    fn select_character(
        &mut self,
        id: CharacterId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let character = self
            .character(id)
            .ok_or(ActionError::UnknownCharacter(id))?;
        if id.team() != self.current_team {
            return Err(ActionError::NotYourTurn {
                character: id,
                team: self.current_team,
            }
            .into());
        }
        if !character.is_alive() {
            return Err(ActionError::CharacterDead(id).into());
        }
        if character.turn.is_finished {
            return Err(ActionError::TurnOver(id).into());
        }

        self.selection = Some(Selection {
            character: id,
            state: CharacterState::Idle,
        });
        out_events.push(Event::CharacterSelected { character: id });
        self.refresh_selectable();
        Ok(())
    }

    fn select_state(
        &mut self,
        state: CharacterState,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let (index, _) = self.selected()?;
        let character = &self.characters[index];
        match state {
            CharacterState::Moving if !character.can_move() => {
                return Err(ActionError::AlreadyMoved(character.id).into());
            }
            CharacterState::Aiming if !character.can_shoot() => {
                return Err(ActionError::CannotShoot(character.id).into());
            }
            _ => {}
        }

        self.set_selection_state(state, out_events);
        Ok(())
    }

    fn set_selection_state(&mut self, state: CharacterState, out_events: &mut Vec<Event>) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        selection.state = state;
        out_events.push(Event::CharacterStateChanged {
            character: selection.character,
            state,
        });
        self.refresh_selectable();
    }

    fn select_tile(
        &mut self,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let (index, selection) = self.selected()?;
        if !self.grid.contains(tile) {
            return Err(ActionError::TileOutOfBounds(tile).into());
        }

        match selection.state {
            CharacterState::Moving => self.move_character(index, tile, out_events),
            CharacterState::Aiming if !self.characters[index].config.projectile.ricochets() => {
                if !self.range_of(index, RangeKind::Grenade).contains(&tile) {
                    return Err(ActionError::TileNotSelectable(tile).into());
                }
                let character = &mut self.characters[index];
                character.destination = Some(tile);
                out_events.push(Event::DestinationSelected {
                    character: character.id,
                    tile,
                });
                Ok(())
            }
            CharacterState::Idle | CharacterState::Aiming => {
                Err(ActionError::TileNotSelectable(tile).into())
            }
        }
    }

    fn move_character(
        &mut self,
        index: usize,
        tile: TileCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let character = &self.characters[index];
        let id = character.id;
        if !character.can_move() {
            return Err(ActionError::AlreadyMoved(id).into());
        }
        let distance = character.tile.manhattan_distance(tile);
        let limit = character.config.max_move_distance;
        if distance > limit {
            return Err(ActionError::MoveTooFar {
                tile,
                distance,
                limit,
            }
            .into());
        }
        if !self.range_of(index, RangeKind::Movement).contains(&tile) {
            return Err(ActionError::TileNotSelectable(tile).into());
        }
        let path = {
            let (board, scratch) = self.split();
            board.movement_path(&board.characters[index], tile, &mut scratch.pathing)?
        };

        let from = self.characters[index].tile;
        let start = self.grid.tile_center(from);
        let waypoints: Vec<_> = path.iter().map(|step| self.grid.tile_center(*step)).collect();

        let character = &mut self.characters[index];
        character.tile = tile;
        character.turn.has_moved = true;
        out_events.push(Event::CharacterMoved {
            character: id,
            from,
            to: tile,
            path,
        });
        log::debug!("{id} moved from {from} to {tile}");

        if flags::settle_move(&mut self.flags, id, tile, out_events) {
            self.capturing_team = Some(id.team());
        }

        self.animation = Animation::new(start, waypoints, self.config.move_speed);
        self.finish_action(index, out_events);
        Ok(())
    }

    fn aim(&mut self, angle: f64, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        let (index, selection) = self.selected()?;
        if !angle.is_finite() {
            return Err(ActionError::InvalidAimAngle(angle).into());
        }
        let character = &mut self.characters[index];
        if !character.can_shoot() {
            return Err(ActionError::CannotShoot(character.id).into());
        }

        character.aim_angle = angle;
        let id = character.id;
        if selection.state != CharacterState::Aiming {
            self.set_selection_state(CharacterState::Aiming, out_events);
        }
        out_events.push(Event::AimChanged {
            character: id,
            angle,
        });
        Ok(())
    }

    fn shoot(&mut self, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        let (index, _) = self.selected()?;
        let shooter = &self.characters[index];
        let id = shooter.id;
        if !shooter.can_shoot() {
            return Err(ActionError::CannotShoot(id).into());
        }

        let origin_tile = shooter.tile;
        let origin = self.grid.tile_center(origin_tile);
        let projectile = shooter.config.projectile;
        let aim_angle = shooter.aim_angle;
        let bonus_ricochets = shooter.bonus_ricochets;
        let destination = shooter.destination;

        let (targets, hits) = match projectile {
            ProjectileDetails::Bullet {
                damage,
                num_ricochets,
            } => {
                let ray = Ray::from_angle(origin, aim_angle);
                let targets = self.resolve_bullet(
                    ray,
                    origin_tile,
                    id.team(),
                    num_ricochets + bonus_ricochets,
                )?;
                let hits: Vec<(CharacterId, f64)> = targets
                    .last()
                    .and_then(Target::character)
                    .map(|victim| (victim, damage))
                    .into_iter()
                    .collect();
                (targets, hits)
            }
            ProjectileDetails::Splash { .. } => {
                let destination = destination.ok_or(ActionError::NoDestinationSelected)?;
                if !self.range_of(index, RangeKind::Grenade).contains(&destination) {
                    return Err(ActionError::TileNotSelectable(destination).into());
                }
                let target = resolve_splash(&self.grid, origin_tile, destination);
                let view = self.board().character_view();
                let hits = splash_damage(destination, &projectile, &view)
                    .into_iter()
                    .map(|hit| (hit.character, hit.damage))
                    .collect();
                (vec![target], hits)
            }
        };

        let shooter = &mut self.characters[index];
        shooter.turn.has_shot = true;
        shooter.strip_non_free_abilities();
        shooter.destination = None;

        let waypoints: Vec<_> = targets.iter().map(|target| target.point).collect();
        log::debug!("{id} fired, projectile stopped {} times", targets.len());
        out_events.push(Event::ShotFired {
            character: id,
            targets,
        });
        for (victim, damage) in hits {
            self.damage_character(victim, damage, out_events);
        }

        self.animation = Animation::new(origin, waypoints, self.config.projectile_speed);
        self.finish_action(index, out_events);
        Ok(())
    }

    fn resolve_bullet(
        &mut self,
        ray: Ray,
        start_tile: TileCoord,
        team: TeamId,
        ricochets: u32,
    ) -> Result<Vec<Target>, TargetingError> {
        let view = self.board().character_view();
        let scene = Scene {
            grid: &self.grid,
            obstacles: &self.obstacles,
            characters: &view,
        };
        let mut targets = Vec::new();
        self.scratch
            .targeting
            .resolve_shot_path(&scene, ray, start_tile, team, ricochets, &mut targets)?;
        Ok(targets)
    }

    fn damage_character(&mut self, victim: CharacterId, amount: f64, out_events: &mut Vec<Event>) {
        let Some(index) = self.character_index(victim) else {
            return;
        };
        let character = &mut self.characters[index];
        if !character.is_alive() {
            return;
        }

        let removed = character.take_damage(amount);
        out_events.push(Event::CharacterDamaged {
            character: victim,
            amount: removed,
            remaining: character.health,
        });
        if character.is_alive() {
            return;
        }

        let tile = character.tile;
        out_events.push(Event::CharacterKilled { character: victim });
        log::info!("{victim} was killed at {tile}");
        flags::drop_carried(&mut self.flags, victim, tile, out_events);

        let team = victim.team();
        let survivors = self
            .characters
            .iter()
            .any(|character| character.id.team() == team && character.is_alive());
        if !survivors {
            out_events.push(Event::TeamEliminated { team });
            log::info!("{team} was eliminated");
        }
    }

    fn use_ability(
        &mut self,
        params: AbilityParams,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let (index, _) = self.selected()?;
        let user = &self.characters[index];
        let id = user.id;
        let kind = params.kind;
        if user.turn.is_finished {
            return Err(ActionError::TurnOver(id).into());
        }
        let ability = user.ability(kind).ok_or(ActionError::UnknownAbility {
            character: id,
            ability: kind,
        })?;
        if !ability.is_usable() {
            return Err(ActionError::AbilityUnavailable {
                character: id,
                ability: kind,
            }
            .into());
        }

        let recipient = match kind {
            AbilityKind::Heal => {
                let target = params.target.unwrap_or(id);
                let recipient = self
                    .character_index(target)
                    .ok_or(ActionError::UnknownCharacter(target))?;
                let candidate = &self.characters[recipient];
                let in_reach = candidate.is_alive()
                    && candidate.id.team() == id.team()
                    && candidate.tile.manhattan_distance(user.tile) <= 1;
                if !in_reach {
                    return Err(ActionError::InvalidAbilityTarget(target).into());
                }
                recipient
            }
            AbilityKind::Dash | AbilityKind::Overcharge => match params.target {
                Some(target) if target != id => {
                    return Err(ActionError::InvalidAbilityTarget(target).into());
                }
                _ => index,
            },
        };

        self.characters[index].consume_ability(kind);
        out_events.push(Event::AbilityUsed {
            character: id,
            ability: kind,
        });
        log::debug!("{id} used {kind:?}");

        match kind {
            AbilityKind::Dash => self.characters[index].turn.has_moved = false,
            AbilityKind::Overcharge => self.characters[index].bonus_ricochets += 1,
            AbilityKind::Heal => {
                let patient = &mut self.characters[recipient];
                let amount = patient.heal(HEAL_AMOUNT);
                out_events.push(Event::CharacterHealed {
                    character: patient.id,
                    amount,
                });
            }
        }

        self.finish_action(index, out_events);
        Ok(())
    }

    fn end_character_turn(&mut self, out_events: &mut Vec<Event>) -> Result<(), WorldError> {
        let (index, _) = self.selected()?;
        let character = &mut self.characters[index];
        character.turn.is_finished = true;
        out_events.push(Event::CharacterTurnEnded {
            character: character.id,
        });
        self.finish_action(index, out_events);
        Ok(())
    }

    /// Re-evaluates the acting character after a mutating action and
    /// schedules the team-level checks.
    fn finish_action(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let character = &mut self.characters[index];
        let id = character.id;
        if character.refresh_turn_over() {
            out_events.push(Event::CharacterTurnEnded { character: id });
        }
        let done = character.turn.is_finished || !character.is_alive();

        match self.selection {
            Some(selection) if selection.character == id && done => {
                self.selection = None;
                out_events.push(Event::SelectionCleared);
            }
            Some(selection)
                if selection.character == id && selection.state != CharacterState::Idle =>
            {
                self.set_selection_state(CharacterState::Idle, out_events);
            }
            _ => {}
        }
        self.refresh_selectable();

        if self.animation.is_some() {
            self.turn_check_pending = true;
        } else {
            self.resolve_turn_flow(out_events);
        }
    }

    fn winner(&self) -> Option<TeamId> {
        if self.capturing_team.is_some() {
            return self.capturing_team;
        }
        let alive: BTreeSet<TeamId> = self
            .characters
            .iter()
            .filter(|character| character.is_alive())
            .map(|character| character.id.team())
            .collect();
        match alive.len() {
            0 => Some(self.current_team),
            1 => alive.into_iter().next(),
            _ => None,
        }
    }

    fn resolve_turn_flow(&mut self, out_events: &mut Vec<Event>) {
        self.turn_check_pending = false;
        if self.phase != Phase::Combat {
            return;
        }

        if let Some(winner) = self.winner() {
            self.phase = Phase::Finished { winner };
            self.selection = None;
            self.selectable.clear();
            out_events.push(Event::PhaseChanged { phase: self.phase });
            log::info!("{winner} wins the match");
            return;
        }

        let team = self.current_team;
        let still_acting = self.characters.iter().any(|character| {
            character.id.team() == team && character.is_alive() && !character.turn.is_finished
        });
        if still_acting {
            return;
        }

        let next = self.teams_after_current().find(|candidate| {
            self.characters
                .iter()
                .any(|character| character.id.team() == *candidate && character.is_alive())
        });
        if let Some(next) = next {
            self.start_team_turn(next, out_events);
            self.refresh_selectable();
        }
    }
}

/// Applies the provided action to the world.
///
/// Rejected actions leave the world untouched and emit no events.
pub fn apply(
    world: &mut World,
    action: Action,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    let name = action.name();
    match world.dispatch(action, out_events) {
        Ok(()) => {
            log::debug!("applied {name}");
            Ok(())
        }
        Err(error) => {
            log::warn!("rejected {name}: {error}");
            Err(error)
        }
    }
}

/// Advances the in-flight animation by `dt`.
///
/// Deferred turn and victory checks run once the animation completes.
pub fn advance(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let Some(animation) = world.animation.as_mut() else {
        return;
    };
    if !animation.advance(dt.as_secs_f64()) {
        return;
    }

    world.animation = None;
    out_events.push(Event::AnimationFinished);
    if world.turn_check_pending {
        world.resolve_turn_flow(out_events);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use glam::DVec2;
    use ricochet_core::{
        ActionError, CharacterClass, CharacterId, CharacterState, CharacterView, FlagSnapshot,
        Phase, ProjectileDetails, Ray, Target, TeamId, TileCoord, TileGrid,
    };
    use ricochet_system_pathing::Pathing;
    use ricochet_system_reachability::Reachability;
    use ricochet_system_targeting::{resolve_splash, Scene, Targeting};

    use super::{GameConfig, RangeKind, World, WorldError};

    /// Current stage of the match.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Team currently placing or acting.
    #[must_use]
    pub fn current_team(world: &World) -> TeamId {
        world.current_team
    }

    /// Configuration the match was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Provides read-only access to the battlefield layout.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Tiles blocked by obstacles.
    #[must_use]
    pub fn obstacles(world: &World) -> &BTreeSet<TileCoord> {
        &world.obstacles
    }

    /// Class chosen for the next placement, if any.
    #[must_use]
    pub fn pending_class(world: &World) -> Option<CharacterClass> {
        world.pending_class
    }

    /// Character currently selected by the acting team.
    #[must_use]
    pub fn selected_character(world: &World) -> Option<CharacterId> {
        world.selection.map(|selection| selection.character)
    }

    /// Selection state of the selected character.
    #[must_use]
    pub fn selection_state(world: &World) -> Option<CharacterState> {
        world.selection.map(|selection| selection.state)
    }

    /// Tiles a `SelectTile` action may currently target.
    ///
    /// Spawn tiles during placement; the move or grenade range of the
    /// selected character during combat.
    #[must_use]
    pub fn selectable_tiles(world: &World) -> &BTreeSet<TileCoord> {
        &world.selectable
    }

    /// Captures a read-only view of every character.
    #[must_use]
    pub fn character_view(world: &World) -> CharacterView {
        world.board().character_view()
    }

    /// Snapshots of every flag, ordered by team.
    #[must_use]
    pub fn flags(world: &World) -> Vec<FlagSnapshot> {
        world.flags.iter().map(|flag| flag.snapshot()).collect()
    }

    /// Computes a range for the character. Unknown characters have none.
    #[must_use]
    pub fn reachable_tiles(
        world: &World,
        character: CharacterId,
        kind: RangeKind,
    ) -> BTreeSet<TileCoord> {
        let mut out = BTreeSet::new();
        let Some(character) = world.character(character) else {
            return out;
        };
        let board = world.board();
        let mut reachability = Reachability::new();
        match kind {
            RangeKind::Movement => board.movement_range(character, &mut reachability, &mut out),
            RangeKind::Grenade => board.grenade_range(character, &mut reachability, &mut out),
        }
        out
    }

    /// Walking path the character would take to reach `to`.
    pub fn movement_path(
        world: &World,
        character: CharacterId,
        to: TileCoord,
    ) -> Result<Vec<TileCoord>, WorldError> {
        let mover = world
            .character(character)
            .ok_or(ActionError::UnknownCharacter(character))?;
        Ok(world.board().movement_path(mover, to, &mut Pathing::new())?)
    }

    /// Surfaces the character's next shot would stop at with its current
    /// aim or grenade destination.
    pub fn shot_preview(world: &World, character: CharacterId) -> Result<Vec<Target>, WorldError> {
        let shooter = world
            .character(character)
            .ok_or(ActionError::UnknownCharacter(character))?;
        match shooter.config.projectile {
            ProjectileDetails::Bullet { num_ricochets, .. } => {
                let view = world.board().character_view();
                let scene = Scene {
                    grid: &world.grid,
                    obstacles: &world.obstacles,
                    characters: &view,
                };
                let ray = Ray::from_angle(world.grid.tile_center(shooter.tile), shooter.aim_angle);
                let mut targets = Vec::new();
                Targeting::new(world.config.targeting).resolve_shot_path(
                    &scene,
                    ray,
                    shooter.tile,
                    character.team(),
                    num_ricochets + shooter.bonus_ricochets,
                    &mut targets,
                )?;
                Ok(targets)
            }
            ProjectileDetails::Splash { .. } => {
                let destination = shooter
                    .destination
                    .ok_or(ActionError::NoDestinationSelected)?;
                Ok(vec![resolve_splash(&world.grid, shooter.tile, destination)])
            }
        }
    }

    /// Reports whether a movement or projectile animation is playing.
    #[must_use]
    pub fn is_animating(world: &World) -> bool {
        world.animation.is_some()
    }

    /// Current position of the in-flight animation, if any.
    #[must_use]
    pub fn animation_position(world: &World) -> Option<DVec2> {
        world.animation.as_ref().map(|animation| animation.position())
    }
}
