//! Per-character state and the rules deciding when a character's turn ends.

use ricochet_core::{
    AbilityConfig, AbilityKind, CharacterClass, CharacterConfig, CharacterId, CharacterSnapshot,
    TileCoord,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TurnState {
    pub(crate) has_moved: bool,
    pub(crate) has_shot: bool,
    pub(crate) is_finished: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AbilityState {
    pub(crate) config: AbilityConfig,
    pub(crate) uses_left: Option<u32>,
    pub(crate) cooldown_turns_left: u32,
    pub(crate) available_this_turn: bool,
}

impl AbilityState {
    fn new(config: AbilityConfig) -> Self {
        let mut state = Self {
            config,
            uses_left: config.max_uses,
            cooldown_turns_left: 0,
            available_this_turn: false,
        };
        state.available_this_turn = state.is_ready();
        state
    }

    /// Uses remain and the cooldown has elapsed.
    fn is_ready(&self) -> bool {
        self.uses_left != Some(0) && self.cooldown_turns_left == 0
    }

    pub(crate) fn is_usable(&self) -> bool {
        self.available_this_turn && self.is_ready()
    }

    fn consume(&mut self) {
        if let Some(uses) = self.uses_left.as_mut() {
            *uses = uses.saturating_sub(1);
        }
        self.cooldown_turns_left = self.config.cooldown_turns;
        self.available_this_turn = false;
    }

    fn start_turn(&mut self) {
        self.cooldown_turns_left = self.cooldown_turns_left.saturating_sub(1);
        self.available_this_turn = self.is_ready();
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Character {
    pub(crate) id: CharacterId,
    pub(crate) class: CharacterClass,
    pub(crate) config: CharacterConfig,
    pub(crate) tile: TileCoord,
    pub(crate) health: f64,
    pub(crate) aim_angle: f64,
    pub(crate) destination: Option<TileCoord>,
    pub(crate) turn: TurnState,
    pub(crate) abilities: Vec<AbilityState>,
    pub(crate) bonus_ricochets: u32,
}

impl Character {
    pub(crate) fn new(id: CharacterId, class: CharacterClass, tile: TileCoord) -> Self {
        let config = class.config();
        let abilities = config.abilities.iter().copied().map(AbilityState::new).collect();
        Self {
            id,
            class,
            health: config.max_health,
            config,
            tile,
            aim_angle: 0.0,
            destination: None,
            turn: TurnState::default(),
            abilities,
            bonus_ricochets: 0,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub(crate) fn can_move(&self) -> bool {
        !self.turn.is_finished && !self.turn.has_moved
    }

    pub(crate) fn can_shoot(&self) -> bool {
        !self.turn.is_finished
            && !self.turn.has_shot
            && !(self.turn.has_moved && !self.config.can_fire_after_moving)
    }

    pub(crate) fn ability(&self, kind: AbilityKind) -> Option<&AbilityState> {
        self.abilities.iter().find(|ability| ability.config.kind == kind)
    }

    fn has_usable_free_ability(&self) -> bool {
        self.abilities
            .iter()
            .any(|ability| ability.config.is_free && ability.is_usable())
    }

    /// Marks the character finished when it has nothing meaningful left to
    /// do. Returns `true` only when this call finished it.
    pub(crate) fn refresh_turn_over(&mut self) -> bool {
        if self.turn.is_finished {
            return false;
        }
        let fires_after_moving = self.config.can_fire_after_moving;
        let TurnState {
            has_moved,
            has_shot,
            ..
        } = self.turn;
        let over = (has_moved && (has_shot || !fires_after_moving))
            || (has_shot && !fires_after_moving)
            || (has_shot && !self.has_usable_free_ability());
        self.turn.is_finished = over;
        over
    }

    /// Consumes an ability. Non-free abilities spend the shot.
    pub(crate) fn consume_ability(&mut self, kind: AbilityKind) {
        let mut is_free = true;
        if let Some(ability) = self
            .abilities
            .iter_mut()
            .find(|ability| ability.config.kind == kind)
        {
            ability.consume();
            is_free = ability.config.is_free;
        }
        if !is_free {
            self.turn.has_shot = true;
            self.strip_non_free_abilities();
        }
    }

    pub(crate) fn strip_non_free_abilities(&mut self) {
        for ability in &mut self.abilities {
            if !ability.config.is_free {
                ability.available_this_turn = false;
            }
        }
    }

    pub(crate) fn start_turn(&mut self) {
        self.turn = TurnState::default();
        self.bonus_ricochets = 0;
        self.destination = None;
        for ability in &mut self.abilities {
            ability.start_turn();
        }
    }

    /// Applies damage and returns the health removed.
    pub(crate) fn take_damage(&mut self, amount: f64) -> f64 {
        let removed = amount.clamp(0.0, self.health.max(0.0));
        self.health -= removed;
        removed
    }

    /// Restores health up to the maximum and returns the amount restored.
    pub(crate) fn heal(&mut self, amount: f64) -> f64 {
        let restored = amount.clamp(0.0, (self.config.max_health - self.health).max(0.0));
        self.health += restored;
        restored
    }

    pub(crate) fn snapshot(&self) -> CharacterSnapshot {
        CharacterSnapshot {
            id: self.id,
            class: self.class,
            tile: self.tile,
            health: self.health,
            max_health: self.config.max_health,
            aim_angle: self.aim_angle,
            has_moved: self.turn.has_moved,
            has_shot: self.turn.has_shot,
            is_finished: self.turn.is_finished,
        }
    }
}
