//! Tile predicates and range queries over a borrowed view of the world.

use std::collections::BTreeSet;

use ricochet_core::{CharacterView, ProjectileDetails, TileCoord, TileGrid};
use ricochet_system_pathing::{PathError, Pathing};
use ricochet_system_reachability::Reachability;

use crate::{characters::Character, flags::Flag};

/// Borrowed battlefield state shared by validation and queries.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Board<'a> {
    pub(crate) grid: &'a TileGrid,
    pub(crate) obstacles: &'a BTreeSet<TileCoord>,
    pub(crate) characters: &'a [Character],
    pub(crate) flags: &'a [Flag],
}

impl<'a> Board<'a> {
    pub(crate) fn is_obstacle(&self, tile: TileCoord) -> bool {
        self.obstacles.contains(&tile)
    }

    pub(crate) fn living_at(&self, tile: TileCoord) -> Option<&'a Character> {
        self.characters
            .iter()
            .find(|character| character.is_alive() && character.tile == tile)
    }

    fn has_flag(&self, tile: TileCoord) -> bool {
        self.flags.iter().any(|flag| flag.tile == tile)
    }

    fn can_land(&self, tile: TileCoord) -> bool {
        !self.is_obstacle(tile) && self.living_at(tile).is_none()
    }

    /// Tiles the character may walk to this turn. Other characters can be
    /// walked through but not stood on.
    pub(crate) fn movement_range(
        &self,
        mover: &Character,
        reachability: &mut Reachability,
        out: &mut BTreeSet<TileCoord>,
    ) {
        reachability.handle(
            self.grid,
            mover.tile,
            mover.config.max_move_distance,
            |tile| self.can_land(tile),
            |tile| !self.is_obstacle(tile),
            out,
        );
    }

    /// Walking path to `to` under the movement predicates.
    pub(crate) fn movement_path(
        &self,
        mover: &Character,
        to: TileCoord,
        pathing: &mut Pathing,
    ) -> Result<Vec<TileCoord>, PathError> {
        pathing.handle(
            self.grid,
            mover.tile,
            to,
            |tile| self.can_land(tile),
            |tile| !self.is_obstacle(tile),
        )
    }

    /// Empty tiles a splash projectile may be thrown onto. The arc clears
    /// obstacles and characters. Empty for bullets.
    pub(crate) fn grenade_range(
        &self,
        thrower: &Character,
        reachability: &mut Reachability,
        out: &mut BTreeSet<TileCoord>,
    ) {
        let ProjectileDetails::Splash { range, .. } = thrower.config.projectile else {
            out.clear();
            return;
        };
        reachability.handle(
            self.grid,
            thrower.tile,
            range,
            |tile| self.can_land(tile),
            |_| true,
            out,
        );
    }

    /// Free tiles around `home` on which a new character may be placed.
    pub(crate) fn spawn_range(
        &self,
        home: TileCoord,
        radius: u32,
        reachability: &mut Reachability,
        out: &mut BTreeSet<TileCoord>,
    ) {
        reachability.handle(
            self.grid,
            home,
            radius,
            |tile| self.can_land(tile) && !self.has_flag(tile),
            |tile| !self.is_obstacle(tile),
            out,
        );
    }

    pub(crate) fn character_view(&self) -> CharacterView {
        CharacterView::from_snapshots(self.characters.iter().map(Character::snapshot).collect())
    }
}
