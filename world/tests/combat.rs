use std::{f64::consts::PI, time::Duration};

use glam::DVec2;
use ricochet_core::{
    AbilityKind, AbilityParams, Action, ActionError, CharacterClass, CharacterId, CharacterState,
    Event, LevelData, Phase, TargetKind, TeamId, TileCoord,
};
use ricochet_world::{advance, apply, query, GameConfig, RangeKind, World, WorldError};

fn open_field() -> LevelData {
    LevelData {
        columns: 10,
        rows: 6,
        obstacles: Vec::new(),
        flags: vec![TileCoord::new(0, 2), TileCoord::new(9, 2)],
    }
}

fn instant(units: u32) -> GameConfig {
    GameConfig {
        units_per_team: units,
        move_speed: 0.0,
        projectile_speed: 0.0,
        ..GameConfig::default()
    }
}

fn id(team: u32, index: u32) -> CharacterId {
    CharacterId::new(TeamId::new(team), index)
}

fn act(world: &mut World, action: Action) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, action, &mut events).expect("action accepted");
    events
}

fn reject(world: &mut World, action: Action) -> WorldError {
    let mut events = Vec::new();
    let error = apply(world, action, &mut events).expect_err("action rejected");
    assert!(events.is_empty(), "rejected actions emit no events");
    error
}

/// Creates a match and places characters in the listed order; teams take
/// turns placing, starting with team 0.
fn start_match(
    level: LevelData,
    config: GameConfig,
    placements: &[(CharacterClass, (i32, i32))],
) -> World {
    let mut world = World::new(level, config).expect("valid level");
    for &(class, (column, row)) in placements {
        let _ = act(&mut world, Action::SelectCharacterClass { class });
        let _ = act(
            &mut world,
            Action::SelectTile {
                tile: TileCoord::new(column, row),
            },
        );
    }
    assert_eq!(query::phase(&world), Phase::Combat);
    world
}

fn select(world: &mut World, character: CharacterId) {
    let _ = act(world, Action::SelectCharacter { character });
}

fn move_to(world: &mut World, character: CharacterId, tile: TileCoord) -> Vec<Event> {
    select(world, character);
    let _ = act(
        world,
        Action::SelectCharacterState {
            state: CharacterState::Moving,
        },
    );
    act(world, Action::SelectTile { tile })
}

fn end_turn(world: &mut World, character: CharacterId) -> Vec<Event> {
    select(world, character);
    act(world, Action::EndCharacterTurn)
}

fn duel(attacker: CharacterClass, defender: CharacterClass) -> World {
    start_match(
        open_field(),
        instant(1),
        &[(attacker, (1, 2)), (defender, (8, 2))],
    )
}

#[test]
fn ending_the_last_turn_hands_over_and_resets_the_next_team() {
    let mut world = duel(CharacterClass::Rifleman, CharacterClass::Rifleman);

    let events = end_turn(&mut world, id(0, 0));
    assert_eq!(
        events,
        vec![
            Event::CharacterTurnEnded {
                character: id(0, 0)
            },
            Event::SelectionCleared,
            Event::TeamTurnStarted {
                team: TeamId::new(1)
            },
        ]
    );

    let _ = move_to(&mut world, id(1, 0), TileCoord::new(7, 2));
    let _ = act(&mut world, Action::EndCharacterTurn);
    let before = query::character_view(&world);
    let mover = before.get(id(1, 0)).expect("snapshot");
    assert!(mover.has_moved && mover.is_finished);

    let _ = end_turn(&mut world, id(0, 0));
    assert_eq!(query::current_team(&world), TeamId::new(1));
    let after = query::character_view(&world);
    let mover = after.get(id(1, 0)).expect("snapshot");
    assert!(!mover.has_moved && !mover.has_shot && !mover.is_finished);
    assert_eq!(mover.tile, TileCoord::new(7, 2));
}

#[test]
fn characters_of_other_teams_cannot_be_selected() {
    let mut world = duel(CharacterClass::Rifleman, CharacterClass::Rifleman);
    assert_eq!(
        reject(
            &mut world,
            Action::SelectCharacter {
                character: id(1, 0)
            }
        ),
        WorldError::Rejected(ActionError::NotYourTurn {
            character: id(1, 0),
            team: TeamId::new(0),
        })
    );
    assert_eq!(
        reject(&mut world, Action::Shoot),
        WorldError::Rejected(ActionError::NoCharacterSelected)
    );
}

#[test]
fn sniper_that_moved_is_done_for_the_turn() {
    let mut world = start_match(
        open_field(),
        instant(2),
        &[
            (CharacterClass::Sniper, (1, 2)),
            (CharacterClass::Rifleman, (8, 2)),
            (CharacterClass::Rifleman, (1, 1)),
            (CharacterClass::Rifleman, (8, 3)),
        ],
    );

    select(&mut world, id(0, 0));
    let _ = act(
        &mut world,
        Action::SelectCharacterState {
            state: CharacterState::Moving,
        },
    );
    let range = query::selectable_tiles(&world).clone();
    assert!(range.contains(&TileCoord::new(2, 2)));
    assert!(!range.contains(&TileCoord::new(1, 1)), "teammates block landing");

    let events = act(
        &mut world,
        Action::SelectTile {
            tile: TileCoord::new(2, 2),
        },
    );
    assert!(events.contains(&Event::CharacterTurnEnded {
        character: id(0, 0)
    }));
    assert_eq!(query::selected_character(&world), None);
    assert_eq!(query::current_team(&world), TeamId::new(0));

    let sniper = query::character_view(&world);
    let sniper = sniper.get(id(0, 0)).expect("snapshot");
    assert!(sniper.has_moved && !sniper.has_shot && sniper.is_finished);
    assert_eq!(
        reject(
            &mut world,
            Action::SelectCharacter {
                character: id(0, 0)
            }
        ),
        WorldError::Rejected(ActionError::TurnOver(id(0, 0)))
    );
}

#[test]
fn rifleman_hits_the_enemy_in_its_line_of_fire() {
    let mut world = duel(CharacterClass::Rifleman, CharacterClass::Rifleman);
    select(&mut world, id(0, 0));

    let events = act(&mut world, Action::Aim { angle: 0.0 });
    assert_eq!(
        events,
        vec![
            Event::CharacterStateChanged {
                character: id(0, 0),
                state: CharacterState::Aiming,
            },
            Event::AimChanged {
                character: id(0, 0),
                angle: 0.0,
            },
        ]
    );

    let preview = query::shot_preview(&world, id(0, 0)).expect("preview");
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].kind, TargetKind::Character(id(1, 0)));

    let events = act(&mut world, Action::Shoot);
    let Some(Event::ShotFired { targets, .. }) = events.first() else {
        panic!("shot event expected first, got {events:?}");
    };
    assert_eq!(targets, &preview);
    assert!((targets[0].point - DVec2::new(256.0, 80.0)).length() < 1e-9);
    assert!(events.contains(&Event::CharacterDamaged {
        character: id(1, 0),
        amount: 35.0,
        remaining: 65.0,
    }));

    // Overcharge is still ready, so the rifleman keeps the turn.
    assert_eq!(query::current_team(&world), TeamId::new(0));
    assert_eq!(query::selection_state(&world), Some(CharacterState::Idle));
    assert_eq!(
        reject(&mut world, Action::Shoot),
        WorldError::Rejected(ActionError::CannotShoot(id(0, 0)))
    );
}

#[test]
fn overcharge_adds_a_ricochet_once_per_use() {
    let mut world = duel(CharacterClass::Rifleman, CharacterClass::Rifleman);
    select(&mut world, id(0, 0));

    let overcharge = Action::UseAbility {
        params: AbilityParams::on_self(AbilityKind::Overcharge),
    };
    let events = act(&mut world, overcharge.clone());
    assert_eq!(
        events,
        vec![Event::AbilityUsed {
            character: id(0, 0),
            ability: AbilityKind::Overcharge,
        }]
    );
    assert_eq!(
        reject(&mut world, overcharge),
        WorldError::Rejected(ActionError::AbilityUnavailable {
            character: id(0, 0),
            ability: AbilityKind::Overcharge,
        })
    );

    let _ = act(&mut world, Action::Aim { angle: PI / 2.0 });
    let events = act(&mut world, Action::Shoot);
    let Some(Event::ShotFired { targets, .. }) = events.first() else {
        panic!("shot event expected first, got {events:?}");
    };
    assert_eq!(targets.len(), 3);
    assert!(targets.iter().all(|target| target.is_border()));

    assert!(events.contains(&Event::CharacterTurnEnded {
        character: id(0, 0)
    }));
    assert_eq!(
        events.last(),
        Some(&Event::TeamTurnStarted {
            team: TeamId::new(1)
        })
    );
}

#[test]
fn grenade_damages_everyone_around_the_destination() {
    let mut world = start_match(
        open_field(),
        instant(1),
        &[
            (CharacterClass::Grenadier, (1, 2)),
            (CharacterClass::Rifleman, (7, 2)),
        ],
    );
    select(&mut world, id(0, 0));

    assert_eq!(
        reject(&mut world, Action::Shoot),
        WorldError::Rejected(ActionError::NoDestinationSelected)
    );

    let _ = act(
        &mut world,
        Action::SelectCharacterState {
            state: CharacterState::Aiming,
        },
    );
    let range = query::selectable_tiles(&world).clone();
    assert_eq!(
        range,
        query::reachable_tiles(&world, id(0, 0), RangeKind::Grenade)
    );
    assert!(range.contains(&TileCoord::new(6, 2)));
    assert!(!range.contains(&TileCoord::new(7, 2)));
    assert_eq!(
        reject(
            &mut world,
            Action::SelectTile {
                tile: TileCoord::new(7, 2)
            }
        ),
        WorldError::Rejected(ActionError::TileNotSelectable(TileCoord::new(7, 2)))
    );

    let events = act(
        &mut world,
        Action::SelectTile {
            tile: TileCoord::new(6, 2),
        },
    );
    assert_eq!(
        events,
        vec![Event::DestinationSelected {
            character: id(0, 0),
            tile: TileCoord::new(6, 2),
        }]
    );

    let events = act(&mut world, Action::Shoot);
    let Some(Event::ShotFired { targets, .. }) = events.first() else {
        panic!("shot event expected first, got {events:?}");
    };
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].kind, TargetKind::Destination);
    assert!(targets[0].normal.is_none());
    assert!(events.contains(&Event::CharacterDamaged {
        character: id(1, 0),
        amount: 25.0,
        remaining: 75.0,
    }));
    assert_eq!(query::current_team(&world), TeamId::new(1));
}

#[test]
fn grenades_cannot_land_on_an_occupied_tile() {
    let mut world = start_match(
        open_field(),
        instant(1),
        &[
            (CharacterClass::Grenadier, (2, 2)),
            (CharacterClass::Rifleman, (7, 2)),
        ],
    );
    let range = query::reachable_tiles(&world, id(0, 0), RangeKind::Grenade);
    assert!(range.contains(&TileCoord::new(6, 2)));
    assert!(!range.contains(&TileCoord::new(7, 2)), "enemy tile is in reach but occupied");
    assert!(!range.contains(&TileCoord::new(2, 2)), "thrower's own tile");

    select(&mut world, id(0, 0));
    let _ = act(
        &mut world,
        Action::SelectCharacterState {
            state: CharacterState::Aiming,
        },
    );
    assert_eq!(
        reject(
            &mut world,
            Action::SelectTile {
                tile: TileCoord::new(7, 2)
            }
        ),
        WorldError::Rejected(ActionError::TileNotSelectable(TileCoord::new(7, 2)))
    );
}

#[test]
fn medic_heals_an_adjacent_teammate() {
    let mut world = start_match(
        open_field(),
        instant(2),
        &[
            (CharacterClass::Medic, (1, 1)),
            (CharacterClass::Rifleman, (8, 2)),
            (CharacterClass::Rifleman, (1, 2)),
            (CharacterClass::Scout, (8, 3)),
        ],
    );
    let _ = end_turn(&mut world, id(0, 0));
    let _ = end_turn(&mut world, id(0, 1));

    select(&mut world, id(1, 0));
    let _ = act(&mut world, Action::Aim { angle: PI });
    let events = act(&mut world, Action::Shoot);
    assert!(events.contains(&Event::CharacterDamaged {
        character: id(0, 1),
        amount: 35.0,
        remaining: 65.0,
    }));
    let _ = act(&mut world, Action::EndCharacterTurn);
    let _ = end_turn(&mut world, id(1, 1));
    assert_eq!(query::current_team(&world), TeamId::new(0));

    select(&mut world, id(0, 0));
    assert_eq!(
        reject(
            &mut world,
            Action::UseAbility {
                params: AbilityParams::on_self(AbilityKind::Dash)
            }
        ),
        WorldError::Rejected(ActionError::UnknownAbility {
            character: id(0, 0),
            ability: AbilityKind::Dash,
        })
    );
    assert_eq!(
        reject(
            &mut world,
            Action::UseAbility {
                params: AbilityParams {
                    kind: AbilityKind::Heal,
                    target: Some(id(1, 0)),
                }
            }
        ),
        WorldError::Rejected(ActionError::InvalidAbilityTarget(id(1, 0)))
    );

    let events = act(
        &mut world,
        Action::UseAbility {
            params: AbilityParams {
                kind: AbilityKind::Heal,
                target: Some(id(0, 1)),
            },
        },
    );
    assert_eq!(
        events,
        vec![
            Event::AbilityUsed {
                character: id(0, 0),
                ability: AbilityKind::Heal,
            },
            Event::CharacterHealed {
                character: id(0, 1),
                amount: 30.0,
            },
            Event::CharacterTurnEnded {
                character: id(0, 0)
            },
            Event::SelectionCleared,
        ]
    );
    let view = query::character_view(&world);
    assert_eq!(view.get(id(0, 1)).map(|s| s.health), Some(95.0));
    assert!(view.get(id(0, 0)).is_some_and(|medic| medic.has_shot));
}

#[test]
fn scout_steals_the_enemy_flag_and_wins() {
    let level = LevelData {
        columns: 7,
        rows: 3,
        obstacles: Vec::new(),
        flags: vec![TileCoord::new(0, 1), TileCoord::new(6, 1)],
    };
    let mut world = start_match(
        level,
        instant(1),
        &[
            (CharacterClass::Scout, (1, 1)),
            (CharacterClass::Rifleman, (6, 0)),
        ],
    );

    let events = move_to(&mut world, id(0, 0), TileCoord::new(6, 1));
    assert!(events.contains(&Event::FlagPickedUp {
        flag: TeamId::new(1),
        carrier: id(0, 0),
    }));

    let _ = act(
        &mut world,
        Action::UseAbility {
            params: AbilityParams::on_self(AbilityKind::Dash),
        },
    );
    let _ = act(
        &mut world,
        Action::SelectCharacterState {
            state: CharacterState::Moving,
        },
    );
    let events = act(
        &mut world,
        Action::SelectTile {
            tile: TileCoord::new(0, 1),
        },
    );
    assert!(events.contains(&Event::FlagCaptured {
        flag: TeamId::new(1),
        carrier: id(0, 0),
    }));
    assert_eq!(
        events.last(),
        Some(&Event::PhaseChanged {
            phase: Phase::Finished {
                winner: TeamId::new(0)
            }
        })
    );

    let stolen = query::flags(&world)[1];
    assert_eq!(stolen.carrier, Some(id(0, 0)));
    assert_eq!(stolen.tile, TileCoord::new(0, 1));
    assert_eq!(
        reject(&mut world, Action::EndCharacterTurn),
        WorldError::Rejected(ActionError::GameOver)
    );
}

#[test]
fn eliminating_the_last_enemy_ends_the_match() {
    let mut world = duel(CharacterClass::Sniper, CharacterClass::Scout);

    select(&mut world, id(0, 0));
    let _ = act(&mut world, Action::Aim { angle: 0.0 });
    let events = act(&mut world, Action::Shoot);
    assert!(events.contains(&Event::CharacterDamaged {
        character: id(1, 0),
        amount: 60.0,
        remaining: 10.0,
    }));
    let _ = act(&mut world, Action::EndCharacterTurn);
    let _ = end_turn(&mut world, id(1, 0));

    select(&mut world, id(0, 0));
    let events = act(&mut world, Action::Shoot);
    assert!(events.contains(&Event::CharacterKilled {
        character: id(1, 0)
    }));
    assert!(events.contains(&Event::TeamEliminated {
        team: TeamId::new(1)
    }));
    assert_eq!(
        query::phase(&world),
        Phase::Finished {
            winner: TeamId::new(0)
        }
    );
}

#[test]
fn movement_is_validated_before_anything_changes() {
    let level = LevelData {
        obstacles: vec![TileCoord::new(2, 2)],
        ..open_field()
    };
    let mut world = start_match(
        level,
        instant(1),
        &[
            (CharacterClass::Rifleman, (1, 2)),
            (CharacterClass::Rifleman, (8, 2)),
        ],
    );
    select(&mut world, id(0, 0));
    let _ = act(
        &mut world,
        Action::SelectCharacterState {
            state: CharacterState::Moving,
        },
    );

    for (tile, expected) in [
        (
            TileCoord::new(6, 2),
            ActionError::MoveTooFar {
                tile: TileCoord::new(6, 2),
                distance: 5,
                limit: 4,
            },
        ),
        (TileCoord::new(2, 2), ActionError::TileNotSelectable(TileCoord::new(2, 2))),
        (TileCoord::new(10, 2), ActionError::TileOutOfBounds(TileCoord::new(10, 2))),
    ] {
        assert_eq!(
            reject(&mut world, Action::SelectTile { tile }),
            WorldError::Rejected(expected)
        );
    }
    assert_eq!(query::selection_state(&world), Some(CharacterState::Moving));

    let range = query::reachable_tiles(&world, id(0, 0), RangeKind::Movement);
    assert!(!range.contains(&TileCoord::new(2, 2)));
    assert!(range.contains(&TileCoord::new(3, 2)));

    let path = query::movement_path(&world, id(0, 0), TileCoord::new(3, 2)).expect("path");
    assert_eq!(path.len(), 4);
    assert_eq!(path.last(), Some(&TileCoord::new(3, 2)));

    let events = act(
        &mut world,
        Action::SelectTile {
            tile: TileCoord::new(3, 2),
        },
    );
    assert_eq!(
        events.first(),
        Some(&Event::CharacterMoved {
            character: id(0, 0),
            from: TileCoord::new(1, 2),
            to: TileCoord::new(3, 2),
            path,
        })
    );
    assert_eq!(
        query::movement_path(&world, id(3, 0), TileCoord::new(0, 0)),
        Err(WorldError::Rejected(ActionError::UnknownCharacter(id(3, 0))))
    );
}

#[test]
fn characters_walk_through_enemies_but_not_onto_them() {
    let corridor = LevelData {
        columns: 10,
        rows: 1,
        obstacles: Vec::new(),
        flags: vec![TileCoord::new(0, 0), TileCoord::new(9, 0)],
    };
    let mut world = start_match(
        corridor,
        instant(1),
        &[
            (CharacterClass::Scout, (2, 0)),
            (CharacterClass::Rifleman, (7, 0)),
        ],
    );

    let range = query::reachable_tiles(&world, id(0, 0), RangeKind::Movement);
    assert!(range.contains(&TileCoord::new(8, 0)));
    assert!(!range.contains(&TileCoord::new(7, 0)));

    let path = query::movement_path(&world, id(0, 0), TileCoord::new(8, 0)).expect("path");
    assert_eq!(path.len(), 6);
    assert!(path.contains(&TileCoord::new(7, 0)));

    let events = move_to(&mut world, id(0, 0), TileCoord::new(8, 0));
    assert_eq!(
        events.first(),
        Some(&Event::CharacterMoved {
            character: id(0, 0),
            from: TileCoord::new(2, 0),
            to: TileCoord::new(8, 0),
            path,
        })
    );
}

#[test]
fn aim_rejects_angles_that_are_not_finite() {
    let mut world = duel(CharacterClass::Rifleman, CharacterClass::Rifleman);
    select(&mut world, id(0, 0));

    assert_eq!(
        reject(
            &mut world,
            Action::Aim {
                angle: f64::INFINITY
            }
        ),
        WorldError::Rejected(ActionError::InvalidAimAngle(f64::INFINITY))
    );
    assert!(matches!(
        reject(&mut world, Action::Aim { angle: f64::NAN }),
        WorldError::Rejected(ActionError::InvalidAimAngle(angle)) if angle.is_nan()
    ));
    assert_eq!(query::selection_state(&world), Some(CharacterState::Idle));
    let view = query::character_view(&world);
    assert_eq!(view.get(id(0, 0)).map(|snapshot| snapshot.aim_angle), Some(0.0));

    let _ = act(&mut world, Action::Aim { angle: 0.0 });
    let preview = query::shot_preview(&world, id(0, 0)).expect("preview");
    assert_eq!(preview[0].kind, TargetKind::Character(id(1, 0)));
}

#[test]
fn animations_block_actions_and_defer_the_turn_hand_over() {
    let config = GameConfig {
        units_per_team: 1,
        ..GameConfig::default()
    };
    let mut world = start_match(
        open_field(),
        config,
        &[
            (CharacterClass::Sniper, (1, 2)),
            (CharacterClass::Rifleman, (8, 2)),
        ],
    );

    let events = move_to(&mut world, id(0, 0), TileCoord::new(2, 2));
    assert!(!events.iter().any(|event| matches!(event, Event::TeamTurnStarted { .. })));
    assert!(query::is_animating(&world));
    assert_eq!(query::animation_position(&world), Some(DVec2::new(48.0, 80.0)));
    assert_eq!(
        reject(
            &mut world,
            Action::SelectCharacter {
                character: id(0, 0)
            }
        ),
        WorldError::Rejected(ActionError::AnimationInProgress)
    );

    let mut events = Vec::new();
    advance(&mut world, Duration::from_millis(50), &mut events);
    assert!(events.is_empty());
    let position = query::animation_position(&world).expect("still playing");
    assert!(position.x > 48.0 && position.x < 80.0);

    advance(&mut world, Duration::from_secs(1), &mut events);
    assert_eq!(
        events,
        vec![
            Event::AnimationFinished,
            Event::TeamTurnStarted {
                team: TeamId::new(1)
            },
        ]
    );
    assert!(!query::is_animating(&world));
    assert_eq!(query::current_team(&world), TeamId::new(1));
}
