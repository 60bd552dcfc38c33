//! Capture-the-flag objective.

use ricochet_core::{CharacterId, Event, FlagSnapshot, TeamId, TileCoord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Flag {
    pub(crate) team: TeamId,
    pub(crate) home: TileCoord,
    pub(crate) tile: TileCoord,
    pub(crate) carrier: Option<CharacterId>,
}

impl Flag {
    pub(crate) fn new(team: TeamId, home: TileCoord) -> Self {
        Self {
            team,
            home,
            tile: home,
            carrier: None,
        }
    }

    pub(crate) fn is_home(&self) -> bool {
        self.carrier.is_none() && self.tile == self.home
    }

    pub(crate) fn snapshot(&self) -> FlagSnapshot {
        FlagSnapshot {
            team: self.team,
            home: self.home,
            tile: self.tile,
            carrier: self.carrier,
        }
    }
}

/// Resolves pick-ups, returns and captures after `mover` ended a move on
/// `tile`. Returns `true` when a capture happened.
pub(crate) fn settle_move(
    flags: &mut [Flag],
    mover: CharacterId,
    tile: TileCoord,
    out_events: &mut Vec<Event>,
) -> bool {
    let team = mover.team();

    for flag in flags.iter_mut() {
        if flag.carrier == Some(mover) {
            flag.tile = tile;
            continue;
        }
        if flag.carrier.is_some() || flag.tile != tile {
            continue;
        }
        if flag.team != team {
            flag.carrier = Some(mover);
            out_events.push(Event::FlagPickedUp {
                flag: flag.team,
                carrier: mover,
            });
            log::info!("{mover} picked up the flag of {}", flag.team);
        } else if flag.tile != flag.home {
            flag.tile = flag.home;
            out_events.push(Event::FlagReturned { flag: flag.team });
            log::info!("{mover} returned the flag of {team}");
        }
    }

    let own_flag_home = flags
        .iter()
        .any(|flag| flag.team == team && flag.is_home() && flag.home == tile);
    if !own_flag_home {
        return false;
    }

    let mut captured = false;
    for flag in flags.iter_mut().filter(|flag| flag.carrier == Some(mover)) {
        out_events.push(Event::FlagCaptured {
            flag: flag.team,
            carrier: mover,
        });
        log::info!("{mover} captured the flag of {}", flag.team);
        captured = true;
    }
    captured
}

/// Drops every flag carried by `carrier` onto `tile`.
pub(crate) fn drop_carried(
    flags: &mut [Flag],
    carrier: CharacterId,
    tile: TileCoord,
    out_events: &mut Vec<Event>,
) {
    for flag in flags
        .iter_mut()
        .filter(|flag| flag.carrier == Some(carrier))
    {
        flag.carrier = None;
        flag.tile = tile;
        out_events.push(Event::FlagDropped {
            flag: flag.team,
            tile,
        });
    }
}
