//! Waypoint playback for moves and projectiles.

use std::collections::VecDeque;

use glam::DVec2;

/// Position travelling through a queue of waypoints at constant speed.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Animation {
    position: DVec2,
    remaining: VecDeque<DVec2>,
    speed: f64,
}

impl Animation {
    /// Starts an animation at `start` heading through `waypoints` in order.
    ///
    /// Returns `None` when there is nothing to play: no waypoints, or a speed
    /// that is not strictly positive.
    pub(crate) fn new(
        start: DVec2,
        waypoints: impl IntoIterator<Item = DVec2>,
        speed: f64,
    ) -> Option<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return None;
        }
        let remaining: VecDeque<DVec2> = waypoints.into_iter().collect();
        if remaining.is_empty() {
            return None;
        }
        Some(Self {
            position: start,
            remaining,
            speed,
        })
    }

    /// Current interpolated position.
    pub(crate) fn position(&self) -> DVec2 {
        self.position
    }

    /// Moves along the waypoint queue for `elapsed` seconds.
    ///
    /// Returns `true` once the final waypoint has been reached.
    pub(crate) fn advance(&mut self, elapsed: f64) -> bool {
        let mut budget = self.speed * elapsed.max(0.0);
        while let Some(&next) = self.remaining.front() {
            let gap = self.position.distance(next);
            if gap > budget {
                self.position += (next - self.position) / gap * budget;
                return false;
            }
            budget -= gap;
            self.position = next;
            let _ = self.remaining.pop_front();
        }
        true
    }
}
