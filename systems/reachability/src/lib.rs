#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes the tiles reachable within a movement budget.
//!
//! Two predicates drive the search. `is_available` decides whether a tile
//! may be landed on, `can_traverse` whether it may be passed through. Keeping
//! them apart lets movement walk through teammates without stopping on them
//! and lets thrown projectiles arc over obstacles.

use std::collections::{BTreeSet, HashSet, VecDeque};

use ricochet_core::{TileCoord, TileGrid};

/// Breadth-first range search that reuses scratch buffers between queries.
#[derive(Debug, Default)]
pub struct Reachability {
    queue: VecDeque<(TileCoord, u32)>,
    queued: HashSet<(TileCoord, u32)>,
}

impl Reachability {
    /// Creates a new reachability system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every tile within `max_depth` steps of `start` that may be
    /// landed on.
    ///
    /// The output set is cleared before being populated. A tile is expanded
    /// whenever it is traversable, and its neighbours are queued unless they
    /// were already accepted, so an unavailable tile may be crossed again at a
    /// greater depth. The start tile itself is only reported if a path leaves
    /// and re-enters it.
    pub fn handle<A, T>(
        &mut self,
        grid: &TileGrid,
        start: TileCoord,
        max_depth: u32,
        mut is_available: A,
        mut can_traverse: T,
        out: &mut BTreeSet<TileCoord>,
    ) where
        A: FnMut(TileCoord) -> bool,
        T: FnMut(TileCoord) -> bool,
    {
        out.clear();
        self.queue.clear();
        self.queued.clear();

        if max_depth == 0 {
            return;
        }

        for neighbor in grid.adjacent_tiles(start) {
            self.enqueue(neighbor, 1);
        }

        while let Some((tile, depth)) = self.queue.pop_front() {
            if depth > max_depth || !can_traverse(tile) {
                continue;
            }

            if is_available(tile) {
                let _ = out.insert(tile);
            }

            if depth == max_depth {
                continue;
            }

            for neighbor in grid.adjacent_tiles(tile) {
                if out.contains(&neighbor) {
                    continue;
                }
                self.enqueue(neighbor, depth + 1);
            }
        }
    }

    fn enqueue(&mut self, tile: TileCoord, depth: u32) {
        // Identical entries would expand identically.
        if self.queued.insert((tile, depth)) {
            self.queue.push_back((tile, depth));
        }
    }
}

/// Convenience wrapper returning the reachable set of a single query.
#[must_use]
pub fn compute_reachable<A, T>(
    grid: &TileGrid,
    start: TileCoord,
    max_depth: u32,
    is_available: A,
    can_traverse: T,
) -> BTreeSet<TileCoord>
where
    A: FnMut(TileCoord) -> bool,
    T: FnMut(TileCoord) -> bool,
{
    let mut out = BTreeSet::new();
    Reachability::new().handle(grid, start, max_depth, is_available, can_traverse, &mut out);
    out
}
