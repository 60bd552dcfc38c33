#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that plans the concrete tile path a character walks.
//!
//! Callers confirm reachability with the same predicates first; a request
//! for an unreachable destination is reported as [`PathError::PathNotFound`].

use std::collections::{HashMap, VecDeque};

use ricochet_core::{TileCoord, TileGrid};
use thiserror::Error;

/// Failures raised while planning a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// The destination cannot be reached under the supplied predicates.
    #[error("no path from {start} to {end}")]
    PathNotFound {
        /// Tile the search started from.
        start: TileCoord,
        /// Requested destination.
        end: TileCoord,
    },
}

/// Breadth-first path planner that reuses scratch buffers between queries.
#[derive(Debug, Default)]
pub struct Pathing {
    queue: VecDeque<TileCoord>,
    parents: HashMap<TileCoord, TileCoord>,
}

impl Pathing {
    /// Creates a new path planner with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a shortest path from `start` to `end`.
    ///
    /// Intermediate tiles must satisfy `can_traverse`; the destination must
    /// satisfy both predicates. The returned path excludes `start` and ends
    /// with `end`; it is empty when both coincide.
    pub fn handle<A, T>(
        &mut self,
        grid: &TileGrid,
        start: TileCoord,
        end: TileCoord,
        mut is_available: A,
        mut can_traverse: T,
    ) -> Result<Vec<TileCoord>, PathError>
    where
        A: FnMut(TileCoord) -> bool,
        T: FnMut(TileCoord) -> bool,
    {
        if start == end {
            return Ok(Vec::new());
        }

        self.queue.clear();
        self.parents.clear();
        let _ = self.parents.insert(start, start);
        for neighbor in grid.adjacent_tiles(start) {
            self.queue.push_back(neighbor);
            let _ = self.parents.insert(neighbor, start);
        }

        let mut reached = false;
        while let Some(tile) = self.queue.pop_front() {
            if !can_traverse(tile) {
                continue;
            }

            if tile == end {
                if is_available(tile) {
                    reached = true;
                    break;
                }
                continue;
            }

            for neighbor in grid.adjacent_tiles(tile) {
                if self.parents.contains_key(&neighbor) {
                    continue;
                }
                let _ = self.parents.insert(neighbor, tile);
                self.queue.push_back(neighbor);
            }
        }

        if !reached {
            return Err(PathError::PathNotFound { start, end });
        }

        let mut path = vec![end];
        let mut cursor = end;
        while let Some(&parent) = self.parents.get(&cursor) {
            if parent == start {
                break;
            }
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        Ok(path)
    }
}

/// Convenience wrapper planning a single path.
pub fn shortest_path<A, T>(
    grid: &TileGrid,
    start: TileCoord,
    end: TileCoord,
    is_available: A,
    can_traverse: T,
) -> Result<Vec<TileCoord>, PathError>
where
    A: FnMut(TileCoord) -> bool,
    T: FnMut(TileCoord) -> bool,
{
    Pathing::new().handle(grid, start, end, is_available, can_traverse)
}
