//! Tile grid layout and conversions between tile and continuous space.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::LineSegment;

/// Location of a single tile expressed as column and row indices.
///
/// Indices are signed so that neighbours of edge tiles and conversions of
/// points outside the play area remain representable; [`TileGrid::contains`]
/// decides whether a coordinate is playable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Coordinate displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Cardinal neighbours in up, right, down, left order, unfiltered.
    #[must_use]
    pub const fn neighbors(self) -> [TileCoord; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Describes the discrete tile layout of the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_size: f64,
}

impl TileGrid {
    /// Creates a new tile grid description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_size: f64) -> Self {
        Self {
            columns,
            rows,
            tile_size,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile in continuous units.
    #[must_use]
    pub const fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Total width of the grid in continuous units.
    #[must_use]
    pub fn width(&self) -> f64 {
        f64::from(self.columns) * self.tile_size
    }

    /// Total height of the grid in continuous units.
    #[must_use]
    pub fn height(&self) -> f64 {
        f64::from(self.rows) * self.tile_size
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.column() >= 0
            && tile.row() >= 0
            && tile.column().unsigned_abs() < self.columns
            && tile.row().unsigned_abs() < self.rows
    }

    /// Continuous position of the tile's upper-left corner.
    #[must_use]
    pub fn tile_to_continuous(&self, tile: TileCoord) -> DVec2 {
        DVec2::new(
            f64::from(tile.column()) * self.tile_size,
            f64::from(tile.row()) * self.tile_size,
        )
    }

    /// Continuous position of the tile's centre.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord) -> DVec2 {
        self.tile_to_continuous(tile) + DVec2::splat(self.tile_size / 2.0)
    }

    /// Tile containing the continuous point, by floor division.
    #[must_use]
    pub fn continuous_to_tile(&self, point: DVec2) -> TileCoord {
        TileCoord::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// Nearest in-bounds tile to the provided coordinate.
    ///
    /// Returns the coordinate unchanged for an empty grid.
    #[must_use]
    pub fn clamp(&self, tile: TileCoord) -> TileCoord {
        if self.columns == 0 || self.rows == 0 {
            return tile;
        }
        let max_column = i32::try_from(self.columns - 1).unwrap_or(i32::MAX);
        let max_row = i32::try_from(self.rows - 1).unwrap_or(i32::MAX);
        TileCoord::new(
            tile.column().clamp(0, max_column),
            tile.row().clamp(0, max_row),
        )
    }

    /// In-bounds cardinal neighbours in up, right, down, left order.
    pub fn adjacent_tiles(&self, tile: TileCoord) -> impl Iterator<Item = TileCoord> + '_ {
        tile.neighbors()
            .into_iter()
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// Play-area borders with normals pointing into the grid.
    #[must_use]
    pub fn border_segments(&self) -> [LineSegment; 4] {
        let width = self.width();
        let height = self.height();
        let top_left = DVec2::ZERO;
        let top_right = DVec2::new(width, 0.0);
        let bottom_left = DVec2::new(0.0, height);
        let bottom_right = DVec2::new(width, height);
        [
            LineSegment::new(top_left, top_right, DVec2::Y),
            LineSegment::new(top_right, bottom_right, DVec2::NEG_X),
            LineSegment::new(bottom_left, bottom_right, DVec2::NEG_Y),
            LineSegment::new(top_left, bottom_left, DVec2::X),
        ]
    }

    /// Edges of the tile's square with normals pointing out of the tile.
    #[must_use]
    pub fn tile_edges(&self, tile: TileCoord) -> [LineSegment; 4] {
        square_edges(self.tile_center(tile), self.tile_size / 2.0)
    }
}

/// Edges of an axis-aligned square with outward normals, in top, right,
/// bottom, left order.
#[must_use]
pub fn square_edges(center: DVec2, half_extent: f64) -> [LineSegment; 4] {
    let top_left = center + DVec2::new(-half_extent, -half_extent);
    let top_right = center + DVec2::new(half_extent, -half_extent);
    let bottom_left = center + DVec2::new(-half_extent, half_extent);
    let bottom_right = center + DVec2::new(half_extent, half_extent);
    [
        LineSegment::new(top_left, top_right, DVec2::NEG_Y),
        LineSegment::new(top_right, bottom_right, DVec2::X),
        LineSegment::new(bottom_left, bottom_right, DVec2::Y),
        LineSegment::new(top_left, bottom_left, DVec2::NEG_X),
    ]
}
