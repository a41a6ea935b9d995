use serde::Serialize;

use crate::buildings::LineId;

use super::Position;
use super::grid::{Cell, Grid};

/// A routed power line: an ordered chain of cells from a plant-adjacent start
/// to a dwelling-adjacent end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerLine {
    id: LineId,
    start: Position,
    end: Position,
    path: Vec<Position>,
}

impl PowerLine {
    /// Builds a line whose path steps along x first, then along y.
    ///
    /// The path always contains both endpoints.
    ///
    /// # Examples
    ///
    /// ```
    /// use energy_tycoon::buildings::LineId;
    /// use energy_tycoon::map::Position;
    /// use energy_tycoon::map::line::PowerLine;
    ///
    /// let line = PowerLine::straight(LineId(1), Position::new(0, 0), Position::new(2, 1));
    /// assert_eq!(
    ///     line.path(),
    ///     &[
    ///         Position::new(0, 0),
    ///         Position::new(1, 0),
    ///         Position::new(2, 0),
    ///         Position::new(2, 1),
    ///     ]
    /// );
    /// ```
    pub fn straight(id: LineId, start: Position, end: Position) -> Self {
        let mut path = vec![start];
        let mut cur = start;
        while cur.x != end.x {
            cur.x += (end.x - cur.x).signum();
            path.push(cur);
        }
        while cur.y != end.y {
            cur.y += (end.y - cur.y).signum();
            path.push(cur);
        }
        Self {
            id,
            start,
            end,
            path,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// Number of cells on the path.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn passes_through(&self, pos: Position) -> bool {
        self.path.contains(&pos)
    }

    /// A line is valid when every path cell is inside the grid and not water.
    pub fn is_valid(&self, grid: &Grid) -> bool {
        self.path
            .iter()
            .all(|&p| grid.cell(p).is_some_and(Cell::is_buildable))
    }
}

/// Cells visited by Bresenham's algorithm walking from `from` to `to`.
///
/// The start cell is excluded and the destination is included.
pub fn trace(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx - dy;
    let mut cur = from;
    let mut cells = Vec::with_capacity((dx.max(dy)) as usize);

    while cur != to {
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            cur.x += sx;
        }
        if e2 < dx {
            err += dx;
            cur.y += sy;
        }
        cells.push(cur);
    }
    cells
}

/// Returns `true` if no traced cell between `from` and `to` is water or off-grid.
pub fn has_clear_sight(grid: &Grid, from: Position, to: Position) -> bool {
    trace(from, to)
        .into_iter()
        .all(|p| grid.cell(p).is_some_and(|c| !c.is_water()))
}
