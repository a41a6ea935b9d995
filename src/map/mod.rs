//! The city grid and its electrical network.
//!
//! [`CityMap`] is the single owner of cells and routed lines. Every structural
//! change made through it (placing, clearing, adding or removing a line,
//! toggling a plant) recomputes power before returning, so callers never
//! observe stale power state.

/// Cell storage, terrain, and occupancy rules.
pub mod grid;
/// Routed power lines and line-of-sight tracing.
pub mod line;
pub mod network;
/// Procedural terrain features.
pub mod terrain;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buildings::{Dwelling, DwellingId, IdAllocator, LineId, Plant, PlantId};
use crate::error::PlacementError;

use grid::{Cell, Grid, Structure, Terrain};
use line::PowerLine;
use network::{ElectricityNetwork, NetworkStats};

/// Integer grid coordinate. May be negative or past the grid edge; the grid
/// treats such positions as out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The eight surrounding positions, row by row.
    pub fn neighbors8(self) -> [Position; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid plus network, kept consistent with each other.
#[derive(Debug, Clone, Serialize)]
pub struct CityMap {
    grid: Grid,
    network: ElectricityNetwork,
}

impl CityMap {
    /// Creates an all-buildable map with the given network parameters.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn new(width: usize, height: usize, network: ElectricityNetwork) -> Self {
        Self {
            grid: Grid::new(width, height),
            network,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn network(&self) -> &ElectricityNetwork {
        &self.network
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.grid.cell(pos)
    }

    pub fn is_valid_position(&self, pos: Position) -> bool {
        self.grid.in_bounds(pos)
    }

    /// Places a dwelling and recomputes power.
    ///
    /// # Errors
    ///
    /// Fails without mutation if `pos` is out of bounds, occupied, or water.
    pub fn place_dwelling(&mut self, pos: Position, dwelling: Dwelling) -> Result<(), PlacementError> {
        self.grid.place_dwelling(pos, dwelling)?;
        self.recompute();
        Ok(())
    }

    /// Places a plant and recomputes power.
    ///
    /// # Errors
    ///
    /// Fails without mutation if `pos` is out of bounds, occupied, or has the
    /// wrong terrain (hydro needs water, everything else needs land).
    pub fn place_plant(&mut self, pos: Position, plant: Plant) -> Result<(), PlacementError> {
        self.grid.place_plant(pos, plant)?;
        self.recompute();
        Ok(())
    }

    /// Clears `pos` and recomputes power. Returns the removed structure.
    pub fn clear(&mut self, pos: Position) -> Option<Structure> {
        if !self.grid.in_bounds(pos) {
            return None;
        }
        let removed = self.grid.clear(pos);
        self.recompute();
        removed
    }

    /// Changes the terrain of an empty cell and recomputes power.
    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) -> bool {
        let changed = self.grid.set_terrain(pos, terrain);
        if changed {
            self.recompute();
        }
        changed
    }

    /// Carves a river with [`terrain::carve_river`] and recomputes power.
    pub fn carve_river<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let carved = terrain::carve_river(&mut self.grid, rng);
        self.recompute();
        carved
    }

    /// Plans a routed line without adding it. See
    /// [`ElectricityNetwork::create_auto_line`].
    pub fn create_auto_line(
        &self,
        plant_pos: Position,
        dwelling_pos: Position,
        ids: &mut IdAllocator,
    ) -> Option<PowerLine> {
        self.network
            .create_auto_line(&self.grid, plant_pos, dwelling_pos, ids)
    }

    /// Adds a line if valid, marks the empty cells it crosses, and recomputes.
    pub fn add_line(&mut self, line: PowerLine) -> bool {
        let path = line.path().to_vec();
        if !self.network.push_line(line, &self.grid) {
            return false;
        }
        for pos in path {
            if let Some(cell) = self.grid.cell_mut(pos) {
                if cell.is_empty() {
                    cell.set_line_overlay(true);
                }
            }
        }
        self.recompute();
        true
    }

    /// Removes a line by id and recomputes. Overlay marks are kept on cells
    /// another line still crosses.
    pub fn remove_line(&mut self, id: LineId) -> Option<PowerLine> {
        let line = self.network.take_line(id)?;
        for &pos in line.path() {
            let still_routed = self.network.lines().iter().any(|l| l.passes_through(pos));
            if let Some(cell) = self.grid.cell_mut(pos) {
                if !still_routed {
                    cell.set_line_overlay(false);
                }
            }
        }
        self.recompute();
        Some(line)
    }

    /// Rebuilds the power status of every cell.
    pub fn recompute(&mut self) {
        self.network.recompute(&mut self.grid);
    }

    /// Counts dwellings by power state.
    pub fn network_stats(&self) -> NetworkStats {
        ElectricityNetwork::stats(&self.grid)
    }

    pub fn plant(&self, id: PlantId) -> Option<&Plant> {
        let pos = self.grid.find_plant(id)?;
        self.grid.cell(pos).and_then(Cell::plant)
    }

    pub fn dwelling(&self, id: DwellingId) -> Option<&Dwelling> {
        let pos = self.grid.find_dwelling(id)?;
        self.grid.cell(pos).and_then(Cell::dwelling)
    }

    /// Mutable access to a plant. Changes that affect the network must go
    /// through [`CityMap::set_plant_operational`] instead.
    pub(crate) fn plant_mut(&mut self, id: PlantId) -> Option<&mut Plant> {
        let pos = self.grid.find_plant(id)?;
        self.grid.cell_mut(pos).and_then(|c| c.plant_mut())
    }

    pub(crate) fn dwelling_mut(&mut self, id: DwellingId) -> Option<&mut Dwelling> {
        let pos = self.grid.find_dwelling(id)?;
        self.grid.cell_mut(pos).and_then(|c| c.dwelling_mut())
    }

    pub(crate) fn plants_mut(&mut self) -> impl Iterator<Item = &mut Plant> {
        self.grid.plants_mut()
    }

    pub(crate) fn dwellings_mut(&mut self) -> impl Iterator<Item = &mut Dwelling> {
        self.grid.dwellings_mut()
    }

    /// Takes a plant offline or back online and recomputes power.
    ///
    /// Returns `false` if no plant has that id.
    pub fn set_plant_operational(&mut self, id: PlantId, operational: bool) -> bool {
        let Some(plant) = self.plant_mut(id) else {
            return false;
        };
        plant.set_operational(operational);
        self.recompute();
        true
    }

    /// Renders the map as one text line per row using [`Cell::glyph`].
    pub fn render_ascii(&self) -> Vec<String> {
        (0..self.height() as i32)
            .map(|y| {
                (0..self.width() as i32)
                    .map(|x| self.grid.cell(Position::new(x, y)).map_or(' ', Cell::glyph))
                    .collect()
            })
            .collect()
    }
}
