use serde::{Deserialize, Serialize};

use crate::buildings::{Dwelling, DwellingId, Plant, PlantId};
use crate::error::PlacementError;

use super::Position;

/// Terrain classification of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    #[default]
    Buildable,
    Water,
}

/// What currently occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupantKind {
    Empty,
    Dwelling,
    Plant,
}

/// Electrical state of a cell after the last network recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum PowerStatus {
    #[default]
    Unpowered,
    /// Powered by a plant's coverage, a routed line, or being a plant (level 0).
    Direct,
    /// Powered by relay from another dwelling, N hops from the nearest seed.
    Propagated(u32),
}

impl PowerStatus {
    /// Propagation depth, or `None` when unpowered.
    pub fn level(self) -> Option<u32> {
        match self {
            Self::Unpowered => None,
            Self::Direct => Some(0),
            Self::Propagated(level) => Some(level),
        }
    }

    pub fn is_powered(self) -> bool {
        self != Self::Unpowered
    }
}

/// The building a cell owns. A cell holds at most one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Structure {
    Dwelling(Dwelling),
    Plant(Plant),
}

/// One grid square.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    position: Position,
    terrain: Terrain,
    structure: Option<Structure>,
    power: PowerStatus,
    line_overlay: bool,
}

impl Cell {
    fn new(position: Position) -> Self {
        Self {
            position,
            terrain: Terrain::Buildable,
            structure: None,
            power: PowerStatus::Unpowered,
            line_overlay: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn is_water(&self) -> bool {
        self.terrain == Terrain::Water
    }

    pub fn is_buildable(&self) -> bool {
        self.terrain == Terrain::Buildable
    }

    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn occupant_kind(&self) -> OccupantKind {
        match self.structure {
            None => OccupantKind::Empty,
            Some(Structure::Dwelling(_)) => OccupantKind::Dwelling,
            Some(Structure::Plant(_)) => OccupantKind::Plant,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_none()
    }

    pub fn dwelling(&self) -> Option<&Dwelling> {
        match &self.structure {
            Some(Structure::Dwelling(d)) => Some(d),
            _ => None,
        }
    }

    pub fn plant(&self) -> Option<&Plant> {
        match &self.structure {
            Some(Structure::Plant(p)) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn dwelling_mut(&mut self) -> Option<&mut Dwelling> {
        match &mut self.structure {
            Some(Structure::Dwelling(d)) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn plant_mut(&mut self) -> Option<&mut Plant> {
        match &mut self.structure {
            Some(Structure::Plant(p)) => Some(p),
            _ => None,
        }
    }

    pub fn power(&self) -> PowerStatus {
        self.power
    }

    pub fn is_powered(&self) -> bool {
        self.power.is_powered()
    }

    /// Sets the power status and mirrors it into a hosted dwelling.
    pub(crate) fn set_power(&mut self, power: PowerStatus) {
        self.power = power;
        if let Some(Structure::Dwelling(d)) = &mut self.structure {
            d.set_supplied(power.is_powered());
        }
    }

    /// `true` when a routed line crosses this otherwise empty cell.
    pub fn has_line(&self) -> bool {
        self.line_overlay && self.is_empty()
    }

    pub(crate) fn set_line_overlay(&mut self, overlay: bool) {
        self.line_overlay = overlay;
    }

    /// Single-character glyph for text renderings of the map.
    pub fn glyph(&self) -> char {
        match &self.structure {
            Some(Structure::Plant(_)) => 'P',
            Some(Structure::Dwelling(d)) if d.is_supplied() => 'H',
            Some(Structure::Dwelling(_)) => 'h',
            None if self.is_water() => '~',
            None if self.has_line() => '+',
            None => '.',
        }
    }
}

/// Fixed-size matrix of cells stored row-major.
///
/// Structural mutators are crate-private: outside callers go through
/// [`super::CityMap`], which recomputes the network after every change.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an all-buildable grid.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be > 0");
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(Position::new(x as i32, y as i32)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    /// Returns the cell at `pos`, or `None` when out of bounds.
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(|i| &mut self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Positions of every plant cell, row-major.
    pub fn plant_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|c| c.plant().is_some())
            .map(Cell::position)
            .collect()
    }

    /// Positions of every dwelling cell, row-major.
    pub fn dwelling_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|c| c.dwelling().is_some())
            .map(Cell::position)
            .collect()
    }

    pub fn plants(&self) -> impl Iterator<Item = &Plant> {
        self.cells.iter().filter_map(Cell::plant)
    }

    pub fn dwellings(&self) -> impl Iterator<Item = &Dwelling> {
        self.cells.iter().filter_map(Cell::dwelling)
    }

    pub(crate) fn plants_mut(&mut self) -> impl Iterator<Item = &mut Plant> {
        self.cells.iter_mut().filter_map(Cell::plant_mut)
    }

    pub(crate) fn dwellings_mut(&mut self) -> impl Iterator<Item = &mut Dwelling> {
        self.cells.iter_mut().filter_map(Cell::dwelling_mut)
    }

    pub fn plant_count(&self) -> usize {
        self.plants().count()
    }

    pub fn dwelling_count(&self) -> usize {
        self.dwellings().count()
    }

    /// Number of occupied cells.
    pub fn building_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn find_plant(&self, id: PlantId) -> Option<Position> {
        self.cells
            .iter()
            .find(|c| c.plant().is_some_and(|p| p.id() == id))
            .map(Cell::position)
    }

    pub fn find_dwelling(&self, id: DwellingId) -> Option<Position> {
        self.cells
            .iter()
            .find(|c| c.dwelling().is_some_and(|d| d.id() == id))
            .map(Cell::position)
    }

    /// Checks whether a structure could be placed at `pos`.
    ///
    /// # Arguments
    ///
    /// * `pos` - Target cell
    /// * `needs_water` - `true` for hydro plants, which sit on water; every
    ///   other structure needs buildable terrain
    ///
    /// # Errors
    ///
    /// Returns the first rule `pos` violates: bounds, occupancy, then terrain.
    pub fn check_placement(&self, pos: Position, needs_water: bool) -> Result<(), PlacementError> {
        let cell = self.cell(pos).ok_or(PlacementError::OutOfBounds(pos))?;
        if !cell.is_empty() {
            return Err(PlacementError::Occupied(pos));
        }
        if cell.is_water() != needs_water {
            return Err(PlacementError::TerrainMismatch(pos));
        }
        Ok(())
    }

    pub(crate) fn place_dwelling(&mut self, pos: Position, dwelling: Dwelling) -> Result<(), PlacementError> {
        self.check_placement(pos, false)?;
        self.put(pos, Structure::Dwelling(dwelling))
    }

    pub(crate) fn place_plant(&mut self, pos: Position, plant: Plant) -> Result<(), PlacementError> {
        self.check_placement(pos, plant.kind().requires_water())?;
        self.put(pos, Structure::Plant(plant))
    }

    fn put(&mut self, pos: Position, structure: Structure) -> Result<(), PlacementError> {
        let cell = self.cell_mut(pos).ok_or(PlacementError::OutOfBounds(pos))?;
        cell.structure = Some(structure);
        cell.line_overlay = false;
        Ok(())
    }

    /// Removes any structure and line overlay at `pos` and unpowers the cell.
    ///
    /// Terrain is never changed. Returns the removed structure, if any.
    pub(crate) fn clear(&mut self, pos: Position) -> Option<Structure> {
        let cell = self.cell_mut(pos)?;
        cell.power = PowerStatus::Unpowered;
        cell.line_overlay = false;
        cell.structure.take()
    }

    /// Changes the terrain of an empty cell. Returns `false` if occupied or out of bounds.
    pub(crate) fn set_terrain(&mut self, pos: Position, terrain: Terrain) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.is_empty() => {
                cell.terrain = terrain;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if any of the eight neighbours of `pos` is water.
    pub fn is_adjacent_to_water(&self, pos: Position) -> bool {
        pos.neighbors8()
            .into_iter()
            .any(|n| self.cell(n).is_some_and(Cell::is_water))
    }

    /// Finds the empty buildable cell closest to `center`, scanning outward
    /// ring by ring (Chebyshev distance), row-major within a ring.
    pub fn nearest_buildable(&self, center: Position) -> Option<Position> {
        let max_ring = self.width.max(self.height) as i32;
        for ring in 0..=max_ring {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs().max(dy.abs()) != ring {
                        continue;
                    }
                    let pos = center.offset(dx, dy);
                    if self.check_placement(pos, false).is_ok() {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::buildings::{DwellingTier, EnergyType};

    fn dwelling(id: u32) -> Dwelling {
        Dwelling::with_values(DwellingId(id), DwellingTier::Basic, 80, 15)
    }

    #[test]
    fn row_major_layout() {
        let grid = Grid::new(4, 3);
        let positions: Vec<_> = grid.cells().map(Cell::position).take(5).collect();
        assert_eq!(positions[4], Position::new(0, 1));
        assert!(grid.cell(Position::new(3, 2)).is_some());
        assert!(grid.cell(Position::new(4, 0)).is_none());
        assert!(grid.cell(Position::new(-1, 0)).is_none());
    }

    #[test]
    fn occupied_cell_rejects_placement_and_is_unchanged() {
        let mut grid = Grid::new(5, 5);
        let pos = Position::new(2, 2);
        assert!(grid.place_dwelling(pos, dwelling(1)).is_ok());
        let before = grid.cell(pos).cloned();

        let err = grid.place_plant(pos, Plant::new(PlantId(1), EnergyType::Coal));
        assert_eq!(err, Err(PlacementError::Occupied(pos)));
        assert_eq!(grid.place_dwelling(pos, dwelling(2)), Err(PlacementError::Occupied(pos)));
        assert_eq!(grid.cell(pos).cloned(), before);
    }

    #[test]
    fn terrain_rules() {
        let mut grid = Grid::new(5, 5);
        let water = Position::new(1, 1);
        assert!(grid.set_terrain(water, Terrain::Water));

        assert_eq!(
            grid.place_dwelling(water, dwelling(1)),
            Err(PlacementError::TerrainMismatch(water))
        );
        assert_eq!(
            grid.place_plant(water, Plant::new(PlantId(1), EnergyType::Coal)),
            Err(PlacementError::TerrainMismatch(water))
        );
        assert!(grid.place_plant(water, Plant::new(PlantId(2), EnergyType::Hydro)).is_ok());

        let land = Position::new(3, 3);
        assert_eq!(
            grid.place_plant(land, Plant::new(PlantId(3), EnergyType::Hydro)),
            Err(PlacementError::TerrainMismatch(land))
        );
    }

    #[test]
    fn out_of_bounds_is_invalid_input() {
        let mut grid = Grid::new(3, 3);
        let pos = Position::new(7, 0);
        assert_eq!(
            grid.place_dwelling(pos, dwelling(1)),
            Err(PlacementError::OutOfBounds(pos))
        );
        assert!(grid.clear(pos).is_none());
    }

    #[test]
    fn clear_keeps_terrain_and_strips_overlay() {
        let mut grid = Grid::new(3, 3);
        let pos = Position::new(0, 0);
        grid.place_dwelling(pos, dwelling(1)).ok();
        if let Some(cell) = grid.cell_mut(pos) {
            cell.set_power(PowerStatus::Direct);
            cell.set_line_overlay(true);
        }
        let removed = grid.clear(pos);
        assert!(matches!(removed, Some(Structure::Dwelling(_))));
        let cell = grid.cell(pos);
        assert_eq!(cell.map(Cell::terrain), Some(Terrain::Buildable));
        assert_eq!(cell.map(Cell::power), Some(PowerStatus::Unpowered));
        assert_eq!(cell.map(Cell::has_line), Some(false));
    }

    #[test]
    fn set_power_mirrors_into_dwelling() {
        let mut grid = Grid::new(3, 3);
        let pos = Position::new(1, 1);
        grid.place_dwelling(pos, dwelling(1)).ok();
        if let Some(cell) = grid.cell_mut(pos) {
            cell.set_power(PowerStatus::Propagated(2));
        }
        let supplied = grid.cell(pos).and_then(Cell::dwelling).map(Dwelling::is_supplied);
        assert_eq!(supplied, Some(true));
    }

    #[test]
    fn water_adjacency_uses_eight_neighbours() {
        let mut grid = Grid::new(5, 5);
        grid.set_terrain(Position::new(0, 0), Terrain::Water);
        assert!(grid.is_adjacent_to_water(Position::new(1, 1)));
        assert!(!grid.is_adjacent_to_water(Position::new(2, 2)));
    }

    #[test]
    fn nearest_buildable_skips_water_and_buildings() {
        let mut grid = Grid::new(5, 5);
        let center = Position::new(2, 2);
        grid.set_terrain(center, Terrain::Water);
        let first = grid.nearest_buildable(center);
        assert_eq!(first, Some(Position::new(1, 1)));

        let mut rng = StdRng::seed_from_u64(0);
        let d = Dwelling::new(DwellingId(1), DwellingTier::Basic, &mut rng);
        grid.place_dwelling(Position::new(1, 1), d).ok();
        assert_eq!(grid.nearest_buildable(center), Some(Position::new(2, 1)));
    }

    #[test]
    fn lookup_by_id() {
        let mut grid = Grid::new(4, 4);
        grid.place_plant(Position::new(3, 0), Plant::new(PlantId(9), EnergyType::Wind))
            .ok();
        grid.place_dwelling(Position::new(0, 3), dwelling(4)).ok();
        assert_eq!(grid.find_plant(PlantId(9)), Some(Position::new(3, 0)));
        assert_eq!(grid.find_dwelling(DwellingId(4)), Some(Position::new(0, 3)));
        assert_eq!(grid.find_plant(PlantId(1)), None);
        assert_eq!(grid.building_count(), 2);
    }
}
