//! Electrical network: derives which cells are powered from plants, routed
//! lines, and dwelling-to-dwelling relay.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::buildings::{IdAllocator, LineId};

use super::Position;
use super::grid::{Cell, Grid, PowerStatus};
use super::line::{PowerLine, has_clear_sight};

/// Euclidean radius within which an operational plant powers dwellings directly.
pub const DEFAULT_COVERAGE_RADIUS: u32 = 5;

/// Manhattan radius within which a powered dwelling relays power to another.
pub const DEFAULT_PROPAGATION_RADIUS: u32 = 3;

/// Cardinal offsets, checked before diagonals when picking a line endpoint.
const CARDINALS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Breakdown of dwelling power states after a recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    /// Dwellings powered at level 0.
    pub direct: usize,
    /// Dwellings powered through relay (level > 0).
    pub propagated: usize,
    /// Dwellings without power.
    pub unpowered: usize,
}

/// Routed lines plus the coverage parameters for one grid.
#[derive(Debug, Clone, Serialize)]
pub struct ElectricityNetwork {
    lines: Vec<PowerLine>,
    coverage_radius: u32,
    propagation_radius: u32,
}

impl Default for ElectricityNetwork {
    fn default() -> Self {
        Self::new(DEFAULT_COVERAGE_RADIUS, DEFAULT_PROPAGATION_RADIUS)
    }
}

impl ElectricityNetwork {
    /// Creates a network with no lines.
    ///
    /// # Arguments
    ///
    /// * `coverage_radius` - Euclidean reach of a plant's direct coverage
    /// * `propagation_radius` - Manhattan reach of one relay hop
    pub fn new(coverage_radius: u32, propagation_radius: u32) -> Self {
        Self {
            lines: Vec::new(),
            coverage_radius,
            propagation_radius,
        }
    }

    pub fn lines(&self) -> &[PowerLine] {
        &self.lines
    }

    pub fn coverage_radius(&self) -> u32 {
        self.coverage_radius
    }

    pub fn propagation_radius(&self) -> u32 {
        self.propagation_radius
    }

    /// Stores `line` if it is valid on `grid`. Returns `false` otherwise.
    pub(crate) fn push_line(&mut self, line: PowerLine, grid: &Grid) -> bool {
        if !line.is_valid(grid) {
            return false;
        }
        self.lines.push(line);
        true
    }

    pub(crate) fn take_line(&mut self, id: LineId) -> Option<PowerLine> {
        let idx = self.lines.iter().position(|l| l.id() == id)?;
        Some(self.lines.remove(idx))
    }

    /// Rebuilds the power status of every cell from scratch.
    ///
    /// Plants are always level 0. Dwellings are seeded at level 0 by an
    /// operational plant's coverage radius or by the far end of a routed line
    /// starting next to one, then relayed breadth-first so each dwelling ends
    /// at its minimum hop count. Calling this twice without an intervening
    /// mutation yields identical state.
    pub fn recompute(&self, grid: &mut Grid) {
        for cell in grid.cells_mut() {
            let status = if cell.plant().is_some() {
                PowerStatus::Direct
            } else {
                PowerStatus::Unpowered
            };
            cell.set_power(status);
        }

        let mut seeds: Vec<Position> = Vec::new();

        // Direct coverage
        let r = self.coverage_radius as i32;
        for plant_pos in grid.plant_positions() {
            if !is_operational_plant(grid, plant_pos) {
                continue;
            }
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx == 0 && dy == 0) || dx * dx + dy * dy > r * r {
                        continue;
                    }
                    seed_dwelling(grid, plant_pos.offset(dx, dy), &mut seeds);
                }
            }
        }

        // Routed lines
        for line in &self.lines {
            if !line.is_valid(grid) || !self.starts_at_live_plant(grid, line) {
                continue;
            }
            let end = line.end();
            for dy in -1..=1 {
                for dx in -1..=1 {
                    seed_dwelling(grid, end.offset(dx, dy), &mut seeds);
                }
            }
        }

        let direct = seeds.len();
        let relayed = self.propagate(grid, seeds);
        debug!(direct, relayed, lines = self.lines.len(), "network recomputed");
    }

    fn starts_at_live_plant(&self, grid: &Grid, line: &PowerLine) -> bool {
        line.start()
            .neighbors8()
            .into_iter()
            .any(|n| is_operational_plant(grid, n))
    }

    /// Breadth-first relay from the seed set. Returns the number of dwellings
    /// powered by relay.
    fn propagate(&self, grid: &mut Grid, seeds: Vec<Position>) -> usize {
        let r = self.propagation_radius as i32;
        let mut queue: VecDeque<(Position, u32)> = seeds.into_iter().map(|p| (p, 0)).collect();
        let mut relayed = 0;

        while let Some((current, level)) = queue.pop_front() {
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx == 0 && dy == 0) || dx.abs() + dy.abs() > r {
                        continue;
                    }
                    let target = current.offset(dx, dy);
                    let unpowered_dwelling = grid
                        .cell(target)
                        .is_some_and(|c| c.dwelling().is_some() && !c.is_powered());
                    if !unpowered_dwelling || !has_clear_sight(grid, current, target) {
                        continue;
                    }
                    if let Some(cell) = grid.cell_mut(target) {
                        cell.set_power(PowerStatus::Propagated(level + 1));
                        queue.push_back((target, level + 1));
                        relayed += 1;
                    }
                }
            }
        }
        relayed
    }

    /// Plans a line from next to the plant at `plant_pos` to next to the
    /// dwelling at `dwelling_pos`.
    ///
    /// Each endpoint is the first empty buildable neighbour found, cardinals
    /// before diagonals. The path steps along x then y and must be in bounds
    /// and water-free along its whole length.
    ///
    /// # Returns
    ///
    /// `None` if either endpoint has no free neighbour or the path is blocked.
    /// An id is drawn from `ids` only on success.
    pub fn create_auto_line(
        &self,
        grid: &Grid,
        plant_pos: Position,
        dwelling_pos: Position,
        ids: &mut IdAllocator,
    ) -> Option<PowerLine> {
        let start = adjacent_free_cell(grid, plant_pos)?;
        let end = adjacent_free_cell(grid, dwelling_pos)?;
        let candidate = PowerLine::straight(LineId(0), start, end);
        if !candidate.is_valid(grid) {
            return None;
        }
        Some(PowerLine::straight(ids.next_line(), start, end))
    }

    /// Counts dwellings by power state.
    pub fn stats(grid: &Grid) -> NetworkStats {
        let mut stats = NetworkStats::default();
        for cell in grid.cells().filter(|c| c.dwelling().is_some()) {
            match cell.power() {
                PowerStatus::Direct => stats.direct += 1,
                PowerStatus::Propagated(_) => stats.propagated += 1,
                PowerStatus::Unpowered => stats.unpowered += 1,
            }
        }
        stats
    }
}

fn is_operational_plant(grid: &Grid, pos: Position) -> bool {
    grid.cell(pos)
        .and_then(Cell::plant)
        .is_some_and(|p| p.is_operational())
}

/// Powers an unpowered dwelling at `pos` at level 0 and records it as a seed.
fn seed_dwelling(grid: &mut Grid, pos: Position, seeds: &mut Vec<Position>) {
    if let Some(cell) = grid.cell_mut(pos) {
        if cell.dwelling().is_some() && !cell.is_powered() {
            cell.set_power(PowerStatus::Direct);
            seeds.push(pos);
        }
    }
}

fn adjacent_free_cell(grid: &Grid, pos: Position) -> Option<Position> {
    CARDINALS
        .into_iter()
        .chain(DIAGONALS)
        .map(|(dx, dy)| pos.offset(dx, dy))
        .find(|&p| grid.cell(p).is_some_and(|c| c.is_empty() && c.is_buildable()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::{Dwelling, DwellingId, DwellingTier, EnergyType, Plant, PlantId};
    use crate::map::grid::Terrain;

    fn place_house(grid: &mut Grid, x: i32, y: i32, id: u32) {
        let d = Dwelling::with_values(DwellingId(id), DwellingTier::Basic, 60, 12);
        assert!(grid.place_dwelling(Position::new(x, y), d).is_ok());
    }

    fn place_coal(grid: &mut Grid, x: i32, y: i32, id: u32) {
        let p = Plant::new(PlantId(id), EnergyType::Coal);
        assert!(grid.place_plant(Position::new(x, y), p).is_ok());
    }

    fn power_at(grid: &Grid, x: i32, y: i32) -> PowerStatus {
        grid.cell(Position::new(x, y))
            .map_or(PowerStatus::Unpowered, Cell::power)
    }

    #[test]
    fn plants_are_direct_and_coverage_is_euclidean() {
        let mut grid = Grid::new(20, 20);
        place_coal(&mut grid, 5, 5, 1);
        place_house(&mut grid, 8, 9, 1); // 3-4-5 triangle, exactly on the radius
        place_house(&mut grid, 9, 9, 2); // sqrt(32) > 5, but within relay of (8,9)
        place_house(&mut grid, 19, 19, 3);

        let net = ElectricityNetwork::default();
        net.recompute(&mut grid);

        assert_eq!(power_at(&grid, 5, 5), PowerStatus::Direct);
        assert_eq!(power_at(&grid, 8, 9), PowerStatus::Direct);
        assert_eq!(power_at(&grid, 9, 9), PowerStatus::Propagated(1));
        assert_eq!(power_at(&grid, 19, 19), PowerStatus::Unpowered);
    }

    #[test]
    fn relay_levels_are_bfs_depth() {
        let mut grid = Grid::new(30, 3);
        place_coal(&mut grid, 0, 1, 1);
        // chain spaced 3 apart along the row, first one in coverage
        for (i, x) in [5, 8, 11, 14].into_iter().enumerate() {
            place_house(&mut grid, x, 1, i as u32 + 1);
        }
        let net = ElectricityNetwork::default();
        net.recompute(&mut grid);

        assert_eq!(power_at(&grid, 5, 1), PowerStatus::Direct);
        assert_eq!(power_at(&grid, 8, 1), PowerStatus::Propagated(1));
        assert_eq!(power_at(&grid, 11, 1), PowerStatus::Propagated(2));
        assert_eq!(power_at(&grid, 14, 1), PowerStatus::Propagated(3));
        assert_eq!(
            ElectricityNetwork::stats(&grid),
            NetworkStats {
                direct: 1,
                propagated: 3,
                unpowered: 0
            }
        );
    }

    #[test]
    fn water_blocks_relay() {
        let mut grid = Grid::new(20, 3);
        place_coal(&mut grid, 0, 1, 1);
        place_house(&mut grid, 4, 1, 1);
        place_house(&mut grid, 7, 1, 2);
        for y in 0..3 {
            grid.set_terrain(Position::new(6, y), Terrain::Water);
        }
        let net = ElectricityNetwork::default();
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 4, 1), PowerStatus::Direct);
        assert_eq!(power_at(&grid, 7, 1), PowerStatus::Unpowered);
    }

    #[test]
    fn offline_plant_leaves_no_stale_coverage() {
        let mut grid = Grid::new(10, 10);
        place_coal(&mut grid, 2, 2, 1);
        place_house(&mut grid, 3, 3, 1);
        let net = ElectricityNetwork::default();
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 3, 3), PowerStatus::Direct);

        if let Some(p) = grid.cell_mut(Position::new(2, 2)).and_then(Cell::plant_mut) {
            p.set_operational(false);
        }
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 3, 3), PowerStatus::Unpowered);
        // the plant cell itself still reads as direct
        assert_eq!(power_at(&grid, 2, 2), PowerStatus::Direct);
    }

    #[test]
    fn routed_line_powers_far_dwelling() {
        let mut grid = Grid::new(30, 5);
        place_coal(&mut grid, 0, 2, 1);
        place_house(&mut grid, 25, 2, 1);

        let mut net = ElectricityNetwork::default();
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 25, 2), PowerStatus::Unpowered);

        let mut ids = IdAllocator::default();
        let line = net.create_auto_line(&grid, Position::new(0, 2), Position::new(25, 2), &mut ids);
        let line = line.map(|l| {
            assert_eq!(l.start(), Position::new(0, 1));
            assert_eq!(l.end(), Position::new(25, 1));
            l
        });
        assert!(line.is_some_and(|l| net.push_line(l, &grid)));
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 25, 2), PowerStatus::Direct);
    }

    #[test]
    fn auto_line_refuses_water_path() {
        let mut grid = Grid::new(12, 3);
        place_coal(&mut grid, 0, 1, 1);
        place_house(&mut grid, 10, 1, 1);
        for y in 0..3 {
            grid.set_terrain(Position::new(5, y), Terrain::Water);
        }
        let net = ElectricityNetwork::default();
        let mut ids = IdAllocator::default();
        let line = net.create_auto_line(&grid, Position::new(0, 1), Position::new(10, 1), &mut ids);
        assert!(line.is_none());
        // no id consumed by the failed attempt
        assert_eq!(ids.next_line().0, 1);
    }

    #[test]
    fn auto_line_prefers_cardinals() {
        let mut grid = Grid::new(5, 5);
        place_coal(&mut grid, 2, 2, 1);
        place_house(&mut grid, 2, 1, 1); // blocks north
        let start = adjacent_free_cell(&grid, Position::new(2, 2));
        assert_eq!(start, Some(Position::new(3, 2))); // east is next

        for (x, y) in [(3, 2), (2, 3), (1, 2)] {
            grid.set_terrain(Position::new(x, y), Terrain::Water);
        }
        let start = adjacent_free_cell(&grid, Position::new(2, 2));
        assert_eq!(start, Some(Position::new(1, 1))); // first diagonal
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut grid = Grid::new(15, 15);
        place_coal(&mut grid, 1, 1, 1);
        for (i, (x, y)) in [(4, 4), (6, 6), (9, 8), (12, 12), (14, 0)].into_iter().enumerate() {
            place_house(&mut grid, x, y, i as u32 + 1);
        }
        grid.set_terrain(Position::new(10, 10), Terrain::Water);
        let net = ElectricityNetwork::default();
        net.recompute(&mut grid);
        let first: Vec<PowerStatus> = grid.cells().map(Cell::power).collect();
        net.recompute(&mut grid);
        let second: Vec<PowerStatus> = grid.cells().map(Cell::power).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn line_from_dead_plant_is_ignored() {
        let mut grid = Grid::new(20, 3);
        place_coal(&mut grid, 0, 1, 1);
        place_house(&mut grid, 15, 1, 1);
        let mut net = ElectricityNetwork::default();
        let mut ids = IdAllocator::default();
        let line = net.create_auto_line(&grid, Position::new(0, 1), Position::new(15, 1), &mut ids);
        assert!(line.is_some_and(|l| net.push_line(l, &grid)));

        if let Some(p) = grid.cell_mut(Position::new(0, 1)).and_then(Cell::plant_mut) {
            p.set_operational(false);
        }
        net.recompute(&mut grid);
        assert_eq!(power_at(&grid, 15, 1), PowerStatus::Unpowered);
    }
}
