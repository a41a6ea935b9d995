use rand::Rng;

use super::Position;
use super::grid::{Grid, Terrain};

/// Carves a one-cell-wide river running top to bottom.
///
/// The river starts at two thirds of the grid width and drifts at most one
/// column left or right per row, staying clear of the outer columns. Cells
/// that already hold a structure are left untouched.
///
/// # Returns
///
/// The number of cells turned into water.
pub fn carve_river<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> usize {
    let width = grid.width() as i32;
    if width < 3 {
        return 0;
    }
    let mut x = (width * 2 / 3).clamp(1, width - 2);
    let mut carved = 0;
    for y in 0..grid.height() as i32 {
        if grid.set_terrain(Position::new(x, y), Terrain::Water) {
            carved += 1;
        }
        x = (x + rng.random_range(-1..=1)).clamp(1, width - 2);
    }
    carved
}
