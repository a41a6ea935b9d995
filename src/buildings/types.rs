//! Common identity and value-range types shared by plants, dwellings, and occupants.

use std::fmt;

use rand::Rng;
use serde::Serialize;

/// Unique identifier of a power plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlantId(pub u32);

/// Unique identifier of a dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DwellingId(pub u32);

/// Unique identifier of an occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccupantId(pub u32);

/// Unique identifier of a routed power line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineId(pub u32);

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plant#{}", self.0)
    }
}

impl fmt::Display for DwellingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dwelling#{}", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

/// Monotonic identity counters for every entity kind in one city.
///
/// Owned by the city aggregate and threaded explicitly into constructors, so
/// two independent games never share counters and a fresh allocator always
/// restarts at 1.
///
/// # Examples
///
/// ```
/// use energy_tycoon::buildings::types::IdAllocator;
///
/// let mut ids = IdAllocator::default();
/// assert_eq!(ids.next_plant().0, 1);
/// assert_eq!(ids.next_plant().0, 2);
/// assert_eq!(ids.next_dwelling().0, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    plants: u32,
    dwellings: u32,
    occupants: u32,
    lines: u32,
}

impl IdAllocator {
    /// Allocates the next plant id.
    pub fn next_plant(&mut self) -> PlantId {
        self.plants += 1;
        PlantId(self.plants)
    }

    /// Allocates the next dwelling id.
    pub fn next_dwelling(&mut self) -> DwellingId {
        self.dwellings += 1;
        DwellingId(self.dwellings)
    }

    /// Allocates the next occupant id.
    pub fn next_occupant(&mut self) -> OccupantId {
        self.occupants += 1;
        OccupantId(self.occupants)
    }

    /// Allocates the next power-line id.
    pub fn next_line(&mut self) -> LineId {
        self.lines += 1;
        LineId(self.lines)
    }
}

/// Inclusive integer range used to draw per-tier building parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    /// Lower bound (inclusive).
    pub min: i64,
    /// Upper bound (inclusive).
    pub max: i64,
}

impl ValueRange {
    /// Creates a new inclusive range.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub const fn new(min: i64, max: i64) -> Self {
        assert!(min <= max, "range min must be <= max");
        Self { min, max }
    }

    /// Draws a uniformly distributed value in `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        rng.random_range(self.min..=self.max)
    }

    /// Returns `true` if `value` lies inside the range.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn counters_are_independent_per_kind() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_plant(), PlantId(1));
        assert_eq!(ids.next_line(), LineId(1));
        assert_eq!(ids.next_plant(), PlantId(2));
        assert_eq!(ids.next_occupant(), OccupantId(1));
    }

    #[test]
    fn fresh_allocator_restarts() {
        let mut a = IdAllocator::default();
        a.next_dwelling();
        a.next_dwelling();
        let mut b = IdAllocator::default();
        assert_eq!(b.next_dwelling(), DwellingId(1));
    }

    #[test]
    fn samples_stay_in_range() {
        let range = ValueRange::new(50, 100);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(range.contains(range.sample(&mut rng)));
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let range = ValueRange::new(5, 5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), 5);
    }

    #[test]
    #[should_panic]
    fn inverted_range_panics() {
        let lo = 10;
        let hi = 1;
        ValueRange::new(lo, hi);
    }
}
