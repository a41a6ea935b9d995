use std::fmt;

use rand::Rng;
use serde::Serialize;

use super::occupant::Occupant;
use super::types::{DwellingId, IdAllocator, ValueRange};

/// Ordered dwelling tiers, from a small house to a tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DwellingTier {
    Basic,
    Medium,
    High,
}

impl DwellingTier {
    /// Zero-based position on the upgrade ladder.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Range the energy need is drawn from (units per tick).
    pub fn energy_need_range(self) -> ValueRange {
        match self {
            Self::Basic => ValueRange::new(50, 100),
            Self::Medium => ValueRange::new(150, 300),
            Self::High => ValueRange::new(500, 1000),
        }
    }

    /// Range the per-tick payment cap is drawn from.
    pub fn affordability_range(self) -> ValueRange {
        match self {
            Self::Basic => ValueRange::new(10, 20),
            Self::Medium => ValueRange::new(30, 60),
            Self::High => ValueRange::new(80, 150),
        }
    }

    /// Maximum number of occupants.
    pub fn capacity(self) -> usize {
        match self {
            Self::Basic => 5,
            Self::Medium => 20,
            Self::High => 100,
        }
    }

    /// Tax collected per occupant per tick while supplied.
    pub fn tax_per_occupant(self) -> i64 {
        match self {
            Self::Basic => 4,
            Self::Medium => 8,
            Self::High => 16,
        }
    }

    /// Cost to move from this tier to the next, if one exists.
    pub fn upgrade_cost(self) -> Option<i64> {
        match self {
            Self::Basic => Some(500),
            Self::Medium => Some(2000),
            Self::High => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::Basic => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => None,
        }
    }
}

impl fmt::Display for DwellingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Basic => "House",
            Self::Medium => "Apartment",
            Self::High => "Tower",
        };
        f.write_str(label)
    }
}

/// A dwelling on the grid, owning its occupants.
///
/// Energy need and affordability are drawn from the tier's ranges at
/// construction and again on every tier change. `supplied` is written by the
/// network recomputation and by the per-tick energy distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dwelling {
    id: DwellingId,
    tier: DwellingTier,
    occupants: Vec<Occupant>,
    energy_need: u32,
    affordability: i64,
    supplied: bool,
}

impl Dwelling {
    /// Creates an empty dwelling of the given tier with freshly drawn values.
    pub fn new<R: Rng + ?Sized>(id: DwellingId, tier: DwellingTier, rng: &mut R) -> Self {
        let mut dwelling = Self::with_values(id, tier, 0, 0);
        dwelling.redraw(rng);
        dwelling
    }

    /// Creates an empty dwelling with explicit need and affordability.
    ///
    /// Useful for scripted scenarios where values must not be random.
    pub fn with_values(id: DwellingId, tier: DwellingTier, energy_need: u32, affordability: i64) -> Self {
        Self {
            id,
            tier,
            occupants: Vec::new(),
            energy_need,
            affordability,
            supplied: false,
        }
    }

    fn redraw<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.energy_need = self.tier.energy_need_range().sample(rng) as u32;
        self.affordability = self.tier.affordability_range().sample(rng);
    }

    pub fn id(&self) -> DwellingId {
        self.id
    }

    pub fn tier(&self) -> DwellingTier {
        self.tier
    }

    pub fn energy_need(&self) -> u32 {
        self.energy_need
    }

    pub fn affordability(&self) -> i64 {
        self.affordability
    }

    pub fn is_supplied(&self) -> bool {
        self.supplied
    }

    pub fn set_supplied(&mut self, supplied: bool) {
        self.supplied = supplied;
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn capacity(&self) -> usize {
        self.tier.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.tier.capacity()
    }

    /// Moves `occupant` in. Returns `false` and drops nothing if the dwelling is full.
    pub fn add_occupant(&mut self, occupant: Occupant) -> bool {
        if self.is_full() {
            return false;
        }
        self.occupants.push(occupant);
        true
    }

    /// Creates a new occupant with an id from `ids` and moves it in.
    ///
    /// # Returns
    ///
    /// `true` if there was room.
    pub fn admit_new_occupant<R: Rng + ?Sized>(&mut self, ids: &mut IdAllocator, rng: &mut R) -> bool {
        if self.is_full() {
            return false;
        }
        let occupant = Occupant::new(ids.next_occupant(), self.id, rng);
        self.add_occupant(occupant)
    }

    /// Moves to the next tier and redraws need and affordability.
    ///
    /// Returns `false` if already at the top tier.
    pub fn upgrade<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        match self.tier.next() {
            Some(next) => {
                self.tier = next;
                self.redraw(rng);
                true
            }
            None => false,
        }
    }

    /// Payment for this tick's energy at `price` per unit.
    ///
    /// Returns `min(need × price, affordability)` truncated to whole money, or
    /// 0 if the dwelling is not supplied.
    pub fn energy_payment(&self, price: f64) -> i64 {
        if !self.supplied {
            return 0;
        }
        let bill = (f64::from(self.energy_need) * price) as i64;
        bill.min(self.affordability)
    }

    /// Tax owed this tick: tax-per-occupant × occupants, or 0 if unsupplied.
    pub fn tax(&self) -> i64 {
        if !self.supplied {
            return 0;
        }
        self.tier.tax_per_occupant() * self.occupants.len() as i64
    }

    /// Moves every occupant's satisfaction by `delta`, clamped per occupant.
    pub fn shift_satisfaction(&mut self, delta: i32) {
        for occupant in &mut self.occupants {
            occupant.adjust_satisfaction(delta);
        }
    }

    pub fn happy_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_happy()).count()
    }

    pub fn very_unhappy_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_very_unhappy()).count()
    }

    /// Mean occupant satisfaction, or `None` when empty.
    pub fn average_satisfaction(&self) -> Option<f64> {
        if self.occupants.is_empty() {
            return None;
        }
        let total: u32 = self.occupants.iter().map(|o| u32::from(o.satisfaction())).sum();
        Some(f64::from(total) / self.occupants.len() as f64)
    }
}
