use rand::Rng;
use serde::Serialize;

use super::types::{DwellingId, OccupantId};

/// Bounds of a freshly drawn satisfaction score.
const INITIAL_SATISFACTION: std::ops::RangeInclusive<u8> = 50..=80;

/// Satisfaction at or above which an occupant counts as happy.
pub const HAPPY_THRESHOLD: u8 = 50;

/// Satisfaction below which an occupant counts as very unhappy.
pub const VERY_UNHAPPY_THRESHOLD: u8 = 20;

/// A single resident of a dwelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupant {
    id: OccupantId,
    dwelling: DwellingId,
    satisfaction: u8,
}

impl Occupant {
    /// Creates an occupant with a satisfaction drawn uniformly from 50..=80.
    pub fn new<R: Rng + ?Sized>(id: OccupantId, dwelling: DwellingId, rng: &mut R) -> Self {
        Self {
            id,
            dwelling,
            satisfaction: rng.random_range(INITIAL_SATISFACTION),
        }
    }

    pub fn id(&self) -> OccupantId {
        self.id
    }

    /// The dwelling this occupant lives in.
    pub fn dwelling(&self) -> DwellingId {
        self.dwelling
    }

    pub fn satisfaction(&self) -> u8 {
        self.satisfaction
    }

    /// Shifts satisfaction by `delta`, clamped to `[0, 100]`.
    pub fn adjust_satisfaction(&mut self, delta: i32) {
        self.satisfaction = (i32::from(self.satisfaction) + delta).clamp(0, 100) as u8;
    }

    pub fn is_happy(&self) -> bool {
        self.satisfaction >= HAPPY_THRESHOLD
    }

    pub fn is_very_unhappy(&self) -> bool {
        self.satisfaction < VERY_UNHAPPY_THRESHOLD
    }
}
