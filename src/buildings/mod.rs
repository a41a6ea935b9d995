//! Building catalog: power plants, dwellings, and their occupants.

/// Dwelling tiers and the dwelling entity.
pub mod dwelling;
/// Residents and their satisfaction score.
pub mod occupant;
/// Energy types, plant levels, and the plant entity.
pub mod plant;
pub mod types;

pub use dwelling::{Dwelling, DwellingTier};
pub use occupant::Occupant;
pub use plant::{EnergyType, Plant, PlantLevel};
pub use types::{DwellingId, IdAllocator, LineId, OccupantId, PlantId};
