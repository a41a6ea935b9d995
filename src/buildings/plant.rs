use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::PlantId;

/// Fixed per-variant parameters of a power plant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySpec {
    /// Human-readable name of the energy source.
    pub name: &'static str,
    /// Pollution factor (0.0 = clean, 1.0 = dirtiest).
    pub pollution: f64,
    /// Reliability factor in `[0.0, 1.0]`; lower values widen production variance.
    pub reliability: f64,
    /// Construction cost.
    pub cost: i64,
    /// Production at level 1 with perfect reliability (energy units per tick).
    pub base_production: u32,
    /// Maintenance cost per tick at level 1.
    pub base_maintenance: i64,
}

/// Lookup table indexed by [`EnergyType`] discriminant.
const CATALOG: [EnergySpec; 5] = [
    EnergySpec {
        name: "Coal",
        pollution: 0.8,
        reliability: 0.3,
        cost: 1000,
        base_production: 500,
        base_maintenance: 100,
    },
    EnergySpec {
        name: "Solar",
        pollution: 0.0,
        reliability: 0.6,
        cost: 1500,
        base_production: 200,
        base_maintenance: 20,
    },
    EnergySpec {
        name: "Wind",
        pollution: 0.0,
        reliability: 0.5,
        cost: 1200,
        base_production: 250,
        base_maintenance: 30,
    },
    EnergySpec {
        name: "Nuclear",
        pollution: 0.1,
        reliability: 0.9,
        cost: 5000,
        base_production: 1000,
        base_maintenance: 200,
    },
    EnergySpec {
        name: "Hydro",
        pollution: 0.0,
        reliability: 0.85,
        cost: 3000,
        base_production: 400,
        base_maintenance: 50,
    },
];

/// The five power-plant variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Coal = 0,
    Solar = 1,
    Wind = 2,
    Nuclear = 3,
    Hydro = 4,
}

impl EnergyType {
    /// Every variant, in catalog order.
    pub const ALL: [EnergyType; 5] = [
        EnergyType::Coal,
        EnergyType::Solar,
        EnergyType::Wind,
        EnergyType::Nuclear,
        EnergyType::Hydro,
    ];

    /// Returns the fixed parameters for this variant.
    pub fn spec(self) -> &'static EnergySpec {
        &CATALOG[self as usize]
    }

    /// Returns `true` for solar, wind, and hydro.
    pub fn is_renewable(self) -> bool {
        matches!(self, Self::Solar | Self::Wind | Self::Hydro)
    }

    /// Returns `true` if this variant must sit on water terrain.
    pub fn requires_water(self) -> bool {
        self == Self::Hydro
    }

    /// Parses a lowercase variant name (`"coal"`, `"solar"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.spec().name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

/// Ordered upgrade tiers of a power plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PlantLevel {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl PlantLevel {
    /// Output multiplier applied to base production.
    pub fn production_multiplier(self) -> f64 {
        match self {
            Self::Level1 => 1.0,
            Self::Level2 => 1.5,
            Self::Level3 => 2.2,
            Self::Level4 => 3.0,
        }
    }

    /// Multiplier applied to base maintenance.
    pub fn maintenance_multiplier(self) -> f64 {
        match self {
            Self::Level1 => 1.0,
            Self::Level2 => 1.3,
            Self::Level3 => 1.6,
            Self::Level4 => 2.0,
        }
    }

    /// Returns the next tier, or `None` at the top of the ladder.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Level1 => Some(Self::Level2),
            Self::Level2 => Some(Self::Level3),
            Self::Level3 => Some(Self::Level4),
            Self::Level4 => None,
        }
    }

    /// One-based tier number.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }
}

/// A power plant placed on the grid.
///
/// All variants share this one type; the per-variant constants come from
/// [`EnergyType::spec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plant {
    id: PlantId,
    name: String,
    kind: EnergyType,
    level: PlantLevel,
    operational: bool,
    age_days: u32,
}

impl Plant {
    /// Creates a new operational level-1 plant.
    pub fn new(id: PlantId, kind: EnergyType) -> Self {
        Self {
            id,
            name: format!("{kind} plant #{}", id.0),
            kind,
            level: PlantLevel::Level1,
            operational: true,
            age_days: 0,
        }
    }

    pub fn id(&self) -> PlantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EnergyType {
        self.kind
    }

    pub fn level(&self) -> PlantLevel {
        self.level
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn set_operational(&mut self, operational: bool) {
        self.operational = operational;
    }

    /// Days elapsed since construction.
    pub fn age_days(&self) -> u32 {
        self.age_days
    }

    pub fn increment_age(&mut self) {
        self.age_days += 1;
    }

    /// Samples this tick's energy output.
    ///
    /// Output is `base × level multiplier × factor`, where `factor` is drawn
    /// uniformly in `[reliability, 1.0]` in whole-percent steps for variants
    /// whose reliability is below 1.0. A plant that is not operational yields 0.
    ///
    /// # Arguments
    ///
    /// * `rng` - Random source for the reliability factor
    pub fn production<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if !self.operational {
            return 0;
        }
        let spec = self.kind.spec();
        let mut output = f64::from(spec.base_production) * self.level.production_multiplier();
        if spec.reliability < 1.0 {
            let draw = f64::from(rng.random_range(0..=100_u32)) / 100.0;
            output *= spec.reliability + draw * (1.0 - spec.reliability);
        }
        output as u32
    }

    /// Maintenance cost per tick at the current level.
    pub fn maintenance_cost(&self) -> i64 {
        (self.kind.spec().base_maintenance as f64 * self.level.maintenance_multiplier()) as i64
    }

    /// Cost to reach the next level, or `None` at the top level.
    pub fn upgrade_cost(&self) -> Option<i64> {
        self.level
            .next()
            .map(|next| (self.kind.spec().cost as f64 * next.production_multiplier() * 0.6) as i64)
    }

    /// Moves to the next level. Returns `false` if already at the top.
    pub fn upgrade(&mut self) -> bool {
        match self.level.next() {
            Some(next) => {
                self.level = next;
                true
            }
            None => false,
        }
    }
}
