//! Random, time-boxed city events and their manager.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Default chance per tick that a new event fires.
pub const DEFAULT_EVENT_PROBABILITY: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Weather,
    Technical,
    Economic,
    Social,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Static description of an event kind.
#[derive(Debug, Clone, Copy)]
pub struct EventTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub category: EventCategory,
    pub severity: EventSeverity,
    pub happiness_impact: i32,
    pub production_modifier: f64,
    pub duration: u32,
}

/// The five events that can fire, chosen uniformly.
pub const TEMPLATES: [EventTemplate; 5] = [
    EventTemplate {
        title: "Storm",
        description: "A storm damages power lines.",
        category: EventCategory::Weather,
        severity: EventSeverity::Warning,
        happiness_impact: -5,
        production_modifier: 0.5,
        duration: 3,
    },
    EventTemplate {
        title: "Heat Wave",
        description: "Extreme temperatures strain residents.",
        category: EventCategory::Weather,
        severity: EventSeverity::Warning,
        happiness_impact: -10,
        production_modifier: 1.0,
        duration: 5,
    },
    EventTemplate {
        title: "Plant Breakdown",
        description: "A plant suffers a technical failure.",
        category: EventCategory::Technical,
        severity: EventSeverity::Critical,
        happiness_impact: -15,
        production_modifier: 0.7,
        duration: 2,
    },
    EventTemplate {
        title: "Economic Boom",
        description: "The local economy is thriving.",
        category: EventCategory::Economic,
        severity: EventSeverity::Info,
        happiness_impact: 10,
        production_modifier: 1.0,
        duration: 7,
    },
    EventTemplate {
        title: "Demand Surge",
        description: "Residents are using more energy than usual.",
        category: EventCategory::Social,
        severity: EventSeverity::Warning,
        happiness_impact: -5,
        production_modifier: 1.0,
        duration: 4,
    },
];

/// An event instance with a countdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEvent {
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    pub severity: EventSeverity,
    pub happiness_impact: i32,
    pub production_modifier: f64,
    pub duration: u32,
    remaining: u32,
}

impl GameEvent {
    pub fn from_template(template: &EventTemplate) -> Self {
        Self {
            title: template.title.to_string(),
            description: template.description.to_string(),
            category: template.category,
            severity: template.severity,
            happiness_impact: template.happiness_impact,
            production_modifier: template.production_modifier,
            duration: template.duration,
            remaining: template.duration,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Counts down one tick. Returns `true` when this tick expired the event.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} left)",
            self.title,
            format_duration(self.remaining),
            self.remaining
        )
    }
}

/// Human-readable length of `ticks` 90-minute ticks.
pub fn format_duration(ticks: u32) -> String {
    let minutes = ticks * super::clock::MINUTES_PER_TICK;
    let (hours, mins) = (minutes / 60, minutes % 60);
    if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h{mins:02}")
    }
}

/// Spawns events at random and tracks the active ones.
#[derive(Debug, Clone)]
pub struct EventManager {
    probability: f64,
    active: Vec<GameEvent>,
    history: Vec<GameEvent>,
    rng: StdRng,
}

impl EventManager {
    /// Creates a manager.
    ///
    /// # Arguments
    ///
    /// * `probability` - Chance per tick that an event fires, in [0, 1]
    /// * `seed` - Seed for the manager's own random stream
    ///
    /// # Panics
    ///
    /// Panics if `probability` is outside [0, 1].
    pub fn new(probability: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "event probability must be in [0, 1]"
        );
        Self {
            probability,
            active: Vec::new(),
            history: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Rolls for a new event and activates it on success.
    ///
    /// # Returns
    ///
    /// A copy of the event that fired, if any.
    pub fn try_generate(&mut self) -> Option<GameEvent> {
        if self.rng.random::<f64>() >= self.probability {
            return None;
        }
        let template = &TEMPLATES[self.rng.random_range(0..TEMPLATES.len())];
        Some(self.activate(GameEvent::from_template(template)))
    }

    /// Activates `event` directly, bypassing the random roll.
    pub fn activate(&mut self, event: GameEvent) -> GameEvent {
        self.history.push(event.clone());
        self.active.push(event.clone());
        event
    }

    /// Counts every active event down by one tick.
    ///
    /// # Returns
    ///
    /// The events that expired on this tick, in activation order.
    pub fn update_all(&mut self) -> Vec<GameEvent> {
        let mut expired = Vec::new();
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut event in self.active.drain(..) {
            if event.tick() {
                expired.push(event);
            } else {
                still_active.push(event);
            }
        }
        self.active = still_active;
        expired
    }

    /// Product of all active production modifiers; 1.0 when none are active.
    pub fn production_modifier(&self) -> f64 {
        self.active.iter().map(|e| e.production_modifier).product()
    }

    /// Sum of all active happiness impacts.
    pub fn happiness_impact(&self) -> i32 {
        self.active.iter().map(|e| e.happiness_impact).sum()
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active(&self) -> &[GameEvent] {
        &self.active
    }

    /// Every event that ever fired, oldest first.
    pub fn history(&self) -> &[GameEvent] {
        &self.history
    }
}
