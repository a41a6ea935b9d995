//! Simulation runner and TUI application state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::ScenarioConfig;
use crate::sim::engine::{Engine, MAX_SPEED, MIN_SPEED};
use crate::sim::types::{Notification, SimState, TickReport};

/// Maximum number of tick reports kept for the rolling chart.
const MAX_HISTORY: usize = 200;

/// Maximum number of notifications kept in the feed.
const MAX_FEED: usize = 50;

/// TUI application state.
pub struct App {
    /// Live engine; replaced on restart or preset switch.
    pub engine: Engine,
    /// Scenario the current engine was built from.
    scenario: ScenarioConfig,
    /// Rolling history of tick reports for the chart.
    pub history: VecDeque<TickReport>,
    /// Newest notifications first.
    pub feed: VecDeque<Notification>,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Name of the active preset, or "custom" for a scenario file.
    pub preset_name: String,
}

impl App {
    /// Creates an app around a validated scenario.
    pub fn new(scenario: ScenarioConfig, label: &str) -> Self {
        let mut app = Self {
            engine: Engine::new(scenario.clone()),
            scenario,
            history: VecDeque::with_capacity(MAX_HISTORY),
            feed: VecDeque::with_capacity(MAX_FEED),
            quit: false,
            last_tick: Instant::now(),
            preset_name: label.to_string(),
        };
        app.start();
        app
    }

    /// Creates an app from a preset name, falling back to `normal`.
    pub fn from_preset(name: &str) -> Self {
        match ScenarioConfig::from_preset(name) {
            Ok(scenario) => Self::new(scenario, name),
            Err(_) => Self::new(ScenarioConfig::normal(), "normal"),
        }
    }

    fn start(&mut self) {
        self.engine.initialize();
        self.collect_notifications();
    }

    /// Runs one engine cycle and records its report and notifications.
    pub fn tick(&mut self) {
        let Some(report) = self.engine.run_cycle() else {
            return;
        };
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(report);
        self.collect_notifications();
    }

    fn collect_notifications(&mut self) {
        for n in self.engine.drain_notifications() {
            if self.feed.len() >= MAX_FEED {
                self.feed.pop_back();
            }
            self.feed.push_front(n);
        }
    }

    /// Toggles pause/resume and surfaces the resulting notification.
    pub fn toggle_pause(&mut self) {
        self.engine.toggle_pause();
        self.collect_notifications();
    }

    pub fn is_paused(&self) -> bool {
        self.engine.state() == SimState::Paused
    }

    pub fn speed_up(&mut self) {
        let speed = self.engine.speed();
        self.engine.set_tick_rate((speed + 1).min(MAX_SPEED));
    }

    pub fn speed_down(&mut self) {
        let speed = self.engine.speed();
        self.engine.set_tick_rate(speed.saturating_sub(1).max(MIN_SPEED));
    }

    /// Current delay between ticks.
    pub fn tick_interval(&self) -> Duration {
        self.engine.tick_interval()
    }

    /// Switches to a different preset, resetting all simulation state.
    ///
    /// Unknown names are ignored.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        self.reset(scenario);
        self.preset_name = name.to_string();
    }

    /// Restarts the current scenario from the beginning.
    pub fn restart(&mut self) {
        self.reset(self.scenario.clone());
    }

    fn reset(&mut self, scenario: ScenarioConfig) {
        self.engine = Engine::new(scenario.clone());
        self.scenario = scenario;
        self.history.clear();
        self.feed.clear();
        self.start();
    }

    /// `true` once the game is over.
    pub fn is_finished(&self) -> bool {
        self.engine.is_game_over()
    }

    /// Returns the most recent tick report, if any.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.history.back()
    }
}
