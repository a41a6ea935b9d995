/// Calendar clock advanced in fixed increments.
pub mod clock;
pub mod engine;
/// Random, time-boxed city events.
pub mod event;
pub mod kpi;
pub mod types;
