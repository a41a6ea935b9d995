//! City energy-management simulation.
//!
//! A grid city of dwellings and power plants, an electrical network that
//! decides which cells are powered, a market that prices and settles
//! energy, and a tick-driven engine that ties them together.

/// Dwellings, plants, occupants and their identifiers.
pub mod buildings;
pub mod config;
/// Market pricing, the transaction ledger and the player's purse.
pub mod economy;
pub mod error;
pub mod io;
/// Grid, terrain, power lines and network recomputation.
pub mod map;
/// Clock, events, the engine and run reporting.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;
