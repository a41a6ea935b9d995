//! Error types for grid placement and player commands.
//!
//! Every `Err` returned by a mutating call guarantees that no state changed.

use thiserror::Error;

use crate::buildings::{DwellingId, LineId, PlantId};
use crate::map::Position;

/// Why a structure could not be placed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),
    #[error("cell {0} is already occupied")]
    Occupied(Position),
    #[error("terrain at {0} does not allow this structure")]
    TerrainMismatch(Position),
}

/// Why a player command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("the game is over")]
    GameOver,
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("hydro plant at {0} needs an adjacent water cell")]
    NotAdjacentToWater(Position),
    #[error("no such plant: {0}")]
    UnknownPlant(PlantId),
    #[error("no such dwelling: {0}")]
    UnknownDwelling(DwellingId),
    #[error("no such power line: {0}")]
    UnknownLine(LineId),
    #[error("already at the highest level")]
    MaxLevel,
    #[error("no plant at {0}")]
    NoPlantAt(Position),
    #[error("no dwelling at {0}")]
    NoDwellingAt(Position),
    #[error("plant at {0} is not operational")]
    PlantNotOperational(Position),
    #[error("dwelling at {0} is already powered")]
    AlreadyPowered(Position),
    #[error("no unobstructed route from {from} to {to}")]
    NoRoute { from: Position, to: Position },
    #[error("nothing to demolish at {0}")]
    EmptyCell(Position),
}

/// Shorthand for command results.
pub type CommandResult<T> = std::result::Result<T, CommandError>;
