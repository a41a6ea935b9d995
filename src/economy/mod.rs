//! Energy market, transaction ledger, and the player's purse.

pub mod market;
/// Player purse and lifetime totals.
pub mod player;

pub use market::{Market, Transaction, TransactionKind};
pub use player::Player;
