//! Energy price index and the transaction ledger.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Reference price per energy unit.
pub const DEFAULT_BASE_PRICE: f64 = 0.15;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    /// Non-negative amount; the sign comes from `kind`.
    pub amount: i64,
    pub description: String,
    /// In-game day the entry was recorded on.
    pub day: u32,
}

impl Transaction {
    /// Amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[day {:>4}] {:+8} {}", self.day, self.signed_amount(), self.description)
    }
}

/// Energy market: a supply/demand driven price plus an append-only ledger.
#[derive(Debug, Clone)]
pub struct Market {
    base_price: f64,
    current_price: f64,
    total_energy_sold: u64,
    total_revenue: i64,
    ledger: Vec<Transaction>,
    rng: StdRng,
}

impl Market {
    /// Creates a market at `base_price`.
    ///
    /// # Arguments
    ///
    /// * `base_price` - Reference price per unit (must be > 0)
    /// * `seed` - Seed for the price fluctuation stream
    ///
    /// # Panics
    ///
    /// Panics if `base_price` is not positive.
    pub fn new(base_price: f64, seed: u64) -> Self {
        assert!(base_price > 0.0, "base_price must be > 0");
        Self {
            base_price,
            current_price: base_price,
            total_energy_sold: 0,
            total_revenue: 0,
            ledger: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn total_energy_sold(&self) -> u64 {
        self.total_energy_sold
    }

    pub fn total_revenue(&self) -> i64 {
        self.total_revenue
    }

    /// Reprices energy from the supply/demand ratio.
    ///
    /// | ratio          | price              |
    /// |----------------|--------------------|
    /// | < 0.5          | 1.5 × base         |
    /// | [0.5, 0.8)     | 1.2 × base         |
    /// | (1.2, 1.5]     | 0.9 × base         |
    /// | > 1.5          | 0.8 × base         |
    /// | otherwise      | base ± up to 5 %   |
    ///
    /// A zero demand counts as a balanced ratio of 1.0.
    ///
    /// # Returns
    ///
    /// The new price.
    pub fn update_price(&mut self, supply: u32, demand: u32) -> f64 {
        let ratio = if demand == 0 {
            1.0
        } else {
            f64::from(supply) / f64::from(demand)
        };
        self.current_price = if ratio < 0.5 {
            self.base_price * 1.5
        } else if ratio < 0.8 {
            self.base_price * 1.2
        } else if ratio > 1.5 {
            self.base_price * 0.8
        } else if ratio > 1.2 {
            self.base_price * 0.9
        } else {
            let fluctuation = f64::from(self.rng.random_range(-5..=5_i32)) / 100.0;
            self.base_price * (1.0 + fluctuation)
        };
        self.current_price
    }

    /// Records a sale of `units` for `revenue` as income.
    ///
    /// # Returns
    ///
    /// The revenue recorded.
    pub fn sell_energy(&mut self, units: u32, revenue: i64, day: u32) -> i64 {
        self.total_energy_sold += u64::from(units);
        self.total_revenue += revenue;
        self.push(TransactionKind::Income, revenue, format!("Energy sales ({units} units)"), day);
        revenue
    }

    pub fn record_income(&mut self, amount: i64, description: impl Into<String>, day: u32) {
        self.push(TransactionKind::Income, amount, description.into(), day);
    }

    pub fn record_expense(&mut self, amount: i64, description: impl Into<String>, day: u32) {
        self.push(TransactionKind::Expense, amount, description.into(), day);
    }

    fn push(&mut self, kind: TransactionKind, amount: i64, description: String, day: u32) {
        self.ledger.push(Transaction {
            kind,
            amount,
            description,
            day,
        });
    }

    /// Full ledger in chronological order.
    pub fn history(&self) -> &[Transaction] {
        &self.ledger
    }

    /// The last `n` entries in chronological order.
    pub fn recent(&self, n: usize) -> &[Transaction] {
        let start = self.ledger.len().saturating_sub(n);
        &self.ledger[start..]
    }

    /// Sum of all income entries.
    pub fn total_income(&self) -> i64 {
        self.sum_of(TransactionKind::Income)
    }

    /// Sum of all expense entries.
    pub fn total_expenses(&self) -> i64 {
        self.sum_of(TransactionKind::Expense)
    }

    fn sum_of(&self, kind: TransactionKind) -> i64 {
        self.ledger
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.amount)
            .sum()
    }
}
