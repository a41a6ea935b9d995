use serde::Serialize;

/// The player's purse and lifetime totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    money: i64,
    total_earnings: i64,
    total_spending: i64,
    days_survived: u32,
}

impl Player {
    pub fn new(initial_money: i64) -> Self {
        Self {
            money: initial_money,
            total_earnings: 0,
            total_spending: 0,
            days_survived: 0,
        }
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn total_earnings(&self) -> i64 {
        self.total_earnings
    }

    pub fn total_spending(&self) -> i64 {
        self.total_spending
    }

    pub fn days_survived(&self) -> u32 {
        self.days_survived
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        self.money >= amount
    }

    /// Deducts `amount` if affordable.
    ///
    /// # Returns
    ///
    /// `false`, leaving the purse untouched, when funds are insufficient.
    pub fn spend(&mut self, amount: i64) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.money -= amount;
        self.total_spending += amount;
        true
    }

    pub fn earn(&mut self, amount: i64) {
        self.money += amount;
        self.total_earnings += amount;
    }

    pub fn increment_days(&mut self) {
        self.days_survived += 1;
    }
}
