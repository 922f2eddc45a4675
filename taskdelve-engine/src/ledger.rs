//! Inspiration-point ledger: balance, ceiling, lifetime counters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_CAPACITY;

/// Errors raised by ledger mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient inspiration points: have {have}, need {need}")]
    InsufficientFunds { have: i64, need: i64 },
}

/// Owns the account's inspiration points. Every mutation goes through
/// [`Ledger::earn`] or [`Ledger::spend`], keeping `0 <= balance <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balance: i64,
    capacity: i64,
    tasks_completed: u32,
    adventures_completed: u32,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(0, DEFAULT_CAPACITY)
    }
}

impl Ledger {
    /// Build a ledger, clamping the starting balance into `[0, capacity]`.
    #[must_use]
    pub fn new(balance: i64, capacity: i64) -> Self {
        let capacity = capacity.max(0);
        Self {
            balance: balance.clamp(0, capacity),
            capacity,
            tasks_completed: 0,
            adventures_completed: 0,
        }
    }

    /// Rebuild a ledger from persisted fields, re-clamping so a stale or
    /// hand-edited document cannot violate the invariant.
    #[must_use]
    pub fn from_parts(
        balance: i64,
        capacity: i64,
        tasks_completed: u32,
        adventures_completed: u32,
    ) -> Self {
        let mut ledger = Self::new(balance, capacity);
        ledger.tasks_completed = tasks_completed;
        ledger.adventures_completed = adventures_completed;
        ledger
    }

    #[must_use]
    pub const fn balance(&self) -> i64 {
        self.balance
    }

    #[must_use]
    pub const fn capacity(&self) -> i64 {
        self.capacity
    }

    #[must_use]
    pub const fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    #[must_use]
    pub const fn adventures_completed(&self) -> u32 {
        self.adventures_completed
    }

    /// Whether `amount` can be spent right now.
    #[must_use]
    pub const fn can_afford(&self, amount: i64) -> bool {
        amount <= self.balance
    }

    /// Credit points, clamped to capacity. Returns the amount actually
    /// credited, which may be less than `amount` when the ceiling cuts in.
    pub fn earn(&mut self, amount: i64) -> i64 {
        let before = self.balance;
        self.balance = (self.balance + amount.max(0)).min(self.capacity);
        self.balance - before
    }

    /// Debit points.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] when `amount` exceeds the
    /// balance; the balance is left untouched.
    pub fn spend(&mut self, amount: i64) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                have: self.balance,
                need: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Raise the point ceiling. The balance is unaffected.
    pub fn raise_capacity(&mut self, delta: i64) {
        self.capacity += delta.max(0);
    }

    pub fn record_task_completion(&mut self) {
        self.tasks_completed += 1;
    }

    pub fn record_adventure_completion(&mut self) {
        self.adventures_completed += 1;
    }
}
