//! The dungeon-run state machine.
//!
//! An account has at most one run at a time. A run is `Active` until its
//! timer elapses, `Resolvable` until the user confirms completion, and
//! gone afterwards. Starting debits the ledger up front; completing
//! applies the rewards copied from the dungeon definition at start time.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::AccountState;
use crate::catalog::{DungeonDef, Reward};
use crate::clock::hours_duration;
use crate::ledger::LedgerError;

/// Errors raised by the adventure lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdventureError {
    #[error("an adventure in {0:?} is already underway")]
    AlreadyActive(String),
    #[error("not enough inspiration points: have {have}, need {need}")]
    NotEnoughInspiration { have: i64, need: i64 },
    #[error("the adventure timer has not elapsed yet")]
    NotResolvableYet,
}

/// Where the account stands in the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdventureStatus {
    /// No run underway.
    Idle,
    /// A run is underway and its timer is still counting down.
    Active,
    /// The timer elapsed; completion awaits user confirmation.
    Resolvable,
}

/// One in-progress (or resolvable) run of a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adventure {
    pub dungeon_name: String,
    pub cost: i64,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub rewards: Vec<Reward>,
}

impl Adventure {
    /// Rebuild a run from persisted fields. The store keeps only the
    /// dungeon name and end time; the start instant is re-derived from
    /// the definition's duration.
    #[must_use]
    pub fn rehydrated(dungeon: &DungeonDef, ends_at: DateTime<Utc>) -> Self {
        Self {
            dungeon_name: dungeon.name.clone(),
            cost: dungeon.cost,
            started_at: ends_at - hours_duration(dungeon.hours),
            ends_at,
            rewards: dungeon.rewards.clone(),
        }
    }
}

/// What a completed run granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAdventure {
    pub dungeon_name: String,
    /// Total ledger-ceiling increase applied.
    pub capacity_gained: i64,
}

/// Start a run of `dungeon`, debiting its cost.
///
/// # Errors
///
/// Returns `AlreadyActive` when a run exists (no queueing) and
/// `NotEnoughInspiration` when the cost exceeds the balance; the ledger
/// is untouched in both cases.
pub fn begin_adventure(
    state: &mut AccountState,
    dungeon: &DungeonDef,
    now: DateTime<Utc>,
) -> Result<(), AdventureError> {
    if let Some(run) = &state.adventure {
        return Err(AdventureError::AlreadyActive(run.dungeon_name.clone()));
    }
    state
        .ledger
        .spend(dungeon.cost)
        .map_err(|LedgerError::InsufficientFunds { have, need }| {
            AdventureError::NotEnoughInspiration { have, need }
        })?;
    state.adventure = Some(Adventure {
        dungeon_name: dungeon.name.clone(),
        cost: dungeon.cost,
        started_at: now,
        ends_at: now + hours_duration(dungeon.hours),
        rewards: dungeon.rewards.clone(),
    });
    Ok(())
}

/// Derive the run status from the aggregate and the current instant.
#[must_use]
pub fn adventure_status(state: &AccountState, now: DateTime<Utc>) -> AdventureStatus {
    match &state.adventure {
        None => AdventureStatus::Idle,
        Some(run) if now >= run.ends_at => AdventureStatus::Resolvable,
        Some(_) => AdventureStatus::Active,
    }
}

/// Confirm a resolvable run: apply its rewards, bump the lifetime
/// counter, and clear the active-run slot.
///
/// # Errors
///
/// Returns `NotResolvableYet` when no run exists or its timer has not
/// elapsed; nothing is mutated in that case.
pub fn complete_adventure(
    state: &mut AccountState,
    now: DateTime<Utc>,
) -> Result<CompletedAdventure, AdventureError> {
    if adventure_status(state, now) != AdventureStatus::Resolvable {
        return Err(AdventureError::NotResolvableYet);
    }
    // Status check above guarantees a run is present.
    let Some(run) = state.adventure.take() else {
        return Err(AdventureError::NotResolvableYet);
    };

    let mut capacity_gained = 0;
    for reward in &run.rewards {
        match reward {
            Reward::CapacityIncrease(amount) => {
                state.ledger.raise_capacity(*amount);
                capacity_gained += *amount;
            }
            Reward::Unrecognized { item, .. } => {
                warn!(
                    "skipping unrecognized reward {item:?} from dungeon {:?}",
                    run.dungeon_name
                );
            }
        }
    }
    state.ledger.record_adventure_completion();

    Ok(CompletedAdventure {
        dungeon_name: run.dungeon_name,
        capacity_gained,
    })
}
