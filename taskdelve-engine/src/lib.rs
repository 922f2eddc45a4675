//! Taskdelve Progression Engine
//!
//! Platform-agnostic core for the Taskdelve habit game: users complete
//! time-bound tasks to earn inspiration points and spend them on
//! dungeon adventures. This crate owns the progression rules — task
//! lifecycle, the adventure state machine, the points ledger, and the
//! shared countdown clock — without UI, network, or platform
//! dependencies.
//!
//! The core is single-threaded and synchronous: every operation runs to
//! completion, and callers sharing a [`Progression`] across threads wrap
//! it in one mutex per account. Persistence is a trait seam
//! ([`AccountStore`]): after each mutation the facade reports the changed
//! document fields, and the session layer forwards them to the store
//! best-effort — the engine never blocks on, or rolls back for, a remote
//! write.

pub mod account;
pub mod adventure;
pub mod catalog;
pub mod clock;
pub mod constants;
pub mod ledger;
pub mod persist;
pub mod progression;
pub mod roster;
pub mod task;

// Re-export commonly used types
pub use account::AccountState;
pub use adventure::{
    Adventure, AdventureError, AdventureStatus, CompletedAdventure, adventure_status,
    begin_adventure, complete_adventure,
};
pub use catalog::{Catalog, CatalogError, DungeonDef, PresetDef, Reward, RewardDef};
pub use clock::{
    Clock, ManualClock, RemainingParts, SystemClock, countdown_label, format_remaining,
    hours_duration, is_elapsed, remaining_parts,
};
pub use ledger::{Ledger, LedgerError};
pub use persist::{AccountDocument, ChangeSet, Field, FieldSet};
pub use progression::{Progression, ProgressionError};
pub use roster::{ResolvedTask, RosterError, TaskRoster};
pub use task::{Task, TaskError, TaskId, TaskRecord};

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this.
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the dungeon/preset catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or decoded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Trait for abstracting the remote account document store.
/// Platform-specific implementations should provide this.
pub trait AccountStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the full account document, or `None` for a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or decoded.
    fn load_account(&self, account_id: &str) -> Result<Option<AccountDocument>, Self::Error>;

    /// Write a subset of document fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be performed.
    fn write_fields(&self, account_id: &str, changes: &ChangeSet) -> Result<(), Self::Error>;
}

/// Binds a catalog source and an account store into session management.
pub struct Engine<L, S>
where
    L: CatalogSource,
    S: AccountStore,
{
    catalog_source: L,
    store: S,
}

impl<L, S> Engine<L, S>
where
    L: CatalogSource,
    S: AccountStore,
{
    /// Create an engine with the provided catalog source and store.
    pub const fn new(catalog_source: L, store: S) -> Self {
        Self {
            catalog_source,
            store,
        }
    }

    /// Start a progression session for `account_id`: load the catalog,
    /// read the account document, and rehydrate the in-memory state. A
    /// missing document yields a fresh account with every field marked
    /// for the first flush.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or document cannot be loaded,
    /// or when the document names a dungeon the catalog does not know.
    pub fn open_session<C: Clock>(
        &self,
        account_id: &str,
        clock: C,
    ) -> Result<Progression<C>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let catalog = self.catalog_source.load_catalog().map_err(Into::into)?;
        match self.store.load_account(account_id).map_err(Into::into)? {
            Some(document) => {
                let state = document.into_state(&catalog)?;
                Ok(Progression::from_state(state, catalog, clock))
            }
            None => Ok(Progression::fresh(catalog, clock)),
        }
    }

    /// Drain the session's dirty fields and write them to the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error on a failed write. The local state is
    /// already mutated and is not rolled back.
    pub fn flush<C: Clock>(
        &self,
        account_id: &str,
        session: &mut Progression<C>,
    ) -> Result<(), S::Error> {
        if !session.has_changes() {
            return Ok(());
        }
        let changes = session.drain_changes();
        self.store.write_fields(account_id, &changes)
    }

    /// Fire-and-forget variant of [`Engine::flush`]: a failed write is
    /// logged at `warn` and otherwise ignored, accepting eventual
    /// consistency between local and remote state.
    pub fn flush_best_effort<C: Clock>(&self, account_id: &str, session: &mut Progression<C>) {
        if let Err(err) = self.flush(account_id, session) {
            log::warn!("account {account_id}: dropping failed store write: {err}");
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}
