//! The progression facade: the single surface external callers use.
//!
//! Composes the roster, ledger, adventure machine, and clock behind one
//! object, and tracks which persisted fields each mutation touched so the
//! session layer can write the changed subset to the remote store. The
//! facade itself performs no I/O and owns no timers.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::account::AccountState;
use crate::adventure::{
    self, AdventureError, AdventureStatus, CompletedAdventure,
};
use crate::catalog::{Catalog, CatalogError};
use crate::clock::{self, Clock, SystemClock};
use crate::persist::{AccountDocument, ChangeSet, Field, FieldSet};
use crate::roster::{ResolvedTask, RosterError};
use crate::task::{Task, TaskError, TaskId};

/// Any error the facade surface can return.
#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Adventure(#[from] AdventureError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// One user's progression session.
#[derive(Debug, Clone)]
pub struct Progression<C: Clock = SystemClock> {
    state: AccountState,
    catalog: Catalog,
    clock: C,
    dirty: FieldSet,
}

impl<C: Clock> Progression<C> {
    /// Start a session for a brand-new account. Every field is marked
    /// dirty so the first flush seeds the remote document.
    #[must_use]
    pub fn fresh(catalog: Catalog, clock: C) -> Self {
        Self {
            state: AccountState::fresh(),
            catalog,
            clock,
            dirty: FieldSet::all(),
        }
    }

    /// Resume a session from rehydrated account state.
    #[must_use]
    pub fn from_state(state: AccountState, catalog: Catalog, clock: C) -> Self {
        Self {
            state,
            catalog,
            clock,
            dirty: FieldSet::new(),
        }
    }

    /// Create a task with an explicit expiration instant.
    ///
    /// # Errors
    ///
    /// Returns the factory's [`TaskError`] kinds unchanged.
    pub fn add_task(
        &mut self,
        name: &str,
        details: &str,
        points: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<TaskId, ProgressionError> {
        let task = Task::new(name, details, points, expires_at, self.clock.now())?;
        Ok(self.insert_task(task))
    }

    /// Create a task expiring a number of hours from now.
    ///
    /// # Errors
    ///
    /// Returns the factory's [`TaskError`] kinds unchanged.
    pub fn add_task_with_duration(
        &mut self,
        name: &str,
        details: &str,
        points: i64,
        hours: f64,
    ) -> Result<TaskId, ProgressionError> {
        let task = Task::with_duration(name, details, points, hours, self.clock.now())?;
        Ok(self.insert_task(task))
    }

    /// Mint a task from a named catalog preset.
    ///
    /// # Errors
    ///
    /// `DefinitionNotFound` when the preset is unknown; otherwise the
    /// factory's validation errors.
    pub fn add_preset_task(&mut self, preset_name: &str) -> Result<TaskId, ProgressionError> {
        let preset = self.catalog.preset(preset_name)?;
        let task = Task::from_preset(preset, self.clock.now())?;
        Ok(self.insert_task(task))
    }

    /// Remove a task, crediting its reward iff the caller marks it
    /// completed. The caller decides the flag by checking the deadline at
    /// action time; [`Progression::task_is_expired`] reads the same clock
    /// this facade uses.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id is not in the roster.
    pub fn resolve_task(
        &mut self,
        id: TaskId,
        completed: bool,
    ) -> Result<ResolvedTask, ProgressionError> {
        let resolved = self.state.tasks.resolve(id, completed, &mut self.state.ledger)?;
        self.dirty.mark(Field::TaskList);
        if completed {
            self.dirty.mark(Field::InspirationPoints);
            self.dirty.mark(Field::TasksCompleted);
        }
        Ok(resolved)
    }

    /// Whether the task's deadline has passed on this facade's clock.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id is not in the roster.
    pub fn task_is_expired(&self, id: TaskId) -> Result<bool, ProgressionError> {
        let task = self.state.tasks.get(id).ok_or(RosterError::NotFound(id))?;
        Ok(task.is_expired(self.clock.now()))
    }

    /// Start an adventure in the named dungeon, debiting its cost.
    ///
    /// # Errors
    ///
    /// `DefinitionNotFound` for an unknown dungeon, `AlreadyActive` when a
    /// run exists, `NotEnoughInspiration` when the cost exceeds the
    /// balance.
    pub fn begin_adventure(&mut self, dungeon_name: &str) -> Result<(), ProgressionError> {
        let dungeon = self.catalog.dungeon(dungeon_name)?;
        adventure::begin_adventure(&mut self.state, dungeon, self.clock.now())?;
        self.dirty.extend([
            Field::InspirationPoints,
            Field::ActiveDungeonName,
            Field::DungeonEndTime,
        ]);
        Ok(())
    }

    /// Confirm a resolvable adventure, applying its rewards.
    ///
    /// # Errors
    ///
    /// `NotResolvableYet` when no run exists or its timer has not elapsed.
    pub fn complete_adventure(&mut self) -> Result<CompletedAdventure, ProgressionError> {
        let done = adventure::complete_adventure(&mut self.state, self.clock.now())?;
        self.dirty.extend([
            Field::Capacity,
            Field::ActiveDungeonName,
            Field::DungeonEndTime,
            Field::DungeonsCompleted,
        ]);
        Ok(done)
    }

    #[must_use]
    pub fn balance(&self) -> i64 {
        self.state.ledger.balance()
    }

    #[must_use]
    pub fn capacity(&self) -> i64 {
        self.state.ledger.capacity()
    }

    /// Active tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.state.tasks.iter()
    }

    #[must_use]
    pub fn adventure_status(&self) -> AdventureStatus {
        adventure::adventure_status(&self.state, self.clock.now())
    }

    /// Countdown label for the active adventure, or `None` when idle.
    /// Formatting follows the shared countdown rules (largest units,
    /// pluralized, elapsed message once the timer is within the grace).
    #[must_use]
    pub fn adventure_countdown(&self, template: &str, elapsed_message: &str) -> Option<String> {
        let run = self.state.adventure.as_ref()?;
        Some(clock::countdown_label(
            self.clock.now(),
            run.ends_at,
            template,
            elapsed_message,
        ))
    }

    /// Countdown label for one task.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id is not in the roster.
    pub fn task_countdown(
        &self,
        id: TaskId,
        template: &str,
        elapsed_message: &str,
    ) -> Result<String, ProgressionError> {
        let task = self.state.tasks.get(id).ok_or(RosterError::NotFound(id))?;
        Ok(clock::countdown_label(
            self.clock.now(),
            task.expires_at(),
            template,
            elapsed_message,
        ))
    }

    /// Whether any mutation since the last drain touched persisted fields.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Hand back the changed fields rendered to document values, clearing
    /// the dirty set. The session layer forwards the result to the store.
    pub fn drain_changes(&mut self) -> ChangeSet {
        let changes = ChangeSet::render(&self.dirty, &self.state);
        self.dirty.clear();
        changes
    }

    /// Snapshot the full document, e.g. for seeding a brand-new record.
    #[must_use]
    pub fn document(&self) -> AccountDocument {
        AccountDocument::from_state(&self.state)
    }

    #[must_use]
    pub const fn state(&self) -> &AccountState {
        &self.state
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Consume the session, returning the aggregate.
    #[must_use]
    pub fn into_state(self) -> AccountState {
        self.state
    }

    fn insert_task(&mut self, task: Task) -> TaskId {
        let id = self.state.tasks.add(task);
        self.dirty.mark(Field::TaskList);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    const CATALOG_JSON: &str = r#"{
        "dungeons": [{
            "id": 1, "name": "Dark Cave", "cost": 15, "durationHours": 1.0,
            "rewards": [{"item": "ipMaxIncrease", "value": "10"}]
        }],
        "presets": [
            {"name": "Morning run", "details": "5k", "rewardPoints": 15, "durationHours": 12.0}
        ]
    }"#;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn session() -> (Progression<ManualClock>, ManualClock) {
        let clock = ManualClock::starting_at(start());
        let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
        let mut progression = Progression::fresh(catalog, clock.clone());
        progression.drain_changes();
        (progression, clock)
    }

    #[test]
    fn fresh_session_marks_every_field() {
        let clock = ManualClock::starting_at(start());
        let mut progression = Progression::fresh(Catalog::empty(), clock);
        assert!(progression.has_changes());
        assert_eq!(progression.drain_changes().len(), Field::ALL.len());
        assert!(!progression.has_changes());
    }

    #[test]
    fn add_task_dirties_only_the_task_list() {
        let (mut progression, _clock) = session();
        progression
            .add_task_with_duration("Laundry", "", 10, 2.0)
            .unwrap();

        let changes = progression.drain_changes();
        assert_eq!(changes.len(), 1);
        let list = changes.get("taskList").unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[test]
    fn completing_a_task_credits_and_dirties_ledger_fields() {
        let (mut progression, _clock) = session();
        let id = progression
            .add_task_with_duration("Laundry", "", 10, 2.0)
            .unwrap();
        progression.drain_changes();

        let resolved = progression.resolve_task(id, true).unwrap();
        assert_eq!(resolved.credited, 10);
        assert_eq!(progression.balance(), 10);

        let changes = progression.drain_changes();
        assert_eq!(changes.get("inspirationPoints"), Some(&json!(10)));
        assert_eq!(changes.get("tasksCompleted"), Some(&json!(1)));
        assert_eq!(changes.get("taskList"), Some(&json!([])));
    }

    #[test]
    fn abandoning_a_task_dirties_only_the_task_list() {
        let (mut progression, _clock) = session();
        let id = progression
            .add_task_with_duration("Laundry", "", 10, 2.0)
            .unwrap();
        progression.drain_changes();

        progression.resolve_task(id, false).unwrap();
        let changes = progression.drain_changes();
        assert_eq!(changes.len(), 1);
        assert!(changes.get("taskList").is_some());
    }

    #[test]
    fn preset_tasks_come_from_the_catalog() {
        let (mut progression, _clock) = session();
        let id = progression.add_preset_task("Morning run").unwrap();
        let task = progression.tasks().find(|t| t.id() == id).unwrap();
        assert_eq!(task.points(), 15);

        assert!(matches!(
            progression.add_preset_task("Evening swim"),
            Err(ProgressionError::Catalog(CatalogError::DefinitionNotFound { .. }))
        ));
    }

    #[test]
    fn task_expiry_follows_the_facade_clock() {
        let (mut progression, clock) = session();
        let id = progression
            .add_task_with_duration("Stretch", "", 10, 0.01)
            .unwrap();
        assert!(!progression.task_is_expired(id).unwrap());

        clock.advance(Duration::seconds(37));
        assert!(progression.task_is_expired(id).unwrap());

        // Preserved contract: the caller's flag wins even after expiry.
        let resolved = progression.resolve_task(id, true).unwrap();
        assert_eq!(resolved.credited, 10);
        assert_eq!(progression.balance(), 10);
    }

    #[test]
    fn adventure_lifecycle_dirties_the_right_fields() {
        let (mut progression, clock) = session();
        let id = progression
            .add_task_with_duration("Laundry", "", 20, 2.0)
            .unwrap();
        progression.resolve_task(id, true).unwrap();
        progression.drain_changes();

        progression.begin_adventure("Dark Cave").unwrap();
        assert_eq!(progression.balance(), 5);
        let changes = progression.drain_changes();
        assert_eq!(changes.get("activeDungeonName"), Some(&json!("Dark Cave")));
        assert_eq!(changes.get("inspirationPoints"), Some(&json!(5)));
        assert!(changes.get("dungeonEndTime").is_some());

        clock.advance(Duration::hours(1));
        let done = progression.complete_adventure().unwrap();
        assert_eq!(done.capacity_gained, 10);
        let changes = progression.drain_changes();
        assert_eq!(changes.get("capacity"), Some(&json!(110)));
        assert_eq!(changes.get("activeDungeonName"), Some(&json!(null)));
        assert_eq!(changes.get("dungeonsCompleted"), Some(&json!(1)));
    }

    #[test]
    fn failed_operations_leave_no_dirty_fields() {
        let (mut progression, _clock) = session();
        assert!(progression.begin_adventure("Dark Cave").is_err());
        assert!(progression.complete_adventure().is_err());
        assert!(progression.add_task_with_duration("", "", 10, 1.0).is_err());
        assert!(!progression.has_changes());
    }

    #[test]
    fn adventure_countdown_labels() {
        let (mut progression, clock) = session();
        assert_eq!(progression.adventure_countdown("T-", "Done"), None);

        let id = progression
            .add_task_with_duration("Laundry", "", 20, 2.0)
            .unwrap();
        progression.resolve_task(id, true).unwrap();
        progression.begin_adventure("Dark Cave").unwrap();
        assert_eq!(
            progression.adventure_countdown("T-", "Done"),
            Some("T-1 hour".to_string())
        );

        clock.advance(Duration::hours(1));
        assert_eq!(
            progression.adventure_countdown("T-", "Done"),
            Some("Done".to_string())
        );
    }
}
