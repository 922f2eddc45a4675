//! The remote account document and the change-sets written back to it.
//!
//! The store is an opaque key/value document per account. The engine's
//! whole contract with it: read the document once at session start, and
//! after any mutation hand the external writer the changed subset of
//! fields. Field names here are the document's exact key names.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;

use crate::account::AccountState;
use crate::adventure::Adventure;
use crate::catalog::{Catalog, CatalogError};
use crate::ledger::Ledger;
use crate::roster::TaskRoster;
use crate::task::{Task, TaskRecord};

/// Persisted fields of the account document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    TaskList,
    InspirationPoints,
    Capacity,
    ActiveDungeonName,
    DungeonEndTime,
    TasksCompleted,
    DungeonsCompleted,
}

impl Field {
    pub const ALL: [Self; 7] = [
        Self::TaskList,
        Self::InspirationPoints,
        Self::Capacity,
        Self::ActiveDungeonName,
        Self::DungeonEndTime,
        Self::TasksCompleted,
        Self::DungeonsCompleted,
    ];

    /// The document key this field is stored under.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskList => "taskList",
            Self::InspirationPoints => "inspirationPoints",
            Self::Capacity => "capacity",
            Self::ActiveDungeonName => "activeDungeonName",
            Self::DungeonEndTime => "dungeonEndTime",
            Self::TasksCompleted => "tasksCompleted",
            Self::DungeonsCompleted => "dungeonsCompleted",
        }
    }
}

/// Set of fields touched since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<Field>);

impl FieldSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every persisted field, for first writes of a fresh account.
    #[must_use]
    pub fn all() -> Self {
        Self(Field::ALL.into_iter().collect())
    }

    pub fn mark(&mut self, field: Field) {
        self.0.insert(field);
    }

    pub fn extend(&mut self, fields: impl IntoIterator<Item = Field>) {
        self.0.extend(fields);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }
}

/// Field-name → new-value mapping handed to the external store writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(std::collections::BTreeMap<&'static str, Value>);

impl ChangeSet {
    /// Render the current value of each dirty field from the aggregate.
    #[must_use]
    pub fn render(fields: &FieldSet, state: &AccountState) -> Self {
        let mut out = std::collections::BTreeMap::new();
        for field in fields.iter() {
            out.insert(field.as_str(), field_value(field, state));
        }
        Self(out)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

fn field_value(field: Field, state: &AccountState) -> Value {
    match field {
        Field::TaskList => {
            let records: Vec<TaskRecord> = state.tasks.iter().map(Task::record).collect();
            json!(records)
        }
        Field::InspirationPoints => json!(state.ledger.balance()),
        Field::Capacity => json!(state.ledger.capacity()),
        Field::ActiveDungeonName => {
            json!(state.adventure.as_ref().map(|run| run.dungeon_name.clone()))
        }
        Field::DungeonEndTime => json!(state.adventure.as_ref().map(|run| run.ends_at)),
        Field::TasksCompleted => json!(state.ledger.tasks_completed()),
        Field::DungeonsCompleted => json!(state.ledger.adventures_completed()),
    }
}

/// Full account document as the remote store holds it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountDocument {
    pub task_list: Vec<TaskRecord>,
    pub inspiration_points: i64,
    pub capacity: i64,
    pub active_dungeon_name: Option<String>,
    pub dungeon_end_time: Option<DateTime<Utc>>,
    pub tasks_completed: u32,
    pub dungeons_completed: u32,
}

impl AccountDocument {
    /// Snapshot the aggregate into its persisted form.
    #[must_use]
    pub fn from_state(state: &AccountState) -> Self {
        Self {
            task_list: state.tasks.iter().map(Task::record).collect(),
            inspiration_points: state.ledger.balance(),
            capacity: state.ledger.capacity(),
            active_dungeon_name: state
                .adventure
                .as_ref()
                .map(|run| run.dungeon_name.clone()),
            dungeon_end_time: state.adventure.as_ref().map(|run| run.ends_at),
            tasks_completed: state.ledger.tasks_completed(),
            dungeons_completed: state.ledger.adventures_completed(),
        }
    }

    /// Rehydrate the in-memory aggregate at session start.
    ///
    /// An active adventure is rebuilt from its catalog definition; a
    /// document naming a dungeon the catalog no longer knows is a lookup
    /// error, not a silent drop.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DefinitionNotFound`] when
    /// `activeDungeonName` has no catalog entry.
    pub fn into_state(self, catalog: &Catalog) -> Result<AccountState, CatalogError> {
        let mut tasks = TaskRoster::new();
        for record in self.task_list {
            tasks.add(Task::from_record(record));
        }

        let adventure = match (self.active_dungeon_name, self.dungeon_end_time) {
            (Some(name), Some(ends_at)) => {
                let dungeon = catalog.dungeon(&name)?;
                Some(Adventure::rehydrated(dungeon, ends_at))
            }
            (Some(name), None) => {
                warn!("document names active dungeon {name:?} without an end time; dropping it");
                None
            }
            _ => None,
        };

        Ok(AccountState {
            ledger: Ledger::from_parts(
                self.inspiration_points,
                self.capacity,
                self.tasks_completed,
                self.dungeons_completed,
            ),
            tasks,
            adventure,
        })
    }
}
