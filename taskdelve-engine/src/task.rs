//! Time-bound objectives and their validating factory.
//!
//! A [`Task`] is immutable after construction; the factory paths are the
//! only gate for the name/points/expiration invariants, so nothing else in
//! the engine re-validates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::PresetDef;
use crate::clock::hours_duration;
use crate::constants::TASK_NAME_MAX_LEN;

/// Stable identity of a task for its whole lifetime.
pub type TaskId = Uuid;

/// Errors raised while constructing a task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("cannot reward zero inspiration points")]
    ZeroPoints,
    #[error("cannot reward negative inspiration points (got {0})")]
    NegativePoints(i64),
    #[error("the expiration time must be beyond the present")]
    InvalidExpiration,
    #[error("task name cannot be empty")]
    EmptyName,
    #[error("task name is too long ({0} characters)")]
    NameTooLong(usize),
}

/// An objective the user can complete before a deadline to earn
/// inspiration points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    details: String,
    points: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Task {
    /// Build a task with the expiration instant supplied directly.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] when the name is empty or over-long, the
    /// reward is zero or negative, or `expires_at` is not in the future.
    pub fn new(
        name: impl Into<String>,
        details: impl Into<String>,
        points: i64,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        validate(&name, points)?;
        if expires_at <= now {
            return Err(TaskError::InvalidExpiration);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            details: details.into(),
            points,
            created_at: now,
            expires_at,
        })
    }

    /// Build a task that expires `hours` from now. Fractional hours are
    /// supported down to millisecond resolution.
    ///
    /// # Errors
    ///
    /// Same validation as [`Task::new`]; `InvalidExpiration` when `hours`
    /// is zero or negative.
    pub fn with_duration(
        name: impl Into<String>,
        details: impl Into<String>,
        points: i64,
        hours: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, TaskError> {
        let name = name.into();
        validate(&name, points)?;
        if hours <= 0.0 {
            return Err(TaskError::InvalidExpiration);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            details: details.into(),
            points,
            created_at: now,
            expires_at: now + hours_duration(hours),
        })
    }

    /// Mint a fresh task from a catalog preset, applying the same
    /// validation as the explicit paths.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] when the preset carries invalid data.
    pub fn from_preset(preset: &PresetDef, now: DateTime<Utc>) -> Result<Self, TaskError> {
        Self::with_duration(
            preset.name.clone(),
            preset.details.clone(),
            preset.points,
            preset.hours,
            now,
        )
    }

    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    #[must_use]
    pub const fn points(&self) -> i64 {
        self.points
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the deadline has passed. This is the lifecycle check, not
    /// the display grace used by the countdown label.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Flatten into the record shape the remote store persists.
    #[must_use]
    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            name: self.name.clone(),
            details: self.details.clone(),
            points: self.points,
            creation_time: self.created_at,
            expiration_time: self.expires_at,
        }
    }

    /// Rebuild a task from a persisted record. Store data is trusted;
    /// the factory invariants were enforced when the task was minted.
    #[must_use]
    pub fn from_record(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            details: record.details,
            points: record.points,
            created_at: record.creation_time,
            expires_at: record.expiration_time,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task: {}. Expires at {}", self.name, self.expires_at)
    }
}

fn validate(name: &str, points: i64) -> Result<(), TaskError> {
    if name.is_empty() {
        return Err(TaskError::EmptyName);
    }
    if name.chars().count() > TASK_NAME_MAX_LEN {
        return Err(TaskError::NameTooLong(name.chars().count()));
    }
    if points == 0 {
        return Err(TaskError::ZeroPoints);
    }
    if points < 0 {
        return Err(TaskError::NegativePoints(points));
    }
    Ok(())
}

/// Flat key/value form of a task as stored in the remote account
/// document's `taskList` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub details: String,
    pub points: i64,
    pub creation_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
}
