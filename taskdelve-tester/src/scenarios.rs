//! Scripted progression scenarios run against a hand-advanced clock.
//!
//! Each scenario drives the engine exactly the way the app would and
//! records pass/fail checks instead of panicking, so one broken rule
//! does not hide the rest of the report.

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use taskdelve_engine::{
    AccountDocument, AccountStore, AdventureStatus, Catalog, CatalogError, CatalogSource,
    ChangeSet, Engine, ManualClock, Progression,
};

/// Catalog used by every scenario; mirrors the shape of the bundled data.
pub const SCENARIO_CATALOG: &str = r#"{
    "dungeons": [
        {
            "id": 1,
            "name": "Dark Cave",
            "description": "A damp opening in the hillside.",
            "cost": 15,
            "durationHours": 1.0,
            "rewards": [{"item": "ipMaxIncrease", "value": "10"}]
        },
        {
            "id": 2,
            "name": "Sunken Crypt",
            "cost": 40,
            "durationHours": 8.0,
            "rewards": [{"item": "ipMaxIncrease", "value": "25"}]
        }
    ],
    "presets": [
        {"name": "Morning run", "details": "5k", "rewardPoints": 15, "durationHours": 12.0},
        {"name": "Read a chapter", "rewardPoints": 5, "durationHours": 24.0}
    ]
}"#;

/// One asserted fact inside a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub label: String,
    pub passed: bool,
}

/// Full record of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub checks: Vec<Check>,
}

impl ScenarioResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn check(&mut self, label: &str, passed: bool) {
        log::debug!("{}: {label} -> {passed}", self.name);
        self.checks.push(Check {
            label: label.to_string(),
            passed,
        });
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Names of all registered scenarios, in run order.
#[must_use]
pub fn list_scenarios() -> Vec<&'static str> {
    vec!["smoke", "expiry", "capacity", "exclusion", "persistence"]
}

/// Run one scenario by name.
///
/// # Errors
///
/// Fails for unknown names or when a scenario cannot even be set up.
pub fn run_scenario(name: &str) -> Result<ScenarioResult> {
    match name {
        "smoke" => smoke(),
        "expiry" => expiry(),
        "capacity" => capacity(),
        "exclusion" => exclusion(),
        "persistence" => persistence(),
        other => bail!("unknown scenario {other:?} (try --list-scenarios)"),
    }
}

fn scenario_start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn new_session() -> Result<(Progression<ManualClock>, ManualClock)> {
    let clock = ManualClock::starting_at(scenario_start());
    let catalog = Catalog::from_json(SCENARIO_CATALOG)?;
    Ok((Progression::fresh(catalog, clock.clone()), clock))
}

/// Happy path: earn points through tasks, run a dungeon, collect the
/// reward.
fn smoke() -> Result<ScenarioResult> {
    let mut result = ScenarioResult::new("smoke");
    let (mut session, clock) = new_session()?;

    let run = session.add_preset_task("Morning run")?;
    let laundry = session.add_task_with_duration("Laundry", "fold everything", 10, 2.0)?;
    result.check("two tasks active", session.tasks().count() == 2);

    session.resolve_task(run, true)?;
    session.resolve_task(laundry, true)?;
    result.check("task rewards credited", session.balance() == 25);
    result.check(
        "completions counted",
        session.state().ledger.tasks_completed() == 2,
    );

    session.begin_adventure("Dark Cave")?;
    result.check("cost debited", session.balance() == 10);
    result.check(
        "adventure active",
        session.adventure_status() == AdventureStatus::Active,
    );
    result.check(
        "premature completion refused",
        session.complete_adventure().is_err(),
    );

    clock.advance(Duration::hours(1));
    let done = session.complete_adventure()?;
    result.check("capacity reward applied", done.capacity_gained == 10);
    result.check("ceiling raised", session.capacity() == 110);
    result.check(
        "back to idle",
        session.adventure_status() == AdventureStatus::Idle,
    );
    Ok(result)
}

/// Expired tasks pay nothing when removed as failed, and the countdown
/// label flips to the elapsed message.
fn expiry() -> Result<ScenarioResult> {
    let mut result = ScenarioResult::new("expiry");
    let (mut session, clock) = new_session()?;

    let id = session.add_task_with_duration("Stretch", "", 10, 0.01)?;
    result.check("not expired at creation", !session.task_is_expired(id)?);

    clock.advance(Duration::seconds(37));
    result.check("expired after the window", session.task_is_expired(id)?);
    result.check(
        "label shows elapsed message",
        session.task_countdown(id, "", "Expired")? == "Expired",
    );

    let completed = !session.task_is_expired(id)?;
    let resolved = session.resolve_task(id, completed)?;
    result.check("no credit for expired removal", resolved.credited == 0);
    result.check("balance untouched", session.balance() == 0);
    result.check(
        "second removal reports missing",
        session.resolve_task(id, true).is_err(),
    );
    Ok(result)
}

/// The ledger ceiling clamps earnings until a dungeon reward raises it.
fn capacity() -> Result<ScenarioResult> {
    let mut result = ScenarioResult::new("capacity");
    let (mut session, clock) = new_session()?;

    for _ in 0..3 {
        let id = session.add_task_with_duration("Deep clean", "", 45, 1.0)?;
        session.resolve_task(id, true)?;
    }
    result.check("balance clamped to ceiling", session.balance() == 100);

    session.begin_adventure("Sunken Crypt")?;
    clock.advance(Duration::hours(8));
    session.complete_adventure()?;
    result.check("ceiling raised by reward", session.capacity() == 125);

    let id = session.add_task_with_duration("Deep clean", "", 45, 1.0)?;
    let resolved = session.resolve_task(id, true)?;
    result.check("new headroom is usable", resolved.credited == 45);
    result.check("balance inside new ceiling", session.balance() == 105);
    Ok(result)
}

/// Only one adventure at a time, and affordability is checked up front.
fn exclusion() -> Result<ScenarioResult> {
    let mut result = ScenarioResult::new("exclusion");
    let (mut session, _clock) = new_session()?;

    let id = session.add_task_with_duration("Seed points", "", 30, 1.0)?;
    session.resolve_task(id, true)?;

    result.check(
        "unaffordable run refused",
        session.begin_adventure("Sunken Crypt").is_err(),
    );
    result.check("refusal left balance", session.balance() == 30);

    session.begin_adventure("Dark Cave")?;
    result.check(
        "second run refused",
        session.begin_adventure("Dark Cave").is_err(),
    );
    result.check("debited exactly once", session.balance() == 15);

    result.check(
        "unknown dungeon reported",
        session.begin_adventure("Gilded Keep").is_err(),
    );
    Ok(result)
}

/// Mid-adventure state survives a flush/reload cycle through the store.
fn persistence() -> Result<ScenarioResult> {
    let mut result = ScenarioResult::new("persistence");
    let clock = ManualClock::starting_at(scenario_start());
    let engine = Engine::new(ScenarioCatalog, MemoryStore::default());

    let mut session = engine.open_session("qa-account", clock.clone())?;
    let id = session.add_task_with_duration("Seed points", "", 20, 1.0)?;
    session.resolve_task(id, true)?;
    session.begin_adventure("Dark Cave")?;
    session.add_task_with_duration("Laundry", "", 5, 4.0)?;
    engine.flush("qa-account", &mut session)?;

    let resumed = engine.open_session("qa-account", clock.clone())?;
    result.check("balance survives reload", resumed.balance() == 5);
    result.check("task list survives reload", resumed.tasks().count() == 1);
    result.check(
        "adventure still active",
        resumed.adventure_status() == AdventureStatus::Active,
    );
    result.check("aggregate identical", resumed.state() == session.state());

    clock.advance(Duration::hours(1));
    result.check(
        "reloaded run becomes resolvable",
        resumed.adventure_status() == AdventureStatus::Resolvable,
    );
    Ok(result)
}

#[derive(Clone, Copy, Default)]
struct ScenarioCatalog;

impl CatalogSource for ScenarioCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::from_json(SCENARIO_CATALOG)
    }
}

/// In-memory document store merging partial writes like the remote one.
#[derive(Clone, Default)]
struct MemoryStore {
    docs: Rc<RefCell<HashMap<String, serde_json::Map<String, Value>>>>,
}

impl AccountStore for MemoryStore {
    type Error = serde_json::Error;

    fn load_account(&self, account_id: &str) -> Result<Option<AccountDocument>, Self::Error> {
        self.docs
            .borrow()
            .get(account_id)
            .cloned()
            .map(|fields| serde_json::from_value(Value::Object(fields)))
            .transpose()
    }

    fn write_fields(&self, account_id: &str, changes: &ChangeSet) -> Result<(), Self::Error> {
        let mut docs = self.docs.borrow_mut();
        let doc = docs.entry(account_id.to_string()).or_default();
        for (key, value) in changes.iter() {
            doc.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
