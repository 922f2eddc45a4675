//! End-to-end progression scenarios driven through the public API with a
//! hand-advanced clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use taskdelve_engine::{
    AdventureError, AdventureStatus, Catalog, ManualClock, Progression, ProgressionError,
    countdown_label,
};

const CATALOG_JSON: &str = r#"{
    "dungeons": [
        {
            "id": 1,
            "name": "Dark Cave",
            "description": "A damp opening in the hillside.",
            "imageNames": ["cave-mouth"],
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

fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn session_with_balance(points: i64) -> (Progression<ManualClock>, ManualClock) {
    let clock = ManualClock::starting_at(start());
    let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
    let mut progression = Progression::fresh(catalog, clock.clone());
    if points > 0 {
        let id = progression
            .add_task_with_duration("Seed points", "", points, 1.0)
            .unwrap();
        progression.resolve_task(id, true).unwrap();
    }
    progression.drain_changes();
    (progression, clock)
}

#[test]
fn dungeon_run_from_start_to_reward() {
    // Balance 20, cost 15, one-hour dungeon.
    let (mut progression, clock) = session_with_balance(20);
    assert_eq!(progression.balance(), 20);

    progression.begin_adventure("Dark Cave").unwrap();
    assert_eq!(progression.balance(), 5);
    assert_eq!(progression.adventure_status(), AdventureStatus::Active);

    // Completing immediately is refused and changes nothing.
    let err = progression.complete_adventure().unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Adventure(AdventureError::NotResolvableYet)
    ));
    assert_eq!(progression.adventure_status(), AdventureStatus::Active);

    clock.advance(Duration::hours(1));
    assert_eq!(progression.adventure_status(), AdventureStatus::Resolvable);

    let capacity_before = progression.capacity();
    let done = progression.complete_adventure().unwrap();
    assert_eq!(done.dungeon_name, "Dark Cave");
    assert_eq!(progression.capacity(), capacity_before + 10);
    assert_eq!(progression.adventure_status(), AdventureStatus::Idle);
    assert_eq!(progression.balance(), 5);
}

#[test]
fn second_begin_is_rejected_and_debited_once() {
    let (mut progression, _clock) = session_with_balance(60);

    progression.begin_adventure("Dark Cave").unwrap();
    let err = progression.begin_adventure("Sunken Crypt").unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Adventure(AdventureError::AlreadyActive(_))
    ));
    assert_eq!(progression.balance(), 45);
}

#[test]
fn unaffordable_dungeon_leaves_the_ledger_alone() {
    let (mut progression, _clock) = session_with_balance(20);

    let err = progression.begin_adventure("Sunken Crypt").unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Adventure(AdventureError::NotEnoughInspiration { have: 20, need: 40 })
    ));
    assert_eq!(progression.balance(), 20);
    assert_eq!(progression.adventure_status(), AdventureStatus::Idle);
}

#[test]
fn expired_task_still_credits_when_caller_says_completed() {
    // The completion flag is the caller's responsibility; resolving an
    // already-expired task as completed still pays out.
    let (mut progression, clock) = session_with_balance(0);

    let id = progression
        .add_task_with_duration("Stretch", "", 10, 0.01)
        .unwrap();
    clock.advance(Duration::seconds(37));
    assert!(progression.task_is_expired(id).unwrap());

    let resolved = progression.resolve_task(id, true).unwrap();
    assert_eq!(resolved.credited, 10);
    assert_eq!(progression.balance(), 10);
}

#[test]
fn expiry_driven_removal_pays_nothing() {
    let (mut progression, clock) = session_with_balance(0);

    let id = progression
        .add_task_with_duration("Stretch", "", 10, 0.01)
        .unwrap();
    clock.advance(Duration::minutes(1));

    let completed = !progression.task_is_expired(id).unwrap();
    let resolved = progression.resolve_task(id, completed).unwrap();
    assert_eq!(resolved.credited, 0);
    assert_eq!(progression.balance(), 0);
    assert_eq!(progression.state().ledger.tasks_completed(), 0);
}

#[test]
fn preset_and_custom_tasks_share_one_roster() {
    let (mut progression, _clock) = session_with_balance(0);

    progression.add_preset_task("Morning run").unwrap();
    progression
        .add_task_with_duration("Water the plants", "both pots", 5, 6.0)
        .unwrap();
    progression.add_preset_task("Read a chapter").unwrap();

    let names: Vec<_> = progression.tasks().map(|t| t.name().to_string()).collect();
    assert_eq!(names, ["Morning run", "Water the plants", "Read a chapter"]);
}

#[test]
fn countdown_labels_track_the_adventure() {
    let (mut progression, clock) = session_with_balance(50);
    progression.begin_adventure("Sunken Crypt").unwrap();

    assert_eq!(
        progression.adventure_countdown("Returns in ", "The party is back!"),
        Some("Returns in 8 hours".to_string())
    );

    clock.advance(Duration::hours(3) + Duration::minutes(30));
    assert_eq!(
        progression.adventure_countdown("Returns in ", "The party is back!"),
        Some("Returns in 4 hours, 30 minutes".to_string())
    );

    clock.advance(Duration::hours(5));
    assert_eq!(
        progression.adventure_countdown("Returns in ", "The party is back!"),
        Some("The party is back!".to_string())
    );
}

#[test]
fn pure_countdown_matches_facade_label() {
    let now = start();
    let target = now + Duration::days(2) + Duration::hours(5);
    assert_eq!(countdown_label(now, target, "", "done"), "2 days, 5 hours");
}
