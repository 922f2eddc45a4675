//! Countdown formatting and the clock seam.
//!
//! The formatting functions are pure: callers own any polling loop (a UI
//! redrawing once per second, the tester stepping a simulated clock). The
//! engine never starts a timer of its own.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

use crate::constants::{ELAPSED_GRACE_SECS, SECONDS_PER_HOUR};

/// Source of "now" injected into the progression facade.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock for tests and scripted harness runs.
///
/// Clones share the same instant, so a harness can keep one handle while
/// the facade owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Move the shared instant forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Convert a fractional hour count into a duration, at millisecond
/// resolution.
#[must_use]
pub fn hours_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * SECONDS_PER_HOUR * 1000.0).round() as i64)
}

/// Whole-unit breakdown of the span between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemainingParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

/// Break the span from `now` to `target` into days/hours/minutes/seconds.
/// A target at or before `now` yields all zeros.
#[must_use]
pub fn remaining_parts(now: DateTime<Utc>, target: DateTime<Utc>) -> RemainingParts {
    let total = (target - now).num_seconds().max(0);
    RemainingParts {
        days: total / 86_400,
        hours: total % 86_400 / 3600,
        minutes: total % 3600 / 60,
        seconds: total % 60,
    }
}

/// True once `target` is within the display grace of `now`.
#[must_use]
pub fn is_elapsed(now: DateTime<Utc>, target: DateTime<Utc>) -> bool {
    target - Duration::seconds(ELAPSED_GRACE_SECS) <= now
}

/// Format the remaining span with the largest applicable units.
///
/// Days suppress minutes and seconds, hours suppress seconds, and seconds
/// appear only on their own. Unit words are pluralized.
#[must_use]
pub fn format_remaining(now: DateTime<Utc>, target: DateTime<Utc>) -> String {
    let parts = remaining_parts(now, target);
    let mut out = String::new();

    if parts.days > 0 {
        push_unit(&mut out, parts.days, "day");
    }
    if parts.hours > 0 {
        push_unit(&mut out, parts.hours, "hour");
    }
    if parts.days == 0 && parts.minutes > 0 {
        push_unit(&mut out, parts.minutes, "minute");
    }
    if out.is_empty() && parts.seconds > 0 {
        push_unit(&mut out, parts.seconds, "second");
    }

    out
}

/// Produce the user-facing countdown label.
///
/// Returns `template` followed by the formatted span, or `elapsed_message`
/// once the target is within the display grace.
#[must_use]
pub fn countdown_label(
    now: DateTime<Utc>,
    target: DateTime<Utc>,
    template: &str,
    elapsed_message: &str,
) -> String {
    if is_elapsed(now, target) {
        return elapsed_message.to_string();
    }
    format!("{template}{}", format_remaining(now, target))
}

fn push_unit(out: &mut String, value: i64, unit: &str) {
    if !out.is_empty() {
        out.push_str(", ");
    }
    out.push_str(&value.to_string());
    out.push(' ');
    out.push_str(unit);
    if value > 1 {
        out.push('s');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn days_suppress_minutes_and_seconds() {
        let now = at(0);
        let target = now + Duration::days(1) + Duration::hours(2) + Duration::minutes(3);
        assert_eq!(format_remaining(now, target), "1 day, 2 hours");
    }

    #[test]
    fn hours_keep_minutes_but_drop_seconds() {
        let now = at(0);
        let target = now + Duration::hours(3) + Duration::minutes(15) + Duration::seconds(40);
        assert_eq!(format_remaining(now, target), "3 hours, 15 minutes");
    }

    #[test]
    fn minutes_alone() {
        let now = at(0);
        let target = now + Duration::minutes(5);
        assert_eq!(format_remaining(now, target), "5 minutes");
    }

    #[test]
    fn seconds_only_when_nothing_larger_remains() {
        let now = at(0);
        assert_eq!(format_remaining(now, now + Duration::seconds(42)), "42 seconds");
        assert_eq!(format_remaining(now, now + Duration::seconds(1)), "1 second");
    }

    #[test]
    fn singular_units() {
        let now = at(0);
        let target = now + Duration::days(1) + Duration::hours(1);
        assert_eq!(format_remaining(now, target), "1 day, 1 hour");
    }

    #[test]
    fn label_uses_template_and_elapsed_message() {
        let now = at(0);
        let target = now + Duration::minutes(5);
        assert_eq!(
            countdown_label(now, target, "Expires in: ", "Expired"),
            "Expires in: 5 minutes"
        );
        assert_eq!(countdown_label(target, target, "Expires in: ", "Expired"), "Expired");
    }

    #[test]
    fn final_second_counts_as_elapsed() {
        let now = at(0);
        let target = now + Duration::seconds(1);
        assert!(is_elapsed(now, target));
        assert!(is_elapsed(now, now - Duration::seconds(30)));
        assert!(!is_elapsed(now, now + Duration::seconds(2)));
    }

    #[test]
    fn elapsed_target_formats_empty() {
        let now = at(100);
        assert_eq!(format_remaining(now, at(0)), "");
    }

    #[test]
    fn manual_clock_shares_instant_across_clones() {
        let clock = ManualClock::starting_at(at(0));
        let handle = clock.clone();
        handle.advance(Duration::seconds(90));
        assert_eq!(clock.now(), at(90));
    }
}
