//! Suggestion text → concrete calendar block.
//!
//! Deterministic: the same task, suggestion and preference always produce the
//! same event.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Priority, Task, TimePreference};

pub const EVENT_TITLE_MARKER: &str = "🐢";
pub const NO_SUGGESTION_NOTE: &str = "No suggestion available";

/// Alarm lead time for high priority tasks.
pub const HIGH_PRIORITY_ALARM_SECS: i64 = 3600;

/// One row of the keyword table: any keyword present selects `hour`.
#[derive(Debug, Clone, Copy)]
pub struct HourRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub hour: u32,
}

/// Checked top to bottom; the first row with any keyword in the suggestion wins.
///
/// Rows overlap ("7" is in both early morning and evening, "morning" is a
/// substring of "early morning"), so the order here is the behaviour.
pub const HOUR_RULES: &[HourRule] = &[
    HourRule {
        name: "morning",
        keywords: &["morning", "9", "10"],
        hour: 9,
    },
    HourRule {
        name: "early morning",
        keywords: &["early morning", "7", "8"],
        hour: 8,
    },
    HourRule {
        name: "afternoon",
        keywords: &["afternoon", "2", "3", "14", "15"],
        hour: 14,
    },
    HourRule {
        name: "evening",
        keywords: &["evening", "6", "7", "18", "19"],
        hour: 18,
    },
    HourRule {
        name: "late",
        keywords: &["late", "4", "5", "16", "17"],
        hour: 16,
    },
];

/// The rule a suggestion selects, if any.
pub fn matching_rule(suggestion: &str) -> Option<&'static HourRule> {
    let s = suggestion.to_lowercase();
    HOUR_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| s.contains(k)))
}

/// Hour-of-day for the event: keyword table first, then the preference default.
pub fn resolve_hour(suggestion: Option<&str>, preference: TimePreference) -> u32 {
    suggestion
        .and_then(matching_rule)
        .map(|rule| rule.hour)
        .unwrap_or_else(|| preference.default_hour())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    /// Negative: seconds before the event start.
    pub offset_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub task_id: String,
    pub title: String,
    pub notes: String,
    /// Local wall-clock times.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub alarm: Option<Alarm>,
}

pub fn event_title(task: &Task) -> String {
    format!("{} {}", EVENT_TITLE_MARKER, task.title)
}

pub fn event_notes(task: &Task) -> String {
    format!(
        "Priority: {}\nAI Suggestion: {}",
        task.priority.name(),
        task.suggestion.as_deref().unwrap_or(NO_SUGGESTION_NOTE)
    )
}

/// Build the one-hour block for a task whose suggestion has been resolved.
///
/// The preference only matters when the suggestion names no usable time; the
/// alarm follows the task's own priority.
pub fn build_event(task: &Task, preference: TimePreference) -> CalendarEvent {
    let hour = resolve_hour(task.suggestion.as_deref(), preference);
    let start = task
        .deadline
        .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN));
    let end = start + Duration::hours(1);

    let alarm = (task.priority == Priority::High).then_some(Alarm {
        offset_secs: -HIGH_PRIORITY_ALARM_SECS,
    });

    CalendarEvent {
        task_id: task.id.to_string(),
        title: event_title(task),
        notes: event_notes(task),
        start,
        end,
        alarm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn task(priority: Priority, suggestion: Option<&str>) -> Task {
        Task::new(
            "Submit report",
            priority,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        )
        .with_suggestion(suggestion.map(str::to_string))
    }

    #[test]
    fn morning_wins_regardless_of_priority() {
        for p in Priority::ALL {
            let ev = build_event(
                &task(p, Some("Morning is best for this")),
                TimePreference::Night,
            );
            assert_eq!(ev.start.hour(), 9);
        }
    }

    #[test]
    fn early_morning_still_hits_the_morning_row() {
        // "early morning" contains "morning", which is checked first.
        assert_eq!(resolve_hour(Some("Early morning (7-9 AM)"), TimePreference::Night), 9);
    }

    #[test]
    fn seven_resolves_to_early_morning_not_evening() {
        assert_eq!(resolve_hour(Some("around 7"), TimePreference::Night), 8);
        assert_eq!(matching_rule("around 7").unwrap().name, "early morning");
    }

    #[test]
    fn keyword_rows() {
        let pref = TimePreference::Night;
        assert_eq!(resolve_hour(Some("Afternoon slot"), pref), 14);
        assert_eq!(resolve_hour(Some("Evening works"), pref), 18);
        assert_eq!(resolve_hour(Some("do it late"), pref), 16);
        assert_eq!(resolve_hour(Some("Explicit time: 3pm"), pref), 14);
    }

    #[test]
    fn no_suggestion_uses_preference() {
        let t = task(Priority::Low, None);
        let ev = build_event(&t, TimePreference::from(Priority::Low));
        assert_eq!(ev.start.hour(), 20);
        assert_eq!(ev.notes, "Priority: Low\nAI Suggestion: No suggestion available");
    }

    #[test]
    fn unmatched_suggestion_uses_preference_not_priority() {
        let t = task(Priority::High, Some("whenever you like"));
        let ev = build_event(&t, TimePreference::Afternoon);
        assert_eq!(ev.start.hour(), 14);
    }

    #[test]
    fn end_is_one_hour_after_start() {
        for p in Priority::ALL {
            for s in [None, Some("evening"), Some("nothing useful")] {
                let ev = build_event(&task(p, s), TimePreference::Morning);
                assert_eq!(ev.end - ev.start, Duration::hours(1));
                assert_eq!(ev.start.minute(), 0);
                assert_eq!(ev.start.second(), 0);
            }
        }
    }

    #[test]
    fn alarm_only_for_high_priority() {
        for p in Priority::ALL {
            let ev = build_event(&task(p, None), TimePreference::Morning);
            assert_eq!(ev.alarm.is_some(), p == Priority::High);
        }
        let ev = build_event(&task(Priority::High, None), TimePreference::Morning);
        assert_eq!(ev.alarm, Some(Alarm { offset_secs: -3600 }));
    }

    #[test]
    fn title_carries_marker() {
        let ev = build_event(&task(Priority::Medium, None), TimePreference::Morning);
        assert_eq!(ev.title, "🐢 Submit report");
    }
}
