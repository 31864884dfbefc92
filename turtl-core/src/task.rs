//! Task model shared by the store, the suggestion client and the scheduler.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn name(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Hour-of-day used when nothing else says when the task should happen.
    pub fn default_hour(self) -> u32 {
        match self {
            Priority::High => 9,
            Priority::Medium => 14,
            Priority::Low => 20,
        }
    }

    /// Canned suggestion used when the remote model answers with something unusable.
    pub fn fallback_suggestion(self) -> &'static str {
        match self {
            Priority::High => "Morning (9-11 AM) - Best for high priority tasks",
            Priority::Medium => "Afternoon (2-4 PM) - Good for medium priority tasks",
            Priority::Low => "Evening (6-8 PM) - Suitable for low priority tasks",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}' (expected low|medium|high)")),
        }
    }
}

/// Preferred window of the day, independent of how urgent the task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePreference {
    Morning,
    Afternoon,
    Night,
}

impl TimePreference {
    pub fn default_hour(self) -> u32 {
        match self {
            TimePreference::Morning => 9,
            TimePreference::Afternoon => 14,
            TimePreference::Night => 20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimePreference::Morning => "Morning",
            TimePreference::Afternoon => "Afternoon",
            TimePreference::Night => "Night",
        }
    }
}

impl From<Priority> for TimePreference {
    fn from(p: Priority) -> Self {
        match p {
            Priority::High => TimePreference::Morning,
            Priority::Medium => TimePreference::Afternoon,
            Priority::Low => TimePreference::Night,
        }
    }
}

impl fmt::Display for TimePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" | "am" => Ok(TimePreference::Morning),
            "afternoon" | "pm" => Ok(TimePreference::Afternoon),
            "night" | "evening" => Ok(TimePreference::Night),
            other => Err(format!(
                "unknown time preference '{other}' (expected morning|afternoon|night)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub priority: Priority,
    pub deadline: NaiveDate,

    #[serde(default)]
    pub completed: bool,

    /// Local wall-clock start of the calendar block, once resolved.
    #[serde(default)]
    pub scheduled_time: Option<NaiveDateTime>,

    #[serde(default)]
    pub suggestion: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, priority: Priority, deadline: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            priority,
            deadline,
            completed: false,
            scheduled_time: None,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn with_scheduled_time(mut self, at: NaiveDateTime) -> Self {
        self.scheduled_time = Some(at);
        self
    }

    /// First eight hex digits of the id, enough to address a task from the CLI.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn new_task_starts_unscheduled() {
        let t = Task::new("Submit report", Priority::High, date());
        assert!(!t.completed);
        assert!(t.scheduled_time.is_none());
        assert!(t.suggestion.is_none());
    }

    #[test]
    fn ids_are_unique() {
        let a = Task::new("a", Priority::Low, date());
        let b = Task::new("a", Priority::Low, date());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn priority_serializes_with_display_names() {
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }

    #[test]
    fn preference_follows_priority_hours() {
        for p in Priority::ALL {
            assert_eq!(TimePreference::from(p).default_hour(), p.default_hour());
        }
    }

    #[test]
    fn parse_priority_and_preference() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("night".parse::<TimePreference>().unwrap(), TimePreference::Night);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn short_id_is_eight_chars() {
        let t = Task::new("x", Priority::Low, date());
        assert_eq!(t.short_id().len(), 8);
        assert!(t.id.simple().to_string().starts_with(&t.short_id()));
    }
}
