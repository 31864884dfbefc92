//! Deterministic time-expression extraction from task titles.
//!
//! Titles like "call client at 3pm" already say when they should happen, so we
//! never ask the model about them. Matchers are tried in a fixed order and the
//! first one that matches anywhere in the lower-cased title wins:
//!
//! 1. clock time ("3pm", "10:30 am", "14:30")
//! 2. o'clock phrasing ("3 o'clock", "five oclock")
//! 3. ranges ("9-11", "2 to 4pm")
//! 4. prepositional references ("at 9", "around 10:15")
//! 5. named periods ("morning", "tonight")
//!
//! Ranges and references are ignored when they are glued by a hyphen to more
//! letters or digits, so dates ("2025-03-10") and names ("7-eleven") pass through.

use anyhow::Result;
use regex::Regex;

const HOUR_12: &str = r"(?:1[0-2]|0?[1-9])";
const HOUR_24: &str = r"(?:[01]?\d|2[0-3])";
// No leading zero: "03-10" is a date fragment, not 3 to 10.
const RANGE_HOUR: &str = r"(?:2[0-3]|1\d|\d)";
const MINUTES: &str = r"(?::[0-5]\d)?";
const MERIDIEM: &str = r"(?:\s*(?:am|pm))?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Explicit,
    Range,
    Reference,
    TimeOfDay,
}

impl TimeKind {
    pub fn label(self) -> &'static str {
        match self {
            TimeKind::Explicit => "Explicit time",
            TimeKind::Range => "Time range",
            TimeKind::Reference => "Time reference",
            TimeKind::TimeOfDay => "Time of day",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    pub kind: TimeKind,
    pub text: String,
}

impl TimeMatch {
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind.label(), self.text)
    }
}

#[derive(Debug)]
struct Matcher {
    kind: TimeKind,
    pattern: Regex,
    standalone: bool,
}

impl Matcher {
    fn first_hit<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        if !self.standalone {
            return self.pattern.find(text);
        }
        self.pattern
            .find_iter(text)
            .find(|hit| !hyphen_joined(text, hit.start(), hit.end()))
    }
}

/// True when `text[start..end]` continues across a hyphen on either side,
/// as in "2025-03-10" or "7-eleven".
fn hyphen_joined(text: &str, start: usize, end: usize) -> bool {
    let mut before = text[..start].chars().rev();
    let mut after = text[end..].chars();
    let glued_before =
        before.next() == Some('-') && before.next().is_some_and(char::is_alphanumeric);
    let glued_after = after.next() == Some('-') && after.next().is_some_and(char::is_alphanumeric);
    glued_before || glued_after
}

#[derive(Debug)]
pub struct TimeExtractor {
    matchers: Vec<Matcher>,
}

impl TimeExtractor {
    pub fn new() -> Result<Self> {
        let clock = format!(
            r"\b{HOUR_12}{MINUTES}\s*(?:am|pm)\b|\b{HOUR_24}:[0-5]\d\b"
        );
        let oclock = format!(
            r"\b(?:{HOUR_12}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s*o['’]?\s?clock\b"
        );
        let range = format!(
            r"\b{RANGE_HOUR}{MINUTES}{MERIDIEM}\s*(?:-|–|to|until)\s*{RANGE_HOUR}{MINUTES}{MERIDIEM}\b"
        );
        let reference = format!(r"\b(?:at|by|around)\s+{HOUR_24}{MINUTES}{MERIDIEM}\b");
        let named = r"\b(?:early morning|morning|afternoon|evening|tonight|night)\b".to_string();

        let table = [
            (TimeKind::Explicit, clock, false),
            (TimeKind::Explicit, oclock, false),
            (TimeKind::Range, range, true),
            (TimeKind::Reference, reference, true),
            (TimeKind::TimeOfDay, named, false),
        ];

        let mut matchers = Vec::with_capacity(table.len());
        for (kind, src, standalone) in table {
            let pattern = Regex::new(&src)
                .map_err(|e| anyhow::anyhow!("invalid {} pattern: {e}", kind.label()))?;
            matchers.push(Matcher {
                kind,
                pattern,
                standalone,
            });
        }

        Ok(Self { matchers })
    }

    /// First matching expression in precedence order, if any.
    pub fn find(&self, title: &str) -> Option<TimeMatch> {
        let text = title.to_lowercase();
        self.matchers.iter().find_map(|m| {
            m.first_hit(&text).map(|hit| TimeMatch {
                kind: m.kind,
                text: hit.as_str().trim().to_string(),
            })
        })
    }

    /// Formatted label such as "Explicit time: 3pm".
    pub fn extract(&self, title: &str) -> Option<String> {
        self.find(title).map(|m| m.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex() -> TimeExtractor {
        TimeExtractor::new().unwrap()
    }

    #[test]
    fn test_clock_time_with_meridiem() {
        assert_eq!(
            ex().extract("call client at 3pm").as_deref(),
            Some("Explicit time: 3pm")
        );
        assert_eq!(
            ex().extract("Standup 10:30 AM").as_deref(),
            Some("Explicit time: 10:30 am")
        );
    }

    #[test]
    fn test_24_hour_clock() {
        assert_eq!(
            ex().extract("deploy by 14:30").as_deref(),
            Some("Explicit time: 14:30")
        );
    }

    #[test]
    fn test_oclock() {
        assert_eq!(
            ex().extract("Dentist at five o'clock").as_deref(),
            Some("Explicit time: five o'clock")
        );
        assert_eq!(
            ex().extract("gym 6 oclock").as_deref(),
            Some("Explicit time: 6 oclock")
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            ex().extract("Deep work 9-11 tomorrow").as_deref(),
            Some("Time range: 9-11")
        );
        assert_eq!(
            ex().extract("office hours 2 to 4").as_deref(),
            Some("Time range: 2 to 4")
        );
    }

    #[test]
    fn test_clock_beats_range() {
        // "11am" is a clock time and clock matchers come first.
        assert_eq!(
            ex().extract("Workshop 9-11am").as_deref(),
            Some("Explicit time: 11am")
        );
    }

    #[test]
    fn test_prepositional_reference() {
        assert_eq!(
            ex().extract("Pick up kids around 4").as_deref(),
            Some("Time reference: around 4")
        );
    }

    #[test]
    fn test_named_period() {
        assert_eq!(
            ex().extract("Review notes in the Evening").as_deref(),
            Some("Time of day: evening")
        );
        assert_eq!(
            ex().extract("early morning run").as_deref(),
            Some("Time of day: early morning")
        );
    }

    #[test]
    fn test_explicit_time_beats_named_period() {
        let m = ex().find("morning sync at 8am").unwrap();
        assert_eq!(m.kind, TimeKind::Explicit);
        assert_eq!(m.text, "8am");
    }

    #[test]
    fn test_no_time_expression() {
        assert_eq!(ex().extract("Submit report"), None);
        assert_eq!(ex().extract("Buy 95 apples"), None);
        assert_eq!(ex().extract("nightly build"), None);
    }

    #[test]
    fn test_iso_date_is_not_a_range() {
        assert_eq!(ex().extract("Pay rent 2025-03-10"), None);
        assert_eq!(ex().extract("renew passport by 2025-11-04"), None);
    }

    #[test]
    fn test_hyphenated_name_is_not_a_reference() {
        assert_eq!(ex().extract("Buy snacks at 7-Eleven"), None);
    }

    #[test]
    fn test_date_does_not_hide_a_real_range() {
        assert_eq!(
            ex().extract("2025-03-10 focus block 9-11").as_deref(),
            Some("Time range: 9-11")
        );
    }
}
