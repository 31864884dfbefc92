//! Calendar backend seam and the request-access → save flow.

use thiserror::Error;
use tracing::{info, warn};

use crate::schedule::{CalendarEvent, build_event};
use crate::{Task, TimePreference};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("calendar rejected event: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("calendar access denied")]
    AccessDenied,
    #[error("failed to save event: {0}")]
    Save(#[from] CalendarError),
}

/// A calendar that can receive new events in its default calendar.
pub trait CalendarService {
    /// Ask for write access. Called on every scheduling attempt.
    fn request_access(&mut self) -> bool;

    fn save_event(&mut self, event: &CalendarEvent) -> Result<(), CalendarError>;
}

impl<C: CalendarService + ?Sized> CalendarService for Box<C> {
    fn request_access(&mut self) -> bool {
        (**self).request_access()
    }

    fn save_event(&mut self, event: &CalendarEvent) -> Result<(), CalendarError> {
        (**self).save_event(event)
    }
}

/// Build and write the event for `task`. No retry on either failure.
pub fn schedule_task<C: CalendarService + ?Sized>(
    calendar: &mut C,
    task: &Task,
    preference: TimePreference,
) -> Result<CalendarEvent, ScheduleError> {
    if !calendar.request_access() {
        warn!(task_id = %task.id, "calendar access denied");
        return Err(ScheduleError::AccessDenied);
    }

    let event = build_event(task, preference);
    if let Err(e) = calendar.save_event(&event) {
        warn!(task_id = %task.id, error = %e, "failed to save event");
        return Err(e.into());
    }

    info!(task_id = %task.id, start = %event.start, "task scheduled in calendar");
    Ok(event)
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingCalendar;
    use super::*;
    use crate::Priority;
    use chrono::NaiveDate;

    fn task() -> Task {
        Task::new(
            "Submit report",
            Priority::High,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        )
    }

    #[test]
    fn writes_exactly_one_event() {
        let mut cal = RecordingCalendar::default();
        let ev = schedule_task(&mut cal, &task(), TimePreference::Morning).unwrap();
        assert_eq!(cal.events, vec![ev]);
        assert_eq!(cal.access_requests, 1);
    }

    #[test]
    fn access_is_requested_every_time() {
        let mut cal = RecordingCalendar::default();
        schedule_task(&mut cal, &task(), TimePreference::Morning).unwrap();
        schedule_task(&mut cal, &task(), TimePreference::Morning).unwrap();
        assert_eq!(cal.access_requests, 2);
    }

    #[test]
    fn denied_access_writes_nothing() {
        let mut cal = RecordingCalendar {
            deny_access: true,
            ..Default::default()
        };
        let err = schedule_task(&mut cal, &task(), TimePreference::Morning).unwrap_err();
        assert!(matches!(err, ScheduleError::AccessDenied));
        assert!(cal.events.is_empty());
    }

    #[test]
    fn save_failure_is_reported() {
        let mut cal = RecordingCalendar {
            fail_save: true,
            ..Default::default()
        };
        let err = schedule_task(&mut cal, &task(), TimePreference::Morning).unwrap_err();
        assert!(matches!(err, ScheduleError::Save(CalendarError::Rejected(_))));
    }
}
