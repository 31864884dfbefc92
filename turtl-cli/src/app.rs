//! Submit flow: draft task → suggestion → calendar event → task update.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};
use turtl_core::{
    CalendarEvent, CalendarService, KeyValueStore, Priority, ScheduleError, Task, TaskStore,
    TimePreference, schedule_task,
};
use uuid::Uuid;

use crate::suggest::Suggester;

/// What the user typed into the add form.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub title: String,
    pub priority: Priority,
    pub deadline: NaiveDate,
    pub preference: TimePreference,
}

#[derive(Debug)]
pub struct AddOutcome {
    pub task: Task,
    pub calendar: Result<CalendarEvent, ScheduleError>,
}

impl AddOutcome {
    /// The confirmation shown after a successful add, if there is anything to say.
    pub fn confirmation(&self) -> Option<String> {
        self.task
            .suggestion
            .as_ref()
            .map(|s| format!("Task added! AI suggests: {s}"))
    }
}

pub struct App<K: KeyValueStore, C: CalendarService> {
    pub store: TaskStore<K>,
    pub calendar: C,
    suggester: Arc<dyn Suggester>,
}

impl<K: KeyValueStore, C: CalendarService> App<K, C> {
    pub fn new(store: TaskStore<K>, calendar: C, suggester: Arc<dyn Suggester>) -> Self {
        Self {
            store,
            calendar,
            suggester,
        }
    }

    pub fn suggester(&self) -> Arc<dyn Suggester> {
        Arc::clone(&self.suggester)
    }

    /// Append the draft (no suggestion, unscheduled) and persist it.
    pub fn begin(&mut self, sub: &Submission) -> Result<Task> {
        let title = sub.title.trim();
        if title.is_empty() {
            bail!("task title must not be empty");
        }
        let task = Task::new(title, sub.priority, sub.deadline);
        self.store.add(task.clone())?;
        Ok(task)
    }

    /// Apply a resolved suggestion to the task and try to schedule it.
    ///
    /// Returns `None` if the task was deleted while the suggestion was pending;
    /// nothing is written in that case. Neither calendar nor store failures fail
    /// this call: an event that was written is always reported back.
    pub fn finish(
        &mut self,
        task_id: Uuid,
        preference: TimePreference,
        suggestion: Option<String>,
    ) -> Option<AddOutcome> {
        let Some(current) = self.store.get(task_id) else {
            debug!(%task_id, "task deleted before its suggestion arrived");
            return None;
        };

        let mut task = current.clone().with_suggestion(suggestion);
        let calendar = schedule_task(&mut self.calendar, &task, preference);
        if let Ok(event) = &calendar {
            task.scheduled_time = Some(event.start);
        }

        if let Err(e) = self.store.update(task.clone()) {
            warn!(%task_id, error = %e, "could not save suggestion for task");
        }
        Some(AddOutcome { task, calendar })
    }

    /// The whole flow for one submission, awaiting the suggestion inline.
    pub async fn add(&mut self, sub: Submission) -> Result<AddOutcome> {
        let draft = self.begin(&sub)?;
        let suggestion = self
            .suggester
            .suggest_time(&draft.title, draft.priority, draft.deadline)
            .await;

        match self.finish(draft.id, sub.preference, suggestion) {
            Some(outcome) => Ok(outcome),
            None => bail!("task {} disappeared while adding", draft.short_id()),
        }
    }

    /// Exactly one task must start with `prefix`.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Uuid> {
        let hits = self.store.find_by_prefix(prefix);
        match hits.as_slice() {
            [one] => Ok(one.id),
            [] => bail!("no task matches '{prefix}'"),
            many => bail!("'{prefix}' matches {} tasks; use more characters", many.len()),
        }
    }

    pub fn toggle(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.store.toggle_completed(id)?)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.store.delete(id)?)
    }
}
