//! turtl-core: task model, time extraction, scheduling and storage for Turtl

pub mod calendar;
pub mod panel;
pub mod schedule;
pub mod store;
pub mod task;
pub mod time;
pub mod time_extractor;

pub use calendar::{CalendarError, CalendarService, ScheduleError, schedule_task};
pub use panel::{PanelController, Visibility, render_panel, render_task_line};
pub use schedule::{Alarm, CalendarEvent, HOUR_RULES, HourRule, build_event, resolve_hour};
pub use store::{JsonFileKv, KeyValueStore, MemoryKv, StoreError, TASKS_KEY, TaskStore};
pub use task::{Priority, Task, TimePreference};
pub use time_extractor::{TimeExtractor, TimeKind, TimeMatch};
