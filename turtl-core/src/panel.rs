//! The compact task panel: visibility state plus a plain-text rendering.

use crate::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Shown,
}

/// Owns whether the panel is on screen. One instance per session, passed to
/// whoever needs to open or close it.
#[derive(Debug)]
pub struct PanelController {
    visibility: Visibility,
}

impl PanelController {
    pub fn new() -> Self {
        Self {
            visibility: Visibility::Hidden,
        }
    }

    pub fn is_shown(&self) -> bool {
        self.visibility == Visibility::Shown
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns `true` if this call changed the state.
    pub fn show(&mut self) -> bool {
        let changed = !self.is_shown();
        self.visibility = Visibility::Shown;
        changed
    }

    pub fn hide(&mut self) -> bool {
        let changed = self.is_shown();
        self.visibility = Visibility::Hidden;
        changed
    }

    pub fn toggle(&mut self) -> Visibility {
        self.visibility = match self.visibility {
            Visibility::Hidden => Visibility::Shown,
            Visibility::Shown => Visibility::Hidden,
        };
        self.visibility
    }
}

impl Default for PanelController {
    fn default() -> Self {
        Self::new()
    }
}

/// One line per task, numbered from 1 in list order.
pub fn render_task_line(index: usize, task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "{:>2}. [{}] {} ({}, due {})",
        index + 1,
        mark,
        task.title,
        task.priority.name(),
        crate::time::medium_date(task.deadline)
    );
    if let Some(at) = task.scheduled_time {
        line.push_str(&format!(" @ {}", at.format("%H:%M")));
    }
    if let Some(s) = &task.suggestion {
        line.push_str(&format!("\n      ↳ {}", s));
    }
    line
}

pub fn render_panel(tasks: &[Task]) -> String {
    let mut s = String::from("── Turtl ──────────────────────────\n");
    if tasks.is_empty() {
        s.push_str("  (no tasks yet; try: add <title>)\n");
    }
    for (i, t) in tasks.iter().enumerate() {
        s.push_str(&render_task_line(i, t));
        s.push('\n');
    }
    s.push_str("────────────────────────────────────");
    s
}
