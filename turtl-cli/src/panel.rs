//! Interactive task panel on stdin/stdout.
//!
//! Suggestions run as spawned tasks and report back over a channel; only this
//! loop touches the store, so results may arrive in any order without locking.

use anyhow::Result;
use chrono::NaiveDate;
use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use turtl_core::time::parse_deadline;
use turtl_core::{
    CalendarService, KeyValueStore, PanelController, Priority, Task, TimePreference, Visibility,
    render_panel,
};
use uuid::Uuid;

use crate::app::{AddOutcome, App, Submission};
use crate::suggest::Suggester;

const HELP: &str = "\
commands:
  add <title> [!low|!medium|!high] [@YYYY-MM-DD] [~morning|~afternoon|~night]
  done <n>     toggle completion of task n
  rm <n>       delete task n
  list         redraw the panel
  hide | show | toggle
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    Add(Submission),
    Done(usize),
    Remove(usize),
    List,
    Show,
    Hide,
    Toggle,
    Help,
    Quit,
}

fn parse_index(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a task number, got '{}'", arg.trim())),
    }
}

fn parse_add(rest: &str, today: NaiveDate) -> Result<Submission, String> {
    let mut priority = Priority::Medium;
    let mut deadline = today;
    let mut preference: Option<TimePreference> = None;
    let mut words = Vec::new();

    for token in rest.split_whitespace() {
        if let Some(p) = token.strip_prefix('!') {
            priority = p.parse()?;
        } else if let Some(d) = token.strip_prefix('@') {
            deadline = parse_deadline(d).map_err(|e| e.to_string())?;
        } else if let Some(t) = token.strip_prefix('~') {
            preference = Some(t.parse()?);
        } else {
            words.push(token);
        }
    }

    let title = words.join(" ");
    if title.is_empty() {
        return Err("add needs a title".to_string());
    }

    Ok(Submission {
        title,
        priority,
        deadline,
        preference: preference.unwrap_or_else(|| TimePreference::from(priority)),
    })
}

pub fn parse_command(line: &str, today: NaiveDate) -> Result<PanelCommand, String> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match cmd.to_lowercase().as_str() {
        "add" | "a" => parse_add(rest, today).map(PanelCommand::Add),
        "done" | "d" => parse_index(rest).map(PanelCommand::Done),
        "rm" | "del" | "delete" => parse_index(rest).map(PanelCommand::Remove),
        "list" | "ls" | "" => Ok(PanelCommand::List),
        "show" => Ok(PanelCommand::Show),
        "hide" => Ok(PanelCommand::Hide),
        "toggle" => Ok(PanelCommand::Toggle),
        "help" | "?" => Ok(PanelCommand::Help),
        "quit" | "q" | "exit" => Ok(PanelCommand::Quit),
        other => Err(format!("unknown command '{other}' (try: help)")),
    }
}

#[derive(Debug)]
struct SuggestionReady {
    task_id: Uuid,
    preference: TimePreference,
    suggestion: Option<String>,
}

pub fn report_outcome(outcome: &AddOutcome) {
    if let Some(msg) = outcome.confirmation() {
        println!("{msg}");
    }
    if let Ok(ev) = &outcome.calendar {
        println!("Scheduled: {} – {}", ev.start.format("%a %b %-d %H:%M"), ev.end.format("%H:%M"));
    }
}

fn prompt() {
    print!("turtl> ");
    std::io::stdout().flush().ok();
}

/// Apply one parsed command. Store failures are reported and the session goes
/// on; only `quit` breaks. New drafts are handed to `spawn` for their suggestion.
pub fn handle_command<K: KeyValueStore, C: CalendarService>(
    app: &mut App<K, C>,
    panel: &mut PanelController,
    cmd: PanelCommand,
    spawn: &mut dyn FnMut(Task, TimePreference),
) -> ControlFlow<()> {
    if panel.visibility() == Visibility::Hidden
        && !matches!(cmd, PanelCommand::Show | PanelCommand::Toggle | PanelCommand::Quit)
    {
        println!("panel is hidden (type show)");
        return ControlFlow::Continue(());
    }

    match cmd {
        PanelCommand::Quit => return ControlFlow::Break(()),
        PanelCommand::Help => println!("{HELP}"),
        PanelCommand::List => println!("{}", render_panel(app.store.tasks())),
        PanelCommand::Show => {
            panel.show();
            println!("{}", render_panel(app.store.tasks()));
        }
        PanelCommand::Hide => {
            panel.hide();
        }
        PanelCommand::Toggle => {
            if panel.toggle() == Visibility::Shown {
                println!("{}", render_panel(app.store.tasks()));
            }
        }
        PanelCommand::Add(sub) => match app.begin(&sub) {
            Ok(draft) => {
                println!("Added \"{}\"; asking for a time…", draft.title);
                spawn(draft, sub.preference);
            }
            Err(e) => println!("{e}"),
        },
        PanelCommand::Done(i) => match app.store.tasks().get(i).map(|t| t.id) {
            Some(id) => match app.toggle(id) {
                Ok(_) => println!("{}", render_panel(app.store.tasks())),
                Err(e) => {
                    warn!(task_id = %id, error = %e, "could not save completion");
                    println!("could not save task #{}: {e}", i + 1);
                }
            },
            None => println!("no task #{}", i + 1),
        },
        PanelCommand::Remove(i) => match app.store.tasks().get(i).map(|t| t.id) {
            Some(id) => match app.delete(id) {
                Ok(_) => println!("{}", render_panel(app.store.tasks())),
                Err(e) => {
                    warn!(task_id = %id, error = %e, "could not save deletion");
                    println!("could not save after removing task #{}: {e}", i + 1);
                }
            },
            None => println!("no task #{}", i + 1),
        },
    }
    ControlFlow::Continue(())
}

fn spawn_suggestion(
    suggester: Arc<dyn Suggester>,
    tx: mpsc::UnboundedSender<SuggestionReady>,
    draft: Task,
    preference: TimePreference,
) {
    tokio::spawn(async move {
        let suggestion = suggester
            .suggest_time(&draft.title, draft.priority, draft.deadline)
            .await;
        let _ = tx.send(SuggestionReady {
            task_id: draft.id,
            preference,
            suggestion,
        });
    });
}

pub async fn run_panel<K: KeyValueStore, C: CalendarService>(
    app: &mut App<K, C>,
    panel: &mut PanelController,
    today: NaiveDate,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<SuggestionReady>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let suggester = app.suggester();
    let mut pending = 0usize;

    panel.show();
    println!("{}", render_panel(app.store.tasks()));
    println!("(type help for commands)");
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stopped reading commands");
                        break;
                    }
                };
                let cmd = match parse_command(&line, today) {
                    Ok(cmd) => cmd,
                    Err(msg) => {
                        println!("{msg}");
                        prompt();
                        continue;
                    }
                };

                let flow = handle_command(app, panel, cmd, &mut |draft, preference| {
                    pending += 1;
                    spawn_suggestion(Arc::clone(&suggester), tx.clone(), draft, preference);
                });
                if flow.is_break() {
                    break;
                }
                prompt();
            }
            Some(ready) = rx.recv() => {
                pending = pending.saturating_sub(1);
                apply_suggestion(app, ready);
                prompt();
            }
        }
    }

    // In-flight requests are not cancelled; let them land before exiting.
    if pending > 0 {
        println!("\nwaiting for {pending} pending suggestion(s)…");
    }
    while pending > 0 {
        match rx.recv().await {
            Some(ready) => {
                pending -= 1;
                apply_suggestion(app, ready);
            }
            None => break,
        }
    }

    panel.hide();
    Ok(())
}

fn apply_suggestion<K: KeyValueStore, C: CalendarService>(
    app: &mut App<K, C>,
    ready: SuggestionReady,
) {
    match app.finish(ready.task_id, ready.preference, ready.suggestion) {
        Some(outcome) => {
            println!();
            report_outcome(&outcome);
        }
        None => debug!(task_id = %ready.task_id, "dropped suggestion for deleted task"),
    }
}
