use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use turtl_core::time::{parse_deadline, parse_tz};
use turtl_core::{
    CalendarService, JsonFileKv, PanelController, Priority, TaskStore, TimeExtractor,
    TimePreference, render_panel, render_task_line,
};

mod app;
mod auth;
mod calendar;
mod config;
mod panel;
mod state;
mod suggest;

use app::{App, Submission};
use calendar::{GcalcliCalendar, IcsCalendar};
use config::{CalendarBackend, Config, load_config};
use suggest::{Suggester, SuggestionClient, SuggestionConfig};

#[derive(Parser, Debug)]
#[command(name = "turtl", version, about = "Turtl: AI-suggested time blocks for your tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task, get a time suggestion and put it on the calendar
    Add {
        /// Task title (words are joined)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[arg(long, short, default_value = "medium")]
        priority: Priority,

        /// Deadline date YYYY-MM-DD (default: today in the configured timezone)
        #[arg(long, short)]
        deadline: Option<String>,

        /// Preferred time of day (default: follows priority)
        #[arg(long)]
        prefer: Option<TimePreference>,
    },

    /// List tasks in the order they were added
    List,

    /// Toggle completion of a task by id prefix
    Done { id: String },

    /// Delete a task by id prefix
    Delete { id: String },

    /// Show the time suggestion for a title without saving anything
    Suggest {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[arg(long, short, default_value = "medium")]
        priority: Priority,

        #[arg(long, short)]
        deadline: Option<String>,
    },

    /// Open the interactive task panel
    Panel,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store credentials for the suggestion endpoint
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Calendar backend commands
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.turtl/config.toml with defaults
    Init,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an API key into ~/.turtl/auth.json
    PasteKey,
}

#[derive(Subcommand, Debug)]
enum CalendarCommand {
    /// Show where events go and how many are there
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so panel output stays clean. Override with RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("turtl=info,turtl_core=info,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Add {
            title,
            priority,
            deadline,
            prefer,
        } => {
            let cfg = load_config()?;
            let deadline = resolve_deadline(&cfg, deadline.as_deref())?;
            let mut app = open_app(&cfg)?;
            let outcome = app
                .add(Submission {
                    title: title.join(" "),
                    priority,
                    deadline,
                    preference: prefer.unwrap_or_else(|| TimePreference::from(priority)),
                })
                .await?;

            println!("Added {}", render_task_line(app.store.len() - 1, &outcome.task));
            panel::report_outcome(&outcome);
            if let Err(e) = &outcome.calendar {
                println!("(not on calendar: {e})");
            }
        }

        Command::List => {
            let cfg = load_config()?;
            let store = TaskStore::load(JsonFileKv::new(cfg.settings_path()?));
            if store.is_empty() {
                println!("No tasks. Add one: turtl add <title>");
            }
            for t in store.tasks() {
                let line = render_task_line(0, t);
                let line = line.split_once(". ").map(|(_, rest)| rest).unwrap_or(&line);
                println!("{}  {}", t.short_id(), line);
            }
        }

        Command::Done { id } => {
            let cfg = load_config()?;
            let mut app = open_app(&cfg)?;
            let task_id = app.resolve_prefix(&id)?;
            app.toggle(task_id)?;
            if let Some(t) = app.store.get(task_id) {
                let state = if t.completed { "done" } else { "not done" };
                println!("{} marked {}", t.title, state);
            }
        }

        Command::Delete { id } => {
            let cfg = load_config()?;
            let mut app = open_app(&cfg)?;
            let task_id = app.resolve_prefix(&id)?;
            let title = app.store.get(task_id).map(|t| t.title.clone()).unwrap_or_default();
            app.delete(task_id)?;
            println!("Deleted {title}");
        }

        Command::Suggest {
            title,
            priority,
            deadline,
        } => {
            let cfg = load_config()?;
            let deadline = resolve_deadline(&cfg, deadline.as_deref())?;
            let client = suggestion_client(&cfg)?;
            match client.suggest_time(&title.join(" "), priority, deadline).await {
                Some(s) => println!("{s}"),
                None => println!("No suggestion available"),
            }
        }

        Command::Panel => {
            let cfg = load_config()?;
            let today = today_in(&cfg)?;
            let mut app = open_app(&cfg)?;
            let mut panel = PanelController::new();
            panel::run_panel(&mut app, &mut panel, today).await?;
            println!("\n{}", render_panel(app.store.tasks()));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteKey => auth::paste_api_key()?,
        },

        Command::Calendar { command } => match command {
            CalendarCommand::Show => {
                let cfg = load_config()?;
                match cfg.calendar.backend {
                    CalendarBackend::Ics => {
                        let p = cfg.ics_path()?;
                        println!("Backend: ics ({})", p.display());
                        println!("Events: {}", calendar::count_events(&p)?);
                    }
                    CalendarBackend::Gcalcli => {
                        let cal = cfg.calendar.gcalcli_calendar.as_deref().unwrap_or("(default)");
                        let found = which::which("gcalcli").is_ok();
                        println!("Backend: gcalcli, calendar {cal}");
                        println!("gcalcli installed: {}", if found { "yes" } else { "no" });
                    }
                }
                println!("Timezone: {}", cfg.calendar.timezone);
            }
        },
    }

    Ok(())
}

fn today_in(cfg: &Config) -> Result<NaiveDate> {
    let tz = parse_tz(&cfg.calendar.timezone)?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

fn resolve_deadline(cfg: &Config, arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(s) => parse_deadline(s),
        None => today_in(cfg),
    }
}

fn suggestion_client(cfg: &Config) -> Result<SuggestionClient> {
    let api_key = auth::resolve_api_key(&cfg.ai)?;
    if api_key.is_none() {
        warn!(
            env = %cfg.ai.api_key_env,
            "no API key configured; set it or run: turtl auth paste-key"
        );
    }
    let extractor = TimeExtractor::new().context("build time extractor")?;
    Ok(SuggestionClient::new(
        SuggestionConfig::from_ai(&cfg.ai, api_key),
        Arc::new(extractor),
    ))
}

fn open_calendar(cfg: &Config) -> Result<Box<dyn CalendarService>> {
    let tz = parse_tz(&cfg.calendar.timezone)?;
    Ok(match cfg.calendar.backend {
        CalendarBackend::Ics => Box::new(IcsCalendar::new(cfg.ics_path()?, tz)),
        CalendarBackend::Gcalcli => Box::new(GcalcliCalendar::new(
            cfg.calendar.gcalcli_calendar.clone(),
            tz,
        )),
    })
}

fn open_app(cfg: &Config) -> Result<App<JsonFileKv, Box<dyn CalendarService>>> {
    let store = TaskStore::load(JsonFileKv::new(cfg.settings_path()?));
    let calendar = open_calendar(cfg)?;
    let suggester: Arc<dyn Suggester> = Arc::new(suggestion_client(cfg)?);
    Ok(App::new(store, calendar, suggester))
}
