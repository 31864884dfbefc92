use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{ensure_turtl_home, expand_home};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ai: AiSection,
    pub calendar: CalendarSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    /// Chat-completion API root; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Sent as `HTTP-Referer` / `X-Title` so the provider can attribute traffic.
    pub referer: String,
    pub app_title: String,

    /// Environment variable checked for the API key before ~/.turtl/auth.json.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarBackend {
    /// Append events to a local .ics file.
    Ics,
    /// Import each event through `gcalcli import`.
    Gcalcli,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    pub backend: CalendarBackend,
    pub ics_path: String,
    pub gcalcli_calendar: Option<String>,
    /// IANA timezone the local event times are interpreted in.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub settings_path: String,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "mistralai/mistral-7b-instruct:free".to_string(),
            temperature: 0.3,
            max_tokens: 150,
            referer: "TurtlApp (turtl.dev)".to_string(),
            app_title: "turtl.dev".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            backend: CalendarBackend::Ics,
            ics_path: "~/.turtl/calendar.ics".to_string(),
            gcalcli_calendar: None,
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            settings_path: "~/.turtl/settings.json".to_string(),
        }
    }
}

impl Config {
    pub fn settings_path(&self) -> Result<PathBuf> {
        expand_home(&self.storage.settings_path)
    }

    pub fn ics_path(&self) -> Result<PathBuf> {
        expand_home(&self.calendar.ics_path)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_turtl_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [ai]
            model = "openai/gpt-4o-mini"

            [calendar]
            backend = "gcalcli"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.ai.model, "openai/gpt-4o-mini");
        assert_eq!(cfg.ai.max_tokens, 150);
        assert_eq!(cfg.calendar.backend, CalendarBackend::Gcalcli);
        assert_eq!(cfg.calendar.timezone, "America/Chicago");
        assert_eq!(cfg.storage.settings_path, "~/.turtl/settings.json");
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.ai.base_url, "https://openrouter.ai/api/v1");
        assert!((back.ai.temperature - 0.3).abs() < f32::EPSILON);
    }
}
