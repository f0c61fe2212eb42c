//! Loading activities, overrides and scheduler configuration from disk
//!
//! Activities and overrides may be JSON or TOML, chosen by file extension.
//! A JSON activity file is either a bare array or `{ "activities": [...] }`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sitecpm_core::{Activity, CompletionLedger, LedgerError, LedgerStore, Overrides};
use sitecpm_solver::SchedulerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => bail!(
            "unsupported file type '{}' (expected .json or .toml)",
            path.display()
        ),
    }
}

fn parse<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match format_of(path)? {
        Format::Json => serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display())),
        Format::Toml => toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display())),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityFile {
    Table { activities: Vec<Activity> },
    List(Vec<Activity>),
}

pub fn load_activities(path: &Path) -> Result<Vec<Activity>> {
    let file: ActivityFile = parse(path)?;
    let activities = match file {
        ActivityFile::Table { activities } | ActivityFile::List(activities) => activities,
    };
    tracing::debug!(count = activities.len(), path = %path.display(), "activities loaded");
    Ok(activities)
}

pub fn load_overrides(path: &Path) -> Result<Overrides> {
    parse(path)
}

/// Scheduler configuration from a TOML file, or defaults
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    let Some(path) = path else {
        return Ok(SchedulerConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Completion ledger persisted as a JSON object of id -> day
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for JsonFileLedgerStore {
    /// A missing file is an empty ledger
    fn load(&self) -> Result<CompletionLedger, LedgerError> {
        if !self.path.exists() {
            return Ok(CompletionLedger::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(CompletionLedger::new());
        }
        serde_json::from_str(&text).map_err(|e| LedgerError::Format(e.to_string()))
    }

    fn save(&mut self, ledger: &CompletionLedger) -> Result<(), LedgerError> {
        let text = serde_json::to_string_pretty(ledger).map_err(|e| LedgerError::Format(e.to_string()))?;
        fs::write(&self.path, text + "\n")?;
        Ok(())
    }
}

/// Parse `ID=VALUE`
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim().to_string(), value.trim().to_string())),
        _ => Err(format!("expected ID=VALUE, got '{}'", s)),
    }
}
