use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{Clock, DEFAULT_PUSH_ICON, SystemClock, clock::DEFAULT_UTC_OFFSET_HOURS};
use ::config::{Config, Environment, File};
use engine::{EngineOptions, LogPushGateway, MissedOccurrencePolicy, PushGateway, RelayPushGateway};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "finanza.toml";

/// Application settings.
///
/// Layered as: built-in defaults, then the optional config file, then
/// `FINANZA_*` environment variables (nested keys use `__`, e.g.
/// `FINANZA_SCHEDULER__UPDATE_FREQUENCY_SECS`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Fixed UTC offset used for every "today" comparison.
    pub timezone_offset_hours: i32,
    pub scheduler: SchedulerSettings,
    pub push: PushSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerSettings {
    /// How often the runner wakes up to look for due jobs.
    pub update_frequency_secs: u64,
    pub recurring_transactions_frequency_secs: u64,
    pub debt_notifications_frequency_secs: u64,
    pub missed_occurrences: MissedOccurrencePolicy,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PushSettings {
    /// Push relay endpoint. Without one, pushes are only logged.
    pub relay_url: Option<String>,
    pub icon: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://finanza.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            timezone_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            scheduler: SchedulerSettings::default(),
            push: PushSettings::default(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            update_frequency_secs: 30,
            recurring_transactions_frequency_secs: 120,
            debt_notifications_frequency_secs: 120,
            missed_occurrences: MissedOccurrencePolicy::Skip,
        }
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            relay_url: None,
            icon: DEFAULT_PUSH_ICON.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Loads settings from `config_file` (optional) and the environment.
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        let path = config_file.unwrap_or(DEFAULT_CONFIG_FILE);
        debug!("Loading settings from {} and FINANZA_* environment variables", path);

        let settings = Config::builder()
            .add_source(File::with_name(path).required(config_file.is_some()))
            .add_source(
                Environment::with_prefix("FINANZA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            missed_occurrences: self.scheduler.missed_occurrences,
            icon: self.push.icon.clone(),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock::with_offset_hours(self.timezone_offset_hours))
    }

    pub fn push_gateway(&self) -> Result<Arc<dyn PushGateway>> {
        match &self.push.relay_url {
            Some(url) => {
                info!("Delivering pushes through relay {}", url);
                let gateway =
                    RelayPushGateway::new(url.clone(), Duration::from_secs(self.push.timeout_secs))?;
                Ok(Arc::new(gateway))
            }
            None => {
                info!("No push relay configured, pushes will only be logged");
                Ok(Arc::new(LogPushGateway))
            }
        }
    }
}

/// Connects to the database and wires the engine dependencies.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    Ok(AppState {
        db,
        push: settings.push_gateway()?,
        clock: settings.clock(),
        options: settings.engine_options(),
    })
}
