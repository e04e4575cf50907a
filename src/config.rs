//! Runtime configuration: environment variables plus the countdown duration table.

use crate::models::{EventId, MatchType};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_QUALIFIER_SECS: u32 = 600;
pub const DEFAULT_ELIMINATION_SECS: u32 = 900;

/// Per-event overrides. Unset fields fall through to the table-wide defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventDurations {
    #[serde(default)]
    pub qualifier_secs: Option<u32>,
    #[serde(default)]
    pub elimination_secs: Option<u32>,
    #[serde(default)]
    pub by_type: HashMap<MatchType, u32>,
}

/// Default countdown per (event, match type).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DurationTable {
    #[serde(default = "default_qualifier_secs")]
    pub qualifier_secs: u32,
    #[serde(default = "default_elimination_secs")]
    pub elimination_secs: u32,
    #[serde(default)]
    pub events: HashMap<EventId, EventDurations>,
}

fn default_qualifier_secs() -> u32 {
    DEFAULT_QUALIFIER_SECS
}

fn default_elimination_secs() -> u32 {
    DEFAULT_ELIMINATION_SECS
}

impl Default for DurationTable {
    fn default() -> Self {
        Self {
            qualifier_secs: DEFAULT_QUALIFIER_SECS,
            elimination_secs: DEFAULT_ELIMINATION_SECS,
            events: HashMap::new(),
        }
    }
}

impl DurationTable {
    pub fn with_event(mut self, event_id: impl Into<EventId>, durations: EventDurations) -> Self {
        self.events.insert(event_id.into(), durations);
        self
    }

    /// Countdown in seconds for a match of `match_type` in `event_id`.
    pub fn lookup(&self, event_id: &str, match_type: MatchType) -> u32 {
        let pool_tier = match_type.is_pool_tier();
        if let Some(ev) = self.events.get(event_id) {
            if let Some(secs) = ev.by_type.get(&match_type) {
                return *secs;
            }
            let tier = if pool_tier {
                ev.qualifier_secs
            } else {
                ev.elimination_secs
            };
            if let Some(secs) = tier {
                return secs;
            }
        }
        if pool_tier {
            self.qualifier_secs
        } else {
            self.elimination_secs
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Server settings read from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub seed_file: Option<PathBuf>,
    pub durations_file: Option<PathBuf>,
    pub score_debounce: Duration,
    /// At least 64 bytes when set; a random key is used otherwise.
    pub session_key: Option<String>,
    pub session_idle: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

const DEFAULT_DEBOUNCE_MS: u64 = 400;
const DEFAULT_SESSION_IDLE_HOURS: u64 = 12;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed_file: None,
            durations_file: None,
            score_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            session_key: None,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_HOURS * 3600),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, or a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parsed(&get, "PORT").unwrap_or(defaults.port),
            seed_file: get("SEED_FILE").map(PathBuf::from),
            durations_file: get("CLOCK_DURATIONS").map(PathBuf::from),
            score_debounce: parsed(&get, "SCORE_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.score_debounce),
            session_key: get("SESSION_KEY"),
            session_idle: parsed(&get, "SESSION_IDLE_HOURS")
                .and_then(|h: u64| match h.checked_mul(3600) {
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => {
                        warn!("Ignoring SESSION_IDLE_HOURS={h}: too large");
                        None
                    }
                })
                .unwrap_or(defaults.session_idle),
        }
    }

    /// The duration table from `CLOCK_DURATIONS`, or the built-in defaults.
    pub fn duration_table(&self) -> DurationTable {
        match &self.durations_file {
            Some(path) => DurationTable::from_json_file(path).unwrap_or_else(|e| {
                warn!("{e}; using default countdown durations");
                DurationTable::default()
            }),
            None => DurationTable::default(),
        }
    }
}

fn parsed<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_type_then_event_tier_then_default() {
        let mut by_type = HashMap::new();
        by_type.insert(MatchType::Final, 1500);
        let table = DurationTable::default().with_event(
            "vb",
            EventDurations {
                qualifier_secs: Some(720),
                elimination_secs: None,
                by_type,
            },
        );
        assert_eq!(table.lookup("vb", MatchType::Final), 1500);
        assert_eq!(table.lookup("vb", MatchType::Qualifier), 720);
        assert_eq!(table.lookup("vb", MatchType::Semifinal), DEFAULT_ELIMINATION_SECS);
        assert_eq!(table.lookup("bb", MatchType::Qualifier), DEFAULT_QUALIFIER_SECS);
    }

    #[test]
    fn bad_env_values_fall_back() {
        let cfg = AppConfig::from_lookup(|k| match k {
            "PORT" => Some("not-a-port".into()),
            "SCORE_DEBOUNCE_MS" => Some("250".into()),
            _ => None,
        });
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.score_debounce, Duration::from_millis(250));
        assert_eq!(cfg.host, "0.0.0.0");
    }

    #[test]
    fn oversized_idle_hours_fall_back() {
        let cfg = AppConfig::from_lookup(|k| match k {
            "SESSION_IDLE_HOURS" => Some(u64::MAX.to_string()),
            _ => None,
        });
        assert_eq!(cfg.session_idle, AppConfig::default().session_idle);

        let cfg = AppConfig::from_lookup(|k| (k == "SESSION_IDLE_HOURS").then(|| "2".to_string()));
        assert_eq!(cfg.session_idle, Duration::from_secs(7200));
    }

    #[test]
    fn duration_table_parses_partial_json() {
        let t: DurationTable =
            serde_json::from_str(r#"{ "events": { "vb": { "elimination_secs": 1200 } } }"#)
                .unwrap();
        assert_eq!(t.qualifier_secs, DEFAULT_QUALIFIER_SECS);
        assert_eq!(t.lookup("vb", MatchType::Semifinal), 1200);
    }
}
