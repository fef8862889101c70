use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::task::Priority;

/// Configuration from `.cadence/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// What `add` does when a one-off task reuses an existing name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Overwrite the existing task's fields, keeping its ID
    #[default]
    Merge,
    /// Drop the new task
    Reject,
    /// Add the new task alongside the existing one
    Keep,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(DuplicatePolicy::Merge),
            "reject" => Ok(DuplicatePolicy::Reject),
            "keep" => Ok(DuplicatePolicy::Keep),
            _ => Err(format!(
                "invalid duplicate policy: {} (expected merge, reject or keep)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    #[serde(default)]
    pub default_priority: Priority,
}

impl Default for TasksConfig {
    fn default() -> Self {
        TasksConfig {
            id_prefix: default_id_prefix(),
            on_duplicate: DuplicatePolicy::default(),
            default_priority: Priority::default(),
        }
    }
}

fn default_id_prefix() -> String {
    "T".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Countdown refresh interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_tick_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Color overrides keyed by theme slot (`high`, `medium`, `low`,
    /// `highlight`, ...), as `#RRGGBB`.
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tasks.id_prefix, "T");
        assert_eq!(config.tasks.on_duplicate, DuplicatePolicy::Merge);
        assert_eq!(config.watch.tick_ms, 1000);
    }

    #[test]
    fn duplicate_policy_parses_any_case() {
        assert_eq!("Merge".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Merge));
        assert_eq!("REJECT".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Reject));
        assert_eq!("keep".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Keep));
        assert!("sometimes".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn partial_sections() {
        let config: Config = toml::from_str(
            r##"
[tasks]
on_duplicate = "reject"
default_priority = "High"

[ui.colors]
high = "#FF0000"
"##,
        )
        .unwrap();
        assert_eq!(config.tasks.id_prefix, "T");
        assert_eq!(config.tasks.on_duplicate, DuplicatePolicy::Reject);
        assert_eq!(config.tasks.default_priority, Priority::High);
        assert_eq!(config.ui.colors.get("high").unwrap(), "#FF0000");
    }
}
