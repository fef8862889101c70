use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Task priority. Declaration order gives `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Case-insensitive, so `high`, `High` and `HIGH` all parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!(
                "invalid priority: {} (expected High, Medium or Low)",
                s
            )),
        }
    }
}

/// Recurrence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
}

impl Repeat {
    pub fn as_str(self) -> &'static str {
        match self {
            Repeat::None => "None",
            Repeat::Daily => "Daily",
            Repeat::Weekly => "Weekly",
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Repeat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Repeat::None),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            _ => Err(format!(
                "invalid repeat: {} (expected None, Daily or Weekly)",
                s
            )),
        }
    }
}

/// A single schedulable task, as persisted in `tasks.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable ID like `T-007`. Empty only for legacy records before repair.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Older documents stored this as `time`
    #[serde(alias = "time")]
    pub duration_seconds: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub routine: bool,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Combined date and start time
    pub fn start_instant(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    /// Start instant plus duration
    pub fn end_instant(&self) -> NaiveDateTime {
        self.start_instant() + Duration::seconds(i64::from(self.duration_seconds))
    }

    /// Whether completing this task produces a successor
    pub fn recurs(&self) -> bool {
        self.routine || self.repeat != Repeat::None
    }
}

/// `HH:MM` on the wire; `HH:MM:SS` is accepted on input.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_start(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid start time: {}", raw))
        })
    }
}

/// Parse a start time in `HH:MM` or `HH:MM:SS` form
pub fn parse_start(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
