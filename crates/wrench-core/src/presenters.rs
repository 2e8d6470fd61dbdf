//! Presenter schedule records.
//!
//! A presenter has a name, one or more weekly schedule blocks, a role set,
//! and a synthesis voice. Outbound payloads are validated before they are
//! sent; inbound listings are coerced leniently because the server is free
//! to omit or reshape fields.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Weekday display labels and wire codes, Monday first.
pub const DAYS: [(&str, &str); 7] = [
    ("Mon", "mon"),
    ("Tue", "tue"),
    ("Wed", "wed"),
    ("Thu", "thu"),
    ("Fri", "fri"),
    ("Sat", "sat"),
    ("Sun", "sun"),
];

/// Role display labels and wire codes.
pub const ROLES: [(&str, &str); 4] = [
    ("News", "news"),
    ("Music", "music"),
    ("Sports", "sports"),
    ("Emergency", "emergency"),
];

pub const VOICE_MODEL_DEFAULT: &str = "eleven_multilingual_v2";

/// Voice presets offered by default.
pub const VOICE_IDS: [&str; 1] = ["British Radio Presenter 1"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenterError {
    #[error("name is required")]
    MissingName,
    #[error("at least one schedule block is required")]
    EmptySchedule,
    #[error("a schedule block has no days selected")]
    BlockWithoutDays,
    #[error("invalid time '{0}' in a schedule block")]
    InvalidTime(String),
    #[error("each block must end after it starts")]
    EndNotAfterStart,
    #[error("at least one role is required")]
    EmptyRoles,
    #[error("voice id is required")]
    MissingVoiceId,
}

/// One on-air window: day codes plus a same-day `HH:MM` interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

impl ScheduleBlock {
    pub fn validate(&self) -> Result<(), PresenterError> {
        if !self.days.iter().any(|d| !d.trim().is_empty()) {
            return Err(PresenterError::BlockWithoutDays);
        }
        let start = parse_hhmm(&self.start)?;
        let end = parse_hhmm(&self.end)?;
        if start >= end {
            return Err(PresenterError::EndNotAfterStart);
        }
        Ok(())
    }

    /// "mon,tue 09:00-12:00" style summary for list views.
    pub fn summary(&self) -> String {
        format!("{} {}-{}", self.days.join(","), self.start.trim(), self.end.trim())
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, PresenterError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| PresenterError::InvalidTime(s.trim().to_string()))
}

/// Outbound payload for creating a presenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPresenter {
    pub name: String,
    pub schedule: Vec<ScheduleBlock>,
    pub roles: Vec<String>,
    pub voice_model: String,
    pub voice_id: String,
}

impl NewPresenter {
    /// Build a payload with the default voice model.
    pub fn new(
        name: impl Into<String>,
        schedule: Vec<ScheduleBlock>,
        roles: Vec<String>,
        voice_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schedule,
            roles,
            voice_model: VOICE_MODEL_DEFAULT.to_string(),
            voice_id: voice_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), PresenterError> {
        if self.name.trim().is_empty() {
            return Err(PresenterError::MissingName);
        }
        if self.schedule.is_empty() {
            return Err(PresenterError::EmptySchedule);
        }
        for block in &self.schedule {
            block.validate()?;
        }
        if self.roles.is_empty() {
            return Err(PresenterError::EmptyRoles);
        }
        if self.voice_id.trim().is_empty() {
            return Err(PresenterError::MissingVoiceId);
        }
        Ok(())
    }
}

/// Presenter record as reported by the server. Every field is optional on
/// the wire; display falls back to placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presenter {
    pub name: String,
    pub schedule: Vec<ScheduleBlock>,
    pub roles: Vec<String>,
    pub voice_id: String,
}

impl Presenter {
    /// One-line listing summary: name, schedule windows, roles, voice.
    pub fn summary(&self) -> String {
        let name = if self.name.is_empty() { "(unnamed)" } else { &self.name };
        let sched = self
            .schedule
            .iter()
            .map(|b| b.summary())
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "{} — {} — roles:{} — {}",
            name,
            sched,
            self.roles.join(","),
            self.voice_id
        )
    }

    fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let schedule = match obj.get("schedule") {
            Some(Value::Array(blocks)) => blocks.iter().filter_map(block_from_value).collect(),
            // A single block object is tolerated in place of a list.
            Some(block @ Value::Object(_)) => block_from_value(block).into_iter().collect(),
            _ => Vec::new(),
        };
        let roles = string_list(obj.get("roles"));
        let voice_id = obj
            .get("voice_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { name, schedule, roles, voice_id })
    }
}

fn block_from_value(v: &Value) -> Option<ScheduleBlock> {
    let obj = v.as_object()?;
    Some(ScheduleBlock {
        days: string_list(obj.get("days")),
        start: obj
            .get("start")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        end: obj
            .get("end")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
    })
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts the shapes presenter listings arrive in: a bare array, an object
/// with a `presenters` array, or an object keyed by id. Entries that are
/// not objects are dropped.
pub fn coerce_presenters_list(data: &Value) -> Vec<Presenter> {
    match data {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("presenters") {
                items.iter().filter_map(Presenter::from_value).collect()
            } else {
                map.values().filter_map(Presenter::from_value).collect()
            }
        }
        Value::Array(items) => items.iter().filter_map(Presenter::from_value).collect(),
        _ => Vec::new(),
    }
}
