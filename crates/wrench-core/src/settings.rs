//! Station settings aggregate.
//!
//! One `StationSettings` is owned by the front end and passed by reference
//! to whatever needs to read or mutate it; there is no process-wide
//! singleton. The server remains the source of truth, so nothing here is
//! persisted locally.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::genres::{coerce_genres_from_payload, default_catalog, Genre};

/// Config field names round-tripped to the server.
pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_GENRES: &str = "genres";

/// Station metadata as edited by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSettings {
    pub name: String,
    pub description: String,
    /// Insertion order is display order.
    pub genres: Vec<Genre>,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            name: "Rex Radio Wrench".to_string(),
            description: "Utility to manage and authorize Rex Radio services from the desktop."
                .to_string(),
            genres: default_catalog(),
        }
    }
}

impl StationSettings {
    /// id→label pairs this aggregate currently knows about.
    pub fn known_labels(&self) -> HashMap<String, String> {
        self.genres
            .iter()
            .map(|g| (g.id.clone(), g.label.clone()))
            .collect()
    }

    /// Selected genre ids in display order.
    pub fn genre_ids(&self) -> Vec<String> {
        self.genres.iter().map(|g| g.id.clone()).collect()
    }

    /// Replace the genre list from a server payload, best-effort. Labels
    /// already known to this aggregate survive a bare-id payload.
    pub fn apply_genres_payload(&mut self, raw: &Value) {
        let known = self.known_labels();
        self.genres = coerce_genres_from_payload(raw, &known);
    }
}

/// Pull the value out of a loosely shaped field response.
///
/// Servers reply with `{"value": ...}`, with the field name itself as the
/// key, or with the bare value. `None` means the caller's default applies.
pub fn extract_field_value(resp: &Value) -> Option<&Value> {
    match resp {
        Value::Object(map) => map.get("value").or_else(|| {
            [FIELD_NAME, FIELD_DESCRIPTION, FIELD_GENRES]
                .iter()
                .find_map(|k| map.get(*k))
        }),
        Value::Null => None,
        other => Some(other),
    }
}
