//! Signed HTTP client for the station configuration endpoints.
//!
//! Every call is synchronous request/response from the caller's point of
//! view: it resolves within the fixed timeout or surfaces a failure. No
//! retries, no queuing.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use wrench_core::genres::coerce_genres_from_payload;
use wrench_core::presenters::{coerce_presenters_list, NewPresenter, Presenter};
use wrench_core::settings::{
    extract_field_value, StationSettings, FIELD_DESCRIPTION, FIELD_GENRES, FIELD_NAME,
};

use crate::error::{ApiError, Result};
use crate::sign::{auth_headers, AuthHeaders, HEADER_SIGNATURE, HEADER_TIMESTAMP};

/// Fallback endpoint when neither the caller nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Environment override for the API endpoint.
pub const BASE_URL_ENV: &str = "REX_API_BASE_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Path-segment encoding: keep unreserved characters and `/`, escape the rest.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Outcome of a write call. Always well-formed: a transport failure surfaces
/// as `ok == false` with status 0 and the error text in `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub ok: bool,
    /// HTTP status, or 0 if no response was ever received.
    pub status: u16,
    /// Response body, decoded permissively.
    pub body: String,
}

/// Minimal HTTP client for config endpoints with HMAC auth.
///
/// The signing key is held in memory only and never logged.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    hmac_key: String,
}

impl ApiClient {
    /// Base URL resolution order: explicit argument, then `REX_API_BASE_URL`,
    /// then [`DEFAULT_BASE_URL`]. Trailing slashes are trimmed.
    pub fn new(hmac_key: impl Into<String>, base_url: Option<&str>) -> Result<Self> {
        Self::with_timeout(hmac_key, base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        hmac_key: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let resolved = base_url
            .map(str::to_string)
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = resolved.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, hmac_key: hmac_key.into() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn signed(&self, req: reqwest::RequestBuilder, auth: &AuthHeaders) -> reqwest::RequestBuilder {
        req.header(HEADER_SIGNATURE, &auth.signature)
            .header(HEADER_TIMESTAMP, &auth.timestamp)
            .header(CONTENT_TYPE, "application/json")
    }

    // ── config endpoints ──────────────────────────────────────────────────────

    /// GET `/config/{field}`.
    ///
    /// A 400 means the field is simply not set yet and maps to
    /// `{"field": field, "value": ""}`; any other failure is an error.
    /// An empty 2xx body decodes to an empty object.
    pub async fn get_config_field(&self, field: &str) -> Result<Value> {
        let path = config_field_path(field);
        let url = format!("{}{}", self.base_url, path);
        let auth = auth_headers("GET", &path, "", &self.hmac_key);
        debug!(url = %url, "GET config field");
        let resp = self.signed(self.http.get(&url), &auth).send().await?;
        let status = resp.status();
        if status.is_success() {
            let text = resp.text().await?;
            if text.is_empty() {
                return Ok(json!({}));
            }
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
        } else if status == reqwest::StatusCode::BAD_REQUEST {
            debug!(field = %field, "field not set on server");
            Ok(json!({ "field": field, "value": "" }))
        } else {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = %status, field = %field, "config field read failed");
            Err(ApiError::Status { status: status.as_u16(), message })
        }
    }

    /// PATCH `/config` with `[{"field", "value"}, ...]` in the given order.
    /// Never fails; see [`WriteOutcome`].
    pub async fn patch_config_bulk(&self, updates: &[(String, Value)]) -> WriteOutcome {
        let Some(body) = encode_updates(updates) else {
            return WriteOutcome {
                ok: false,
                status: 0,
                body: "unserializable update payload".to_string(),
            };
        };
        self.send_write(reqwest::Method::PATCH, "/config", body).await
    }

    /// Load name, description, and genres with one field read each.
    ///
    /// Loose response shapes are tolerated; a missing or mistyped field
    /// falls back to the corresponding value in `defaults`. Any hard field
    /// failure aborts the whole load.
    pub async fn load_station(&self, defaults: &StationSettings) -> Result<StationSettings> {
        let name_resp = self.get_config_field(FIELD_NAME).await?;
        let desc_resp = self.get_config_field(FIELD_DESCRIPTION).await?;
        let genres_resp = self.get_config_field(FIELD_GENRES).await?;

        let name = extract_field_value(&name_resp)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| defaults.name.clone());
        let description = extract_field_value(&desc_resp)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| defaults.description.clone());
        let known = defaults.known_labels();
        let genres = extract_field_value(&genres_resp)
            .map(|raw| coerce_genres_from_payload(raw, &known))
            .unwrap_or_default();
        debug!(genres = genres.len(), "station information loaded");
        Ok(StationSettings { name, description, genres })
    }

    /// Persist the aggregate with one bulk patch; genres are sent as ids.
    pub async fn save_station(&self, settings: &StationSettings) -> WriteOutcome {
        let updates = vec![
            (FIELD_NAME.to_string(), Value::String(settings.name.clone())),
            (FIELD_DESCRIPTION.to_string(), Value::String(settings.description.clone())),
            (FIELD_GENRES.to_string(), json!(settings.genre_ids())),
        ];
        self.patch_config_bulk(&updates).await
    }

    // ── presenter endpoints ───────────────────────────────────────────────────

    /// GET `/presenters`. No 400 synthesis here; that rule is config-only.
    pub async fn get_presenters(&self) -> Result<Vec<Presenter>> {
        let path = "/presenters";
        let url = format!("{}{}", self.base_url, path);
        let auth = auth_headers("GET", path, "", &self.hmac_key);
        debug!(url = %url, "GET presenters");
        let resp = self.signed(self.http.get(&url), &auth).send().await?;
        let status = resp.status();
        if status.is_success() {
            let text = resp.text().await?;
            let value: Value = if text.is_empty() {
                json!({})
            } else {
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?
            };
            Ok(coerce_presenters_list(&value))
        } else {
            let message = resp.text().await.unwrap_or_default();
            warn!(status = %status, "presenter listing failed");
            Err(ApiError::Status { status: status.as_u16(), message })
        }
    }

    /// POST `/presenters`. Callers validate the payload first; the wire
    /// outcome is reported the same never-failing way as the bulk patch.
    pub async fn create_presenter(&self, presenter: &NewPresenter) -> WriteOutcome {
        let Ok(body) = serde_json::to_string(presenter) else {
            return WriteOutcome {
                ok: false,
                status: 0,
                body: "unserializable presenter payload".to_string(),
            };
        };
        self.send_write(reqwest::Method::POST, "/presenters", body).await
    }

    // ── internals ─────────────────────────────────────────────────────────────

    async fn send_write(&self, method: reqwest::Method, path: &str, body: String) -> WriteOutcome {
        let url = format!("{}{}", self.base_url, path);
        let auth = auth_headers(method.as_str(), path, &body, &self.hmac_key);
        debug!(url = %url, method = %method, bytes = body.len(), "signed write");
        let req = self.signed(self.http.request(method, &url), &auth).body(body);
        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                WriteOutcome {
                    ok: status.is_success(),
                    status: status.as_u16(),
                    body: text,
                }
            }
            Err(e) => {
                warn!(error = %e, "write failed before a response arrived");
                WriteOutcome { ok: false, status: 0, body: e.to_string() }
            }
        }
    }
}

fn config_field_path(field: &str) -> String {
    format!("/config/{}", utf8_percent_encode(field, PATH_SEGMENT))
}

#[derive(Serialize)]
struct UpdateEntry<'a> {
    field: &'a str,
    value: &'a Value,
}

/// Compact-serialize update pairs in order. Values that refuse to serialize
/// are retried as plain text (null becomes the empty string); a second
/// refusal yields `None` and the caller reports a transport-shaped failure.
fn encode_updates(updates: &[(String, Value)]) -> Option<String> {
    let entries: Vec<UpdateEntry> = updates
        .iter()
        .map(|(f, v)| UpdateEntry { field: f, value: v })
        .collect();
    match serde_json::to_string(&entries) {
        Ok(body) => Some(body),
        Err(_) => {
            let coerced: Vec<Value> = updates
                .iter()
                .map(|(f, v)| json!({ "field": f, "value": stringify_value(v) }))
                .collect();
            serde_json::to_string(&coerced).ok()
        }
    }
}

fn stringify_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
