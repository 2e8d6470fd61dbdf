//! Genre catalog and identifier normalization.
//!
//! A genre is a `{id, label}` pair. The id is the canonical machine form
//! (lowercase ASCII, words joined by single underscores) and is derived from
//! the label unless the server supplies one explicitly. Server payloads
//! arrive in several shapes and are coerced best-effort; nothing in this
//! module returns an error.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Labels offered to the operator before the server has reported anything.
pub const DEFAULT_GENRE_LABELS: [&str; 29] = [
    "Rock", "Pop", "Jazz", "Classical", "Electronic", "Hip-Hop", "Country",
    "R&B", "Blues", "Folk", "Reggae", "Punk", "Metal", "Indie", "Alternative",
    "Funk", "Soul", "Gospel", "Latin", "World", "Ambient", "Techno", "House",
    "Trance", "Drum & Bass", "Dubstep", "Trap", "Lo-Fi", "Experimental",
];

/// A selectable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub label: String,
}

impl Genre {
    /// Build a genre whose id is derived from the label.
    pub fn from_label(label: &str) -> Self {
        Self {
            id: slugify(label),
            label: label.to_string(),
        }
    }
}

// ── slug generation ───────────────────────────────────────────────────────────

fn non_slug_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Derive the canonical machine id for a human label.
///
/// Pure and total: accents are transliterated toward ASCII (unencodable
/// characters dropped), `&`/`+` become the word `and`, and every run of
/// non-alphanumerics collapses to a single underscore. Empty input yields
/// an empty id.
pub fn slugify(label: &str) -> String {
    let ascii: String = label.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let spaced = lowered.trim().replace('&', " and ").replace('+', " and ");
    let joined = non_slug_runs().replace_all(&spaced, "_");
    let slug = joined.trim_matches('_');
    // Irregular ids: "R&B" must land on rnb, not the mechanical r_and_b.
    match slug {
        "r_b" => "rb".to_string(),
        "r_and_b" => "rnb".to_string(),
        _ => slug.to_string(),
    }
}

/// Best-effort inverse of [`slugify`], display use only. Lossy: it cannot
/// recover punctuation or casing that the slug dropped.
pub fn humanize_slug(id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    let spaced = id.replace('_', " ").replace(" and ", " & ");
    spaced
        .split(' ')
        .map(titlecase_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn titlecase_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ── label resolution ──────────────────────────────────────────────────────────

/// Where a display label may come from when the server sends a bare id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// The static default catalog.
    Catalog,
    /// An id→label mapping remembered from earlier payloads.
    Known,
    /// [`humanize_slug`] as the last resort.
    Humanize,
}

/// First-match-wins provider order used by [`resolve_label`].
pub const LABEL_FALLBACK_ORDER: [LabelSource; 3] = [
    LabelSource::Catalog,
    LabelSource::Known,
    LabelSource::Humanize,
];

fn catalog_by_id() -> &'static HashMap<String, &'static str> {
    static MAP: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        DEFAULT_GENRE_LABELS
            .iter()
            .map(|label| (slugify(label), *label))
            .collect()
    })
}

/// Label for `id` if it belongs to the default catalog.
pub fn catalog_label(id: &str) -> Option<&'static str> {
    catalog_by_id().get(id).copied()
}

/// The default catalog in display order.
pub fn default_catalog() -> Vec<Genre> {
    DEFAULT_GENRE_LABELS.iter().map(|l| Genre::from_label(l)).collect()
}

/// Resolve a display label for `id` through [`LABEL_FALLBACK_ORDER`].
pub fn resolve_label(id: &str, known: &HashMap<String, String>) -> String {
    for source in LABEL_FALLBACK_ORDER {
        let hit = match source {
            LabelSource::Catalog => catalog_label(id).map(str::to_string),
            LabelSource::Known => known.get(id).filter(|l| !l.is_empty()).cloned(),
            LabelSource::Humanize => Some(humanize_slug(id)),
        };
        if let Some(label) = hit {
            return label;
        }
    }
    String::new()
}

// ── payload coercion ──────────────────────────────────────────────────────────

/// Normalize a genres payload of unknown shape into an ordered genre list.
///
/// Accepted shapes: JSON text, whitespace/comma-separated bare ids, an
/// object treated as an ordered table, or an array of bare ids and/or
/// `{id, label}` records. Entries with an empty id are dropped; duplicate
/// ids are kept as-is. Malformed input degrades to a partial or empty list,
/// never to an error.
pub fn coerce_genres_from_payload(raw: &Value, known: &HashMap<String, String>) -> Vec<Genre> {
    let mut out = Vec::new();
    for item in flatten_payload(raw) {
        match item {
            Value::String(s) => {
                let id = s.trim();
                if id.is_empty() {
                    continue;
                }
                out.push(Genre {
                    id: id.to_string(),
                    label: resolve_label(id, known),
                });
            }
            Value::Object(obj) => {
                let explicit_id = obj
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                let label_field = obj
                    .get("label")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                let id = match explicit_id {
                    Some(id) => id.to_string(),
                    None => slugify(label_field.unwrap_or_default()),
                };
                if id.is_empty() {
                    continue;
                }
                let label = match label_field {
                    Some(label) => label.to_string(),
                    None => resolve_label(&id, known),
                };
                out.push(Genre { id, label });
            }
            // Wrong element type: drop rather than fail.
            _ => {}
        }
    }
    out
}

/// Resolve the payload's outer shape into a flat element list.
fn flatten_payload(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Null => Vec::new(),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('[') || s.starts_with('{') {
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    return flatten_payload(&parsed);
                }
            }
            split_tokens(s)
        }
        Value::Object(map) => ordered_values(map),
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

/// Split free text on runs of whitespace and commas into bare-id tokens.
fn split_tokens(s: &str) -> Vec<Value> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| Value::String(t.to_string()))
        .collect()
}

/// An object payload is an ordered table when every key is an integer;
/// otherwise values are taken in the map's own order.
fn ordered_values(map: &serde_json::Map<String, Value>) -> Vec<Value> {
    let mut keyed: Vec<(i64, &Value)> = Vec::with_capacity(map.len());
    for (k, v) in map {
        match k.trim().parse::<i64>() {
            Ok(n) => keyed.push((n, v)),
            Err(_) => return map.values().cloned().collect(),
        }
    }
    keyed.sort_by_key(|(n, _)| *n);
    keyed.into_iter().map(|(_, v)| v.clone()).collect()
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn no_known() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Rock"), "rock");
        assert_eq!(slugify("Hip-Hop"), "hip_hop");
        assert_eq!(slugify("  Lo-Fi  "), "lo_fi");
        assert_eq!(slugify("Drum & Bass"), "drum_and_bass");
    }

    #[test]
    fn test_slugify_rnb_special_cases() {
        assert_eq!(slugify("R&B"), "rnb");
        assert_eq!(slugify("R & B"), "rnb");
        assert_eq!(slugify("R B"), "rb");
        assert_eq!(slugify("R + B"), "rnb");
    }

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("Señor Coconut"), "senor_coconut");
        // Characters with no ASCII decomposition are dropped, not substituted.
        assert_eq!(slugify("日本 Pop"), "pop");
    }

    #[test]
    fn test_slugify_total() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify("&&&"), "and_and_and");
    }

    #[test]
    fn test_slugify_idempotent_on_own_output() {
        for label in DEFAULT_GENRE_LABELS {
            let once = slugify(label);
            assert_eq!(slugify(&once), once, "not idempotent for {label:?}");
        }
    }

    #[test]
    fn test_catalog_ids_pairwise_distinct() {
        let ids: HashSet<String> = DEFAULT_GENRE_LABELS.iter().map(|l| slugify(l)).collect();
        assert_eq!(ids.len(), DEFAULT_GENRE_LABELS.len());
    }

    #[test]
    fn test_humanize_slug() {
        assert_eq!(humanize_slug("lo_fi"), "Lo Fi");
        assert_eq!(humanize_slug("drum_and_bass"), "Drum & Bass");
        assert_eq!(humanize_slug(""), "");
    }

    #[test]
    fn test_resolve_label_order() {
        assert_eq!(LABEL_FALLBACK_ORDER[0], LabelSource::Catalog);
        assert_eq!(LABEL_FALLBACK_ORDER[2], LabelSource::Humanize);

        // Catalog wins over a known mapping for the same id.
        let mut known = HashMap::new();
        known.insert("jazz".to_string(), "Totally Not Jazz".to_string());
        assert_eq!(resolve_label("jazz", &known), "Jazz");

        // Known mapping wins over humanize for an unknown id.
        known.insert("late_night".to_string(), "Late Night Mix".to_string());
        assert_eq!(resolve_label("late_night", &known), "Late Night Mix");

        // Humanize is the last resort.
        assert_eq!(resolve_label("deep_cuts", &known), "Deep Cuts");
    }

    #[test]
    fn test_coerce_bare_id_list() {
        let genres = coerce_genres_from_payload(&json!(["ambient", "techno"]), &no_known());
        assert_eq!(
            genres,
            vec![
                Genre { id: "ambient".into(), label: "Ambient".into() },
                Genre { id: "techno".into(), label: "Techno".into() },
            ]
        );
    }

    #[test]
    fn test_coerce_json_text_and_bare_token() {
        let from_json = coerce_genres_from_payload(&json!(r#"["jazz"]"#), &no_known());
        let from_token = coerce_genres_from_payload(&json!("jazz"), &no_known());
        let expected = vec![Genre { id: "jazz".into(), label: "Jazz".into() }];
        assert_eq!(from_json, expected);
        assert_eq!(from_token, expected);
    }

    #[test]
    fn test_coerce_token_splitting() {
        let genres = coerce_genres_from_payload(&json!("jazz, techno  house"), &no_known());
        let ids: Vec<&str> = genres.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["jazz", "techno", "house"]);
    }

    #[test]
    fn test_coerce_unparsable_bracket_text_falls_back_to_tokens() {
        let genres = coerce_genres_from_payload(&json!("[not json"), &no_known());
        let ids: Vec<&str> = genres.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["[not", "json"]);
    }

    #[test]
    fn test_coerce_empty_inputs() {
        assert!(coerce_genres_from_payload(&Value::Null, &no_known()).is_empty());
        assert!(coerce_genres_from_payload(&json!([]), &no_known()).is_empty());
        assert!(coerce_genres_from_payload(&json!(""), &no_known()).is_empty());
        assert!(coerce_genres_from_payload(&json!(42), &no_known()).is_empty());
    }

    #[test]
    fn test_coerce_label_only_record() {
        let genres =
            coerce_genres_from_payload(&json!([{ "label": "Custom Wave" }]), &no_known());
        assert_eq!(
            genres,
            vec![Genre { id: "custom_wave".into(), label: "Custom Wave".into() }]
        );
    }

    #[test]
    fn test_coerce_record_with_id_only_resolves_label() {
        let genres = coerce_genres_from_payload(&json!([{ "id": "trance" }]), &no_known());
        assert_eq!(genres[0].label, "Trance");

        let genres = coerce_genres_from_payload(&json!([{ "id": "night_shift" }]), &no_known());
        assert_eq!(genres[0].label, "Night Shift");
    }

    #[test]
    fn test_coerce_drops_empty_and_wrong_typed_entries() {
        let payload = json!(["", "  ", 7, null, { "label": "" }, { "id": "  " }, "dub"]);
        let genres = coerce_genres_from_payload(&payload, &no_known());
        let ids: Vec<&str> = genres.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["dub"]);
    }

    #[test]
    fn test_coerce_integer_keyed_mapping_is_ordered() {
        let payload = json!({ "2": "house", "10": "trance", "1": "jazz" });
        let genres = coerce_genres_from_payload(&payload, &no_known());
        let ids: Vec<&str> = genres.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["jazz", "house", "trance"]);
    }

    #[test]
    fn test_coerce_non_integer_keyed_mapping_takes_values() {
        let payload = json!({ "a": "jazz", "b": { "label": "Custom Wave" } });
        let genres = coerce_genres_from_payload(&payload, &no_known());
        let ids: HashSet<&str> = genres.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["jazz", "custom_wave"]));
    }

    // Repeated ids from the server are kept as-is; dedup is a front-end
    // concern for manual edit grids only.
    #[test]
    fn test_coerce_keeps_duplicate_ids() {
        let genres = coerce_genres_from_payload(&json!(["jazz", "jazz", "jazz"]), &no_known());
        assert_eq!(genres.len(), 3);
        assert!(genres.iter().all(|g| g.id == "jazz"));
    }

    #[test]
    fn test_coerce_uses_known_mapping_for_unknown_ids() {
        let mut known = HashMap::new();
        known.insert("late_night".to_string(), "Late Night Mix".to_string());
        let genres = coerce_genres_from_payload(&json!(["late_night"]), &known);
        assert_eq!(genres[0].label, "Late Night Mix");
    }
}
