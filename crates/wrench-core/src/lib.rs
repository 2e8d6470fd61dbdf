//! Core data model for the Rex Radio configuration tool: the genre catalog
//! with identifier normalization, the station settings aggregate, and
//! presenter schedule records.

pub mod genres;
pub mod presenters;
pub mod settings;

pub use genres::{coerce_genres_from_payload, humanize_slug, slugify, Genre};
pub use settings::StationSettings;
