//! Canonical field list for one movie row.
//!
//! The order of [`MOVIE_FIELDS`] is the declared schema order and doubles as the
//! header row of every decade artifact.

use serde::{Deserialize, Serialize};

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Required integer (only `id`)
    Integer,
    /// Required string; blank is accepted as an empty string
    Text,
    /// Optional string; blank resolves to `null`
    NullableText,
    /// Required float; blank or unparseable resolves to `0.0`
    Number,
    /// Optional float; blank resolves to `null`, never `0.0`
    NullableNumber,
    /// Comma-delimited list of strings; blank resolves to an empty list
    List,
}

impl FieldKind {
    /// Whether an absent column is a schema violation for this kind
    pub fn is_required(self) -> bool {
        matches!(self, Self::Integer | Self::Text | Self::Number)
    }
}

/// A named, typed schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Every field of a movie row, in declared order.
pub const MOVIE_FIELDS: [FieldSpec; 28] = [
    field("id", FieldKind::Integer),
    field("title", FieldKind::Text),
    field("vote_average", FieldKind::Number),
    field("vote_count", FieldKind::Number),
    field("status", FieldKind::Text),
    field("release_date", FieldKind::Text),
    field("revenue", FieldKind::Number),
    field("runtime", FieldKind::NullableNumber),
    field("budget", FieldKind::NullableNumber),
    field("imdb_id", FieldKind::Text),
    field("original_language", FieldKind::Text),
    field("original_title", FieldKind::Text),
    field("overview", FieldKind::NullableText),
    field("popularity", FieldKind::Number),
    field("tagline", FieldKind::NullableText),
    field("genres", FieldKind::List),
    field("production_companies", FieldKind::List),
    field("production_countries", FieldKind::List),
    field("spoken_languages", FieldKind::List),
    field("cast", FieldKind::List),
    field("director", FieldKind::Text),
    field("director_of_photography", FieldKind::NullableText),
    field("writers", FieldKind::List),
    field("producers", FieldKind::List),
    field("music_composer", FieldKind::NullableText),
    field("imdb_rating", FieldKind::Number),
    field("imdb_votes", FieldKind::Number),
    field("poster_path", FieldKind::NullableText),
];

/// Field names in declared order (the artifact header).
pub fn field_names() -> impl Iterator<Item = &'static str> {
    MOVIE_FIELDS.iter().map(|spec| spec.name)
}

/// Look up a field by name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    MOVIE_FIELDS.iter().find(|spec| spec.name == name)
}
