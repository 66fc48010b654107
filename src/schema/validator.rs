use super::fields::{FieldKind, MOVIE_FIELDS};
use super::record::{CleanedRow, CleanedValue, MovieRecord};
use super::violation::{SchemaViolation, ViolationCause};
use std::collections::HashMap;

/// Validates a cleaned row against the canonical movie schema.
///
/// Validation is strict: the first failing field rejects the row. The validator never
/// logs or drops anything itself; the caller decides what a rejection means.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordValidator;

impl RecordValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate the given row, producing a typed [`MovieRecord`].
    pub fn validate(&self, row: &CleanedRow) -> Result<MovieRecord, SchemaViolation> {
        let mut fields = TypedFields::default();

        for spec in MOVIE_FIELDS.iter() {
            let value = row.value(spec.name);
            let missing = || SchemaViolation::new(&row.raw, spec.name, ViolationCause::MissingField);
            let wrong_shape = |expected| {
                SchemaViolation::new(&row.raw, spec.name, ViolationCause::WrongShape { expected })
            };

            match (spec.kind, value) {
                (FieldKind::Integer, None) | (FieldKind::Text, None) | (FieldKind::Number, None) => {
                    return Err(missing());
                }
                (FieldKind::Integer, Some(CleanedValue::Text(text))) => {
                    let parsed = text.trim().parse::<i64>().map_err(|e| {
                        SchemaViolation::new(&row.raw, spec.name, ViolationCause::InvalidInteger(e))
                    })?;
                    fields.integers.insert(spec.name, parsed);
                }
                (FieldKind::Text, Some(CleanedValue::Text(text))) => {
                    fields.text.insert(spec.name, Some(text.clone()));
                }
                (FieldKind::NullableText, Some(CleanedValue::Text(text))) => {
                    let text = if text.trim().is_empty() { None } else { Some(text.clone()) };
                    fields.text.insert(spec.name, text);
                }
                (FieldKind::NullableText, None) => {
                    fields.text.insert(spec.name, None);
                }
                (FieldKind::Number, Some(CleanedValue::Number(Some(number)))) => {
                    fields.numbers.insert(spec.name, Some(*number));
                }
                (FieldKind::Number, Some(CleanedValue::Number(None))) => {
                    return Err(missing());
                }
                (FieldKind::NullableNumber, Some(CleanedValue::Number(number))) => {
                    fields.numbers.insert(spec.name, *number);
                }
                (FieldKind::NullableNumber, None) => {
                    fields.numbers.insert(spec.name, None);
                }
                (FieldKind::List, Some(CleanedValue::List(items))) => {
                    fields.lists.insert(spec.name, items.clone());
                }
                (FieldKind::List, None) => {
                    fields.lists.insert(spec.name, Vec::new());
                }
                (FieldKind::Integer, Some(_)) => return Err(wrong_shape("integer")),
                (FieldKind::Text, Some(_)) | (FieldKind::NullableText, Some(_)) => {
                    return Err(wrong_shape("text"))
                }
                (FieldKind::Number, Some(_)) | (FieldKind::NullableNumber, Some(_)) => {
                    return Err(wrong_shape("numeric"))
                }
                (FieldKind::List, Some(_)) => return Err(wrong_shape("list")),
            }
        }

        Ok(fields.into_record())
    }
}

/// Typed values collected while walking the schema.
#[derive(Default)]
struct TypedFields {
    integers: HashMap<&'static str, i64>,
    text: HashMap<&'static str, Option<String>>,
    numbers: HashMap<&'static str, Option<f64>>,
    lists: HashMap<&'static str, Vec<String>>,
}

impl TypedFields {
    fn int(&mut self, name: &str) -> i64 {
        self.integers.remove(name).unwrap_or_default()
    }

    fn text(&mut self, name: &str) -> String {
        self.text.remove(name).flatten().unwrap_or_default()
    }

    fn opt_text(&mut self, name: &str) -> Option<String> {
        self.text.remove(name).flatten()
    }

    fn number(&mut self, name: &str) -> f64 {
        self.numbers.remove(name).flatten().unwrap_or_default()
    }

    fn opt_number(&mut self, name: &str) -> Option<f64> {
        self.numbers.remove(name).flatten()
    }

    fn list(&mut self, name: &str) -> Vec<String> {
        self.lists.remove(name).unwrap_or_default()
    }

    // Every schema field has been checked by the time this runs.
    fn into_record(mut self) -> MovieRecord {
        MovieRecord {
            id: self.int("id"),
            title: self.text("title"),
            vote_average: self.number("vote_average"),
            vote_count: self.number("vote_count"),
            status: self.text("status"),
            release_date: self.text("release_date"),
            revenue: self.number("revenue"),
            runtime: self.opt_number("runtime"),
            budget: self.opt_number("budget"),
            imdb_id: self.text("imdb_id"),
            original_language: self.text("original_language"),
            original_title: self.text("original_title"),
            overview: self.opt_text("overview"),
            popularity: self.number("popularity"),
            tagline: self.opt_text("tagline"),
            genres: self.list("genres"),
            production_companies: self.list("production_companies"),
            production_countries: self.list("production_countries"),
            spoken_languages: self.list("spoken_languages"),
            cast: self.list("cast"),
            director: self.text("director"),
            director_of_photography: self.opt_text("director_of_photography"),
            writers: self.list("writers"),
            producers: self.list("producers"),
            music_composer: self.opt_text("music_composer"),
            imdb_rating: self.number("imdb_rating"),
            imdb_votes: self.number("imdb_votes"),
            poster_path: self.opt_text("poster_path"),
        }
    }
}
