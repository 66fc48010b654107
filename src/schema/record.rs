use super::fields::MOVIE_FIELDS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One source row as read from a CSV file, before cleaning.
///
/// `ordinal` is the 1-based position of the row among the data rows of its source
/// (the header is not counted). Fields keep source column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub ordinal: usize,
    pub fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(ordinal: usize, fields: Vec<(String, String)>) -> Self {
        Self { ordinal, fields }
    }

    /// Build a row from a header and the values of one record. Surplus values without a
    /// header are dropped; missing trailing values leave the column absent.
    pub fn from_header<'a, H, V>(ordinal: usize, header: H, values: V) -> Self
    where
        H: IntoIterator<Item = &'a str>,
        V: IntoIterator<Item = &'a str>,
    {
        let fields = header
            .into_iter()
            .zip(values)
            .map(|(name, value)| (name.trim().to_string(), value.to_string()))
            .collect();
        Self { ordinal, fields }
    }

    /// Raw value of a column, if the column is present in this row
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Title for log messages; falls back to the ordinal when absent
    pub fn display_title(&self) -> String {
        match self.get("title") {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => format!("<row {}>", self.ordinal),
        }
    }
}

/// A validated movie row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub vote_average: f64,
    pub vote_count: f64,
    pub status: String,
    pub release_date: String,
    pub revenue: f64,
    pub runtime: Option<f64>,
    pub budget: Option<f64>,
    pub imdb_id: String,
    pub original_language: String,
    pub original_title: String,
    pub overview: Option<String>,
    pub popularity: f64,
    pub tagline: Option<String>,
    pub genres: Vec<String>,
    pub production_companies: Vec<String>,
    pub production_countries: Vec<String>,
    pub spoken_languages: Vec<String>,
    pub cast: Vec<String>,
    pub director: String,
    pub director_of_photography: Option<String>,
    pub writers: Vec<String>,
    pub producers: Vec<String>,
    pub music_composer: Option<String>,
    pub imdb_rating: f64,
    pub imdb_votes: f64,
    pub poster_path: Option<String>,
}

impl MovieRecord {
    /// Serialize to artifact cells in declared field order.
    ///
    /// `null` becomes an empty cell and lists are joined with `,`. Elements never
    /// contain commas because they were produced by splitting on commas.
    pub fn to_artifact_row(&self) -> Vec<String> {
        MOVIE_FIELDS
            .iter()
            .map(|spec| self.cell(spec.name))
            .collect()
    }

    fn cell(&self, name: &str) -> String {
        fn opt_num(value: Option<f64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        fn opt_text(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        match name {
            "id" => self.id.to_string(),
            "title" => self.title.clone(),
            "vote_average" => self.vote_average.to_string(),
            "vote_count" => self.vote_count.to_string(),
            "status" => self.status.clone(),
            "release_date" => self.release_date.clone(),
            "revenue" => self.revenue.to_string(),
            "runtime" => opt_num(self.runtime),
            "budget" => opt_num(self.budget),
            "imdb_id" => self.imdb_id.clone(),
            "original_language" => self.original_language.clone(),
            "original_title" => self.original_title.clone(),
            "overview" => opt_text(&self.overview),
            "popularity" => self.popularity.to_string(),
            "tagline" => opt_text(&self.tagline),
            "genres" => self.genres.join(","),
            "production_companies" => self.production_companies.join(","),
            "production_countries" => self.production_countries.join(","),
            "spoken_languages" => self.spoken_languages.join(","),
            "cast" => self.cast.join(","),
            "director" => self.director.clone(),
            "director_of_photography" => opt_text(&self.director_of_photography),
            "writers" => self.writers.join(","),
            "producers" => self.producers.join(","),
            "music_composer" => opt_text(&self.music_composer),
            "imdb_rating" => self.imdb_rating.to_string(),
            "imdb_votes" => self.imdb_votes.to_string(),
            "poster_path" => opt_text(&self.poster_path),
            _ => String::new(),
        }
    }

    /// The release year if the first four characters of `release_date` are all digits.
    pub fn release_year(&self) -> Option<i32> {
        release_year_prefix(&self.release_date)
    }
}

/// Parse the leading four characters of a date string as a year.
///
/// Returns `None` when the string is shorter than four characters or any of them is
/// not an ASCII digit.
pub fn release_year_prefix(release_date: &str) -> Option<i32> {
    let prefix: String = release_date.chars().take(4).collect();
    if prefix.chars().count() != 4 || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// A field value after cleaning and before typed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanedValue {
    Text(String),
    Number(Option<f64>),
    List(Vec<String>),
}

/// A row whose numeric and list columns have been normalized.
///
/// Columns absent from the source stay absent; the validator decides whether that is
/// acceptable for each field.
#[derive(Debug, Clone)]
pub struct CleanedRow {
    pub raw: RawRow,
    pub values: HashMap<String, CleanedValue>,
}

impl CleanedRow {
    pub fn ordinal(&self) -> usize {
        self.raw.ordinal
    }

    pub fn value(&self, name: &str) -> Option<&CleanedValue> {
        self.values.get(name)
    }
}
