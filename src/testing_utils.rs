//! Shared fixtures for unit tests

use crate::db_operations::DbOperations;
use crate::schema::{field_names, MovieRecord};

/// Temporary databases that disappear when dropped
pub struct TestDatabaseFactory;

impl TestDatabaseFactory {
    pub fn create_temp_sled_db() -> Result<sled::Db, sled::Error> {
        sled::Config::new().temporary(true).open()
    }

    pub fn create_temp_db_ops() -> Result<DbOperations, sled::Error> {
        DbOperations::new(Self::create_temp_sled_db()?)
    }
}

/// A valid movie with every required field filled in
pub fn movie(id: i64, title: &str, release_date: &str, cast: &[&str]) -> MovieRecord {
    MovieRecord {
        id,
        title: title.to_string(),
        vote_average: 7.5,
        vote_count: 1200.0,
        status: "Released".to_string(),
        release_date: release_date.to_string(),
        revenue: 1_000_000.0,
        runtime: Some(120.0),
        budget: None,
        imdb_id: format!("tt{:07}", id),
        original_language: "en".to_string(),
        original_title: title.to_string(),
        overview: Some(format!("About {}", title)),
        popularity: 10.0,
        tagline: None,
        genres: vec!["Drama".to_string()],
        production_companies: vec![],
        production_countries: vec!["United States of America".to_string()],
        spoken_languages: vec!["English".to_string()],
        cast: cast.iter().map(|name| name.to_string()).collect(),
        director: "Jane Director".to_string(),
        director_of_photography: None,
        writers: vec![],
        producers: vec![],
        music_composer: None,
        imdb_rating: 7.9,
        imdb_votes: 5000.0,
        poster_path: Some(format!("/poster{}.jpg", id)),
    }
}

/// Source CSV text with the canonical header and one line per movie
pub fn source_csv(movies: &[MovieRecord]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(field_names())
        .expect("header write");
    for movie in movies {
        writer
            .write_record(movie.to_artifact_row())
            .expect("row write");
    }
    String::from_utf8(writer.into_inner().expect("flush")).expect("utf-8")
}
