//! Shared fixtures for the end-to-end loader tests
//!
//! Each fixture owns a scratch directory holding the output directory and an embedded
//! sled graph store, so runs never touch a real database.

#![allow(dead_code)]

use moviegraph::schema::{field_names, MovieRecord};
use moviegraph::{DbOperations, LoaderConfig, StoreConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct LoaderFixture {
    pub output_dir: PathBuf,
    pub graph_dir: PathBuf,
    _temp_dir: TempDir,
}

impl LoaderFixture {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_dir = temp_dir.path().join("chunks");
        fs::create_dir_all(&output_dir).unwrap();
        Self {
            graph_dir: temp_dir.path().join("graph"),
            output_dir,
            _temp_dir: temp_dir,
        }
    }

    pub fn config(&self) -> LoaderConfig {
        LoaderConfig {
            store: StoreConfig {
                uri: format!("sled://{}", self.graph_dir.display()),
                ..Default::default()
            },
            output_directory: self.output_dir.clone(),
            ..Default::default()
        }
    }

    /// Write the combined source file the partition operation reads
    pub fn write_source(&self, movies: &[MovieRecord]) {
        let path = self.output_dir.join(moviegraph::config::DEFAULT_SOURCE_FILE);
        fs::write(path, csv_text(movies)).unwrap();
    }

    /// Open the graph written by a finished run
    pub fn graph(&self) -> DbOperations {
        DbOperations::open(&self.graph_dir).unwrap()
    }
}

pub fn movie(id: i64, title: &str, release_date: &str, cast: &[&str]) -> MovieRecord {
    MovieRecord {
        id,
        title: title.to_string(),
        vote_average: 7.1,
        vote_count: 850.0,
        status: "Released".to_string(),
        release_date: release_date.to_string(),
        revenue: 0.0,
        runtime: Some(101.0),
        budget: None,
        imdb_id: format!("tt{:07}", id),
        original_language: "en".to_string(),
        original_title: title.to_string(),
        overview: None,
        popularity: 12.5,
        tagline: None,
        genres: vec!["Drama".to_string()],
        production_companies: vec![],
        production_countries: vec![],
        spoken_languages: vec!["English".to_string()],
        cast: cast.iter().map(|name| name.to_string()).collect(),
        director: "Some Director".to_string(),
        director_of_photography: None,
        writers: vec![],
        producers: vec![],
        music_composer: None,
        imdb_rating: 7.0,
        imdb_votes: 900.0,
        poster_path: None,
    }
}

pub fn csv_text(movies: &[MovieRecord]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(field_names()).unwrap();
    for movie in movies {
        writer.write_record(movie.to_artifact_row()).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}
