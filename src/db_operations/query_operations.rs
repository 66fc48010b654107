use super::core::{movie_key, DbOperations};
use super::movie_operations::ActorNode;
use crate::graph_store::{GraphStats, StoreResult};
use crate::schema::MovieRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default number of title suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 15;

/// Title-search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSuggestion {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    pub overview: Option<String>,
    pub popularity: f64,
}

impl DbOperations {
    pub fn get_movie(&self, id: i64) -> StoreResult<Option<MovieRecord>> {
        self.get_from_tree(&self.movies_tree, &movie_key(id))
    }

    /// Look up an actor by name, ignoring surrounding whitespace
    pub fn get_actor(&self, name: &str) -> StoreResult<Option<ActorNode>> {
        self.get_from_tree(&self.actors_tree, name.trim())
    }

    /// Names of the actors with an `ACTED_IN` edge to the movie
    pub fn actors_for_movie(&self, id: i64) -> StoreResult<Vec<String>> {
        self.scan_composite(&self.movie_cast_tree, &movie_key(id))
    }

    pub fn movies_for_actor(&self, name: &str) -> StoreResult<Vec<MovieRecord>> {
        let mut movies = Vec::new();
        for id in self.scan_composite(&self.acted_in_tree, name.trim())? {
            let Ok(id) = id.parse::<i64>() else {
                log::warn!(target: "moviegraph::store", "Skipping malformed ACTED_IN key for {}: {}", name, id);
                continue;
            };
            if let Some(movie) = self.get_movie(id)? {
                movies.push(movie);
            }
        }
        Ok(movies)
    }

    pub fn graph_stats(&self) -> GraphStats {
        GraphStats {
            movies: self.movies_tree.len() as u64,
            actors: self.actors_tree.len() as u64,
            relationships: self.acted_in_tree.len() as u64,
        }
    }

    /// Movies whose title contains `term`, case-insensitively.
    ///
    /// Ordered by popularity (highest first), ties broken by title.
    pub fn search_suggestions(&self, term: &str, limit: usize) -> StoreResult<Vec<MovieSuggestion>> {
        let needle = term.to_lowercase();
        let mut hits: Vec<MovieSuggestion> = self
            .list_items_in_tree::<MovieRecord>(&self.movies_tree)?
            .into_iter()
            .filter(|(_, movie)| movie.title.to_lowercase().contains(&needle))
            .map(|(_, movie)| MovieSuggestion {
                id: movie.id,
                title: movie.title,
                release_date: movie.release_date,
                overview: movie.overview,
                popularity: movie.popularity,
            })
            .collect();

        hits.sort_by(|a, b| match b.popularity.total_cmp(&a.popularity) {
            Ordering::Equal => a.title.cmp(&b.title),
            other => other,
        });
        hits.truncate(limit);
        Ok(hits)
    }
}
