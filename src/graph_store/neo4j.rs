//! Neo4j backend over Bolt (`neo4j` feature)

use super::{BatchOutcome, GraphStats, GraphStore, MovieUpsert, StoreResult};
use async_trait::async_trait;
use neo4rs::{query, Graph, Query};

const CONSTRAINT_STATEMENTS: [&str; 2] = [
    "CREATE CONSTRAINT movie_id IF NOT EXISTS FOR (m:Movie) REQUIRE m.id IS UNIQUE",
    "CREATE CONSTRAINT actor_name IF NOT EXISTS FOR (a:Actor) REQUIRE a.name IS UNIQUE",
];

const UPSERT_MOVIE: &str = "MERGE (m:Movie {id: $id})
     SET m.title = $title,
         m.vote_average = $vote_average,
         m.vote_count = $vote_count,
         m.status = $status,
         m.release_date = $release_date,
         m.revenue = $revenue,
         m.runtime = $runtime,
         m.budget = $budget,
         m.imdb_id = $imdb_id,
         m.original_language = $original_language,
         m.original_title = $original_title,
         m.overview = $overview,
         m.popularity = $popularity,
         m.tagline = $tagline,
         m.genres = $genres,
         m.production_companies = $production_companies,
         m.production_countries = $production_countries,
         m.spoken_languages = $spoken_languages,
         m.cast = $cast,
         m.director = $director,
         m.director_of_photography = $director_of_photography,
         m.writers = $writers,
         m.producers = $producers,
         m.music_composer = $music_composer,
         m.imdb_rating = $imdb_rating,
         m.imdb_votes = $imdb_votes,
         m.poster_path = $poster_path
     WITH m
     UNWIND $actors AS actor_name
     MERGE (a:Actor {name: actor_name})
     MERGE (a)-[:ACTED_IN]->(m)";

/// [`GraphStore`] backed by a Neo4j server
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub async fn connect(uri: &str, user: &str, password: &str) -> StoreResult<Self> {
        let graph = Graph::new(uri, user, password).await?;
        Ok(Self { graph })
    }

    async fn count(&self, statement: &str) -> StoreResult<u64> {
        let mut stream = self.graph.execute(query(statement)).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get::<i64>("n").unwrap_or(0).max(0) as u64),
            None => Ok(0),
        }
    }
}

fn upsert_query(upsert: &MovieUpsert) -> Query {
    let m = &upsert.movie;
    query(UPSERT_MOVIE)
        .param("id", m.id)
        .param("title", m.title.as_str())
        .param("vote_average", m.vote_average)
        .param("vote_count", m.vote_count)
        .param("status", m.status.as_str())
        .param("release_date", m.release_date.as_str())
        .param("revenue", m.revenue)
        .param("runtime", m.runtime)
        .param("budget", m.budget)
        .param("imdb_id", m.imdb_id.as_str())
        .param("original_language", m.original_language.as_str())
        .param("original_title", m.original_title.as_str())
        .param("overview", m.overview.clone())
        .param("popularity", m.popularity)
        .param("tagline", m.tagline.clone())
        .param("genres", m.genres.clone())
        .param("production_companies", m.production_companies.clone())
        .param("production_countries", m.production_countries.clone())
        .param("spoken_languages", m.spoken_languages.clone())
        .param("cast", m.cast.clone())
        .param("director", m.director.as_str())
        .param("director_of_photography", m.director_of_photography.clone())
        .param("writers", m.writers.clone())
        .param("producers", m.producers.clone())
        .param("music_composer", m.music_composer.clone())
        .param("imdb_rating", m.imdb_rating)
        .param("imdb_votes", m.imdb_votes)
        .param("poster_path", m.poster_path.clone())
        .param("actors", upsert.actors.clone())
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn ensure_constraints(&self) -> StoreResult<()> {
        for statement in CONSTRAINT_STATEMENTS {
            self.graph.run(query(statement)).await?;
        }
        log::info!(target: "moviegraph::store", "Uniqueness constraints on Movie.id and Actor.name are in place");
        Ok(())
    }

    async fn write_batch(&self, batch: &[MovieUpsert]) -> StoreResult<BatchOutcome> {
        let mut txn = self.graph.start_txn().await?;
        let queries: Vec<Query> = batch.iter().map(upsert_query).collect();
        if let Err(e) = txn.run_queries(queries).await {
            if let Err(rollback) = txn.rollback().await {
                log::warn!(target: "moviegraph::store", "Rollback after failed batch also failed: {}", rollback);
            }
            return Err(e.into());
        }
        txn.commit().await?;

        Ok(BatchOutcome {
            movies_upserted: batch.len(),
            ..Default::default()
        })
    }

    async fn graph_stats(&self) -> StoreResult<Option<GraphStats>> {
        Ok(Some(GraphStats {
            movies: self.count("MATCH (m:Movie) RETURN count(m) AS n").await?,
            actors: self.count("MATCH (a:Actor) RETURN count(a) AS n").await?,
            relationships: self
                .count("MATCH ()-[r:ACTED_IN]->() RETURN count(r) AS n")
                .await?,
        }))
    }

    async fn close(&self) -> StoreResult<()> {
        // The driver pool closes its connections on drop.
        Ok(())
    }
}
