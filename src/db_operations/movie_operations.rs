use super::core::{acted_in_key, movie_cast_key, movie_key, DbOperations};
use crate::graph_store::{BatchOutcome, MovieUpsert, StoreError, StoreResult, REQUIRED_CONSTRAINTS};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::collections::HashMap;

/// `Actor` node properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorNode {
    pub name: String,
}

impl DbOperations {
    /// Merge a batch of movies and their cast in a single transaction.
    ///
    /// Movies are keyed by id and fully overwritten; actors and `ACTED_IN` edges are
    /// created only when missing. Either the whole batch commits or none of it does.
    pub fn upsert_movies(&self, batch: &[MovieUpsert]) -> StoreResult<BatchOutcome> {
        for (label, property) in REQUIRED_CONSTRAINTS {
            if !self.has_constraint(label, property)? {
                return Err(StoreError::MissingConstraint(format!("{}.{}", label, property)));
            }
        }

        let mut movies = Vec::with_capacity(batch.len());
        let mut actors: HashMap<&str, Vec<u8>> = HashMap::new();
        for upsert in batch {
            movies.push((movie_key(upsert.movie.id), serde_json::to_vec(&upsert.movie)?));
            for name in &upsert.actors {
                if !actors.contains_key(name.as_str()) {
                    let node = ActorNode { name: name.clone() };
                    actors.insert(name.as_str(), serde_json::to_vec(&node)?);
                }
            }
        }

        let trees = (
            &self.movies_tree,
            &self.actors_tree,
            &self.acted_in_tree,
            &self.movie_cast_tree,
        );
        let result = trees.transaction(|(movie_tx, actor_tx, acted_in_tx, cast_tx)| {
            let mut outcome = BatchOutcome::default();

            for (upsert, (key, bytes)) in batch.iter().zip(&movies) {
                if movie_tx.insert(key.as_bytes(), bytes.as_slice())?.is_none() {
                    outcome.movies_created += 1;
                }
                outcome.movies_upserted += 1;

                for name in &upsert.actors {
                    if actor_tx.get(name.as_bytes())?.is_none() {
                        if let Some(bytes) = actors.get(name.as_str()) {
                            actor_tx.insert(name.as_bytes(), bytes.as_slice())?;
                        }
                        outcome.actors_created += 1;
                    }

                    let edge = acted_in_key(name, upsert.movie.id);
                    if acted_in_tx.insert(edge.as_bytes(), Vec::<u8>::new())?.is_none() {
                        outcome.relationships_created += 1;
                    }
                    cast_tx.insert(
                        movie_cast_key(upsert.movie.id, name).as_bytes(),
                        Vec::<u8>::new(),
                    )?;
                }
            }

            Ok::<_, ConflictableTransactionError<()>>(outcome)
        });

        result.map_err(|e| match e {
            TransactionError::Abort(()) => StoreError::Transaction("batch aborted".to_string()),
            TransactionError::Storage(e) => StoreError::Sled(e),
        })
    }
}
