use crate::graph_store::StoreResult;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Key separator for composite relationship keys. Actor names never contain it.
pub(crate) const KEY_SEPARATOR: char = '\0';

/// Sled-backed movie graph.
///
/// Nodes and relationships live in their own trees:
/// `movies` (id → movie properties), `actors` (name → actor),
/// `acted_in` (`name\0id`), `movie_cast` (`id\0name`, the reverse index) and
/// `constraints` (`Label.property` → declaration).
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
    pub(crate) movies_tree: sled::Tree,
    pub(crate) actors_tree: sled::Tree,
    pub(crate) acted_in_tree: sled::Tree,
    pub(crate) movie_cast_tree: sled::Tree,
    pub(crate) constraints_tree: sled::Tree,
}

impl DbOperations {
    /// Opens (or creates) a database directory
    pub fn open(path: &Path) -> Result<Self, sled::Error> {
        Self::new(sled::open(path)?)
    }

    /// Creates a new DbOperations instance with all required trees
    pub fn new(db: sled::Db) -> Result<Self, sled::Error> {
        let movies_tree = db.open_tree("movies")?;
        let actors_tree = db.open_tree("actors")?;
        let acted_in_tree = db.open_tree("acted_in")?;
        let movie_cast_tree = db.open_tree("movie_cast")?;
        let constraints_tree = db.open_tree("constraints")?;

        Ok(Self {
            db,
            movies_tree,
            actors_tree,
            acted_in_tree,
            movie_cast_tree,
            constraints_tree,
        })
    }

    /// Retrieve any deserializable item from a specific tree
    pub fn get_from_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        key: &str,
    ) -> StoreResult<Option<T>> {
        match tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List all key-value pairs in a tree
    pub fn list_items_in_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
    ) -> StoreResult<Vec<(String, T)>> {
        let mut items = Vec::new();
        for result in tree.iter() {
            let (key, value) = result?;
            let key_str = String::from_utf8_lossy(&key).to_string();
            items.push((key_str, serde_json::from_slice(&value)?));
        }
        Ok(items)
    }

    /// Second halves of the composite keys under `prefix\0`
    pub(crate) fn scan_composite(&self, tree: &sled::Tree, prefix: &str) -> StoreResult<Vec<String>> {
        let prefix = format!("{}{}", prefix, KEY_SEPARATOR);
        let mut suffixes = Vec::new();
        for result in tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) = result?;
            let key = String::from_utf8_lossy(&key);
            if let Some(suffix) = key.strip_prefix(prefix.as_str()) {
                suffixes.push(suffix.to_string());
            }
        }
        Ok(suffixes)
    }

    /// Ensure everything written so far is durable
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

pub(crate) fn movie_key(id: i64) -> String {
    id.to_string()
}

/// `acted_in` key: actor first so an actor's movies share a prefix
pub(crate) fn acted_in_key(actor: &str, movie_id: i64) -> String {
    format!("{}{}{}", actor, KEY_SEPARATOR, movie_id)
}

/// `movie_cast` key: movie first so a movie's cast shares a prefix
pub(crate) fn movie_cast_key(movie_id: i64, actor: &str) -> String {
    format!("{}{}{}", movie_id, KEY_SEPARATOR, actor)
}
