use super::core::DbOperations;
use crate::graph_store::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A declared uniqueness constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub label: String,
    pub property: String,
    pub declared_at: DateTime<Utc>,
}

impl ConstraintRecord {
    pub fn key(&self) -> String {
        constraint_key(&self.label, &self.property)
    }
}

fn constraint_key(label: &str, property: &str) -> String {
    format!("{}.{}", label, property)
}

impl DbOperations {
    /// Declare a uniqueness constraint. Returns `false` if it was already declared.
    pub fn declare_constraint(&self, label: &str, property: &str) -> StoreResult<bool> {
        let record = ConstraintRecord {
            label: label.to_string(),
            property: property.to_string(),
            declared_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&record)?;
        let swapped = self.constraints_tree.compare_and_swap(
            record.key().as_bytes(),
            None::<&[u8]>,
            Some(bytes),
        )?;
        Ok(swapped.is_ok())
    }

    pub fn has_constraint(&self, label: &str, property: &str) -> StoreResult<bool> {
        Ok(self
            .constraints_tree
            .contains_key(constraint_key(label, property).as_bytes())?)
    }

    pub fn list_constraints(&self) -> StoreResult<Vec<ConstraintRecord>> {
        Ok(self
            .list_items_in_tree(&self.constraints_tree)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }
}
