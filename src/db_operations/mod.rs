// Core database operations
mod constraint_operations;
pub mod core;
mod movie_operations;
mod query_operations;


// Re-export the main DbOperations struct and node types
pub use constraint_operations::ConstraintRecord;
pub use core::DbOperations;
pub use movie_operations::ActorNode;
pub use query_operations::{MovieSuggestion, DEFAULT_SUGGESTION_LIMIT};
