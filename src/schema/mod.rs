//! # Movie schema
//!
//! The canonical definition of one input row and the validation boundary that turns
//! loosely-typed source rows into [`MovieRecord`] values.
//!
//! ## Components
//!
//! * `fields` - Declared field list, kinds and order (also the artifact header)
//! * `record` - Raw, cleaned and validated row types
//! * `validator` - Strict typed validation of cleaned rows
//! * `violation` - The `SchemaViolation` failure value and its report

pub mod fields;
pub mod record;
pub mod validator;
pub mod violation;

pub use fields::{field_names, field_spec, FieldKind, FieldSpec, MOVIE_FIELDS};
pub use record::{release_year_prefix, CleanedRow, CleanedValue, MovieRecord, RawRow};
pub use validator::RecordValidator;
pub use violation::{SchemaViolation, ViolationCause};
