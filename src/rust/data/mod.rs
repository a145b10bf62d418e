//! In-memory tabular data: record shapes, schemas, columnar views and the TSV loader.

pub mod issue;
pub mod loader;
pub mod schema;
pub mod vector;
pub mod view;

pub use issue::{GitHubIssue, IssuePrediction};
pub use loader::{load_from_text_file, read_records, validate_file_exists};
pub use schema::{ColumnKind, FieldSpec, Record, Schema, SchemaColumn};
pub use vector::SparseVector;
pub use view::{Column, DataView, KeyColumn, VectorColumn};
