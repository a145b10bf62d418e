use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::PipelineError;

/// The kind of values a column holds.
///
/// Sizes (key cardinality, vector dimension) are only known once a step has
/// been fitted, so the schema tracks kinds alone and sizes are checked when
/// data flows through a fitted transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Free text, one string per row
    Text,
    /// Categorical key into a value vocabulary, possibly missing
    Key,
    /// Fixed-dimension numeric feature vector
    Vector,
    /// Per-class probabilities produced by a trainer
    Scores,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Key => "Key",
            Self::Vector => "Vector",
            Self::Scores => "Scores",
        };
        f.write_str(name)
    }
}

/// A named, typed column in a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column shapes of a data view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<SchemaColumn>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a column. A replaced column keeps its position.
    pub fn set(&mut self, name: impl Into<String>, kind: ColumnKind) {
        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.kind = kind,
            None => self.columns.push(SchemaColumn { name, kind }),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.set(name, kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(|c| c.kind)
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Checks that `name` exists with the `expected` kind.
    ///
    /// # Errors
    /// - `MissingColumn` if no column has that name
    /// - `ColumnType` if the column exists with another kind
    pub fn require(&self, name: &str, expected: ColumnKind) -> Result<(), PipelineError> {
        match self.kind_of(name) {
            None => Err(PipelineError::MissingColumn(name.to_string())),
            Some(kind) if kind != expected => Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: expected.to_string(),
                actual: kind.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Declares where a record field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column name, also matched against a file header
    pub name: &'static str,
    /// Positional index used when the header does not name the field
    pub index: usize,
}

/// A plain record type whose fields are all text columns.
pub trait Record: Sized {
    /// Field declarations in column order
    fn fields() -> &'static [FieldSpec];

    /// Field values in the same order as [`Record::fields`]
    fn values(&self) -> Vec<&str>;

    fn schema() -> Schema {
        Self::fields()
            .iter()
            .fold(Schema::new(), |schema, field| schema.with_column(field.name, ColumnKind::Text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut schema = Schema::new()
            .with_column("a", ColumnKind::Text)
            .with_column("b", ColumnKind::Text);
        schema.set("a", ColumnKind::Key);

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.columns()[0].name, "a");
        assert_eq!(schema.kind_of("a"), Some(ColumnKind::Key));
    }

    #[test]
    fn test_require_reports_kind_mismatch() {
        let schema = Schema::new().with_column("Features", ColumnKind::Text);

        assert!(matches!(
            schema.require("Features", ColumnKind::Vector),
            Err(PipelineError::ColumnType { .. })
        ));
        assert!(matches!(
            schema.require("Label", ColumnKind::Key),
            Err(PipelineError::MissingColumn(_))
        ));
        assert!(schema.require("Features", ColumnKind::Text).is_ok());
    }
}
