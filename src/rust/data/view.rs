use ndarray::Array2;

use super::schema::{ColumnKind, Record, Schema};
use super::vector::SparseVector;
use crate::classifier::PipelineError;

/// A categorical column: one optional key per row plus the key-value vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyColumn {
    keys: Vec<Option<u32>>,
    values: Vec<String>,
}

impl KeyColumn {
    pub fn new(keys: Vec<Option<u32>>, values: Vec<String>) -> Self {
        Self { keys, values }
    }

    pub fn keys(&self) -> &[Option<u32>] {
        &self.keys
    }

    /// Original values, indexed by key
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    pub fn value_of(&self, key: u32) -> Option<&str> {
        self.values.get(key as usize).map(String::as_str)
    }
}

/// A column of sparse vectors sharing one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorColumn {
    dimension: usize,
    rows: Vec<SparseVector>,
}

impl VectorColumn {
    pub fn new(dimension: usize, rows: Vec<SparseVector>) -> Result<Self, PipelineError> {
        if let Some(row) = rows.iter().find(|r| r.dimension() != dimension) {
            return Err(PipelineError::Validation(format!(
                "Vector of dimension {} does not fit a column of dimension {}",
                row.dimension(),
                dimension
            )));
        }
        Ok(Self { dimension, rows })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Key(KeyColumn),
    Vector(VectorColumn),
    Scores(Array2<f32>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Key(column) => column.keys.len(),
            Self::Vector(column) => column.rows.len(),
            Self::Scores(scores) => scores.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Text(_) => ColumnKind::Text,
            Self::Key(_) => ColumnKind::Key,
            Self::Vector(_) => ColumnKind::Vector,
            Self::Scores(_) => ColumnKind::Scores,
        }
    }
}

/// A materialized table of named columns with equal row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView {
    row_count: usize,
    columns: Vec<(String, Column)>,
}

impl DataView {
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            columns: Vec::new(),
        }
    }

    /// Builds a text-only view with one row per record
    pub fn from_records<R: Record>(records: &[R]) -> Self {
        let mut view = Self::new(records.len());
        for (position, field) in R::fields().iter().enumerate() {
            let values = records
                .iter()
                .map(|r| r.values().get(position).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            view.columns.push((field.name.to_string(), Column::Text(values)));
        }
        view
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn schema(&self) -> Schema {
        self.columns
            .iter()
            .fold(Schema::new(), |schema, (name, column)| schema.with_column(name.as_str(), column.kind()))
    }

    /// Adds a column, replacing any column with the same name.
    ///
    /// # Errors
    /// - `Validation` if the column length differs from the view's row count
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), PipelineError> {
        let name = name.into();
        if column.len() != self.row_count {
            return Err(PipelineError::Validation(format!(
                "Column '{}' has {} rows, view has {}",
                name,
                column.len(),
                self.row_count
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&Column, PipelineError> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn text(&self, name: &str) -> Result<&[String], PipelineError> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            other => Err(Self::type_error(name, ColumnKind::Text, other)),
        }
    }

    pub fn key(&self, name: &str) -> Result<&KeyColumn, PipelineError> {
        match self.column(name)? {
            Column::Key(column) => Ok(column),
            other => Err(Self::type_error(name, ColumnKind::Key, other)),
        }
    }

    pub fn vector(&self, name: &str) -> Result<&VectorColumn, PipelineError> {
        match self.column(name)? {
            Column::Vector(column) => Ok(column),
            other => Err(Self::type_error(name, ColumnKind::Vector, other)),
        }
    }

    pub fn scores(&self, name: &str) -> Result<&Array2<f32>, PipelineError> {
        match self.column(name)? {
            Column::Scores(scores) => Ok(scores),
            other => Err(Self::type_error(name, ColumnKind::Scores, other)),
        }
    }

    fn type_error(name: &str, expected: ColumnKind, actual: &Column) -> PipelineError {
        PipelineError::ColumnType {
            column: name.to_string(),
            expected: expected.to_string(),
            actual: actual.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GitHubIssue;

    #[test]
    fn test_from_records_builds_text_columns() -> Result<(), Box<dyn std::error::Error>> {
        let issues = vec![
            GitHubIssue::new("Crash on start", "It crashes").with_area("area-runtime"),
            GitHubIssue::new("Button misaligned", "UI glitch").with_area("area-ui"),
        ];
        let view = DataView::from_records(&issues);

        assert_eq!(view.row_count(), 2);
        assert_eq!(view.text("Title")?[1], "Button misaligned");
        assert_eq!(view.text("Area")?[0], "area-runtime");
        assert_eq!(view.schema(), GitHubIssue::schema());
        Ok(())
    }

    #[test]
    fn test_set_column_rejects_wrong_length() {
        let mut view = DataView::new(2);
        let result = view.set_column("Title", Column::Text(vec!["only one".into()]));
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_typed_accessor_reports_kind() {
        let mut view = DataView::new(1);
        view.set_column("Label", Column::Text(vec!["x".into()])).unwrap();

        assert!(matches!(view.key("Label"), Err(PipelineError::ColumnType { .. })));
        assert!(matches!(view.text("Missing"), Err(PipelineError::MissingColumn(_))));
    }
}
