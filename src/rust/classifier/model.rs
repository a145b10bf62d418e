use log::debug;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::featurizer::{TextFeaturizer, Vocabulary};
use super::trainer::{LinearModel, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
use crate::data::{Column, ColumnKind, DataView, KeyColumn, Schema, SparseVector, VectorColumn};

/// Maps a text column to keys, in order of first occurrence. Empty text is a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueToKeyMapping {
    pub input: String,
    pub output: String,
    values: Vocabulary,
}

impl ValueToKeyMapping {
    pub fn fit(view: &DataView, input: &str, output: &str) -> Result<Self, PipelineError> {
        let mut values = Vocabulary::default();
        for value in view.text(input)?.iter().filter(|v| !v.is_empty()) {
            values.insert(value, usize::MAX);
        }
        debug!("Mapped '{}' to {} keys", input, values.len());
        Ok(Self {
            input: input.to_string(),
            output: output.to_string(),
            values,
        })
    }

    pub fn values(&self) -> &[String] {
        self.values.terms()
    }

    pub fn transform(&self, mut view: DataView) -> Result<DataView, PipelineError> {
        let keys = view.text(&self.input)?.iter().map(|v| self.values.get(v)).collect();
        let column = KeyColumn::new(keys, self.values.terms().to_vec());
        view.set_column(self.output.as_str(), Column::Key(column))?;
        Ok(view)
    }
}

/// Maps a key column back to its original text values. Missing keys become empty text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyToValueMapping {
    pub input: String,
    pub output: String,
}

impl KeyToValueMapping {
    pub fn transform(&self, mut view: DataView) -> Result<DataView, PipelineError> {
        let column = view.key(&self.input)?;
        let values = column
            .keys()
            .iter()
            .map(|key| {
                key.and_then(|k| column.value_of(k))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        view.set_column(self.output.as_str(), Column::Text(values))?;
        Ok(view)
    }
}

/// Joins vector columns into one, in the listed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatenateTransform {
    pub output: String,
    pub inputs: Vec<String>,
}

impl ConcatenateTransform {
    pub fn transform(&self, mut view: DataView) -> Result<DataView, PipelineError> {
        let columns = self
            .inputs
            .iter()
            .map(|name| view.vector(name))
            .collect::<Result<Vec<_>, _>>()?;
        let dimension = columns.iter().map(|c| c.dimension()).sum();
        let rows = (0..view.row_count())
            .map(|row| {
                let parts: Vec<&SparseVector> = columns.iter().map(|c| &c.rows()[row]).collect();
                SparseVector::concat(&parts)
            })
            .collect();
        let column = VectorColumn::new(dimension, rows)?;
        view.set_column(self.output.as_str(), Column::Vector(column))?;
        Ok(view)
    }
}

/// A fitted pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedTransform {
    ValueToKey(ValueToKeyMapping),
    FeaturizeText(TextFeaturizer),
    Concatenate(ConcatenateTransform),
    /// Views are fully materialized, so data passes through unchanged
    CacheCheckpoint,
    MaximumEntropy(LinearModel),
    KeyToValue(KeyToValueMapping),
}

impl FittedTransform {
    /// Columns this step reads, with the kind it needs.
    pub fn required_columns(&self) -> Vec<(&str, ColumnKind)> {
        match self {
            Self::ValueToKey(m) => vec![(m.input.as_str(), ColumnKind::Text)],
            Self::FeaturizeText(f) => vec![(f.input.as_str(), ColumnKind::Text)],
            Self::Concatenate(c) => c.inputs.iter().map(|i| (i.as_str(), ColumnKind::Vector)).collect(),
            Self::CacheCheckpoint => Vec::new(),
            Self::MaximumEntropy(m) => vec![(m.features.as_str(), ColumnKind::Vector)],
            Self::KeyToValue(m) => vec![(m.input.as_str(), ColumnKind::Key)],
        }
    }

    pub fn output_schema(&self, input: &Schema) -> Result<Schema, PipelineError> {
        for (name, kind) in self.required_columns() {
            input.require(name, kind)?;
        }
        let mut schema = input.clone();
        match self {
            Self::ValueToKey(m) => schema.set(m.output.as_str(), ColumnKind::Key),
            Self::FeaturizeText(f) => schema.set(f.output.as_str(), ColumnKind::Vector),
            Self::Concatenate(c) => schema.set(c.output.as_str(), ColumnKind::Vector),
            Self::CacheCheckpoint => {}
            Self::MaximumEntropy(_) => {
                schema.set(SCORE_COLUMN, ColumnKind::Scores);
                schema.set(PREDICTED_LABEL_COLUMN, ColumnKind::Key);
            }
            Self::KeyToValue(m) => schema.set(m.output.as_str(), ColumnKind::Text),
        }
        Ok(schema)
    }

    pub fn transform(&self, view: DataView) -> Result<DataView, PipelineError> {
        match self {
            Self::ValueToKey(m) => m.transform(view),
            Self::FeaturizeText(f) => f.transform(view),
            Self::Concatenate(c) => c.transform(view),
            Self::CacheCheckpoint => Ok(view),
            Self::MaximumEntropy(m) => m.transform(view),
            Self::KeyToValue(m) => m.transform(view),
        }
    }
}

/// The result of fitting a pipeline: fitted steps applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    transforms: Vec<FittedTransform>,
}

impl TrainedModel {
    pub fn new(transforms: Vec<FittedTransform>) -> Self {
        Self { transforms }
    }

    pub fn transforms(&self) -> &[FittedTransform] {
        &self.transforms
    }

    /// Runs every fitted step over a copy of `view`
    pub fn transform(&self, view: &DataView) -> Result<DataView, PipelineError> {
        self.transforms
            .iter()
            .try_fold(view.clone(), |current, step| step.transform(current))
    }

    pub fn output_schema(&self, input: &Schema) -> Result<Schema, PipelineError> {
        self.transforms
            .iter()
            .try_fold(input.clone(), |schema, step| step.output_schema(&schema))
    }

    /// The classes predicted by the model's trainer, if it has one
    pub fn classes(&self) -> Option<&[String]> {
        self.transforms.iter().find_map(|t| match t {
            FittedTransform::MaximumEntropy(m) => Some(m.classes()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(values: &[&str]) -> DataView {
        let mut view = DataView::new(values.len());
        view.set_column("Area", Column::Text(values.iter().map(|v| v.to_string()).collect()))
            .unwrap();
        view
    }

    #[test]
    fn test_keys_follow_first_occurrence() -> Result<(), PipelineError> {
        let view = areas(&["area-ui", "area-data", "area-ui", ""]);
        let mapping = ValueToKeyMapping::fit(&view, "Area", "Label")?;
        assert_eq!(mapping.values(), &["area-ui", "area-data"]);

        let view = mapping.transform(view)?;
        assert_eq!(view.key("Label")?.keys(), &[Some(0), Some(1), Some(0), None]);
        Ok(())
    }

    #[test]
    fn test_key_round_trip_to_text() -> Result<(), PipelineError> {
        let view = areas(&["b", "a", "zzz"]);
        let mapping = ValueToKeyMapping::fit(&areas(&["a", "b"]), "Area", "Label")?;
        let view = mapping.transform(view)?;
        let view = KeyToValueMapping {
            input: "Label".into(),
            output: "Decoded".into(),
        }
        .transform(view)?;
        assert_eq!(view.text("Decoded")?, &["b".to_string(), "a".to_string(), String::new()]);
        Ok(())
    }

    #[test]
    fn test_output_schema_requires_inputs() {
        let step = FittedTransform::Concatenate(ConcatenateTransform {
            output: "Features".into(),
            inputs: vec!["TitleFeaturized".into()],
        });
        let result = step.output_schema(&Schema::new().with_column("Title", ColumnKind::Text));
        assert!(matches!(result, Err(PipelineError::MissingColumn(_))));
    }
}
