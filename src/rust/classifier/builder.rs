use log::{debug, info};

use super::error::PipelineError;
use super::featurizer::{TextFeaturizer, TextFeaturizerOptions};
use super::model::{ConcatenateTransform, FittedTransform, KeyToValueMapping, TrainedModel, ValueToKeyMapping};
use super::trainer::{MaximumEntropyOptions, MaximumEntropyTrainer, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
use crate::data::{ColumnKind, DataView, Schema};

/// A declarative pipeline step. Nothing runs until the pipeline is fitted.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformSpec {
    /// Encodes a text column as categorical keys
    MapValueToKey { input: String, output: String },
    /// Extracts an n-gram feature vector from a text column
    FeaturizeText {
        input: String,
        output: String,
        options: TextFeaturizerOptions,
    },
    /// Joins vector columns into one
    Concatenate { output: String, inputs: Vec<String> },
    /// Point after which the data is materialized once for every training pass
    CacheCheckpoint,
    /// Multiclass maximum-entropy trainer writing `Score` and `PredictedLabel`
    MaximumEntropy {
        label: String,
        features: String,
        options: MaximumEntropyOptions,
    },
    /// Decodes a key column back to its text values
    MapKeyToValue { input: String, output: String },
}

impl TransformSpec {
    pub fn map_value_to_key(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::MapValueToKey {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn featurize_text(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::FeaturizeText {
            input: input.into(),
            output: output.into(),
            options: TextFeaturizerOptions::default(),
        }
    }

    pub fn concatenate(output: impl Into<String>, inputs: &[&str]) -> Self {
        Self::Concatenate {
            output: output.into(),
            inputs: inputs.iter().map(|i| i.to_string()).collect(),
        }
    }

    pub fn maximum_entropy(label: impl Into<String>, features: impl Into<String>, options: MaximumEntropyOptions) -> Self {
        Self::MaximumEntropy {
            label: label.into(),
            features: features.into(),
            options,
        }
    }

    pub fn map_key_to_value(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::MapKeyToValue {
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MapValueToKey { .. } => "MapValueToKey",
            Self::FeaturizeText { .. } => "FeaturizeText",
            Self::Concatenate { .. } => "Concatenate",
            Self::CacheCheckpoint => "CacheCheckpoint",
            Self::MaximumEntropy { .. } => "MaximumEntropy",
            Self::MapKeyToValue { .. } => "MapKeyToValue",
        }
    }

    /// The schema after this step, or the first column it cannot find.
    pub fn output_schema(&self, input: &Schema) -> Result<Schema, PipelineError> {
        let mut schema = input.clone();
        match self {
            Self::MapValueToKey { input: source, output } => {
                input.require(source, ColumnKind::Text)?;
                schema.set(output.as_str(), ColumnKind::Key);
            }
            Self::FeaturizeText { input: source, output, options } => {
                options.validate()?;
                input.require(source, ColumnKind::Text)?;
                schema.set(output.as_str(), ColumnKind::Vector);
            }
            Self::Concatenate { output, inputs } => {
                if inputs.is_empty() {
                    return Err(PipelineError::Validation(format!(
                        "Concatenate into '{}' needs at least one input column",
                        output
                    )));
                }
                for source in inputs {
                    input.require(source, ColumnKind::Vector)?;
                }
                schema.set(output.as_str(), ColumnKind::Vector);
            }
            Self::CacheCheckpoint => {}
            Self::MaximumEntropy { label, features, options } => {
                options.validate()?;
                input.require(label, ColumnKind::Key)?;
                input.require(features, ColumnKind::Vector)?;
                schema.set(SCORE_COLUMN, ColumnKind::Scores);
                schema.set(PREDICTED_LABEL_COLUMN, ColumnKind::Key);
            }
            Self::MapKeyToValue { input: source, output } => {
                input.require(source, ColumnKind::Key)?;
                schema.set(output.as_str(), ColumnKind::Text);
            }
        }
        Ok(schema)
    }

    /// Fits this step on the data it will see during training.
    pub fn fit(&self, view: &DataView) -> Result<FittedTransform, PipelineError> {
        Ok(match self {
            Self::MapValueToKey { input, output } => {
                FittedTransform::ValueToKey(ValueToKeyMapping::fit(view, input, output)?)
            }
            Self::FeaturizeText { input, output, options } => {
                FittedTransform::FeaturizeText(TextFeaturizer::fit(view, input, output, options)?)
            }
            Self::Concatenate { output, inputs } => FittedTransform::Concatenate(ConcatenateTransform {
                output: output.clone(),
                inputs: inputs.clone(),
            }),
            Self::CacheCheckpoint => FittedTransform::CacheCheckpoint,
            Self::MaximumEntropy { label, features, options } => FittedTransform::MaximumEntropy(
                MaximumEntropyTrainer::new(options.clone()).fit(view, label, features)?,
            ),
            Self::MapKeyToValue { input, output } => FittedTransform::KeyToValue(KeyToValueMapping {
                input: input.clone(),
                output: output.clone(),
            }),
        })
    }
}

/// An ordered list of transform steps.
///
/// # Example
/// ```
/// use issue_classifier::{Pipeline, TransformSpec};
///
/// let mut pipeline = Pipeline::new();
/// pipeline.push(TransformSpec::map_value_to_key("Area", "Label"));
/// pipeline.push(TransformSpec::featurize_text("Title", "Features"));
/// assert_eq!(pipeline.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    steps: Vec<TransformSpec>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<TransformSpec>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: TransformSpec) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TransformSpec] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Walks the steps over `input` without touching any data.
    ///
    /// # Errors
    /// Returns the first step's error, e.g. `MissingColumn` when a step reads a
    /// column no earlier step produces.
    pub fn output_schema(&self, input: &Schema) -> Result<Schema, PipelineError> {
        self.steps
            .iter()
            .try_fold(input.clone(), |schema, step| step.output_schema(&schema))
    }

    /// Fits every step in order, each on the output of the steps before it.
    ///
    /// # Errors
    /// - Any ordering error reported by [`Pipeline::output_schema`], before fitting starts
    /// - Any error from fitting or applying a step
    pub fn fit(&self, data: &DataView) -> Result<TrainedModel, PipelineError> {
        if self.steps.is_empty() {
            return Err(PipelineError::Validation("Pipeline has no steps".into()));
        }
        self.output_schema(&data.schema())?;

        let mut view = data.clone();
        let mut transforms = Vec::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            debug!("Fitting step {}/{}: {}", i + 1, self.steps.len(), step.name());
            let fitted = step.fit(&view)?;
            if let FittedTransform::CacheCheckpoint = fitted {
                debug!("Cache checkpoint: {} rows materialized", view.row_count());
            }
            if i + 1 < self.steps.len() {
                view = fitted.transform(view)?;
            }
            transforms.push(fitted);
        }

        info!("Fitted pipeline with {} steps on {} rows", transforms.len(), data.row_count());
        Ok(TrainedModel::new(transforms))
    }
}
