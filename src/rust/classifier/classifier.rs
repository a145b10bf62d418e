use std::collections::HashMap;

use log::debug;

use super::error::PipelineError;
use super::model::TrainedModel;
use super::trainer::{PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
use crate::data::{ColumnKind, DataView, GitHubIssue, IssuePrediction, Record, Schema};

/// Runs single-issue predictions against a trained model.
///
/// The engine only holds owned data, so it is `Send + Sync` and can be shared behind an `Arc`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use issue_classifier::{GitHubIssue, ModelManager, PredictionEngine};
///
/// let (model, schema) = ModelManager::new("Models/model.bin").load()?;
/// let engine = PredictionEngine::new(model, &schema)?;
/// let prediction = engine.predict(&GitHubIssue::new("Entity Framework crashes", "EF throws on connect"))?;
/// println!("Predicted area: {}", prediction.area);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    model: TrainedModel,
    classes: Vec<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<PredictionEngine>();
    }
};

impl PredictionEngine {
    /// Binds `model` to the [`GitHubIssue`] record shape.
    ///
    /// # Arguments
    /// * `model` - The fitted pipeline
    /// * `model_schema` - The input schema the model was saved with
    ///
    /// # Errors
    /// - `SchemaMismatch` if a column of `model_schema` is missing from the record or has another kind
    /// - `SchemaMismatch` if the model cannot run on the record or produces no predicted label
    pub fn new(model: TrainedModel, model_schema: &Schema) -> Result<Self, PipelineError> {
        let record_schema = GitHubIssue::schema();
        Self::validate_schema(model_schema, &record_schema)?;

        let output = model
            .output_schema(&record_schema)
            .map_err(|e| PipelineError::SchemaMismatch(format!("Model cannot run on the issue record: {}", e)))?;
        if output.kind_of(PREDICTED_LABEL_COLUMN) != Some(ColumnKind::Text) {
            return Err(PipelineError::SchemaMismatch(format!(
                "Model does not produce a text '{}' column",
                PREDICTED_LABEL_COLUMN
            )));
        }

        let classes = model
            .classes()
            .map(<[String]>::to_vec)
            .ok_or_else(|| PipelineError::SchemaMismatch("Model has no trained classifier".into()))?;

        Ok(Self { model, classes })
    }

    fn validate_schema(model_schema: &Schema, record_schema: &Schema) -> Result<(), PipelineError> {
        for column in model_schema.columns() {
            match record_schema.kind_of(&column.name) {
                None => {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "Model expects column '{}' which the issue record does not have",
                        column.name
                    )))
                }
                Some(kind) if kind != column.kind => {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "Model expects column '{}' as {}, the issue record has {}",
                        column.name, column.kind, kind
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Predicts the area of one issue. The issue's own `area` is ignored.
    pub fn predict(&self, issue: &GitHubIssue) -> Result<IssuePrediction, PipelineError> {
        let view = DataView::from_records(std::slice::from_ref(issue));
        let output = self.model.transform(&view)?;

        let area = output
            .text(PREDICTED_LABEL_COLUMN)?
            .first()
            .cloned()
            .unwrap_or_default();
        let scores = output.scores(SCORE_COLUMN)?;
        let scores: HashMap<String, f32> = self
            .classes
            .iter()
            .cloned()
            .zip(scores.row(0).iter().copied())
            .collect();

        debug!("Predicted '{}' for issue '{}'", area, issue.title);
        Ok(IssuePrediction { area, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_missing_column_is_rejected() {
        let model_schema = Schema::new()
            .with_column("Title", ColumnKind::Text)
            .with_column("Labels", ColumnKind::Text);
        let result = PredictionEngine::validate_schema(&model_schema, &GitHubIssue::schema());
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_schema_kind_mismatch_is_rejected() {
        let model_schema = Schema::new().with_column("Title", ColumnKind::Vector);
        let result = PredictionEngine::validate_schema(&model_schema, &GitHubIssue::schema());
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_model_without_trainer_is_rejected() {
        let result = PredictionEngine::new(TrainedModel::new(Vec::new()), &GitHubIssue::schema());
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }
}
