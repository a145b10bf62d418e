//! The end-to-end run: load, featurize, train, save, evaluate, reload, predict.

use std::io::Write;
use std::path::Path;

use log::info;

use crate::classifier::{
    MaximumEntropyOptions, Pipeline, PipelineError, PredictionEngine, TrainedModel, TransformSpec,
    PREDICTED_LABEL_COLUMN,
};
use crate::data::issue::{AREA_COLUMN, DESCRIPTION_COLUMN, TITLE_COLUMN};
use crate::data::{load_from_text_file, validate_file_exists, DataView, GitHubIssue, IssuePrediction};
use crate::evaluation::{evaluate_multiclass, MulticlassMetrics};
use crate::model_manager::ModelManager;
use crate::runtime::{EvaluationMode, RuntimeConfig};

pub const LABEL_COLUMN: &str = "Label";
pub const FEATURES_COLUMN: &str = "Features";
const TITLE_FEATURES_COLUMN: &str = "TitleFeaturized";
const DESCRIPTION_FEATURES_COLUMN: &str = "DescriptionFeaturized";

pub const SAMPLE_ISSUE_TITLE: &str = "Entity Framework crashes";
pub const SAMPLE_ISSUE_DESCRIPTION: &str = "When connecting to the database, EF is crashing";

/// Everything a run produced, for callers that want more than the console output
#[derive(Debug, Clone)]
pub struct RunReport {
    pub metrics: MulticlassMetrics,
    pub prediction: IssuePrediction,
}

/// Loads a header-carrying issue file.
pub fn load_issues(path: &Path) -> Result<DataView, PipelineError> {
    load_from_text_file::<GitHubIssue>(path, true)
}

/// Label encoding and featurization steps shared by training and evaluation.
pub fn process_data() -> Pipeline {
    Pipeline::from_steps(vec![
        TransformSpec::map_value_to_key(AREA_COLUMN, LABEL_COLUMN),
        TransformSpec::featurize_text(TITLE_COLUMN, TITLE_FEATURES_COLUMN),
        TransformSpec::featurize_text(DESCRIPTION_COLUMN, DESCRIPTION_FEATURES_COLUMN),
        TransformSpec::concatenate(
            FEATURES_COLUMN,
            &[TITLE_FEATURES_COLUMN, DESCRIPTION_FEATURES_COLUMN],
        ),
        TransformSpec::CacheCheckpoint,
    ])
}

/// Appends the trainer and label decoding to `pipeline`, fits it and saves the model.
///
/// Returns the full training pipeline and the model fitted on `training_data`.
pub fn build_and_train_model<W: Write>(
    training_data: &DataView,
    mut pipeline: Pipeline,
    config: &RuntimeConfig,
    out: &mut W,
) -> Result<(Pipeline, TrainedModel), PipelineError> {
    let trainer_options = MaximumEntropyOptions {
        seed: config.seed,
        ..MaximumEntropyOptions::default()
    };
    pipeline.push(TransformSpec::maximum_entropy(LABEL_COLUMN, FEATURES_COLUMN, trainer_options));
    pipeline.push(TransformSpec::map_key_to_value(PREDICTED_LABEL_COLUMN, PREDICTED_LABEL_COLUMN));

    writeln!(out, "Training the model...")?;
    let trained_model = pipeline.fit(training_data)?;

    writeln!(out, "Saving the trained model...")?;
    ModelManager::new(&config.paths.model).save(&trained_model, &training_data.schema())?;

    Ok((pipeline, trained_model))
}

/// Scores the test file and prints the metrics block.
///
/// In [`EvaluationMode::Refit`] the training pipeline is fitted again on the test
/// data; in [`EvaluationMode::Holdout`] `trained_model` is used as is.
pub fn evaluate<W: Write>(
    config: &RuntimeConfig,
    training_pipeline: &Pipeline,
    trained_model: &TrainedModel,
    out: &mut W,
) -> Result<MulticlassMetrics, PipelineError> {
    let test_data = load_issues(&config.paths.test_data)?;

    let scored = match config.evaluation {
        EvaluationMode::Refit => {
            info!("Re-fitting the training pipeline on the test data");
            training_pipeline.fit(&test_data)?.transform(&test_data)?
        }
        EvaluationMode::Holdout => trained_model.transform(&test_data)?,
    };
    let metrics = evaluate_multiclass(&scored)?;

    writeln!(out, "Metrics for Multi-class Classification model - Test Data")?;
    write!(out, "{}", metrics)?;
    Ok(metrics)
}

/// Reloads the saved model and predicts the area of the sample issue.
pub fn predict_issue<W: Write>(config: &RuntimeConfig, out: &mut W) -> Result<IssuePrediction, PipelineError> {
    writeln!(out, "Loading the model for prediction...")?;
    let (model, schema) = ModelManager::new(&config.paths.model).load()?;
    let engine = PredictionEngine::new(model, &schema)?;

    let single_issue = GitHubIssue::new(SAMPLE_ISSUE_TITLE, SAMPLE_ISSUE_DESCRIPTION);
    let prediction = engine.predict(&single_issue)?;
    writeln!(out, "Single Prediction - Result: {}", prediction.area)?;
    Ok(prediction)
}

/// Runs the whole program against `config`, writing console output to `out`.
///
/// # Errors
/// `FileNotFound` if either data file is missing, checked before anything is loaded;
/// otherwise the first error of any stage.
pub fn run<W: Write>(config: &RuntimeConfig, out: &mut W) -> Result<RunReport, PipelineError> {
    validate_file_exists(&config.paths.train_data)?;
    validate_file_exists(&config.paths.test_data)?;

    let training_data = load_issues(&config.paths.train_data)?;
    let pipeline = process_data();
    let (training_pipeline, trained_model) = build_and_train_model(&training_data, pipeline, config, out)?;

    let metrics = evaluate(config, &training_pipeline, &trained_model, out)?;
    let prediction = predict_issue(config, out)?;

    Ok(RunReport { metrics, prediction })
}
