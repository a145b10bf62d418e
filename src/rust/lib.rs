//! Trains a multiclass text classifier that predicts a GitHub issue's area label
//! from its title and description.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use issue_classifier::{workflow, RuntimeConfig};
//!
//! let config = RuntimeConfig::with_base_dir(".");
//! let report = workflow::run(&config, &mut std::io::stdout())?;
//! println!("Predicted area: {}", report.prediction.area);
//! # Ok(())
//! # }
//! ```
//!
//! # Building a pipeline by hand
//!
//! A pipeline is an ordered list of [`TransformSpec`]s. Fitting it walks the
//! steps in order and yields a [`TrainedModel`] that can be saved with
//! [`ModelManager`] and served with [`PredictionEngine`]:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use issue_classifier::{
//!     load_from_text_file, GitHubIssue, MaximumEntropyOptions, ModelManager, Pipeline,
//!     PredictionEngine, TransformSpec,
//! };
//!
//! let data = load_from_text_file::<GitHubIssue>("Data/issues_train.tsv", true)?;
//! let pipeline = Pipeline::from_steps(vec![
//!     TransformSpec::map_value_to_key("Area", "Label"),
//!     TransformSpec::featurize_text("Title", "Features"),
//!     TransformSpec::maximum_entropy("Label", "Features", MaximumEntropyOptions::default()),
//!     TransformSpec::map_key_to_value("PredictedLabel", "PredictedLabel"),
//! ]);
//! let model = pipeline.fit(&data)?;
//!
//! let manager = ModelManager::new("Models/model.bin");
//! manager.save(&model, &data.schema())?;
//!
//! let (model, schema) = manager.load()?;
//! let engine = PredictionEngine::new(model, &schema)?;
//! let prediction = engine.predict(&GitHubIssue::new("App crashes", "Crash on startup"))?;
//! println!("{} {:?}", prediction.area, prediction.scores);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod data;
pub mod evaluation;
pub mod model_manager;
mod runtime;
pub mod workflow;

pub use classifier::{
    MaximumEntropyOptions, Pipeline, PipelineError, PredictionEngine, TextFeaturizerOptions, TrainedModel,
    TransformSpec,
};
pub use data::{load_from_text_file, DataView, GitHubIssue, IssuePrediction, Schema};
pub use evaluation::{MulticlassEvaluator, MulticlassMetrics};
pub use model_manager::{ModelError, ModelManager};
pub use runtime::{AppPaths, EvaluationMode, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
