//! Pipeline steps, the maximum-entropy trainer and the prediction engine.

pub mod builder;
#[allow(clippy::module_inception)]
pub mod classifier;
mod error;
pub mod featurizer;
pub mod model;
pub mod trainer;
mod utils;

pub use builder::{Pipeline, TransformSpec};
pub use classifier::PredictionEngine;
pub use error::PipelineError;
pub use featurizer::{TextFeaturizer, TextFeaturizerOptions};
pub use model::{FittedTransform, TrainedModel};
pub use trainer::{LinearModel, MaximumEntropyOptions, MaximumEntropyTrainer, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};
pub use utils::Norm;
pub(crate) use utils::argmax;
