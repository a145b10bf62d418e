use log::{debug, info};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::utils::{argmax, softmax};
use crate::data::{Column, DataView, KeyColumn, SparseVector};

pub const SCORE_COLUMN: &str = "Score";
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

const PROBABILITY_FLOOR: f64 = 1e-15;
const MIN_WEIGHT_SCALE: f64 = 1e-9;

/// Settings for the maximum-entropy (multinomial logistic regression) trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaximumEntropyOptions {
    /// L2 penalty on the weights; the bias is not regularized
    pub l2_regularization: f64,
    /// Initial step size of the decaying schedule
    pub learning_rate: f64,
    pub max_epochs: usize,
    /// Training stops once the relative change of the mean epoch loss drops below this
    pub convergence_tolerance: f64,
    /// Seed for the per-epoch shuffle of the training rows
    pub seed: u64,
}

impl Default for MaximumEntropyOptions {
    fn default() -> Self {
        Self {
            l2_regularization: 1e-4,
            learning_rate: 0.5,
            max_epochs: 50,
            convergence_tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl MaximumEntropyOptions {
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.l2_regularization < 0.0 {
            return Err(PipelineError::Validation("l2_regularization cannot be negative".into()));
        }
        if self.learning_rate <= 0.0 {
            return Err(PipelineError::Validation("learning_rate must be positive".into()));
        }
        if self.learning_rate * self.l2_regularization >= 1.0 {
            return Err(PipelineError::Validation(
                "learning_rate * l2_regularization must stay below 1".into(),
            ));
        }
        if self.max_epochs == 0 {
            return Err(PipelineError::Validation("max_epochs must be positive".into()));
        }
        Ok(())
    }
}

/// Fits a [`LinearModel`] by seeded stochastic gradient descent on the regularized log-loss.
#[derive(Debug, Clone, Default)]
pub struct MaximumEntropyTrainer {
    options: MaximumEntropyOptions,
}

impl MaximumEntropyTrainer {
    pub fn new(options: MaximumEntropyOptions) -> Self {
        Self { options }
    }

    /// Trains on every row of `view` whose `label` key is present.
    ///
    /// # Errors
    /// - `MissingColumn` / `ColumnType` if the label or feature column is absent or mistyped
    /// - `Training` if there are no classes, no labeled rows, or no features
    pub fn fit(&self, view: &DataView, label: &str, features: &str) -> Result<LinearModel, PipelineError> {
        let options = &self.options;
        options.validate()?;

        let labels = view.key(label)?;
        let vectors = view.vector(features)?;
        let classes = labels.values().to_vec();
        let dimension = vectors.dimension();

        if classes.is_empty() {
            return Err(PipelineError::Training(format!("Label column '{}' has no values", label)));
        }
        if dimension == 0 {
            return Err(PipelineError::Training(format!("Feature column '{}' is empty", features)));
        }

        let examples: Vec<(usize, usize)> = labels
            .keys()
            .iter()
            .enumerate()
            .filter_map(|(row, key)| key.map(|k| (row, k as usize)))
            .collect();
        if examples.is_empty() {
            return Err(PipelineError::Training("No labeled rows to train on".into()));
        }

        info!(
            "Training maximum entropy model: {} rows, {} classes, {} features",
            examples.len(),
            classes.len(),
            dimension
        );

        let class_count = classes.len();
        let mut weights = Array2::<f32>::zeros((class_count, dimension));
        let mut bias = Array1::<f32>::zeros(class_count);
        // Weights are stored as `scale * weights` so the L2 decay is O(1) per step.
        let mut scale = 1.0f64;
        let mut step = 0u64;
        let mut previous_loss: Option<f64> = None;
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut rng = StdRng::seed_from_u64(options.seed);

        for epoch in 0..options.max_epochs {
            order.shuffle(&mut rng);
            let mut total_loss = 0.0f64;

            for &i in &order {
                let (row, target) = examples[i];
                let x = &vectors.rows()[row];
                let eta = options.learning_rate / (1.0 + options.learning_rate * options.l2_regularization * step as f64);

                let probabilities = Self::probabilities(&weights, scale, &bias, x);
                total_loss -= (probabilities[target] as f64).max(PROBABILITY_FLOOR).ln();

                scale *= 1.0 - eta * options.l2_regularization;
                if scale < MIN_WEIGHT_SCALE {
                    let factor = scale as f32;
                    weights.mapv_inplace(|w| w * factor);
                    scale = 1.0;
                }

                for (class, &p) in probabilities.iter().enumerate() {
                    let gradient = p as f64 - if class == target { 1.0 } else { 0.0 };
                    if gradient == 0.0 {
                        continue;
                    }
                    let delta = eta * gradient;
                    let mut class_weights = weights.row_mut(class);
                    for (j, v) in x.iter() {
                        class_weights[j] -= (delta * v as f64 / scale) as f32;
                    }
                    bias[class] -= delta as f32;
                }
                step += 1;
            }

            let mean_loss = total_loss / examples.len() as f64;
            debug!("Epoch {}: mean log-loss {:.6}", epoch + 1, mean_loss);

            if let Some(previous) = previous_loss {
                let change = (previous - mean_loss).abs() / previous.max(f64::EPSILON);
                if change < options.convergence_tolerance {
                    info!("Converged after {} epochs (mean log-loss {:.6})", epoch + 1, mean_loss);
                    break;
                }
            }
            previous_loss = Some(mean_loss);
        }

        let factor = scale as f32;
        weights.mapv_inplace(|w| w * factor);

        Ok(LinearModel {
            label: label.to_string(),
            features: features.to_string(),
            classes,
            weights,
            bias,
        })
    }

    fn probabilities(weights: &Array2<f32>, scale: f64, bias: &Array1<f32>, x: &SparseVector) -> Array1<f32> {
        let mut logits = Array1::from_iter(
            weights
                .rows()
                .into_iter()
                .zip(bias.iter())
                .map(|(row, b)| (scale * x.dot(&row) as f64) as f32 + b),
        );
        softmax(&mut logits);
        logits
    }
}

/// A fitted multiclass linear model over a feature vector column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub label: String,
    pub features: String,
    classes: Vec<String>,
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LinearModel {
    /// Class values, indexed by key
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn dimension(&self) -> usize {
        self.weights.ncols()
    }

    /// Softmax probability of each class for one feature vector
    pub fn predict_probabilities(&self, x: &SparseVector) -> Result<Array1<f32>, PipelineError> {
        if x.dimension() != self.dimension() {
            return Err(PipelineError::Validation(format!(
                "Feature vector has dimension {}, model expects {}",
                x.dimension(),
                self.dimension()
            )));
        }
        Ok(MaximumEntropyTrainer::probabilities(&self.weights, 1.0, &self.bias, x))
    }

    /// Adds the `Score` and `PredictedLabel` columns.
    pub fn transform(&self, mut view: DataView) -> Result<DataView, PipelineError> {
        let vectors = view.vector(&self.features)?;
        let mut scores = Array2::<f32>::zeros((view.row_count(), self.classes.len()));
        let mut predicted = Vec::with_capacity(view.row_count());

        for (row, x) in vectors.rows().iter().enumerate() {
            let probabilities = self.predict_probabilities(x)?;
            predicted.push(Some(argmax(probabilities.view()) as u32));
            scores.row_mut(row).assign(&probabilities);
        }

        view.set_column(SCORE_COLUMN, Column::Scores(scores))?;
        view.set_column(
            PREDICTED_LABEL_COLUMN,
            Column::Key(KeyColumn::new(predicted, self.classes.clone())),
        )?;
        Ok(view)
    }
}
