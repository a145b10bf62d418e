//! Multiclass classification metrics.

use std::fmt;

use log::{debug, warn};

use crate::classifier::{argmax, PipelineError, SCORE_COLUMN};
use crate::data::DataView;

const PROBABILITY_FLOOR: f64 = 1e-15;

/// Counts of (actual, predicted) class pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    fn new(classes: Vec<String>) -> Self {
        let n = classes.len();
        Self {
            classes,
            counts: vec![vec![0; n]; n],
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of rows of class `actual` predicted as `predicted`
    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.classes.iter().map(String::len).max().unwrap_or(0).max(6);
        write!(f, "{:width$}", "", width = width)?;
        for class in &self.classes {
            write!(f, " {:>width$}", class, width = width)?;
        }
        writeln!(f)?;
        for (class, row) in self.classes.iter().zip(&self.counts) {
            write!(f, "{:width$}", class, width = width)?;
            for count in row {
                write!(f, " {:>width$}", count, width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassMetrics {
    /// Fraction of rows predicted correctly
    pub micro_accuracy: f64,
    /// Mean of per-class accuracy over the classes present in the labels
    pub macro_accuracy: f64,
    pub log_loss: f64,
    /// Improvement of the log-loss over always predicting the label distribution
    pub log_loss_reduction: f64,
    /// Mean log-loss of the rows of each class; `NaN` for classes without rows
    pub per_class_log_loss: Vec<f64>,
    /// Fraction of rows whose true class ranks within the top `k`, when requested
    pub top_k_accuracy: Option<f64>,
    pub confusion_matrix: ConfusionMatrix,
}

impl fmt::Display for MulticlassMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MicroAccuracy:    {}", format_fixed(self.micro_accuracy))?;
        writeln!(f, "MacroAccuracy:    {}", format_fixed(self.macro_accuracy))?;
        writeln!(f, "LogLoss:          {}", format_optional_integer(self.log_loss))?;
        writeln!(f, "LogLossReduction: {}", format_optional_integer(self.log_loss_reduction))
    }
}

/// Compares the label keys of a view against the trainer's scores.
#[derive(Debug, Clone)]
pub struct MulticlassEvaluator {
    pub label_column: String,
    pub score_column: String,
    pub top_k: Option<usize>,
}

impl Default for MulticlassEvaluator {
    fn default() -> Self {
        Self {
            label_column: "Label".to_string(),
            score_column: SCORE_COLUMN.to_string(),
            top_k: None,
        }
    }
}

impl MulticlassEvaluator {
    /// Rows with a missing label are skipped.
    ///
    /// # Errors
    /// - `MissingColumn` / `ColumnType` for absent or mistyped columns
    /// - `Evaluation` if the label and score classes disagree or no row is labeled
    pub fn evaluate(&self, view: &DataView) -> Result<MulticlassMetrics, PipelineError> {
        let labels = view.key(&self.label_column)?;
        let scores = view.scores(&self.score_column)?;
        let class_count = scores.ncols();

        if labels.cardinality() != class_count {
            return Err(PipelineError::Evaluation(format!(
                "Label column has {} classes but scores have {}",
                labels.cardinality(),
                class_count
            )));
        }

        let mut rows = 0usize;
        let mut correct = 0usize;
        let mut top_k_hits = 0usize;
        let mut log_loss_sum = 0.0f64;
        let mut class_rows = vec![0usize; class_count];
        let mut class_correct = vec![0usize; class_count];
        let mut class_log_loss = vec![0.0f64; class_count];
        let mut confusion = ConfusionMatrix::new(labels.values().to_vec());

        for (row, key) in labels.keys().iter().enumerate() {
            let Some(actual) = key.map(|k| k as usize) else {
                continue;
            };
            let probabilities = scores.row(row);
            let predicted = argmax(probabilities);
            let p_true = probabilities[actual] as f64;
            let loss = -p_true.max(PROBABILITY_FLOOR).ln();

            rows += 1;
            log_loss_sum += loss;
            class_rows[actual] += 1;
            class_log_loss[actual] += loss;
            confusion.counts[actual][predicted] += 1;
            if predicted == actual {
                correct += 1;
                class_correct[actual] += 1;
            }
            if let Some(k) = self.top_k {
                let rank = probabilities.iter().filter(|&&p| p > probabilities[actual]).count();
                if rank < k {
                    top_k_hits += 1;
                }
            }
        }

        let skipped = labels.keys().len() - rows;
        if skipped > 0 {
            warn!("Skipped {} rows without a known label", skipped);
        }
        if rows == 0 {
            return Err(PipelineError::Evaluation("No labeled rows to evaluate".into()));
        }

        let n = rows as f64;
        let present: Vec<usize> = (0..class_count).filter(|&c| class_rows[c] > 0).collect();
        let macro_accuracy = present
            .iter()
            .map(|&c| class_correct[c] as f64 / class_rows[c] as f64)
            .sum::<f64>()
            / present.len() as f64;
        let log_loss = log_loss_sum / n;
        let prior_log_loss: f64 = present
            .iter()
            .map(|&c| {
                let p = class_rows[c] as f64 / n;
                -p * p.ln()
            })
            .sum();
        let log_loss_reduction = if prior_log_loss > 0.0 {
            (prior_log_loss - log_loss) / prior_log_loss
        } else {
            0.0
        };
        let per_class_log_loss = class_log_loss
            .iter()
            .zip(&class_rows)
            .map(|(&sum, &count)| if count > 0 { sum / count as f64 } else { f64::NAN })
            .collect();

        debug!("Confusion matrix:\n{}", confusion);

        Ok(MulticlassMetrics {
            micro_accuracy: correct as f64 / n,
            macro_accuracy,
            log_loss,
            log_loss_reduction,
            per_class_log_loss,
            top_k_accuracy: self.top_k.map(|_| top_k_hits as f64 / n),
            confusion_matrix: confusion,
        })
    }
}

/// Evaluates `view` with the default `Label` and `Score` columns.
pub fn evaluate_multiclass(view: &DataView) -> Result<MulticlassMetrics, PipelineError> {
    MulticlassEvaluator::default().evaluate(view)
}

/// Rounds to at most three decimals, midpoints away from zero, and drops trailing
/// zeros: `0.5`, `1`, `0.123`, `0.813` for `0.8125`.
pub fn format_fixed(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Like [`format_fixed`] but without a zero integer part (`.5`), and empty for zero.
pub fn format_optional_integer(value: f64) -> String {
    let text = format_fixed(value);
    if text == "0" {
        return String::new();
    }
    if let Some(rest) = text.strip_prefix("0.") {
        return format!(".{}", rest);
    }
    if let Some(rest) = text.strip_prefix("-0.") {
        return format!("-.{}", rest);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, KeyColumn};
    use ndarray::array;

    fn scored_view(keys: Vec<Option<u32>>, scores: ndarray::Array2<f32>) -> DataView {
        let mut view = DataView::new(keys.len());
        view.set_column(
            "Label",
            Column::Key(KeyColumn::new(keys, vec!["a".into(), "b".into()])),
        )
        .unwrap();
        view.set_column(SCORE_COLUMN, Column::Scores(scores)).unwrap();
        view
    }

    #[test]
    fn test_metrics_on_known_predictions() -> Result<(), PipelineError> {
        let view = scored_view(
            vec![Some(0), Some(0), Some(0), Some(1)],
            array![[0.9, 0.1], [0.8, 0.2], [0.4, 0.6], [0.3, 0.7]],
        );
        let metrics = evaluate_multiclass(&view)?;

        assert!((metrics.micro_accuracy - 0.75).abs() < 1e-9);
        assert!((metrics.macro_accuracy - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-9);
        let expected_log_loss = -(0.9f64.ln() + 0.8f64.ln() + 0.4f64.ln() + 0.7f64.ln()) / 4.0;
        assert!((metrics.log_loss - expected_log_loss).abs() < 1e-6);
        let prior = -(0.75f64 * 0.75f64.ln() + 0.25 * 0.25f64.ln());
        assert!((metrics.log_loss_reduction - (prior - expected_log_loss) / prior).abs() < 1e-6);
        assert_eq!(metrics.confusion_matrix.count(0, 1), 1);
        assert_eq!(metrics.confusion_matrix.count(1, 1), 1);
        Ok(())
    }

    #[test]
    fn test_missing_labels_are_skipped() -> Result<(), PipelineError> {
        let view = scored_view(vec![Some(1), None], array![[0.2, 0.8], [0.9, 0.1]]);
        let metrics = evaluate_multiclass(&view)?;
        assert_eq!(metrics.micro_accuracy, 1.0);
        assert!(metrics.per_class_log_loss[0].is_nan());
        Ok(())
    }

    #[test]
    fn test_no_labeled_rows_is_an_error() {
        let view = scored_view(vec![None], array![[0.5, 0.5]]);
        assert!(matches!(evaluate_multiclass(&view), Err(PipelineError::Evaluation(_))));
    }

    #[test]
    fn test_top_k_accuracy() -> Result<(), PipelineError> {
        let view = scored_view(vec![Some(0), Some(1)], array![[0.4, 0.6], [0.3, 0.7]]);
        let evaluator = MulticlassEvaluator {
            top_k: Some(2),
            ..Default::default()
        };
        assert_eq!(evaluator.evaluate(&view)?.top_k_accuracy, Some(1.0));
        Ok(())
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(format_fixed(0.5), "0.5");
        assert_eq!(format_fixed(1.0), "1");
        assert_eq!(format_fixed(0.12345), "0.123");
        assert_eq!(format_fixed(0.0), "0");
        assert_eq!(format_optional_integer(0.5236), ".524");
        assert_eq!(format_optional_integer(1.25), "1.25");
        assert_eq!(format_optional_integer(-0.25), "-.25");
        assert_eq!(format_optional_integer(0.0), "");
    }

    #[test]
    fn test_midpoints_round_away_from_zero() {
        assert_eq!(format_fixed(0.8125), "0.813");
        assert_eq!(format_fixed(0.5625), "0.563");
        assert_eq!(format_fixed(0.3125), "0.313");
        assert_eq!(format_fixed(-0.0625), "-0.063");
        assert_eq!(format_optional_integer(0.0625), ".063");
        assert_eq!(format_optional_integer(13.0 / 16.0), ".813");
    }

    #[test]
    fn test_report_layout() -> Result<(), PipelineError> {
        let view = scored_view(vec![Some(0), Some(1)], array![[0.9, 0.1], [0.2, 0.8]]);
        let report = evaluate_multiclass(&view)?.to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "MicroAccuracy:    1");
        assert!(lines[2].starts_with("LogLoss:          ."));
        Ok(())
    }
}
