use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::data::SparseVector;

/// Vector norm applied to featurized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Norm {
    None,
    L1,
    #[default]
    L2,
    Infinity,
}

pub(crate) fn normalize_vector(vec: &mut SparseVector, norm: Norm) {
    let length = match norm {
        Norm::None => return,
        Norm::L1 => vec.norm_l1(),
        Norm::L2 => vec.norm_l2(),
        Norm::Infinity => vec.norm_inf(),
    };
    if length > 1e-10 {
        vec.scale(1.0 / length);
    }
}

/// Turns logits into probabilities in place.
pub(crate) fn softmax(logits: &mut Array1<f32>) {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    logits.mapv_inplace(|x| (x - max).exp());
    let sum = logits.sum();
    if sum > 0.0 {
        logits.mapv_inplace(|x| x / sum);
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: ArrayView1<f32>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
