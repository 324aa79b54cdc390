// This file is part of haarcascade, a Viola-Jones face detection engine: Haar-like
// rectangle features, AdaBoost-trained decision stumps and an attentional cascade,
// as described in the following paper:
//
//      Rapid object detection using a boosted cascade of simple features,
//      Paul Viola, Michael Jones.
//      In CVPR 2001.
//
// You can redistribute haarcascade source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

mod boosted_ensemble;
mod decision_stump;
mod statistics;
mod threshold;

pub use self::boosted_ensemble::{
    BoostedEnsemble, EnsembleTrainer, RoundReport, WeightedStump, THRESHOLD_RELAXATION_STEP,
};
pub use self::decision_stump::{select_best_stump, DecisionStump};
pub use self::statistics::Statistics;
pub use self::threshold::{fit_threshold, min_positive_score, Polarity, ScoredSample, ThresholdFit};

use crate::feat::IntegralImage;

/// Anything that accepts or rejects a canvas-sized window.
pub trait Classifier {
    fn classify(&self, integral: &IntegralImage) -> bool;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    #[inline]
    fn classify(&self, integral: &IntegralImage) -> bool {
        (**self).classify(integral)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Score {
    positive: bool,
    score: f64,
}

impl Score {
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }
}
