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

use super::decision_stump::{select_best_stump, DecisionStump};
use super::threshold::min_positive_score;
use super::{Classifier, Score, Statistics};
use crate::common::SampleSet;
use crate::error::{Error, Result};
use crate::feat::{HaarFeature, IntegralImage};
use crate::math;

/// Amount by which [`BoostedEnsemble::relax_threshold`] lowers the detection threshold.
pub const THRESHOLD_RELAXATION_STEP: f64 = 0.001;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WeightedStump {
    pub stump: DecisionStump,
    pub vote_weight: f64,
}

/// Weighted vote of decision stumps compared against a detection threshold.
#[derive(Clone, Debug, Default)]
pub struct BoostedEnsemble {
    stumps: Vec<WeightedStump>,
    detection_threshold: f64,
}

impl BoostedEnsemble {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_parts(stumps: Vec<WeightedStump>, detection_threshold: f64) -> Self {
        BoostedEnsemble {
            stumps,
            detection_threshold,
        }
    }

    /// Runs `rounds` boosting rounds on `samples`, consuming chosen features from `pool`.
    pub fn train(samples: &SampleSet, pool: &mut Vec<HaarFeature>, rounds: usize) -> Result<Self> {
        let mut trainer = EnsembleTrainer::new(samples)?;
        for _ in 0..rounds {
            trainer.add_stump(pool)?;
        }
        Ok(trainer.finish())
    }

    #[inline]
    pub fn stumps(&self) -> &[WeightedStump] {
        &self.stumps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stumps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stumps.is_empty()
    }

    #[inline]
    pub fn detection_threshold(&self) -> f64 {
        self.detection_threshold
    }

    pub fn score(&self, integral: &IntegralImage) -> Score {
        let mut score = 0.0;
        for weighted in &self.stumps {
            if weighted.stump.classify(integral) {
                score += weighted.vote_weight;
            }
        }
        Score {
            positive: score >= self.detection_threshold,
            score,
        }
    }

    #[inline]
    pub fn detect(&self, integral: &IntegralImage) -> bool {
        self.score(integral).is_positive()
    }

    pub fn relax_threshold(&mut self) {
        self.detection_threshold -= THRESHOLD_RELAXATION_STEP;
    }
}

impl Classifier for BoostedEnsemble {
    #[inline]
    fn classify(&self, integral: &IntegralImage) -> bool {
        self.detect(integral)
    }
}

/// Outcome of one boosting round.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RoundReport {
    /// One-based number of the round.
    pub round: usize,
    pub error: f64,
    pub vote_weight: f64,
    /// Detection rate of the ensemble on its own training samples.
    pub detection_rate: f64,
    /// False-positive rate of the ensemble on its own training samples.
    pub false_positive_rate: f64,
}

/// AdaBoost over a fixed sample set, one stump at a time.
///
/// Keeps the sample weights and the running ensemble score of every sample, so
/// a round costs one pool search plus a single pass over the samples. After each
/// round the detection threshold is the lowest score among the positives, which
/// makes the ensemble accept every training positive.
pub struct EnsembleTrainer<'a> {
    samples: &'a SampleSet,
    weights: Vec<f64>,
    scores: Vec<f64>,
    ensemble: BoostedEnsemble,
}

impl<'a> EnsembleTrainer<'a> {
    pub fn new(samples: &'a SampleSet) -> Result<Self> {
        let positives = samples.positives();
        let negatives = samples.negatives();
        if positives == 0 || negatives == 0 {
            return Err(Error::InsufficientData {
                positives,
                negatives,
            });
        }

        let positive_weight = 1.0 / (2 * positives) as f64;
        let negative_weight = 1.0 / (2 * negatives) as f64;
        let weights = samples
            .labels()
            .iter()
            .map(|&positive| {
                if positive {
                    positive_weight
                } else {
                    negative_weight
                }
            })
            .collect();

        Ok(EnsembleTrainer {
            samples,
            weights,
            scores: vec![0.0; samples.len()],
            ensemble: BoostedEnsemble::new(),
        })
    }

    /// Runs one boosting round and removes the chosen feature from `pool`.
    ///
    /// Fails with [`Error::DegenerateError`] when the best error is NaN, zero or at
    /// least one; the pool and the ensemble are left untouched in that case.
    pub fn add_stump(&mut self, pool: &mut Vec<HaarFeature>) -> Result<RoundReport> {
        math::normalize(&mut self.weights);

        let (index, stump) = select_best_stump(pool, self.samples, &self.weights)?;
        let error = stump.error();
        if !(error > 0.0 && error < 1.0) {
            return Err(Error::DegenerateError { error });
        }
        pool.remove(index);

        let beta = error / (1.0 - error);
        let vote_weight = (1.0 / beta).ln();

        for (i, (integral, positive)) in self.samples.iter().enumerate() {
            let accepted = stump.classify(integral);
            if accepted == positive {
                self.weights[i] *= beta;
            }
            if accepted {
                self.scores[i] += vote_weight;
            }
        }

        self.ensemble.stumps.push(WeightedStump { stump, vote_weight });
        if let Some(threshold) = min_positive_score(&self.scores, self.samples.labels()) {
            self.ensemble.detection_threshold = threshold;
        }

        let statistics = self.statistics();
        Ok(RoundReport {
            round: self.ensemble.len(),
            error,
            vote_weight,
            detection_rate: statistics.detection_rate(),
            false_positive_rate: statistics.false_positive_rate(),
        })
    }

    /// Confusion counts of the current ensemble on the training samples.
    pub fn statistics(&self) -> Statistics {
        let threshold = self.ensemble.detection_threshold;
        self.scores
            .iter()
            .zip(self.samples.labels().iter())
            .map(|(&score, &positive)| (score >= threshold, positive))
            .collect()
    }

    pub fn relax_threshold(&mut self) {
        self.ensemble.relax_threshold();
    }

    #[inline]
    pub fn ensemble(&self) -> &BoostedEnsemble {
        &self.ensemble
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn finish(self) -> BoostedEnsemble {
        self.ensemble
    }
}
