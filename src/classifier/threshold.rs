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

use std::cmp::Ordering;

/// Direction of a threshold comparison.
///
/// `Positive` classifies scores strictly below the threshold as positive,
/// `Negative` classifies scores strictly above it as positive.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    #[inline]
    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            1 => Some(Polarity::Positive),
            -1 => Some(Polarity::Negative),
            _ => None,
        }
    }

    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
        }
    }

    /// Applies the rule `score * p < threshold * p`.
    #[inline]
    pub fn accepts(self, score: f64, threshold: f64) -> bool {
        match self {
            Polarity::Positive => score < threshold,
            Polarity::Negative => score > threshold,
        }
    }
}

/// A feature response of one sample together with its label and boosting weight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScoredSample {
    pub score: f64,
    pub positive: bool,
    pub weight: f64,
}

/// Best threshold rule found by [`fit_threshold`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ThresholdFit {
    pub threshold: f64,
    pub polarity: Polarity,
    pub error: f64,
}

/// Finds the threshold and polarity minimizing the weighted misclassification of `samples`.
///
/// Candidate thresholds are the observed scores. Samples are sorted in place, so
/// the slice doubles as the caller's scratch buffer. Returns `None` for an empty slice.
pub fn fit_threshold(samples: &mut [ScoredSample]) -> Option<ThresholdFit> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable_by(|a, b| a.score.total_cmp(&b.score));

    let (total_pos, total_neg) = samples.iter().fold((0.0, 0.0), |(pos, neg), s| {
        if s.positive {
            (pos + s.weight, neg)
        } else {
            (pos, neg + s.weight)
        }
    });

    let mut pos_below = 0.0;
    let mut neg_below = 0.0;
    let mut best: Option<(f64, Polarity, f64)> = None;

    let n = samples.len();
    let mut i = 0;
    while i < n {
        let value = samples[i].score;
        let mut pos_equal = 0.0;
        let mut neg_equal = 0.0;

        let mut j = i;
        loop {
            let sample = &samples[j];
            if sample.positive {
                pos_equal += sample.weight;
            } else {
                neg_equal += sample.weight;
            }
            j += 1;
            if j >= n || samples[j].score.total_cmp(&value) != Ordering::Equal {
                break;
            }
        }

        // samples equal to `value` are negative under both rules
        let err_below = neg_below + (total_pos - pos_below);
        let err_above = (pos_below + pos_equal) + (total_neg - neg_below - neg_equal);
        let (polarity, err) = if err_above < err_below {
            (Polarity::Negative, err_above)
        } else {
            (Polarity::Positive, err_below)
        };

        if best.map_or(true, |(_, _, best_err)| err < best_err) {
            best = Some((value, polarity, err));
        }

        pos_below += pos_equal;
        neg_below += neg_equal;
        i = j;
    }

    best.map(|(threshold, polarity, _)| {
        let error = samples
            .iter()
            .filter(|s| polarity.accepts(s.score, threshold) != s.positive)
            .map(|s| s.weight)
            .sum();
        ThresholdFit {
            threshold,
            polarity,
            error,
        }
    })
}

/// Lowest score among the samples labeled positive.
pub fn min_positive_score(scores: &[f64], labels: &[bool]) -> Option<f64> {
    scores
        .iter()
        .zip(labels.iter())
        .filter(|(_, &positive)| positive)
        .map(|(&score, _)| score)
        .reduce(f64::min)
}
