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
use std::hash::{Hash, Hasher};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::threshold::{fit_threshold, Polarity, ScoredSample};
use super::Classifier;
use crate::common::SampleSet;
use crate::error::{Error, Result};
use crate::feat::{HaarFeature, IntegralImage};

/// Single Haar feature with a learned threshold rule.
///
/// Two stumps are equal when they use the same feature.
#[derive(Copy, Clone, Debug)]
pub struct DecisionStump {
    feature: HaarFeature,
    threshold: f64,
    polarity: Polarity,
    error: f64,
}

impl DecisionStump {
    /// Creates a stump with a known rule and no training error, e.g. when loading a model.
    pub fn new(feature: HaarFeature, threshold: f64, polarity: Polarity) -> Self {
        DecisionStump {
            feature,
            threshold,
            polarity,
            error: 0.0,
        }
    }

    /// Fits the optimal threshold rule of `feature` on the weighted samples.
    ///
    /// `buffer` is scratch space reused across calls. Returns `None` for an empty set.
    pub fn fit(
        feature: HaarFeature,
        samples: &SampleSet,
        weights: &[f64],
        buffer: &mut Vec<ScoredSample>,
    ) -> Option<Self> {
        buffer.clear();
        buffer.extend(
            samples
                .iter()
                .zip(weights.iter())
                .map(|((integral, positive), &weight)| ScoredSample {
                    score: feature.apply(integral),
                    positive,
                    weight,
                }),
        );
        fit_threshold(buffer).map(|fit| DecisionStump {
            feature,
            threshold: fit.threshold,
            polarity: fit.polarity,
            error: fit.error,
        })
    }

    #[inline]
    pub fn feature(&self) -> &HaarFeature {
        &self.feature
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Weighted training error of the rule at fit time.
    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    #[inline]
    pub fn classify_score(&self, score: f64) -> bool {
        self.polarity.accepts(score, self.threshold)
    }
}

impl Classifier for DecisionStump {
    #[inline]
    fn classify(&self, integral: &IntegralImage) -> bool {
        self.classify_score(self.feature.apply(integral))
    }
}

impl PartialEq for DecisionStump {
    fn eq(&self, other: &Self) -> bool {
        self.feature == other.feature
    }
}

impl Eq for DecisionStump {}

impl Hash for DecisionStump {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.feature.hash(state);
    }
}

/// Fits every candidate in `pool` and returns the index and stump with the lowest error.
///
/// Ties go to the lowest index. A NaN error is preferred over any number so that
/// broken weights surface immediately.
pub fn select_best_stump(
    pool: &[HaarFeature],
    samples: &SampleSet,
    weights: &[f64],
) -> Result<(usize, DecisionStump)> {
    if pool.is_empty() {
        return Err(Error::PoolExhausted);
    }
    if samples.is_empty() {
        return Err(Error::InsufficientData {
            positives: 0,
            negatives: 0,
        });
    }
    if weights.len() != samples.len() {
        return Err(Error::LengthMismatch {
            images: samples.len(),
            labels: weights.len(),
        });
    }

    #[cfg(feature = "rayon")]
    let best = pool
        .par_iter()
        .enumerate()
        .map_init(
            || Vec::with_capacity(samples.len()),
            |buffer, (index, &feature)| {
                DecisionStump::fit(feature, samples, weights, buffer).map(|stump| (index, stump))
            },
        )
        .filter_map(|candidate| candidate)
        .reduce_with(better_candidate);

    #[cfg(not(feature = "rayon"))]
    let best = {
        let mut buffer = Vec::with_capacity(samples.len());
        pool.iter()
            .enumerate()
            .filter_map(|(index, &feature)| {
                DecisionStump::fit(feature, samples, weights, &mut buffer).map(|stump| (index, stump))
            })
            .reduce(better_candidate)
    };

    best.ok_or(Error::PoolExhausted)
}

fn better_candidate(
    a: (usize, DecisionStump),
    b: (usize, DecisionStump),
) -> (usize, DecisionStump) {
    let (ea, eb) = (a.1.error, b.1.error);
    let order = match (ea.is_nan(), eb.is_nan()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => ea.partial_cmp(&eb).unwrap_or(Ordering::Equal),
    }
    .then(a.0.cmp(&b.0));

    if order == Ordering::Greater {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Image;
    use crate::feat::{generate_features, FeatureType};
    use std::collections::HashSet;

    fn split_image(bright_left: bool) -> Image {
        Image::from_fn(4, 4, |x, _| if (x < 2) == bright_left { 1.0 } else { 0.0 })
    }

    fn left_right_set() -> SampleSet {
        let images = vec![
            split_image(true),
            split_image(true),
            split_image(false),
            split_image(false),
        ];
        SampleSet::new(&images, &[true, true, false, false]).unwrap()
    }

    #[test]
    fn test_separates_bright_left_from_bright_right() {
        let samples = left_right_set();
        let pool = generate_features(FeatureType::TwoHorizontal, 4, 4);
        let weights = vec![0.25; 4];

        let (index, stump) = select_best_stump(&pool, &samples, &weights).unwrap();
        // index 0 covers columns 0-1 only and sees no contrast, index 1 straddles the edge
        assert_eq!(1, index);
        let feature = stump.feature();
        assert_eq!(FeatureType::TwoHorizontal, feature.kind());
        assert_eq!((1, 0, 2, 1), (feature.x(), feature.y(), feature.width(), feature.height()));
        assert_eq!(Polarity::Positive, stump.polarity());
        assert_eq!(1.0, stump.threshold());
        assert_eq!(0.0, stump.error());
        for (integral, positive) in samples.iter() {
            assert_eq!(positive, stump.classify(integral));
        }
    }

    #[test]
    fn test_lowest_error_wins() {
        let samples = left_right_set();
        // a vertical split sees no difference between the classes
        let useless = HaarFeature::new(FeatureType::TwoVertical, 0, 0, 4, 4).unwrap();
        let useful = HaarFeature::new(FeatureType::TwoHorizontal, 0, 0, 4, 4).unwrap();
        let weights = vec![0.25; 4];

        let (index, stump) = select_best_stump(&[useless, useful], &samples, &weights).unwrap();
        assert_eq!(1, index);
        assert_eq!(useful, *stump.feature());
    }

    #[test]
    fn test_empty_pool() {
        let samples = left_right_set();
        assert!(matches!(
            select_best_stump(&[], &samples, &[0.25; 4]),
            Err(Error::PoolExhausted)
        ));
    }

    #[test]
    fn test_nan_error_wins_reduction() {
        let samples = left_right_set();
        let pool = generate_features(FeatureType::TwoHorizontal, 4, 4);
        let weights = vec![f64::NAN, 0.25, 0.25, 0.25];
        let (_, stump) = select_best_stump(&pool, &samples, &weights).unwrap();
        assert!(stump.error().is_nan());
    }

    #[test]
    fn test_equality_uses_feature_only() {
        let feature = HaarFeature::new(FeatureType::TwoHorizontal, 0, 0, 2, 2).unwrap();
        let a = DecisionStump::new(feature, 1.0, Polarity::Positive);
        let b = DecisionStump::new(feature, -3.0, Polarity::Negative);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }
}
