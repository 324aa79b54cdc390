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

use std::fmt;
use std::iter::FromIterator;
use std::ops::Add;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::Classifier;
use crate::common::SampleSet;

/// Confusion counts of a classifier over a labeled sample set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl Statistics {
    /// Runs `classifier` over every sample, in parallel when the `rayon` feature is on.
    pub fn evaluate<C>(classifier: &C, samples: &SampleSet) -> Self
    where
        C: Classifier + Sync + ?Sized,
    {
        let outcome = |index: usize| {
            let mut single = Statistics::default();
            single.record(
                classifier.classify(samples.integral(index)),
                samples.label(index),
            );
            single
        };

        #[cfg(feature = "rayon")]
        {
            (0..samples.len())
                .into_par_iter()
                .map(outcome)
                .reduce(Statistics::default, Statistics::add)
        }
        #[cfg(not(feature = "rayon"))]
        {
            (0..samples.len()).map(outcome).fold(Statistics::default(), Statistics::add)
        }
    }

    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    #[inline]
    pub fn positives(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    #[inline]
    pub fn negatives(&self) -> usize {
        self.true_negatives + self.false_positives
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.positives() + self.negatives()
    }

    /// Accepted positives over all positives; 0 without positives.
    pub fn detection_rate(&self) -> f64 {
        ratio(self.true_positives, self.positives())
    }

    /// Accepted negatives over all negatives; 0 without negatives.
    pub fn false_positive_rate(&self) -> f64 {
        ratio(self.false_positives, self.negatives())
    }

    pub fn false_negative_rate(&self) -> f64 {
        ratio(self.false_negatives, self.positives())
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

impl Add for Statistics {
    type Output = Statistics;

    fn add(self, other: Statistics) -> Statistics {
        Statistics {
            true_positives: self.true_positives + other.true_positives,
            false_positives: self.false_positives + other.false_positives,
            true_negatives: self.true_negatives + other.true_negatives,
            false_negatives: self.false_negatives + other.false_negatives,
        }
    }
}

/// Collects `(predicted, actual)` pairs.
impl FromIterator<(bool, bool)> for Statistics {
    fn from_iter<I: IntoIterator<Item = (bool, bool)>>(iter: I) -> Self {
        let mut statistics = Statistics::default();
        for (predicted, actual) in iter {
            statistics.record(predicted, actual);
        }
        statistics
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "detection rate {:.4}, false positive rate {:.6}, false negative rate {:.4}, accuracy {:.4} ({} positives, {} negatives)",
            self.detection_rate(),
            self.false_positive_rate(),
            self.false_negative_rate(),
            self.accuracy(),
            self.positives(),
            self.negatives()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Image;
    use crate::feat::IntegralImage;

    struct Brightness(f64);

    impl Classifier for Brightness {
        fn classify(&self, integral: &IntegralImage) -> bool {
            integral.rect_sum(0, 0, integral.width(), integral.height()) > self.0
        }
    }

    #[test]
    fn test_rates() {
        let statistics: Statistics = vec![
            (true, true),
            (true, true),
            (false, true),
            (true, false),
            (false, false),
            (false, false),
            (false, false),
        ]
        .into_iter()
        .collect();

        assert_eq!(3, statistics.positives());
        assert_eq!(4, statistics.negatives());
        assert!((statistics.detection_rate() - 2.0 / 3.0).abs() < 1e-12);
        assert!((statistics.false_negative_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(0.25, statistics.false_positive_rate());
        assert!((statistics.accuracy() - 5.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_rates_are_zero() {
        let statistics = Statistics::default();
        assert_eq!(0.0, statistics.detection_rate());
        assert_eq!(0.0, statistics.false_positive_rate());
    }

    #[test]
    fn test_evaluate() {
        let images: Vec<Image> = [0.1, 0.9, 0.2, 0.8]
            .iter()
            .map(|&v| Image::from_fn(2, 2, |_, _| v))
            .collect();
        let samples = SampleSet::new(&images, &[false, true, true, false]).unwrap();
        let statistics = Statistics::evaluate(&Brightness(2.0), &samples);
        assert_eq!(
            Statistics {
                true_positives: 1,
                false_positives: 1,
                true_negatives: 1,
                false_negatives: 1,
            },
            statistics
        );
    }
}
