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

use log::{debug, info};

use super::{Cascade, CascadeView};
use crate::classifier::{EnsembleTrainer, RoundReport, Statistics};
use crate::common::SampleSet;
use crate::error::{Error, Result};
use crate::feat::HaarFeature;

/// Goals of cascade training.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrainingParams {
    /// Largest false-positive rate a stage may keep, relative to the cascade before it.
    pub max_false_positive_rate: f64,
    /// Smallest detection rate a stage may keep, relative to the cascade before it.
    pub min_detection_rate: f64,
    /// Overall false-positive rate at which training stops.
    pub target_false_positive_rate: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        TrainingParams {
            max_false_positive_rate: 0.5,
            min_detection_rate: 0.6,
            target_false_positive_rate: 1e-4,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<()> {
        let in_open_unit = |value: f64| value > 0.0 && value < 1.0;
        if !in_open_unit(self.max_false_positive_rate) {
            return Err(Error::InvalidParameter(format!(
                "max false positive rate must lie in (0, 1), got {}",
                self.max_false_positive_rate
            )));
        }
        if !in_open_unit(self.min_detection_rate) {
            return Err(Error::InvalidParameter(format!(
                "min detection rate must lie in (0, 1), got {}",
                self.min_detection_rate
            )));
        }
        if !(self.target_false_positive_rate >= 0.0 && self.target_false_positive_rate < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "target false positive rate must lie in [0, 1), got {}",
                self.target_false_positive_rate
            )));
        }
        Ok(())
    }
}

/// Validation results of a finished stage, measured on the cascade up to and including it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StageSummary {
    pub stumps: usize,
    pub detection_rate: f64,
    pub false_positive_rate: f64,
    pub detection_threshold: f64,
    pub relaxations: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrainingEvent {
    StageStarted {
        stage: usize,
        positives: usize,
        negatives: usize,
    },
    StumpAdded {
        stage: usize,
        report: RoundReport,
        validation: Statistics,
    },
    ThresholdRelaxed {
        stage: usize,
        threshold: f64,
        validation: Statistics,
    },
    StageCompleted {
        stage: usize,
        summary: StageSummary,
    },
    PoolRebuilt {
        stage: usize,
        survivors: usize,
        hard_negatives: usize,
    },
    Finished {
        stages: usize,
        statistics: Statistics,
    },
}

/// Receives progress of a training run.
pub trait TrainingObserver {
    fn on_event(&mut self, event: &TrainingEvent);
}

impl<F: FnMut(&TrainingEvent)> TrainingObserver for F {
    fn on_event(&mut self, event: &TrainingEvent) {
        self(event)
    }
}

/// Forwards training progress to the `log` facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogObserver;

impl TrainingObserver for LogObserver {
    fn on_event(&mut self, event: &TrainingEvent) {
        match event {
            TrainingEvent::StageStarted {
                stage,
                positives,
                negatives,
            } => info!(
                "stage {}: training on {} positives and {} negatives",
                stage, positives, negatives
            ),
            TrainingEvent::StumpAdded {
                stage,
                report,
                validation,
            } => debug!(
                "stage {} round {}: error {:.6}, vote {:.4}, validation D {:.4} F {:.6}",
                stage,
                report.round,
                report.error,
                report.vote_weight,
                validation.detection_rate(),
                validation.false_positive_rate()
            ),
            TrainingEvent::ThresholdRelaxed {
                stage,
                threshold,
                validation,
            } => debug!(
                "stage {}: threshold relaxed to {:.4}, validation D {:.4} F {:.6}",
                stage,
                threshold,
                validation.detection_rate(),
                validation.false_positive_rate()
            ),
            TrainingEvent::StageCompleted { stage, summary } => info!(
                "stage {} done: {} stumps, D {:.4}, F {:.6}, {} relaxations",
                stage,
                summary.stumps,
                summary.detection_rate,
                summary.false_positive_rate,
                summary.relaxations
            ),
            TrainingEvent::PoolRebuilt {
                stage,
                survivors,
                hard_negatives,
            } => info!(
                "stage {}: next pool keeps {} samples and adds {} hard negatives",
                stage, survivors, hard_negatives
            ),
            TrainingEvent::Finished { stages, statistics } => {
                info!("training finished with {} stages: {}", stages, statistics)
            }
        }
    }
}

pub struct TrainingOutcome {
    pub cascade: Cascade,
    pub stages: Vec<StageSummary>,
    /// The trained cascade evaluated on the whole training set.
    pub statistics: Statistics,
}

/// Builds a cascade stage by stage until the validation false-positive rate
/// reaches the target.
///
/// # Examples
///
/// ```rust,no_run
/// use haarcascade::{generate_all_features, CascadeTrainer, SampleSet, TrainingParams};
///
/// # fn run(training: SampleSet, validation: SampleSet) -> haarcascade::Result<()> {
/// let trainer = CascadeTrainer::new(TrainingParams::default())?;
/// let outcome = trainer.train(generate_all_features(19, 19), &training, &validation)?;
/// haarcascade::save_model(&outcome.cascade, "face.cascade")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CascadeTrainer {
    params: TrainingParams,
}

impl CascadeTrainer {
    pub fn new(params: TrainingParams) -> Result<Self> {
        params.validate()?;
        Ok(CascadeTrainer { params })
    }

    #[inline]
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Trains with progress reported through [`LogObserver`].
    pub fn train(
        &self,
        features: Vec<HaarFeature>,
        training: &SampleSet,
        validation: &SampleSet,
    ) -> Result<TrainingOutcome> {
        self.train_with_observer(features, training, validation, &mut LogObserver)
    }

    pub fn train_with_observer(
        &self,
        features: Vec<HaarFeature>,
        training: &SampleSet,
        validation: &SampleSet,
        observer: &mut dyn TrainingObserver,
    ) -> Result<TrainingOutcome> {
        check_pool(training)?;
        check_pool(validation)?;
        let (width, height) = (training.width(), training.height());
        if (validation.width(), validation.height()) != (width, height) {
            return Err(Error::InvalidImage(format!(
                "validation samples are {}x{}, training samples are {}x{}",
                validation.width(),
                validation.height(),
                width,
                height
            )));
        }
        if let Some(feature) = features.iter().find(|f| !f.fits(width, height)) {
            return Err(Error::InvalidParameter(format!(
                "feature {:?} does not fit {}x{} samples",
                feature, width, height
            )));
        }

        let TrainingParams {
            max_false_positive_rate: f,
            min_detection_rate: d,
            target_false_positive_rate: target,
        } = self.params;

        let mut pool = features;
        let mut cascade = Cascade::new(width, height);
        let mut summaries = Vec::new();
        let mut stage_samples = training.clone();
        let mut previous_fp_rate = 1.0;
        let mut previous_detection_rate = 1.0;

        while previous_fp_rate > target {
            let stage = cascade.stage_count();
            observer.on_event(&TrainingEvent::StageStarted {
                stage,
                positives: stage_samples.positives(),
                negatives: stage_samples.negatives(),
            });

            let mut trainer = EnsembleTrainer::new(&stage_samples)?;
            let mut fp_rate = previous_fp_rate;
            let mut detection_rate = previous_detection_rate;
            let mut relaxations = 0;

            while fp_rate > f * previous_fp_rate {
                let report = trainer.add_stump(&mut pool)?;
                let mut statistics = evaluate(&cascade, &trainer, validation);
                observer.on_event(&TrainingEvent::StumpAdded {
                    stage,
                    report,
                    validation: statistics,
                });

                while statistics.detection_rate() < d * previous_detection_rate {
                    trainer.relax_threshold();
                    relaxations += 1;
                    statistics = evaluate(&cascade, &trainer, validation);
                    observer.on_event(&TrainingEvent::ThresholdRelaxed {
                        stage,
                        threshold: trainer.ensemble().detection_threshold(),
                        validation: statistics,
                    });
                }

                fp_rate = statistics.false_positive_rate();
                detection_rate = statistics.detection_rate();
            }

            let ensemble = trainer.finish();
            let summary = StageSummary {
                stumps: ensemble.len(),
                detection_rate,
                false_positive_rate: fp_rate,
                detection_threshold: ensemble.detection_threshold(),
                relaxations,
            };
            cascade.push_stage(ensemble)?;
            observer.on_event(&TrainingEvent::StageCompleted { stage, summary });
            summaries.push(summary);

            previous_fp_rate = fp_rate;
            previous_detection_rate = detection_rate;

            if previous_fp_rate > target {
                let (next, hard_negatives) = bootstrap(&cascade, &stage_samples, validation)?;
                observer.on_event(&TrainingEvent::PoolRebuilt {
                    stage,
                    survivors: next.len() - hard_negatives,
                    hard_negatives,
                });
                stage_samples = next;
            }
        }

        let statistics = Statistics::evaluate(&cascade, training);
        observer.on_event(&TrainingEvent::Finished {
            stages: cascade.stage_count(),
            statistics,
        });

        Ok(TrainingOutcome {
            cascade,
            stages: summaries,
            statistics,
        })
    }
}

fn check_pool(samples: &SampleSet) -> Result<()> {
    let positives = samples.positives();
    let negatives = samples.negatives();
    if positives == 0 || negatives == 0 {
        return Err(Error::InsufficientData {
            positives,
            negatives,
        });
    }
    Ok(())
}

fn evaluate(cascade: &Cascade, trainer: &EnsembleTrainer, validation: &SampleSet) -> Statistics {
    Statistics::evaluate(
        &CascadeView::new(cascade.stages(), trainer.ensemble()),
        validation,
    )
}

/// Training samples for the next stage: validation negatives the cascade still
/// accepts, followed by the current samples that survive the cascade.
///
/// Hard negatives are capped at the surplus of surviving positives over
/// surviving negatives. Returns the new set and the number of hard negatives in it.
fn bootstrap(
    cascade: &Cascade,
    current: &SampleSet,
    validation: &SampleSet,
) -> Result<(SampleSet, usize)> {
    let survivors = current.filter(|integral, _| cascade.detect_integral(integral));
    let cap = survivors.positives().saturating_sub(survivors.negatives());

    let mut next = validation.filter(|integral, positive| !positive && cascade.detect_integral(integral));
    next.truncate(cap);
    let hard_negatives = next.len();
    next.extend(&survivors)?;
    Ok((next, hard_negatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::THRESHOLD_RELAXATION_STEP;
    use crate::common::Image;
    use crate::feat::{generate_all_features, FeatureType};

    fn split_image(left: f64, right: f64) -> Image {
        Image::from_fn(4, 4, |x, _| if x < 2 { left } else { right })
    }

    /// 4x4 image that passes the left-bright horizontal stump when `left` is set
    /// and the top-bright vertical stump when `top` is set.
    fn quadrant_image(left: bool, top: bool) -> Image {
        let lr = if left { 0.25 } else { -0.25 };
        let tb = if top { 0.25 } else { -0.25 };
        Image::from_fn(4, 4, |x, y| {
            let horizontal = if x < 2 { lr } else { -lr };
            let vertical = if y < 2 { tb } else { -tb };
            0.5 + horizontal + vertical
        })
    }

    fn quadrant_set(groups: &[(bool, bool, bool, usize)]) -> SampleSet {
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for &(positive, left, top, count) in groups {
            for _ in 0..count {
                images.push(quadrant_image(left, top));
                labels.push(positive);
            }
        }
        SampleSet::new(&images, &labels).unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = TrainingParams::default();
        assert_eq!(0.5, params.max_false_positive_rate);
        assert_eq!(0.6, params.min_detection_rate);
        assert_eq!(1e-4, params.target_false_positive_rate);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let invalid = [
            TrainingParams {
                max_false_positive_rate: 1.0,
                ..Default::default()
            },
            TrainingParams {
                min_detection_rate: 0.0,
                ..Default::default()
            },
            TrainingParams {
                target_false_positive_rate: 1.0,
                ..Default::default()
            },
            TrainingParams {
                target_false_positive_rate: f64::NAN,
                ..Default::default()
            },
        ];
        for params in invalid.iter() {
            assert!(matches!(
                CascadeTrainer::new(*params),
                Err(Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_rejects_features_outside_samples() {
        let samples = SampleSet::new(
            &[split_image(1.0, 0.0), split_image(0.0, 1.0)],
            &[true, false],
        )
        .unwrap();
        let trainer = CascadeTrainer::new(TrainingParams::default()).unwrap();
        let result = trainer.train(generate_all_features(5, 5), &samples, &samples);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_requires_both_classes_in_validation() {
        let training = SampleSet::new(
            &[split_image(1.0, 0.0), split_image(0.0, 1.0)],
            &[true, false],
        )
        .unwrap();
        let validation = SampleSet::new(&[split_image(1.0, 0.0)], &[true]).unwrap();
        let trainer = CascadeTrainer::new(TrainingParams::default()).unwrap();
        let result = trainer.train(generate_all_features(4, 4), &training, &validation);
        assert!(matches!(
            result,
            Err(Error::InsufficientData {
                positives: 1,
                negatives: 0
            })
        ));
    }

    #[test]
    fn test_bootstrap_caps_hard_negatives() {
        // a cascade with no stages accepts everything
        let cascade = Cascade::new(4, 4);
        let current = SampleSet::new(
            &[
                split_image(1.0, 0.0),
                split_image(0.9, 0.0),
                split_image(0.8, 0.0),
                split_image(0.0, 1.0),
            ],
            &[true, true, true, false],
        )
        .unwrap();
        let validation = SampleSet::new(
            &[
                split_image(0.0, 0.1),
                split_image(1.0, 0.0),
                split_image(0.0, 0.2),
                split_image(0.0, 0.3),
            ],
            &[false, true, false, false],
        )
        .unwrap();

        let (next, hard_negatives) = bootstrap(&cascade, &current, &validation).unwrap();
        assert_eq!(2, hard_negatives);
        assert_eq!(6, next.len());
        assert_eq!(
            vec![false, false, true, true, true, false],
            next.labels().to_vec()
        );
        // hard negatives keep validation order
        assert!((next.integral(0).rect_sum(2, 0, 2, 2) - 0.4).abs() < 1e-12);
        assert!((next.integral(1).rect_sum(2, 0, 2, 2) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_no_hard_negatives_without_positive_surplus() {
        let cascade = Cascade::new(4, 4);
        let current = SampleSet::new(
            &[split_image(1.0, 0.0), split_image(0.0, 1.0)],
            &[true, false],
        )
        .unwrap();
        let validation = SampleSet::new(
            &[split_image(0.0, 0.5), split_image(1.0, 0.0)],
            &[false, true],
        )
        .unwrap();
        let (next, hard_negatives) = bootstrap(&cascade, &current, &validation).unwrap();
        assert_eq!(0, hard_negatives);
        assert_eq!(vec![true, false], next.labels().to_vec());
    }

    #[test]
    fn test_observer_sees_every_stage() {
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for i in 0..6 {
            let jitter = f64::from(i) * 0.02;
            images.push(split_image(0.9 - jitter, 0.1 + jitter));
            labels.push(true);
            images.push(split_image(0.1 + jitter, 0.9 - jitter));
            labels.push(false);
        }
        // identical to a positive, so every round has a non-zero error
        images.push(split_image(0.9, 0.1));
        labels.push(false);
        let samples = SampleSet::new(&images, &labels).unwrap();

        let trainer = CascadeTrainer::new(TrainingParams {
            target_false_positive_rate: 0.2,
            ..Default::default()
        })
        .unwrap();
        let mut events = Vec::new();
        let outcome = trainer
            .train_with_observer(
                generate_all_features(4, 4),
                &samples,
                &samples,
                &mut |event: &TrainingEvent| events.push(event.clone()),
            )
            .unwrap();

        let started = events
            .iter()
            .filter(|e| matches!(e, TrainingEvent::StageStarted { .. }))
            .count();
        assert_eq!(outcome.cascade.stage_count(), started);
        assert_eq!(outcome.stages.len(), started);
        assert!(matches!(events.last(), Some(TrainingEvent::Finished { .. })));
        assert!(outcome.stages.last().unwrap().false_positive_rate <= 0.2);
        assert_eq!(1.0, outcome.statistics.detection_rate());
    }

    #[test]
    fn test_relaxes_threshold_for_weaker_validation_positives() {
        let horizontal = HaarFeature::new(FeatureType::TwoHorizontal, 0, 0, 4, 4).unwrap();
        let vertical = HaarFeature::new(FeatureType::TwoVertical, 0, 0, 4, 4).unwrap();

        // The vertical stump wins round one with error 0.2. Reweighting favors the
        // horizontal stump in round two (error 0.15625), so it gets the larger vote.
        let training = quadrant_set(&[
            (true, true, true, 10),
            (false, false, true, 4),
            (false, true, false, 5),
            (false, false, false, 1),
        ]);
        // Only 40% of these positives pass both stumps, 70% pass the horizontal one.
        // Negatives mostly pass the vertical stump only.
        let validation = quadrant_set(&[
            (true, true, true, 4),
            (true, true, false, 3),
            (true, false, true, 3),
            (false, false, true, 6),
            (false, true, false, 2),
            (false, false, false, 2),
        ]);

        let trainer = CascadeTrainer::new(TrainingParams {
            max_false_positive_rate: 0.5,
            min_detection_rate: 0.6,
            target_false_positive_rate: 0.5,
        })
        .unwrap();
        let mut events = Vec::new();
        let outcome = trainer
            .train_with_observer(
                vec![horizontal, vertical],
                &training,
                &validation,
                &mut |event: &TrainingEvent| events.push(event.clone()),
            )
            .unwrap();

        assert_eq!(1, outcome.stages.len());
        let summary = outcome.stages[0];
        assert_eq!(2, summary.stumps);
        assert!(summary.relaxations > 0);
        assert!(summary.detection_rate >= 0.6);
        assert!((summary.detection_rate - 0.7).abs() < 1e-12);
        assert!((summary.false_positive_rate - 0.2).abs() < 1e-12);

        let stage = &outcome.cascade.stages()[0];
        let stumps = stage.stumps();
        assert_eq!(vertical, *stumps[0].stump.feature());
        assert_eq!(horizontal, *stumps[1].stump.feature());
        let (vertical_vote, horizontal_vote) = (stumps[0].vote_weight, stumps[1].vote_weight);
        assert!((vertical_vote - 4.0f64.ln()).abs() < 1e-12);
        assert!((horizontal_vote - 5.4f64.ln()).abs() < 1e-12);

        // relaxed from the lowest training positive score in steps of 0.001,
        // stopping at the first step that admits the horizontal-only positives
        let unrelaxed = vertical_vote + horizontal_vote;
        let threshold = stage.detection_threshold();
        assert_eq!(summary.detection_threshold, threshold);
        let steps = (unrelaxed - threshold) / THRESHOLD_RELAXATION_STEP;
        assert!((steps - summary.relaxations as f64).abs() < 1e-6);
        assert!(threshold <= horizontal_vote);
        assert!(threshold + THRESHOLD_RELAXATION_STEP > horizontal_vote);

        let relaxed: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                TrainingEvent::ThresholdRelaxed { threshold, .. } => Some(*threshold),
                _ => None,
            })
            .collect();
        assert_eq!(summary.relaxations, relaxed.len());
        assert_eq!(Some(&threshold), relaxed.last());
        assert!(relaxed.windows(2).all(|pair| pair[1] < pair[0]));
    }
}
