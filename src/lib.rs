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

mod classifier;
mod common;
mod detector;
mod error;
mod feat;
mod math;
pub mod model;

pub use crate::classifier::{
    fit_threshold, min_positive_score, select_best_stump, BoostedEnsemble, Classifier,
    DecisionStump, EnsembleTrainer, Polarity, RoundReport, Score, ScoredSample, Statistics,
    ThresholdFit, WeightedStump, THRESHOLD_RELAXATION_STEP,
};
pub use crate::common::{Image, SampleSet};
pub use crate::detector::{
    Cascade, CascadeTrainer, LogObserver, StageSummary, TrainingEvent, TrainingObserver,
    TrainingOutcome, TrainingParams,
};
pub use crate::error::{Error, Result};
pub use crate::feat::{
    generate_all_features, generate_features, integrate_all, FeatureType, HaarFeature,
    IntegralImage,
};
pub use crate::model::{load_model, read_model, save_model, write_model};

/// Create a detector from a file written by [`save_model`].
pub fn create_detector<P: AsRef<std::path::Path>>(path_to_model: P) -> Result<Box<dyn Detector>> {
    let cascade = load_model(path_to_model)?;
    Ok(create_detector_with_model(cascade))
}

/// Create a detector from an already loaded cascade.
pub fn create_detector_with_model(cascade: Cascade) -> Box<dyn Detector> {
    Box::new(cascade)
}

/// Face detector working on canvas-sized windows.
///
/// # Examples
///
/// ```rust,no_run
/// use haarcascade::{Detector, Image};
///
/// let detector = haarcascade::create_detector("/path/to/model").unwrap();
/// let (width, height) = detector.canvas_size();
/// let image = Image::from_fn(width, height, |_, _| 0.5);
/// println!("face: {}", detector.detect(&image));
/// ```
pub trait Detector: Send + Sync {
    /// Runs the cascade on the top-left canvas-sized window of `image`.
    ///
    /// # Panics
    ///
    /// Panics if `image` is narrower or shorter than the canvas.
    fn detect(&self, image: &Image) -> bool;

    /// Zero-based index of the stage that rejects `image`, `None` when every stage accepts.
    ///
    /// # Panics
    ///
    /// Panics if `image` is narrower or shorter than the canvas.
    fn rejected_on_stage(&self, image: &Image) -> Option<usize>;

    /// Width and height of the window the detector was trained on.
    fn canvas_size(&self) -> (u32, u32);
}
