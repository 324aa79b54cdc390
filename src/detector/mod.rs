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

mod trainer;

pub use self::trainer::{
    CascadeTrainer, LogObserver, StageSummary, TrainingEvent, TrainingObserver, TrainingOutcome,
    TrainingParams,
};

use crate::classifier::{BoostedEnsemble, Classifier};
use crate::common::{Image, SampleSet};
use crate::error::{Error, Result};
use crate::feat::IntegralImage;
use crate::Detector;

/// Attentional cascade: boosted stages evaluated in order, any rejection is final.
#[derive(Clone, Debug)]
pub struct Cascade {
    canvas_width: u32,
    canvas_height: u32,
    stages: Vec<BoostedEnsemble>,
}

impl Cascade {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Cascade {
            canvas_width,
            canvas_height,
            stages: vec![],
        }
    }

    #[inline]
    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    #[inline]
    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    #[inline]
    pub fn stages(&self) -> &[BoostedEnsemble] {
        &self.stages
    }

    #[inline]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Appends a stage; it must hold at least one stump and every feature must fit the canvas.
    pub fn push_stage(&mut self, stage: BoostedEnsemble) -> Result<()> {
        if stage.is_empty() {
            return Err(Error::InvalidParameter(
                "cannot append an empty stage".to_owned(),
            ));
        }
        if let Some(weighted) = stage
            .stumps()
            .iter()
            .find(|w| !w.stump.feature().fits(self.canvas_width, self.canvas_height))
        {
            return Err(Error::InvalidParameter(format!(
                "feature {:?} does not fit the {}x{} canvas",
                weighted.stump.feature(),
                self.canvas_width,
                self.canvas_height
            )));
        }
        self.stages.push(stage);
        Ok(())
    }

    #[inline]
    pub fn detect_integral(&self, integral: &IntegralImage) -> bool {
        self.rejected_on_stage_integral(integral).is_none()
    }

    /// Zero-based index of the first stage rejecting the window, `None` if all accept.
    pub fn rejected_on_stage_integral(&self, integral: &IntegralImage) -> Option<usize> {
        self.stages.iter().position(|stage| !stage.detect(integral))
    }

    /// Number of samples each stage has to evaluate.
    ///
    /// The first entry is always `samples.len()`; each later entry counts the
    /// samples accepted by all preceding stages.
    pub fn stage_workload(&self, samples: &SampleSet) -> Vec<usize> {
        let mut workload = vec![0; self.stages.len()];
        for (integral, _) in samples.iter() {
            let reached = self
                .rejected_on_stage_integral(integral)
                .map_or(self.stages.len(), |stage| stage + 1);
            for count in &mut workload[..reached] {
                *count += 1;
            }
        }
        workload
    }

    fn integrate(&self, image: &Image) -> IntegralImage {
        if !fits_canvas(image, self.canvas_width, self.canvas_height) {
            panic!(
                "Illegal image: {}x{} is smaller than the {}x{} canvas",
                image.width(),
                image.height(),
                self.canvas_width,
                self.canvas_height
            );
        }
        IntegralImage::new(image)
    }
}

#[inline]
fn fits_canvas(image: &Image, canvas_width: u32, canvas_height: u32) -> bool {
    image.width() >= canvas_width && image.height() >= canvas_height
}

impl Classifier for Cascade {
    #[inline]
    fn classify(&self, integral: &IntegralImage) -> bool {
        self.detect_integral(integral)
    }
}

impl Detector for Cascade {
    fn detect(&self, image: &Image) -> bool {
        self.detect_integral(&self.integrate(image))
    }

    fn rejected_on_stage(&self, image: &Image) -> Option<usize> {
        self.rejected_on_stage_integral(&self.integrate(image))
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}

/// Frozen stages followed by the stage still being trained.
pub(crate) struct CascadeView<'a> {
    stages: &'a [BoostedEnsemble],
    candidate: &'a BoostedEnsemble,
}

impl<'a> CascadeView<'a> {
    pub(crate) fn new(stages: &'a [BoostedEnsemble], candidate: &'a BoostedEnsemble) -> Self {
        CascadeView { stages, candidate }
    }
}

impl<'a> Classifier for CascadeView<'a> {
    fn classify(&self, integral: &IntegralImage) -> bool {
        self.stages.iter().all(|stage| stage.detect(integral)) && self.candidate.detect(integral)
    }
}
