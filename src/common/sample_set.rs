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

use std::sync::Arc;

use super::Image;
use crate::error::{Error, Result};
use crate::feat::{integrate_all, IntegralImage};

/// Labeled collection of same-sized integral images.
///
/// Integral images are shared, so subsets and concatenations are cheap and
/// the samples can be read from any thread.
#[derive(Clone, Debug, Default)]
pub struct SampleSet {
    integrals: Vec<Arc<IntegralImage>>,
    labels: Vec<bool>,
    width: u32,
    height: u32,
}

impl SampleSet {
    /// Integrates `images` and pairs them with `labels` (`true` marks a positive sample).
    pub fn new(images: &[Image], labels: &[bool]) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(Error::LengthMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        SampleSet::from_integrals(integrate_all(images), labels.to_vec())
    }

    pub fn from_integrals(integrals: Vec<IntegralImage>, labels: Vec<bool>) -> Result<Self> {
        if integrals.len() != labels.len() {
            return Err(Error::LengthMismatch {
                images: integrals.len(),
                labels: labels.len(),
            });
        }

        let (width, height) = integrals
            .first()
            .map_or((0, 0), |ii| (ii.width(), ii.height()));
        if let Some(ii) = integrals
            .iter()
            .find(|ii| ii.width() != width || ii.height() != height)
        {
            return Err(Error::InvalidImage(format!(
                "{}x{} image in a set of {}x{} images",
                ii.width(),
                ii.height(),
                width,
                height
            )));
        }

        Ok(SampleSet {
            integrals: integrals.into_iter().map(Arc::new).collect(),
            labels,
            width,
            height,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of every image in the set (0 for an empty set).
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of every image in the set (0 for an empty set).
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&label| label).count()
    }

    pub fn negatives(&self) -> usize {
        self.len() - self.positives()
    }

    #[inline]
    pub fn integral(&self, index: usize) -> &IntegralImage {
        &self.integrals[index]
    }

    #[inline]
    pub fn label(&self, index: usize) -> bool {
        self.labels[index]
    }

    #[inline]
    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IntegralImage, bool)> + '_ {
        self.integrals
            .iter()
            .map(|ii| &**ii)
            .zip(self.labels.iter().copied())
    }

    /// Subset of the samples for which `predicate` holds, in the original order.
    pub fn filter<P>(&self, mut predicate: P) -> SampleSet
    where
        P: FnMut(&IntegralImage, bool) -> bool,
    {
        let mut subset = SampleSet {
            integrals: Vec::new(),
            labels: Vec::new(),
            width: self.width,
            height: self.height,
        };
        for (ii, &label) in self.integrals.iter().zip(self.labels.iter()) {
            if predicate(&**ii, label) {
                subset.integrals.push(Arc::clone(ii));
                subset.labels.push(label);
            }
        }
        subset
    }

    /// Keeps the first `len` samples.
    pub fn truncate(&mut self, len: usize) {
        self.integrals.truncate(len);
        self.labels.truncate(len);
    }

    /// Appends the samples of `other`, which must hold images of the same size.
    pub fn extend(&mut self, other: &SampleSet) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            self.width = other.width;
            self.height = other.height;
        } else if (self.width, self.height) != (other.width, other.height) {
            return Err(Error::InvalidImage(format!(
                "cannot merge {}x{} samples into a set of {}x{} samples",
                other.width, other.height, self.width, self.height
            )));
        }
        self.integrals.extend(other.integrals.iter().cloned());
        self.labels.extend_from_slice(&other.labels);
        Ok(())
    }
}
