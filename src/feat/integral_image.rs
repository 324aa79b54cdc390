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

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::common::Image;
use crate::error::Result;
use crate::math;

/// Zero-padded prefix-sum table of an [`Image`].
///
/// For a `width` x `height` image the table holds `(height + 1) * (width + 1)` cells:
/// row 0 and column 0 are zero and cell `(x, y)` is the sum of all pixels left of
/// column `x` and above row `y`. Any rectangle sum is then four lookups.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegralImage {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl IntegralImage {
    pub fn new(image: &Image) -> Self {
        let width = image.width();
        let height = image.height();
        IntegralImage {
            width,
            height,
            data: math::compute_integral(image.data(), width as usize, height as usize),
        }
    }

    /// Builds the integral image of a matrix given as rows of equal length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        Ok(IntegralImage::new(&Image::from_rows(rows)?))
    }

    /// Width of the source image.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source image.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Table cell at column `x` and row `y`, both in `0..=width` / `0..=height`.
    #[inline]
    pub fn value(&self, x: u32, y: u32) -> f64 {
        self.data[y as usize * (self.width as usize + 1) + x as usize]
    }

    /// Sum of the source pixels in the rectangle with top-left corner `(x, y)`.
    #[inline]
    pub fn rect_sum(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        let right = x + width;
        let bottom = y + height;
        self.value(right, bottom) - self.value(right, y) - self.value(x, bottom) + self.value(x, y)
    }
}

/// Builds the integral images of `images`, in parallel when the `rayon` feature is on.
pub fn integrate_all(images: &[Image]) -> Vec<IntegralImage> {
    #[cfg(feature = "rayon")]
    {
        images.par_iter().map(IntegralImage::new).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        images.iter().map(IntegralImage::new).collect()
    }
}
