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

use crate::error::{Error, Result};

/// Gray-scale image patch with intensities normalized to `[0, 1]`, stored row-major.
///
/// Every intensity is finite. The range itself is not enforced, so raw matrices
/// such as integral-image fixtures can be wrapped as well.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: Vec<f64>,
    width: u32,
    height: u32,
}

impl Image {
    pub fn new(data: Vec<f64>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "width ({}), height ({})",
                width, height
            )));
        }
        if data.len() != width as usize * height as usize {
            return Err(Error::InvalidImage(format!(
                "buffer of {} values for a {}x{} image",
                data.len(),
                width,
                height
            )));
        }
        if let Some(index) = data.iter().position(|value| !value.is_finite()) {
            return Err(Error::InvalidImage(format!(
                "non-finite intensity {} at ({}, {})",
                data[index],
                index % width as usize,
                index / width as usize
            )));
        }
        Ok(Image {
            data,
            width,
            height,
        })
    }

    /// Creates an image from a matrix given as rows of equal length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::InvalidImage(format!(
                    "row {} has {} columns, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend_from_slice(row);
        }
        Image::new(data, width as u32, rows.len() as u32)
    }

    /// Creates an image from 8-bit gray-scale pixels, mapping 0..=255 to 0.0..=1.0.
    pub fn from_luma(pixels: &[u8], width: u32, height: u32) -> Result<Self> {
        let data = pixels.iter().map(|&p| f64::from(p) / 255.0).collect();
        Image::new(data, width, height)
    }

    /// Creates an image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is 0 or if `f` returns a non-finite value.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> f64,
    {
        assert!(width > 0 && height > 0, "Illegal image size: {}x{}", width, height);

        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let value = f(x, y);
                assert!(value.is_finite(), "Illegal intensity at ({}, {}): {}", x, y, value);
                data.push(value);
            }
        }
        Image {
            data,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}
