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

use num::Num;

/// Computes the zero-padded prefix sums of a `width` x `height` row-major buffer.
///
/// The result has `(height + 1) * (width + 1)` cells; row 0 and column 0 are zero,
/// and cell `(i, j)` holds the sum of all source cells with row < i and col < j.
pub fn compute_integral<T: Num + Copy>(src: &[T], width: usize, height: usize) -> Vec<T> {
    assert_eq!(src.len(), width * height);

    let stride = width + 1;
    let mut dest = vec![T::zero(); stride * (height + 1)];
    if width == 0 || height == 0 {
        return dest;
    }

    // first row
    dest[stride + 1] = src[0];
    for x in 1..width {
        dest[stride + x + 1] = dest[stride + x] + src[x];
    }

    // first column
    for y in 1..height {
        dest[(y + 1) * stride + 1] = dest[y * stride + 1] + src[y * width];
    }

    for y in 1..height {
        let row = (y + 1) * stride;
        let prev_row = y * stride;
        for x in 1..width {
            dest[row + x + 1] =
                dest[prev_row + x + 1] + dest[row + x] - dest[prev_row + x] + src[y * width + x];
        }
    }

    dest
}

/// Scales `values` in place so that they sum to 1 and returns the sum before scaling.
///
/// A zero or non-finite sum turns every value into NaN or infinity.
pub fn normalize(values: &mut [f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    for value in values.iter_mut() {
        *value /= sum;
    }
    sum
}
