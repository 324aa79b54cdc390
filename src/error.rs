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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Images length ({images}) does not match labels length ({labels})")]
    LengthMismatch { images: usize, labels: usize },

    #[error("Insufficient data: {positives} positive and {negatives} negative samples")]
    InsufficientData { positives: usize, negatives: usize },

    #[error("Degenerate weighted error {error}: vote weight is not finite")]
    DegenerateError { error: f64 },

    #[error("Candidate feature pool is exhausted")]
    PoolExhausted,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
