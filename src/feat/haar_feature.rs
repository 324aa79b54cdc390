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

use super::IntegralImage;

/// Rectangle template of a Haar-like feature.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum FeatureType {
    /// Left (white) and right (black) halves; width must be even.
    TwoHorizontal,
    /// Top (white) and bottom (black) halves; height must be even.
    TwoVertical,
    /// White outer thirds around a black middle third, side by side; width divisible by 3.
    ThreeHorizontal,
    /// White outer thirds around a black middle third, stacked; height divisible by 3.
    ThreeVertical,
    /// White top-left/bottom-right and black top-right/bottom-left quadrants; both sides even.
    FourDiagonal,
}

impl FeatureType {
    pub const ALL: [FeatureType; 5] = [
        FeatureType::TwoHorizontal,
        FeatureType::TwoVertical,
        FeatureType::ThreeHorizontal,
        FeatureType::ThreeVertical,
        FeatureType::FourDiagonal,
    ];

    #[inline]
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(FeatureType::TwoHorizontal),
            2 => Some(FeatureType::TwoVertical),
            3 => Some(FeatureType::ThreeHorizontal),
            4 => Some(FeatureType::ThreeVertical),
            5 => Some(FeatureType::FourDiagonal),
            _ => None,
        }
    }

    #[inline]
    pub fn id(self) -> i32 {
        match self {
            FeatureType::TwoHorizontal => 1,
            FeatureType::TwoVertical => 2,
            FeatureType::ThreeHorizontal => 3,
            FeatureType::ThreeVertical => 4,
            FeatureType::FourDiagonal => 5,
        }
    }

    /// Whether a bounding box of the given size can be split by this template.
    pub fn accepts(self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        match self {
            FeatureType::TwoHorizontal => width % 2 == 0,
            FeatureType::TwoVertical => height % 2 == 0,
            FeatureType::ThreeHorizontal => width % 3 == 0,
            FeatureType::ThreeVertical => height % 3 == 0,
            FeatureType::FourDiagonal => width % 2 == 0 && height % 2 == 0,
        }
    }
}

/// Haar-like feature: a template placed at `(x, y)` with a `width` x `height` bounding box.
///
/// Equality and hashing are purely geometric.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct HaarFeature {
    kind: FeatureType,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl HaarFeature {
    /// Returns `None` when the size violates the divisibility rule of `kind`.
    pub fn new(kind: FeatureType, x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        if !kind.accepts(width, height) {
            return None;
        }
        Some(HaarFeature {
            kind,
            x,
            y,
            width,
            height,
        })
    }

    #[inline]
    pub fn kind(&self) -> FeatureType {
        self.kind
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the bounding box lies inside a `width` x `height` canvas.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x + self.width <= width && self.y + self.height <= height
    }

    /// Signed contrast of the feature: black rectangles sum minus white rectangles sum.
    ///
    /// # Panics
    ///
    /// Panics if the feature does not fit into the integral image.
    pub fn apply(&self, integral: &IntegralImage) -> f64 {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);

        let (black, white) = match self.kind {
            FeatureType::TwoHorizontal => {
                let half = w / 2;
                let white = integral.rect_sum(x, y, half, h);
                let black = integral.rect_sum(x + half, y, half, h);
                (black, white)
            }
            FeatureType::TwoVertical => {
                let half = h / 2;
                let white = integral.rect_sum(x, y, w, half);
                let black = integral.rect_sum(x, y + half, w, half);
                (black, white)
            }
            FeatureType::ThreeHorizontal => {
                let third = w / 3;
                let white = integral.rect_sum(x, y, third, h)
                    + integral.rect_sum(x + 2 * third, y, third, h);
                let black = integral.rect_sum(x + third, y, third, h);
                (black, white)
            }
            FeatureType::ThreeVertical => {
                let third = h / 3;
                let white = integral.rect_sum(x, y, w, third)
                    + integral.rect_sum(x, y + 2 * third, w, third);
                let black = integral.rect_sum(x, y + third, w, third);
                (black, white)
            }
            FeatureType::FourDiagonal => {
                let half_w = w / 2;
                let half_h = h / 2;
                let white = integral.rect_sum(x, y, half_w, half_h)
                    + integral.rect_sum(x + half_w, y + half_h, half_w, half_h);
                let black = integral.rect_sum(x + half_w, y, half_w, half_h)
                    + integral.rect_sum(x, y + half_h, half_w, half_h);
                (black, white)
            }
        };

        black - white
    }
}

/// Enumerates every placement of every valid size of `kind` on the canvas.
///
/// Sizes are visited by height, then width; placements by row, then column.
/// Sizes the template cannot split are skipped.
pub fn generate_features(kind: FeatureType, canvas_width: u32, canvas_height: u32) -> Vec<HaarFeature> {
    let mut features = Vec::new();

    for height in 1..=canvas_height {
        for width in 1..=canvas_width {
            if !kind.accepts(width, height) {
                continue;
            }
            for y in 0..=(canvas_height - height) {
                for x in 0..=(canvas_width - width) {
                    features.push(HaarFeature {
                        kind,
                        x,
                        y,
                        width,
                        height,
                    });
                }
            }
        }
    }

    features
}

/// Candidate pool of all five feature types, in type order.
pub fn generate_all_features(canvas_width: u32, canvas_height: u32) -> Vec<HaarFeature> {
    FeatureType::ALL
        .iter()
        .flat_map(|&kind| generate_features(kind, canvas_width, canvas_height))
        .collect()
}
