mod backproject;
mod convention;
mod depth;
mod intrinsics;

pub use backproject::BackProjector;
pub use convention::AxisConvention;
pub use depth::{DepthImage, DepthSample};
pub use intrinsics::{Intrinsics, IntrinsicsRecord, MatrixRecord};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::num::{Number, Point2};

/// Integer pixel coordinate as clicked by the operator, column `x` and row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Row-major index into a `width` x `height` buffer, if the pixel is inside.
    #[inline]
    pub fn index_in(&self, width: u32, height: u32) -> Option<usize> {
        if self.x < 0 || self.y < 0 || self.x as u32 >= width || self.y as u32 >= height {
            return None;
        }
        Some(self.y as usize * width as usize + self.x as usize)
    }

    #[inline]
    pub fn to_point(&self) -> Point2 {
        Point2::new(self.x as Number, self.y as Number)
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
