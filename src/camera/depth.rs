use num_traits::{ToPrimitive, Zero};

use super::Pixel;
use crate::error::{InputError, Result};

/// Raw depth sample type of a decoded depth image (`u16` millimetres for 16UC1 sensors).
pub trait DepthSample: Copy + Zero + ToPrimitive + Send + Sync {}

impl<T> DepthSample for T where T: Copy + Zero + ToPrimitive + Send + Sync {}

/// An already-decoded depth image in raw sensor units, row-major.
#[derive(Debug, Clone)]
pub struct DepthImage<T = u16> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T> DepthImage<T>
where
    T: DepthSample,
{
    pub fn new(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        let expected = (width as usize).saturating_mul(height as usize);
        if data.len() != expected {
            return Err(InputError::DimensionMismatch {
                expected,
                actual: data.len(),
            }
            .into());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw sample under `pixel`. Zero samples are returned as-is; the session rejects them.
    pub fn sample(&self, pixel: Pixel) -> Result<T> {
        let idx = pixel
            .index_in(self.width, self.height)
            .ok_or(InputError::PixelOutOfBounds {
                pixel,
                width: self.width,
                height: self.height,
            })?;
        Ok(self.data[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibrationError;

    #[test]
    fn rejects_shape_mismatch() {
        let err = DepthImage::<u16>::new(2, 2, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Input(InputError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn samples_row_major() {
        let image = DepthImage::new(3, 2, vec![10u16, 11, 12, 20, 21, 22]).unwrap();
        assert_eq!(image.sample(Pixel::new(0, 0)).unwrap(), 10);
        assert_eq!(image.sample(Pixel::new(2, 0)).unwrap(), 12);
        assert_eq!(image.sample(Pixel::new(1, 1)).unwrap(), 21);
        assert_eq!(image.sample(Pixel::new(2, 1)).unwrap(), 22);
    }

    #[test]
    fn out_of_bounds_is_an_input_error() {
        let image = DepthImage::new(3, 2, vec![1.5f32; 6]).unwrap();
        let err = image.sample(Pixel::new(3, 1)).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            CalibrationError::Input(InputError::PixelOutOfBounds { .. })
        ));
    }
}
