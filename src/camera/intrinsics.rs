use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Pixel;
use crate::error::{ConfigError, Result};
use crate::num::{Matrix3, Number};

/// A `{ rows, cols, data }` block as written by ROS camera_info yaml files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Number>,
}

/// Intrinsic calibration of one camera as stored on disk.
///
/// Fields other than the ones below (rectification, projection) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicsRecord {
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub camera_name: Option<String>,
    pub camera_matrix: MatrixRecord,
    #[serde(default)]
    pub distortion_model: Option<String>,
    #[serde(default)]
    pub distortion_coefficients: Option<MatrixRecord>,
}

/// Validated pinhole intrinsics with a precomputed inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Intrinsics {
    width: u32,
    height: u32,
    camera_matrix: Matrix3,
    camera_matrix_inv: Matrix3,
    distortion: Vec<Number>,
}

impl Intrinsics {
    pub fn new(camera_matrix: Matrix3, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidImageSize { width, height }.into());
        }
        if camera_matrix.iter().any(|x| !x.is_finite()) {
            return Err(ConfigError::NonFiniteCameraMatrix.into());
        }

        let camera_matrix_inv = camera_matrix
            .try_inverse()
            .filter(|inv| inv.iter().all(|x| x.is_finite()))
            .ok_or(ConfigError::SingularIntrinsics)?;

        Ok(Self {
            width,
            height,
            camera_matrix,
            camera_matrix_inv,
            distortion: Vec::new(),
        })
    }

    /// Pinhole intrinsics without skew.
    pub fn from_focal(
        fx: Number,
        fy: Number,
        cx: Number,
        cy: Number,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let camera_matrix = Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0);
        Self::new(camera_matrix, width, height)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let record: IntrinsicsRecord = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        Self::try_from(record)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
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
    pub fn camera_matrix(&self) -> &Matrix3 {
        &self.camera_matrix
    }

    #[inline]
    pub fn camera_matrix_inv(&self) -> &Matrix3 {
        &self.camera_matrix_inv
    }

    /// Lens distortion coefficients. Only the external undistortion step uses them.
    #[inline]
    pub fn distortion(&self) -> &[Number] {
        &self.distortion
    }

    #[inline]
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.index_in(self.width, self.height).is_some()
    }
}

impl TryFrom<IntrinsicsRecord> for Intrinsics {
    type Error = crate::error::CalibrationError;

    fn try_from(record: IntrinsicsRecord) -> Result<Self> {
        let matrix = &record.camera_matrix;
        if matrix.rows != 3 || matrix.cols != 3 || matrix.data.len() != 9 {
            return Err(ConfigError::MalformedCameraMatrix {
                rows: matrix.rows,
                cols: matrix.cols,
                len: matrix.data.len(),
            }
            .into());
        }

        let camera_matrix = Matrix3::from_row_slice(&matrix.data);
        let mut intrinsics = Self::new(camera_matrix, record.image_width, record.image_height)?;
        if let Some(distortion) = record.distortion_coefficients {
            intrinsics.distortion = distortion.data;
        }
        Ok(intrinsics)
    }
}
