use std::path::PathBuf;

use thiserror::Error;

use crate::camera::Pixel;
use crate::num::Number;

pub type Result<T, E = CalibrationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Bad intrinsics, ground truth or session settings. Fatal before any solve.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// A single rejected sample. The correspondence set is left untouched.
    #[error("rejected correspondence: {0}")]
    Input(#[from] InputError),
    /// The collected point set cannot determine a pose.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(#[from] GeometryError),
}

impl CalibrationError {
    /// Only input errors can be retried with another sample.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("intrinsic camera matrix is not invertible")]
    SingularIntrinsics,
    #[error("camera matrix must be 3x3 with 9 values, got {rows}x{cols} with {len} values")]
    MalformedCameraMatrix { rows: usize, cols: usize, len: usize },
    #[error("camera matrix has non-finite entries")]
    NonFiniteCameraMatrix,
    #[error("image size must be non-zero, got {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("depth scale must be positive and finite, got {0}")]
    InvalidDepthScale(Number),
    #[error("maximum depth must be positive and finite, got {0}")]
    InvalidMaxDepth(Number),
    #[error("rank tolerance must be in (0, 1), got {0}")]
    InvalidRankTolerance(Number),
    #[error("minimum spread ratio must be in [0, 1), got {0}")]
    InvalidSpreadRatio(Number),
    #[error("axis convention matrix is not orthogonal")]
    InvalidAxisConvention,
    #[error("ground truth line {line}: {reason}")]
    GroundTruth { line: usize, reason: String },
    #[error("ground truth has {got} points, at least {min} are required")]
    TooFewWorldPoints { got: usize, min: usize },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("zero depth at pixel {0}")]
    ZeroDepth(Pixel),
    #[error("invalid depth {depth} at pixel {pixel}")]
    InvalidDepth { pixel: Pixel, depth: Number },
    #[error("depth {depth} at pixel {pixel} exceeds the maximum {max}")]
    DepthOutOfRange {
        pixel: Pixel,
        depth: Number,
        max: Number,
    },
    #[error("pixel {pixel} is outside the {width}x{height} image")]
    PixelOutOfBounds { pixel: Pixel, width: u32, height: u32 },
    #[error("depth image dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("need at least {min} point correspondences, got {got}")]
    NotEnoughPoints { got: usize, min: usize },
    #[error("got {camera} camera points but {world} world points")]
    CountMismatch { camera: usize, world: usize },
    #[error("linear system has rank {rank}, {required} is required (collinear or coplanar points?)")]
    RankDeficient { rank: usize, required: usize },
    #[error("camera points are nearly coplanar: spread ratio {ratio:.3e} is below {min:.3e}")]
    IllConditioned { ratio: Number, min: Number },
    #[error("svd failed: {0}")]
    SvdFailed(&'static str),
}
