//! Extrinsic calibration of a depth camera from hand-picked correspondences.
//!
//! Pixels clicked on the depth image are back-projected with the camera
//! intrinsics, remapped into the rig's axis convention and paired in order
//! with surveyed world points. The pose `w = R p + t` is then solved as an
//! unconstrained linear least-squares problem whose 3x3 block is snapped to
//! the nearest rotation.

pub mod camera;
pub mod config;
pub mod error;
pub mod num;
pub mod session;
pub mod solver;
pub mod synthetic;
pub mod world;

pub use camera::{AxisConvention, BackProjector, DepthImage, Intrinsics, Pixel};
pub use config::SessionConfig;
pub use error::{CalibrationError, ConfigError, GeometryError, InputError};
pub use session::{CalibrationSession, Collection, Correspondence, SessionState};
pub use solver::{PoseReport, PoseResult, PoseSolver, Solver};
pub use world::WorldPointTable;
