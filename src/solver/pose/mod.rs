mod base;
mod procrustes;
mod rigid;

pub use base::{PoseReport, PoseResult};
pub use procrustes::nearest_rotation;
pub use rigid::PoseSolver;
