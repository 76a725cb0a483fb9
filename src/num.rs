use nalgebra::{Dyn, OMatrix, U12};

pub type Number = f64;

pub type Point2 = nalgebra::Point2<Number>;
pub type Point3 = nalgebra::Point3<Number>;

pub type Vector3 = nalgebra::Vector3<Number>;
pub type DVector = nalgebra::DVector<Number>;

pub type Matrix3 = nalgebra::Matrix3<Number>;

/// Coefficient matrix of the 12-unknown pose system, one row per scalar equation.
pub type CoeffMatrix = OMatrix<Number, Dyn, U12>;

pub type Pose3 = nalgebra::Isometry3<Number>;
