mod base;
mod common;
mod linear;
mod pose;

pub use base::Solver;
pub use common::{center, spread_ratio};
pub use linear::*;
pub use pose::*;
