mod least_squares;
mod system;

pub use least_squares::{LeastSquares, LeastSquaresSolver, Solution};
pub use system::LinearSystem;
