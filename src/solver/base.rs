pub trait Solver<R>: Send + Sync
where
    R: Send + Sync,
{
    /// Tolerance below which `nalgebra`'s SVD considers an off-diagonal entry converged.
    const SVD_EPS: f64 = f64::EPSILON;
    /// Iteration cap for the SVD sweeps, so non-finite input fails instead of spinning.
    const SVD_MAX_ITER: usize = 1000;

    fn solve(self) -> R;
}
