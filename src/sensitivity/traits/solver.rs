//! Steady-state solver trait.

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::rhs::SteadyStateRhs;
use super::types::{SteadyStateSolution, SteadyStateSolveOptions};
use crate::sensitivity::error::SensitivityResult;

/// Trait for driving a steady-state problem f(u, p) = 0 to convergence.
///
/// The solver is a damped Newton iteration with exact forward-mode
/// Jacobians. Its output is the [`SteadyStateSolution`] the sensitivity
/// algorithms consume, so a problem can go from initial guess to parameter
/// gradient without leaving the crate.
pub trait SteadyStateSolverAlgorithms<R: Runtime> {
    /// Solve f(u, p) = 0 by damped Newton iteration from the guess `u0`.
    ///
    /// # Arguments
    ///
    /// * `f` - Steady-state residual
    /// * `u0` - Initial guess, shape `[n]`
    /// * `p` - Parameter vector
    /// * `options` - Tolerance, iteration cap, damping
    ///
    /// # Returns
    ///
    /// The last iterate together with its residual norm. Exhausting
    /// `max_iter` is not an error: the solution comes back with
    /// `converged` false so the caller can inspect how far it got.
    fn solve_steady_state<F>(
        &self,
        f: &F,
        u0: &Tensor<R>,
        p: &Tensor<R>,
        options: &SteadyStateSolveOptions,
    ) -> SensitivityResult<SteadyStateSolution<R>>
    where
        F: SteadyStateRhs<R, Self>,
        Self: Sized;
}
