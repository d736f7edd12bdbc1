//! Forward steady-state sensitivity trait.

use numr::runtime::Runtime;

use super::rhs::SteadyStateRhs;
use super::types::{ForwardSensitivity, SteadyStateSolution};
use crate::sensitivity::error::SensitivityResult;

/// Trait for forward steady-state sensitivity analysis.
///
/// Computes the full sensitivity matrix du*/dp = −(∂f/∂u)⁻¹·(∂f/∂p) from
/// the implicit-function theorem. Costs one linear solve per parameter, so
/// it complements the adjoint: cheap for few parameters and many losses,
/// expensive for many parameters. It is also the natural cross-check for
/// adjoint gradients, since dL/dp = ∂g/∂p + (∂g/∂u)·(du*/dp).
pub trait ForwardSensitivityAlgorithms<R: Runtime> {
    /// Compute du*/dp at a converged steady state.
    ///
    /// Both ∂f/∂u and ∂f/∂p are materialized by forward-mode AD (the
    /// analytic Jacobian hook is honored for ∂f/∂u) and the block system
    /// is solved directly.
    ///
    /// # Arguments
    ///
    /// * `f` - Steady-state residual
    /// * `solution` - Converged steady state and its parameters
    ///
    /// # Returns
    ///
    /// `ForwardSensitivity` with the `[n, n_params]` matrix du*/dp.
    fn steady_state_forward<F>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<R>,
    ) -> SensitivityResult<ForwardSensitivity<R>>
    where
        F: SteadyStateRhs<R, Self>,
        Self: Sized;
}
