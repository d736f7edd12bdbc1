//! Steady-state sensitivity analysis.
//!
//! Computes parameter gradients of steady states without differentiating
//! through the nonlinear solver that produced them.
//!
//! # Overview
//!
//! For a steady state u* satisfying f(u*, p) = 0 and a scalar loss
//! L = g(u*, p), the implicit function theorem turns dL/dp into one linear
//! solve: the adjoint system (∂f/∂u)ᵀ·λ = (∂g/∂u)ᵀ followed by
//! dL/dp = ∂g/∂p − λᵀ·(∂f/∂p). The cost is independent of the number of
//! parameters, which is what makes the adjoint form the right tool for
//! fitting and design problems with many parameters.
//!
//! # Jacobian Strategies
//!
//! Small systems materialize ∂f/∂u with forward-mode AD and solve the
//! transposed system directly; large systems keep the Jacobian implicit
//! and run matrix-free GMRES over reverse-mode pullbacks. The crossover is
//! automatic with a configurable threshold and a hard override.
//!
//! # Example
//!
//! ```ignore
//! use sensr::sensitivity::{
//!     SteadyStateAdjointAlgorithms, SteadyStateAdjointOptions, SteadyStateRhs,
//!     SteadyStateSolverAlgorithms, SteadyStateSolveOptions,
//! };
//! use numr::autograd::{var_mul, var_sum};
//!
//! // Solve f(u, p) = 0, then differentiate L = Σ u² with respect to p
//! let solution = client.solve_steady_state(
//!     &f, &u0, &p, &SteadyStateSolveOptions::default(),
//! )?;
//!
//! let g = |u: &Var<R>, _p: &Var<R>, c: &C| {
//!     let sq = var_mul(u, u, c)?;
//!     var_sum(&sq, &[0], false, c)
//! };
//! let grad = client.steady_state_adjoint(
//!     &f, &solution, g, &SteadyStateAdjointOptions::default(),
//! )?;
//!
//! // grad.gradient contains dL/dp, grad.lambda the adjoint variable
//! ```

pub mod cpu;
pub mod error;
pub mod impl_generic;
pub mod traits;

// Re-exports
pub use error::{SensitivityError, SensitivityResult};
pub use impl_generic::{
    solve_steady_state_impl, steady_state_adjoint_impl, steady_state_forward_impl,
};
pub use traits::{
    AdjointGradient, ForwardSensitivity, ForwardSensitivityAlgorithms, JacobianStrategy,
    SteadyStateAdjointAlgorithms, SteadyStateAdjointOptions, SteadyStateRhs, SteadyStateSolution,
    SteadyStateSolveOptions, SteadyStateSolverAlgorithms,
};
