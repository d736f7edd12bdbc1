//! Types for steady-state sensitivity analysis.
//!
//! These types configure and store results from computing parameter gradients
//! of steady states via the adjoint method or forward sensitivities.

use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Strategy for representing the state Jacobian ∂f/∂u in the adjoint solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JacobianStrategy {
    /// Pick based on the state dimension: explicit at or below the
    /// configured threshold, matrix-free above it.
    #[default]
    Auto,

    /// Materialize the dense Jacobian and solve the transposed system
    /// directly. Robust for small systems.
    Explicit,

    /// Never form the Jacobian; apply (∂f/∂u)ᵀ through reverse-mode
    /// pullbacks inside an iterative Krylov solve. Scales to large systems.
    MatrixFree,
}

/// Options for steady-state adjoint sensitivity analysis.
#[derive(Debug, Clone)]
pub struct SteadyStateAdjointOptions {
    /// Jacobian representation strategy (default: Auto).
    pub strategy: JacobianStrategy,

    /// State dimension at or below which `Auto` materializes the dense
    /// Jacobian (default: 50).
    ///
    /// Forming an n×n Jacobian costs n forward-mode passes and a dense
    /// solve; above the threshold the matrix-free path amortizes better.
    pub jacobian_threshold: usize,

    /// Relative tolerance for the matrix-free linear solve (default: 1e-10).
    ///
    /// Convergence is declared at residual ≤ max(rtol·‖rhs‖, atol).
    pub linsolve_rtol: f64,

    /// Absolute tolerance for the matrix-free linear solve (default: 1e-12).
    pub linsolve_atol: f64,

    /// Iteration cap for the matrix-free linear solve (default: the state
    /// dimension, at which GMRES is exact in exact arithmetic).
    pub linsolve_max_iter: Option<usize>,
}

impl Default for SteadyStateAdjointOptions {
    fn default() -> Self {
        Self {
            strategy: JacobianStrategy::Auto,
            jacobian_threshold: 50,
            linsolve_rtol: 1e-10,
            linsolve_atol: 1e-12,
            linsolve_max_iter: None,
        }
    }
}

impl SteadyStateAdjointOptions {
    /// Force a Jacobian strategy.
    pub fn with_strategy(mut self, strategy: JacobianStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the explicit-Jacobian dimension threshold used by `Auto`.
    pub fn with_jacobian_threshold(mut self, threshold: usize) -> Self {
        self.jacobian_threshold = threshold;
        self
    }

    /// Set tolerances for the matrix-free linear solve.
    pub fn with_linsolve_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.linsolve_rtol = rtol;
        self.linsolve_atol = atol;
        self
    }

    /// Cap the matrix-free linear solve iterations.
    pub fn with_linsolve_max_iter(mut self, max_iter: usize) -> Self {
        self.linsolve_max_iter = Some(max_iter);
        self
    }
}

/// Options for the damped-Newton steady-state solver.
#[derive(Debug, Clone)]
pub struct SteadyStateSolveOptions {
    /// Residual norm at which the state counts as steady (default: 1e-10).
    pub tol: f64,

    /// Maximum Newton iterations (default: 100).
    pub max_iter: usize,

    /// Step damping factor in (0, 1] (default: 1.0, full Newton steps).
    pub damping: f64,
}

impl Default for SteadyStateSolveOptions {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_iter: 100,
            damping: 1.0,
        }
    }
}

impl SteadyStateSolveOptions {
    /// Set the residual tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }
}

/// A converged steady state together with the parameters that produced it.
///
/// Produced by the crate's Newton solver or wrapped around an externally
/// computed state. Read-only during gradient computation.
#[derive(Debug, Clone)]
pub struct SteadyStateSolution<R: Runtime> {
    /// Converged state u with f(u, p) ≈ 0, shape `[n]`.
    pub u: Tensor<R>,

    /// Parameter vector, shape `[n_params]`.
    pub p: Tensor<R>,

    /// Residual norm ‖f(u, p)‖ reported by the solver.
    pub residual_norm: f64,

    /// Solver iterations spent reaching the state.
    pub iterations: usize,

    /// Whether the solver reported convergence.
    pub converged: bool,
}

impl<R: Runtime> SteadyStateSolution<R> {
    /// Wrap an externally computed steady state.
    pub fn new(u: Tensor<R>, p: Tensor<R>) -> Self {
        Self {
            u,
            p,
            residual_norm: 0.0,
            iterations: 0,
            converged: true,
        }
    }

    /// State dimension n.
    pub fn n(&self) -> usize {
        self.u.numel()
    }

    /// Parameter count.
    pub fn n_params(&self) -> usize {
        self.p.numel()
    }

    /// Get the state as a Vec<f64>.
    pub fn u_vec(&self) -> Vec<f64> {
        self.u.to_vec()
    }
}

/// Result of a steady-state adjoint gradient computation.
#[derive(Debug, Clone)]
pub struct AdjointGradient<R: Runtime> {
    /// Gradient of the loss with respect to parameters: dg/dp `[n_params]`.
    pub gradient: Tensor<R>,

    /// Adjoint variable λ solving Jᵀλ = ∂g/∂u, shape `[n]`.
    pub lambda: Tensor<R>,

    /// The strategy that actually ran (`Auto` resolved away).
    pub strategy: JacobianStrategy,

    /// Loss value g(u, p), when a loss closure was supplied.
    pub loss: Option<f64>,

    /// Residual evaluations, counting each AD pass through f as one.
    pub nfev: usize,

    /// Iterations spent by the linear solve (0 on the direct path).
    pub linsolve_iterations: usize,

    /// Final residual of the linear solve (0 on the direct path).
    pub linsolve_residual: f64,
}

impl<R: Runtime> AdjointGradient<R> {
    /// Get the gradient as a Vec<f64>.
    pub fn gradient_vec(&self) -> Vec<f64> {
        self.gradient.to_vec()
    }

    /// Get the adjoint variable as a Vec<f64>.
    pub fn lambda_vec(&self) -> Vec<f64> {
        self.lambda.to_vec()
    }
}

/// Result of forward steady-state sensitivity analysis.
#[derive(Debug, Clone)]
pub struct ForwardSensitivity<R: Runtime> {
    /// Sensitivity matrix du/dp = −J⁻¹·(∂f/∂p), shape `[n, n_params]`.
    pub du_dp: Tensor<R>,

    /// Residual evaluations, counting each AD pass through f as one.
    pub nfev: usize,
}

impl<R: Runtime> ForwardSensitivity<R> {
    /// Get the sensitivity matrix as a row-major Vec<f64>.
    pub fn du_dp_vec(&self) -> Vec<f64> {
        self.du_dp.to_vec()
    }
}
