//! Steady-state adjoint sensitivity trait.
//!
//! Defines the interface for computing parameter gradients of converged
//! steady states through the adjoint linear system.

use numr::autograd::Var;
use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::rhs::SteadyStateRhs;
use super::types::{AdjointGradient, SteadyStateAdjointOptions, SteadyStateSolution};
use crate::sensitivity::error::SensitivityResult;

/// Trait for steady-state adjoint sensitivity algorithms.
///
/// Computes gradients of a scalar loss L = g(u*, p) with respect to
/// parameters p, where u* satisfies f(u*, p) = 0.
///
/// # Mathematical Background
///
/// Differentiating f(u*(p), p) = 0 gives the implicit-function identity
/// du*/dp = −(∂f/∂u)⁻¹ · (∂f/∂p). Substituted into the loss:
///
/// 1. Adjoint system: (∂f/∂u)ᵀ · λ = (∂g/∂u)ᵀ
/// 2. Gradient: dL/dp = ∂g/∂p − λᵀ · (∂f/∂p)
///
/// One linear solve of state dimension replaces a solve per parameter,
/// which is what makes the adjoint form the right choice for many-parameter
/// problems.
///
/// # Jacobian Strategy
///
/// Small systems materialize ∂f/∂u by forward-mode AD (or an analytic
/// routine, if the right-hand side provides one) and solve the transposed
/// system directly. Large systems never form the matrix: the transposed
/// action λ ↦ (∂f/∂u)ᵀλ comes from reverse-mode pullbacks at the fixed
/// state, applied inside an iterative Krylov solve. The crossover dimension
/// and a hard override live in [`SteadyStateAdjointOptions`].
pub trait SteadyStateAdjointAlgorithms<R: Runtime> {
    /// Compute the parameter gradient of a differentiable scalar loss.
    ///
    /// The loss is written with `Var` operations; its gradients with respect
    /// to both state and parameters come from one reverse-mode sweep.
    ///
    /// # Arguments
    ///
    /// * `f` - Steady-state residual with f(u, p) ≈ 0 at `solution.u`
    /// * `solution` - Converged steady state and its parameters
    /// * `g` - Scalar loss g(u, p) as a `Var` graph
    /// * `options` - Strategy and linear-solve configuration
    ///
    /// # Returns
    ///
    /// `AdjointGradient` containing dL/dp, the adjoint variable λ, and
    /// solve diagnostics.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use numr::autograd::{var_mul, var_sum};
    ///
    /// // L = sum(u²) at the steady state of f(u, p)
    /// let g = |u: &Var<R>, _p: &Var<R>, c: &C| {
    ///     let sq = var_mul(u, u, c)?;
    ///     var_sum(&sq, &[0], false, c)
    /// };
    ///
    /// let grad = client.steady_state_adjoint(&f, &solution, g, &options)?;
    /// ```
    fn steady_state_adjoint<F, G>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<R>,
        g: G,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<R>>
    where
        F: SteadyStateRhs<R, Self>,
        G: Fn(&Var<R>, &Var<R>, &Self) -> Result<Var<R>>,
        Self: Sized;

    /// Compute the parameter gradient from a user-supplied ∂g/∂u closure.
    ///
    /// Skips differentiating the loss: `dgdu` must return the length-n
    /// gradient of the loss with respect to the state at `(u, p)`. With no
    /// loss value available the direct ∂g/∂p term is taken as zero, so the
    /// result is −λᵀ·(∂f/∂p).
    ///
    /// # Arguments
    ///
    /// * `f` - Steady-state residual
    /// * `solution` - Converged steady state and its parameters
    /// * `dgdu` - Closure returning ∂g/∂u as a length-n tensor
    /// * `options` - Strategy and linear-solve configuration
    fn steady_state_adjoint_with_dgdu<F, DG>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<R>,
        dgdu: DG,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<R>>
    where
        F: SteadyStateRhs<R, Self>,
        DG: Fn(&Tensor<R>, &Tensor<R>, &Self) -> Result<Tensor<R>>,
        Self: Sized;

    /// Compute the parameter gradient from precomputed ∂g/∂u values.
    ///
    /// With `save_idxs`, the loss is taken to observe only those state
    /// components: a scalar `dg` broadcasts over the indices, a `dg` of
    /// matching length scatters elementwise, and unobserved components keep
    /// a zero gradient. Without `save_idxs`, `dg` must have length n and is
    /// copied whole.
    ///
    /// # Arguments
    ///
    /// * `f` - Steady-state residual
    /// * `solution` - Converged steady state and its parameters
    /// * `dg` - Gradient values (scalar, subset-length, or length n)
    /// * `save_idxs` - 0-based indices of the observed state components
    /// * `options` - Strategy and linear-solve configuration
    fn steady_state_adjoint_with_values<F>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<R>,
        dg: &Tensor<R>,
        save_idxs: Option<&[usize]>,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<R>>
    where
        F: SteadyStateRhs<R, Self>,
        Self: Sized;
}
