//! The right-hand-side contract for steady-state problems.

use numr::autograd::{DualTensor, Var};
use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// A differentiable residual f(u, p) defining a steady-state problem
/// f(u, p) = 0.
///
/// Sensitivity analysis needs the residual in both AD modes: forward mode
/// (`DualTensor`) to materialize Jacobian columns, and reverse mode (`Var`)
/// to pull cotangents back onto the state and the parameters. Implementors
/// write the same arithmetic twice, once per operation family; the crate
/// picks the mode each algorithm step requires.
///
/// # Example
///
/// ```ignore
/// use numr::autograd::dual_ops::{dual_mul, dual_mul_scalar};
/// use numr::autograd::{var_mul, var_mul_scalar};
///
/// // f(u, p) = -p * u (exponential decay toward zero)
/// struct Decay;
///
/// impl SteadyStateRhs<CpuRuntime, CpuClient> for Decay {
///     fn eval_dual(&self, u, p, c) -> Result<DualTensor<CpuRuntime>> {
///         let pu = dual_mul(p, u, c)?;
///         dual_mul_scalar(&pu, -1.0, c)
///     }
///
///     fn eval_var(&self, u, p, c) -> Result<Var<CpuRuntime>> {
///         let pu = var_mul(p, u, c)?;
///         var_mul_scalar(&pu, -1.0, c)
///     }
/// }
/// ```
pub trait SteadyStateRhs<R: Runtime, C> {
    /// Evaluate the residual with forward-mode dual numbers.
    fn eval_dual(
        &self,
        u: &DualTensor<R>,
        p: &DualTensor<R>,
        client: &C,
    ) -> Result<DualTensor<R>>;

    /// Evaluate the residual on the reverse-mode tape.
    fn eval_var(&self, u: &Var<R>, p: &Var<R>, client: &C) -> Result<Var<R>>;

    /// Analytic Jacobian ∂f/∂u at (u, p), shape `[n, n]`.
    ///
    /// Returning `Some` bypasses forward-mode differentiation on the
    /// explicit-Jacobian path. The default has no analytic form.
    fn jacobian(&self, _u: &Tensor<R>, _p: &Tensor<R>, _client: &C) -> Option<Result<Tensor<R>>> {
        None
    }

    /// Evaluate the residual without differentiation.
    ///
    /// Wraps both inputs in tangent-free duals and extracts the primal.
    fn eval(&self, u: &Tensor<R>, p: &Tensor<R>, client: &C) -> Result<Tensor<R>> {
        let u_dual = DualTensor::new(u.clone(), None);
        let p_dual = DualTensor::new(p.clone(), None);
        let result = self.eval_dual(&u_dual, &p_dual, client)?;
        Ok(result.primal().clone())
    }
}
