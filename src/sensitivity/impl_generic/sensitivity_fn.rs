//! The adjoint sensitivity function: solution, residual, and caches bundled.

use numr::autograd::{DualTensor, Var};
use numr::error::Result;
use numr::ops::TensorOps;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::common::jacobian::{jacobian_autograd, vjp_autograd, vjp_steady_state};
use crate::sensitivity::traits::{SteadyStateRhs, SteadyStateSolution};

/// Borrowed view of one adjoint computation's fixed data: the client, the
/// residual, and the converged `(u, p)` evaluation point.
///
/// Both Jacobian strategies and the final parameter VJP go through this one
/// type, so the fixed evaluation point is established in a single place and
/// shared by every differentiation pass.
pub struct AdjointSensitivityFunction<'a, R: Runtime, C, F> {
    client: &'a C,
    f: &'a F,
    u: &'a Tensor<R>,
    p: &'a Tensor<R>,
}

impl<'a, R, C, F> AdjointSensitivityFunction<'a, R, C, F>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    F: SteadyStateRhs<R, C>,
{
    /// Capture the fixed evaluation point of a solution.
    pub fn new(client: &'a C, f: &'a F, solution: &'a SteadyStateSolution<R>) -> Self {
        Self {
            client,
            f,
            u: &solution.u,
            p: &solution.p,
        }
    }

    /// State dimension n.
    pub fn n(&self) -> usize {
        self.u.numel()
    }

    /// Evaluate the residual f(u, p) without differentiation.
    pub fn residual(&self) -> Result<Tensor<R>> {
        self.f.eval(self.u, self.p, self.client)
    }

    /// One reverse-mode sweep seeded with `v`, yielding both cotangents
    /// `(vᵀ·∂f/∂u, vᵀ·∂f/∂p)` at the fixed point.
    pub fn vjp(&self, v: &Tensor<R>) -> Result<(Tensor<R>, Tensor<R>)> {
        let (_fx, vjp_u, vjp_p) = vjp_steady_state(
            self.client,
            |u_var, p_var, c| self.f.eval_var(u_var, p_var, c),
            self.u,
            self.p,
            v,
        )?;
        Ok((vjp_u, vjp_p))
    }

    /// Reverse-mode sweep yielding only the state cotangent `vᵀ·∂f/∂u`.
    ///
    /// The parameters stay off the tape, so repeated applications (one per
    /// Krylov iteration) do not pay for parameter gradients they discard.
    pub fn vjp_state(&self, v: &Tensor<R>) -> Result<Tensor<R>> {
        let p_var = Var::new(self.p.clone(), false);
        let (_fx, vjp_u) = vjp_autograd(
            self.client,
            |u_var, c| self.f.eval_var(u_var, &p_var, c),
            self.u,
            v,
        )?;
        Ok(vjp_u)
    }

    /// Materialize the state Jacobian ∂f/∂u, shape `[n, n]`.
    ///
    /// Honors the residual's analytic Jacobian hook; otherwise runs
    /// forward-mode AD with the parameters held constant.
    pub fn jacobian(&self) -> Result<Tensor<R>> {
        if let Some(jac) = self.f.jacobian(self.u, self.p, self.client) {
            return jac;
        }
        let p_dual = DualTensor::new(self.p.clone(), None);
        jacobian_autograd(
            self.client,
            |u_dual, c| self.f.eval_dual(u_dual, &p_dual, c),
            self.u,
        )
    }

    /// Materialize the parameter Jacobian ∂f/∂p, shape `[n, n_params]`,
    /// with the state held constant.
    pub fn jacobian_wrt_params(&self) -> Result<Tensor<R>> {
        let u_dual = DualTensor::new(self.u.clone(), None);
        jacobian_autograd(
            self.client,
            |p_dual, c| self.f.eval_dual(&u_dual, p_dual, c),
            self.p,
        )
    }
}
