//! Linear operators for the matrix-free adjoint solve.

use numr::error::Result;
use numr::ops::TensorOps;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use super::sensitivity_fn::AdjointSensitivityFunction;
use crate::sensitivity::traits::SteadyStateRhs;

/// Action of a square linear operator on a vector, without access to the
/// matrix itself.
///
/// The iterative solver sees only this interface, so anything that can
/// produce matrix-vector products can drive it: a pullback of the residual,
/// a materialized matrix, a preconditioned composition.
pub trait LinearOperator<R: Runtime> {
    /// Apply the operator: v ↦ A·v.
    fn apply(&self, v: &Tensor<R>) -> Result<Tensor<R>>;

    /// Operator dimension n (the operator maps `[n]` to `[n]`).
    fn dim(&self) -> usize;
}

/// Matrix-free transposed-Jacobian action (∂f/∂u)ᵀ·v at a fixed steady
/// state.
///
/// The evaluation point was captured when the sensitivity function was
/// built; every application replays the reverse-mode pullback at that same
/// point, which is what the adjoint system
/// (∂f/∂u)ᵀ·λ = ∂g/∂u requires. A reverse-mode sweep seeded with v
/// returns vᵀ·(∂f/∂u), and that row vector read as a column is exactly
/// (∂f/∂u)ᵀ·v.
pub struct AdjointOperator<'a, R: Runtime, C, F> {
    sf: &'a AdjointSensitivityFunction<'a, R, C, F>,
}

impl<'a, R, C, F> AdjointOperator<'a, R, C, F>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    F: SteadyStateRhs<R, C>,
{
    /// Wrap a sensitivity function as the transposed-Jacobian operator.
    pub fn new(sf: &'a AdjointSensitivityFunction<'a, R, C, F>) -> Self {
        Self { sf }
    }
}

impl<'a, R, C, F> LinearOperator<R> for AdjointOperator<'a, R, C, F>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    F: SteadyStateRhs<R, C>,
{
    fn apply(&self, v: &Tensor<R>) -> Result<Tensor<R>> {
        self.sf.vjp_state(v)
    }

    fn dim(&self) -> usize {
        self.sf.n()
    }
}
