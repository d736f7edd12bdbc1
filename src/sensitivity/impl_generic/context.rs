//! Per-call context for the adjoint gradient computation.

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::sensitivity::error::{SensitivityError, SensitivityResult};
use crate::sensitivity::traits::{
    JacobianStrategy, SteadyStateAdjointOptions, SteadyStateSolution,
};

/// Validated dimensions, resolved strategy, and the state-gradient buffer
/// for one adjoint gradient call.
///
/// Created once per call and owned exclusively by it. The dense Jacobian is
/// deliberately not part of the context: it exists only inside the explicit
/// branch, so the matrix-free path never pays for an n×n allocation.
#[derive(Debug, Clone)]
pub struct AdjointContext<R: Runtime> {
    /// State dimension n.
    pub n: usize,

    /// Parameter count.
    pub n_params: usize,

    /// Resolved strategy, `Explicit` or `MatrixFree` (never `Auto`).
    pub strategy: JacobianStrategy,

    /// Zero-initialized ∂g/∂u accumulation buffer, shape `[n]`.
    pub dg_val: Tensor<R>,
}

impl<R: Runtime> AdjointContext<R> {
    /// Validate the solution and build the context.
    ///
    /// Fails with `MissingParameters` on an empty parameter vector (the
    /// gradient is undefined, checked before any numerical work) and with
    /// `InvalidInput` on non-1-D state or parameters.
    pub fn new(
        solution: &SteadyStateSolution<R>,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<Self> {
        if solution.p.numel() == 0 {
            return Err(SensitivityError::MissingParameters {
                context: "steady_state_adjoint".to_string(),
            });
        }
        if solution.u.shape().len() != 1 {
            return Err(SensitivityError::InvalidInput {
                context: format!(
                    "steady_state_adjoint: state must be 1-D, got shape {:?}",
                    solution.u.shape()
                ),
            });
        }
        if solution.p.shape().len() != 1 {
            return Err(SensitivityError::InvalidInput {
                context: format!(
                    "steady_state_adjoint: parameters must be 1-D, got shape {:?}",
                    solution.p.shape()
                ),
            });
        }

        let n = solution.u.numel();
        let strategy = match options.strategy {
            JacobianStrategy::Auto => {
                if n <= options.jacobian_threshold {
                    JacobianStrategy::Explicit
                } else {
                    JacobianStrategy::MatrixFree
                }
            }
            forced => forced,
        };

        let dg_val = Tensor::<R>::zeros(
            solution.u.shape(),
            solution.u.dtype(),
            solution.u.device(),
        );

        Ok(Self {
            n,
            n_params: solution.p.numel(),
            strategy,
            dg_val,
        })
    }
}
