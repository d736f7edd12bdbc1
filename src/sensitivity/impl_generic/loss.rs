//! Strategies for populating the gradient of the loss w.r.t. the state.
//!
//! The adjoint right-hand side ∂g/∂u arrives in one of three forms: a user
//! closure that computes it, precomputed values scattered by save-indices,
//! or a differentiable loss the crate differentiates itself. The driver
//! picks exactly one; this module implements the first two (the third is a
//! single reverse-mode sweep the driver shares with the ∂g/∂p term).

use numr::error::Result;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::sensitivity::error::{SensitivityError, SensitivityResult};

/// Evaluate a user ∂g/∂u closure and validate its output length.
pub fn eval_state_gradient_fn<R, C, DG>(
    client: &C,
    dgdu: &DG,
    u: &Tensor<R>,
    p: &Tensor<R>,
) -> SensitivityResult<Tensor<R>>
where
    R: Runtime,
    C: RuntimeClient<R>,
    DG: Fn(&Tensor<R>, &Tensor<R>, &C) -> Result<Tensor<R>>,
{
    let n = u.numel();
    let grad = dgdu(u, p, client).map_err(|e| SensitivityError::NumericalError {
        message: format!("state gradient closure failed: {}", e),
    })?;
    if grad.numel() != n {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "state gradient closure returned {} values for state dimension {}",
                grad.numel(),
                n
            ),
        });
    }
    Ok(grad)
}

/// Scatter precomputed ∂g/∂u values into a fresh state-gradient buffer.
///
/// Shape policy, resolved from the operands at runtime:
/// - no `save_idxs`: `values` must have length n and is copied whole;
/// - with `save_idxs`: a single value broadcasts to every listed index
///   (one index or a subset), and a `values` of the same length as the
///   index list scatters elementwise. Components not listed keep the zero
///   from the context buffer.
///
/// Indices are 0-based; an index ≥ n or a length mismatch is an
/// `InvalidInput` error rather than silent misalignment.
pub fn scatter_state_gradient<R>(
    dg_val: &Tensor<R>,
    values: &Tensor<R>,
    save_idxs: Option<&[usize]>,
) -> SensitivityResult<Tensor<R>>
where
    R: Runtime,
{
    let n = dg_val.numel();
    let vals: Vec<f64> = values.to_vec();

    let idxs = match save_idxs {
        None => {
            if vals.len() != n {
                return Err(SensitivityError::InvalidInput {
                    context: format!(
                        "scatter_state_gradient: {} gradient values for state dimension {} \
                         (no save indices given)",
                        vals.len(),
                        n
                    ),
                });
            }
            return Ok(Tensor::<R>::from_slice(&vals, &[n], dg_val.device()));
        }
        Some(idxs) => idxs,
    };

    if let Some(bad) = idxs.iter().find(|i| **i >= n) {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "scatter_state_gradient: save index {} out of bounds for state dimension {}",
                bad, n
            ),
        });
    }

    let mut out: Vec<f64> = dg_val.to_vec();
    if vals.len() == 1 {
        // Scalar gradient broadcast over the observed components
        for &i in idxs {
            out[i] = vals[0];
        }
    } else if vals.len() == idxs.len() {
        for (&i, &v) in idxs.iter().zip(vals.iter()) {
            out[i] = v;
        }
    } else {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "scatter_state_gradient: {} gradient values for {} save indices",
                vals.len(),
                idxs.len()
            ),
        });
    }

    Ok(Tensor::<R>::from_slice(&out, &[n], dg_val.device()))
}
