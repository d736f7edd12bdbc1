//! Autograd-based differentiation primitives shared across sensr.
//!
//! Provides exact Jacobians, vector-Jacobian products and scalar-loss
//! gradients using numr's automatic differentiation. These are the building
//! blocks of:
//! - `sensitivity` - steady-state adjoint and forward sensitivity analysis
//! - the steady-state Newton solver (exact Jacobians for the linear step)
//!
//! # Forward vs. Reverse Mode
//!
//! Forward mode (`DualTensor`) costs one pass per *input* dimension and is
//! used to materialize full Jacobians of square systems. Reverse mode
//! (`Var` + `backward`) costs one pass per *output* and is used for
//! vector-Jacobian products and scalar-loss gradients, where a single
//! backward sweep yields cotangents with respect to every input at once.
//!
//! Functions here are written against `(u, p)` pairs: a state vector that is
//! differentiated and a parameter vector that may or may not carry gradient
//! flow, matching the steady-state problems this crate works on.

use numr::autograd::{DualTensor, Var, backward, jacobian_forward, var_mul, var_sum};
use numr::error::{Error, Result};
use numr::ops::TensorOps;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Compute the Jacobian matrix using forward-mode automatic differentiation.
///
/// For a function F: ℝⁿ → ℝᵐ, computes the m×n Jacobian matrix J where
/// `J[i,j]` = ∂Fᵢ/∂xⱼ. This runs n JVP passes (one per input dimension),
/// which is optimal for the square systems the steady-state solvers produce.
///
/// # Arguments
///
/// * `client` - Runtime client for tensor operations
/// * `f` - Function written with `DualTensor` and `dual_*` operations
/// * `x` - Point at which to evaluate the Jacobian
///
/// # Returns
///
/// Jacobian matrix of shape `[m, n]`
pub fn jacobian_autograd<R, C, F>(client: &C, f: F, x: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    F: Fn(&DualTensor<R>, &C) -> Result<DualTensor<R>>,
{
    jacobian_forward(f, x, client)
}

/// Compute the vector-Jacobian product vᵀ @ J for a single-input function.
///
/// For F: ℝⁿ → ℝᵐ, computes vᵀ @ J(x) in one reverse-mode sweep without
/// forming J. The returned pair is `(F(x), vᵀ @ J(x))`.
pub fn vjp_autograd<R, C, F>(
    client: &C,
    f: F,
    x: &Tensor<R>,
    v: &Tensor<R>,
) -> Result<(Tensor<R>, Tensor<R>)>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    F: Fn(&Var<R>, &C) -> Result<Var<R>>,
{
    let x_var = Var::new(x.clone(), true);

    // Forward pass
    let y_var = f(&x_var, client)?;
    let fx = y_var.tensor().clone();

    // vᵀ @ F(x) as a scalar loss: elementwise product, then full sum
    let v_var = Var::new(v.clone(), false);
    let prod = var_mul(&y_var, &v_var, client)?;
    let all_dims: Vec<usize> = (0..prod.tensor().shape().len()).collect();
    let loss = var_sum(&prod, &all_dims, false, client)?;

    // Backward pass yields vᵀ @ J
    let grads = backward(&loss, client)?;

    let vjp = match grads.get(x_var.id()) {
        Some(g) => g.clone(),
        None => Tensor::<R>::zeros(x.shape(), x.dtype(), x.device()),
    };

    Ok((fx, vjp))
}

/// Compute both vector-Jacobian products of a parameterized residual at a
/// fixed evaluation point.
///
/// For f(u, p) evaluated at a steady state, one reverse-mode sweep seeded
/// with the adjoint vector v yields both cotangents:
///
/// ```text
/// vᵀ @ (∂f/∂u)    and    vᵀ @ (∂f/∂p)
/// ```
///
/// This is the core primitive of the adjoint method: the state cotangent
/// drives the matrix-free linear solve, the parameter cotangent is the
/// gradient accumulator term.
///
/// # Arguments
///
/// * `client` - Runtime client
/// * `f` - Residual written with `Var` operations
/// * `u` - State vector (fixed evaluation point)
/// * `p` - Parameter vector
/// * `v` - Seed vector (the adjoint λ)
///
/// # Returns
///
/// Tuple of `(f(u, p), vᵀ @ ∂f/∂u, vᵀ @ ∂f/∂p)`
pub fn vjp_steady_state<R, C, F>(
    client: &C,
    f: F,
    u: &Tensor<R>,
    p: &Tensor<R>,
    v: &Tensor<R>,
) -> Result<(Tensor<R>, Tensor<R>, Tensor<R>)>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    F: Fn(&Var<R>, &Var<R>, &C) -> Result<Var<R>>,
{
    let device = u.device();

    let u_var = Var::new(u.clone(), true);
    let p_var = Var::new(p.clone(), true);

    // Forward pass
    let f_var = f(&u_var, &p_var, client)?;
    let fx = f_var.tensor().clone();

    // vᵀ @ f as a scalar loss
    let v_var = Var::new(v.clone(), false);
    let prod = var_mul(&f_var, &v_var, client)?;
    let all_dims: Vec<usize> = (0..prod.tensor().shape().len()).collect();
    let loss = var_sum(&prod, &all_dims, false, client)?;

    // One backward pass, two cotangents
    let grads = backward(&loss, client)?;

    let vjp_u = match grads.get(u_var.id()) {
        Some(g) => g.clone(),
        None => Tensor::<R>::zeros(u.shape(), u.dtype(), device),
    };
    let vjp_p = match grads.get(p_var.id()) {
        Some(g) => g.clone(),
        None => Tensor::<R>::zeros(p.shape(), p.dtype(), device),
    };

    Ok((fx, vjp_u, vjp_p))
}

/// Compute the gradients of a scalar loss g(u, p) with respect to u and p.
///
/// One reverse-mode sweep of the loss at the given point. A loss that never
/// touches one of its inputs gets a zero gradient for it, which is exactly
/// the ∂g/∂p = 0 convention for state-only losses. A loss whose output is
/// not a single element is rejected with `InvalidArgument` before the
/// backward pass runs.
///
/// # Returns
///
/// Tuple of `(g(u, p), ∂g/∂u, ∂g/∂p)`
pub fn gradient_autograd<R, C, G>(
    client: &C,
    g: G,
    u: &Tensor<R>,
    p: &Tensor<R>,
) -> Result<(f64, Tensor<R>, Tensor<R>)>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    R::Client: TensorOps<R>,
    G: Fn(&Var<R>, &Var<R>, &C) -> Result<Var<R>>,
{
    let device = u.device();

    let u_var = Var::new(u.clone(), true);
    let p_var = Var::new(p.clone(), true);

    let g_var = g(&u_var, &p_var, client)?;
    let g_val = g_var
        .tensor()
        .item::<f64>()
        .map_err(|_| Error::InvalidArgument {
            arg: "g",
            reason: "loss must return a scalar".to_string(),
        })?;

    let grads = backward(&g_var, client)?;

    let dg_du = match grads.get(u_var.id()) {
        Some(g) => g.clone(),
        None => Tensor::<R>::zeros(u.shape(), u.dtype(), device),
    };
    let dg_dp = match grads.get(p_var.id()) {
        Some(g) => g.clone(),
        None => Tensor::<R>::zeros(p.shape(), p.dtype(), device),
    };

    Ok((g_val, dg_du, dg_dp))
}
