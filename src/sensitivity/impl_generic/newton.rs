//! Damped Newton iteration for steady-state problems.

use numr::autograd::DualTensor;
use numr::error::Result;
use numr::ops::{ScalarOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use super::utils::tensor_norm;
use crate::common::jacobian::jacobian_autograd;
use crate::sensitivity::error::{SensitivityError, SensitivityResult};
use crate::sensitivity::traits::{SteadyStateRhs, SteadyStateSolution, SteadyStateSolveOptions};

/// State Jacobian ∂f/∂u at (u, p): the analytic hook when the residual
/// provides one, forward-mode AD with p off the tangents otherwise.
fn state_jacobian<R, C, F>(client: &C, f: &F, u: &Tensor<R>, p: &Tensor<R>) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    F: SteadyStateRhs<R, C>,
{
    if let Some(jac) = f.jacobian(u, p, client) {
        return jac;
    }
    let p_dual = DualTensor::new(p.clone(), None);
    jacobian_autograd(client, |u_dual, c| f.eval_dual(u_dual, &p_dual, c), u)
}

/// Solve f(u, p) = 0 by damped Newton iteration.
///
/// Each step solves J·Δu = −f(u, p) with the exact Jacobian and updates
/// u ← u + damping·Δu. Convergence is declared when ‖f(u, p)‖ drops below
/// `options.tol`; exhausting `options.max_iter` returns the last iterate
/// with `converged` false rather than an error.
pub fn solve_steady_state_impl<R, C, F>(
    client: &C,
    f: &F,
    u0: &Tensor<R>,
    p: &Tensor<R>,
    options: &SteadyStateSolveOptions,
) -> SensitivityResult<SteadyStateSolution<R>>
where
    R: Runtime,
    C: TensorOps<R> + ScalarOps<R> + RuntimeClient<R>,
    F: SteadyStateRhs<R, C>,
{
    let n = u0.numel();
    if n == 0 {
        return Err(SensitivityError::InvalidInput {
            context: "solve_steady_state: empty initial guess".to_string(),
        });
    }
    if u0.shape().len() != 1 {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "solve_steady_state: initial guess must be 1-D, got shape {:?}",
                u0.shape()
            ),
        });
    }

    let mut u = u0.clone();
    let mut fx = f
        .eval(&u, p, client)
        .map_err(|e| SensitivityError::NumericalError {
            message: format!("solve_steady_state: initial evaluation - {}", e),
        })?;
    if fx.numel() != n {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "solve_steady_state: residual returns {} values but state has {} components",
                fx.numel(),
                n
            ),
        });
    }

    for iter in 0..options.max_iter {
        let res_norm = tensor_norm(client, &fx)?;
        if res_norm < options.tol {
            return Ok(SteadyStateSolution {
                u,
                p: p.clone(),
                residual_norm: res_norm,
                iterations: iter + 1,
                converged: true,
            });
        }

        let jacobian =
            state_jacobian(client, f, &u, p).map_err(|e| SensitivityError::NumericalError {
                message: format!("solve_steady_state: jacobian evaluation - {}", e),
            })?;

        // Solve J · Δu = −f(u, p)
        let neg_fx = client.mul_scalar(&fx, -1.0)?;
        let neg_fx_col = neg_fx.reshape(&[n, 1])?;
        let du_col = TensorOps::solve(client, &jacobian, &neg_fx_col).map_err(|e| {
            SensitivityError::NumericalError {
                message: format!("solve_steady_state: newton solve - {}", e),
            }
        })?;
        let du = du_col.reshape(&[n])?;

        let step = client.mul_scalar(&du, options.damping)?;
        u = client.add(&u, &step)?;

        fx = f
            .eval(&u, p, client)
            .map_err(|e| SensitivityError::NumericalError {
                message: format!("solve_steady_state: evaluation - {}", e),
            })?;
    }

    let final_norm = tensor_norm(client, &fx)?;
    Ok(SteadyStateSolution {
        u,
        p: p.clone(),
        residual_norm: final_norm,
        iterations: options.max_iter,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::autograd::dual_ops::{dual_mul, dual_sub};
    use numr::autograd::{Var, var_mul, var_sub};
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    // f(u, p) = u ⊙ u − p with roots u* = √p
    struct SquareRoot;

    impl SteadyStateRhs<CpuRuntime, CpuClient> for SquareRoot {
        fn eval_dual(
            &self,
            u: &DualTensor<CpuRuntime>,
            p: &DualTensor<CpuRuntime>,
            client: &CpuClient,
        ) -> Result<DualTensor<CpuRuntime>> {
            let u_sq = dual_mul(u, u, client)?;
            dual_sub(&u_sq, p, client)
        }

        fn eval_var(
            &self,
            u: &Var<CpuRuntime>,
            p: &Var<CpuRuntime>,
            client: &CpuClient,
        ) -> Result<Var<CpuRuntime>> {
            let u_sq = var_mul(u, u, client)?;
            var_sub(&u_sq, p, client)
        }
    }

    #[test]
    fn test_converges_to_square_root() {
        let (device, client) = setup();
        let u0 = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 1.0], &[2], &device);
        let p = Tensor::<CpuRuntime>::from_slice(&[4.0f64, 9.0], &[2], &device);
        let options = SteadyStateSolveOptions::default();

        let solution = solve_steady_state_impl(&client, &SquareRoot, &u0, &p, &options).unwrap();
        assert!(solution.converged, "solver did not converge");
        assert!(solution.residual_norm < options.tol, "residual = {}", solution.residual_norm);

        let u = solution.u_vec();
        assert!((u[0] - 2.0).abs() < 1e-8, "u[0] = {}", u[0]);
        assert!((u[1] - 3.0).abs() < 1e-8, "u[1] = {}", u[1]);
    }

    #[test]
    fn test_iteration_cap_reports_unconverged() {
        let (device, client) = setup();
        let u0 = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 1.0], &[2], &device);
        let p = Tensor::<CpuRuntime>::from_slice(&[4.0f64, 9.0], &[2], &device);
        let options = SteadyStateSolveOptions::default().with_max_iter(1);

        let solution = solve_steady_state_impl(&client, &SquareRoot, &u0, &p, &options).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert!(solution.residual_norm > options.tol);
    }

    #[test]
    fn test_damped_iteration_still_converges() {
        let (device, client) = setup();
        let u0 = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 1.0], &[2], &device);
        let p = Tensor::<CpuRuntime>::from_slice(&[4.0f64, 9.0], &[2], &device);
        let options = SteadyStateSolveOptions::default().with_damping(0.5);

        let full = solve_steady_state_impl(
            &client,
            &SquareRoot,
            &u0,
            &p,
            &SteadyStateSolveOptions::default(),
        )
        .unwrap();
        let damped = solve_steady_state_impl(&client, &SquareRoot, &u0, &p, &options).unwrap();

        assert!(damped.converged, "damped solver did not converge");
        assert!(
            damped.iterations > full.iterations,
            "damping should slow convergence: {} vs {}",
            damped.iterations,
            full.iterations
        );

        let u = damped.u_vec();
        assert!((u[0] - 2.0).abs() < 1e-8, "u[0] = {}", u[0]);
        assert!((u[1] - 3.0).abs() < 1e-8, "u[1] = {}", u[1]);
    }

    #[test]
    fn test_empty_initial_guess_rejected() {
        let (device, client) = setup();
        let u0 = Tensor::<CpuRuntime>::from_slice(&[] as &[f64], &[0], &device);
        let p = Tensor::<CpuRuntime>::from_slice(&[4.0f64], &[1], &device);

        let err = solve_steady_state_impl(
            &client,
            &SquareRoot,
            &u0,
            &p,
            &SteadyStateSolveOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SensitivityError::InvalidInput { .. }));
    }

    #[test]
    fn test_solution_feeds_parameters_through() {
        let (device, client) = setup();
        let u0 = Tensor::<CpuRuntime>::from_slice(&[1.5f64], &[1], &device);
        let p = Tensor::<CpuRuntime>::from_slice(&[2.0f64], &[1], &device);

        let solution = solve_steady_state_impl(
            &client,
            &SquareRoot,
            &u0,
            &p,
            &SteadyStateSolveOptions::default(),
        )
        .unwrap();

        // The solution carries p so it can go straight into the adjoint
        let p_out: Vec<f64> = solution.p.to_vec();
        assert_eq!(p_out, vec![2.0]);
        assert_eq!(solution.n_params(), 1);
    }
}
