//! Matrix-free GMRES for the adjoint linear system.
//!
//! Restart-free GMRES with modified Gram-Schmidt orthogonalization and
//! Givens rotations on the Hessenberg system. The operator is only touched
//! through [`LinearOperator::apply`], so the transposed Jacobian never has
//! to exist as a matrix; Krylov basis vectors stay on the device, while the
//! small (k+1)×k Hessenberg problem is solved host-side.

use numr::error::Result;
use numr::ops::{ScalarOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use super::operator::LinearOperator;
use super::utils::{tensor_dot, tensor_norm};
use crate::sensitivity::error::{SensitivityError, SensitivityResult};

/// Pivot magnitude below which the Hessenberg system counts as singular.
const BREAKDOWN_TOL: f64 = 1e-14;

/// Solution of one GMRES run.
#[derive(Debug, Clone)]
pub struct GmresSolution<R: Runtime> {
    /// Solution vector x with A·x ≈ b, shape `[n]`.
    pub x: Tensor<R>,

    /// Arnoldi iterations spent (each is one operator application).
    pub iterations: usize,

    /// Residual norm ‖b − A·x‖ implied by the Givens recurrence.
    pub residual_norm: f64,
}

fn givens_rotation(a: f64, b: f64) -> (f64, f64) {
    if b == 0.0 {
        (1.0, 0.0)
    } else {
        let r = a.hypot(b);
        (a / r, b / r)
    }
}

/// Solve A·x = b where A is only available as an operator.
///
/// Starts from x₀ = 0 and declares convergence at
/// residual ≤ max(`rtol`·‖b‖, `atol`). A right-hand side with
/// ‖b‖ ≤ `atol` short-circuits to the zero solution without applying the
/// operator. Running past `max_iter` without reaching the target is a
/// `DidNotConverge` error; in exact arithmetic `max_iter = n` always
/// suffices.
pub fn gmres_solve<R, C, Op>(
    client: &C,
    op: &Op,
    b: &Tensor<R>,
    rtol: f64,
    atol: f64,
    max_iter: usize,
) -> SensitivityResult<GmresSolution<R>>
where
    R: Runtime,
    C: TensorOps<R> + ScalarOps<R> + RuntimeClient<R>,
    Op: LinearOperator<R>,
{
    let n = op.dim();
    if b.numel() != n {
        return Err(SensitivityError::InvalidInput {
            context: format!(
                "gmres: rhs length {} does not match operator dimension {}",
                b.numel(),
                n
            ),
        });
    }

    // x0 = 0, so r0 = b
    let beta = tensor_norm(client, b)?;
    if beta <= atol {
        return Ok(GmresSolution {
            x: Tensor::<R>::zeros(b.shape(), b.dtype(), b.device()),
            iterations: 0,
            residual_norm: beta,
        });
    }
    let target = (rtol * beta).max(atol);

    let mut basis: Vec<Tensor<R>> = vec![client.mul_scalar(b, 1.0 / beta)?];
    // Rotated Hessenberg columns; h_cols[j][i] for i <= j after rotation
    let mut h_cols: Vec<Vec<f64>> = Vec::new();
    let mut cs: Vec<f64> = Vec::new();
    let mut sn: Vec<f64> = Vec::new();
    let mut g = vec![beta];

    let mut residual = beta;
    let mut converged = false;

    for j in 0..max_iter {
        let mut w = op.apply(&basis[j])?;

        // Modified Gram-Schmidt against the existing basis
        let mut h_col = vec![0.0f64; j + 2];
        for (i, v) in basis.iter().enumerate() {
            let hij = tensor_dot(client, &w, v)?;
            h_col[i] = hij;
            let scaled = client.mul_scalar(v, hij)?;
            w = client.sub(&w, &scaled)?;
        }
        let h_next = tensor_norm(client, &w)?;
        h_col[j + 1] = h_next;

        // Carry previous rotations into the new column
        for i in 0..j {
            let t = cs[i] * h_col[i] + sn[i] * h_col[i + 1];
            h_col[i + 1] = -sn[i] * h_col[i] + cs[i] * h_col[i + 1];
            h_col[i] = t;
        }

        // New rotation annihilates the subdiagonal entry
        let (c, s) = givens_rotation(h_col[j], h_col[j + 1]);
        h_col[j] = c * h_col[j] + s * h_col[j + 1];
        h_col[j + 1] = 0.0;
        cs.push(c);
        sn.push(s);

        g.push(-s * g[j]);
        g[j] *= c;
        residual = g[j + 1].abs();

        h_cols.push(h_col);

        if residual <= target || h_next <= BREAKDOWN_TOL {
            // Happy breakdown means the Krylov space became invariant; the
            // least-squares solution is then exact.
            converged = true;
            break;
        }
        if j + 1 < max_iter {
            basis.push(client.mul_scalar(&w, 1.0 / h_next)?);
        }
    }

    let k = h_cols.len();
    if !converged {
        return Err(SensitivityError::DidNotConverge {
            iterations: k,
            tolerance: target,
            context: format!("gmres: residual {} after {} iterations", residual, k),
        });
    }

    // Back-substitute the k×k upper-triangular system
    let mut y = vec![0.0f64; k];
    for i in (0..k).rev() {
        let mut sum = g[i];
        for (l, h_l) in h_cols.iter().enumerate().skip(i + 1) {
            sum -= h_l[i] * y[l];
        }
        let pivot = h_cols[i][i];
        if pivot.abs() < BREAKDOWN_TOL {
            return Err(SensitivityError::NumericalError {
                message: format!("gmres: singular Hessenberg pivot at column {}", i),
            });
        }
        y[i] = sum / pivot;
    }

    // x = V·y
    let mut x = Tensor::<R>::zeros(b.shape(), b.dtype(), b.device());
    for (i, yi) in y.iter().enumerate() {
        let scaled = client.mul_scalar(&basis[i], *yi)?;
        x = client.add(&x, &scaled)?;
    }

    Ok(GmresSolution {
        x,
        iterations: k,
        residual_norm: residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::ops::MatmulOps;
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    struct DenseOperator<'a> {
        m: &'a Tensor<CpuRuntime>,
        client: &'a CpuClient,
    }

    impl LinearOperator<CpuRuntime> for DenseOperator<'_> {
        fn apply(&self, v: &Tensor<CpuRuntime>) -> Result<Tensor<CpuRuntime>> {
            let n = self.dim();
            let col = v.reshape(&[n, 1])?;
            let out = self.client.matmul(self.m, &col)?;
            out.reshape(&[n])
        }

        fn dim(&self) -> usize {
            self.m.shape()[0]
        }
    }

    #[test]
    fn test_identity_system() {
        let (device, client) = setup();
        let m = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 0.0, 0.0, 1.0], &[2, 2], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[3.0f64, -4.0], &[2], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let sol = gmres_solve(&client, &op, &b, 1e-12, 1e-14, 2).unwrap();
        let x: Vec<f64> = sol.x.to_vec();
        assert!((x[0] - 3.0).abs() < 1e-10);
        assert!((x[1] + 4.0).abs() < 1e-10);
        assert_eq!(sol.iterations, 1);
    }

    #[test]
    fn test_diagonal_system() {
        let (device, client) = setup();
        let m = Tensor::<CpuRuntime>::from_slice(&[2.0f64, 0.0, 0.0, 4.0], &[2, 2], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[2.0f64, 8.0], &[2], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let sol = gmres_solve(&client, &op, &b, 1e-12, 1e-14, 2).unwrap();
        let x: Vec<f64> = sol.x.to_vec();
        assert!((x[0] - 1.0).abs() < 1e-10, "x[0] = {}", x[0]);
        assert!((x[1] - 2.0).abs() < 1e-10, "x[1] = {}", x[1]);
    }

    #[test]
    fn test_nonsymmetric_system() {
        let (device, client) = setup();
        // [[3, 1], [1, 2]] x = [5, 5] has solution [1, 2]
        let m = Tensor::<CpuRuntime>::from_slice(&[3.0f64, 1.0, 1.0, 2.0], &[2, 2], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[5.0f64, 5.0], &[2], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let sol = gmres_solve(&client, &op, &b, 1e-12, 1e-14, 2).unwrap();
        let x: Vec<f64> = sol.x.to_vec();
        assert!((x[0] - 1.0).abs() < 1e-9, "x[0] = {}", x[0]);
        assert!((x[1] - 2.0).abs() < 1e-9, "x[1] = {}", x[1]);
    }

    #[test]
    fn test_zero_rhs_short_circuits() {
        let (device, client) = setup();
        let m = Tensor::<CpuRuntime>::from_slice(&[3.0f64, 1.0, 1.0, 2.0], &[2, 2], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[0.0f64, 0.0], &[2], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let sol = gmres_solve(&client, &op, &b, 1e-10, 1e-12, 2).unwrap();
        assert_eq!(sol.iterations, 0);
        let x: Vec<f64> = sol.x.to_vec();
        assert!(x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_iteration_cap_errors() {
        let (device, client) = setup();
        let m = Tensor::<CpuRuntime>::from_slice(
            &[1.0f64, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0],
            &[3, 3],
            &device,
        );
        let b = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 1.0, 1.0], &[3], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let err = gmres_solve(&client, &op, &b, 1e-14, 1e-16, 1)
            .err()
            .unwrap();
        assert!(matches!(err, SensitivityError::DidNotConverge { .. }));
    }

    #[test]
    fn test_matches_dense_solve() {
        let (device, client) = setup();
        // Moderately conditioned 4x4 system
        let m = Tensor::<CpuRuntime>::from_slice(
            &[
                4.0f64, 1.0, 0.0, 2.0, //
                1.0, 5.0, 1.0, 0.0, //
                0.0, 1.0, 3.0, 1.0, //
                2.0, 0.0, 1.0, 6.0,
            ],
            &[4, 4],
            &device,
        );
        let b = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[4], &device);
        let op = DenseOperator {
            m: &m,
            client: &client,
        };

        let sol = gmres_solve(&client, &op, &b, 1e-12, 1e-14, 4).unwrap();

        let b_col = b.reshape(&[4, 1]).unwrap();
        let x_direct = TensorOps::solve(&client, &m, &b_col).unwrap();
        let xd: Vec<f64> = x_direct.to_vec();
        let xg: Vec<f64> = sol.x.to_vec();
        for i in 0..4 {
            assert!(
                (xg[i] - xd[i]).abs() < 1e-8,
                "component {}: gmres {} vs direct {}",
                i,
                xg[i],
                xd[i]
            );
        }
    }
}
