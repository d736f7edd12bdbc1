//! Utility functions shared by the sensitivity implementations.

use numr::error::Result;
use numr::ops::TensorOps;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// Compute dot product of two 1D tensors.
pub fn tensor_dot<R, C>(client: &C, a: &Tensor<R>, b: &Tensor<R>) -> Result<f64>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
{
    let prod = client.mul(a, b)?;
    let sum = client.sum(&prod, &[0], false)?;
    let sum_val: Vec<f64> = sum.to_vec();
    Ok(sum_val[0])
}

/// Compute the L2 norm of a 1D tensor: ||x|| = sqrt(sum(x_i^2)).
pub fn tensor_norm<R, C>(client: &C, x: &Tensor<R>) -> Result<f64>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
{
    tensor_dot(client, x, x).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    #[test]
    fn test_tensor_dot() {
        let (device, client) = setup();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f64, 2.0, 3.0], &[3], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[4.0f64, 5.0, 6.0], &[3], &device);

        let dot = tensor_dot(&client, &a, &b).unwrap();
        assert!((dot - 32.0).abs() < 1e-12, "dot = {}", dot);
    }

    #[test]
    fn test_tensor_norm() {
        let (device, client) = setup();
        let x = Tensor::<CpuRuntime>::from_slice(&[3.0f64, 4.0], &[2], &device);

        let norm = tensor_norm(&client, &x).unwrap();
        assert!((norm - 5.0).abs() < 1e-12, "norm = {}", norm);
    }
}
