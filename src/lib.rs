//! sensr - Steady-State Sensitivity Analysis
//!
//! sensr computes parameter gradients of steady states: given a residual
//! f(u, p) with a converged state f(u*, p) = 0 and a scalar loss
//! L = g(u*, p), it produces dL/dp without differentiating through the
//! nonlinear solver. Built on numr's tensors and automatic differentiation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      sensr                               │
//! │   (steady-state solves, adjoint and forward gradients)  │
//! └──────────────────────────┬──────────────────────────────┘
//!                            │ uses
//! ┌──────────────────────────▼──────────────────────────────┐
//! │                       numr                               │
//! │     (tensors, autograd, matmul, dense linear solve)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Current Modules
//!
//! - [`sensitivity`] - Adjoint and forward steady-state sensitivity, plus a
//!   damped Newton solver producing the steady states to differentiate
//! - [`common`] - Shared autograd primitives (Jacobians, vector-Jacobian
//!   products, loss gradients)
//!
//! # Backend Support
//!
//! The algorithm implementations are generic over numr's `Runtime` trait;
//! trait implementations are provided for the CPU client.
//!
//! # Example
//!
//! ```ignore
//! use sensr::{
//!     SteadyStateAdjointAlgorithms, SteadyStateAdjointOptions,
//!     SteadyStateSolverAlgorithms, SteadyStateSolveOptions,
//! };
//! use numr::autograd::{var_mul, var_sum};
//! use numr::runtime::cpu::{CpuClient, CpuDevice};
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! // Drive f(u, p) = 0 to convergence, then differentiate L = Σ u²
//! let solution = client.solve_steady_state(
//!     &f, &u0, &p, &SteadyStateSolveOptions::default(),
//! )?;
//! let g = |u: &Var<R>, _p: &Var<R>, c: &C| {
//!     let sq = var_mul(u, u, c)?;
//!     var_sum(&sq, &[0], false, c)
//! };
//! let grad = client.steady_state_adjoint(
//!     &f, &solution, g, &SteadyStateAdjointOptions::default(),
//! )?;
//! // grad.gradient holds dL/dp
//! ```

pub mod common;
pub mod sensitivity;

// Re-export main types for convenience
pub use sensitivity::{
    AdjointGradient, ForwardSensitivity, ForwardSensitivityAlgorithms, JacobianStrategy,
    SensitivityError, SensitivityResult, SteadyStateAdjointAlgorithms, SteadyStateAdjointOptions,
    SteadyStateRhs, SteadyStateSolution, SteadyStateSolveOptions, SteadyStateSolverAlgorithms,
};

// Re-export numr types that users will commonly need
pub use numr::dtype::DType;
pub use numr::error::{Error, Result};
pub use numr::runtime::{Runtime, RuntimeClient};
pub use numr::tensor::Tensor;
