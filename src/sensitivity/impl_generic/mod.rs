//! Generic implementations of steady-state sensitivity algorithms.
//!
//! These implementations work across all Runtime backends using tensor
//! operations and numr's autograd.

pub mod adjoint;
pub mod context;
pub mod forward;
pub mod gmres;
pub mod loss;
pub mod newton;
pub mod operator;
pub mod sensitivity_fn;
pub mod utils;

// Re-export main types and functions
pub use adjoint::steady_state_adjoint_impl;
pub use context::AdjointContext;
pub use forward::steady_state_forward_impl;
pub use gmres::{GmresSolution, gmres_solve};
pub use newton::solve_steady_state_impl;
pub use operator::{AdjointOperator, LinearOperator};
pub use sensitivity_fn::AdjointSensitivityFunction;
