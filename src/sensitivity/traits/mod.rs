//! Trait definitions for steady-state sensitivity analysis.

mod adjoint;
mod forward;
mod rhs;
mod solver;
mod types;

pub use adjoint::SteadyStateAdjointAlgorithms;
pub use forward::ForwardSensitivityAlgorithms;
pub use rhs::SteadyStateRhs;
pub use solver::SteadyStateSolverAlgorithms;
pub use types::{
    AdjointGradient, ForwardSensitivity, JacobianStrategy, SteadyStateAdjointOptions,
    SteadyStateSolution, SteadyStateSolveOptions,
};
