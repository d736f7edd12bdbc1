//! CPU implementations of steady-state sensitivity algorithms.

mod adjoint;
mod forward;
mod solver;
