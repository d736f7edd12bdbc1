//! CPU implementation of the SteadyStateSolverAlgorithms trait.

use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

use crate::sensitivity::error::SensitivityResult;
use crate::sensitivity::impl_generic::solve_steady_state_impl;
use crate::sensitivity::traits::{
    SteadyStateRhs, SteadyStateSolution, SteadyStateSolverAlgorithms, SteadyStateSolveOptions,
};

impl SteadyStateSolverAlgorithms<CpuRuntime> for CpuClient {
    fn solve_steady_state<F>(
        &self,
        f: &F,
        u0: &Tensor<CpuRuntime>,
        p: &Tensor<CpuRuntime>,
        options: &SteadyStateSolveOptions,
    ) -> SensitivityResult<SteadyStateSolution<CpuRuntime>>
    where
        F: SteadyStateRhs<CpuRuntime, Self>,
    {
        solve_steady_state_impl(self, f, u0, p, options)
    }
}
