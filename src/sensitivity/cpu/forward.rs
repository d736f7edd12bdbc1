//! CPU implementation of the ForwardSensitivityAlgorithms trait.

use numr::runtime::cpu::{CpuClient, CpuRuntime};

use crate::sensitivity::error::SensitivityResult;
use crate::sensitivity::impl_generic::steady_state_forward_impl;
use crate::sensitivity::traits::{
    ForwardSensitivity, ForwardSensitivityAlgorithms, SteadyStateRhs, SteadyStateSolution,
};

impl ForwardSensitivityAlgorithms<CpuRuntime> for CpuClient {
    fn steady_state_forward<F>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<CpuRuntime>,
    ) -> SensitivityResult<ForwardSensitivity<CpuRuntime>>
    where
        F: SteadyStateRhs<CpuRuntime, Self>,
    {
        steady_state_forward_impl(self, f, solution)
    }
}
