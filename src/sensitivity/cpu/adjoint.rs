//! CPU implementation of the SteadyStateAdjointAlgorithms trait.

use numr::autograd::Var;
use numr::error::Result;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

use crate::sensitivity::error::SensitivityResult;
use crate::sensitivity::impl_generic::steady_state_adjoint_impl;
use crate::sensitivity::traits::{
    AdjointGradient, SteadyStateAdjointAlgorithms, SteadyStateAdjointOptions, SteadyStateRhs,
    SteadyStateSolution,
};

// Stand-in closure types for the loss sources a call does not supply
type LossFn = fn(&Var<CpuRuntime>, &Var<CpuRuntime>, &CpuClient) -> Result<Var<CpuRuntime>>;
type StateGradFn =
    fn(&Tensor<CpuRuntime>, &Tensor<CpuRuntime>, &CpuClient) -> Result<Tensor<CpuRuntime>>;

impl SteadyStateAdjointAlgorithms<CpuRuntime> for CpuClient {
    fn steady_state_adjoint<F, G>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<CpuRuntime>,
        g: G,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<CpuRuntime>>
    where
        F: SteadyStateRhs<CpuRuntime, Self>,
        G: Fn(&Var<CpuRuntime>, &Var<CpuRuntime>, &Self) -> Result<Var<CpuRuntime>>,
    {
        steady_state_adjoint_impl(
            self,
            f,
            solution,
            Some(&g),
            None::<&StateGradFn>,
            None,
            None,
            options,
        )
    }

    fn steady_state_adjoint_with_dgdu<F, DG>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<CpuRuntime>,
        dgdu: DG,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<CpuRuntime>>
    where
        F: SteadyStateRhs<CpuRuntime, Self>,
        DG: Fn(&Tensor<CpuRuntime>, &Tensor<CpuRuntime>, &Self) -> Result<Tensor<CpuRuntime>>,
    {
        steady_state_adjoint_impl(
            self,
            f,
            solution,
            None::<&LossFn>,
            Some(&dgdu),
            None,
            None,
            options,
        )
    }

    fn steady_state_adjoint_with_values<F>(
        &self,
        f: &F,
        solution: &SteadyStateSolution<CpuRuntime>,
        dg: &Tensor<CpuRuntime>,
        save_idxs: Option<&[usize]>,
        options: &SteadyStateAdjointOptions,
    ) -> SensitivityResult<AdjointGradient<CpuRuntime>>
    where
        F: SteadyStateRhs<CpuRuntime, Self>,
    {
        steady_state_adjoint_impl(
            self,
            f,
            solution,
            None::<&LossFn>,
            None::<&StateGradFn>,
            Some(dg),
            save_idxs,
            options,
        )
    }
}
