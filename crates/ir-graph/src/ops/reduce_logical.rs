//! Boolean reductions. They share the keep-dims machinery with the
//! arithmetic reductions but register only a boolean kernel.

use std::any::Any;

use ir_tensor::{cpu, AxisSet, DType, Tensor};

use crate::dispatch::KernelTable;
use crate::error::Result;
use crate::node::TensorDesc;
use crate::op::{InferenceContext, Op, TypeInfo};
use crate::ops::reduction::{reduce_typed, DataKind, ReduceKernel, ReductionKeepDims};

fn logical_and(
    arg: &Tensor,
    out: &mut Tensor,
    axes: &AxisSet,
    keep_dims: bool,
) -> ir_tensor::Result<()> {
    reduce_typed::<bool>(cpu::reduce_logical_and, arg, out, axes, keep_dims)
}

fn logical_or(
    arg: &Tensor,
    out: &mut Tensor,
    axes: &AxisSet,
    keep_dims: bool,
) -> ir_tensor::Result<()> {
    reduce_typed::<bool>(cpu::reduce_logical_or, arg, out, axes, keep_dims)
}

static AND_KERNELS: KernelTable<ReduceKernel> =
    KernelTable::new(&[(DType::Boolean, logical_and as ReduceKernel)]);

static OR_KERNELS: KernelTable<ReduceKernel> =
    KernelTable::new(&[(DType::Boolean, logical_or as ReduceKernel)]);

/// True where every element along the reduction axes is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceLogicalAnd {
    base: ReductionKeepDims,
}

impl ReduceLogicalAnd {
    pub const TYPE_INFO: TypeInfo = TypeInfo::new("ReduceLogicalAnd", 1);

    pub fn new(keep_dims: bool) -> Self {
        ReduceLogicalAnd {
            base: ReductionKeepDims::new(keep_dims),
        }
    }

    pub fn keep_dims(&self) -> bool {
        self.base.keep_dims()
    }

    pub fn reduction_axes(&self) -> &AxisSet {
        self.base.reduction_axes()
    }
}

impl Op for ReduceLogicalAnd {
    fn type_info(&self) -> &'static TypeInfo {
        &Self::TYPE_INFO
    }

    fn validate_and_infer_types(
        &mut self,
        inputs: &InferenceContext<'_>,
    ) -> Result<Vec<TensorDesc>> {
        self.base.infer(&Self::TYPE_INFO, inputs, DataKind::Logical)
    }

    fn clone_op(&self) -> Box<dyn Op> {
        Box::new(ReduceLogicalAnd {
            base: self.base.attributes(),
        })
    }

    fn evaluate(&self, outputs: &mut [Tensor], inputs: &[&Tensor]) -> bool {
        let _span = tracing::trace_span!("op::v1::ReduceLogicalAnd::evaluate").entered();
        self.base
            .evaluate(&Self::TYPE_INFO, &AND_KERNELS, outputs, inputs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// True where any element along the reduction axes is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceLogicalOr {
    base: ReductionKeepDims,
}

impl ReduceLogicalOr {
    pub const TYPE_INFO: TypeInfo = TypeInfo::new("ReduceLogicalOr", 1);

    pub fn new(keep_dims: bool) -> Self {
        ReduceLogicalOr {
            base: ReductionKeepDims::new(keep_dims),
        }
    }

    pub fn keep_dims(&self) -> bool {
        self.base.keep_dims()
    }

    pub fn reduction_axes(&self) -> &AxisSet {
        self.base.reduction_axes()
    }
}

impl Op for ReduceLogicalOr {
    fn type_info(&self) -> &'static TypeInfo {
        &Self::TYPE_INFO
    }

    fn validate_and_infer_types(
        &mut self,
        inputs: &InferenceContext<'_>,
    ) -> Result<Vec<TensorDesc>> {
        self.base.infer(&Self::TYPE_INFO, inputs, DataKind::Logical)
    }

    fn clone_op(&self) -> Box<dyn Op> {
        Box::new(ReduceLogicalOr {
            base: self.base.attributes(),
        })
    }

    fn evaluate(&self, outputs: &mut [Tensor], inputs: &[&Tensor]) -> bool {
        let _span = tracing::trace_span!("op::v1::ReduceLogicalOr::evaluate").entered();
        self.base
            .evaluate(&Self::TYPE_INFO, &OR_KERNELS, outputs, inputs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
