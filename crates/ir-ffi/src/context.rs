use ir_graph::ops::{
    ReduceL1, ReduceL2, ReduceLogicalAnd, ReduceLogicalOr, ReduceMax, ReduceMean, ReduceMin,
    ReduceProd, ReduceSum,
};
use ir_graph::{ExecutionConfig, Executor, Graph, NodeId, Op, Output, Result};
use ir_tensor::Tensor;

use crate::types::IRReduceKind;

/// Opaque context handle that owns one graph and the executor that runs it.
pub struct IRContext {
    pub graph: Graph,
    pub executor: Executor,
}

impl Default for IRContext {
    fn default() -> Self {
        Self::new(ExecutionConfig::default())
    }
}

impl IRContext {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            graph: Graph::new(),
            executor: Executor::new(config),
        }
    }

    pub fn output(&self, node: usize, index: usize) -> Result<Output> {
        let output = Output::new(self.graph.node_id(node)?, index);
        self.graph.output_desc(output)?;
        Ok(output)
    }

    pub fn add_reduction(
        &mut self,
        kind: IRReduceKind,
        data: usize,
        axes: usize,
        keep_dims: bool,
    ) -> Result<NodeId> {
        let op: Box<dyn Op> = match kind {
            IRReduceKind::L1 => Box::new(ReduceL1::new(keep_dims)),
            IRReduceKind::L2 => Box::new(ReduceL2::new(keep_dims)),
            IRReduceKind::Sum => Box::new(ReduceSum::new(keep_dims)),
            IRReduceKind::Mean => Box::new(ReduceMean::new(keep_dims)),
            IRReduceKind::Prod => Box::new(ReduceProd::new(keep_dims)),
            IRReduceKind::Max => Box::new(ReduceMax::new(keep_dims)),
            IRReduceKind::Min => Box::new(ReduceMin::new(keep_dims)),
            IRReduceKind::LogicalAnd => Box::new(ReduceLogicalAnd::new(keep_dims)),
            IRReduceKind::LogicalOr => Box::new(ReduceLogicalOr::new(keep_dims)),
        };
        let inputs = [self.output(data, 0)?, self.output(axes, 0)?];
        self.graph.add_boxed(op, &inputs)
    }

    /// Decode raw parameter bytes using each parameter's declared descriptor.
    pub fn bind(&self, node: usize, bytes: &[u8]) -> Result<(NodeId, Tensor)> {
        let id = self.graph.node_id(node)?;
        let desc = self.graph.output_desc(Output::from(id))?;
        let value = Tensor::from_bytes(desc.dtype, desc.shape.clone(), bytes)?;
        Ok((id, value))
    }

    pub fn execute(&self, bindings: &[(NodeId, Tensor)]) -> Result<Vec<Tensor>> {
        self.executor.execute(&self.graph, bindings)
    }
}
