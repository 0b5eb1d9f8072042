use std::fmt;

use ir_tensor::{DType, Shape, Tensor};

use crate::op::{Op, TypeInfo};

/// Index of a node in its [`Graph`](crate::Graph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One output port of a node; input edges point at these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Output {
    pub node: NodeId,
    pub index: usize,
}

impl Output {
    pub fn new(node: NodeId, index: usize) -> Self {
        Output { node, index }
    }
}

impl From<NodeId> for Output {
    fn from(node: NodeId) -> Self {
        Output { node, index: 0 }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.index)
    }
}

/// Element type and shape of a node output, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorDesc {
    pub fn new(dtype: DType, shape: Shape) -> Self {
        TensorDesc { dtype, shape }
    }

    /// Descriptor of an existing tensor, if its shape is set.
    pub fn of(tensor: &Tensor) -> Option<Self> {
        tensor
            .shape()
            .map(|shape| TensorDesc::new(tensor.dtype(), shape.clone()))
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dtype, self.shape)
    }
}

/// A node in the graph arena.
///
/// The op and the inferred output descriptors never change once the node is
/// in the arena. Only input edges can be relinked, and only to outputs with
/// identical descriptors.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) op: Box<dyn Op>,
    pub(crate) inputs: Vec<Output>,
    pub(crate) outputs: Vec<TensorDesc>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Unique name within the graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> &dyn Op {
        self.op.as_ref()
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.op.type_info()
    }

    pub fn inputs(&self) -> &[Output] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorDesc] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<Output> {
        (index < self.outputs.len()).then(|| Output::new(self.id, index))
    }

    /// Downcast the op to a concrete type.
    pub fn op_as<T: Op + 'static>(&self) -> Option<&T> {
        self.op.as_any().downcast_ref::<T>()
    }
}
