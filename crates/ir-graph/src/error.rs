use ir_tensor::DType;
use thiserror::Error;

use crate::node::{NodeId, Output};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("shape inference failed for {op}: {reason}")]
    ShapeInference { op: String, reason: String },
    #[error("{op} expects {expected} inputs, got {got}")]
    ArgumentCount {
        op: String,
        expected: usize,
        got: usize,
    },
    #[error("{op} has no kernel for element type {dtype}")]
    UnsupportedType { op: String, dtype: DType },
    #[error("node {0} does not exist")]
    InvalidNode(NodeId),
    #[error("output {0} does not exist")]
    InvalidOutput(Output),
    #[error("node name '{0}' is already in use")]
    DuplicateName(String),
    #[error("parameter {node} expects {expected}, got {got}")]
    ParameterMismatch {
        node: NodeId,
        expected: String,
        got: String,
    },
    #[error("no value bound for parameter {0}")]
    MissingParameter(NodeId),
    #[error("{0} has no default value")]
    NoDefaultValue(String),
    #[error("tensor error: {0}")]
    Tensor(#[from] ir_tensor::TensorError),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
