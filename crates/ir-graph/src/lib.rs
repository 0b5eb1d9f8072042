//! `ir-graph` - Op nodes, graph arena and evaluation for the graph IR.
//!
//! This crate provides:
//! - The `Op` trait: shape inference, clone, default value and `evaluate`
//! - Op implementations (reductions, non-max suppression, parameters, constants)
//! - Per-op kernel tables keyed by element type
//! - An arena `Graph` with clone-with-new-inputs and use relinking
//! - Rewrite passes (constant folding, zero-dim elimination)
//! - An `Executor` with pluggable backend interceptors

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod op;
pub mod ops;
pub mod passes;

// Re-export primary types at the crate root for convenience.
pub use backend::KernelInterceptor;
pub use config::ExecutionConfig;
pub use dispatch::KernelTable;
pub use error::{GraphError, Result};
pub use executor::Executor;
pub use graph::Graph;
pub use node::{Node, NodeId, Output, TensorDesc};
pub use op::{InferenceContext, InferenceInput, Op, TypeInfo};
