//! Arena graph.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Adding a node
//! runs shape inference first; a node that fails inference never enters the
//! arena. Nodes are never removed: rewrites append new nodes and relink the
//! consumers, leaving the old ones unreachable from the results.

use std::collections::{HashMap, HashSet};

use ir_tensor::{DType, Shape, Tensor};

use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId, Output, TensorDesc};
use crate::op::{InferenceContext, InferenceInput, Op};
use crate::ops::{Constant, Parameter};

#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    results: Vec<Output>,
    names: HashSet<String>,
    name_counters: HashMap<&'static str, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The id of the node at arena position `index`.
    pub fn node_id(&self, index: usize) -> Result<NodeId> {
        if index < self.nodes.len() {
            Ok(NodeId(index))
        } else {
            Err(GraphError::InvalidNode(NodeId(index)))
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(GraphError::InvalidNode(id))
    }

    pub fn output_desc(&self, output: Output) -> Result<&TensorDesc> {
        self.node(output.node)?
            .outputs
            .get(output.index)
            .ok_or(GraphError::InvalidOutput(output))
    }

    /// The value behind `output` if it is produced by a constant.
    pub fn constant_value(&self, output: Output) -> Option<&Tensor> {
        if output.index != 0 {
            return None;
        }
        self.nodes.get(output.node.0)?.op.constant_value()
    }

    /// Validate `op` against `inputs` and append it.
    pub fn add_op<O: Op>(&mut self, op: O, inputs: &[Output]) -> Result<NodeId> {
        self.add_boxed(Box::new(op), inputs)
    }

    pub fn add_boxed(&mut self, mut op: Box<dyn Op>, inputs: &[Output]) -> Result<NodeId> {
        let outputs = {
            let mut seen = Vec::with_capacity(inputs.len());
            for &input in inputs {
                seen.push(InferenceInput {
                    desc: self.output_desc(input)?,
                    constant: self.constant_value(input),
                });
            }
            op.validate_and_infer_types(&InferenceContext::new(seen))?
        };

        let id = NodeId(self.nodes.len());
        let name = self.fresh_name(op.type_info().name);
        tracing::trace!(node = %id, name = %name, "added node");
        self.nodes.push(Node {
            id,
            name,
            op,
            inputs: inputs.to_vec(),
            outputs,
        });
        Ok(id)
    }

    pub fn parameter(&mut self, dtype: DType, shape: Shape) -> Result<Output> {
        Ok(self.add_op(Parameter::new(dtype, shape), &[])?.into())
    }

    pub fn constant(&mut self, value: Tensor) -> Result<Output> {
        Ok(self.add_op(Constant::new(value), &[])?.into())
    }

    /// Ids of every `Parameter` node, in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.op_as::<Parameter>().is_some())
            .map(|node| node.id)
    }

    fn fresh_name(&mut self, type_name: &'static str) -> String {
        let counter = self.name_counters.entry(type_name).or_insert(0);
        loop {
            let candidate = format!("{}_{}", type_name, counter);
            *counter += 1;
            if self.names.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Rename a node. Names stay unique across the graph.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let current = &self.node(id)?.name;
        if *current == name {
            return Ok(());
        }
        if self.names.contains(&name) {
            return Err(GraphError::DuplicateName(name));
        }
        let node = &mut self.nodes[id.0];
        self.names.remove(&node.name);
        self.names.insert(name.clone());
        node.name = name;
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| node.id)
    }

    /// Mark `output` as a graph result.
    pub fn add_result(&mut self, output: Output) -> Result<()> {
        self.output_desc(output)?;
        self.results.push(output);
        Ok(())
    }

    pub fn results(&self) -> &[Output] {
        &self.results
    }

    /// A new node with the attributes of `id` and `inputs` in place of its
    /// original inputs. `id` itself is left as it was.
    pub fn clone_with_new_inputs(&mut self, id: NodeId, inputs: &[Output]) -> Result<NodeId> {
        let node = self.node(id)?;
        if inputs.len() != node.inputs.len() {
            return Err(GraphError::ArgumentCount {
                op: node.type_info().to_string(),
                expected: node.inputs.len(),
                got: inputs.len(),
            });
        }
        let op = node.op.clone_op();
        self.add_boxed(op, inputs)
    }

    /// Append a constant holding the neutral value of `id`'s first output.
    pub fn default_value(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        let desc = node
            .outputs
            .first()
            .ok_or(GraphError::InvalidOutput(Output::new(id, 0)))?;
        let value = node
            .op
            .default_value(desc)
            .ok_or_else(|| GraphError::NoDefaultValue(node.type_info().to_string()))?;
        self.add_op(Constant::new(value), &[])
    }

    /// Point every consumer edge and result that reads `old` at `new`.
    ///
    /// Returns the number of edges rewritten. Both outputs must have the same
    /// descriptor. Edges owned by `new`'s own node are left alone, so `new`
    /// may read `old` directly. Any other node `new` depends on must not read
    /// `old`, since relinking it would close a cycle.
    pub fn replace_uses(&mut self, old: Output, new: Output) -> Result<usize> {
        let old_desc = self.output_desc(old)?;
        let new_desc = self.output_desc(new)?;
        if old_desc != new_desc {
            return Err(GraphError::Other(format!(
                "cannot replace {} ({}) with {} ({})",
                old, old_desc, new, new_desc
            )));
        }
        if let Some(reader) = self
            .ancestors(new.node)
            .into_iter()
            .find(|&id| self.nodes[id.0].inputs.contains(&old))
        {
            return Err(GraphError::Other(format!(
                "replacing {} with {} would create a cycle through {}",
                old, new, reader
            )));
        }

        let mut replaced = 0;
        for node in self.nodes.iter_mut().filter(|node| node.id != new.node) {
            for input in node.inputs.iter_mut().filter(|input| **input == old) {
                *input = new;
                replaced += 1;
            }
        }
        for result in self.results.iter_mut().filter(|result| **result == old) {
            *result = new;
            replaced += 1;
        }
        Ok(replaced)
    }

    /// Nodes `id` transitively reads from, excluding `id` itself.
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for input in &self.nodes[current.0].inputs {
                if !visited[input.node.0] {
                    visited[input.node.0] = true;
                    found.push(input.node);
                    stack.push(input.node);
                }
            }
        }
        found
    }

    /// Nodes that read any output of `id`.
    pub fn consumers(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.inputs.iter().any(|input| input.node == id))
            .map(|node| node.id)
            .collect()
    }

    /// Nodes reachable from the results, each after all of its inputs.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        // (node, inputs already pushed)
        let mut stack: Vec<(NodeId, bool)> = self
            .results
            .iter()
            .rev()
            .map(|result| (result.node, false))
            .collect();

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            stack.push((id, true));
            for input in self.nodes[id.0].inputs.iter().rev() {
                if !visited[input.node.0] {
                    stack.push((input.node, false));
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{ReduceL1, ReduceLogicalAnd, ReduceSum};

    fn axes(values: Vec<i64>) -> Tensor {
        let n = values.len();
        Tensor::from_vec(values, Shape::new(vec![n])).unwrap()
    }

    fn reduce_l1_graph() -> (Graph, Output, Output, NodeId) {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![2, 5, 5])).unwrap();
        let axes = graph.constant(axes(vec![2])).unwrap();
        let node = graph.add_op(ReduceL1::new(false), &[data, axes]).unwrap();
        graph.add_result(node.into()).unwrap();
        (graph, data, axes, node)
    }

    #[test]
    fn test_unique_names() {
        let (mut graph, _, _, node) = reduce_l1_graph();
        assert_eq!(graph.node(node).unwrap().name(), "ReduceL1_0");
        assert_eq!(graph.nodes()[0].name(), "Parameter_0");
        assert_eq!(graph.parameters().collect::<Vec<_>>(), vec![NodeId(0)]);

        graph.set_name(node, "Constant_0").unwrap_err();
        graph.set_name(node, "l1").unwrap();
        assert_eq!(graph.find_by_name("l1"), Some(node));
        assert_eq!(
            graph.set_name(NodeId(0), "l1"),
            Err(GraphError::DuplicateName("l1".to_string()))
        );
    }

    #[test]
    fn test_generated_name_skips_taken() {
        let mut graph = Graph::new();
        let first = graph.parameter(DType::F32, Shape::new(vec![1])).unwrap();
        graph.set_name(first.node, "Parameter_1").unwrap();
        let second = graph.parameter(DType::F32, Shape::new(vec![1])).unwrap();
        assert_eq!(graph.node(second.node).unwrap().name(), "Parameter_2");
    }

    #[test]
    fn test_invalid_input_reference() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![2])).unwrap();
        let bogus = Output::new(NodeId(7), 0);
        let err = graph.add_op(ReduceSum::new(false), &[data, bogus]).unwrap_err();
        assert_eq!(err, GraphError::InvalidNode(NodeId(7)));
        let err = graph
            .add_op(ReduceSum::new(false), &[data, Output::new(data.node, 1)])
            .unwrap_err();
        assert_eq!(err, GraphError::InvalidOutput(Output::new(data.node, 1)));
    }

    #[test]
    fn test_clone_matches_fresh_construction() {
        let (mut graph, data, axes, node) = reduce_l1_graph();
        let cloned = graph.clone_with_new_inputs(node, &[data, axes]).unwrap();
        assert_ne!(cloned, node);
        assert_eq!(
            graph.node(cloned).unwrap().outputs(),
            graph.node(node).unwrap().outputs()
        );
        let original = graph.node(node).unwrap().op_as::<ReduceL1>().unwrap();
        let copy = graph.node(cloned).unwrap().op_as::<ReduceL1>().unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn test_clone_with_new_data() {
        let (mut graph, _, axes, node) = reduce_l1_graph();
        let other = graph.parameter(DType::I32, Shape::new(vec![3, 4, 6])).unwrap();
        let cloned = graph.clone_with_new_inputs(node, &[other, axes]).unwrap();
        assert_eq!(
            graph.node(cloned).unwrap().outputs()[0],
            TensorDesc::new(DType::I32, Shape::new(vec![3, 4]))
        );
        // The original keeps its inputs and descriptor.
        assert_eq!(
            graph.node(node).unwrap().outputs()[0],
            TensorDesc::new(DType::F32, Shape::new(vec![2, 5]))
        );
    }

    #[test]
    fn test_clone_argument_count() {
        let (mut graph, data, axes, node) = reduce_l1_graph();
        let before = graph.len();
        for inputs in [vec![data], vec![data, axes, axes]] {
            let err = graph.clone_with_new_inputs(node, &inputs).unwrap_err();
            assert_eq!(
                err,
                GraphError::ArgumentCount {
                    op: "v4::ReduceL1".to_string(),
                    expected: 2,
                    got: inputs.len()
                }
            );
        }
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn test_default_value_is_zero_constant() {
        let (mut graph, _, _, node) = reduce_l1_graph();
        let zero = graph.default_value(node).unwrap();
        let value = graph.constant_value(zero.into()).unwrap();
        assert_eq!(value.shape(), Some(&Shape::new(vec![2, 5])));
        assert_eq!(value.data_f32().unwrap(), &[0.0; 10]);
    }

    #[test]
    fn test_default_value_missing() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::Boolean, Shape::new(vec![4])).unwrap();
        let axes = graph.constant(axes(vec![0])).unwrap();
        let node = graph.add_op(ReduceLogicalAnd::new(false), &[data, axes]).unwrap();
        assert!(matches!(
            graph.default_value(node),
            Err(GraphError::NoDefaultValue(_))
        ));
    }

    #[test]
    fn test_replace_uses() {
        let (mut graph, _, _, node) = reduce_l1_graph();
        let zero = graph.default_value(node).unwrap();
        assert_eq!(graph.replace_uses(node.into(), zero.into()).unwrap(), 1);
        assert_eq!(graph.results(), &[Output::from(zero)]);

        let scalar = graph.constant(Tensor::scalar(1.0f32)).unwrap();
        assert!(graph.replace_uses(zero.into(), scalar).is_err());
    }

    #[test]
    fn test_replace_uses_with_direct_reader() {
        let (mut graph, data, axes, _) = reduce_l1_graph();
        let sum = graph.add_op(ReduceSum::new(true), &[data, axes]).unwrap();
        graph.add_result(sum.into()).unwrap();
        let wrapped = graph
            .clone_with_new_inputs(sum, &[Output::from(sum), axes])
            .unwrap();
        assert_eq!(graph.replace_uses(sum.into(), wrapped.into()).unwrap(), 1);
        assert_eq!(graph.results()[1], Output::from(wrapped));
        assert_eq!(graph.node(wrapped).unwrap().inputs()[0], Output::from(sum));
    }

    #[test]
    fn test_replace_uses_rejects_cycle() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![2, 3])).unwrap();
        let none = graph.constant(axes(vec![])).unwrap();
        let first = graph.add_op(ReduceSum::new(false), &[data, none]).unwrap();
        let second = graph
            .add_op(ReduceSum::new(false), &[first.into(), none])
            .unwrap();
        graph.add_result(second.into()).unwrap();

        let err = graph.replace_uses(data, second.into()).unwrap_err();
        assert!(err.to_string().contains("would create a cycle"));
        assert_eq!(graph.node(first).unwrap().inputs()[0], data);
        assert_eq!(graph.topological_order(), vec![data.node, none.node, first, second]);
    }

    #[test]
    fn test_topological_order_skips_dead_nodes() {
        let (mut graph, data, axes, node) = reduce_l1_graph();
        let _dead = graph.add_op(ReduceSum::new(true), &[data, axes]).unwrap();
        let order = graph.topological_order();
        assert_eq!(order, vec![data.node, axes.node, node]);
        assert_eq!(graph.consumers(data.node).len(), 2);
    }

    #[test]
    fn test_topological_order_after_relink() {
        let (mut graph, data, _, node) = reduce_l1_graph();
        // A constant appended after its consumer must still come first.
        let late_axes = graph.constant(axes(vec![-1])).unwrap();
        let relinked = graph.clone_with_new_inputs(node, &[data, late_axes]).unwrap();
        graph.replace_uses(node.into(), relinked.into()).unwrap();
        let order = graph.topological_order();
        let pos = |id: NodeId| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(late_axes.node) < pos(relinked));
        assert!(!order.contains(&node));
    }
}
