//! Synchronous graph execution.
//!
//! The executor walks the graph in topological order and evaluates one node
//! at a time. Registered interceptors get the first chance at every node; the
//! op's own reference `evaluate` runs when none of them claims it.

use ir_tensor::Tensor;

use crate::backend::KernelInterceptor;
use crate::config::ExecutionConfig;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{Node, NodeId, Output, TensorDesc};
use crate::ops::Parameter;
use crate::passes;

#[derive(Debug, Default)]
pub struct Executor {
    config: ExecutionConfig,
    interceptors: Vec<Box<dyn KernelInterceptor>>,
}

impl Executor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            interceptors: Vec::new(),
        }
    }

    /// Register a backend interceptor. Interceptors are consulted in the
    /// order they were added.
    pub fn with_interceptor(mut self, interceptor: impl KernelInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn interceptor_names(&self) -> impl Iterator<Item = &str> {
        self.interceptors.iter().map(|i| i.name())
    }

    /// Run the rewrite passes enabled in the config. Returns the number of
    /// nodes rewritten.
    #[tracing::instrument(skip_all, name = "Executor::prepare")]
    pub fn prepare(&self, graph: &mut Graph) -> Result<usize> {
        let mut rewritten = 0;
        if self.config.eliminate_zero_dim {
            rewritten += passes::eliminate_zero_dim(graph)?;
        }
        if self.config.fold_constants {
            rewritten += passes::fold_constants(graph)?;
        }
        tracing::debug!(rewritten, "graph prepared");
        Ok(rewritten)
    }

    /// Evaluate `graph` with `bindings` supplying every parameter.
    ///
    /// Returns one tensor per graph result, in result order.
    #[tracing::instrument(skip_all, name = "Executor::execute")]
    pub fn execute(&self, graph: &Graph, bindings: &[(NodeId, Tensor)]) -> Result<Vec<Tensor>> {
        for (id, _) in bindings {
            if graph.node(*id)?.op_as::<Parameter>().is_none() {
                return Err(GraphError::Other(format!("node {} is not a parameter", id)));
            }
        }

        let mut values: Vec<Option<Vec<Tensor>>> = vec![None; graph.len()];
        for id in graph.topological_order() {
            let node = graph.node(id)?;
            let outputs = match node.op_as::<Parameter>() {
                Some(parameter) => vec![bind(id, parameter, bindings)?],
                None => {
                    let inputs = node
                        .inputs()
                        .iter()
                        .map(|input| value_of(&values, *input))
                        .collect::<Result<Vec<&Tensor>>>()?;
                    self.evaluate_node(node, &inputs)?
                }
            };
            values[id.index()] = Some(outputs);
        }

        graph
            .results()
            .iter()
            .map(|result| value_of(&values, *result).cloned())
            .collect()
    }

    fn evaluate_node(&self, node: &Node, inputs: &[&Tensor]) -> Result<Vec<Tensor>> {
        let mut outputs: Vec<Tensor> = node
            .outputs()
            .iter()
            .map(|desc| Tensor::new(desc.dtype))
            .collect();

        let claimed = self.interceptors.iter().find_map(|interceptor| {
            let handled = interceptor.try_evaluate(node, &mut outputs, inputs)?;
            tracing::debug!(node = %node.id(), backend = interceptor.name(), "interceptor claimed node");
            Some(handled)
        });
        let evaluated = match claimed {
            Some(handled) => handled,
            None => {
                tracing::debug!(node = %node.id(), op = %node.type_info(), "reference evaluate");
                node.op().evaluate(&mut outputs, inputs)
            }
        };

        if !evaluated {
            let dtype = inputs
                .first()
                .map(|t| t.dtype())
                .or_else(|| node.outputs().first().map(|d| d.dtype));
            tracing::warn!(node = %node.id(), op = %node.type_info(), "no kernel for node");
            return Err(match dtype {
                Some(dtype) => GraphError::UnsupportedType {
                    op: node.type_info().to_string(),
                    dtype,
                },
                None => GraphError::Other(format!("{} could not be evaluated", node.type_info())),
            });
        }
        Ok(outputs)
    }
}

fn bind(id: NodeId, parameter: &Parameter, bindings: &[(NodeId, Tensor)]) -> Result<Tensor> {
    let (_, value) = bindings
        .iter()
        .find(|(bound, _)| *bound == id)
        .ok_or(GraphError::MissingParameter(id))?;
    let expected = parameter.desc();
    if TensorDesc::of(value).as_ref() != Some(expected) {
        let got = match TensorDesc::of(value) {
            Some(desc) => desc.to_string(),
            None => format!("{} with no shape", value.dtype()),
        };
        return Err(GraphError::ParameterMismatch {
            node: id,
            expected: expected.to_string(),
            got,
        });
    }
    Ok(value.clone())
}

fn value_of(values: &[Option<Vec<Tensor>>], output: Output) -> Result<&Tensor> {
    values
        .get(output.node.index())
        .and_then(|slot| slot.as_ref())
        .and_then(|outputs| outputs.get(output.index))
        .ok_or(GraphError::InvalidOutput(output))
}
