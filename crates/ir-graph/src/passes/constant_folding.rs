use ir_tensor::Tensor;

use crate::error::Result;
use crate::graph::Graph;
use crate::node::{NodeId, Output, TensorDesc};

/// Evaluate every reachable node whose inputs are all constants and replace
/// its outputs with `Constant` nodes.
///
/// Nodes without a kernel for their element type are skipped, as are nodes
/// whose evaluated shape differs from the inferred one. Returns the number of
/// nodes folded.
pub fn fold_constants(graph: &mut Graph) -> Result<usize> {
    let mut folded = 0;
    for id in graph.topological_order() {
        let Some(values) = try_fold(graph, id)? else {
            continue;
        };
        for (index, value) in values.into_iter().enumerate() {
            let replacement = graph.constant(value)?;
            graph.replace_uses(Output::new(id, index), replacement)?;
        }
        tracing::debug!(node = %id, "folded constant node");
        folded += 1;
    }
    Ok(folded)
}

fn try_fold(graph: &Graph, id: NodeId) -> Result<Option<Vec<Tensor>>> {
    let node = graph.node(id)?;
    if node.inputs().is_empty() {
        return Ok(None);
    }
    let Some(inputs) = node
        .inputs()
        .iter()
        .map(|input| graph.constant_value(*input))
        .collect::<Option<Vec<&Tensor>>>()
    else {
        return Ok(None);
    };

    let mut outputs: Vec<Tensor> = node
        .outputs()
        .iter()
        .map(|desc| Tensor::new(desc.dtype))
        .collect();
    if !node.op().evaluate(&mut outputs, &inputs) {
        tracing::debug!(node = %id, op = %node.type_info(), "constant folding skipped: no kernel");
        return Ok(None);
    }

    let matches_inferred = outputs
        .iter()
        .zip(node.outputs())
        .all(|(value, desc)| TensorDesc::of(value).as_ref() == Some(desc));
    if !matches_inferred {
        tracing::debug!(node = %id, op = %node.type_info(), "constant folding skipped: dynamic output shape");
        return Ok(None);
    }
    Ok(Some(outputs))
}
