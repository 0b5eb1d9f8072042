use crate::error::Result;
use crate::graph::Graph;
use crate::node::{NodeId, Output};

/// Replace every reachable reduction over empty data with its default value.
///
/// A node qualifies when its first input has no elements and its op provides
/// a default value for its output. Returns the number of nodes replaced.
pub fn eliminate_zero_dim(graph: &mut Graph) -> Result<usize> {
    let mut replaced = 0;
    for id in graph.topological_order() {
        if !reduces_empty_data(graph, id)? {
            continue;
        }
        let default = graph.default_value(id)?;
        graph.replace_uses(Output::from(id), default.into())?;
        tracing::debug!(node = %id, replacement = %default, "replaced empty reduction");
        replaced += 1;
    }
    Ok(replaced)
}

fn reduces_empty_data(graph: &Graph, id: NodeId) -> Result<bool> {
    let node = graph.node(id)?;
    let (Some(&data), Some(desc)) = (node.inputs().first(), node.outputs().first()) else {
        return Ok(false);
    };
    if graph.output_desc(data)?.shape.numel() != 0 {
        return Ok(false);
    }
    Ok(node.op().default_value(desc).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{ReduceLogicalOr, ReduceMax, ReduceMean, ReduceProd};
    use ir_tensor::{DType, Shape, Tensor};

    fn axes(values: Vec<i64>) -> Tensor {
        let n = values.len();
        Tensor::from_vec(values, Shape::new(vec![n])).unwrap()
    }

    #[test]
    fn test_empty_product_becomes_ones() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![2, 0, 3])).unwrap();
        let axis = graph.constant(axes(vec![1])).unwrap();
        let prod = graph.add_op(ReduceProd::new(false), &[data, axis]).unwrap();
        graph.add_result(prod.into()).unwrap();

        assert_eq!(eliminate_zero_dim(&mut graph).unwrap(), 1);
        let value = graph.constant_value(graph.results()[0]).unwrap();
        assert_eq!(value.shape(), Some(&Shape::new(vec![2, 3])));
        assert_eq!(value.data_f32().unwrap(), &[1.0; 6]);
    }

    #[test]
    fn test_empty_max_uses_lowest() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::I64, Shape::new(vec![0, 2])).unwrap();
        let axis = graph.constant(axes(vec![0])).unwrap();
        let max = graph.add_op(ReduceMax::new(true), &[data, axis]).unwrap();
        graph.add_result(max.into()).unwrap();

        assert_eq!(eliminate_zero_dim(&mut graph).unwrap(), 1);
        let value = graph.constant_value(graph.results()[0]).unwrap();
        assert_eq!(value.data::<i64>().unwrap(), &[i64::MIN, i64::MIN]);
    }

    #[test]
    fn test_non_empty_and_logical_untouched() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![2, 3])).unwrap();
        let axis = graph.constant(axes(vec![1])).unwrap();
        let prod = graph.add_op(ReduceProd::new(false), &[data, axis]).unwrap();
        graph.add_result(prod.into()).unwrap();

        let flags = graph.parameter(DType::Boolean, Shape::new(vec![0])).unwrap();
        let axis = graph.constant(axes(vec![0])).unwrap();
        let any = graph.add_op(ReduceLogicalOr::new(false), &[flags, axis]).unwrap();
        graph.add_result(any.into()).unwrap();

        assert_eq!(eliminate_zero_dim(&mut graph).unwrap(), 0);
        assert_eq!(graph.results(), &[Output::from(prod), Output::from(any)]);
    }

    #[test]
    fn test_empty_mean_untouched() {
        let mut graph = Graph::new();
        let data = graph.parameter(DType::F32, Shape::new(vec![3, 0])).unwrap();
        let axis = graph.constant(axes(vec![1])).unwrap();
        let mean = graph.add_op(ReduceMean::new(false), &[data, axis]).unwrap();
        graph.add_result(mean.into()).unwrap();

        assert_eq!(eliminate_zero_dim(&mut graph).unwrap(), 0);
        assert_eq!(graph.results(), &[Output::from(mean)]);
    }
}
