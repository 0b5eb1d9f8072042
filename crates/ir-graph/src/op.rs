use std::any::Any;
use std::fmt;
use std::ops::RangeInclusive;

use ir_tensor::Tensor;

use crate::error::{GraphError, Result};
use crate::node::TensorDesc;

/// Type tag of an op: its name and the opset version it belongs to.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub name: &'static str,
    pub version: u64,
}

impl TypeInfo {
    pub const fn new(name: &'static str, version: u64) -> Self {
        TypeInfo { name, version }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}::{}", self.version, self.name)
    }
}

/// What shape inference can see of one input: its descriptor, plus the value
/// when the input comes from a constant.
#[derive(Debug, Clone, Copy)]
pub struct InferenceInput<'a> {
    pub desc: &'a TensorDesc,
    pub constant: Option<&'a Tensor>,
}

/// Inputs handed to [`Op::validate_and_infer_types`].
#[derive(Debug, Clone)]
pub struct InferenceContext<'a> {
    inputs: Vec<InferenceInput<'a>>,
}

impl<'a> InferenceContext<'a> {
    pub fn new(inputs: Vec<InferenceInput<'a>>) -> Self {
        InferenceContext { inputs }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn desc(&self, index: usize) -> Option<&'a TensorDesc> {
        self.inputs.get(index).map(|input| input.desc)
    }

    pub fn constant(&self, index: usize) -> Option<&'a Tensor> {
        self.inputs.get(index).and_then(|input| input.constant)
    }
}

/// A typed graph operation.
///
/// An op value starts out holding only its attributes. Graph insertion calls
/// [`Op::validate_and_infer_types`] once; if it succeeds the op moves into the
/// arena and is only reachable through `&dyn Op` from then on.
pub trait Op: Any + fmt::Debug + Send + Sync {
    fn type_info(&self) -> &'static TypeInfo;

    /// Validate the inputs and return one descriptor per output.
    ///
    /// May record derived state (such as normalized axes) on `self`.
    fn validate_and_infer_types(&mut self, inputs: &InferenceContext<'_>)
        -> Result<Vec<TensorDesc>>;

    /// A fresh op with the same attributes and no derived state.
    fn clone_op(&self) -> Box<dyn Op>;

    /// Neutral value of this op's output, for optimizers that need a
    /// placeholder. `None` if the op has no such value.
    fn default_value(&self, _output: &TensorDesc) -> Option<Tensor> {
        None
    }

    /// Compute the outputs from concrete input tensors.
    ///
    /// Returns `false` when no kernel handles the input element type; the
    /// outputs are left untouched in that case.
    fn evaluate(&self, outputs: &mut [Tensor], inputs: &[&Tensor]) -> bool;

    /// The value held by a constant op.
    fn constant_value(&self) -> Option<&Tensor> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Build a [`GraphError::ShapeInference`] for `info`.
pub fn shape_error(info: &TypeInfo, reason: impl Into<String>) -> GraphError {
    GraphError::ShapeInference {
        op: info.to_string(),
        reason: reason.into(),
    }
}

/// Check the number of inputs seen by shape inference.
pub fn check_input_count(
    info: &TypeInfo,
    inputs: &InferenceContext<'_>,
    allowed: RangeInclusive<usize>,
) -> Result<()> {
    if allowed.contains(&inputs.len()) {
        return Ok(());
    }
    let expected = if allowed.start() == allowed.end() {
        allowed.start().to_string()
    } else {
        format!("{} to {}", allowed.start(), allowed.end())
    };
    Err(shape_error(
        info,
        format!("expected {} inputs, got {}", expected, inputs.len()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_tensor::{DType, Shape};

    static INFO: TypeInfo = TypeInfo::new("Sample", 3);

    #[test]
    fn test_type_info_display() {
        assert_eq!(INFO.to_string(), "v3::Sample");
    }

    #[test]
    fn test_context_accessors() {
        let desc = TensorDesc::new(DType::I64, Shape::new(vec![1]));
        let value = Tensor::from_vec(vec![0i64], Shape::new(vec![1])).unwrap();
        let ctx = InferenceContext::new(vec![
            InferenceInput {
                desc: &desc,
                constant: None,
            },
            InferenceInput {
                desc: &desc,
                constant: Some(&value),
            },
        ]);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.constant(0).is_none());
        assert_eq!(ctx.constant(1), Some(&value));
        assert!(ctx.desc(2).is_none());
    }

    #[test]
    fn test_check_input_count() {
        let ctx = InferenceContext::new(Vec::new());
        assert!(check_input_count(&INFO, &ctx, 0..=0).is_ok());
        let err = check_input_count(&INFO, &ctx, 2..=6).unwrap_err();
        assert_eq!(
            err,
            GraphError::ShapeInference {
                op: "v3::Sample".to_string(),
                reason: "expected 2 to 6 inputs, got 0".to_string()
            }
        );
    }
}
