use std::any::Any;

use ir_tensor::Tensor;

use crate::error::Result;
use crate::node::TensorDesc;
use crate::op::{check_input_count, shape_error, InferenceContext, Op, TypeInfo};

/// A node holding a fixed tensor value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: Tensor,
}

impl Constant {
    pub const TYPE_INFO: TypeInfo = TypeInfo::new("Constant", 0);

    /// `value` must have its shape set; graph insertion rejects it otherwise.
    pub fn new(value: Tensor) -> Self {
        Constant { value }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }
}

impl Op for Constant {
    fn type_info(&self) -> &'static TypeInfo {
        &Self::TYPE_INFO
    }

    fn validate_and_infer_types(
        &mut self,
        inputs: &InferenceContext<'_>,
    ) -> Result<Vec<TensorDesc>> {
        check_input_count(&Self::TYPE_INFO, inputs, 0..=0)?;
        let desc = TensorDesc::of(&self.value)
            .ok_or_else(|| shape_error(&Self::TYPE_INFO, "constant value has no shape"))?;
        Ok(vec![desc])
    }

    fn clone_op(&self) -> Box<dyn Op> {
        Box::new(self.clone())
    }

    fn evaluate(&self, outputs: &mut [Tensor], _inputs: &[&Tensor]) -> bool {
        let _span = tracing::trace_span!("op::v0::Constant::evaluate").entered();
        match outputs.first_mut() {
            Some(out) if out.dtype() == self.value.dtype() => {
                *out = self.value.clone();
                true
            }
            _ => false,
        }
    }

    fn constant_value(&self) -> Option<&Tensor> {
        Some(&self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_tensor::{DType, Shape};

    #[test]
    fn test_evaluate_copies_value() {
        let value = Tensor::from_vec(vec![1i32, 2, 3], Shape::new(vec![3])).unwrap();
        let op = Constant::new(value.clone());
        let mut outputs = vec![Tensor::new(DType::I32)];
        assert!(op.evaluate(&mut outputs, &[]));
        assert_eq!(outputs[0], value);
    }

    #[test]
    fn test_evaluate_wrong_output_type() {
        let op = Constant::new(Tensor::scalar(1.0f32));
        let mut outputs = vec![Tensor::new(DType::I64)];
        assert!(!op.evaluate(&mut outputs, &[]));
        assert!(outputs[0].shape().is_none());
    }

    #[test]
    fn test_unshaped_value_rejected() {
        let mut op = Constant::new(Tensor::new(DType::F32));
        let err = op
            .validate_and_infer_types(&InferenceContext::new(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, crate::GraphError::ShapeInference { .. }));
    }
}
