use std::any::Any;

use ir_tensor::{DType, Shape, Tensor};

use crate::error::Result;
use crate::node::TensorDesc;
use crate::op::{check_input_count, InferenceContext, Op, TypeInfo};

/// A graph input. Its value is bound by the executor, never computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    desc: TensorDesc,
}

impl Parameter {
    pub const TYPE_INFO: TypeInfo = TypeInfo::new("Parameter", 0);

    pub fn new(dtype: DType, shape: Shape) -> Self {
        Parameter {
            desc: TensorDesc::new(dtype, shape),
        }
    }

    pub fn desc(&self) -> &TensorDesc {
        &self.desc
    }
}

impl Op for Parameter {
    fn type_info(&self) -> &'static TypeInfo {
        &Self::TYPE_INFO
    }

    fn validate_and_infer_types(
        &mut self,
        inputs: &InferenceContext<'_>,
    ) -> Result<Vec<TensorDesc>> {
        check_input_count(&Self::TYPE_INFO, inputs, 0..=0)?;
        Ok(vec![self.desc.clone()])
    }

    fn clone_op(&self) -> Box<dyn Op> {
        Box::new(self.clone())
    }

    fn evaluate(&self, _outputs: &mut [Tensor], _inputs: &[&Tensor]) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
