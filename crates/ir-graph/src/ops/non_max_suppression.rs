use std::any::Any;

use half::{bf16, f16};
use ir_tensor::cpu::{self, BoxEncoding, NmsParams, SelectedBox};
use ir_tensor::{DType, Numeric, Shape, Tensor};

use crate::dispatch::KernelTable;
use crate::error::Result;
use crate::node::TensorDesc;
use crate::op::{check_input_count, shape_error, InferenceContext, Op, TypeInfo};

/// Widens a box or score tensor to `f32` for the reference kernel.
type WidenKernel = fn(&Tensor) -> ir_tensor::Result<Vec<f32>>;

fn widen<T: Numeric>(tensor: &Tensor) -> ir_tensor::Result<Vec<f32>> {
    Ok(tensor.data::<T>()?.iter().map(|v| v.to_f32()).collect())
}

static KERNELS: KernelTable<WidenKernel> = KernelTable::new(&[
    (DType::BF16, widen::<bf16> as WidenKernel),
    (DType::F16, widen::<f16> as WidenKernel),
    (DType::F32, widen::<f32> as WidenKernel),
]);

const MAX_OUTPUT_BOXES: usize = 2;
const IOU_THRESHOLD: usize = 3;
const SCORE_THRESHOLD: usize = 4;
const SOFT_NMS_SIGMA: usize = 5;

/// Greedy non-max suppression with optional Gaussian soft suppression.
///
/// Inputs are `boxes [B, N, 4]`, `scores [B, C, N]` and up to four optional
/// scalars: `max_output_boxes_per_class`, `iou_threshold`, `score_threshold`
/// and `soft_nms_sigma`. Outputs are `selected_indices [M, 3]`,
/// `selected_scores [M, 3]` and `valid_outputs [1]`. Inference reports the
/// upper bound for `M`; evaluation trims to the boxes actually selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonMaxSuppression {
    box_encoding: BoxEncoding,
    sort_result_descending: bool,
    output_type: DType,
}

impl NonMaxSuppression {
    pub const TYPE_INFO: TypeInfo = TypeInfo::new("NonMaxSuppression", 5);

    pub fn new(box_encoding: BoxEncoding, sort_result_descending: bool, output_type: DType) -> Self {
        NonMaxSuppression {
            box_encoding,
            sort_result_descending,
            output_type,
        }
    }

    pub fn box_encoding(&self) -> BoxEncoding {
        self.box_encoding
    }

    pub fn sort_result_descending(&self) -> bool {
        self.sort_result_descending
    }

    pub fn output_type(&self) -> DType {
        self.output_type
    }

    fn check_scalar(&self, inputs: &InferenceContext<'_>, index: usize, name: &str) -> Result<()> {
        let Some(desc) = inputs.desc(index) else {
            return Ok(());
        };
        if desc.shape.ndim() > 1 || desc.shape.numel() != 1 {
            return Err(shape_error(
                &Self::TYPE_INFO,
                format!("{} must be a scalar, got shape {}", name, desc.shape),
            ));
        }
        let type_ok = if index == MAX_OUTPUT_BOXES {
            desc.dtype.is_integral()
        } else {
            desc.dtype.is_real()
        };
        if !type_ok {
            return Err(shape_error(
                &Self::TYPE_INFO,
                format!("{} has unsupported element type {}", name, desc.dtype),
            ));
        }
        Ok(())
    }

    fn params(&self, inputs: &[&Tensor]) -> ir_tensor::Result<NmsParams> {
        let real = |index: usize| -> ir_tensor::Result<f32> {
            inputs.get(index).map_or(Ok(0.0), |t| t.scalar_f32())
        };
        let max_out = match inputs.get(MAX_OUTPUT_BOXES) {
            Some(t) => t.scalar_i64()?.max(0) as usize,
            None => 0,
        };
        Ok(NmsParams {
            box_encoding: self.box_encoding,
            max_output_boxes_per_class: max_out,
            iou_threshold: real(IOU_THRESHOLD)?,
            score_threshold: real(SCORE_THRESHOLD)?,
            soft_nms_sigma: real(SOFT_NMS_SIGMA)?,
            sort_result_descending: self.sort_result_descending,
        })
    }

    fn run(&self, inputs: &[&Tensor], widen: WidenKernel) -> ir_tensor::Result<[Tensor; 3]> {
        let (boxes, scores) = (inputs[0], inputs[1]);
        let params = self.params(inputs)?;
        let selected = cpu::non_max_suppression(
            &widen(boxes)?,
            boxes.static_shape()?.dims(),
            &scores.to_f32_vec()?,
            scores.static_shape()?.dims(),
            &params,
        )?;
        tracing::debug!(selected = selected.len(), "non-max suppression done");
        self.pack(&selected)
    }

    fn pack(&self, selected: &[SelectedBox]) -> ir_tensor::Result<[Tensor; 3]> {
        let count = selected.len();
        let rows = Shape::new(vec![count, 3]);
        let indices: Vec<i64> = selected
            .iter()
            .flat_map(|s| [s.batch as i64, s.class as i64, s.index as i64])
            .collect();
        let scores: Vec<f32> = selected
            .iter()
            .flat_map(|s| [s.batch as f32, s.class as f32, s.score])
            .collect();
        Ok([
            integral_tensor(self.output_type, indices, rows.clone())?,
            Tensor::from_vec(scores, rows)?,
            integral_tensor(self.output_type, vec![count as i64], Shape::new(vec![1]))?,
        ])
    }
}

/// Build an i32 or i64 tensor from `values`; every other type falls back to i64.
fn integral_tensor(dtype: DType, values: Vec<i64>, shape: Shape) -> ir_tensor::Result<Tensor> {
    match dtype {
        DType::I32 => {
            let narrowed: Vec<i32> = values.into_iter().map(|v| v as i32).collect();
            Tensor::from_vec(narrowed, shape)
        }
        _ => Tensor::from_vec(values, shape),
    }
}

impl Op for NonMaxSuppression {
    fn type_info(&self) -> &'static TypeInfo {
        &Self::TYPE_INFO
    }

    fn validate_and_infer_types(
        &mut self,
        inputs: &InferenceContext<'_>,
    ) -> Result<Vec<TensorDesc>> {
        let info = &Self::TYPE_INFO;
        check_input_count(info, inputs, 2..=6)?;
        if !matches!(self.output_type, DType::I32 | DType::I64) {
            return Err(shape_error(
                info,
                format!("output_type must be i32 or i64, got {}", self.output_type),
            ));
        }
        let (boxes, scores) = match (inputs.desc(0), inputs.desc(1)) {
            (Some(boxes), Some(scores)) => (boxes, scores),
            _ => return Err(shape_error(info, "missing input descriptor")),
        };
        if !boxes.dtype.is_real() || !scores.dtype.is_real() {
            return Err(shape_error(
                info,
                format!(
                    "boxes and scores must be floating point, got {} and {}",
                    boxes.dtype, scores.dtype
                ),
            ));
        }
        let (num_batches, num_boxes) = match boxes.shape.dims() {
            [b, n, 4] => (*b, *n),
            _ => {
                return Err(shape_error(
                    info,
                    format!("boxes must have shape [batches, boxes, 4], got {}", boxes.shape),
                ))
            }
        };
        let num_classes = match scores.shape.dims() {
            [b, c, n] if *b == num_batches && *n == num_boxes => *c,
            _ => {
                return Err(shape_error(
                    info,
                    format!(
                        "scores shape {} does not match boxes shape {}",
                        scores.shape, boxes.shape
                    ),
                ))
            }
        };

        self.check_scalar(inputs, MAX_OUTPUT_BOXES, "max_output_boxes_per_class")?;
        self.check_scalar(inputs, IOU_THRESHOLD, "iou_threshold")?;
        self.check_scalar(inputs, SCORE_THRESHOLD, "score_threshold")?;
        self.check_scalar(inputs, SOFT_NMS_SIGMA, "soft_nms_sigma")?;

        let per_class = if inputs.len() <= MAX_OUTPUT_BOXES {
            0
        } else {
            match inputs.constant(MAX_OUTPUT_BOXES) {
                Some(value) => (value.scalar_i64()?.max(0) as usize).min(num_boxes),
                None => num_boxes,
            }
        };
        let max_selected = num_batches * num_classes * per_class;

        Ok(vec![
            TensorDesc::new(self.output_type, Shape::new(vec![max_selected, 3])),
            TensorDesc::new(DType::F32, Shape::new(vec![max_selected, 3])),
            TensorDesc::new(self.output_type, Shape::new(vec![1])),
        ])
    }

    fn clone_op(&self) -> Box<dyn Op> {
        Box::new(self.clone())
    }

    fn evaluate(&self, outputs: &mut [Tensor], inputs: &[&Tensor]) -> bool {
        let _span = tracing::trace_span!("op::v5::NonMaxSuppression::evaluate").entered();
        if inputs.len() < 2 || outputs.len() < 3 {
            tracing::warn!(op = %Self::TYPE_INFO, "evaluate called with too few tensors");
            return false;
        }
        let Some(widen) = KERNELS.lookup(inputs[0].dtype()) else {
            tracing::debug!(
                op = %Self::TYPE_INFO,
                dtype = %inputs[0].dtype(),
                "no kernel for element type"
            );
            return false;
        };
        match self.run(inputs, widen) {
            Ok([indices, scores, valid]) => {
                outputs[0] = indices;
                outputs[1] = scores;
                outputs[2] = valid;
                true
            }
            Err(err) => {
                tracing::warn!(op = %Self::TYPE_INFO, error = %err, "non-max suppression failed");
                false
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
