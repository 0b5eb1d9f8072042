//! Shared construction and evaluation for keep-dims reductions.
//!
//! Every reduction takes `(data, reduction_axes)` and a `keep_dims`
//! attribute. The axes input must be a constant integral scalar or 1D tensor;
//! its values are normalized against the data rank when the node is built.

use half::{bf16, f16};
use ir_tensor::{AxisSet, DType, Element, Numeric, Shape, Tensor, TensorError};

use crate::dispatch::KernelTable;
use crate::error::Result;
use crate::node::TensorDesc;
use crate::op::{check_input_count, shape_error, InferenceContext, TypeInfo};

/// Kernel signature stored in reduction dispatch tables.
pub type ReduceKernel = fn(&Tensor, &mut Tensor, &AxisSet, bool) -> ir_tensor::Result<()>;

/// Typed slice kernel from [`ir_tensor::cpu`].
pub(crate) type SliceKernel<T> =
    fn(&[T], &mut [T], &Shape, &AxisSet, bool) -> ir_tensor::Result<()>;

/// Which data element types a reduction accepts at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DataKind {
    Arithmetic,
    Logical,
}

/// Attribute and derived state common to all keep-dims reductions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReductionKeepDims {
    keep_dims: bool,
    axes: AxisSet,
}

impl ReductionKeepDims {
    pub fn new(keep_dims: bool) -> Self {
        ReductionKeepDims {
            keep_dims,
            axes: AxisSet::new(),
        }
    }

    pub fn keep_dims(&self) -> bool {
        self.keep_dims
    }

    /// Normalized reduction axes; empty until shape inference ran.
    pub fn reduction_axes(&self) -> &AxisSet {
        &self.axes
    }

    /// Attributes only, as used by clone-with-new-inputs.
    pub fn attributes(&self) -> Self {
        ReductionKeepDims::new(self.keep_dims)
    }

    pub(crate) fn infer(
        &mut self,
        info: &TypeInfo,
        inputs: &InferenceContext<'_>,
        kind: DataKind,
    ) -> Result<Vec<TensorDesc>> {
        check_input_count(info, inputs, 2..=2)?;
        let (data, axes) = match (inputs.desc(0), inputs.desc(1)) {
            (Some(data), Some(axes)) => (data, axes),
            _ => return Err(shape_error(info, "missing input descriptor")),
        };

        match kind {
            DataKind::Arithmetic if !data.dtype.is_numeric() => {
                return Err(shape_error(
                    info,
                    format!("data input must be numeric, got {}", data.dtype),
                ))
            }
            DataKind::Logical if data.dtype != DType::Boolean => {
                return Err(shape_error(
                    info,
                    format!("data input must be boolean, got {}", data.dtype),
                ))
            }
            _ => {}
        }

        if !axes.dtype.is_integral() {
            return Err(shape_error(
                info,
                format!("reduction axes must be integral, got {}", axes.dtype),
            ));
        }
        if axes.shape.ndim() > 1 {
            return Err(shape_error(
                info,
                format!("reduction axes must be a scalar or 1D tensor, got {}", axes.shape),
            ));
        }
        let values = inputs
            .constant(1)
            .ok_or_else(|| shape_error(info, "reduction axes must be a constant"))?
            .to_i64_vec()?;

        let rank = data.shape.ndim();
        let normalized = AxisSet::normalize(&values, rank).map_err(|err| match err {
            TensorError::InvalidAxis { axis, ndim } => shape_error(
                info,
                format!("reduction axis {} is out of range for rank {}", axis, ndim),
            ),
            other => other.into(),
        })?;

        let out_shape = data.shape.reduce(&normalized, self.keep_dims);
        self.axes = normalized;
        Ok(vec![TensorDesc::new(data.dtype, out_shape)])
    }

    /// Dispatch to the kernel registered for the data element type.
    pub(crate) fn evaluate(
        &self,
        info: &TypeInfo,
        table: &KernelTable<ReduceKernel>,
        outputs: &mut [Tensor],
        inputs: &[&Tensor],
    ) -> bool {
        let (Some(arg), Some(out)) = (inputs.first(), outputs.first_mut()) else {
            tracing::warn!(op = %info, "evaluate called without data input or output");
            return false;
        };
        let Some(kernel) = table.lookup(arg.dtype()) else {
            tracing::debug!(op = %info, dtype = %arg.dtype(), "no kernel for element type");
            return false;
        };
        match kernel(arg, out, &self.axes, self.keep_dims) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(op = %info, error = %err, "reduction kernel failed");
                false
            }
        }
    }
}

/// Run a typed slice kernel into a fresh buffer of the reduced shape.
///
/// `out` is replaced only once the kernel succeeded.
pub(crate) fn reduce_typed<T: Element>(
    kernel: SliceKernel<T>,
    arg: &Tensor,
    out: &mut Tensor,
    axes: &AxisSet,
    keep_dims: bool,
) -> ir_tensor::Result<()> {
    if out.dtype() != T::DTYPE {
        return Err(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            got: out.dtype(),
        });
    }
    let in_shape = arg.static_shape()?;
    if !axes.fits_rank(in_shape.ndim()) {
        return Err(TensorError::InvalidAxis {
            axis: axes.max().map_or(0, |axis| axis as i64),
            ndim: in_shape.ndim(),
        });
    }
    let data = arg.data::<T>()?;
    let mut result = Tensor::zeros(T::DTYPE, in_shape.reduce(axes, keep_dims));
    kernel(data, result.data_mut::<T>()?, in_shape, axes, keep_dims)?;
    *out = result;
    Ok(())
}

/// Neutral element used for a reduction's default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Neutral {
    Zero,
    One,
    Lowest,
    Highest,
}

fn filled<T: Numeric>(neutral: Neutral, shape: Shape) -> Tensor {
    let value = match neutral {
        Neutral::Zero => T::zero(),
        Neutral::One => T::one(),
        Neutral::Lowest => T::lowest(),
        Neutral::Highest => T::highest(),
    };
    Tensor::filled(value, shape)
}

/// A tensor of `desc` filled with `neutral`; `None` for boolean outputs.
pub(crate) fn neutral_value(desc: &TensorDesc, neutral: Neutral) -> Option<Tensor> {
    let shape = desc.shape.clone();
    match desc.dtype {
        DType::I32 => Some(filled::<i32>(neutral, shape)),
        DType::I64 => Some(filled::<i64>(neutral, shape)),
        DType::BF16 => Some(filled::<bf16>(neutral, shape)),
        DType::F16 => Some(filled::<f16>(neutral, shape)),
        DType::F32 => Some(filled::<f32>(neutral, shape)),
        DType::Boolean => None,
    }
}

/// Define an arithmetic keep-dims reduction op.
///
/// Generates the op struct, its kernel table over the listed element types,
/// accessors and the `Op` impl. `kernel` names a slice kernel in
/// [`ir_tensor::cpu`]. `default` is the neutral element written by
/// `default_value`, or `None` when the op has none.
macro_rules! numeric_reduction {
    (
        $(#[$meta:meta])*
        $name:ident {
            type_name: $type_name:literal,
            version: $version:literal,
            span: $span:literal,
            kernel: $kernel:ident,
            types: [$($dtype:ident => $ty:ty),+ $(,)?],
            default: $default:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            base: $crate::ops::reduction::ReductionKeepDims,
        }

        fn kernel<T: ::ir_tensor::Numeric>(
            arg: &::ir_tensor::Tensor,
            out: &mut ::ir_tensor::Tensor,
            axes: &::ir_tensor::AxisSet,
            keep_dims: bool,
        ) -> ::ir_tensor::Result<()> {
            $crate::ops::reduction::reduce_typed(
                ::ir_tensor::cpu::$kernel::<T>,
                arg,
                out,
                axes,
                keep_dims,
            )
        }

        static KERNELS: $crate::dispatch::KernelTable<$crate::ops::reduction::ReduceKernel> =
            $crate::dispatch::KernelTable::new(&[
                $((
                    ::ir_tensor::DType::$dtype,
                    kernel::<$ty> as $crate::ops::reduction::ReduceKernel,
                )),+
            ]);

        impl $name {
            pub const TYPE_INFO: $crate::op::TypeInfo =
                $crate::op::TypeInfo::new($type_name, $version);

            pub fn new(keep_dims: bool) -> Self {
                $name {
                    base: $crate::ops::reduction::ReductionKeepDims::new(keep_dims),
                }
            }

            pub fn keep_dims(&self) -> bool {
                self.base.keep_dims()
            }

            pub fn reduction_axes(&self) -> &::ir_tensor::AxisSet {
                self.base.reduction_axes()
            }

            /// Element types `evaluate` accepts.
            pub fn supported_types() -> impl Iterator<Item = ::ir_tensor::DType> {
                KERNELS.supported()
            }
        }

        impl $crate::op::Op for $name {
            fn type_info(&self) -> &'static $crate::op::TypeInfo {
                &Self::TYPE_INFO
            }

            fn validate_and_infer_types(
                &mut self,
                inputs: &$crate::op::InferenceContext<'_>,
            ) -> $crate::error::Result<Vec<$crate::node::TensorDesc>> {
                self.base.infer(
                    &Self::TYPE_INFO,
                    inputs,
                    $crate::ops::reduction::DataKind::Arithmetic,
                )
            }

            fn clone_op(&self) -> Box<dyn $crate::op::Op> {
                Box::new($name {
                    base: self.base.attributes(),
                })
            }

            fn default_value(
                &self,
                output: &$crate::node::TensorDesc,
            ) -> Option<::ir_tensor::Tensor> {
                let neutral: Option<$crate::ops::reduction::Neutral> = $default;
                neutral.and_then(|n| $crate::ops::reduction::neutral_value(output, n))
            }

            fn evaluate(
                &self,
                outputs: &mut [::ir_tensor::Tensor],
                inputs: &[&::ir_tensor::Tensor],
            ) -> bool {
                let _span = ::tracing::trace_span!($span).entered();
                self.base
                    .evaluate(&Self::TYPE_INFO, &KERNELS, outputs, inputs)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

pub(crate) use numeric_reduction;
