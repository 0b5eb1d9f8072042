//! Keep-dims reductions over an [`AxisSet`].
//!
//! Every kernel visits the input in row-major coordinate order and folds each
//! element into its output slot in that order, so results are reproducible
//! bit for bit. `out` must already hold `in_shape.reduce(axes, keep_dims)`
//! elements; its layout does not depend on `keep_dims`.

use crate::axes::AxisSet;
use crate::element::{Element, Numeric};
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Walk `arg` in row-major order, folding every element into `out`.
///
/// `out` is overwritten with `init` first.
fn reduce_into<T, F>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
    init: T,
    combine: F,
) -> Result<()>
where
    T: Element,
    F: Fn(T, T) -> T,
{
    if arg.len() != in_shape.numel() {
        return Err(TensorError::LengthMismatch {
            expected: in_shape.numel(),
            got: arg.len(),
        });
    }
    let out_shape = in_shape.reduce(axes, keep_dims);
    if out.len() != out_shape.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: out_shape.dims().to_vec(),
            got: vec![out.len()],
        });
    }
    if let Some(axis) = axes.max() {
        if axis >= in_shape.ndim() {
            return Err(TensorError::InvalidAxis {
                axis: axis as i64,
                ndim: in_shape.ndim(),
            });
        }
    }

    out.fill(init);
    if arg.is_empty() {
        return Ok(());
    }

    // Output stride contributed by each input axis; reduced axes contribute 0.
    let kept_strides = in_shape.reduce(axes, true).strides();
    let out_strides: Vec<usize> = (0..in_shape.ndim())
        .map(|d| if axes.contains(d) { 0 } else { kept_strides[d] })
        .collect();

    let dims = in_shape.dims();
    let mut coord = vec![0usize; dims.len()];
    let mut out_index = 0usize;
    for &value in arg {
        out[out_index] = combine(out[out_index], value);

        // Advance the coordinate odometer, keeping out_index in sync.
        for d in (0..dims.len()).rev() {
            coord[d] += 1;
            out_index += out_strides[d];
            if coord[d] < dims[d] {
                break;
            }
            out_index -= out_strides[d] * coord[d];
            coord[d] = 0;
        }
    }
    Ok(())
}

/// Sum of absolute values over `axes`.
pub fn reduce_l1<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::zero(), |acc, x| {
        acc.add(x.abs())
    })
}

/// Square root of the sum of squares over `axes`.
pub fn reduce_l2<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::zero(), |acc, x| {
        acc.add(x.mul(x))
    })?;
    for v in out.iter_mut() {
        *v = v.sqrt();
    }
    Ok(())
}

pub fn reduce_sum<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::zero(), |acc, x| {
        acc.add(x)
    })
}

/// Sum over `axes` divided by the number of reduced elements.
pub fn reduce_mean<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_sum(arg, out, in_shape, axes, keep_dims)?;
    let count = in_shape.reduced_count(axes);
    for v in out.iter_mut() {
        *v = v.div_count(count);
    }
    Ok(())
}

pub fn reduce_prod<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::one(), |acc, x| {
        acc.mul(x)
    })
}

pub fn reduce_max<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::lowest(), |acc, x| {
        if x > acc {
            x
        } else {
            acc
        }
    })
}

pub fn reduce_min<T: Numeric>(
    arg: &[T],
    out: &mut [T],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, T::highest(), |acc, x| {
        if x < acc {
            x
        } else {
            acc
        }
    })
}

pub fn reduce_logical_and(
    arg: &[bool],
    out: &mut [bool],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, true, |acc, x| acc && x)
}

pub fn reduce_logical_or(
    arg: &[bool],
    out: &mut [bool],
    in_shape: &Shape,
    axes: &AxisSet,
    keep_dims: bool,
) -> Result<()> {
    reduce_into(arg, out, in_shape, axes, keep_dims, false, |acc, x| acc || x)
}
