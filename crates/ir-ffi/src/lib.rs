mod types;
mod error;
mod context;

pub use types::*;
pub use error::*;
pub use context::*;

use std::ffi::CString;
use std::os::raw::c_char;

use ir_graph::{ExecutionConfig, NodeId};
use ir_tensor::{DType, Shape, Tensor};

/// Execute a closure that returns an `IRStatus`, catching any panics
/// and converting them into `IRStatus::ErrorInternal`.
///
/// The context holds trait objects and is never `RefUnwindSafe`.
fn catch_panic<F: FnOnce() -> IRStatus>(f: F) -> IRStatus {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            IRStatus::ErrorInternal
        }
    }
}

/// Borrow `len` elements at `ptr`; an empty slice needs no pointer.
unsafe fn slice_arg<'a, T>(ptr: *const T, len: usize, what: &str) -> Result<&'a [T], IRStatus> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(invalid(format!("{} is null", what)));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

fn element_type(tag: u32) -> Result<DType, IRStatus> {
    DType::from_tag(tag).ok_or_else(|| invalid(format!("unknown element type tag {}", tag)))
}

fn reduce_kind(tag: u32) -> Result<IRReduceKind, IRStatus> {
    IRReduceKind::from_tag(tag).ok_or_else(|| invalid(format!("unknown reduction kind {}", tag)))
}

/// Write the arena index of `id` to `node_out`.
unsafe fn write_node(node_out: *mut usize, id: NodeId) -> IRStatus {
    *node_out = id.index();
    IRStatus::Ok
}

/// Default preparation parameters.
#[no_mangle]
pub extern "C" fn ir_default_execution_params() -> IRExecutionParams {
    IRExecutionParams::default()
}

/// Create a new graph context.
///
/// On success, writes a heap-allocated `IRContext` pointer into `*ctx_out`
/// and returns `IRStatus::Ok`. The caller must later call `ir_context_destroy`
/// to free the context.
#[no_mangle]
pub extern "C" fn ir_context_create(
    params: IRExecutionParams,
    ctx_out: *mut *mut IRContext,
) -> IRStatus {
    catch_panic(|| {
        if ctx_out.is_null() {
            return invalid("ctx_out is null");
        }
        let ctx = Box::new(IRContext::new(ExecutionConfig::from(&params)));
        unsafe {
            *ctx_out = Box::into_raw(ctx);
        }
        IRStatus::Ok
    })
}

/// Destroy a context previously created by `ir_context_create`.
///
/// Passing a null pointer is a no-op and returns `IRStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn ir_context_destroy(ctx: *mut IRContext) -> IRStatus {
    if ctx.is_null() {
        return IRStatus::Ok;
    }
    drop(Box::from_raw(ctx));
    IRStatus::Ok
}

/// Add a graph input of the given element type and shape.
#[no_mangle]
pub unsafe extern "C" fn ir_add_parameter(
    ctx: *mut IRContext,
    element_type: u32,
    dims: *const usize,
    ndim: usize,
    node_out: *mut usize,
) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() || node_out.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &mut *ctx };
        let dtype = match crate::element_type(element_type) {
            Ok(dtype) => dtype,
            Err(status) => return status,
        };
        let dims = match unsafe { slice_arg(dims, ndim, "dims") } {
            Ok(dims) => dims,
            Err(status) => return status,
        };
        match ctx.graph.parameter(dtype, Shape::from_slice(dims)) {
            Ok(output) => unsafe { write_node(node_out, output.node) },
            Err(e) => fail(e),
        }
    })
}

/// Add a constant whose value is `len` raw bytes in native byte order.
#[no_mangle]
pub unsafe extern "C" fn ir_add_constant(
    ctx: *mut IRContext,
    element_type: u32,
    dims: *const usize,
    ndim: usize,
    data: *const u8,
    len: usize,
    node_out: *mut usize,
) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() || node_out.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &mut *ctx };
        let dtype = match crate::element_type(element_type) {
            Ok(dtype) => dtype,
            Err(status) => return status,
        };
        let args = unsafe { (slice_arg(dims, ndim, "dims"), slice_arg(data, len, "data")) };
        let (dims, bytes) = match args {
            (Ok(dims), Ok(bytes)) => (dims, bytes),
            (Err(status), _) | (_, Err(status)) => return status,
        };
        let value = match Tensor::from_bytes(dtype, Shape::from_slice(dims), bytes) {
            Ok(value) => value,
            Err(e) => return fail(e.into()),
        };
        match ctx.graph.constant(value) {
            Ok(output) => unsafe { write_node(node_out, output.node) },
            Err(e) => fail(e),
        }
    })
}

/// Add a keep-dims reduction of node `data` over the constant node `axes`.
///
/// `kind` is an `IRReduceKind` value. Fails with `ErrorShapeInference` when
/// an axis is out of range for the data rank; no node is added in that case.
#[no_mangle]
pub unsafe extern "C" fn ir_add_reduction(
    ctx: *mut IRContext,
    kind: u32,
    data: usize,
    axes: usize,
    keep_dims: bool,
    node_out: *mut usize,
) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() || node_out.is_null() {
            return invalid("null argument");
        }
        let kind = match reduce_kind(kind) {
            Ok(kind) => kind,
            Err(status) => return status,
        };
        let ctx = unsafe { &mut *ctx };
        match ctx.add_reduction(kind, data, axes, keep_dims) {
            Ok(id) => unsafe { write_node(node_out, id) },
            Err(e) => fail(e),
        }
    })
}

/// Mark output `index` of `node` as a graph result.
#[no_mangle]
pub unsafe extern "C" fn ir_add_result(ctx: *mut IRContext, node: usize, index: usize) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &mut *ctx };
        let result = ctx
            .output(node, index)
            .and_then(|output| ctx.graph.add_result(output));
        match result {
            Ok(()) => IRStatus::Ok,
            Err(e) => fail(e),
        }
    })
}

/// Run the preparation passes enabled for this context.
///
/// `rewritten_out` may be null; otherwise it receives the number of nodes
/// the passes replaced.
#[no_mangle]
pub unsafe extern "C" fn ir_prepare(ctx: *mut IRContext, rewritten_out: *mut usize) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &mut *ctx };
        match ctx.executor.prepare(&mut ctx.graph) {
            Ok(rewritten) => {
                if !rewritten_out.is_null() {
                    unsafe { *rewritten_out = rewritten };
                }
                IRStatus::Ok
            }
            Err(e) => fail(e),
        }
    })
}

/// Query the inferred element type and shape of output `index` of `node`.
///
/// Up to `capacity` dimensions are written to `dims_out`; `ndim_out` always
/// receives the full rank, so a caller can retry with a larger buffer.
#[no_mangle]
pub unsafe extern "C" fn ir_output_shape(
    ctx: *const IRContext,
    node: usize,
    index: usize,
    element_type_out: *mut u32,
    dims_out: *mut usize,
    capacity: usize,
    ndim_out: *mut usize,
) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() || element_type_out.is_null() || ndim_out.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &*ctx };
        let desc = match ctx
            .output(node, index)
            .and_then(|output| ctx.graph.output_desc(output))
        {
            Ok(desc) => desc,
            Err(e) => return fail(e),
        };
        let dims = desc.shape.dims();
        if capacity > 0 && dims_out.is_null() {
            return invalid("dims_out is null");
        }
        unsafe {
            *element_type_out = desc.dtype.to_tag();
            *ndim_out = dims.len();
            for (i, dim) in dims.iter().take(capacity).enumerate() {
                *dims_out.add(i) = *dim;
            }
        }
        IRStatus::Ok
    })
}

/// Evaluate the graph.
///
/// Every reachable parameter needs one entry in `inputs`. Each result is
/// copied into the matching entry of `outputs`, whose `written` field
/// receives the byte count.
#[no_mangle]
pub unsafe extern "C" fn ir_execute(
    ctx: *const IRContext,
    inputs: *const IRInput,
    n_inputs: usize,
    outputs: *mut IROutput,
    n_outputs: usize,
) -> IRStatus {
    catch_panic(|| {
        if ctx.is_null() {
            return invalid("null argument");
        }
        let ctx = unsafe { &*ctx };
        let inputs = match unsafe { slice_arg(inputs, n_inputs, "inputs") } {
            Ok(inputs) => inputs,
            Err(status) => return status,
        };
        if n_outputs != ctx.graph.results().len() {
            return invalid(format!(
                "graph has {} results, got {} output buffers",
                ctx.graph.results().len(),
                n_outputs
            ));
        }
        if n_outputs > 0 && outputs.is_null() {
            return invalid("outputs is null");
        }

        let mut bindings = Vec::with_capacity(inputs.len());
        for input in inputs {
            let bytes = match unsafe { slice_arg(input.data, input.len, "input data") } {
                Ok(bytes) => bytes,
                Err(status) => return status,
            };
            match ctx.bind(input.node, bytes) {
                Ok(binding) => bindings.push(binding),
                Err(e) => return fail(e),
            }
        }

        let results = match ctx.execute(&bindings) {
            Ok(results) => results,
            Err(e) => return fail(e),
        };
        for (i, result) in results.iter().enumerate() {
            let out = unsafe { &mut *outputs.add(i) };
            let bytes = result.to_bytes();
            if bytes.len() > out.capacity || (!bytes.is_empty() && out.data.is_null()) {
                return invalid(format!(
                    "output {} needs {} bytes, buffer holds {}",
                    i,
                    bytes.len(),
                    out.capacity
                ));
            }
            unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), out.data, bytes.len()) };
            out.written = bytes.len();
        }
        IRStatus::Ok
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `ir_free_string`.
#[no_mangle]
pub extern "C" fn ir_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `ir_last_error`.
#[no_mangle]
pub unsafe extern "C" fn ir_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn last_error() -> String {
        let raw = ir_last_error();
        assert!(!raw.is_null());
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        unsafe { ir_free_string(raw as *mut c_char) };
        text
    }

    /// Builds `ReduceL1(data[2, 5, 5], axes = {2})` and marks it as a result.
    unsafe fn l1_context() -> (*mut IRContext, usize, usize) {
        let mut ctx = ptr::null_mut();
        assert_eq!(
            ir_context_create(ir_default_execution_params(), &mut ctx),
            IRStatus::Ok
        );
        let dims = [2usize, 5, 5];
        let mut data = 0;
        assert_eq!(
            ir_add_parameter(ctx, IR_ELEMENT_F32, dims.as_ptr(), dims.len(), &mut data),
            IRStatus::Ok
        );
        let axis_bytes = 2i64.to_ne_bytes();
        let axis_dims = [1usize];
        let mut axes = 0;
        assert_eq!(
            ir_add_constant(
                ctx,
                IR_ELEMENT_I64,
                axis_dims.as_ptr(),
                1,
                axis_bytes.as_ptr(),
                axis_bytes.len(),
                &mut axes
            ),
            IRStatus::Ok
        );
        let mut l1 = 0;
        assert_eq!(
            ir_add_reduction(ctx, IRReduceKind::L1 as u32, data, axes, false, &mut l1),
            IRStatus::Ok
        );
        assert_eq!(ir_add_result(ctx, l1, 0), IRStatus::Ok);
        (ctx, data, l1)
    }

    #[test]
    fn test_element_tags_match() {
        let tags = [
            IR_ELEMENT_BOOLEAN,
            IR_ELEMENT_I32,
            IR_ELEMENT_I64,
            IR_ELEMENT_BF16,
            IR_ELEMENT_F16,
            IR_ELEMENT_F32,
        ];
        for (dtype, tag) in DType::ALL.iter().zip(tags) {
            assert_eq!(dtype.to_tag(), tag);
        }
    }

    #[test]
    fn test_build_query_execute() {
        unsafe {
            let (ctx, data, l1) = l1_context();

            let mut dtype = 0u32;
            let mut dims = [0usize; 4];
            let mut ndim = 0;
            assert_eq!(
                ir_output_shape(ctx, l1, 0, &mut dtype, dims.as_mut_ptr(), dims.len(), &mut ndim),
                IRStatus::Ok
            );
            assert_eq!((dtype, ndim, &dims[..ndim]), (IR_ELEMENT_F32, 2, &[2usize, 5][..]));

            let input = f32_bytes(&[1.0; 50]);
            let inputs = [IRInput {
                node: data,
                data: input.as_ptr(),
                len: input.len(),
            }];
            let mut buffer = vec![0u8; 10 * 4];
            let mut outputs = [IROutput {
                data: buffer.as_mut_ptr(),
                capacity: buffer.len(),
                written: 0,
            }];
            assert_eq!(
                ir_execute(ctx, inputs.as_ptr(), 1, outputs.as_mut_ptr(), 1),
                IRStatus::Ok
            );
            assert_eq!(outputs[0].written, 40);
            assert_eq!(buffer, f32_bytes(&[5.0; 10]));

            assert_eq!(ir_context_destroy(ctx), IRStatus::Ok);
        }
    }

    #[test]
    fn test_axis_out_of_range_reported() {
        unsafe {
            let (ctx, data, _) = l1_context();
            let axis_bytes = 3i64.to_ne_bytes();
            let mut axes = 0;
            assert_eq!(
                ir_add_constant(
                    ctx,
                    IR_ELEMENT_I64,
                    ptr::null(),
                    0,
                    axis_bytes.as_ptr(),
                    axis_bytes.len(),
                    &mut axes
                ),
                IRStatus::Ok
            );
            let mut node = usize::MAX;
            assert_eq!(
                ir_add_reduction(ctx, IRReduceKind::Sum as u32, data, axes, true, &mut node),
                IRStatus::ErrorShapeInference
            );
            assert_eq!(node, usize::MAX);
            assert!(last_error().contains("out of range"));
            ir_context_destroy(ctx);
        }
    }

    #[test]
    fn test_unknown_reduction_kind_rejected() {
        unsafe {
            let (ctx, data, _) = l1_context();
            // The axes constant follows the parameter in the arena.
            let axes = data + 1;
            let mut node = usize::MAX;
            assert_eq!(
                ir_add_reduction(ctx, 9, data, axes, false, &mut node),
                IRStatus::ErrorInvalidArgument
            );
            assert_eq!(node, usize::MAX);
            assert!(last_error().contains("unknown reduction kind 9"));
            assert_eq!(
                IRReduceKind::from_tag(IRReduceKind::LogicalOr as u32),
                Some(IRReduceKind::LogicalOr)
            );
            ir_context_destroy(ctx);
        }
    }

    #[test]
    fn test_missing_input_and_small_buffer() {
        unsafe {
            let (ctx, data, _) = l1_context();
            let mut buffer = [0u8; 8];
            let mut outputs = [IROutput {
                data: buffer.as_mut_ptr(),
                capacity: buffer.len(),
                written: 0,
            }];
            assert_eq!(
                ir_execute(ctx, ptr::null(), 0, outputs.as_mut_ptr(), 1),
                IRStatus::ErrorInvalidArgument
            );
            assert!(last_error().contains("no value bound"));

            let input = f32_bytes(&[1.0; 50]);
            let inputs = [IRInput {
                node: data,
                data: input.as_ptr(),
                len: input.len(),
            }];
            assert_eq!(
                ir_execute(ctx, inputs.as_ptr(), 1, outputs.as_mut_ptr(), 1),
                IRStatus::ErrorInvalidArgument
            );
            assert!(last_error().contains("needs 40 bytes"));
            ir_context_destroy(ctx);
        }
    }

    #[test]
    fn test_unsupported_type_status() {
        unsafe {
            let mut ctx = ptr::null_mut();
            let params = IRExecutionParams {
                fold_constants: false,
                eliminate_zero_dim: false,
            };
            assert_eq!(ir_context_create(params, &mut ctx), IRStatus::Ok);
            let dims = [2usize];
            let mut data = 0;
            ir_add_parameter(ctx, IR_ELEMENT_I32, dims.as_ptr(), 1, &mut data);
            let axis_bytes = 0i32.to_ne_bytes();
            let mut axes = 0;
            ir_add_constant(
                ctx,
                IR_ELEMENT_I32,
                ptr::null(),
                0,
                axis_bytes.as_ptr(),
                axis_bytes.len(),
                &mut axes,
            );
            let mut l2 = 0;
            assert_eq!(
                ir_add_reduction(ctx, IRReduceKind::L2 as u32, data, axes, false, &mut l2),
                IRStatus::Ok
            );
            ir_add_result(ctx, l2, 0);

            let input: Vec<u8> = [3i32, 4].iter().flat_map(|v| v.to_ne_bytes()).collect();
            let inputs = [IRInput {
                node: data,
                data: input.as_ptr(),
                len: input.len(),
            }];
            let mut buffer = [0u8; 4];
            let mut outputs = [IROutput {
                data: buffer.as_mut_ptr(),
                capacity: buffer.len(),
                written: 0,
            }];
            assert_eq!(
                ir_execute(ctx, inputs.as_ptr(), 1, outputs.as_mut_ptr(), 1),
                IRStatus::ErrorUnsupportedType
            );
            ir_context_destroy(ctx);
        }
    }

    #[test]
    fn test_null_and_bad_tag() {
        unsafe {
            assert_eq!(
                ir_context_create(ir_default_execution_params(), ptr::null_mut()),
                IRStatus::ErrorInvalidArgument
            );
            assert_eq!(ir_context_destroy(ptr::null_mut()), IRStatus::Ok);

            let (ctx, _, _) = l1_context();
            let mut node = 0;
            assert_eq!(
                ir_add_parameter(ctx, 42, ptr::null(), 0, &mut node),
                IRStatus::ErrorInvalidArgument
            );
            assert!(last_error().contains("unknown element type"));
            ir_context_destroy(ctx);
        }
    }
}
