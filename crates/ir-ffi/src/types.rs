use ir_graph::ExecutionConfig;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IRStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorShapeInference = 2,
    ErrorArgumentCount = 3,
    ErrorUnsupportedType = 4,
    ErrorExecution = 5,
    ErrorInternal = 6,
}

/// Element type tags accepted wherever an `element_type` is passed.
pub const IR_ELEMENT_BOOLEAN: u32 = 0;
pub const IR_ELEMENT_I32: u32 = 1;
pub const IR_ELEMENT_I64: u32 = 2;
pub const IR_ELEMENT_BF16: u32 = 3;
pub const IR_ELEMENT_F16: u32 = 4;
pub const IR_ELEMENT_F32: u32 = 5;

/// Reduction selector for `ir_add_reduction`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IRReduceKind {
    L1 = 0,
    L2 = 1,
    Sum = 2,
    Mean = 3,
    Prod = 4,
    Max = 5,
    Min = 6,
    LogicalAnd = 7,
    LogicalOr = 8,
}

impl IRReduceKind {
    /// Decode the `u32` selector passed across the C boundary.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(IRReduceKind::L1),
            1 => Some(IRReduceKind::L2),
            2 => Some(IRReduceKind::Sum),
            3 => Some(IRReduceKind::Mean),
            4 => Some(IRReduceKind::Prod),
            5 => Some(IRReduceKind::Max),
            6 => Some(IRReduceKind::Min),
            7 => Some(IRReduceKind::LogicalAnd),
            8 => Some(IRReduceKind::LogicalOr),
            _ => None,
        }
    }
}

/// Parameters controlling graph preparation.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct IRExecutionParams {
    pub fold_constants: bool,
    pub eliminate_zero_dim: bool,
}

impl Default for IRExecutionParams {
    fn default() -> Self {
        let config = ExecutionConfig::default();
        Self {
            fold_constants: config.fold_constants,
            eliminate_zero_dim: config.eliminate_zero_dim,
        }
    }
}

impl From<&IRExecutionParams> for ExecutionConfig {
    fn from(params: &IRExecutionParams) -> Self {
        ExecutionConfig {
            fold_constants: params.fold_constants,
            eliminate_zero_dim: params.eliminate_zero_dim,
        }
    }
}

/// Raw bytes bound to a parameter node for one `ir_execute` call.
///
/// The bytes are read in native byte order using the parameter's declared
/// element type and shape.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IRInput {
    pub node: usize,
    pub data: *const u8,
    pub len: usize,
}

/// Caller-owned buffer receiving one graph result.
///
/// `written` is set to the number of bytes copied into `data`.
#[repr(C)]
#[derive(Debug)]
pub struct IROutput {
    pub data: *mut u8,
    pub capacity: usize,
    pub written: usize,
}
