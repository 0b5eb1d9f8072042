use std::cell::RefCell;
use std::ffi::CString;

use ir_graph::GraphError;

use crate::types::IRStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `ir_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Record `err` and return the status code it maps to.
pub fn fail(err: GraphError) -> IRStatus {
    let status = match &err {
        GraphError::ShapeInference { .. } => IRStatus::ErrorShapeInference,
        GraphError::ArgumentCount { .. } => IRStatus::ErrorArgumentCount,
        GraphError::UnsupportedType { .. } => IRStatus::ErrorUnsupportedType,
        GraphError::InvalidNode(_)
        | GraphError::InvalidOutput(_)
        | GraphError::DuplicateName(_)
        | GraphError::ParameterMismatch { .. }
        | GraphError::MissingParameter(_)
        | GraphError::Tensor(_) => IRStatus::ErrorInvalidArgument,
        GraphError::NoDefaultValue(_) | GraphError::Other(_) => IRStatus::ErrorExecution,
    };
    set_last_error(err.to_string());
    status
}

/// Record an argument error message and return `ErrorInvalidArgument`.
pub fn invalid(msg: impl Into<String>) -> IRStatus {
    set_last_error(msg.into());
    IRStatus::ErrorInvalidArgument
}
