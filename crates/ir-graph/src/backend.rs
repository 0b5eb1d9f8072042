use std::fmt::Debug;

use ir_tensor::Tensor;

use crate::node::Node;

/// Hook for device backends (CPU plugins, GPU, etc.) that want to evaluate
/// some nodes themselves.
///
/// The executor asks every registered interceptor, in registration order,
/// before falling back to the node's reference `evaluate`.
pub trait KernelInterceptor: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu-simd", "gpu").
    fn name(&self) -> &str;

    /// Try to evaluate `node`.
    ///
    /// - `None`: not claimed; the next interceptor or the reference kernel runs.
    /// - `Some(true)`: outputs were written.
    /// - `Some(false)`: claimed but the element type is unsupported.
    fn try_evaluate(&self, node: &Node, outputs: &mut [Tensor], inputs: &[&Tensor])
        -> Option<bool>;
}
