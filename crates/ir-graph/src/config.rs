/// Options controlling [`Executor`](crate::Executor) preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Evaluate nodes whose inputs are all constants ahead of time.
    pub fold_constants: bool,
    /// Replace reductions over empty data with their default value.
    pub eliminate_zero_dim: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            fold_constants: true,
            eliminate_zero_dim: true,
        }
    }
}

impl ExecutionConfig {
    /// A config that runs no rewrite passes.
    pub fn no_passes() -> Self {
        Self {
            fold_constants: false,
            eliminate_zero_dim: false,
        }
    }
}
