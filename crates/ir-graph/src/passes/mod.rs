//! Graph rewrites run by [`Executor::prepare`](crate::Executor::prepare).
//!
//! Passes never remove nodes. They append replacements and relink consumers,
//! so the old nodes simply drop out of the topological order.

pub mod constant_folding;
pub mod zero_dim_elimination;

pub use constant_folding::fold_constants;
pub use zero_dim_elimination::eliminate_zero_dim;
