use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, TensorError};

/// Ordered set of dimension indices an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AxisSet {
    axes: BTreeSet<usize>,
}

impl AxisSet {
    pub fn new() -> Self {
        AxisSet {
            axes: BTreeSet::new(),
        }
    }

    /// Build an axis set for a tensor of rank `rank` from signed axis values.
    ///
    /// Negative values count from the last dimension, so `-1` names axis
    /// `rank - 1`. Values outside `[-rank, rank)` are rejected. Repeated axes
    /// collapse into one.
    pub fn normalize(values: &[i64], rank: usize) -> Result<AxisSet> {
        let signed_rank = rank as i64;
        let mut axes = BTreeSet::new();
        for &value in values {
            if value < -signed_rank || value >= signed_rank {
                return Err(TensorError::InvalidAxis {
                    axis: value,
                    ndim: rank,
                });
            }
            let axis = if value < 0 { value + signed_rank } else { value };
            axes.insert(axis as usize);
        }
        Ok(AxisSet { axes })
    }

    pub fn contains(&self, axis: usize) -> bool {
        self.axes.contains(&axis)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Iterate the axes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.axes.iter().copied()
    }

    /// Returns the largest axis, if any.
    pub fn max(&self) -> Option<usize> {
        self.axes.iter().next_back().copied()
    }

    /// Returns true when every axis is a valid index for `rank`.
    pub fn fits_rank(&self, rank: usize) -> bool {
        self.max().map_or(true, |axis| axis < rank)
    }
}

impl FromIterator<usize> for AxisSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        AxisSet {
            axes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", axis)?;
        }
        write!(f, "}}")
    }
}
