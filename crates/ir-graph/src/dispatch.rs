use ir_tensor::DType;

/// Fixed map from element type to a kernel instantiation.
///
/// Each op declares its table as a `static`, listing one monomorphized kernel
/// per supported element type. A lookup miss means the op cannot evaluate that
/// type.
#[derive(Debug)]
pub struct KernelTable<F: Copy + 'static> {
    entries: &'static [(DType, F)],
}

impl<F: Copy + 'static> KernelTable<F> {
    pub const fn new(entries: &'static [(DType, F)]) -> Self {
        KernelTable { entries }
    }

    /// The kernel registered for `dtype`, if any.
    pub fn lookup(&self, dtype: DType) -> Option<F> {
        self.entries
            .iter()
            .find(|(registered, _)| *registered == dtype)
            .map(|(_, kernel)| *kernel)
    }

    pub fn supports(&self, dtype: DType) -> bool {
        self.lookup(dtype).is_some()
    }

    /// Supported element types in registration order.
    pub fn supported(&self) -> impl Iterator<Item = DType> + '_ {
        self.entries.iter().map(|(dtype, _)| *dtype)
    }
}
