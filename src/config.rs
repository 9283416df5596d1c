//! Runtime configuration.

/// Default bound on nested dispatch.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Settings for a [`Runtime`](crate::Runtime).
///
/// ```ignore
/// let config = RuntimeConfig::default()
///     .strict_attributes(true)
///     .max_dispatch_depth(16);
/// let runtime = Runtime::with_config(config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Reject classes whose decoration attributes are ambiguous instead of
    /// leaving the member undecorated for that kind.
    pub strict_attributes: bool,
    /// Nested dispatch depth at which reads and writes fail with
    /// `RecursionLimit`.
    pub max_dispatch_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strict_attributes: false,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

impl RuntimeConfig {
    pub fn strict_attributes(mut self, strict: bool) -> Self {
        self.strict_attributes = strict;
        self
    }

    pub fn max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }
}
