/// Tunables for a [`Runtime`](crate::runtime::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Smallest slot capacity allocated for a new array.
    pub min_capacity: usize,
    /// Deepest array nesting `stringify` will render.
    pub max_depth: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_MIN_CAPACITY: usize = 4;
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    pub fn min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity.max(1);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            min_capacity: Self::DEFAULT_MIN_CAPACITY,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
