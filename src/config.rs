use serde::{Deserialize, Serialize};

/// Default size of a fresh allocator storage, 1MB
pub const DEFAULT_INITIAL_SIZE_BYTES: usize = 1024 * 1024;

/// Default extra space added every time the storage grows, 1MB
pub const DEFAULT_GROWTH_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Clone)]
pub struct AllocatorOptions {
    /// Size of the backing storage when it is created.
    ///
    /// Default is 1MB
    pub initial_size_bytes: Option<usize>,

    /// Extra bytes reserved on top of the missing space whenever the storage grows,
    /// to avoid resizing too often.
    ///
    /// Default is 1MB
    pub growth_bytes: Option<usize>,

    /// Hard limit for the total size of the storage in bytes.
    ///
    /// Default is no limit
    pub max_size_bytes: Option<usize>,
}

impl AllocatorOptions {
    pub fn with_limit(max_size_bytes: usize) -> Self {
        Self {
            max_size_bytes: Some(max_size_bytes),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Size of the backing storage when it is created
    pub initial_size_bytes: usize,

    /// Extra bytes reserved whenever the storage grows
    pub growth_bytes: usize,

    /// Hard limit for the total size of the storage
    pub max_size_bytes: Option<usize>,
}

impl AllocatorConfig {
    /// The effective limit, `usize::MAX` when unlimited.
    pub fn limit(&self) -> usize {
        self.max_size_bytes.unwrap_or(usize::MAX)
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorOptions::default().into()
    }
}

impl From<AllocatorOptions> for AllocatorConfig {
    fn from(options: AllocatorOptions) -> Self {
        let initial_size_bytes = options
            .initial_size_bytes
            .unwrap_or(DEFAULT_INITIAL_SIZE_BYTES);
        let growth_bytes = options.growth_bytes.unwrap_or(DEFAULT_GROWTH_BYTES);
        // never start bigger than allowed
        let initial_size_bytes = match options.max_size_bytes {
            Some(max) => initial_size_bytes.min(max),
            None => initial_size_bytes,
        };
        Self {
            initial_size_bytes,
            growth_bytes,
            max_size_bytes: options.max_size_bytes,
        }
    }
}
