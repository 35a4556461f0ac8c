use crate::alloc::slab::{SlabAllocator, Storage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorStats {
    /// The number of live regions
    pub regions_count: usize,

    /// The number of bytes held by live regions
    pub allocated_bytes: usize,

    /// The number of bytes freed or left behind by moved regions, never reused
    pub freed_bytes: usize,

    /// The number of bytes belonging to the frozen snapshot
    pub read_only_bytes: usize,

    /// The number of bytes still available before the storage has to grow
    pub available_bytes: usize,

    /// The total size of the storage in bytes
    pub total_size_bytes: usize,
}

impl<S: Storage> SlabAllocator<S> {
    /// Allocator-wide statistics
    pub fn get_stats(&self) -> AllocatorStats {
        let allocated_bytes = self.regions.values().sum();
        let read_only_bytes = self
            .regions
            .range(..self.baseline)
            .map(|(_, &size)| size)
            .sum();
        let total_size_bytes = self.storage.len();
        AllocatorStats {
            regions_count: self.regions.len(),
            allocated_bytes,
            freed_bytes: self.freed_bytes,
            read_only_bytes,
            available_bytes: total_size_bytes.saturating_sub(self.end),
            total_size_bytes,
        }
    }
}
