use std::collections::BTreeMap;
use std::io;

use crate::alloc::{Allocator, Ref, ALIGNMENT};
use crate::config::{AllocatorConfig, AllocatorOptions};
use crate::error::AllocationError;

/// Contiguous, growable bytes a [`SlabAllocator`] carves regions out of.
pub trait Storage {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow to exactly `new_len` bytes, keeping the existing content.
    /// New bytes are zeroed.
    fn grow(&mut self, new_len: usize) -> io::Result<()>;

    fn as_slice(&self) -> &[u8];

    fn as_mut_slice(&mut self) -> &mut [u8];
}

impl Storage for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn grow(&mut self, new_len: usize) -> io::Result<()> {
        self.try_reserve_exact(new_len.saturating_sub(Vec::len(self)))
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
        self.resize(new_len, 0);
        Ok(())
    }

    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

/// Bump allocator over a single [`Storage`].
///
/// Regions are handed out in increasing order and freed space is never reused.
/// The region at the end of the used space is resized in place, any other
/// region moves on `realloc`. Regions below the `baseline` belong to a frozen
/// snapshot and are read-only.
#[derive(Debug)]
pub struct SlabAllocator<S> {
    pub(crate) storage: S,
    pub(crate) config: AllocatorConfig,
    /// First byte that was never handed out
    pub(crate) end: usize,
    /// Regions starting below this offset are read-only
    pub(crate) baseline: usize,
    /// Live regions, ref -> size in bytes
    pub(crate) regions: BTreeMap<Ref, usize>,
    /// Bytes given back through `free` or left behind by a moved region
    pub(crate) freed_bytes: usize,
}

/// Bytes a region of `size` occupies. Empty regions still take one aligned slot
/// so that every live region has its own ref.
fn region_len(size: usize) -> usize {
    size.next_multiple_of(ALIGNMENT).max(ALIGNMENT)
}

/// Slab allocator living on the heap.
pub type ArenaAllocator = SlabAllocator<Vec<u8>>;

impl ArenaAllocator {
    pub fn new(options: AllocatorOptions) -> Self {
        let config = AllocatorConfig::from(options);
        let storage = vec![0; config.initial_size_bytes.max(ALIGNMENT)];
        Self::with_storage(storage, config)
    }
}

impl Default for ArenaAllocator {
    fn default() -> Self {
        Self::new(AllocatorOptions::default())
    }
}

impl<S: Storage> SlabAllocator<S> {
    /// Start allocating from a storage that holds no regions yet.
    ///
    /// The first [`ALIGNMENT`] bytes are reserved so that no region starts at the null ref.
    pub fn with_storage(storage: S, config: AllocatorConfig) -> Self {
        assert!(
            config.limit() >= ALIGNMENT,
            "Allocator limit is too small"
        );
        Self {
            storage,
            config,
            end: ALIGNMENT,
            baseline: ALIGNMENT,
            regions: BTreeMap::new(),
            freed_bytes: 0,
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Mark every region allocated so far as read-only.
    ///
    /// Writers have to copy such regions through `realloc` before changing them.
    pub fn freeze(&mut self) {
        self.baseline = self.end;
    }

    /// Size of the region at `ref_`.
    pub fn region_size(&self, ref_: Ref) -> usize {
        *self
            .regions
            .get(&ref_)
            .unwrap_or_else(|| panic!("Region {ref_} not found"))
    }

    fn is_tail(&self, ref_: Ref) -> bool {
        ref_ + self.region_size(ref_) == self.end
    }

    /// Make sure the storage covers `required_end` bytes, growing it if necessary.
    fn ensure_storage(&mut self, required_end: usize) -> Result<(), AllocationError> {
        let limit = self.config.limit();
        if required_end > limit {
            log::warn!("Refusing allocation: {required_end} bytes needed, limit is {limit}");
            return Err(AllocationError::LimitExceeded {
                requested: required_end,
                limit,
            });
        }

        let len = self.storage.len();
        if required_end <= len {
            return Ok(());
        }

        // account for missing size + extra to avoid resizing too often
        let missing_space = required_end - len;
        let new_len = (len + missing_space)
            .saturating_add(self.config.growth_bytes)
            .min(limit);
        log::debug!("Growing allocator storage from {len} to {new_len} bytes");
        self.storage
            .grow(new_len)
            .map_err(|source| AllocationError::Storage {
                requested: new_len,
                source,
            })
    }
}

impl<S: Storage> Allocator for SlabAllocator<S> {
    fn alloc(&mut self, size: usize) -> Result<Ref, AllocationError> {
        debug_assert_eq!(size % ALIGNMENT, 0, "Unaligned allocation of {size} bytes");
        let size = region_len(size);

        let ref_ = self.end;
        let new_end = ref_.saturating_add(size);
        self.ensure_storage(new_end)?;

        // space behind a shrunk tail region may hold stale bytes
        self.storage.as_mut_slice()[ref_..new_end].fill(0);
        self.end = new_end;
        let previous = self.regions.insert(ref_, size);
        debug_assert!(previous.is_none());

        Ok(ref_)
    }

    fn realloc(
        &mut self,
        ref_: Ref,
        old_size: usize,
        new_size: usize,
    ) -> Result<Ref, AllocationError> {
        let region_size = self.region_size(ref_);
        debug_assert!(old_size <= region_size, "Region {ref_} is smaller than {old_size}");
        let new_size = region_len(new_size);
        let read_only = self.is_read_only(ref_);

        if !read_only && self.is_tail(ref_) {
            let new_end = ref_.saturating_add(new_size);
            self.ensure_storage(new_end)?;
            self.end = new_end;
            self.regions.insert(ref_, new_size);
            return Ok(ref_);
        }

        let new_ref = self.alloc(new_size)?;
        let copy_len = old_size.min(new_size);
        self.storage
            .as_mut_slice()
            .copy_within(ref_..ref_ + copy_len, new_ref);

        if !read_only {
            self.free(ref_, region_size);
        }

        log::debug!("Moved region {ref_} ({region_size} bytes) to {new_ref} ({new_size} bytes)");
        Ok(new_ref)
    }

    fn free(&mut self, ref_: Ref, size: usize) {
        match self.regions.remove(&ref_) {
            Some(region_size) => {
                debug_assert!(size <= region_size);
                self.freed_bytes += region_size;
            }
            None => debug_assert!(false, "Double free of region {ref_}"),
        }
    }

    fn is_read_only(&self, ref_: Ref) -> bool {
        ref_ < self.baseline
    }

    fn translate(&self, ref_: Ref) -> &[u8] {
        let size = self.region_size(ref_);
        &self.storage.as_slice()[ref_..ref_ + size]
    }

    fn try_translate(&self, ref_: Ref) -> Option<&[u8]> {
        let size = *self.regions.get(&ref_)?;
        Some(&self.storage.as_slice()[ref_..ref_ + size])
    }

    fn translate_mut(&mut self, ref_: Ref) -> &mut [u8] {
        let size = self.region_size(ref_);
        &mut self.storage.as_mut_slice()[ref_..ref_ + size]
    }
}
