//! Memory handles and the allocator capability nodes are built on.

pub mod mmap;
pub mod slab;

use crate::error::AllocationError;

pub use mmap::{MmapAllocator, MmapStorage};
pub use slab::{ArenaAllocator, SlabAllocator, Storage};

/// Opaque handle of an allocated region: its byte offset in the allocator storage.
///
/// A ref is only valid until the next `realloc` of the region, which may move it.
pub type Ref = usize;

/// Never handed out by an allocator.
pub const NULL_REF: Ref = 0;

/// Every region starts and ends on this boundary.
pub const ALIGNMENT: usize = 8;

/// Source of node memory.
///
/// Allocators own the memory; callers only hold [`Ref`]s and must translate them
/// again after any call that can move a region.
pub trait Allocator {
    /// Allocate a new writable region of `size` bytes.
    fn alloc(&mut self, size: usize) -> Result<Ref, AllocationError>;

    /// Resize the region at `ref_` from `old_size` to `new_size` bytes.
    ///
    /// Returns the ref of a writable region whose first `min(old_size, new_size)`
    /// bytes equal those of the old region. The region may be moved, read-only
    /// regions always are and are left untouched. On error the old region is unchanged.
    fn realloc(&mut self, ref_: Ref, old_size: usize, new_size: usize)
        -> Result<Ref, AllocationError>;

    /// Give the region back. The ref must not be used afterwards.
    fn free(&mut self, ref_: Ref, size: usize);

    /// Whether the region belongs to a frozen snapshot and must be copied before writing.
    fn is_read_only(&self, ref_: Ref) -> bool;

    /// All bytes of the region at `ref_`.
    fn translate(&self, ref_: Ref) -> &[u8];

    /// Like [`Self::translate`], but `None` if no live region starts at `ref_`.
    fn try_translate(&self, ref_: Ref) -> Option<&[u8]>;

    /// All bytes of the region at `ref_`, writable.
    fn translate_mut(&mut self, ref_: Ref) -> &mut [u8];
}
