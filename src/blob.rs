//! Blob node: a single node holding a contiguous run of raw bytes.
//!
//! The node is an accessor. Its memory belongs to the [`Allocator`], the node only
//! remembers the [`Ref`] of its region and translates it on every access, so a
//! region moved by a resize is never read through a stale address.
//!
//! Every mutation goes through [`BlobNode::replace`]: `add`, `insert`, `erase`
//! and `clear` are thin wrappers.

use std::fmt;

use crate::alloc::{Allocator, Ref, ALIGNMENT};
use crate::error::{AllocationError, BlobError, Result};
use crate::header::{self, NodeHeader, WidthType, HEADER_SIZE, MAX_NODE_BYTES};

/// Smallest region created for a new node, header included.
pub const INITIAL_CAPACITY: usize = 128;

/// Largest region a node can grow to. The capacity field is 24-bit and regions are aligned.
pub const MAX_CAPACITY: usize = MAX_NODE_BYTES & !(ALIGNMENT - 1);

/// Bytes needed to store `count` content bytes. Element width does not apply to blobs.
#[inline]
pub fn calc_byte_len(count: usize, _width: usize) -> usize {
    HEADER_SIZE + count
}

/// Content bytes a region of `bytes` bytes can hold. Element width does not apply to blobs.
#[inline]
pub fn calc_item_count(bytes: usize, _width: usize) -> usize {
    bytes - HEADER_SIZE
}

/// Content of the node whose region starts with `header`, from `index` on.
///
/// Reads the raw region directly, without attaching an accessor.
pub fn get_from_header(header: &[u8], index: usize) -> &[u8] {
    let size = header::decode_size(header);
    &header::get_data_from_header(header)[index..size]
}

/// Allocate a node holding `size` zero bytes and return its ref.
///
/// No accessor is attached, the caller owns the region.
pub fn create_array<A: Allocator + ?Sized>(
    size: usize,
    alloc: &mut A,
) -> Result<Ref, AllocationError> {
    let needed = calc_byte_len(size, 0);
    if needed > MAX_CAPACITY {
        return Err(AllocationError::NodeTooLarge {
            requested: needed,
            max: MAX_CAPACITY,
        });
    }
    let capacity = needed.next_multiple_of(ALIGNMENT).max(INITIAL_CAPACITY);

    let ref_ = alloc.alloc(capacity)?;
    let region = alloc.translate_mut(ref_);
    region.fill(0);
    NodeHeader::blob(size, capacity).write(region);

    Ok(ref_)
}

/// Capacity to grow a region of `capacity` bytes to, so that it holds `needed` bytes.
///
/// Doubles the capacity, or jumps straight to `needed` when doubling is not enough.
fn grown_capacity(capacity: usize, needed: usize) -> Result<usize, AllocationError> {
    if needed > MAX_CAPACITY {
        return Err(AllocationError::NodeTooLarge {
            requested: needed,
            max: MAX_CAPACITY,
        });
    }
    let doubled = capacity.saturating_mul(2);
    let new_capacity = if doubled < needed {
        needed.next_multiple_of(ALIGNMENT)
    } else {
        doubled
    };
    Ok(new_capacity.min(MAX_CAPACITY))
}

/// Accessor for a blob node.
///
/// An accessor is either detached or attached to exactly one region. It never frees
/// the region: whoever keeps the ref owns it.
pub struct BlobNode<'a, A: Allocator + ?Sized> {
    alloc: &'a mut A,
    ref_: Option<Ref>,
}

impl<'a, A: Allocator + ?Sized> BlobNode<'a, A> {
    /// Detached accessor, call [`Self::create`] or [`Self::init_from_ref`] before use.
    pub fn new(alloc: &'a mut A) -> Self {
        Self { alloc, ref_: None }
    }

    /// Create a new empty node and attach to it.
    ///
    /// A previously attached region is left alone, the caller still owns it.
    pub fn create(&mut self) -> Result<(), AllocationError> {
        let ref_ = create_array(0, &mut *self.alloc)?;
        self.ref_ = Some(ref_);
        Ok(())
    }

    /// Attach to the node at `ref_`.
    pub fn init_from_ref(&mut self, ref_: Ref) -> Result<()> {
        let region = self
            .alloc
            .try_translate(ref_)
            .ok_or_else(|| BlobError::corrupt_header(format!("no region at ref {ref_}")))?;
        let node_header = NodeHeader::read(region)?;

        if node_header.width_type != WidthType::Ignore {
            return Err(BlobError::corrupt_header(format!(
                "expected a byte node, found width type {:?}",
                node_header.width_type
            )));
        }
        if node_header.capacity > region.len()
            || calc_byte_len(node_header.size, 0) > node_header.capacity
        {
            return Err(BlobError::corrupt_header(format!(
                "size {} does not fit capacity {} of a {} bytes region",
                node_header.size,
                node_header.capacity,
                region.len()
            )));
        }

        self.ref_ = Some(ref_);
        Ok(())
    }

    /// Detach, returning the ref the accessor was attached to.
    pub fn detach(&mut self) -> Option<Ref> {
        self.ref_.take()
    }

    pub fn is_attached(&self) -> bool {
        self.ref_.is_some()
    }

    /// Current ref of the node. Any mutation may change it.
    pub fn get_ref(&self) -> Option<Ref> {
        self.ref_
    }

    fn attached_ref(&self) -> Ref {
        self.ref_.expect("Blob node is not attached")
    }

    /// The whole region, starting with the header.
    fn region(&self) -> &[u8] {
        self.alloc.translate(self.attached_ref())
    }

    fn region_mut(&mut self) -> &mut [u8] {
        let ref_ = self.attached_ref();
        self.alloc.translate_mut(ref_)
    }

    /// Number of content bytes.
    pub fn size(&self) -> usize {
        header::decode_size(self.region())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of content bytes the current region can hold without growing.
    pub fn capacity(&self) -> usize {
        calc_item_count(header::decode_capacity(self.region()), 0)
    }

    pub fn header(&self) -> Result<NodeHeader> {
        NodeHeader::read(self.region())
    }

    /// All content bytes.
    pub fn as_bytes(&self) -> &[u8] {
        get_from_header(self.region(), 0)
    }

    /// Content from `index` to the end.
    ///
    /// Panics if the node is detached or `index` is past the end.
    /// The slice is only valid until the next mutation.
    pub fn get(&self, index: usize) -> &[u8] {
        get_from_header(self.region(), index)
    }

    /// Like [`Self::get`], but `None` for a detached node or an index past the end.
    pub fn try_get(&self, index: usize) -> Option<&[u8]> {
        let ref_ = self.ref_?;
        let region = self.alloc.translate(ref_);
        let size = header::decode_size(region);
        header::get_data_from_header(region)[..size].get(index..)
    }

    /// Only a detached node has no content to point at, whatever the index.
    pub fn is_null(&self, _index: usize) -> bool {
        self.ref_.is_none()
    }

    /// Append `data`, followed by a zero byte if `add_zero_term` is set.
    pub fn add(&mut self, data: &[u8], add_zero_term: bool) -> Result<(), AllocationError> {
        let size = self.size();
        self.replace(size, size, data, add_zero_term)
    }

    /// Insert `data` at `pos`, followed by a zero byte if `add_zero_term` is set.
    pub fn insert(
        &mut self,
        pos: usize,
        data: &[u8],
        add_zero_term: bool,
    ) -> Result<(), AllocationError> {
        self.replace(pos, pos, data, add_zero_term)
    }

    /// Remove the bytes in `begin..end`.
    pub fn erase(&mut self, begin: usize, end: usize) -> Result<(), AllocationError> {
        self.replace(begin, end, &[], false)
    }

    /// Remove all content. The capacity is kept.
    pub fn clear(&mut self) -> Result<(), AllocationError> {
        let size = self.size();
        self.erase(0, size)
    }

    /// Replace the bytes in `begin..end` with `data`, followed by a zero byte if
    /// `add_zero_term` is set.
    ///
    /// The region is resized first and may move, so [`Self::get_ref`] can change.
    /// If that fails the node is left exactly as it was.
    ///
    /// Requires `begin <= end <= size`.
    pub fn replace(
        &mut self,
        begin: usize,
        end: usize,
        data: &[u8],
        add_zero_term: bool,
    ) -> Result<(), AllocationError> {
        let old_size = self.size();
        debug_assert!(begin <= end, "Invalid range {begin}..{end}");
        debug_assert!(end <= old_size, "Range end {end} is past size {old_size}");

        let remove_size = end - begin;
        let add_size = data.len() + usize::from(add_zero_term);
        let new_size = old_size - remove_size + add_size;

        self.ensure_capacity(new_size)?;

        let region = self.region_mut();
        let content = header::get_data_from_header_mut(region);
        // move the suffix first, source and destination may overlap
        if remove_size != add_size {
            content.copy_within(end..old_size, begin + add_size);
        }
        content[begin..begin + data.len()].copy_from_slice(data);
        if add_zero_term {
            content[begin + data.len()] = 0;
        }
        header::encode_size(region, new_size);

        Ok(())
    }

    /// Make the region writable and large enough for `count` content bytes.
    ///
    /// Does not touch the size, nothing changes if the allocator fails.
    fn ensure_capacity(&mut self, count: usize) -> Result<(), AllocationError> {
        let ref_ = self.attached_ref();
        let needed = calc_byte_len(count, 0);
        let capacity = header::decode_capacity(self.alloc.translate(ref_));
        let read_only = self.alloc.is_read_only(ref_);

        if capacity >= needed && !read_only {
            return Ok(());
        }

        let new_capacity = if capacity >= needed {
            capacity
        } else {
            grown_capacity(capacity, needed)?
        };

        let new_ref = self.alloc.realloc(ref_, capacity, new_capacity)?;
        header::encode_capacity(self.alloc.translate_mut(new_ref), new_capacity);

        if read_only {
            log::debug!("Copied read-only blob node {ref_} to {new_ref}");
        } else if new_ref != ref_ {
            log::debug!("Moved blob node {ref_} to {new_ref}, capacity {capacity} -> {new_capacity}");
        }
        self.ref_ = Some(new_ref);

        Ok(())
    }
}

impl<A: Allocator + ?Sized> fmt::Debug for BlobNode<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("BlobNode");
        debug.field("ref", &self.ref_);
        if self.ref_.is_some() {
            debug
                .field("size", &self.size())
                .field("capacity", &self.capacity());
        }
        debug.finish()
    }
}
