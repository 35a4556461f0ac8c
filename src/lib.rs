pub mod alloc;
pub mod blob;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod header;
pub mod stats;
mod utils;

pub use crate::alloc::{Allocator, ArenaAllocator, MmapAllocator, Ref};
pub use blob::BlobNode;
pub use config::AllocatorOptions;
pub use error::{AllocationError, BlobError};
