use crate::alloc::{ArenaAllocator, MmapAllocator};
use crate::config::AllocatorOptions;
use rand::Rng;
use tempfile::{Builder, TempDir};

/// Heap allocator with the default configuration.
pub fn empty_arena() -> ArenaAllocator {
    ArenaAllocator::new(AllocatorOptions::default())
}

/// Heap allocator refusing to hold more than `max_size_bytes` bytes in total.
pub fn limited_arena(max_size_bytes: usize) -> ArenaAllocator {
    ArenaAllocator::new(AllocatorOptions::with_limit(max_size_bytes))
}

/// File backed allocator in a fresh temporary directory.
pub fn empty_mmap_allocator() -> (TempDir, MmapAllocator) {
    let dir = Builder::new().prefix("test-allocator").tempdir().unwrap();
    let options = AllocatorOptions {
        initial_size_bytes: Some(64 * 1024),
        growth_bytes: Some(64 * 1024),
        max_size_bytes: None,
    };
    let allocator = MmapAllocator::create(dir.path(), options).unwrap();
    assert!(allocator.get_stats().regions_count == 0);
    (dir, allocator)
}

pub fn random_bytes(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    let mut bytes = vec![0; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Lowercase ASCII word of 1 to 9 letters.
pub fn random_word(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(1..10);
    let mut word = String::with_capacity(len);
    for _ in 0..len {
        word.push(rng.gen_range(b'a'..=b'z') as char);
    }
    word
}
