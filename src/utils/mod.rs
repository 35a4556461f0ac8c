pub mod file_ops;
pub mod mmap_ops;
