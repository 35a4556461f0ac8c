use std::io;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use serde::{Deserialize, Serialize};

use crate::alloc::slab::{SlabAllocator, Storage};
use crate::alloc::{Ref, ALIGNMENT};
use crate::config::{AllocatorConfig, AllocatorOptions};
use crate::error::{BlobError, Result};
use crate::utils::file_ops::{atomic_save_json, read_json};
use crate::utils::mmap_ops::{create_and_ensure_length, open_write_mmap};

const DATA_FILE_NAME: &str = "slab.dat";
const META_FILE_NAME: &str = "slab.json";

/// Memory mapped file used as allocator storage.
#[derive(Debug)]
pub struct MmapStorage {
    path: PathBuf,
    mmap: MmapMut,
}

impl MmapStorage {
    /// Create the file at `path` with `size` zeroed bytes and map it.
    pub fn create(path: &Path, size: usize) -> io::Result<Self> {
        create_and_ensure_length(path, size)?;
        let mmap = open_write_mmap(path)?;
        let path = path.to_path_buf();
        Ok(Self { path, mmap })
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        let mmap = open_write_mmap(path)?;
        let path = path.to_path_buf();
        Ok(Self { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes outstanding memory map modifications to disk.
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }
}

impl Storage for MmapStorage {
    fn len(&self) -> usize {
        self.mmap.len()
    }

    fn grow(&mut self, new_len: usize) -> io::Result<()> {
        // flush the current mmap
        self.mmap.flush()?;
        // reopen the file with a larger size
        create_and_ensure_length(&self.path, new_len)?;
        self.mmap = open_write_mmap(&self.path)?;
        Ok(())
    }

    fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}

/// Bookkeeping persisted next to the data file.
#[derive(Debug, Serialize, Deserialize)]
struct SlabMeta {
    config: AllocatorConfig,
    end: usize,
    regions: Vec<(Ref, usize)>,
    freed_bytes: usize,
}

/// Slab allocator persisted in a directory.
pub type MmapAllocator = SlabAllocator<MmapStorage>;

impl MmapAllocator {
    fn data_path(dir: &Path) -> PathBuf {
        dir.join(DATA_FILE_NAME)
    }

    fn meta_path(dir: &Path) -> PathBuf {
        dir.join(META_FILE_NAME)
    }

    /// Create a new, empty allocator in `dir`, which must exist already.
    pub fn create(dir: &Path, options: AllocatorOptions) -> Result<Self> {
        let config = AllocatorConfig::from(options);
        let size = config.initial_size_bytes.max(ALIGNMENT);
        let storage = MmapStorage::create(&Self::data_path(dir), size)?;
        let allocator = Self::with_storage(storage, config);
        allocator.save_meta()?;
        Ok(allocator)
    }

    /// Open the allocator stored in `dir`.
    ///
    /// Every region persisted by a previous session is read-only, writers get a copy.
    pub fn open(dir: &Path) -> Result<Self> {
        let meta_path = Self::meta_path(dir);
        if !meta_path.exists() {
            return Err(BlobError::MissingStorage(dir.to_path_buf()));
        }
        let meta: SlabMeta = read_json(&meta_path)?;
        let storage = MmapStorage::open(&Self::data_path(dir))?;

        if storage.len() < meta.end {
            return Err(BlobError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "data file holds {} bytes, metadata expects {}",
                    storage.len(),
                    meta.end
                ),
            )));
        }

        log::debug!(
            "Opened allocator at {} with {} regions",
            dir.display(),
            meta.regions.len()
        );

        Ok(Self {
            storage,
            config: meta.config,
            end: meta.end,
            baseline: meta.end,
            regions: meta.regions.into_iter().collect(),
            freed_bytes: meta.freed_bytes,
        })
    }

    fn save_meta(&self) -> Result<()> {
        let meta = SlabMeta {
            config: self.config,
            end: self.end,
            regions: self.regions.iter().map(|(&r, &size)| (r, size)).collect(),
            freed_bytes: self.freed_bytes,
        };
        let dir = self
            .storage
            .path()
            .parent()
            .expect("Data file has a parent directory");
        atomic_save_json(&Self::meta_path(dir), &meta)
    }

    /// Flush the data file, then persist the region table.
    pub fn flush(&self) -> Result<()> {
        self.storage.flush()?;
        self.save_meta()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        let data_path = self.storage.path().to_path_buf();
        let meta_path = data_path.with_file_name(META_FILE_NAME);
        vec![data_path, meta_path]
    }
}
