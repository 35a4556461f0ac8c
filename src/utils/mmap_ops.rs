use memmap2::MmapMut;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

pub const TEMP_FILE_EXTENSION: &str = "tmp";

fn open_read_write(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(false)
        .truncate(false)
        .open(path)
}

/// Open the data file at `path` with exactly `length` bytes, creating it if needed.
///
/// A new file is sized under a temporary name first, so `path` never exists
/// with a partial length.
pub fn create_and_ensure_length(path: &Path, length: usize) -> io::Result<File> {
    if !path.exists() {
        let temp_path = path.with_extension(TEMP_FILE_EXTENSION);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?
            .set_len(length as u64)?;
        fs::rename(&temp_path, path)?;
        return open_read_write(path);
    }

    let file = open_read_write(path)?;
    file.set_len(length as u64)?;
    Ok(file)
}

/// Map the whole file at `path` for reading and writing.
pub fn open_write_mmap(path: &Path) -> io::Result<MmapMut> {
    let file = open_read_write(path)?;

    // SAFETY: the file is owned by this crate and never truncated while mapped
    unsafe { MmapMut::map_mut(&file) }
}
