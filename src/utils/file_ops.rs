use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BlobError, Result};

/// Write `object` as JSON to `path`, replacing the previous file only once the
/// new content is fully written.
pub fn atomic_save_json<T: Serialize>(path: &Path, object: &T) -> Result<()> {
    let af = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
    af.write(|f| {
        let mut writer = BufWriter::new(f);
        serde_json::to_writer(&mut writer, object)?;
        writer.flush()?;
        Ok::<_, BlobError>(())
    })
    .map_err(|err| match err {
        atomicwrites::Error::Internal(io_err) => BlobError::Io(io_err),
        atomicwrites::Error::User(user_err) => user_err,
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
