//! File helpers for persisting hash arrays.

use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::modular::{to_hex, U256};

/// Writes `values` as lowercase hex lines to `base_dir/prefix_index.txt`.
pub fn write_hash_series(
    base_dir: impl AsRef<Path>,
    prefix: &str,
    index: usize,
    values: &[U256],
) -> io::Result<PathBuf> {
    let dir = base_dir.as_ref();
    create_dir_all(dir)?;
    let filename = format!("{}_{:04}.txt", prefix, index);
    let path = dir.join(filename);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writer.write_all(to_hex(value).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(path)
}
