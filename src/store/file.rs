// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read-only index file with positioned reads.
//!
//! No shared cursor: any number of threads can read from the same handle.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct IndexFile {
    file: File,
    len: u64,
    path: PathBuf,
}

impl IndexFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len, path })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill `buf` from `offset`. A span past the end of the file is corrupt
    /// index data, not an I/O error.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let in_bounds = offset
            .checked_add(buf.len() as u64)
            .is_some_and(|end| end <= self.len);
        if !in_bounds {
            return Err(Error::corrupt(format!(
                "read of {} bytes at {} runs past end of {} ({} bytes)",
                buf.len(),
                offset,
                self.path.display(),
                self.len
            )));
        }
        read_exact_at(&self.file, offset, buf)?;
        Ok(())
    }

    /// Read `[start, end)` into a fresh buffer.
    pub fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        if end < start {
            return Err(Error::corrupt(format!(
                "inverted byte range [{}, {})",
                start, end
            )));
        }
        let len = usize::try_from(end - start)
            .map_err(|_| Error::corrupt(format!("byte range of {} too large", end - start)))?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { requested: len })?;
        buf.resize(len, 0);
        self.read_at(start, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buf, pos)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, pos) {
            Ok(0) => break,
            Ok(n) => {
                buf = &mut buf[n..];
                pos += n as u64;
            }
            Err(e) => return Err(e),
        }
    }
    if !buf.is_empty() {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}
