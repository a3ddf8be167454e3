// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Append-only dictionary construction.
//!
//! A [`DictWriter`] accepts keys in strictly ascending order, buffers them
//! into 250-entry key blocks, and only touches the filesystem again (besides
//! appending) when a block is full or the dictionary is closed. The header
//! is written last, once the super-block offset and entry count are known,
//! so a process that dies mid-build leaves a file with a zeroed header
//! rather than one that looks valid but isn't.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{encode_varint_u64, varint_len_u64};
use crate::error::{Error, ErrorKind, Result};

use super::{common_prefix_len, HEADER_LEN, MAX_BLOCK_ENTRIES, MAX_KEY_LENGTH, MAX_SENTINEL, MIN_SENTINEL};

/// A pending super-block entry: the first key of a flushed block, and the
/// byte offset at which that block starts.
struct SuperEntry {
    first_key: Vec<u8>,
    block_offset: u64,
}

/// Builds a dictionary file one ascending key at a time.
pub struct DictWriter {
    file: BufWriter<File>,
    path: PathBuf,
    key_len: usize,
    position: u64,
    block_buf: Vec<u8>,
    block_count: usize,
    block_start_key: Option<Vec<u8>>,
    /// Prefix-compression reference: reset to empty at the start of every
    /// block, so each block's first key is stored in full.
    last_key: Vec<u8>,
    /// Strict-ordering reference: the last key accepted by `add`, never
    /// reset. Kept separate from `last_key` so a key landing on a block
    /// boundary is still checked against the whole dictionary, not just
    /// the block being flushed.
    last_added_key: Vec<u8>,
    super_block: Vec<SuperEntry>,
    closed: bool,
}

impl DictWriter {
    /// Creates a new dictionary at `path`, accepting keys up to `key_len`
    /// bytes (excluding the terminating NUL), and writes the implicit
    /// minimum sentinel as the first entry.
    pub fn create(path: impl AsRef<Path>, key_len: usize) -> Result<Self> {
        if key_len == 0 || key_len > MAX_KEY_LENGTH {
            return Err(Error::invalid_length(format!(
                "key length {key_len} outside 1..={MAX_KEY_LENGTH}"
            )));
        }
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::open(&path, &e))?;
        let mut writer = DictWriter {
            file: BufWriter::new(file),
            path,
            key_len,
            position: 0,
            block_buf: Vec::new(),
            block_count: 0,
            block_start_key: None,
            last_key: Vec::new(),
            last_added_key: Vec::new(),
            super_block: Vec::new(),
            closed: false,
        };
        // Header is a fixed-size placeholder, rewritten on close.
        writer.file.write_all(&[0u8; HEADER_LEN])?;
        writer.position += HEADER_LEN as u64;
        writer.add_raw(MIN_SENTINEL, &[])?;
        Ok(writer)
    }

    /// Adds `key -> value`. `key` must compare strictly greater than every
    /// previously added key and fit within the configured key length.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() || key.len() > self.key_len {
            return Err(Error::invalid_key(format!(
                "key of length {} outside 1..={}",
                key.len(),
                self.key_len
            )));
        }
        if key <= self.last_added_key.as_slice() {
            return Err(Error::invalid_key(
                "keys must be added in strictly ascending order",
            ));
        }
        self.add_raw(key, value)
    }

    /// Flushes the final block together with the implicit maximum sentinel,
    /// writes the super block, and writes the real header. Consumes `self`
    /// so a closed writer can't be added to afterward.
    pub fn close(mut self) -> Result<()> {
        self.add_raw(MAX_SENTINEL, &[])?;
        debug_assert!(self.block_buf.is_empty(), "max sentinel must flush its block");

        let super_block_offset = self.position;
        let key_field_width = self.key_len + 1;
        for entry in &self.super_block {
            debug_assert!(entry.first_key.len() <= self.key_len);
            let mut padded = vec![0u8; key_field_width];
            padded[..entry.first_key.len()].copy_from_slice(&entry.first_key);
            self.file.write_all(&padded)?;
            self.file.write_all(&entry.block_offset.to_be_bytes())?;
        }
        self.position += (self.super_block.len() as u64) * (key_field_width as u64 + 8);

        self.file.seek(SeekFrom::Start(0))?;
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(&(key_field_width as u16).to_be_bytes());
        header.extend_from_slice(&super_block_offset.to_be_bytes());
        header.extend_from_slice(&(self.super_block.len() as u32).to_be_bytes());
        debug_assert_eq!(header.len(), HEADER_LEN);
        self.file.write_all(&header)?;
        self.file.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Abandons the build, removing the partial file. Called automatically
    /// from `Drop` if `close` was never reached.
    pub fn abort(mut self) -> Result<()> {
        self.closed = true;
        let path = std::mem::take(&mut self.path);
        std::fs::remove_file(&path).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(Error::from(e))
            }
        })
    }

    fn add_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.block_start_key.is_none() {
            self.super_block.push(SuperEntry {
                first_key: key.to_vec(),
                block_offset: self.position,
            });
            self.block_start_key = Some(key.to_vec());
        }

        let shared = common_prefix_len(&self.last_key, key);
        let suffix = &key[shared..];
        encode_varint_u64(shared as u64, &mut self.block_buf);
        self.block_buf.extend_from_slice(suffix);
        self.block_buf.push(0);
        encode_varint_u64(value.len() as u64, &mut self.block_buf);
        self.block_buf.extend_from_slice(value);

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.last_added_key.clear();
        self.last_added_key.extend_from_slice(key);
        self.block_count += 1;

        if self.block_count >= MAX_BLOCK_ENTRIES || key == MAX_SENTINEL {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block_buf.is_empty() {
            return Ok(());
        }
        let len_prefix_len = varint_len_u64(self.block_buf.len() as u64);
        let mut header = Vec::with_capacity(len_prefix_len);
        encode_varint_u64(self.block_buf.len() as u64, &mut header);
        self.file.write_all(&header)?;
        self.file.write_all(&self.block_buf)?;
        self.position += (header.len() + self.block_buf.len()) as u64;

        self.block_buf.clear();
        self.block_count = 0;
        self.block_start_key = None;
        self.last_key.clear();
        Ok(())
    }
}

impl Drop for DictWriter {
    fn drop(&mut self) {
        if !self.closed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl ErrorKind {
    #[cfg(test)]
    fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidKey | ErrorKind::InvalidLength | ErrorKind::InvalidMode | ErrorKind::InvalidCallback
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::reader::DictReader;

    #[test]
    fn rejects_out_of_order_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        let mut w = DictWriter::create(&path, 8).unwrap();
        w.add(b"banana", b"1").unwrap();
        let err = w.add(b"apple", b"2").unwrap_err();
        assert!(err.kind.is_validation());
    }

    #[test]
    fn rejects_overlong_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        let mut w = DictWriter::create(&path, 4).unwrap();
        let err = w.add(b"toolong", b"1").unwrap_err();
        assert!(err.kind.is_validation());
    }

    #[test]
    fn abort_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        let mut w = DictWriter::create(&path, 8).unwrap();
        w.add(b"apple", b"1").unwrap();
        w.abort().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_without_close_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        {
            let mut w = DictWriter::create(&path, 8).unwrap();
            w.add(b"apple", b"1").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn rejects_out_of_order_key_across_block_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        let mut w = DictWriter::create(&path, 8).unwrap();
        for i in 0..MAX_BLOCK_ENTRIES {
            let key = format!("k{i:06}");
            w.add(key.as_bytes(), b"v").unwrap();
        }
        // Out of order relative to the last key of the block just flushed,
        // even though `last_key` itself was reset for prefix compression.
        let err = w.add(b"k000001", b"v").unwrap_err();
        assert!(err.kind.is_validation());
    }

    #[test]
    fn s2_minimal_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.dict");
        let mut w = DictWriter::create(&path, 8).unwrap();
        w.add(b"apple", &[0x01]).unwrap();
        w.add(b"apricot", &[0x02]).unwrap();
        w.add(b"banana", &[0x03]).unwrap();
        w.close().unwrap();

        let r = DictReader::open(&path).unwrap();
        assert_eq!(r.len().unwrap(), 3);
        assert_eq!(r.get(b"apple").unwrap(), Some(vec![0x01]));
        assert_eq!(r.get(b"avocado").unwrap(), None);
    }
}
