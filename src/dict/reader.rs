// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Read-only access to a dictionary built by [`super::writer::DictWriter`].
//!
//! The whole file is memory-mapped once at `open` time; every subsequent
//! `get` or `scan` walks the mapping directly rather than issuing syscalls,
//! which is the point of writing the file append-only and header-last in
//! the first place.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};

use super::{HEADER_LEN, MAX_SENTINEL, MIN_SENTINEL};

/// Returned by a [`DictReader::scan`] callback to say whether the walk
/// should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

struct Header {
    key_field_width: usize,
    super_block_offset: u64,
    super_block_entry_count: u32,
}

/// A memory-mapped, read-only view of a dictionary file.
pub struct DictReader {
    mmap: Mmap,
    header: Header,
}

impl DictReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::open(path, &e))?;
        // SAFETY: the mapping is read-only and this reader owns it for its
        // whole lifetime; callers are responsible for not mutating the
        // underlying file out from under a live `DictReader`.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::mmap(path, &e))?;
        if mmap.len() < HEADER_LEN {
            return Err(Error::short_read("dictionary file shorter than its header"));
        }
        let key_field_width = u16::from_be_bytes([mmap[0], mmap[1]]) as usize;
        let super_block_offset = u64::from_be_bytes(mmap[2..10].try_into().unwrap());
        let super_block_entry_count = u32::from_be_bytes(mmap[10..14].try_into().unwrap());
        Ok(DictReader {
            mmap,
            header: Header {
                key_field_width,
                super_block_offset,
                super_block_entry_count,
            },
        })
    }

    /// Looks up `key`, returning its value bytes if present.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(block_offset) = self.find_block_offset(key)? else {
            return Ok(None);
        };
        let mut found = None;
        self.walk_block(block_offset, |entry_key, value| {
            match entry_key.cmp(key) {
                std::cmp::Ordering::Equal => {
                    found = Some(value.to_vec());
                    Ok(ScanControl::Stop)
                }
                std::cmp::Ordering::Greater => Ok(ScanControl::Stop),
                std::cmp::Ordering::Less => Ok(ScanControl::Continue),
            }
        })?;
        Ok(found)
    }

    /// Visits every real (non-sentinel) key greater than or equal to
    /// `start_key`, in ascending order, until `cb` returns
    /// [`ScanControl::Stop`] or the dictionary is exhausted.
    pub fn scan(
        &self,
        start_key: &[u8],
        mut cb: impl FnMut(&[u8], &[u8]) -> ScanControl,
    ) -> Result<()> {
        let super_idx = self.super_block_predecessor(start_key);
        let Some(mut idx) = super_idx else {
            return Ok(());
        };
        let count = self.header.super_block_entry_count as usize;
        while idx < count {
            let block_offset = self.super_entry_offset(idx)?;
            let mut stop = false;
            self.walk_block(block_offset, |entry_key, value| {
                if entry_key == MIN_SENTINEL || entry_key == MAX_SENTINEL {
                    return Ok(ScanControl::Continue);
                }
                if entry_key < start_key {
                    return Ok(ScanControl::Continue);
                }
                match cb(entry_key, value) {
                    ScanControl::Continue => Ok(ScanControl::Continue),
                    ScanControl::Stop => {
                        stop = true;
                        Ok(ScanControl::Stop)
                    }
                }
            })?;
            if stop {
                break;
            }
            idx += 1;
        }
        Ok(())
    }

    /// Number of real keys (excluding the two sentinels). Computed by a
    /// full scan; callers on a hot path should cache this themselves.
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        self.scan(MIN_SENTINEL, |_, _| {
            count += 1;
            ScanControl::Continue
        })?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn super_entry_key(&self, idx: usize) -> &[u8] {
        let stride = self.header.key_field_width + 8;
        let start = self.header.super_block_offset as usize + idx * stride;
        let padded = &self.mmap[start..start + self.header.key_field_width];
        let nul = padded.iter().position(|&b| b == 0).unwrap_or(padded.len());
        &padded[..nul]
    }

    fn super_entry_offset(&self, idx: usize) -> Result<u64> {
        let stride = self.header.key_field_width + 8;
        let start = self.header.super_block_offset as usize + idx * stride + self.header.key_field_width;
        if start + 8 > self.mmap.len() {
            return Err(Error::short_read("truncated super-block entry"));
        }
        Ok(u64::from_be_bytes(self.mmap[start..start + 8].try_into().unwrap()))
    }

    /// Index of the last super-block entry whose first key is `<= key`, or
    /// `None` if `key` sorts before every block (shouldn't happen for a
    /// well-formed dictionary, since the minimum sentinel is always first).
    fn super_block_predecessor(&self, key: &[u8]) -> Option<usize> {
        let count = self.header.super_block_entry_count as usize;
        if count == 0 {
            return None;
        }
        let (mut lo, mut hi) = (0usize, count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.super_entry_key(mid) <= key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            None
        } else {
            Some(lo - 1)
        }
    }

    fn find_block_offset(&self, key: &[u8]) -> Result<Option<u64>> {
        match self.super_block_predecessor(key) {
            Some(idx) => Ok(Some(self.super_entry_offset(idx)?)),
            None => Ok(None),
        }
    }

    /// Decodes one key block starting at `offset`, invoking `cb` for each
    /// entry's reconstructed key and value until `cb` returns `Stop` or the
    /// block ends.
    fn walk_block(
        &self,
        offset: u64,
        mut cb: impl FnMut(&[u8], &[u8]) -> Result<ScanControl>,
    ) -> Result<()> {
        let mut cursor = crate::codec::Reader::new(&self.mmap[offset as usize..]);
        let block_len = cursor.read_varint_u64()? as usize;
        let block = cursor.read_bytes(block_len)?;
        let mut entry_cursor = crate::codec::Reader::new(block);
        let mut key = Vec::new();
        while !entry_cursor.is_empty() {
            let shared = entry_cursor.read_varint_u64()? as usize;
            if shared > key.len() {
                return Err(Error::short_read("shared prefix longer than reconstructed key"));
            }
            key.truncate(shared);
            loop {
                let byte = entry_cursor.read_bytes(1)?[0];
                if byte == 0 {
                    break;
                }
                key.push(byte);
            }
            let value_len = entry_cursor.read_varint_u64()? as usize;
            let value = entry_cursor.read_bytes(value_len)?;
            if cb(&key, value)? == ScanControl::Stop {
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::writer::DictWriter;

    fn build(dir: &Path, keys: &[(&[u8], &[u8])]) -> DictReader {
        let path = dir.join("d.dict");
        let mut w = DictWriter::create(&path, 16).unwrap();
        for (k, v) in keys {
            w.add(k, v).unwrap();
        }
        w.close().unwrap();
        DictReader::open(&path).unwrap()
    }

    #[test]
    fn s3_prefix_compression_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let r = build(
            &dir,
            &[
                (b"apple" as &[u8], b"1" as &[u8]),
                (b"apricot", b"2"),
                (b"banana", b"3"),
                (b"cherry", b"4"),
            ],
        );
        assert_eq!(r.get(b"apple").unwrap(), Some(b"1".to_vec()));
        assert_eq!(r.get(b"apricot").unwrap(), Some(b"2".to_vec()));
        assert_eq!(r.get(b"banana").unwrap(), Some(b"3".to_vec()));
        assert_eq!(r.get(b"cherry").unwrap(), Some(b"4".to_vec()));
        assert_eq!(r.get(b"aprico").unwrap(), None);
        assert_eq!(r.get(b"bananas").unwrap(), None);
    }

    #[test]
    fn s4_scan_from_midpoint() {
        let dir = tempfile::tempdir().unwrap();
        let r = build(
            &dir,
            &[
                (b"apple" as &[u8], b"1" as &[u8]),
                (b"apricot", b"2"),
                (b"banana", b"3"),
                (b"cherry", b"4"),
            ],
        );
        let mut seen = Vec::new();
        r.scan(b"b", |k, _| {
            seen.push(k.to_vec());
            ScanControl::Continue
        })
        .unwrap();
        assert_eq!(seen, vec![b"banana".to_vec(), b"cherry".to_vec()]);
    }

    #[test]
    fn scan_can_stop_early() {
        let dir = tempfile::tempdir().unwrap();
        let r = build(
            &dir,
            &[
                (b"apple" as &[u8], b"1" as &[u8]),
                (b"apricot", b"2"),
                (b"banana", b"3"),
            ],
        );
        let mut seen = Vec::new();
        r.scan(b" ", |k, _| {
            seen.push(k.to_vec());
            if k == b"apricot" {
                ScanControl::Stop
            } else {
                ScanControl::Continue
            }
        })
        .unwrap();
        assert_eq!(seen, vec![b"apple".to_vec(), b"apricot".to_vec()]);
    }

    #[test]
    fn len_excludes_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let r = build(&dir, &[(b"only" as &[u8], b"1" as &[u8])]);
        assert_eq!(r.len().unwrap(), 1);
    }

    #[test]
    fn empty_dictionary_has_zero_entries() {
        let dir = tempfile::tempdir().unwrap();
        let r = build(&dir, &[]);
        assert_eq!(r.len().unwrap(), 0);
        assert!(r.is_empty().unwrap());
        assert_eq!(r.get(b"anything").unwrap(), None);
    }

    #[test]
    fn many_keys_span_multiple_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let owned: Vec<(String, String)> = (0..600)
            .map(|i| (format!("key{:04}", i), format!("v{i}")))
            .collect();
        let refs: Vec<(&[u8], &[u8])> = owned
            .iter()
            .map(|(k, v)| (k.as_bytes(), v.as_bytes()))
            .collect();
        let r = build(&dir, &refs);
        assert_eq!(r.len().unwrap(), 600);
        assert_eq!(r.get(b"key0300").unwrap(), Some(b"v300".to_vec()));
        assert_eq!(r.get(b"key0000").unwrap(), Some(b"v0".to_vec()));
        assert_eq!(r.get(b"key0599").unwrap(), Some(b"v599".to_vec()));
        assert_eq!(r.get(b"key9999").unwrap(), None);
    }
}
