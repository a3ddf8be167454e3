// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Streaming index builder: turns a stream of `(doc_id, term, position,
//! field_id, field_type, field_options)` tuples into a dictionary and a
//! posting file while keeping memory bounded.
//!
//! Grounded on `original_source/src/search/invert.h`'s
//! `iSrchInvertInit`/`iSrchInvertAddTerm`/`iSrchInvertFinish`/`iSrchInvertAbort`
//! protocol. Terms accumulate in a [`crate::trie::Trie`] until the configured
//! memory budget is exceeded, at which point the trie is walked in order and
//! spilled to a run file on disk; `finish` spills once more and multi-way
//! merges every run by `(term, doc_id, position)` using a binary heap of run
//! cursors, per spec.md §4.4 and the heap-based merge strategy recorded in
//! `SPEC_FULL.md` §4.4.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::{decode_varint_u64, encode_varint_u64};
use crate::dict::DictWriter;
use crate::error::{Error, Result};
use crate::posting::{self, DictEntry, DocId, FieldType, Position, Posting, PostingList, TermType};
use crate::trie::Trie;

/// Bounds and external collaborators an [`Inverter`] is configured with; the
/// language/tokenizer/stemmer/stoplist names are stored for the caller's
/// bookkeeping only — this crate never resolves or invokes them (spec.md §6).
#[derive(Debug, Clone)]
pub struct InverterConfig {
    pub min_term_length: usize,
    pub max_term_length: usize,
    /// Approximate bytes of accumulator memory that triggers a spill.
    pub memory_budget_bytes: usize,
    pub tmp_dir: PathBuf,
}

impl InverterConfig {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        InverterConfig {
            min_term_length: 1,
            max_term_length: 1023,
            memory_budget_bytes: 64 * 1024 * 1024,
            tmp_dir: tmp_dir.into(),
        }
    }
}

/// Summary counts returned by [`Inverter::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverterStats {
    pub term_count: u32,
    pub posting_count: u64,
    pub run_count: u32,
}

struct TermAccumulator {
    term_type: TermType,
    postings: Vec<Posting>,
}

/// Rough per-posting memory charge used for the spill threshold: 4 (doc_id)
/// + 4 (position) + 4 (weight) fields plus `Vec` growth overhead.
const BYTES_PER_POSTING_ESTIMATE: usize = 16;

/// Builds a dictionary and posting file from a stream of term occurrences,
/// spilling sorted runs to `tmp_dir` when its memory budget is exceeded.
pub struct Inverter {
    config: InverterConfig,
    trie: Trie<TermAccumulator>,
    memory_used: usize,
    run_paths: Vec<PathBuf>,
    run_counter: u64,
    finished: bool,
}

impl Inverter {
    /// `init` from spec.md §4.4: allocates the in-memory accumulator. The
    /// external language/tokenizer/stemmer/stoplist facilities named there
    /// are the caller's concern — this crate stores nothing about them.
    pub fn init(config: InverterConfig) -> Result<Self> {
        if config.min_term_length == 0 || config.min_term_length > config.max_term_length {
            return Err(Error::invalid_length(format!(
                "min_term_length {} must be nonzero and <= max_term_length {}",
                config.min_term_length, config.max_term_length
            )));
        }
        Ok(Inverter {
            config,
            trie: Trie::new(),
            memory_used: 0,
            run_paths: Vec::new(),
            run_counter: 0,
            finished: false,
        })
    }

    /// Adds one token occurrence. Terms outside `[min_term_length,
    /// max_term_length]` are silently dropped, per spec.md §3. `field_type`
    /// becomes the posting list's term-type tag for this term (last writer
    /// wins on a term seen under more than one field type — the core treats
    /// it as an opaque classification, per spec.md §3's "Term type tag").
    pub fn add_term(
        &mut self,
        doc_id: DocId,
        term: &[u8],
        position: Position,
        field_type: FieldType,
    ) -> Result<()> {
        if term.len() < self.config.min_term_length || term.len() > self.config.max_term_length {
            return Ok(());
        }
        let posting = Posting {
            doc_id,
            position,
            weight: 1.0,
        };
        self.upsert(term, field_type, posting)?;

        self.memory_used += BYTES_PER_POSTING_ESTIMATE;
        if self.memory_used >= self.config.memory_budget_bytes {
            self.spill()?;
        }
        Ok(())
    }

    fn upsert(&mut self, term: &[u8], field_type: FieldType, posting: Posting) -> Result<()> {
        if let Some(existing) = self.trie.get_mut(term) {
            existing.term_type = TermType(field_type.bits());
            existing.postings.push(posting);
            return Ok(());
        }
        self.memory_used += term.len();
        self.trie.insert(
            term,
            TermAccumulator {
                term_type: TermType(field_type.bits()),
                postings: vec![posting],
            },
        )?;
        Ok(())
    }

    /// Walks the trie in ascending key order, writes one run file containing
    /// every accumulated term's sorted posting list, and resets in-memory
    /// state. A no-op if nothing has accumulated since the last spill.
    pub fn spill(&mut self) -> Result<()> {
        if self.trie.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.config.tmp_dir)?;
        let run_path = self
            .config
            .tmp_dir
            .join(format!("run-{:06}.tmp", self.run_counter));
        self.run_counter += 1;

        let file = File::create(&run_path).map_err(|e| Error::open(&run_path, &e))?;
        let mut writer = BufWriter::new(file);

        let mut write_err = None;
        self.trie.scan(b"", |term, acc| {
            if write_err.is_some() {
                return false;
            }
            let mut sorted = acc.postings.clone();
            posting::sort_by_doc_id(&mut sorted);
            let list = PostingList::from_sorted(sorted, acc.term_type, false);
            let blob = posting::codec::encode(&list);
            if let Err(e) = write_run_entry(&mut writer, term, &blob) {
                write_err = Some(e);
                return false;
            }
            true
        });
        if let Some(e) = write_err {
            let _ = std::fs::remove_file(&run_path);
            return Err(e);
        }
        writer.flush()?;

        self.run_paths.push(run_path);
        self.trie = Trie::new();
        self.memory_used = 0;
        Ok(())
    }

    /// Spills any remaining in-memory state, then multi-way merges every run
    /// file into `dict_path`/`postings_path`, removing the run files
    /// afterward. On any failure, removes the partial dictionary/postings
    /// files along with the runs, per spec.md §7.
    pub fn finish(mut self, dict_path: impl AsRef<Path>, postings_path: impl AsRef<Path>) -> Result<InverterStats> {
        self.spill()?;
        self.finished = true;
        let dict_path = dict_path.as_ref();
        let postings_path = postings_path.as_ref();

        let result = merge_runs(&self.run_paths, dict_path, self.config.max_term_length, postings_path);
        let run_paths = std::mem::take(&mut self.run_paths);
        for path in &run_paths {
            let _ = std::fs::remove_file(path);
        }
        match result {
            Ok(stats) => Ok(stats),
            Err(e) => {
                let _ = std::fs::remove_file(dict_path);
                let _ = std::fs::remove_file(postings_path);
                Err(e)
            }
        }
    }

    /// Discards all in-memory state and any spilled run files. Always
    /// leaves no durable effect, per spec.md §4.4.
    pub fn abort(mut self) -> Result<()> {
        self.finished = true;
        for path in &self.run_paths {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }
}

impl Drop for Inverter {
    fn drop(&mut self) {
        if !self.finished {
            for path in &self.run_paths {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

fn write_run_entry(w: &mut impl Write, term: &[u8], blob: &[u8]) -> Result<()> {
    let mut header = Vec::new();
    encode_varint_u64(term.len() as u64, &mut header);
    w.write_all(&header)?;
    w.write_all(term)?;
    let mut len_buf = Vec::new();
    encode_varint_u64(blob.len() as u64, &mut len_buf);
    w.write_all(&len_buf)?;
    w.write_all(blob)?;
    Ok(())
}

/// Sequential reader over one run file, yielding `(term, PostingList)`
/// entries in the ascending order they were written.
struct RunReader {
    file: BufReader<File>,
}

impl RunReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, &e))?;
        Ok(RunReader {
            file: BufReader::new(file),
        })
    }

    fn next_entry(&mut self) -> Result<Option<(Vec<u8>, PostingList)>> {
        let term_len = match read_varint(&mut self.file)? {
            Some(v) => v as usize,
            None => return Ok(None),
        };
        let mut term = vec![0u8; term_len];
        self.file.read_exact(&mut term)?;
        let blob_len = read_varint(&mut self.file)?
            .ok_or_else(|| Error::short_read("run file truncated after term"))? as usize;
        let mut blob = vec![0u8; blob_len];
        self.file.read_exact(&mut blob)?;
        let list = posting::codec::decode(&blob)?;
        Ok(Some((term, list)))
    }
}

fn read_varint(r: &mut impl Read) -> Result<Option<u64>> {
    let mut buf = [0u8; 1];
    let mut collected = Vec::with_capacity(4);
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            return if collected.is_empty() {
                Ok(None)
            } else {
                Err(Error::short_read("truncated varint at EOF"))
            };
        }
        let more = buf[0] & 0x80 != 0;
        collected.push(buf[0]);
        if !more {
            break;
        }
    }
    let (value, consumed) = decode_varint_u64(&collected)?;
    debug_assert_eq!(consumed, collected.len());
    Ok(Some(value))
}

/// Merges `run_paths` by `(term, doc_id, position)` into a fresh dictionary
/// at `dict_path` and a posting file at `postings_path`, using a binary heap
/// of run-front terms to pick the next term in ascending order in
/// `O(total_postings * log(run_count))`.
fn merge_runs(
    run_paths: &[PathBuf],
    dict_path: &Path,
    max_term_length: usize,
    postings_path: &Path,
) -> Result<InverterStats> {
    let mut readers: Vec<RunReader> = run_paths
        .iter()
        .map(|p| RunReader::open(p))
        .collect::<Result<_>>()?;
    let mut fronts: Vec<Option<(Vec<u8>, PostingList)>> = readers
        .iter_mut()
        .map(|r| r.next_entry())
        .collect::<Result<_>>()?;

    let mut heap: BinaryHeap<Reverse<(Vec<u8>, usize)>> = fronts
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.as_ref().map(|(term, _)| Reverse((term.clone(), i))))
        .collect();

    let mut dict_writer = DictWriter::create(dict_path, max_term_length)?;
    let postings_file = File::create(postings_path).map_err(|e| Error::open(postings_path, &e))?;
    let mut postings_writer = BufWriter::new(postings_file);
    let mut offset: u64 = 0;

    let mut term_count: u32 = 0;
    let mut posting_count: u64 = 0;

    while let Some(Reverse((min_term, first_idx))) = heap.pop() {
        let mut contributing = vec![first_idx];
        loop {
            match heap.peek() {
                Some(Reverse((term, _))) if *term == min_term => {
                    let Reverse((_, idx)) = heap.pop().unwrap();
                    contributing.push(idx);
                }
                _ => break,
            }
        }

        let mut merged: Vec<Posting> = Vec::new();
        let mut term_type = TermType(0);
        let mut required = false;
        for &idx in &contributing {
            if let Some((_, list)) = fronts[idx].take() {
                term_type = list.term_type;
                required = required || list.required;
                merged.extend(list.postings);
            }
            fronts[idx] = readers[idx].next_entry()?;
            if let Some((term, _)) = &fronts[idx] {
                heap.push(Reverse((term.clone(), idx)));
            }
        }
        posting::sort_by_doc_id(&mut merged);
        let list = PostingList::from_sorted(merged, term_type, required);
        let blob = posting::codec::encode(&list);

        let entry = DictEntry {
            occurrence_count: list.occurrence_count,
            document_count: list.document_count,
            offset,
            length: blob.len() as u32,
            term_type: list.term_type,
        };
        postings_writer.write_all(&blob)?;
        offset += blob.len() as u64;

        dict_writer.add(&min_term, &entry.encode())?;
        term_count += 1;
        posting_count += list.occurrence_count as u64;
    }

    dict_writer.close()?;
    postings_writer.flush()?;

    Ok(InverterStats {
        term_count,
        posting_count,
        run_count: run_paths.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(dir: &Path) -> InverterConfig {
        let mut c = InverterConfig::new(dir.join("runs"));
        c.memory_budget_bytes = usize::MAX;
        c
    }

    fn read_posting_list(dict_path: &Path, postings_path: &Path, term: &[u8]) -> Option<PostingList> {
        let reader = crate::dict::DictReader::open(dict_path).unwrap();
        let value = reader.get(term).unwrap()?;
        let entry = DictEntry::decode(&value).unwrap();
        let bytes = std::fs::read(postings_path).unwrap();
        let blob = &bytes[entry.offset as usize..(entry.offset + entry.length as u64) as usize];
        Some(posting::codec::decode(blob).unwrap())
    }

    #[test]
    fn builds_dictionary_and_postings_without_spilling() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = Inverter::init(cfg(dir.path())).unwrap();
        inv.add_term(DocId::new(1), b"apple", Position::new(1), FieldType::NONE)
            .unwrap();
        inv.add_term(DocId::new(1), b"banana", Position::new(2), FieldType::NONE)
            .unwrap();
        inv.add_term(DocId::new(2), b"apple", Position::new(1), FieldType::NONE)
            .unwrap();

        let dict_path = dir.path().join("idx.dict");
        let postings_path = dir.path().join("idx.post");
        let stats = inv.finish(&dict_path, &postings_path).unwrap();
        assert_eq!(stats.term_count, 2);
        assert_eq!(stats.posting_count, 3);

        let apple = read_posting_list(&dict_path, &postings_path, b"apple").unwrap();
        assert_eq!(apple.postings.len(), 2);
        assert_eq!(apple.document_count, 2);

        let banana = read_posting_list(&dict_path, &postings_path, b"banana").unwrap();
        assert_eq!(banana.postings.len(), 1);
    }

    #[test]
    fn drops_terms_outside_length_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = cfg(dir.path());
        config.min_term_length = 4;
        config.max_term_length = 8;
        let mut inv = Inverter::init(config).unwrap();
        inv.add_term(DocId::new(1), b"a", Position::new(1), FieldType::NONE)
            .unwrap();
        inv.add_term(DocId::new(1), b"apple", Position::new(2), FieldType::NONE)
            .unwrap();

        let dict_path = dir.path().join("idx.dict");
        let postings_path = dir.path().join("idx.post");
        let stats = inv.finish(&dict_path, &postings_path).unwrap();
        assert_eq!(stats.term_count, 1);

        let reader = crate::dict::DictReader::open(&dict_path).unwrap();
        assert_eq!(reader.get(b"a").unwrap(), None);
        assert!(reader.get(b"apple").unwrap().is_some());
    }

    #[test]
    fn spills_across_memory_budget_and_merges_correctly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = cfg(dir.path());
        config.memory_budget_bytes = 64; // force frequent spills
        let mut inv = Inverter::init(config).unwrap();

        for doc in 1..=50u32 {
            inv.add_term(DocId::new(doc), b"common", Position::new(1), FieldType::NONE)
                .unwrap();
            if doc % 3 == 0 {
                inv.add_term(DocId::new(doc), b"rare", Position::new(2), FieldType::NONE)
                    .unwrap();
            }
        }

        let dict_path = dir.path().join("idx.dict");
        let postings_path = dir.path().join("idx.post");
        let stats = inv.finish(&dict_path, &postings_path).unwrap();
        assert!(stats.run_count > 1, "expected multiple spills");

        let common = read_posting_list(&dict_path, &postings_path, b"common").unwrap();
        assert_eq!(common.postings.len(), 50);
        assert!(common.is_sorted());

        let rare = read_posting_list(&dict_path, &postings_path, b"rare").unwrap();
        assert_eq!(rare.postings.len(), 16);
        assert!(rare.is_sorted());
    }

    #[test]
    fn abort_leaves_no_durable_effect() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = cfg(dir.path());
        config.memory_budget_bytes = 16;
        let mut inv = Inverter::init(config).unwrap();
        for doc in 1..=20u32 {
            inv.add_term(DocId::new(doc), b"term", Position::new(1), FieldType::NONE)
                .unwrap();
        }
        assert!(!inv.run_paths.is_empty(), "expected at least one spill before abort");
        let run_paths = inv.run_paths.clone();
        inv.abort().unwrap();
        for path in run_paths {
            assert!(!path.exists());
        }
    }

    #[test]
    fn drop_without_finish_or_abort_cleans_up_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = cfg(dir.path());
        config.memory_budget_bytes = 16;
        let run_paths;
        {
            let mut inv = Inverter::init(config).unwrap();
            for doc in 1..=20u32 {
                inv.add_term(DocId::new(doc), b"term", Position::new(1), FieldType::NONE)
                    .unwrap();
            }
            run_paths = inv.run_paths.clone();
        }
        for path in run_paths {
            assert!(!path.exists());
        }
    }
}
