// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-memory posting-list representation and merge algebra.
//!
//! A `PostingList` is the result of a dictionary-term lookup (or of merging
//! two other posting lists). Every operator here borrows its inputs and
//! returns a new, owned list; operators never mutate `a` or `b`. All are
//! two-pointer merges over inputs already sorted by `(doc_id, position)` —
//! see `original_source/src/search/posting.h` for the C structures this
//! generalizes (an array of doc/position/weight triples plus header
//! counts), and `examples/harryzorus-sorex/src/types.rs` for the
//! `#[repr(transparent)]` newtype idiom `DocId`/`Position` follow.

use crate::error::{Error, ErrorKind, Result};

pub mod codec;

/// An externally assigned document identifier. Monotonically increasing
/// within one indexing session, not required to be dense, always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DocId(u32);

impl DocId {
    pub const fn new(value: u32) -> Self {
        DocId(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DocId {
    fn from(value: u32) -> Self {
        DocId(value)
    }
}

impl From<DocId> for u32 {
    fn from(value: DocId) -> Self {
        value.0
    }
}

/// The 1-based ordinal of a term within a document's token stream for one
/// field. Strictly increasing within a single (document, field) pair as the
/// inverter receives terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Position(u32);

impl Position {
    pub const fn new(value: u32) -> Self {
        Position(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Position {
    fn from(value: u32) -> Self {
        Position(value)
    }
}

impl From<Position> for u32 {
    fn from(value: Position) -> Self {
        value.0
    }
}

/// A small unsigned identifier for the field a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FieldId(pub u16);

/// Whether a field carries term positions and whether its tokens are
/// retained for verbatim retrieval, as a small bitflags-style struct rather
/// than a full `bitflags` dependency — two bits is all spec.md names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType(u8);

impl FieldType {
    pub const NONE: FieldType = FieldType(0);
    pub const POSITIONED: FieldType = FieldType(0b01);
    pub const STORED: FieldType = FieldType(0b10);

    pub const fn contains(self, flag: FieldType) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub const fn union(self, other: FieldType) -> FieldType {
        FieldType(self.0 | other.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// A byte-string bitset indexed by field id, used at query time to restrict
/// a term lookup to a subset of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    bits: Vec<u8>,
}

impl FieldMask {
    pub fn new() -> Self {
        FieldMask { bits: Vec::new() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        FieldMask {
            bits: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn set(&mut self, field: FieldId) {
        let byte_idx = field.0 as usize / 8;
        if byte_idx >= self.bits.len() {
            self.bits.resize(byte_idx + 1, 0);
        }
        self.bits[byte_idx] |= 1 << (field.0 % 8);
    }

    pub fn contains(&self, field: FieldId) -> bool {
        let byte_idx = field.0 as usize / 8;
        self.bits
            .get(byte_idx)
            .is_some_and(|byte| byte & (1 << (field.0 % 8)) != 0)
    }
}

/// An opaque classification tag carried by a dictionary entry and a posting
/// list's header; the core stores and compares it but assigns it no
/// built-in meaning (the tokenizer/analyzer layer above does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TermType(pub u8);

/// One occurrence of a term: which document, which position within it, and
/// the weight the scoring model assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub position: Position,
    pub weight: f32,
}

/// The fixed-size descriptor a dictionary stores as the value for a term
/// key: where its posting blob lives and two cheap-to-check summary counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictEntry {
    pub occurrence_count: u32,
    pub document_count: u32,
    pub offset: u64,
    pub length: u32,
    pub term_type: TermType,
}

impl DictEntry {
    /// Fixed-width wire form stored as a dictionary value: `1 + 4 + 4 + 8 + 4`
    /// bytes, big-endian, via [`crate::codec`] — small and fixed-size enough
    /// that varint framing would only add overhead.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = crate::codec::Writer::with_capacity(21);
        w.write_fixed_u32(self.term_type.0 as u32, 1);
        w.write_fixed_u32(self.occurrence_count, 4);
        w.write_fixed_u32(self.document_count, 4);
        w.write_fixed_u64(self.offset, 8);
        w.write_fixed_u32(self.length, 4);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = crate::codec::Reader::new(bytes);
        let term_type = TermType(r.read_fixed_u32(1)? as u8);
        let occurrence_count = r.read_fixed_u32(4)?;
        let document_count = r.read_fixed_u32(4)?;
        let offset = r.read_fixed_u64(8)?;
        let length = r.read_fixed_u32(4)?;
        Ok(DictEntry {
            occurrence_count,
            document_count,
            offset,
            length,
            term_type,
        })
    }
}

/// A complete posting list: the sequence of postings for one term, ordered
/// by `(doc_id, position)`, plus the header fields spec.md's data model
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingList {
    pub term_type: TermType,
    pub occurrence_count: u32,
    pub document_count: u32,
    pub required: bool,
    pub postings: Vec<Posting>,
}

impl PostingList {
    /// Builds a posting list from already-sorted postings, deriving the
    /// header counts from them.
    pub fn from_sorted(postings: Vec<Posting>, term_type: TermType, required: bool) -> Self {
        let occurrence_count = postings.len() as u32;
        let document_count = count_distinct_docs(&postings);
        PostingList {
            term_type,
            occurrence_count,
            document_count,
            required,
            postings,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.postings
            .windows(2)
            .all(|w| (w[0].doc_id, w[0].position) <= (w[1].doc_id, w[1].position))
    }
}

fn count_distinct_docs(postings: &[Posting]) -> u32 {
    let mut count = 0u32;
    let mut last: Option<DocId> = None;
    for p in postings {
        if last != Some(p.doc_id) {
            count += 1;
            last = Some(p.doc_id);
        }
    }
    count
}

/// Controls how an operator treats the `required` flag of its two inputs
/// during soft-Boolean evaluation. Threaded through merges unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A document must satisfy every required sub-expression to appear.
    Strict,
    /// Required is a preference, not a filter: documents satisfying more
    /// required sub-expressions rank higher, but a required hit elsewhere
    /// keeps a document in the result.
    Relaxed,
}

/// Sorts postings in place by `(doc_id, position)` ascending, the ordering
/// invariant every operator above relies on. `slice::sort_by` is a
/// pattern-defeating hybrid sort, not a literal quicksort — spec.md names
/// the *invariant* this establishes, not an implementation mandate.
pub fn sort_by_doc_id(postings: &mut [Posting]) {
    postings.sort_by(|a, b| (a.doc_id, a.position).cmp(&(b.doc_id, b.position)));
}

fn required(mode: Mode, a_required: bool, b_required: bool) -> bool {
    match mode {
        Mode::Strict => a_required && b_required,
        Mode::Relaxed => a_required || b_required,
    }
}

/// Union by document: postings from documents present in only one side
/// pass through unchanged; postings from documents present in both appear
/// from both sides, with weights summed where `(doc_id, position)`
/// collides.
pub fn or(a: &PostingList, b: &PostingList, mode: Mode) -> PostingList {
    let postings = merge_union(&a.postings, &b.postings);
    PostingList::from_sorted(postings, a.term_type, required(mode, a.required, b.required))
}

/// Inclusive-or ("should"): identical merge behavior to `or`, but signals
/// to the caller (via `required = false` regardless of mode) that a
/// document absent from every required sub-expression is still a valid
/// result — the soft-Boolean distinction lives entirely in how the query
/// engine interprets the `required` flag above this layer, since the
/// merged posting set itself is the same union.
pub fn ior(a: &PostingList, b: &PostingList, _mode: Mode) -> PostingList {
    let postings = merge_union(&a.postings, &b.postings);
    PostingList::from_sorted(postings, a.term_type, false)
}

/// Symmetric difference by document: a posting survives if its document
/// appears in exactly one of `a`, `b`.
pub fn xor(a: &PostingList, b: &PostingList, mode: Mode) -> PostingList {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    let (ap, bp) = (&a.postings, &b.postings);
    while i < ap.len() && j < bp.len() {
        match ap[i].doc_id.cmp(&bp[j].doc_id) {
            std::cmp::Ordering::Less => {
                let doc = ap[i].doc_id;
                while i < ap.len() && ap[i].doc_id == doc {
                    out.push(ap[i]);
                    i += 1;
                }
            }
            std::cmp::Ordering::Greater => {
                let doc = bp[j].doc_id;
                while j < bp.len() && bp[j].doc_id == doc {
                    out.push(bp[j]);
                    j += 1;
                }
            }
            std::cmp::Ordering::Equal => {
                let doc = ap[i].doc_id;
                while i < ap.len() && ap[i].doc_id == doc {
                    i += 1;
                }
                while j < bp.len() && bp[j].doc_id == doc {
                    j += 1;
                }
            }
        }
    }
    out.extend_from_slice(&ap[i..]);
    out.extend_from_slice(&bp[j..]);
    sort_by_doc_id(&mut out);
    PostingList::from_sorted(out, a.term_type, required(mode, a.required, b.required))
}

/// Intersection by document: only documents present in both sides survive.
/// Only `a`'s postings are emitted for a shared document, so output length
/// is bounded by `|a|`; a `b` posting at the same `(doc_id, position)` folds
/// its weight onto the matching `a` posting instead of being emitted in its
/// own right.
pub fn and(a: &PostingList, b: &PostingList, mode: Mode) -> PostingList {
    let (ap, bp) = (&a.postings, &b.postings);
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < ap.len() && j < bp.len() {
        let (doc_a, doc_b) = (ap[i].doc_id, bp[j].doc_id);
        match doc_a.cmp(&doc_b) {
            std::cmp::Ordering::Less => {
                while i < ap.len() && ap[i].doc_id == doc_a {
                    i += 1;
                }
            }
            std::cmp::Ordering::Greater => {
                while j < bp.len() && bp[j].doc_id == doc_b {
                    j += 1;
                }
            }
            std::cmp::Ordering::Equal => {
                let doc = doc_a;
                let a_start = i;
                while i < ap.len() && ap[i].doc_id == doc {
                    i += 1;
                }
                let b_start = j;
                while j < bp.len() && bp[j].doc_id == doc {
                    j += 1;
                }
                let b_slice = &bp[b_start..j];
                for pa in &ap[a_start..i] {
                    let mut merged = *pa;
                    if let Some(pb) = b_slice.iter().find(|pb| pb.position == pa.position) {
                        merged.weight += pb.weight;
                    }
                    out.push(merged);
                }
            }
        }
    }
    PostingList::from_sorted(out, a.term_type, required(mode, a.required, b.required))
}

/// Documents in `a` not present in `b`, with `a`'s weights untouched.
pub fn not(a: &PostingList, b: &PostingList, mode: Mode) -> PostingList {
    let (ap, bp) = (&a.postings, &b.postings);
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < ap.len() {
        let doc = ap[i].doc_id;
        while j < bp.len() && bp[j].doc_id < doc {
            j += 1;
        }
        let excluded = j < bp.len() && bp[j].doc_id == doc;
        while i < ap.len() && ap[i].doc_id == doc {
            if !excluded {
                out.push(ap[i]);
            }
            i += 1;
        }
    }
    PostingList::from_sorted(out, a.term_type, required(mode, a.required, b.required))
}

/// Documents containing at least one pair `(p_a, p_b)` in the same document
/// with `p_b.position - p_a.position == distance`. Emits the `a`-posting
/// with weight `a.weight + b.weight` — one output posting per qualifying
/// `a`-posting (Open Question (b)'s resolution).
pub fn adj(a: &PostingList, b: &PostingList, distance: i64, mode: Mode) -> PostingList {
    proximity(a, b, mode, |pa, pb| {
        pb.position.get() as i64 - pa.position.get() as i64 == distance
    })
}

/// Documents containing at least one pair with
/// `|p_b.position - p_a.position| <= distance`; if `ordered`, additionally
/// requires `p_a.position <= p_b.position`.
pub fn near(a: &PostingList, b: &PostingList, distance: u32, ordered: bool, mode: Mode) -> PostingList {
    proximity(a, b, mode, |pa, pb| {
        let delta = pb.position.get() as i64 - pa.position.get() as i64;
        if ordered && delta < 0 {
            return false;
        }
        delta.unsigned_abs() <= distance as u64
    })
}

/// Shared two-cursor scan for the proximity operators: within each document
/// shared by `a` and `b`, pair every `a`-posting against every `b`-posting
/// and keep the `a`-posting once for every qualifying pair.
fn proximity(
    a: &PostingList,
    b: &PostingList,
    mode: Mode,
    predicate: impl Fn(&Posting, &Posting) -> bool,
) -> PostingList {
    let (ap, bp) = (&a.postings, &b.postings);
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < ap.len() && j < bp.len() {
        let (doc_a, doc_b) = (ap[i].doc_id, bp[j].doc_id);
        match doc_a.cmp(&doc_b) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let doc = doc_a;
                let a_start = i;
                while i < ap.len() && ap[i].doc_id == doc {
                    i += 1;
                }
                let b_start = j;
                while j < bp.len() && bp[j].doc_id == doc {
                    j += 1;
                }
                for pa in &ap[a_start..i] {
                    for pb in &bp[b_start..j] {
                        if predicate(pa, pb) {
                            out.push(Posting {
                                doc_id: pa.doc_id,
                                position: pa.position,
                                weight: pa.weight + pb.weight,
                            });
                        }
                    }
                }
            }
        }
    }
    sort_by_doc_id(&mut out);
    PostingList::from_sorted(out, a.term_type, required(mode, a.required, b.required))
}

/// Merges two posting sequences already sorted by `(doc_id, position)`,
/// summing weights where `(doc_id, position)` collides and interleaving
/// (preserving position order) otherwise. Shared by `or`/`and`/`xor`.
fn merge_union(a: &[Posting], b: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let ka = (a[i].doc_id, a[i].position);
        let kb = (b[j].doc_id, b[j].position);
        match ka.cmp(&kb) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(Posting {
                    doc_id: a[i].doc_id,
                    position: a[i].position,
                    weight: a[i].weight + b[j].weight,
                });
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Validates that a callback-driven scan/merge didn't request a width or
/// mode the core doesn't support. Kept for symmetry with the dictionary and
/// trie modules' validation entry points; posting operators currently have
/// no invalid-argument path of their own beyond this.
pub fn validate_mode(mode_byte: u8) -> Result<Mode> {
    match mode_byte {
        0 => Ok(Mode::Strict),
        1 => Ok(Mode::Relaxed),
        _ => Err(Error::new(
            ErrorKind::InvalidMode,
            format!("unknown mode byte {mode_byte}"),
        )),
    }
}
