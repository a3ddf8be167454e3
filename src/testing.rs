// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation. It
//! provides canonical builders for postings, posting lists, and small term
//! corpora so the `tests/` suite and this crate's inline unit tests don't
//! each reinvent them.

#![doc(hidden)]

use crate::posting::{DocId, Position, Posting, PostingList, TermType};

/// Builds a single posting with the given doc id, position, and weight.
pub fn posting(doc_id: u32, position: u32, weight: f32) -> Posting {
    Posting {
        doc_id: DocId::new(doc_id),
        position: Position::new(position),
        weight,
    }
}

/// Builds a `required` posting list from `(doc_id, position, weight)`
/// triples, sorting them first so callers can list entries in whatever
/// order is convenient.
pub fn posting_list(entries: &[(u32, u32, f32)]) -> PostingList {
    let mut postings: Vec<Posting> = entries
        .iter()
        .map(|&(doc, pos, weight)| posting(doc, pos, weight))
        .collect();
    crate::posting::sort_by_doc_id(&mut postings);
    PostingList::from_sorted(postings, TermType(0), true)
}

/// A tiny in-memory corpus: `(term, doc_id, position)` triples in whatever
/// order a tokenizer might emit them, useful for driving an
/// [`crate::inverter::Inverter`] in a test without hand-writing each call.
pub fn sample_corpus() -> Vec<(&'static str, u32, u32)> {
    vec![
        ("the", 1, 1),
        ("quick", 1, 2),
        ("fox", 1, 3),
        ("the", 2, 1),
        ("lazy", 2, 2),
        ("dog", 2, 3),
        ("fox", 3, 1),
        ("jumps", 3, 2),
    ]
}
