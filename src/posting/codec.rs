// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! On-disk wire format for a posting blob: the bytes a [`super::DictEntry`]
//! points at.
//!
//! ```text
//! blob   := header , record*
//! header := u8 term_type , varint doc_count , varint occurrence_count
//! record := varint doc_id_delta , varint position_delta , fixed_u32 weight_bits
//! ```
//!
//! `doc_id_delta` is the gap from the previous record's document id (the
//! first record's delta is its absolute id, since document ids start at 1 —
//! see spec.md §3 "Document id"). `position_delta` resets to the position
//! itself at the start of each document and is the gap from the previous
//! position *within that document* otherwise, per spec.md §6: "doc_ids
//! delta-encoded as varints within a blob, positions delta-encoded within a
//! document, weights as 32-bit fixed-width." Weight is the plain IEEE-754 bit
//! pattern, not delta-encoded, matching `codec::encode_f32`.

use crate::codec::{Reader, Writer};
use crate::error::{Error, Result};

use super::{DocId, Position, Posting, PostingList, TermType};

/// Encodes `list` as a posting blob. The `required` flag is a query-time
/// property, not part of the durable format, and is dropped here; a reader
/// reconstructing a [`PostingList`] from disk sets `required` itself based on
/// the query context that triggered the lookup.
pub fn encode(list: &PostingList) -> Vec<u8> {
    let mut w = Writer::with_capacity(list.postings.len() * 6 + 9);
    w.write_fixed_u32(list.term_type.0 as u32, 1);
    w.write_varint_u32(list.document_count);
    w.write_varint_u32(list.occurrence_count);

    let mut prev_doc: u32 = 0;
    let mut prev_pos: u32 = 0;
    for posting in &list.postings {
        let doc = posting.doc_id.get();
        let pos = posting.position.get();
        if doc != prev_doc {
            w.write_varint_u32(doc - prev_doc);
            w.write_varint_u32(pos);
        } else {
            w.write_varint_u32(0);
            w.write_varint_u32(pos - prev_pos);
        }
        w.write_f32(posting.weight);
        prev_doc = doc;
        prev_pos = pos;
    }
    w.into_bytes()
}

/// Decodes a posting blob produced by [`encode`]. The returned list's
/// `required` flag is always `false`; set it explicitly at the call site if
/// the query context requires it.
pub fn decode(bytes: &[u8]) -> Result<PostingList> {
    let mut r = Reader::new(bytes);
    let term_type = TermType(r.read_fixed_u32(1)? as u8);
    let document_count = r.read_varint_u32()?;
    let occurrence_count = r.read_varint_u32()?;

    let mut postings = Vec::with_capacity(occurrence_count as usize);
    let mut doc: u32 = 0;
    let mut pos: u32 = 0;
    for _ in 0..occurrence_count {
        let doc_delta = r.read_varint_u32()?;
        let pos_field = r.read_varint_u32()?;
        if doc_delta != 0 {
            doc = doc
                .checked_add(doc_delta)
                .ok_or_else(|| Error::invalid_length("doc id overflow while decoding posting blob"))?;
            pos = pos_field;
        } else {
            pos = pos
                .checked_add(pos_field)
                .ok_or_else(|| Error::invalid_length("position overflow while decoding posting blob"))?;
        }
        let weight = r.read_f32()?;
        postings.push(Posting {
            doc_id: DocId::new(doc),
            position: Position::new(pos),
            weight,
        });
    }

    Ok(PostingList {
        term_type,
        occurrence_count,
        document_count,
        required: false,
        postings,
    })
}
