// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Prefix-compressed dictionary, posting lists, and merge algebra for a
//! text search engine core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   codec     │────▶│    dict      │────▶│   posting   │
//! │ (varint,    │     │ (two-level,  │     │ (merge      │
//! │  fixed-width│     │  prefix-     │     │  algebra,   │
//! │  encoding)  │     │  compressed) │     │  wire codec)│
//! └─────────────┘     └──────────────┘     └─────────────┘
//!        │                   ▲                    ▲
//!        │                   │                    │
//!        ▼                   │                    │
//! ┌─────────────┐     ┌──────┴───────────────────┴┐
//! │    trie     │────▶│          inverter          │
//! │ (in-memory  │     │ (streaming build, spill,   │
//! │  key set)   │     │  k-way run merge)          │
//! └─────────────┘     └────────────────────────────┘
//!                                    │
//!                                    ▼
//!                             ┌─────────────┐
//!                             │   session   │
//!                             │ (versioned  │
//!                             │  sidecar)   │
//!                             └─────────────┘
//! ```
//!
//! `weight` sits alongside `posting`, operating on dense per-document score
//! vectors rather than sparse posting lists. `error` defines the
//! [`Result`](error::Result) type every fallible operation in this crate
//! returns.
//!
//! # Usage
//!
//! ```ignore
//! use postdex::inverter::{Inverter, InverterConfig};
//! use postdex::posting::{DocId, FieldType, Position};
//!
//! let mut inv = Inverter::init(InverterConfig::new("/tmp/build"))?;
//! inv.add_term(DocId::new(1), b"search", Position::new(1), FieldType::POSITIONED)?;
//! let stats = inv.finish("/tmp/index.dict", "/tmp/index.post")?;
//! ```

pub mod codec;
pub mod dict;
pub mod error;
pub mod inverter;
pub mod posting;
pub mod session;
pub mod testing;
pub mod trie;
pub mod weight;

pub use error::{Error, ErrorKind, Result};
