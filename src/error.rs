// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The discriminated result type shared by every module in this crate.
//!
//! Every fallible operation in `postdex` returns [`Result<T>`], carrying one
//! [`ErrorKind`] from four groups: validation (bad input, always the
//! caller's to recover from), I/O (open/seek/read/write/rename/mmap
//! failures), state (not-found, a requested stop, a version mismatch — all
//! normal, non-crashing outcomes), and resource exhaustion (out of memory,
//! out of temporary disk space). A build operation that fails this way
//! removes whatever partial file or run directory it had started; a search
//! operation that fails leaves prior results untouched. The crate never
//! aborts the process on any of these.

use std::fmt;
use std::io;
use std::path::Path;

/// The four groups of failure this crate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Validation: always the caller's to fix, never a sign of a corrupt file.
    InvalidKey,
    InvalidLength,
    InvalidMode,
    InvalidCallback,

    // I/O: something about the filesystem or the bytes on disk is wrong.
    Open,
    Seek,
    ShortWrite,
    ShortRead,
    Rename,
    Mmap,

    // State: negative or cooperative outcomes, not crashes.
    NotFound,
    Stopped,
    VersionMismatch,

    // Resource: the environment ran out of something.
    OutOfMemory,
    OutOfTempSpace,
}

/// An error with a kind plus enough loggable context (operation, path,
/// offset) to make sense of it without a debugger.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn invalid_key(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidKey, context)
    }

    pub fn invalid_length(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidLength, context)
    }

    pub fn invalid_mode(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidMode, context)
    }

    pub fn short_read(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::ShortRead, context)
    }

    pub fn version_mismatch(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::VersionMismatch, context)
    }

    pub fn open(path: &Path, source: &io::Error) -> Self {
        Error::new(
            ErrorKind::Open,
            format!("open {}: {}", path.display(), source),
        )
    }

    pub fn mmap(path: &Path, source: &io::Error) -> Self {
        Error::new(
            ErrorKind::Mmap,
            format!("mmap {}: {}", path.display(), source),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::Open,
            io::ErrorKind::UnexpectedEof => ErrorKind::ShortRead,
            io::ErrorKind::WriteZero => ErrorKind::ShortWrite,
            _ => ErrorKind::Open,
        };
        Error::new(kind, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
