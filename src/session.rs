// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The thin session object spec.md §6 describes: everything an index build
//! or an index open needs to agree on besides the dictionary and posting
//! files themselves.
//!
//! Persisted as a `<index>.info.json` sidecar via `serde_json`, the same
//! mechanism the teacher crate uses for its own index-adjacent metadata.
//! Grounded additionally on `original_source/src/search/version.c`, which
//! hard-codes a version triple into every build and rejects a mismatched one
//! on open — `Session::check_compatible` reproduces that check.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current crate version, written into every session a build creates.
pub const CURRENT_VERSION: Version = Version {
    major: 0,
    minor: 1,
    patch: 0,
};

/// A `(major, minor, patch)` triple. Two versions are compatible when their
/// `major` and `minor` components match; `patch` is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Version { major, minor, patch }
    }

    pub fn is_compatible_with(&self, other: &Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

/// The identifying facts one index build session agrees on: where the index
/// lives, which external language facilities produced its terms, the term
/// length bounds the inverter enforced, and the crate version that wrote it.
///
/// `language_code`, `tokenizer_name`, `stemmer_name`, and `stoplist_name`
/// name external collaborators (spec.md §6); this crate stores and persists
/// them but never resolves or invokes them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub index_path: PathBuf,
    pub language_code: String,
    pub tokenizer_name: String,
    pub stemmer_name: String,
    pub stoplist_name: String,
    pub min_term_length: u32,
    pub max_term_length: u32,
    pub version: Version,
}

impl Session {
    /// Builds a new session for an index about to be created, stamped with
    /// this crate's current version.
    pub fn new(
        index_path: impl Into<PathBuf>,
        language_code: impl Into<String>,
        tokenizer_name: impl Into<String>,
        stemmer_name: impl Into<String>,
        stoplist_name: impl Into<String>,
        min_term_length: u32,
        max_term_length: u32,
    ) -> Result<Self> {
        if min_term_length == 0 || min_term_length > max_term_length {
            return Err(Error::invalid_length(format!(
                "min_term_length {min_term_length} must be nonzero and <= max_term_length {max_term_length}"
            )));
        }
        Ok(Session {
            index_path: index_path.into(),
            language_code: language_code.into(),
            tokenizer_name: tokenizer_name.into(),
            stemmer_name: stemmer_name.into(),
            stoplist_name: stoplist_name.into(),
            min_term_length,
            max_term_length,
            version: CURRENT_VERSION,
        })
    }

    /// The sidecar path a session at `index_path` is written to and read
    /// from: `<index_path>.info.json`.
    pub fn info_path(index_path: &Path) -> PathBuf {
        let mut os = index_path.as_os_str().to_owned();
        os.push(".info.json");
        PathBuf::from(os)
    }

    /// Serializes this session to its sidecar file next to `index_path`.
    pub fn save(&self) -> Result<()> {
        let path = Self::info_path(&self.index_path);
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::invalid_length(format!("failed to serialize session: {e}")))?;
        fs::write(&path, json).map_err(|e| Error::open(&path, &e))
    }

    /// Loads a session from the sidecar next to `index_path`, rejecting one
    /// whose `(major, minor)` doesn't match this crate's current version.
    pub fn load(index_path: impl Into<PathBuf>) -> Result<Self> {
        let index_path = index_path.into();
        let path = Self::info_path(&index_path);
        let bytes = fs::read(&path).map_err(|e| Error::open(&path, &e))?;
        let session: Session = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_length(format!("malformed session sidecar: {e}")))?;
        session.check_compatible(&CURRENT_VERSION)?;
        Ok(session)
    }

    /// Rejects a session whose major/minor version doesn't match `reader_version`.
    pub fn check_compatible(&self, reader_version: &Version) -> Result<()> {
        if self.version.is_compatible_with(reader_version) {
            Ok(())
        } else {
            Err(Error::version_mismatch(format!(
                "index built with version {}.{}.{}, reader is {}.{}.{}",
                self.version.major,
                self.version.minor,
                self.version.patch,
                reader_version.major,
                reader_version.minor,
                reader_version.patch,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(dir: &Path) -> Session {
        Session::new(
            dir.join("index"),
            "en",
            "unicode61",
            "porter",
            "default",
            1,
            1023,
        )
        .unwrap()
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_at(dir.path());
        session.save().unwrap();

        let loaded = Session::load(dir.path().join("index")).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn rejects_incompatible_major_minor() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_at(dir.path());
        session.version = Version::new(CURRENT_VERSION.major + 1, 0, 0);
        session.save().unwrap();

        let err = Session::load(dir.path().join("index")).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::VersionMismatch);
    }

    #[test]
    fn patch_mismatch_is_still_compatible() {
        let a = Version::new(1, 2, 3);
        let b = Version::new(1, 2, 99);
        assert!(a.is_compatible_with(&b));
    }

    #[test]
    fn rejects_invalid_term_length_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::new(dir.path().join("index"), "en", "t", "s", "l", 10, 5).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidLength);
    }

    #[test]
    fn info_path_appends_suffix() {
        let p = Session::info_path(Path::new("/tmp/myindex"));
        assert_eq!(p, PathBuf::from("/tmp/myindex.info.json"));
    }
}
