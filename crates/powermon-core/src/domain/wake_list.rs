//! Wake list parsing and target set construction.
//!
//! The server wakes every address given inline (`--wake`) plus every address
//! in the wake list file (`--wakelist`).  The file format is deliberately
//! simple:
//!
//! ```text
//! # Rack A
//! aa:bb:cc:dd:ee:01
//!   AA-BB-CC-DD-EE-02
//!
//! # Rack B (disabled)
//! #aa:bb:cc:dd:ee:03
//! ```
//!
//! Lines are trimmed of spaces and tabs; blank lines and `#` comments are
//! skipped.  Any other line that is not a hardware address is a hard error
//! that aborts startup, reported with its 1-based line number.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::mac::{MacAddress, MacParseError};

/// Error type for wake target configuration.
#[derive(Debug, Error)]
pub enum WakeListError {
    /// The wake list file could not be read.
    #[error("failed to read wake list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line of the wake list file is not a hardware address.
    #[error("invalid mac address '{text}' on line {line} of the wake list")]
    InvalidLine { line: usize, text: String },
    /// An inline `--wake` value is not a hardware address.
    #[error(transparent)]
    InvalidInline(#[from] MacParseError),
}

/// Parses the contents of a wake list file.
///
/// Addresses are returned in file order; duplicates are kept (deduplication
/// happens in [`build_target_set`]).
///
/// # Errors
///
/// Returns [`WakeListError::InvalidLine`] for the first malformed line.
pub fn parse_wake_list(contents: &str) -> Result<Vec<MacAddress>, WakeListError> {
    let mut macs = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim_matches(|c| c == ' ' || c == '\t');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mac = line.parse().map_err(|_| WakeListError::InvalidLine {
            line: index + 1,
            text: line.to_string(),
        })?;
        macs.push(mac);
    }
    Ok(macs)
}

/// Reads and parses a wake list file.
///
/// # Errors
///
/// [`WakeListError::Io`] if the file cannot be read, otherwise as
/// [`parse_wake_list`].
pub fn load_wake_list(path: &Path) -> Result<Vec<MacAddress>, WakeListError> {
    let contents = std::fs::read_to_string(path).map_err(|source| WakeListError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_wake_list(&contents)
}

/// Builds the deduplicated wake target set from inline values and an
/// optional wake list file.
///
/// # Errors
///
/// Fails on the first malformed inline value or file line, or if the file
/// cannot be read.
pub fn build_target_set<S: AsRef<str>>(
    inline: &[S],
    file: Option<&Path>,
) -> Result<BTreeSet<MacAddress>, WakeListError> {
    let mut targets = BTreeSet::new();
    for value in inline {
        targets.insert(value.as_ref().trim().parse::<MacAddress>()?);
    }
    if let Some(path) = file {
        targets.extend(load_wake_list(path)?);
    }
    Ok(targets)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        // Arrange
        let contents = "# header\n\naa:bb:cc:dd:ee:01\n\t # indented comment\n  AA-BB-CC-DD-EE-02  \n";

        // Act
        let macs = parse_wake_list(contents).unwrap();

        // Assert
        assert_eq!(macs.len(), 2);
        assert_eq!(macs[1].to_string(), "aa:bb:cc:dd:ee:02");
    }

    #[test]
    fn test_parse_reports_line_number_of_bad_entry() {
        let contents = "aa:bb:cc:dd:ee:01\n# ok\nnot-a-mac\n";

        let err = parse_wake_list(contents).unwrap_err();

        match err {
            WakeListError::InvalidLine { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "not-a-mac");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_file_yields_no_targets() {
        assert!(parse_wake_list("").unwrap().is_empty());
    }

    #[test]
    fn test_build_target_set_deduplicates_across_sources() {
        // Arrange: the same address in two notations, once inline and once in a file
        let dir = std::env::temp_dir().join(format!("powermon-wl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dedup.txt");
        std::fs::write(&path, "AA-AA-AA-AA-AA-AA\nbb:bb:bb:bb:bb:bb\n").unwrap();

        // Act
        let targets = build_target_set(&["aa:aa:aa:aa:aa:aa"], Some(&path)).unwrap();

        // Assert
        assert_eq!(targets.len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_build_target_set_rejects_bad_inline_value() {
        let result = build_target_set(&["zz:zz"], None);
        assert!(matches!(result, Err(WakeListError::InvalidInline(_))));
    }

    #[test]
    fn test_build_target_set_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/powermon/wakelist.txt");
        let result = build_target_set::<&str>(&[], Some(path));
        assert!(matches!(result, Err(WakeListError::Io { .. })));
    }
}
