//! Crate-level error types.

use std::fmt;

/// Errors produced by the molsync crate.
///
/// Nothing in reconciliation is user-fatal: the adapter logs and drops
/// operations it cannot apply. These values surface only from the
/// parsing entry points and from target resolution, where selecting
/// nothing silently would hide a bug.
#[derive(Debug)]
pub enum MolsyncError {
    /// An interaction or component referenced a structure label with no
    /// ready viewer identity. The operation is dropped, never thrown to
    /// the host.
    UnresolvedLabel(String),
    /// A descriptor named no structure and no default is available, so
    /// no model id can be resolved.
    AmbiguousTarget(String),
    /// A scene snapshot failed to deserialize. Unknown entry kinds
    /// reject here rather than being silently skipped.
    SnapshotParse(String),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure (options file access).
    Io(std::io::Error),
}

impl fmt::Display for MolsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedLabel(label) => {
                write!(f, "no loaded structure for label {label:?}")
            }
            Self::AmbiguousTarget(msg) => {
                write!(f, "ambiguous target: {msg}")
            }
            Self::SnapshotParse(msg) => {
                write!(f, "snapshot parse error: {msg}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MolsyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MolsyncError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
