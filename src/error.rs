use thiserror::Error;

/// Failures that can affect a single dashboard section.
///
/// Sections keep their own copy of the error, so sources are flattened to
/// messages instead of being held as boxed errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("{table}: missing required column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table}: malformed row at line {line}: {message}")]
    Parse {
        table: &'static str,
        line: u64,
        message: String,
    },

    #[error("invalid match code `{0}`")]
    InvalidMatchCode(String),

    #[error("no unique leader ({count} rows at position 1)")]
    AmbiguousLeader { count: usize },

    #[error("no {0} to show")]
    EmptyInput(&'static str),
}
