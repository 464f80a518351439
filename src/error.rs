//! Error types for vcfcodec.

use thiserror::Error;

/// Result type alias for vcfcodec operations.
pub type Result<T> = std::result::Result<T, VcfError>;

/// A single header line that failed validation against a target version,
/// together with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineViolation {
    /// Serialized text of the offending header line.
    pub line: String,
    /// Why the line is invalid for the target version.
    pub message: String,
}

/// Error types that can occur while decoding or encoding VCF data.
#[derive(Debug, Error)]
pub enum VcfError {
    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed header metadata line.
    #[error("invalid VCF header line `{line}`: {reason}")]
    HeaderParse {
        /// Offending header-line text (without the `##` prefix).
        line: String,
        /// Error message.
        reason: String,
    },

    /// The header as a whole is malformed (missing version line, bad
    /// column header, duplicate samples, ...).
    #[error("invalid VCF header: {0}")]
    HeaderFormat(String),

    /// One or more header lines violate the rules of a target version.
    ///
    /// Violations are collected rather than failing fast, so all of them
    /// can be reported together.
    #[error("{} header line(s) invalid for {target}: {}", violations.len(),
            violations.iter().map(|v| format!("`{}` ({})", v.line, v.message))
                .collect::<Vec<_>>().join("; "))]
    VersionValidation {
        /// Literal of the version the lines were validated against.
        target: String,
        /// Every line that failed, with its reason.
        violations: Vec<LineViolation>,
    },

    /// Malformed field inside a data record. Fatal for that record.
    #[error("invalid {field} at line {line}: {reason}")]
    InvalidField {
        /// Name of the field (POS, REF, FILTER, ...).
        field: &'static str,
        /// 1-based line number, best effort.
        line: u64,
        /// Error message.
        reason: String,
    },

    /// A data line had the wrong number of tab-delimited columns.
    #[error("expected {expected} columns but found {actual} at line {line}")]
    ColumnCount {
        /// Expected column count per the header.
        expected: usize,
        /// Actual column count on the line.
        actual: usize,
        /// 1-based line number.
        line: u64,
    },

    /// A record cannot be serialized against the target header.
    #[error("cannot encode record: {0}")]
    Encode(String),

    /// Header merging failed.
    #[error("cannot merge VCF headers: {0}")]
    Merge(String),
}

impl VcfError {
    /// Convenience constructor for header-line parse failures.
    pub(crate) fn header_parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        VcfError::HeaderParse {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for record field failures.
    pub(crate) fn field(field: &'static str, line: u64, reason: impl Into<String>) -> Self {
        VcfError::InvalidField {
            field,
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_names_line_number() {
        let err = VcfError::field("POS", 42, "not a number");
        assert_eq!(err.to_string(), "invalid POS at line 42: not a number");
    }

    #[test]
    fn version_validation_lists_every_violation() {
        let err = VcfError::VersionValidation {
            target: "VCFv4.3".to_string(),
            violations: vec![
                LineViolation {
                    line: "INFO=<ID=a b>".to_string(),
                    message: "bad ID".to_string(),
                },
                LineViolation {
                    line: "FORMAT=<ID=1X>".to_string(),
                    message: "bad ID".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 header line(s)"));
        assert!(text.contains("INFO=<ID=a b>"));
        assert!(text.contains("FORMAT=<ID=1X>"));
    }
}
