//! VCF specification versions and version-dependent rules.
//!
//! The VCF spec evolved through at least six versions with incompatible
//! rules (ID character sets, percent-encoding, GT placement, the symbolic
//! `Number` letters). Every version-dependent behavior in this crate is
//! dispatched through [`VcfVersion`] so the branching lives in exactly one
//! place; other modules ask this one rather than comparing ordinals ad hoc.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::version::VcfVersion;
//!
//! let v = VcfVersion::from_header_line("##fileformat=VCFv4.2").unwrap();
//! assert_eq!(v, VcfVersion::V4_2);
//! assert!(!v.percent_encoding());
//! assert!(VcfVersion::V4_3.percent_encoding());
//! assert!(VcfVersion::V4_3 > VcfVersion::V3_2);
//! ```

use crate::error::{Result, VcfError};

/// A supported VCF specification version, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VcfVersion {
    /// VCF 3.2 (header keyword `format`).
    V3_2,
    /// VCF 3.3 (header keyword `format`).
    V3_3,
    /// VCF 4.0.
    V4_0,
    /// VCF 4.1.
    V4_1,
    /// VCF 4.2.
    V4_2,
    /// VCF 4.3.
    V4_3,
}

/// All supported versions, oldest first.
pub const ALL_VERSIONS: [VcfVersion; 6] = [
    VcfVersion::V3_2,
    VcfVersion::V3_3,
    VcfVersion::V4_0,
    VcfVersion::V4_1,
    VcfVersion::V4_2,
    VcfVersion::V4_3,
];

impl VcfVersion {
    /// The metadata key carrying the version declaration.
    ///
    /// 3.x files wrote `##format=...`; 4.x files write `##fileformat=...`.
    pub fn format_key(self) -> &'static str {
        match self {
            VcfVersion::V3_2 | VcfVersion::V3_3 => "format",
            _ => "fileformat",
        }
    }

    /// The version literal as written in the header (e.g. `VCFv4.2`).
    pub fn literal(self) -> &'static str {
        match self {
            VcfVersion::V3_2 => "VCFv3.2",
            VcfVersion::V3_3 => "VCFv3.3",
            VcfVersion::V4_0 => "VCFv4.0",
            VcfVersion::V4_1 => "VCFv4.1",
            VcfVersion::V4_2 => "VCFv4.2",
            VcfVersion::V4_3 => "VCFv4.3",
        }
    }

    /// The full version header line, e.g. `##fileformat=VCFv4.2`.
    pub fn header_line(self) -> String {
        format!("##{}={}", self.format_key(), self.literal())
    }

    /// Look up a version by its literal (e.g. `VCFv4.1`).
    pub fn from_literal(literal: &str) -> Option<VcfVersion> {
        ALL_VERSIONS.iter().copied().find(|v| v.literal() == literal)
    }

    /// Parse a full `##fileformat=` / `##format=` header line.
    ///
    /// # Errors
    ///
    /// Fails if the line does not carry a version keyword or names an
    /// unsupported version literal.
    pub fn from_header_line(line: &str) -> Result<VcfVersion> {
        let body = line.strip_prefix("##").unwrap_or(line);
        let (key, value) = body.split_once('=').ok_or_else(|| {
            VcfError::header_parse(body, "expected KEY=VALUE in version line")
        })?;
        if key != "fileformat" && key != "format" {
            return Err(VcfError::header_parse(
                body,
                "first header line must declare the file format version",
            ));
        }
        VcfVersion::from_literal(value).ok_or_else(|| {
            VcfError::header_parse(body, format!("unsupported VCF version `{value}`"))
        })
    }

    /// Whether a metadata key is a version declaration (`format` or
    /// `fileformat`).
    pub fn is_format_key(key: &str) -> bool {
        key == "fileformat" || key == "format"
    }

    /// True if `self` is the same version as `other` or newer.
    pub fn at_least(self, other: VcfVersion) -> bool {
        self >= other
    }

    // --- Rule dispatch -----------------------------------------------

    /// ID character-set violations are hard failures at 4.3+ (when the
    /// caller enables strict mode); below 4.3 they only warn.
    pub fn strict_id_validation(self) -> bool {
        self >= VcfVersion::V4_3
    }

    /// Reserved characters in free-text values are percent-encoded at
    /// 4.3+ and passed through verbatim below.
    pub fn percent_encoding(self) -> bool {
        self >= VcfVersion::V4_3
    }

    /// Below 4.1 the GT genotype key is mandatory and must come first in
    /// the FORMAT list; from 4.1 it is optional (but still first when
    /// present).
    pub fn gt_must_lead(self) -> bool {
        self < VcfVersion::V4_1
    }

    /// Whether a symbolic `Number` letter is recognized at this version.
    ///
    /// `A` and `G` date from 4.0, `R` from 4.2; `.` is accepted
    /// everywhere.
    pub fn symbolic_count_allowed(self, letter: char) -> bool {
        match letter {
            '.' => true,
            'A' | 'G' => self >= VcfVersion::V4_0,
            'R' => self >= VcfVersion::V4_2,
            _ => false,
        }
    }
}

impl std::fmt::Display for VcfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.literal())
    }
}
