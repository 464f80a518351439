//! Variant record domain model.
//!
//! A [`VariantRecord`] is the decoded form of one VCF data line: contig,
//! position range, alleles, quality, filter status, INFO attributes, and
//! a lazily decoded genotype block.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::record::Allele;
//!
//! let alt = Allele::parse("T", false, 1).unwrap();
//! assert_eq!(alt, Allele::Bases("T".to_string()));
//!
//! let sv = Allele::parse("<DEL>", false, 1).unwrap();
//! assert!(sv.is_symbolic());
//!
//! // Symbolic alleles are never valid as REF.
//! assert!(Allele::parse("<DEL>", true, 1).is_err());
//! ```

use crate::error::{Result, VcfError};
use crate::genotype::GenotypeBlock;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A reference or alternate allele.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Allele {
    /// The `.` no-call marker.
    NoCall,
    /// Literal bases (`ACGTN`, uppercased; `*` for spanning deletions).
    Bases(String),
    /// Symbolic (`<TAG>`) or breakend (`[`/`]`) alternate allele.
    Symbolic(String),
}

impl Allele {
    /// Parse and validate one allele.
    ///
    /// `is_ref` enables the stricter reference-position rules: REF must
    /// be literal bases, never symbolic, never missing.
    ///
    /// # Errors
    ///
    /// Empty text, unacceptable bases, VCF3-style indel markers, and
    /// symbolic alleles in REF position are all fatal, with the 1-based
    /// `line` number in the message.
    pub fn parse(text: &str, is_ref: bool, line: u64) -> Result<Allele> {
        let field = if is_ref { "REF" } else { "ALT" };
        if text.is_empty() {
            return Err(VcfError::field(field, line, "empty allele"));
        }
        if text == "." {
            if is_ref {
                return Err(VcfError::field(field, line, "REF allele cannot be missing"));
            }
            return Ok(Allele::NoCall);
        }
        if text == "*" {
            if is_ref {
                return Err(VcfError::field(
                    field,
                    line,
                    "spanning-deletion allele `*` is only permitted as ALT",
                ));
            }
            return Ok(Allele::Bases("*".to_string()));
        }
        if text.starts_with('<') || text.contains('[') || text.contains(']') {
            if is_ref {
                return Err(VcfError::field(
                    field,
                    line,
                    format!("symbolic allele `{text}` is only permitted as ALT"),
                ));
            }
            if text.starts_with('<') && (!text.ends_with('>') || text.len() < 3) {
                return Err(VcfError::field(
                    field,
                    line,
                    format!("malformed symbolic allele `{text}`"),
                ));
            }
            return Ok(Allele::Symbolic(text.to_string()));
        }
        // VCF 3.x wrote indels as I<bases> / D<count>; that representation
        // is long gone and silently misreads as bases.
        if text.starts_with('I') || text.starts_with('D') {
            return Err(VcfError::field(
                field,
                line,
                format!(
                    "`{text}` looks like a VCF3.x indel; convert the file to VCF4.x representation"
                ),
            ));
        }
        if !text
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'N'))
        {
            return Err(VcfError::field(
                field,
                line,
                format!("unacceptable base(s) in allele `{text}`"),
            ));
        }
        Ok(Allele::Bases(text.to_ascii_uppercase()))
    }

    /// True for `<TAG>`/breakend alleles.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Allele::Symbolic(_))
    }

    /// True for the no-call marker.
    pub fn is_no_call(&self) -> bool {
        matches!(self, Allele::NoCall)
    }

    /// Textual form as written in a VCF line.
    pub fn as_text(&self) -> &str {
        match self {
            Allele::NoCall => ".",
            Allele::Bases(bases) => bases,
            Allele::Symbolic(text) => text,
        }
    }

    /// Number of literal bases; 0 for no-call and symbolic alleles.
    pub fn len(&self) -> usize {
        match self {
            Allele::Bases(bases) => bases.len(),
            _ => 0,
        }
    }

    /// True when the allele has no literal bases.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One INFO value, shaped by the header's declared type for its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    /// Key declared `Type=Flag`, present on the record.
    Flag,
    /// The `.` missing-value sentinel.
    Missing,
    /// A single value.
    Scalar(String),
    /// A comma-separated list of values.
    List(Vec<String>),
}

impl InfoValue {
    /// The scalar text, if this is a scalar value.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            InfoValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Parse the scalar as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_scalar()?.parse().ok()
    }

    /// Parse the scalar as a float.
    pub fn as_float(&self) -> Option<f64> {
        self.as_scalar()?.parse().ok()
    }
}

/// A decoded variant record.
///
/// `filters` semantics: `None` means the site was never filtered (`.`),
/// an empty set means it passed (`PASS`), a non-empty set names the
/// failed filters. The set is shared via [`Arc`] so the decoder can hand
/// out one cached set per distinct raw FILTER string.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Contig name (CHROM).
    pub chrom: String,
    /// 1-based start position (POS).
    pub start: u64,
    /// 1-based inclusive stop: INFO `END` when declared, else
    /// `start + len(REF) - 1`.
    pub stop: u64,
    /// Record identifier, `None` for `.`.
    pub id: Option<String>,
    /// Reference allele.
    pub reference: Allele,
    /// Alternate alleles in column order (no-calls dropped).
    pub alternates: Vec<Allele>,
    /// QUAL converted to log10 probability of error (`QUAL / -10`);
    /// `None` for missing.
    pub log10_error: Option<f64>,
    /// Filter status; see type-level docs.
    pub filters: Option<Arc<BTreeSet<String>>>,
    /// INFO attributes in record order.
    pub info: Vec<(String, InfoValue)>,
    /// Lazily decoded genotype block.
    pub genotypes: GenotypeBlock,
}

impl VariantRecord {
    /// All alleles, reference first.
    pub fn alleles(&self) -> impl Iterator<Item = &Allele> {
        std::iter::once(&self.reference).chain(self.alternates.iter())
    }

    /// Total allele count, reference included.
    pub fn allele_count(&self) -> usize {
        1 + self.alternates.len()
    }

    /// INFO lookup by key.
    pub fn info_get(&self, key: &str) -> Option<&InfoValue> {
        self.info.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Phred-scaled quality (the QUAL column value), if present.
    pub fn qual(&self) -> Option<f64> {
        self.log10_error.map(|e| e * -10.0)
    }

    /// True when the record passed all filters (`PASS`).
    pub fn passed(&self) -> bool {
        matches!(&self.filters, Some(set) if set.is_empty())
    }

    /// True when the site was never filtered (`.`).
    pub fn unfiltered(&self) -> bool {
        self.filters.is_none()
    }
}
