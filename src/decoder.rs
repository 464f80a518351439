//! Record decoding: raw tab-delimited line to [`VariantRecord`].
//!
//! This is the hot path. One decoder instance serves one input stream on
//! one thread: it owns mutable scratch state (the tab-split bounds
//! buffer, the FILTER string cache, the line counter) that is deliberately
//! not synchronized. Parallel decoding means one decoder per worker over
//! disjoint input chunks, never a shared instance.
//!
//! Genotype columns are not split here; the block text is captured for
//! deferred parsing (see [`crate::genotype::GenotypeBlock`]) unless the
//! header reports a resorted sample order, which forces eager decode.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::decoder::RecordDecoder;
//! use vcfcodec::header::VcfHeader;
//!
//! let header = VcfHeader::parse(&[
//!     "##fileformat=VCFv4.2",
//!     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//! ]).unwrap();
//!
//! let mut decoder = RecordDecoder::new();
//! let record = decoder
//!     .decode("chr1\t100\t.\tA\tT\t50\tPASS\tDP=10", &header)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(record.chrom, "chr1");
//! assert_eq!(record.qual(), Some(50.0));
//! ```

use crate::config::DecodeOptions;
use crate::error::{Result, VcfError};
use crate::genotype::{GenotypeBlock, GenotypeContext};
use crate::header::line::ValueType;
use crate::header::VcfHeader;
use crate::percent::percent_decode;
use crate::record::{Allele, InfoValue, VariantRecord};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// QUAL values this close to -1 are the VCF 3.x missing sentinel.
const LEGACY_MISSING_QUAL_EPSILON: f64 = 1e-6;

/// Streaming per-line decoder with private scratch state.
///
/// Not `Sync`: see the module docs for the threading contract.
#[derive(Debug)]
pub struct RecordDecoder {
    options: DecodeOptions,
    line_number: u64,
    filter_cache: HashMap<String, Arc<BTreeSet<String>>>,
    bounds: Vec<(usize, usize)>,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDecoder {
    /// Create a decoder with default options.
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    /// Create a decoder with explicit strictness options.
    pub fn with_options(options: DecodeOptions) -> Self {
        RecordDecoder {
            options,
            line_number: 0,
            filter_cache: HashMap::new(),
            bounds: Vec::with_capacity(16),
        }
    }

    /// The 1-based number of the last line handed to [`decode`].
    ///
    /// Best effort: callers re-reading lines out of band will drift it.
    ///
    /// [`decode`]: RecordDecoder::decode
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Reset the line counter (e.g. when reusing the decoder on a new
    /// stream).
    pub fn set_line_number(&mut self, line_number: u64) {
        self.line_number = line_number;
    }

    /// Decode one data line. Header-indicator (`#`) lines yield
    /// `Ok(None)`; the caller owns out-of-band handling.
    pub fn decode(&mut self, line: &str, header: &VcfHeader) -> Result<Option<VariantRecord>> {
        self.line_number += 1;
        if line.starts_with('#') {
            return Ok(None);
        }
        self.decode_record(line, header).map(Some)
    }

    fn decode_record(&mut self, line: &str, header: &VcfHeader) -> Result<VariantRecord> {
        let n = self.line_number;
        let has_samples = !header.samples().is_empty();
        let want = if has_samples { 9 } else { 8 };
        self.split_tabs(line, want);
        if self.bounds.len() != want
            || (!has_samples && line[self.bounds[want - 1].0..].contains('\t'))
        {
            return Err(VcfError::ColumnCount {
                expected: header.column_count(),
                actual: line.split('\t').count(),
                line: n,
            });
        }
        let mut fields = [(0usize, 0usize); 9];
        fields[..want].copy_from_slice(&self.bounds);
        let field = |i: usize| &line[fields[i].0..fields[i].1];

        let chrom = field(0);
        if chrom.is_empty() {
            return Err(VcfError::field("CHROM", n, "empty contig name"));
        }

        let start: u64 = field(1)
            .parse()
            .map_err(|_| VcfError::field("POS", n, format!("non-numeric value `{}`", field(1))))?;

        let id = match field(2) {
            "." => None,
            "" => return Err(VcfError::field("ID", n, "empty ID field (use `.`)")),
            text => Some(text.to_string()),
        };

        let (reference, alternates) = self.parse_alleles(field(3), field(4))?;

        let log10_error = self.parse_qual(field(5))?;
        let filters = self.parse_filters(field(6))?;
        let info = self.parse_info(field(7), header)?;

        let stop = match info.iter().find(|(k, _)| k == "END").map(|(_, v)| v) {
            Some(value) => {
                let text = value.as_scalar().unwrap_or(".");
                text.parse().map_err(|_| {
                    VcfError::field("END", n, format!("non-numeric value `{text}`"))
                })?
            }
            None => start + reference.len().max(1) as u64 - 1,
        };

        let genotypes = if has_samples {
            let mut alleles = Vec::with_capacity(1 + alternates.len());
            alleles.push(reference.clone());
            alleles.extend(alternates.iter().cloned());
            let mut block = GenotypeBlock::Unparsed {
                raw: field(8).to_string(),
                ctx: GenotypeContext {
                    alleles,
                    chrom: chrom.to_string(),
                    position: start,
                    samples: header.samples_shared(),
                    version: header.version(),
                    line_number: n,
                },
            };
            // A resorted sample list invalidates the raw column order, so
            // the deferral is unsafe; decode now.
            if header.samples_resorted() {
                block.force()?;
            }
            block
        } else {
            GenotypeBlock::Absent
        };

        Ok(VariantRecord {
            chrom: chrom.to_string(),
            start,
            stop,
            id,
            reference,
            alternates,
            log10_error,
            filters,
            info,
            genotypes,
        })
    }

    /// Split into at most `max` fields; the last field takes the
    /// remainder (keeps the genotype block unsplit for lazy decode).
    fn split_tabs(&mut self, line: &str, max: usize) {
        self.bounds.clear();
        let mut start = 0;
        for (i, b) in line.bytes().enumerate() {
            if b == b'\t' {
                self.bounds.push((start, i));
                start = i + 1;
                if self.bounds.len() == max - 1 {
                    break;
                }
            }
        }
        self.bounds.push((start, line.len()));
    }

    fn parse_alleles(&self, reference: &str, alternate: &str) -> Result<(Allele, Vec<Allele>)> {
        let n = self.line_number;
        let reference = Allele::parse(reference, true, n)?;
        let alternates = if alternate == "." {
            Vec::new()
        } else if !alternate.contains(',') {
            // Fast path: single ALT, skip the split.
            match Allele::parse(alternate, false, n)? {
                Allele::NoCall => Vec::new(),
                allele => vec![allele],
            }
        } else {
            let mut alleles = Vec::with_capacity(2);
            for token in alternate.split(',') {
                match Allele::parse(token, false, n)? {
                    // Pure no-call markers are dropped from the list.
                    Allele::NoCall => {}
                    allele => alleles.push(allele),
                }
            }
            alleles
        };
        Ok((reference, alternates))
    }

    fn parse_qual(&self, raw: &str) -> Result<Option<f64>> {
        if raw == "." {
            return Ok(None);
        }
        let qual: f64 = raw.parse().map_err(|_| {
            VcfError::field("QUAL", self.line_number, format!("non-numeric value `{raw}`"))
        })?;
        // VCF 3.x wrote -1 for missing quality.
        if (qual + 1.0).abs() < LEGACY_MISSING_QUAL_EPSILON {
            return Ok(None);
        }
        Ok(Some(qual / -10.0))
    }

    /// FILTER parsing with memoization: identical raw strings across
    /// records share one set (reference-equal via [`Arc`]).
    fn parse_filters(&mut self, raw: &str) -> Result<Option<Arc<BTreeSet<String>>>> {
        let n = self.line_number;
        match raw {
            "." => return Ok(None),
            "" => return Err(VcfError::field("FILTER", n, "empty FILTER field (use `.`)")),
            // VCF 3.x wrote 0 for pass; silently reading it as a filter
            // name would invert its meaning.
            "0" => {
                return Err(VcfError::field(
                    "FILTER",
                    n,
                    "`0` is the VCF3.x pass token; use PASS",
                ))
            }
            _ => {}
        }
        if let Some(cached) = self.filter_cache.get(raw) {
            return Ok(Some(Arc::clone(cached)));
        }
        let mut set = BTreeSet::new();
        if raw != "PASS" {
            for name in raw.split(';') {
                if name.is_empty() {
                    return Err(VcfError::field(
                        "FILTER",
                        n,
                        format!("empty filter name in `{raw}`"),
                    ));
                }
                if !set.insert(name.to_string()) {
                    tracing::warn!(filter = name, line = n, "duplicate filter name in record");
                }
            }
        }
        let set = Arc::new(set);
        self.filter_cache.insert(raw.to_string(), Arc::clone(&set));
        Ok(Some(set))
    }

    fn parse_info(&self, raw: &str, header: &VcfHeader) -> Result<Vec<(String, InfoValue)>> {
        let n = self.line_number;
        if raw == "." {
            return Ok(Vec::new());
        }
        if raw.contains(' ') {
            return Err(VcfError::field("INFO", n, "whitespace inside INFO field"));
        }
        let decode_percent = header.version().percent_encoding();
        let mut info: Vec<(String, InfoValue)> = Vec::new();
        for token in raw.split(';') {
            if token.is_empty() {
                return Err(VcfError::field(
                    "INFO",
                    n,
                    format!("empty INFO entry in `{raw}`"),
                ));
            }
            let (key, value) = match token.split_once('=') {
                Some((key, value)) => {
                    let declared_flag = header
                        .info(key)
                        .map(|l| l.value_type() == ValueType::Flag);
                    // Historical writers emitted FLAG=0 for "absent".
                    if declared_flag == Some(true) && value == "0" {
                        continue;
                    }
                    let value = if value.is_empty() || value == "." {
                        InfoValue::Missing
                    } else if value.contains(',') {
                        let mut list = Vec::new();
                        for item in value.split(',') {
                            list.push(self.decode_text(item, decode_percent)?);
                        }
                        InfoValue::List(list)
                    } else {
                        InfoValue::Scalar(self.decode_text(value, decode_percent)?)
                    };
                    (key, value)
                }
                None => {
                    let declared = header.info(token).map(|l| l.value_type());
                    match declared {
                        Some(t) if t != ValueType::Flag => {
                            tracing::warn!(
                                key = token,
                                line = n,
                                "bare INFO key declared as {}; substituting missing value",
                                t.as_str()
                            );
                            (token, InfoValue::Missing)
                        }
                        _ => (token, InfoValue::Flag),
                    }
                }
            };
            if info.iter().any(|(k, _)| k == key) {
                tracing::warn!(key, line = n, "duplicate INFO key in record; keeping the first");
                continue;
            }
            info.push((key.to_string(), value));
        }
        Ok(info)
    }

    fn decode_text(&self, text: &str, decode_percent: bool) -> Result<String> {
        if decode_percent {
            Ok(percent_decode(text)?.into_owned())
        } else {
            Ok(text.to_string())
        }
    }
}
