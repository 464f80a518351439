//! VCF header: metadata line collection, sample list, and version.
//!
//! A header is parsed once per input stream and then consulted by the
//! record decoder for every data line: INFO/FORMAT declarations drive
//! type coercion, the sample list drives genotype column alignment.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::header::VcfHeader;
//! use vcfcodec::version::VcfVersion;
//!
//! let text = [
//!     "##fileformat=VCFv4.2",
//!     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878",
//! ];
//! let header = VcfHeader::parse(&text).unwrap();
//!
//! assert_eq!(header.version(), VcfVersion::V4_2);
//! assert_eq!(header.samples(), &["NA12878".to_string()]);
//! assert_eq!(header.column_count(), 10);
//! assert!(header.info("DP").is_some());
//! ```

pub mod collection;
pub mod line;
pub mod merge;

pub use collection::HeaderLineCollection;
pub use line::{CompoundKind, CompoundLine, FieldCount, HeaderLine, StructuredLine, ValueType};
pub use merge::merge_headers;

use crate::config::DecodeOptions;
use crate::error::{Result, VcfError};
use crate::percent::percent_decode;
use crate::version::VcfVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// The eight mandatory column names, in order.
pub const COLUMN_NAMES: [&str; 8] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
];

/// A parsed VCF header.
#[derive(Debug, Clone)]
pub struct VcfHeader {
    lines: HeaderLineCollection,
    samples: Arc<Vec<String>>,
    sample_index: HashMap<String, usize>,
    samples_resorted: bool,
}

impl VcfHeader {
    /// Parse the textual header: all `##` metadata lines followed by the
    /// single `#CHROM` column header line.
    ///
    /// # Errors
    ///
    /// The first line must declare the version; duplicate version lines,
    /// a malformed column header, duplicate sample names, and any
    /// metadata parse failure are fatal.
    pub fn parse<S: AsRef<str>>(text: &[S]) -> Result<VcfHeader> {
        Self::parse_with_options(text, DecodeOptions::default())
    }

    /// [`VcfHeader::parse`] with explicit strictness options.
    pub fn parse_with_options<S: AsRef<str>>(
        text: &[S],
        options: DecodeOptions,
    ) -> Result<VcfHeader> {
        let first = text
            .first()
            .map(AsRef::as_ref)
            .ok_or_else(|| VcfError::HeaderFormat("empty header".to_string()))?;
        let version = VcfVersion::from_header_line(first)?;
        let mut lines = HeaderLineCollection::with_options(version, options);
        let mut columns: Option<&str> = None;

        for raw in &text[1..] {
            let raw = raw.as_ref();
            if let Some(body) = raw.strip_prefix("##") {
                if columns.is_some() {
                    return Err(VcfError::HeaderFormat(
                        "metadata line after the column header line".to_string(),
                    ));
                }
                if body
                    .split_once('=')
                    .is_some_and(|(key, _)| VcfVersion::is_format_key(key))
                {
                    return Err(VcfError::HeaderFormat(
                        "multiple version lines".to_string(),
                    ));
                }
                let line = parse_metadata_line(body, version)?;
                lines.add_line(line)?;
            } else if raw.starts_with('#') {
                if columns.is_some() {
                    return Err(VcfError::HeaderFormat(
                        "more than one column header line".to_string(),
                    ));
                }
                columns = Some(raw);
            } else {
                return Err(VcfError::HeaderFormat(format!(
                    "unexpected data line inside header: `{raw}`"
                )));
            }
        }

        let columns = columns.ok_or_else(|| {
            VcfError::HeaderFormat("missing #CHROM column header line".to_string())
        })?;
        let samples = parse_column_header(columns)?;
        VcfHeader::new(lines, samples)
    }

    /// Assemble a header from an existing line collection and sample
    /// list (used after merging, or when injecting a header wholesale).
    ///
    /// # Errors
    ///
    /// Sample names must be unique.
    pub fn new(lines: HeaderLineCollection, samples: Vec<String>) -> Result<VcfHeader> {
        let mut sample_index = HashMap::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            if sample_index.insert(sample.clone(), i).is_some() {
                return Err(VcfError::HeaderFormat(format!(
                    "duplicate sample name `{sample}`"
                )));
            }
        }
        Ok(VcfHeader {
            lines,
            samples: Arc::new(samples),
            sample_index,
            samples_resorted: false,
        })
    }

    /// Mark the header as having had its sample order changed relative to
    /// the source file. Decoders then materialize genotypes eagerly so
    /// the sample-to-column mapping stays correct.
    pub fn mark_samples_resorted(&mut self) {
        self.samples_resorted = true;
    }

    /// Whether sample order was changed after parse.
    pub fn samples_resorted(&self) -> bool {
        self.samples_resorted
    }

    /// The header version.
    pub fn version(&self) -> VcfVersion {
        self.lines.version()
    }

    /// Upgrade the header version; see
    /// [`HeaderLineCollection::set_version`].
    pub fn set_version(&mut self, version: VcfVersion) -> Result<()> {
        self.lines.set_version(version)
    }

    /// Sample names in genotype-column order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Shared handle to the sample list (cheap clone for decode contexts).
    pub fn samples_shared(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.samples)
    }

    /// Column index of a sample name (cached reverse lookup).
    pub fn sample_index(&self, name: &str) -> Option<usize> {
        self.sample_index.get(name).copied()
    }

    /// Total column count of a conforming data line: 8, plus FORMAT and
    /// one column per sample when samples are present.
    pub fn column_count(&self) -> usize {
        if self.samples.is_empty() {
            8
        } else {
            9 + self.samples.len()
        }
    }

    /// The metadata line collection.
    pub fn lines(&self) -> &HeaderLineCollection {
        &self.lines
    }

    /// Mutable access to the metadata line collection.
    pub fn lines_mut(&mut self) -> &mut HeaderLineCollection {
        &mut self.lines
    }

    /// INFO declaration lookup.
    pub fn info(&self, id: &str) -> Option<&CompoundLine> {
        self.lines.get("INFO", id).and_then(HeaderLine::as_compound)
    }

    /// FORMAT declaration lookup.
    pub fn format(&self, id: &str) -> Option<&CompoundLine> {
        self.lines
            .get("FORMAT", id)
            .and_then(HeaderLine::as_compound)
    }

    /// FILTER declaration lookup.
    pub fn filter(&self, id: &str) -> Option<&StructuredLine> {
        self.lines
            .get("FILTER", id)
            .and_then(HeaderLine::as_structured)
    }

    /// Contig declaration lookup.
    pub fn contig(&self, id: &str) -> Option<&StructuredLine> {
        self.lines
            .get("contig", id)
            .and_then(HeaderLine::as_structured)
    }

    /// The sequence dictionary, in input order.
    pub fn contigs(&self) -> impl Iterator<Item = &StructuredLine> {
        self.lines.contigs()
    }

    /// Serialize the full header: version line, metadata lines in input
    /// order, column header last.
    pub fn to_header_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 2);
        out.push(self.version().header_line());
        let encode = self.version().percent_encoding();
        for line in self.lines.iter() {
            match line {
                HeaderLine::Unstructured { key, value } if encode => {
                    out.push(format!("##{key}={}", crate::percent::percent_encode(value)));
                }
                _ => out.push(line.to_string()),
            }
        }
        let mut columns = COLUMN_NAMES.join("\t");
        if !self.samples.is_empty() {
            columns.push_str("\tFORMAT");
            for sample in self.samples.iter() {
                columns.push('\t');
                columns.push_str(sample);
            }
        }
        out.push(columns);
        out
    }
}

fn parse_metadata_line(body: &str, version: VcfVersion) -> Result<HeaderLine> {
    let line = HeaderLine::parse(body, version)?;
    // 4.3 percent-encodes reserved characters in unstructured free text.
    if version.percent_encoding() {
        if let HeaderLine::Unstructured { key, value } = &line {
            let decoded = percent_decode(value)?;
            if decoded != *value {
                return Ok(HeaderLine::Unstructured {
                    key: key.clone(),
                    value: decoded.into_owned(),
                });
            }
        }
    }
    Ok(line)
}

fn parse_column_header(line: &str) -> Result<Vec<String>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < COLUMN_NAMES.len() {
        return Err(VcfError::HeaderFormat(format!(
            "column header has {} fields, expected at least {}",
            fields.len(),
            COLUMN_NAMES.len()
        )));
    }
    for (expected, actual) in COLUMN_NAMES.iter().zip(&fields) {
        if expected != actual {
            return Err(VcfError::HeaderFormat(format!(
                "column header field `{actual}` does not match required `{expected}`"
            )));
        }
    }
    match fields.get(8) {
        None => Ok(Vec::new()),
        Some(&"FORMAT") if fields.len() > 9 => {
            Ok(fields[9..].iter().map(|s| s.to_string()).collect())
        }
        Some(&"FORMAT") => Err(VcfError::HeaderFormat(
            "FORMAT column declared without any samples".to_string(),
        )),
        Some(other) => Err(VcfError::HeaderFormat(format!(
            "expected FORMAT in column 9, found `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &[&str] = &[
        "##fileformat=VCFv4.2",
        "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
        "##FILTER=<ID=q10,Description=\"Quality below 10\">",
        "##contig=<ID=chr1,length=1000>",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2",
    ];

    #[test]
    fn parses_basic_header() {
        let header = VcfHeader::parse(BASIC).unwrap();
        assert_eq!(header.version(), VcfVersion::V4_2);
        assert_eq!(header.samples(), &["S1".to_string(), "S2".to_string()]);
        assert_eq!(header.column_count(), 11);
        assert_eq!(header.sample_index("S2"), Some(1));
        assert!(header.info("DP").is_some());
        assert!(header.format("GT").is_some());
        assert!(header.filter("q10").is_some());
        assert_eq!(header.contig("chr1").unwrap().get("length"), Some("1000"));
    }

    #[test]
    fn version_line_must_come_first() {
        let err = VcfHeader::parse(&[
            "##source=x",
            "##fileformat=VCFv4.2",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn duplicate_version_lines_are_fatal() {
        let err = VcfHeader::parse(&[
            "##fileformat=VCFv4.2",
            "##fileformat=VCFv4.2",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("multiple version lines"));
    }

    #[test]
    fn column_header_names_are_checked() {
        let err = VcfHeader::parse(&[
            "##fileformat=VCFv4.2",
            "#CHROM\tPOSITION\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("POSITION"));
    }

    #[test]
    fn duplicate_samples_are_fatal() {
        let err = VcfHeader::parse(&[
            "##fileformat=VCFv4.2",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS1",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate sample"));
    }

    #[test]
    fn missing_column_header_is_fatal() {
        let err = VcfHeader::parse(&["##fileformat=VCFv4.2", "##source=x"]).unwrap_err();
        assert!(err.to_string().contains("#CHROM"));
    }

    #[test]
    fn sites_only_header_has_eight_columns() {
        let header = VcfHeader::parse(&[
            "##fileformat=VCFv4.2",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap();
        assert!(header.samples().is_empty());
        assert_eq!(header.column_count(), 8);
    }

    #[test]
    fn serializes_in_input_order() {
        let header = VcfHeader::parse(BASIC).unwrap();
        let lines = header.to_header_lines();
        assert_eq!(lines[0], "##fileformat=VCFv4.2");
        assert!(lines[1].starts_with("##INFO=<ID=DP"));
        assert!(lines.last().unwrap().starts_with("#CHROM"));
        // Round-trip: reparse yields the same view.
        let reparsed = VcfHeader::parse(&lines).unwrap();
        assert_eq!(reparsed.samples(), header.samples());
        assert_eq!(reparsed.version(), header.version());
    }

    #[test]
    fn legacy_format_keyword_header() {
        let header = VcfHeader::parse(&[
            "##format=VCFv3.2",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap();
        assert_eq!(header.version(), VcfVersion::V3_2);
    }

    #[test]
    fn unstructured_values_percent_decode_at_4_3() {
        let header = VcfHeader::parse(&[
            "##fileformat=VCFv4.3",
            "##source=my%3Dprog",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        ])
        .unwrap();
        let source = header.lines().of_key("source").next().unwrap();
        match source {
            HeaderLine::Unstructured { value, .. } => assert_eq!(value, "my=prog"),
            other => panic!("unexpected line {other:?}"),
        }
    }
}
