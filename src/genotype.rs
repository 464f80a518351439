//! Genotypes and the lazy genotype block.
//!
//! The genotype columns are the wide part of a VCF line: a FORMAT key
//! list followed by one colon-delimited chunk per sample. Most consumers
//! touch only a handful of records' genotypes, so the decoder captures
//! the raw block text and defers splitting until first access via
//! [`GenotypeBlock::force`], which transitions `Unparsed` to `Parsed`
//! exactly once and caches the result.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::genotype::{expected_genotype_count, gl_to_pl};
//!
//! // Diploid, biallelic: 0/0, 0/1, 1/1.
//! assert_eq!(expected_genotype_count(2, 2), 3);
//! assert_eq!(expected_genotype_count(3, 2), 6);
//!
//! // Likelihoods rescale so the best genotype gets PL 0.
//! assert_eq!(gl_to_pl(&[-0.1, -2.0, -5.0]), vec![0, 19, 49]);
//! ```

use crate::error::{Result, VcfError};
use crate::record::Allele;
use crate::version::VcfVersion;
use std::sync::Arc;

/// Number of possible genotypes for `allele_count` alleles at the given
/// ploidy: the multiset coefficient `C(allele_count + ploidy - 1, ploidy)`.
pub fn expected_genotype_count(allele_count: usize, ploidy: u32) -> usize {
    let n = allele_count as u64 + u64::from(ploidy) - 1;
    let k = u64::from(ploidy);
    let mut result: u64 = 1;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result as usize
}

/// Convert log10 genotype likelihoods (the legacy `GL` field) to
/// phred-scaled `PL` values, normalized so the most likely genotype is 0.
pub fn gl_to_pl(gls: &[f64]) -> Vec<i32> {
    let max = gls.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    gls.iter()
        .map(|gl| (-10.0 * (gl - max)).round() as i32)
        .collect()
}

/// One sample's decoded genotype.
#[derive(Debug, Clone, PartialEq)]
pub struct Genotype {
    /// Sample (genotype column) name.
    pub sample_name: String,
    /// Called alleles, [`Allele::NoCall`] for `.` entries. Empty when the
    /// record has no GT key.
    pub alleles: Vec<Allele>,
    /// True when the GT separator was `|`.
    pub phased: bool,
    /// Genotype quality (`GQ`).
    pub gq: Option<i32>,
    /// Read depth (`DP`).
    pub dp: Option<i32>,
    /// Allelic depths (`AD`).
    pub ad: Option<Vec<i32>>,
    /// Phred-scaled genotype likelihoods (`PL`, or converted from `GL`).
    pub pl: Option<Vec<i32>>,
    /// Remaining FORMAT attributes in key order. Missing (`.`) values are
    /// not recorded.
    pub attributes: Vec<(String, String)>,
}

impl Genotype {
    /// Ploidy of the call (number of GT alleles).
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// True when every called allele is a no-call.
    pub fn is_no_call(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(Allele::is_no_call)
    }

    /// Extended attribute lookup by FORMAT key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Fluent builder for [`Genotype`].
///
/// # Examples
///
/// ```
/// use vcfcodec::genotype::GenotypeBuilder;
/// use vcfcodec::record::Allele;
///
/// let gt = GenotypeBuilder::new("NA12878")
///     .alleles(vec![Allele::Bases("A".into()), Allele::Bases("T".into())])
///     .phased(true)
///     .gq(99)
///     .dp(31)
///     .build();
/// assert_eq!(gt.ploidy(), 2);
/// assert!(gt.phased);
/// ```
#[derive(Debug, Clone)]
pub struct GenotypeBuilder {
    genotype: Genotype,
}

impl GenotypeBuilder {
    /// Start a builder for the named sample.
    pub fn new(sample_name: impl Into<String>) -> Self {
        GenotypeBuilder {
            genotype: Genotype {
                sample_name: sample_name.into(),
                alleles: Vec::new(),
                phased: false,
                gq: None,
                dp: None,
                ad: None,
                pl: None,
                attributes: Vec::new(),
            },
        }
    }

    /// Set the called alleles.
    pub fn alleles(mut self, alleles: Vec<Allele>) -> Self {
        self.genotype.alleles = alleles;
        self
    }

    /// Set phasing.
    pub fn phased(mut self, phased: bool) -> Self {
        self.genotype.phased = phased;
        self
    }

    /// Set genotype quality.
    pub fn gq(mut self, gq: i32) -> Self {
        self.genotype.gq = Some(gq);
        self
    }

    /// Set read depth.
    pub fn dp(mut self, dp: i32) -> Self {
        self.genotype.dp = Some(dp);
        self
    }

    /// Set allelic depths.
    pub fn ad(mut self, ad: Vec<i32>) -> Self {
        self.genotype.ad = Some(ad);
        self
    }

    /// Set phred-scaled likelihoods.
    pub fn pl(mut self, pl: Vec<i32>) -> Self {
        self.genotype.pl = Some(pl);
        self
    }

    /// Append an extended FORMAT attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.genotype.attributes.push((key.into(), value.into()));
        self
    }

    /// Finish the genotype.
    pub fn build(self) -> Genotype {
        self.genotype
    }
}

/// Everything the deferred parse needs from the record and header.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeContext {
    /// Record alleles, reference first (GT indices resolve against this).
    pub alleles: Vec<Allele>,
    /// Contig, for error messages.
    pub chrom: String,
    /// Position, for error messages.
    pub position: u64,
    /// Header sample names in column order.
    pub samples: Arc<Vec<String>>,
    /// Header version (GT placement rules).
    pub version: VcfVersion,
    /// 1-based line number of the record, best effort.
    pub line_number: u64,
}

/// The genotype columns of one record: absent, raw text, or decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum GenotypeBlock {
    /// Sites-only record (no FORMAT column).
    Absent,
    /// Raw `FORMAT\tsample1\t...` text, not yet split.
    Unparsed {
        /// The unsplit block text.
        raw: String,
        /// Parse context captured at decode time.
        ctx: GenotypeContext,
    },
    /// Decoded genotypes, one per header sample, together with the
    /// FORMAT keys they were decoded from.
    Parsed {
        /// FORMAT keys in column order (`GL` recorded as `PL` because
        /// likelihoods are stored phred-scaled). A key stays listed even
        /// when every sample's value for it is missing.
        keys: Vec<String>,
        /// Decoded genotypes in header sample order.
        genotypes: Vec<Genotype>,
    },
}

impl GenotypeBlock {
    /// Transition `Unparsed` to `Parsed` (at most once) and return the
    /// decoded genotypes. `Absent` yields an empty slice.
    ///
    /// # Errors
    ///
    /// Sample-chunk count mismatch, GT misplacement, and malformed
    /// GT/GQ/DP values are fatal; see [`parse_genotype_block`].
    pub fn force(&mut self) -> Result<&[Genotype]> {
        if let GenotypeBlock::Unparsed { raw, ctx } = self {
            let genotypes = parse_genotype_block(raw, ctx)?;
            let keys = format_keys_of(raw);
            *self = GenotypeBlock::Parsed { keys, genotypes };
        }
        match self {
            GenotypeBlock::Absent => Ok(&[]),
            GenotypeBlock::Parsed { genotypes, .. } => Ok(genotypes),
            GenotypeBlock::Unparsed { .. } => unreachable!("forced above"),
        }
    }

    /// FORMAT keys recorded at parse time. Empty for absent, unforced,
    /// or hand-built blocks.
    pub fn format_keys(&self) -> &[String] {
        match self {
            GenotypeBlock::Parsed { keys, .. } => keys,
            _ => &[],
        }
    }

    /// Forcing accessor; alias of [`GenotypeBlock::force`].
    pub fn genotypes(&mut self) -> Result<&[Genotype]> {
        self.force()
    }

    /// True once the block has been materialized (or was never present).
    pub fn is_parsed(&self) -> bool {
        !matches!(self, GenotypeBlock::Unparsed { .. })
    }

    /// True for sites-only records.
    pub fn is_absent(&self) -> bool {
        matches!(self, GenotypeBlock::Absent)
    }

    /// Number of genotypes without forcing: header sample count for
    /// unparsed blocks, actual count for parsed ones.
    pub fn len(&self) -> usize {
        match self {
            GenotypeBlock::Absent => 0,
            GenotypeBlock::Unparsed { ctx, .. } => ctx.samples.len(),
            GenotypeBlock::Parsed { genotypes, .. } => genotypes.len(),
        }
    }

    /// True when there are no genotype columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FORMAT keys of a raw genotype block, deduplicated, with `GL` mapped
/// to `PL` (its decoded storage).
fn format_keys_of(raw: &str) -> Vec<String> {
    let format = raw.split('\t').next().unwrap_or("");
    let mut keys: Vec<String> = Vec::new();
    for key in format.split(':') {
        let key = if key == "GL" { "PL" } else { key };
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Decode a raw genotype block (`FORMAT` column plus per-sample chunks).
pub fn parse_genotype_block(raw: &str, ctx: &GenotypeContext) -> Result<Vec<Genotype>> {
    let line = ctx.line_number;
    let mut chunks = raw.split('\t');
    let format = chunks
        .next()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| VcfError::field("FORMAT", line, "empty genotype block"))?;
    let keys: Vec<&str> = format.split(':').collect();

    let gt_index = keys.iter().position(|k| *k == "GT");
    match gt_index {
        Some(i) if i != 0 => {
            return Err(VcfError::field(
                "FORMAT",
                line,
                format!("GT must be the first genotype key, found it at position {}", i + 1),
            ));
        }
        None if ctx.version.gt_must_lead() => {
            return Err(VcfError::field(
                "FORMAT",
                line,
                format!("GT is mandatory below VCF4.1 but missing at {}:{}", ctx.chrom, ctx.position),
            ));
        }
        _ => {}
    }

    let sample_chunks: Vec<&str> = chunks.collect();
    if sample_chunks.len() != ctx.samples.len() {
        return Err(VcfError::ColumnCount {
            expected: ctx.samples.len(),
            actual: sample_chunks.len(),
            line,
        });
    }

    let mut genotypes = Vec::with_capacity(sample_chunks.len());
    for (sample, chunk) in ctx.samples.iter().zip(&sample_chunks) {
        genotypes.push(parse_sample(sample, chunk, &keys, ctx)?);
    }
    Ok(genotypes)
}

fn parse_sample(
    sample: &str,
    chunk: &str,
    keys: &[&str],
    ctx: &GenotypeContext,
) -> Result<Genotype> {
    let line = ctx.line_number;
    let values: Vec<&str> = chunk.split(':').collect();
    if values.len() > keys.len() {
        return Err(VcfError::field(
            "FORMAT",
            line,
            format!(
                "sample {sample} has {} fields but FORMAT declares {}",
                values.len(),
                keys.len()
            ),
        ));
    }

    let mut builder = GenotypeBuilder::new(sample);
    let mut gl: Option<Vec<f64>> = None;
    let mut saw_pl = false;

    // Values may run short; trailing keys are then missing, not an error.
    for (key, value) in keys.iter().zip(&values) {
        let value = *value;
        if value == "." || value.is_empty() {
            continue;
        }
        match *key {
            "GT" => {
                let (alleles, phased) = parse_gt(value, ctx)?;
                builder = builder.alleles(alleles).phased(phased);
            }
            "GQ" => {
                let gq = value.parse().map_err(|_| {
                    VcfError::field("GQ", line, format!("non-numeric value `{value}`"))
                })?;
                builder = builder.gq(gq);
            }
            "DP" => {
                let dp = value.parse().map_err(|_| {
                    VcfError::field("DP", line, format!("non-numeric value `{value}`"))
                })?;
                builder = builder.dp(dp);
            }
            // A bad entry aborts the field, not the record.
            "AD" => {
                if let Some(ad) = parse_int_list(value) {
                    builder = builder.ad(ad);
                } else {
                    tracing::warn!(sample, value, "discarding non-numeric AD field");
                }
            }
            "PL" => {
                if let Some(pl) = parse_int_list(value) {
                    builder = builder.pl(pl);
                    saw_pl = true;
                } else {
                    tracing::warn!(sample, value, "discarding non-numeric PL field");
                }
            }
            "GL" => {
                gl = parse_float_list(value);
                if gl.is_none() {
                    tracing::warn!(sample, value, "discarding non-numeric GL field");
                }
            }
            other => {
                builder = builder.attribute(other, value);
            }
        }
    }

    // Legacy GL backfills PL only when the record carried no PL itself.
    if !saw_pl {
        if let Some(gl) = gl {
            builder = builder.pl(gl_to_pl(&gl));
        }
    }

    Ok(builder.build())
}

fn parse_gt(value: &str, ctx: &GenotypeContext) -> Result<(Vec<Allele>, bool)> {
    let phased = value.contains('|');
    let mut alleles = Vec::with_capacity(2);
    for token in value.split(['/', '|']) {
        if token == "." {
            alleles.push(Allele::NoCall);
            continue;
        }
        let index: usize = token.parse().map_err(|_| {
            VcfError::field(
                "GT",
                ctx.line_number,
                format!("malformed allele index `{token}` at {}:{}", ctx.chrom, ctx.position),
            )
        })?;
        let allele = ctx.alleles.get(index).ok_or_else(|| {
            VcfError::field(
                "GT",
                ctx.line_number,
                format!(
                    "allele index {index} out of range at {}:{} ({} alleles)",
                    ctx.chrom,
                    ctx.position,
                    ctx.alleles.len()
                ),
            )
        })?;
        alleles.push(allele.clone());
    }
    Ok((alleles, phased))
}

fn parse_int_list(value: &str) -> Option<Vec<i32>> {
    value.split(',').map(|v| v.parse().ok()).collect()
}

fn parse_float_list(value: &str) -> Option<Vec<f64>> {
    value.split(',').map(|v| v.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(samples: &[&str]) -> GenotypeContext {
        GenotypeContext {
            alleles: vec![
                Allele::Bases("A".to_string()),
                Allele::Bases("T".to_string()),
            ],
            chrom: "chr1".to_string(),
            position: 100,
            samples: Arc::new(samples.iter().map(|s| s.to_string()).collect()),
            version: VcfVersion::V4_2,
            line_number: 5,
        }
    }

    #[test]
    fn genotype_count_table() {
        assert_eq!(expected_genotype_count(2, 2), 3);
        assert_eq!(expected_genotype_count(3, 2), 6);
        assert_eq!(expected_genotype_count(4, 2), 10);
        assert_eq!(expected_genotype_count(2, 1), 2);
        assert_eq!(expected_genotype_count(2, 3), 4);
    }

    #[test]
    fn parses_two_samples() {
        let c = ctx(&["S1", "S2"]);
        let genotypes = parse_genotype_block("GT:GQ\t0/1:30\t./.:.", &c).unwrap();
        assert_eq!(genotypes.len(), 2);

        assert_eq!(genotypes[0].sample_name, "S1");
        assert_eq!(
            genotypes[0].alleles,
            vec![Allele::Bases("A".to_string()), Allele::Bases("T".to_string())]
        );
        assert!(!genotypes[0].phased);
        assert_eq!(genotypes[0].gq, Some(30));

        assert!(genotypes[1].is_no_call());
        assert_eq!(genotypes[1].gq, None);
    }

    #[test]
    fn short_value_list_leaves_trailing_keys_missing() {
        let c = ctx(&["S1"]);
        let genotypes = parse_genotype_block("GT:GQ:DP\t1|1:42", &c).unwrap();
        assert!(genotypes[0].phased);
        assert_eq!(genotypes[0].gq, Some(42));
        assert_eq!(genotypes[0].dp, None);
    }

    #[test]
    fn sample_count_mismatch_is_fatal() {
        let c = ctx(&["S1", "S2"]);
        let err = parse_genotype_block("GT\t0/1", &c).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn gt_must_be_first_when_present() {
        let c = ctx(&["S1"]);
        assert!(parse_genotype_block("GQ:GT\t30:0/1", &c).is_err());
    }

    #[test]
    fn gt_mandatory_below_4_1() {
        let mut c = ctx(&["S1"]);
        c.version = VcfVersion::V4_0;
        assert!(parse_genotype_block("GQ\t30", &c).is_err());
        c.version = VcfVersion::V4_1;
        assert!(parse_genotype_block("GQ\t30", &c).is_ok());
    }

    #[test]
    fn bad_allele_index_is_fatal() {
        let c = ctx(&["S1"]);
        assert!(parse_genotype_block("GT\t0/9", &c).is_err());
        assert!(parse_genotype_block("GT\t0/x", &c).is_err());
    }

    #[test]
    fn bad_ad_aborts_field_not_record() {
        let c = ctx(&["S1"]);
        let genotypes = parse_genotype_block("GT:AD\t0/1:12,x", &c).unwrap();
        assert_eq!(genotypes[0].ad, None);
    }

    #[test]
    fn gl_converts_to_pl_only_without_pl() {
        let c = ctx(&["S1"]);
        let genotypes = parse_genotype_block("GT:GL\t0/1:-0.1,-2.0,-5.0", &c).unwrap();
        assert_eq!(genotypes[0].pl, Some(vec![0, 19, 49]));

        let genotypes = parse_genotype_block("GT:PL:GL\t0/1:1,2,3:-0.1,-2.0,-5.0", &c).unwrap();
        assert_eq!(genotypes[0].pl, Some(vec![1, 2, 3]));
    }

    #[test]
    fn force_transitions_once() {
        let mut block = GenotypeBlock::Unparsed {
            raw: "GT\t0/1".to_string(),
            ctx: ctx(&["S1"]),
        };
        assert!(!block.is_parsed());
        assert_eq!(block.force().unwrap().len(), 1);
        assert!(block.is_parsed());
        // Second force is a no-op read.
        assert_eq!(block.genotypes().unwrap().len(), 1);
    }

    #[test]
    fn format_keys_survive_all_missing_values() {
        let mut block = GenotypeBlock::Unparsed {
            raw: "GT:GQ\t0/1:.".to_string(),
            ctx: ctx(&["S1"]),
        };
        block.force().unwrap();
        // GQ is missing for every sample but stays a block key.
        assert_eq!(block.format_keys(), &["GT", "GQ"]);

        let mut block = GenotypeBlock::Unparsed {
            raw: "GT:GL\t0/1:-0.1,-2.0,-5.0".to_string(),
            ctx: ctx(&["S1"]),
        };
        block.force().unwrap();
        assert_eq!(block.format_keys(), &["GT", "PL"]);
    }

    #[test]
    fn malformed_block_only_errors_on_access() {
        let mut block = GenotypeBlock::Unparsed {
            raw: "GT\t0/1\t0/1".to_string(), // one sample declared
            ctx: ctx(&["S1"]),
        };
        assert!(!block.is_parsed());
        assert!(block.force().is_err());
    }
}
