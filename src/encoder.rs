//! Record encoding: [`VariantRecord`] back to a VCF text line.
//!
//! Mirrors the decoder field by field. Two deliberate normalizations:
//! FILTER names serialize in lexicographic order, and INFO keys serialize
//! key-sorted rather than in record order. Every key a record uses must
//! be declared in the header, unless
//! [`EncodeOptions::allow_undeclared`] says otherwise.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::decoder::RecordDecoder;
//! use vcfcodec::encoder::RecordEncoder;
//! use vcfcodec::header::VcfHeader;
//!
//! let header = VcfHeader::parse(&[
//!     "##fileformat=VCFv4.2",
//!     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//! ]).unwrap();
//!
//! let line = "chr1\t100\trs1\tA\tT\t50\tPASS\tDP=10";
//! let mut record = RecordDecoder::new().decode(line, &header).unwrap().unwrap();
//! let encoded = RecordEncoder::new().encode(&mut record, &header).unwrap();
//! assert_eq!(encoded, line);
//! ```

use crate::config::EncodeOptions;
use crate::error::{Result, VcfError};
use crate::genotype::{Genotype, GenotypeBlock};
use crate::header::VcfHeader;
use crate::percent::percent_encode;
use crate::record::{Allele, InfoValue, VariantRecord};
use std::io::Write;

/// Canonical FORMAT emission order for the first-class genotype fields.
const STANDARD_FORMAT_ORDER: [&str; 4] = ["AD", "DP", "GQ", "PL"];

/// Per-record text encoder.
#[derive(Debug, Clone, Default)]
pub struct RecordEncoder {
    options: EncodeOptions,
}

impl RecordEncoder {
    /// Create an encoder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with explicit options.
    pub fn with_options(options: EncodeOptions) -> Self {
        RecordEncoder { options }
    }

    /// Encode one record to a line (no trailing newline).
    ///
    /// Takes the record mutably because encoding forces the lazy
    /// genotype block.
    pub fn encode(&self, record: &mut VariantRecord, header: &VcfHeader) -> Result<String> {
        let mut buffer = Vec::with_capacity(128);
        self.write(record, header, &mut buffer)?;
        // The encoder only ever writes UTF-8.
        Ok(String::from_utf8(buffer).expect("encoder produced valid UTF-8"))
    }

    /// Encode one record straight into a sink, avoiding the intermediate
    /// string.
    pub fn write<W: Write>(
        &self,
        record: &mut VariantRecord,
        header: &VcfHeader,
        sink: &mut W,
    ) -> Result<()> {
        write!(sink, "{}\t{}\t", record.chrom, record.start)?;
        match &record.id {
            Some(id) => write!(sink, "{id}\t")?,
            None => write!(sink, ".\t")?,
        }
        write!(sink, "{}\t", record.reference.as_text())?;
        if record.alternates.is_empty() {
            write!(sink, ".\t")?;
        } else {
            for (i, alt) in record.alternates.iter().enumerate() {
                if i > 0 {
                    write!(sink, ",")?;
                }
                write!(sink, "{}", alt.as_text())?;
            }
            write!(sink, "\t")?;
        }
        match record.qual() {
            Some(qual) => write!(sink, "{}\t", format_vcf_float(qual))?,
            None => write!(sink, ".\t")?,
        }
        self.write_filters(record, header, sink)?;
        self.write_info(record, header, sink)?;
        if !header.samples().is_empty() {
            self.write_genotypes(record, header, sink)?;
        }
        Ok(())
    }

    fn write_filters<W: Write>(
        &self,
        record: &VariantRecord,
        header: &VcfHeader,
        sink: &mut W,
    ) -> Result<()> {
        match &record.filters {
            None => write!(sink, ".\t")?,
            Some(set) if set.is_empty() => write!(sink, "PASS\t")?,
            Some(set) => {
                if !self.options.allow_undeclared {
                    for name in set.iter() {
                        if header.filter(name).is_none() {
                            return Err(undeclared("FILTER", name));
                        }
                    }
                }
                // BTreeSet iteration is already lexicographic.
                for (i, name) in set.iter().enumerate() {
                    if i > 0 {
                        write!(sink, ";")?;
                    }
                    write!(sink, "{name}")?;
                }
                write!(sink, "\t")?;
            }
        }
        Ok(())
    }

    fn write_info<W: Write>(
        &self,
        record: &VariantRecord,
        header: &VcfHeader,
        sink: &mut W,
    ) -> Result<()> {
        if record.info.is_empty() {
            write!(sink, ".")?;
            return Ok(());
        }
        let encode_percent = header.version().percent_encoding();
        let mut keys: Vec<&(String, InfoValue)> = record.info.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        for (i, (key, value)) in keys.iter().enumerate() {
            if !self.options.allow_undeclared && header.info(key).is_none() {
                return Err(undeclared("INFO", key));
            }
            if i > 0 {
                write!(sink, ";")?;
            }
            match value {
                InfoValue::Flag => write!(sink, "{key}")?,
                InfoValue::Missing => write!(sink, "{key}=.")?,
                InfoValue::Scalar(text) => {
                    write!(sink, "{key}={}", escape(text, encode_percent))?;
                }
                InfoValue::List(items) => {
                    write!(sink, "{key}=")?;
                    for (j, item) in items.iter().enumerate() {
                        if j > 0 {
                            write!(sink, ",")?;
                        }
                        write!(sink, "{}", escape(item, encode_percent))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_genotypes<W: Write>(
        &self,
        record: &mut VariantRecord,
        header: &VcfHeader,
        sink: &mut W,
    ) -> Result<()> {
        let record_alleles: Vec<Allele> = record.alleles().cloned().collect();
        record.genotypes.force()?;
        let genotypes: &[Genotype] = match &record.genotypes {
            GenotypeBlock::Parsed { genotypes, .. } => genotypes,
            _ => &[],
        };
        let keys = derive_format_keys(record.genotypes.format_keys(), genotypes);
        if keys.is_empty() {
            return Ok(());
        }
        if !self.options.allow_undeclared {
            for key in &keys {
                if header.format(key).is_none() {
                    return Err(undeclared("FORMAT", key));
                }
            }
        }
        write!(sink, "\t{}", keys.join(":"))?;

        let site = format!("{}:{}", record.chrom, record.start);
        for sample in header.samples() {
            let genotype = genotypes.iter().find(|g| &g.sample_name == sample);
            let mut values: Vec<String> = keys
                .iter()
                .map(|key| match genotype {
                    Some(g) => format_genotype_field(g, key, &record_alleles, &site),
                    None => missing_value(key),
                })
                .collect::<Result<_>>()?;
            if !self.options.keep_trailing_fields {
                while values.len() > 1 && values.last().is_some_and(|v| v == ".") {
                    values.pop();
                }
            }
            write!(sink, "\t{}", values.join(":"))?;
        }
        Ok(())
    }
}

/// FORMAT key order for emission: GT first, then the standard fields,
/// then extended attributes in first-seen order. A key counts as present
/// when it was recorded at decode time or any sample carries a value for
/// it, so a key that is missing in every sample keeps its FORMAT slot.
fn derive_format_keys(recorded: &[String], genotypes: &[Genotype]) -> Vec<String> {
    let recorded_has = |key: &str| recorded.iter().any(|k| k == key);
    let mut keys: Vec<String> = Vec::new();
    if recorded_has("GT") || genotypes.iter().any(|g| !g.alleles.is_empty()) {
        keys.push("GT".to_string());
    }
    for key in STANDARD_FORMAT_ORDER {
        let present = recorded_has(key)
            || genotypes.iter().any(|g| match key {
                "AD" => g.ad.is_some(),
                "DP" => g.dp.is_some(),
                "GQ" => g.gq.is_some(),
                "PL" => g.pl.is_some(),
                _ => false,
            });
        if present {
            keys.push(key.to_string());
        }
    }
    for key in recorded {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.clone());
        }
    }
    for genotype in genotypes {
        for (key, _) in &genotype.attributes {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

fn format_genotype_field(
    genotype: &Genotype,
    key: &str,
    record_alleles: &[Allele],
    site: &str,
) -> Result<String> {
    match key {
        "GT" => format_gt(genotype, record_alleles, site),
        "GQ" => Ok(genotype.gq.map_or_else(|| ".".to_string(), |v| v.to_string())),
        "DP" => Ok(genotype.dp.map_or_else(|| ".".to_string(), |v| v.to_string())),
        "AD" => Ok(format_int_list(genotype.ad.as_deref())),
        "PL" => Ok(format_int_list(genotype.pl.as_deref())),
        other => Ok(genotype
            .attribute(other)
            .map_or_else(|| ".".to_string(), |v| v.to_string())),
    }
}

fn format_gt(genotype: &Genotype, record_alleles: &[Allele], site: &str) -> Result<String> {
    if genotype.alleles.is_empty() {
        return Ok(".".to_string());
    }
    let separator = if genotype.phased { '|' } else { '/' };
    let mut out = String::new();
    for (i, allele) in genotype.alleles.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        if allele.is_no_call() {
            out.push('.');
            continue;
        }
        let index = record_alleles.iter().position(|a| a == allele).ok_or_else(|| {
            VcfError::Encode(format!(
                "genotype allele `{}` for sample {} at {site} is not a record allele",
                allele.as_text(),
                genotype.sample_name
            ))
        })?;
        out.push_str(&index.to_string());
    }
    Ok(out)
}

fn format_int_list(list: Option<&[i32]>) -> String {
    match list {
        None => ".".to_string(),
        Some(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn missing_value(key: &str) -> Result<String> {
    Ok(if key == "GT" { "./.".to_string() } else { ".".to_string() })
}

fn escape(text: &str, encode_percent: bool) -> std::borrow::Cow<'_, str> {
    if encode_percent {
        percent_encode(text)
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

fn undeclared(kind: &str, key: &str) -> VcfError {
    VcfError::Encode(format!(
        "record uses {kind} key `{key}` that is not declared in the header"
    ))
}

/// Deterministic float formatting: up to three decimal places with
/// trailing zeros trimmed; scientific notation for extreme magnitudes.
pub(crate) fn format_vcf_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if abs >= 1e7 || abs < 1e-3 {
        return format!("{value:e}");
    }
    let mut text = format!("{value:.3}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
