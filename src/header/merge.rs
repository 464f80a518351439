//! Combining headers from multiple variant sources.
//!
//! Merging resolves INFO/FORMAT declaration conflicts by type promotion
//! (Integer+Float becomes Float, differing cardinality becomes `.`) and
//! requires the inputs' sequence dictionaries to be mutually compatible:
//! one input's contig list must contain every other input's contigs by
//! name and length.
//!
//! # Examples
//!
//! ```
//! use vcfcodec::header::{merge_headers, VcfHeader, FieldCount};
//!
//! let a = VcfHeader::parse(&[
//!     "##fileformat=VCFv4.2",
//!     "##INFO=<ID=AF,Number=1,Type=Float,Description=\"Frequency\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//! ]).unwrap();
//! let b = VcfHeader::parse(&[
//!     "##fileformat=VCFv4.3",
//!     "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Frequency\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//! ]).unwrap();
//!
//! let merged = merge_headers(&[a, b], false).unwrap();
//! let af = merged.get("INFO", "AF").unwrap().as_compound().unwrap();
//! assert_eq!(af.count_spec(), FieldCount::Unbounded);
//! ```

use crate::error::{Result, VcfError};
use crate::header::line::{CompoundLine, FieldCount, HeaderLine, ValueType};
use crate::header::{HeaderLineCollection, VcfHeader};
use crate::version::VcfVersion;
use std::collections::HashMap;

/// Contigs printed in a dictionary-incompatibility diagnostic before
/// truncation.
const DICT_PRINT_CAP: usize = 20;

/// Merge the header line collections of several variant sources.
///
/// The output collection carries the newest input version, the union of
/// all non-contig lines (conflicts resolved by promotion), and the
/// common sequence dictionary.
///
/// # Errors
///
/// Any input older than VCF 4.2, incompatible sequence dictionaries, and
/// non-promotable INFO/FORMAT conflicts are fatal.
pub fn merge_headers(headers: &[VcfHeader], emit_warnings: bool) -> Result<HeaderLineCollection> {
    if headers.is_empty() {
        return Err(VcfError::Merge("no headers to merge".to_string()));
    }
    for header in headers {
        if header.version() < VcfVersion::V4_2 {
            return Err(VcfError::Merge(format!(
                "header version {} is below the minimum mergeable version VCFv4.2",
                header.version()
            )));
        }
    }
    let version = headers
        .iter()
        .map(VcfHeader::version)
        .max()
        .unwrap_or(VcfVersion::V4_2);

    let dictionary = common_dictionary(headers)?;

    // Accumulate non-version, non-contig lines keyed by (key, ID).
    let mut ordered: Vec<HeaderLine> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for header in headers {
        for line in header.lines().iter() {
            if line.key() == "contig" {
                continue;
            }
            let Some(id) = line.id() else {
                // Unstructured lines with distinct content coexist; the
                // output collection collapses identical repeats.
                ordered.push(line.clone());
                continue;
            };
            let slot = (line.key().to_string(), id.to_string());
            match index.get(&slot) {
                None => {
                    index.insert(slot, ordered.len());
                    ordered.push(line.clone());
                }
                Some(&i) => {
                    let resolved = resolve(&ordered[i], line, emit_warnings)?;
                    if let Some(resolved) = resolved {
                        ordered[i] = resolved;
                    }
                }
            }
        }
    }

    let mut merged = HeaderLineCollection::new(version);
    for line in ordered {
        merged.add_line(line)?;
    }
    for contig in dictionary {
        merged.add_line(contig)?;
    }
    Ok(merged)
}

/// Resolve two lines sharing a `(key, ID)`. Returns a replacement line,
/// or `None` to keep the existing one.
fn resolve(
    existing: &HeaderLine,
    incoming: &HeaderLine,
    emit_warnings: bool,
) -> Result<Option<HeaderLine>> {
    if existing == incoming {
        return Ok(None);
    }
    match (existing, incoming) {
        (HeaderLine::Compound(a), HeaderLine::Compound(b)) => {
            resolve_compound(a, b, emit_warnings).map(|l| l.map(HeaderLine::Compound))
        }
        _ => {
            if emit_warnings {
                tracing::warn!(
                    kept = %existing,
                    dropped = %incoming,
                    "conflicting {} header lines; keeping the first seen",
                    existing.key()
                );
            }
            Ok(None)
        }
    }
}

/// Promotion rules for INFO/FORMAT conflicts. Exactly one difference
/// among type, cardinality, and description is resolvable; two or more
/// simultaneous differences fail the merge.
fn resolve_compound(
    a: &CompoundLine,
    b: &CompoundLine,
    emit_warnings: bool,
) -> Result<Option<CompoundLine>> {
    let type_differs = a.value_type() != b.value_type();
    let count_differs = a.count_spec() != b.count_spec();
    let description_differs = a.description() != b.description();
    let differences =
        usize::from(type_differs) + usize::from(count_differs) + usize::from(description_differs);

    if differences > 1 {
        return Err(VcfError::Merge(format!(
            "{} lines for ID {} differ in more than one of type/cardinality/description: `{}` vs `{}`",
            a.kind().key(),
            a.id(),
            a.structured(),
            b.structured(),
        )));
    }

    if type_differs {
        let promoted_type = match (a.value_type(), b.value_type()) {
            (ValueType::Integer, ValueType::Float) | (ValueType::Float, ValueType::Integer) => {
                ValueType::Float
            }
            (x, y) => {
                return Err(VcfError::Merge(format!(
                    "{} lines for ID {} have incompatible types {} and {}",
                    a.kind().key(),
                    a.id(),
                    x.as_str(),
                    y.as_str(),
                )));
            }
        };
        if emit_warnings {
            tracing::warn!(id = a.id(), "promoting merged field type to Float");
        }
        return Ok(Some(a.promoted(promoted_type, a.count_spec())));
    }

    if count_differs {
        if emit_warnings {
            tracing::warn!(id = a.id(), "promoting merged field cardinality to `.`");
        }
        return Ok(Some(a.promoted(a.value_type(), FieldCount::Unbounded)));
    }

    // Description-only difference: first seen wins.
    if emit_warnings {
        tracing::warn!(
            id = a.id(),
            kept = a.description().unwrap_or(""),
            dropped = b.description().unwrap_or(""),
            "conflicting descriptions; keeping the first seen"
        );
    }
    Ok(None)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Contig {
    name: String,
    length: Option<u64>,
}

/// Compute the common sequence dictionary: the largest input dictionary
/// must contain every other input's contigs by name and length.
fn common_dictionary(headers: &[VcfHeader]) -> Result<Vec<HeaderLine>> {
    let mut dictionaries: Vec<(Vec<Contig>, Vec<HeaderLine>)> = headers
        .iter()
        .map(|h| {
            let contigs = h
                .contigs()
                .map(|c| Contig {
                    name: c.id().to_string(),
                    length: c.get("length").and_then(|l| l.parse().ok()),
                })
                .collect::<Vec<_>>();
            let lines = h
                .lines()
                .of_key("contig")
                .cloned()
                .collect::<Vec<_>>();
            (contigs, lines)
        })
        .collect();

    // Largest first, so a pair of small mutually-compatible dictionaries
    // is never compared before the eventual superset shows up.
    dictionaries.sort_by_key(|(contigs, _)| std::cmp::Reverse(contigs.len()));
    let (superset, lines) = dictionaries.swap_remove(0);
    for (candidate, _) in &dictionaries {
        let missing: Vec<&Contig> = candidate
            .iter()
            .filter(|c| !superset.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(VcfError::Merge(format!(
                "incompatible sequence dictionaries: contigs [{}] are absent from the largest dictionary [{}]",
                print_contigs(candidate),
                print_contigs(&superset),
            )));
        }
    }
    Ok(lines)
}

fn print_contigs(contigs: &[Contig]) -> String {
    let mut text = contigs
        .iter()
        .take(DICT_PRINT_CAP)
        .map(|c| match c.length {
            Some(length) => format!("{}:{length}", c.name),
            None => c.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(",");
    if contigs.len() > DICT_PRINT_CAP {
        text.push_str(&format!(",... ({} total)", contigs.len()));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(lines: &[&str]) -> VcfHeader {
        let mut text = vec![lines[0].to_string()];
        text.extend(lines[1..].iter().map(|l| l.to_string()));
        text.push("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string());
        VcfHeader::parse(&text).unwrap()
    }

    #[test]
    fn rejects_pre_4_2_inputs() {
        let old = header(&["##fileformat=VCFv4.1"]);
        let new = header(&["##fileformat=VCFv4.2"]);
        let err = merge_headers(&[old, new], false).unwrap_err();
        assert!(err.to_string().contains("VCFv4.2"));
    }

    #[test]
    fn output_version_is_the_maximum() {
        let a = header(&["##fileformat=VCFv4.2"]);
        let b = header(&["##fileformat=VCFv4.3"]);
        let merged = merge_headers(&[a, b], false).unwrap();
        assert_eq!(merged.version(), VcfVersion::V4_3);
    }

    #[test]
    fn integer_float_conflict_promotes_to_float() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AF,Number=1,Type=Integer,Description=\"d\">",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AF,Number=1,Type=Float,Description=\"d\">",
        ]);
        let merged = merge_headers(&[a, b], false).unwrap();
        let af = merged.get("INFO", "AF").unwrap().as_compound().unwrap();
        assert_eq!(af.value_type(), ValueType::Float);
    }

    #[test]
    fn cardinality_conflict_promotes_to_unbounded() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AC,Number=1,Type=Integer,Description=\"d\">",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AC,Number=2,Type=Integer,Description=\"d\">",
        ]);
        let merged = merge_headers(&[a, b], false).unwrap();
        let ac = merged.get("INFO", "AC").unwrap().as_compound().unwrap();
        assert_eq!(ac.count_spec(), FieldCount::Unbounded);
        assert_eq!(ac.value_type(), ValueType::Integer);
    }

    #[test]
    fn two_simultaneous_differences_fail() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=X,Number=1,Type=Integer,Description=\"d\">",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=X,Number=A,Type=Float,Description=\"d\">",
        ]);
        let err = merge_headers(&[a, b], false).unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn string_integer_types_do_not_promote() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=X,Number=1,Type=String,Description=\"d\">",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=X,Number=1,Type=Integer,Description=\"d\">",
        ]);
        assert!(merge_headers(&[a, b], false).is_err());
    }

    #[test]
    fn merge_is_deterministic_as_a_set() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AF,Number=1,Type=Float,Description=\"f\">",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.3",
            "##INFO=<ID=AF,Number=A,Type=Float,Description=\"f\">",
        ]);
        let first = merge_headers(&[a.clone(), b.clone()], false).unwrap();
        let second = merge_headers(&[a, b], false).unwrap();
        let mut x: Vec<String> = first.iter().map(|l| l.to_string()).collect();
        let mut y: Vec<String> = second.iter().map(|l| l.to_string()).collect();
        x.sort();
        y.sort();
        assert_eq!(x, y);
        let af = first.get("INFO", "AF").unwrap().as_compound().unwrap();
        assert_eq!(af.count_spec(), FieldCount::Unbounded);
        assert_eq!(first.version(), VcfVersion::V4_3);
    }

    #[test]
    fn superset_dictionary_wins() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=1000>",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=1000>",
            "##contig=<ID=chr2,length=2000>",
        ]);
        let merged = merge_headers(&[a, b], false).unwrap();
        let contigs: Vec<String> = merged.contigs().map(|c| c.id().to_string()).collect();
        assert_eq!(contigs, vec!["chr1", "chr2"]);
    }

    #[test]
    fn disjoint_dictionaries_fail_with_both_printed() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=1000>",
            "##contig=<ID=chrX,length=500>",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=1000>",
            "##contig=<ID=chrY,length=400>",
        ]);
        let err = merge_headers(&[a, b], false).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("chrY") || text.contains("chrX"));
        assert!(text.contains("incompatible sequence dictionaries"));
    }

    #[test]
    fn length_mismatch_is_incompatible() {
        let a = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=1000>",
        ]);
        let b = header(&[
            "##fileformat=VCFv4.2",
            "##contig=<ID=chr1,length=999>",
        ]);
        assert!(merge_headers(&[a, b], false).is_err());
    }
}
