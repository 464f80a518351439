//! Integration tests for header parsing, versioning, and merging.
//!
//! Exercises whole headers end to end: every metadata line kind, version
//! upgrades, serialization order, and merged headers driving a decoder.

use vcfcodec::header::{merge_headers, FieldCount, ValueType, VcfHeader};
use vcfcodec::{InfoValue, RecordDecoder, VcfVersion};

fn full_header() -> Vec<String> {
    [
        "##fileformat=VCFv4.2",
        "##fileDate=20240115",
        "##source=varcall-2.1",
        "##reference=GRCh38",
        "##contig=<ID=chr1,length=248956422>",
        "##contig=<ID=chr2,length=242193529>",
        "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">",
        "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">",
        "##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">",
        "##FILTER=<ID=q10,Description=\"Quality below 10\">",
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
        "##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype quality\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002",
    ]
    .iter()
    .map(|l| l.to_string())
    .collect()
}

#[test]
fn test_full_header_parses() {
    let header = VcfHeader::parse(&full_header()).unwrap();

    assert_eq!(header.version(), VcfVersion::V4_2);
    assert_eq!(header.samples(), ["NA001", "NA002"]);
    assert_eq!(header.column_count(), 11);

    let dp = header.info("DP").unwrap();
    assert_eq!(dp.value_type(), ValueType::Integer);
    assert_eq!(dp.count_spec(), FieldCount::Fixed(1));

    let af = header.info("AF").unwrap();
    assert_eq!(af.count_spec(), FieldCount::AltAlleles);

    assert!(header.filter("q10").is_some());
    assert!(header.format("GT").is_some());
    assert_eq!(header.contigs().count(), 2);
    assert_eq!(
        header.contig("chr1").and_then(|c| c.get("length")),
        Some("248956422")
    );
}

#[test]
fn test_serialization_preserves_line_order() {
    let input = full_header();
    let header = VcfHeader::parse(&input).unwrap();
    let output = header.to_header_lines();
    assert_eq!(output, input);
}

#[test]
fn test_legacy_format_key_still_parses() {
    let header = VcfHeader::parse(&[
        "##format=VCFv3.2",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();
    assert_eq!(header.version(), VcfVersion::V3_2);
    // Serializing keeps the era-appropriate key.
    assert_eq!(header.to_header_lines()[0], "##format=VCFv3.2");
}

#[test]
fn test_version_upgrade_is_monotonic() {
    let mut header = VcfHeader::parse(&full_header()).unwrap();
    header.set_version(VcfVersion::V4_3).unwrap();
    assert_eq!(header.version(), VcfVersion::V4_3);
    assert!(header.set_version(VcfVersion::V4_0).is_err());
    assert_eq!(header.version(), VcfVersion::V4_3);
}

#[test]
fn test_flag_with_nonzero_number_is_repaired() {
    let header = VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "##INFO=<ID=DB,Number=3,Type=Flag,Description=\"d\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();
    let db = header.info("DB").unwrap();
    assert_eq!(db.count_spec(), FieldCount::Fixed(0));
    assert_eq!(db.value_type(), ValueType::Flag);
}

#[test]
fn test_duplicate_sample_names_rejected() {
    let err = VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS1",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("S1"));
}

#[test]
fn test_metadata_after_column_header_rejected() {
    let err = VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
        "##source=late",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("column header"));
}

#[test]
fn test_symbolic_count_letters_gate_on_version() {
    // Number=R only exists from 4.2 on.
    let err = VcfHeader::parse(&[
        "##fileformat=VCFv4.1",
        "##INFO=<ID=AD,Number=R,Type=Integer,Description=\"d\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ]);
    assert!(err.is_err());

    let ok = VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "##INFO=<ID=AD,Number=R,Type=Integer,Description=\"d\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();
    assert_eq!(ok.info("AD").unwrap().count_spec(), FieldCount::Alleles);
}

#[test]
fn test_merged_header_drives_decoding() {
    let a = VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "##contig=<ID=chr1,length=1000>",
        "##INFO=<ID=AF,Number=1,Type=Integer,Description=\"Frequency\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();
    let b = VcfHeader::parse(&[
        "##fileformat=VCFv4.3",
        "##contig=<ID=chr1,length=1000>",
        "##contig=<ID=chr2,length=2000>",
        "##INFO=<ID=AF,Number=1,Type=Float,Description=\"Frequency\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();

    let merged = merge_headers(&[a, b], false).unwrap();
    assert_eq!(merged.version(), VcfVersion::V4_3);
    let af = merged.get("INFO", "AF").unwrap().as_compound().unwrap();
    assert_eq!(af.value_type(), ValueType::Float);

    // The merged collection is a usable header for decoding.
    let header = VcfHeader::new(merged, Vec::new()).unwrap();
    let mut decoder = RecordDecoder::new();
    let record = decoder
        .decode("chr2\t10\t.\tA\tT\t.\t.\tAF=0.5", &header)
        .unwrap()
        .unwrap();
    assert_eq!(
        record.info_get("AF").and_then(InfoValue::as_float),
        Some(0.5)
    );
}

#[test]
fn test_merge_repeated_runs_are_identical() {
    let mk = || {
        (
            VcfHeader::parse(&[
                "##fileformat=VCFv4.2",
                "##INFO=<ID=AF,Number=1,Type=Float,Description=\"f\">",
                "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
            ])
            .unwrap(),
            VcfHeader::parse(&[
                "##fileformat=VCFv4.3",
                "##INFO=<ID=AF,Number=A,Type=Float,Description=\"f\">",
                "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
            ])
            .unwrap(),
        )
    };
    let (a1, b1) = mk();
    let (a2, b2) = mk();
    let first = merge_headers(&[a1, b1], false).unwrap();
    let second = merge_headers(&[a2, b2], false).unwrap();
    let x: Vec<String> = first.sorted().iter().map(|l| l.to_string()).collect();
    let y: Vec<String> = second.sorted().iter().map(|l| l.to_string()).collect();
    assert_eq!(x, y);
    let af = first.get("INFO", "AF").unwrap().as_compound().unwrap();
    assert_eq!(af.count_spec(), FieldCount::Unbounded);
}
