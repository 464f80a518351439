//! Record codec benchmarks.
//!
//! Measures the hot decode path across record shapes:
//! - Sites-only records vs records with many sample columns
//! - Lazy vs forced genotype decoding
//! - FILTER cache effect on repeated filter strings

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vcfcodec::header::VcfHeader;
use vcfcodec::{RecordDecoder, RecordEncoder};

fn sites_header() -> VcfHeader {
    VcfHeader::parse(&[
        "##fileformat=VCFv4.2",
        "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
        "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Frequency\">",
        "##FILTER=<ID=q10,Description=\"d\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap()
}

fn cohort_header(sample_count: usize) -> VcfHeader {
    let samples: Vec<String> = (0..sample_count).map(|i| format!("\tS{i}")).collect();
    VcfHeader::parse(&[
        "##fileformat=VCFv4.2".to_string(),
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">".to_string(),
        "##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">".to_string(),
        format!(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT{}",
            samples.concat()
        ),
    ])
    .unwrap()
}

fn cohort_line(sample_count: usize) -> String {
    let mut line = String::from("chr1\t100000\trs42\tA\tT\t50\tPASS\t.\tGT:DP");
    for i in 0..sample_count {
        line.push_str(if i % 3 == 0 { "\t0/1:30" } else { "\t0/0:25" });
    }
    line
}

fn bench_sites_only_decode(c: &mut Criterion) {
    let header = sites_header();
    let line = "chr1\t100000\trs42\tA\tT,G\t50\tq10\tDP=100;AF=0.25,0.5";
    let mut group = c.benchmark_group("decode_sites_only");
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("snv_two_alts", |b| {
        let mut decoder = RecordDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(line), &header).unwrap()))
    });
    group.finish();
}

fn bench_lazy_vs_forced_genotypes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_genotypes");

    for sample_count in [10, 100, 1000] {
        let header = cohort_header(sample_count);
        let line = cohort_line(sample_count);
        group.throughput(Throughput::Bytes(line.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("lazy", sample_count),
            &sample_count,
            |b, _| {
                let mut decoder = RecordDecoder::new();
                b.iter(|| black_box(decoder.decode(black_box(&line), &header).unwrap()))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("forced", sample_count),
            &sample_count,
            |b, _| {
                let mut decoder = RecordDecoder::new();
                b.iter(|| {
                    let mut record = decoder.decode(black_box(&line), &header).unwrap().unwrap();
                    record.genotypes.force().unwrap();
                    black_box(record)
                })
            },
        );
    }

    group.finish();
}

fn bench_filter_cache(c: &mut Criterion) {
    let header = sites_header();
    let line = "chr1\t100000\t.\tA\tT\t.\tq10\t.";
    let mut group = c.benchmark_group("decode_filters");

    group.bench_function("repeated_filter_string", |b| {
        // One decoder across iterations, so every decode after the first
        // hits the memoized set.
        let mut decoder = RecordDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(line), &header).unwrap()))
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let header = sites_header();
    let mut decoder = RecordDecoder::new();
    let record = decoder
        .decode("chr1\t100000\trs42\tA\tT,G\t50\tq10\tDP=100;AF=0.25,0.5", &header)
        .unwrap()
        .unwrap();
    let encoder = RecordEncoder::new();

    c.bench_function("encode_sites_only", |b| {
        b.iter(|| {
            let mut working = record.clone();
            black_box(encoder.encode(&mut working, &header).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_sites_only_decode,
    bench_lazy_vs_forced_genotypes,
    bench_filter_cache,
    bench_encode
);
criterion_main!(benches);
