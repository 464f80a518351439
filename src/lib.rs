//! vcfcodec: VCF header model and record codec.
//!
//! A from-scratch implementation of the Variant Call Format text layer:
//! - **Header model**: versioned metadata lines (`##INFO=`, `##FORMAT=`,
//!   `##FILTER=`, `##contig=`, free-form lines) for VCF 3.2 through 4.3
//! - **Version policy**: per-version ID grammar, percent-encoding, GT
//!   placement, and symbolic-count rules, applied at parse and upgrade time
//! - **Header merging**: N-way merge with type promotion and sequence
//!   dictionary reconciliation
//! - **Record codec**: an allocation-conscious decoder with lazy genotype
//!   parsing and memoized FILTER sets, plus a normalizing encoder
//! - **Streaming I/O**: reader and writer with transparent gzip support
//!
//! # Examples
//!
//! ## Reading a VCF stream
//!
//! ```
//! use vcfcodec::reader::VcfReader;
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = [
//!     "##fileformat=VCFv4.2",
//!     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//!     "chr1\t100\trs1\tA\tT\t50\tPASS\tDP=10",
//! ]
//! .join("\n");
//! let mut reader = VcfReader::new(Cursor::new(data.as_bytes()));
//! let header = reader.read_header()?;
//! assert_eq!(header.version().literal(), "VCFv4.2");
//!
//! for result in &mut reader {
//!     let record = result?;
//!     assert!(record.passed());
//!     assert_eq!(record.qual(), Some(50.0));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding single lines
//!
//! ```
//! use vcfcodec::decoder::RecordDecoder;
//! use vcfcodec::header::VcfHeader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let header = VcfHeader::parse(&[
//!     "##fileformat=VCFv4.2",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
//! ])?;
//! let mut decoder = RecordDecoder::new();
//! let record = decoder.decode("chr1\t100\t.\tA\tT,G\t.\t.\t.", &header)?.unwrap();
//! assert_eq!(record.allele_count(), 3); // REF + two ALTs
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod genotype;
pub mod header;
pub mod percent;
pub mod record;
pub mod reader;
pub mod version;
pub mod writer;

pub use config::{DecodeOptions, EncodeOptions};
pub use decoder::RecordDecoder;
pub use encoder::RecordEncoder;
pub use error::{Result, VcfError};
pub use genotype::{Genotype, GenotypeBlock};
pub use header::merge::merge_headers;
pub use header::{HeaderLine, HeaderLineCollection, VcfHeader};
pub use record::{Allele, InfoValue, VariantRecord};
pub use reader::VcfReader;
pub use version::VcfVersion;
pub use writer::VcfWriter;
