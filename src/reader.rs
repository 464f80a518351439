//! Streaming VCF reader.
//!
//! Wraps a [`RecordDecoder`] around any [`Read`] source, parsing the
//! header once and then yielding records as an iterator. Line numbers in
//! errors refer to the physical file, header included.
//!
//! # Examples
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
//!     "chr1\t100\t.\tA\tT\t50\tPASS\tDP=10",
//! ]
//! .join("\n");
//! let mut reader = VcfReader::new(Cursor::new(data.as_bytes()));
//! let header = reader.read_header()?;
//! assert_eq!(header.version().literal(), "VCFv4.2");
//!
//! for result in &mut reader {
//!     let record = result?;
//!     println!("{}:{}", record.chrom, record.start);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::DecodeOptions;
use crate::decoder::RecordDecoder;
use crate::error::{Result, VcfError};
use crate::header::VcfHeader;
use crate::record::VariantRecord;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Streaming reader: header first, then an iterator of records.
pub struct VcfReader<R: Read> {
    reader: BufReader<R>,
    line_buf: String,
    line_number: u64,
    decoder: RecordDecoder,
    header: Option<VcfHeader>,
    options: DecodeOptions,
}

impl<R: Read> VcfReader<R> {
    /// Creates a reader over any byte source.
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    /// Creates a reader with explicit strictness options.
    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        VcfReader {
            reader: BufReader::new(reader),
            line_buf: String::new(),
            line_number: 0,
            decoder: RecordDecoder::with_options(options),
            header: None,
            options,
        }
    }

    /// Parses the header. Must be called before iterating.
    ///
    /// Consumes every leading `#` line up to and including the column
    /// header. A data line before the column header is an error.
    pub fn read_header(&mut self) -> Result<&VcfHeader> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            self.line_buf.clear();
            let bytes_read = self.reader.read_line(&mut self.line_buf)?;
            if bytes_read == 0 {
                return Err(VcfError::HeaderFormat(
                    "input ended before the column header line".to_string(),
                ));
            }

            self.line_number += 1;
            let line = self.line_buf.trim_end();
            if line.is_empty() {
                continue;
            }
            if !line.starts_with('#') {
                return Err(VcfError::header_parse(
                    line,
                    "data line before the column header",
                ));
            }

            let is_column_header = !line.starts_with("##");
            lines.push(line.to_string());
            if is_column_header {
                break;
            }
        }

        let header = VcfHeader::parse_with_options(&lines, self.options)?;
        Ok(self.header.insert(header))
    }

    /// The parsed header, if [`read_header`](Self::read_header) ran.
    pub fn header(&self) -> Option<&VcfHeader> {
        self.header.as_ref()
    }

    /// Physical lines consumed so far, header included.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl VcfReader<Box<dyn Read>> {
    /// Opens a VCF file, transparently decompressing `.gz`/`.bgz` input.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source: Box<dyn Read> = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("bgz") => Box::new(MultiGzDecoder::new(file)),
            _ => Box::new(file),
        };
        Ok(VcfReader::new(source))
    }
}

impl<R: Read> Iterator for VcfReader<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = match &self.header {
            Some(header) => header,
            None => {
                return Some(Err(VcfError::HeaderFormat(
                    "read_header must be called before reading records".to_string(),
                )))
            }
        };

        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line_buf.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    self.decoder.set_line_number(self.line_number - 1);
                    match self.decoder.decode(line, header) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue, // stray # line mid-stream
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
