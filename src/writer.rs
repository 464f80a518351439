//! Streaming VCF writer.
//!
//! Writes the full header on construction, then records one line at a
//! time through a [`RecordEncoder`].
//!
//! # Examples
//!
//! ```
//! use vcfcodec::header::VcfHeader;
//! use vcfcodec::reader::VcfReader;
//! use vcfcodec::writer::VcfWriter;
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
//! let header = reader.read_header()?.clone();
//!
//! let mut out = Vec::new();
//! let mut writer = VcfWriter::new(&mut out, header)?;
//! for result in reader {
//!     let mut record = result?;
//!     writer.write_record(&mut record)?;
//! }
//! assert_eq!(writer.records_written(), 1);
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

use crate::config::EncodeOptions;
use crate::encoder::RecordEncoder;
use crate::error::Result;
use crate::header::VcfHeader;
use crate::record::VariantRecord;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streaming writer: header on construction, then records.
pub struct VcfWriter<W: Write> {
    writer: W,
    encoder: RecordEncoder,
    header: VcfHeader,
    records_written: u64,
}

impl<W: Write> VcfWriter<W> {
    /// Creates a writer over a sink and emits the header immediately.
    pub fn new(sink: W, header: VcfHeader) -> Result<Self> {
        Self::with_options(sink, header, EncodeOptions::default())
    }

    /// Creates a writer with explicit encoding options.
    pub fn with_options(mut sink: W, header: VcfHeader, options: EncodeOptions) -> Result<Self> {
        for line in header.to_header_lines() {
            writeln!(sink, "{line}")?;
        }
        Ok(VcfWriter {
            writer: sink,
            encoder: RecordEncoder::with_options(options),
            header,
            records_written: 0,
        })
    }

    /// Encodes and writes one record.
    pub fn write_record(&mut self, record: &mut VariantRecord) -> Result<()> {
        self.encoder.write(record, &self.header, &mut self.writer)?;
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// The header this writer serializes against.
    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes and closes the writer.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl VcfWriter<Box<dyn Write>> {
    /// Creates a writer for the given path, gzip-compressing when the
    /// extension is `.gz` or `.bgz`. The header is written immediately.
    pub fn create(path: impl AsRef<Path>, header: VcfHeader) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let sink: Box<dyn Write> = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("bgz") => {
                Box::new(GzEncoder::new(BufWriter::new(file), Compression::default()))
            }
            _ => Box::new(BufWriter::new(file)),
        };
        VcfWriter::new(sink, header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::VcfReader;
    use std::io::Cursor;

    const SMALL: &str = "##fileformat=VCFv4.2\n\
        ##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
        chr1\t100\trs1\tA\tT\t50\tPASS\tDP=10\n";

    #[test]
    fn header_is_written_up_front() {
        let mut reader = VcfReader::new(Cursor::new(SMALL.as_bytes()));
        let header = reader.read_header().unwrap().clone();

        let mut out = Vec::new();
        let writer = VcfWriter::new(&mut out, header).unwrap();
        drop(writer);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("##fileformat=VCFv4.2\n"));
        assert!(text.contains("##INFO=<ID=DP,"));
        assert!(text.ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"));
    }

    #[test]
    fn records_round_trip_through_writer() {
        let mut reader = VcfReader::new(Cursor::new(SMALL.as_bytes()));
        let header = reader.read_header().unwrap().clone();

        let mut out = Vec::new();
        let mut writer = VcfWriter::new(&mut out, header).unwrap();
        for result in reader {
            writer.write_record(&mut result.unwrap()).unwrap();
        }
        assert_eq!(writer.records_written(), 1);
        writer.finish().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("chr1\t100\trs1\tA\tT\t50\tPASS\tDP=10\n"));
    }

    #[test]
    fn gzip_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf.gz");

        let mut reader = VcfReader::new(Cursor::new(SMALL.as_bytes()));
        let header = reader.read_header().unwrap().clone();

        let mut writer = VcfWriter::create(&path, header).unwrap();
        for result in reader {
            writer.write_record(&mut result.unwrap()).unwrap();
        }
        writer.finish().unwrap();

        let mut reread = VcfReader::from_path(&path).unwrap();
        reread.read_header().unwrap();
        let records: Vec<_> = reread.collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chrom, "chr1");
    }
}
