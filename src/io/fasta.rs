// src/io/fasta.rs
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{MicroassemblerError, Result};

/// One reference contig
#[derive(Debug, Clone)]
pub struct Contig {
    pub name: String,
    pub seq: String,
}

impl Contig {
    /// Bases of the 1-based inclusive interval [start, end], clipped to the contig
    pub fn slice(&self, start: usize, end: usize) -> Result<&str> {
        if start == 0 || start > end || start > self.seq.len() {
            return Err(MicroassemblerError::InvalidRegion(format!("{}:{}-{}", self.name, start, end)));
        }
        Ok(&self.seq[start - 1..end.min(self.seq.len())])
    }
}

/// Open a FASTA file for reading, handles gzipped files automatically
pub fn open_fasta<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if path.extension().map_or(false, |e| e == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Load every contig of a reference FASTA, upper-cased
pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<Vec<Contig>> {
    let reader = fasta::Reader::new(open_fasta(path)?);
    let mut contigs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MicroassemblerError::Fasta(e.to_string()))?;
        record.check().map_err(|e| MicroassemblerError::Fasta(format!("{}: {}", record.id(), e)))?;
        contigs.push(Contig {
            name: record.id().to_string(),
            seq: String::from_utf8_lossy(record.seq()).to_ascii_uppercase(),
        });
    }
    Ok(contigs)
}

pub enum FastaWriter {
    Plain(BufWriter<File>),
    Compressed(BufWriter<GzEncoder<File>>),
}

impl FastaWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        if path.extension().map_or(false, |e| e == "gz") {
            let encoder = GzEncoder::new(file, Compression::default());
            Ok(FastaWriter::Compressed(BufWriter::new(encoder)))
        } else {
            Ok(FastaWriter::Plain(BufWriter::new(file)))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            FastaWriter::Plain(writer) => writer,
            FastaWriter::Compressed(writer) => writer,
        }
    }

    pub fn write_record(&mut self, header: &str, sequence: &str) -> Result<()> {
        let writer = self.writer();
        writeln!(writer, ">{}", header)?;
        writeln!(writer, "{}", sequence)?;
        Ok(())
    }

    /// Flush buffered output and finish the gzip stream if any
    pub fn finish(self) -> Result<()> {
        match self {
            FastaWriter::Plain(mut writer) => writer.flush()?,
            FastaWriter::Compressed(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa.gz");
        let mut writer = FastaWriter::create(&path).unwrap();
        writer.write_record("chr1", "acgtnacgt").unwrap();
        writer.write_record("chr2", "GGGG").unwrap();
        writer.finish().unwrap();

        let contigs = load_reference(&path).unwrap();
        assert_eq!(contigs.len(), 2);
        assert_eq!(contigs[0].name, "chr1");
        assert_eq!(contigs[0].seq, "ACGTNACGT");
        assert_eq!(contigs[1].slice(2, 10).unwrap(), "GGG");
        assert!(contigs[1].slice(5, 6).is_err());
    }
}
