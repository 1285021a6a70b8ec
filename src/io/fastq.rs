// src/io/fastq.rs
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{MicroassemblerError, Result};
use crate::graph::{ReadInfo, ReadLabel, Strand};

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub header: String,
    pub sequence: String,
    pub quality: String,
}

impl FastqRecord {
    /// Read name without the leading '@', comment or /1 /2 suffix
    pub fn name(&self) -> &str {
        let id = self.header.trim_start_matches('@').split_whitespace().next().unwrap_or_default();
        id.strip_suffix("/1").or_else(|| id.strip_suffix("/2")).unwrap_or(id)
    }

    /// Value of a SAM-style `TAG:TYPE:VALUE` field in the header comment
    pub fn tag(&self, tag: &str) -> Option<&str> {
        self.header
            .split_whitespace()
            .skip(1)
            .find_map(|field| field.strip_prefix(tag).and_then(|rest| rest.get(2..)))
    }

    /// Convert into a read of `label`, picking up linked-read barcode
    /// (`BX:Z:`) and haplotype (`HP:i:`) tags when present
    pub fn into_read(self, label: ReadLabel, mate_order: u8) -> ReadInfo {
        let mut read = ReadInfo::new(self.name(), &self.sequence, &self.quality, label, Strand::Fwd, mate_order);
        if let Some(bx) = self.tag("BX:") {
            let hp = self.tag("HP:").and_then(|h| h.parse().ok()).unwrap_or(0);
            read = read.with_barcode(bx, hp);
        }
        read
    }
}

/// Open a FASTQ file for reading, handles gzipped files automatically
pub fn open_fastq<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if path.extension().map_or(false, |e| e == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Stream FASTQ records one at a time
pub fn stream_fastq_records<R: BufRead>(reader: R) -> FastqStreamParser<io::Lines<R>> {
    FastqStreamParser { lines: reader.lines(), record: 0 }
}

/// Iterator adaptor turning lines into validated records
pub struct FastqStreamParser<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    lines: I,
    record: usize,
}

impl<I> FastqStreamParser<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    fn next_line(&mut self, what: &str) -> Result<String> {
        match self.lines.next() {
            Some(line) => Ok(line?.trim_end().to_string()),
            None => Err(MicroassemblerError::Fastq(format!("record {} truncated before {}", self.record, what))),
        }
    }
}

impl<I> Iterator for FastqStreamParser<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => break line.trim_end().to_string(),
                Err(e) => return Some(Err(e.into())),
            }
        };
        self.record += 1;
        if !header.starts_with('@') {
            return Some(Err(MicroassemblerError::Fastq(format!(
                "record {} header does not start with '@': {}",
                self.record, header
            ))));
        }

        let parsed = (|| {
            let sequence = self.next_line("sequence")?;
            let plus = self.next_line("separator")?;
            if !plus.starts_with('+') {
                return Err(MicroassemblerError::Fastq(format!("record {} missing '+' separator", self.record)));
            }
            let quality = self.next_line("quality")?;
            if quality.len() != sequence.len() {
                return Err(MicroassemblerError::Fastq(format!(
                    "record {} has {} bases but {} qualities",
                    self.record,
                    sequence.len(),
                    quality.len()
                )));
            }
            Ok((sequence, quality))
        })();

        Some(parsed.map(|(sequence, quality)| FastqRecord { header, sequence, quality }))
    }
}

/// Load every read of one sample, pairing mates when a second file is given
pub fn load_sample_reads<P: AsRef<Path>>(mate1: P, mate2: Option<P>, label: ReadLabel) -> Result<Vec<ReadInfo>> {
    let order = if mate2.is_some() { 1 } else { 0 };
    let mut reads = Vec::new();
    for record in stream_fastq_records(open_fastq(mate1)?) {
        reads.push(record?.into_read(label, order));
    }
    if let Some(mate2) = mate2 {
        for record in stream_fastq_records(open_fastq(mate2)?) {
            reads.push(record?.into_read(label, 2));
        }
    }
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_stream_records() {
        let data = "@r1/1 BX:Z:AAAC-1 HP:i:2\nACGT\n+\nIIII\n\n@r2\nGG\n+\nII\n";
        let records: Vec<FastqRecord> = stream_fastq_records(Cursor::new(data)).collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "r1");
        assert_eq!(records[0].tag("BX:"), Some("AAAC-1"));

        let read = records[0].clone().into_read(ReadLabel::Tumor, 1);
        assert_eq!(read.barcode.as_deref(), Some("AAAC-1"));
        assert_eq!(read.haplotype, 2);
        assert_eq!(records[1].sequence, "GG");
    }

    #[test]
    fn test_quality_length_mismatch_is_an_error() {
        let data = "@r1\nACGT\n+\nIII\n";
        let result: Result<Vec<FastqRecord>> = stream_fastq_records(Cursor::new(data)).collect();
        assert!(matches!(result, Err(MicroassemblerError::Fastq(_))));
    }

    #[test]
    fn test_load_gzipped_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tumor.fq.gz");
        let mut encoder = flate2::write::GzEncoder::new(File::create(&path).unwrap(), flate2::Compression::default());
        encoder.write_all(b"@t1\nACGTACGT\n+\nIIIIIIII\n").unwrap();
        encoder.finish().unwrap();

        let reads = load_sample_reads(&path, None, ReadLabel::Tumor).unwrap();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].seq, "ACGTACGT");
        assert_eq!(reads[0].mate_order, 0);
    }
}
