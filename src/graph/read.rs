use crate::graph::node::{Sample, Strand};
use crate::kmer::kmer::is_dna;

/// Origin of a read in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLabel {
    Tumor,
    Normal,
    /// The reference pseudo-read
    Reference,
}

impl ReadLabel {
    pub fn sample(self) -> Option<Sample> {
        match self {
            ReadLabel::Tumor => Some(Sample::Tumor),
            ReadLabel::Normal => Some(Sample::Normal),
            ReadLabel::Reference => None,
        }
    }
}

/// A read registered with the graph
#[derive(Debug, Clone)]
pub struct ReadInfo {
    /// Name shared by both mates of a fragment
    pub name: String,
    /// Set the read belongs to (e.g. window identifier)
    pub set: String,
    pub seq: String,
    pub qv: String,
    /// Free-form one letter origin code
    pub code: char,
    pub label: ReadLabel,
    pub strand: Strand,
    /// 1 or 2 for paired mates, 0 otherwise
    pub mate_order: u8,
    /// Linked-read barcode
    pub barcode: Option<String>,
    /// Haplotype tag (0 unassigned)
    pub haplotype: usize,
    pub trim5: usize,
    pub trim3: usize,
    pub is_junk: bool,
}

impl ReadInfo {
    /// Compute 5'/3' trimming and flag reads with ambiguous bases in the kept window
    pub fn trim(&mut self, min_qual_trim: u8) {
        let seq = self.seq.as_bytes();
        let qv = self.qv.as_bytes();
        let len = seq.len();
        let keep = |i: usize| is_dna(seq[i]) && qv.get(i).map_or(false, |&q| q >= min_qual_trim);

        let mut trim5 = 0;
        while trim5 < len && !keep(trim5) {
            trim5 += 1;
        }
        if trim5 >= len {
            self.trim5 = len;
            self.trim3 = 0;
            self.is_junk = true;
            return;
        }

        let mut trim3 = 0;
        while trim3 < len && !keep(len - 1 - trim3) {
            trim3 += 1;
        }

        self.trim5 = trim5;
        self.trim3 = trim3;
        self.is_junk = seq[trim5..len - trim3].iter().any(|&b| !is_dna(b));
    }

    /// Sequence left after trimming
    pub fn trimmed_seq(&self) -> &str {
        trimmed(&self.seq, self.trim5, self.trim3)
    }

    pub fn trimmed_qv(&self) -> &str {
        trimmed(&self.qv, self.trim5, self.trim3)
    }
}

fn trimmed(s: &str, trim5: usize, trim3: usize) -> &str {
    let start = trim5.min(s.len());
    let end = s.len().saturating_sub(trim3).max(start);
    &s[start..end]
}
