use serde::{Deserialize, Serialize};

use crate::graph::transcript::{MutationCode, Transcript, TranscriptStats};

/// Kind of sequence difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantType {
    Snv,
    Ins,
    Del,
    Complex,
}

impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VariantType::Snv => "snv",
            VariantType::Ins => "ins",
            VariantType::Del => "del",
            VariantType::Complex => "complex",
        };
        write!(f, "{}", s)
    }
}

/// Which samples carry the alternative allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantStatus {
    Somatic,
    Shared,
    Normal,
    None,
}

/// Read counts on the forward and reverse strand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandCounts {
    pub fwd: u32,
    pub rev: u32,
}

impl StrandCounts {
    pub fn total(&self) -> u32 {
        self.fwd + self.rev
    }
}

impl From<(u32, u32)> for StrandCounts {
    fn from((fwd, rev): (u32, u32)) -> Self {
        Self { fwd, rev }
    }
}

/// A candidate variant reported by the assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub chrom: String,
    /// 1-based position; for non-SNVs the position of the leading base
    pub pos: usize,
    pub ref_allele: String,
    pub alt_allele: String,
    pub kind: VariantType,
    pub len: usize,
    pub is_somatic: bool,
    /// k-mer size of the graph that produced the call
    pub kmer: usize,
    /// Number of times the same call was observed
    pub similar_variants_count: u32,

    pub ref_cov_normal: StrandCounts,
    pub ref_cov_tumor: StrandCounts,
    pub alt_cov_normal: StrandCounts,
    pub alt_cov_tumor: StrandCounts,

    /// Haplotype counts ordered (hp1, hp2, unassigned)
    pub hp_ref_normal: [u32; 3],
    pub hp_ref_tumor: [u32; 3],
    pub hp_alt_normal: [u32; 3],
    pub hp_alt_tumor: [u32; 3],

    pub prev_bp_ref: char,
    pub prev_bp_alt: char,
    /// Tandem repeat around the call as length followed by motif, empty if none
    pub str_annotation: String,

    pub bx_ref_normal: String,
    pub bx_ref_tumor: String,
    pub bx_alt_normal: String,
    pub bx_alt_tumor: String,
}

impl Variant {
    /// Build a variant from a coalesced transcript. `pos` is the position of
    /// the base preceding the event.
    pub fn from_transcript(
        chrom: &str,
        pos: usize,
        transcript: &Transcript,
        stats: &TranscriptStats,
        kmer: usize,
        str_annotation: String,
    ) -> Self {
        let (kind, pos, ref_allele, alt_allele, len) = match transcript.code {
            MutationCode::Snv => (VariantType::Snv, pos + 1, transcript.ref_seq.clone(), transcript.alt_seq.clone(), 1),
            MutationCode::Ins => {
                let alt = format!("{}{}", transcript.prev_bp_alt, transcript.alt_seq);
                (VariantType::Ins, pos, transcript.prev_bp_alt.to_string(), alt, transcript.alt_seq.len())
            }
            MutationCode::Del => {
                let reference = format!("{}{}", transcript.prev_bp_alt, transcript.ref_seq);
                (VariantType::Del, pos, reference, transcript.prev_bp_alt.to_string(), transcript.ref_seq.len())
            }
            MutationCode::Complex => {
                let r = transcript.ref_seq.replace('-', "");
                let a = transcript.alt_seq.replace('-', "");
                let len = if r.len() == a.len() { a.len() } else { r.len().abs_diff(a.len()) };
                let reference = format!("{}{}", transcript.prev_bp_alt, r);
                let alt = format!("{}{}", transcript.prev_bp_alt, a);
                (VariantType::Complex, pos, reference, alt, len)
            }
        };

        Self {
            chrom: chrom.to_string(),
            pos,
            ref_allele,
            alt_allele,
            kind,
            len,
            is_somatic: transcript.is_somatic,
            kmer,
            similar_variants_count: 1,
            ref_cov_normal: stats.ref_nml.into(),
            ref_cov_tumor: stats.ref_tmr.into(),
            alt_cov_normal: stats.alt_nml.into(),
            alt_cov_tumor: stats.alt_tmr.into(),
            hp_ref_normal: stats.hp_ref_nml,
            hp_ref_tumor: stats.hp_ref_tmr,
            hp_alt_normal: stats.hp_alt_nml,
            hp_alt_tumor: stats.hp_alt_tmr,
            prev_bp_ref: transcript.prev_bp_ref,
            prev_bp_alt: transcript.prev_bp_alt,
            str_annotation,
            bx_ref_normal: String::new(),
            bx_ref_tumor: String::new(),
            bx_alt_normal: String::new(),
            bx_alt_tumor: String::new(),
        }
    }

    /// Identity of the call independent of its coverage
    pub fn signature(&self) -> String {
        format!("{}:{}:{}:{}", self.chrom, self.pos, self.ref_allele, self.alt_allele)
    }

    pub fn total_cov(&self) -> u32 {
        self.ref_cov_normal.total() + self.ref_cov_tumor.total() + self.alt_cov_normal.total() + self.alt_cov_tumor.total()
    }

    pub fn status(&self) -> VariantStatus {
        match (self.alt_cov_tumor.total() > 0, self.alt_cov_normal.total() > 0) {
            (true, false) => VariantStatus::Somatic,
            (true, true) => VariantStatus::Shared,
            (false, true) => VariantStatus::Normal,
            (false, false) => VariantStatus::None,
        }
    }

    /// Replace the coverage fields with those of another observation
    pub fn take_coverage(&mut self, other: &Variant) {
        self.kmer = other.kmer;
        self.ref_cov_normal = other.ref_cov_normal;
        self.ref_cov_tumor = other.ref_cov_tumor;
        self.alt_cov_normal = other.alt_cov_normal;
        self.alt_cov_tumor = other.alt_cov_tumor;
        self.hp_ref_normal = other.hp_ref_normal;
        self.hp_ref_tumor = other.hp_ref_tumor;
        self.hp_alt_normal = other.hp_alt_normal;
        self.hp_alt_tumor = other.hp_alt_tumor;
        self.bx_ref_normal = other.bx_ref_normal.clone();
        self.bx_ref_tumor = other.bx_ref_tumor.clone();
        self.bx_alt_normal = other.bx_alt_normal.clone();
        self.bx_alt_tumor = other.bx_alt_tumor.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(code: MutationCode, r: &str, a: &str) -> Transcript {
        let mut t = Transcript::new(11, 10, 10, code, '-', '-', 'G', 'G', false);
        t.ref_seq = r.to_string();
        t.alt_seq = a.to_string();
        t
    }

    #[test]
    fn test_snv_moves_to_its_own_base() {
        let t = transcript(MutationCode::Snv, "C", "T");
        let v = Variant::from_transcript("chr1", 10, &t, &TranscriptStats::default(), 11, String::new());
        assert_eq!((v.pos, v.ref_allele.as_str(), v.alt_allele.as_str(), v.len), (11, "C", "T", 1));
        assert_eq!(v.signature(), "chr1:11:C:T");
    }

    #[test]
    fn test_indels_carry_leading_base() {
        let ins = Variant::from_transcript("chr1", 10, &transcript(MutationCode::Ins, "--", "TT"), &TranscriptStats::default(), 11, String::new());
        assert_eq!((ins.kind, ins.ref_allele.as_str(), ins.alt_allele.as_str(), ins.len), (VariantType::Ins, "G", "GTT", 2));

        let del = Variant::from_transcript("chr1", 10, &transcript(MutationCode::Del, "ACG", "---"), &TranscriptStats::default(), 11, String::new());
        assert_eq!((del.kind, del.ref_allele.as_str(), del.alt_allele.as_str(), del.len), (VariantType::Del, "GACG", "G", 3));
    }

    #[test]
    fn test_complex_length() {
        let v = Variant::from_transcript("chr1", 10, &transcript(MutationCode::Complex, "A-C", "TGG"), &TranscriptStats::default(), 11, String::new());
        assert_eq!((v.ref_allele.as_str(), v.alt_allele.as_str(), v.len), ("GAC", "GTGG", 1));
    }

    #[test]
    fn test_status_from_alt_counts() {
        let mut v = Variant::from_transcript("chr1", 10, &transcript(MutationCode::Snv, "C", "T"), &TranscriptStats::default(), 11, String::new());
        assert_eq!(v.status(), VariantStatus::None);
        v.alt_cov_tumor = StrandCounts { fwd: 2, rev: 1 };
        assert_eq!(v.status(), VariantStatus::Somatic);
        v.alt_cov_normal = StrandCounts { fwd: 0, rev: 1 };
        assert_eq!(v.status(), VariantStatus::Shared);
        assert_eq!(v.total_cov(), 4);
    }
}
