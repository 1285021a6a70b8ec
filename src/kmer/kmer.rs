use serde::{Deserialize, Serialize};

pub type Kmer = String;

/// Orientation of a k-mer relative to its canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ori {
    F,
    R,
}

impl Ori {
    pub fn flip(self) -> Ori {
        match self {
            Ori::F => Ori::R,
            Ori::R => Ori::F,
        }
    }
}

impl std::fmt::Display for Ori {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ori::F => write!(f, "F"),
            Ori::R => write!(f, "R"),
        }
    }
}

/// A k-mer in canonical form together with the orientation it was observed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMer {
    pub mer: Kmer,
    pub ori: Ori,
}

impl CanonicalMer {
    /// Canonicalize `seq`: the smaller of the sequence and its reverse complement
    pub fn new(seq: &str) -> Self {
        let rc = reverse_complement(seq);
        if seq <= rc.as_str() {
            CanonicalMer { mer: seq.to_string(), ori: Ori::F }
        } else {
            CanonicalMer { mer: rc, ori: Ori::R }
        }
    }
}

pub fn is_dna(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// Returns the canonical form of a k-mer, or None if it holds a non-ACGT base
pub fn canonical_kmer(seq: &str) -> Option<Kmer> {
    if !seq.bytes().all(is_dna) {
        return None;
    }
    Some(CanonicalMer::new(seq).mer)
}

pub fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        other => other,
    }
}

/// Returns the reverse complement of a DNA sequence
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

/// Number of mismatching positions, or None when the lengths differ
pub fn hamming_distance(a: &str, b: &str) -> Option<usize> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ACGTTG"), "CAACGT");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_canonical_orientation() {
        let fwd = CanonicalMer::new("ACCGT");
        assert_eq!(fwd.mer, "ACCGT");
        assert_eq!(fwd.ori, Ori::F);

        let rev = CanonicalMer::new("TTGCA");
        assert_eq!(rev.mer, "TGCAA");
        assert_eq!(rev.ori, Ori::R);
        assert_eq!(CanonicalMer::new(&rev.mer).mer, rev.mer);
    }

    #[test]
    fn test_canonical_kmer_rejects_ambiguous_bases() {
        assert_eq!(canonical_kmer("ACNGT"), None);
        assert_eq!(canonical_kmer("GGGG"), Some("CCCC".to_string()));
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance("ACGT", "ACCT"), Some(1));
        assert_eq!(hamming_distance("ACGT", "ACG"), None);
    }
}
