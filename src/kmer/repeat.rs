use ahash::AHashSet;

use crate::kmer::kmer::{canonical_kmer, hamming_distance};

/// A short tandem repeat found in a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tandem {
    /// Start of the repeat (0-based, inclusive)
    pub start: usize,
    /// End of the repeat (0-based, exclusive)
    pub end: usize,
    pub motif: String,
}

impl Tandem {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Copy count rounded down
    pub fn units(&self) -> usize {
        self.len() / self.motif.len()
    }

    /// Annotation string "LENMOTIF"
    pub fn annotation(&self) -> String {
        format!("{}{}", self.len(), self.motif)
    }
}

/// Parameters for STR detection
#[derive(Debug, Clone, Copy)]
pub struct TandemParams {
    pub max_unit_len: usize,
    pub min_report_units: usize,
    pub min_report_len: usize,
    pub dist_from_str: usize,
}

/// A motif is primitive if it is not itself a repeat of a shorter unit
fn is_primitive(motif: &[u8]) -> bool {
    let n = motif.len();
    (1..n).filter(|u| n % u == 0).all(|u| {
        motif.chunks(u).any(|chunk| chunk != &motif[..u])
    })
}

/// Find all maximal tandem repeats satisfying the reporting thresholds
pub fn find_all_tandems(seq: &str, params: &TandemParams) -> Vec<Tandem> {
    let bytes = seq.as_bytes();
    let mut tandems: Vec<Tandem> = Vec::new();

    for unit in 1..=params.max_unit_len {
        let mut i = 0;
        while i + unit <= bytes.len() {
            let motif = &bytes[i..i + unit];
            if !is_primitive(motif) {
                i += 1;
                continue;
            }

            // Extend by whole copies, then by a trailing partial copy
            let mut end = i + unit;
            while end + unit <= bytes.len() && &bytes[end..end + unit] == motif {
                end += unit;
            }
            let copies = (end - i) / unit;
            while end < bytes.len() && bytes[end] == motif[(end - i) % unit] {
                end += 1;
            }

            if copies >= params.min_report_units && end - i >= params.min_report_len {
                tandems.push(Tandem {
                    start: i,
                    end,
                    motif: seq[i..i + unit].to_string(),
                });
                i = end - unit + 1;
            } else {
                i += 1;
            }
        }
    }

    tandems
}

/// Find the longest tandem repeat lying within `dist_from_str` of `pos`
pub fn find_tandem_at(seq: &str, pos: usize, params: &TandemParams) -> Option<Tandem> {
    find_all_tandems(seq, params)
        .into_iter()
        .filter(|t| {
            pos + params.dist_from_str >= t.start && pos <= t.end + params.dist_from_str
        })
        .max_by(|a, b| a.len().cmp(&b.len()).then(b.start.cmp(&a.start)))
}

/// True if any canonical k-mer occurs more than once in `seq`
pub fn is_repeat(seq: &str, k: usize) -> bool {
    if seq.len() < k {
        return false;
    }
    let mut seen = AHashSet::new();
    for i in 0..=seq.len() - k {
        if let Some(mer) = canonical_kmer(&seq[i..i + k]) {
            if !seen.insert(mer) {
                return true;
            }
        }
    }
    false
}

/// True if two k-mers of `seq` differ by at most `max_mismatch` bases
pub fn is_almost_repeat(seq: &str, k: usize, max_mismatch: usize) -> bool {
    if seq.len() < k {
        return false;
    }
    let n = seq.len() - k + 1;
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(d) = hamming_distance(&seq[i..i + k], &seq[j..j + k]) {
                if d <= max_mismatch {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TandemParams {
        TandemParams { max_unit_len: 4, min_report_units: 3, min_report_len: 7, dist_from_str: 1 }
    }

    #[test]
    fn test_primitive_motifs() {
        assert!(is_primitive(b"AC"));
        assert!(!is_primitive(b"AA"));
        assert!(!is_primitive(b"ACAC"));
        assert!(is_primitive(b"AACT"));
    }

    #[test]
    fn test_homopolymer_tandem() {
        let seq = "GCTAAAAAAAAGCT";
        let t = find_tandem_at(seq, 5, &params()).unwrap();
        assert_eq!(t.motif, "A");
        assert_eq!(t.start, 3);
        assert_eq!(t.end, 11);
        assert_eq!(t.annotation(), "8A");
    }

    #[test]
    fn test_dinucleotide_tandem_with_partial_copy() {
        let seq = "GGCACACACACAGTT";
        let t = find_tandem_at(seq, 2, &params()).unwrap();
        assert_eq!(t.motif, "CA");
        assert_eq!(t.start, 2);
        assert_eq!(t.end, 12);
        assert_eq!(t.units(), 5);
    }

    #[test]
    fn test_position_outside_repeat() {
        let seq = "GGCACACACACAGTTGCATGCTTGAC";
        assert!(find_tandem_at(seq, 20, &params()).is_none());
        // one base beyond the end still counts
        assert!(find_tandem_at(seq, 13, &params()).is_some());
    }

    #[test]
    fn test_too_short_to_report() {
        assert!(find_all_tandems("GCAAAGC", &params()).is_empty());
    }

    #[test]
    fn test_exact_and_almost_repeats() {
        assert!(is_repeat("ACGTTACGTT", 5));
        assert!(!is_repeat("ACGGTCATTG", 5));
        assert!(is_almost_repeat("ACGTTGACGATG", 5, 1));
        assert!(!is_almost_repeat("AAAAACCCCC", 5, 0));
    }
}
