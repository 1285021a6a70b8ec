//! Pairwise alignment of assembled walks against the reference

use bio::alignment::pairwise::{Aligner, MatchParams, Scoring};
use bio::alignment::{Alignment, AlignmentOperation};

/// Two equal-length strings where '-' marks a gap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GappedAlignment {
    pub ref_aln: String,
    pub path_aln: String,
}

impl GappedAlignment {
    /// Ungapped comparison of two equal-length sequences
    pub fn identity(reference: &str, path: &str) -> Self {
        Self { ref_aln: reference.to_string(), path_aln: path.to_string() }
    }

    pub fn len(&self) -> usize {
        self.ref_aln.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ref_aln.is_empty()
    }

    /// (match, mismatch, insertion, deletion) column counts
    pub fn column_counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for (r, p) in self.ref_aln.bytes().zip(self.path_aln.bytes()) {
            if r == p {
                counts.0 += 1;
            } else if r == b'-' {
                counts.2 += 1;
            } else if p == b'-' {
                counts.3 += 1;
            } else {
                counts.1 += 1;
            }
        }
        counts
    }
}

/// Aligns a walk against the reference segment it replaces
pub trait GlobalAligner: Send + Sync {
    /// End-to-end alignment of both sequences
    fn align(&self, reference: &str, path: &str) -> GappedAlignment;

    /// Align all of `query` to the best matching part of `reference`
    fn align_partial(&self, reference: &str, query: &str) -> GappedAlignment;
}

/// Affine-gap aligner backed by `bio`'s pairwise dynamic programming
#[derive(Debug, Clone, Copy)]
pub struct AffineAligner {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub match_score: i32,
    pub mismatch_score: i32,
}

impl Default for AffineAligner {
    fn default() -> Self {
        Self { gap_open: -5, gap_extend: -1, match_score: 1, mismatch_score: -1 }
    }
}

impl AffineAligner {
    fn aligner(&self, x_len: usize, y_len: usize) -> Aligner<MatchParams> {
        let scoring = Scoring::from_scores(self.gap_open, self.gap_extend, self.match_score, self.mismatch_score);
        Aligner::with_capacity_and_scoring(x_len, y_len, scoring)
    }
}

/// Render `alignment` of x against y as gapped strings, x first
fn gapped(alignment: &Alignment, x: &[u8], y: &[u8]) -> (String, String) {
    let mut x_aln = String::with_capacity(x.len() + y.len());
    let mut y_aln = String::with_capacity(x.len() + y.len());
    let (mut xi, mut yi) = (alignment.xstart, alignment.ystart);
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                x_aln.push(x[xi] as char);
                y_aln.push(y[yi] as char);
                xi += 1;
                yi += 1;
            }
            AlignmentOperation::Del => {
                x_aln.push('-');
                y_aln.push(y[yi] as char);
                yi += 1;
            }
            AlignmentOperation::Ins => {
                x_aln.push(x[xi] as char);
                y_aln.push('-');
                xi += 1;
            }
            AlignmentOperation::Xclip(n) => xi += n,
            AlignmentOperation::Yclip(n) => yi += n,
        }
    }
    (x_aln, y_aln)
}

impl GlobalAligner for AffineAligner {
    fn align(&self, reference: &str, path: &str) -> GappedAlignment {
        if reference.is_empty() || path.is_empty() {
            let width = reference.len().max(path.len());
            return GappedAlignment {
                ref_aln: format!("{:-<width$}", reference, width = width),
                path_aln: format!("{:-<width$}", path, width = width),
            };
        }
        let (x, y) = (reference.as_bytes(), path.as_bytes());
        let alignment = self.aligner(x.len(), y.len()).global(x, y);
        let (ref_aln, path_aln) = gapped(&alignment, x, y);
        GappedAlignment { ref_aln, path_aln }
    }

    fn align_partial(&self, reference: &str, query: &str) -> GappedAlignment {
        if reference.is_empty() || query.is_empty() {
            return self.align(reference, query);
        }
        // x = query aligned end to end, y = reference with free end gaps
        let (x, y) = (query.as_bytes(), reference.as_bytes());
        let alignment = self.aligner(x.len(), y.len()).semiglobal(x, y);
        let (path_aln, ref_aln) = gapped(&alignment, x, y);
        GappedAlignment { ref_aln, path_aln }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sequences() {
        let aln = AffineAligner::default().align("ACGTTGCA", "ACGTTGCA");
        assert_eq!(aln.ref_aln, "ACGTTGCA");
        assert_eq!(aln.path_aln, "ACGTTGCA");
        assert_eq!(aln.column_counts(), (8, 0, 0, 0));
    }

    #[test]
    fn test_insertion_in_path() {
        let aln = AffineAligner::default().align("ACGGTCATTGCAGGA", "ACGGTCATTTTGCAGGA");
        assert_eq!(aln.ref_aln.len(), aln.path_aln.len());
        assert_eq!(aln.ref_aln.replace('-', ""), "ACGGTCATTGCAGGA");
        assert_eq!(aln.path_aln.replace('-', ""), "ACGGTCATTTTGCAGGA");
        assert_eq!(aln.column_counts(), (15, 0, 2, 0));
    }

    #[test]
    fn test_deletion_in_path() {
        let aln = AffineAligner::default().align("ACGGTCATTGCAGGA", "ACGGTCGCAGGA");
        assert_eq!(aln.column_counts(), (12, 0, 0, 3));
        assert!(aln.path_aln.contains("---"));
    }

    #[test]
    fn test_partial_alignment_inside_reference() {
        let aln = AffineAligner::default().align_partial("TTTTACGGTCATTGGGGG", "ACGGTCATT");
        assert_eq!(aln.path_aln, "ACGGTCATT");
        assert_eq!(aln.ref_aln, "ACGGTCATT");
    }
}
