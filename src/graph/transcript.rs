//! Mutation events coalesced from adjacent non-matching alignment columns

use crate::graph::node::BaseCoverage;

/// Kind of difference a transcript describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationCode {
    Snv,
    /// Bases present in the walk but not the reference
    Ins,
    /// Reference bases missing from the walk
    Del,
    Complex,
}

impl MutationCode {
    /// Column code of a non-matching alignment column, `None` for a match
    pub fn from_columns(ref_base: u8, path_base: u8) -> Option<Self> {
        if ref_base == path_base {
            None
        } else if ref_base == b'-' {
            Some(MutationCode::Ins)
        } else if path_base == b'-' {
            Some(MutationCode::Del)
        } else {
            Some(MutationCode::Snv)
        }
    }

    pub fn as_char(self) -> char {
        match self {
            MutationCode::Snv => 'x',
            MutationCode::Ins => '^',
            MutationCode::Del => 'v',
            MutationCode::Complex => 'c',
        }
    }
}

impl std::fmt::Display for MutationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Summary coverage of a transcript as reported on a variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscriptStats {
    pub ref_nml: (u32, u32),
    pub ref_tmr: (u32, u32),
    pub alt_nml: (u32, u32),
    pub alt_tmr: (u32, u32),
    /// Haplotype counts ordered (hp1, hp2, hp0)
    pub hp_ref_nml: [u32; 3],
    pub hp_ref_tmr: [u32; 3],
    pub hp_alt_nml: [u32; 3],
    pub hp_alt_tmr: [u32; 3],
}

impl TranscriptStats {
    pub fn has_alt_support(&self) -> bool {
        self.alt_nml.0 > 0 || self.alt_nml.1 > 0 || self.alt_tmr.0 > 0 || self.alt_tmr.1 > 0
    }
}

/// One mutation event found while scanning an alignment
#[derive(Debug, Clone)]
pub struct Transcript {
    /// 1-based reference position of the first column
    pub pos: usize,
    /// Offset of the first column in the trimmed reference
    pub ref_pos: usize,
    /// 1-based offset of the first column in the walk sequence
    pub start_pos: usize,
    /// 0-based offset of the last column in the walk sequence
    pub end_pos: usize,
    pub ref_end_pos: usize,
    pub code: MutationCode,
    pub ref_seq: String,
    pub alt_seq: String,
    pub prev_bp_ref: char,
    pub prev_bp_alt: char,
    pub is_somatic: bool,

    alt_nml: Vec<BaseCoverage>,
    alt_tmr: Vec<BaseCoverage>,
    ref_nml: Vec<BaseCoverage>,
    ref_tmr: Vec<BaseCoverage>,
}

impl Transcript {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: usize,
        ref_pos: usize,
        path_pos: usize,
        code: MutationCode,
        ref_base: char,
        alt_base: char,
        prev_bp_ref: char,
        prev_bp_alt: char,
        is_somatic: bool,
    ) -> Self {
        Self {
            pos,
            ref_pos,
            start_pos: path_pos + 1,
            end_pos: path_pos,
            ref_end_pos: ref_pos,
            code,
            ref_seq: ref_base.to_string(),
            alt_seq: alt_base.to_string(),
            prev_bp_ref,
            prev_bp_alt,
            is_somatic,
            alt_nml: Vec::new(),
            alt_tmr: Vec::new(),
            ref_nml: Vec::new(),
            ref_tmr: Vec::new(),
        }
    }

    /// Append one more column to the event
    pub fn extend(&mut self, ref_base: char, alt_base: char, path_pos: usize, ref_pos: usize) {
        self.ref_seq.push(ref_base);
        self.alt_seq.push(alt_base);
        self.end_pos = path_pos;
        self.ref_end_pos = ref_pos;
    }

    pub fn add_alt_cov(&mut self, normal: BaseCoverage, tumor: BaseCoverage) {
        self.alt_nml.push(normal);
        self.alt_tmr.push(tumor);
    }

    pub fn add_ref_cov(&mut self, normal: BaseCoverage, tumor: BaseCoverage) {
        self.ref_nml.push(normal);
        self.ref_tmr.push(tumor);
    }

    /// Reference position just past the deleted bases
    pub fn del_end(&self) -> usize {
        self.pos + self.ref_seq.len()
    }

    /// Reduce the collected coverage: minimum over columns, with average
    /// reference and zero normal alt support for somatic events
    pub fn stats(&self) -> TranscriptStats {
        let snv = self.code == MutationCode::Snv;
        let alt = |covs: &[BaseCoverage]| {
            if snv {
                (min_of(covs, |c| c.minqv_fwd), min_of(covs, |c| c.minqv_rev))
            } else {
                (min_of(covs, |c| c.fwd), min_of(covs, |c| c.rev))
            }
        };
        let hp_min = |covs: &[BaseCoverage]| [min_of(covs, |c| c.hp1), min_of(covs, |c| c.hp2), min_of(covs, |c| c.hp0)];
        let hp_avg = |covs: &[BaseCoverage]| [avg_of(covs, |c| c.hp1), avg_of(covs, |c| c.hp2), avg_of(covs, |c| c.hp0)];

        let mut stats = TranscriptStats {
            alt_nml: alt(&self.alt_nml),
            alt_tmr: alt(&self.alt_tmr),
            hp_alt_nml: hp_min(&self.alt_nml),
            hp_alt_tmr: hp_min(&self.alt_tmr),
            ..Default::default()
        };
        if self.is_somatic {
            stats.ref_nml = (avg_of(&self.ref_nml, |c| c.fwd), avg_of(&self.ref_nml, |c| c.rev));
            stats.ref_tmr = (avg_of(&self.ref_tmr, |c| c.fwd), avg_of(&self.ref_tmr, |c| c.rev));
            stats.hp_ref_nml = hp_avg(&self.ref_nml);
            stats.hp_ref_tmr = hp_avg(&self.ref_tmr);
            stats.alt_nml = (0, 0);
            stats.hp_alt_nml = [0; 3];
        } else {
            stats.ref_nml = (min_of(&self.ref_nml, |c| c.fwd), min_of(&self.ref_nml, |c| c.rev));
            stats.ref_tmr = (min_of(&self.ref_tmr, |c| c.fwd), min_of(&self.ref_tmr, |c| c.rev));
            stats.hp_ref_nml = hp_min(&self.ref_nml);
            stats.hp_ref_tmr = hp_min(&self.ref_tmr);
        }
        stats
    }
}

fn min_of(covs: &[BaseCoverage], field: impl Fn(&BaseCoverage) -> u32) -> u32 {
    covs.iter().map(field).min().unwrap_or(0)
}

fn avg_of(covs: &[BaseCoverage], field: impl Fn(&BaseCoverage) -> u32) -> u32 {
    if covs.is_empty() {
        return 0;
    }
    let sum: u64 = covs.iter().map(|c| field(c) as u64).sum();
    (sum / covs.len() as u64) as u32
}
