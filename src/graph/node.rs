use ahash::AHashSet;
use serde::Serialize;

use crate::graph::edge::{Edge, EdgeDir};
use crate::graph::{NodeId, ReadId};
use crate::kmer::kmer::{CanonicalMer, Kmer, Ori};

/// Sequencing sample a read comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sample {
    Tumor,
    Normal,
}

/// Strand a read aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strand {
    Fwd,
    Rev,
}

/// Coverage of a single node or reference position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BaseCoverage {
    pub fwd: u32,
    pub rev: u32,
    /// Reads whose base passed the calling quality
    pub minqv_fwd: u32,
    pub minqv_rev: u32,
    /// Haplotype counts (unassigned, haplotype 1, haplotype 2)
    pub hp0: u32,
    pub hp1: u32,
    pub hp2: u32,
}

impl BaseCoverage {
    pub fn total(&self) -> u32 {
        self.fwd + self.rev
    }

    pub fn total_minqv(&self) -> u32 {
        self.minqv_fwd + self.minqv_rev
    }
}

/// Which samples cover a position of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CovStatus {
    Tumor,
    Normal,
    Both,
    Empty,
}

impl CovStatus {
    fn merge(self, other: CovStatus) -> CovStatus {
        match (self, other) {
            (CovStatus::Empty, s) => s,
            (s, CovStatus::Empty) => s,
            (a, b) if a == b => a,
            _ => CovStatus::Both,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            CovStatus::Tumor => 'T',
            CovStatus::Normal => 'N',
            CovStatus::Both => 'B',
            CovStatus::Empty => 'E',
        }
    }
}

/// Where a read starts within a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStart {
    pub read_id: ReadId,
    pub offset: usize,
    pub trim5: usize,
    pub ori: Ori,
}

/// A vertex of the local de Bruijn graph: one k-mer, or a compressed run of them
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub seq: String,

    pub cov_tmr_fwd: f64,
    pub cov_tmr_rev: f64,
    pub cov_nml_fwd: f64,
    pub cov_nml_rev: f64,

    /// Per-position coverage, always as long as `seq`
    pub cov_distr_tmr: Vec<BaseCoverage>,
    pub cov_distr_nml: Vec<BaseCoverage>,
    pub cov_status: Vec<CovStatus>,

    pub min_cov: u32,
    pub min_cov_qv: u32,

    pub is_tumor: bool,
    pub is_normal: bool,
    pub touch_ref: bool,
    pub is_source: bool,
    pub is_sink: bool,
    pub dead: bool,
    pub component: usize,
    pub on_ref_path: usize,

    pub edges: Vec<Edge>,
    pub reads: AHashSet<ReadId>,
    pub read_starts: Vec<ReadStart>,

    pub bx_tmr_fwd: AHashSet<String>,
    pub bx_tmr_rev: AHashSet<String>,
    pub bx_nml_fwd: AHashSet<String>,
    pub bx_nml_rev: AHashSet<String>,
    pub hp_tmr: [u32; 3],
    pub hp_nml: [u32; 3],

    pub mate1_names: Vec<String>,
    pub mate2_names: Vec<String>,
}

impl Node {
    pub fn new(id: NodeId, seq: String) -> Self {
        let len = seq.len();
        Self {
            id,
            seq,
            cov_tmr_fwd: 0.0,
            cov_tmr_rev: 0.0,
            cov_nml_fwd: 0.0,
            cov_nml_rev: 0.0,
            cov_distr_tmr: vec![BaseCoverage::default(); len],
            cov_distr_nml: vec![BaseCoverage::default(); len],
            cov_status: vec![CovStatus::Empty; len],
            min_cov: 0,
            min_cov_qv: 0,
            is_tumor: false,
            is_normal: false,
            touch_ref: false,
            is_source: false,
            is_sink: false,
            dead: false,
            component: 0,
            on_ref_path: 0,
            edges: Vec::new(),
            reads: AHashSet::new(),
            read_starts: Vec::new(),
            bx_tmr_fwd: AHashSet::new(),
            bx_tmr_rev: AHashSet::new(),
            bx_nml_fwd: AHashSet::new(),
            bx_nml_rev: AHashSet::new(),
            hp_tmr: [0; 3],
            hp_nml: [0; 3],
            mate1_names: Vec::new(),
            mate2_names: Vec::new(),
        }
    }

    /// Node holding a single k-mer
    pub fn from_kmer(mer: &Kmer) -> Self {
        Self::new(mer.clone(), mer.clone())
    }

    /// Synthetic source or sink node; carries no sequence
    pub fn special(id: NodeId, is_source: bool) -> Self {
        let mut node = Self::new(id, String::new());
        node.is_source = is_source;
        node.is_sink = !is_source;
        node
    }

    pub fn is_special(&self) -> bool {
        self.is_source || self.is_sink
    }

    /// True if the node links to itself
    pub fn is_tandem(&self) -> bool {
        self.edges.iter().any(|e| e.node_id == self.id)
    }

    pub fn strlen(&self) -> usize {
        if self.is_special() {
            0
        } else {
            self.seq.len()
        }
    }

    /// Number of k-mers in the node
    pub fn size(&self, k: usize) -> usize {
        (self.strlen() + 1).saturating_sub(k)
    }

    /// Sequence of the node read in orientation `ori`
    pub fn oriented_seq(&self, ori: Ori) -> String {
        match ori {
            Ori::F => self.seq.clone(),
            Ori::R => crate::kmer::kmer::reverse_complement(&self.seq),
        }
    }

    /// Coverage track of `sample` read in orientation `ori`
    pub fn oriented_cov(&self, sample: Sample, ori: Ori) -> Vec<BaseCoverage> {
        let mut distr = self.cov_distr(sample).clone();
        if ori == Ori::R {
            distr.reverse();
        }
        distr
    }

    /// Sequence and every per-position array agree in length
    pub fn is_synced(&self) -> bool {
        let len = self.seq.len();
        self.cov_distr_tmr.len() == len && self.cov_distr_nml.len() == len && self.cov_status.len() == len
    }

    // Edges

    /// Add an edge, or record another supporting read on an existing one
    pub fn add_edge(&mut self, node_id: &str, dir: EdgeDir, read: Option<ReadId>) {
        if let Some(edge) = self.edges.iter_mut().find(|e| e.node_id == node_id && e.dir == dir) {
            if let Some(r) = read {
                edge.reads.insert(r);
            }
            return;
        }
        let mut edge = Edge::new(node_id.to_string(), dir);
        if let Some(r) = read {
            edge.reads.insert(r);
        }
        self.edges.push(edge);
    }

    /// Redirect the edge (old_id, old_dir) to (new_id, new_dir)
    pub fn update_edge(&mut self, old_id: &str, old_dir: EdgeDir, new_id: &str, new_dir: EdgeDir) -> bool {
        match self.edges.iter_mut().find(|e| e.node_id == old_id && e.dir == old_dir) {
            Some(edge) => {
                edge.node_id = new_id.to_string();
                edge.dir = new_dir;
                true
            }
            None => false,
        }
    }

    /// Remove the edge (node_id, dir); returns false if it was not present
    pub fn remove_edge(&mut self, node_id: &str, dir: EdgeDir) -> bool {
        match self.edges.iter().position(|e| e.node_id == node_id && e.dir == dir) {
            Some(idx) => {
                self.edges.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Number of edges leaving the node when it is read in `ori`
    pub fn degree(&self, ori: Ori) -> usize {
        self.edges.iter().filter(|e| e.is_dir(ori)).count()
    }

    pub fn total_degree(&self) -> usize {
        self.edges.len()
    }

    /// The unique neighbour in direction `ori`, if there is one and it is not the node itself
    pub fn buddy(&self, ori: Ori) -> Option<(NodeId, EdgeDir)> {
        if self.is_special() {
            return None;
        }
        let mut found = None;
        for edge in self.edges.iter().filter(|e| e.is_dir(ori)) {
            if found.is_some() {
                return None;
            }
            found = Some((edge.node_id.clone(), edge.dir));
        }
        match found {
            Some((id, _)) if id == self.id => None,
            other => other,
        }
    }

    pub fn clear_visited(&mut self) {
        for edge in self.edges.iter_mut() {
            edge.visited = false;
        }
    }

    // Coverage

    pub fn cov(&self, strand: Strand, sample: Sample) -> f64 {
        match (sample, strand) {
            (Sample::Tumor, Strand::Fwd) => self.cov_tmr_fwd,
            (Sample::Tumor, Strand::Rev) => self.cov_tmr_rev,
            (Sample::Normal, Strand::Fwd) => self.cov_nml_fwd,
            (Sample::Normal, Strand::Rev) => self.cov_nml_rev,
        }
    }

    pub fn inc_cov(&mut self, strand: Strand, sample: Sample) {
        match (sample, strand) {
            (Sample::Tumor, Strand::Fwd) => self.cov_tmr_fwd += 1.0,
            (Sample::Tumor, Strand::Rev) => self.cov_tmr_rev += 1.0,
            (Sample::Normal, Strand::Fwd) => self.cov_nml_fwd += 1.0,
            (Sample::Normal, Strand::Rev) => self.cov_nml_rev += 1.0,
        }
    }

    pub fn set_cov(&mut self, value: f64) {
        self.cov_tmr_fwd = value;
        self.cov_tmr_rev = 0.0;
        self.cov_nml_fwd = 0.0;
        self.cov_nml_rev = 0.0;
    }

    pub fn tot_cov_tmr(&self) -> f64 {
        self.cov_tmr_fwd + self.cov_tmr_rev
    }

    pub fn tot_cov_nml(&self) -> f64 {
        self.cov_nml_fwd + self.cov_nml_rev
    }

    pub fn tot_cov(&self) -> f64 {
        self.tot_cov_tmr() + self.tot_cov_nml()
    }

    pub fn cov_distr(&self, sample: Sample) -> &Vec<BaseCoverage> {
        match sample {
            Sample::Tumor => &self.cov_distr_tmr,
            Sample::Normal => &self.cov_distr_nml,
        }
    }

    fn cov_distr_mut(&mut self, sample: Sample) -> &mut Vec<BaseCoverage> {
        match sample {
            Sample::Tumor => &mut self.cov_distr_tmr,
            Sample::Normal => &mut self.cov_distr_nml,
        }
    }

    /// Set the strand coverage of every position to `cov` and count the
    /// bases whose quality reaches `min_qual`
    pub fn update_cov_distr(&mut self, cov: u32, qv: &[u8], strand: Strand, sample: Sample, min_qual: u8) {
        let distr = self.cov_distr_mut(sample);
        for (i, c) in distr.iter_mut().enumerate() {
            let good = qv.get(i).map_or(false, |&q| q >= min_qual);
            match strand {
                Strand::Fwd => {
                    c.fwd = cov;
                    if good {
                        c.minqv_fwd += 1;
                    }
                }
                Strand::Rev => {
                    c.rev = cov;
                    if good {
                        c.minqv_rev += 1;
                    }
                }
            }
        }
    }

    /// Set haplotype counts at positions whose quality reaches `min_qual`
    pub fn update_hp_cov_distr(&mut self, hp: [u32; 3], qv: &[u8], sample: Sample, min_qual: u8) {
        let distr = self.cov_distr_mut(sample);
        for (i, c) in distr.iter_mut().enumerate() {
            if qv.get(i).map_or(false, |&q| q >= min_qual) {
                c.hp0 = hp[0];
                c.hp1 = hp[1];
                c.hp2 = hp[2];
            }
        }
    }

    pub fn update_cov_status(&mut self, status: CovStatus) {
        for s in self.cov_status.iter_mut() {
            *s = s.merge(status);
        }
    }

    /// True if any position carries `status`
    pub fn is_status_cnt(&self, status: CovStatus) -> bool {
        self.cov_status.iter().any(|&s| s == status)
    }

    pub fn compute_min_cov(&mut self) {
        let n = self.seq.len();
        let mut min_cov = u32::MAX;
        let mut min_cov_qv = u32::MAX;
        for i in 0..n {
            let t = &self.cov_distr_tmr[i];
            let m = &self.cov_distr_nml[i];
            min_cov = min_cov.min(t.total() + m.total());
            min_cov_qv = min_cov_qv.min(t.total_minqv() + m.total_minqv());
        }
        self.min_cov = if n == 0 { 0 } else { min_cov };
        self.min_cov_qv = if n == 0 { 0 } else { min_cov_qv };
    }

    /// Average of the non-zero positions of a sample's coverage
    pub fn avg_cov_distr(&self, sample: Sample) -> f64 {
        let nonzero: Vec<u32> = self
            .cov_distr(sample)
            .iter()
            .map(|c| c.total())
            .filter(|&c| c > 0)
            .collect();
        if nonzero.is_empty() {
            0.0
        } else {
            nonzero.iter().sum::<u32>() as f64 / nonzero.len() as f64
        }
    }

    pub fn min_non0_cov(&self, sample: Sample) -> u32 {
        self.cov_distr(sample)
            .iter()
            .map(|c| c.total())
            .filter(|&c| c > 0)
            .min()
            .unwrap_or(0)
    }

    /// Reverse every position-indexed array
    pub fn rev_cov_distr(&mut self) {
        self.cov_distr_tmr.reverse();
        self.cov_distr_nml.reverse();
        self.cov_status.reverse();
    }

    /// Mirror read starts onto the reverse-complemented sequence
    pub fn rev_reads(&mut self) {
        let len = self.seq.len();
        for rs in self.read_starts.iter_mut() {
            rs.offset = len.saturating_sub(1 + rs.offset);
            rs.ori = rs.ori.flip();
        }
    }

    pub fn add_read_start(&mut self, read_id: ReadId, offset: usize, trim5: usize, ori: Ori) {
        self.reads.insert(read_id);
        self.read_starts.push(ReadStart { read_id, offset, trim5, ori });
    }

    // Mates

    pub fn add_mate_name(&mut self, name: &str, mate_order: u8) {
        match mate_order {
            1 => self.mate1_names.push(name.to_string()),
            2 => self.mate2_names.push(name.to_string()),
            _ => {}
        }
    }

    /// True if the other mate of this fragment already touched the node
    pub fn has_overlapping_mate(&self, name: &str, mate_order: u8) -> bool {
        let others = match mate_order {
            1 => &self.mate2_names,
            2 => &self.mate1_names,
            _ => return false,
        };
        others.iter().any(|n| n == name)
    }

    pub fn dedup_mate_names(&mut self) {
        self.mate1_names.sort_unstable();
        self.mate1_names.dedup();
        self.mate2_names.sort_unstable();
        self.mate2_names.dedup();
    }

    // Barcodes and haplotypes

    fn bx_set_mut(&mut self, strand: Strand, sample: Sample) -> &mut AHashSet<String> {
        match (sample, strand) {
            (Sample::Tumor, Strand::Fwd) => &mut self.bx_tmr_fwd,
            (Sample::Tumor, Strand::Rev) => &mut self.bx_tmr_rev,
            (Sample::Normal, Strand::Fwd) => &mut self.bx_nml_fwd,
            (Sample::Normal, Strand::Rev) => &mut self.bx_nml_rev,
        }
    }

    pub fn add_bx(&mut self, bx: &str, strand: Strand, sample: Sample) {
        self.bx_set_mut(strand, sample).insert(bx.to_string());
    }

    pub fn has_bx(&self, bx: &str, sample: Sample) -> bool {
        match sample {
            Sample::Tumor => self.bx_tmr_fwd.contains(bx) || self.bx_tmr_rev.contains(bx),
            Sample::Normal => self.bx_nml_fwd.contains(bx) || self.bx_nml_rev.contains(bx),
        }
    }

    pub fn bx_cnt(&self, strand: Strand, sample: Sample) -> u32 {
        let set = match (sample, strand) {
            (Sample::Tumor, Strand::Fwd) => &self.bx_tmr_fwd,
            (Sample::Tumor, Strand::Rev) => &self.bx_tmr_rev,
            (Sample::Normal, Strand::Fwd) => &self.bx_nml_fwd,
            (Sample::Normal, Strand::Rev) => &self.bx_nml_rev,
        };
        set.len() as u32
    }

    pub fn add_hp(&mut self, hp: usize, sample: Sample) {
        let counts = match sample {
            Sample::Tumor => &mut self.hp_tmr,
            Sample::Normal => &mut self.hp_nml,
        };
        if let Some(c) = counts.get_mut(hp) {
            *c += 1;
        }
    }

    pub fn hp_counts(&self, sample: Sample) -> [u32; 3] {
        match sample {
            Sample::Tumor => self.hp_tmr,
            Sample::Normal => self.hp_nml,
        }
    }

    /// Flag the node if any of its k-mers occurs in the reference
    pub fn mark_ref(&mut self, ref_mers: &AHashSet<Kmer>, k: usize) -> bool {
        if self.is_special() || self.seq.len() < k {
            return false;
        }
        let seq = &self.seq;
        let hit = (0..=seq.len() - k).any(|i| ref_mers.contains(&CanonicalMer::new(&seq[i..i + k]).mer));
        self.touch_ref = hit;
        hit
    }
}
