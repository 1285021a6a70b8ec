//! Graph ownership, read registry and ingestion

use ahash::{AHashMap, AHashSet};
use tracing::{debug, info};

use crate::config::AssemblyConfig;
use crate::graph::edge::EdgeDir;
use crate::graph::node::{CovStatus, Node, Sample, Strand};
use crate::graph::read::{ReadInfo, ReadLabel};
use crate::graph::{NodeId, ReadId};
use crate::kmer::kmer::{CanonicalMer, Ori};
use crate::reference::{BarcodeTable, ReferenceWindow};

/// Local de Bruijn graph of one reference window
#[derive(Debug, Clone)]
pub struct DeBruijnGraph {
    pub config: AssemblyConfig,
    pub k: usize,
    pub nodes: AHashMap<NodeId, Node>,
    pub reads: Vec<ReadInfo>,
    pub reference: ReferenceWindow,
    pub source: Option<NodeId>,
    pub sink: Option<NodeId>,
    /// Barcodes per graph k-mer (linked-read mode)
    pub barcodes: BarcodeTable,
    /// Bases of non-reference reads loaded into the graph
    pub total_read_bp: usize,
    /// Reads that revisit one of their own k-mers
    pub read_cycles: usize,
    ref_read: Option<ReadId>,
}

impl ReadInfo {
    pub fn new(name: &str, seq: &str, qv: &str, label: ReadLabel, strand: Strand, mate_order: u8) -> Self {
        Self {
            name: name.to_string(),
            set: String::new(),
            seq: seq.to_ascii_uppercase(),
            qv: qv.to_string(),
            code: match label {
                ReadLabel::Tumor => 'T',
                ReadLabel::Normal => 'N',
                ReadLabel::Reference => 'R',
            },
            label,
            strand,
            mate_order,
            barcode: None,
            haplotype: 0,
            trim5: 0,
            trim3: 0,
            is_junk: false,
        }
    }

    pub fn with_set(mut self, set: &str) -> Self {
        self.set = set.to_string();
        self
    }

    pub fn with_code(mut self, code: char) -> Self {
        self.code = code;
        self
    }

    pub fn with_barcode(mut self, barcode: &str, haplotype: usize) -> Self {
        self.barcode = Some(barcode.to_string());
        self.haplotype = haplotype;
        self
    }
}

fn oriented_qv(qv: &[u8], ori: Ori) -> Vec<u8> {
    match ori {
        Ori::F => qv.to_vec(),
        Ori::R => qv.iter().rev().copied().collect(),
    }
}

fn above_qual(qv: &[u8], min_qual: u8) -> bool {
    qv.iter().all(|&q| q >= min_qual)
}

impl DeBruijnGraph {
    pub fn new(config: &AssemblyConfig, mut reference: ReferenceWindow) -> Self {
        reference.set_k(config.k);
        Self {
            config: config.clone(),
            k: config.k,
            nodes: AHashMap::new(),
            reads: Vec::new(),
            reference,
            source: None,
            sink: None,
            barcodes: BarcodeTable::default(),
            total_read_bp: 0,
            read_cycles: 0,
            ref_read: None,
        }
    }

    /// Register a read without trimming it
    pub fn add_read(&mut self, read: ReadInfo) -> ReadId {
        self.reads.push(read);
        self.reads.len() - 1
    }

    /// Register a read and compute its trimming
    pub fn add_alignment(&mut self, read: ReadInfo) -> ReadId {
        let id = self.add_read(read);
        let min_qual = self.config.min_qual_trim();
        self.reads[id].trim(min_qual);
        id
    }

    /// Register both mates of a fragment
    pub fn add_mates(&mut self, mate1: ReadInfo, mate2: ReadInfo) -> (ReadId, ReadId) {
        (self.add_alignment(mate1), self.add_alignment(mate2))
    }

    pub fn read(&self, id: ReadId) -> Option<&ReadInfo> {
        self.reads.get(id)
    }

    /// Registry id of the reference pseudo-read, once the graph has been built
    pub fn ref_read_id(&self) -> Option<ReadId> {
        self.ref_read
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Ids of live nodes, optionally restricted to one component, in sorted order
    pub fn sorted_ids(&self, component: Option<usize>) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.dead && component.map_or(true, |c| n.component == c))
            .map(|n| n.id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Average read coverage over the raw reference window
    pub fn avg_cov(&self) -> f64 {
        let len = self.reference.raw_len();
        if len == 0 {
            0.0
        } else {
            self.total_read_bp as f64 / len as f64
        }
    }

    /// Load the reference pseudo-read and every accepted read into the graph
    pub fn build_graph(&mut self) {
        if self.ref_read.is_none() {
            let raw = self.reference.raw_seq.clone();
            let qv = "K".repeat(raw.len());
            let info = ReadInfo::new("ref", &raw, &qv, ReadLabel::Reference, Strand::Fwd, 0)
                .with_set(&self.reference.chrom);
            self.ref_read = Some(self.add_alignment(info));
        }

        for id in 0..self.reads.len() {
            if self.reads[id].is_junk {
                continue;
            }
            let is_ref = self.reads[id].label == ReadLabel::Reference;
            self.load_sequence(id, is_ref);
        }

        for node in self.nodes.values_mut() {
            node.compute_min_cov();
            node.dedup_mate_names();
        }
        self.reference.compute_coverage(Sample::Tumor);
        self.reference.compute_coverage(Sample::Normal);

        info!(
            "Built graph k={} with {} nodes from {} reads ({} bp)",
            self.k,
            self.nodes.len(),
            self.reads.len(),
            self.total_read_bp
        );
        if self.read_cycles > 0 {
            debug!("{} k-mer repeats found within reads", self.read_cycles);
        }
    }

    /// Thread one read through the graph, creating nodes and mutual edges
    pub fn load_sequence(&mut self, read_id: ReadId, is_ref: bool) {
        let read = self.reads[read_id].clone();
        let seq = read.trimmed_seq();
        let qv = read.trimmed_qv().as_bytes();
        let k = self.k;

        if !is_ref {
            self.total_read_bp += seq.len();
        }
        if seq.len() <= k || qv.len() != seq.len() {
            return;
        }

        let sample = read.label.sample();
        let min_call = self.config.min_qual_call();
        let linked = self.config.linked_reads;
        let mut readmers: AHashSet<String> = AHashSet::new();

        let mut uc = CanonicalMer::new(&seq[0..k]);
        let mut uc_qv = oriented_qv(&qv[0..k], uc.ori);

        for offset in 0..seq.len() - k {
            let vc = CanonicalMer::new(&seq[offset + 1..offset + 1 + k]);
            let vc_qv = oriented_qv(&qv[offset + 1..offset + 1 + k], vc.ori);

            for mer in [&uc.mer, &vc.mer] {
                self.nodes
                    .entry(mer.clone())
                    .or_insert_with(|| Node::from_kmer(mer));
            }

            let good = above_qual(&uc_qv, min_call) && above_qual(&vc_qv, min_call);
            for mer in [&uc.mer, &vc.mer] {
                if let Some(node) = self.nodes.get_mut(mer.as_str()) {
                    match sample {
                        Some(Sample::Normal) => {
                            node.is_normal = true;
                            node.update_cov_status(CovStatus::Normal);
                        }
                        Some(Sample::Tumor) if good => {
                            node.is_tumor = true;
                            node.update_cov_status(CovStatus::Tumor);
                        }
                        _ => {}
                    }
                    node.add_mate_name(&read.name, read.mate_order);
                }
            }

            if linked {
                if let (Some(s), Some(bx)) = (sample, read.barcode.as_deref()) {
                    if offset == 0 {
                        self.record_barcode(&uc.mer, bx, &read, s);
                    }
                    self.record_barcode(&vc.mer, bx, &read, s);
                }
            }

            if let (false, Some(s)) = (is_ref, sample) {
                if offset == 0 && self.add_kmer_coverage(&uc, &uc_qv, &read, s) {
                    let start = if uc.ori == Ori::F { 0 } else { k - 1 };
                    if let Some(node) = self.nodes.get_mut(uc.mer.as_str()) {
                        node.add_read_start(read_id, start, read.trim5, uc.ori);
                    }
                }
                self.add_kmer_coverage(&vc, &vc_qv, &read, s);
            }

            let fdir = EdgeDir::from_oris(uc.ori, vc.ori);
            let rdir = fdir.flip_link();

            readmers.insert(uc.mer.clone());
            if readmers.contains(&vc.mer) {
                self.read_cycles += 1;
            }

            if let Some(unode) = self.nodes.get_mut(uc.mer.as_str()) {
                unode.add_edge(&vc.mer, fdir, Some(read_id));
            }
            if let Some(vnode) = self.nodes.get_mut(vc.mer.as_str()) {
                vnode.add_edge(&uc.mer, rdir, Some(read_id));
            }

            uc = vc;
            uc_qv = vc_qv;
        }
    }

    fn record_barcode(&mut self, mer: &str, bx: &str, read: &ReadInfo, sample: Sample) {
        let mer = mer.to_string();
        self.barcodes.add(bx, &mer, sample);
        self.reference.add_bx(bx, &mer, sample);
        if let Some(node) = self.nodes.get_mut(mer.as_str()) {
            if !node.has_bx(bx, sample) {
                node.add_bx(bx, read.strand, sample);
                node.add_hp(read.haplotype, sample);
            }
        }
    }

    /// Count one read occurrence of a k-mer unless its mate already did.
    /// Returns false when nothing was counted.
    fn add_kmer_coverage(&mut self, mer: &CanonicalMer, qv: &[u8], read: &ReadInfo, sample: Sample) -> bool {
        let min_call = self.config.min_qual_call();
        let Some(node) = self.nodes.get_mut(mer.mer.as_str()) else {
            return false;
        };
        if node.has_overlapping_mate(&read.name, read.mate_order) {
            return false;
        }
        node.inc_cov(read.strand, sample);
        if self.config.linked_reads {
            let cov = node.bx_cnt(read.strand, sample);
            let hp = node.hp_counts(sample);
            node.update_cov_distr(cov, qv, read.strand, sample, min_call);
            node.update_hp_cov_distr(hp, qv, sample, min_call);
            self.reference.update_coverage(&mer.mer, cov, read.strand, sample);
            self.reference.update_hp_coverage(&mer.mer, hp, sample);
        } else {
            let cov = node.cov(read.strand, sample) as u32;
            node.update_cov_distr(cov, qv, read.strand, sample, min_call);
            self.reference.update_coverage(&mer.mer, cov, read.strand, sample);
        }
        true
    }

    /// Mark a node dead and drop the reciprocal edges held by its neighbours
    pub fn remove_node(&mut self, id: &str) {
        let edges = match self.nodes.get_mut(id) {
            Some(node) => {
                node.dead = true;
                std::mem::take(&mut node.edges)
            }
            None => return,
        };
        for edge in edges {
            if edge.node_id == id {
                continue;
            }
            if let Some(other) = self.nodes.get_mut(edge.node_id.as_str()) {
                other.remove_edge(id, edge.dir.flip_link());
            }
        }
    }

    /// Remove one edge and its reciprocal
    pub fn remove_mutual_edge(&mut self, from: &str, to: &str, dir: EdgeDir) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.remove_edge(to, dir);
        }
        if let Some(other) = self.nodes.get_mut(to) {
            other.remove_edge(from, dir.flip_link());
        }
    }

    /// Purge dead nodes; returns how many were removed
    pub fn clean_dead(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, n| !n.dead);
        before - self.nodes.len()
    }

    pub fn clear_visited(&mut self) {
        for node in self.nodes.values_mut() {
            node.clear_visited();
        }
    }

    /// Every edge has its reciprocal on the neighbour
    pub fn edges_are_mutual(&self) -> bool {
        self.nodes.values().filter(|n| !n.dead).all(|node| {
            node.edges.iter().all(|e| {
                self.nodes.get(e.node_id.as_str()).map_or(false, |other| {
                    other
                        .edges
                        .iter()
                        .any(|back| back.node_id == node.id && back.dir == e.dir.flip_link())
                })
            })
        })
    }

    /// Every node's per-position arrays match its sequence length
    pub fn nodes_are_synced(&self) -> bool {
        self.nodes.values().all(|n| n.is_synced())
    }

    /// Drop all nodes, reads and anchors
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.reads.clear();
        self.source = None;
        self.sink = None;
        self.barcodes.clear();
        self.total_read_bp = 0;
        self.read_cycles = 0;
        self.ref_read = None;
        let k = self.k;
        self.reference.set_k(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(k: usize) -> AssemblyConfig {
        AssemblyConfig { k, min_k: k, ..Default::default() }
    }

    #[test]
    fn test_build_creates_mutual_edges() {
        let reference = ReferenceWindow::new("chr1", 1, "ACGGTCATTGCA");
        let mut g = DeBruijnGraph::new(&config(5), reference);
        let seq = "ACGGTCATTGCA";
        g.add_alignment(ReadInfo::new("r1", seq, &"I".repeat(seq.len()), ReadLabel::Tumor, Strand::Fwd, 0));
        g.build_graph();
        assert_eq!(g.nodes.len(), 8);
        assert!(g.edges_are_mutual());
        assert!(g.nodes_are_synced());
        assert_eq!(g.total_read_bp, 12);
        assert!(g.nodes.values().all(|n| n.is_tumor && !n.is_normal));
    }

    #[test]
    fn test_low_quality_tumor_read_not_tagged() {
        let reference = ReferenceWindow::new("chr1", 1, "ACGGTCATTGCA");
        let mut g = DeBruijnGraph::new(&config(5), reference);
        let seq = "ACGGTCATTGCA";
        g.add_alignment(ReadInfo::new("r1", seq, "IIIIII+IIIII", ReadLabel::Tumor, Strand::Fwd, 0));
        g.build_graph();
        let tagged = g.nodes.values().filter(|n| n.is_tumor).count();
        assert!(tagged < g.nodes.len());
        // coverage is still counted for every k-mer
        assert!(g.nodes.values().all(|n| n.tot_cov() >= 1.0));
    }

    #[test]
    fn test_overlapping_mates_counted_once() {
        let reference = ReferenceWindow::new("chr1", 1, "ACGGTCATTGCA");
        let mut g = DeBruijnGraph::new(&config(5), reference);
        let seq = "ACGGTCATTGCA";
        let qv = "I".repeat(seq.len());
        g.add_mates(
            ReadInfo::new("frag", seq, &qv, ReadLabel::Normal, Strand::Fwd, 1),
            ReadInfo::new("frag", seq, &qv, ReadLabel::Normal, Strand::Fwd, 2),
        );
        g.build_graph();
        assert!(g.nodes.values().all(|n| n.tot_cov_nml() == 1.0));
        assert_eq!(g.reference.cov_at(3, Sample::Normal).fwd, 1);

        // only the mate that was counted leaves a read start
        let first = &g.nodes[&CanonicalMer::new("ACGGT").mer];
        assert_eq!(first.read_starts.len(), 1);
        assert_eq!(first.reads.len(), 1);
    }

    #[test]
    fn test_junk_reads_are_skipped() {
        let reference = ReferenceWindow::new("chr1", 1, "ACGGTCATTGCA");
        let mut g = DeBruijnGraph::new(&config(5), reference);
        g.add_alignment(ReadInfo::new("r1", "ACGGTNATTGCA", &"I".repeat(12), ReadLabel::Tumor, Strand::Fwd, 0));
        g.build_graph();
        assert!(g.nodes.values().all(|n| n.tot_cov() == 0.0));
        assert_eq!(g.total_read_bp, 0);
    }

    #[test]
    fn test_remove_node_keeps_mutuality() {
        let reference = ReferenceWindow::new("chr1", 1, "ACGGTCATTGCA");
        let mut g = DeBruijnGraph::new(&config(5), reference);
        g.build_graph();
        let victim = CanonicalMer::new("GTCAT").mer;
        g.remove_node(&victim);
        assert!(g.nodes[&victim].dead);
        assert!(g.edges_are_mutual());
        assert_eq!(g.clean_dead(), 1);
        assert!(!g.nodes.contains_key(&victim));
    }
}
