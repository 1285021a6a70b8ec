//! Synthetic source and sink anchoring a component to the reference

use tracing::debug;

use crate::graph::edge::EdgeDir;
use crate::graph::node::Node;
use crate::graph::DeBruijnGraph;
use crate::kmer::kmer::{CanonicalMer, Ori};

impl DeBruijnGraph {
    /// First reference k-mer (scanning in `offsets` order) whose node is in
    /// `comp` with enough coverage. Seeing the same node again at a later
    /// offset makes the anchor ambiguous.
    fn find_anchor(&self, comp: usize, offsets: impl Iterator<Item = usize>) -> Option<(CanonicalMer, usize)> {
        let k = self.k;
        let raw = &self.reference.raw_seq;
        let threshold = self.config.cov_threshold as f64;
        let mut found: Option<(CanonicalMer, usize)> = None;

        for offset in offsets {
            if offset + k > raw.len() {
                continue;
            }
            let mer = CanonicalMer::new(&raw[offset..offset + k]);
            let Some(node) = self.nodes.get(mer.mer.as_str()) else {
                continue;
            };
            if node.dead || node.tot_cov() < threshold || node.component != comp {
                continue;
            }
            match &found {
                None => found = Some((mer, offset)),
                Some((first, _)) if first.mer == mer.mer => return None,
                Some(_) => {}
            }
        }
        found
    }

    /// Drop edges of `anchor` leaving it in orientation `ori`, together with their reciprocals
    fn clip_anchor_edges(&mut self, anchor: &str, ori: Ori) {
        let clipped: Vec<(String, EdgeDir)> = match self.nodes.get(anchor) {
            Some(node) => node
                .edges
                .iter()
                .filter(|e| e.dir.start() == ori && e.node_id != anchor)
                .map(|e| (e.node_id.clone(), e.dir))
                .collect(),
            None => return,
        };
        for (other, dir) in clipped {
            debug!("clipping {} beyond anchor {}", other, anchor);
            self.remove_mutual_edge(anchor, &other, dir);
        }
    }

    /// Attach a source before the first and a sink after the last
    /// well-covered, unambiguous reference k-mer of component `comp`.
    /// Returns false when either anchor cannot be placed.
    pub fn mark_ref_ends(&mut self, comp: usize) -> bool {
        self.source = None;
        self.sink = None;
        let k = self.k;
        let len = self.reference.raw_len();
        if len < k {
            return false;
        }

        let Some((source_mer, source_offset)) = self.find_anchor(comp, 0..len) else {
            debug!("No unambiguous reference match for source in component {}", comp);
            return false;
        };
        let Some((sink_mer, sink_offset)) = self.find_anchor(comp, (0..=len - k).rev()) else {
            debug!("No unambiguous reference match for sink in component {}", comp);
            return false;
        };
        if sink_offset < source_offset {
            debug!("Sink anchor lies before source anchor in component {}", comp);
            return false;
        }

        self.reference.set_anchors(source_offset, sink_offset);
        debug!(
            "ref trim5: {} trim3: {} ref_dist: {}",
            self.reference.trim5,
            self.reference.trim3,
            self.reference.seq.len()
        );

        let ref_read = self.ref_read_id();

        let source_id = format!("source{}", comp);
        let source_dir = match source_mer.ori {
            Ori::F => EdgeDir::FF,
            Ori::R => EdgeDir::FR,
        };
        self.clip_anchor_edges(&source_mer.mer, source_mer.ori.flip());
        let mut source = Node::special(source_id.clone(), true);
        source.component = comp;
        source.add_edge(&source_mer.mer, source_dir, ref_read);
        self.nodes.insert(source_id.clone(), source);
        if let Some(node) = self.nodes.get_mut(source_mer.mer.as_str()) {
            node.add_edge(&source_id, source_dir.flip_link(), ref_read);
        }

        let sink_id = format!("sink{}", comp);
        let sink_dir = match sink_mer.ori {
            Ori::F => EdgeDir::RR,
            Ori::R => EdgeDir::FF,
        };
        self.clip_anchor_edges(&sink_mer.mer, sink_mer.ori);
        let mut sink = Node::special(sink_id.clone(), false);
        sink.component = comp;
        sink.add_edge(&sink_mer.mer, sink_dir, ref_read);
        self.nodes.insert(sink_id.clone(), sink);
        if let Some(node) = self.nodes.get_mut(sink_mer.mer.as_str()) {
            node.add_edge(&sink_id, sink_dir.flip_link(), ref_read);
        }

        self.source = Some(source_id);
        self.sink = Some(sink_id);
        true
    }
}
