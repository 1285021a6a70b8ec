//! Merging of unbranched chains into single nodes

use tracing::debug;

use crate::graph::DeBruijnGraph;
use crate::kmer::kmer::{reverse_complement, Ori};

impl DeBruijnGraph {
    /// Repeatedly merge `id` with its unique neighbour in direction `dir`
    /// while both are each other's only neighbour on the facing side
    pub fn compress_node(&mut self, id: &str, dir: Ori) {
        let k = self.k;
        loop {
            let Some(node) = self.nodes.get(id) else { return };
            if node.dead || node.is_tandem() {
                return;
            }
            let Some((buddy_id, edir)) = node.buddy(dir) else { return };
            let bdir = edir.dest().flip();

            let Some(buddy) = self.nodes.get(buddy_id.as_str()) else { return };
            if buddy.dead || buddy.is_tandem() {
                return;
            }
            let Some((back_id, back_dir)) = buddy.buddy(bdir) else { return };
            assert_eq!(back_id, id, "buddy {} does not point back to {}", buddy_id, id);

            let (Some(mut node), Some(mut buddy)) = (self.nodes.remove(id), self.nodes.remove(buddy_id.as_str()))
            else {
                return;
            };

            if dir == Ori::R {
                node.rev_reads();
                node.rev_cov_distr();
            }
            let astr = node.oriented_seq(dir);
            if edir.dest() == Ori::R {
                buddy.rev_reads();
                buddy.rev_cov_distr();
            }
            let bstr = buddy.oriented_seq(edir.dest());

            assert_eq!(
                &astr[astr.len() + 1 - k..],
                &bstr[..k - 1],
                "nodes {} and {} do not overlap by k-1",
                id,
                buddy_id
            );

            let mut merged = astr.clone();
            merged.push_str(&bstr[k - 1..]);
            node.seq = if dir == Ori::R { reverse_complement(&merged) } else { merged };

            node.cov_distr_tmr.extend_from_slice(&buddy.cov_distr_tmr[k - 1..]);
            node.cov_distr_nml.extend_from_slice(&buddy.cov_distr_nml[k - 1..]);
            node.cov_status.extend_from_slice(&buddy.cov_status[k - 1..]);

            node.bx_tmr_fwd.extend(buddy.bx_tmr_fwd.drain());
            node.bx_tmr_rev.extend(buddy.bx_tmr_rev.drain());
            node.bx_nml_fwd.extend(buddy.bx_nml_fwd.drain());
            node.bx_nml_rev.extend(buddy.bx_nml_rev.drain());

            node.compute_min_cov();

            let amerlen = (astr.len() + 1 - k) as f64;
            let bmerlen = (bstr.len() + 1 - k) as f64;
            let weigh = |a: f64, b: f64| (a * amerlen + b * bmerlen) / (amerlen + bmerlen);
            node.cov_tmr_fwd = weigh(node.cov_tmr_fwd, buddy.cov_tmr_fwd);
            node.cov_tmr_rev = weigh(node.cov_tmr_rev, buddy.cov_tmr_rev);
            node.cov_nml_fwd = weigh(node.cov_nml_fwd, buddy.cov_nml_fwd);
            node.cov_nml_rev = weigh(node.cov_nml_rev, buddy.cov_nml_rev);

            node.reads.extend(buddy.reads.iter().copied());
            let shift = astr.len() + 1 - k;
            for rs in &buddy.read_starts {
                let mut moved = *rs;
                moved.offset += shift;
                node.read_starts.push(moved);
            }

            if dir == Ori::R {
                node.rev_reads();
                node.rev_cov_distr();
            }
            node.read_starts.sort_by_key(|rs| rs.offset);

            node.touch_ref |= buddy.touch_ref;
            node.is_normal |= buddy.is_normal;
            node.is_tumor |= buddy.is_tumor;

            if let Some(pos) = node.edges.iter().position(|e| e.node_id == buddy_id && e.dir == edir) {
                node.edges.remove(pos);
            }

            let mut moved_edges = std::mem::take(&mut buddy.edges);
            if let Some(pos) = moved_edges.iter().position(|e| e.node_id == id && e.dir == back_dir) {
                moved_edges.remove(pos);
            }
            let mut neighbour_updates = Vec::new();
            for edge in moved_edges {
                let old_dir = edge.dir;
                let mut ne = edge;
                if edir.is_switch() {
                    ne.dir = ne.dir.flip_start();
                }
                if ne.node_id == buddy_id {
                    ne.node_id = id.to_string();
                    node.edges.push(ne);
                } else if ne.node_id == id {
                    let new_dir = ne.dir;
                    node.edges.push(ne);
                    node.update_edge(&buddy_id, old_dir.flip_link(), id, new_dir.flip_link());
                } else {
                    neighbour_updates.push((ne.node_id.clone(), old_dir.flip_link(), ne.dir.flip_link()));
                    node.edges.push(ne);
                }
            }

            for (other_id, old_dir, new_dir) in neighbour_updates {
                if let Some(other) = self.nodes.get_mut(other_id.as_str()) {
                    other.update_edge(&buddy_id, old_dir, id, new_dir);
                }
            }

            buddy.dead = true;
            self.nodes.insert(buddy_id, buddy);
            self.nodes.insert(id.to_string(), node);
        }
    }

    /// Compress every live non-special node of component `comp`, then purge merged nodes
    pub fn compress(&mut self, comp: usize) {
        for id in self.sorted_ids(Some(comp)) {
            let Some(node) = self.nodes.get(id.as_str()) else { continue };
            if node.dead || node.is_special() {
                continue;
            }
            self.compress_node(&id, Ori::F);
            self.compress_node(&id, Ori::R);
        }
        let removed = self.clean_dead();
        debug!("compressed component {}: merged {} nodes", comp, removed);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AssemblyConfig;
    use crate::graph::{DeBruijnGraph, ReadInfo, ReadLabel, Strand};
    use crate::kmer::kmer::reverse_complement;
    use crate::reference::ReferenceWindow;

    fn linear_graph(seq: &str, k: usize) -> DeBruijnGraph {
        let config = AssemblyConfig { k, min_k: k, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, seq));
        for i in 0..2 {
            let qv = "I".repeat(seq.len());
            g.add_alignment(ReadInfo::new(&format!("r{}", i), seq, &qv, ReadLabel::Normal, Strand::Fwd, 0));
        }
        g.build_graph();
        g.mark_ref_nodes();
        g.mark_connected_components();
        g
    }

    #[test]
    fn test_linear_chain_collapses() {
        let seq = "ACGGTCATTGCAGGA";
        let mut g = linear_graph(seq, 5);
        g.compress(1);
        assert_eq!(g.nodes.len(), 1);
        let node = g.nodes.values().next().unwrap();
        assert!(node.seq == seq || node.seq == reverse_complement(seq));
        assert!(node.is_synced());
        assert!(node.edges.is_empty());
        assert_eq!(node.tot_cov_nml(), 2.0);
        assert_eq!(node.min_cov, 2);
    }

    #[test]
    fn test_compression_stops_at_anchors() {
        let seq = "ACGGTCATTGCAGGA";
        let mut g = linear_graph(seq, 5);
        g.config.cov_threshold = 2;
        assert!(g.mark_ref_ends(1));
        g.compress(1);
        // source, merged chain, sink
        assert_eq!(g.nodes.len(), 3);
        assert!(g.edges_are_mutual());
        assert!(g.nodes_are_synced());
    }
}
