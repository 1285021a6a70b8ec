//! Graph cleaning: low coverage, tips, short links, greedy trimming and read threading

use ahash::AHashSet;
use tracing::{debug, info};

use crate::graph::edge::{Edge, EdgeDir};
use crate::graph::node::Node;
use crate::graph::{DeBruijnGraph, NodeId, ReadId};
use crate::kmer::kmer::Ori;
use crate::kmer::repeat::find_tandem_at;

impl DeBruijnGraph {
    /// Remove nodes of `comp` with weak high-quality support relative to the window
    pub fn remove_low_cov(&mut self, compress: bool, comp: usize) -> usize {
        let avgcov = self.avg_cov();
        let low = self.config.low_cov_threshold as f64;
        let ratio = self.config.min_cov_ratio;

        let victims: Vec<NodeId> = self
            .sorted_ids(Some(comp))
            .into_iter()
            .filter(|id| {
                let node = &self.nodes[id];
                let min_cov_qv = node.min_cov_qv as f64;
                !node.is_special()
                    && (min_cov_qv <= low
                        || min_cov_qv <= ratio * avgcov
                        || (node.tot_cov_tmr() == 1.0 && node.tot_cov_nml() == 1.0))
            })
            .collect();

        for id in &victims {
            self.remove_node(id);
        }
        debug!("removing low coverage: found {}", victims.len());
        self.clean_dead();
        if compress {
            self.compress(comp);
        }
        victims.len()
    }

    /// Remove short dead-end branches, repeating until none remain
    pub fn remove_tips(&mut self, comp: usize) -> usize {
        let k = self.k;
        let max_tip_len = self.config.max_tip_len;
        let mut total = 0;
        let mut round = 0;
        loop {
            round += 1;
            let tips: Vec<NodeId> = self
                .sorted_ids(Some(comp))
                .into_iter()
                .filter(|id| {
                    let node = &self.nodes[id];
                    !node.is_special() && node.total_degree() <= 1 && node.size(k) < max_tip_len
                })
                .collect();
            debug!("remove tips round {}: {}", round, tips.len());
            if tips.is_empty() {
                break;
            }
            for id in &tips {
                self.remove_node(id);
            }
            total += tips.len();
            self.compress(comp);
        }
        total
    }

    /// Remove short, weakly covered nodes joining two branches, unless they sit in an STR
    pub fn remove_short_links(&mut self, comp: usize) -> usize {
        let k = self.k;
        let max_link_len = self.config.max_link_len;
        let cutoff = self.avg_cov().sqrt().floor();
        let params = self.config.tandem_params();

        let links: Vec<NodeId> = self
            .sorted_ids(Some(comp))
            .into_iter()
            .filter(|id| {
                let node = &self.nodes[id];
                !node.is_special()
                    && node.total_degree() >= 2
                    && node.size(k) < max_link_len
                    && (node.min_cov as f64) <= cutoff
                    && find_tandem_at(&node.seq, k - 1, &params).is_none()
            })
            .collect();

        for id in &links {
            self.remove_node(id);
        }
        debug!("remove short links: {}", links.len());
        if !links.is_empty() {
            self.compress(comp);
        }
        links.len()
    }

    /// Keep only the best covered neighbour on each side of branching nodes
    pub fn greedy_trim(&mut self, comp: usize) -> usize {
        let mut order = self.sorted_ids(Some(comp));
        order.sort_by(|a, b| self.nodes[b].tot_cov().total_cmp(&self.nodes[a].tot_cov()));

        let mut branches = 0;
        for id in order {
            let Some(cur) = self.nodes.get(id.as_str()) else { continue };
            if cur.dead || cur.edges.len() < 2 {
                continue;
            }

            let best = |ori: Ori| -> (Option<Edge>, usize) {
                let mut best: Option<(Edge, f64)> = None;
                let mut degree = 0;
                for edge in cur.edges.iter().filter(|e| e.is_dir(ori)) {
                    degree += 1;
                    let cov = self.nodes.get(edge.node_id.as_str()).map_or(0.0, |n| n.tot_cov());
                    if best.as_ref().map_or(true, |(_, c)| cov > *c) {
                        best = Some((edge.clone(), cov));
                    }
                }
                (best.map(|(e, _)| e), degree)
            };
            let (bestf, degf) = best(Ori::F);
            let (bestr, degr) = best(Ori::R);
            if degf <= 1 && degr <= 1 {
                continue;
            }
            branches += 1;

            let keep = |e: &Edge| {
                [&bestf, &bestr]
                    .iter()
                    .any(|b| b.as_ref().map_or(false, |b| b.node_id == e.node_id && b.dir == e.dir))
            };
            let dropped: Vec<(NodeId, EdgeDir)> = cur
                .edges
                .iter()
                .filter(|e| !keep(e))
                .map(|e| (e.node_id.clone(), e.dir))
                .collect();

            for (other, dir) in dropped {
                if other != id {
                    if let Some(n) = self.nodes.get_mut(other.as_str()) {
                        n.remove_edge(&id, dir.flip_link());
                    }
                }
            }
            if let Some(cur) = self.nodes.get_mut(id.as_str()) {
                cur.edges = bestf.into_iter().chain(bestr).collect();
            }
        }

        info!("greedy trim removed {} branches", branches);
        if branches > 0 {
            self.compress(comp);
        }
        branches
    }

    /// Split nodes that branch on both sides when every edge is spanned by
    /// enough reads, one copy per supported in/out pair. Repeats until no
    /// node can be threaded.
    pub fn thread_reads(&mut self, comp: usize) -> usize {
        let Some(min_reads) = self.config.min_thread_reads else {
            debug!("Skipping threading reads");
            return 0;
        };

        let mut total = 0;
        let mut round = 0;
        loop {
            round += 1;
            let mut threaded = 0;
            for id in self.sorted_ids(Some(comp)) {
                let Some(cur) = self.nodes.get(id.as_str()) else { continue };
                if cur.dead || cur.is_special() || cur.is_tandem() {
                    continue;
                }
                if cur.degree(Ori::F) <= 1 || cur.degree(Ori::R) <= 1 {
                    continue;
                }

                let pairs = spanning_pairs(cur, min_reads);
                let mut used = vec![false; cur.edges.len()];
                for (e1, e2, _) in &pairs {
                    used[*e1] = true;
                    used[*e2] = true;
                }
                if pairs.is_empty() || !used.iter().all(|&u| u) {
                    continue;
                }

                let copies: Vec<Node> = pairs
                    .iter()
                    .enumerate()
                    .map(|(n, (e1, e2, overlap))| thread_copy(cur, n + 1, &cur.edges[*e1], &cur.edges[*e2], overlap))
                    .collect();

                self.remove_node(&id);
                threaded += 1;
                for copy in copies {
                    for edge in &copy.edges {
                        if let Some(other) = self.nodes.get_mut(edge.node_id.as_str()) {
                            for read in &edge.reads {
                                other.add_edge(&copy.id, edge.dir.flip_link(), Some(*read));
                            }
                        }
                    }
                    self.nodes.insert(copy.id.clone(), copy);
                }
            }
            debug!("threading round {}: threaded {}", round, threaded);
            if threaded == 0 {
                break;
            }
            total += threaded;
            self.clean_dead();
            self.compress(comp);
        }
        total
    }
}

/// (forward edge, reverse edge, shared reads) for every pair spanned by at least `min_reads`
fn spanning_pairs(node: &Node, min_reads: usize) -> Vec<(usize, usize, Vec<ReadId>)> {
    let mut pairs = Vec::new();
    for (i, e1) in node.edges.iter().enumerate().filter(|(_, e)| e.is_dir(Ori::F)) {
        for (j, e2) in node.edges.iter().enumerate().filter(|(_, e)| e.is_dir(Ori::R)) {
            let shared: AHashSet<&ReadId> = e1.reads.intersection(&e2.reads).collect();
            if shared.len() >= min_reads {
                let mut overlap: Vec<ReadId> = shared.into_iter().copied().collect();
                overlap.sort_unstable();
                pairs.push((i, j, overlap));
            }
        }
    }
    pairs
}

fn thread_copy(cur: &Node, n: usize, e1: &Edge, e2: &Edge, overlap: &[ReadId]) -> Node {
    let mut copy = Node::new(format!("{}_{}", cur.id, n), cur.seq.clone());
    let support = overlap.len() as f64;
    copy.component = cur.component;
    copy.cov_tmr_fwd = support;
    copy.cov_tmr_rev = support;
    copy.cov_nml_fwd = support;
    copy.cov_nml_rev = support;
    copy.cov_distr_tmr = cur.cov_distr_tmr.clone();
    copy.cov_distr_nml = cur.cov_distr_nml.clone();
    copy.cov_status = cur.cov_status.clone();
    copy.min_cov = cur.min_cov;
    copy.min_cov_qv = cur.min_cov_qv;
    copy.is_normal = cur.is_normal;
    copy.is_tumor = cur.is_tumor;
    copy.touch_ref = cur.touch_ref;
    for &read in overlap {
        copy.add_edge(&e1.node_id, e1.dir, Some(read));
        copy.add_edge(&e2.node_id, e2.dir, Some(read));
    }
    copy
}

#[cfg(test)]
mod tests {
    use crate::config::AssemblyConfig;
    use crate::graph::node::Node;
    use crate::graph::{DeBruijnGraph, ReadInfo, ReadLabel, Strand};
    use crate::kmer::kmer::{reverse_complement, Ori};
    use crate::reference::ReferenceWindow;

    fn build(reference: &str, reads: &[(&str, usize)], k: usize) -> DeBruijnGraph {
        let config = AssemblyConfig { k, min_k: k, cov_threshold: 2, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, reference));
        let mut n = 0;
        for (seq, copies) in reads {
            for _ in 0..*copies {
                let qv = "I".repeat(seq.len());
                g.add_alignment(ReadInfo::new(&format!("r{}", n), seq, &qv, ReadLabel::Normal, Strand::Fwd, 0));
                n += 1;
            }
        }
        g.build_graph();
        g.mark_ref_nodes();
        g.mark_connected_components();
        g
    }

    const REF: &str = "ACGGTCATTGCAGGACTTGA";

    #[test]
    fn test_tip_is_removed() {
        // a read diverging near the end creates a short dead-end branch
        let mut g = build(REF, &[(REF, 4), ("ACGGTCATTGCAGGTT", 4)], 7);
        assert!(g.mark_ref_ends(1));
        g.compress(1);
        let before = g.nodes.len();
        let tips = g.remove_tips(1);
        assert_eq!(tips, 1);
        assert!(g.nodes.len() < before);
        // source, reference chain, sink
        assert_eq!(g.nodes.len(), 3);
        assert!(g.edges_are_mutual());
    }

    #[test]
    fn test_low_cov_removes_single_read_branch() {
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let mut g = build(REF, &[(REF, 6), (alt.as_str(), 1)], 7);
        g.config.low_cov_threshold = 1;
        let removed = g.remove_low_cov(true, 1);
        assert!(removed > 0);
        assert_eq!(g.nodes.len(), 1);
        assert!(g.edges_are_mutual());
    }

    fn live(g: &DeBruijnGraph) -> Vec<&Node> {
        g.nodes.values().filter(|n| !n.dead).collect()
    }

    #[test]
    fn test_weak_short_link_is_removed() {
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let mut g = build(REF, &[(REF, 6), (alt.as_str(), 1)], 7);
        g.compress(1);
        assert_eq!(live(&g).len(), 4);

        assert_eq!(g.remove_short_links(1), 1);
        let nodes = live(&g);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].strlen(), REF.len());
        assert!(g.edges_are_mutual());
    }

    #[test]
    fn test_short_link_inside_homopolymer_is_kept() {
        // the alternative allele extends TTTCTTT into a run of seven T
        let reference = "ACGGTCATGCTTTCTTTGCAGGACTA";
        let alt = "ACGGTCATGCTTTTTTTGCAGGACTA";
        let mut g = build(reference, &[(reference, 6), (alt, 1)], 7);
        g.compress(1);
        assert_eq!(live(&g).len(), 4);

        assert_eq!(g.remove_short_links(1), 0);
        assert_eq!(live(&g).len(), 4);
        assert!(live(&g).iter().any(|n| n.seq.contains("TTTTTTT") || n.seq.contains("AAAAAAA")));
    }

    #[test]
    fn test_greedy_trim_keeps_best_branch() {
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let mut g = build(REF, &[(REF, 6), (alt.as_str(), 2)], 7);
        g.compress(1);

        // both ends of the bubble branch
        assert_eq!(g.greedy_trim(1), 2);
        assert!(g.edges_are_mutual());
        let nodes = live(&g);
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().any(|n| n.strlen() == REF.len()));
        let orphan = nodes.iter().find(|n| n.strlen() != REF.len()).unwrap();
        assert!(orphan.edges.is_empty());
        assert_eq!(orphan.tot_cov_nml(), 2.0);
    }

    #[test]
    fn test_threading_splits_shared_core() {
        // two haplotypes sharing the 12 bp core GCTAAAGACAAT
        let hap1 = "TACATAACGCTAAAGACAATTCAGCACG";
        let hap2 = "ATACACGAGCTAAAGACAATGAAACTTG";
        let mut g = build(hap1, &[(hap1, 3), (hap2, 3)], 7);
        g.config.min_thread_reads = Some(2);
        g.compress(1);
        assert_eq!(live(&g).len(), 5);
        assert!(live(&g).iter().any(|n| n.degree(Ori::F) == 2 && n.degree(Ori::R) == 2));

        assert_eq!(g.thread_reads(1), 1);
        assert!(g.edges_are_mutual());
        let nodes = live(&g);
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.strlen() == hap1.len() && n.edges.is_empty()));
        let mut seqs: Vec<String> = nodes
            .iter()
            .map(|n| if n.seq.starts_with("TACA") || n.seq.starts_with("ATAC") { n.seq.clone() } else { reverse_complement(&n.seq) })
            .collect();
        seqs.sort();
        assert_eq!(seqs, vec![hap2.to_string(), hap1.to_string()]);
    }

    #[test]
    fn test_threading_needs_support_for_every_edge() {
        let hap1 = "TACATAACGCTAAAGACAATTCAGCACG";
        let hap2 = "ATACACGAGCTAAAGACAATGAAACTTG";
        // hap2 is only seen as two halves meeting in the core
        let mut g = build(hap1, &[(hap1, 3), (&hap2[..20], 3), (&hap2[8..], 3)], 7);
        g.config.min_thread_reads = Some(2);
        g.compress(1);
        let before = live(&g).len();
        assert_eq!(g.thread_reads(1), 0);
        assert_eq!(live(&g).len(), before);
    }

    #[test]
    fn test_threading_disabled_by_default() {
        let mut g = build(REF, &[(REF, 3)], 7);
        assert_eq!(g.thread_reads(1), 0);
    }
}
