//! Source-to-sink walk enumeration

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::align::GlobalAligner;
use crate::graph::path::Path;
use crate::graph::stats::WindowStats;
use crate::graph::variants::PathOutcome;
use crate::graph::DeBruijnGraph;
use crate::kmer::kmer::Ori;
use crate::kmer::repeat::is_almost_repeat;
use crate::variant::store::VariantStore;

/// Result of one breadth-first search
#[derive(Debug, Default)]
pub struct SearchResult {
    /// Best complete walk with at least one uncovered edge
    pub best: Option<Path>,
    /// Partial walks dequeued
    pub visits: usize,
    pub complete: usize,
    pub too_long: usize,
    pub dead_ends: usize,
    /// Walks that revisit a node
    pub cycles: usize,
}

impl SearchResult {
    /// The source's only neighbour never reached the sink
    pub fn is_short_path(&self) -> bool {
        self.complete == 0 && self.visits == 2
    }
}

impl DeBruijnGraph {
    /// Breadth-first search from `source` to `sink` starting in orientation
    /// `dir`, returning the complete walk with the most uncovered edges
    pub fn bfs(&self, source: &str, sink: &str, dir: Ori) -> SearchResult {
        let mut result = SearchResult::default();
        let Some(start) = self.node(source) else {
            return result;
        };
        let max_len = self.reference.seq.len() + self.config.max_indel_len;
        let limit = self.config.dfs_limit;

        let mut queue: VecDeque<Path> = VecDeque::from([Path::new(start, dir, self.k)]);
        while let Some(path) = queue.pop_front() {
            result.visits += 1;
            if limit > 0 && result.visits > limit {
                warn!("search visit limit ({}) exceeded", limit);
                break;
            }

            let cur = path.cur_node();
            if cur == sink && !path.all_visited {
                result.complete += 1;
                if result.best.as_ref().map_or(true, |b| path.score > b.score) {
                    result.best = Some(path);
                }
                continue;
            }
            if path.len > max_len {
                result.too_long += 1;
                continue;
            }

            let Some(node) = self.node(cur) else { continue };
            let mut tried = 0;
            for edge in node.edges.iter().filter(|e| e.is_dir(path.dir)) {
                let Some(other) = self.node(&edge.node_id) else { continue };
                tried += 1;
                let next = path.extend(edge, other);
                if next.has_cycle && !path.has_cycle {
                    result.cycles += 1;
                }
                queue.push_back(next);
            }
            if tried == 0 {
                result.dead_ends += 1;
            }
        }

        if result.is_short_path() {
            debug!("source {} reaches a single node", source);
        }
        result
    }

    /// Flag every edge traversed by `path` as covered
    pub fn mark_path_visited(&mut self, path: &Path) {
        for key in &path.edges {
            if let Some(node) = self.nodes.get_mut(key.from.as_str()) {
                if let Some(edge) = node.edges.iter_mut().find(|e| e.node_id == key.to && e.dir == key.dir) {
                    edge.visited = true;
                }
            }
        }
    }

    /// Repeatedly extract the walk covering the most uncovered edges until
    /// every reachable edge is covered, processing each walk for variants
    pub fn eka(
        &mut self,
        dir: Ori,
        aligner: &dyn GlobalAligner,
        store: &mut VariantStore,
        stats: &mut WindowStats,
    ) -> Vec<PathOutcome> {
        let mut outcomes = Vec::new();
        let (Some(source), Some(sink)) = (self.source.clone(), self.sink.clone()) else {
            return outcomes;
        };
        debug!("searching from {} to {} dir: {}", source, sink, dir);

        loop {
            let result = self.bfs(&source, &sink, dir);
            stats.visits += result.visits;
            let Some(mut path) = result.best else {
                if result.is_short_path() {
                    stats.short_paths += 1;
                    outcomes.push(self.process_short_path(&source, aligner, stats));
                }
                break;
            };
            stats.complete += 1;
            if path.has_cycle {
                stats.cycles += 1;
            }
            outcomes.push(self.process_path(&mut path, aligner, store, stats));
            self.mark_path_visited(&path);
        }
        outcomes
    }

    /// Process every source-to-sink walk within the length bound, without
    /// edge-cover deduplication
    pub fn dfs(
        &mut self,
        dir: Ori,
        aligner: &dyn GlobalAligner,
        store: &mut VariantStore,
        stats: &mut WindowStats,
    ) -> Vec<PathOutcome> {
        let mut outcomes = Vec::new();
        let (Some(source), Some(sink)) = (self.source.clone(), self.sink.clone()) else {
            return outcomes;
        };
        let Some(start) = self.node(&source) else {
            return outcomes;
        };
        let max_len = self.reference.seq.len() + self.config.max_indel_len;
        let limit = self.config.dfs_limit;

        let mut complete = Vec::new();
        let mut visits = 0;
        let mut queue: VecDeque<Path> = VecDeque::from([Path::new(start, dir, self.k)]);
        while let Some(path) = queue.pop_front() {
            visits += 1;
            if limit > 0 && visits > limit {
                warn!("search visit limit ({}) exceeded", limit);
                break;
            }
            let cur = path.cur_node();
            if cur == sink {
                complete.push(path);
                continue;
            }
            if path.len > max_len {
                continue;
            }
            let Some(node) = self.node(cur) else { continue };
            for edge in node.edges.iter().filter(|e| e.is_dir(path.dir)) {
                if let Some(other) = self.node(&edge.node_id) {
                    queue.push_back(path.extend(edge, other));
                }
            }
        }

        stats.visits += visits;
        if complete.is_empty() && visits == 2 {
            stats.short_paths += 1;
            outcomes.push(self.process_short_path(&source, aligner, stats));
        }
        for mut path in complete {
            stats.complete += 1;
            outcomes.push(self.process_path(&mut path, aligner, store, stats));
        }
        outcomes
    }

    /// True if some enumerated walk contains two nearly identical k-mers
    pub fn find_repeats_in_graph_paths(&mut self, dir: Ori) -> bool {
        let (Some(source), Some(sink)) = (self.source.clone(), self.sink.clone()) else {
            return false;
        };
        let mut found = false;
        loop {
            let Some(path) = self.bfs(&source, &sink, dir).best else { break };
            if is_almost_repeat(&path.seq(self), self.k, self.config.max_mismatch) {
                debug!("Near-perfect repeat in assembled sequence for k = {}", self.k);
                found = true;
                break;
            }
            self.mark_path_visited(&path);
        }
        self.clear_visited();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyConfig;
    use crate::graph::{ReadInfo, ReadLabel, Strand};
    use crate::reference::ReferenceWindow;

    const REF: &str = "ACGGTCATTGCAGGACTTGA";

    fn bubble_graph() -> DeBruijnGraph {
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let config = AssemblyConfig { k: 7, min_k: 7, cov_threshold: 2, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, REF));
        for i in 0..4 {
            let qv = "I".repeat(REF.len());
            g.add_alignment(ReadInfo::new(&format!("n{}", i), REF, &qv, ReadLabel::Normal, Strand::Fwd, 0));
            g.add_alignment(ReadInfo::new(&format!("t{}", i), &alt, &qv, ReadLabel::Tumor, Strand::Fwd, 0));
        }
        g.build_graph();
        g.mark_ref_nodes();
        g.mark_connected_components();
        assert!(g.mark_ref_ends(1));
        g.compress(1);
        g
    }

    #[test]
    fn test_bfs_finds_a_complete_walk() {
        let g = bubble_graph();
        let (source, sink) = (g.source.clone().unwrap(), g.sink.clone().unwrap());
        let result = g.bfs(&source, &sink, Ori::F);
        let best = result.best.unwrap();
        assert_eq!(result.complete, 2);
        assert_eq!(best.cur_node(), sink);
        assert_eq!(best.seq(&g).len(), REF.len());
    }

    #[test]
    fn test_eka_covers_every_edge() {
        let mut g = bubble_graph();
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        let aligner = crate::align::AffineAligner::default();
        let outcomes = g.eka(Ori::F, &aligner, &mut store, &mut stats);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(stats.complete, 2);
        let forward_edges_covered = g
            .nodes
            .values()
            .flat_map(|n| n.edges.iter())
            .filter(|e| e.visited)
            .count();
        // two walks over a bubble: source, split, two branches, join, sink
        assert_eq!(forward_edges_covered, 6);
    }

    #[test]
    fn test_dfs_processes_every_walk() {
        let mut g = bubble_graph();
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        let aligner = crate::align::AffineAligner::default();
        let outcomes = g.dfs(Ori::F, &aligner, &mut store, &mut stats);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(stats.complete, 2);
        assert_eq!(store.len(), 1);
        assert!(g.nodes.values().flat_map(|n| n.edges.iter()).all(|e| !e.visited));
    }

    #[test]
    fn test_no_repeats_in_bubble_walks() {
        let mut g = bubble_graph();
        assert!(!g.find_repeats_in_graph_paths(Ori::F));
        assert!(g.nodes.values().flat_map(|n| n.edges.iter()).all(|e| !e.visited));
    }
}
