//! Walks through the graph produced by traversal

use crate::graph::edge::{Edge, EdgeDir};
use crate::graph::node::{BaseCoverage, Node, Sample};
use crate::graph::{DeBruijnGraph, NodeId};
use crate::kmer::kmer::Ori;

/// Identifies one traversed edge: the node it leaves, its target and orientation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to: NodeId,
    pub dir: EdgeDir,
}

/// Alignment columns of a walk against the reference, by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnCounts {
    pub match_bp: usize,
    pub snp_bp: usize,
    pub ins_bp: usize,
    pub del_bp: usize,
}

/// A source-rooted walk
#[derive(Debug, Clone)]
pub struct Path {
    k: usize,
    pub nodes: Vec<NodeId>,
    /// Orientation each node is read in
    pub oris: Vec<Ori>,
    pub edges: Vec<EdgeKey>,
    /// Traversal direction at the last node
    pub dir: Ori,
    /// Length of the spelled sequence
    pub len: usize,
    pub has_cycle: bool,
    /// Every traversed edge was already covered by an earlier walk
    pub all_visited: bool,
    /// Number of traversed edges not yet covered
    pub score: usize,
    /// Filled in once the walk has been aligned to the reference
    pub counts: ColumnCounts,
}

impl Path {
    pub fn new(start: &Node, dir: Ori, k: usize) -> Self {
        Self {
            k,
            nodes: vec![start.id.clone()],
            oris: vec![dir],
            edges: Vec::new(),
            dir,
            len: start.strlen(),
            has_cycle: false,
            all_visited: true,
            score: 0,
            counts: ColumnCounts::default(),
        }
    }

    pub fn cur_node(&self) -> &str {
        self.nodes.last().map(String::as_str).unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }

    /// Copy of this walk extended by `edge`, leaving the current node, into `other`
    pub fn extend(&self, edge: &Edge, other: &Node) -> Path {
        let mut next = self.clone();
        let added = if other.is_special() {
            0
        } else if self.len == 0 {
            other.strlen()
        } else {
            other.strlen().saturating_sub(self.k - 1)
        };
        next.has_cycle |= self.contains(&other.id);
        next.edges.push(EdgeKey { from: self.cur_node().to_string(), to: other.id.clone(), dir: edge.dir });
        next.nodes.push(other.id.clone());
        next.oris.push(edge.dir.dest());
        next.dir = edge.dir.dest();
        next.len += added;
        next.all_visited &= edge.visited;
        if !edge.visited {
            next.score += 1;
        }
        next
    }

    /// Oriented nodes with sequence, in walk order
    fn real_nodes<'g>(&'g self, graph: &'g DeBruijnGraph) -> impl Iterator<Item = (&'g Node, Ori)> + 'g {
        self.nodes
            .iter()
            .zip(self.oris.iter())
            .filter_map(move |(id, ori)| graph.node(id).map(|n| (n, *ori)))
            .filter(|(n, _)| !n.is_special())
    }

    /// Sequence spelled by the walk
    pub fn seq(&self, graph: &DeBruijnGraph) -> String {
        let mut seq = String::with_capacity(self.len);
        for (node, ori) in self.real_nodes(graph) {
            let s = node.oriented_seq(ori);
            if seq.is_empty() {
                seq.push_str(&s);
            } else {
                seq.push_str(s.get(self.k - 1..).unwrap_or_default());
            }
        }
        seq
    }

    /// Per-position coverage of `sample` along the walk
    pub fn coverage(&self, graph: &DeBruijnGraph, sample: Sample) -> Vec<BaseCoverage> {
        let mut track: Vec<BaseCoverage> = Vec::with_capacity(self.len);
        for (node, ori) in self.real_nodes(graph) {
            let cov = node.oriented_cov(sample, ori);
            let skip = if track.is_empty() { 0 } else { self.k - 1 };
            track.extend(cov.into_iter().skip(skip));
        }
        track
    }

    /// Node spelling the 0-based position `pos` of the walk sequence
    pub fn node_at<'g>(&self, graph: &'g DeBruijnGraph, pos: usize) -> Option<&'g Node> {
        let mut end = 0;
        for id in &self.nodes {
            let node = graph.node(id)?;
            if node.is_special() {
                continue;
            }
            end += if end == 0 { node.strlen() } else { node.strlen().saturating_sub(self.k - 1) };
            if pos < end {
                return Some(node);
            }
        }
        None
    }

    /// Node ids joined for diagnostics
    pub fn path_str(&self) -> String {
        self.nodes
            .iter()
            .zip(self.oris.iter())
            .map(|(id, ori)| format!("{}:{}", id, ori))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
