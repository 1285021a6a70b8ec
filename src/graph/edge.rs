use ahash::AHashSet;

use crate::graph::{NodeId, ReadId};
use crate::kmer::kmer::Ori;

/// Which ends of two nodes an edge connects: the orientation the start node
/// is read in, followed by the orientation of the destination node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeDir {
    FF,
    FR,
    RF,
    RR,
}

impl EdgeDir {
    pub fn from_oris(start: Ori, dest: Ori) -> Self {
        match (start, dest) {
            (Ori::F, Ori::F) => EdgeDir::FF,
            (Ori::F, Ori::R) => EdgeDir::FR,
            (Ori::R, Ori::F) => EdgeDir::RF,
            (Ori::R, Ori::R) => EdgeDir::RR,
        }
    }

    pub fn start(self) -> Ori {
        match self {
            EdgeDir::FF | EdgeDir::FR => Ori::F,
            EdgeDir::RF | EdgeDir::RR => Ori::R,
        }
    }

    pub fn dest(self) -> Ori {
        match self {
            EdgeDir::FF | EdgeDir::RF => Ori::F,
            EdgeDir::FR | EdgeDir::RR => Ori::R,
        }
    }

    /// Orientation of the reciprocal edge held by the destination node
    pub fn flip_link(self) -> Self {
        EdgeDir::from_oris(self.dest().flip(), self.start().flip())
    }

    /// Same link seen from a node whose sequence has been reverse-complemented
    pub fn flip_start(self) -> Self {
        EdgeDir::from_oris(self.start().flip(), self.dest())
    }

    /// Links that change strand between the two nodes
    pub fn is_switch(self) -> bool {
        matches!(self, EdgeDir::FR | EdgeDir::RF)
    }
}

impl std::fmt::Display for EdgeDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.start(), self.dest())
    }
}

/// Adjacency record held by a node
#[derive(Debug, Clone)]
pub struct Edge {
    pub node_id: NodeId,
    pub dir: EdgeDir,
    /// Reads supporting this link
    pub reads: AHashSet<ReadId>,
    /// Set once a reported path has used this edge
    pub visited: bool,
}

impl Edge {
    pub fn new(node_id: NodeId, dir: EdgeDir) -> Self {
        Self { node_id, dir, reads: AHashSet::new(), visited: false }
    }

    pub fn with_read(node_id: NodeId, dir: EdgeDir, read: ReadId) -> Self {
        let mut edge = Self::new(node_id, dir);
        edge.reads.insert(read);
        edge
    }

    /// True if the edge leaves its node when the node is read in `ori`
    pub fn is_dir(&self, ori: Ori) -> bool {
        self.dir.start() == ori
    }
}
