//! Bi-directed de Bruijn graph built per window
pub mod anchor;
pub mod components;
pub mod compress;
pub mod debruijn;
pub mod edge;
pub mod export;
pub mod node;
pub mod path;
pub mod read;
pub mod simplify;
pub mod stats;
pub mod transcript;
pub mod traverser;
pub mod variants;

/// Canonical k-mer of the node's first occurrence, or a synthetic id
pub type NodeId = String;
/// Index into the graph's read registry
pub type ReadId = usize;

pub use debruijn::DeBruijnGraph;
pub use edge::{Edge, EdgeDir};
pub use node::{BaseCoverage, CovStatus, Node, Sample, Strand};
pub use read::{ReadInfo, ReadLabel};
