//! Localized de Bruijn graph micro-assembly of tumor/normal reads for
//! candidate variant discovery
pub mod align;
pub mod config;
pub mod dist;
pub mod error;
pub mod graph;
pub mod io;
pub mod kmer;
pub mod pipeline;
pub mod reference;
pub mod stats;
pub mod variant;

pub use config::AssemblyConfig;
pub use error::{MicroassemblerError, Result};
pub use graph::DeBruijnGraph;
pub use variant::{Variant, VariantStore};
