//! Candidate variants and the store that deduplicates them across walks and windows
pub mod store;
pub mod variant;

pub use store::VariantStore;
pub use variant::{StrandCounts, Variant, VariantStatus, VariantType};
