//! K-mer codec and repeat detection
pub mod kmer;
pub mod repeat;
