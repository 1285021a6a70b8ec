//! File formats at the edges of the assembler: reference FASTA, read FASTQ and variant tables
pub mod fasta;
pub mod fastq;
pub mod variants;
