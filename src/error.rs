use thiserror::Error;

#[derive(Debug, Error)]
pub enum MicroassemblerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid FASTA record: {0}")]
    Fasta(String),
    #[error("Invalid FASTQ record: {0}")]
    Fastq(String),
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("Sequence not found in reference: {0}")]
    MissingSequence(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MicroassemblerError>;
