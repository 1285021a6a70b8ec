//! Assembly configuration shared read-only by every window worker.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MicroassemblerError, Result};
use crate::kmer::repeat::TandemParams;

/// Configuration for local micro-assembly
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// K-mer size of the graph currently being built
    pub k: usize,
    /// Smallest k-mer size tried per window
    pub min_k: usize,
    /// Largest k-mer size tried per window
    pub max_k: usize,
    /// Increment between k-mer sizes (odd k avoids palindromic k-mers)
    pub k_step: usize,
    /// ASCII offset of base qualities
    pub qv_offset: u8,
    /// Minimum base quality kept by 5'/3' trimming
    pub min_qv_trim: u8,
    /// Minimum base quality for a base to count towards calling coverage
    pub min_qv_call: u8,
    /// Minimum total k-mer coverage for a reference anchor
    pub cov_threshold: u32,
    /// Fraction of average window coverage below which nodes are removed
    pub min_cov_ratio: f64,
    /// Absolute coverage floor for low-coverage removal
    pub low_cov_threshold: u32,
    /// Dead-end branches shorter than this (in k-mers) are tips
    pub max_tip_len: usize,
    /// Nodes shorter than this (in k-mers) are candidate short links
    pub max_link_len: usize,
    /// Length slack over the reference allowed for a walk
    pub max_indel_len: usize,
    /// Mismatches tolerated when looking for near repeats
    pub max_mismatch: usize,
    /// Visit budget of a single path search
    pub dfs_limit: usize,
    /// Windows whose average coverage exceeds this are skipped
    pub max_avg_cov: f64,
    /// Longest STR motif
    pub max_unit_len: usize,
    /// Minimum motif copies for an STR to be reported
    pub min_report_units: usize,
    /// Minimum STR span in bases
    pub min_report_len: usize,
    /// Distance from an STR that still counts as inside it
    pub dist_from_str: usize,
    /// Shared reads required to thread a branching node (None disables threading)
    pub min_thread_reads: Option<usize>,
    /// Keep only the best edge on each side of branching nodes
    pub greedy_trim: bool,
    /// Track barcodes and haplotypes of linked reads
    pub linked_reads: bool,
    /// Process every source-to-sink walk instead of a minimal edge cover
    pub exhaustive_paths: bool,
    /// Window length
    pub window_size: usize,
    /// Extra reference added on both sides of a window
    pub padding: usize,
    /// Distance between consecutive window starts
    pub window_step: usize,
    /// Number of worker threads
    pub num_threads: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: 11,
            min_k: 11,
            max_k: 101,
            k_step: 2,
            qv_offset: b'!',
            min_qv_trim: 10,
            min_qv_call: 17,
            cov_threshold: 5,
            min_cov_ratio: 0.01,
            low_cov_threshold: 1,
            max_tip_len: 11,
            max_link_len: 10,
            max_indel_len: 500,
            max_mismatch: 2,
            dfs_limit: 1_000_000,
            max_avg_cov: 10_000.0,
            max_unit_len: 4,
            min_report_units: 3,
            min_report_len: 7,
            dist_from_str: 1,
            min_thread_reads: None,
            greedy_trim: false,
            linked_reads: false,
            exhaustive_paths: false,
            window_size: 600,
            padding: 250,
            window_step: 100,
            num_threads: 1,
        }
    }
}

impl AssemblyConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: AssemblyConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Copy of this configuration for a graph built with k-mer size `k`
    pub fn for_k(&self, k: usize) -> Self {
        Self { k, ..self.clone() }
    }

    /// Quality character threshold used by trimming
    pub fn min_qual_trim(&self) -> u8 {
        self.qv_offset.saturating_add(self.min_qv_trim)
    }

    /// Quality character threshold used for calling coverage
    pub fn min_qual_call(&self) -> u8 {
        self.qv_offset.saturating_add(self.min_qv_call)
    }

    /// K-mer sizes tried per window, smallest first
    pub fn k_values(&self) -> impl Iterator<Item = usize> {
        (self.min_k..=self.max_k).step_by(self.k_step.max(1))
    }

    /// STR detection thresholds
    pub fn tandem_params(&self) -> TandemParams {
        TandemParams {
            max_unit_len: self.max_unit_len,
            min_report_units: self.min_report_units,
            min_report_len: self.min_report_len,
            dist_from_str: self.dist_from_str,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_k < 3 {
            return Err(MicroassemblerError::InvalidConfig(format!(
                "min_k must be at least 3, got {}",
                self.min_k
            )));
        }
        if self.min_k > self.max_k {
            return Err(MicroassemblerError::InvalidConfig(format!(
                "min_k ({}) exceeds max_k ({})",
                self.min_k, self.max_k
            )));
        }
        if self.window_step == 0 || self.window_size == 0 {
            return Err(MicroassemblerError::InvalidConfig(
                "window size and step must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_cov_ratio) {
            return Err(MicroassemblerError::InvalidConfig(format!(
                "min_cov_ratio must lie in [0, 1], got {}",
                self.min_cov_ratio
            )));
        }
        if self.min_thread_reads == Some(0) {
            return Err(MicroassemblerError::InvalidConfig(
                "min_thread_reads must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        let config = AssemblyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_qual_call(), b'!' + 17);
        assert_eq!(config.k_values().next(), Some(11));
    }

    #[test]
    fn test_k_values_step() {
        let config = AssemblyConfig { min_k: 11, max_k: 17, ..Default::default() };
        let ks: Vec<usize> = config.k_values().collect();
        assert_eq!(ks, vec![11, 13, 15, 17]);
    }

    #[test]
    fn test_rejects_inverted_k_range() {
        let config = AssemblyConfig { min_k: 31, max_k: 21, ..Default::default() };
        assert!(matches!(config.validate(), Err(MicroassemblerError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"min_k\": 15, \"max_tip_len\": 20}}").unwrap();
        let config = AssemblyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.min_k, 15);
        assert_eq!(config.max_tip_len, 20);
        assert_eq!(config.cov_threshold, 5);
    }
}
