//! Per-window traversal and cleaning counters

use serde::Serialize;

/// Counters accumulated while processing one window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    pub k: usize,
    pub nodes: usize,
    pub ref_nodes: usize,
    pub components: usize,
    pub ref_components: usize,
    pub tips_removed: usize,
    pub low_cov_removed: usize,
    pub links_removed: usize,
    pub nodes_threaded: usize,
    /// Partial walks dequeued by all searches
    pub visits: usize,
    /// Walks reported source to sink
    pub complete: usize,
    pub short_paths: usize,
    pub cycles: usize,
    pub perfect: usize,
    pub with_snps: usize,
    pub with_indel: usize,
    pub with_mix: usize,
    /// Walks abandoned during variant extraction
    pub skipped: usize,
    pub variants: usize,
}

impl WindowStats {
    /// Classify a processed walk by the kinds of differences it carries
    pub fn record_path(&mut self, snp_bp: usize, ins_bp: usize, del_bp: usize) {
        if snp_bp + ins_bp + del_bp == 0 {
            self.perfect += 1;
        } else if snp_bp == 0 {
            self.with_indel += 1;
        } else if ins_bp + del_bp == 0 {
            self.with_snps += 1;
        } else {
            self.with_mix += 1;
        }
    }

    /// Add the counters of another window
    pub fn absorb(&mut self, other: &WindowStats) {
        self.nodes += other.nodes;
        self.ref_nodes += other.ref_nodes;
        self.components += other.components;
        self.ref_components += other.ref_components;
        self.tips_removed += other.tips_removed;
        self.low_cov_removed += other.low_cov_removed;
        self.links_removed += other.links_removed;
        self.nodes_threaded += other.nodes_threaded;
        self.visits += other.visits;
        self.complete += other.complete;
        self.short_paths += other.short_paths;
        self.cycles += other.cycles;
        self.perfect += other.perfect;
        self.with_snps += other.with_snps;
        self.with_indel += other.with_indel;
        self.with_mix += other.with_mix;
        self.skipped += other.skipped;
        self.variants += other.variants;
    }
}

impl std::fmt::Display for WindowStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Window Statistics ===")?;
        if self.k > 0 {
            writeln!(f, "K: {}", self.k)?;
        }
        writeln!(f, "Nodes: {} ({} touching reference)", self.nodes, self.ref_nodes)?;
        writeln!(f, "Components: {} ({} touching reference)", self.components, self.ref_components)?;
        if self.tips_removed > 0 || self.low_cov_removed > 0 || self.links_removed > 0 {
            writeln!(
                f,
                "Graph cleaning: {} tips, {} low coverage, {} short links removed",
                self.tips_removed, self.low_cov_removed, self.links_removed
            )?;
        }
        if self.nodes_threaded > 0 {
            writeln!(f, "Threaded nodes: {}", self.nodes_threaded)?;
        }
        writeln!(
            f,
            "Paths: {} complete, {} short, {} with cycles, {} skipped ({} visits)",
            self.complete, self.short_paths, self.cycles, self.skipped, self.visits
        )?;
        writeln!(
            f,
            "Perfect: {} SNVs: {} indels: {} mixed: {}",
            self.perfect, self.with_snps, self.with_indel, self.with_mix
        )?;
        writeln!(f, "Variants: {}", self.variants)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path_classes() {
        let mut stats = WindowStats::default();
        stats.record_path(0, 0, 0);
        stats.record_path(2, 0, 0);
        stats.record_path(0, 1, 0);
        stats.record_path(1, 0, 3);
        assert_eq!((stats.perfect, stats.with_snps, stats.with_indel, stats.with_mix), (1, 1, 1, 1));
    }

    #[test]
    fn test_display_header() {
        let text = WindowStats { k: 11, complete: 3, ..Default::default() }.to_string();
        assert!(text.starts_with("=== Window Statistics ==="));
        assert!(text.contains("K: 11"));
        assert!(text.contains("3 complete"));
    }
}
