use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::stats::WindowStats;
use crate::pipeline::microassembler::{WindowResult, WindowSkip};
use crate::variant::store::VariantStore;
use crate::variant::variant::VariantStatus;

/// Counters for a whole run across windows
#[derive(Debug, Default, Serialize)]
pub struct RunStats {
    pub windows: usize,
    pub assembled: usize,
    pub skipped_repetitive: usize,
    pub skipped_coverage: usize,
    pub skipped_empty: usize,
    /// k values abandoned over all windows
    pub k_retries: usize,
    /// Windows assembled at each k
    pub k_histogram: BTreeMap<usize, usize>,
    pub totals: WindowStats,
    pub variants: usize,
    pub somatic: usize,
    pub shared: usize,
    pub discarded: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn record_window(&mut self, result: &WindowResult) {
        self.windows += 1;
        self.k_retries += result.retries;
        match result.skipped {
            Some(WindowSkip::Repetitive) => self.skipped_repetitive += 1,
            Some(WindowSkip::HighCoverage) => self.skipped_coverage += 1,
            Some(WindowSkip::NoReads) => self.skipped_empty += 1,
            None => {}
        }
        if let Some(k) = result.k {
            self.assembled += 1;
            *self.k_histogram.entry(k).or_default() += 1;
            self.totals.absorb(&result.stats);
        }
    }

    /// Summarize the final, deduplicated calls
    pub fn record_variants(&mut self, store: &VariantStore, discarded: usize) {
        self.discarded = discarded;
        self.variants = store.len();
        self.by_type.clear();
        self.somatic = 0;
        self.shared = 0;
        for v in store.variants() {
            *self.by_type.entry(v.kind.to_string()).or_default() += 1;
            match v.status() {
                VariantStatus::Somatic => self.somatic += 1,
                VariantStatus::Shared => self.shared += 1,
                _ => {}
            }
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Windows: {} ({} assembled)", self.windows, self.assembled)?;
        writeln!(
            f,
            "Skipped: {} repetitive, {} high coverage, {} without reads",
            self.skipped_repetitive, self.skipped_coverage, self.skipped_empty
        )?;
        writeln!(f, "K retries: {}", self.k_retries)?;
        for (k, n) in &self.k_histogram {
            writeln!(f, "  k={}: {} windows", k, n)?;
        }
        writeln!(
            f,
            "Paths: {} complete, {} short, {} skipped",
            self.totals.complete, self.totals.short_paths, self.totals.skipped
        )?;
        writeln!(
            f,
            "Variants: {} ({} somatic, {} shared, {} dropped as conflicting)",
            self.variants, self.somatic, self.shared, self.discarded
        )?;
        for (kind, n) in &self.by_type {
            writeln!(f, "  {}: {}", kind, n)?;
        }
        Ok(())
    }
}
