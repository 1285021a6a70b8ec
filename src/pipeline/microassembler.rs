//! Per-window assembly: build, clean, anchor and traverse the graph, retrying
//! with larger k when the window is repetitive

use tracing::{debug, info, warn};

use crate::align::GlobalAligner;
use crate::config::AssemblyConfig;
use crate::graph::stats::WindowStats;
use crate::graph::{DeBruijnGraph, ReadInfo};
use crate::kmer::kmer::Ori;
use crate::kmer::repeat::{is_almost_repeat, is_repeat};
use crate::pipeline::windows::Window;
use crate::reference::ReferenceWindow;
use crate::variant::store::VariantStore;

/// Why a window produced no traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSkip {
    /// Every k tried was repetitive in the reference or the assembled walks
    Repetitive,
    /// Read coverage above the configured ceiling
    HighCoverage,
    /// No reads to assemble
    NoReads,
}

/// Outcome of assembling one window
#[derive(Debug, Default)]
pub struct WindowResult {
    pub stats: WindowStats,
    pub store: VariantStore,
    /// k that was traversed, if any
    pub k: Option<usize>,
    /// k values abandoned because of cycles or repeats
    pub retries: usize,
    pub skipped: Option<WindowSkip>,
}

enum Attempt {
    Done(WindowStats, VariantStore),
    Retry,
    Skip(WindowSkip),
}

/// Assembles windows with a fixed configuration and aligner
pub struct MicroAssembler<'a> {
    config: &'a AssemblyConfig,
    aligner: &'a dyn GlobalAligner,
}

impl<'a> MicroAssembler<'a> {
    pub fn new(config: &'a AssemblyConfig, aligner: &'a dyn GlobalAligner) -> Self {
        Self { config, aligner }
    }

    /// Assemble `reads` against `ref_seq`, the sequence of `window`
    pub fn process_window(&self, window: &Window, ref_seq: &str, reads: &[ReadInfo]) -> WindowResult {
        let mut result = WindowResult::default();
        if reads.is_empty() {
            result.skipped = Some(WindowSkip::NoReads);
            return result;
        }

        for k in self.config.k_values() {
            if is_repeat(ref_seq, k) || is_almost_repeat(ref_seq, k, self.config.max_mismatch) {
                debug!("{}: reference repeat at k = {}", window, k);
                result.retries += 1;
                continue;
            }
            match self.assemble_k(window, ref_seq, reads, k) {
                Attempt::Done(stats, store) => {
                    info!(
                        "{}: k={} {} paths, {} variants",
                        window, k, stats.complete, stats.variants
                    );
                    result.stats = stats;
                    result.store = store;
                    result.k = Some(k);
                    return result;
                }
                Attempt::Retry => result.retries += 1,
                Attempt::Skip(reason) => {
                    result.skipped = Some(reason);
                    return result;
                }
            }
        }

        warn!("{}: repetitive at every k, skipping", window);
        result.skipped = Some(WindowSkip::Repetitive);
        result
    }

    fn assemble_k(&self, window: &Window, ref_seq: &str, reads: &[ReadInfo], k: usize) -> Attempt {
        let config = self.config.for_k(k);
        let reference = ReferenceWindow::new(&window.chrom, window.start, ref_seq);
        let mut graph = DeBruijnGraph::new(&config, reference);
        for read in reads {
            graph.add_alignment(read.clone());
        }
        graph.build_graph();

        let avg_cov = graph.avg_cov();
        if avg_cov > config.max_avg_cov {
            warn!("{}: average coverage {:.1} above {}, skipping", window, avg_cov, config.max_avg_cov);
            return Attempt::Skip(WindowSkip::HighCoverage);
        }

        let mut stats = WindowStats { k, nodes: graph.nodes.len(), ..Default::default() };
        stats.ref_nodes = graph.mark_ref_nodes();
        let ref_comps = graph.mark_connected_components();
        stats.components = graph.nodes.values().map(|n| n.component).max().unwrap_or(0);
        stats.ref_components = ref_comps.len();
        if !graph.has_tumor_only_kmer() {
            debug!("{}: no tumor-only k-mers", window);
        }

        let mut store = VariantStore::default();
        for comp in ref_comps {
            if !graph.mark_ref_ends(comp) {
                info!("{}: no reference anchors in component {}", window, comp);
                continue;
            }
            graph.compress(comp);
            stats.low_cov_removed += graph.remove_low_cov(true, comp);
            stats.tips_removed += graph.remove_tips(comp);
            stats.links_removed += graph.remove_short_links(comp);
            if config.greedy_trim {
                graph.greedy_trim(comp);
            }
            stats.nodes_threaded += graph.thread_reads(comp);

            if graph.has_cycle() {
                debug!("{}: cycle found at k = {}", window, k);
                return Attempt::Retry;
            }
            if graph.find_repeats_in_graph_paths(Ori::F) {
                debug!("{}: repeat in assembled walks at k = {}", window, k);
                return Attempt::Retry;
            }

            let outcomes = if config.exhaustive_paths {
                graph.dfs(Ori::F, self.aligner, &mut store, &mut stats)
            } else {
                graph.eka(Ori::F, self.aligner, &mut store, &mut stats)
            };
            let skipped = outcomes.iter().filter(|o| matches!(o, crate::graph::variants::PathOutcome::Skipped(_))).count();
            if skipped > 0 {
                debug!("{}: {} of {} paths skipped in component {}", window, skipped, outcomes.len(), comp);
            }
        }
        Attempt::Done(stats, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AffineAligner;
    use crate::graph::{ReadLabel, Strand};

    const REF: &str = "ACGGTCATTGCAGGACTTGA";

    fn window() -> Window {
        Window { chrom: "chr1".to_string(), start: 1, end: REF.len(), core_start: 1, core_end: REF.len() }
    }

    #[test]
    fn test_window_without_reads_is_skipped() {
        let config = AssemblyConfig { min_k: 7, max_k: 9, cov_threshold: 2, ..Default::default() };
        let aligner = AffineAligner::default();
        let result = MicroAssembler::new(&config, &aligner).process_window(&window(), REF, &[]);
        assert_eq!(result.skipped, Some(WindowSkip::NoReads));
    }

    #[test]
    fn test_repetitive_reference_tries_every_k() {
        let config = AssemblyConfig { min_k: 5, max_k: 7, cov_threshold: 2, ..Default::default() };
        let aligner = AffineAligner::default();
        let seq = "ACGTACGTACGTACGTACGT";
        let reads = vec![ReadInfo::new("r", seq, &"I".repeat(seq.len()), ReadLabel::Normal, Strand::Fwd, 0)];
        let result = MicroAssembler::new(&config, &aligner).process_window(&window(), seq, &reads);
        assert_eq!(result.skipped, Some(WindowSkip::Repetitive));
        assert_eq!(result.retries, 2);
        assert!(result.k.is_none());
    }

    #[test]
    fn test_somatic_snv_window() {
        let config = AssemblyConfig { min_k: 7, max_k: 9, cov_threshold: 2, ..Default::default() };
        let aligner = AffineAligner::default();
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let qv = "I".repeat(REF.len());
        let mut reads = Vec::new();
        for i in 0..4 {
            reads.push(ReadInfo::new(&format!("n{}", i), REF, &qv, ReadLabel::Normal, Strand::Fwd, 0));
            reads.push(ReadInfo::new(&format!("t{}", i), &alt, &qv, ReadLabel::Tumor, Strand::Rev, 0));
        }
        let result = MicroAssembler::new(&config, &aligner).process_window(&window(), REF, &reads);
        assert_eq!(result.k, Some(7));
        assert_eq!(result.stats.complete, 2);
        let calls = result.store.variants();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].signature(), "chr1:11:C:T");
        assert!(calls[0].is_somatic);
    }
}
