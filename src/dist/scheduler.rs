use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::align::GlobalAligner;
use crate::config::AssemblyConfig;
use crate::error::{MicroassemblerError, Result};
use crate::graph::ReadInfo;
use crate::pipeline::microassembler::MicroAssembler;
use crate::pipeline::windows::Window;
use crate::stats::RunStats;
use crate::variant::store::VariantStore;

/// A window together with its reference bases
#[derive(Debug, Clone)]
pub struct WindowJob {
    pub window: Window,
    pub ref_seq: String,
}

/// Assemble every job on a pool of `config.num_threads` workers, then merge
/// the per-window stores in window order and resolve somatic conflicts
pub fn run_windows(
    config: &AssemblyConfig,
    aligner: &dyn GlobalAligner,
    jobs: &[WindowJob],
    reads: &[ReadInfo],
) -> Result<(VariantStore, RunStats)> {
    let threads = if config.num_threads == 0 { num_cpus::get() } else { config.num_threads };
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| MicroassemblerError::InvalidConfig(format!("cannot start {} workers: {}", threads, e)))?;
    info!("Processing {} windows on {} threads", jobs.len(), threads);

    let assembler = MicroAssembler::new(config, aligner);
    let results: Vec<_> = pool.install(|| {
        jobs.par_iter()
            .map(|job| assembler.process_window(&job.window, &job.ref_seq, reads))
            .collect()
    });

    let mut store = VariantStore::default();
    let mut stats = RunStats::default();
    for result in results {
        stats.record_window(&result);
        store.merge(result.store);
    }
    let discarded = store.select_var();
    stats.record_variants(&store, discarded);
    info!("Merged {} candidate variants ({} conflicting calls dropped)", store.len(), discarded);
    Ok((store, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AffineAligner;
    use crate::graph::{ReadLabel, Strand};

    const REF: &str = "ACGGTCATTGCAGGACTTGA";

    #[test]
    fn test_overlapping_windows_merge_calls() {
        let config = AssemblyConfig { min_k: 7, max_k: 9, cov_threshold: 2, num_threads: 2, ..Default::default() };
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let qv = "I".repeat(REF.len());
        let mut reads = Vec::new();
        for i in 0..4 {
            reads.push(ReadInfo::new(&format!("n{}", i), REF, &qv, ReadLabel::Normal, Strand::Fwd, 0));
            reads.push(ReadInfo::new(&format!("t{}", i), &alt, &qv, ReadLabel::Tumor, Strand::Fwd, 0));
        }
        let window = Window { chrom: "chr1".to_string(), start: 1, end: 20, core_start: 1, core_end: 20 };
        let jobs = vec![
            WindowJob { window: window.clone(), ref_seq: REF.to_string() },
            WindowJob { window, ref_seq: REF.to_string() },
        ];

        let (store, stats) = run_windows(&config, &AffineAligner::default(), &jobs, &reads).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.variants()[0].similar_variants_count, 2);
        assert_eq!(stats.windows, 2);
        assert_eq!(stats.assembled, 2);
    }
}
