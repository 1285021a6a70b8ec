//! Alignment of assembled walks to the reference and extraction of candidate variants

use tracing::{debug, warn};

use crate::align::{GappedAlignment, GlobalAligner};
use crate::graph::node::{BaseCoverage, CovStatus, Sample};
use crate::graph::path::{ColumnCounts, Path};
use crate::graph::stats::WindowStats;
use crate::graph::transcript::{MutationCode, Transcript};
use crate::graph::DeBruijnGraph;
use crate::kmer::kmer::hamming_distance;
use crate::kmer::repeat::find_tandem_at;
use crate::variant::store::VariantStore;
use crate::variant::variant::Variant;

/// Walks within this Hamming distance of the reference are compared without gaps
const HAMMING_CUTOFF: usize = 5;

/// What happened to one walk handed to variant extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Processed { variants: usize },
    Skipped(String),
}

impl PathOutcome {
    pub fn variants(&self) -> usize {
        match self {
            PathOutcome::Processed { variants } => *variants,
            PathOutcome::Skipped(_) => 0,
        }
    }
}

#[derive(Debug, Default)]
struct PathScan {
    counts: ColumnCounts,
    variants: Vec<Variant>,
}

fn prev_base(aln: &[u8], column: usize) -> Option<char> {
    aln[..column]
        .iter()
        .rev()
        .find(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
        .map(|&b| b as char)
}

impl DeBruijnGraph {
    /// Align a complete walk to the reference, coalesce differing columns into
    /// transcripts and store every transcript with alternative read support
    pub fn process_path(
        &mut self,
        path: &mut Path,
        aligner: &dyn GlobalAligner,
        store: &mut VariantStore,
        stats: &mut WindowStats,
    ) -> PathOutcome {
        let scan = match self.scan_path(path, aligner) {
            Ok(scan) => scan,
            Err(reason) => {
                warn!("skipping path {}: {}", path.path_str(), reason);
                stats.skipped += 1;
                return PathOutcome::Skipped(reason);
            }
        };

        let counts = scan.counts;
        debug!(
            "path {}:{}-{} cycle: {} match: {} snp: {} ins: {} del: {}",
            self.reference.chrom,
            self.reference.start,
            self.reference.end,
            path.has_cycle,
            counts.match_bp,
            counts.snp_bp,
            counts.ins_bp,
            counts.del_bp
        );
        stats.record_path(counts.snp_bp, counts.ins_bp, counts.del_bp);
        path.counts = counts;

        for id in &path.nodes {
            if let Some(node) = self.nodes.get_mut(id.as_str()) {
                node.on_ref_path += 1;
            }
        }

        let variants = scan.variants.len();
        stats.variants += variants;
        for variant in scan.variants {
            store.add_var(variant);
        }
        PathOutcome::Processed { variants }
    }

    fn scan_path(&self, path: &Path, aligner: &dyn GlobalAligner) -> Result<PathScan, String> {
        let refseq = &self.reference.seq;
        let trim5 = self.reference.trim5;
        let pathseq = path.seq(self);
        let cov_nml = path.coverage(self, Sample::Normal);
        let cov_tmr = path.coverage(self, Sample::Tumor);

        let aln = match hamming_distance(refseq, &pathseq) {
            Some(d) if d <= HAMMING_CUTOFF => GappedAlignment::identity(refseq, &pathseq),
            _ => aligner.align(refseq, &pathseq),
        };
        let (ref_aln, path_aln) = (aln.ref_aln.as_bytes(), aln.path_aln.as_bytes());

        let mut scan = PathScan::default();
        let mut transcripts: Vec<Transcript> = Vec::new();
        let (mut refpos, mut pathpos) = (0usize, 0usize);
        let mut prev_mismatch = false;

        for i in 0..aln.len() {
            let code = MutationCode::from_columns(ref_aln[i], path_aln[i]);
            let pos_in_ref = refpos;
            match code {
                Some(MutationCode::Ins) => {
                    scan.counts.ins_bp += 1;
                    pathpos += 1;
                }
                Some(MutationCode::Del) => {
                    scan.counts.del_bp += 1;
                    refpos += 1;
                }
                other => {
                    if other.is_some() {
                        scan.counts.snp_bp += 1;
                    } else {
                        scan.counts.match_bp += 1;
                    }
                    refpos += 1;
                    pathpos += 1;
                }
            }
            let Some(code) = code else {
                prev_mismatch = false;
                continue;
            };

            if pathpos == 0 {
                return Err(format!("alignment column {} lies before the walk", i));
            }
            let at = pathpos - 1;
            let spanner = path
                .node_at(self, at)
                .ok_or_else(|| format!("path position out of range: {}", at))?;
            let within_tumor = spanner.is_status_cnt(CovStatus::Tumor);

            let cov_n = cov_nml.get(at).copied().unwrap_or_default();
            let cov_t = cov_tmr.get(at).copied().unwrap_or_default();
            let ref_n = self.reference.cov_at(pos_in_ref + trim5, Sample::Normal);
            let ref_t = self.reference.cov_at(pos_in_ref + trim5, Sample::Tumor);
            let rrpos = pos_in_ref + self.reference.start + trim5;
            let (ref_base, alt_base) = (ref_aln[i] as char, path_aln[i] as char);

            match transcripts.last_mut() {
                Some(last) if prev_mismatch && code != MutationCode::Snv => {
                    let del_end = last.del_end();
                    if within_tumor {
                        last.is_somatic = true;
                    }
                    last.extend(ref_base, alt_base, at, pos_in_ref);
                    if code == MutationCode::Ins && last.code == code && last.pos == rrpos {
                        last.add_alt_cov(cov_n, cov_t);
                    } else if code == MutationCode::Del && last.code == code && del_end == rrpos {
                        last.add_ref_cov(ref_n, ref_t);
                    } else {
                        last.code = MutationCode::Complex;
                        last.add_alt_cov(cov_n, cov_t);
                        last.add_ref_cov(ref_n, ref_t);
                    }
                }
                _ => {
                    let prev_ref = prev_base(ref_aln, i)
                        .ok_or_else(|| format!("no reference base before column {}", i))?;
                    let prev_alt =
                        prev_base(path_aln, i).ok_or_else(|| format!("no walk base before column {}", i))?;
                    let mut t = Transcript::new(
                        rrpos,
                        pos_in_ref,
                        at,
                        code,
                        ref_base,
                        alt_base,
                        prev_ref,
                        prev_alt,
                        within_tumor,
                    );
                    t.add_alt_cov(cov_n, cov_t);
                    t.add_ref_cov(ref_n, ref_t);
                    transcripts.push(t);
                }
            }
            prev_mismatch = true;
        }

        for mut t in transcripts {
            if t.code != MutationCode::Snv {
                self.extend_indel_coverage(&mut t, path, &cov_nml, &cov_tmr);
            }
            if let Some(variant) = self.call_variant(&t, &pathseq) {
                scan.variants.push(variant);
            }
        }
        Ok(scan)
    }

    /// Add coverage for the k bases following an indel, which the aligner may
    /// have shifted away from the node that carries it
    fn extend_indel_coverage(&self, t: &mut Transcript, path: &Path, cov_nml: &[BaseCoverage], cov_tmr: &[BaseCoverage]) {
        let trim5 = self.reference.trim5;
        for j in 0..=self.k {
            let idx = t.end_pos + j;
            if idx < cov_nml.len() {
                let Some(spanner) = path.node_at(self, idx) else { break };
                if spanner.is_status_cnt(CovStatus::Tumor) {
                    t.is_somatic = true;
                }
                t.add_alt_cov(cov_nml[idx], cov_tmr.get(idx).copied().unwrap_or_default());
            }
            let ref_idx = t.ref_end_pos + trim5 + j;
            t.add_ref_cov(
                self.reference.cov_at(ref_idx, Sample::Normal),
                self.reference.cov_at(ref_idx, Sample::Tumor),
            );
        }
    }

    fn call_variant(&self, t: &Transcript, pathseq: &str) -> Option<Variant> {
        let stats = t.stats();
        if !stats.has_alt_support() {
            return None;
        }
        let str_annotation = find_tandem_at(pathseq, t.start_pos, &self.config.tandem_params())
            .map(|tandem| tandem.annotation())
            .unwrap_or_default();

        let mut variant = Variant::from_transcript(
            &self.reference.chrom,
            t.pos.saturating_sub(1),
            t,
            &stats,
            self.k,
            str_annotation,
        );
        if self.config.linked_reads {
            let (ref_start, ref_end) = (t.ref_pos.saturating_sub(1), t.ref_end_pos.saturating_sub(1));
            let (alt_start, alt_end) = (t.start_pos.saturating_sub(2), t.end_pos.saturating_sub(1));
            variant.bx_ref_normal = self.reference.bx_set_at(ref_start, ref_end, Sample::Normal);
            variant.bx_ref_tumor = self.reference.bx_set_at(ref_start, ref_end, Sample::Tumor);
            variant.bx_alt_normal = self.barcodes.bx_set_at(alt_start, alt_end, pathseq, self.k, Sample::Normal);
            variant.bx_alt_tumor = self.barcodes.bx_set_at(alt_start, alt_end, pathseq, self.k, Sample::Tumor);
        }
        debug!(
            "{} {}:{} {}|{} somatic: {}",
            t.code, variant.chrom, variant.pos, t.ref_seq, t.alt_seq, variant.is_somatic
        );
        Some(variant)
    }

    /// Align the single node reachable from `source` when no walk reaches the
    /// sink. Only the path counters are updated.
    pub fn process_short_path(
        &mut self,
        source: &str,
        aligner: &dyn GlobalAligner,
        stats: &mut WindowStats,
    ) -> PathOutcome {
        let Some((target, dir)) = self
            .node(source)
            .and_then(|n| n.edges.first())
            .map(|e| (e.node_id.clone(), e.dir))
        else {
            return PathOutcome::Skipped(format!("source {} has no neighbour", source));
        };
        let Some(node) = self.nodes.get_mut(target.as_str()) else {
            return PathOutcome::Skipped(format!("missing node {}", target));
        };
        node.on_ref_path += 1;
        let seq = node.oriented_seq(dir.dest());

        let aln = aligner.align_partial(&self.reference.seq, &seq);
        let (matches, snp, ins, del) = aln.column_counts();
        debug!("short path match: {} snp: {} ins: {} del: {}", matches, snp, ins, del);
        stats.record_path(snp, ins, del);
        PathOutcome::Processed { variants: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AffineAligner;
    use crate::config::AssemblyConfig;
    use crate::graph::node::Node;
    use crate::graph::{ReadInfo, ReadLabel, Strand};
    use crate::kmer::kmer::Ori;
    use crate::reference::ReferenceWindow;
    use crate::variant::variant::VariantType;

    const REF: &str = "ACGGTCATTGCAGGACTTGA";
    /// REF with a longer right flank, so indel branches rejoin
    const LONG_REF: &str = "ACGGTCATTGCAGGACTTGATCCGTAGCAT";

    fn graph_with(alt: &str) -> DeBruijnGraph {
        graph_on(REF, alt)
    }

    fn graph_on(reference: &str, alt: &str) -> DeBruijnGraph {
        let config = AssemblyConfig { k: 7, min_k: 7, cov_threshold: 2, ..Default::default() };
        let mut g = DeBruijnGraph::new(&config, ReferenceWindow::new("chr1", 1, reference));
        for i in 0..4 {
            let strand = if i % 2 == 0 { Strand::Fwd } else { Strand::Rev };
            let qv = "I".repeat(reference.len());
            g.add_alignment(ReadInfo::new(&format!("n{}", i), reference, &qv, ReadLabel::Normal, strand, 0));
            let qv = "I".repeat(alt.len());
            g.add_alignment(ReadInfo::new(&format!("t{}", i), alt, &qv, ReadLabel::Tumor, strand, 0));
        }
        g.build_graph();
        g.mark_ref_nodes();
        g.mark_connected_components();
        assert!(g.mark_ref_ends(1));
        g.compress(1);
        g
    }

    #[test]
    fn test_somatic_snv_is_called() {
        let mut alt = REF.to_string();
        alt.replace_range(10..11, "T");
        let mut g = graph_with(&alt);
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        let outcomes = g.eka(Ori::F, &AffineAligner::default(), &mut store, &mut stats);
        assert_eq!(outcomes.iter().map(PathOutcome::variants).sum::<usize>(), 1);
        let calls = store.variants();
        assert_eq!(calls.len(), 1);
        let v = calls[0];
        assert_eq!((v.pos, v.ref_allele.as_str(), v.alt_allele.as_str()), (11, "C", "T"));
        assert!(v.is_somatic);
        assert!(v.alt_cov_tumor.total() > 0);
        assert_eq!(v.alt_cov_normal.total(), 0);
        assert_eq!((stats.perfect, stats.with_snps), (1, 1));
    }

    #[test]
    fn test_reference_walk_only_is_perfect() {
        let mut g = graph_with(REF);
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        g.eka(Ori::F, &AffineAligner::default(), &mut store, &mut stats);
        assert!(store.is_empty());
        assert_eq!(stats.perfect, 1);
        assert!(g.nodes.values().all(|n| n.on_ref_path <= 1));
    }

    /// Returns a fixed alignment for one walk and defers to the affine aligner otherwise
    struct FixedAligner {
        aln: GappedAlignment,
    }

    impl GlobalAligner for FixedAligner {
        fn align(&self, reference: &str, path: &str) -> GappedAlignment {
            if self.aln.ref_aln.replace('-', "") == reference && self.aln.path_aln.replace('-', "") == path {
                self.aln.clone()
            } else {
                AffineAligner::default().align(reference, path)
            }
        }

        fn align_partial(&self, reference: &str, query: &str) -> GappedAlignment {
            AffineAligner::default().align_partial(reference, query)
        }
    }

    #[test]
    fn test_adjacent_deletion_columns_coalesce() {
        // GG deleted after the A at position 12
        let alt = format!("{}{}", &LONG_REF[..12], &LONG_REF[14..]);
        let mut g = graph_on(LONG_REF, &alt);
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        g.eka(Ori::F, &AffineAligner::default(), &mut store, &mut stats);

        let calls = store.variants();
        assert_eq!(calls.len(), 1);
        let v = calls[0];
        assert_eq!(v.kind, VariantType::Del);
        assert_eq!((v.pos, v.ref_allele.as_str(), v.alt_allele.as_str(), v.len), (12, "AGG", "A", 2));
        assert!(v.is_somatic);
        assert!(v.alt_cov_tumor.total() > 0);
        assert_eq!(v.alt_cov_normal.total(), 0);
        assert_eq!((stats.perfect, stats.with_indel), (1, 1));
    }

    #[test]
    fn test_substitution_then_insertion_is_complex() {
        // C at position 11 replaced by TA
        let alt = format!("{}TA{}", &LONG_REF[..10], &LONG_REF[11..]);
        let aligner = FixedAligner {
            aln: GappedAlignment {
                ref_aln: format!("{}-{}", &LONG_REF[..11], &LONG_REF[11..]),
                path_aln: alt.clone(),
            },
        };
        let mut g = graph_on(LONG_REF, &alt);
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        g.eka(Ori::F, &aligner, &mut store, &mut stats);

        let calls = store.variants();
        assert_eq!(calls.len(), 1);
        let v = calls[0];
        assert_eq!(v.kind, VariantType::Complex);
        assert_eq!((v.pos, v.ref_allele.as_str(), v.alt_allele.as_str(), v.len), (10, "GC", "GTA", 1));
        assert!(v.is_somatic);
        assert_eq!(stats.with_mix, 1);
    }

    #[test]
    fn test_substitution_after_mismatch_starts_new_event() {
        // two neighbouring substitutions stay separate calls
        let mut alt = LONG_REF.to_string();
        alt.replace_range(10..12, "TT");
        let mut g = graph_on(LONG_REF, &alt);
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();
        g.eka(Ori::F, &AffineAligner::default(), &mut store, &mut stats);

        let calls = store.variants();
        let alleles: Vec<(usize, &str, &str)> =
            calls.iter().map(|v| (v.pos, v.ref_allele.as_str(), v.alt_allele.as_str())).collect();
        assert_eq!(alleles, vec![(11, "C", "T"), (12, "A", "T")]);
        assert!(calls.iter().all(|v| v.kind == VariantType::Snv));
    }

    #[test]
    fn test_walk_keeps_column_counts() {
        let alt = format!("{}{}", &LONG_REF[..12], &LONG_REF[14..]);
        let mut g = graph_on(LONG_REF, &alt);
        let (source, sink) = (g.source.clone().unwrap(), g.sink.clone().unwrap());
        let aligner = AffineAligner::default();
        let mut store = VariantStore::default();
        let mut stats = WindowStats::default();

        let mut counts = Vec::new();
        while let Some(mut path) = g.bfs(&source, &sink, Ori::F).best {
            g.process_path(&mut path, &aligner, &mut store, &mut stats);
            counts.push(path.counts);
            g.mark_path_visited(&path);
        }
        counts.sort_by_key(|c| c.del_bp);
        assert_eq!(
            counts,
            vec![
                ColumnCounts { match_bp: LONG_REF.len(), ..Default::default() },
                ColumnCounts { match_bp: alt.len(), del_bp: 2, ..Default::default() },
            ]
        );
    }

    #[test]
    fn test_short_path_only_updates_counters() {
        let mut g = graph_with(REF);
        let source = g.source.clone().unwrap();
        let mut stats = WindowStats::default();
        let outcome = g.process_short_path(&source, &AffineAligner::default(), &mut stats);
        assert_eq!(outcome, PathOutcome::Processed { variants: 0 });
        assert_eq!(stats.perfect, 1);
        let visited: Vec<&Node> = g.nodes.values().filter(|n| n.on_ref_path > 0).collect();
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].strlen(), REF.len());

        let missing = g.process_short_path("source99", &AffineAligner::default(), &mut stats);
        assert!(matches!(missing, PathOutcome::Skipped(_)));
        assert_eq!(stats.perfect, 1);
    }

    #[test]
    fn test_prev_base_skips_gaps() {
        assert_eq!(prev_base(b"AC--G", 4), Some('C'));
        assert_eq!(prev_base(b"--G", 2), None);
    }
}
