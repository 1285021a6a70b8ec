//! Reference window consulted and updated while a graph is built

use ahash::{AHashMap, AHashSet};

use crate::graph::node::{BaseCoverage, Sample, Strand};
use crate::kmer::kmer::{CanonicalMer, Kmer};

/// Barcodes observed per canonical k-mer and sample
#[derive(Debug, Clone, Default)]
pub struct BarcodeTable {
    tumor: AHashMap<Kmer, AHashSet<String>>,
    normal: AHashMap<Kmer, AHashSet<String>>,
}

impl BarcodeTable {
    pub fn add(&mut self, bx: &str, mer: &Kmer, sample: Sample) {
        let table = match sample {
            Sample::Tumor => &mut self.tumor,
            Sample::Normal => &mut self.normal,
        };
        table.entry(mer.clone()).or_default().insert(bx.to_string());
    }

    /// Sorted, comma separated barcodes of the k-mers of `seq` overlapping [start, end]
    pub fn bx_set_at(&self, start: usize, end: usize, seq: &str, k: usize, sample: Sample) -> String {
        let table = match sample {
            Sample::Tumor => &self.tumor,
            Sample::Normal => &self.normal,
        };
        if k == 0 || seq.len() < k || start > end {
            return String::new();
        }
        let first = start.saturating_sub(k - 1);
        let last = end.min(seq.len() - k);
        let mut barcodes: Vec<&String> = Vec::new();
        for i in first..=last {
            if let Some(set) = table.get(&CanonicalMer::new(&seq[i..i + k]).mer) {
                barcodes.extend(set.iter());
            }
        }
        barcodes.sort_unstable();
        barcodes.dedup();
        barcodes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",")
    }

    pub fn clear(&mut self) {
        self.tumor.clear();
        self.normal.clear();
    }
}

/// Reference sequence of one window with per-position read coverage
#[derive(Debug, Clone)]
pub struct ReferenceWindow {
    pub chrom: String,
    /// 1-based position of the first base of `raw_seq`
    pub start: usize,
    /// 1-based position of the last base of `raw_seq`
    pub end: usize,
    pub raw_seq: String,
    /// Part of `raw_seq` between the source and sink anchors
    pub seq: String,
    pub trim5: usize,
    pub trim3: usize,
    k: usize,
    mers: AHashSet<Kmer>,
    mer_cov_tmr: AHashMap<Kmer, BaseCoverage>,
    mer_cov_nml: AHashMap<Kmer, BaseCoverage>,
    coverage_tmr: Vec<BaseCoverage>,
    coverage_nml: Vec<BaseCoverage>,
    pub barcodes: BarcodeTable,
}

impl ReferenceWindow {
    pub fn new(chrom: &str, start: usize, raw_seq: &str) -> Self {
        let raw_seq = raw_seq.to_ascii_uppercase();
        let len = raw_seq.len();
        Self {
            chrom: chrom.to_string(),
            start,
            end: start + len.saturating_sub(1),
            seq: raw_seq.clone(),
            raw_seq,
            trim5: 0,
            trim3: 0,
            k: 0,
            mers: AHashSet::new(),
            mer_cov_tmr: AHashMap::new(),
            mer_cov_nml: AHashMap::new(),
            coverage_tmr: vec![BaseCoverage::default(); len],
            coverage_nml: vec![BaseCoverage::default(); len],
            barcodes: BarcodeTable::default(),
        }
    }

    /// Reset all read-derived state and index the reference k-mers for size `k`
    pub fn set_k(&mut self, k: usize) {
        self.k = k;
        self.seq = self.raw_seq.clone();
        self.trim5 = 0;
        self.trim3 = 0;
        self.mers.clear();
        self.mer_cov_tmr.clear();
        self.mer_cov_nml.clear();
        self.barcodes.clear();
        let len = self.raw_seq.len();
        self.coverage_tmr = vec![BaseCoverage::default(); len];
        self.coverage_nml = vec![BaseCoverage::default(); len];
        if len >= k {
            for i in 0..=len - k {
                self.mers.insert(CanonicalMer::new(&self.raw_seq[i..i + k]).mer);
            }
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn raw_len(&self) -> usize {
        self.raw_seq.len()
    }

    pub fn has_mer(&self, mer: &Kmer) -> bool {
        self.mers.contains(mer)
    }

    pub fn mers(&self) -> &AHashSet<Kmer> {
        &self.mers
    }

    /// Restrict the usable region to [source_offset, sink_offset + k)
    pub fn set_anchors(&mut self, source_offset: usize, sink_offset: usize) {
        let len = self.raw_seq.len();
        let end = (sink_offset + self.k).min(len);
        self.trim5 = source_offset;
        self.trim3 = len - end;
        self.seq = self.raw_seq[source_offset..end].to_string();
    }

    fn mer_table_mut(&mut self, sample: Sample) -> &mut AHashMap<Kmer, BaseCoverage> {
        match sample {
            Sample::Tumor => &mut self.mer_cov_tmr,
            Sample::Normal => &mut self.mer_cov_nml,
        }
    }

    /// Record the current read count of a reference k-mer
    pub fn update_coverage(&mut self, mer: &Kmer, count: u32, strand: Strand, sample: Sample) {
        if !self.mers.contains(mer) {
            return;
        }
        let entry = self.mer_table_mut(sample).entry(mer.clone()).or_default();
        match strand {
            Strand::Fwd => entry.fwd = count,
            Strand::Rev => entry.rev = count,
        }
    }

    pub fn update_hp_coverage(&mut self, mer: &Kmer, hp: [u32; 3], sample: Sample) {
        if !self.mers.contains(mer) {
            return;
        }
        let entry = self.mer_table_mut(sample).entry(mer.clone()).or_default();
        entry.hp0 = hp[0];
        entry.hp1 = hp[1];
        entry.hp2 = hp[2];
    }

    pub fn add_bx(&mut self, bx: &str, mer: &Kmer, sample: Sample) {
        if self.mers.contains(mer) {
            self.barcodes.add(bx, mer, sample);
        }
    }

    /// Project k-mer counts onto reference positions; each position takes the
    /// largest count among the k-mers covering it
    pub fn compute_coverage(&mut self, sample: Sample) {
        let k = self.k;
        let len = self.raw_seq.len();
        let mut coverage = vec![BaseCoverage::default(); len];
        if k > 0 && len >= k {
            let table = match sample {
                Sample::Tumor => &self.mer_cov_tmr,
                Sample::Normal => &self.mer_cov_nml,
            };
            for i in 0..=len - k {
                let mer = CanonicalMer::new(&self.raw_seq[i..i + k]).mer;
                if let Some(c) = table.get(&mer) {
                    for pos in coverage.iter_mut().skip(i).take(k) {
                        pos.fwd = pos.fwd.max(c.fwd);
                        pos.rev = pos.rev.max(c.rev);
                        pos.hp0 = pos.hp0.max(c.hp0);
                        pos.hp1 = pos.hp1.max(c.hp1);
                        pos.hp2 = pos.hp2.max(c.hp2);
                    }
                }
            }
        }
        match sample {
            Sample::Tumor => self.coverage_tmr = coverage,
            Sample::Normal => self.coverage_nml = coverage,
        }
    }

    /// Coverage at a raw reference position; zero outside the window
    pub fn cov_at(&self, pos: usize, sample: Sample) -> BaseCoverage {
        let coverage = match sample {
            Sample::Tumor => &self.coverage_tmr,
            Sample::Normal => &self.coverage_nml,
        };
        coverage.get(pos).copied().unwrap_or_default()
    }

    /// Barcodes of the reference k-mers overlapping [start, end] of the trimmed sequence
    pub fn bx_set_at(&self, start: usize, end: usize, sample: Sample) -> String {
        self.barcodes.bx_set_at(start, end, &self.seq, self.k, sample)
    }
}
