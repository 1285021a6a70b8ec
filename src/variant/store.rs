use ahash::AHashMap;
use tracing::debug;

use crate::variant::variant::Variant;

/// Candidate variants keyed by somatic flag and signature
#[derive(Debug, Clone, Default)]
pub struct VariantStore {
    db: AHashMap<(bool, String), Variant>,
}

impl VariantStore {
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub fn get(&self, is_somatic: bool, signature: &str) -> Option<&Variant> {
        self.db.get(&(is_somatic, signature.to_string()))
    }

    /// Insert a call. A repeated call bumps the similar-variants count and
    /// keeps the coverage of whichever observation has more total coverage.
    pub fn add_var(&mut self, variant: Variant) {
        let key = (variant.is_somatic, variant.signature());
        match self.db.get_mut(&key) {
            Some(existing) => {
                existing.similar_variants_count += variant.similar_variants_count;
                if existing.total_cov() < variant.total_cov() {
                    debug!(
                        "variant replacement {} somatic={} ({} -> {})",
                        key.1,
                        key.0,
                        existing.total_cov(),
                        variant.total_cov()
                    );
                    existing.take_coverage(&variant);
                }
            }
            None => {
                self.db.insert(key, variant);
            }
        }
    }

    /// Fold another store into this one
    pub fn merge(&mut self, other: VariantStore) {
        let mut incoming: Vec<Variant> = other.db.into_values().collect();
        incoming.sort_by(compare_variants);
        for variant in incoming {
            self.add_var(variant);
        }
    }

    /// Resolve calls seen both as somatic and not somatic: the one observed
    /// more often wins, then the one with more coverage. Full ties keep both.
    pub fn select_var(&mut self) -> usize {
        let mut signatures: Vec<String> = self
            .db
            .keys()
            .filter(|(somatic, sig)| *somatic && self.db.contains_key(&(false, sig.clone())))
            .map(|(_, sig)| sig.clone())
            .collect();
        signatures.sort_unstable();

        let mut discarded = 0;
        for sig in signatures {
            let somatic_key = (true, sig.clone());
            let germline_key = (false, sig);
            let (Some(somatic), Some(germline)) = (self.db.get(&somatic_key), self.db.get(&germline_key)) else {
                continue;
            };
            let by_count = somatic.similar_variants_count.cmp(&germline.similar_variants_count);
            let decision = by_count.then(somatic.total_cov().cmp(&germline.total_cov()));
            match decision {
                std::cmp::Ordering::Greater => {
                    debug!("variant select {}: keep somatic", somatic_key.1);
                    self.db.remove(&germline_key);
                    discarded += 1;
                }
                std::cmp::Ordering::Less => {
                    debug!("variant select {}: keep non-somatic", germline_key.1);
                    self.db.remove(&somatic_key);
                    discarded += 1;
                }
                std::cmp::Ordering::Equal => {
                    debug!("variant select {}: retain both", somatic_key.1);
                }
            }
        }
        discarded
    }

    /// Calls ordered by chromosome, position and alleles
    pub fn variants(&self) -> Vec<&Variant> {
        let mut list: Vec<&Variant> = self.db.values().collect();
        list.sort_by(|a, b| compare_variants(a, b));
        list
    }
}

fn compare_variants(a: &Variant, b: &Variant) -> std::cmp::Ordering {
    (&a.chrom, a.pos, &a.ref_allele, &a.alt_allele, a.is_somatic).cmp(&(
        &b.chrom,
        b.pos,
        &b.ref_allele,
        &b.alt_allele,
        b.is_somatic,
    ))
}
