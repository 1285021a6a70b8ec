use microassembler::graph::transcript::{MutationCode, Transcript, TranscriptStats};
use microassembler::io::variants::{variant_to_tsv, write_variants};
use microassembler::variant::{Variant, VariantStatus, VariantStore};

fn call(pos: usize, somatic: bool, alt_tmr: u32, alt_nml: u32) -> Variant {
    let t = Transcript::new(pos, 0, 0, MutationCode::Snv, 'A', 'G', 'C', 'C', somatic);
    let stats = TranscriptStats { alt_tmr: (alt_tmr, 0), alt_nml: (alt_nml, 0), ref_nml: (4, 4), ..Default::default() };
    Variant::from_transcript("chr2", pos - 1, &t, &stats, 13, String::new())
}

#[test]
fn test_merge_sums_observations() {
    let mut first = VariantStore::default();
    first.add_var(call(100, true, 3, 0));
    let mut second = VariantStore::default();
    second.add_var(call(100, true, 6, 0));
    second.add_var(call(140, false, 2, 2));

    first.merge(second);
    assert_eq!(first.len(), 2);
    let v = first.get(true, "chr2:100:A:G").unwrap();
    assert_eq!(v.similar_variants_count, 2);
    assert_eq!(v.alt_cov_tumor.total(), 6);
    assert_eq!(first.get(false, "chr2:140:A:G").unwrap().status(), VariantStatus::Shared);
}

#[test]
fn test_select_var_breaks_count_tie_by_coverage() {
    let mut store = VariantStore::default();
    store.add_var(call(100, true, 2, 0));
    store.add_var(call(100, false, 7, 1));
    assert_eq!(store.select_var(), 1);
    assert!(store.get(true, "chr2:100:A:G").is_none());
    assert!(store.get(false, "chr2:100:A:G").is_some());
}

#[test]
fn test_select_var_full_tie_keeps_both() {
    let mut store = VariantStore::default();
    store.add_var(call(100, true, 2, 0));
    store.add_var(call(100, false, 2, 0));
    assert_eq!(store.select_var(), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_unrelated_calls_untouched_by_selection() {
    let mut store = VariantStore::default();
    store.add_var(call(100, true, 2, 0));
    store.add_var(call(200, false, 2, 3));
    assert_eq!(store.select_var(), 0);
    let positions: Vec<usize> = store.variants().iter().map(|v| v.pos).collect();
    assert_eq!(positions, vec![100, 200]);
}

#[test]
fn test_store_written_as_tsv() {
    let mut store = VariantStore::default();
    store.add_var(call(200, false, 2, 3));
    store.add_var(call(100, true, 5, 0));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calls.tsv");
    write_variants(&path, &store.variants()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("#CHROM"));
    assert_eq!(lines[1], variant_to_tsv(store.variants()[0]));
    assert!(lines[1].starts_with("chr2\t100\tA\tG\tsnv\t1\tSomatic"));
    assert!(lines[2].starts_with("chr2\t200\tA\tG\tsnv\t1\tShared"));
}
