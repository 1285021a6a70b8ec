use microassembler::config::AssemblyConfig;
use microassembler::kmer::repeat::{find_all_tandems, find_tandem_at, is_almost_repeat, is_repeat};

#[test]
fn test_finds_every_reportable_str() {
    let params = AssemblyConfig::default().tandem_params();
    let seq = "TTGCAGATATATATGCCTTTTTTTTGCA";
    let tandems = find_all_tandems(seq, &params);
    let found: Vec<(usize, usize, &str)> = tandems.iter().map(|t| (t.start, t.end, t.motif.as_str())).collect();
    assert_eq!(found, vec![(17, 25, "T"), (6, 14, "AT")]);
    assert_eq!(tandems[1].annotation(), "8AT");
    assert_eq!(tandems[1].units(), 4);
}

#[test]
fn test_str_lookup_respects_distance() {
    let params = AssemblyConfig::default().tandem_params();
    let seq = "TTGCAGATATATATGCCTTTTTTTTGCA";
    assert_eq!(find_tandem_at(seq, 10, &params).map(|t| t.motif), Some("AT".to_string()));
    assert_eq!(find_tandem_at(seq, 16, &params).map(|t| t.motif), Some("T".to_string()));
    assert!(find_tandem_at(seq, 2, &params).is_none());
}

#[test]
fn test_trinucleotide_str() {
    let params = AssemblyConfig::default().tandem_params();
    let tandems = find_all_tandems("GCAGCAGCAGCAGTTAC", &params);
    assert_eq!(tandems.len(), 1);
    assert_eq!((tandems[0].start, tandems[0].end), (0, 13));
    assert_eq!(tandems[0].annotation(), "13GCA");
}

#[test]
fn test_unique_reference_has_no_str_or_repeat() {
    let params = AssemblyConfig::default().tandem_params();
    let seq = "ACGGTCATTGCAGGACTTGA";
    assert!(find_all_tandems(seq, &params).is_empty());
    assert!(!is_repeat(seq, 7));
    assert!(!is_almost_repeat(seq, 7, 2));
}

#[test]
fn test_reverse_complement_counts_as_repeat() {
    // ACGGT and its reverse complement ACCGT share a canonical k-mer
    assert!(is_repeat("ACGGTTTACCGT", 5));
}
