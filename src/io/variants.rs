// src/io/variants.rs
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::variant::variant::Variant;

pub const TSV_HEADER: &str = "#CHROM\tPOS\tREF\tALT\tTYPE\tLEN\tSTATUS\tSOMATIC\tK\tSVC\tSTR\tREF_N\tREF_T\tALT_N\tALT_T\tHP_REF_N\tHP_REF_T\tHP_ALT_N\tHP_ALT_T";

fn hp(h: &[u32; 3]) -> String {
    format!("{},{},{}", h[0], h[1], h[2])
}

/// One tab separated line; strand counts as `fwd,rev`
pub fn variant_to_tsv(v: &Variant) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{:?}\t{}\t{}\t{}\t{}\t{},{}\t{},{}\t{},{}\t{},{}\t{}\t{}\t{}\t{}",
        v.chrom,
        v.pos,
        v.ref_allele,
        v.alt_allele,
        v.kind,
        v.len,
        v.status(),
        u8::from(v.is_somatic),
        v.kmer,
        v.similar_variants_count,
        if v.str_annotation.is_empty() { "." } else { v.str_annotation.as_str() },
        v.ref_cov_normal.fwd,
        v.ref_cov_normal.rev,
        v.ref_cov_tumor.fwd,
        v.ref_cov_tumor.rev,
        v.alt_cov_normal.fwd,
        v.alt_cov_normal.rev,
        v.alt_cov_tumor.fwd,
        v.alt_cov_tumor.rev,
        hp(&v.hp_ref_normal),
        hp(&v.hp_ref_tumor),
        hp(&v.hp_alt_normal),
        hp(&v.hp_alt_tumor),
    )
}

pub fn write_tsv<W: Write>(mut writer: W, variants: &[&Variant]) -> Result<()> {
    writeln!(writer, "{}", TSV_HEADER)?;
    for v in variants {
        writeln!(writer, "{}", variant_to_tsv(v))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(writer: W, variants: &[&Variant]) -> Result<()> {
    serde_json::to_writer_pretty(writer, variants)?;
    Ok(())
}

/// Write calls to `path`, as JSON when it ends in `.json` and TSV otherwise
pub fn write_variants<P: AsRef<Path>>(path: P, variants: &[&Variant]) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    if path.extension().map_or(false, |e| e == "json") {
        write_json(writer, variants)
    } else {
        write_tsv(writer, variants)
    }
}
