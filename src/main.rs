mod cli_main;

use std::collections::HashMap;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use cli_main::{Cli, Commands, InputArgs};
use microassembler::align::AffineAligner;
use microassembler::dist::scheduler::{run_windows, WindowJob};
use microassembler::graph::{DeBruijnGraph, ReadInfo, ReadLabel};
use microassembler::io::fasta::{load_reference, Contig, FastaWriter};
use microassembler::io::fastq::load_sample_reads;
use microassembler::io::variants::write_variants;
use microassembler::pipeline::windows::{tile_region, Region};
use microassembler::reference::ReferenceWindow;
use microassembler::{MicroassemblerError, Result};

fn load_inputs(inputs: &InputArgs) -> Result<(Vec<Contig>, Vec<ReadInfo>)> {
    let contigs = load_reference(&inputs.reference)?;
    info!("Loaded {} reference contigs from {}", contigs.len(), inputs.reference);

    let mut reads = load_sample_reads(&inputs.tumor, inputs.tumor2.as_ref(), ReadLabel::Tumor)?;
    let tumor = reads.len();
    reads.extend(load_sample_reads(&inputs.normal, inputs.normal2.as_ref(), ReadLabel::Normal)?);
    info!("Loaded {} tumor and {} normal reads", tumor, reads.len() - tumor);
    Ok((contigs, reads))
}

fn find_contig<'a>(contigs: &'a HashMap<&str, &Contig>, name: &str) -> Result<&'a Contig> {
    contigs
        .get(name)
        .copied()
        .ok_or_else(|| MicroassemblerError::MissingSequence(name.to_string()))
}

fn run_call(inputs: &InputArgs, regions: &[String], output: &str, stats_json: Option<&str>, config: microassembler::AssemblyConfig) -> Result<()> {
    let start = std::time::Instant::now();
    let (contigs, reads) = load_inputs(inputs)?;
    let by_name: HashMap<&str, &Contig> = contigs.iter().map(|c| (c.name.as_str(), c)).collect();

    let regions: Vec<Region> = if regions.is_empty() {
        contigs.iter().map(|c| Region { chrom: c.name.clone(), start: None, end: None }).collect()
    } else {
        regions.iter().map(|r| r.parse()).collect::<Result<_>>()?
    };

    let mut jobs = Vec::new();
    for region in &regions {
        let contig = find_contig(&by_name, &region.chrom)?;
        for window in tile_region(region, contig.seq.len(), &config)? {
            let ref_seq = contig.slice(window.start, window.end)?.to_string();
            jobs.push(WindowJob { window, ref_seq });
        }
    }
    info!("Tiled {} regions into {} windows", regions.len(), jobs.len());

    let aligner = AffineAligner::default();
    let (store, stats) = run_windows(&config, &aligner, &jobs, &reads)?;
    write_variants(output, &store.variants())?;
    info!("Wrote {} variants to {}", store.len(), output);

    if let Some(path) = stats_json {
        std::fs::write(path, stats.to_json()?)?;
    }
    println!("{}", stats);
    println!("Completed in {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn run_graph(inputs: &InputArgs, region: &str, k: usize, output: &str, cleaned: bool, config: microassembler::AssemblyConfig) -> Result<()> {
    let (contigs, reads) = load_inputs(inputs)?;
    let region: Region = region.parse()?;
    let contig = contigs
        .iter()
        .find(|c| c.name == region.chrom)
        .ok_or_else(|| MicroassemblerError::MissingSequence(region.chrom.clone()))?;
    let start = region.start.unwrap_or(1);
    let end = region.end.unwrap_or(contig.seq.len());
    let ref_seq = contig.slice(start, end)?;

    let config = config.for_k(k);
    let mut graph = DeBruijnGraph::new(&config, ReferenceWindow::new(&contig.name, start, ref_seq));
    for read in reads {
        graph.add_alignment(read);
    }
    graph.build_graph();
    graph.mark_ref_nodes();
    let ref_comps = graph.mark_connected_components();

    let mut writer = FastaWriter::create(output)?;
    let (mut nodes, mut pairs) = (0, 0);
    if cleaned {
        for comp in ref_comps {
            if !graph.mark_ref_ends(comp) {
                warn!("Component {} has no reference anchors", comp);
                continue;
            }
            graph.compress(comp);
            graph.remove_low_cov(true, comp);
            graph.remove_tips(comp);
            graph.remove_short_links(comp);
            nodes += graph.write_contigs(Some(comp), &mut writer)?;
            pairs += graph.write_pairs(Some(comp), &mut writer)?;
        }
    } else {
        nodes = graph.write_contigs(None, &mut writer)?;
        pairs = graph.write_pairs(None, &mut writer)?;
    }
    writer.finish()?;
    info!("Wrote {} nodes and {} edge pairs to {}", nodes, pairs, output);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting tracing default failed: {}", e);
    }

    let result = match cli.command {
        Commands::Call { inputs, region, output, stats_json, assembly } => assembly
            .resolve()
            .and_then(|config| run_call(&inputs, &region, &output, stats_json.as_deref(), config)),
        Commands::Graph { inputs, region, k, output, cleaned, assembly } => assembly
            .resolve()
            .and_then(|config| run_graph(&inputs, &region, k, &output, cleaned, config)),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
