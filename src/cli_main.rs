use clap::{Args, Parser, Subcommand};

use microassembler::config::AssemblyConfig;

#[derive(Parser, Debug)]
#[command(name = "microassembler", version, about = "Localized de Bruijn graph micro-assembly for somatic variant discovery")]
pub struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble windows over the given regions and call candidate variants
    Call {
        #[command(flatten)]
        inputs: InputArgs,

        /// Region to scan as chr, chr:start or chr:start-end (repeatable, default every contig)
        #[arg(short, long)]
        region: Vec<String>,

        /// Output file for calls (.json for JSON, TSV otherwise)
        #[arg(short, long)]
        output: String,

        /// Optional path to write run statistics as JSON
        #[arg(long)]
        stats_json: Option<String>,

        #[command(flatten)]
        assembly: AssemblyArgs,
    },

    /// Build the graph of a single window at one k and export its nodes and edges
    Graph {
        #[command(flatten)]
        inputs: InputArgs,

        /// Window as chr:start-end
        #[arg(short, long)]
        region: String,

        /// K-mer size of the graph
        #[arg(short, long, default_value_t = 11)]
        k: usize,

        /// Output FASTA of nodes followed by edge pairs (.gz to compress)
        #[arg(short, long)]
        output: String,

        /// Export only the graph after cleaning of reference components
        #[arg(long)]
        cleaned: bool,

        #[command(flatten)]
        assembly: AssemblyArgs,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Reference FASTA (plain or gzipped)
    #[arg(long)]
    pub reference: String,

    /// Tumor FASTQ, first mate or single end
    #[arg(long)]
    pub tumor: String,

    /// Tumor FASTQ, second mate
    #[arg(long)]
    pub tumor2: Option<String>,

    /// Normal FASTQ, first mate or single end
    #[arg(long)]
    pub normal: String,

    /// Normal FASTQ, second mate
    #[arg(long)]
    pub normal2: Option<String>,
}

#[derive(Args, Debug)]
pub struct AssemblyArgs {
    /// JSON file with assembly parameters, overridden by the flags below
    #[arg(long)]
    pub config: Option<String>,

    /// Smallest k-mer size tried
    #[arg(long)]
    pub min_k: Option<usize>,

    /// Largest k-mer size tried
    #[arg(long)]
    pub max_k: Option<usize>,

    /// Step between k-mer sizes
    #[arg(long)]
    pub k_step: Option<usize>,

    /// Minimum coverage of reference anchors
    #[arg(long)]
    pub cov_threshold: Option<u32>,

    /// Window length
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Reference padding on both sides of a window
    #[arg(long)]
    pub padding: Option<usize>,

    /// Distance between window starts
    #[arg(long)]
    pub window_step: Option<usize>,

    /// Visit budget of one path search
    #[arg(long)]
    pub dfs_limit: Option<usize>,

    /// Shared reads needed to thread through a branching node
    #[arg(long)]
    pub min_thread_reads: Option<usize>,

    /// Keep only the best edge around branching nodes
    #[arg(long)]
    pub greedy_trim: bool,

    /// Reads carry BX/HP tags
    #[arg(long)]
    pub linked_reads: bool,

    /// Process every walk through the graph (slow, for debugging)
    #[arg(long)]
    pub exhaustive: bool,

    /// Number of threads
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

impl AssemblyArgs {
    /// Defaults, then the JSON file, then command line overrides
    pub fn resolve(&self) -> microassembler::Result<AssemblyConfig> {
        let mut config = match &self.config {
            Some(path) => AssemblyConfig::from_json_file(path)?,
            None => AssemblyConfig::default(),
        };
        if let Some(v) = self.min_k {
            config.min_k = v;
        }
        if let Some(v) = self.max_k {
            config.max_k = v;
        }
        if let Some(v) = self.k_step {
            config.k_step = v;
        }
        if let Some(v) = self.cov_threshold {
            config.cov_threshold = v;
        }
        if let Some(v) = self.window_size {
            config.window_size = v;
        }
        if let Some(v) = self.padding {
            config.padding = v;
        }
        if let Some(v) = self.window_step {
            config.window_step = v;
        }
        if let Some(v) = self.dfs_limit {
            config.dfs_limit = v;
        }
        if self.min_thread_reads.is_some() {
            config.min_thread_reads = self.min_thread_reads;
        }
        config.greedy_trim |= self.greedy_trim;
        config.linked_reads |= self.linked_reads;
        config.exhaustive_paths |= self.exhaustive;
        config.num_threads = self.threads;
        config.validate()?;
        Ok(config)
    }
}
