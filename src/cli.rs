use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Generates and measures high-coverage XML corpora for an XSD schema")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Measure path coverage of an XML corpus against a schema
    Coverage(CoverageArgs),
    /// Generate a corpus by greedy set cover over candidate documents
    Generate(GenerateArgs),
    /// Generate a corpus from a pairwise covering array over optional items
    Pairwise(PairwiseArgs),
    /// Summarize the optional elements, attributes and choices of a schema
    Optional(OptionalArgs),
    /// Emit the coverage problem as an SMT-LIB optimization file
    Smt(SmtArgs),
}

#[derive(Args)]
pub struct CoverageArgs {
    /// The XSD schema file
    pub schema: PathBuf,

    /// XML files to analyze
    pub xml_files: Vec<PathBuf>,

    /// Maximum recursion depth when expanding the schema
    #[arg(long, default_value_t = 15)]
    pub max_depth: u32,

    /// Also write the report to this file
    #[arg(long)]
    pub report_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// The XSD schema file
    pub schema: PathBuf,

    /// Output directory for the generated XML files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum recursion depth when expanding the schema
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,

    /// Depth ceiling for candidate variants (default: min(max-depth, 5))
    #[arg(long)]
    pub max_gen_depth: Option<u32>,

    /// Stop once this fraction of defined paths is covered
    #[arg(long, default_value_t = 0.95)]
    pub target_coverage: f64,

    /// Maximum number of files to select
    #[arg(long, default_value_t = 50)]
    pub max_files: usize,

    /// Maximum number of candidate snippets to materialize
    #[arg(long, default_value_t = 100)]
    pub max_snippets: usize,

    /// Damping applied to deep candidates during selection
    #[arg(long, default_value_t = 0.1)]
    pub depth_penalty: f64,

    /// File name prefix
    #[arg(long, default_value = "generated")]
    pub prefix: String,

    /// Default namespace URI (overrides the schema's target namespace)
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Args)]
pub struct PairwiseArgs {
    /// The XSD schema file
    pub schema: PathBuf,

    /// Output directory for the generated XML files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum recursion depth when expanding the schema
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,

    /// Maximum number of test patterns
    #[arg(long, default_value_t = 50)]
    pub max_patterns: usize,

    /// Random candidate patterns drawn per greedy round
    #[arg(long, default_value_t = 30)]
    pub candidates: usize,

    /// Cap the parameter universe at the highest-priority items
    #[arg(long)]
    pub max_parameters: Option<usize>,

    /// Seed for the candidate sampler
    #[arg(long, default_value_t = 42)]
    pub random_seed: u64,

    /// File name prefix
    #[arg(long, default_value = "pairwise_test")]
    pub prefix: String,

    /// Default namespace URI (overrides the schema's target namespace)
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Args)]
pub struct OptionalArgs {
    /// The XSD schema file
    pub schema: PathBuf,

    /// Maximum recursion depth when expanding the schema
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,
}

#[derive(Args)]
pub struct SmtArgs {
    /// The XSD schema file
    pub schema: PathBuf,

    /// Output file for the SMT-LIB constraint system
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum recursion depth when expanding the schema
    #[arg(long, default_value_t = 10)]
    pub max_depth: u32,
}
