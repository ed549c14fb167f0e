use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spk",
    about = "Serialize base object graphs into content-addressed, detachable objects",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    Recursive,
    WorkStack,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serialize a JSON base object and report its id, store and batches
    Serialize(SerializeArgs),
    /// Print the closure of a JSON base object's root
    Closure(ClosureArgs),
}

/// Options shared by every command that traverses a graph.
#[derive(Args, Clone, Debug, Default)]
pub struct TraverseArgs {
    /// JSON file holding the root base object
    pub input: PathBuf,
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Elements per chunk for `@()` properties
    #[arg(long)]
    pub chunk_size: Option<u32>,
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    /// Maximum nesting of open objects and arrays
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Add totalChildrenCount to every object
    #[arg(long)]
    pub total_children_count: bool,
}

#[derive(Args, Clone, Debug, Default)]
pub struct SerializeArgs {
    #[command(flatten)]
    pub traverse: TraverseArgs,
    #[arg(long)]
    pub max_batch_bytes: Option<usize>,
    /// Write each batch to DIR/batch-NNNN.json
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ClosureArgs {
    #[command(flatten)]
    pub traverse: TraverseArgs,
}
