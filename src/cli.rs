use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "pricemap",
    about = "Compare Azure retail meter prices across regions"
)]
pub struct Cli {
    /// File listing origin meter ids: a JSON array (of strings or of
    /// objects with a meterId field) or plain text, one id per line
    pub input: PathBuf,

    /// Target regions to compare against (comma-separated ARM region codes,
    /// e.g. westeurope,japaneast)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Max values per OR-clause in a single catalog request
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output format: table (default), json
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Directory to write the report tables as timestamped JSON files
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Suppress progress output (for scripting)
    #[arg(long)]
    pub cli: bool,
}

#[derive(ValueEnum, Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}
