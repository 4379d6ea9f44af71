use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input .vbs script (or .asp page with --asp)
    pub input: PathBuf,
    /// Output file; stdout when omitted
    pub output: Option<PathBuf>,
    /// JSON translator configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Emit only the translated statements, without the runner class
    #[arg(long)]
    pub body_only: bool,
    /// Treat the input as an ASP page
    #[arg(long)]
    pub asp: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Csharp)]
    pub emit: Emit,
    /// Log pipeline stages at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    Csharp,
    Json,
}
