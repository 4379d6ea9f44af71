pub mod asp;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod processor;
pub mod writer;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::logger::{Logger, TracingLogger};
use crate::model::{OutputShape, TranslatedStatement};

/// Translate a script and return just its statements, classes included.
pub fn translate(
    source: &str,
    config: &TranslatorConfig,
    logger: &dyn Logger,
) -> Result<Vec<TranslatedStatement>, TranslateError> {
    Ok(processor::run(source, config, logger)?.statements())
}

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    // 1. ── Parse ──────────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Reading {}", path.display()))?;
            config::load_from_json(&json).with_context(|| "Parsing config JSON")?
        }
        None => TranslatorConfig::default(),
    };
    if args.body_only {
        config.output_shape = OutputShape::BodyOnly;
    }

    let mut source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    if args.asp {
        source = asp::to_script(&source).with_context(|| "Converting ASP page to script")?;
        if !config.is_external_reference("Response") {
            config.external_references.push("Response".to_string());
        }
    }

    // 2. ── Process ────────────────────────────────────────────────────
    let program = processor::run(&source, &config, &TracingLogger)
        .with_context(|| format!("Translating {}", args.input.display()))?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match args.emit {
        cli::Emit::Csharp => writer::csharp::emit(&program, &config.indent, &mut out)
            .with_context(|| "Writing C# output")?,
        cli::Emit::Json => {
            writer::json::emit(&program, &mut out).with_context(|| "Writing JSON output")?
        }
    }
    out.flush().with_context(|| "Flushing output")?;

    Ok(())
}
