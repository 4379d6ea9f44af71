//! The functional core: source text in, C# statements out.
//!
//! Each pass is its own module and only feeds the next one.
pub mod ast;
pub mod block_parser;
pub mod expression;
pub mod lexer;
pub mod number_rebuilder;
pub mod operator_combiner;
pub mod token;
pub mod translator;

use tracing::debug;

use crate::config::TranslatorConfig;
use crate::error::TranslateResult;
use crate::logger::Logger;
use crate::model::TranslatedProgram;

/// Runs every pass and returns a read-only structure for writers.
pub fn run(
    source: &str,
    config: &TranslatorConfig,
    logger: &dyn Logger,
) -> TranslateResult<TranslatedProgram> {
    let tokens = lexer::tokenise(source)?;
    debug!(tokens = tokens.len(), "tokenised");

    let tokens = number_rebuilder::rebuild(tokens)?;
    let tokens = operator_combiner::combine(tokens);
    debug!(tokens = tokens.len(), "normalised numbers and operators");

    let blocks = block_parser::parse(tokens)?;
    debug!(blocks = blocks.len(), "parsed code blocks");

    let translation = translator::translate(blocks, config, logger)?;

    Ok(TranslatedProgram {
        body: translation.body,
        classes: translation.classes,
        external_references: config.external_references.clone(),
        output_shape: config.output_shape,
        culture_dependent_dates: translation.culture_dependent_dates,
        warning_count: translation.warning_count,
    })
}
