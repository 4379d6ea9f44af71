//! Builds the code block tree from the combined token stream.
//!
//! At every position a fixed, ordered chain of handlers is tried. Each
//! handler either recognises the construct at the cursor (consuming its
//! tokens and returning a block) or returns `None` without consuming
//! anything. Block bodies are parsed by recursing into `process` with the
//! end sequences that close them.

mod control_flow;
mod cursor;
mod declarations;
mod statements;

use tracing::debug;

pub use cursor::TokenCursor;

use super::ast::CodeBlock;
use super::token::{Token, TokenKind};
use crate::error::{TranslateError, TranslateResult};

type Handler = fn(&mut TokenCursor) -> TranslateResult<Option<CodeBlock>>;

/// Order matters: the Function handler has to see `Private`/`Public` before
/// the Dim handler claims them, and Statement accepts anything left.
const HANDLERS: &[(&str, Handler)] = &[
    ("option explicit", declarations::option_explicit),
    ("new instance", statements::new_instance),
    ("class", declarations::class),
    ("function", declarations::function),
    ("dim", declarations::dim),
    ("do", control_flow::do_loop),
    ("while", control_flow::while_loop),
    ("for", control_flow::for_loop),
    ("if", control_flow::if_block),
    ("select", control_flow::select),
    ("exit", control_flow::exit),
    ("on error", control_flow::on_error),
    ("randomize", statements::randomize),
    ("call", statements::call_passthrough),
    ("with", control_flow::with),
    ("statement", statements::statement),
];

/// Parse a whole program.
pub fn parse(tokens: Vec<Token>) -> TranslateResult<Vec<CodeBlock>> {
    let mut cursor = TokenCursor::new(tokens);
    let (blocks, _) = process(&mut cursor, &[])?;
    debug!(blocks = blocks.len(), "code blocks parsed");
    Ok(blocks)
}

/// Parse blocks until one of `end_sequences` starts at the cursor (which is
/// left on it) or the tokens run out. Returns the index of the sequence
/// that stopped the parse.
pub fn process(
    cursor: &mut TokenCursor,
    end_sequences: &[&[&str]],
) -> TranslateResult<(Vec<CodeBlock>, Option<usize>)> {
    let mut blocks = Vec::new();

    while let Some(token) = cursor.peek() {
        if let Some(matched) = end_sequences.iter().position(|seq| cursor.matches_sequence(seq)) {
            return Ok((blocks, Some(matched)));
        }

        match token.kind() {
            TokenKind::EndOfStatement => {
                if token.is_new_line() {
                    blocks.push(CodeBlock::BlankLine);
                }
                cursor.advance(1);
                continue;
            }
            TokenKind::Comment | TokenKind::InlineComment => {
                let inline = token.is(TokenKind::InlineComment);
                let content = token.content().to_string();
                cursor.advance(1);
                cursor.skip_end_of_statement();
                blocks.push(CodeBlock::Comment { content, inline });
                continue;
            }
            _ => {}
        }

        blocks.push(try_handlers(cursor)?);
    }

    Ok((blocks, None))
}

/// Like `process`, but reaching the end of the tokens first is an error.
pub fn process_until(
    cursor: &mut TokenCursor,
    end_sequences: &[&[&str]],
    opened_on: usize,
) -> TranslateResult<(Vec<CodeBlock>, usize)> {
    match process(cursor, end_sequences)? {
        (blocks, Some(matched)) => Ok((blocks, matched)),
        (_, None) => Err(TranslateError::MissingBlockEnd {
            line: opened_on + 1,
            expected: end_sequences
                .iter()
                .map(|seq| seq.join(" "))
                .collect::<Vec<_>>()
                .join(" or "),
        }),
    }
}

fn try_handlers(cursor: &mut TokenCursor) -> TranslateResult<CodeBlock> {
    for (name, handler) in HANDLERS {
        if let Some(block) = handler(cursor)? {
            debug!(handler = name, "block recognised");
            return Ok(block);
        }
    }
    let (line, content) = cursor
        .peek()
        .map_or((cursor.line_index() + 1, String::new()), |t| {
            (t.line_number(), t.content().to_string())
        });
    Err(TranslateError::syntax(
        line,
        format!("unrecognised statement starting with '{content}'"),
    ))
}
