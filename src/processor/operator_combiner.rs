//! Normalises operator runs after the numbers have been rebuilt.
//!
//! `1 - - 1` becomes `1 + 1`, `1 * + 1` becomes `1 * 1` and split
//! comparison operators (`>` `=`) are fused into one token (`>=`).
//!
//! When a run of signs in front of a literal cancels out completely, the
//! literal is wrapped in `CDbl(...)`: VBScript treats a signed literal as a
//! numeric literal for comparisons against strings, but an expression whose
//! signs were algebraically removed is not one. This has to run after the
//! number rebuilder or `++1.2` would turn into `CDbl(1).2`.

use tracing::debug;

use super::token::{Token, TokenKind};

pub fn combine(tokens: Vec<Token>) -> Vec<Token> {
    let signed = combine_sign_runs(tokens);
    let combined = fuse_comparison_operators(signed);
    debug!(tokens = combined.len(), "operators combined");
    combined
}

fn is_sign(token: &Token) -> bool {
    token.is(TokenKind::Operator) && matches!(token.content(), "+" | "-")
}

fn combine_sign_runs(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        if !is_sign(&token) {
            out.push(token);
            continue;
        }

        let line_index = token.line_index();
        let mut sign_count = 1;
        let mut negative = token.content() == "-";
        while let Some(next) = tokens.next_if(is_sign) {
            sign_count += 1;
            negative ^= next.content() == "-";
        }

        let unary = out
            .last()
            .is_none_or(Token::could_precede_decimal_point_or_negative_sign);
        if !unary {
            let content = if negative { "-" } else { "+" };
            out.push(Token::new(TokenKind::Operator, content, line_index));
            continue;
        }

        match tokens.next_if(|t| t.is(TokenKind::NumericValue)) {
            Some(literal) => {
                let literal_negative = literal.content().starts_with('-');
                let magnitude = literal.content().trim_start_matches('-');
                if literal_negative {
                    sign_count += 1;
                    negative = !negative;
                }
                if negative {
                    out.push(Token::new(
                        TokenKind::NumericValue,
                        format!("-{magnitude}"),
                        literal.line_index(),
                    ));
                } else if sign_count > 1 {
                    let line = literal.line_index();
                    out.push(Token::atom("CDbl", line));
                    out.push(Token::atom("(", line));
                    out.push(Token::new(TokenKind::NumericValue, magnitude, line));
                    out.push(Token::atom(")", line));
                } else {
                    out.push(Token::new(TokenKind::NumericValue, magnitude, literal.line_index()));
                }
            }
            None => {
                // A unary plus is redundant.
                if negative {
                    out.push(Token::new(TokenKind::Operator, "-", line_index));
                }
            }
        }
    }
    out
}

fn fuse_comparison_operators(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        if token.is(TokenKind::ComparisonOperator) {
            let first = token.content();
            let fused = tokens.peek().and_then(|next| {
                if !next.is(TokenKind::ComparisonOperator) {
                    return None;
                }
                match (first, next.content()) {
                    ("<", ">") => Some("<>"),
                    ("<", "=") => Some("<="),
                    (">", "=") => Some(">="),
                    _ => None,
                }
            });
            if let Some(fused) = fused {
                tokens.next();
                out.push(Token::new(TokenKind::ComparisonOperator, fused, token.line_index()));
                continue;
            }
        }
        out.push(token);
    }
    out
}
