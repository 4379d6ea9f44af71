//! Builds expression segments from the tokens of one statement span.
//!
//! The span is split on argument separators that are not inside brackets;
//! each piece becomes an `Expression`. Inside a piece a run of member-access
//! tokens accumulates into a `Call` segment, and a bracket group straight
//! after it becomes that segment's argument list (parsed recursively).
//! Operator precedence is not applied here, segments stay flat.

use super::ast::{CallSegment, Expression, ExpressionSegment};
use super::token::{Token, TokenKind};
use crate::error::{TranslateError, TranslateResult};

pub fn generate(tokens: &[Token]) -> TranslateResult<Vec<Expression>> {
    split_arguments(tokens)?
        .into_iter()
        .map(parse_expression)
        .collect()
}

/// Parse a span that must hold exactly one expression.
pub fn generate_single(tokens: &[Token], line_index: usize) -> TranslateResult<Expression> {
    let mut expressions = generate(tokens)?;
    match expressions.len() {
        1 => Ok(expressions.remove(0)),
        0 => Err(TranslateError::syntax(line_index + 1, "expected an expression")),
        _ => Err(TranslateError::syntax(
            line_index + 1,
            "expected a single expression, not a list",
        )),
    }
}

/// Index of the `)` matching the `(` at `open_index`.
pub fn find_closing_brace(tokens: &[Token], open_index: usize) -> TranslateResult<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open_index) {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(TranslateError::MismatchedBrackets {
        line: tokens[open_index].line_number(),
    })
}

fn split_arguments(tokens: &[Token]) -> TranslateResult<Vec<&[Token]>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                if depth == 0 {
                    return Err(TranslateError::MismatchedBrackets {
                        line: token.line_number(),
                    });
                }
                depth -= 1;
            }
            TokenKind::ArgumentSeparator if depth == 0 => {
                if idx == start {
                    return Err(TranslateError::OrphanedArgumentSeparator {
                        line: token.line_number(),
                    });
                }
                parts.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(TranslateError::MismatchedBrackets {
            line: tokens[tokens.len() - 1].line_number(),
        });
    }
    if start == tokens.len() {
        return Err(TranslateError::syntax(
            tokens[tokens.len() - 1].line_number(),
            "expected an argument after ','",
        ));
    }
    parts.push(&tokens[start..]);
    Ok(parts)
}

struct SegmentBuilder {
    segments: Vec<ExpressionSegment>,
    awaiting_member: bool,
    /// The last call segment already has its bracketed argument list.
    call_bracketed: bool,
}

impl SegmentBuilder {
    fn last_is_operand(&self) -> bool {
        self.segments
            .last()
            .is_some_and(|s| !matches!(s, ExpressionSegment::Operator(_)))
    }

    fn push_operand(&mut self, segment: ExpressionSegment, token: &Token) -> TranslateResult<()> {
        if self.last_is_operand() {
            return Err(TranslateError::syntax(
                token.line_number(),
                format!("expected an operator before '{}'", token.content()),
            ));
        }
        self.segments.push(segment);
        Ok(())
    }

    fn push_member(&mut self, token: &Token) -> TranslateResult<()> {
        if self.awaiting_member {
            self.awaiting_member = false;
            if let Some(ExpressionSegment::Call(call)) = self.segments.last_mut() {
                if !self.call_bracketed {
                    call.member_access_tokens.push(token.clone());
                    return Ok(());
                }
            }
            self.segments.push(call_segment(token));
            self.call_bracketed = false;
            return Ok(());
        }
        self.push_operand(call_segment(token), token)?;
        self.call_bracketed = false;
        Ok(())
    }
}

fn call_segment(token: &Token) -> ExpressionSegment {
    ExpressionSegment::Call(CallSegment {
        member_access_tokens: vec![token.clone()],
        arguments: Vec::new(),
    })
}

/// After a member accessor almost any word is a legal member name.
pub(crate) fn can_be_member_name(token: &Token) -> bool {
    token.is_name_like()
        || (matches!(
            token.kind(),
            TokenKind::KeyWord
                | TokenKind::BuiltInValue
                | TokenKind::LogicalOperator
                | TokenKind::ComparisonOperator
                | TokenKind::Operator
        ) && token.content().chars().all(|c| c.is_ascii_alphabetic()))
}

/// Whether the token at `idx` names something a bracket group can call:
/// a name, or any member name after `.` (`rs.End(1)`).
fn names_call(tokens: &[Token], idx: usize) -> bool {
    let token = &tokens[idx];
    token.is_name_like()
        || (idx > 0
            && tokens[idx - 1].is(TokenKind::MemberAccessor)
            && can_be_member_name(token))
}

fn parse_expression(tokens: &[Token]) -> TranslateResult<Expression> {
    let mut builder = SegmentBuilder {
        segments: Vec::new(),
        awaiting_member: false,
        call_bracketed: false,
    };

    let mut idx = 0;
    while idx < tokens.len() {
        let token = &tokens[idx];

        if builder.awaiting_member {
            if !can_be_member_name(token) {
                return Err(TranslateError::syntax(
                    token.line_number(),
                    format!("expected a member name after '.', found '{}'", token.content()),
                ));
            }
            builder.push_member(token)?;
            idx += 1;
            continue;
        }

        match token.kind() {
            TokenKind::MemberAccessorOrDecimalPoint => {
                return Err(TranslateError::UnresolvedAmbiguousToken {
                    line: token.line_number(),
                });
            }
            TokenKind::MemberAccessor => {
                if !matches!(builder.segments.last(), Some(ExpressionSegment::Call(_))) {
                    return Err(TranslateError::unsupported(
                        token.line_number(),
                        "member access without a target (With block member)",
                    ));
                }
                builder.awaiting_member = true;
            }
            TokenKind::Name | TokenKind::MayBeKeywordOrName => builder.push_member(token)?,
            TokenKind::OpenBrace => {
                let close = find_closing_brace(tokens, idx)?;
                let inner = &tokens[idx + 1..close];
                let follows_call_name = idx > 0
                    && names_call(tokens, idx - 1)
                    && matches!(builder.segments.last(), Some(ExpressionSegment::Call(_)));
                if follows_call_name && !builder.call_bracketed {
                    let arguments = generate(inner)?;
                    if let Some(ExpressionSegment::Call(call)) = builder.segments.last_mut() {
                        call.arguments = arguments;
                    }
                    builder.call_bracketed = true;
                } else if builder.call_bracketed
                    && tokens[idx - 1].is(TokenKind::CloseBrace)
                    && matches!(builder.segments.last(), Some(ExpressionSegment::Call(_)))
                {
                    return Err(TranslateError::unsupported(
                        token.line_number(),
                        "chained bracketed call",
                    ));
                } else {
                    let inner_expression = generate_single(inner, token.line_index())?;
                    builder.push_operand(
                        ExpressionSegment::Bracketed(Box::new(inner_expression)),
                        token,
                    )?;
                }
                idx = close + 1;
                continue;
            }
            TokenKind::CloseBrace => {
                return Err(TranslateError::MismatchedBrackets {
                    line: token.line_number(),
                });
            }
            TokenKind::KeyWord if token.is_content("New") => {
                let class_name = tokens.get(idx + 1).filter(|t| t.is_name_like()).ok_or_else(|| {
                    TranslateError::syntax(token.line_number(), "expected a class name after New")
                })?;
                builder.push_operand(ExpressionSegment::NewInstance(class_name.clone()), token)?;
                idx += 2;
                continue;
            }
            TokenKind::StringLiteral
            | TokenKind::NumericValue
            | TokenKind::DateLiteral
            | TokenKind::BuiltInValue => {
                builder.push_operand(ExpressionSegment::Value(token.clone()), token)?;
            }
            TokenKind::Operator | TokenKind::ComparisonOperator | TokenKind::LogicalOperator => {
                builder.segments.push(ExpressionSegment::Operator(token.clone()));
            }
            TokenKind::ArgumentSeparator => {
                return Err(TranslateError::OrphanedArgumentSeparator {
                    line: token.line_number(),
                });
            }
            TokenKind::KeyWord => {
                return Err(TranslateError::syntax(
                    token.line_number(),
                    format!("unexpected keyword '{}' in expression", token.content()),
                ));
            }
            TokenKind::EndOfStatement
            | TokenKind::Comment
            | TokenKind::InlineComment
            | TokenKind::Unprocessed => {
                return Err(TranslateError::internal(format!(
                    "line {}: {:?} token inside an expression",
                    token.line_number(),
                    token.kind()
                )));
            }
        }
        idx += 1;
    }

    if builder.awaiting_member {
        let line = tokens.last().map_or(0, Token::line_number);
        return Err(TranslateError::syntax(line, "expected a member name after '.'"));
    }
    Ok(Expression::new(builder.segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{lexer, number_rebuilder, operator_combiner};

    fn tokens(src: &str) -> Vec<Token> {
        let raw = lexer::tokenise(src).unwrap();
        operator_combiner::combine(number_rebuilder::rebuild(raw).unwrap())
    }

    fn chain(segment: &ExpressionSegment) -> (Vec<String>, usize) {
        match segment {
            ExpressionSegment::Call(call) => (
                call.member_access_tokens
                    .iter()
                    .map(|t| t.content().to_string())
                    .collect(),
                call.arguments.len(),
            ),
            other => panic!("expected a call segment, got {other:?}"),
        }
    }

    #[test]
    fn test_brackets_are_optional_for_calls() {
        for src in ["Test", "Test()"] {
            let expressions = generate(&tokens(src)).unwrap();
            assert_eq!(expressions.len(), 1, "{src}");
            assert_eq!(expressions[0].segments.len(), 1, "{src}");
            assert_eq!(chain(&expressions[0].segments[0]), (vec!["Test".to_string()], 0));
        }
    }

    #[test]
    fn test_indexed_then_member() {
        let expressions = generate(&tokens("a(0).Test")).unwrap();
        assert_eq!(expressions.len(), 1);
        let segments = &expressions[0].segments;
        assert_eq!(segments.len(), 2);
        assert_eq!(chain(&segments[0]), (vec!["a".to_string()], 1));
        assert_eq!(chain(&segments[1]), (vec!["Test".to_string()], 0));

        let ExpressionSegment::Call(first) = &segments[0] else {
            unreachable!()
        };
        assert!(matches!(
            &first.arguments[0].segments[..],
            [ExpressionSegment::Value(t)] if t.content() == "0"
        ));
    }

    #[test]
    fn test_member_chain_and_arguments() {
        let expressions = generate(&tokens("a.b.c(1, \"x\"), d")).unwrap();
        assert_eq!(expressions.len(), 2);
        assert_eq!(
            chain(&expressions[0].segments[0]),
            (vec!["a".to_string(), "b".to_string(), "c".to_string()], 2)
        );
    }

    #[test]
    fn test_keyword_members_take_arguments() {
        let test_cases = vec![
            ("obj.Class(1)", vec!["obj", "Class"]),
            ("rs.End(1)", vec!["rs", "End"]),
            ("a.Property(1)", vec!["a", "Property"]),
        ];
        for (src, expected) in test_cases {
            let expressions = generate(&tokens(src)).unwrap();
            assert_eq!(expressions[0].segments.len(), 1, "{src}");
            let expected: Vec<String> = expected.into_iter().map(String::from).collect();
            assert_eq!(chain(&expressions[0].segments[0]), (expected, 1), "{src}");
        }
    }

    #[test]
    fn test_operators_and_brackets() {
        let expressions = generate(&tokens("(a + 1) * -b")).unwrap();
        let segments = &expressions[0].segments;
        assert!(matches!(segments[0], ExpressionSegment::Bracketed(_)));
        assert!(matches!(&segments[1], ExpressionSegment::Operator(t) if t.content() == "*"));
        assert!(matches!(&segments[2], ExpressionSegment::Operator(t) if t.content() == "-"));
        assert_eq!(segments.len(), 4);
    }

    #[test]
    fn test_errors() {
        let test_cases = vec![
            ("f(, 1)", TranslateError::OrphanedArgumentSeparator { line: 1 }),
            ("f(1))", TranslateError::MismatchedBrackets { line: 1 }),
        ];
        for (src, expected) in test_cases {
            assert_eq!(generate(&tokens(src)), Err(expected), "{src}");
        }
        assert!(generate(&tokens("a b")).is_err());
    }

    #[test]
    fn test_ambiguous_token_is_rejected() {
        let raw = vec![
            Token::atom("a", 0),
            Token::atom(".", 0),
            Token::atom("b", 0),
        ];
        assert_eq!(
            generate(&raw),
            Err(TranslateError::UnresolvedAmbiguousToken { line: 1 })
        );
    }

    #[test]
    fn test_chained_calls_are_unsupported() {
        let err = generate(&tokens("a(0)(1)")).unwrap_err();
        assert!(err.is_unsupported());
    }
}
