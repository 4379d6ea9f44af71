//! Plain statements: assignments, call statements, Randomize.

use super::TokenCursor;
use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{
    CodeBlock, Expression, ExpressionSegment, Statement, ValueSettingKind, ValueSettingStatement,
};
use crate::processor::expression::{can_be_member_name, find_closing_brace, generate, generate_single};
use crate::processor::token::{Token, TokenKind};

/// Keywords that start valid VBScript statements this translator has no
/// block for.
const UNSUPPORTED_STATEMENTS: &[&str] = &["Const", "Erase", "Goto", "Resume"];

/// `Set x = New Thing`
pub fn new_instance(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Set") {
        return Ok(None);
    }
    let statement = cursor.peek_statement();
    let Some(equals) = top_level_equals(&statement[1..]).map(|idx| idx + 1) else {
        return Ok(None);
    };
    let value = &statement[equals + 1..];
    let is_new = value.len() == 2 && value[0].is_keyword("New") && value[1].is_name_like();
    if !is_new {
        return Ok(None);
    }

    let line_index = statement[0].line_index();
    let target = assignment_target(&statement[1..equals], line_index)?;
    let value = Expression::new(vec![ExpressionSegment::NewInstance(value[1].clone())]);
    cursor.take_statement();
    Ok(Some(CodeBlock::ValueSetting(ValueSettingStatement {
        target,
        value,
        kind: ValueSettingKind::Set,
    })))
}

pub fn randomize(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Randomize") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let statement = cursor.take_statement();
    let seed = if statement.is_empty() {
        None
    } else {
        Some(generate_single(&statement, line_index)?)
    };
    Ok(Some(CodeBlock::Randomize { seed, line_index }))
}

/// `Call Target(args)` needs no special treatment beyond dropping the
/// keyword.
pub fn call_passthrough(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Call") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let statement = cursor.take_statement();
    let expression = generate_single(&statement, line_index)?;
    if !is_call_chain(&expression) {
        return Err(TranslateError::syntax(line_index + 1, "Call must be followed by a call"));
    }
    Ok(Some(CodeBlock::Statement(Statement {
        expression,
        call_prefix: true,
    })))
}

/// Catch-all: assignments (`[Let|Set] target = value`) and call statements
/// with or without brackets (`WScript.Echo "a", b`).
pub fn statement(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    let Some(first) = cursor.peek() else {
        return Ok(None);
    };
    let line_index = first.line_index();

    if first.is(TokenKind::KeyWord) {
        if let Some(word) = UNSUPPORTED_STATEMENTS.iter().find(|w| first.is_content(w)) {
            return Err(TranslateError::unsupported(
                line_index + 1,
                format!("{word} statement"),
            ));
        }
        let kind = if first.is_content("Let") {
            ValueSettingKind::Let
        } else if first.is_content("Set") {
            ValueSettingKind::Set
        } else {
            return Ok(None);
        };
        cursor.advance(1);
        let statement = cursor.take_statement();
        let equals = top_level_equals(&statement)
            .ok_or_else(|| TranslateError::syntax(line_index + 1, "expected '=' in assignment"))?;
        return value_setting(&statement, equals, kind, line_index).map(Some);
    }

    if !first.is_name_like() {
        return Ok(None);
    }

    let statement = cursor.take_statement();
    let chain = leading_chain(&statement)?;
    let after_chain = statement.get(chain.length);

    if after_chain.is_some_and(is_equals) {
        return value_setting(&statement, chain.length, ValueSettingKind::Let, line_index).map(Some);
    }

    let arguments_from = match (after_chain, chain.last_bracket_group) {
        // Without `Call`, `S(a)` and `S (a)` pass `(a)` by value.
        (None, Some(open)) if generate(&statement[open + 1..chain.length - 1])?.len() == 1 => {
            Some(open)
        }
        (None, _) => None,
        // `f (1), 2` passes `(1)` as a bracketed first argument.
        (Some(_), open) => Some(open.unwrap_or(chain.length)),
    };

    let expression = match arguments_from {
        None => generate_single(&statement, line_index)?,
        Some(arguments_from) => {
            let mut expression = generate_single(&statement[..arguments_from], line_index)?;
            let arguments = generate(&statement[arguments_from..])?;
            match expression.segments.last_mut() {
                Some(ExpressionSegment::Call(call)) => call.arguments = arguments,
                _ => {
                    return Err(TranslateError::syntax(
                        line_index + 1,
                        "expected a call target before the arguments",
                    ));
                }
            }
            expression
        }
    };

    Ok(Some(CodeBlock::Statement(Statement {
        expression,
        call_prefix: false,
    })))
}

fn value_setting(
    statement: &[Token],
    equals: usize,
    kind: ValueSettingKind,
    line_index: usize,
) -> TranslateResult<CodeBlock> {
    let target = assignment_target(&statement[..equals], line_index)?;
    let value = generate_single(&statement[equals + 1..], line_index)?;
    Ok(CodeBlock::ValueSetting(ValueSettingStatement {
        target,
        value,
        kind,
    }))
}

fn assignment_target(tokens: &[Token], line_index: usize) -> TranslateResult<Expression> {
    let target = generate_single(tokens, line_index)?;
    if !is_call_chain(&target) {
        return Err(TranslateError::syntax(
            line_index + 1,
            "the left side of an assignment must be a variable or member",
        ));
    }
    Ok(target)
}

fn is_call_chain(expression: &Expression) -> bool {
    !expression.segments.is_empty()
        && expression
            .segments
            .iter()
            .all(|s| matches!(s, ExpressionSegment::Call(_)))
}

fn is_equals(token: &Token) -> bool {
    token.is(TokenKind::ComparisonOperator) && token.content() == "="
}

fn top_level_equals(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate() {
        match token.kind() {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_equals(token) => return Some(idx),
            _ => {}
        }
    }
    None
}

struct LeadingChain {
    length: usize,
    /// Start of the bracket group that ends the chain, if it ends with one.
    last_bracket_group: Option<usize>,
}

/// Measure `name(.name|(...))*` at the start of a statement.
fn leading_chain(tokens: &[Token]) -> TranslateResult<LeadingChain> {
    let mut idx = 1;
    let mut last_bracket_group = None;
    loop {
        match tokens.get(idx) {
            Some(t) if t.is(TokenKind::MemberAccessor) => {
                if !tokens.get(idx + 1).is_some_and(can_be_member_name) {
                    break;
                }
                idx += 2;
                last_bracket_group = None;
            }
            Some(t) if t.is(TokenKind::OpenBrace) => {
                last_bracket_group = Some(idx);
                idx = find_closing_brace(tokens, idx)? + 1;
            }
            _ => break,
        }
    }
    Ok(LeadingChain {
        length: idx,
        last_bracket_group,
    })
}
