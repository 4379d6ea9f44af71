//! If, loop, Select, With, Exit and On Error handlers.

use super::{TokenCursor, process, process_until};
use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{
    CodeBlock, ConditionalClause, ExitKind, Expression, IfBlock, LoopCondition, OnErrorKind,
    SelectCase,
};
use crate::processor::expression::{generate, generate_single};
use crate::processor::token::{Token, TokenKind};

pub fn if_block(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "If") {
        return Ok(None);
    }
    let opened_on = cursor.line_index();
    cursor.advance(1);
    let condition = condition_until_then(cursor)?;

    if cursor.peek().is_none_or(|t| t.is(TokenKind::EndOfStatement)) {
        cursor.skip_end_of_statement();
        return multi_line_if(cursor, condition, opened_on).map(Some);
    }
    single_line_if(cursor, condition, opened_on).map(Some)
}

/// Consume `<condition> Then` and parse the condition.
fn condition_until_then(cursor: &mut TokenCursor) -> TranslateResult<Expression> {
    let line_index = cursor.line_index();
    let statement = cursor.peek_statement();
    let then_at = statement
        .iter()
        .position(|t| t.is_keyword("Then"))
        .ok_or_else(|| TranslateError::syntax(line_index + 1, "expected 'Then'"))?;
    let condition = generate_single(&statement[..then_at], line_index)?;
    cursor.advance(then_at + 1);
    Ok(condition)
}

fn multi_line_if(
    cursor: &mut TokenCursor,
    condition: Expression,
    opened_on: usize,
) -> TranslateResult<CodeBlock> {
    const ENDS: &[&[&str]] = &[&["ElseIf"], &["Else"], &["End", "If"]];

    let mut clauses = Vec::new();
    let mut condition = condition;
    loop {
        let (statements, matched) = process_until(cursor, ENDS, opened_on)?;
        clauses.push(ConditionalClause {
            condition,
            statements,
        });
        match matched {
            0 => {
                cursor.advance(1);
                condition = condition_until_then(cursor)?;
                cursor.expect_end_of_statement()?;
            }
            1 => {
                cursor.advance(1);
                cursor.skip_end_of_statement();
                let (else_statements, _) = process_until(cursor, &[&["End", "If"]], opened_on)?;
                cursor.advance(2);
                cursor.expect_end_of_statement()?;
                return Ok(CodeBlock::If(IfBlock {
                    clauses,
                    else_statements: Some(else_statements),
                }));
            }
            _ => {
                cursor.advance(2);
                cursor.expect_end_of_statement()?;
                return Ok(CodeBlock::If(IfBlock {
                    clauses,
                    else_statements: None,
                }));
            }
        }
    }
}

/// `If a Then b = 1: c = 2 Else d = 3` occupies exactly one line; each part
/// is parsed as its own block list.
fn single_line_if(
    cursor: &mut TokenCursor,
    condition: Expression,
    opened_on: usize,
) -> TranslateResult<CodeBlock> {
    let line = cursor.take_line();
    let (then_part, else_part) = match line.iter().position(|t| t.is_keyword("Else")) {
        Some(idx) => (line[..idx].to_vec(), Some(line[idx + 1..].to_vec())),
        None => (line, None),
    };
    if then_part.is_empty() {
        return Err(TranslateError::syntax(opened_on + 1, "expected a statement after 'Then'"));
    }

    let statements = parse_inline(then_part)?;
    let else_statements = else_part.map(parse_inline).transpose()?;
    Ok(CodeBlock::If(IfBlock {
        clauses: vec![ConditionalClause {
            condition,
            statements,
        }],
        else_statements,
    }))
}

fn parse_inline(tokens: Vec<Token>) -> TranslateResult<Vec<CodeBlock>> {
    let mut inner = TokenCursor::new(tokens);
    let (blocks, _) = process(&mut inner, &[])?;
    Ok(blocks)
}

pub fn do_loop(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Do") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let header = cursor.take_statement();
    let pre = loop_condition(&header, line_index)?;

    let (statements, _) = process_until(cursor, &[&["Loop"]], line_index)?;
    let footer_line = cursor.line_index();
    cursor.advance(1);
    let footer = cursor.take_statement();
    let post = loop_condition(&footer, footer_line)?;

    let condition = match (pre, post) {
        (None, None) => LoopCondition::None,
        (Some((true, e)), None) => LoopCondition::PreWhile(e),
        (Some((false, e)), None) => LoopCondition::PreUntil(e),
        (None, Some((true, e))) => LoopCondition::PostWhile(e),
        (None, Some((false, e))) => LoopCondition::PostUntil(e),
        (Some(_), Some(_)) => {
            return Err(TranslateError::syntax(
                footer_line + 1,
                "a Do loop may only have one condition",
            ));
        }
    };
    Ok(Some(CodeBlock::Do {
        condition,
        statements,
        line_index,
    }))
}

/// `While x` or `Until x`; the flag is true for While.
fn loop_condition(
    tokens: &[Token],
    line_index: usize,
) -> TranslateResult<Option<(bool, Expression)>> {
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let is_while = if first.is_keyword("While") {
        true
    } else if first.is_keyword("Until") {
        false
    } else {
        return Err(TranslateError::syntax(
            first.line_number(),
            format!("expected While or Until, found '{}'", first.content()),
        ));
    };
    Ok(Some((is_while, generate_single(&tokens[1..], line_index)?)))
}

pub fn while_loop(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "While") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let header = cursor.take_statement();
    let condition = generate_single(&header, line_index)?;
    let (statements, _) = process_until(cursor, &[&["Wend"]], line_index)?;
    cursor.advance(1);
    cursor.expect_end_of_statement()?;
    Ok(Some(CodeBlock::While {
        condition,
        statements,
        line_index,
    }))
}

pub fn for_loop(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "For") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let is_for_each = cursor.peek_is_keyword(0, "Each");
    if is_for_each {
        cursor.advance(1);
    }
    let loop_variable = cursor.expect_name()?;
    let header = cursor.take_statement();

    let block = if is_for_each {
        let rest = match header.split_first() {
            Some((first, rest)) if first.is_keyword("In") => rest,
            _ => return Err(TranslateError::syntax(line_index + 1, "expected 'In'")),
        };
        let collection = generate_single(rest, line_index)?;
        let statements = loop_body(cursor, line_index)?;
        CodeBlock::ForEach {
            loop_variable,
            collection,
            statements,
        }
    } else {
        let rest = match header.split_first() {
            Some((first, rest)) if first.is(TokenKind::ComparisonOperator) && first.content() == "=" => {
                rest
            }
            _ => return Err(TranslateError::syntax(line_index + 1, "expected '='")),
        };
        let to_at = rest
            .iter()
            .position(|t| t.is_keyword("To"))
            .ok_or_else(|| TranslateError::syntax(line_index + 1, "expected 'To'"))?;
        let step_at = rest.iter().position(|t| t.is_keyword_or_maybe("Step"));
        let from = generate_single(&rest[..to_at], line_index)?;
        let (to, step) = match step_at {
            Some(step_at) if step_at > to_at => (
                generate_single(&rest[to_at + 1..step_at], line_index)?,
                Some(generate_single(&rest[step_at + 1..], line_index)?),
            ),
            _ => (generate_single(&rest[to_at + 1..], line_index)?, None),
        };
        let statements = loop_body(cursor, line_index)?;
        CodeBlock::For {
            loop_variable,
            from,
            to,
            step,
            statements,
        }
    };
    Ok(Some(block))
}

fn loop_body(cursor: &mut TokenCursor, line_index: usize) -> TranslateResult<Vec<CodeBlock>> {
    let (statements, _) = process_until(cursor, &[&["Next"]], line_index)?;
    // `Next` may repeat the loop variable.
    cursor.advance(1);
    cursor.take_statement();
    Ok(statements)
}

pub fn select(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !(cursor.peek_is_keyword(0, "Select") && cursor.peek_is_keyword(1, "Case")) {
        return Ok(None);
    }
    const ENDS: &[&[&str]] = &[&["Case"], &["End", "Select"]];

    let line_index = cursor.line_index();
    cursor.advance(2);
    let header = cursor.take_statement();
    let subject = generate_single(&header, line_index)?;

    let (leading, mut matched) = process_until(cursor, ENDS, line_index)?;
    if leading
        .iter()
        .any(|b| !matches!(b, CodeBlock::BlankLine | CodeBlock::Comment { .. }))
    {
        return Err(TranslateError::syntax(
            line_index + 1,
            "statements before the first Case",
        ));
    }

    let mut cases = Vec::new();
    while matched == 0 {
        let case_line = cursor.line_index();
        cursor.advance(1);
        let values = if cursor.peek_is_keyword(0, "Else") {
            cursor.advance(1);
            cursor.take_statement();
            Vec::new()
        } else {
            let values = generate(&cursor.take_statement())?;
            if values.is_empty() {
                return Err(TranslateError::syntax(case_line + 1, "expected a Case value"));
            }
            values
        };
        let (statements, next) = process_until(cursor, ENDS, line_index)?;
        cases.push(SelectCase { values, statements });
        matched = next;
    }
    cursor.advance(2);
    cursor.expect_end_of_statement()?;

    Ok(Some(CodeBlock::Select {
        subject,
        cases,
        line_index,
    }))
}

pub fn with(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "With") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    cursor.advance(1);
    let header = cursor.take_statement();
    let target = generate_single(&header, line_index)?;
    let (statements, _) = process_until(cursor, &[&["End", "With"]], line_index)?;
    cursor.advance(2);
    cursor.expect_end_of_statement()?;
    Ok(Some(CodeBlock::With {
        target,
        statements,
        line_index,
    }))
}

pub fn exit(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Exit") {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    let kind = [
        ("Do", ExitKind::Do),
        ("For", ExitKind::For),
        ("Function", ExitKind::Function),
        ("Sub", ExitKind::Sub),
        ("Property", ExitKind::Property),
    ]
    .into_iter()
    .find_map(|(word, kind)| cursor.peek_is_keyword_or_maybe(1, word).then_some(kind))
    .ok_or_else(|| TranslateError::syntax(line_index + 1, "expected Do, For, Function, Sub or Property after Exit"))?;
    cursor.advance(2);
    cursor.expect_end_of_statement()?;
    Ok(Some(CodeBlock::Exit { kind, line_index }))
}

pub fn on_error(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !(cursor.peek_is_keyword(0, "On") && cursor.peek_is_keyword_or_maybe(1, "Error")) {
        return Ok(None);
    }
    let line_index = cursor.line_index();
    let kind = if cursor.peek_is_keyword(2, "Resume") && cursor.peek_is_keyword(3, "Next") {
        OnErrorKind::ResumeNext
    } else if cursor.peek_is_keyword(2, "Goto") && cursor.peek_at(3).is_some_and(|t| t.content() == "0") {
        OnErrorKind::GotoZero
    } else {
        return Err(TranslateError::syntax(
            line_index + 1,
            "expected 'Resume Next' or 'Goto 0' after On Error",
        ));
    };
    cursor.advance(4);
    cursor.expect_end_of_statement()?;
    Ok(Some(CodeBlock::OnError { kind, line_index }))
}
