//! Option Explicit, Class, Function/Sub/Property and Dim handlers.

use std::collections::HashSet;

use super::{TokenCursor, process_until};
use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{
    ClassBlock, CodeBlock, DimKind, DimStatement, FunctionBlock, FunctionKind, Parameter,
    ParameterPassing, VariableDeclaration,
};
use crate::processor::expression::{find_closing_brace, generate};
use crate::processor::token::{Token, TokenKind};

pub fn option_explicit(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !(cursor.peek_is_keyword(0, "Option") && cursor.peek_is_keyword_or_maybe(1, "Explicit")) {
        return Ok(None);
    }
    cursor.advance(2);
    cursor.expect_end_of_statement()?;
    Ok(Some(CodeBlock::OptionExplicit))
}

pub fn class(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    if !cursor.peek_is_keyword(0, "Class") {
        return Ok(None);
    }
    let opened_on = cursor.line_index();
    cursor.advance(1);
    let name = cursor.expect_name()?;
    cursor.expect_end_of_statement()?;

    let (statements, _) = process_until(cursor, &[&["End", "Class"]], opened_on)?;
    cursor.advance(2);
    cursor.expect_end_of_statement()?;

    check_duplicate_members(&name, &statements)?;
    Ok(Some(CodeBlock::Class(ClassBlock { name, statements })))
}

/// Inside a class a Function/Sub name may be used once, and each property
/// accessor kind once per property name.
fn check_duplicate_members(class_name: &Token, statements: &[CodeBlock]) -> TranslateResult<()> {
    let mut methods = HashSet::new();
    let mut accessors = HashSet::new();
    let mut property_names = HashSet::new();

    for block in statements {
        let (function, is_property) = match block {
            CodeBlock::Function(f) => (f, false),
            CodeBlock::Property(p) => (p, true),
            _ => continue,
        };
        let key = function.name.content().to_ascii_lowercase();
        let duplicate = if is_property {
            methods.contains(&key) || !accessors.insert((key.clone(), function.kind))
        } else {
            property_names.contains(&key) || !methods.insert(key.clone())
        };
        if duplicate {
            return Err(TranslateError::DuplicateMember {
                line: function.name.line_number(),
                class_name: class_name.content().to_string(),
                member: function.name.content().to_string(),
            });
        }
        if is_property {
            property_names.insert(key);
        }
    }
    Ok(())
}

pub fn function(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    let mut offset = 0;
    let mut is_public = true;
    if cursor.peek_is_keyword(0, "Public") {
        offset = 1;
    } else if cursor.peek_is_keyword(0, "Private") {
        is_public = false;
        offset = 1;
    }
    let is_default = cursor.peek_is_keyword_or_maybe(offset, "Default");
    if is_default {
        offset += 1;
    }

    let kind = if cursor.peek_is_keyword(offset, "Function") {
        offset += 1;
        FunctionKind::Function
    } else if cursor.peek_is_keyword(offset, "Sub") {
        offset += 1;
        FunctionKind::Sub
    } else if cursor.peek_is_keyword_or_maybe(offset, "Property")
        && cursor.peek_at(offset + 2).is_some_and(Token::is_name_like)
    {
        let kind = if cursor.peek_is_keyword_or_maybe(offset + 1, "Get") {
            FunctionKind::PropertyGet
        } else if cursor.peek_is_keyword(offset + 1, "Let") {
            FunctionKind::PropertyLet
        } else if cursor.peek_is_keyword(offset + 1, "Set") {
            FunctionKind::PropertySet
        } else {
            return Ok(None);
        };
        offset += 2;
        kind
    } else {
        return Ok(None);
    };

    let opened_on = cursor.line_index();
    cursor.advance(offset);
    let name = cursor.expect_name()?;
    let parameters = parameters(cursor)?;
    cursor.expect_end_of_statement()?;

    let end_words = kind.end_words();
    let (statements, _) = process_until(cursor, &[&end_words[..]], opened_on)?;
    cursor.advance(end_words.len());
    cursor.expect_end_of_statement()?;

    let function = FunctionBlock {
        kind,
        name,
        is_public,
        is_default,
        parameters,
        statements,
    };
    Ok(Some(if kind.is_property() {
        CodeBlock::Property(function)
    } else {
        CodeBlock::Function(function)
    }))
}

fn parameters(cursor: &mut TokenCursor) -> TranslateResult<Vec<Parameter>> {
    let mut parameters = Vec::new();
    if !cursor.peek().is_some_and(|t| t.is(TokenKind::OpenBrace)) {
        return Ok(parameters);
    }
    cursor.advance(1);
    if cursor.peek().is_some_and(|t| t.is(TokenKind::CloseBrace)) {
        cursor.advance(1);
        return Ok(parameters);
    }

    loop {
        let passing = if cursor.peek_is_keyword(0, "ByVal") {
            cursor.advance(1);
            ParameterPassing::ByVal
        } else if cursor.peek_is_keyword(0, "ByRef") {
            cursor.advance(1);
            ParameterPassing::ByRef
        } else {
            ParameterPassing::Unspecified
        };
        let name = cursor.expect_name()?;
        let is_array = cursor.peek().is_some_and(|t| t.is(TokenKind::OpenBrace))
            && cursor.peek_at(1).is_some_and(|t| t.is(TokenKind::CloseBrace));
        if is_array {
            cursor.advance(2);
        }
        parameters.push(Parameter {
            passing,
            name,
            is_array,
        });

        match cursor.next() {
            Some(t) if t.is(TokenKind::ArgumentSeparator) => continue,
            Some(t) if t.is(TokenKind::CloseBrace) => return Ok(parameters),
            Some(t) => {
                return Err(TranslateError::syntax(
                    t.line_number(),
                    format!("unexpected '{}' in parameter list", t.content()),
                ));
            }
            None => {
                return Err(TranslateError::MismatchedBrackets {
                    line: cursor.line_index() + 1,
                });
            }
        }
    }
}

pub fn dim(cursor: &mut TokenCursor) -> TranslateResult<Option<CodeBlock>> {
    let (kind, offset) = if cursor.peek_is_keyword(0, "Dim") {
        (DimKind::Dim, 1)
    } else if cursor.peek_is_keyword(0, "ReDim") {
        if cursor.peek_is_keyword(1, "Preserve") {
            (DimKind::ReDim { preserve: true }, 2)
        } else {
            (DimKind::ReDim { preserve: false }, 1)
        }
    } else if cursor.peek_is_keyword(0, "Private") {
        (DimKind::Private, 1)
    } else if cursor.peek_is_keyword(0, "Public") {
        (DimKind::Public, 1)
    } else {
        return Ok(None);
    };

    let line_index = cursor.line_index();
    cursor.advance(offset);
    let statement = cursor.take_statement();
    let variables = variable_list(&statement, line_index)?;
    if matches!(kind, DimKind::ReDim { .. }) && variables.iter().any(|v| v.dimensions.is_none()) {
        return Err(TranslateError::syntax(
            line_index + 1,
            "ReDim requires dimensions for every variable",
        ));
    }

    Ok(Some(CodeBlock::Dim(DimStatement {
        kind,
        variables,
        line_index,
    })))
}

fn variable_list(tokens: &[Token], line_index: usize) -> TranslateResult<Vec<VariableDeclaration>> {
    let mut variables = Vec::new();
    let mut idx = 0;
    loop {
        let name = match tokens.get(idx) {
            Some(t) if t.is_name_like() => t.clone(),
            Some(t) => {
                return Err(TranslateError::syntax(
                    t.line_number(),
                    format!("expected a variable name, found '{}'", t.content()),
                ));
            }
            None => {
                return Err(TranslateError::syntax(line_index + 1, "expected a variable name"));
            }
        };
        idx += 1;

        let dimensions = if tokens.get(idx).is_some_and(|t| t.is(TokenKind::OpenBrace)) {
            let close = find_closing_brace(tokens, idx)?;
            let bounds = generate(&tokens[idx + 1..close])?;
            idx = close + 1;
            Some(bounds)
        } else {
            None
        };
        variables.push(VariableDeclaration { name, dimensions });

        match tokens.get(idx) {
            None => return Ok(variables),
            Some(t) if t.is(TokenKind::ArgumentSeparator) => idx += 1,
            Some(t) => {
                return Err(TranslateError::syntax(
                    t.line_number(),
                    format!("unexpected '{}' in declaration", t.content()),
                ));
            }
        }
    }
}
