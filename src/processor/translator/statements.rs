//! Call statements and Let/Set assignments.

use super::expressions::{self, RenderContext, Step, string_literal};
use super::scope::NameResolution;
use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{
    Expression, ExpressionSegment, Statement, ValueSettingKind, ValueSettingStatement,
};

fn is_call_chain(expression: &Expression) -> bool {
    !expression.segments.is_empty()
        && expression
            .segments
            .iter()
            .all(|s| matches!(s, ExpressionSegment::Call(_)))
}

/// A statement that is only a call (or only a reference, which VBScript
/// evaluates for its default member).
pub fn call(context: &mut RenderContext<'_, '_>, statement: &Statement) -> TranslateResult<String> {
    let line = statement.expression.line_index() + 1;
    if !is_call_chain(&statement.expression) {
        return Err(TranslateError::syntax(line, "expected a call statement"));
    }
    let steps = expressions::steps(&statement.expression.segments);
    let rendered = context.chain(&steps)?;

    let bare_value = match &steps[..] {
        [only] if only.arguments.is_empty() => !matches!(
            context.scope.resolve(only.name),
            NameResolution::Function { .. }
                | NameResolution::BuiltInFunction(_)
                | NameResolution::ClassProperty
        ),
        _ => false,
    };
    if bare_value {
        Ok(format!("_.CALL({rendered}, new string[0]);"))
    } else {
        Ok(format!("{rendered};"))
    }
}

pub fn value_setting(
    context: &mut RenderContext<'_, '_>,
    statement: &ValueSettingStatement,
) -> TranslateResult<String> {
    let line = statement.target.line_index() + 1;
    if !is_call_chain(&statement.target) {
        return Err(TranslateError::syntax(line, "invalid assignment target"));
    }
    let steps = expressions::steps(&statement.target.segments);
    let Some((last, leading)) = steps.split_last() else {
        return Err(TranslateError::syntax(line, "missing assignment target"));
    };

    let target = if leading.is_empty() {
        Target::root(context, last, line)?
    } else {
        Target::Member {
            object: context.chain(leading)?,
            member: string_literal(last.name.content()),
        }
    };

    let value = context.expression(&statement.value)?;
    let value = match statement.kind {
        ValueSettingKind::Let => format!("_.VAL({value})"),
        ValueSettingKind::Set => format!("_.OBJ({value})"),
    };

    match target {
        Target::Name(name) if last.arguments.is_empty() => Ok(format!("{name} = {value};")),
        Target::Name(name) => {
            let arguments = context.args(last.arguments)?;
            Ok(format!("_.SET({value}, {name}, null, {arguments});"))
        }
        Target::Member { object, member } if last.arguments.is_empty() => {
            Ok(format!("_.SET({value}, {object}, {member});"))
        }
        Target::Member { object, member } => {
            let arguments = context.args(last.arguments)?;
            Ok(format!("_.SET({value}, {object}, {member}, {arguments});"))
        }
    }
}

enum Target {
    /// A variable or return value, written directly.
    Name(String),
    /// A member of an object, written through the runtime.
    Member { object: String, member: String },
}

impl Target {
    fn root(context: &mut RenderContext<'_, '_>, step: &Step<'_>, line: usize) -> TranslateResult<Self> {
        match context.scope.resolve_assignment_target(step.name) {
            NameResolution::Variable(name) | NameResolution::ReturnValue(name) => Ok(Self::Name(name)),
            NameResolution::Undeclared(name) => {
                context.result.record_undeclared(step.name);
                Ok(Self::Name(name))
            }
            NameResolution::ClassProperty => Ok(Self::Member {
                object: "this".to_string(),
                member: string_literal(step.name.content()),
            }),
            _ => Err(TranslateError::syntax(
                line,
                format!("cannot assign to '{}'", step.name.content()),
            )),
        }
    }
}
