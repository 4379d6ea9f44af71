//! Renders expressions as C# calls against the compatibility layer `_`.

use super::date_literals::{DateLiteralClassification, DateLiteralValidator};
use super::names;
use super::operands::{self, Node, Operand};
use super::result::TranslationResult;
use super::scope::{FunctionSignature, NameResolution, ScopeAccessInformation};
use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{Expression, ExpressionSegment};
use crate::processor::token::{Token, TokenKind};

/// One step of a member-access chain: a name and the arguments bound to it.
#[derive(Debug, Clone, Copy)]
pub struct Step<'e> {
    pub name: &'e Token,
    pub arguments: &'e [Expression],
}

/// Flatten `a.b(1).c` into `a`, `b(1)`, `c`.
pub fn steps(segments: &[ExpressionSegment]) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    for segment in segments {
        if let ExpressionSegment::Call(call) = segment {
            let last = call.member_access_tokens.len().saturating_sub(1);
            for (idx, name) in call.member_access_tokens.iter().enumerate() {
                let arguments: &[Expression] = if idx == last { &call.arguments } else { &[] };
                steps.push(Step { name, arguments });
            }
        }
    }
    steps
}

pub struct RenderContext<'s, 'r> {
    pub scope: &'s ScopeAccessInformation<'s>,
    pub result: &'r mut TranslationResult,
    pub dates: &'s DateLiteralValidator<'s>,
}

impl RenderContext<'_, '_> {
    pub fn expression(&mut self, expression: &Expression) -> TranslateResult<String> {
        let tree = operands::build(expression)?;
        self.node(&tree)
    }

    fn node(&mut self, node: &Node<'_>) -> TranslateResult<String> {
        match node {
            Node::Operand(operand) => self.operand(*operand),
            Node::Unary { operator, operand } => {
                let inner = self.node(operand)?;
                let function = if operator.content() == "-" { "NEG" } else { "NOT" };
                Ok(format!("_.{function}({inner})"))
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                let function = binary_function(operator)?;
                let left = self.node(left)?;
                let right = self.node(right)?;
                Ok(format!("_.{function}({left}, {right})"))
            }
        }
    }

    fn operand(&mut self, operand: Operand<'_>) -> TranslateResult<String> {
        match operand {
            Operand::Value(token) => self.value(token),
            Operand::Bracketed(inner) => self.expression(inner),
            Operand::NewInstance(class_name) => Ok(if self.scope.is_known_class(class_name) {
                format!(
                    "new {}(_, _env, {})",
                    names::rewrite_token(class_name),
                    self.scope.outer_reference()
                )
            } else {
                format!("_.NEW({})", string_literal(class_name.content()))
            }),
            Operand::Chain(segments) => self.chain(&steps(segments)),
        }
    }

    fn value(&mut self, token: &Token) -> TranslateResult<String> {
        match token.kind() {
            TokenKind::StringLiteral => Ok(string_literal(token.content())),
            TokenKind::NumericValue => Ok(numeric_literal(token.content())),
            TokenKind::DateLiteral => {
                match self.dates.classify(token.content()) {
                    DateLiteralClassification::Invalid => {
                        return Err(TranslateError::InvalidDateLiteral {
                            line: token.line_number(),
                            literal: token.content().to_string(),
                        });
                    }
                    DateLiteralClassification::CultureDependent => {
                        self.result.record_culture_dependent_date(token.content());
                    }
                    DateLiteralClassification::Valid => {}
                }
                Ok(format!("_.DATELITERAL({})", string_literal(token.content())))
            }
            TokenKind::BuiltInValue => Ok(match token.content().to_ascii_lowercase().as_str() {
                "true" => "true",
                "false" => "false",
                "empty" => "null",
                "nothing" => "VBScriptConstants.Nothing",
                _ => "DBNull.Value",
            }
            .to_string()),
            _ => Err(TranslateError::internal(format!(
                "line {}: '{}' is not a literal",
                token.line_number(),
                token.content()
            ))),
        }
    }

    /// Render a whole member-access chain.
    pub fn chain(&mut self, steps: &[Step<'_>]) -> TranslateResult<String> {
        let Some((root, rest)) = steps.split_first() else {
            return Err(TranslateError::internal("empty member-access chain"));
        };
        let base = self.root(root)?;
        self.members(base, rest)
    }

    fn root(&mut self, root: &Step<'_>) -> TranslateResult<String> {
        let line = root.name.line_number();
        let base = match self.scope.resolve(root.name) {
            NameResolution::Function { name, signature } => {
                let arguments = self.call_arguments(root, &signature)?;
                return Ok(format!("{name}({arguments})"));
            }
            NameResolution::BuiltInFunction(function) => {
                let arguments = self.plain_arguments(root.arguments)?;
                return Ok(format!("_.{}({})", function.to_ascii_uppercase(), arguments.join(", ")));
            }
            NameResolution::ClassProperty => {
                return self.late_bound_call("this".to_string(), &[root.name], root.arguments);
            }
            NameResolution::BuiltInConstant(constant) => {
                if !root.arguments.is_empty() {
                    return Err(TranslateError::syntax(line, format!("{constant} is not callable")));
                }
                return Ok(format!("VBScriptConstants.{constant}"));
            }
            NameResolution::Class(_) => {
                return Err(TranslateError::syntax(
                    line,
                    format!("class name '{}' used as a value", root.name.content()),
                ));
            }
            NameResolution::This => "this".to_string(),
            NameResolution::ErrObject => "_.ERR".to_string(),
            NameResolution::External(name) => format!("_env.{name}"),
            NameResolution::Variable(name) | NameResolution::ReturnValue(name) => name,
            NameResolution::Undeclared(name) => {
                self.result.record_undeclared(root.name);
                name
            }
        };
        if root.arguments.is_empty() {
            Ok(base)
        } else {
            // Array element or default member.
            self.late_bound_call(base, &[], root.arguments)
        }
    }

    /// Walk the remaining members; every bound argument list ends one
    /// late-bound call.
    fn members(&mut self, base: String, steps: &[Step<'_>]) -> TranslateResult<String> {
        let mut current = base;
        let mut pending: Vec<&Token> = Vec::new();
        for step in steps {
            pending.push(step.name);
            if !step.arguments.is_empty() {
                current = self.late_bound_call(current, &pending, step.arguments)?;
                pending.clear();
            }
        }
        if !pending.is_empty() {
            current = self.late_bound_call(current, &pending, &[])?;
        }
        Ok(current)
    }

    pub fn late_bound_call(
        &mut self,
        target: String,
        members: &[&Token],
        arguments: &[Expression],
    ) -> TranslateResult<String> {
        let members = member_array(members);
        if arguments.is_empty() {
            return Ok(format!("_.CALL({target}, {members})"));
        }
        let arguments = self.args(arguments)?;
        Ok(format!("_.CALL({target}, {members}, {arguments})"))
    }

    /// `_.ARGS(a, b)` for late-bound calls and member assignments.
    pub fn args(&mut self, arguments: &[Expression]) -> TranslateResult<String> {
        Ok(format!("_.ARGS({})", self.plain_arguments(arguments)?.join(", ")))
    }

    fn plain_arguments(&mut self, arguments: &[Expression]) -> TranslateResult<Vec<String>> {
        arguments.iter().map(|a| self.expression(a)).collect()
    }

    /// Arguments for a call to a function declared in the script. By-ref
    /// parameters take variables by `ref`; any other value goes through a
    /// temporary reference.
    fn call_arguments(&mut self, call: &Step<'_>, signature: &FunctionSignature) -> TranslateResult<String> {
        if call.arguments.len() != signature.by_ref.len() {
            return Err(TranslateError::syntax(
                call.name.line_number(),
                format!(
                    "wrong number of arguments to '{}': expected {}, found {}",
                    call.name.content(),
                    signature.by_ref.len(),
                    call.arguments.len()
                ),
            ));
        }

        let mut rendered = Vec::with_capacity(call.arguments.len());
        for (argument, by_ref) in call.arguments.iter().zip(&signature.by_ref) {
            if !by_ref {
                rendered.push(self.expression(argument)?);
                continue;
            }
            match self.plain_variable(argument) {
                Some(name) => rendered.push(format!("ref {name}")),
                None => rendered.push(format!("ref _.TEMPREF({})", self.expression(argument)?)),
            }
        }
        Ok(rendered.join(", "))
    }

    /// The variable an argument names, if it is nothing but a variable.
    fn plain_variable(&mut self, argument: &Expression) -> Option<String> {
        let [ExpressionSegment::Call(call)] = &argument.segments[..] else {
            return None;
        };
        let [name] = &call.member_access_tokens[..] else {
            return None;
        };
        if !call.arguments.is_empty() {
            return None;
        }
        match self.scope.resolve(name) {
            NameResolution::Variable(rewritten) => Some(rewritten),
            NameResolution::Undeclared(rewritten) => {
                self.result.record_undeclared(name);
                Some(rewritten)
            }
            _ => None,
        }
    }
}

fn member_array(members: &[&Token]) -> String {
    if members.is_empty() {
        return "new string[0]".to_string();
    }
    let names: Vec<String> = members.iter().map(|m| string_literal(m.content())).collect();
    format!("new[] {{ {} }}", names.join(", "))
}

fn binary_function(operator: &Token) -> TranslateResult<&'static str> {
    let function = match operator.content().to_ascii_lowercase().as_str() {
        "+" => "ADD",
        "-" => "SUBT",
        "*" => "MULT",
        "/" => "DIV",
        "\\" => "INTDIV",
        "^" => "POW",
        "mod" => "MOD",
        "&" => "CONCAT",
        "=" => "EQ",
        "<>" => "NOTEQ",
        "<" => "LT",
        ">" => "GT",
        "<=" => "LTE",
        ">=" => "GTE",
        "is" => "IS",
        "and" => "AND",
        "or" => "OR",
        "xor" => "XOR",
        "eqv" => "EQV",
        "imp" => "IMP",
        other => {
            return Err(TranslateError::internal(format!(
                "line {}: no runtime function for operator '{other}'",
                operator.line_number()
            )));
        }
    };
    Ok(function)
}

pub fn string_literal(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push('"');
    for c in content.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Integers that fit an `int` stay as they are; anything larger becomes a
/// double, as it does in VBScript. Decimals and exponents already read as
/// doubles in C#.
fn numeric_literal(content: &str) -> String {
    if content.contains(['.', 'e', 'E']) {
        return content.to_string();
    }
    match content.parse::<i64>() {
        Ok(value) if i32::try_from(value).is_ok() => content.to_string(),
        _ => format!("{content}D"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CultureContext;
    use crate::processor::ast::CodeBlock;
    use crate::processor::{block_parser, expression, lexer, number_rebuilder, operator_combiner};

    fn tokens(src: &str) -> Vec<Token> {
        let raw = lexer::tokenise(src).unwrap();
        operator_combiner::combine(number_rebuilder::rebuild(raw).unwrap())
    }

    fn render_in(program: &str, src: &str) -> (TranslateResult<String>, TranslationResult) {
        let blocks: Vec<CodeBlock> = block_parser::parse(tokens(program)).unwrap();
        let scope = ScopeAccessInformation::outermost(&blocks, &["WScript".to_string()]);
        let culture = CultureContext::default();
        let dates = DateLiteralValidator::new(&culture);
        let mut result = TranslationResult::default();
        let expression = expression::generate_single(&tokens(src), 0).unwrap();
        let rendered = RenderContext {
            scope: &scope,
            result: &mut result,
            dates: &dates,
        }
        .expression(&expression);
        (rendered, result)
    }

    fn render(src: &str) -> String {
        let program = "Dim a, b\nFunction F(x, ByVal y)\nEnd Function\nClass Thing\nEnd Class";
        render_in(program, src).0.unwrap()
    }

    #[test]
    fn test_rendering() {
        let test_cases = vec![
            ("a + 1", "_.ADD(a, 1)"),
            ("\"x\" & b", "_.CONCAT(\"x\", b)"),
            ("-a", "_.NEG(a)"),
            ("Not a", "_.NOT(a)"),
            ("a <> -1.5", "_.NOTEQ(a, -1.5)"),
            ("3000000000", "3000000000D"),
            ("1E5", "1E5"),
            ("a * 1.5E-3", "_.MULT(a, 1.5E-3)"),
            ("True", "true"),
            ("Nothing", "VBScriptConstants.Nothing"),
            ("Len(a)", "_.LEN(a)"),
            ("vbCrLf", "VBScriptConstants.vbCrLf"),
            ("F(a, b)", "f(ref a, b)"),
            ("F(a + 1, 2)", "f(ref _.TEMPREF(_.ADD(a, 1)), 2)"),
            ("F((a), 2)", "f(ref _.TEMPREF(a), 2)"),
            ("WScript.Arguments(0)", "_.CALL(_env.wscript, new[] { \"Arguments\" }, _.ARGS(0))"),
            ("a(1)", "_.CALL(a, new string[0], _.ARGS(1))"),
            ("a.b.c", "_.CALL(a, new[] { \"b\", \"c\" })"),
            ("a.b(1).c", "_.CALL(_.CALL(a, new[] { \"b\" }, _.ARGS(1)), new[] { \"c\" })"),
            ("New Thing", "new thing(_, _env, this)"),
            ("New Other", "_.NEW(\"Other\")"),
            ("Me", "this"),
            ("Err.Number", "_.CALL(_.ERR, new[] { \"Number\" })"),
            ("\"say \"\"hi\"\"\"", "\"say \\\"hi\\\"\""),
            ("#2020-01-31#", "_.DATELITERAL(\"2020-01-31\")"),
        ];
        for (src, expected) in test_cases {
            assert_eq!(render(src), expected, "{src}");
        }
    }

    #[test]
    fn test_undeclared_names_are_recorded_once() {
        let (rendered, result) = render_in("", "c + C + WScript");
        assert_eq!(rendered.unwrap(), "_.ADD(_.ADD(c, c), _env.wscript)");
        assert_eq!(result.undeclared_variables().len(), 1);
    }

    #[test]
    fn test_date_literals() {
        let (rendered, result) = render_in("", "#1/2/2020#");
        assert!(rendered.is_ok());
        assert_eq!(result.culture_dependent_dates(), ["1/2/2020".to_string()]);

        let (rendered, _) = render_in("", "#2/30/2020#");
        assert!(matches!(rendered, Err(TranslateError::InvalidDateLiteral { .. })));
    }

    #[test]
    fn test_wrong_argument_count() {
        let (rendered, _) = render_in("Function F(x)\nEnd Function", "F(1, 2)");
        assert!(rendered.is_err());
    }
}
