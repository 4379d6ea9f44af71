//! Walks the block tree and emits C# statements.
//!
//! The outermost program becomes the body of the runner's `Go` method, its
//! functions become local functions there, and classes are emitted on their
//! own. Explicit declarations are hoisted to the top of each function, class
//! and the program; names nobody declared are declared at the outermost
//! scope only, with a warning for each.
//!
//! A program that defines classes has its outermost scope emitted as the
//! `GlobalReferences` class instead: variables become fields, functions
//! become methods and the statements become `Run`. Every generated class
//! gets that instance as `_outer`, so class code can reach the program.

mod date_literals;
mod expressions;
pub mod names;
mod operands;
mod result;
mod scope;
mod statements;

use std::collections::HashMap;

use tracing::debug;

use self::date_literals::DateLiteralValidator;
use self::expressions::{RenderContext, string_literal};
use self::names::TempValueNameGenerator;
use self::result::{DeclaredVariable, TranslationResult, Visibility};
use self::scope::{NameResolution, ScopeAccessInformation, ScopeKind};
use crate::config::TranslatorConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::logger::Logger;
use crate::model::TranslatedStatement;
use crate::processor::ast::{
    ClassBlock, CodeBlock, DimKind, DimStatement, ExitKind, FunctionBlock, FunctionKind, IfBlock,
    LoopCondition,
};

const OUTER_CLASS: &str = "GlobalReferences";

/// Everything the translator hands back to the pipeline.
#[derive(Debug, Default)]
pub struct Translation {
    pub body: Vec<TranslatedStatement>,
    pub classes: Vec<TranslatedStatement>,
    pub culture_dependent_dates: Vec<String>,
    pub warning_count: usize,
}

pub fn translate(
    mut blocks: Vec<CodeBlock>,
    config: &TranslatorConfig,
    logger: &dyn Logger,
) -> TranslateResult<Translation> {
    discard_superseded_functions(&mut blocks);

    let scope = ScopeAccessInformation::outermost(&blocks, &config.external_references);
    let mut translator = Translator {
        temp_names: TempValueNameGenerator::default(),
        dates: DateLiteralValidator::new(&config.culture),
        classes: Vec::new(),
        outer_class: scope.defines_classes(),
        outer_methods: Vec::new(),
    };
    let (statement_depth, declaration_depth, visibility) = if translator.outer_class {
        (2, 1, Visibility::Public)
    } else {
        (0, 0, Visibility::Local)
    };
    let mut result = TranslationResult::default();
    translator.blocks(&blocks, &scope, &mut result, statement_depth)?;

    let mut body = Vec::new();
    let dates = result.culture_dependent_dates().to_vec();
    if !dates.is_empty() {
        let literals: Vec<String> = dates.iter().map(|d| string_literal(d)).collect();
        body.push(TranslatedStatement::new(
            format!("_.VALIDATEDATELITERALS(new[] {{ {} }});", literals.join(", ")),
            0,
        ));
    }

    let mut declarations = result.flush_explicit(declaration_depth);
    let undeclared = result.flush_undeclared(declaration_depth, visibility);
    let mut warning_count = 0;
    for token in result.undeclared_variables() {
        if result.is_declared(&names::rewrite_token(token)) {
            continue;
        }
        logger.warning(&format!(
            "Undeclared variable: \"{}\" (line {})",
            token.content(),
            token.line_number()
        ));
        warning_count += 1;
    }
    debug!(
        explicit = declarations.len(),
        undeclared = undeclared.len(),
        "flushed outermost declarations"
    );
    declarations.extend(undeclared);

    let classes = if translator.outer_class {
        body.push(TranslatedStatement::new(
            format!("new {OUTER_CLASS}(_, _env).Run();"),
            0,
        ));
        let mut classes = global_references_class(declarations, result.statements, translator.outer_methods);
        if !translator.classes.is_empty() {
            classes.push(TranslatedStatement::blank());
            classes.append(&mut translator.classes);
        }
        classes
    } else {
        body.extend(declarations);
        if !body.is_empty() && !result.statements.is_empty() {
            body.push(TranslatedStatement::blank());
        }
        body.append(&mut result.statements);
        translator.classes
    };

    Ok(Translation {
        body,
        classes,
        culture_dependent_dates: dates,
        warning_count,
    })
}

/// The outermost scope of a program with classes, as a class of its own.
fn global_references_class(
    fields: Vec<TranslatedStatement>,
    statements: Vec<TranslatedStatement>,
    methods: Vec<TranslatedStatement>,
) -> Vec<TranslatedStatement> {
    let mut out = TranslationResult::default();
    out.add(format!("public class {OUTER_CLASS}"), 0);
    out.add("{", 0);
    out.extend(fields);
    references_and_constructor(&mut out, OUTER_CLASS, false, false);
    out.add_blank();
    out.add("public void Run()", 1);
    out.add("{", 1);
    out.extend(trim_blank_edges(statements));
    out.add("}", 1);
    if methods.iter().any(|s| !s.is_blank()) {
        out.add_blank();
        out.extend(trim_blank_edges(methods));
    }
    out.add("}", 0);
    out.statements
}

/// The runtime references a generated class holds, and the constructor
/// that takes them.
fn references_and_constructor(out: &mut TranslationResult, name: &str, with_outer: bool, initialize: bool) {
    out.add("private readonly IProvideVBScriptCompatFunctionality _;", 1);
    out.add("private readonly EnvironmentReferences _env;", 1);
    if with_outer {
        out.add(format!("private readonly {OUTER_CLASS} _outer;"), 1);
    }
    out.add_blank();

    let outer_parameter = if with_outer {
        format!(", {OUTER_CLASS} outer")
    } else {
        String::new()
    };
    out.add(
        format!("public {name}(IProvideVBScriptCompatFunctionality compatLayer, EnvironmentReferences env{outer_parameter})"),
        1,
    );
    out.add("{", 1);
    out.add("_ = compatLayer;", 2);
    out.add("_env = env;", 2);
    if with_outer {
        out.add("_outer = outer;", 2);
    }
    if initialize {
        out.add("class_initialize();", 2);
    }
    out.add("}", 1);
}

/// Only the last outermost Function or Sub of a given name is ever called.
fn discard_superseded_functions(blocks: &mut Vec<CodeBlock>) {
    let mut last_definition = HashMap::new();
    for (idx, block) in blocks.iter().enumerate() {
        if let CodeBlock::Function(function) = block {
            last_definition.insert(names::key(&function.name), idx);
        }
    }

    let mut idx = 0;
    blocks.retain(|block| {
        let keep = match block {
            CodeBlock::Function(function) => {
                let kept = last_definition.get(&names::key(&function.name)) == Some(&idx);
                if !kept {
                    debug!(
                        function = function.name.content(),
                        line = function.name.line_number(),
                        "discarding superseded definition"
                    );
                }
                kept
            }
            _ => true,
        };
        idx += 1;
        keep
    });
}

struct Translator<'c> {
    temp_names: TempValueNameGenerator,
    dates: DateLiteralValidator<'c>,
    classes: Vec<TranslatedStatement>,
    /// The outermost scope is emitted as `GlobalReferences`.
    outer_class: bool,
    /// Outermost functions, when they are methods of `GlobalReferences`.
    outer_methods: Vec<TranslatedStatement>,
}

impl Translator<'_> {
    /// Render one statement line through a fresh `RenderContext`.
    fn emit(
        &self,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
        render: impl FnOnce(&mut RenderContext<'_, '_>) -> TranslateResult<String>,
    ) -> TranslateResult<()> {
        let line = render(&mut RenderContext {
            scope,
            result: &mut *result,
            dates: &self.dates,
        })?;
        result.add(line, depth);
        Ok(())
    }

    fn blocks(
        &mut self,
        blocks: &[CodeBlock],
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        let mut previous_emitted = false;
        for block in blocks {
            let before = result.statements.len();
            match block {
                CodeBlock::Comment {
                    content,
                    inline: true,
                } => comment(result, content, previous_emitted, depth),
                _ => self.block(block, scope, result, depth)?,
            }
            previous_emitted = result.statements.len() > before;
        }
        Ok(())
    }

    fn block(
        &mut self,
        block: &CodeBlock,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        if scope.kind() == ScopeKind::Class && !is_class_member(block) {
            return Err(TranslateError::syntax(
                first_line(block),
                "only declarations and members may appear directly inside a class",
            ));
        }

        match block {
            CodeBlock::BlankLine => result.add_blank(),
            CodeBlock::Comment { content, .. } => comment(result, content, false, depth),
            CodeBlock::OptionExplicit => {}
            CodeBlock::Dim(dim) => self.dim(dim, scope, result, depth)?,
            CodeBlock::Class(class) => {
                if scope.kind() != ScopeKind::Outermost {
                    return Err(TranslateError::syntax(
                        class.name.line_number(),
                        "classes may only be defined at the outermost scope",
                    ));
                }
                self.class(class, scope, result)?;
            }
            CodeBlock::Function(function) => {
                if scope.kind() == ScopeKind::Function {
                    return Err(TranslateError::syntax(
                        function.name.line_number(),
                        "functions may not be nested",
                    ));
                }
                self.function(function, scope, result, depth)?;
            }
            CodeBlock::Property(property) => {
                if scope.kind() != ScopeKind::Class {
                    return Err(TranslateError::unsupported(
                        property.name.line_number(),
                        "Property outside a class",
                    ));
                }
                self.function(property, scope, result, depth)?;
            }
            CodeBlock::If(if_block) => self.if_block(if_block, scope, result, depth)?,
            CodeBlock::Statement(statement) => {
                self.emit(scope, result, depth, |context| statements::call(context, statement))?
            }
            CodeBlock::ValueSetting(setting) => self.emit(scope, result, depth, |context| {
                statements::value_setting(context, setting)
            })?,
            CodeBlock::Exit { kind, line_index } => exit(*kind, *line_index + 1, scope, result, depth)?,
            CodeBlock::Randomize { seed, .. } => self.emit(scope, result, depth, |context| {
                Ok(match seed {
                    Some(seed) => format!("_.RANDOMIZE({});", context.expression(seed)?),
                    None => "_.RANDOMIZE();".to_string(),
                })
            })?,
            CodeBlock::Do { condition, line_index, .. } => {
                let construct = match condition {
                    LoopCondition::PreWhile(_) => "Do While loop",
                    LoopCondition::PreUntil(_) => "Do Until loop",
                    LoopCondition::PostWhile(_) => "Do ... Loop While",
                    LoopCondition::PostUntil(_) => "Do ... Loop Until",
                    LoopCondition::None => "Do loop",
                };
                return Err(TranslateError::unsupported(*line_index + 1, construct));
            }
            CodeBlock::While { line_index, .. } => {
                return Err(TranslateError::unsupported(*line_index + 1, "While loop"));
            }
            CodeBlock::For { loop_variable, .. } => {
                return Err(TranslateError::unsupported(loop_variable.line_number(), "For loop"));
            }
            CodeBlock::ForEach { loop_variable, .. } => {
                return Err(TranslateError::unsupported(
                    loop_variable.line_number(),
                    "For Each loop",
                ));
            }
            CodeBlock::Select { line_index, .. } => {
                return Err(TranslateError::unsupported(*line_index + 1, "Select Case"));
            }
            CodeBlock::OnError { line_index, .. } => {
                return Err(TranslateError::unsupported(*line_index + 1, "On Error"));
            }
            CodeBlock::With { line_index, .. } => {
                return Err(TranslateError::unsupported(*line_index + 1, "With block"));
            }
        }
        Ok(())
    }

    fn dim(
        &self,
        dim: &DimStatement,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        let in_class = scope.kind() == ScopeKind::Class;
        let visibility = match (dim.kind, in_class) {
            (_, false) if self.outer_class && scope.kind() == ScopeKind::Outermost => {
                Visibility::Public
            }
            (_, false) => Visibility::Local,
            (DimKind::Private, true) => Visibility::Private,
            (DimKind::Dim | DimKind::Public, true) => Visibility::Public,
            (DimKind::ReDim { .. }, true) => {
                return Err(TranslateError::syntax(
                    dim.line_index + 1,
                    "ReDim must appear inside a function",
                ));
            }
        };

        let is_redim = matches!(dim.kind, DimKind::ReDim { .. });
        for variable in &dim.variables {
            let name = match scope.resolve(&variable.name) {
                // Resizes the variable of an enclosing scope.
                NameResolution::Variable(name) if is_redim && !scope.declares_locally(&variable.name) => {
                    name
                }
                _ => {
                    let name = names::rewrite_token(&variable.name);
                    result.declare(DeclaredVariable {
                        name: name.clone(),
                        is_array: variable.dimensions.is_some(),
                        visibility,
                    });
                    name
                }
            };

            let bounds = match &variable.dimensions {
                Some(bounds) if !bounds.is_empty() => bounds,
                _ => continue,
            };
            if in_class {
                return Err(TranslateError::unsupported(
                    variable.name.line_number(),
                    "dimensioned array field",
                ));
            }
            let preserve = matches!(dim.kind, DimKind::ReDim { preserve: true });
            self.emit(scope, result, depth, |context| {
                let bounds = bounds
                    .iter()
                    .map(|b| context.expression(b))
                    .collect::<TranslateResult<Vec<_>>>()?
                    .join(", ");
                Ok(if preserve {
                    format!("{name} = _.RESIZEARRAY({name}, new object[] {{ {bounds} }});")
                } else {
                    format!("{name} = _.NEWARRAY(new object[] {{ {bounds} }});")
                })
            })?;
        }
        Ok(())
    }

    fn if_block(
        &mut self,
        if_block: &IfBlock,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        for (idx, clause) in if_block.clauses.iter().enumerate() {
            let keyword = if idx == 0 { "if" } else { "else if" };
            self.emit(scope, result, depth, |context| {
                Ok(format!("{keyword} (_.IF({}))", context.expression(&clause.condition)?))
            })?;
            self.braced(&clause.statements, scope, result, depth)?;
        }
        if let Some(else_statements) = &if_block.else_statements {
            result.add("else", depth);
            self.braced(else_statements, scope, result, depth)?;
        }
        Ok(())
    }

    fn braced(
        &mut self,
        blocks: &[CodeBlock],
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        result.add("{", depth);
        self.blocks(blocks, scope, result, depth + 1)?;
        result.add("}", depth);
        Ok(())
    }

    /// Functions and subs at the outermost scope become local functions of
    /// `Go`, or methods of `GlobalReferences`; inside a class they, and
    /// properties, become methods.
    fn function(
        &mut self,
        function: &FunctionBlock,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
        depth: usize,
    ) -> TranslateResult<()> {
        let outer_method = self.outer_class && scope.kind() == ScopeKind::Outermost;
        let depth = if outer_method { 1 } else { depth };

        let return_value = function.kind.returns_value().then(|| self.temp_names.next());
        let inner = scope.for_function(function, return_value.clone());
        let mut body = TranslationResult::default();
        self.blocks(&function.statements, &inner, &mut body, depth + 1)?;
        result.absorb_pending(&body);

        let in_class = scope.kind() == ScopeKind::Class;
        let modifier = match (in_class, outer_method, function.is_public) {
            (true, _, true) | (false, true, _) => "public ",
            (true, _, false) => "private ",
            (false, false, _) => "",
        };
        let mut out = TranslationResult::default();
        if in_class {
            if function.kind.is_property() {
                out.add(format!("[TranslatedProperty({})]", string_literal(function.name.content())), depth);
            }
            if function.is_default {
                out.add("[IsDefault]", depth);
            }
        }
        out.add(signature(function, modifier), depth);
        out.add("{", depth);
        if let Some(return_value) = &return_value {
            out.add(format!("object {return_value} = null;"), depth + 1);
        }
        let declarations = body.flush_explicit(depth + 1);
        debug!(
            function = function.name.content(),
            declarations = declarations.len(),
            "flushed function declarations"
        );
        let declared = return_value.is_some() || !declarations.is_empty();
        out.extend(declarations);
        if declared && !body.statements.is_empty() {
            out.add_blank();
        }
        out.extend(body.statements);
        if let Some(return_value) = &return_value {
            out.add(format!("return {return_value};"), depth + 1);
        }
        out.add("}", depth);

        if outer_method {
            if !self.outer_methods.is_empty() {
                self.outer_methods.push(TranslatedStatement::blank());
            }
            self.outer_methods.append(&mut out.statements);
        } else {
            result.extend(out.statements);
        }
        Ok(())
    }

    fn class(
        &mut self,
        class: &ClassBlock,
        scope: &ScopeAccessInformation<'_>,
        result: &mut TranslationResult,
    ) -> TranslateResult<()> {
        let class_scope = scope.for_class(class);
        let mut members = TranslationResult::default();
        self.blocks(&class.statements, &class_scope, &mut members, 1)?;
        result.absorb_pending(&members);

        let name = names::rewrite_token(&class.name);
        let mut out = TranslationResult::default();
        if !self.classes.is_empty() {
            out.add_blank();
        }
        if has_indexed_public_property(class) {
            out.add(format!("public class {name} : TranslatedPropertyIReflectImplementation"), 0);
        } else {
            out.add(format!("public class {name}"), 0);
        }
        out.add("{", 0);
        out.extend(members.flush_explicit(1));
        references_and_constructor(&mut out, &name, true, has_initializer(class));
        if members.statements.iter().any(|s| !s.is_blank()) {
            out.add_blank();
            out.extend(trim_blank_edges(members.statements));
        }
        out.add("}", 0);
        self.classes.append(&mut out.statements);
        Ok(())
    }
}

fn signature(function: &FunctionBlock, modifier: &str) -> String {
    let return_type = if function.kind.returns_value() { "object" } else { "void" };
    let name = names::rewrite_token(&function.name);
    let name = match function.kind {
        FunctionKind::PropertyGet => format!("get_{name}"),
        FunctionKind::PropertyLet => format!("let_{name}"),
        FunctionKind::PropertySet => format!("set_{name}"),
        FunctionKind::Function | FunctionKind::Sub => name,
    };
    let parameters: Vec<String> = function
        .parameters
        .iter()
        .map(|p| {
            let name = names::rewrite_token(&p.name);
            if p.passing.is_by_ref() {
                format!("ref object {name}")
            } else {
                format!("object {name}")
            }
        })
        .collect();
    format!("{modifier}{return_type} {name}({})", parameters.join(", "))
}

/// An inline comment joins the line its own statement produced; when that
/// statement produced nothing it stands alone.
fn comment(result: &mut TranslationResult, content: &str, attach: bool, depth: usize) {
    if attach {
        if let Some(previous) = result.statements.last_mut().filter(|s| !s.is_blank()) {
            previous.content.push_str(&format!(" //{content}"));
            return;
        }
    }
    result.add(format!("//{content}"), depth);
}

fn exit(
    kind: ExitKind,
    line: usize,
    scope: &ScopeAccessInformation<'_>,
    result: &mut TranslationResult,
    depth: usize,
) -> TranslateResult<()> {
    match kind {
        ExitKind::Do => Err(TranslateError::unsupported(line, "Exit Do")),
        ExitKind::For => Err(TranslateError::unsupported(line, "Exit For")),
        ExitKind::Function | ExitKind::Sub | ExitKind::Property => {
            if scope.kind() != ScopeKind::Function {
                return Err(TranslateError::syntax(line, "Exit outside of a function"));
            }
            match scope.return_value_name() {
                Some(name) => result.add(format!("return {name};"), depth),
                None => result.add("return;", depth),
            }
            Ok(())
        }
    }
}

fn is_class_member(block: &CodeBlock) -> bool {
    matches!(
        block,
        CodeBlock::BlankLine
            | CodeBlock::Comment { .. }
            | CodeBlock::Dim(_)
            | CodeBlock::Function(_)
            | CodeBlock::Property(_)
    )
}

fn first_line(block: &CodeBlock) -> usize {
    let line_index = match block {
        CodeBlock::Dim(dim) => dim.line_index,
        CodeBlock::Class(class) => class.name.line_index(),
        CodeBlock::Function(f) | CodeBlock::Property(f) => f.name.line_index(),
        CodeBlock::If(if_block) => if_block
            .clauses
            .first()
            .map_or(0, |c| c.condition.line_index()),
        CodeBlock::Statement(statement) => statement.expression.line_index(),
        CodeBlock::ValueSetting(setting) => setting.target.line_index(),
        CodeBlock::Exit { line_index, .. }
        | CodeBlock::Randomize { line_index, .. }
        | CodeBlock::Do { line_index, .. }
        | CodeBlock::While { line_index, .. }
        | CodeBlock::Select { line_index, .. }
        | CodeBlock::OnError { line_index, .. }
        | CodeBlock::With { line_index, .. } => *line_index,
        CodeBlock::For { loop_variable, .. } | CodeBlock::ForEach { loop_variable, .. } => {
            loop_variable.line_index()
        }
        CodeBlock::BlankLine | CodeBlock::Comment { .. } | CodeBlock::OptionExplicit => 0,
    };
    line_index + 1
}

/// A public property taking arguments needs the reflection shim so COM
/// callers can reach it as an indexed property.
fn has_indexed_public_property(class: &ClassBlock) -> bool {
    class.statements.iter().any(|block| match block {
        CodeBlock::Property(property) if property.is_public => match property.kind {
            FunctionKind::PropertyGet => !property.parameters.is_empty(),
            _ => property.parameters.len() > 1,
        },
        _ => false,
    })
}

fn has_initializer(class: &ClassBlock) -> bool {
    class.statements.iter().any(|block| {
        matches!(block, CodeBlock::Function(f)
            if f.kind == FunctionKind::Sub && names::key(&f.name) == "class_initialize")
    })
}

fn trim_blank_edges(mut statements: Vec<TranslatedStatement>) -> Vec<TranslatedStatement> {
    while statements.last().is_some_and(TranslatedStatement::is_blank) {
        statements.pop();
    }
    let leading = statements.iter().take_while(|s| s.is_blank()).count();
    statements.split_off(leading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::logger::CollectingLogger;
    use crate::processor::{block_parser, lexer, number_rebuilder, operator_combiner};

    fn parse(src: &str) -> Vec<CodeBlock> {
        let tokens = lexer::tokenise(src).unwrap();
        let tokens = operator_combiner::combine(number_rebuilder::rebuild(tokens).unwrap());
        block_parser::parse(tokens).unwrap()
    }

    fn run(src: &str) -> (TranslateResult<Translation>, Vec<String>) {
        let logger = CollectingLogger::default();
        let translation = translate(parse(src), &TranslatorConfig::default(), &logger);
        (translation, logger.messages())
    }

    fn lines(statements: &[TranslatedStatement]) -> Vec<String> {
        statements
            .iter()
            .filter(|s| !s.is_blank())
            .map(|s| s.content.clone())
            .collect()
    }

    #[test]
    fn test_scope_flush() {
        let (translation, warnings) = run("Dim a\na = b");
        let body = lines(&translation.unwrap().body);
        assert_eq!(
            body,
            vec![
                "object a = null;",
                "object b = null; // Undeclared variable",
                "a = _.VAL(b);",
            ]
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"b\""), "{}", warnings[0]);
    }

    #[test]
    fn test_undeclared_inside_function_reaches_outermost() {
        let (translation, warnings) = run("Sub S()\n  x = 1\nEnd Sub");
        let translation = translation.unwrap();
        assert_eq!(translation.body[0].content, "object x = null; // Undeclared variable");
        assert_eq!(translation.warning_count, 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_top_level_functions_keep_last() {
        let (translation, _) = run("Function F()\n  F = 1\nEnd Function\nFunction f()\n  f = 2\nEnd Function");
        let body = lines(&translation.unwrap().body);
        assert_eq!(body.iter().filter(|l| l.starts_with("object f(")).count(), 1);
        assert!(body.contains(&"retVal1 = _.VAL(2);".to_string()), "{body:?}");
        assert!(!body.iter().any(|l| l.contains("_.VAL(1)")));
    }

    #[test]
    fn test_function_translation() {
        let (translation, _) = run("Function Add(ByVal a, b)\n  Add = a + b\n  Exit Function\nEnd Function\nSub Log(msg)\n  Exit Sub\nEnd Sub");
        let body = lines(&translation.unwrap().body);
        assert_eq!(
            body,
            vec![
                "object add(object a, ref object b)",
                "{",
                "object retVal1 = null;",
                "retVal1 = _.VAL(_.ADD(a, b));",
                "return retVal1;",
                "return retVal1;",
                "}",
                "void log(ref object msg)",
                "{",
                "return;",
                "}",
            ]
        );
    }

    #[test]
    fn test_class_translation() {
        let source = "Class Thing\n  Public Name\n  Private count\n  Sub Class_Initialize()\n    count = 0\n  End Sub\n  Public Default Property Get Size\n    Size = count\n  End Property\nEnd Class\nSet t = New Thing";
        let (translation, warnings) = run(source);
        let translation = translation.unwrap();
        let classes = lines(&translation.classes);
        for expected in [
            "public class thing",
            "public object name = null;",
            "private object count = null;",
            "class_initialize();",
            "public void class_initialize()",
            "count = _.VAL(0);",
            "[TranslatedProperty(\"Size\")]",
            "[IsDefault]",
            "public object get_size()",
            "retVal1 = _.VAL(count);",
            "t = _.OBJ(new thing(_, _env, this));",
        ] {
            assert!(classes.contains(&expected.to_string()), "missing {expected}: {classes:?}");
        }
        assert_eq!(lines(&translation.body), vec!["new GlobalReferences(_, _env).Run();"]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_classes_reach_the_outermost_scope() {
        let source = "Dim g\nFunction H()\n  H = 1\nEnd Function\nClass C\n  Sub M()\n    g = H()\n    y = 2\n  End Sub\nEnd Class\nSet o = New C\no.M";
        let (translation, warnings) = run(source);
        let translation = translation.unwrap();
        let classes = lines(&translation.classes);
        for expected in [
            "public class GlobalReferences",
            "public object g = null;",
            "public object o = null; // Undeclared variable",
            "public object y = null; // Undeclared variable",
            "public GlobalReferences(IProvideVBScriptCompatFunctionality compatLayer, EnvironmentReferences env)",
            "public void Run()",
            "o = _.OBJ(new c(_, _env, this));",
            "_.CALL(o, new[] { \"M\" });",
            "public object h()",
            "public class c",
            "private readonly GlobalReferences _outer;",
            "public c(IProvideVBScriptCompatFunctionality compatLayer, EnvironmentReferences env, GlobalReferences outer)",
            "_outer = outer;",
            "public void m()",
            "_outer.g = _.VAL(_outer.h());",
            "_outer.y = _.VAL(2);",
        ] {
            assert!(classes.contains(&expected.to_string()), "missing {expected}: {classes:#?}");
        }
        assert_eq!(lines(&translation.body), vec!["new GlobalReferences(_, _env).Run();"]);
        assert!(!classes.iter().any(|l| l == "g = _.VAL(h());"), "{classes:#?}");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_redim_resizes_the_visible_variable() {
        let (translation, warnings) = run("Dim a\nSub S()\n  ReDim a(3)\n  ReDim Preserve b(1)\nEnd Sub");
        let body = lines(&translation.unwrap().body);
        assert_eq!(
            body,
            vec![
                "object a = null;",
                "void s()",
                "{",
                "object b = new object[0];",
                "a = _.NEWARRAY(new object[] { 3 });",
                "b = _.RESIZEARRAY(b, new object[] { 1 });",
                "}",
            ]
        );
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_indexed_property_uses_reflection_shim() {
        let source = "Class Bag\n  Public Property Get Item(i)\n  End Property\nEnd Class";
        let (translation, _) = run(source);
        let classes = lines(&translation.unwrap().classes);
        assert!(
            classes.contains(&"public class bag : TranslatedPropertyIReflectImplementation".to_string()),
            "{classes:#?}"
        );
    }

    #[test]
    fn test_arrays_and_control_statements() {
        let source = "Option Explicit\nDim a(), b(2, 3)\nReDim Preserve a(5)\nIf a Then\n  Randomize\nElseIf b Then\n  Randomize 1\nElse\n  Dim c\nEnd If";
        let (translation, warnings) = run(source);
        let body = lines(&translation.unwrap().body);
        assert_eq!(
            body,
            vec![
                "object a = new object[0];",
                "object b = new object[0];",
                "object c = null;",
                "b = _.NEWARRAY(new object[] { 2, 3 });",
                "a = _.RESIZEARRAY(a, new object[] { 5 });",
                "if (_.IF(a))",
                "{",
                "_.RANDOMIZE();",
                "}",
                "else if (_.IF(b))",
                "{",
                "_.RANDOMIZE(1);",
                "}",
                "else",
                "{",
                "}",
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_comments() {
        let (translation, _) = run("' top\na = 1 ' set");
        let body = lines(&translation.unwrap().body);
        assert!(body.contains(&"// top".to_string()), "{body:?}");
        assert!(body.contains(&"a = _.VAL(1); // set".to_string()), "{body:?}");
    }

    #[test]
    fn test_inline_comment_on_a_silent_statement_stands_alone() {
        let (translation, _) = run("a = 1\n\nDim b ' on b\nc = 2 ' on c\nDim d\nDim e ' on e");
        let body = lines(&translation.unwrap().body);
        for expected in ["a = _.VAL(1);", "// on b", "c = _.VAL(2); // on c", "// on e"] {
            assert!(body.contains(&expected.to_string()), "missing {expected}: {body:?}");
        }
    }

    #[test]
    fn test_culture_dependent_dates_are_validated_first() {
        let (translation, _) = run("Dim d\nd = #1/2/2020#");
        let translation = translation.unwrap();
        assert_eq!(
            translation.body[0].content,
            "_.VALIDATEDATELITERALS(new[] { \"1/2/2020\" });"
        );
        assert_eq!(translation.culture_dependent_dates, vec!["1/2/2020".to_string()]);
    }

    #[test]
    fn test_unsupported_constructs() {
        let test_cases = vec![
            "Do\nLoop",
            "Do While x\nLoop",
            "While x\nWend",
            "For i = 1 To 2\nNext",
            "For Each i In x\nNext",
            "Select Case x\nCase 1\nEnd Select",
            "On Error Resume Next",
            "With x\nEnd With",
            "Property Get P\nEnd Property",
            "Sub S()\n  Exit Do\nEnd Sub",
            "Class C\n  Dim a(2)\nEnd Class",
        ];
        for source in test_cases {
            let (translation, _) = run(source);
            let error = translation.unwrap_err();
            assert_eq!(error.category(), ErrorCategory::Unsupported, "{source}: {error}");
        }
    }

    #[test]
    fn test_structural_errors() {
        let test_cases = vec![
            "Exit Function",
            "Class C\n  x = 1\nEnd Class",
            "Function F(a)\nEnd Function\nF 1, 2",
        ];
        for source in test_cases {
            let (translation, _) = run(source);
            let error = translation.unwrap_err();
            assert_eq!(error.category(), ErrorCategory::Structural, "{source}: {error}");
        }
    }
}
