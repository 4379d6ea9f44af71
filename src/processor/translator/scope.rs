//! What a name means at a given point of the program.
//!
//! Each scope-altering construct (program, class, function) gets its own
//! `ScopeAccessInformation`, built by scanning its body up front so that a
//! `Dim` later in the body still counts as a declaration. Child scopes
//! borrow their parent; nothing here is mutated once built.
//!
//! Inside a class the outermost program is reached through the `_outer`
//! reference every generated class holds, so names resolved there come back
//! qualified.

use std::collections::{HashMap, HashSet};

use super::names;
use crate::processor::ast::{ClassBlock, CodeBlock, DimKind, FunctionBlock, FunctionKind};
use crate::processor::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Outermost,
    Class,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub kind: FunctionKind,
    /// One flag per parameter.
    pub by_ref: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    This,
    Variable(String),
    /// The enclosing function's own name, used as an assignment target.
    ReturnValue(String),
    Function {
        name: String,
        signature: FunctionSignature,
    },
    /// A property of the enclosing class, reached through `this`.
    ClassProperty,
    Class(String),
    External(String),
    BuiltInFunction(&'static str),
    BuiltInConstant(&'static str),
    ErrObject,
    Undeclared(String),
}

const OUTER: &str = "_outer";

#[derive(Debug, Default)]
struct Declarations {
    variables: HashSet<String>,
    /// `ReDim` targets; they only declare a variable if no enclosing scope
    /// already has one of that name.
    redimmed: HashSet<String>,
    functions: HashMap<String, FunctionSignature>,
    properties: HashSet<String>,
    classes: HashSet<String>,
}

impl Declarations {
    fn scan(blocks: &[CodeBlock]) -> Self {
        let mut declarations = Self::default();
        declarations.collect(blocks);
        declarations
    }

    /// Walk the blocks that share this scope; function and class bodies
    /// are separate scopes and are not entered.
    fn collect(&mut self, blocks: &[CodeBlock]) {
        for block in blocks {
            match block {
                CodeBlock::Dim(dim) => {
                    let target = match dim.kind {
                        DimKind::ReDim { .. } => &mut self.redimmed,
                        _ => &mut self.variables,
                    };
                    for variable in &dim.variables {
                        target.insert(names::key(&variable.name));
                    }
                }
                CodeBlock::Function(function) => {
                    self.functions
                        .insert(names::key(&function.name), signature_of(function));
                }
                CodeBlock::Property(property) => {
                    self.properties.insert(names::key(&property.name));
                }
                CodeBlock::Class(class) => {
                    self.classes.insert(names::key(&class.name));
                }
                CodeBlock::If(if_block) => {
                    for clause in &if_block.clauses {
                        self.collect(&clause.statements);
                    }
                    if let Some(else_statements) = &if_block.else_statements {
                        self.collect(else_statements);
                    }
                }
                CodeBlock::Do { statements, .. }
                | CodeBlock::While { statements, .. }
                | CodeBlock::For { statements, .. }
                | CodeBlock::ForEach { statements, .. }
                | CodeBlock::With { statements, .. } => self.collect(statements),
                CodeBlock::Select { cases, .. } => {
                    for case in cases {
                        self.collect(&case.statements);
                    }
                }
                _ => {}
            }
        }
    }
}

fn signature_of(function: &FunctionBlock) -> FunctionSignature {
    FunctionSignature {
        kind: function.kind,
        by_ref: function
            .parameters
            .iter()
            .map(|p| p.passing.is_by_ref())
            .collect(),
    }
}

#[derive(Debug)]
pub struct ScopeAccessInformation<'a> {
    parent: Option<&'a ScopeAccessInformation<'a>>,
    kind: ScopeKind,
    declarations: Declarations,
    external_references: HashSet<String>,
    /// Key of the function owning this scope and its return value name.
    return_value: Option<(String, String)>,
}

impl<'a> ScopeAccessInformation<'a> {
    pub fn outermost(blocks: &[CodeBlock], external_references: &[String]) -> Self {
        let mut declarations = Declarations::scan(blocks);
        let redimmed = std::mem::take(&mut declarations.redimmed);
        declarations.variables.extend(redimmed);
        Self {
            parent: None,
            kind: ScopeKind::Outermost,
            declarations,
            external_references: external_references.iter().map(|r| names::key_of(r)).collect(),
            return_value: None,
        }
    }

    pub fn for_class(&'a self, class: &ClassBlock) -> Self {
        let mut declarations = Declarations::scan(&class.statements);
        let redimmed = std::mem::take(&mut declarations.redimmed);
        declarations.variables.extend(redimmed);
        Self {
            parent: Some(self),
            kind: ScopeKind::Class,
            declarations,
            external_references: HashSet::new(),
            return_value: None,
        }
    }

    pub fn for_function(&'a self, function: &FunctionBlock, return_value: Option<String>) -> Self {
        let mut declarations = Declarations::scan(&function.statements);
        for parameter in &function.parameters {
            declarations.variables.insert(names::key(&parameter.name));
        }
        for key in std::mem::take(&mut declarations.redimmed) {
            if !self.has_variable(&key) {
                declarations.variables.insert(key);
            }
        }
        Self {
            parent: Some(self),
            kind: ScopeKind::Function,
            declarations,
            external_references: HashSet::new(),
            return_value: return_value.map(|name| (names::key(&function.name), name)),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Return value variable of the nearest enclosing function, if it has one.
    pub fn return_value_name(&self) -> Option<&str> {
        self.ancestors()
            .find(|s| s.kind == ScopeKind::Function)
            .and_then(|s| s.return_value.as_ref())
            .map(|(_, name)| name.as_str())
    }

    fn ancestors(&self) -> impl Iterator<Item = &ScopeAccessInformation<'a>> {
        std::iter::successors(Some(self), |s| s.parent)
    }

    fn has_variable(&self, key: &str) -> bool {
        self.ancestors().any(|s| s.declarations.variables.contains(key))
    }

    /// Whether this very scope (not a parent) declares the variable.
    pub fn declares_locally(&self, token: &Token) -> bool {
        self.declarations.variables.contains(&names::key(token))
    }

    /// Whether the program defines any class, which moves the outermost
    /// scope into a class of its own.
    pub fn defines_classes(&self) -> bool {
        self.ancestors()
            .last()
            .is_some_and(|root| !root.declarations.classes.is_empty())
    }

    fn is_within_class(&self) -> bool {
        self.ancestors().any(|s| s.kind == ScopeKind::Class)
    }

    /// Prefix a name that lives in the outermost scope when it is reached
    /// from inside a class.
    fn qualify(&self, scope: &ScopeAccessInformation<'_>, name: String) -> String {
        if scope.kind == ScopeKind::Outermost && self.is_within_class() {
            format!("{OUTER}.{name}")
        } else {
            name
        }
    }

    /// What `New C` passes as the outermost reference from here.
    pub fn outer_reference(&self) -> &'static str {
        if self.is_within_class() { OUTER } else { "this" }
    }

    pub fn resolve(&self, token: &Token) -> NameResolution {
        let key = names::key(token);
        if key == "me" {
            return NameResolution::This;
        }

        for scope in self.ancestors() {
            let declarations = &scope.declarations;
            if declarations.variables.contains(&key) {
                return NameResolution::Variable(self.qualify(scope, names::rewrite_token(token)));
            }
            if let Some(signature) = declarations.functions.get(&key) {
                return NameResolution::Function {
                    name: self.qualify(scope, names::rewrite_token(token)),
                    signature: signature.clone(),
                };
            }
            if declarations.properties.contains(&key) {
                return NameResolution::ClassProperty;
            }
            if declarations.classes.contains(&key) {
                return NameResolution::Class(names::rewrite_token(token));
            }
            if scope.external_references.contains(&key) {
                return NameResolution::External(names::rewrite_token(token));
            }
        }

        if let Some(function) = names::built_in_function(&key) {
            return NameResolution::BuiltInFunction(function);
        }
        if let Some(constant) = names::built_in_constant(&key) {
            return NameResolution::BuiltInConstant(constant);
        }
        if key == "err" {
            return NameResolution::ErrObject;
        }
        // Undeclared names end up declared at the outermost scope.
        let root = self.ancestors().last().unwrap_or(self);
        NameResolution::Undeclared(self.qualify(root, names::rewrite_token(token)))
    }

    /// Like `resolve`, except that the enclosing function's own name means
    /// its return value.
    pub fn resolve_assignment_target(&self, token: &Token) -> NameResolution {
        let key = names::key(token);
        let own_return_value = self
            .ancestors()
            .find(|s| s.kind == ScopeKind::Function)
            .and_then(|s| s.return_value.as_ref())
            .filter(|(function_key, _)| *function_key == key);
        match own_return_value {
            Some((_, name)) => NameResolution::ReturnValue(name.clone()),
            None => self.resolve(token),
        }
    }

    pub fn is_known_class(&self, token: &Token) -> bool {
        matches!(self.resolve(token), NameResolution::Class(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{block_parser, lexer, number_rebuilder, operator_combiner};

    fn blocks(src: &str) -> Vec<CodeBlock> {
        let tokens = lexer::tokenise(src).unwrap();
        let tokens = operator_combiner::combine(number_rebuilder::rebuild(tokens).unwrap());
        block_parser::parse(tokens).unwrap()
    }

    fn name(content: &str) -> Token {
        Token::atom(content, 0)
    }

    #[test]
    fn test_outermost_resolution() {
        let program = blocks("x = 1\nIf x Then\n  Dim a\nEnd If\nFunction F(ByVal p, q)\nEnd Function\nClass C\nEnd Class");
        let scope = ScopeAccessInformation::outermost(&program, &["WScript".to_string()]);

        let test_cases = vec![
            ("A", NameResolution::Variable("a".to_string())),
            ("x", NameResolution::Undeclared("x".to_string())),
            ("c", NameResolution::Class("c".to_string())),
            ("wscript", NameResolution::External("wscript".to_string())),
            ("Len", NameResolution::BuiltInFunction("Len")),
            ("vbTab", NameResolution::BuiltInConstant("vbTab")),
            ("Me", NameResolution::This),
        ];
        for (content, expected) in test_cases {
            assert_eq!(scope.resolve(&name(content)), expected, "{content}");
        }

        let NameResolution::Function { signature, .. } = scope.resolve(&name("f")) else {
            panic!("expected a function");
        };
        assert_eq!(signature.by_ref, vec![false, true]);
    }

    #[test]
    fn test_function_scope() {
        let program = blocks("Function F(p)\n  Dim local\nEnd Function");
        let outer = ScopeAccessInformation::outermost(&program, &[]);
        let CodeBlock::Function(function) = &program[0] else {
            panic!("expected a function");
        };
        let inner = outer.for_function(function, Some("retVal1".to_string()));

        assert_eq!(inner.resolve(&name("local")), NameResolution::Variable("local".to_string()));
        assert_eq!(inner.resolve(&name("P")), NameResolution::Variable("p".to_string()));
        assert_eq!(
            inner.resolve_assignment_target(&name("f")),
            NameResolution::ReturnValue("retVal1".to_string())
        );
        assert!(matches!(inner.resolve(&name("f")), NameResolution::Function { .. }));
        assert_eq!(outer.resolve(&name("local")), NameResolution::Undeclared("local".to_string()));
        assert_eq!(inner.return_value_name(), Some("retVal1"));
    }

    fn first_function(blocks: &[CodeBlock]) -> &FunctionBlock {
        blocks
            .iter()
            .find_map(|b| match b {
                CodeBlock::Function(f) => Some(f),
                _ => None,
            })
            .expect("a function")
    }

    #[test]
    fn test_redim_reuses_visible_variables() {
        let program = blocks("Dim a\nSub S()\n  ReDim a(3)\n  ReDim b(2)\nEnd Sub\nReDim c(1)");
        let outer = ScopeAccessInformation::outermost(&program, &[]);
        let inner = outer.for_function(first_function(&program), None);

        assert!(!inner.declares_locally(&name("a")));
        assert_eq!(inner.resolve(&name("a")), NameResolution::Variable("a".to_string()));
        assert!(inner.declares_locally(&name("B")));
        assert_eq!(outer.resolve(&name("b")), NameResolution::Undeclared("b".to_string()));
        assert!(outer.declares_locally(&name("c")));
    }

    #[test]
    fn test_outermost_names_are_qualified_inside_classes() {
        let program = blocks("Dim g\nFunction H()\nEnd Function\nClass C\n  Private m\n  Sub M()\n  End Sub\nEnd Class");
        let outer = ScopeAccessInformation::outermost(&program, &[]);
        assert!(outer.defines_classes());
        let class = program
            .iter()
            .find_map(|b| match b {
                CodeBlock::Class(c) => Some(c),
                _ => None,
            })
            .expect("a class");
        let class_scope = outer.for_class(class);
        let method = class_scope.for_function(first_function(&class.statements), None);

        assert_eq!(method.resolve(&name("G")), NameResolution::Variable("_outer.g".to_string()));
        assert_eq!(method.resolve(&name("m")), NameResolution::Variable("m".to_string()));
        assert_eq!(method.resolve(&name("x")), NameResolution::Undeclared("_outer.x".to_string()));
        let NameResolution::Function { name: h, .. } = method.resolve(&name("h")) else {
            panic!("expected a function");
        };
        assert_eq!(h, "_outer.h");
        assert_eq!(method.outer_reference(), "_outer");

        assert_eq!(outer.resolve(&name("g")), NameResolution::Variable("g".to_string()));
        assert_eq!(outer.resolve(&name("x")), NameResolution::Undeclared("x".to_string()));
        assert_eq!(outer.outer_reference(), "this");
    }
}
