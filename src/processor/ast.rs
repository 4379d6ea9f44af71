//! The structural program tree built by the block parser, and the
//! expression segments built by the expression generator.
//!
//! Every block owns its children; nothing points back up the tree.

use super::token::Token;

/// One bracket-free run of a call chain: `a.b.c` plus the arguments of an
/// immediately following bracketed call. Never empty, and never holds an
/// ambiguous member-accessor/decimal-point token.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSegment {
    pub member_access_tokens: Vec<Token>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionSegment {
    Call(CallSegment),
    /// String, numeric, date or built-in value literal.
    Value(Token),
    Operator(Token),
    /// A bracketed sub-expression that is not the argument list of a call.
    Bracketed(Box<Expression>),
    /// `New ClassName`
    NewInstance(Token),
}

/// Consecutive `Call` segments (with no operator between them) form one
/// member-access chain: `a(0).Test` is two segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub segments: Vec<ExpressionSegment>,
}

impl Expression {
    pub fn new(segments: Vec<ExpressionSegment>) -> Self {
        Self { segments }
    }

    pub fn line_index(&self) -> usize {
        self.segments.first().map_or(0, ExpressionSegment::line_index)
    }
}

impl ExpressionSegment {
    pub fn line_index(&self) -> usize {
        match self {
            Self::Call(call) => call
                .member_access_tokens
                .first()
                .map_or(0, Token::line_index),
            Self::Value(token) | Self::Operator(token) | Self::NewInstance(token) => token.line_index(),
            Self::Bracketed(inner) => inner.line_index(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: Token,
    /// `None` for a plain variable, `Some(vec![])` for `a()` and the bound
    /// expressions for `a(5, 2)`.
    pub dimensions: Option<Vec<Expression>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimKind {
    Dim,
    ReDim { preserve: bool },
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimStatement {
    pub kind: DimKind,
    pub variables: Vec<VariableDeclaration>,
    pub line_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPassing {
    ByRef,
    ByVal,
    /// No marker: VBScript passes by reference.
    Unspecified,
}

impl ParameterPassing {
    pub fn is_by_ref(self) -> bool {
        !matches!(self, Self::ByVal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub passing: ParameterPassing,
    pub name: Token,
    pub is_array: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Function,
    Sub,
    PropertyGet,
    PropertyLet,
    PropertySet,
}

impl FunctionKind {
    pub fn is_property(self) -> bool {
        matches!(self, Self::PropertyGet | Self::PropertyLet | Self::PropertySet)
    }

    pub fn returns_value(self) -> bool {
        matches!(self, Self::Function | Self::PropertyGet)
    }

    pub fn end_words(self) -> [&'static str; 2] {
        match self {
            Self::Function => ["End", "Function"],
            Self::Sub => ["End", "Sub"],
            _ => ["End", "Property"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBlock {
    pub kind: FunctionKind,
    pub name: Token,
    pub is_public: bool,
    pub is_default: bool,
    pub parameters: Vec<Parameter>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBlock {
    pub name: Token,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalClause {
    pub condition: Expression,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub clauses: Vec<ConditionalClause>,
    pub else_statements: Option<Vec<CodeBlock>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSettingKind {
    Let,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueSettingStatement {
    pub target: Expression,
    pub value: Expression,
    pub kind: ValueSettingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub expression: Expression,
    /// Written with the `Call` keyword.
    pub call_prefix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Do,
    For,
    Function,
    Sub,
    Property,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnErrorKind {
    ResumeNext,
    GotoZero,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopCondition {
    None,
    PreWhile(Expression),
    PreUntil(Expression),
    PostWhile(Expression),
    PostUntil(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCase {
    /// Empty for `Case Else`.
    pub values: Vec<Expression>,
    pub statements: Vec<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeBlock {
    BlankLine,
    Comment { content: String, inline: bool },
    OptionExplicit,
    Dim(DimStatement),
    Class(ClassBlock),
    /// Function or Sub.
    Function(FunctionBlock),
    /// Property Get/Let/Set; same shape as a function.
    Property(FunctionBlock),
    If(IfBlock),
    Statement(Statement),
    ValueSetting(ValueSettingStatement),
    Exit { kind: ExitKind, line_index: usize },
    Randomize { seed: Option<Expression>, line_index: usize },
    // Recognised so the tree is complete; translation reports them as
    // unsupported.
    Do {
        condition: LoopCondition,
        statements: Vec<CodeBlock>,
        line_index: usize,
    },
    While {
        condition: Expression,
        statements: Vec<CodeBlock>,
        line_index: usize,
    },
    For {
        loop_variable: Token,
        from: Expression,
        to: Expression,
        step: Option<Expression>,
        statements: Vec<CodeBlock>,
    },
    ForEach {
        loop_variable: Token,
        collection: Expression,
        statements: Vec<CodeBlock>,
    },
    Select {
        subject: Expression,
        cases: Vec<SelectCase>,
        line_index: usize,
    },
    OnError { kind: OnErrorKind, line_index: usize },
    With {
        target: Expression,
        statements: Vec<CodeBlock>,
        line_index: usize,
    },
}
