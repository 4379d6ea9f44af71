//! Tokens shared by every front-end pass.
//!
//! A token is an immutable value: kind, source text and the (0-based) line
//! it came from. Passes replace tokens, they never edit them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StringLiteral,
    DateLiteral,
    Comment,
    /// A comment that shares its line with code.
    InlineComment,
    /// Raw text between strings/comments, not yet broken into atoms.
    Unprocessed,
    Name,
    KeyWord,
    /// Words such as "Property" that are keywords in some positions and
    /// legal identifiers in others.
    MayBeKeywordOrName,
    Operator,
    ComparisonOperator,
    LogicalOperator,
    BuiltInValue,
    NumericValue,
    MemberAccessorOrDecimalPoint,
    MemberAccessor,
    OpenBrace,
    CloseBrace,
    ArgumentSeparator,
    EndOfStatement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    content: String,
    line_index: usize,
}

const KEYWORDS: &[&str] = &[
    "byref", "byval", "call", "case", "class", "const", "dim", "do", "each", "else", "elseif",
    "end", "erase", "exit", "for", "function", "goto", "if", "in", "let", "loop", "new", "next",
    "on", "option", "preserve", "private", "public", "randomize", "redim", "rem", "resume",
    "select", "set", "sub", "then", "to", "until", "wend", "while", "with",
];

const MAY_BE_KEYWORD_OR_NAME: &[&str] = &["property", "default", "error", "explicit", "step", "get"];

const OPERATORS: &[&str] = &["+", "-", "*", "/", "\\", "^", "&", "mod"];

const COMPARISON_OPERATORS: &[&str] = &["=", "<", ">", "<=", ">=", "<>", "is"];

const LOGICAL_OPERATORS: &[&str] = &["and", "or", "not", "xor", "eqv", "imp"];

const BUILT_IN_VALUES: &[&str] = &["true", "false", "empty", "nothing", "null"];

/// Digits, optionally followed by an exponent marker and more digits. The
/// sign of `1E-5` arrives as its own atom, so `1E` alone also counts.
fn is_numeric_atom(content: &str) -> bool {
    let (mantissa, exponent) = match content.find(['e', 'E']) {
        Some(idx) => (&content[..idx], &content[idx + 1..]),
        None => (content, ""),
    };
    !mantissa.is_empty()
        && mantissa.chars().all(|c| c.is_ascii_digit())
        && exponent.chars().all(|c| c.is_ascii_digit())
}

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>, line_index: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line_index,
        }
    }

    /// Classify a single atom produced by the token breaker.
    pub fn atom(content: &str, line_index: usize) -> Self {
        let lower = content.to_ascii_lowercase();
        let kind = match content {
            "," => TokenKind::ArgumentSeparator,
            "." => TokenKind::MemberAccessorOrDecimalPoint,
            "(" => TokenKind::OpenBrace,
            ")" => TokenKind::CloseBrace,
            ":" | "\n" => TokenKind::EndOfStatement,
            _ if content.starts_with('[') => TokenKind::Name,
            _ if OPERATORS.contains(&lower.as_str()) => TokenKind::Operator,
            _ if COMPARISON_OPERATORS.contains(&lower.as_str()) => TokenKind::ComparisonOperator,
            _ if LOGICAL_OPERATORS.contains(&lower.as_str()) => TokenKind::LogicalOperator,
            _ if BUILT_IN_VALUES.contains(&lower.as_str()) => TokenKind::BuiltInValue,
            _ if KEYWORDS.contains(&lower.as_str()) => TokenKind::KeyWord,
            _ if MAY_BE_KEYWORD_OR_NAME.contains(&lower.as_str()) => TokenKind::MayBeKeywordOrName,
            _ if is_numeric_atom(content) => TokenKind::NumericValue,
            _ => TokenKind::Name,
        };
        Self::new(kind, content, line_index)
    }

    pub fn end_of_statement(content: &str, line_index: usize) -> Self {
        Self::new(TokenKind::EndOfStatement, content, line_index)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    /// 1-based line, as reported in errors and warnings.
    pub fn line_number(&self) -> usize {
        self.line_index + 1
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Case-insensitive content comparison.
    pub fn is_content(&self, content: &str) -> bool {
        self.content.eq_ignore_ascii_case(content)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::KeyWord && self.is_content(word)
    }

    /// Keyword test that also accepts the context-dependent words.
    pub fn is_keyword_or_maybe(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::KeyWord | TokenKind::MayBeKeywordOrName) && self.is_content(word)
    }

    pub fn is_any_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Operator | TokenKind::ComparisonOperator | TokenKind::LogicalOperator
        )
    }

    /// Only an opening bracket, an operator, an argument separator, a keyword
    /// or the start of a statement may be followed by a sign or a leading
    /// decimal point that belongs to a literal.
    pub fn could_precede_decimal_point_or_negative_sign(&self) -> bool {
        self.is_any_operator()
            || matches!(
                self.kind,
                TokenKind::OpenBrace
                    | TokenKind::ArgumentSeparator
                    | TokenKind::EndOfStatement
                    | TokenKind::KeyWord
            )
    }

    pub fn is_new_line(&self) -> bool {
        self.kind == TokenKind::EndOfStatement && self.content == "\n"
    }

    /// Tokens that may name a variable, function or member.
    pub fn is_name_like(&self) -> bool {
        matches!(self.kind, TokenKind::Name | TokenKind::MayBeKeywordOrName)
    }

    pub fn numeric_value(&self) -> Option<f64> {
        match self.kind {
            TokenKind::NumericValue => self.content.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_classification() {
        let test_cases = vec![
            ("Dim", TokenKind::KeyWord),
            ("PROPERTY", TokenKind::MayBeKeywordOrName),
            ("mod", TokenKind::Operator),
            ("<>", TokenKind::ComparisonOperator),
            ("Is", TokenKind::ComparisonOperator),
            ("Xor", TokenKind::LogicalOperator),
            ("Nothing", TokenKind::BuiltInValue),
            ("123", TokenKind::NumericValue),
            ("a1", TokenKind::Name),
            ("1E5", TokenKind::NumericValue),
            ("5e", TokenKind::NumericValue),
            ("E5", TokenKind::Name),
            ("1E5x", TokenKind::Name),
            ("[my var]", TokenKind::Name),
            (".", TokenKind::MemberAccessorOrDecimalPoint),
            (":", TokenKind::EndOfStatement),
        ];

        for (content, expected) in test_cases {
            assert_eq!(Token::atom(content, 0).kind(), expected, "{content}");
        }
    }
}
