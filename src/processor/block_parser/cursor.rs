//! Exclusively-owned position over the token list of one parse.

use crate::error::{TranslateError, TranslateResult};
use crate::processor::token::{Token, TokenKind};

pub struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.tokens.len());
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Line of the next token, or of the last one once the input is used up.
    pub fn line_index(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(0, Token::line_index)
    }

    pub fn peek_is_keyword(&self, offset: usize, word: &str) -> bool {
        self.peek_at(offset).is_some_and(|t| t.is_keyword(word))
    }

    pub fn peek_is_keyword_or_maybe(&self, offset: usize, word: &str) -> bool {
        self.peek_at(offset).is_some_and(|t| t.is_keyword_or_maybe(word))
    }

    /// Index (relative to the cursor) of the end of the current statement.
    pub fn statement_length(&self) -> usize {
        self.tokens[self.position..]
            .iter()
            .position(|t| t.is(TokenKind::EndOfStatement))
            .unwrap_or(self.tokens.len() - self.position)
    }

    /// The rest of the current statement, without consuming it.
    pub fn peek_statement(&self) -> &[Token] {
        let length = self.statement_length();
        &self.tokens[self.position..self.position + length]
    }

    /// Consume the rest of the current statement and its terminator.
    pub fn take_statement(&mut self) -> Vec<Token> {
        let length = self.statement_length();
        let statement = self.tokens[self.position..self.position + length].to_vec();
        self.position += length;
        self.skip_end_of_statement();
        statement
    }

    /// Consume everything up to and including the next line return; colon
    /// separators stay in the returned tokens.
    pub fn take_line(&mut self) -> Vec<Token> {
        let length = self.tokens[self.position..]
            .iter()
            .position(Token::is_new_line)
            .unwrap_or(self.tokens.len() - self.position);
        let line = self.tokens[self.position..self.position + length].to_vec();
        self.position += length;
        self.skip_end_of_statement();
        line
    }

    pub fn skip_end_of_statement(&mut self) {
        if self.peek().is_some_and(|t| t.is(TokenKind::EndOfStatement)) {
            self.position += 1;
        }
    }

    pub fn expect_keyword(&mut self, word: &str) -> TranslateResult<Token> {
        self.take_if(|t| t.is_keyword_or_maybe(word), &format!("'{word}'"))
    }

    pub fn expect_name(&mut self) -> TranslateResult<Token> {
        self.take_if(Token::is_name_like, "a name")
    }

    fn take_if(&mut self, accept: impl Fn(&Token) -> bool, expected: &str) -> TranslateResult<Token> {
        match self.peek() {
            Some(token) if accept(token) => {
                let token = token.clone();
                self.position += 1;
                Ok(token)
            }
            Some(token) => Err(TranslateError::syntax(
                token.line_number(),
                format!("expected {expected}, found '{}'", token.content()),
            )),
            None => Err(TranslateError::syntax(
                self.line_index() + 1,
                format!("expected {expected} before end of content"),
            )),
        }
    }

    /// The statement must be over: only a terminator (or nothing) may follow.
    pub fn expect_end_of_statement(&mut self) -> TranslateResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) if token.is(TokenKind::EndOfStatement) => {
                self.position += 1;
                Ok(())
            }
            Some(token) => Err(TranslateError::syntax(
                token.line_number(),
                format!("expected end of statement, found '{}'", token.content()),
            )),
        }
    }

    /// Case-insensitive match of `sequence` at the cursor. The first word
    /// must be an unambiguous keyword; later words may also be
    /// keyword-or-name tokens, so `End Property` matches while a statement
    /// starting with `property` never does.
    pub fn matches_sequence(&self, sequence: &[&str]) -> bool {
        sequence.iter().enumerate().all(|(offset, word)| {
            self.peek_at(offset).is_some_and(|token| {
                if offset == 0 {
                    token.is_keyword(word)
                } else {
                    token.is_keyword_or_maybe(word)
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(contents: &[&str]) -> TokenCursor {
        TokenCursor::new(contents.iter().map(|c| Token::atom(c, 0)).collect())
    }

    #[test]
    fn test_end_sequence_matching() {
        let test_cases = vec![
            (vec!["End", "Property"], true),
            (vec!["end", "PROPERTY"], true),
            (vec!["End", "Function"], false),
            (vec!["property", "="], false),
        ];
        for (contents, expected) in test_cases {
            let matched = cursor(&contents).matches_sequence(&["End", "Property"]);
            assert_eq!(matched, expected, "{contents:?}");
        }
    }

    #[test]
    fn test_take_statement_consumes_terminator() {
        let mut c = cursor(&["a", "=", "1", ":", "b"]);
        let statement = c.take_statement();
        assert_eq!(statement.len(), 3);
        assert_eq!(c.peek().map(Token::content), Some("b"));
    }
}
