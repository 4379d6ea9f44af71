//! Hand-written lexer for VBScript source.
//!
//! Two passes run here:
//!
//!   * `segment` splits the raw text into string literals, date literals,
//!     comments and `Unprocessed` runs of everything else, respecting the
//!     `""` escape and the `'` / `Rem` comment rules.
//!   * `break_unprocessed` breaks each unprocessed run into atoms on
//!     whitespace and on the break characters, swallowing `_` line
//!     continuations.
//!
//! No numbers are assembled here; `1.5` comes out as `1`, `.`, `5` and is
//! fused again by the number rebuilder.

use std::iter::Peekable;
use std::str::Chars;

use super::token::{Token, TokenKind};
use crate::error::{TranslateError, TranslateResult};

const BREAK_CHARS: &[char] = &[
    ',', '.', '*', '&', '+', '-', '=', '!', '(', ')', '{', '}', '[', ']', ':', ';', '/', '\\', '^',
    '<', '>',
];

/// Segment and break `src` into atom-level tokens.
pub fn tokenise(src: &str) -> TranslateResult<Vec<Token>> {
    let mut tokens = Vec::new();
    for token in segment(src)? {
        if token.is(TokenKind::Unprocessed) {
            tokens.extend(break_unprocessed(&token)?);
        } else {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

pub fn segment(src: &str) -> TranslateResult<Vec<Token>> {
    let mut segmenter = Segmenter::new(src);
    segmenter.run()?;
    Ok(segmenter.tokens)
}

struct Segmenter<'a> {
    chars: Peekable<Chars<'a>>,
    line_index: usize,
    tokens: Vec<Token>,
    raw: String,
    raw_line_index: usize,
}

impl<'a> Segmenter<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line_index: 0,
            tokens: Vec::new(),
            raw: String::new(),
            raw_line_index: 0,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn run(&mut self) -> TranslateResult<()> {
        while let Some(c) = self.next_char() {
            match c {
                '"' => {
                    self.flush_raw();
                    let text = self.read_string()?;
                    self.tokens
                        .push(Token::new(TokenKind::StringLiteral, text, self.line_index));
                }
                '#' => {
                    self.flush_raw();
                    let text = self.read_date()?;
                    self.tokens
                        .push(Token::new(TokenKind::DateLiteral, text, self.line_index));
                }
                '\'' => self.read_comment(),
                'r' | 'R' if self.at_statement_start() && self.rem_follows() => {
                    self.next_char();
                    self.next_char();
                    self.read_comment();
                }
                '\n' => {
                    self.push_raw(c);
                    self.line_index += 1;
                }
                c => self.push_raw(c),
            }
        }
        self.flush_raw();
        Ok(())
    }

    fn push_raw(&mut self, c: char) {
        if self.raw.is_empty() {
            self.raw_line_index = self.line_index;
        }
        self.raw.push(c);
    }

    fn flush_raw(&mut self) {
        if self.raw.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.raw);
        self.tokens
            .push(Token::new(TokenKind::Unprocessed, raw, self.raw_line_index));
    }

    /// The raw buffer holds nothing but whitespace since the last statement
    /// boundary.
    fn at_statement_start(&self) -> bool {
        let trimmed = self.raw.trim_end_matches([' ', '\t']);
        if trimmed.is_empty() {
            return !matches!(
                self.tokens.last().map(Token::kind),
                Some(TokenKind::StringLiteral | TokenKind::DateLiteral)
            );
        }
        trimmed.ends_with('\n') || trimmed.ends_with(':')
    }

    fn rem_follows(&self) -> bool {
        let mut lookahead = self.chars.clone();
        let e = lookahead.next();
        let m = lookahead.next();
        let after = lookahead.next();
        matches!(e, Some('e' | 'E'))
            && matches!(m, Some('m' | 'M'))
            && after.is_none_or(|c| c.is_whitespace())
    }

    fn read_string(&mut self) -> TranslateResult<String> {
        let mut txt = String::new();
        loop {
            match self.next_char() {
                Some('"') => {
                    if self.peek_char() == Some('"') {
                        self.next_char();
                        txt.push('"');
                    } else {
                        return Ok(txt);
                    }
                }
                Some('\n') | None => {
                    return Err(TranslateError::UnterminatedString {
                        line: self.line_index + 1,
                    });
                }
                Some(c) => txt.push(c),
            }
        }
    }

    fn read_date(&mut self) -> TranslateResult<String> {
        let mut txt = String::new();
        loop {
            match self.next_char() {
                Some('#') => return Ok(txt),
                Some('\n') | None => {
                    return Err(TranslateError::UnterminatedDateLiteral {
                        line: self.line_index + 1,
                    });
                }
                Some(c) => txt.push(c),
            }
        }
    }

    /// Read a comment up to (not including) the line return. If code shares
    /// the line, the comment is inline and an end-of-statement is put in
    /// front of it so the preceding statement is terminated.
    fn read_comment(&mut self) {
        let trimmed_len = self.raw.trim_end_matches([' ', '\t']).len();
        self.raw.truncate(trimmed_len);

        let line_tail = match self.raw.rfind('\n') {
            Some(idx) => &self.raw[idx + 1..],
            None => self.raw.as_str(),
        };
        let code_before_on_line = !line_tail.trim().is_empty();
        let follows_literal = self.raw.is_empty()
            && matches!(
                self.tokens.last().map(Token::kind),
                Some(TokenKind::StringLiteral | TokenKind::DateLiteral)
            );
        let inline = code_before_on_line || follows_literal;
        let needs_terminator = inline && !line_tail.ends_with(':');

        self.flush_raw();
        if needs_terminator {
            self.tokens.push(Token::end_of_statement("\n", self.line_index));
        }

        let mut content = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            content.push(c);
            self.next_char();
        }
        let content = content.trim_end_matches('\r').to_string();
        let kind = if inline {
            TokenKind::InlineComment
        } else {
            TokenKind::Comment
        };
        self.tokens.push(Token::new(kind, content, self.line_index));
    }
}

/// Break one `Unprocessed` token into atoms.
pub fn break_unprocessed(token: &Token) -> TranslateResult<Vec<Token>> {
    let mut out = Vec::new();
    let mut line_index = token.line_index();
    let mut atom = String::new();
    let mut chars = token.content().chars().peekable();

    fn flush(atom: &mut String, line_index: usize, out: &mut Vec<Token>) {
        if !atom.is_empty() {
            out.push(Token::atom(atom, line_index));
            atom.clear();
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                flush(&mut atom, line_index, &mut out);
                out.push(Token::end_of_statement("\n", line_index));
                line_index += 1;
            }
            c if c.is_whitespace() => flush(&mut atom, line_index, &mut out),
            '_' if atom.is_empty() && chars.peek().is_none_or(|n| n.is_whitespace()) => {
                // Line continuation: only spaces may sit between it and the
                // line return, and both disappear.
                while chars.peek().is_some_and(|n| *n != '\n' && n.is_whitespace()) {
                    chars.next();
                }
                if chars.next() != Some('\n') {
                    return Err(TranslateError::InvalidLineContinuation {
                        line: line_index + 1,
                    });
                }
                line_index += 1;
            }
            '[' if atom.is_empty() => {
                let mut name = String::from("[");
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some('\n') | None => {
                            return Err(TranslateError::syntax(
                                line_index + 1,
                                "unterminated escaped name",
                            ));
                        }
                        Some(n) => name.push(n),
                    }
                }
                name.push(']');
                out.push(Token::new(TokenKind::Name, name, line_index));
            }
            '&' if atom.is_empty() && hex_literal_follows(&chars) => {
                chars.next();
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_hexdigit) {
                    digits.push(d);
                    chars.next();
                }
                let value = i64::from_str_radix(&digits, 16).map_err(|_| {
                    TranslateError::syntax(line_index + 1, format!("invalid hex literal &H{digits}"))
                })?;
                out.push(Token::new(TokenKind::NumericValue, value.to_string(), line_index));
            }
            c if BREAK_CHARS.contains(&c) => {
                flush(&mut atom, line_index, &mut out);
                out.push(Token::atom(&c.to_string(), line_index));
            }
            c => atom.push(c),
        }
    }
    flush(&mut atom, line_index, &mut out);
    Ok(out)
}

fn hex_literal_follows(chars: &Peekable<Chars<'_>>) -> bool {
    let mut lookahead = chars.clone();
    matches!(lookahead.next(), Some('h' | 'H')) && lookahead.next().is_some_and(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(tokens: &[Token]) -> Vec<(TokenKind, String)> {
        tokens
            .iter()
            .map(|t| (t.kind(), t.content().to_string()))
            .collect()
    }

    #[test]
    fn test_segmentation() {
        let test_cases = vec![
            (
                "a = \"Hello \"\"world\"\"\"",
                vec![
                    (TokenKind::Unprocessed, "a = ".to_string()),
                    (TokenKind::StringLiteral, "Hello \"world\"".to_string()),
                ],
            ),
            (
                "' Top\na = 1 ' trailing",
                vec![
                    (TokenKind::Comment, " Top".to_string()),
                    (TokenKind::Unprocessed, "\na = 1".to_string()),
                    (TokenKind::EndOfStatement, "\n".to_string()),
                    (TokenKind::InlineComment, " trailing".to_string()),
                ],
            ),
            (
                "x = \"a\" ' c",
                vec![
                    (TokenKind::Unprocessed, "x = ".to_string()),
                    (TokenKind::StringLiteral, "a".to_string()),
                    (TokenKind::EndOfStatement, "\n".to_string()),
                    (TokenKind::InlineComment, " c".to_string()),
                ],
            ),
            (
                "Rem old style\nd = #2020-01-31#",
                vec![
                    (TokenKind::Comment, " old style".to_string()),
                    (TokenKind::Unprocessed, "\nd = ".to_string()),
                    (TokenKind::DateLiteral, "2020-01-31".to_string()),
                ],
            ),
        ];

        for (src, expected) in test_cases {
            let tokens = segment(src).unwrap();
            assert_eq!(describe(&tokens), expected, "{src:?}");
        }
    }

    #[test]
    fn test_remark_is_not_confused_with_names() {
        let tokens = tokenise("remaining = 1").unwrap();
        assert_eq!(tokens[0].content(), "remaining");
        assert!(tokens[0].is(TokenKind::Name));
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let result = segment("a = \"abc\nb = 1");
        assert_eq!(result, Err(TranslateError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn test_breaking() {
        let tokens = tokenise("WScript.Echo a(1)+my_var").unwrap();
        let contents: Vec<&str> = tokens.iter().map(Token::content).collect();
        assert_eq!(
            contents,
            vec!["WScript", ".", "Echo", "a", "(", "1", ")", "+", "my_var"]
        );
    }

    #[test]
    fn test_line_continuation() {
        let tokens = tokenise("a = 1 + _  \n  2").unwrap();
        let contents: Vec<&str> = tokens.iter().map(Token::content).collect();
        assert_eq!(contents, vec!["a", "=", "1", "+", "2"]);
        assert_eq!(tokens[4].line_index(), 1);
    }

    #[test]
    fn test_invalid_line_continuation() {
        assert_eq!(
            tokenise("a = 1 _ + 2"),
            Err(TranslateError::InvalidLineContinuation { line: 1 })
        );
    }

    #[test]
    fn test_escaped_names_and_hex() {
        let tokens = tokenise("[my var] = &HFF").unwrap();
        assert_eq!(tokens[0].content(), "[my var]");
        assert!(tokens[0].is(TokenKind::Name));
        assert_eq!(tokens[2].numeric_value(), Some(255.0));
    }
}
