//! Re-fuses numeric literals that the token breaker split apart.
//!
//! The breaker turns `-1.5` into `-`, `1`, `.`, `5` because it cannot tell a
//! decimal point from a member accessor, or a sign from a subtraction,
//! without looking at the neighbours. This pass walks the tokens with a small
//! state machine and replaces every number-like run with one numeric token.
//! Whatever ambiguous `.` tokens remain afterwards are member accessors.
//! Exponent signs are split off the same way: `1.5E-3` arrives as `1`, `.`,
//! `5E`, `-`, `3`.

use tracing::debug;

use super::token::{Token, TokenKind};
use crate::error::{TranslateError, TranslateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PeriodOrMinusOrNumberCouldStart,
    NumberCouldNotStart,
    GotMinusSign,
    GotIntegerContent,
    GotDecimalContent,
    /// The last digits ended in `E` and still need a signed exponent.
    GotExponentMarker,
    GotExponentSign,
}

/// Tokens being considered as a single numeric literal.
#[derive(Debug, Default)]
struct PartialNumberContent {
    tokens: Vec<Token>,
}

impl PartialNumberContent {
    fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn has_digits(&self) -> bool {
        self.tokens.iter().any(|t| t.is(TokenKind::NumericValue))
    }

    fn has_decimal_point(&self) -> bool {
        self.tokens.iter().any(|t| {
            t.is(TokenKind::MemberAccessorOrDecimalPoint)
                || (t.is(TokenKind::NumericValue) && t.content().contains('.'))
        })
    }

    fn take(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.tokens)
    }
}

struct NumberRebuilder {
    out: Vec<Token>,
    partial: PartialNumberContent,
    state: State,
}

pub fn rebuild(tokens: Vec<Token>) -> TranslateResult<Vec<Token>> {
    let mut rebuilder = NumberRebuilder {
        out: Vec::with_capacity(tokens.len()),
        partial: PartialNumberContent::default(),
        state: State::PeriodOrMinusOrNumberCouldStart,
    };
    for token in tokens {
        rebuilder.process(token)?;
    }
    rebuilder.finish()
}

impl NumberRebuilder {
    fn process(&mut self, token: Token) -> TranslateResult<()> {
        match self.state {
            State::PeriodOrMinusOrNumberCouldStart | State::NumberCouldNotStart => {
                self.default_processor(token);
                Ok(())
            }
            State::GotMinusSign => self.got_minus_sign(token),
            State::GotIntegerContent => self.got_integer_content(token),
            State::GotDecimalContent => self.got_decimal_content(token),
            State::GotExponentMarker => self.got_exponent_marker(token),
            State::GotExponentSign => self.got_exponent_sign(token),
        }
    }

    fn default_processor(&mut self, token: Token) {
        let could_start = self.state == State::PeriodOrMinusOrNumberCouldStart;
        if token.is(TokenKind::NumericValue) {
            self.state = digits_state(&token);
            self.partial.push(token);
        } else if could_start && is_minus_sign(&token) {
            self.state = State::GotMinusSign;
            self.partial.push(token);
        } else if could_start && token.is(TokenKind::MemberAccessorOrDecimalPoint) {
            self.state = State::GotDecimalContent;
            self.partial.push(token);
        } else {
            self.state = next_state_after(&token);
            self.out.push(token);
        }
    }

    fn got_minus_sign(&mut self, token: Token) -> TranslateResult<()> {
        let already_signed = token.is(TokenKind::NumericValue) && token.content().starts_with('-');
        if token.is(TokenKind::NumericValue) && !already_signed {
            self.state = digits_state(&token);
            self.partial.push(token);
            return Ok(());
        }
        if token.is(TokenKind::MemberAccessorOrDecimalPoint) {
            self.state = State::GotDecimalContent;
            self.partial.push(token);
            return Ok(());
        }
        // The minus was an operator after all.
        self.reset();
        self.default_processor(token);
        Ok(())
    }

    fn got_integer_content(&mut self, token: Token) -> TranslateResult<()> {
        if token.is(TokenKind::MemberAccessorOrDecimalPoint) {
            if self.partial.has_decimal_point() {
                return Err(two_decimal_points(&self.partial, &token));
            }
            self.state = State::GotDecimalContent;
            self.partial.push(token);
            return Ok(());
        }
        self.finalise()?;
        self.default_processor(token);
        Ok(())
    }

    fn got_decimal_content(&mut self, token: Token) -> TranslateResult<()> {
        if token.is(TokenKind::MemberAccessorOrDecimalPoint) {
            return Err(two_decimal_points(&self.partial, &token));
        }
        if token.is(TokenKind::NumericValue) && !token.content().contains(['.', '-']) {
            let state = digits_state(&token);
            self.partial.push(token);
            if state == State::GotExponentMarker {
                self.state = state;
                return Ok(());
            }
            self.finalise()?;
            return Ok(());
        }
        if !self.partial.has_digits() {
            // A lone "." (or "-.") not followed by digits is not a number.
            self.reset();
            self.default_processor(token);
            return Ok(());
        }
        self.finalise()?;
        self.default_processor(token);
        Ok(())
    }

    fn got_exponent_marker(&mut self, token: Token) -> TranslateResult<()> {
        if token.is(TokenKind::Operator) && matches!(token.content(), "-" | "+") {
            self.state = State::GotExponentSign;
            self.partial.push(token);
            return Ok(());
        }
        Err(incomplete_number(&self.partial, &token))
    }

    fn got_exponent_sign(&mut self, token: Token) -> TranslateResult<()> {
        if token.is(TokenKind::NumericValue) && token.content().chars().all(|c| c.is_ascii_digit()) {
            self.partial.push(token);
            return self.finalise();
        }
        Err(incomplete_number(&self.partial, &token))
    }

    /// Flush the accumulated tokens verbatim.
    fn reset(&mut self) {
        let tokens = self.partial.take();
        self.state = tokens
            .last()
            .map_or(State::PeriodOrMinusOrNumberCouldStart, next_state_after);
        self.out.extend(tokens);
    }

    /// Replace the accumulated tokens with one numeric token.
    fn finalise(&mut self) -> TranslateResult<()> {
        let tokens = self.partial.take();
        let Some(first) = tokens.first() else {
            return Ok(());
        };
        let content: String = tokens.iter().map(Token::content).collect();
        let numeric = try_to_express_number_from_tokens(&content, first.line_index())?;
        self.out.push(numeric);
        self.state = State::NumberCouldNotStart;
        Ok(())
    }

    fn finish(mut self) -> TranslateResult<Vec<Token>> {
        if matches!(self.state, State::GotExponentMarker | State::GotExponentSign) {
            let content: String = self.partial.tokens.iter().map(Token::content).collect();
            let line = self.partial.tokens.first().map_or(1, Token::line_number);
            return Err(TranslateError::InvalidNumericLiteral { line, content });
        }
        if self.partial.has_digits() {
            self.finalise()?;
        } else {
            self.reset();
        }

        let before = self.out.len();
        let out: Vec<Token> = self
            .out
            .into_iter()
            .map(|t| {
                if t.is(TokenKind::MemberAccessorOrDecimalPoint) {
                    Token::new(TokenKind::MemberAccessor, t.content(), t.line_index())
                } else {
                    t
                }
            })
            .collect();
        debug!(tokens = before, "numbers rebuilt");
        Ok(out)
    }
}

fn is_minus_sign(token: &Token) -> bool {
    token.is(TokenKind::Operator) && token.content() == "-"
}

/// Digits ending in `E` wait for their exponent.
fn digits_state(token: &Token) -> State {
    if token.content().ends_with(['e', 'E']) {
        State::GotExponentMarker
    } else {
        State::GotIntegerContent
    }
}

fn next_state_after(token: &Token) -> State {
    if token.could_precede_decimal_point_or_negative_sign() {
        State::PeriodOrMinusOrNumberCouldStart
    } else {
        State::NumberCouldNotStart
    }
}

fn try_to_express_number_from_tokens(content: &str, line_index: usize) -> TranslateResult<Token> {
    match content.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Token::new(TokenKind::NumericValue, content, line_index)),
        _ => Err(TranslateError::internal(format!(
            "line {}: could not express '{content}' as a number",
            line_index + 1
        ))),
    }
}

fn incomplete_number(partial: &PartialNumberContent, token: &Token) -> TranslateError {
    let content: String = partial.tokens.iter().map(Token::content).collect();
    TranslateError::InvalidNumericLiteral {
        line: token.line_number(),
        content,
    }
}

fn two_decimal_points(partial: &PartialNumberContent, token: &Token) -> TranslateError {
    let mut content: String = partial.tokens.iter().map(Token::content).collect();
    content.push_str(token.content());
    TranslateError::InvalidNumericLiteral {
        line: token.line_number(),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(contents: &[&str]) -> Vec<Token> {
        contents.iter().map(|c| Token::atom(c, 0)).collect()
    }

    #[test]
    fn test_literal_spellings() {
        let test_cases = vec![
            (vec!["1"], 1.0),
            (vec!["-", "1"], -1.0),
            (vec![".", "1"], 0.1),
            (vec!["1", ".", "1"], 1.1),
            (vec!["-", "1", ".", "1"], -1.1),
            (vec!["-", ".", "1"], -0.1),
            (vec!["1E5"], 1e5),
            (vec!["2e10"], 2e10),
            (vec!["1", ".", "5E", "-", "3"], 1.5e-3),
            (vec!["1", ".", "5E3"], 1.5e3),
            (vec!["-", "1E", "+", "2"], -100.0),
        ];

        for (input, expected) in test_cases {
            let out = rebuild(atoms(&input)).unwrap();
            assert_eq!(out.len(), 1, "{input:?}");
            assert_eq!(out[0].numeric_value(), Some(expected), "{input:?}");
        }
    }

    #[test]
    fn test_bracketed_negative_number() {
        let out = rebuild(atoms(&["(", "-", "1", ")"])).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].is(TokenKind::OpenBrace));
        assert_eq!(out[1].numeric_value(), Some(-1.0));
        assert!(out[2].is(TokenKind::CloseBrace));
    }

    #[test]
    fn test_subtraction_is_not_a_sign() {
        let out = rebuild(atoms(&["a", "-", "1"])).unwrap();
        let contents: Vec<&str> = out.iter().map(Token::content).collect();
        assert_eq!(contents, vec!["a", "-", "1"]);
        assert!(out[1].is(TokenKind::Operator));
    }

    #[test]
    fn test_member_access_is_resolved() {
        let out = rebuild(atoms(&["a", "(", "0", ")", ".", "Test"])).unwrap();
        assert!(out[4].is(TokenKind::MemberAccessor));
        assert!(out.iter().all(|t| !t.is(TokenKind::MemberAccessorOrDecimalPoint)));
    }

    #[test]
    fn test_two_decimal_points_are_fatal() {
        let result = rebuild(atoms(&["=", "1", ".", ".", "2"]));
        assert!(matches!(
            result,
            Err(TranslateError::InvalidNumericLiteral { .. })
        ));
    }

    #[test]
    fn test_exponent_without_digits_is_fatal() {
        for input in [vec!["x", "=", "1E"], vec!["1E", "+", "a"], vec!["1E", ")"]] {
            let result = rebuild(atoms(&input));
            assert!(
                matches!(result, Err(TranslateError::InvalidNumericLiteral { .. })),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_rebuilding_twice_is_a_no_op() {
        let inputs = vec![
            atoms(&["x", "=", "-", "-", "1", ".", "5"]),
            atoms(&["f", "(", "1", ",", "-", ".", "5", ")", ".", "b"]),
            atoms(&["1", "-", "1"]),
            atoms(&["y", "=", "1", ".", "5E", "-", "3", "*", "2"]),
        ];
        for input in inputs {
            let once = rebuild(input).unwrap();
            let twice = rebuild(once.clone()).unwrap();
            assert_eq!(once, twice);
        }
    }
}
