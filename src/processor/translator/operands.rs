//! Operator-precedence tree over the flat segments of an expression.
//!
//! VBScript precedence, tightest first: `^`, unary `-`, `* /`, `\`, `Mod`,
//! `+ -`, `&`, comparisons, `Not`, `And`, `Or`, `Xor`, `Eqv`, `Imp`. All
//! binary operators associate to the left.

use crate::error::{TranslateError, TranslateResult};
use crate::processor::ast::{Expression, ExpressionSegment};
use crate::processor::token::Token;

#[derive(Debug, Clone, Copy)]
pub enum Operand<'e> {
    /// Consecutive call segments: one member-access chain.
    Chain(&'e [ExpressionSegment]),
    Value(&'e Token),
    Bracketed(&'e Expression),
    NewInstance(&'e Token),
}

#[derive(Debug)]
pub enum Node<'e> {
    Operand(Operand<'e>),
    Unary {
        operator: &'e Token,
        operand: Box<Node<'e>>,
    },
    Binary {
        operator: &'e Token,
        left: Box<Node<'e>>,
        right: Box<Node<'e>>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Item<'e> {
    Operand(Operand<'e>),
    Operator(&'e Token),
}

fn infix_binding_power(operator: &Token) -> Option<u8> {
    let power = match operator.content().to_ascii_lowercase().as_str() {
        "imp" => 1,
        "eqv" => 2,
        "xor" => 3,
        "or" => 4,
        "and" => 5,
        "=" | "<>" | "<" | ">" | "<=" | ">=" | "is" => 7,
        "&" => 8,
        "+" | "-" => 9,
        "mod" => 10,
        "\\" => 11,
        "*" | "/" => 12,
        "^" => 14,
        _ => return None,
    };
    Some(power)
}

fn prefix_binding_power(operator: &Token) -> Option<u8> {
    if operator.content() == "-" {
        Some(13)
    } else if operator.is_content("Not") {
        Some(6)
    } else {
        None
    }
}

pub fn build(expression: &Expression) -> TranslateResult<Node<'_>> {
    let mut builder = TreeBuilder {
        items: items(&expression.segments),
        position: 0,
        line_index: expression.line_index(),
    };
    let node = builder.parse(0)?;
    if builder.position != builder.items.len() {
        return Err(TranslateError::syntax(
            builder.line_index + 1,
            "unexpected content after expression",
        ));
    }
    Ok(node)
}

fn items(segments: &[ExpressionSegment]) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    let mut idx = 0;
    while idx < segments.len() {
        let item = match &segments[idx] {
            ExpressionSegment::Call(_) => {
                let length = segments[idx..]
                    .iter()
                    .take_while(|s| matches!(s, ExpressionSegment::Call(_)))
                    .count();
                let chain = &segments[idx..idx + length];
                idx += length;
                items.push(Item::Operand(Operand::Chain(chain)));
                continue;
            }
            ExpressionSegment::Value(token) => Item::Operand(Operand::Value(token)),
            ExpressionSegment::Operator(token) => Item::Operator(token),
            ExpressionSegment::Bracketed(inner) => Item::Operand(Operand::Bracketed(inner)),
            ExpressionSegment::NewInstance(token) => Item::Operand(Operand::NewInstance(token)),
        };
        items.push(item);
        idx += 1;
    }
    items
}

struct TreeBuilder<'e> {
    items: Vec<Item<'e>>,
    position: usize,
    line_index: usize,
}

impl<'e> TreeBuilder<'e> {
    fn next(&mut self) -> Option<Item<'e>> {
        let item = self.items.get(self.position).copied();
        self.position += 1;
        item
    }

    fn parse(&mut self, min_power: u8) -> TranslateResult<Node<'e>> {
        let mut left = match self.next() {
            Some(Item::Operand(operand)) => Node::Operand(operand),
            Some(Item::Operator(operator)) => {
                let power = prefix_binding_power(operator).ok_or_else(|| {
                    TranslateError::syntax(
                        operator.line_number(),
                        format!("'{}' cannot start an operand", operator.content()),
                    )
                })?;
                Node::Unary {
                    operator,
                    operand: Box::new(self.parse(power)?),
                }
            }
            None => {
                return Err(TranslateError::syntax(
                    self.line_index + 1,
                    "expected a value after the operator",
                ));
            }
        };

        while let Some(item) = self.items.get(self.position).copied() {
            let Item::Operator(operator) = item else {
                return Err(TranslateError::syntax(
                    self.line_index + 1,
                    "expected an operator between values",
                ));
            };
            let power = infix_binding_power(operator).ok_or_else(|| {
                TranslateError::syntax(
                    operator.line_number(),
                    format!("'{}' cannot join two values", operator.content()),
                )
            })?;
            if power < min_power {
                break;
            }
            self.position += 1;
            let right = self.parse(power + 1)?;
            left = Node::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{expression, lexer, number_rebuilder, operator_combiner};

    fn shape(node: &Node<'_>) -> String {
        match node {
            Node::Operand(Operand::Value(t)) => t.content().to_string(),
            Node::Operand(Operand::Chain(segments)) => match &segments[0] {
                ExpressionSegment::Call(call) => call.member_access_tokens[0].content().to_string(),
                _ => "?".to_string(),
            },
            Node::Operand(Operand::Bracketed(_)) => "(..)".to_string(),
            Node::Operand(Operand::NewInstance(t)) => format!("new {}", t.content()),
            Node::Unary { operator, operand } => format!("({} {})", operator.content(), shape(operand)),
            Node::Binary {
                operator,
                left,
                right,
            } => format!("({} {} {})", shape(left), operator.content(), shape(right)),
        }
    }

    fn tree_of(src: &str) -> String {
        let tokens = lexer::tokenise(src).unwrap();
        let tokens = operator_combiner::combine(number_rebuilder::rebuild(tokens).unwrap());
        let expression = expression::generate_single(&tokens, 0).unwrap();
        shape(&build(&expression).unwrap())
    }

    #[test]
    fn test_precedence() {
        let test_cases = vec![
            ("a + b * c", "(a + (b * c))"),
            ("a - b - c", "((a - b) - c)"),
            ("-a ^ 2", "(- (a ^ 2))"),
            ("a & b + c", "(a & (b + c))"),
            ("Not a = b And c", "((Not (a = b)) And c)"),
            ("a Or b And c", "(a Or (b And c))"),
            ("a \\ b Mod c", "((a \\ b) Mod c)"),
            ("a * -b", "(a * (- b))"),
            ("a Imp b Xor c", "(a Imp (b Xor c))"),
        ];
        for (src, expected) in test_cases {
            assert_eq!(tree_of(src), expected, "{src}");
        }
    }

    #[test]
    fn test_dangling_operator() {
        let tokens = lexer::tokenise("a +").unwrap();
        let tokens = operator_combiner::combine(number_rebuilder::rebuild(tokens).unwrap());
        let expression = expression::generate_single(&tokens, 0).unwrap();
        assert!(build(&expression).is_err());
    }
}
