// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    expression::ast::{BinaryOperator, Expression, UnaryOperator},
    token::{Token, TokenKind},
};

/// Parses the token list of a `#if`/`#elif` directive.
///
/// Returns `None` when no significant tokens remain after whitespace
/// filtering. A complete expression must consume every token; leftovers
/// are a syntax error.
pub fn parse_from_tokens(
    tokens: &[Token],
    line_no: usize,
) -> Result<Option<Expression>, PreprocessError> {
    let merged = merge_operator_tokens(tokens);
    if merged.is_empty() {
        return Ok(None);
    }

    let mut parser = ExpressionParser {
        tokens: merged,
        position: 0,
        line_no,
    };
    let expression = parser.parse_expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(syntax_error(
            line_no,
            format!("Unexpected token '{}' after expression", token.text),
        ));
    }
    Ok(Some(expression))
}

/// Drops whitespace and merges adjacent single-character symbols that form
/// a two-character operator (the lexer emits each symbol separately).
fn merge_operator_tokens(tokens: &[Token]) -> Vec<Token> {
    const PAIRS: [&str; 6] = ["&&", "||", "==", "!=", "<=", ">="];

    let significant: Vec<&Token> = tokens.iter().filter(|token| !token.is_whitespace).collect();
    let mut merged = Vec::with_capacity(significant.len());
    let mut index = 0;
    while index < significant.len() {
        let token = significant[index];
        if token.kind == TokenKind::Symbol && index + 1 < significant.len() {
            let next = significant[index + 1];
            if next.kind == TokenKind::Symbol {
                let pair = format!("{}{}", token.text, next.text);
                if PAIRS.contains(&pair.as_str()) {
                    merged.push(Token::new(token.line_no, pair, TokenKind::Symbol));
                    index += 2;
                    continue;
                }
            }
        }
        merged.push(token.clone());
        index += 1;
    }
    merged
}

struct ExpressionParser {
    tokens: Vec<Token>,
    position: usize,
    line_no: usize,
}

impl ExpressionParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    // Precedence climbing: each recursion level owns the operators whose
    // precedence is at least `min_precedence`.
    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expression, PreprocessError> {
        let mut left = self.parse_primary()?;

        while let Some(token) = self.peek() {
            if token.is_symbol(")") {
                break;
            }
            let Some(operator) = BinaryOperator::from_symbol(&token.text) else {
                break;
            };
            let precedence = operator.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_expression(precedence + 1)?;
            left = Expression::Binary(operator, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expression, PreprocessError> {
        let Some(token) = self.peek() else {
            return Err(syntax_error(self.line_no, "Unexpected end of expression"));
        };

        if token.is_symbol("(") {
            self.advance();
            let inner = self.parse_expression(0)?;
            match self.peek() {
                Some(token) if token.is_symbol(")") => {
                    self.advance();
                    Ok(inner)
                }
                _ => Err(syntax_error(self.line_no, "Missing closing parenthesis")),
            }
        } else if token.is_symbol("!") || token.is_symbol("+") || token.is_symbol("-") {
            let operator = match token.text.as_str() {
                "!" => UnaryOperator::LogicalNot,
                "+" => UnaryOperator::Plus,
                _ => UnaryOperator::Minus,
            };
            self.advance();
            let operand = self.parse_primary()?;
            Ok(Expression::Unary(operator, Box::new(operand)))
        } else if token.is_identifier("defined") {
            self.parse_defined()
        } else {
            let text = token.text.clone();
            let kind = token.kind;
            self.advance();
            if kind == TokenKind::Identifier {
                match text.parse::<i64>() {
                    Ok(value) => Ok(Expression::Number(value)),
                    Err(_) => Ok(Expression::Identifier(text)),
                }
            } else {
                // Any other token (chars, strings, stray symbols) is
                // consumed as the value 0.
                Ok(Expression::Number(0))
            }
        }
    }

    fn parse_defined(&mut self) -> Result<Expression, PreprocessError> {
        self.advance(); // the 'defined' keyword

        let has_parens = match self.peek() {
            None => {
                return Err(syntax_error(
                    self.line_no,
                    "Expected identifier after 'defined'",
                ));
            }
            Some(token) => token.is_symbol("("),
        };
        if has_parens {
            self.advance();
        }

        let name = match self.peek() {
            None => {
                return Err(syntax_error(
                    self.line_no,
                    "Expected identifier in defined()",
                ));
            }
            Some(token) => token.text.clone(),
        };
        self.advance();

        if has_parens {
            match self.peek() {
                Some(token) if token.is_symbol(")") => self.advance(),
                _ => {
                    return Err(syntax_error(
                        self.line_no,
                        "Missing closing parenthesis in defined()",
                    ));
                }
            }
        }

        Ok(Expression::Defined(name))
    }
}

fn syntax_error(line_no: usize, message: impl Into<String>) -> PreprocessError {
    PreprocessError::ExpressionSyntax {
        line_no,
        message: format!("{} on line {}", message.into(), line_no),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::parse_from_tokens;
    use crate::{
        expression::ast::{BinaryOperator, Expression},
        lexer::lex_line,
    };

    fn parse(source: &str) -> Option<Expression> {
        let tokens = lex_line(0, source).unwrap();
        parse_from_tokens(&tokens, 0).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), None);
        assert_eq!(parse(" \t "), None);
    }

    #[test]
    fn test_precedence_shape() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        assert_eq!(
            parse("1 + 2 * 3"),
            Some(Expression::Binary(
                BinaryOperator::Add,
                Box::new(Expression::Number(1)),
                Box::new(Expression::Binary(
                    BinaryOperator::Multiply,
                    Box::new(Expression::Number(2)),
                    Box::new(Expression::Number(3)),
                )),
            ))
        );
    }

    #[test]
    fn test_left_associativity() {
        // 1 - 2 - 3 parses as (1 - 2) - 3
        assert_eq!(
            parse("1 - 2 - 3"),
            Some(Expression::Binary(
                BinaryOperator::Subtract,
                Box::new(Expression::Binary(
                    BinaryOperator::Subtract,
                    Box::new(Expression::Number(1)),
                    Box::new(Expression::Number(2)),
                )),
                Box::new(Expression::Number(3)),
            ))
        );
    }

    #[test]
    fn test_defined_forms() {
        assert_eq!(parse("defined FOO"), Some(Expression::Defined("FOO".to_string())));
        assert_eq!(parse("defined(FOO)"), Some(Expression::Defined("FOO".to_string())));
    }

    #[test]
    fn test_merged_operator() {
        assert_eq!(
            parse("1 == 1"),
            Some(Expression::Binary(
                BinaryOperator::Equal,
                Box::new(Expression::Number(1)),
                Box::new(Expression::Number(1)),
            ))
        );
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let tokens = lex_line(0, "1 1").unwrap();
        assert!(parse_from_tokens(&tokens, 0).is_err());
    }
}
