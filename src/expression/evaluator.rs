// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    expression::ast::{BinaryOperator, Expression, UnaryOperator},
    macro_map::MacroMap,
};

/// Evaluates an expression tree against the macro table.
///
/// Only `defined` consults the table; plain identifiers evaluate to 0.
/// `&&` and `||` evaluate both sides unconditionally, so a division by
/// zero on the right of `||` is still an error. Division and modulo
/// truncate toward zero.
pub fn evaluate_expression(
    expression: &Expression,
    defines: &MacroMap,
    line_no: usize,
) -> Result<i64, PreprocessError> {
    match expression {
        Expression::Number(value) => Ok(*value),
        Expression::Identifier(_) => Ok(0),
        Expression::Defined(name) => Ok(if defines.contains(name) { 1 } else { 0 }),
        Expression::Unary(operator, operand) => {
            let value = evaluate_expression(operand, defines, line_no)?;
            let result = match operator {
                UnaryOperator::Plus => value,
                UnaryOperator::Minus => value.wrapping_neg(),
                UnaryOperator::LogicalNot => (value == 0) as i64,
            };
            Ok(result)
        }
        Expression::Binary(operator, left, right) => {
            let left = evaluate_expression(left, defines, line_no)?;
            let right = evaluate_expression(right, defines, line_no)?;
            evaluate_binary(*operator, left, right, line_no)
        }
    }
}

fn evaluate_binary(
    operator: BinaryOperator,
    left: i64,
    right: i64,
    line_no: usize,
) -> Result<i64, PreprocessError> {
    let result = match operator {
        BinaryOperator::LogicalOr => (left != 0 || right != 0) as i64,
        BinaryOperator::LogicalAnd => (left != 0 && right != 0) as i64,
        BinaryOperator::BitwiseOr => left | right,
        BinaryOperator::BitwiseXor => left ^ right,
        BinaryOperator::BitwiseAnd => left & right,
        BinaryOperator::Equal => (left == right) as i64,
        BinaryOperator::NotEqual => (left != right) as i64,
        BinaryOperator::LessThan => (left < right) as i64,
        BinaryOperator::GreaterThan => (left > right) as i64,
        BinaryOperator::LessThanOrEqual => (left <= right) as i64,
        BinaryOperator::GreaterThanOrEqual => (left >= right) as i64,
        BinaryOperator::Add => left.wrapping_add(right),
        BinaryOperator::Subtract => left.wrapping_sub(right),
        BinaryOperator::Multiply => left.wrapping_mul(right),
        BinaryOperator::Divide => {
            if right == 0 {
                return Err(PreprocessError::Arithmetic {
                    line_no,
                    message: format!("Division by zero on line {}", line_no),
                });
            }
            left.wrapping_div(right)
        }
        BinaryOperator::Modulo => {
            if right == 0 {
                return Err(PreprocessError::Arithmetic {
                    line_no,
                    message: format!("Modulo by zero on line {}", line_no),
                });
            }
            left.wrapping_rem(right)
        }
    };
    Ok(result)
}
