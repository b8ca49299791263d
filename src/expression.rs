// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

pub mod ast;
pub mod evaluator;
pub mod parser;

use crate::{error::PreprocessError, macro_map::MacroMap, token::Token};

/// Evaluates a `#if`/`#elif` constant expression.
///
/// An expression that is empty after whitespace filtering evaluates to 0.
pub fn evaluate(
    tokens: &[Token],
    defines: &MacroMap,
    line_no: usize,
) -> Result<i64, PreprocessError> {
    let expression = match parser::parse_from_tokens(tokens, line_no)? {
        Some(expression) => expression,
        None => return Ok(0),
    };
    evaluator::evaluate_expression(&expression, defines, line_no)
}
