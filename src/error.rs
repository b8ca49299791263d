// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

/// Errors raised while preprocessing.
///
/// Line numbers are 0-based throughout, matching the positions embedded in
/// the message texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    /// Unmatched or misordered conditional directives.
    Structural { line_no: usize, message: String },

    /// Unsupported or malformed directives, including includes that cannot
    /// be resolved.
    Directive { line_no: usize, message: String },

    /// A malformed `#if`/`#elif` constant expression.
    ExpressionSyntax { line_no: usize, message: String },

    /// Division or modulo by zero in a constant expression.
    Arithmetic { line_no: usize, message: String },

    /// Input that matches none of the token classes.
    Lex { line_no: usize, message: String },

    /// The macro expansion cycle guard was exceeded.
    ExpansionOverflow { line_no: usize, message: String },

    /// The underlying reader failed while producing lines.
    Io { file: String, message: String },

    /// The host platform has no seed macro set.
    UnsupportedPlatform { message: String },
}

impl PreprocessError {
    pub fn message(&self) -> &str {
        match self {
            PreprocessError::Structural { message, .. }
            | PreprocessError::Directive { message, .. }
            | PreprocessError::ExpressionSyntax { message, .. }
            | PreprocessError::Arithmetic { message, .. }
            | PreprocessError::Lex { message, .. }
            | PreprocessError::ExpansionOverflow { message, .. }
            | PreprocessError::Io { message, .. }
            | PreprocessError::UnsupportedPlatform { message } => message,
        }
    }
}

impl Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessError::Io { file, message } => {
                write!(f, "Failed to read {}: {}", file, message)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for PreprocessError {}
