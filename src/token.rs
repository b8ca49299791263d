// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    String,
    Char,
    CommentStart,
    CommentEnd,
    Newline,
    Whitespace,
    Symbol,
}

/// A lexical token carrying its source text verbatim.
///
/// Tokens survive the whole pipeline unchanged, so concatenating the `text`
/// of a chunk's tokens reconstructs the (comment-stripped) source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 0-based physical line number.
    pub line_no: usize,
    pub text: String,
    pub kind: TokenKind,
    /// True for `Whitespace` and `Newline` tokens (and anything whose text
    /// is blank).
    pub is_whitespace: bool,
    /// Set by the chunk assembler on the final token of each chunk.
    pub is_chunk_boundary: bool,
}

impl Token {
    pub fn new(line_no: usize, text: impl Into<String>, kind: TokenKind) -> Self {
        let text = text.into();
        let is_whitespace =
            matches!(kind, TokenKind::Whitespace | TokenKind::Newline) || text.trim().is_empty();
        Self {
            line_no,
            text,
            kind,
            is_whitespace,
            is_chunk_boundary: false,
        }
    }

    pub fn newline(line_no: usize, line_ending: &str) -> Self {
        Token::new(line_no, line_ending, TokenKind::Newline)
    }

    pub fn is_symbol(&self, text: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == text
    }

    pub fn is_identifier(&self, text: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == text
    }
}
