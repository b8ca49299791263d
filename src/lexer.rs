// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    token::{Token, TokenKind},
};

/// Splits one physical line into tokens.
///
/// The line must have its ending already stripped; no `Newline` token is
/// produced here (the chunk assembler appends those). Longer matches win:
/// `/*`, `//` and `*/` are checked before single symbols, and a string
/// literal may carry a `u8`/`u`/`U`/`L` prefix.
pub fn lex_line(line_no: usize, line: &str) -> Result<Vec<Token>, PreprocessError> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            '/' if chars.get(pos + 1) == Some(&'*') => {
                tokens.push(Token::new(line_no, "/*", TokenKind::CommentStart));
                pos += 2;
            }
            '/' if chars.get(pos + 1) == Some(&'/') => {
                tokens.push(Token::new(line_no, "//", TokenKind::CommentStart));
                pos += 2;
            }
            '*' if chars.get(pos + 1) == Some(&'/') => {
                tokens.push(Token::new(line_no, "*/", TokenKind::CommentEnd));
                pos += 2;
            }
            '"' => match scan_string(&chars, pos) {
                Some(end) => {
                    let text: String = chars[pos..end].iter().collect();
                    tokens.push(Token::new(line_no, text, TokenKind::String));
                    pos = end;
                }
                None => {
                    // No closing quote on this line: the quote degrades to
                    // a plain symbol and lexing resumes after it.
                    tokens.push(Token::new(line_no, "\"", TokenKind::Symbol));
                    pos += 1;
                }
            },
            '\'' => {
                let is_char_literal = pos + 2 < chars.len()
                    && is_word_char(chars[pos + 1])
                    && chars[pos + 2] == '\'';
                if is_char_literal {
                    let text: String = chars[pos..pos + 3].iter().collect();
                    tokens.push(Token::new(line_no, text, TokenKind::Char));
                    pos += 3;
                } else {
                    tokens.push(Token::new(line_no, "'", TokenKind::Symbol));
                    pos += 1;
                }
            }
            ' ' | '\t' => {
                let mut end = pos;
                while end < chars.len() && matches!(chars[end], ' ' | '\t') {
                    end += 1;
                }
                let text: String = chars[pos..end].iter().collect();
                tokens.push(Token::new(line_no, text, TokenKind::Whitespace));
                pos = end;
            }
            c if is_word_char(c) => {
                let mut end = pos;
                while end < chars.len() && is_word_char(chars[end]) {
                    end += 1;
                }
                let text: String = chars[pos..end].iter().collect();

                let prefixed_string = if matches!(text.as_str(), "u8" | "u" | "U" | "L")
                    && chars.get(end) == Some(&'"')
                {
                    scan_string(&chars, end)
                } else {
                    None
                };

                if let Some(string_end) = prefixed_string {
                    let literal: String = chars[pos..string_end].iter().collect();
                    tokens.push(Token::new(line_no, literal, TokenKind::String));
                    pos = string_end;
                } else {
                    tokens.push(Token::new(line_no, text, TokenKind::Identifier));
                    pos = end;
                }
            }
            c if c.is_control() => {
                return Err(PreprocessError::Lex {
                    line_no,
                    message: format!("Unrecognized input {:?} on line {}", c, line_no),
                });
            }
            c => {
                tokens.push(Token::new(line_no, c.to_string(), TokenKind::Symbol));
                pos += 1;
            }
        }
    }

    Ok(tokens)
}

// Matches the identifier class `\w`: Unicode alphanumerics plus underscore.
fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Scans a string literal starting at the `"` at `start`. Returns the index
/// one past the closing quote, or `None` when the literal never closes.
fn scan_string(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
