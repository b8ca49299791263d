// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    lexer::lex_line,
    token::{Token, TokenKind},
};

/// One logical line: the unit the dispatcher consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tokens: Vec<Token>,
}

impl Chunk {
    /// A chunk whose first token is a lone `#` symbol is a directive.
    pub fn is_directive(&self) -> bool {
        self.tokens
            .first()
            .map(|token| token.is_symbol("#"))
            .unwrap_or(false)
    }

    pub fn line_no(&self) -> usize {
        self.tokens.first().map(|token| token.line_no).unwrap_or(0)
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentState {
    Outside,
    LineComment,
    BlockComment,
}

/// Assembles physical lines into logical chunks.
///
/// Handles three concerns between the lexer and the dispatcher:
/// comment stripping (a `//` comment runs to end of line, a `/*` comment
/// may span lines), backslash-newline continuation (the backslash and the
/// line break are dropped and the next line is appended), and directive
/// normalization (whitespace before a leading `#` is discarded).
pub struct ChunkAssembler {
    line_ending: String,
    state: CommentState,
    chunk: Vec<Token>,
    next_line_no: usize,
    finished: bool,
}

impl ChunkAssembler {
    pub fn new(line_ending: &str) -> Self {
        Self {
            line_ending: line_ending.to_string(),
            state: CommentState::Outside,
            chunk: Vec::new(),
            next_line_no: 0,
            finished: false,
        }
    }

    /// Feeds one physical line (with or without its line ending) and
    /// returns a completed chunk, if this line finished one.
    pub fn push_line(&mut self, raw_line: &str) -> Result<Option<Chunk>, PreprocessError> {
        let line_no = self.next_line_no;
        self.next_line_no += 1;

        let (line, had_newline) = strip_line_ending(raw_line);
        let tokens = lex_line(line_no, line)?;
        let ends_with_backslash = tokens
            .last()
            .map(|token| token.is_symbol("\\"))
            .unwrap_or(false);

        for token in tokens {
            match self.state {
                CommentState::BlockComment => {
                    if token.kind == TokenKind::CommentEnd {
                        self.state = CommentState::Outside;
                    }
                }
                CommentState::LineComment => {}
                CommentState::Outside => match token.kind {
                    TokenKind::CommentStart => {
                        // The whitespace right before a comment goes with it.
                        if self
                            .chunk
                            .last()
                            .map(|last| last.kind == TokenKind::Whitespace)
                            .unwrap_or(false)
                        {
                            self.chunk.pop();
                        }
                        self.state = if token.text == "//" {
                            CommentState::LineComment
                        } else {
                            CommentState::BlockComment
                        };
                    }
                    _ => {
                        if token.is_symbol("#") && self.chunk.iter().all(|t| t.is_whitespace) {
                            self.chunk.clear();
                        }
                        self.chunk.push(token);
                    }
                },
            }
        }

        match self.state {
            CommentState::BlockComment => Ok(None),
            CommentState::LineComment => {
                // A line comment ending in a backslash continues onto the
                // next line, comment included.
                if ends_with_backslash {
                    Ok(None)
                } else {
                    self.state = CommentState::Outside;
                    Ok(self.end_of_line(line_no, had_newline))
                }
            }
            CommentState::Outside => Ok(self.end_of_line(line_no, had_newline)),
        }
    }

    fn end_of_line(&mut self, line_no: usize, had_newline: bool) -> Option<Chunk> {
        if let Some(index) = self.chunk.iter().rposition(|token| !token.is_whitespace) {
            if self.chunk[index].is_symbol("\\") {
                // Continuation: drop the backslash and keep accumulating.
                self.chunk.truncate(index);
                return None;
            }
        }

        if had_newline {
            let mut newline = Token::newline(line_no, &self.line_ending);
            newline.is_chunk_boundary = true;
            self.chunk.push(newline);
        }

        if self.chunk.is_empty() {
            None
        } else {
            if let Some(last) = self.chunk.last_mut() {
                last.is_chunk_boundary = true;
            }
            Some(Chunk {
                tokens: std::mem::take(&mut self.chunk),
            })
        }
    }

    /// Flushes the trailing chunk of a file whose last line had no newline.
    pub fn finish(&mut self) -> Option<Chunk> {
        if self.finished {
            return None;
        }
        self.finished = true;
        if self.chunk.is_empty() || self.state == CommentState::BlockComment {
            return None;
        }
        if let Some(last) = self.chunk.last_mut() {
            last.is_chunk_boundary = true;
        }
        Some(Chunk {
            tokens: std::mem::take(&mut self.chunk),
        })
    }
}

fn strip_line_ending(raw: &str) -> (&str, bool) {
    if let Some(stripped) = raw.strip_suffix("\r\n") {
        (stripped, true)
    } else if let Some(stripped) = raw.strip_suffix('\n') {
        (stripped, true)
    } else {
        (raw, false)
    }
}
