// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    error::PreprocessError,
    macro_map::{MacroDefinition, MacroMap},
    token::{Token, TokenKind},
};

pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 20;

/// Expands macro references in a token stream.
///
/// A name already on the active expansion path is emitted literally, so
/// self-referential and mutually-referential macros terminate. Only
/// `Identifier` tokens are candidates; string and char literals never
/// expand.
pub struct TokenExpander<'a> {
    defines: &'a MacroMap,
    max_depth: usize,
}

impl<'a> TokenExpander<'a> {
    pub fn new(defines: &'a MacroMap) -> Self {
        Self {
            defines,
            max_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }

    pub fn with_max_depth(defines: &'a MacroMap, max_depth: usize) -> Self {
        Self { defines, max_depth }
    }

    pub fn expand(&self, tokens: &[Token]) -> Result<Vec<Token>, PreprocessError> {
        self.expand_within(tokens, &[])
    }

    fn expand_within(
        &self,
        tokens: &[Token],
        active: &[String],
    ) -> Result<Vec<Token>, PreprocessError> {
        let mut output = Vec::with_capacity(tokens.len());
        let mut index = 0;

        while index < tokens.len() {
            let token = &tokens[index];

            let candidate = token.kind == TokenKind::Identifier
                && !active.iter().any(|name| name == &token.text);
            if !candidate {
                output.push(token.clone());
                index += 1;
                continue;
            }

            match self.defines.get(&token.text) {
                None => {
                    output.push(token.clone());
                    index += 1;
                }
                Some(MacroDefinition::ObjectLike(body)) => {
                    let nested = self.enter(active, token)?;
                    output.extend(self.expand_within(body, &nested)?);
                    index += 1;
                }
                Some(MacroDefinition::FunctionLike(parameters, body)) => {
                    let mut open = index + 1;
                    while open < tokens.len() && tokens[open].is_whitespace {
                        open += 1;
                    }
                    if open >= tokens.len() || !tokens[open].is_symbol("(") {
                        // Not a call: the bare name passes through.
                        output.push(token.clone());
                        index += 1;
                        continue;
                    }

                    match split_arguments(tokens, open) {
                        None => {
                            // Unterminated call: everything from the name on
                            // is emitted literally.
                            output.extend(tokens[index..].iter().cloned());
                            index = tokens.len();
                        }
                        Some((raw_arguments, resume)) => {
                            let nested = self.enter(active, token)?;
                            // Arguments expand under a fresh path; the
                            // cycle guard only tracks the body chain.
                            let mut arguments = Vec::with_capacity(raw_arguments.len());
                            for raw in &raw_arguments {
                                arguments.push(self.expand(trim_whitespace(raw))?);
                            }
                            let substituted =
                                substitute_parameters(parameters, &arguments, body);
                            output.extend(self.expand_within(&substituted, &nested)?);
                            index = resume;
                        }
                    }
                }
            }
        }

        Ok(output)
    }

    fn enter(&self, active: &[String], token: &Token) -> Result<Vec<String>, PreprocessError> {
        let mut nested = Vec::with_capacity(active.len() + 1);
        nested.push(token.text.clone());
        nested.extend(active.iter().cloned());
        if nested.len() > self.max_depth {
            return Err(PreprocessError::ExpansionOverflow {
                line_no: token.line_no,
                message: format!(
                    "Macro expansion too deep on line {}: {}",
                    token.line_no,
                    nested.join(" <- ")
                ),
            });
        }
        Ok(nested)
    }
}

/// Collects the arguments of a function-like call; `open` indexes the `(`.
/// Splits on commas at paren depth 0 and returns the index just past the
/// `)`, or `None` when the call never closes within the chunk.
fn split_arguments(tokens: &[Token], open: usize) -> Option<(Vec<Vec<Token>>, usize)> {
    let mut arguments = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    let mut index = open + 1;

    while index < tokens.len() {
        let token = &tokens[index];
        if token.is_symbol("(") {
            depth += 1;
            current.push(token.clone());
        } else if token.is_symbol(")") {
            if depth == 0 {
                arguments.push(current);
                return Some((arguments, index + 1));
            }
            depth -= 1;
            current.push(token.clone());
        } else if token.is_symbol(",") && depth == 0 {
            arguments.push(std::mem::take(&mut current));
        } else {
            current.push(token.clone());
        }
        index += 1;
    }

    None
}

fn trim_whitespace(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|token| !token.is_whitespace)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| !token.is_whitespace)
        .map(|index| index + 1)
        .unwrap_or(start);
    &tokens[start..end]
}

/// Splices arguments into the body. Parameters without a matching argument
/// (too few were supplied) substitute as empty.
fn substitute_parameters(
    parameters: &[String],
    arguments: &[Vec<Token>],
    body: &[Token],
) -> Vec<Token> {
    let mut output = Vec::with_capacity(body.len());
    for token in body {
        if token.kind == TokenKind::Identifier {
            if let Some(slot) = parameters.iter().position(|name| name == &token.text) {
                if let Some(argument) = arguments.get(slot) {
                    output.extend(argument.iter().cloned());
                }
                continue;
            }
        }
        output.push(token.clone());
    }
    output
}
