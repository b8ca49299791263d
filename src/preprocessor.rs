// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use log::debug;

use crate::{
    chunk::{Chunk, ChunkAssembler},
    conditional::{ConditionalStack, FrameKind},
    error::PreprocessError,
    expander::{DEFAULT_MAX_EXPANSION_DEPTH, TokenExpander},
    expression,
    file_provider::{FileProvider, SourceFile},
    header_resolver::{HeaderResolver, OpenedHeader},
    include_once::IncludeOnceRegistry,
    macro_map::MacroMap,
    platform::calculate_platform_constants,
    token::{Token, TokenKind},
};

pub const DEFAULT_LINE_ENDING: &str = "\n";

pub struct PreprocessorOptions {
    /// Line ending written on every emitted line.
    pub line_ending: String,
    /// Directories searched for included headers, in order.
    pub include_paths: Vec<String>,
    /// Include names dropped without resolution.
    pub ignore_headers: Vec<String>,
    /// Seed macros; `None` detects the host platform.
    pub platform_constants: Option<HashMap<String, String>>,
    /// Additional seed macros, applied over the platform set.
    pub extra_constants: HashMap<String, String>,
    /// Replace every string literal in the output with `NULL`.
    pub fold_strings_to_null: bool,
    pub max_expansion_depth: usize,
}

impl Default for PreprocessorOptions {
    fn default() -> Self {
        Self {
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            include_paths: Vec::new(),
            ignore_headers: Vec::new(),
            platform_constants: None,
            extra_constants: HashMap::new(),
            fold_strings_to_null: false,
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }
}

// The directive vocabulary is closed: anything else is an error, not a
// passthrough.
enum Directive {
    Define,
    Undef,
    IfDef,
    IfNdef,
    If,
    Elif,
    Else,
    EndIf,
    Pragma,
    Include,
}

impl Directive {
    fn from_keyword(keyword: &str) -> Option<Self> {
        let directive = match keyword {
            "define" => Directive::Define,
            "undef" => Directive::Undef,
            "ifdef" => Directive::IfDef,
            "ifndef" => Directive::IfNdef,
            "if" => Directive::If,
            "elif" => Directive::Elif,
            "else" => Directive::Else,
            "endif" => Directive::EndIf,
            "pragma" => Directive::Pragma,
            "include" => Directive::Include,
            _ => return None,
        };
        Some(directive)
    }
}

enum DirectiveOutcome {
    Done,
    Emit(String),
    Push(SourceFile),
}

/// The preprocessor state shared across the whole run: macro table,
/// conditional stack, include-once registry and header resolver.
pub struct Preprocessor<T>
where
    T: FileProvider,
{
    defines: MacroMap,
    conditionals: ConditionalStack,
    include_once: IncludeOnceRegistry,
    headers: HeaderResolver<T>,
    ignore_headers: HashSet<String>,
    line_ending: String,
    fold_strings_to_null: bool,
    max_expansion_depth: usize,
    // (label, kind, opened_at_line) of the most recently closed frame,
    // valid only until the next chunk. Feeds full-file guard detection.
    last_guard: Option<(String, FrameKind, usize)>,
}

impl<T> Preprocessor<T>
where
    T: FileProvider,
{
    pub fn new(provider: T, options: PreprocessorOptions) -> Result<Self, PreprocessError> {
        let platform_constants = match options.platform_constants {
            Some(constants) => constants,
            None => calculate_platform_constants()?,
        };
        let mut defines = MacroMap::from_key_values(&platform_constants)?;
        for (key, value) in &options.extra_constants {
            defines.define_from_value(key, value)?;
        }

        Ok(Self {
            defines,
            conditionals: ConditionalStack::new(),
            include_once: IncludeOnceRegistry::new(),
            headers: HeaderResolver::new(provider, options.include_paths),
            ignore_headers: options.ignore_headers.into_iter().collect(),
            line_ending: options.line_ending,
            fold_strings_to_null: options.fold_strings_to_null,
            max_expansion_depth: options.max_expansion_depth,
            last_guard: None,
        })
    }

    /// Starts the pull-based pipeline over `root`. Nothing is read until
    /// the returned iterator is polled.
    pub fn preprocess(self, root: SourceFile) -> Output<T> {
        let line_ending = self.line_ending.clone();
        Output {
            preprocessor: self,
            files: vec![OpenFile::new(root, &line_ending)],
            done: false,
        }
    }
}

// One frame of the include stack: a reader plus its chunk assembler.
struct OpenFile {
    name: String,
    reader: Box<dyn BufRead>,
    assembler: ChunkAssembler,
    exhausted: bool,
}

impl OpenFile {
    fn new(source: SourceFile, line_ending: &str) -> Self {
        let (name, reader) = source.into_parts();
        Self {
            name,
            reader,
            assembler: ChunkAssembler::new(line_ending),
            exhausted: false,
        }
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>, PreprocessError> {
        loop {
            if self.exhausted {
                return Ok(self.assembler.finish());
            }
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).map_err(|error| {
                PreprocessError::Io {
                    file: self.name.clone(),
                    message: error.to_string(),
                }
            })?;
            if read == 0 {
                self.exhausted = true;
                continue;
            }
            if let Some(chunk) = self.assembler.push_line(&line)? {
                return Ok(Some(chunk));
            }
        }
    }
}

/// The lazy output stream. Each item is one emitted text fragment (a
/// source line after expansion, or a passthrough pragma). The first error
/// ends the stream.
pub struct Output<T>
where
    T: FileProvider,
{
    preprocessor: Preprocessor<T>,
    files: Vec<OpenFile>,
    done: bool,
}

impl<T> Iterator for Output<T>
where
    T: FileProvider,
{
    type Item = Result<String, PreprocessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.pump() {
            Ok(Some(fragment)) => Some(Ok(fragment)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

impl<T> Output<T>
where
    T: FileProvider,
{
    /// Whether a later include resolving to `path` would be
    /// short-circuited by the include-once machinery in the current state.
    pub fn would_skip_header(&self, path: &str) -> bool {
        self.preprocessor
            .include_once
            .should_skip(path, &self.preprocessor.defines)
    }

    fn pump(&mut self) -> Result<Option<String>, PreprocessError> {
        loop {
            let chunk = match self.files.last_mut() {
                None => return self.check_left_open(),
                Some(file) => file.next_chunk()?,
            };
            let Some(chunk) = chunk else {
                self.finish_file();
                continue;
            };

            self.preprocessor.last_guard = None;

            if chunk.is_directive() {
                match self.handle_directive(&chunk)? {
                    DirectiveOutcome::Done => {}
                    DirectiveOutcome::Emit(text) => return Ok(Some(text)),
                    DirectiveOutcome::Push(source) => {
                        debug!("entering {}", source.name());
                        let line_ending = self.preprocessor.line_ending.clone();
                        self.files.push(OpenFile::new(source, &line_ending));
                    }
                }
            } else {
                if self.preprocessor.conditionals.suppressing() {
                    continue;
                }
                let expander = TokenExpander::with_max_depth(
                    &self.preprocessor.defines,
                    self.preprocessor.max_expansion_depth,
                );
                let expanded = expander.expand(&chunk.tokens)?;
                let text = self.render(&expanded);
                if !text.is_empty() {
                    return Ok(Some(text));
                }
            }
        }
    }

    // A file is done: run full-file guard detection, then pop the frame
    // (dropping it closes the reader).
    fn finish_file(&mut self) {
        if let Some((label, kind, opened_at_line)) = self.preprocessor.last_guard.take() {
            let guards_whole_file =
                opened_at_line == 0 && matches!(kind, FrameKind::IfDef | FrameKind::IfNdef);
            if guards_whole_file {
                if let Some(file) = self.files.last() {
                    debug!("recording full-file guard {} for {}", label, file.name);
                    self.preprocessor
                        .include_once
                        .record_guard(&file.name, label, kind);
                }
            }
        }
        self.files.pop();
    }

    fn check_left_open(&self) -> Result<Option<String>, PreprocessError> {
        if let Some(frame) = self.preprocessor.conditionals.last() {
            let message = match frame.kind {
                FrameKind::Else => {
                    format!("#else from line {} left open", frame.opened_at_line)
                }
                kind => format!(
                    "#{} {} from line {} left open",
                    kind, frame.label, frame.opened_at_line
                ),
            };
            return Err(PreprocessError::Structural {
                line_no: frame.opened_at_line,
                message,
            });
        }
        Ok(None)
    }

    fn render(&self, tokens: &[Token]) -> String {
        let mut text = String::new();
        for token in tokens {
            if self.preprocessor.fold_strings_to_null && token.kind == TokenKind::String {
                text.push_str("NULL");
            } else {
                text.push_str(&token.text);
            }
        }
        text
    }

    fn current_file_name(&self) -> String {
        self.files
            .last()
            .map(|file| file.name.clone())
            .unwrap_or_default()
    }

    fn handle_directive(&mut self, chunk: &Chunk) -> Result<DirectiveOutcome, PreprocessError> {
        let line_no = chunk.line_no();
        let keyword = chunk
            .tokens
            .get(1)
            .map(|token| token.text.clone())
            .unwrap_or_default();
        let Some(directive) = Directive::from_keyword(&keyword) else {
            return Err(PreprocessError::Directive {
                line_no,
                message: format!(
                    "Line number {} contains unsupported directive {}",
                    line_no, keyword
                ),
            });
        };
        let rest = chunk.tokens.get(2..).unwrap_or_default();

        match directive {
            Directive::Define => {
                self.process_define(rest);
                Ok(DirectiveOutcome::Done)
            }
            Directive::Undef => {
                self.process_undef(rest);
                Ok(DirectiveOutcome::Done)
            }
            Directive::IfDef => {
                self.process_ifdef(FrameKind::IfDef, rest, line_no);
                Ok(DirectiveOutcome::Done)
            }
            Directive::IfNdef => {
                self.process_ifdef(FrameKind::IfNdef, rest, line_no);
                Ok(DirectiveOutcome::Done)
            }
            Directive::If => {
                self.process_if(rest, line_no)?;
                Ok(DirectiveOutcome::Done)
            }
            Directive::Elif => {
                self.process_elif(rest, line_no)?;
                Ok(DirectiveOutcome::Done)
            }
            Directive::Else => {
                self.process_else(line_no)?;
                Ok(DirectiveOutcome::Done)
            }
            Directive::EndIf => {
                self.process_endif(line_no)?;
                Ok(DirectiveOutcome::Done)
            }
            Directive::Pragma => self.process_pragma(rest, line_no),
            Directive::Include => self.process_include(rest, line_no),
        }
    }

    fn process_define(&mut self, rest: &[Token]) {
        if self.preprocessor.conditionals.suppressing() {
            return;
        }
        // A define without a name is a silent no-op, like an empty #undef.
        let Some(name_index) = rest.iter().position(|token| !token.is_whitespace) else {
            return;
        };
        let name = rest[name_index].text.clone();

        // Function-like only when the ( hugs the name.
        let is_function_like = rest
            .get(name_index + 1)
            .map(|token| token.is_symbol("("))
            .unwrap_or(false);
        if is_function_like {
            if let Some((parameters, after_paren)) =
                parse_parameter_list(rest, name_index + 2)
            {
                let body = function_body(&rest[after_paren.min(rest.len())..]);
                debug!("defining function-like macro {}", name);
                self.preprocessor.defines.define_function(&name, parameters, body);
                return;
            }
            // No closing paren before end of line: the remainder becomes
            // an object-like body, ( included.
            let body = strip_trailing_newline(&rest[name_index + 1..]);
            self.preprocessor.defines.define_object(&name, body);
            return;
        }

        // The token right after the name (the separating whitespace) is
        // not part of the body.
        let body_start = (name_index + 2).min(rest.len());
        let body = strip_trailing_newline(&rest[body_start..]);
        debug!("defining macro {}", name);
        self.preprocessor.defines.define_object(&name, body);
    }

    fn process_undef(&mut self, rest: &[Token]) {
        // Applies even while suppressed.
        let Some(index) = rest.iter().position(|token| !token.is_whitespace) else {
            return;
        };
        let name = &rest[index].text;
        if self.preprocessor.defines.remove(name) {
            debug!("undefined macro {}", name);
        }
    }

    fn process_ifdef(&mut self, kind: FrameKind, rest: &[Token], line_no: usize) {
        let label = rest
            .iter()
            .find(|token| !token.is_whitespace)
            .map(|token| token.text.clone())
            .unwrap_or_default();
        let defined = self.preprocessor.defines.contains(&label);
        let condition_active = match kind {
            FrameKind::IfDef => defined,
            _ => !defined,
        };
        self.preprocessor
            .conditionals
            .open(kind, label, line_no, condition_active);
    }

    fn process_if(&mut self, rest: &[Token], line_no: usize) -> Result<(), PreprocessError> {
        let label = condition_label(rest);
        // Inside a suppressed region the expression is not evaluated, so
        // errors in dead branches stay silent.
        let condition_active = if self.preprocessor.conditionals.suppressing() {
            false
        } else {
            expression::evaluate(rest, &self.preprocessor.defines, line_no)? != 0
        };
        self.preprocessor
            .conditionals
            .open(FrameKind::If, label, line_no, condition_active);
        Ok(())
    }

    fn process_elif(&mut self, rest: &[Token], line_no: usize) -> Result<(), PreprocessError> {
        let (parent_suppressed, branch_taken, is_else) =
            match self.preprocessor.conditionals.last() {
                None => {
                    return Err(PreprocessError::Structural {
                        line_no,
                        message: format!("Unexpected #elif on line {}", line_no),
                    });
                }
                Some(frame) => (
                    frame.parent_suppressed,
                    frame.branch_taken,
                    frame.kind == FrameKind::Else,
                ),
            };
        if is_else {
            return Err(PreprocessError::Structural {
                line_no,
                message: format!("#elif after #else on line {}", line_no),
            });
        }

        let condition_active = if !parent_suppressed && !branch_taken {
            expression::evaluate(rest, &self.preprocessor.defines, line_no)? != 0
        } else {
            false
        };
        if let Some(frame) = self.preprocessor.conditionals.top_mut() {
            frame.take_elif_branch(condition_active);
        }
        Ok(())
    }

    fn process_else(&mut self, line_no: usize) -> Result<(), PreprocessError> {
        let Some(frame) = self.preprocessor.conditionals.top_mut() else {
            return Err(PreprocessError::Structural {
                line_no,
                message: format!("Unexpected #else on line {}", line_no),
            });
        };
        if frame.kind == FrameKind::Else {
            return Err(PreprocessError::Structural {
                line_no,
                message: format!("#else after #else on line {}", line_no),
            });
        }
        frame.take_else_branch(line_no);
        Ok(())
    }

    fn process_endif(&mut self, line_no: usize) -> Result<(), PreprocessError> {
        let Some(frame) = self.preprocessor.conditionals.pop() else {
            return Err(PreprocessError::Structural {
                line_no,
                message: format!("Unexpected #endif on line {}", line_no),
            });
        };
        self.preprocessor.last_guard = Some((frame.label, frame.kind, frame.opened_at_line));
        Ok(())
    }

    fn process_pragma(
        &mut self,
        rest: &[Token],
        line_no: usize,
    ) -> Result<DirectiveOutcome, PreprocessError> {
        if self.preprocessor.conditionals.suppressing() {
            return Ok(DirectiveOutcome::Done);
        }
        let Some(index) = rest.iter().position(|token| !token.is_whitespace) else {
            return Err(PreprocessError::Directive {
                line_no,
                message: format!("Unsupported pragma on line {}", line_no),
            });
        };
        match rest[index].text.as_str() {
            "once" => {
                let current = self.current_file_name();
                debug!("pragma once in {}", current);
                self.preprocessor.include_once.mark_pragma_once(&current);
                Ok(DirectiveOutcome::Done)
            }
            "pack" => {
                // Passed through for the consumer to interpret.
                let mut text = String::from("#pragma");
                for token in rest {
                    text.push_str(&token.text);
                }
                Ok(DirectiveOutcome::Emit(text))
            }
            name => Err(PreprocessError::Directive {
                line_no,
                message: format!("Unsupported pragma {} on line {}", name, line_no),
            }),
        }
    }

    fn process_include(
        &mut self,
        rest: &[Token],
        line_no: usize,
    ) -> Result<DirectiveOutcome, PreprocessError> {
        if self.preprocessor.conditionals.suppressing() {
            return Ok(DirectiveOutcome::Done);
        }
        let (name, quoted) = parse_include_target(rest, line_no)?;
        if self.preprocessor.ignore_headers.contains(&name) {
            debug!("ignoring header {}", name);
            return Ok(DirectiveOutcome::Done);
        }

        let anchor = if quoted {
            Some(self.current_file_name())
        } else {
            None
        };
        let Preprocessor {
            headers,
            include_once,
            defines,
            ..
        } = &mut self.preprocessor;
        let include_once = &*include_once;
        let defines = &*defines;
        let opened = headers.open_header(&name, anchor.as_deref(), |path| {
            include_once.should_skip(path, defines)
        });

        match opened {
            OpenedHeader::Skip => Ok(DirectiveOutcome::Done),
            OpenedHeader::NotFound => Err(PreprocessError::Directive {
                line_no,
                message: format!(
                    "Line {} includes a file {} that can't be found",
                    line_no, name
                ),
            }),
            OpenedHeader::Source(source) => Ok(DirectiveOutcome::Push(source)),
        }
    }
}

fn strip_trailing_newline(tokens: &[Token]) -> Vec<Token> {
    let end = if tokens
        .last()
        .map(|token| token.kind == TokenKind::Newline)
        .unwrap_or(false)
    {
        tokens.len() - 1
    } else {
        tokens.len()
    };
    tokens[..end].to_vec()
}

fn function_body(tokens: &[Token]) -> Vec<Token> {
    let start = if tokens
        .first()
        .map(|token| token.kind == TokenKind::Whitespace)
        .unwrap_or(false)
    {
        1
    } else {
        0
    };
    strip_trailing_newline(&tokens[start..])
}

/// Collects parameter names between the parens of a function-like define.
/// `start` indexes the first token after `(`. Whitespace-only slots are
/// dropped. Returns `None` when the list never closes on this line.
fn parse_parameter_list(tokens: &[Token], start: usize) -> Option<(Vec<String>, usize)> {
    let mut parameters = Vec::new();
    let mut current = String::new();
    let mut index = start;

    while index < tokens.len() {
        let token = &tokens[index];
        if token.is_symbol(")") {
            if !current.trim().is_empty() {
                parameters.push(current.trim().to_string());
            }
            return Some((parameters, index + 1));
        }
        if token.is_symbol(",") {
            if !current.trim().is_empty() {
                parameters.push(current.trim().to_string());
            }
            current.clear();
        } else if token.kind == TokenKind::Newline {
            return None;
        } else {
            current.push_str(&token.text);
        }
        index += 1;
    }
    None
}

fn condition_label(tokens: &[Token]) -> String {
    let text: String = tokens.iter().map(|token| token.text.as_str()).collect();
    text.trim().to_string()
}

fn parse_include_target(
    tokens: &[Token],
    line_no: usize,
) -> Result<(String, bool), PreprocessError> {
    let Some(index) = tokens.iter().position(|token| !token.is_whitespace) else {
        return Err(PreprocessError::Directive {
            line_no,
            message: format!("Invalid include on line {}", line_no),
        });
    };
    let token = &tokens[index];

    if token.kind == TokenKind::String {
        let name = strip_string_quotes(&token.text);
        if name.is_empty() {
            return Err(PreprocessError::Directive {
                line_no,
                message: format!("Empty include name on line {}", line_no),
            });
        }
        return Ok((name, true));
    }

    if token.is_symbol("<") {
        let mut name = String::new();
        for token in &tokens[index + 1..] {
            if token.is_symbol(">") {
                if name.is_empty() {
                    return Err(PreprocessError::Directive {
                        line_no,
                        message: format!("Empty include name on line {}", line_no),
                    });
                }
                return Ok((name, false));
            }
            if token.kind == TokenKind::Newline {
                break;
            }
            name.push_str(&token.text);
        }
        return Err(PreprocessError::Directive {
            line_no,
            message: format!("Missing closing '>' for include on line {}", line_no),
        });
    }

    Err(PreprocessError::Directive {
        line_no,
        message: format!(
            "Invalid include on line {}, got {:?} for include name",
            line_no, token.text
        ),
    })
}

// The lexer guarantees a String token starts with an optional prefix plus
// a quote and ends with a quote.
fn strip_string_quotes(text: &str) -> String {
    match text.find('"') {
        Some(start) => text[start + 1..text.len() - 1].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{parse_include_target, parse_parameter_list};
    use crate::lexer::lex_line;

    #[test]
    fn test_parse_parameter_list() {
        // Tokens for: a, b ) tail
        let tokens = lex_line(0, "a, b) tail").unwrap();
        let (parameters, after) = parse_parameter_list(&tokens, 0).unwrap();
        assert_eq!(parameters, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tokens[after].text, " ");
    }

    #[test]
    fn test_parameter_list_drops_blank_slots() {
        let tokens = lex_line(0, "a, , b)").unwrap();
        let (parameters, _) = parse_parameter_list(&tokens, 0).unwrap();
        assert_eq!(parameters, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parameter_list_unterminated() {
        let tokens = lex_line(0, "a, b").unwrap();
        assert_eq!(parse_parameter_list(&tokens, 0), None);
    }

    #[test]
    fn test_include_targets() {
        let quoted = lex_line(0, " \"dir/name.h\"").unwrap();
        assert_eq!(
            parse_include_target(&quoted, 0).unwrap(),
            ("dir/name.h".to_string(), true)
        );

        let angled = lex_line(0, " <sys/types.h>").unwrap();
        assert_eq!(
            parse_include_target(&angled, 0).unwrap(),
            ("sys/types.h".to_string(), false)
        );

        let empty = lex_line(0, " \"\"").unwrap();
        assert!(parse_include_target(&empty, 0).is_err());

        let unclosed = lex_line(0, " <name.h").unwrap();
        assert!(parse_include_target(&unclosed, 0).is_err());

        let invalid = lex_line(0, " name.h").unwrap();
        assert!(parse_include_target(&invalid, 0).is_err());
    }
}
