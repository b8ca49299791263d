// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use crate::{error::PreprocessError, lexer::lex_line, token::Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroDefinition {
    /// Replacement token list; may be empty (`#define FOO`).
    ObjectLike(Vec<Token>),
    /// Parameter names plus the replacement token list.
    FunctionLike(Vec<String>, Vec<Token>),
}

/// The macro table. Redefinition replaces the previous entry wholesale.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MacroMap {
    macros: HashMap<String, MacroDefinition>,
}

impl MacroMap {
    pub fn new() -> Self {
        Self {
            macros: HashMap::new(),
        }
    }

    /// Seeds the table from name/value string pairs (platform and
    /// user-supplied constants). Each value is lexed; multi-token and
    /// empty values are both allowed.
    pub fn from_key_values(
        constants: &HashMap<String, String>,
    ) -> Result<Self, PreprocessError> {
        let mut map = Self::new();
        for (key, value) in constants {
            map.define_from_value(key, value)?;
        }
        Ok(map)
    }

    pub fn define_from_value(&mut self, key: &str, value: &str) -> Result<(), PreprocessError> {
        let tokens = lex_line(0, value)?;
        self.macros
            .insert(key.to_string(), MacroDefinition::ObjectLike(tokens));
        Ok(())
    }

    pub fn define_object(&mut self, key: &str, body: Vec<Token>) {
        self.macros
            .insert(key.to_string(), MacroDefinition::ObjectLike(body));
    }

    pub fn define_function(&mut self, key: &str, parameters: Vec<String>, body: Vec<Token>) {
        self.macros.insert(
            key.to_string(),
            MacroDefinition::FunctionLike(parameters, body),
        );
    }

    /// Returns whether the name was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.macros.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.macros.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&MacroDefinition> {
        self.macros.get(key)
    }
}
