// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use crate::file_provider::{FileProvider, SourceFile};

/// An in-memory file tree, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: HashMap<String, String>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    pub fn add_file_lines(&mut self, path: &str, lines: &[&str]) {
        self.add_file(path, &lines.concat());
    }
}

impl FileProvider for MemoryFileProvider {
    fn open_file(&self, path: &str) -> Option<SourceFile> {
        self.files
            .get(path)
            .map(|content| SourceFile::from_string(path, content))
    }
}
