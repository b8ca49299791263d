// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{fs::File, io::BufReader};

use crate::file_provider::{FileProvider, SourceFile};

/// Reads files from the local filesystem.
#[derive(Debug, Default)]
pub struct NativeFileProvider;

impl NativeFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FileProvider for NativeFileProvider {
    fn open_file(&self, path: &str) -> Option<SourceFile> {
        let file = File::open(path).ok()?;
        Some(SourceFile::new(path, Box::new(BufReader::new(file))))
    }
}
