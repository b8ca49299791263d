// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::io::{BufRead, Cursor};

/// A named, ordered sequence of text lines.
///
/// The reader is pulled lazily by the pipeline; dropping the `SourceFile`
/// (or the open-file frame holding its reader) releases the resource.
pub struct SourceFile {
    name: String,
    reader: Box<dyn BufRead>,
}

impl SourceFile {
    pub fn new(name: &str, reader: Box<dyn BufRead>) -> Self {
        Self {
            name: name.to_string(),
            reader,
        }
    }

    pub fn from_string(name: &str, content: &str) -> Self {
        Self::new(name, Box::new(Cursor::new(content.to_string())))
    }

    pub fn from_lines(name: &str, lines: &[&str]) -> Self {
        Self::from_string(name, &lines.concat())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, Box<dyn BufRead>) {
        (self.name, self.reader)
    }
}

/// The seam between the pipeline and file storage. Paths are plain
/// strings; resolution happens before this trait is consulted.
pub trait FileProvider {
    /// Opens the file at `path`, or `None` when it does not exist.
    fn open_file(&self, path: &str) -> Option<SourceFile>;
}
