// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use log::debug;

use crate::file_provider::{FileProvider, SourceFile};

pub enum OpenedHeader {
    Source(SourceFile),
    /// The include-once machinery decided the file would produce nothing.
    Skip,
    NotFound,
}

/// Resolves include names to provider paths.
///
/// Quoted includes search the including file's directory first, then the
/// configured include paths; angle includes search only the include paths.
/// Resolutions are cached by include name alone, so the first resolution
/// of a name wins for the rest of the run regardless of which file asks.
pub struct HeaderResolver<T>
where
    T: FileProvider,
{
    provider: T,
    include_paths: Vec<String>,
    resolved: HashMap<String, String>,
}

impl<T> HeaderResolver<T>
where
    T: FileProvider,
{
    pub fn new(provider: T, include_paths: Vec<String>) -> Self {
        Self {
            provider,
            include_paths,
            resolved: HashMap::new(),
        }
    }

    /// Pins a name to a path ahead of any lookup.
    pub fn preresolve(&mut self, name: &str, path: &str) {
        self.resolved.insert(name.to_string(), path.to_string());
    }

    /// Opens the header `name`. `anchor` is the including file's path for
    /// quoted includes, `None` for angle includes. `skip` is consulted on
    /// cache hits only; a fresh resolution always opens the file (probing
    /// is how resolution works).
    pub fn open_header(
        &mut self,
        name: &str,
        anchor: Option<&str>,
        skip: impl Fn(&str) -> bool,
    ) -> OpenedHeader {
        if let Some(path) = self.resolved.get(name) {
            if skip(path) {
                debug!("skipping header {} -> {}", name, path);
                return OpenedHeader::Skip;
            }
            return match self.provider.open_file(path) {
                Some(source) => OpenedHeader::Source(source),
                None => OpenedHeader::NotFound,
            };
        }

        let mut directories = Vec::with_capacity(self.include_paths.len() + 1);
        if let Some(anchor) = anchor {
            directories.push(dirname(anchor).to_string());
        }
        directories.extend(self.include_paths.iter().cloned());

        for directory in directories {
            let path = normalize(&join(&directory, name));
            if let Some(source) = self.provider.open_file(&path) {
                debug!("resolved header {} -> {}", name, path);
                self.resolved.insert(name.to_string(), path);
                return OpenedHeader::Source(source);
            }
        }

        OpenedHeader::NotFound
    }
}

// Include names are POSIX-style strings on every host; the helpers below
// deliberately avoid std::path so that behavior never varies by platform.

pub(crate) fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => "",
    }
}

pub(crate) fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() || name.starts_with('/') {
        name.to_string()
    } else if directory.ends_with('/') {
        format!("{}{}", directory, name)
    } else {
        format!("{}/{}", directory, name)
    }
}

pub(crate) fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(&"..")) || (parts.is_empty() && !absolute) {
                    parts.push("..");
                } else if !parts.is_empty() {
                    parts.pop();
                }
                // ".." above an absolute root is dropped
            }
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
