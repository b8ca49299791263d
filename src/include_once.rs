// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use crate::{conditional::FrameKind, macro_map::MacroMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeOnceEntry {
    PragmaOnce,
    /// The whole file was wrapped in one `#ifdef`/`#ifndef` conditional.
    FullFileGuard { label: String, kind: FrameKind },
}

/// Tracks which header paths may be skipped on re-inclusion.
///
/// `#pragma once` skips unconditionally. A full-file guard skips only
/// while re-reading the file would still produce nothing: an `#ifndef`
/// guard skips while the label is defined, an `#ifdef` guard while it is
/// not. A later entry for the same path overwrites the earlier one.
#[derive(Debug, Default)]
pub struct IncludeOnceRegistry {
    entries: HashMap<String, IncludeOnceEntry>,
}

impl IncludeOnceRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn mark_pragma_once(&mut self, path: &str) {
        self.entries
            .insert(path.to_string(), IncludeOnceEntry::PragmaOnce);
    }

    pub fn record_guard(&mut self, path: &str, label: String, kind: FrameKind) {
        self.entries
            .insert(path.to_string(), IncludeOnceEntry::FullFileGuard { label, kind });
    }

    pub fn get(&self, path: &str) -> Option<&IncludeOnceEntry> {
        self.entries.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn should_skip(&self, path: &str, defines: &MacroMap) -> bool {
        match self.entries.get(path) {
            None => false,
            Some(IncludeOnceEntry::PragmaOnce) => true,
            Some(IncludeOnceEntry::FullFileGuard { label, kind }) => match kind {
                FrameKind::IfDef => !defines.contains(label),
                FrameKind::IfNdef => defines.contains(label),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::IncludeOnceRegistry;
    use crate::{conditional::FrameKind, macro_map::MacroMap};

    #[test]
    fn test_unknown_path_not_skipped() {
        let registry = IncludeOnceRegistry::new();
        assert_eq!(registry.should_skip("a.h", &MacroMap::new()), false);
    }

    #[test]
    fn test_pragma_once_always_skips() {
        let mut registry = IncludeOnceRegistry::new();
        registry.mark_pragma_once("a.h");
        assert_eq!(registry.should_skip("a.h", &MacroMap::new()), true);
    }

    #[test]
    fn test_ifndef_guard_follows_label() {
        let mut registry = IncludeOnceRegistry::new();
        registry.record_guard("a.h", "A_H".to_string(), FrameKind::IfNdef);

        let mut defines = MacroMap::new();
        assert_eq!(registry.should_skip("a.h", &defines), false);

        defines.define_object("A_H", vec![]);
        assert_eq!(registry.should_skip("a.h", &defines), true);

        defines.remove("A_H");
        assert_eq!(registry.should_skip("a.h", &defines), false);
    }

    #[test]
    fn test_ifdef_guard_is_inverse() {
        let mut registry = IncludeOnceRegistry::new();
        registry.record_guard("a.h", "WANTED".to_string(), FrameKind::IfDef);

        let mut defines = MacroMap::new();
        assert_eq!(registry.should_skip("a.h", &defines), true);

        defines.define_object("WANTED", vec![]);
        assert_eq!(registry.should_skip("a.h", &defines), false);
    }

    #[test]
    fn test_later_entry_overwrites() {
        let mut registry = IncludeOnceRegistry::new();
        registry.record_guard("a.h", "A_H".to_string(), FrameKind::IfNdef);
        registry.mark_pragma_once("a.h");
        assert_eq!(registry.should_skip("a.h", &MacroMap::new()), true);
    }
}
