// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! A standalone C-style text preprocessor.
//!
//! Resolves `#include`, expands object- and function-like `#define`
//! macros, evaluates `#if`/`#ifdef` conditional compilation, and emits
//! plain text for consumers (such as binding generators) that cannot
//! digest the full C macro language. Output is produced lazily: the
//! pipeline reads input lines only as the caller pulls fragments from
//! the [`preprocessor::Output`] iterator.
//!
//! ```
//! use simplecpp::memory_file_provider::MemoryFileProvider;
//! use simplecpp::{FileProvider, Preprocessor, PreprocessorOptions};
//! use std::collections::HashMap;
//!
//! let mut provider = MemoryFileProvider::new();
//! provider.add_file("header.h", "#define GREETING 1\nGREETING\n");
//!
//! let root = provider.open_file("header.h").unwrap();
//! let options = PreprocessorOptions {
//!     platform_constants: Some(HashMap::new()),
//!     ..PreprocessorOptions::default()
//! };
//! let preprocessor = Preprocessor::new(provider, options).unwrap();
//! let text: String = preprocessor
//!     .preprocess(root)
//!     .collect::<Result<String, _>>()
//!     .unwrap();
//! assert_eq!(text, "1\n");
//! ```

pub mod chunk;
pub mod conditional;
pub mod error;
pub mod expander;
pub mod expression;
pub mod file_provider;
pub mod header_resolver;
pub mod include_once;
pub mod lexer;
pub mod macro_map;
pub mod memory_file_provider;
pub mod native_file_provider;
pub mod platform;
pub mod preprocessor;
pub mod token;

pub use error::PreprocessError;
pub use file_provider::{FileProvider, SourceFile};
pub use preprocessor::{DEFAULT_LINE_ENDING, Output, Preprocessor, PreprocessorOptions};
