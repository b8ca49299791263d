// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use simplecpp::{
    FileProvider, Preprocessor, PreprocessorOptions,
    native_file_provider::NativeFileProvider,
};

/// Expands a C-style header into directive-free text.
#[derive(Parser)]
#[command(name = "simplecpp", version, about)]
struct Args {
    /// Source file to preprocess.
    #[arg(long)]
    input_file: PathBuf,

    /// Destination for the expanded text.
    #[arg(long)]
    output_file: PathBuf,

    /// Directory searched for included headers; may be repeated.
    #[arg(long = "include-path")]
    include_paths: Vec<String>,

    /// Include name dropped instead of resolved; may be repeated.
    #[arg(long = "ignore-header")]
    ignore_headers: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let input_path = args.input_file.to_string_lossy().into_owned();
    let provider = NativeFileProvider::new();
    let root = provider
        .open_file(&input_path)
        .ok_or_else(|| format!("Failed to open input file '{}'", input_path))?;

    let options = PreprocessorOptions {
        include_paths: args.include_paths.clone(),
        ignore_headers: args.ignore_headers.clone(),
        ..PreprocessorOptions::default()
    };
    let preprocessor = Preprocessor::new(provider, options).map_err(|error| error.to_string())?;

    let output_file = File::create(&args.output_file).map_err(|error| {
        format!(
            "Failed to create output file '{}': {}",
            args.output_file.display(),
            error
        )
    })?;
    let mut writer = BufWriter::new(output_file);

    for fragment in preprocessor.preprocess(root) {
        let fragment = fragment.map_err(|error| error.to_string())?;
        writer
            .write_all(fragment.as_bytes())
            .map_err(|error| format!("Failed to write output: {}", error))?;
    }
    writer
        .flush()
        .map_err(|error| format!("Failed to write output: {}", error))
}
