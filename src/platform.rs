// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::HashMap;

use chrono::Local;

use crate::error::PreprocessError;

/// Returns the host `(system, bitness)` pair, e.g. `("Linux", "64bit")`.
pub fn extract_platform_spec() -> (&'static str, &'static str) {
    let system = match std::env::consts::OS {
        "linux" => "Linux",
        "windows" => "Windows",
        other => other,
    };
    let bitness = if cfg!(target_pointer_width = "64") {
        "64bit"
    } else {
        "32bit"
    };
    (system, bitness)
}

/// Seed macros for the given platform. The sets mirror what compilers
/// predefine on those targets, far enough for header consumption.
pub fn platform_constants_for(
    system: &str,
    bitness: &str,
) -> Result<HashMap<String, String>, PreprocessError> {
    let mut constants = match system {
        "Windows" => windows_constants(bitness)?,
        "Linux" => linux_constants(bitness)?,
        _ => {
            return Err(PreprocessError::UnsupportedPlatform {
                message: format!("Unsupported platform {}", system),
            });
        }
    };
    insert(&mut constants, "__SIZE_TYPE__", "size_t");
    Ok(constants)
}

/// Host seed macros, including the `__DATE__`/`__TIME__` snapshot taken at
/// construction time.
pub fn calculate_platform_constants() -> Result<HashMap<String, String>, PreprocessError> {
    let (system, bitness) = extract_platform_spec();
    let mut constants = platform_constants_for(system, bitness)?;

    let now = Local::now();
    constants.insert(
        "__DATE__".to_string(),
        format!("\"{}\"", now.format("%b %e %Y")),
    );
    constants.insert(
        "__TIME__".to_string(),
        format!("\"{}\"", now.format("%H:%M:%S")),
    );
    Ok(constants)
}

fn windows_constants(bitness: &str) -> Result<HashMap<String, String>, PreprocessError> {
    let mut constants = HashMap::new();
    match bitness {
        "32bit" => insert(&mut constants, "_WIN32", "1"),
        "64bit" => insert(&mut constants, "_WIN64", "1"),
        _ => return Err(unsupported_bitness(bitness)),
    }
    insert(&mut constants, "CALLBACK", "__stdcall");
    insert(&mut constants, "IN", "");
    insert(&mut constants, "OUT", "");
    Ok(constants)
}

fn linux_constants(bitness: &str) -> Result<HashMap<String, String>, PreprocessError> {
    let mut constants = HashMap::new();
    // __linux__ stays defined as itself, matching GCC's self-referential
    // predefinition.
    insert(&mut constants, "__linux__", "__linux__");
    match bitness {
        "32bit" => {
            insert(&mut constants, "__i386__", "1");
            insert(&mut constants, "__i386", "1");
            insert(&mut constants, "i386", "1");
        }
        "64bit" => {
            insert(&mut constants, "__x86_64__", "1");
            insert(&mut constants, "__x86_64", "1");
            insert(&mut constants, "__amd64__", "1");
            insert(&mut constants, "__amd64", "1");
        }
        _ => return Err(unsupported_bitness(bitness)),
    }
    Ok(constants)
}

fn insert(constants: &mut HashMap<String, String>, key: &str, value: &str) {
    constants.insert(key.to_string(), value.to_string());
}

fn unsupported_bitness(bitness: &str) -> PreprocessError {
    PreprocessError::UnsupportedPlatform {
        message: format!("Unsupported bitness {}", bitness),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::platform_constants_for;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_linux_32bit() {
        assert_eq!(
            platform_constants_for("Linux", "32bit").unwrap(),
            map(&[
                ("__linux__", "__linux__"),
                ("__i386__", "1"),
                ("__i386", "1"),
                ("i386", "1"),
                ("__SIZE_TYPE__", "size_t"),
            ])
        );
    }

    #[test]
    fn test_linux_64bit() {
        assert_eq!(
            platform_constants_for("Linux", "64bit").unwrap(),
            map(&[
                ("__linux__", "__linux__"),
                ("__x86_64__", "1"),
                ("__x86_64", "1"),
                ("__amd64__", "1"),
                ("__amd64", "1"),
                ("__SIZE_TYPE__", "size_t"),
            ])
        );
    }

    #[test]
    fn test_windows_32bit() {
        assert_eq!(
            platform_constants_for("Windows", "32bit").unwrap(),
            map(&[
                ("_WIN32", "1"),
                ("CALLBACK", "__stdcall"),
                ("IN", ""),
                ("OUT", ""),
                ("__SIZE_TYPE__", "size_t"),
            ])
        );
    }

    #[test]
    fn test_windows_64bit() {
        assert_eq!(
            platform_constants_for("Windows", "64bit").unwrap(),
            map(&[
                ("_WIN64", "1"),
                ("CALLBACK", "__stdcall"),
                ("IN", ""),
                ("OUT", ""),
                ("__SIZE_TYPE__", "size_t"),
            ])
        );
    }

    #[test]
    fn test_unsupported_combinations() {
        assert!(platform_constants_for("Darwin", "64bit").is_err());
        assert!(platform_constants_for("Linux", "16bit").is_err());
    }
}
