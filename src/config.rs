//! Configuration — resolved options plus the optional config file.
//!
//! Precedence is CLI > config file > built-in default; missing file keys
//! fall back silently. The file keeps the legacy section names
//! (`["Cpp2C Config"]`, `["GccXml Config"]`) as TOML tables.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::emit::GenOptions;

/// Fully resolved options for one generator run.
#[derive(Debug, Clone)]
pub struct Options {
    pub header_file_path: PathBuf,
    /// Path used to locate the parser library (`-g/--gccxml`).
    pub parser_path: Option<String>,
    pub include_paths: Vec<String>,
    /// Extra argument forwarded verbatim to the parser (`-t/--compiler`).
    pub compiler_type: Option<String>,
    pub generate_dl: bool,
    pub generate_error_arg: bool,
    pub generate_exception_handling_code: bool,
    pub is_verbose: bool,
    pub is_c99: bool,
    pub generate_operators: bool,
    pub is_compact_string: bool,
    pub is_camel_case: bool,
    pub is_assume_copy: bool,
    pub is_assume_assign: bool,
    pub ignore_unsupported_features: bool,
}

impl Options {
    pub fn new(header_file_path: PathBuf) -> Options {
        Options {
            header_file_path,
            parser_path: None,
            include_paths: Vec::new(),
            compiler_type: None,
            generate_dl: true,
            generate_error_arg: true,
            generate_exception_handling_code: true,
            is_verbose: true,
            is_c99: false,
            generate_operators: true,
            is_compact_string: true,
            is_camel_case: false,
            is_assume_copy: false,
            is_assume_assign: false,
            ignore_unsupported_features: true,
        }
    }

    /// Overlay the config file's values; CLI flags are applied on top by the
    /// caller.
    pub fn apply_file(&mut self, file: &ConfigFile) {
        let cpp2c = &file.cpp2c;
        apply(&mut self.generate_dl, cpp2c.generate_dl);
        apply(&mut self.generate_error_arg, cpp2c.generate_error_arg);
        apply(
            &mut self.generate_exception_handling_code,
            cpp2c.generate_exception_handling_code,
        );
        apply(&mut self.is_verbose, cpp2c.is_verbose);
        apply(&mut self.is_c99, cpp2c.is_c99);
        apply(&mut self.generate_operators, cpp2c.generate_operators);
        apply(&mut self.is_compact_string, cpp2c.is_compact_string);
        apply(&mut self.is_camel_case, cpp2c.is_camel_case);
        apply(&mut self.is_assume_copy, cpp2c.is_assume_copy);
        apply(&mut self.is_assume_assign, cpp2c.is_assume_assign);
        apply(
            &mut self.ignore_unsupported_features,
            cpp2c.ignore_unsupported_features,
        );

        let gccxml = &file.gccxml;
        if self.parser_path.is_none() {
            self.parser_path = gccxml.gccxml_file_path.clone();
        }
        if self.include_paths.is_empty()
            && let Some(paths) = &gccxml.include_paths
        {
            self.include_paths = split_include_paths(paths);
        }
        if self.compiler_type.is_none() {
            self.compiler_type = gccxml.compiler_type.clone();
        }
    }

    /// Engine options derived from the resolved settings.
    pub fn gen_options(&self) -> GenOptions {
        GenOptions {
            generate_dl: self.generate_dl,
            exceptions: self.generate_exception_handling_code,
            // The error argument only exists with exception interception.
            error_arg: self.generate_error_arg && self.generate_exception_handling_code,
            compact_string: self.is_compact_string,
            operators: self.generate_operators,
            assume_copy: self.is_assume_copy,
            assume_assign: self.is_assume_assign,
            verbose: self.is_verbose,
            c99: self.is_c99,
            camel_case: self.is_camel_case,
            ignore_unsupported: self.ignore_unsupported_features,
        }
    }
}

fn apply(slot: &mut bool, value: Option<bool>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Split a semicolon-separated include-path list.
pub fn split_include_paths(paths: &str) -> Vec<String> {
    paths
        .split(';')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// The config file: two sections, every key optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "Cpp2C Config", default)]
    pub cpp2c: Cpp2cSection,
    #[serde(rename = "GccXml Config", default)]
    pub gccxml: GccXmlSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct Cpp2cSection {
    pub generate_dl: Option<bool>,
    pub generate_error_arg: Option<bool>,
    pub generate_exception_handling_code: Option<bool>,
    pub is_verbose: Option<bool>,
    pub is_c99: Option<bool>,
    pub generate_operators: Option<bool>,
    pub is_compact_string: Option<bool>,
    pub is_camel_case: Option<bool>,
    pub is_assume_copy: Option<bool>,
    pub is_assume_assign: Option<bool>,
    pub ignore_unsupported_features: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GccXmlSection {
    pub gccxml_file_path: Option<String>,
    pub include_paths: Option<String>,
    pub compiler_type: Option<String>,
}

/// Load and parse a configuration file.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config: ConfigFile = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
    Ok(config)
}
