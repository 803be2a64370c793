//! cpp2c — C-linkage wrapper generator for C++ headers.
//!
//! Parses a C++ header via libclang and emits a flat extern-C ABI: a header
//! of opaque handles and prototypes, a `.cpp` of thunks forwarding into the
//! original C++, and optionally a `.def` export list for dynamic linkers.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! let opts = cpp2c::config::Options::new(PathBuf::from("Foo.h"));
//! // Writes Foo_C_Wrapper.h / .cpp / .def into the current directory.
//! cpp2c::run(&opts).unwrap();
//! ```
//!
//! The translation engine itself is parser-independent: anything that
//! implements [`model::DeclSource`] can be fed to
//! [`generate_from_decls`], which is how the integration tests drive it
//! without libclang.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::info;

pub mod config;
pub mod context;
pub mod emit;
pub mod lower;
pub mod mangle;
pub mod model;
pub mod parse;

/// Run the full pipeline: parse the header, translate, and write the output
/// files into the current working directory.
///
/// Returns the paths written. All buffers are flushed together after the
/// whole translation succeeded, so a failing run leaves no partial files.
pub fn run(opts: &config::Options) -> Result<Vec<PathBuf>> {
    let outputs = generate(opts)?;

    let base = std::env::current_dir()?.join(&outputs.base_name);
    let mut written = Vec::new();

    let header_path = base.with_extension("h");
    std::fs::write(&header_path, &outputs.header)
        .with_context(|| format!("writing {}", header_path.display()))?;
    written.push(header_path);

    let cpp_path = base.with_extension("cpp");
    std::fs::write(&cpp_path, &outputs.cpp)
        .with_context(|| format!("writing {}", cpp_path.display()))?;
    written.push(cpp_path);

    if let Some(def) = &outputs.def {
        let def_path = base.with_extension("def");
        std::fs::write(&def_path, def)
            .with_context(|| format!("writing {}", def_path.display()))?;
        written.push(def_path);
    }

    info!(
        base = %outputs.base_name,
        files = written.len(),
        "wrote generated wrapper"
    );
    Ok(written)
}

/// Parse the header and return the generated text without touching disk.
pub fn generate(opts: &config::Options) -> Result<emit::Outputs> {
    if let Some(parser_path) = &opts.parser_path {
        // Honored when libclang is located at load time.
        unsafe { std::env::set_var("LIBCLANG_PATH", parser_path) };
    }

    let clang = clang::Clang::new()
        .map_err(|e| anyhow::anyhow!("failed to initialize libclang: {e}"))?;
    let index = clang::Index::new(&clang, false, false);

    let tu = parse::parse_header(&index, opts)?;
    let source = parse::ClangSource::extract(&tu, &opts.header_file_path)?;

    let header_file_name = opts
        .header_file_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("header path has no file name")?
        .to_string();

    generate_from_decls(&source, &header_file_name, &opts.gen_options())
}

/// Translate an already-extracted declaration source.
///
/// `header_file_name` is the input header's file name (`Foo.h`); it drives
/// the generated include, the header guard and the output base name.
pub fn generate_from_decls(
    src: &dyn model::DeclSource,
    header_file_name: &str,
    opts: &emit::GenOptions,
) -> Result<emit::Outputs> {
    let outputs = emit::translate(src, header_file_name, opts)?;
    info!(
        header = outputs.header.len(),
        cpp = outputs.cpp.len(),
        def = outputs.def.as_deref().map(str::len).unwrap_or(0),
        "generated wrapper text"
    );
    Ok(outputs)
}
