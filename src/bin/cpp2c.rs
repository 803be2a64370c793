//! CLI entry point for cpp2c.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cpp2c::config::{self, Options};

/// cpp2c — generate a flat C ABI wrapper for a C++ header.
#[derive(Parser, Debug)]
#[command(name = "cpp2c", version, about)]
struct Cli {
    /// The C++ header to wrap.
    header_file_path: PathBuf,

    /// The parser (xml generator) binary path.
    #[arg(short = 'g', long = "gccxml")]
    gccxml: Option<String>,

    /// The config file path.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Semicolon-separated include paths to look for header files.
    #[arg(short = 'i', long = "include")]
    include: Option<String>,

    /// The compiler type, forwarded to the parser.
    #[arg(short = 't', long = "compiler")]
    compiler: Option<String>,

    /// Don't generate a def file (and a DllMain() function under Windows).
    #[arg(short = 'd', long = "dl")]
    no_dl: bool,

    /// Don't add error output args.
    #[arg(short = 'e', long = "error")]
    no_error: bool,

    /// Don't generate exception handling code.
    #[arg(short = 'n', long = "nothrow")]
    nothrow: bool,

    /// Don't generate verbose output comments.
    #[arg(short = 'v', long = "verbose")]
    no_verbose: bool,

    /// Compiler with C99 support.
    #[arg(short = '9', long = "c99")]
    c99: bool,

    /// Don't generate operators.
    #[arg(short = 'o', long = "operator")]
    no_operators: bool,

    /// Output std::string in its full (non-compact) format.
    #[arg(short = 's', long = "string")]
    full_string: bool,

    /// Emit functions in UpperCamelCase instead of snake_case.
    #[arg(long)]
    camel: bool,

    /// Assume a public copy constructor for class declarations with no
    /// concrete classes.
    #[arg(long)]
    copy: bool,

    /// Assume a public default constructor and assignment operator for class
    /// declarations with no concrete classes.
    #[arg(long)]
    assign: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cpp2c=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut opts = Options::new(cli.header_file_path.clone());
    if let Some(config_path) = &cli.config {
        let file = config::load_config(config_path)?;
        opts.apply_file(&file);
    }

    // Command line beats the config file.
    if let Some(gccxml) = cli.gccxml {
        opts.parser_path = Some(gccxml);
    }
    if let Some(include) = cli.include {
        opts.include_paths = config::split_include_paths(&include);
    }
    if let Some(compiler) = cli.compiler {
        opts.compiler_type = Some(compiler);
    }
    if cli.no_dl {
        opts.generate_dl = false;
    }
    if cli.no_error {
        opts.generate_error_arg = false;
    }
    if cli.nothrow {
        opts.generate_exception_handling_code = false;
    }
    if cli.no_verbose {
        opts.is_verbose = false;
    }
    if cli.c99 {
        opts.is_c99 = true;
    }
    if cli.no_operators {
        opts.generate_operators = false;
    }
    if cli.full_string {
        opts.is_compact_string = false;
    }
    if cli.camel {
        opts.is_camel_case = true;
    }
    if cli.copy {
        opts.is_assume_copy = true;
    }
    if cli.assign {
        opts.is_assume_assign = true;
    }

    if opts.generate_error_arg && !opts.generate_exception_handling_code {
        info!("ignoring the error argument option: exception handling generation is disabled");
    }

    cpp2c::run(&opts)?;
    Ok(())
}
