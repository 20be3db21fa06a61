//! Nixvm CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nixvm_language::VmConfig;
use nixvm_runtime::{init_logging, run_file};

#[derive(Parser, Debug)]
#[command(name = "nixvm", version)]
#[command(about = "Run a Nixvm program listing or .nixb image")]
struct Cli {
    /// Program to run
    program: PathBuf,

    /// Stop after this many instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let mut config = VmConfig::default();
    if let Some(limit) = cli.max_steps {
        config = config.with_max_steps(limit);
    }

    match run_file(&cli.program, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(context) = &err.context {
                eprintln!("  {context}");
            }
            ExitCode::FAILURE
        }
    }
}
