//! Command line, logging setup and program images for Nixvm.
//!
//! This crate provides:
//! - [`init_logging`] - `tracing` subscriber setup driven by `RUST_LOG`
//! - [`load_program`] and [`run_file`] - Loading listings or images and running them
//! - [`serialize`] - `MessagePack` program images

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod serialize;

use std::fs;
use std::path::Path;

use nixvm_foundation::{Error, ErrorKind, Result};
use nixvm_language::{Program, Vm, VmConfig, assemble_strict};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs a stderr `tracing` subscriber.
///
/// Use the `RUST_LOG` environment variable to override the default filter.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Returns true if `path` names a program image rather than a listing.
#[must_use]
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == serialize::IMAGE_EXTENSION)
}

/// Loads a program from an image or a listing.
///
/// Files ending in `.nixb` are decoded as images; anything else is
/// assembled as a listing, with block structure checked.
///
/// # Errors
/// Returns `IoError` if the file cannot be read, `ParseError` or
/// `InvalidJump` for a bad listing, and `SerializationError` for a bad image.
pub fn load_program(path: &Path) -> Result<Program> {
    let program = if is_image(path) {
        serialize::load_from_file(path)?
    } else {
        let source = fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorKind::IoError(format!(
                "failed to read '{}': {e}",
                path.display()
            )))
        })?;
        assemble_strict(&source)?
    };
    info!(path = %path.display(), instructions = program.len(), "loaded program");
    Ok(program)
}

/// Loads and runs a program file, printing to standard output.
///
/// # Errors
/// Returns the first load or runtime error, tagged with the file name.
pub fn run_file(path: &Path, config: VmConfig) -> Result<()> {
    let result = load_program(path).and_then(|program| {
        let mut vm = Vm::new(config);
        let result = vm.run(&program);
        debug!(steps = vm.steps(), "run complete");
        result
    });
    result.map_err(|mut err| {
        let context = err.context.take().unwrap_or_default();
        err.with_context(context.with_source(path.display().to_string()))
    })
}
