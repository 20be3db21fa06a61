//! Program image serialization using `MessagePack`.
//!
//! An image is an assembled [`Program`] wrapped with a format version, so a
//! listing can be assembled once and loaded later without the assembler.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nixvm_foundation::{Error, ErrorKind, Result};
use nixvm_language::Program;
use serde::{Deserialize, Serialize};

/// File extension of program images.
pub const IMAGE_EXTENSION: &str = "nixb";

/// Current image format version.
pub const IMAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Image {
    version: u32,
    program: Program,
}

/// Serializes a program to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(program: &Program) -> Result<Vec<u8>> {
    let image = Image {
        version: IMAGE_VERSION,
        program: program.clone(),
    };
    rmp_serde::to_vec_named(&image)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a program from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not an image or the image has another
/// format version.
pub fn from_bytes(bytes: &[u8]) -> Result<Program> {
    let image: Image = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))?;
    if image.version != IMAGE_VERSION {
        return Err(Error::new(ErrorKind::SerializationError(format!(
            "unsupported image version {} (expected {IMAGE_VERSION})",
            image.version
        ))));
    }
    Ok(image.program)
}

/// Saves a program image to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(program: &Program, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(program)?;
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))?;

    Ok(())
}

/// Loads a program image from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Program> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;

    from_bytes(&bytes)
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to {action} file '{}': {err}",
        path.display()
    )))
}
