//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use std::io;

use vistazo_core::VistazoError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments or configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (undecodable image, corrupt snapshot).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file, or the index has not been built.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (vector search).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Process exit code plus the rendered error chain.
pub struct ExitCode {
    pub code: i32,
    pub message: String,
}

impl ExitCode {
    /// Classify by the first library or I/O error found in the chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<VistazoError>() {
                    Some(classify(e))
                } else {
                    cause.downcast_ref::<io::Error>().map(classify_io)
                }
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: format!("{err:#}"),
        }
    }
}

fn classify(err: &VistazoError) -> i32 {
    if err.is_network() {
        return NETWORK_ERROR;
    }
    match err {
        VistazoError::IndexMissing { .. } => INPUT_ERROR,
        VistazoError::InvalidConfig(_) => USAGE_ERROR,
        VistazoError::Io(e) => classify_io(e),
        _ => DATA_ERROR,
    }
}

fn classify_io(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::NotFound => INPUT_ERROR,
        _ => IO_ERROR,
    }
}
