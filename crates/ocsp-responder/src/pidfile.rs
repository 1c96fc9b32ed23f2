//! PID file for process supervision

use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_PIDFILE: &str = "PIDFILE";

#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("Failed to access PID file {path}: {message}")]
    Io { path: String, message: String },

    #[error("PID file {path} does not contain a process id: {content:?}")]
    Invalid { path: String, content: String },
}

fn io_error(path: &Path, e: std::io::Error) -> PidFileError {
    PidFileError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Record the current process id
pub fn write(path: &Path) -> Result<u32, PidFileError> {
    let pid = std::process::id();
    fs::write(path, pid.to_string()).map_err(|e| io_error(path, e))?;
    Ok(pid)
}

pub fn read(path: &Path) -> Result<u32, PidFileError> {
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    content.trim().parse().map_err(|_| PidFileError::Invalid {
        path: path.display().to_string(),
        content,
    })
}

/// Remove the file. A missing file is not an error.
pub fn remove(path: &Path) -> Result<(), PidFileError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}
