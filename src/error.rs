use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}.")]
    JSONParseError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YAMLParseError(#[from] serde_yaml::Error),

    /// Content matched none of the known data formats.
    #[error("Cannot parse data{path} as one of the supported formats of {formats}. {reasons}")]
    ParseError { path: String, formats: String, reasons: String },

    /// `assign` was called on a key holding a sequence or a scalar.
    #[error("Key not assigned: '{file}' '{key}' is not an object.")]
    AssignTargetError { key: String, file: String },

    #[error("Cannot find root: '{cwd}' does not exist.")]
    CwdNotFound { cwd: String },

    #[error("No root path: cannot find package.json in '{cwd}' or its parents.")]
    ModuleRootNotFound { cwd: String },

    #[error("Cannot find {path}. Given path is not a module.")]
    NotAModule { path: String },

    #[error("Unknown package manager: {0}")]
    UnknownPackageManager(String),

    #[error("Cannot overwrite non-directory '{target}' with directory '{source_path}'.")]
    CopyTargetError { source_path: String, target: String },

    #[error("Failed to parse ignore pattern. Original error: {0}")]
    GlobSetParseError(#[from] globset::Error),

    #[error("Cannot traverse directory. Original error: {0}")]
    WalkDirError(#[from] walkdir::Error),

    /// A child process has finished with a non-zero status.
    #[error("Command '{command}' failed with status: {status}")]
    CommandExecutionError { command: String, status: ExitStatus },

    #[error("Cannot resolve bin: \"{executable}\" in \"{module}\" module.")]
    BinNotFound { executable: String, module: String },

    #[error("Formatter '{program}' failed with status: {status}")]
    FormatterError { program: String, status: ExitStatus },

    #[error("Invalid data path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience type alias for Results with the crate error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(crate::constants::exit_codes::FAILURE);
}
