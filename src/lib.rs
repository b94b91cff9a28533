/// Handles argument parsing and runs subcommands.
pub mod cli;

/// Discovery of per-tool configuration in a module.
pub mod config;

pub mod constants;

/// Conditional editing of JSON and YAML data files.
pub mod data_file;

/// Defines custom error types.
pub mod error;

/// Extension traits for standard library types.
pub mod ext;

/// Parsing and serialization of the supported data formats.
pub mod format;

/// Code formatting of serialized output.
pub mod formatter;

/// A source/target pair of modules.
pub mod intermodular;

/// A set of helpers for working with the file system.
pub mod ioutils;

/// Log messages.
pub mod messages;

/// Node.js modules: files, dependencies and commands.
pub mod module;
