use crate::constants::verbosity;
use crate::data_file::ModifyCondition;
use crate::format::FileFormat;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde_json::Value;
use std::path::PathBuf;

/// CLI arguments for intermodular.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the value at a path of a data file as JSON.
    Get(GetArgs),
    /// Set the value at a path of a data file.
    Set(SetArgs),
    /// Delete the value at a path of a data file.
    Delete(DeleteArgs),
    /// Shallow-merge a JSON object into the object at a path of a data file.
    Assign(AssignArgs),
    /// Move keys of an object to the front, or sort them when no keys are given.
    OrderKeys(OrderKeysArgs),
    /// Copy files from a source module into a target module.
    Copy(CopyArgs),
}

/// Conditions a mutation must meet, all of them when several are given.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConditionArgs {
    /// Only if the path exists.
    #[arg(long)]
    pub if_exists: bool,

    /// Only if the path does not exist.
    #[arg(long)]
    pub if_not_exists: bool,

    /// Only if the current value equals this JSON value.
    #[arg(long, value_name = "JSON")]
    pub if_equal: Option<String>,

    /// Only if the current value differs from this JSON value.
    #[arg(long, value_name = "JSON")]
    pub if_not_equal: Option<String>,
}

impl ConditionArgs {
    pub fn to_condition(&self) -> ModifyCondition {
        let mut condition = ModifyCondition::new();
        if self.if_exists {
            condition = condition.if_exists();
        }
        if self.if_not_exists {
            condition = condition.if_not_exists();
        }
        if let Some(value) = &self.if_equal {
            condition = condition.if_equal(parse_value(value));
        }
        if let Some(value) = &self.if_not_equal {
            condition = condition.if_not_equal(parse_value(value));
        }
        condition
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Save the file even when its content on disk is equivalent.
    #[arg(short, long)]
    pub force: bool,

    /// Format of a new file whose extension is not known.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub default_format: Option<FileFormat>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GetArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dot separated path, e.g. `scripts.test` or `files[0]`.
    #[arg(value_name = "PATH")]
    pub path: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SetArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(value_name = "PATH")]
    pub path: String,

    /// JSON value. Anything which is not JSON is taken as a string.
    #[arg(value_name = "VALUE")]
    pub value: String,

    #[command(flatten)]
    pub conditions: ConditionArgs,

    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub conditions: ConditionArgs,

    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AssignArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON object to merge.
    #[arg(value_name = "JSON")]
    pub data: String,

    /// Object to merge into. Defaults to the root of the file.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    #[command(flatten)]
    pub conditions: ConditionArgs,

    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OrderKeysArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Keys to put first, in this order.
    #[arg(value_name = "KEYS")]
    pub keys: Vec<String>,

    /// Object whose keys are ordered. Defaults to the root of the file.
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CopyArgs {
    /// Directory inside the source module.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory inside the target module.
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// File or directory to copy, relative to the source module root.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Destination relative to the target module root. Defaults to PATH.
    #[arg(value_name = "TARGET_PATH")]
    pub target_path: Option<PathBuf>,

    /// Overwrite existing files of the target module.
    #[arg(long)]
    pub overwrite: bool,

    /// Glob of entries to skip, relative to PATH.
    #[arg(long, value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Print copied files only, leaving directories out.
    #[arg(long)]
    pub files_only: bool,
}

/// Parse command line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses `input` as JSON, falling back to a plain string.
pub fn parse_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
