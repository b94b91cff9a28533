pub mod args;
pub mod runner;

pub use args::{
    get_log_level_from_verbose, parse_cli, AssignArgs, Cli, Commands, ConditionArgs, CopyArgs,
    DeleteArgs, GetArgs, OrderKeysArgs, SaveArgs, SetArgs,
};
pub use runner::run;
