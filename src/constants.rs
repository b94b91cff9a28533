//! Constants used throughout intermodular

/// Manifest file marking the root of a module
pub const PACKAGE_FILE: &str = "package.json";

/// TypeScript configuration file looked up in module roots
pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// Lock files used to detect the package manager of a module
pub const YARN_LOCK_FILE: &str = "yarn.lock";
pub const NPM_LOCK_FILE: &str = "package-lock.json";

/// Directory containing executables of installed dependencies
pub const BIN_DIR: &str = "node_modules/.bin";

/// Dependencies directory
pub const NODE_MODULES: &str = "node_modules";

/// Formatter configuration files in order of preference
pub const FORMATTER_CONFIG_FILENAMES: &[&str] =
    &[".prettierrc", ".prettierrc.json", ".prettierrc.yaml", ".prettierrc.yml"];

/// Extensions compared as source code by `are_equivalent_files`
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "ts"];

/// Modules whose presence marks a module as compiled
pub const COMPILER_MODULES: &[&str] = &["babel-cli", "babel-preset-env"];

/// Environment variable set by npm/yarn to the directory the install was started from
pub const INIT_CWD: &str = "INIT_CWD";

/// Largest number of `null` slots a sequence is padded with when setting past its end
pub const MAX_SEQUENCE_GROWTH: usize = 10_000;

/// Default formatting
pub mod formatting {
    pub const DEFAULT_TAB_WIDTH: usize = 2;
}

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
