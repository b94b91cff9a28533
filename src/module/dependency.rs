use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{NPM_LOCK_FILE, YARN_LOCK_FILE};
use crate::error::{Error, Result};

/// Section of `package.json` a dependency is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    #[default]
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
}

impl DependencyType {
    pub const ALL: &'static [DependencyType] = &[
        DependencyType::Dependencies,
        DependencyType::DevDependencies,
        DependencyType::PeerDependencies,
        DependencyType::OptionalDependencies,
    ];

    /// Key of the section in `package.json`.
    pub fn key(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "dependencies",
            DependencyType::DevDependencies => "devDependencies",
            DependencyType::PeerDependencies => "peerDependencies",
            DependencyType::OptionalDependencies => "optionalDependencies",
        }
    }
}

impl Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
}

impl PackageManager {
    /// Package manager of the module at `root`, judged by its lock file. Defaults to npm.
    pub fn detect<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        if root.join(YARN_LOCK_FILE).exists() {
            PackageManager::Yarn
        } else if root.join(NPM_LOCK_FILE).exists() {
            PackageManager::Npm
        } else {
            PackageManager::default()
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Flag saving a package into `dependency_type`, if one is needed.
    pub fn save_flag(&self, dependency_type: DependencyType) -> Option<&'static str> {
        match (self, dependency_type) {
            (_, DependencyType::Dependencies) => None,
            (PackageManager::Npm, DependencyType::DevDependencies) => Some("--save-dev"),
            (PackageManager::Npm, DependencyType::PeerDependencies) => Some("--save-peer"),
            (PackageManager::Npm, DependencyType::OptionalDependencies) => Some("--save-optional"),
            (PackageManager::Yarn, DependencyType::DevDependencies) => Some("--dev"),
            (PackageManager::Yarn, DependencyType::PeerDependencies) => Some("--peer"),
            (PackageManager::Yarn, DependencyType::OptionalDependencies) => Some("--optional"),
        }
    }

    pub fn install_args(&self, package: &str, dependency_type: DependencyType) -> Vec<String> {
        let verb = match self {
            PackageManager::Npm => "install",
            PackageManager::Yarn => "add",
        };
        let mut args = vec![verb.to_string(), package.to_string()];
        args.extend(self.save_flag(dependency_type).map(str::to_string));
        args
    }

    pub fn uninstall_args(&self, package: &str) -> Vec<String> {
        let verb = match self {
            PackageManager::Npm => "uninstall",
            PackageManager::Yarn => "remove",
        };
        vec![verb.to_string(), package.to_string()]
    }
}

impl Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program())
    }
}

impl FromStr for PackageManager {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            other => Err(Error::UnknownPackageManager(other.to_string())),
        }
    }
}
