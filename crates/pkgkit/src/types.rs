//! Core types shared by every backend.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::Duration;

/// Architecture reported when detection could not tell.
pub const UNKNOWN_ARCH: &str = "unknown";

/// Operating system family, version and hardware architecture.
///
/// Example: `Platform::new("debian", "12", "unknown")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Distribution family ("debian", "opensuse-tumbleweed", "arch", "freebsd", ...)
    pub name: String,
    /// Version string, empty for rolling releases
    pub version: String,
    /// Hardware architecture, or [`UNKNOWN_ARCH`]
    pub arch: String,
}

impl Platform {
    /// Create a new platform triple.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: arch.into(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{} ({})", self.name, self.arch)
        } else {
            write!(f, "{} {} ({})", self.name, self.version, self.arch)
        }
    }
}

/// Actions sloth can perform through a package manager.
///
/// The lower-case name returned by [`Operation::as_str`] is also the key
/// under which the operation is stored in the history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Refresh the package index
    Refresh,
    /// Install packages
    Install,
    /// Remove packages
    Delete,
    /// Upgrade installed packages
    Upgrade,
    /// Upgrade allowing removals and vendor changes
    UpgradeBig,
    /// Move to the next release
    UpgradeRelease,
    /// Clear the download cache
    Cleanup,
    /// Remove packages nothing depends on anymore
    Autoremove,
    /// Check installed packages against security advisories
    Audit,
    /// Search the package index
    Search,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Refresh,
        Self::Install,
        Self::Delete,
        Self::Upgrade,
        Self::UpgradeBig,
        Self::UpgradeRelease,
        Self::Cleanup,
        Self::Autoremove,
        Self::Audit,
        Self::Search,
    ];

    /// Stable lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Install => "install",
            Self::Delete => "delete",
            Self::Upgrade => "upgrade",
            Self::UpgradeBig => "upgrade-big",
            Self::UpgradeRelease => "upgrade-release",
            Self::Cleanup => "cleanup",
            Self::Autoremove => "autoremove",
            Self::Audit => "audit",
            Self::Search => "search",
        }
    }

    /// Whether the operation changes system state and is recorded.
    ///
    /// Audit leaves packages alone but fetches the advisory database into a
    /// system location, so it counts.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Search)
    }

    /// Whether the command has to run with elevated privileges.
    pub fn needs_privilege(&self) -> bool {
        self.is_mutating()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

/// How far an upgrade is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpgradeKind {
    /// Regular upgrade of installed packages
    #[default]
    Normal,
    /// Upgrade that may remove packages or switch vendors
    Big,
    /// Upgrade to the next distribution release
    Release,
}

impl UpgradeKind {
    /// Ledger operation for this kind of upgrade.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Normal => Operation::Upgrade,
            Self::Big => Operation::UpgradeBig,
            Self::Release => Operation::UpgradeRelease,
        }
    }
}

/// Info flag for an installed package.
pub const INFO_INSTALLED: &str = "i";

/// Info flag for a package installed as a dependency.
pub const INFO_INSTALLED_AUTO: &str = "i+";

/// One search or audit result.
///
/// Equality and hashing only look at name, description and version, so
/// result sets from two passes over the same search can be compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Short description, possibly empty
    pub desc: String,
    /// Repository, branch or category label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Version string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Normalized status flag ("i", "i+")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl Package {
    /// Create a package with a name and description.
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            ..Self::default()
        }
    }

    /// Set the repository/branch/category label.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the info flag. An empty flag leaves the field unset.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        let info = info.into();
        self.info = (!info.is_empty()).then_some(info);
        self
    }

    /// The info flag, or an empty string when there is none.
    pub fn flag(&self) -> &str {
        self.info.as_deref().unwrap_or_default()
    }

    /// Whether the package is installed, explicitly or as a dependency.
    pub fn is_installed(&self) -> bool {
        self.flag().starts_with(INFO_INSTALLED)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.desc == other.desc && self.version == other.version
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.desc.hash(state);
        self.version.hash(state);
    }
}

/// Outcome of running an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Whether the command succeeded, usually exit status 0
    pub success: bool,
    /// Exit code, -1 when the process did not exit on its own
    pub exit_code: i32,
    /// Whether the command was killed for exceeding the timeout
    pub timed_out: bool,
}

impl CommandStatus {
    /// Status of a process that exited with `code`.
    pub fn exited(code: i32) -> Self {
        Self {
            success: code == 0,
            exit_code: code,
            timed_out: false,
        }
    }

    /// Status of an operation the backend does not offer.
    pub fn skipped() -> Self {
        Self::exited(0)
    }

    /// Status of a process that could not be started or was killed by a signal.
    pub fn abnormal() -> Self {
        Self {
            success: false,
            exit_code: -1,
            timed_out: false,
        }
    }

    /// Status of a process that was killed after the timeout.
    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Self::abnormal()
        }
    }
}

/// Text captured from the last command run with capture enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Behavior switches read from the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Run commands under `nice`
    pub nice: bool,
    /// Confirm prompts of mutating operations automatically
    pub assume_yes: bool,
    /// Kill commands that run longer than this
    pub timeout: Option<Duration>,
}
