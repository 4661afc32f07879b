//! Backend abstraction over the native package managers.
//!
//! The [`PackageManager`] trait is the normalized contract: every backend
//! offers every operation, and the ones a package manager has no equivalent
//! for succeed without doing anything (or return no packages) instead of
//! failing. Backends are picked by [`for_platform`] from the platform name.

pub mod apt;
pub mod dnf;
pub mod freebsd;
pub mod openbsd;
pub mod pacman;
pub mod zypper;

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, SystemRunner};
use crate::privilege;
use crate::types::{Captured, CommandStatus, Operation, Package, Platform, Settings, UpgradeKind};
use std::path::PathBuf;

/// Wrapper that lowers the priority of every command when `nice` is set.
pub const NICE: [&str; 3] = ["nice", "-n", "19"];

/// Common interface of all package manager backends.
///
/// Mutating operations report the exit status of the underlying tool; the
/// text it printed, when captured, is available from [`output`](Self::output)
/// until the next captured command replaces it.
pub trait PackageManager: Send {
    /// Human readable backend name.
    fn name(&self) -> &'static str;

    /// Platform this backend was created for.
    fn platform(&self) -> &Platform;

    /// Output of the last captured command.
    fn output(&self) -> &Captured;

    /// Executable, prefixed with the elevation command where needed.
    ///
    /// Without an operation the prefix assumes privileges are required.
    fn command_prefix(&self, op: Option<Operation>) -> Result<Vec<String>>;

    /// Refresh the package index.
    fn refresh(&mut self, force: bool) -> CommandStatus;

    /// Install packages.
    fn install(&mut self, packages: &[String]) -> CommandStatus;

    /// Remove packages.
    fn remove(&mut self, packages: &[String]) -> CommandStatus;

    /// Upgrade installed packages.
    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus;

    /// Search the package index.
    fn search(&mut self, terms: &[String]) -> Vec<Package>;

    /// Remove packages that are no longer needed.
    ///
    /// `purge` also deletes configuration files where the backend can.
    fn autoremove(&mut self, purge: bool) -> CommandStatus;

    /// Clear the package cache.
    fn cleanup(&mut self) -> CommandStatus;

    /// List installed packages with known vulnerabilities.
    fn audit(&mut self) -> Vec<Package> {
        log::info!("{} cannot audit installed packages", self.name());
        Vec::new()
    }
}

/// The backends sloth knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Debian and derivatives
    Apt,
    /// openSUSE Tumbleweed and Leap
    Zypper,
    /// Arch Linux and derivatives
    Pacman,
    /// Fedora
    Dnf,
    /// FreeBSD `pkg`
    FreeBsd,
    /// OpenBSD `pkg_add`/`pkg_delete`/`pkg_info`
    OpenBsd,
}

impl BackendKind {
    /// Backend for a platform name, as reported by [`crate::platform::resolve`].
    pub fn for_platform(name: &str) -> Option<Self> {
        match name {
            "debian" => Some(Self::Apt),
            "opensuse-tumbleweed" | "opensuse-leap" => Some(Self::Zypper),
            "arch" => Some(Self::Pacman),
            "fedora" => Some(Self::Dnf),
            "freebsd" => Some(Self::FreeBsd),
            "openbsd" => Some(Self::OpenBsd),
            _ => None,
        }
    }

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Apt => "APT",
            Self::Zypper => "Zypper",
            Self::Pacman => "Pacman",
            Self::Dnf => "DNF",
            Self::FreeBsd => "FreeBSD pkg",
            Self::OpenBsd => "OpenBSD pkg_*",
        }
    }
}

/// Create the backend for `platform`, running commands on the host.
///
/// # Errors
///
/// Returns `Error::UnsupportedPlatform` if no backend handles the platform.
pub fn for_platform(platform: Platform, settings: Settings) -> Result<Box<dyn PackageManager>> {
    let kind = kind_of(&platform)?;
    let runner = Box::new(SystemRunner::new(settings.timeout));
    Ok(build(kind, Core::new(platform, settings, privilege::elevation(), runner)))
}

/// Create the backend for `platform` with an explicit elevation command and runner.
pub fn with_runner(
    platform: Platform,
    settings: Settings,
    elevation: Option<PathBuf>,
    runner: Box<dyn CommandRunner>,
) -> Result<Box<dyn PackageManager>> {
    let kind = kind_of(&platform)?;
    Ok(build(kind, Core::new(platform, settings, elevation, runner)))
}

fn kind_of(platform: &Platform) -> Result<BackendKind> {
    BackendKind::for_platform(&platform.name).ok_or_else(|| Error::UnsupportedPlatform {
        name: platform.name.clone(),
    })
}

fn build(kind: BackendKind, core: Core) -> Box<dyn PackageManager> {
    log::debug!("Using {} backend on {}", kind.name(), core.platform);
    match kind {
        BackendKind::Apt => Box::new(apt::Apt::new(core)),
        BackendKind::Zypper => Box::new(zypper::Zypper::new(core)),
        BackendKind::Pacman => Box::new(pacman::Pacman::new(core)),
        BackendKind::Dnf => Box::new(dnf::Dnf::new(core)),
        BackendKind::FreeBsd => Box::new(freebsd::FreeBsd::new(core)),
        BackendKind::OpenBsd => Box::new(openbsd::OpenBsd::new(core)),
    }
}

/// State and command plumbing shared by all backends.
pub(crate) struct Core {
    platform: Platform,
    settings: Settings,
    elevation: Option<PathBuf>,
    runner: Box<dyn CommandRunner>,
    output: Captured,
}

impl Core {
    /// Bundle the pieces a backend needs.
    pub(crate) fn new(
        platform: Platform,
        settings: Settings,
        elevation: Option<PathBuf>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            platform,
            settings,
            elevation,
            runner,
            output: Captured::default(),
        }
    }

    pub(crate) fn platform(&self) -> &Platform {
        &self.platform
    }

    pub(crate) fn output(&self) -> &Captured {
        &self.output
    }

    /// `executable`, behind the elevation command when `privileged` is set.
    pub(crate) fn prefix(&self, executable: &str, privileged: bool) -> Vec<String> {
        let mut argv = Vec::with_capacity(2);
        if privileged && let Some(tool) = &self.elevation {
            argv.push(tool.to_string_lossy().into_owned());
        }
        argv.push(executable.to_string());
        argv
    }

    /// Assemble `prefix args [yes] operands`.
    ///
    /// `yes` is the backend's assume-yes token for this operation, added only
    /// when the `assume_yes` setting is on.
    pub(crate) fn argv(
        &self,
        executable: &str,
        op: Operation,
        args: &[&str],
        yes: Option<&str>,
        operands: &[String],
    ) -> Vec<String> {
        let mut argv = self.prefix(executable, op.needs_privilege());
        argv.extend(args.iter().map(|a| (*a).to_string()));
        if self.settings.assume_yes
            && let Some(flag) = yes
        {
            argv.push(flag.to_string());
        }
        argv.extend(operands.iter().cloned());
        argv
    }

    /// Run a finished argument vector, keeping the output if captured.
    pub(crate) fn execute(&mut self, argv: Vec<String>, capture: bool) -> CommandStatus {
        let argv = if self.settings.nice {
            NICE.iter().map(|s| (*s).to_string()).chain(argv).collect()
        } else {
            argv
        };

        let execution = self.runner.run(&argv, capture);
        if let Some(captured) = execution.captured {
            self.output = captured;
        }
        execution.status
    }

    /// Run `argv` with capture and return stdout when it succeeded.
    pub(crate) fn query(&mut self, argv: Vec<String>) -> Option<String> {
        let status = self.execute(argv, true);
        status.success.then(|| self.output.stdout.clone())
    }

    /// Log and skip an operation the backend has no equivalent for.
    pub(crate) fn unsupported(&self, backend: &str, op: Operation) -> CommandStatus {
        log::info!("{backend} has no equivalent of {op}, nothing to do");
        CommandStatus::skipped()
    }
}

/// Skip the operation when there are no packages to act on.
pub(crate) fn nothing_to_do(op: Operation, packages: &[String]) -> Option<CommandStatus> {
    if packages.is_empty() {
        log::warn!("No packages given to {op}");
        Some(CommandStatus::skipped())
    } else {
        None
    }
}

/// Warn about output that produced no packages.
///
/// Non-empty output without a single match usually means the tool changed
/// its format or printed in an unexpected language.
pub(crate) fn check_parsed(backend: &str, raw: &str, packages: Vec<Package>) -> Vec<Package> {
    if packages.is_empty() && !raw.trim().is_empty() {
        log::warn!("Could not parse {backend} output:\n{raw}");
    }
    packages
}
