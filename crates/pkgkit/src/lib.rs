//! # pkgkit
//!
//! One interface over the native package managers of Linux and BSD systems.
//!
//! This crate provides:
//! - Platform detection from `/etc/os-release`, falling back to `uname`
//! - Privilege elevation through `doas`, `sudo` or `run0`
//! - Backends for APT, Zypper, Pacman, DNF, FreeBSD `pkg` and OpenBSD `pkg_*`
//!   that build native command lines and parse their output into [`Package`]s
//! - An operation history that decides when the package index is stale
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::{Client, Ledger, Settings};
//! use chrono::TimeDelta;
//!
//! let ledger = Ledger::open_in_memory().unwrap();
//! let mut client = Client::new(Settings::default(), ledger, TimeDelta::days(1)).unwrap();
//!
//! client.refresh_if_due().unwrap();
//! for pkg in client.search(&["emacs".to_string()]) {
//!     println!("{:2} {} - {}", pkg.flag(), pkg.name, pkg.desc);
//! }
//! ```
//!
//! ## Testing
//!
//! Backends hand their command lines to a [`CommandRunner`]. Build one with
//! [`backend::with_runner`] and a [`ScriptedRunner`] to check command
//! construction and parsing without touching the system.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod exec;
pub mod history;
pub mod platform;
pub mod privilege;
pub mod types;

pub use backend::{BackendKind, PackageManager};
pub use error::{Error, ErrorCategory, Result};
pub use exec::{CommandRunner, Execution, ScriptedRunner, SystemRunner};
pub use history::{Ledger, Record, is_refresh_due};
pub use types::{
    Captured, CommandStatus, INFO_INSTALLED, INFO_INSTALLED_AUTO, Operation, Package, Platform,
    Settings, UpgradeKind,
};

use chrono::{TimeDelta, Utc};

/// A backend paired with the ledger it records into.
///
/// Every operation that runs through the client (other than search) leaves
/// exactly one record in the ledger, whether or not the underlying command
/// succeeded.
pub struct Client {
    backend: Box<dyn PackageManager>,
    ledger: Ledger,
    refresh_interval: TimeDelta,
}

impl Client {
    /// Detect the platform and create the matching backend.
    ///
    /// # Errors
    ///
    /// Fails if the platform cannot be determined or has no backend.
    pub fn new(settings: Settings, ledger: Ledger, refresh_interval: TimeDelta) -> Result<Self> {
        let platform = platform::resolve()?;
        let backend = backend::for_platform(platform, settings)?;
        Ok(Self::with_backend(backend, ledger, refresh_interval))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(
        backend: Box<dyn PackageManager>,
        ledger: Ledger,
        refresh_interval: TimeDelta,
    ) -> Self {
        Self {
            backend,
            ledger,
            refresh_interval,
        }
    }

    /// The backend in use.
    pub fn backend(&self) -> &dyn PackageManager {
        self.backend.as_ref()
    }

    /// The operation history.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether the package index is older than the refresh interval.
    pub fn is_refresh_due(&self) -> Result<bool> {
        is_refresh_due(&self.ledger, self.refresh_interval, Utc::now())
    }

    /// Refresh the package index.
    pub fn refresh(&mut self, force: bool) -> Result<CommandStatus> {
        let status = self.backend.refresh(force);
        self.record(Operation::Refresh, &[], status)
    }

    /// Refresh the package index if it is stale. Returns `None` when it was not.
    pub fn refresh_if_due(&mut self) -> Result<Option<CommandStatus>> {
        if !self.is_refresh_due()? {
            log::debug!("Package index is fresh, not refreshing");
            return Ok(None);
        }
        log::info!("Package index is stale, refreshing");
        self.refresh(false).map(Some)
    }

    /// Install packages.
    pub fn install(&mut self, packages: &[String]) -> Result<CommandStatus> {
        let status = self.backend.install(packages);
        self.record_packages(Operation::Install, packages, status)
    }

    /// Remove packages.
    pub fn remove(&mut self, packages: &[String]) -> Result<CommandStatus> {
        let status = self.backend.remove(packages);
        self.record_packages(Operation::Delete, packages, status)
    }

    /// Upgrade installed packages.
    pub fn upgrade(&mut self, kind: UpgradeKind) -> Result<CommandStatus> {
        let status = self.backend.upgrade(kind);
        self.record(kind.operation(), &[], status)
    }

    /// Remove packages nothing depends on anymore.
    pub fn autoremove(&mut self, purge: bool) -> Result<CommandStatus> {
        let status = self.backend.autoremove(purge);
        let args = if purge { vec!["purge".to_string()] } else { Vec::new() };
        self.record(Operation::Autoremove, &args, status)
    }

    /// Clear the package cache.
    pub fn cleanup(&mut self) -> Result<CommandStatus> {
        let status = self.backend.cleanup();
        self.record(Operation::Cleanup, &[], status)
    }

    /// List vulnerable installed packages.
    pub fn audit(&mut self) -> Result<Vec<Package>> {
        let found = self.backend.audit();
        self.ledger.record(Operation::Audit, "")?;
        Ok(found)
    }

    /// Search the package index. Searches are not recorded.
    pub fn search(&mut self, terms: &[String]) -> Vec<Package> {
        self.backend.search(terms)
    }

    /// Output of the last captured command.
    pub fn output(&self) -> &Captured {
        self.backend.output()
    }

    fn record(
        &self,
        op: Operation,
        args: &[String],
        status: CommandStatus,
    ) -> Result<CommandStatus> {
        self.ledger.record(op, &args.join(" "))?;
        Ok(status)
    }

    // An empty package list never reaches the package manager.
    fn record_packages(
        &self,
        op: Operation,
        packages: &[String],
        status: CommandStatus,
    ) -> Result<CommandStatus> {
        if packages.is_empty() {
            return Ok(status);
        }
        self.record(op, packages, status)
    }
}
