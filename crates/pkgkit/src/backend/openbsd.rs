//! OpenBSD backend.
//!
//! OpenBSD splits package management over three tools, so the executable
//! depends on the operation: `pkg_add` installs and upgrades, `pkg_delete`
//! removes and `pkg_info` queries.

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::{Error, Result};
use crate::types::{
    Captured, CommandStatus, INFO_INSTALLED, Operation, Package, Platform, UpgradeKind,
};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const PKG_ADD: &str = "/usr/sbin/pkg_add";
const PKG_DELETE: &str = "/usr/sbin/pkg_delete";
const PKG_INFO: &str = "/usr/sbin/pkg_info";
/// Non-interactive mode of pkg_add and pkg_delete.
const YES: Option<&str> = Some("-I");

/// `name-version[-flavor] [(installed)]`
static SEARCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([\w-]+?)-(\d\S*)(?:[ \t]+\((installed)\))?[ \t]*\r?$")
        .expect("pkg_info pattern is valid")
});

/// Backend driving OpenBSD's `pkg_*` tools.
pub struct OpenBsd {
    core: Core,
}

impl OpenBsd {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn executable(op: Operation) -> &'static str {
        match op {
            Operation::Install
            | Operation::Upgrade
            | Operation::UpgradeBig
            | Operation::UpgradeRelease => PKG_ADD,
            Operation::Delete | Operation::Autoremove | Operation::Cleanup => PKG_DELETE,
            Operation::Refresh | Operation::Audit | Operation::Search => PKG_INFO,
        }
    }

    fn run(&mut self, op: Operation, args: &[&str], operands: &[String]) -> CommandStatus {
        let argv = self.core.argv(Self::executable(op), op, args, YES, operands);
        self.core.execute(argv, false)
    }
}

impl PackageManager for OpenBsd {
    fn name(&self) -> &'static str {
        "OpenBSD pkg_*"
    }

    fn platform(&self) -> &Platform {
        self.core.platform()
    }

    fn output(&self) -> &Captured {
        self.core.output()
    }

    fn command_prefix(&self, op: Option<Operation>) -> Result<Vec<String>> {
        let op = op.ok_or(Error::MissingOperation { backend: "OpenBSD" })?;
        Ok(self
            .core
            .prefix(Self::executable(op), op.needs_privilege()))
    }

    fn refresh(&mut self, _force: bool) -> CommandStatus {
        // pkg_add fetches from the mirror every time; there is no index.
        log::debug!("OpenBSD has no package index to refresh");
        CommandStatus::skipped()
    }

    fn install(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Install, packages) {
            return skipped;
        }
        self.run(Operation::Install, &[], packages)
    }

    fn remove(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Delete, packages) {
            return skipped;
        }
        self.run(Operation::Delete, &[], packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        match kind {
            UpgradeKind::Normal | UpgradeKind::Big => self.run(kind.operation(), &["-u"], &[]),
            // Release upgrades go through sysupgrade.
            UpgradeKind::Release => self.core.unsupported(self.name(), kind.operation()),
        }
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        let mut seen = HashSet::new();
        let mut packages = Vec::new();
        for term in terms {
            let argv = self
                .core
                .argv(PKG_INFO, Operation::Search, &["-Q"], None, std::slice::from_ref(term));
            let Some(stdout) = self.core.query(argv) else {
                continue;
            };
            for pkg in parse_search(&stdout) {
                if seen.insert(pkg.clone()) {
                    packages.push(pkg);
                }
            }
        }
        packages
    }

    fn autoremove(&mut self, _purge: bool) -> CommandStatus {
        self.run(Operation::Autoremove, &["-a"], &[])
    }

    fn cleanup(&mut self) -> CommandStatus {
        self.core.unsupported(self.name(), Operation::Cleanup)
    }
}

/// Parse `pkg_info -Q` output.
pub fn parse_search(raw: &str) -> Vec<Package> {
    let packages = SEARCH_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            let pkg = Package::new(&caps[1], "").with_version(&caps[2]);
            if caps.get(3).is_some() {
                pkg.with_info(INFO_INSTALLED)
            } else {
                pkg
            }
        })
        .collect();

    check_parsed("OpenBSD", raw, packages)
}
