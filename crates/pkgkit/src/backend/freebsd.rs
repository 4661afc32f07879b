//! FreeBSD `pkg` backend.

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::Result;
use crate::types::{Captured, CommandStatus, Operation, Package, Platform, UpgradeKind};
use regex::Regex;
use std::sync::LazyLock;

const PKG: &str = "/usr/sbin/pkg";
const YES: Option<&str> = Some("-y");

/// `pkg audit` exits with 1 when it found vulnerable packages.
const VULNERABLE_FOUND: i32 = 1;

/// Kind given to packages reported by [`parse_audit`].
pub const KIND_VULNERABLE: &str = "vulnerable";

/// `name-version   description`. Versions never contain `-`, so the version
/// starts after the last hyphen.
static SEARCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([\w.+-]+)-(\d[^\s-]*)[ \t]+(.*?)[ \t]*\r?$")
        .expect("pkg search pattern is valid")
});

/// `name-version is vulnerable:` followed by the indented advisory title.
static AUDIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([\w.+-]+)-(\d[^\s-]*) is vulnerable:?[ \t]*\r?\n[ \t]+(.*?)[ \t]*\r?$")
        .expect("pkg audit pattern is valid")
});

/// Backend driving FreeBSD's `pkg`.
pub struct FreeBsd {
    core: Core,
}

impl FreeBsd {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn run(&mut self, op: Operation, args: &[&str], operands: &[String]) -> CommandStatus {
        let argv = self.core.argv(PKG, op, args, YES, operands);
        self.core.execute(argv, false)
    }
}

impl PackageManager for FreeBsd {
    fn name(&self) -> &'static str {
        "FreeBSD pkg"
    }

    fn platform(&self) -> &Platform {
        self.core.platform()
    }

    fn output(&self) -> &Captured {
        self.core.output()
    }

    fn command_prefix(&self, op: Option<Operation>) -> Result<Vec<String>> {
        Ok(self
            .core
            .prefix(PKG, op.is_none_or(|op| op.needs_privilege())))
    }

    fn refresh(&mut self, force: bool) -> CommandStatus {
        let args: &[&str] = if force { &["update", "-f"] } else { &["update"] };
        let argv = self.core.argv(PKG, Operation::Refresh, args, None, &[]);
        self.core.execute(argv, false)
    }

    fn install(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Install, packages) {
            return skipped;
        }
        self.run(Operation::Install, &["install"], packages)
    }

    fn remove(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Delete, packages) {
            return skipped;
        }
        self.run(Operation::Delete, &["delete"], packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        match kind {
            UpgradeKind::Normal => self.run(kind.operation(), &["upgrade"], &[]),
            // -f reinstalls everything, picking up ABI changes.
            UpgradeKind::Big => self.run(kind.operation(), &["upgrade", "-f"], &[]),
            // Base system upgrades belong to freebsd-update.
            UpgradeKind::Release => self.core.unsupported(self.name(), kind.operation()),
        }
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        let argv = self.core.argv(PKG, Operation::Search, &["search"], None, terms);
        match self.core.query(argv) {
            Some(stdout) => parse_search(&stdout),
            None => Vec::new(),
        }
    }

    fn autoremove(&mut self, _purge: bool) -> CommandStatus {
        self.run(Operation::Autoremove, &["autoremove"], &[])
    }

    fn cleanup(&mut self) -> CommandStatus {
        self.run(Operation::Cleanup, &["clean"], &[])
    }

    fn audit(&mut self) -> Vec<Package> {
        let argv = self.core.argv(PKG, Operation::Audit, &["audit", "-F"], None, &[]);
        let status = self.core.execute(argv, true);
        match status.exit_code {
            0 => Vec::new(),
            VULNERABLE_FOUND => parse_audit(&self.core.output().stdout),
            code => {
                log::error!("pkg audit failed with exit code {code}");
                Vec::new()
            }
        }
    }
}

/// Parse `pkg search` output.
pub fn parse_search(raw: &str) -> Vec<Package> {
    let packages = SEARCH_PATTERN
        .captures_iter(raw)
        .map(|caps| Package::new(&caps[1], caps[3].trim()).with_version(&caps[2]))
        .collect();

    check_parsed("FreeBSD pkg", raw, packages)
}

/// Parse `pkg audit` output into one package per vulnerable package.
pub fn parse_audit(raw: &str) -> Vec<Package> {
    let packages = AUDIT_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            Package::new(&caps[1], caps[3].trim())
                .with_version(&caps[2])
                .with_kind(KIND_VULNERABLE)
        })
        .collect();

    check_parsed("FreeBSD pkg", raw, packages)
}
