//! DNF backend for Fedora.
//!
//! Searching does not scrape `dnf search`; `dnf repoquery` is asked for a
//! tab-separated record per package, so every field arrives already split.

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::Result;
use crate::types::{
    Captured, CommandStatus, INFO_INSTALLED, Operation, Package, Platform, UpgradeKind,
};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const DNF: &str = "/usr/bin/dnf";
const YES: Option<&str> = Some("-y");

/// Record format handed to `repoquery`.
pub const QUERY_FORMAT: &str = "%{name}\\t%{evr}\\t%{repoid}\\t%{summary}\\n";

/// `check-update` exits with 100 when updates are available.
const UPDATES_AVAILABLE: i32 = 100;

/// `ID TYPE SEVERITY NEVRA` rows of `dnf advisory list`.
static ADVISORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z][A-Z0-9]*-\S+)[ \t]+(\S+)[ \t]+(\S+)[ \t]+(\S+)")
        .expect("dnf advisory pattern is valid")
});

/// Backend driving `dnf`.
pub struct Dnf {
    core: Core,
}

impl Dnf {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn run(&mut self, op: Operation, args: &[&str], operands: &[String]) -> CommandStatus {
        let argv = self.core.argv(DNF, op, args, YES, operands);
        self.core.execute(argv, false)
    }

    fn repoquery(&mut self, installed: bool, terms: &[String]) -> Option<String> {
        let patterns: Vec<String> = terms.iter().map(|t| format!("*{t}*")).collect();
        let mut args = vec!["repoquery", "--quiet"];
        if installed {
            args.push("--installed");
        }
        args.extend(["--queryformat", QUERY_FORMAT]);
        let argv = self.core.argv(DNF, Operation::Search, &args, None, &patterns);
        self.core.query(argv)
    }
}

impl PackageManager for Dnf {
    fn name(&self) -> &'static str {
        "DNF"
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
            .prefix(DNF, op.is_none_or(|op| op.needs_privilege())))
    }

    fn refresh(&mut self, _force: bool) -> CommandStatus {
        let argv = self.core.argv(
            DNF,
            Operation::Refresh,
            &["--refresh", "check-update"],
            None,
            &[],
        );
        let status = self.core.execute(argv, false);
        if status.exit_code == UPDATES_AVAILABLE {
            CommandStatus {
                success: true,
                ..status
            }
        } else {
            status
        }
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
        self.run(Operation::Delete, &["remove"], packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        match kind {
            UpgradeKind::Normal => self.run(kind.operation(), &["upgrade"], &[]),
            UpgradeKind::Big => self.run(kind.operation(), &["distro-sync"], &[]),
            UpgradeKind::Release => self.core.unsupported(self.name(), kind.operation()),
        }
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        if terms.is_empty() {
            return Vec::new();
        }

        let installed: HashSet<String> = self
            .repoquery(true, terms)
            .map(|out| parse_records(&out).into_iter().map(|p| p.name).collect())
            .unwrap_or_default();

        match self.repoquery(false, terms) {
            Some(out) => parse_records(&out)
                .into_iter()
                .map(|pkg| {
                    if installed.contains(&pkg.name) {
                        pkg.with_info(INFO_INSTALLED)
                    } else {
                        pkg
                    }
                })
                .collect(),
            None => Vec::new(),
        }
    }

    fn autoremove(&mut self, _purge: bool) -> CommandStatus {
        self.run(Operation::Autoremove, &["autoremove"], &[])
    }

    fn cleanup(&mut self) -> CommandStatus {
        let argv = self
            .core
            .argv(DNF, Operation::Cleanup, &["clean", "all"], None, &[]);
        self.core.execute(argv, false)
    }

    fn audit(&mut self) -> Vec<Package> {
        if self.core.platform().name != "fedora" {
            log::info!("Advisories are only published for Fedora");
            return Vec::new();
        }

        let argv = self.core.argv(
            DNF,
            Operation::Audit,
            &["advisory", "list", "--updates"],
            None,
            &[],
        );
        match self.core.query(argv) {
            Some(stdout) => parse_advisories(&stdout),
            None => Vec::new(),
        }
    }
}

/// Parse the tab-separated `repoquery` records produced with [`QUERY_FORMAT`].
///
/// Lines with fewer than four fields are ignored.
pub fn parse_records(raw: &str) -> Vec<Package> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.trim_end_matches('\r').splitn(4, '\t');
            let name = fields.next()?.trim();
            let evr = fields.next()?.trim();
            let repo = fields.next()?.trim();
            let summary = fields.next()?.trim();
            (!name.is_empty()).then(|| {
                Package::new(name, summary)
                    .with_version(evr)
                    .with_kind(repo)
            })
        })
        .collect()
}

/// Parse `dnf advisory list` rows into one package per affected NEVRA.
pub fn parse_advisories(raw: &str) -> Vec<Package> {
    let packages = ADVISORY_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            Package::new(&caps[4], format!("{} ({})", &caps[1], &caps[3])).with_kind(&caps[2])
        })
        .collect();

    check_parsed("DNF", raw, packages)
}
