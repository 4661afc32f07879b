//! Zypper backend for openSUSE.
//!
//! `zypper se` prints a table whose first row is the column header:
//!
//! ```text
//! S  | Name      | Summary                | Type
//! ---+-----------+------------------------+--------
//! i+ | emacs     | GNU Emacs Base Package | package
//! ```

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::Result;
use crate::types::{Captured, CommandStatus, Operation, Package, Platform, UpgradeKind};
use regex::Regex;
use std::sync::LazyLock;

const ZYPPER: &str = "/usr/bin/zypper";
const YES: Option<&str> = Some("-y");
const TUMBLEWEED: &str = "opensuse-tumbleweed";

static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*([^|\n]*?)[ \t]*\|[ \t]*([^|\n]+?)[ \t]*\|[ \t]*([^|\n]*?)[ \t]*\|[ \t]*([^|\n]+?)[ \t]*\r?$",
    )
    .expect("zypper table pattern is valid")
});

/// Backend driving `zypper`.
pub struct Zypper {
    core: Core,
}

impl Zypper {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn is_tumbleweed(&self) -> bool {
        self.core.platform().name == TUMBLEWEED
    }

    fn run(
        &mut self,
        op: Operation,
        args: &[&str],
        yes: Option<&str>,
        operands: &[String],
    ) -> CommandStatus {
        let argv = self.core.argv(ZYPPER, op, args, yes, operands);
        self.core.execute(argv, false)
    }
}

impl PackageManager for Zypper {
    fn name(&self) -> &'static str {
        "Zypper"
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
            .prefix(ZYPPER, op.is_none_or(|op| op.needs_privilege())))
    }

    fn refresh(&mut self, force: bool) -> CommandStatus {
        let args: &[&str] = if force { &["ref", "-f"] } else { &["ref"] };
        self.run(Operation::Refresh, args, None, &[])
    }

    fn install(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Install, packages) {
            return skipped;
        }
        self.run(Operation::Install, &["install"], YES, packages)
    }

    fn remove(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Delete, packages) {
            return skipped;
        }
        self.run(Operation::Delete, &["rm", "-u"], YES, packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        // Tumbleweed is only ever upgraded with dup; Leap moves releases by
        // switching repositories, which zypper cannot do on its own.
        let sub = match kind {
            UpgradeKind::Normal if self.is_tumbleweed() => "dup",
            UpgradeKind::Normal => "up",
            UpgradeKind::Big => "dup",
            UpgradeKind::Release if self.is_tumbleweed() => "dup",
            UpgradeKind::Release => return self.core.unsupported(self.name(), kind.operation()),
        };
        self.run(kind.operation(), &[sub], YES, &[])
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        let argv = self.core.argv(ZYPPER, Operation::Search, &["se"], None, terms);
        match self.core.query(argv) {
            Some(stdout) => parse_search(&stdout),
            None => Vec::new(),
        }
    }

    fn autoremove(&mut self, _purge: bool) -> CommandStatus {
        self.core.unsupported(self.name(), Operation::Autoremove)
    }

    fn cleanup(&mut self) -> CommandStatus {
        self.run(Operation::Cleanup, &["clean", "--all"], None, &[])
    }
}

/// Parse `zypper se` output, skipping the header row.
pub fn parse_search(raw: &str) -> Vec<Package> {
    let packages = ROW_PATTERN
        .captures_iter(raw)
        .skip(1)
        .map(|caps| {
            Package::new(&caps[2], caps[3].trim())
                .with_kind(&caps[4])
                .with_info(&caps[1])
        })
        .collect();

    check_parsed("Zypper", raw, packages)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::exec::ScriptedRunner;
    use crate::types::Settings;

    const SEARCH: &str = "Loading repository data...
Reading installed packages...

S  | Name         | Summary                        | Type
---+--------------+--------------------------------+--------
i+ | emacs        | GNU Emacs Base Package         | package
i  | emacs-info   | Info files for GNU Emacs       | package
   | emacs-x11    | GNU Emacs: Emacs binary with X | package
";

    fn tumbleweed() -> Platform {
        Platform::new(TUMBLEWEED, "20240601", "unknown")
    }

    fn leap() -> Platform {
        Platform::new("opensuse-leap", "15.6", "unknown")
    }

    #[test]
    fn test_parse_search() {
        let pkgs = parse_search(SEARCH);
        assert_eq!(pkgs.len(), 3);

        assert_eq!(pkgs[0].name, "emacs");
        assert_eq!(pkgs[0].desc, "GNU Emacs Base Package");
        assert_eq!(pkgs[0].kind.as_deref(), Some("package"));
        assert_eq!(pkgs[0].flag(), "i+");
        assert_eq!(pkgs[1].flag(), "i");
        assert_eq!(pkgs[2].name, "emacs-x11");
        assert_eq!(pkgs[2].flag(), "");
    }

    #[test]
    fn test_header_only_row_is_dropped() {
        let raw = "S | Name  | Summary     | Type\n  | vim   | Vi IMproved | package\n";
        let pkgs = parse_search(raw);
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "vim");
        assert!(pkgs.iter().all(|p| p.name != "Name"));
    }

    #[test]
    fn test_parse_is_pure() {
        assert_eq!(parse_search(SEARCH), parse_search(SEARCH));
    }

    #[test]
    fn test_no_table_returns_nothing() {
        assert!(parse_search("No matching items found.\n").is_empty());
    }

    #[test]
    fn test_commands() {
        let runner = ScriptedRunner::new();
        let mut zypper = backend(leap(), yes(), &runner);

        zypper.refresh(false);
        zypper.refresh(true);
        zypper.install(&strings(&["vim"]));
        zypper.remove(&strings(&["nano"]));
        zypper.upgrade(UpgradeKind::Normal);
        zypper.upgrade(UpgradeKind::Big);
        zypper.cleanup();

        assert_eq!(
            runner.calls(),
            vec![
                strings(&[SUDO, ZYPPER, "ref"]),
                strings(&[SUDO, ZYPPER, "ref", "-f"]),
                strings(&[SUDO, ZYPPER, "install", "-y", "vim"]),
                strings(&[SUDO, ZYPPER, "rm", "-u", "-y", "nano"]),
                strings(&[SUDO, ZYPPER, "up", "-y"]),
                strings(&[SUDO, ZYPPER, "dup", "-y"]),
                strings(&[SUDO, ZYPPER, "clean", "--all"]),
            ]
        );
    }

    #[test]
    fn test_tumbleweed_upgrades_with_dup() {
        let runner = ScriptedRunner::new();
        let mut zypper = backend(tumbleweed(), Settings::default(), &runner);
        zypper.upgrade(UpgradeKind::Normal);
        zypper.upgrade(UpgradeKind::Release);
        assert_eq!(
            runner.calls(),
            vec![strings(&[SUDO, ZYPPER, "dup"]), strings(&[SUDO, ZYPPER, "dup"])]
        );
    }

    #[test]
    fn test_unsupported_operations_succeed() {
        let runner = ScriptedRunner::new();
        let mut zypper = backend(leap(), Settings::default(), &runner);
        assert!(zypper.autoremove(true).success);
        assert!(zypper.upgrade(UpgradeKind::Release).success);
        assert!(zypper.audit().is_empty());
        assert!(runner.calls().is_empty());
    }
}
