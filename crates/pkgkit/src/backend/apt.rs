//! APT backend for Debian and derivatives.
//!
//! `apt search` prints one block per package:
//!
//! ```text
//! emacs/stable,now 1:28.2+1-15 all [installed]
//!   GNU Emacs editor (metapackage)
//! ```
//!
//! The bracketed status is translated, so it is matched against the known
//! translations of "installed" and "automatic" rather than parsed.

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::Result;
use crate::types::{
    Captured, CommandStatus, INFO_INSTALLED, INFO_INSTALLED_AUTO, Operation, Package, Platform,
    UpgradeKind,
};
use regex::Regex;
use std::sync::LazyLock;

const APT: &str = "/usr/bin/apt";
const YES: Option<&str> = Some("-y");

/// Translations of "installed" in the status column.
const INSTALLED: &[&str] = &["installed", "installiert", "installé", "instalado", "installato"];

/// Translations of "automatic" in the status column.
const AUTOMATIC: &[&str] = &["automatic", "automatisch", "automatique", "automático", "automatico"];

static SEARCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^([^/\s]+)/(\S+)[ \t]+(\S+)[ \t]+(\S+)(?:[ \t]+\[([^\]\n]*)\])?[ \t]*\r?\n[ \t]+(.*?)[ \t]*\r?$",
    )
    .expect("apt search pattern is valid")
});

/// Backend driving `apt`.
pub struct Apt {
    core: Core,
}

impl Apt {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn run(&mut self, op: Operation, args: &[&str], operands: &[String]) -> CommandStatus {
        let argv = self.core.argv(APT, op, args, YES, operands);
        self.core.execute(argv, false)
    }
}

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        "APT"
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
            .prefix(APT, op.is_none_or(|op| op.needs_privilege())))
    }

    fn refresh(&mut self, _force: bool) -> CommandStatus {
        let argv = self.core.argv(APT, Operation::Refresh, &["update"], None, &[]);
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
        self.run(Operation::Delete, &["remove"], packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        match kind {
            UpgradeKind::Normal | UpgradeKind::Big => {
                self.run(kind.operation(), &["full-upgrade"], &[])
            }
            // Release upgrades need the sources lists rewritten first.
            UpgradeKind::Release => self.core.unsupported(self.name(), kind.operation()),
        }
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        let argv = self.core.argv(APT, Operation::Search, &["search"], None, terms);
        match self.core.query(argv) {
            Some(stdout) => parse_search(&stdout),
            None => Vec::new(),
        }
    }

    fn autoremove(&mut self, purge: bool) -> CommandStatus {
        let sub = if purge { "autopurge" } else { "autoremove" };
        self.run(Operation::Autoremove, &[sub], &[])
    }

    fn cleanup(&mut self) -> CommandStatus {
        let argv = self.core.argv(APT, Operation::Cleanup, &["clean"], None, &[]);
        self.core.execute(argv, false)
    }
}

/// Parse `apt search` output.
pub fn parse_search(raw: &str) -> Vec<Package> {
    let packages = SEARCH_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            let status = caps.get(5).map_or("", |m| m.as_str());
            let pkg = Package::new(&caps[1], caps[6].trim())
                .with_kind(&caps[2])
                .with_version(&caps[3]);
            match status_flag(status) {
                Some(flag) => pkg.with_info(flag),
                None => pkg,
            }
        })
        .collect();

    check_parsed("APT", raw, packages)
}

/// Map the bracketed status column to an info flag.
fn status_flag(status: &str) -> Option<&'static str> {
    let status = status.trim().to_lowercase();
    if status.is_empty() {
        return None;
    }

    let parts: Vec<&str> = status.split(',').map(str::trim).collect();
    let installed = parts.iter().any(|p| INSTALLED.contains(p));
    let automatic = parts.iter().any(|p| AUTOMATIC.contains(p));

    match (installed, automatic) {
        (true, true) => Some(INFO_INSTALLED_AUTO),
        (true, false) => Some(INFO_INSTALLED),
        _ => {
            log::debug!("Unrecognized apt status {status:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::exec::ScriptedRunner;
    use crate::types::Settings;

    const SEARCH: &str = "Sorting...
Full Text Search...
emacs/stable,now 1:28.2+1-15 all [installed]
  GNU Emacs editor (metapackage)

emacs-bin-common/stable 1:28.2+1-15 amd64
  GNU Emacs editor's shared, architecture dependent files

emacs-common/stable,now 1:28.2+1-15 all [installed,automatic]
  GNU Emacs editor's shared, architecture independent infrastructure
";

    fn debian() -> Platform {
        Platform::new("debian", "12", "unknown")
    }

    #[test]
    fn test_parse_search() {
        let pkgs = parse_search(SEARCH);
        assert_eq!(pkgs.len(), 3);

        assert_eq!(pkgs[0].name, "emacs");
        assert_eq!(pkgs[0].desc, "GNU Emacs editor (metapackage)");
        assert_eq!(pkgs[0].kind.as_deref(), Some("stable,now"));
        assert_eq!(pkgs[0].version.as_deref(), Some("1:28.2+1-15"));
        assert_eq!(pkgs[0].flag(), "i");

        assert_eq!(pkgs[1].name, "emacs-bin-common");
        assert_eq!(pkgs[1].flag(), "");

        assert_eq!(pkgs[2].flag(), "i+");
    }

    #[test]
    fn test_parse_is_pure() {
        assert_eq!(parse_search(SEARCH), parse_search(SEARCH));
    }

    #[test]
    fn test_status_translations() {
        assert_eq!(status_flag("installed"), Some("i"));
        assert_eq!(status_flag("Installiert"), Some("i"));
        assert_eq!(status_flag("installed,automatic"), Some("i+"));
        assert_eq!(status_flag("installiert,automatisch"), Some("i+"));
        assert_eq!(status_flag("installed,upgradable to: 1.2"), Some("i"));
        assert_eq!(status_flag(""), None);
        assert_eq!(status_flag("residual-config"), None);
    }

    #[test]
    fn test_parse_garbage_returns_nothing() {
        assert!(parse_search("E: Could not open lock file").is_empty());
        assert!(parse_search("").is_empty());
    }

    #[test]
    fn test_commands() {
        let runner = ScriptedRunner::new();
        let mut apt = backend(debian(), yes(), &runner);

        apt.refresh(true);
        apt.install(&strings(&["vim", "git"]));
        apt.remove(&strings(&["nano"]));
        apt.upgrade(UpgradeKind::Normal);
        apt.autoremove(false);
        apt.autoremove(true);
        apt.cleanup();

        assert_eq!(
            runner.calls(),
            vec![
                strings(&[SUDO, APT, "update"]),
                strings(&[SUDO, APT, "install", "-y", "vim", "git"]),
                strings(&[SUDO, APT, "remove", "-y", "nano"]),
                strings(&[SUDO, APT, "full-upgrade", "-y"]),
                strings(&[SUDO, APT, "autoremove", "-y"]),
                strings(&[SUDO, APT, "autopurge", "-y"]),
                strings(&[SUDO, APT, "clean"]),
            ]
        );
    }

    #[test]
    fn test_no_yes_flag_by_default() {
        let runner = ScriptedRunner::new();
        let mut apt = backend(debian(), Settings::default(), &runner);
        apt.install(&strings(&["vim"]));
        assert_eq!(runner.last_call().unwrap(), strings(&[SUDO, APT, "install", "vim"]));
    }

    #[test]
    fn test_search_is_not_elevated() {
        let runner = ScriptedRunner::new().reply(0, SEARCH);
        let mut apt = backend(debian(), Settings::default(), &runner);

        let pkgs = apt.search(&strings(&["emacs"]));
        assert_eq!(pkgs.len(), 3);
        assert_eq!(runner.last_call().unwrap(), strings(&[APT, "search", "emacs"]));
        assert_eq!(apt.output().stdout, SEARCH);
    }

    #[test]
    fn test_failed_search_returns_nothing() {
        let runner = ScriptedRunner::new().reply(100, SEARCH);
        let mut apt = backend(debian(), Settings::default(), &runner);
        assert!(apt.search(&strings(&["emacs"])).is_empty());
    }

    #[test]
    fn test_unsupported_operations_succeed() {
        let runner = ScriptedRunner::new();
        let mut apt = backend(debian(), Settings::default(), &runner);
        assert!(apt.upgrade(UpgradeKind::Release).success);
        assert!(apt.audit().is_empty());
        assert!(runner.calls().is_empty());
    }
}
