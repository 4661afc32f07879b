//! Pacman backend for Arch Linux and derivatives.

use super::{Core, PackageManager, check_parsed, nothing_to_do};
use crate::error::Result;
use crate::types::{
    Captured, CommandStatus, INFO_INSTALLED, Operation, Package, Platform, UpgradeKind,
};
use regex::Regex;
use std::sync::LazyLock;

const PACMAN: &str = "/usr/bin/pacman";
const YES: Option<&str> = Some("--noconfirm");

/// `repo/name version [(groups)] [[installed]]`, then an indented description.
static SEARCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(\S+)/(\S+)[ \t]+(\S+)(?:[ \t]+\([^)\n]*\))?(?:[ \t]+\[([^\]\n]+)\])?[ \t]*\r?\n[ \t]+(.*?)[ \t]*\r?$",
    )
    .expect("pacman search pattern is valid")
});

/// Backend driving `pacman`.
pub struct Pacman {
    core: Core,
}

impl Pacman {
    pub(crate) fn new(core: Core) -> Self {
        Self { core }
    }

    fn run(&mut self, op: Operation, args: &[&str], operands: &[String]) -> CommandStatus {
        let argv = self.core.argv(PACMAN, op, args, YES, operands);
        self.core.execute(argv, false)
    }

    /// Packages installed as dependencies that nothing requires anymore.
    fn orphans(&mut self) -> Vec<String> {
        // -Qdtq exits with 1 when there are no orphans.
        let argv = self.core.prefix(PACMAN, false);
        let argv = argv.into_iter().chain(["-Qdtq".to_string()]).collect();
        self.core.execute(argv, true);
        self.core
            .output()
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

impl PackageManager for Pacman {
    fn name(&self) -> &'static str {
        "Pacman"
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
            .prefix(PACMAN, op.is_none_or(|op| op.needs_privilege())))
    }

    fn refresh(&mut self, force: bool) -> CommandStatus {
        let arg = if force { "-Syy" } else { "-Sy" };
        self.run(Operation::Refresh, &[arg], &[])
    }

    fn install(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Install, packages) {
            return skipped;
        }
        self.run(Operation::Install, &["-S"], packages)
    }

    fn remove(&mut self, packages: &[String]) -> CommandStatus {
        if let Some(skipped) = nothing_to_do(Operation::Delete, packages) {
            return skipped;
        }
        self.run(Operation::Delete, &["-R"], packages)
    }

    fn upgrade(&mut self, kind: UpgradeKind) -> CommandStatus {
        // Rolling release: every kind of upgrade is the same full sync.
        self.run(kind.operation(), &["-Syu"], &[])
    }

    fn search(&mut self, terms: &[String]) -> Vec<Package> {
        let argv = self.core.argv(PACMAN, Operation::Search, &["-Ss"], None, terms);
        match self.core.query(argv) {
            Some(stdout) => parse_search(&stdout),
            None => Vec::new(),
        }
    }

    fn autoremove(&mut self, _purge: bool) -> CommandStatus {
        let orphans = self.orphans();
        if orphans.is_empty() {
            log::info!("No orphaned packages to remove");
            return CommandStatus::skipped();
        }
        self.run(Operation::Autoremove, &["-R", "-u"], &orphans)
    }

    fn cleanup(&mut self) -> CommandStatus {
        self.run(Operation::Cleanup, &["-Scc"], &[])
    }
}

/// Parse `pacman -Ss` output.
pub fn parse_search(raw: &str) -> Vec<Package> {
    let packages = SEARCH_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            let pkg = Package::new(&caps[2], caps[5].trim())
                .with_kind(&caps[1])
                .with_version(&caps[3]);
            match caps.get(4) {
                Some(status) if status.as_str().starts_with("installed") => {
                    pkg.with_info(INFO_INSTALLED)
                }
                Some(status) => {
                    log::debug!("Unrecognized pacman status {:?}", status.as_str());
                    pkg
                }
                None => pkg,
            }
        })
        .collect();

    check_parsed("Pacman", raw, packages)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::exec::ScriptedRunner;
    use crate::types::Settings;

    const SEARCH: &str = "extra/emacs 29.4-3 [installed]
    The extensible, customizable, self-documenting real-time display editor
extra/emacs-nox 29.4-3
    The extensible, customizable, self-documenting real-time display editor without X11 support
core/base-devel 1-2 (base-devel) [installed: 1-1]
    Basic tools to build Arch Linux packages
";

    fn arch() -> Platform {
        Platform::new("arch", "", "unknown")
    }

    #[test]
    fn test_parse_search() {
        let pkgs = parse_search(SEARCH);
        assert_eq!(pkgs.len(), 3);

        assert_eq!(pkgs[0].name, "emacs");
        assert_eq!(pkgs[0].kind.as_deref(), Some("extra"));
        assert_eq!(pkgs[0].version.as_deref(), Some("29.4-3"));
        assert_eq!(
            pkgs[0].desc,
            "The extensible, customizable, self-documenting real-time display editor"
        );
        assert_eq!(pkgs[0].flag(), "i");

        assert_eq!(pkgs[1].name, "emacs-nox");
        assert!(pkgs[1].info.is_none());

        assert_eq!(pkgs[2].name, "base-devel");
        assert_eq!(pkgs[2].kind.as_deref(), Some("core"));
        assert_eq!(pkgs[2].flag(), "i");
    }

    #[test]
    fn test_parse_is_pure() {
        assert_eq!(parse_search(SEARCH), parse_search(SEARCH));
    }

    #[test]
    fn test_commands() {
        let runner = ScriptedRunner::new();
        let mut pacman = backend(arch(), yes(), &runner);

        pacman.refresh(false);
        pacman.install(&strings(&["vim"]));
        pacman.remove(&strings(&["nano"]));
        pacman.upgrade(UpgradeKind::Big);
        pacman.cleanup();

        assert_eq!(
            runner.calls(),
            vec![
                strings(&[SUDO, PACMAN, "-Sy", "--noconfirm"]),
                strings(&[SUDO, PACMAN, "-S", "--noconfirm", "vim"]),
                strings(&[SUDO, PACMAN, "-R", "--noconfirm", "nano"]),
                strings(&[SUDO, PACMAN, "-Syu", "--noconfirm"]),
                strings(&[SUDO, PACMAN, "-Scc", "--noconfirm"]),
            ]
        );
    }

    #[test]
    fn test_autoremove_removes_orphans() {
        let runner = ScriptedRunner::new().reply(0, "libfoo\nlibbar\n");
        let mut pacman = backend(arch(), Settings::default(), &runner);

        assert!(pacman.autoremove(false).success);
        assert_eq!(
            runner.calls(),
            vec![
                strings(&[PACMAN, "-Qdtq"]),
                strings(&[SUDO, PACMAN, "-R", "-u", "libfoo", "libbar"]),
            ]
        );
    }

    #[test]
    fn test_autoremove_without_orphans() {
        let runner = ScriptedRunner::new().reply(1, "");
        let mut pacman = backend(arch(), Settings::default(), &runner);

        assert!(pacman.autoremove(false).success);
        assert_eq!(runner.calls().len(), 1);
    }
}
