//! Interactive package selection.
//!
//! Search results are offered as a checklist with installed packages
//! pre-selected. Whatever the user checks that was not installed gets
//! installed, whatever they uncheck that was installed gets removed.

use anyhow::Result;
use dialoguer::{Confirm, MultiSelect};
use pkgkit::Package;
use std::collections::HashSet;

use crate::Context;
use crate::commands::{client, finish, refresh_if_due};
use crate::{progress, ui};

/// Packages to install and remove after a selection
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub install: Vec<String>,
    pub remove: Vec<String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.remove.is_empty()
    }
}

pub fn run(ctx: &Context, terms: &[String]) -> Result<()> {
    let mut client = client(ctx)?;

    let pb = progress::spinner(&format!("Searching for {}", terms.join(" ")), ctx.quiet);
    let packages = client.search(terms);
    progress::finish(&pb);

    if packages.is_empty() {
        ui::info("No packages found");
        return Ok(());
    }

    let width = ui::name_width(&packages);
    let items: Vec<String> = packages.iter().map(|p| ui::package_line(p, width)).collect();
    let defaults: Vec<bool> = packages.iter().map(Package::is_installed).collect();

    let selected = MultiSelect::new()
        .with_prompt("Select packages (space toggles, enter confirms)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;

    let delta = delta(&packages, &selected);
    if delta.is_empty() {
        ui::info("Nothing to do");
        return Ok(());
    }

    if !delta.install.is_empty() {
        ui::kv("Install", &delta.install.join(", "));
    }
    if !delta.remove.is_empty() {
        ui::kv("Remove", &delta.remove.join(", "));
    }

    if !ctx.yes
        && !Confirm::new()
            .with_prompt("Continue?")
            .default(true)
            .interact()?
    {
        ui::info("Cancelled");
        return Ok(());
    }

    if !delta.remove.is_empty() {
        let status = client.remove(&delta.remove)?;
        finish(ctx, "Remove", status)?;
    }
    if !delta.install.is_empty() {
        refresh_if_due(ctx, &mut client)?;
        let status = client.install(&delta.install)?;
        finish(ctx, "Install", status)?;
    }
    Ok(())
}

/// Difference between the installed packages and the selection.
///
/// `selected` holds indices into `packages`. Names keep the order of
/// `packages` and appear once even if several versions were listed.
pub fn delta(packages: &[Package], selected: &[usize]) -> Delta {
    let before: HashSet<&Package> = packages.iter().filter(|p| p.is_installed()).collect();
    let after: HashSet<&Package> = selected.iter().filter_map(|&i| packages.get(i)).collect();

    let mut delta = Delta::default();
    for pkg in packages {
        let target = match (before.contains(pkg), after.contains(pkg)) {
            (false, true) => &mut delta.install,
            (true, false) => &mut delta.remove,
            _ => continue,
        };
        if !target.contains(&pkg.name) {
            target.push(pkg.name.clone());
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages() -> Vec<Package> {
        vec![
            Package::new("emacs", "editor").with_version("29").with_info("i"),
            Package::new("emacs-nox", "editor without X").with_version("29"),
            Package::new("vim", "vi improved").with_version("9").with_info("i+"),
            Package::new("nano", "small editor").with_version("8"),
        ]
    }

    #[test]
    fn test_unchanged_selection_is_empty() {
        let delta = delta(&packages(), &[0, 2]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_delta() {
        let delta = delta(&packages(), &[1, 2, 3]);
        assert_eq!(delta.install, vec!["emacs-nox", "nano"]);
        assert_eq!(delta.remove, vec!["emacs"]);
    }

    #[test]
    fn test_out_of_range_selection_is_ignored() {
        let delta = delta(&packages(), &[0, 2, 42]);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_duplicate_names_listed_once() {
        let pkgs = vec![
            Package::new("git", "vcs").with_version("2.43").with_kind("main"),
            Package::new("git", "vcs").with_version("2.45").with_kind("backports"),
        ];
        let delta = delta(&pkgs, &[0, 1]);
        assert_eq!(delta.install, vec!["git"]);
    }
}
