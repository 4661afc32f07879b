//! Commands that change installed packages.

use anyhow::Result;
use pkgkit::UpgradeKind;

use crate::Context;
use crate::cli::UpgradeArgs;
use crate::commands::{client, finish, refresh_if_due};
use crate::ui;

pub fn install(ctx: &Context, packages: &[String]) -> Result<()> {
    let mut client = client(ctx)?;
    refresh_if_due(ctx, &mut client)?;

    if !ctx.quiet {
        ui::info(&format!("Installing {}", packages.join(", ")));
    }
    let status = client.install(packages)?;
    finish(ctx, "Install", status)
}

pub fn remove(ctx: &Context, packages: &[String]) -> Result<()> {
    let mut client = client(ctx)?;
    refresh_if_due(ctx, &mut client)?;

    if !ctx.quiet {
        ui::info(&format!("Removing {}", packages.join(", ")));
    }
    let status = client.remove(packages)?;
    finish(ctx, "Remove", status)
}

pub fn refresh(ctx: &Context, force: bool) -> Result<()> {
    let mut client = client(ctx)?;

    if !force && !client.is_refresh_due()? {
        if !ctx.quiet {
            ui::info("Package index is up to date (use --force to refresh anyway)");
        }
        return Ok(());
    }

    let status = client.refresh(force)?;
    finish(ctx, "Refresh", status)
}

pub fn upgrade(ctx: &Context, args: &UpgradeArgs) -> Result<()> {
    let kind = upgrade_kind(args);
    let mut client = client(ctx)?;
    refresh_if_due(ctx, &mut client)?;

    let status = client.upgrade(kind)?;
    finish(ctx, "Upgrade", status)
}

pub fn autoremove(ctx: &Context, purge: bool) -> Result<()> {
    let mut client = client(ctx)?;
    let status = client.autoremove(purge)?;
    finish(ctx, "Autoremove", status)
}

pub fn cleanup(ctx: &Context) -> Result<()> {
    let mut client = client(ctx)?;
    let status = client.cleanup()?;
    finish(ctx, "Cleanup", status)
}

fn upgrade_kind(args: &UpgradeArgs) -> UpgradeKind {
    if args.release {
        UpgradeKind::Release
    } else if args.big {
        UpgradeKind::Big
    } else {
        UpgradeKind::Normal
    }
}
