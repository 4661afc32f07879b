// Package operations
pub mod audit;
pub mod packages;
pub mod pick;
pub mod search;

// Introspection
pub mod history;
pub mod info;

use anyhow::{Context, Result, bail};
use pkgkit::{Client, CommandStatus, Ledger};

use crate::Context as AppContext;
use crate::{paths, ui};

/// Open the ledger and create a client for the detected platform
pub fn client(ctx: &AppContext) -> Result<Client> {
    paths::ensure_base_dir()?;
    let db = paths::db_file()?;
    let ledger =
        Ledger::open(&db).with_context(|| format!("Failed to open history at {}", db.display()))?;

    let client = Client::new(
        ctx.config.settings(ctx.yes),
        ledger,
        ctx.config.refresh_interval(),
    )
    .context("Failed to set up the package manager")?;

    log::debug!(
        "Using {} on {}",
        client.backend().name(),
        client.backend().platform()
    );
    Ok(client)
}

/// Report a command's outcome and turn failure into an error
pub fn finish(ctx: &AppContext, what: &str, status: CommandStatus) -> Result<()> {
    if !ctx.quiet || !status.success {
        ui::status(what, status);
    }
    if status.success {
        Ok(())
    } else if status.timed_out {
        bail!("{what} timed out")
    } else {
        bail!("{what} failed with exit code {}", status.exit_code)
    }
}

/// Refresh the package index first if it is stale
pub fn refresh_if_due(ctx: &AppContext, client: &mut Client) -> Result<()> {
    if let Some(status) = client.refresh_if_due()? {
        finish(ctx, "Refresh", status)?;
    }
    Ok(())
}
