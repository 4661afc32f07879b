use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::commands::client;
use crate::{progress, ui};

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let mut client = client(ctx)?;

    let pb = progress::spinner("Checking installed packages against advisories", ctx.quiet || json);
    let found = client.audit()?;
    progress::finish(&pb);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        ui::success("No known vulnerabilities");
        return Ok(());
    }

    ui::header(&format!("{} vulnerable packages", found.len()));
    for pkg in &found {
        let version = pkg.version.as_deref().unwrap_or_default();
        println!("  {} {}", pkg.name.as_str().red().bold(), version.dimmed());
        if !pkg.desc.is_empty() {
            ui::dim(&pkg.desc);
        }
    }
    Ok(())
}
