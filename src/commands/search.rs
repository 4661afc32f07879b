use anyhow::Result;
use pkgkit::Package;

use crate::Context;
use crate::cli::SearchArgs;
use crate::commands::client;
use crate::{progress, ui};

pub fn run(ctx: &Context, args: &SearchArgs) -> Result<()> {
    let mut client = client(ctx)?;

    let pb = progress::spinner(
        &format!("Searching for {}", args.terms.join(" ")),
        ctx.quiet || args.json,
    );
    let found = client.search(&args.terms);
    progress::finish(&pb);

    let packages = filter(found, args.installed);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    if packages.is_empty() {
        ui::info("No packages found");
        return Ok(());
    }

    ui::package_table(&packages);
    if !ctx.quiet {
        let installed = packages.iter().filter(|p| p.is_installed()).count();
        ui::dim(&format!("{} found, {} installed", packages.len(), installed));
    }
    Ok(())
}

fn filter(packages: Vec<Package>, installed_only: bool) -> Vec<Package> {
    if installed_only {
        packages.into_iter().filter(Package::is_installed).collect()
    } else {
        packages
    }
}
