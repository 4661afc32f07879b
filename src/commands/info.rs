use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use pkgkit::{Operation, privilege};

use crate::Context;
use crate::commands::client;
use crate::{paths, ui};

pub fn run(ctx: &Context) -> Result<()> {
    let client = client(ctx)?;
    let backend = client.backend();

    ui::header("sloth");

    ui::section("System");
    ui::kv("Platform", &backend.platform().to_string());
    ui::kv("Backend", backend.name());
    let elevation = if privilege::is_privileged() {
        "not needed (running as root)".to_string()
    } else {
        privilege::find_elevation().map_or_else(
            || "none found".yellow().to_string(),
            |p| p.display().to_string(),
        )
    };
    ui::kv("Elevation", &elevation);
    if !privilege::is_privileged() && privilege::find_elevation().is_none() {
        ui::warn("Install doas or sudo, or run sloth as root, to change packages");
    }

    ui::section("Configuration");
    ui::kv("Base directory", &paths::base_dir()?.display().to_string());
    ui::kv("Config file", &paths::config_file()?.display().to_string());
    ui::kv("History", &paths::db_file()?.display().to_string());
    let settings = ctx.config.settings(ctx.yes);
    ui::kv("nice", &settings.nice.to_string());
    ui::kv("say-yes", &settings.assume_yes.to_string());
    ui::kv(
        "refresh-interval",
        &format!("{}s", ctx.config.refresh_interval),
    );
    ui::kv(
        "timeout",
        &settings
            .timeout
            .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs())),
    );

    ui::section("Package index");
    match client.ledger().most_recent(Operation::Refresh)? {
        Some(last) => ui::kv(
            "Last refresh",
            &last
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ),
        None => ui::kv("Last refresh", "never"),
    }
    let due = if client.is_refresh_due()? {
        "refresh due".yellow()
    } else {
        "fresh".green()
    };
    ui::kv("Status", &due.to_string());

    Ok(())
}
