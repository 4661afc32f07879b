use anyhow::{Context as _, Result};
use chrono::Local;
use colored::Colorize;
use pkgkit::{Ledger, Record};

use crate::Context;
use crate::cli::HistoryArgs;
use crate::{paths, ui};

pub fn run(ctx: &Context, args: &HistoryArgs) -> Result<()> {
    let db = paths::db_file()?;
    if !db.exists() {
        ui::info("No operations recorded yet");
        return Ok(());
    }

    let ledger =
        Ledger::open(&db).with_context(|| format!("Failed to open history at {}", db.display()))?;
    let records = match args.op {
        Some(op) => ledger.recent_for(op, args.limit)?,
        None => ledger.recent(args.limit)?,
    };

    if records.is_empty() {
        ui::info("No matching operations");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Recent operations");
    }
    for record in &records {
        println!("  {}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &Record) -> String {
    let when = record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    let mut line = format!(
        "{:>5} {} {:<15}",
        record.id,
        when.to_string().dimmed(),
        record.operation.as_str().cyan()
    );
    if !record.args.is_empty() {
        line.push(' ');
        line.push_str(&record.args);
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pkgkit::Operation;

    #[test]
    fn test_format_record() {
        colored::control::set_override(false);

        let timestamp: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let local = timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
        let record = Record {
            id: 7,
            operation: Operation::Install,
            timestamp,
            args: "vim git".to_string(),
        };

        assert_eq!(
            format_record(&record),
            format!("    7 {local} install         vim git")
        );

        let bare = Record {
            args: String::new(),
            operation: Operation::Refresh,
            ..record
        };
        assert_eq!(format_record(&bare), format!("    7 {local} refresh"));
    }
}
