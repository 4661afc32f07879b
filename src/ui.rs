use colored::{ColoredString, Colorize};
use pkgkit::{CommandStatus, Package};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Packages
// ============================================================================

/// The info flag of a package, padded and colored
pub fn flag(pkg: &Package) -> ColoredString {
    let text = format!("{:<2}", pkg.flag());
    match pkg.flag() {
        pkgkit::INFO_INSTALLED => text.green().bold(),
        pkgkit::INFO_INSTALLED_AUTO => text.cyan(),
        _ => text.normal(),
    }
}

/// One line describing a package, for tables and pick lists
pub fn package_line(pkg: &Package, name_width: usize) -> String {
    let version = pkg.version.as_deref().unwrap_or_default();
    let mut line = format!(
        "{} {:<name_width$} {}",
        flag(pkg),
        pkg.name.as_str().bold(),
        version.dimmed()
    );
    if let Some(kind) = &pkg.kind {
        line.push_str(&format!(" [{}]", kind.as_str().blue()));
    }
    if !pkg.desc.is_empty() {
        line.push_str(&format!(" - {}", pkg.desc));
    }
    line
}

/// Print packages as an aligned table
pub fn package_table(packages: &[Package]) {
    let width = name_width(packages);
    for pkg in packages {
        println!("  {}", package_line(pkg, width));
    }
}

/// Width of the widest package name
pub fn name_width(packages: &[Package]) -> usize {
    packages.iter().map(|p| p.name.chars().count()).max().unwrap_or(0)
}

/// Report the outcome of a mutating operation
pub fn status(what: &str, status: CommandStatus) {
    if status.success {
        success(&format!("{what} finished"));
    } else if status.timed_out {
        error(&format!("{what} timed out"));
    } else {
        error(&format!("{what} failed with exit code {}", status.exit_code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_line_plain() {
        colored::control::set_override(false);

        let pkg = Package::new("emacs", "GNU Emacs editor")
            .with_version("29.4")
            .with_kind("stable")
            .with_info("i");
        assert_eq!(
            package_line(&pkg, 8),
            "i  emacs    29.4 [stable] - GNU Emacs editor"
        );

        let bare = Package::new("vim", "");
        assert_eq!(package_line(&bare, 3), "   vim ");
    }

    #[test]
    fn test_name_width() {
        let pkgs = vec![Package::new("vim", ""), Package::new("emacs-nox", "")];
        assert_eq!(name_width(&pkgs), 9);
        assert_eq!(name_width(&[]), 0);
    }
}
