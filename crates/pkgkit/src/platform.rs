//! Platform detection.
//!
//! The release descriptor (`/etc/os-release`) is consulted first. When it is
//! missing or names a distribution we have no mapping for, the kernel name,
//! release and machine reported by `uname` are used instead. This is how the
//! BSDs without a descriptor end up as "freebsd"/"openbsd".
//!
//! # Mapping
//!
//! | `ID`                                   | Platform name        | Arch           |
//! |----------------------------------------|----------------------|----------------|
//! | debian                                 | debian               | unknown        |
//! | raspbian                               | debian               | raspberry-pi   |
//! | opensuse-tumbleweed, opensuse-leap     | (unchanged)          | unknown        |
//! | freebsd                                | freebsd              | unknown        |
//! | arch, manjaro                          | arch                 | unknown        |
//! | fedora                                 | fedora               | unknown        |

use crate::error::{Error, Result};
use crate::types::{Platform, UNKNOWN_ARCH};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

/// Standard location of the release descriptor.
pub const OS_RELEASE: &str = "/etc/os-release";

/// Determine the platform we are running on.
///
/// # Errors
///
/// Returns `Error::Resolution` if neither the release descriptor nor `uname`
/// yields a usable answer.
pub fn resolve() -> Result<Platform> {
    resolve_from(Path::new(OS_RELEASE))
}

/// Like [`resolve`], reading the release descriptor from `path`.
pub fn resolve_from(path: &Path) -> Result<Platform> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        if let Some(platform) = from_os_release(&content) {
            log::debug!("Detected {} from {}", platform, path.display());
            return Ok(platform);
        }
        log::debug!(
            "{} names no known distribution, falling back to uname",
            path.display()
        );
    }

    from_uname()
}

/// Split release descriptor content into a key/value map.
///
/// Keys are lower-cased, one layer of surrounding quotes is stripped from
/// values, lines without `=` are ignored.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_lowercase(), unquote(value.trim()).to_string()))
        .collect()
}

/// Map release descriptor content to a platform, if the `ID` is known.
pub fn from_os_release(content: &str) -> Option<Platform> {
    let info = parse_os_release(content);
    let id = info.get("id")?;
    let version = info.get("version_id").cloned().unwrap_or_default();

    let platform = match id.as_str() {
        "debian" => Platform::new("debian", version, UNKNOWN_ARCH),
        "raspbian" => Platform::new("debian", version, "raspberry-pi"),
        "opensuse-tumbleweed" | "opensuse-leap" => Platform::new(id, version, UNKNOWN_ARCH),
        "freebsd" => Platform::new("freebsd", version, UNKNOWN_ARCH),
        "arch" | "manjaro" => Platform::new("arch", version, UNKNOWN_ARCH),
        "fedora" => Platform::new("fedora", version, UNKNOWN_ARCH),
        _ => return None,
    };

    Some(platform)
}

/// Ask `uname` for kernel name, release and machine.
pub fn from_uname() -> Result<Platform> {
    let output = Command::new("uname")
        .args(["-s", "-r", "-m"])
        .output()
        .map_err(|e| Error::Resolution {
            message: format!("failed to run uname: {e}"),
        })?;

    if !output.status.success() {
        return Err(Error::Resolution {
            message: format!(
                "uname failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    parse_uname(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `uname -s -r -m` output ("FreeBSD 14.1-RELEASE amd64").
pub fn parse_uname(output: &str) -> Result<Platform> {
    let mut fields = output.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(kernel), Some(release), Some(machine)) => {
            Ok(Platform::new(kernel.to_lowercase(), release, machine))
        }
        _ => Err(Error::Resolution {
            message: format!("unexpected uname output: {:?}", output.trim()),
        }),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(id: &str, version: &str) -> String {
        format!("NAME=\"Some Linux\"\nID={id}\nVERSION_ID=\"{version}\"\n")
    }

    #[test]
    fn test_lookup_table() {
        let cases = [
            ("debian", "12", ("debian", "12", "unknown")),
            ("raspbian", "11", ("debian", "11", "raspberry-pi")),
            (
                "opensuse-tumbleweed",
                "20240101",
                ("opensuse-tumbleweed", "20240101", "unknown"),
            ),
            ("opensuse-leap", "15.6", ("opensuse-leap", "15.6", "unknown")),
            ("freebsd", "14.1", ("freebsd", "14.1", "unknown")),
            ("arch", "", ("arch", "", "unknown")),
            ("manjaro", "24.0", ("arch", "24.0", "unknown")),
            ("fedora", "40", ("fedora", "40", "unknown")),
        ];

        for (id, version, (name, want_version, arch)) in cases {
            let platform = from_os_release(&release(id, version))
                .unwrap_or_else(|| panic!("{id} should be recognized"));
            assert_eq!(platform, Platform::new(name, want_version, arch), "id {id}");
        }
    }

    #[test]
    fn test_unknown_id_is_not_mapped() {
        assert!(from_os_release(&release("gentoo", "2.15")).is_none());
        assert!(from_os_release("NAME=nothing\n").is_none());
    }

    #[test]
    fn test_parse_os_release() {
        let content = r#"PRETTY_NAME="Debian GNU/Linux 12 (bookworm)"
NAME="Debian GNU/Linux"
VERSION_ID="12"
ID=debian
HOME_URL='https://www.debian.org/'
garbage line
"#;
        let info = parse_os_release(content);
        assert_eq!(info["id"], "debian");
        assert_eq!(info["version_id"], "12");
        assert_eq!(info["pretty_name"], "Debian GNU/Linux 12 (bookworm)");
        assert_eq!(info["home_url"], "https://www.debian.org/");
        assert!(!info.contains_key("garbage line"));
    }

    #[test]
    fn test_unquote_strips_one_layer() {
        assert_eq!(unquote("\"12\""), "12");
        assert_eq!(unquote("'12'"), "12");
        assert_eq!(unquote("\"\"12\"\""), "\"12\"");
        assert_eq!(unquote("\"12"), "\"12");
        assert_eq!(unquote("12"), "12");
    }

    #[test]
    fn test_parse_uname() {
        let platform = parse_uname("FreeBSD 14.1-RELEASE amd64\n").unwrap();
        assert_eq!(platform, Platform::new("freebsd", "14.1-RELEASE", "amd64"));

        let platform = parse_uname("OpenBSD 7.5 amd64").unwrap();
        assert_eq!(platform.name, "openbsd");
    }

    #[test]
    fn test_parse_uname_short_output() {
        let err = parse_uname("Linux\n").unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_resolve_from_descriptor_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, release("raspbian", "12")).unwrap();

        let platform = resolve_from(&path).unwrap();
        assert_eq!(platform, Platform::new("debian", "12", "raspberry-pi"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_without_descriptor_uses_uname() {
        let dir = tempfile::tempdir().unwrap();
        let platform = resolve_from(&dir.path().join("missing")).unwrap();
        assert!(!platform.name.is_empty());
        assert_eq!(platform.name, platform.name.to_lowercase());
    }

    #[cfg(unix)]
    #[test]
    fn test_unknown_id_falls_back_to_uname() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, release("gentoo", "2.15")).unwrap();

        let platform = resolve_from(&path).unwrap();
        assert_eq!(platform, from_uname().unwrap());
        assert_ne!(platform.name, "gentoo");
    }
}
