//! Privilege elevation.
//!
//! Package managers have to run as root for anything that changes the
//! system. When sloth itself is not running as root it prefixes commands with
//! the first elevation tool found on the search path.

use std::path::PathBuf;

/// Elevation tools in order of preference.
///
/// doas and sudo come before run0, which asks for a password on every call.
pub const ELEVATION_TOOLS: [&str; 3] = ["doas", "sudo", "run0"];

/// Whether the current process runs with root privileges.
pub fn is_privileged() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Find an elevation tool on the search path.
///
/// Returns `None` when none of [`ELEVATION_TOOLS`] is installed. Privileged
/// commands will then fail with the tool's own permission error.
pub fn find_elevation() -> Option<PathBuf> {
    find_elevation_with(|name| which::which(name).ok())
}

/// [`find_elevation`] with a custom lookup function.
pub fn find_elevation_with<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let found = ELEVATION_TOOLS.iter().find_map(|name| lookup(name));
    match &found {
        Some(path) => log::debug!("Using {} for privilege elevation", path.display()),
        None => log::warn!("No elevation tool found (tried {})", ELEVATION_TOOLS.join(", ")),
    }
    found
}

/// The elevation command to use, or `None` when already privileged.
pub fn elevation() -> Option<PathBuf> {
    if is_privileged() {
        None
    } else {
        find_elevation()
    }
}
