//! Preflight checks for host tooling.
//!
//! Validates that the tools used to look inside VM images are installed
//! before anything is read or copied, so a missing package shows up as one
//! clear message instead of a failed command halfway through a run.
//!
//! # Example
//!
//! ```rust
//! use image_boot_extract::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("virt-cat") {
//!     println!("libguestfs-tools not installed");
//! }
//!
//! let tools = &[("virt-cat", "libguestfs-tools")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

use crate::image::GUESTFS_TOOLS;

/// Check if a command can be found in PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Check that specific tools are available.
///
/// # Arguments
///
/// * `tools` - Slice of (command, package) tuples
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` listing every missing tool and the package that provides it
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check the tools needed by the libguestfs image inspector.
pub fn check_host_tools() -> Result<()> {
    check_required_tools(GUESTFS_TOOLS)
}
