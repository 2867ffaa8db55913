//! Bootloader configuration scanning.
//!
//! Recovers the kernel image, initrd image and kernel command line from a
//! generated GRUB configuration. Images typically carry two menu entries for
//! the same kernel: the normal one and a longer "failsafe" one with extra
//! debug arguments. The shortest kernel line is taken as the normal entry.
//!
//! Scanning never fails. Anything that cannot be found is left empty and the
//! caller decides, via [`ExtractedPaths::require_complete`], whether that is
//! fatal.
//!
//! ```rust
//! use image_boot_extract::grub::parse_boot_config;
//!
//! let cfg = "\
//! linux /boot/vmlinuz-5.3.18-default ${extra_cmdline} quiet console=ttyS0
//! initrd /boot/initrd-5.3.18-default
//! ";
//! let paths = parse_boot_config(cfg);
//! assert_eq!(paths.kernel_path, "/boot/vmlinuz-5.3.18-default");
//! assert_eq!(paths.initrd_path, "/boot/initrd-5.3.18-default");
//! assert_eq!(paths.boot_args, "quiet console=ttyS0");
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{BootArtifact, BootError};

/// Substring identifying a kernel line candidate.
pub const KERNEL_MARKER: &str = "boot/vmlinuz";

static INITRD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/boot/initrd-\S+-default").expect("initrd pattern is valid")
});

// The argument clause is everything after the marker, spaces included.
static KERNEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/boot/vmlinuz-\S+-default) \$\{extra_cmdline\} (.*)")
        .expect("kernel pattern is valid")
});

/// Paths and arguments recovered from a bootloader configuration.
///
/// Fields are empty when the corresponding entry was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPaths {
    pub kernel_path: String,
    pub initrd_path: String,
    pub boot_args: String,
}

impl ExtractedPaths {
    /// Fail on the first empty field, checked as kernel, initrd, args.
    pub fn require_complete(&self) -> Result<(), BootError> {
        let fields = [
            (BootArtifact::Kernel, &self.kernel_path),
            (BootArtifact::Initrd, &self.initrd_path),
            (BootArtifact::Args, &self.boot_args),
        ];
        for (artifact, value) in fields {
            if value.is_empty() {
                return Err(BootError::MissingBootArtifact(artifact));
            }
        }
        Ok(())
    }
}

/// Scan a bootloader configuration for kernel, initrd and boot arguments.
pub fn parse_boot_config(text: &str) -> ExtractedPaths {
    let mut initrd_path = String::new();
    for line in text.lines() {
        if let Some(found) = INITRD_RE.find(line) {
            initrd_path = found.as_str().to_string();
        }
    }

    let (kernel_path, boot_args) = select_kernel_line(text)
        .and_then(split_kernel_line)
        .unwrap_or_default();

    ExtractedPaths {
        kernel_path,
        initrd_path,
        boot_args,
    }
}

/// Pick the shortest line mentioning a kernel image; the earliest wins a tie.
pub fn select_kernel_line(text: &str) -> Option<&str> {
    let mut best: Option<(usize, &str)> = None;
    for line in text.lines().filter(|line| line.contains(KERNEL_MARKER)) {
        let len = line.chars().count();
        match best {
            Some((best_len, _)) if best_len <= len => {}
            _ => best = Some((len, line)),
        }
    }
    best.map(|(_, line)| line)
}

fn split_kernel_line(line: &str) -> Option<(String, String)> {
    let caps = KERNEL_RE.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
