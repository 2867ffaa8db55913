//! Boot report assembly and persistence.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cmdline::NormalizedArgs;
use crate::error::BootError;

/// Everything a direct-kernel boot needs: the two images and their arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootReport {
    pub kernel: String,
    pub initrd: String,
    pub args: NormalizedArgs,
}

impl BootReport {
    pub fn new(kernel: &Path, initrd: &Path, args: NormalizedArgs) -> Self {
        Self {
            kernel: kernel.display().to_string(),
            initrd: initrd.display().to_string(),
            args,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Replace `dest` with this report.
    ///
    /// The payload goes to a sibling temp file first and is renamed into
    /// place, so readers see either the old file or the complete new one.
    /// The parent directory must already exist.
    pub fn write_to(&self, dest: &Path) -> Result<(), BootError> {
        let payload = self
            .to_json()
            .map_err(|e| write_failure(dest, std::io::Error::other(e)))?;

        let tmp = temp_sibling(dest);
        if let Err(e) = fs::write(&tmp, payload) {
            let _ = fs::remove_file(&tmp);
            return Err(write_failure(dest, e));
        }
        fs::rename(&tmp, dest).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            write_failure(dest, e)
        })
    }
}

fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "boot-report".to_string());
    dest.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}

fn write_failure(path: &Path, source: std::io::Error) -> BootError {
    BootError::WriteFailure {
        path: path.to_path_buf(),
        source,
    }
}
