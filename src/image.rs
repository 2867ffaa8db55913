//! Access to files inside a VM disk image.
//!
//! The pipeline only needs two things from an image: the text of one file and
//! local copies of a few others. [`ImageInspector`] is that seam; [`Guestfs`]
//! implements it with the libguestfs command-line tools.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::process::{ensure_exists, Cmd};

/// Read-only access to files inside a VM image.
pub trait ImageInspector {
    /// Dump a file from the image as text.
    fn read_text(&self, image: &Path, in_image_path: &str) -> Result<String>;

    /// Copy files out of the image into `output_dir`.
    ///
    /// Local copies are named by the basename of each in-image path and are
    /// returned in the same order as `in_image_paths`.
    fn copy_out(
        &self,
        image: &Path,
        in_image_paths: &[&str],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// Host tools required by [`Guestfs`], as (command, package).
pub const GUESTFS_TOOLS: &[(&str, &str)] = &[
    ("virt-cat", "libguestfs-tools"),
    ("virt-copy-out", "libguestfs-tools"),
];

/// Inspector backed by `virt-cat` and `virt-copy-out`.
#[derive(Debug, Clone, Default)]
pub struct Guestfs;

impl ImageInspector for Guestfs {
    fn read_text(&self, image: &Path, in_image_path: &str) -> Result<String> {
        let result = Cmd::new("virt-cat")
            .arg("-a")
            .arg_path(image)
            .arg(in_image_path)
            .error_msg(format!(
                "virt-cat could not read '{}' from image",
                in_image_path
            ))
            .run()
            .with_context(|| format!("dumping '{}' from '{}'", in_image_path, image.display()))?;
        Ok(result.stdout)
    }

    fn copy_out(
        &self,
        image: &Path,
        in_image_paths: &[&str],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        Cmd::new("virt-copy-out")
            .arg("-a")
            .arg_path(image)
            .args(in_image_paths.iter().copied())
            .arg_path(output_dir)
            .error_msg("virt-copy-out failed")
            .run()
            .with_context(|| {
                format!(
                    "copying {} out of '{}' into '{}'",
                    in_image_paths.join(", "),
                    image.display(),
                    output_dir.display()
                )
            })?;

        in_image_paths
            .iter()
            .map(|path| -> Result<PathBuf> {
                let local = local_copy_path(output_dir, path)?;
                ensure_exists(&local, &format!("copied '{}'", path))?;
                Ok(local)
            })
            .collect()
    }
}

/// Where a copied-out in-image file lands inside `output_dir`.
pub fn local_copy_path(output_dir: &Path, in_image_path: &str) -> Result<PathBuf> {
    let name = Path::new(in_image_path)
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("in-image path '{}' has no file name", in_image_path))?;
    Ok(output_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_copy_uses_basename() {
        let local =
            local_copy_path(Path::new("/srv/tftp"), "/boot/vmlinuz-5.3.18-default").unwrap();
        assert_eq!(local, PathBuf::from("/srv/tftp/vmlinuz-5.3.18-default"));
    }

    #[test]
    fn local_copy_rejects_root() {
        assert!(local_copy_path(Path::new("/srv/tftp"), "/").is_err());
    }
}
