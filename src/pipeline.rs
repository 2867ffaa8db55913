//! End-to-end extraction: image in, boot report out.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cmdline::NormalizedArgs;
use crate::config::ExtractSettings;
use crate::grub::parse_boot_config;
use crate::image::ImageInspector;
use crate::report::BootReport;

/// Pull kernel, initrd and boot arguments out of `settings.image`.
///
/// Nothing is copied out of the image and no report is written unless the
/// bootloader config yields all three of kernel, initrd and arguments.
pub fn extract_boot_report(
    inspector: &dyn ImageInspector,
    settings: &ExtractSettings,
) -> Result<BootReport> {
    tracing::info!(
        image = %settings.image.display(),
        grub_config = %settings.grub_config,
        "reading bootloader config"
    );
    let text = inspector.read_text(&settings.image, &settings.grub_config)?;

    let paths = parse_boot_config(&text);
    paths.require_complete().with_context(|| {
        format!(
            "scanning '{}' in '{}'",
            settings.grub_config,
            settings.image.display()
        )
    })?;
    tracing::info!(
        kernel = %paths.kernel_path,
        initrd = %paths.initrd_path,
        "found boot entry"
    );
    tracing::debug!(args = %paths.boot_args, "raw boot arguments");

    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "creating output directory '{}'",
            settings.output_dir.display()
        )
    })?;
    let copied = inspector.copy_out(
        &settings.image,
        &[paths.kernel_path.as_str(), paths.initrd_path.as_str()],
        &settings.output_dir,
    )?;
    let [kernel, initrd] = absolute_pair(copied)?;

    let args = NormalizedArgs::parse(&paths.boot_args, settings.disable_meltdown_spectre);
    if settings.disable_meltdown_spectre {
        tracing::info!("speculative execution mitigations disabled in boot arguments");
    }

    let report = BootReport::new(&kernel, &initrd, args);
    report.write_to(&settings.report)?;
    tracing::info!(report = %settings.report.display(), "boot report written");

    Ok(report)
}

fn absolute_pair(copied: Vec<PathBuf>) -> Result<[PathBuf; 2]> {
    let count = copied.len();
    let pair: [PathBuf; 2] = copied
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected 2 copied boot files, got {}", count))?;
    let [kernel, initrd] = pair;
    Ok([canonical(kernel)?, canonical(initrd)?])
}

fn canonical(path: PathBuf) -> Result<PathBuf> {
    fs::canonicalize(&path)
        .with_context(|| format!("resolving absolute path of '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BootArtifact, BootError};
    use crate::image::local_copy_path;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    const GRUB_CFG: &str = "\
menuentry 'SLES 15 SP2' {
\tlinux /boot/vmlinuz-5.3.18-24-default ${extra_cmdline} splash=silent quiet console=ttyS0
\tinitrd /boot/initrd-5.3.18-24-default
}
menuentry 'Failsafe -- SLES 15 SP2' {
\tlinux /boot/vmlinuz-5.3.18-24-default ${extra_cmdline} showopts apm=off noresume edd=off nomodeset
\tinitrd /boot/initrd-5.3.18-24-default
}
";

    struct FakeImage {
        grub_cfg: String,
        copies: RefCell<Vec<String>>,
    }

    impl FakeImage {
        fn new(grub_cfg: &str) -> Self {
            Self {
                grub_cfg: grub_cfg.to_string(),
                copies: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageInspector for FakeImage {
        fn read_text(&self, _image: &Path, in_image_path: &str) -> Result<String> {
            assert_eq!(in_image_path, "/boot/grub2/grub.cfg");
            Ok(self.grub_cfg.clone())
        }

        fn copy_out(
            &self,
            _image: &Path,
            in_image_paths: &[&str],
            output_dir: &Path,
        ) -> Result<Vec<PathBuf>> {
            in_image_paths
                .iter()
                .map(|path| -> Result<PathBuf> {
                    self.copies.borrow_mut().push(path.to_string());
                    let local = local_copy_path(output_dir, path)?;
                    fs::write(&local, b"image bytes")?;
                    Ok(local)
                })
                .collect()
        }
    }

    fn settings(temp: &TempDir, disable_meltdown_spectre: bool) -> ExtractSettings {
        let output_dir = temp.path().join("boot");
        ExtractSettings {
            image: PathBuf::from("caasp.qcow2"),
            grub_config: "/boot/grub2/grub.cfg".to_string(),
            report: temp.path().join("boot.json"),
            output_dir,
            disable_meltdown_spectre,
        }
    }

    #[test]
    fn writes_report_for_normal_entry() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp, true);
        let image = FakeImage::new(GRUB_CFG);

        let report = extract_boot_report(&image, &settings).unwrap();

        assert_eq!(
            *image.copies.borrow(),
            vec![
                "/boot/vmlinuz-5.3.18-24-default".to_string(),
                "/boot/initrd-5.3.18-24-default".to_string(),
            ]
        );
        let out_dir = fs::canonicalize(&settings.output_dir).unwrap();
        assert_eq!(
            report.kernel,
            out_dir.join("vmlinuz-5.3.18-24-default").display().to_string()
        );
        assert!(Path::new(&report.initrd).is_absolute());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&settings.report).unwrap()).unwrap();
        assert_eq!(written["args"]["_"], "nospec quiet");
        assert_eq!(written["args"]["splash"], "silent");
        assert_eq!(written["args"]["pti"], "off");
        assert_eq!(written["kernel"], report.kernel.as_str());
    }

    #[test]
    fn incomplete_config_stops_before_copy_out() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp, false);
        let image = FakeImage::new(
            "\tlinux /boot/vmlinuz-5.3.18-default root=/dev/vda2 quiet\n\
             \tinitrd /boot/initrd-5.3.18-default\n",
        );

        let err = extract_boot_report(&image, &settings).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BootError>(),
            Some(BootError::MissingBootArtifact(BootArtifact::Kernel))
        ));
        assert!(image.copies.borrow().is_empty());
        assert!(!settings.output_dir.exists());
        assert!(!settings.report.exists());
    }

    #[test]
    fn missing_initrd_is_reported() {
        let temp = TempDir::new().unwrap();
        let settings = settings(&temp, false);
        let image = FakeImage::new(
            "linux /boot/vmlinuz-5.3.18-default ${extra_cmdline} quiet\n",
        );

        let err = extract_boot_report(&image, &settings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootError>(),
            Some(BootError::MissingBootArtifact(BootArtifact::Initrd))
        ));
    }

    #[test]
    fn unwritable_report_surfaces_write_failure() {
        let temp = TempDir::new().unwrap();
        let mut settings = settings(&temp, false);
        settings.report = temp.path().join("missing").join("boot.json");
        let image = FakeImage::new(GRUB_CFG);

        let err = extract_boot_report(&image, &settings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootError>(),
            Some(BootError::WriteFailure { .. })
        ));
    }
}
