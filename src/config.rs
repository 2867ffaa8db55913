//! Run settings: optional TOML file plus command-line overrides.
//!
//! ```toml
//! grub_config = "/boot/grub2/grub.cfg"
//! output_dir = "/srv/tftpboot/caasp"
//! report = "/srv/tftpboot/caasp/boot.json"
//! disable_meltdown_spectre = true
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRUB_CONFIG: &str = "/boot/grub2/grub.cfg";
pub const DEFAULT_REPORT_NAME: &str = "boot.json";
const CONFIG_DIR_NAME: &str = "image-boot-extract";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of the config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub grub_config: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub disable_meltdown_spectre: Option<bool>,
}

/// Values given on the command line; these win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub grub_config: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
    /// Only ever switches mitigations off; `false` defers to the file.
    pub disable_meltdown_spectre: bool,
}

/// Fully resolved settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    pub image: PathBuf,
    pub grub_config: String,
    pub output_dir: PathBuf,
    pub report: PathBuf,
    pub disable_meltdown_spectre: bool,
}

impl ExtractSettings {
    pub fn from_parts(image: PathBuf, file: ConfigFile, overrides: Overrides) -> Self {
        let grub_config = overrides
            .grub_config
            .or(file.grub_config)
            .unwrap_or_else(|| DEFAULT_GRUB_CONFIG.to_string());
        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let report = overrides
            .report
            .or(file.report)
            .unwrap_or_else(|| output_dir.join(DEFAULT_REPORT_NAME));
        let disable_meltdown_spectre =
            overrides.disable_meltdown_spectre || file.disable_meltdown_spectre.unwrap_or(false);

        Self {
            image,
            grub_config,
            output_dir,
            report,
            disable_meltdown_spectre,
        }
    }
}

/// Resolve settings for `image`, reading the config file if there is one.
///
/// An explicit `--config` path must exist. Otherwise the per-user config is
/// used when present.
pub fn resolve_settings(image: PathBuf, overrides: Overrides) -> Result<ExtractSettings> {
    let file = match &overrides.config {
        Some(path) => {
            if !path.is_file() {
                bail!("config file '{}' does not exist", path.display());
            }
            load_config_file(path)?
        }
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using user config file");
                load_config_file(&path)?
            }
            None => ConfigFile::default(),
        },
    };
    Ok(ExtractSettings::from_parts(image, file, overrides))
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config '{}'", path.display()))
}

/// `<user config dir>/image-boot-extract/config.toml`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = ExtractSettings::from_parts(
            "disk.qcow2".into(),
            ConfigFile::default(),
            Overrides::default(),
        );
        assert_eq!(settings.grub_config, DEFAULT_GRUB_CONFIG);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.report, PathBuf::from("./boot.json"));
        assert!(!settings.disable_meltdown_spectre);
    }

    #[test]
    fn flags_override_file() {
        let file = ConfigFile {
            grub_config: Some("/boot/grub/grub.cfg".into()),
            output_dir: Some("/srv/file".into()),
            report: None,
            disable_meltdown_spectre: Some(false),
        };
        let overrides = Overrides {
            output_dir: Some("/srv/flag".into()),
            disable_meltdown_spectre: true,
            ..Default::default()
        };
        let settings = ExtractSettings::from_parts("disk.qcow2".into(), file, overrides);
        assert_eq!(settings.grub_config, "/boot/grub/grub.cfg");
        assert_eq!(settings.output_dir, PathBuf::from("/srv/flag"));
        assert_eq!(settings.report, PathBuf::from("/srv/flag/boot.json"));
        assert!(settings.disable_meltdown_spectre);
    }

    #[test]
    fn file_can_enable_mitigation_flag() {
        let file = ConfigFile {
            disable_meltdown_spectre: Some(true),
            ..Default::default()
        };
        let settings = ExtractSettings::from_parts("disk.qcow2".into(), file, Overrides::default());
        assert!(settings.disable_meltdown_spectre);
    }

    #[test]
    fn load_and_resolve_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "grub_config = \"/boot/grub/grub.cfg\"\nreport = \"/tmp/out.json\"\n",
        )
        .unwrap();

        let settings = resolve_settings(
            "disk.qcow2".into(),
            Overrides {
                config: Some(path),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(settings.grub_config, "/boot/grub/grub.cfg");
        assert_eq!(settings.report, PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "grub_cfg = \"/boot/grub2/grub.cfg\"\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let result = resolve_settings(
            "disk.qcow2".into(),
            Overrides {
                config: Some("/nonexistent/config.toml".into()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
