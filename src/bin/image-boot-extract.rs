use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image_boot_extract::config::{resolve_settings, Overrides};
use image_boot_extract::logging::{init_tracing, DEFAULT_LOG_DIRECTIVE};
use image_boot_extract::{extract_boot_report, preflight, Guestfs};

/// Extract kernel, initrd and boot arguments from a VM disk image
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Disk image to inspect (any format libguestfs understands)
    image: PathBuf,
    /// TOML config file; defaults to the per-user config when present
    #[clap(long, env = "IMAGE_BOOT_EXTRACT_CONFIG")]
    config: Option<PathBuf>,
    /// Bootloader config path inside the image
    #[clap(long)]
    grub_config: Option<String>,
    /// Directory receiving the kernel and initrd
    #[clap(long)]
    output_dir: Option<PathBuf>,
    /// Report destination; defaults to boot.json in the output directory
    #[clap(long)]
    report: Option<PathBuf>,
    /// Add nospec, spectre_v2=off and pti=off to the boot arguments
    #[clap(long)]
    disable_meltdown_spectre: bool,
    /// Do not check for libguestfs tools before starting
    #[clap(long)]
    skip_preflight: bool,
}

fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_DIRECTIVE);

    let cli = Cli::parse();
    let overrides = Overrides {
        config: cli.config,
        grub_config: cli.grub_config,
        output_dir: cli.output_dir,
        report: cli.report,
        disable_meltdown_spectre: cli.disable_meltdown_spectre,
    };
    let settings = resolve_settings(cli.image, overrides)?;

    if !cli.skip_preflight {
        preflight::check_host_tools()?;
    }

    let report = extract_boot_report(&Guestfs, &settings)
        .with_context(|| format!("extracting boot artifacts from '{}'", settings.image.display()))?;
    print!("{}", report.to_json()?);
    Ok(())
}
