//! Boot artifact extraction from VM disk images.
//!
//! Reads the GRUB configuration inside an image, picks the normal (non
//! failsafe) boot entry, copies its kernel and initrd out, and writes a JSON
//! report that provisioning tooling uses to boot the same kernel directly:
//!
//! ```text
//! { "kernel": "/srv/boot/vmlinuz-5.3.18-24-default",
//!   "initrd": "/srv/boot/initrd-5.3.18-24-default",
//!   "args": { "_": "quiet", "console": "ttyS0" } }
//! ```
//!
//! # Architecture
//!
//! ```text
//! image (ImageInspector)
//!     │ grub.cfg text
//!     ▼
//! grub::parse_boot_config ──► ExtractedPaths (kernel, initrd, raw args)
//!     │ require_complete()        │ copy_out(kernel, initrd)
//!     ▼                           ▼
//! cmdline::NormalizedArgs    absolute local paths
//!     └──────────────┬────────────┘
//!                    ▼
//!           report::BootReport ──► boot.json
//! ```
//!
//! [`pipeline::extract_boot_report`] drives the whole sequence.

pub mod cmdline;
pub mod config;
pub mod error;
pub mod grub;
pub mod image;
pub mod logging;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod report;

pub use cmdline::NormalizedArgs;
pub use config::{ExtractSettings, Overrides};
pub use error::{BootArtifact, BootError};
pub use grub::{parse_boot_config, ExtractedPaths};
pub use image::{Guestfs, ImageInspector};
pub use pipeline::extract_boot_report;
pub use report::BootReport;
