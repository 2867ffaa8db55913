//! Typed failures of the boot extraction pipeline.

use std::fmt;
use std::path::PathBuf;

/// Field of the bootloader configuration that a report cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootArtifact {
    Kernel,
    Initrd,
    Args,
}

impl BootArtifact {
    pub fn as_str(self) -> &'static str {
        match self {
            BootArtifact::Kernel => "kernel",
            BootArtifact::Initrd => "initrd",
            BootArtifact::Args => "args",
        }
    }
}

impl fmt::Display for BootArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// A kernel line that lacks the `${extra_cmdline}` marker also ends up
    /// here, reported as a missing kernel.
    #[error("bootloader config has no usable {0} entry")]
    MissingBootArtifact(BootArtifact),

    #[error("writing boot report '{}'", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
