//! Host command execution.
//!
//! A thin builder over [`std::process::Command`] that captures output and
//! turns non-zero exits into errors carrying the command line and stderr.
//!
//! ```rust,ignore
//! use image_boot_extract::process::Cmd;
//!
//! let result = Cmd::new("virt-cat")
//!     .args(["-a", "disk.qcow2", "/boot/grub2/grub.cfg"])
//!     .error_msg("reading grub.cfg from image failed")
//!     .run()?;
//! println!("{}", result.stdout);
//! ```

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Captured outcome of a finished command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Command builder with contextual error reporting.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    /// Message prefixed to the error when the command exits non-zero.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Return the result even on non-zero exit; the caller checks `success()`.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Printable form of the command line, for logs and errors.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }

    pub fn run(&self) -> Result<CommandResult> {
        tracing::debug!(command = %self.display(), "running host command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("executing '{}'", self.display()))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() || self.allow_fail {
            return Ok(result);
        }

        let msg = self
            .error_msg
            .clone()
            .unwrap_or_else(|| format!("{} failed", self.program));
        bail!(
            "{} (status {}): {}\n{}",
            msg,
            result.status,
            self.display(),
            result.stderr.trim()
        )
    }
}

/// Fail with a readable message when `path` does not exist.
pub fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} not found at {}", what, path.display());
    }
    Ok(())
}
