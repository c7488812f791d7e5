use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{info, warn};
use utilities::paths::expand_home;

use crate::error::{InvocationError, TicError};

pub const BINARY_NAME: &str = "ticcmd";

pub trait CommandRunner: Send {
    fn run(&self, args: &[&str]) -> Result<Vec<u8>, InvocationError>;
}

pub struct ProcessRunner {
    bin: Option<PathBuf>,
    debug: bool,
}

impl ProcessRunner {
    /// Resolves the controller binary once.
    ///
    /// A `~/` prefix is expanded against the home directory, and failing to
    /// find the home directory is fatal. An empty path falls back to a PATH
    /// lookup; if that fails the runner is still built and every invocation
    /// reports [`InvocationError::MissingBinary`].
    pub fn new(bin: &str) -> Result<Self, TicError> {
        let bin = if bin.is_empty() {
            match which::which(BINARY_NAME) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "{BINARY_NAME} not found in PATH");
                    None
                }
            }
        } else {
            Some(expand_home(bin)?)
        };

        Ok(Self { bin, debug: false })
    }

    pub fn bin(&self) -> Option<&Path> {
        self.bin.as_deref()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[&str]) -> Result<Vec<u8>, InvocationError> {
        let bin = self.bin.as_ref().ok_or(InvocationError::MissingBinary)?;

        if self.debug {
            info!(bin = %bin.display(), ?args, "running");
        }

        let output = Command::new(bin)
            .args(args)
            .output()
            .map_err(|source| InvocationError::Spawn {
                bin: bin.clone(),
                source,
            })?;

        if self.debug {
            info!("{}", String::from_utf8_lossy(&output.stdout));
        }

        if !output.status.success() {
            return Err(InvocationError::Exit {
                code: output.status.code(),
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output.stdout)
    }
}
