use std::{io, path::PathBuf, time::Duration};

use utilities::paths::HomeDirError;

use crate::status::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("ticcmd binary not found")]
    MissingBinary,

    #[error("failed to run {}: {source}", .bin.display())]
    Spawn { bin: PathBuf, source: io::Error },

    #[error("{}", exit_message(.output, .code, .stderr))]
    Exit {
        code: Option<i32>,
        output: String,
        stderr: String,
    },

    #[error("{0}")]
    Simulated(String),
}

fn exit_message(output: &str, code: &Option<i32>, stderr: &str) -> String {
    let mut status = match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };

    if !stderr.trim().is_empty() {
        status = format!("{status}: {}", stderr.trim());
    }

    match output.trim() {
        "" => status,
        output => format!("{output} ({status})"),
    }
}

impl InvocationError {
    pub fn output(&self) -> &str {
        match self {
            InvocationError::Exit { output, .. } => output,
            _ => "",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TicError {
    #[error("error {action}: {source}")]
    Command {
        action: &'static str,
        source: InvocationError,
    },

    #[error("error parsing status: {0}")]
    Parse(#[from] ParseError),

    #[error("motor not energized")]
    NotEnergized,

    #[error("wait time expired before reaching position {target} ({timeout:?})")]
    Timeout { target: i32, timeout: Duration },

    #[error("error looking up home dir: {0}")]
    HomeDirectory(#[from] HomeDirError),
}

impl TicError {
    pub(crate) fn command(action: &'static str) -> impl FnOnce(InvocationError) -> TicError {
        move |source| TicError::Command { action, source }
    }
}
