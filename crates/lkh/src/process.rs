use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use crate::{LkhError, LkhResult};

/// One LKH executable invocation.
#[derive(Clone, Debug)]
pub struct LkhProcess {
    exe_path: PathBuf,
    current_dir: Option<PathBuf>,
}

impl LkhProcess {
    pub fn new(exe_path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: exe_path.into(),
            current_dir: None,
        }
    }

    pub fn with_current_dir(mut self, current_dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(current_dir.into());
        self
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    /// Runs LKH on `par_path`. A non-zero exit is reported with both streams.
    pub fn run(&self, par_path: &Path, context: impl ToString) -> LkhResult<Output> {
        let mut command = Command::new(&self.exe_path);
        command.arg(par_path);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| LkhError::Spawn {
            exe: self.exe_path.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(LkhError::Exited {
                context: context.to_string(),
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}
