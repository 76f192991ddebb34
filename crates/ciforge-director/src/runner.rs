//! Director command wrapper: stages inputs and drives create-env/delete-env.
//!
//! A runner owns one private scratch directory holding the SSH key, the
//! rendered manifest and (when converging) the previous state file. The
//! director binary runs with that directory as its working directory, its
//! stdout and stderr interleaved into a single log file there. Success is
//! decided from the log contents: the exit status alone is not trusted.
//!
//! ```text
//! staged ──deploy──▶ deployed ──cleanup──▶ cleaned
//!    │  ──delete──▶ deleted  ──cleanup──▶ cleaned
//!    └──deploy_detached──▶ detached ──cleanup──▶ cleaned (directory kept)
//! ```

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::{DirectorError, DirectorResult};

pub const KEY_FILENAME: &str = "director.pem";
pub const MANIFEST_FILENAME: &str = "director.yml";
pub const STATE_FILENAME: &str = "director-state.json";
pub const DETACHED_LOG_FILENAME: &str = "create-env.log";

const FINISHED_MARKER: &str = "Finished deploying";
const SKIPPED_MARKER: &str = "Skipping deploy";
const GLOBAL_FLAGS: [&str; 3] = ["--non-interactive", "--tty", "--no-color"];

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Inputs written, no command run yet.
    Staged,
    /// `create-env` completed with a success marker.
    Deployed,
    /// `delete-env` completed.
    Deleted,
    /// `create-env` spawned in the background.
    Detached,
    /// Scratch directory released.
    Cleaned,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Staged => "staged",
            RunnerState::Deployed => "deployed",
            RunnerState::Deleted => "deleted",
            RunnerState::Detached => "detached",
            RunnerState::Cleaned => "cleaned",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct DirectorRunner {
    binary: PathBuf,
    /// Owned scratch directory; `None` once cleaned or handed to a detached child.
    scratch: Option<TempDir>,
    dir: PathBuf,
    state: RunnerState,
}

impl DirectorRunner {
    /// Create the scratch directory and write the key, manifest and prior state.
    ///
    /// On any failure the partially written directory is removed before the
    /// error is returned.
    pub fn stage(
        binary: impl Into<PathBuf>,
        manifest: &[u8],
        prior_state: Option<&[u8]>,
        private_key: &[u8],
    ) -> DirectorResult<Self> {
        let scratch = tempfile::Builder::new().prefix("ciforge-director").tempdir()?;
        let dir = scratch.path().to_path_buf();

        write_private(&dir.join(KEY_FILENAME), private_key)?;
        write_private(&dir.join(MANIFEST_FILENAME), manifest)?;
        if let Some(state) = prior_state {
            write_private(&dir.join(STATE_FILENAME), state)?;
        }

        debug!(
            dir = %dir.display(),
            converge = prior_state.is_some(),
            "staged director inputs"
        );

        Ok(Self {
            binary: binary.into(),
            scratch: Some(scratch),
            dir,
            state: RunnerState::Staged,
        })
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Path of the scratch directory, including after cleanup.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `create-env` to completion and return the updated state file.
    pub fn deploy(&mut self) -> DirectorResult<Vec<u8>> {
        self.require_staged("deploy")?;

        let output = self.run("create-env")?;
        if !output.contains(FINISHED_MARKER) && !output.contains(SKIPPED_MARKER) {
            return Err(DirectorError::MissingSuccessMarker { output });
        }

        let state = fs::read(self.dir.join(STATE_FILENAME))?;
        self.state = RunnerState::Deployed;
        info!(dir = %self.dir.display(), "director deployed");
        Ok(state)
    }

    /// Spawn `create-env` without waiting for it.
    ///
    /// Output goes to `create-env.log` in the scratch directory. The
    /// directory is no longer removed by [`cleanup`](Self::cleanup) since the
    /// child still uses it. Returns the child's process id.
    pub fn deploy_detached(&mut self) -> DirectorResult<u32> {
        self.require_staged("deploy")?;

        let log = File::create(self.dir.join(DETACHED_LOG_FILENAME))?;
        let mut cmd = self.command("create-env");
        cmd.stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log);

        debug!("Spawning: {:?}", cmd);
        let child = cmd.spawn().map_err(|e| self.exec_error(e))?;

        if let Some(scratch) = self.scratch.take() {
            let _ = scratch.keep();
        }
        self.state = RunnerState::Detached;
        info!(pid = child.id(), dir = %self.dir.display(), "director deploy detached");
        Ok(child.id())
    }

    /// Run `delete-env` to completion.
    pub fn delete(&mut self) -> DirectorResult<()> {
        self.require_staged("delete")?;
        self.run("delete-env")?;
        self.state = RunnerState::Deleted;
        info!(dir = %self.dir.display(), "director deleted");
        Ok(())
    }

    /// Remove the scratch directory. Safe to call from any state, any number of times.
    pub fn cleanup(&mut self) -> DirectorResult<()> {
        match self.state {
            RunnerState::Cleaned => return Ok(()),
            RunnerState::Detached => {
                warn!(
                    dir = %self.dir.display(),
                    "leaving director scratch directory for the detached deploy"
                );
            }
            _ => {
                if let Some(scratch) = self.scratch.take() {
                    scratch.close()?;
                }
                debug!(dir = %self.dir.display(), "removed director scratch directory");
            }
        }
        self.state = RunnerState::Cleaned;
        Ok(())
    }

    fn require_staged(&self, operation: &'static str) -> DirectorResult<()> {
        if self.state == RunnerState::Staged {
            Ok(())
        } else {
            Err(DirectorError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(GLOBAL_FLAGS)
            .arg(subcommand)
            .arg(self.dir.join(MANIFEST_FILENAME))
            .arg("--state")
            .arg(self.dir.join(STATE_FILENAME))
            .current_dir(&self.dir);
        cmd
    }

    /// Run a subcommand with stdout and stderr interleaved into one log file
    /// and return the combined output.
    fn run(&self, subcommand: &str) -> DirectorResult<String> {
        let log_path = self.dir.join(format!("{subcommand}.log"));
        let log = File::create(&log_path)?;

        let mut cmd = self.command(subcommand);
        cmd.stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log);

        debug!("Running: {:?}", cmd);
        let status = cmd.status().map_err(|e| self.exec_error(e))?;
        let output = String::from_utf8_lossy(&fs::read(&log_path)?).into_owned();

        if !status.success() {
            return Err(DirectorError::CommandFailed {
                command: subcommand.to_string(),
                code: status.code().unwrap_or(-1),
                output,
            });
        }
        Ok(output)
    }

    fn exec_error(&self, e: std::io::Error) -> DirectorError {
        DirectorError::Exec {
            binary: self.binary.display().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Write a file readable only by the current user.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)
}
