//! Daikon packaged as a container image and driven through the docker CLI.
//!
//! Each run starts a throwaway container with the input files bind-mounted
//! read-only under [`CONTAINER_DIR`], mines invariants into an archive inside
//! the container, and prints them with `daikon.PrintInvariants`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{InstallError, RunError};
use crate::tool::ToolRunner;
use crate::RunnerConfig;

/// Directory inside the container where inputs are mounted.
pub const CONTAINER_DIR: &str = "/tmp/.specminers";

/// Archive the mined invariants are written to inside the container.
const INVARIANTS_ARCHIVE: &str = "/tmp/mined.inv.tgz";

/// Daikon run inside a docker container.
#[derive(Debug, Clone, Default)]
pub struct DockerDaikon {
    config: RunnerConfig,
}

impl DockerDaikon {
    pub fn new(config: RunnerConfig) -> Self {
        DockerDaikon { config }
    }

    pub fn from_env() -> Self {
        DockerDaikon::new(RunnerConfig::from_env())
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn docker(&self) -> Command {
        Command::new(&self.config.docker)
    }

    /// Builds the `docker run` invocation for already validated inputs.
    pub fn run_command(&self, inputs: &[(PathBuf, String)]) -> Command {
        let mut cmd = self.docker();
        cmd.arg("run").arg("--rm");
        for (host, container) in inputs {
            cmd.arg("-v")
                .arg(format!("{}:{}:ro", host.display(), container));
        }
        cmd.arg(&self.config.image)
            .arg("/bin/sh")
            .arg("-c")
            .arg(daikon_script(inputs.iter().map(|(_, c)| c.as_str())));
        cmd
    }
}

/// Resolves inputs to absolute host paths paired with their mount point.
///
/// Fails if the list is empty, a path is not an existing file, or two files
/// share a base name (they would be mounted at the same place).
pub fn resolve_inputs(paths: &[PathBuf]) -> Result<Vec<(PathBuf, String)>, RunError> {
    if paths.is_empty() {
        return Err(RunError::NoInputs);
    }
    let cwd = std::env::current_dir()?;
    let mut names = HashSet::new();
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let host = if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        };
        if !host.is_file() {
            return Err(RunError::InputNotFound { path: host });
        }
        let name = file_name(&host)?;
        if !names.insert(name.clone()) {
            return Err(RunError::DuplicateInputName { name });
        }
        inputs.push((host, format!("{}/{}", CONTAINER_DIR, name)));
    }
    Ok(inputs)
}

fn file_name(path: &Path) -> Result<String, RunError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| RunError::InputNotFound {
            path: path.to_path_buf(),
        })
}

/// Shell script run in the container. Daikon's own chatter goes to stderr so
/// that stdout holds only the invariant report.
pub fn daikon_script<'a>(files: impl IntoIterator<Item = &'a str>) -> String {
    let files: Vec<String> = files.into_iter().map(shell_quote).collect();
    format!(
        "java daikon.Daikon --no_show_progress --no_text_output --noversion -o {archive} {files} 1>&2 \
         && java daikon.PrintInvariants {archive}",
        archive = INVARIANTS_ARCHIVE,
        files = files.join(" "),
    )
}

/// Quotes `word` for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl ToolRunner for DockerDaikon {
    fn is_installed(&self) -> bool {
        let status = self
            .docker()
            .args(["image", "inspect", "--format", "{{.Id}}"])
            .arg(&self.config.image)
            .output();
        match status {
            Ok(output) => output.status.success(),
            Err(err) => {
                tracing::warn!("could not run {}: {}", self.config.docker, err);
                false
            }
        }
    }

    fn install(&self, force: bool) -> Result<(), InstallError> {
        if !force && self.is_installed() {
            tracing::debug!("image {} already installed", self.config.image);
            return Ok(());
        }
        tracing::info!(
            "building image {} from {}",
            self.config.image,
            self.config.context.display()
        );
        let output = self
            .docker()
            .args(["build", "--pull", "-t"])
            .arg(&self.config.image)
            .arg(&self.config.context)
            .output()
            .map_err(|source| InstallError::Spawn {
                program: self.config.docker.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(InstallError::BuildFailed {
                image: self.config.image.clone(),
                code: output.status.code(),
                stderr: stderr_of(&output),
            });
        }
        tracing::debug!("built image {}", self.config.image);
        Ok(())
    }

    fn run(&self, paths: &[PathBuf]) -> Result<String, RunError> {
        let inputs = resolve_inputs(paths)?;
        if !self.is_installed() {
            return Err(RunError::NotInstalled {
                image: self.config.image.clone(),
            });
        }
        tracing::debug!(
            "running Daikon on files: {}",
            inputs
                .iter()
                .map(|(host, _)| host.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let output = self
            .run_command(&inputs)
            .output()
            .map_err(|source| RunError::Spawn {
                program: self.config.docker.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(RunError::ToolFailed {
                code: output.status.code(),
                stderr: stderr_of(&output),
            });
        }
        let report = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::trace!("daikon output:\n{}", report);
        Ok(report)
    }
}
