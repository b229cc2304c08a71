//! Invariant mining with Daikon.
//!
//! This crate drives the external Daikon miner and feeds its output back
//! through the `specminers-core` invariant reader.
//!
//! # Modules
//!
//! - [`error`] -- Error types for installing, running and mining
//! - [`tool`] -- The [`ToolRunner`] capability
//! - [`docker`] -- Daikon packaged as a container image
//! - [`pipeline`] -- Run the tool and parse its report

pub mod docker;
pub mod error;
pub mod pipeline;
pub mod tool;

pub use docker::DockerDaikon;
pub use error::{InstallError, MineError, RunError};
pub use pipeline::mine;
pub use tool::ToolRunner;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default tag of the Daikon image.
pub const DEFAULT_IMAGE: &str = "specminers/daikon";

/// Build context shipped with this crate.
pub const BUNDLED_CONTEXT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/docker");

/// Where and how to find the container tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Image tag providing Daikon.
    pub image: String,

    /// Container CLI executable.
    pub docker: String,

    /// Directory holding the Dockerfile the image is built from.
    pub context: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            image: DEFAULT_IMAGE.to_string(),
            docker: "docker".to_string(),
            context: PathBuf::from(BUNDLED_CONTEXT),
        }
    }
}

impl RunnerConfig {
    /// Reads configuration from environment variables:
    /// - `SPECMINERS_DAIKON_IMAGE`: image tag (default: "specminers/daikon")
    /// - `SPECMINERS_DOCKER`: container CLI (default: "docker")
    /// - `SPECMINERS_DOCKER_CONTEXT`: build context (default: bundled Dockerfile)
    pub fn from_env() -> Self {
        let defaults = RunnerConfig::default();
        let image = std::env::var("SPECMINERS_DAIKON_IMAGE").unwrap_or(defaults.image);
        let docker = std::env::var("SPECMINERS_DOCKER").unwrap_or(defaults.docker);
        let context = std::env::var("SPECMINERS_DOCKER_CONTEXT")
            .map(PathBuf::from)
            .unwrap_or(defaults.context);
        RunnerConfig {
            image,
            docker,
            context,
        }
    }
}
