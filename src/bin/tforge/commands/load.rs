use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use traj_forge::io::xyz::{self, XyzStream};
use traj_forge::{AttributeRegistry, FormatRegistry, FrameSource, IngestConfig, Topology};

use crate::cli::InputOptions;
use crate::io::{buffered_stdin, stdin_is_tty};

/// Everything a command needs before it can read frames.
pub struct Session {
    pub attributes: AttributeRegistry,
    pub formats: FormatRegistry,
}

impl Session {
    pub fn from_config(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => IngestConfig::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => IngestConfig::default(),
        };
        let attributes = config
            .attribute_registry()
            .context("Failed to register configured attributes")?;
        let formats = FormatRegistry::with_config(&config);
        Ok(Self {
            attributes,
            formats,
        })
    }

    /// Parses the topology; returns it with the format tag that was used.
    pub fn read_topology(&self, input: &InputOptions) -> Result<(Topology, String)> {
        let path = &input.topology;
        let tag = match &input.topology_format {
            Some(tag) => tag.clone(),
            None => self.formats.format_for_path(path)?.to_string(),
        };
        debug!(format = %tag, path = %path.display(), "reading topology");

        let topology = self
            .formats
            .parser(&tag)?
            .parse_path(path, &self.attributes)
            .with_context(|| format!("Failed to read topology '{}'", path.display()))?;
        Ok((topology, tag))
    }

    /// Opens the coordinate source; returns it with a label for display.
    pub fn open_frames(&self, input: &InputOptions) -> Result<(Box<dyn FrameSource>, String)> {
        if input.reads_stdin() {
            return open_stdin(input.trajectory_format.as_deref());
        }

        let path = input.trajectory.as_deref().unwrap_or(&input.topology);
        let tag = match &input.trajectory_format {
            Some(tag) => tag.clone(),
            None => self.formats.format_for_path(path)?.to_string(),
        };
        debug!(format = %tag, path = %path.display(), "opening frames");

        let source = self
            .formats
            .source(&tag, path)
            .with_context(|| format!("Failed to open trajectory '{}'", path.display()))?;
        Ok((source, file_label(path)))
    }
}

fn open_stdin(format: Option<&str>) -> Result<(Box<dyn FrameSource>, String)> {
    if let Some(tag) = format
        && tag != xyz::FORMAT
    {
        bail!("Only {} trajectories can be read from stdin, not '{tag}'", xyz::FORMAT);
    }
    if stdin_is_tty() {
        bail!(
            "Refusing to read a trajectory from a terminal on stdin.\n\n\
             Usage: tforge <COMMAND> <TOPOLOGY> -t - < trajectory.xyz"
        );
    }

    let stream: Box<dyn FrameSource> = Box::new(
        XyzStream::new(buffered_stdin()).context("Failed to read trajectory from stdin")?,
    );
    Ok((stream, "stdin".to_string()))
}

pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
