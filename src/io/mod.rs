//! Format plug-ins: topology parsers and frame sources.
//!
//! A [`TopologyParser`] turns raw input into a [`Topology`]; a [`FrameSource`]
//! yields [`Frame`]s of coordinates for the same atoms. Both are selected at
//! run time through a [`FormatRegistry`], keyed by a format tag and file
//! extensions.
//!
//! Built-in formats:
//!
//! - [`csv`] – one atom per delimited line; topology and a single frame.
//! - [`xyz`] – XYZ / extended XYZ; topology and multi-frame trajectories.
//! - [`memory`] – frames held in memory.
//!
//! Sources are stateful and not safe for concurrent use; they may move between
//! threads (`Send`) but each call must be serialised by the caller.

use crate::model::frame::Frame;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::Topology;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub mod csv;
pub mod error;
pub mod memory;
pub mod registry;
pub mod util;
pub mod xyz;

pub use error::Error;
pub use registry::FormatRegistry;

/// Builds a [`Topology`] from one format's raw input.
pub trait TopologyParser: Send {
    /// Format tag, used in error messages.
    fn format(&self) -> &str;

    /// Parses a whole input.
    ///
    /// Only attributes registered in `registry` are produced. The result must
    /// be identical for identical input.
    fn parse(&self, reader: &mut dyn BufRead, registry: &AttributeRegistry)
    -> Result<Topology, Error>;

    fn parse_path(&self, path: &Path, registry: &AttributeRegistry) -> Result<Topology, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        self.parse(&mut reader, registry)
    }
}

/// Yields coordinate frames addressed by frame index.
///
/// Multi-frame sources start before the first frame: the first
/// [`advance`](Self::advance) yields frame 0, and after [`seek`](Self::seek)`(i)`
/// the next advance yields frame `i + 1`. Single-frame sources hold their one
/// frame from construction and `advance` always reports the end.
pub trait FrameSource: Send {
    fn format(&self) -> &str;

    fn n_atoms(&self) -> usize;

    /// Number of frames, or `None` for streams of unknown length.
    fn n_frames(&self) -> Option<usize>;

    /// Moves to the next frame; `Ok(None)` once the source is exhausted.
    fn advance(&mut self) -> Result<Option<&Frame>, Error>;

    /// Moves to frame `index`.
    ///
    /// Fails with [`Error::OutOfRange`] past the last known frame and with
    /// [`Error::SeekNotSupported`] for forward-only sources.
    fn seek(&mut self, index: usize) -> Result<&Frame, Error>;

    /// The frame most recently produced, if any.
    fn current(&self) -> Option<&Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn format(&self) -> &str {
        (**self).format()
    }

    fn n_atoms(&self) -> usize {
        (**self).n_atoms()
    }

    fn n_frames(&self) -> Option<usize> {
        (**self).n_frames()
    }

    fn advance(&mut self) -> Result<Option<&Frame>, Error> {
        (**self).advance()
    }

    fn seek(&mut self, index: usize) -> Result<&Frame, Error> {
        (**self).seek(index)
    }

    fn current(&self) -> Option<&Frame> {
        (**self).current()
    }
}

/// Bounds check shared by sources that know their length.
pub(crate) fn check_frame_index(index: usize, n_frames: usize) -> Result<(), Error> {
    if index >= n_frames {
        return Err(Error::OutOfRange { index, n_frames });
    }
    Ok(())
}
