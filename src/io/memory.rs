use super::{Error, FrameSource, check_frame_index};
use crate::model::error::Error as ModelError;
use crate::model::frame::Frame;
use tracing::trace;

pub const FORMAT: &str = "memory";

/// A multi-frame source over frames already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<Frame>,
    n_atoms: usize,
    cursor: Option<usize>,
}

impl MemorySource {
    /// Wraps `frames`, renumbering them from 0.
    ///
    /// All frames must describe the same number of atoms as the first.
    pub fn new(mut frames: Vec<Frame>) -> Result<Self, Error> {
        let n_atoms = frames.first().map_or(0, Frame::n_atoms);
        for (index, frame) in frames.iter_mut().enumerate() {
            frame.check_atoms(n_atoms)?;
            frame.index = index;
        }
        Ok(Self {
            frames,
            n_atoms,
            cursor: None,
        })
    }

    /// An empty source for `n_atoms` atoms.
    pub fn empty(n_atoms: usize) -> Self {
        Self {
            frames: Vec::new(),
            n_atoms,
            cursor: None,
        }
    }

    /// Appends a frame at the end.
    pub fn push(&mut self, mut frame: Frame) -> Result<(), ModelError> {
        frame.check_atoms(self.n_atoms)?;
        frame.index = self.frames.len();
        self.frames.push(frame);
        Ok(())
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl FrameSource for MemorySource {
    fn format(&self) -> &str {
        FORMAT
    }

    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn n_frames(&self) -> Option<usize> {
        Some(self.frames.len())
    }

    fn advance(&mut self) -> Result<Option<&Frame>, Error> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.frames.len() {
            return Ok(None);
        }
        self.cursor = Some(next);
        trace!(frame = next, "memory frame advanced");
        Ok(self.frames.get(next))
    }

    fn seek(&mut self, index: usize) -> Result<&Frame, Error> {
        check_frame_index(index, self.frames.len())?;
        self.cursor = Some(index);
        Ok(&self.frames[index])
    }

    fn current(&self) -> Option<&Frame> {
        self.cursor.and_then(|c| self.frames.get(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<Frame> {
        (0..3)
            .map(|i| {
                let x = i as f32;
                Frame::new(99, vec![[x, 0.0, 0.0], [x, 1.0, 0.0]])
                    .with_velocities(vec![[0.1, 0.0, 0.0]; 2])
            })
            .collect()
    }

    #[test]
    fn advances_through_all_frames_then_stops() {
        let mut source = MemorySource::new(frames()).unwrap();
        assert_eq!(source.n_frames(), Some(3));
        assert!(source.current().is_none());

        let mut seen = Vec::new();
        while let Some(frame) = source.advance().unwrap() {
            seen.push((frame.index, frame.positions[0][0]));
        }
        assert_eq!(seen, vec![(0, 0.0), (1, 1.0), (2, 2.0)]);
        assert!(source.advance().unwrap().is_none());
        assert_eq!(source.current().unwrap().index, 2);
    }

    #[test]
    fn seek_rewinds_and_bounds() {
        let mut source = MemorySource::new(frames()).unwrap();
        let first = source.advance().unwrap().unwrap().clone();
        source.advance().unwrap();
        source.advance().unwrap();

        assert_eq!(source.seek(0).unwrap(), &first);
        assert_eq!(source.advance().unwrap().unwrap().index, 1);

        assert!(matches!(
            source.seek(3).unwrap_err(),
            Error::OutOfRange {
                index: 3,
                n_frames: 3
            }
        ));
    }

    #[test]
    fn rejects_inconsistent_atom_counts() {
        let mut frames = frames();
        frames.push(Frame::new(0, vec![[0.0; 3]]));
        let err = MemorySource::new(frames).unwrap_err();
        assert!(matches!(
            err.as_model(),
            Some(ModelError::FrameTopologyMismatch {
                field: "positions",
                expected: 2,
                found: 1
            })
        ));

        let mut source = MemorySource::empty(2);
        assert!(source.push(Frame::new(0, vec![[0.0; 3]; 3])).is_err());
        source.push(Frame::new(7, vec![[0.0; 3]; 2])).unwrap();
        assert_eq!(source.into_frames()[0].index, 0);
    }
}
