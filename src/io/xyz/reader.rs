use super::{BlockReader, FORMAT};
use crate::io::{Error, FrameSource, check_frame_index};
use crate::model::frame::Frame;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Where a frame starts in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameOffset {
    byte: u64,
    /// Lines before the frame's count line.
    line: usize,
}

/// Random-access XYZ trajectory backed by a file.
///
/// Opening scans the file once to index where every frame starts and to
/// check that all frames agree on the atom count; frames are parsed only when
/// visited. One frame buffer is reused across reads.
#[derive(Debug)]
pub struct XyzTrajectory {
    path: PathBuf,
    reader: BufReader<File>,
    offsets: Vec<FrameOffset>,
    n_atoms: usize,
    frame: Frame,
    cursor: Option<usize>,
    /// Frame the reader is positioned at, if known.
    positioned: Option<usize>,
}

impl XyzTrajectory {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        let (offsets, n_atoms) = index_frames(&mut reader)?;
        debug!(
            path = %path.display(),
            frames = offsets.len(),
            atoms = n_atoms,
            "xyz trajectory indexed"
        );
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            offsets,
            n_atoms,
            frame: Frame::default(),
            cursor: None,
            positioned: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&mut self, index: usize) -> Result<(), Error> {
        let offset = self.offsets[index];
        if self.positioned != Some(index) {
            self.reader.seek(SeekFrom::Start(offset.byte))?;
        }
        // The cursor is unknown until the read succeeds.
        self.positioned = None;
        self.cursor = None;

        let mut blocks = BlockReader::at_line(offset.line);
        let n_atoms = blocks
            .read_count(&mut self.reader)?
            .ok_or_else(|| Error::malformed(FORMAT, offset.line + 1, "frame vanished from file"))?;
        if n_atoms != self.n_atoms {
            return Err(Error::malformed(
                FORMAT,
                offset.line + 1,
                format!("expected {} atoms, found {n_atoms}", self.n_atoms),
            ));
        }
        self.frame.reset(index);
        blocks.read_body(&mut self.reader, n_atoms, &mut self.frame, |_| {})?;

        self.positioned = Some(index + 1);
        self.cursor = Some(index);
        trace!(frame = index, "xyz frame read");
        Ok(())
    }
}

/// Scans every block, returning frame offsets and the common atom count.
fn index_frames<R: BufRead + Seek>(reader: &mut R) -> Result<(Vec<FrameOffset>, usize), Error> {
    let mut offsets = Vec::new();
    let mut blocks = BlockReader::new();
    let mut n_atoms = None;
    loop {
        let byte = reader.stream_position()?;
        let line = blocks.line_no();
        let Some(count) = blocks.read_count(reader)? else {
            break;
        };
        match n_atoms {
            None => n_atoms = Some(count),
            Some(expected) if expected != count => {
                return Err(Error::malformed(
                    FORMAT,
                    blocks.line_no(),
                    format!(
                        "frame {} has {count} atoms, frame 0 has {expected}",
                        offsets.len()
                    ),
                ));
            }
            Some(_) => {}
        }
        blocks.skip_body(reader, count)?;
        offsets.push(FrameOffset { byte, line });
    }
    reader.rewind()?;
    Ok((offsets, n_atoms.unwrap_or(0)))
}

impl FrameSource for XyzTrajectory {
    fn format(&self) -> &str {
        FORMAT
    }

    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn n_frames(&self) -> Option<usize> {
        Some(self.offsets.len())
    }

    fn advance(&mut self) -> Result<Option<&Frame>, Error> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.offsets.len() {
            return Ok(None);
        }
        self.read_frame(next)?;
        Ok(Some(&self.frame))
    }

    fn seek(&mut self, index: usize) -> Result<&Frame, Error> {
        check_frame_index(index, self.offsets.len())?;
        if self.cursor != Some(index) {
            self.read_frame(index)?;
        }
        Ok(&self.frame)
    }

    fn current(&self) -> Option<&Frame> {
        self.cursor.map(|_| &self.frame)
    }
}

/// Forward-only XYZ reader over any buffered input, such as a pipe.
///
/// The first block is read at construction to learn the atom count; its
/// frame is handed out by the first [`advance`](FrameSource::advance).
#[derive(Debug)]
pub struct XyzStream<R> {
    reader: R,
    blocks: BlockReader,
    n_atoms: usize,
    frame: Frame,
    /// Frame held in the buffer but not yet handed out.
    pending: bool,
    started: bool,
}

impl<R: BufRead + Send> XyzStream<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let mut blocks = BlockReader::new();
        let mut frame = Frame::default();
        let (n_atoms, pending) = match blocks.read_count(&mut reader)? {
            Some(n) => {
                blocks.read_body(&mut reader, n, &mut frame, |_| {})?;
                (n, true)
            }
            None => (0, false),
        };
        Ok(Self {
            reader,
            blocks,
            n_atoms,
            frame,
            pending,
            started: false,
        })
    }
}

impl<R: BufRead + Send> FrameSource for XyzStream<R> {
    fn format(&self) -> &str {
        FORMAT
    }

    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn n_frames(&self) -> Option<usize> {
        None
    }

    fn advance(&mut self) -> Result<Option<&Frame>, Error> {
        if self.pending {
            self.pending = false;
            self.started = true;
            return Ok(Some(&self.frame));
        }
        if !self.started {
            return Ok(None);
        }

        let Some(n_atoms) = self.blocks.read_count(&mut self.reader)? else {
            return Ok(None);
        };
        if n_atoms != self.n_atoms {
            return Err(Error::malformed(
                FORMAT,
                self.blocks.line_no(),
                format!("expected {} atoms, found {n_atoms}", self.n_atoms),
            ));
        }
        let index = self.frame.index + 1;
        self.frame.reset(index);
        self.blocks
            .read_body(&mut self.reader, n_atoms, &mut self.frame, |_| {})?;
        trace!(frame = index, "xyz stream advanced");
        Ok(Some(&self.frame))
    }

    fn seek(&mut self, _index: usize) -> Result<&Frame, Error> {
        Err(Error::SeekNotSupported {
            format: FORMAT.to_string(),
        })
    }

    fn current(&self) -> Option<&Frame> {
        self.started.then_some(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::xyz::tests::WATER_TWO_FRAMES;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn three_frames() -> String {
        (0..3)
            .map(|i| format!("2\nframe {i}\nC {i}.0 0.0 0.0\nO {i}.5 1.0 0.0\n"))
            .collect()
    }

    #[test]
    fn trajectory_indexes_and_advances() {
        let file = write_temp(&three_frames());
        let mut traj = XyzTrajectory::open(file.path()).unwrap();
        assert_eq!(traj.n_frames(), Some(3));
        assert_eq!(traj.n_atoms(), 2);
        assert!(traj.current().is_none());

        let mut xs = Vec::new();
        while let Some(frame) = traj.advance().unwrap() {
            xs.push((frame.index, frame.positions[0][0]));
        }
        assert_eq!(xs, vec![(0, 0.0), (1, 1.0), (2, 2.0)]);
        assert_eq!(traj.current().unwrap().index, 2);
    }

    #[test]
    fn trajectory_seeks_randomly() {
        let file = write_temp(&three_frames());
        let mut traj = XyzTrajectory::open(file.path()).unwrap();

        assert_eq!(traj.seek(2).unwrap().positions[1], [2.5, 1.0, 0.0]);
        assert_eq!(traj.seek(0).unwrap().index, 0);
        assert_eq!(traj.advance().unwrap().unwrap().index, 1);
        let again = traj.seek(1).unwrap().clone();
        assert_eq!(again.positions[0], [1.0, 0.0, 0.0]);

        assert!(matches!(
            traj.seek(3).unwrap_err(),
            Error::OutOfRange {
                index: 3,
                n_frames: 3
            }
        ));
        assert_eq!(traj.current().unwrap().index, 1);
    }

    #[test]
    fn trajectory_keeps_unit_cells_per_frame() {
        let file = write_temp(WATER_TWO_FRAMES);
        let mut traj = XyzTrajectory::open(file.path()).unwrap();
        let first = traj.advance().unwrap().unwrap();
        assert_eq!(first.unit_cell.unwrap().lengths(), [10.0, 12.0, 14.0]);
        let second = traj.advance().unwrap().unwrap();
        assert!(second.unit_cell.is_none());
    }

    #[test]
    fn trajectory_rejects_changing_atom_counts() {
        let file = write_temp("1\n\nC 0 0 0\n2\n\nC 0 0 0\nO 1 0 0\n");
        let err = XyzTrajectory::open(file.path()).unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 4, .. }));
    }

    #[test]
    fn trajectory_rejects_truncated_file() {
        let file = write_temp("2\ncomment\nC 0 0 0\n");
        assert!(matches!(
            XyzTrajectory::open(file.path()),
            Err(Error::Malformed { line: 4, .. })
        ));
    }

    #[test]
    fn empty_trajectory_has_no_frames() {
        let file = write_temp("");
        let mut traj = XyzTrajectory::open(file.path()).unwrap();
        assert_eq!(traj.n_frames(), Some(0));
        assert!(traj.advance().unwrap().is_none());
        assert!(traj.seek(0).is_err());
    }

    #[test]
    fn stream_is_forward_only() {
        let mut stream = XyzStream::new(Cursor::new(three_frames())).unwrap();
        assert_eq!(stream.n_frames(), None);
        assert_eq!(stream.n_atoms(), 2);
        assert!(stream.current().is_none());

        assert_eq!(stream.advance().unwrap().unwrap().index, 0);
        assert_eq!(stream.advance().unwrap().unwrap().positions[0], [1.0, 0.0, 0.0]);
        assert_eq!(stream.advance().unwrap().unwrap().index, 2);
        assert!(stream.advance().unwrap().is_none());
        assert_eq!(stream.current().unwrap().index, 2);

        assert!(matches!(
            stream.seek(0).unwrap_err(),
            Error::SeekNotSupported { .. }
        ));
    }

    #[test]
    fn stream_matches_trajectory() {
        let file = write_temp(WATER_TWO_FRAMES);
        let mut traj = XyzTrajectory::open(file.path()).unwrap();
        let mut stream = XyzStream::new(Cursor::new(WATER_TWO_FRAMES)).unwrap();
        for _ in 0..2 {
            let a = traj.advance().unwrap().unwrap().clone();
            let b = stream.advance().unwrap().unwrap();
            assert_eq!(&a, b);
        }
    }

    #[test]
    fn stream_reports_atom_count_changes() {
        let input = "1\n\nC 0 0 0\n2\n\nC 0 0 0\nO 1 0 0\n";
        let mut stream = XyzStream::new(Cursor::new(input)).unwrap();
        stream.advance().unwrap();
        assert!(matches!(
            stream.advance().unwrap_err(),
            Error::Malformed { line: 4, .. }
        ));
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let mut stream = XyzStream::new(Cursor::new("")).unwrap();
        assert_eq!(stream.n_atoms(), 0);
        assert!(stream.advance().unwrap().is_none());
        assert!(stream.current().is_none());
    }
}
