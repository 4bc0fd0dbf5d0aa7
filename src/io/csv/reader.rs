use super::{CsvLayout, FORMAT};
use crate::io::{Error, FrameSource, check_frame_index, util};
use crate::model::frame::Frame;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// The single frame of coordinates stored in a CSV input.
#[derive(Debug, Clone)]
pub struct CsvCoordinates {
    frame: Frame,
}

impl CsvCoordinates {
    /// Reads x, y and z from every row, in row order.
    pub fn from_reader(reader: &mut dyn BufRead, layout: &CsvLayout) -> Result<Self, Error> {
        let [fx, fy, fz] = layout.coordinate_fields()?;
        let lines = util::collect_lines(reader)?;

        let mut positions = Vec::with_capacity(lines.len());
        for (line_no, line) in &lines {
            let fields = layout.split(line, *line_no)?;
            positions.push([
                util::parse_coordinate(fields[fx], FORMAT, *line_no, fx + 1, "x")?,
                util::parse_coordinate(fields[fy], FORMAT, *line_no, fy + 1, "y")?,
                util::parse_coordinate(fields[fz], FORMAT, *line_no, fz + 1, "z")?,
            ]);
        }

        debug!(format = FORMAT, atoms = positions.len(), "coordinates read");
        Ok(Self {
            frame: Frame::new(0, positions),
        })
    }

    pub fn open(path: &Path, layout: &CsvLayout) -> Result<Self, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader(&mut reader, layout)
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl FrameSource for CsvCoordinates {
    fn format(&self) -> &str {
        FORMAT
    }

    fn n_atoms(&self) -> usize {
        self.frame.n_atoms()
    }

    fn n_frames(&self) -> Option<usize> {
        Some(1)
    }

    fn advance(&mut self) -> Result<Option<&Frame>, Error> {
        Ok(None)
    }

    fn seek(&mut self, index: usize) -> Result<&Frame, Error> {
        check_frame_index(index, 1)?;
        Ok(&self.frame)
    }

    fn current(&self) -> Option<&Frame> {
        Some(&self.frame)
    }
}
