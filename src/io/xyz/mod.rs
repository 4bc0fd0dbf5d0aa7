//! XYZ and extended XYZ.
//!
//! A file is a sequence of blocks, one per frame:
//!
//! ```text
//! 3
//! Lattice="10 0 0 0 10 0 0 0 10" water
//! O  0.000  0.000  0.000
//! H  0.757  0.586  0.000
//! H -0.757  0.586  0.000
//! ```
//!
//! The first line holds the atom count and the second a free comment. In
//! extended XYZ the comment carries `key=value` pairs; only `Lattice` is read,
//! giving the unit cell. Columns after `x y z` are ignored. Every block must
//! hold the same number of atoms.

mod parser;
mod reader;

pub use parser::{UnknownElements, XyzParser};
pub use reader::{XyzStream, XyzTrajectory};

use super::{Error, util};
use crate::model::frame::{Frame, UnitCell};
use std::io::BufRead;

pub const FORMAT: &str = "xyz";

/// Block-level reader shared by the parser and both frame sources.
///
/// Tracks the current line number so errors point into the file.
#[derive(Debug, Default)]
pub(crate) struct BlockReader {
    line_no: usize,
    buf: String,
}

impl BlockReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Continues numbering from `line_no`, the number of lines already consumed.
    pub(crate) fn at_line(line_no: usize) -> Self {
        Self {
            line_no,
            buf: String::new(),
        }
    }

    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    fn next_line<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> Result<bool, Error> {
        let more = util::read_trimmed_line(reader, &mut self.buf)?;
        if more {
            self.line_no += 1;
        }
        Ok(more)
    }

    /// Reads the atom count line of the next block.
    ///
    /// Returns `None` at end of input. Trailing blank lines are accepted; a
    /// blank line followed by more data is not.
    pub(crate) fn read_count<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<usize>, Error> {
        let mut blank_at = None;
        loop {
            if !self.next_line(reader)? {
                return Ok(None);
            }
            let text = self.buf.trim();
            if text.is_empty() {
                blank_at.get_or_insert(self.line_no);
                continue;
            }
            if let Some(line) = blank_at {
                return Err(Error::malformed(FORMAT, line, "blank line between frames"));
            }
            return text.parse::<usize>().map(Some).map_err(|_| {
                Error::malformed(FORMAT, self.line_no, format!("invalid atom count '{text}'"))
            });
        }
    }

    fn require_line<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        what: &str,
    ) -> Result<(), Error> {
        if !self.next_line(reader)? {
            return Err(Error::malformed(
                FORMAT,
                self.line_no + 1,
                format!("unexpected end of input, expected {what}"),
            ));
        }
        Ok(())
    }

    /// Reads the comment line and `n_atoms` atom rows into `frame`.
    ///
    /// `frame.positions` must be empty. `on_symbol` sees the first token of
    /// each row.
    pub(crate) fn read_body<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        n_atoms: usize,
        frame: &mut Frame,
        mut on_symbol: impl FnMut(&str),
    ) -> Result<(), Error> {
        self.require_line(reader, "comment line")?;
        frame.unit_cell = parse_lattice(&self.buf, self.line_no)?;

        frame.positions.reserve(n_atoms);
        for _ in 0..n_atoms {
            self.require_line(reader, "atom row")?;
            let line_no = self.line_no;
            let mut tokens = self.buf.split_whitespace();
            let symbol = tokens
                .next()
                .ok_or_else(|| Error::malformed(FORMAT, line_no, "blank atom row"))?;
            let mut coord = [0.0f32; 3];
            for (axis, (slot, label)) in coord.iter_mut().zip(["x", "y", "z"]).enumerate() {
                let token = tokens.next().ok_or_else(|| {
                    let details = format!("missing {label} coordinate");
                    Error::malformed_field(FORMAT, line_no, axis + 2, details)
                })?;
                *slot = util::parse_coordinate(token, FORMAT, line_no, axis + 2, label)?;
            }
            on_symbol(symbol);
            frame.positions.push(coord);
        }
        Ok(())
    }

    /// Skips the comment line and `n_atoms` rows without parsing them.
    pub(crate) fn skip_body<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        n_atoms: usize,
    ) -> Result<(), Error> {
        self.require_line(reader, "comment line")?;
        for _ in 0..n_atoms {
            self.require_line(reader, "atom row")?;
        }
        Ok(())
    }
}

/// Reads `Lattice="ax ay az bx by bz cx cy cz"` from an extended XYZ comment.
pub(crate) fn parse_lattice(comment: &str, line: usize) -> Result<Option<UnitCell>, Error> {
    const KEY: &str = "Lattice=\"";
    let Some(start) = comment.find(KEY) else {
        return Ok(None);
    };
    let rest = &comment[start + KEY.len()..];
    let end = rest
        .find('"')
        .ok_or_else(|| Error::malformed(FORMAT, line, "unterminated Lattice value"))?;

    let values = rest[..end]
        .split_whitespace()
        .map(|t| t.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::malformed(FORMAT, line, "non-numeric Lattice value"))?;
    let [ax, ay, az, bx, by, bz, cx, cy, cz] = values[..] else {
        return Err(Error::malformed(
            FORMAT,
            line,
            format!("Lattice needs 9 numbers, found {}", values.len()),
        ));
    };
    Ok(Some(UnitCell::from_vectors([
        [ax, ay, az],
        [bx, by, bz],
        [cx, cy, cz],
    ])))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) const WATER_TWO_FRAMES: &str = "3
Lattice=\"10 0 0 0 12 0 0 0 14\" Properties=species:S:1:pos:R:3
O  0.000  0.000  0.000
H  0.757  0.586  0.000
H -0.757  0.586  0.000
3
second
O  0.100  0.000  0.000
H  0.857  0.586  0.000
H -0.657  0.586  0.000
";

    #[test]
    fn reads_blocks_in_order() {
        let mut reader = Cursor::new(WATER_TWO_FRAMES);
        let mut blocks = BlockReader::new();
        let mut symbols = Vec::new();

        let n = blocks.read_count(&mut reader).unwrap().unwrap();
        assert_eq!(n, 3);
        let mut frame = Frame::default();
        blocks
            .read_body(&mut reader, n, &mut frame, |s| symbols.push(s.to_string()))
            .unwrap();
        assert_eq!(symbols, vec!["O", "H", "H"]);
        assert_eq!(frame.positions[1], [0.757, 0.586, 0.0]);
        assert_eq!(frame.unit_cell.unwrap().lengths(), [10.0, 12.0, 14.0]);
        assert_eq!(blocks.line_no(), 5);

        let n = blocks.read_count(&mut reader).unwrap().unwrap();
        blocks.skip_body(&mut reader, n).unwrap();
        assert_eq!(blocks.line_no(), 10);
        assert!(blocks.read_count(&mut reader).unwrap().is_none());
    }

    #[test]
    fn trailing_blank_lines_are_ignored_but_gaps_are_not() {
        let mut blocks = BlockReader::new();
        assert!(blocks.read_count(&mut Cursor::new("\n\n  \n")).unwrap().is_none());

        let mut blocks = BlockReader::new();
        let err = blocks.read_count(&mut Cursor::new("\n3\n")).unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 1, .. }));
    }

    #[test]
    fn malformed_blocks_report_positions() {
        let mut blocks = BlockReader::new();
        let err = blocks.read_count(&mut Cursor::new("three\n")).unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 1, .. }));

        let mut reader = Cursor::new("2\ncomment\nC 0 0 0\n");
        let mut blocks = BlockReader::new();
        let n = blocks.read_count(&mut reader).unwrap().unwrap();
        let err = blocks
            .read_body(&mut reader, n, &mut Frame::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 4, .. }));

        let mut reader = Cursor::new("1\n\nC 0 zero 0\n");
        let mut blocks = BlockReader::new();
        let n = blocks.read_count(&mut reader).unwrap().unwrap();
        let err = blocks
            .read_body(&mut reader, n, &mut Frame::default(), |_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed {
                line: 3,
                field: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn lattice_parsing() {
        assert_eq!(parse_lattice("plain comment", 2).unwrap(), None);

        let cell = parse_lattice("Lattice=\"4 0 0 0 5 0 0 0 6\" pbc=\"T T T\"", 2)
            .unwrap()
            .unwrap();
        assert_eq!(cell.dimensions, [4.0, 5.0, 6.0, 90.0, 90.0, 90.0]);

        assert!(parse_lattice("Lattice=\"1 2 3\"", 2).is_err());
        assert!(parse_lattice("Lattice=\"1 0 0 0 1 0 0 0 1", 2).is_err());
        assert!(parse_lattice("Lattice=\"a 0 0 0 1 0 0 0 1\"", 2).is_err());
    }
}
