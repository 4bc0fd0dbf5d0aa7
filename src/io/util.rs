use super::error::Error;
use crate::model::attribute::Level;
use crate::model::error::Error as ModelError;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::{ResidueGrouping, TopologyBuilder};
use std::io::BufRead;

/// Segment identifier given to the single segment built by the text parsers.
pub const DEFAULT_SEGID: &str = "SYSTEM";

/// Reads every line with its 1-based number, stripping `\n` and `\r\n`.
pub fn collect_lines(reader: &mut dyn BufRead) -> Result<Vec<(usize, String)>, Error> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut line_no = 0;
    while read_trimmed_line(reader, &mut buf)? {
        line_no += 1;
        lines.push((line_no, std::mem::take(&mut buf)));
    }
    Ok(lines)
}

/// Reads one line into `buf` without its terminator.
///
/// Returns `false` at end of input. `buf` is cleared first.
pub fn read_trimmed_line<R: BufRead + ?Sized>(
    reader: &mut R,
    buf: &mut String,
) -> Result<bool, Error> {
    buf.clear();
    if reader.read_line(buf)? == 0 {
        return Ok(false);
    }
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(true)
}

/// Parses one coordinate component at single precision.
pub fn parse_coordinate(
    token: &str,
    format: &str,
    line: usize,
    field: usize,
    axis: &str,
) -> Result<f32, Error> {
    token.trim().parse::<f32>().map_err(|_| {
        Error::malformed_field(
            format,
            line,
            field,
            format!("invalid {axis} coordinate '{}'", token.trim()),
        )
    })
}

/// Groups residues and adds sequential `resids` and a constant `segids`
/// column when they are registered.
pub(crate) fn add_default_hierarchy(
    builder: TopologyBuilder,
    grouping: &ResidueGrouping,
    registry: &AttributeRegistry,
) -> Result<TopologyBuilder, ModelError> {
    let mut builder = builder.group_residues(grouping)?;
    let counts = builder.counts();

    if let Ok(spec) = registry.lookup("resids")
        && spec.level == Level::Residue
    {
        let resids: Vec<i64> = (1..=counts.residues as i64).collect();
        builder = builder.attribute(spec.clone(), resids);
    }
    if let Ok(spec) = registry.lookup("segids")
        && spec.level == Level::Segment
    {
        builder = builder.attribute(spec.clone(), vec![DEFAULT_SEGID.to_string(); counts.segments]);
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn collect_lines_strips_crlf_and_numbers_lines() {
        let mut reader = Cursor::new("a,b\r\nc,d\n\ne");
        let lines = collect_lines(&mut reader).unwrap();
        assert_eq!(
            lines,
            vec![
                (1, "a,b".to_string()),
                (2, "c,d".to_string()),
                (3, String::new()),
                (4, "e".to_string()),
            ]
        );
    }

    #[test]
    fn empty_input_has_no_lines() {
        let mut reader = Cursor::new("");
        assert!(collect_lines(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn coordinates_parse_at_single_precision() {
        assert_eq!(parse_coordinate(" 43.559998", "csv", 1, 4, "y").unwrap(), 43.559998_f32);
        let err = parse_coordinate("4x", "csv", 2, 3, "x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed csv input at line 2, field 3: invalid x coordinate '4x'"
        );
    }
}
