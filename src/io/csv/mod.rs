//! Delimited text, one atom per line.
//!
//! Fields follow a fixed [`CsvLayout`]; there is no header row and `\r\n`
//! line endings are accepted. The default layout is `name, _, x, y, z`
//! separated by commas, with the second field ignored:
//!
//! ```text
//! N,Red,52.02,43.559998,31.55
//! CA,Blue,51.54,44.14,30.13
//! ```
//!
//! Reading that second field as `colors` takes a layout naming it and a
//! registry that declares it.
//!
//! Blank lines and rows with the wrong number of fields are errors, never
//! skipped: a dropped row would shift every column built from the same pass.

mod parser;
mod reader;

pub use parser::CsvParser;
pub use reader::CsvCoordinates;

use super::Error;
use serde::Deserialize;

pub const FORMAT: &str = "csv";

/// What one field of a row holds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Column {
    /// Value of the named atom-level attribute.
    Attribute(String),
    X,
    Y,
    Z,
    /// Ignored field.
    Skip,
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        match name.as_str() {
            "x" => Column::X,
            "y" => Column::Y,
            "z" => Column::Z,
            "_" | "-" => Column::Skip,
            _ => Column::Attribute(name),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::from(name.to_string())
    }
}

/// Field order and delimiter of a CSV input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvLayout {
    pub delimiter: char,
    pub columns: Vec<Column>,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            delimiter: ',',
            columns: ["names", "_", "x", "y", "z"]
                .into_iter()
                .map(Column::from)
                .collect(),
        }
    }
}

impl CsvLayout {
    pub fn new(delimiter: char, columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            delimiter,
            columns: columns.into_iter().collect(),
        }
    }

    /// `(field index, attribute name)` for every attribute column.
    pub fn attribute_fields(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                Column::Attribute(name) => Some((i, name.as_str())),
                _ => None,
            })
    }

    /// Field indices of the x, y and z columns.
    pub fn coordinate_fields(&self) -> Result<[usize; 3], Error> {
        let find = |wanted: Column| {
            let mut hits = self.columns.iter().enumerate().filter(|(_, c)| **c == wanted);
            match (hits.next(), hits.next()) {
                (Some((i, _)), None) => Ok(i),
                (None, _) => Err(Error::InvalidLayout(format!("no {wanted:?} column"))),
                (Some(_), Some(_)) => Err(Error::InvalidLayout(format!(
                    "more than one {wanted:?} column"
                ))),
            }
        };
        Ok([find(Column::X)?, find(Column::Y)?, find(Column::Z)?])
    }

    /// Checks that no attribute appears twice and coordinates are complete.
    pub fn validate(&self) -> Result<(), Error> {
        if self.columns.is_empty() {
            return Err(Error::InvalidLayout("layout has no columns".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for (_, name) in self.attribute_fields() {
            if !seen.insert(name) {
                return Err(Error::InvalidLayout(format!(
                    "attribute '{name}' mapped to more than one column"
                )));
            }
        }
        self.coordinate_fields().map(|_| ())
    }

    /// Splits a row into exactly as many fields as the layout has columns.
    pub(crate) fn split<'a>(&self, line: &'a str, line_no: usize) -> Result<Vec<&'a str>, Error> {
        if line.trim().is_empty() {
            return Err(Error::malformed(FORMAT, line_no, "blank line"));
        }
        let fields: Vec<&str> = line.split(self.delimiter).collect();
        if fields.len() != self.columns.len() {
            return Err(Error::malformed(
                FORMAT,
                line_no,
                format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    fields.len()
                ),
            ));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_reads_names_and_coordinates() {
        let layout = CsvLayout::default();
        assert_eq!(layout.delimiter, ',');
        assert_eq!(layout.attribute_fields().collect::<Vec<_>>(), vec![(0, "names")]);
        assert_eq!(layout.columns[1], Column::Skip);
        assert_eq!(layout.coordinate_fields().unwrap(), [2, 3, 4]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn column_names_map_to_roles() {
        assert_eq!(Column::from("x"), Column::X);
        assert_eq!(Column::from("_"), Column::Skip);
        assert_eq!(Column::from("masses"), Column::Attribute("masses".into()));
    }

    #[test]
    fn validate_rejects_incomplete_or_duplicated_layouts() {
        let missing_z = CsvLayout::new(',', ["names", "x", "y"].map(Column::from));
        assert!(matches!(missing_z.validate(), Err(Error::InvalidLayout(_))));

        let twice = CsvLayout::new(',', ["names", "names", "x", "y", "z"].map(Column::from));
        assert!(matches!(twice.validate(), Err(Error::InvalidLayout(_))));

        let two_x = CsvLayout::new(',', ["x", "x", "y", "z"].map(Column::from));
        assert!(matches!(two_x.coordinate_fields(), Err(Error::InvalidLayout(_))));

        let empty = CsvLayout::new(',', Vec::<Column>::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn split_is_strict() {
        let layout = CsvLayout::default();
        assert_eq!(
            layout.split("N,Red,1,2,3", 1).unwrap(),
            vec!["N", "Red", "1", "2", "3"]
        );
        assert!(matches!(
            layout.split("N,Red,1,2", 4),
            Err(Error::Malformed { line: 4, .. })
        ));
        assert!(matches!(
            layout.split("   ", 2),
            Err(Error::Malformed { line: 2, .. })
        ));
    }
}
