use super::{CsvLayout, FORMAT};
use crate::io::{Error, TopologyParser, util};
use crate::model::attribute::{AttributeSpec, AttributeValue, AttributeValues, Level};
use crate::model::error::Error as ModelError;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::{ResidueGrouping, Topology, TopologyBuilder};
use std::io::BufRead;
use tracing::debug;

/// Builds a topology from CSV rows according to a [`CsvLayout`].
///
/// Every attribute column in the layout must be registered as an atom-level
/// attribute. Residues are formed by the configured [`ResidueGrouping`];
/// `resids` and `segids` are added when the registry knows them.
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    pub layout: CsvLayout,
    pub grouping: ResidueGrouping,
}

impl CsvParser {
    pub fn new(layout: CsvLayout, grouping: ResidueGrouping) -> Self {
        Self { layout, grouping }
    }

    fn requested_specs(
        &self,
        registry: &AttributeRegistry,
    ) -> Result<Vec<(usize, AttributeSpec)>, Error> {
        self.layout
            .attribute_fields()
            .map(|(field, name)| {
                let spec = registry.lookup(name)?;
                if spec.level != Level::Atom {
                    return Err(Error::InvalidLayout(format!(
                        "column '{name}' is a {} attribute; rows describe atoms",
                        spec.level
                    )));
                }
                Ok((field, spec.clone()))
            })
            .collect()
    }
}

impl TopologyParser for CsvParser {
    fn format(&self) -> &str {
        FORMAT
    }

    fn parse(
        &self,
        reader: &mut dyn BufRead,
        registry: &AttributeRegistry,
    ) -> Result<Topology, Error> {
        let specs = self.requested_specs(registry)?;
        let lines = util::collect_lines(reader)?;

        let mut columns: Vec<AttributeValues> = specs
            .iter()
            .map(|(_, spec)| AttributeValues::with_capacity(spec.element_type, lines.len()))
            .collect();

        for (line_no, line) in &lines {
            let fields = self.layout.split(line, *line_no)?;
            for ((field, spec), column) in specs.iter().zip(columns.iter_mut()) {
                let value = AttributeValue::parse(spec.element_type, fields[*field]).ok_or_else(
                    || {
                        Error::malformed_field(
                            FORMAT,
                            *line_no,
                            field + 1,
                            format!(
                                "invalid {} value '{}' for '{}'",
                                spec.element_type,
                                fields[*field].trim(),
                                spec.name
                            ),
                        )
                    },
                )?;
                column.push(value).map_err(|value| ModelError::TypeMismatch {
                    name: spec.name.clone(),
                    expected: spec.element_type,
                    found: value.element_type(),
                })?;
            }
        }

        let mut builder = TopologyBuilder::new(lines.len());
        for ((_, spec), column) in specs.into_iter().zip(columns) {
            builder = builder.attribute(spec, column);
        }
        let builder = util::add_default_hierarchy(builder, &self.grouping, registry)?;
        let topology = builder.build()?;

        debug!(
            format = FORMAT,
            atoms = topology.n_atoms(),
            residues = topology.n_residues(),
            "topology parsed"
        );
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv::Column;
    use crate::model::attribute::{ElementType, ValueRef};
    use std::io::Cursor;

    const SAMPLE: &str = "N,Red,52.02,43.559998,31.55
CA,Blue,51.54,44.14,30.13
C,Green,50.06,43.8,29.84
O,Orange,49.55,42.91,30.55
CB,Purple,52.27,43.48,28.88
CG,Brown,53.7,44.06,28.72
SD,Black,53.81,45.83,29.0
CE,White,54.7,46.1,27.44
N,Gray,49.4,44.48,28.89
CA,Yellow,47.96,44.29,28.7
C,Red,47.42,45.63,28.21
O,Blue,46.27,45.94,28.5
CB,Green,47.34,43.72,29.97
CE,Yellow,53.35,43.12,26.7
";

    fn registry() -> AttributeRegistry {
        let mut registry = AttributeRegistry::with_defaults();
        registry
            .register(AttributeSpec::new(
                "colors",
                "color",
                Level::Atom,
                ElementType::String,
            ))
            .unwrap();
        registry
    }

    fn colored_layout() -> CsvLayout {
        CsvLayout::new(',', ["names", "colors", "x", "y", "z"].map(Column::from))
    }

    fn parse(input: &str) -> Result<Topology, Error> {
        CsvParser::new(colored_layout(), ResidueGrouping::Single)
            .parse(&mut Cursor::new(input), &registry())
    }

    #[test]
    fn parses_sample_rows() {
        let top = parse(SAMPLE).unwrap();
        assert_eq!(top.n_atoms(), 14);
        assert_eq!(top.strings("names").unwrap()[0], "N");
        assert_eq!(top.strings("colors").unwrap()[9], "Yellow");
        assert_eq!(top.n_residues(), 1);
        assert_eq!(top.n_segments(), 1);
        assert_eq!(top.ints("resids").unwrap(), &[1]);
        assert_eq!(top.strings("segids").unwrap(), &["SYSTEM".to_string()]);
        assert_eq!(top.atom(13).unwrap().get("color").unwrap(), ValueRef::Str("Yellow"));
    }

    #[test]
    fn tolerates_crlf() {
        let top = parse("N,Red,1,2,3\r\nO,Blue,4,5,6\r\n").unwrap();
        assert_eq!(top.strings("colors").unwrap(), &["Red", "Blue"]);
    }

    #[test]
    fn empty_input_gives_empty_columns() {
        let top = parse("").unwrap();
        assert_eq!(top.n_atoms(), 0);
        assert!(top.attribute("names").unwrap().is_empty());
        assert!(top.attribute("colors").unwrap().is_empty());
        assert_eq!(top.n_residues(), 0);
    }

    #[test]
    fn blank_and_short_rows_fail_fast() {
        let err = parse("N,Red,1,2,3\n\n").unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 2, .. }));

        let err = parse("N,Red,1,2,3\nO,Blue,4,5\n").unwrap_err();
        assert!(matches!(err, Error::Malformed { line: 2, .. }));
    }

    #[test]
    fn default_layout_reads_sample_with_default_registry() {
        let top = CsvParser::default()
            .parse(&mut Cursor::new(SAMPLE), &AttributeRegistry::with_defaults())
            .unwrap();
        assert_eq!(top.n_atoms(), 14);
        assert_eq!(top.strings("names").unwrap()[1], "CA");
        assert!(!top.has_attribute("colors"));
    }

    #[test]
    fn unregistered_column_is_not_found() {
        let layout = CsvLayout::new(',', ["names", "bfactors", "x", "y", "z"].map(Column::from));
        let err = CsvParser::new(layout, ResidueGrouping::Single)
            .parse(&mut Cursor::new("N,1.5,0,0,0\n"), &AttributeRegistry::with_defaults())
            .unwrap_err();
        assert!(matches!(
            err.as_model(),
            Some(ModelError::NotFound { scope: "registry", .. })
        ));
    }

    #[test]
    fn typed_columns_are_parsed_with_field_context() {
        let layout = CsvLayout::new(';', ["names", "masses", "x", "y", "z"].map(Column::from));
        let parser = CsvParser::new(layout, ResidueGrouping::PerAtom);

        let top = parser
            .parse(&mut Cursor::new("O;15.999;0;0;0\nH;1.008;1;0;0\n"), &registry())
            .unwrap();
        assert_eq!(top.floats("masses").unwrap(), &[15.999, 1.008]);
        assert_eq!(top.n_residues(), 2);
        assert_eq!(top.ints("resids").unwrap(), &[1, 2]);

        let err = parser
            .parse(&mut Cursor::new("O;heavy;0;0;0\n"), &registry())
            .unwrap_err();
        match err {
            Error::Malformed { line, field, .. } => {
                assert_eq!(line, 1);
                assert_eq!(field, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn residue_level_column_is_rejected() {
        let layout = CsvLayout::new(',', ["resnames", "x", "y", "z"].map(Column::from));
        let err = CsvParser::new(layout, ResidueGrouping::Single)
            .parse(&mut Cursor::new("ALA,0,0,0\n"), &registry())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLayout(_)));
    }

    #[test]
    fn groups_by_color_runs() {
        let grouping = ResidueGrouping::ByAttribute("colors".into());
        let parser = CsvParser::new(colored_layout(), grouping);
        let top = parser
            .parse(
                &mut Cursor::new("N,Red,0,0,0\nCA,Red,0,0,0\nC,Blue,0,0,0\n"),
                &registry(),
            )
            .unwrap();
        assert_eq!(top.n_residues(), 2);
        assert_eq!(top.residue_atoms(0).unwrap(), vec![0, 1]);
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(SAMPLE).unwrap(), parse(SAMPLE).unwrap());
    }

    #[test]
    fn skips_hierarchy_columns_missing_from_registry() {
        let mut registry = AttributeRegistry::new();
        registry
            .register(AttributeSpec::new("names", "name", Level::Atom, ElementType::String))
            .unwrap();
        let layout = CsvLayout::new(',', ["names", "_", "x", "y", "z"].map(Column::from));
        let top = CsvParser::new(layout, ResidueGrouping::Single)
            .parse(&mut Cursor::new(SAMPLE), &registry)
            .unwrap();
        assert!(!top.has_attribute("resids"));
        assert!(!top.has_attribute("segids"));
        assert_eq!(top.n_residues(), 1);
    }
}
