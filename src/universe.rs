//! A topology paired with a source of frames for the same atoms.

use crate::io::{Error, FormatRegistry, FrameSource};
use crate::model::error::Error as ModelError;
use crate::model::frame::Frame;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::Topology;
use std::path::Path;
use tracing::{debug, info};

/// Static description of a system plus its coordinates over time.
///
/// The topology and the frame source always agree on the number of atoms;
/// every frame handed out has been checked against the topology.
pub struct Universe {
    topology: Topology,
    source: Box<dyn FrameSource>,
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("atoms", &self.topology.n_atoms())
            .field("format", &self.source.format())
            .field("n_frames", &self.source.n_frames())
            .field("frame", &self.source.current().map(|f| f.index))
            .finish()
    }
}

impl Universe {
    /// Pairs `topology` with `source`, loading frame 0 if nothing is loaded yet.
    ///
    /// Fails with [`ModelError::FrameTopologyMismatch`] if the atom counts
    /// differ. A source with no frames at all is accepted; [`frame`](Self::frame)
    /// then returns `None`.
    pub fn new(topology: Topology, source: Box<dyn FrameSource>) -> Result<Self, Error> {
        check_source(&topology, source.as_ref())?;
        let mut universe = Self { topology, source };
        if universe.source.current().is_none() {
            universe.next_frame()?;
        }
        Ok(universe)
    }

    /// Builds a universe from files, choosing formats by extension.
    ///
    /// Without `trajectory`, coordinates come from the topology file itself.
    pub fn load(
        formats: &FormatRegistry,
        attributes: &AttributeRegistry,
        topology: &Path,
        trajectory: Option<&Path>,
    ) -> Result<Self, Error> {
        let topology_format = formats.format_for_path(topology)?;
        let parsed = formats
            .parser(topology_format)?
            .parse_path(topology, attributes)?;

        let coordinates = trajectory.unwrap_or(topology);
        let source = formats.source_for_path(coordinates)?;
        info!(
            topology = %topology.display(),
            coordinates = %coordinates.display(),
            atoms = parsed.n_atoms(),
            frames = ?source.n_frames(),
            "universe loaded"
        );
        Self::new(parsed, source)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Mutable topology, for attaching attributes after loading.
    ///
    /// The atom count cannot change through this handle.
    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn source(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub fn n_atoms(&self) -> usize {
        self.topology.n_atoms()
    }

    pub fn n_frames(&self) -> Option<usize> {
        self.source.n_frames()
    }

    /// The current frame.
    pub fn frame(&self) -> Option<&Frame> {
        self.source.current()
    }

    /// Advances to the next frame; `Ok(None)` at the end.
    pub fn next_frame(&mut self) -> Result<Option<&Frame>, Error> {
        let n_atoms = self.topology.n_atoms();
        match self.source.advance()? {
            Some(frame) => {
                frame.check_atoms(n_atoms)?;
                debug!(frame = frame.index, "universe advanced");
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    /// Jumps to frame `index`.
    pub fn seek(&mut self, index: usize) -> Result<&Frame, Error> {
        let n_atoms = self.topology.n_atoms();
        let frame = self.source.seek(index)?;
        frame.check_atoms(n_atoms)?;
        Ok(frame)
    }

    /// Replaces the frame source, keeping the topology.
    ///
    /// On error the current source stays in place.
    pub fn set_source(&mut self, source: Box<dyn FrameSource>) -> Result<(), Error> {
        check_source(&self.topology, source.as_ref())?;
        self.source = source;
        if self.source.current().is_none() {
            self.next_frame()?;
        }
        Ok(())
    }
}

fn check_source(topology: &Topology, source: &dyn FrameSource) -> Result<(), ModelError> {
    if source.n_atoms() != topology.n_atoms() {
        return Err(ModelError::FrameTopologyMismatch {
            field: "atoms",
            expected: topology.n_atoms(),
            found: source.n_atoms(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::io::csv::CsvCoordinates;
    use crate::io::memory::MemorySource;
    use crate::model::attribute::AttributeValues;
    use std::io::Write;
    use tempfile::Builder;

    const ATOMS: &str = "N,Red,52.02,43.559998,31.55
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

    const COLORED: &str = r#"
        [[attributes]]
        name = "colors"
        level = "atom"
        type = "string"

        [csv]
        columns = ["names", "colors", "x", "y", "z"]
    "#;

    fn colored() -> (FormatRegistry, AttributeRegistry) {
        let config = IngestConfig::from_toml_str(COLORED).unwrap();
        let attributes = config.attribute_registry().unwrap();
        (FormatRegistry::with_config(&config), attributes)
    }

    fn load_with_defaults(path: &Path) -> Result<Universe, Error> {
        let attributes = AttributeRegistry::with_defaults();
        Universe::load(&FormatRegistry::with_defaults(), &attributes, path, None)
    }

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn topology(n_atoms: usize) -> Topology {
        Topology::builder(n_atoms).build().unwrap()
    }

    #[test]
    fn loads_csv_as_topology_and_coordinates() {
        let file = write_temp(".csv", ATOMS);
        let (formats, attributes) = colored();
        let universe = Universe::load(&formats, &attributes, file.path(), None).unwrap();

        assert_eq!(universe.n_atoms(), 14);
        assert_eq!(universe.topology().strings("names").unwrap()[0], "N");
        assert_eq!(universe.topology().strings("colors").unwrap()[9], "Yellow");
        assert_eq!(universe.n_frames(), Some(1));

        let frame = universe.frame().unwrap();
        assert_eq!(frame.positions[0], [52.02, 43.559998, 31.55]);
        assert_eq!(frame.positions[13], [53.35, 43.12, 26.7]);
    }

    #[test]
    fn default_registries_load_csv() {
        let file = write_temp(".csv", "N,Red,52.02,43.559998,31.55\n");
        let universe = load_with_defaults(file.path()).unwrap();
        assert_eq!(universe.topology().strings("names").unwrap(), &["N"]);
        assert!(!universe.topology().has_attribute("colors"));
        assert_eq!(universe.frame().unwrap().positions[0], [52.02, 43.559998, 31.55]);
    }

    #[test]
    fn single_frame_universe_navigation() {
        let file = write_temp(".csv", ATOMS);
        let mut universe = load_with_defaults(file.path()).unwrap();
        assert!(universe.next_frame().unwrap().is_none());
        assert_eq!(universe.seek(0).unwrap().index, 0);
        assert!(matches!(
            universe.seek(1).unwrap_err(),
            Error::OutOfRange { index: 1, .. }
        ));
    }

    #[test]
    fn new_loads_first_frame_of_multi_frame_source() {
        let frames = (0..3)
            .map(|i| Frame::new(0, vec![[i as f32, 0.0, 0.0]; 2]))
            .collect();
        let mut universe =
            Universe::new(topology(2), Box::new(MemorySource::new(frames).unwrap())).unwrap();

        assert_eq!(universe.frame().unwrap().index, 0);
        assert_eq!(universe.next_frame().unwrap().unwrap().index, 1);
        let first_again = universe.seek(0).unwrap().clone();
        assert_eq!(first_again.positions[0], [0.0, 0.0, 0.0]);
        assert_eq!(universe.next_frame().unwrap().unwrap().index, 1);
        assert_eq!(universe.next_frame().unwrap().unwrap().index, 2);
        assert!(universe.next_frame().unwrap().is_none());
    }

    #[test]
    fn atom_count_mismatch_is_rejected() {
        let coords = CsvCoordinates::from_reader(
            &mut std::io::Cursor::new("N,Red,0,0,0\n"),
            &Default::default(),
        )
        .unwrap();
        let err = Universe::new(topology(2), Box::new(coords)).unwrap_err();
        assert!(matches!(
            err.as_model(),
            Some(ModelError::FrameTopologyMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn empty_source_has_no_frame() {
        let universe = Universe::new(topology(3), Box::new(MemorySource::empty(3))).unwrap();
        assert!(universe.frame().is_none());
        assert_eq!(universe.n_frames(), Some(0));
    }

    #[test]
    fn separate_trajectory_file() {
        let top = write_temp(".xyz", "2\n\nO 0 0 0\nH 1 0 0\n");
        let traj = write_temp(
            ".xyz",
            "2\nLattice=\"5 0 0 0 5 0 0 0 5\"\nO 0 0 0\nH 1 0 0\n2\n\nO 0 0 1\nH 1 0 1\n",
        );
        let mut universe = Universe::load(
            &FormatRegistry::with_defaults(),
            &AttributeRegistry::with_defaults(),
            top.path(),
            Some(traj.path()),
        )
        .unwrap();

        assert_eq!(universe.n_frames(), Some(2));
        assert_eq!(universe.frame().unwrap().unit_cell.unwrap().lengths(), [5.0; 3]);
        assert_eq!(universe.next_frame().unwrap().unwrap().positions[1], [1.0, 0.0, 1.0]);
        assert_eq!(universe.topology().strings("elements").unwrap(), &["O", "H"]);
    }

    #[test]
    fn trajectory_with_other_atom_count_fails() {
        let top = write_temp(".xyz", "1\n\nO 0 0 0\n");
        let traj = write_temp(".xyz", "2\n\nO 0 0 0\nH 1 0 0\n");
        let err = Universe::load(
            &FormatRegistry::with_defaults(),
            &AttributeRegistry::with_defaults(),
            top.path(),
            Some(traj.path()),
        )
        .unwrap_err();
        assert!(err.as_model().is_some());
    }

    #[test]
    fn unknown_extension_fails_before_reading() {
        let file = write_temp(".gro", "whatever");
        assert!(matches!(load_with_defaults(file.path()), Err(Error::UnknownFormat(_))));
    }

    #[test]
    fn attributes_can_be_attached_after_loading() {
        let file = write_temp(".csv", ATOMS);
        let attributes = AttributeRegistry::with_defaults();
        let mut universe = load_with_defaults(file.path()).unwrap();

        universe
            .topology_mut()
            .add_attribute(&attributes, "charges", AttributeValues::Float(vec![0.0; 14]))
            .unwrap();
        let charge = universe.topology().atom(3).unwrap().get("charge").unwrap();
        assert_eq!(charge.as_float(), Some(0.0));

        let types = AttributeValues::String(vec!["X".into(); 3]);
        let err = universe
            .topology_mut()
            .add_attribute(&attributes, "types", types)
            .unwrap_err();
        assert!(matches!(err, ModelError::CardinalityMismatch { .. }));
    }

    #[test]
    fn config_drives_layout_and_attributes() {
        let config = IngestConfig::from_toml_str(
            r#"
            [[attributes]]
            name = "bfactors"
            level = "atom"
            type = "float"

            [csv]
            delimiter = ";"
            columns = ["x", "y", "z", "names", "bfactors"]
            "#,
        )
        .unwrap();
        let attributes = config.attribute_registry().unwrap();
        let formats = FormatRegistry::with_config(&config);
        let file = write_temp(".csv", "1;2;3;CA;0.5\n4;5;6;CB;1.5\n");

        let universe = Universe::load(&formats, &attributes, file.path(), None).unwrap();
        assert_eq!(universe.topology().floats("bfactors").unwrap(), &[0.5, 1.5]);
        assert_eq!(universe.frame().unwrap().positions[1], [4.0, 5.0, 6.0]);
        let atom = universe.topology().atom(1).unwrap();
        assert_eq!(atom.get("bfactor").unwrap().as_float(), Some(1.5));
        assert_eq!(atom.get("name").unwrap().as_str(), Some("CB"));
    }

    #[test]
    fn replacing_source_rechecks_atoms() {
        let mut universe = Universe::new(topology(1), Box::new(MemorySource::empty(1))).unwrap();
        let frames = vec![Frame::new(0, vec![[1.0, 2.0, 3.0]])];
        universe
            .set_source(Box::new(MemorySource::new(frames).unwrap()))
            .unwrap();
        assert_eq!(universe.frame().unwrap().positions[0], [1.0, 2.0, 3.0]);

        assert!(universe.set_source(Box::new(MemorySource::empty(4))).is_err());
    }
}
