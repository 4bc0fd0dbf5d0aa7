//! A pure Rust library for loading molecular topologies and coordinate
//! trajectories through pluggable file formats.
//!
//! Static per-atom, per-residue and per-segment data lives in a [`Topology`]
//! of typed attribute columns; time-varying coordinates come from a
//! [`FrameSource`] one [`Frame`] at a time. A [`Universe`] pairs the two.
//!
//! # Features
//!
//! - **Attribute registry** — Extensible catalogue of attribute kinds with
//!   plural/singular names, cardinality level, and element type
//! - **Columnar topology** — Dense typed columns with an atom → residue →
//!   segment containment map and per-entity views
//! - **Format plug-ins** — Parsers and frame sources selected at run time by
//!   format tag or file extension
//! - **Built-in formats** — Delimited text (CSV) and XYZ / extended XYZ, with
//!   random-access and streaming trajectory readers
//! - **TOML configuration** — Extra attribute kinds, CSV column layout, and
//!   residue grouping policies
//!
//! # Quick Start
//!
//! ```
//! use std::io::Cursor;
//! use traj_forge::io::TopologyParser;
//! use traj_forge::io::csv::{Column, CsvCoordinates, CsvLayout, CsvParser};
//! use traj_forge::{
//!     AttributeRegistry, AttributeSpec, ElementType, Level, ResidueGrouping, Universe,
//! };
//!
//! let rows = "N,Red,52.02,43.559998,31.55\nCA,Blue,51.54,44.14,30.13\n";
//!
//! // The second field is ignored by default; name it to keep it.
//! let mut attributes = AttributeRegistry::with_defaults();
//! attributes.register(AttributeSpec::new("colors", "color", Level::Atom, ElementType::String))?;
//! let layout = CsvLayout::new(',', ["names", "colors", "x", "y", "z"].map(Column::from));
//!
//! let parser = CsvParser::new(layout.clone(), ResidueGrouping::Single);
//! let topology = parser.parse(&mut Cursor::new(rows), &attributes)?;
//! let coordinates = CsvCoordinates::from_reader(&mut Cursor::new(rows), &layout)?;
//! let universe = Universe::new(topology, Box::new(coordinates))?;
//!
//! assert_eq!(universe.topology().strings("colors")?[1], "Blue");
//! assert_eq!(universe.topology().atom(0)?.get("name")?.as_str(), Some("N"));
//! assert_eq!(universe.frame().unwrap().positions[1], [51.54, 44.14, 30.13]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Files are usually loaded through a [`FormatRegistry`], which picks the
//! parser and frame source from the file extension:
//!
//! ```no_run
//! use std::path::Path;
//! use traj_forge::{AttributeRegistry, FormatRegistry, Universe};
//!
//! let mut universe = Universe::load(
//!     &FormatRegistry::with_defaults(),
//!     &AttributeRegistry::with_defaults(),
//!     Path::new("system.xyz"),
//!     Some(Path::new("trajectory.xyz")),
//! )?;
//! while let Some(frame) = universe.next_frame()? {
//!     println!("frame {} has {} atoms", frame.index, frame.n_atoms());
//! }
//! # Ok::<(), traj_forge::io::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — Format plug-in traits, the format registry, and the CSV, XYZ,
//!   and in-memory formats
//! - [`IngestConfig`] — TOML configuration for attributes and formats
//!
//! # Data Types
//!
//! ## Attributes
//!
//! - [`AttributeRegistry`] — Catalogue of known attribute kinds
//! - [`AttributeSpec`] — Name, singular name, level, type, and mutability
//! - [`AttributeValues`] — One typed column of values
//! - [`AttributeValue`] / [`ValueRef`] — A single owned or borrowed value
//! - [`Level`] — Atom, residue, or segment
//! - [`ElementType`] — Int, float, string, or 3-vector
//!
//! ## Topology
//!
//! - [`Topology`] — Attribute columns plus the containment hierarchy
//! - [`TopologyBuilder`] — Validating constructor for topologies
//! - [`Entity`] — View of one atom, residue, or segment
//! - [`ResidueGrouping`] — How parsers group atoms into residues
//!
//! ## Frames
//!
//! - [`Frame`] — Positions, optional velocities and forces, unit cell
//! - [`UnitCell`] — Box lengths and angles

mod config;
mod model;
mod universe;

pub mod io;

pub use model::attribute::{
    AttributeArray, AttributeSpec, AttributeValue, AttributeValues, ElementType, Level, ValueRef,
};
pub use model::element::{atomic_mass, guess_element};
pub use model::frame::{Frame, UnitCell};
pub use model::registry::AttributeRegistry;
pub use model::topology::{
    Entity, EntityCounts, Hierarchy, ResidueGrouping, Topology, TopologyBuilder,
};

pub use io::{FormatRegistry, FrameSource, TopologyParser};

pub use config::{AttributeDecl, CsvConfig, IngestConfig};
pub use universe::Universe;

pub use config::Error as ConfigError;
pub use model::error::Error as ModelError;
