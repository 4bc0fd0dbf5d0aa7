//! Ingestion settings loaded from TOML.
//!
//! A configuration file declares extra attribute kinds and tunes the built-in
//! formats. Every section is optional:
//!
//! ```toml
//! [[attributes]]
//! name = "colors"
//! level = "atom"
//! type = "string"
//!
//! [csv]
//! delimiter = ","
//! columns = ["names", "colors", "x", "y", "z"]
//! grouping = "single"
//!
//! [xyz]
//! grouping = "per-atom"
//! guess_masses = true
//! unknown_elements = "omit"
//! ```

use crate::io::csv::CsvLayout;
use crate::io::xyz::XyzParser;
use crate::model::attribute::{AttributeSpec, ElementType, Level};
use crate::model::error::Error as ModelError;
use crate::model::registry::AttributeRegistry;
use crate::model::topology::ResidueGrouping;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Attribute(#[from] ModelError),

    #[error("invalid format settings: {0}")]
    Format(#[from] crate::io::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Attribute kinds registered on top of the defaults.
    pub attributes: Vec<AttributeDecl>,
    pub csv: CsvConfig,
    pub xyz: XyzParser,
}

/// One attribute kind declared in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    /// Defaults to `name` without a trailing `s`.
    #[serde(default)]
    pub singular: Option<String>,
    pub level: Level,
    #[serde(rename = "type")]
    pub dtype: ElementType,
    #[serde(default)]
    pub mutable: bool,
}

impl AttributeDecl {
    pub fn singular_name(&self) -> &str {
        match &self.singular {
            Some(singular) => singular,
            None => self.name.strip_suffix('s').unwrap_or(&self.name),
        }
    }

    pub fn to_spec(&self) -> AttributeSpec {
        let spec = AttributeSpec::new(
            self.name.clone(),
            self.singular_name().to_string(),
            self.level,
            self.dtype,
        );
        if self.mutable { spec.mutable() } else { spec }
    }
}

/// Settings for the CSV format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    #[serde(flatten)]
    pub layout: CsvLayout,
    pub grouping: ResidueGrouping,
}

impl IngestConfig {
    /// Parses and validates a configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: IngestConfig = toml::from_str(text)?;
        config.csv.layout.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(
            path = %path.display(),
            attributes = config.attributes.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Registers every declared attribute; stops at the first clash.
    pub fn register_attributes(&self, registry: &mut AttributeRegistry) -> Result<(), Error> {
        for decl in &self.attributes {
            registry.register(decl.to_spec())?;
        }
        Ok(())
    }

    /// The default attributes plus the declared ones.
    pub fn attribute_registry(&self) -> Result<AttributeRegistry, Error> {
        let mut registry = AttributeRegistry::with_defaults();
        self.register_attributes(&mut registry)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv::Column;
    use crate::io::xyz::UnknownElements;
    use std::io::Write;

    const EXAMPLE: &str = include_str!("../resources/ingest.example.toml");

    #[test]
    fn empty_config_is_default() {
        let config = IngestConfig::from_toml_str("").unwrap();
        assert_eq!(config, IngestConfig::default());
        assert_eq!(config.csv.layout, CsvLayout::default());
        assert_eq!(config.xyz, XyzParser::default());
    }

    #[test]
    fn bundled_example_parses() {
        let config = IngestConfig::from_toml_str(EXAMPLE).unwrap();
        let registry = config.attribute_registry().unwrap();
        let colors = registry.lookup("colors").unwrap();
        assert_eq!(colors.singular, "color");
        assert_eq!(colors.level, Level::Atom);
        assert_eq!(config.csv.layout.delimiter, ',');
    }

    #[test]
    fn full_config() {
        let config = IngestConfig::from_toml_str(
            r#"
            [[attributes]]
            name = "bfactors"
            singular = "bfactor"
            level = "atom"
            type = "float"
            mutable = true

            [[attributes]]
            name = "chains"
            level = "segment"
            type = "string"

            [csv]
            delimiter = ";"
            columns = ["names", "_", "z", "y", "x", "bfactors"]
            grouping = { by-attribute = "names" }

            [xyz]
            grouping = "single"
            guess_masses = false
            unknown_elements = "fail"
            "#,
        )
        .unwrap();

        let bfactors = config.attributes[0].to_spec();
        assert!(bfactors.mutable);
        assert_eq!(bfactors.element_type, ElementType::Float);
        assert_eq!(config.attributes[1].singular_name(), "chain");
        assert!(!config.attributes[1].mutable);

        assert_eq!(config.csv.layout.delimiter, ';');
        assert_eq!(config.csv.layout.columns[1], Column::Skip);
        assert_eq!(config.csv.layout.coordinate_fields().unwrap(), [4, 3, 2]);
        assert_eq!(
            config.csv.grouping,
            ResidueGrouping::ByAttribute("names".into())
        );
        assert_eq!(config.xyz.grouping, ResidueGrouping::Single);
        assert!(!config.xyz.guess_masses);
        assert_eq!(config.xyz.unknown_elements, UnknownElements::Fail);
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let err = IngestConfig::from_toml_str("[csv]\ncolumns = [\"names\", \"x\"]\n").unwrap_err();
        assert!(matches!(err, Error::Format(crate::io::Error::InvalidLayout(_))));
    }

    #[test]
    fn syntax_and_schema_errors() {
        assert!(matches!(
            IngestConfig::from_toml_str("not valid [[[toml"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            IngestConfig::from_toml_str(
                "[[attributes]]\nname = \"x\"\nlevel = \"molecule\"\ntype = \"int\"\n"
            ),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn clashing_declaration_fails() {
        let config = IngestConfig::from_toml_str(
            "[[attributes]]\nname = \"masses\"\nlevel = \"atom\"\ntype = \"float\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.attribute_registry(),
            Err(Error::Attribute(ModelError::DuplicateAttribute(_)))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();
        assert!(IngestConfig::load(file.path()).is_ok());

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            IngestConfig::load(&missing),
            Err(Error::Read { .. })
        ));
    }
}
