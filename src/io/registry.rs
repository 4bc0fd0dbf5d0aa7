use super::csv::{self, CsvCoordinates, CsvParser};
use super::xyz::{self, XyzTrajectory};
use super::{Error, FrameSource, TopologyParser};
use crate::config::IngestConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type ParserFactory = Arc<dyn Fn() -> Box<dyn TopologyParser> + Send + Sync>;
type SourceFactory = Arc<dyn Fn(&Path) -> Result<Box<dyn FrameSource>, Error> + Send + Sync>;

#[derive(Clone)]
struct Entry<F> {
    extensions: Vec<String>,
    factory: F,
}

impl<F> Entry<F> {
    fn new(extensions: &[&str], factory: F) -> Self {
        Self {
            extensions: extensions.iter().map(|e| normalize_extension(e)).collect(),
            factory,
        }
    }

    fn matches(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Maps format tags and file extensions to parser and frame-source factories.
///
/// A tag may have a parser, a source, or both; the two tables are separate so
/// a topology-only or coordinates-only format can be plugged in.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    parsers: BTreeMap<String, Entry<ParserFactory>>,
    sources: BTreeMap<String, Entry<SourceFactory>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("parsers", &self.parsers.keys().collect::<Vec<_>>())
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `csv` and `xyz` formats with default settings.
    pub fn with_defaults() -> Self {
        Self::with_config(&IngestConfig::default())
    }

    /// The built-in formats configured from `config`.
    pub fn with_config(config: &IngestConfig) -> Self {
        let mut registry = Self::new();

        let csv_parser = CsvParser::new(config.csv.layout.clone(), config.csv.grouping.clone());
        let layout = config.csv.layout.clone();
        registry.insert_parser(csv::FORMAT, &["csv"], move || Box::new(csv_parser.clone()));
        registry.insert_source(csv::FORMAT, &["csv"], move |path| {
            Ok(Box::new(CsvCoordinates::open(path, &layout)?))
        });

        let xyz_parser = config.xyz.clone();
        registry.insert_parser(xyz::FORMAT, &["xyz", "extxyz"], move || {
            Box::new(xyz_parser.clone())
        });
        registry.insert_source(xyz::FORMAT, &["xyz", "extxyz"], |path| {
            Ok(Box::new(XyzTrajectory::open(path)?))
        });

        registry
    }

    /// Registers a topology parser under `tag`.
    ///
    /// Fails with [`Error::DuplicateFormat`] if a parser already uses `tag`.
    pub fn register_parser<F>(
        &mut self,
        tag: &str,
        extensions: &[&str],
        factory: F,
    ) -> Result<(), Error>
    where
        F: Fn() -> Box<dyn TopologyParser> + Send + Sync + 'static,
    {
        if self.parsers.contains_key(tag) {
            return Err(Error::DuplicateFormat(tag.to_string()));
        }
        self.insert_parser(tag, extensions, factory);
        Ok(())
    }

    /// Registers a frame source under `tag`.
    ///
    /// Fails with [`Error::DuplicateFormat`] if a source already uses `tag`.
    pub fn register_source<F>(
        &mut self,
        tag: &str,
        extensions: &[&str],
        factory: F,
    ) -> Result<(), Error>
    where
        F: Fn(&Path) -> Result<Box<dyn FrameSource>, Error> + Send + Sync + 'static,
    {
        if self.sources.contains_key(tag) {
            return Err(Error::DuplicateFormat(tag.to_string()));
        }
        self.insert_source(tag, extensions, factory);
        Ok(())
    }

    fn insert_parser<F>(&mut self, tag: &str, extensions: &[&str], factory: F)
    where
        F: Fn() -> Box<dyn TopologyParser> + Send + Sync + 'static,
    {
        debug!(tag, ?extensions, "topology parser registered");
        let factory: ParserFactory = Arc::new(factory);
        self.parsers
            .insert(tag.to_string(), Entry::new(extensions, factory));
    }

    fn insert_source<F>(&mut self, tag: &str, extensions: &[&str], factory: F)
    where
        F: Fn(&Path) -> Result<Box<dyn FrameSource>, Error> + Send + Sync + 'static,
    {
        debug!(tag, ?extensions, "frame source registered");
        let factory: SourceFactory = Arc::new(factory);
        self.sources
            .insert(tag.to_string(), Entry::new(extensions, factory));
    }

    /// A fresh parser for `tag`.
    pub fn parser(&self, tag: &str) -> Result<Box<dyn TopologyParser>, Error> {
        let entry = self
            .parsers
            .get(tag)
            .ok_or_else(|| Error::UnsupportedTopologyFormat(tag.to_string()))?;
        Ok((entry.factory)())
    }

    /// Opens `path` with the frame source registered for `tag`.
    pub fn source(&self, tag: &str, path: &Path) -> Result<Box<dyn FrameSource>, Error> {
        let entry = self
            .sources
            .get(tag)
            .ok_or_else(|| Error::UnsupportedFrameFormat(tag.to_string()))?;
        (entry.factory)(path)
    }

    /// Picks a format tag from the file extension, ignoring case.
    ///
    /// Parsers are consulted before sources; among each, tags are tried in
    /// lexical order.
    pub fn format_for_path(&self, path: &Path) -> Result<&str, Error> {
        let unknown = || Error::UnknownFormat(path.display().to_string());
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize_extension)
            .ok_or_else(unknown)?;

        let parser_tag = self
            .parsers
            .iter()
            .find(|(_, entry)| entry.matches(&extension))
            .map(|(tag, _)| tag);
        let source_tag = || {
            self.sources
                .iter()
                .find(|(_, entry)| entry.matches(&extension))
                .map(|(tag, _)| tag)
        };
        parser_tag
            .or_else(source_tag)
            .map(String::as_str)
            .ok_or_else(unknown)
    }

    /// Parser for whatever format `path` has.
    pub fn parser_for_path(&self, path: &Path) -> Result<Box<dyn TopologyParser>, Error> {
        self.parser(self.format_for_path(path)?)
    }

    /// Frame source for whatever format `path` has.
    pub fn source_for_path(&self, path: &Path) -> Result<Box<dyn FrameSource>, Error> {
        self.source(self.format_for_path(path)?, path)
    }

    /// Tags with a topology parser, in lexical order.
    pub fn parser_formats(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Tags with a frame source, in lexical order.
    pub fn source_formats(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Registered extensions for `tag`, parser and source combined.
    pub fn extensions(&self, tag: &str) -> Vec<&str> {
        let mut extensions: Vec<&str> = self
            .parsers
            .get(tag)
            .into_iter()
            .flat_map(|e| e.extensions.iter())
            .chain(self.sources.get(tag).into_iter().flat_map(|e| e.extensions.iter()))
            .map(String::as_str)
            .collect();
        extensions.sort_unstable();
        extensions.dedup();
        extensions
    }
}
