//! Core data structures for particle populations and their time samples.
//!
//! - [`attribute`] – Attribute kinds ([`AttributeSpec`]) and typed columns.
//! - [`registry`] – The [`AttributeRegistry`] of known attribute kinds.
//! - [`topology`] – The static [`Topology`]: entity counts, columns, containment.
//! - [`frame`] – A [`Frame`] of per-atom coordinates and optional cell.
//! - [`element`] – Element guessing and standard masses.
//!
//! A topology and a sequence of frames are correlated only through the atom
//! count and atom ordering; [`Frame::check_atoms`] enforces the former.
//!
//! [`AttributeSpec`]: attribute::AttributeSpec
//! [`AttributeRegistry`]: registry::AttributeRegistry
//! [`Topology`]: topology::Topology
//! [`Frame`]: frame::Frame
//! [`Frame::check_atoms`]: frame::Frame::check_atoms

pub mod attribute;
pub mod element;
pub mod error;
pub mod frame;
pub mod registry;
pub mod topology;
