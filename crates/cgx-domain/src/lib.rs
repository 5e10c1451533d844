//! Domain layer for the Code Graph Explorer.
//!
//! Core types (projects, graph nodes/edges, parse jobs, pheromones, swarm
//! tasks), the workspace error taxonomy, and the port traits through which
//! every external collaborator is reached. This crate has no I/O of its own
//! beyond content hashing.

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod utils;
pub mod value_objects;

pub use error::{Error, Result};
