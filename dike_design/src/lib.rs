//! Core library for parametric dike design.
//!
//! A [`session::Session`] holds the alignment, the sampled terrain profile and
//! the control points of each vak, and derives the 3D surface, its volume, its
//! footprint and structural element placement from them.

pub mod alignment;
pub mod config;
pub mod cross_section;
pub mod crs;
pub mod design;
pub mod dtm;
pub mod effects;
pub mod error;
pub mod footprint;
pub mod geometry;
pub mod gis;
pub mod intersection;
pub mod io;
pub mod measure;
pub mod offset;
pub mod profile;
pub mod session;
pub mod surface;
pub mod volume;

pub use error::{DesignError, DesignResult, QueryError};
pub use session::Session;
