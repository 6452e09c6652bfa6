//! Error types shared by the design engine.
//!
//! Geometry lookups that can legitimately come back empty return `Option`.
//! Everything a caller has to react to goes through [`DesignError`].

use thiserror::Error;

/// Convenience alias used by the public entry points.
pub type DesignResult<T> = Result<T, DesignError>;

/// Failure of a design operation.
#[derive(Error, Debug)]
pub enum DesignError {
    /// A required geometry or sample is absent (no alignment, empty profile, ...).
    #[error("missing input: {0}")]
    MissingInput(String),

    /// An offset, intersection, union or loft could not produce a geometry.
    #[error("geometric failure: {0}")]
    GeometricFailure(String),

    /// The alignment does not satisfy its invariants.
    #[error("invalid alignment: {0}")]
    InvalidAlignment(String),

    /// A transverse shape without lateral extent.
    #[error("degenerate cross-section at chainage {chainage:.3}")]
    DegenerateSection {
        /// Chainage of the rejected station.
        chainage: f64,
    },

    /// An edit would place two control points of one reference line on the same chainage.
    #[error("vak '{vak}' already has a control point at chainage {chainage:.3}")]
    DuplicateChainage {
        /// Name of the vak.
        vak: String,
        /// Conflicting chainage.
        chainage: f64,
    },

    /// No control point with this id exists in the vak.
    #[error("unknown control point {0}")]
    UnknownControlPoint(u64),

    /// No vak with this name exists in the session.
    #[error("unknown vak '{0}'")]
    UnknownVak(String),

    /// Two mutually exclusive editing modes were requested.
    #[error("cannot enter {requested} while {active} is active")]
    ModeConflict {
        /// Mode currently active.
        active: String,
        /// Mode that was requested.
        requested: String,
    },

    /// Malformed textual input (CSV rows, labels, where clauses).
    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failure reported by an external feature query collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The remote source could not be reached or answered with an error.
    #[error("feature source unavailable: {0}")]
    Unavailable(String),

    /// The attribute filter could not be understood.
    #[error("invalid where clause '{0}'")]
    InvalidWhereClause(String),

    /// The query geometry was rejected.
    #[error("query geometry rejected: {0}")]
    Geometry(String),
}
