//! Error taxonomy shared by the stores, the scene contract, and the engine.
//!
//! None of these are fatal: the engine logs them and aborts the single
//! operation that produced them, leaving state unchanged.

use crate::id::{ConnectionId, ShapeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// A stale or unknown shape ID.
    #[error("shape {0} not found")]
    ShapeNotFound(ShapeId),

    /// A stale or unknown connection ID.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// Connection source and target are the same shape.
    #[error("cannot connect {0} to itself")]
    SelfConnection(ShapeId),

    /// Drop payload or programmatic request named no known shape kind.
    #[error("unknown shape kind {0:?}")]
    UnknownShapeKind(String),

    /// Host-supplied configuration that the engine cannot run with.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A coordinate transform or visual lookup was unavailable.
    #[error("geometry unavailable: {0}")]
    Geometry(String),
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
