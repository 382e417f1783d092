use thiserror::Error;

use crate::figure::{FigureId, FigureKind};

/// Top-level error type for the scene engine.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Figure(#[from] FigureError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Line(#[from] LineError),
}

/// Errors raised by a render back end for figure lifecycle violations.
#[derive(Debug, Error)]
pub enum FigureError {
    #[error("figure {0:?} has already been released")]
    AlreadyReleased(FigureId),

    #[error("figure {0:?} is not known to the back end")]
    Unknown(FigureId),

    #[error("link endpoint figure {0:?} does not exist")]
    MissingEndpoint(FigureId),

    #[error("cannot apply a {update} update to a {figure} figure")]
    KindMismatch {
        figure: FigureKind,
        update: FigureKind,
    },
}

/// Errors related to link (bond) bookkeeping.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("figure {0:?} is not a link owned by this queue")]
    NotALink(FigureId),
}

/// Errors related to cutting-plane sections.
#[derive(Debug, Error)]
pub enum SectionError {
    #[error("unknown cutting plane")]
    UnknownPlane,

    #[error("cutting plane normal has zero length")]
    ZeroNormal,
}

/// Errors related to user line segments.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("unknown line segment")]
    UnknownLine,
}

/// Convenience type alias for results using [`SceneError`].
pub type Result<T> = std::result::Result<T, SceneError>;
