use std::fmt;

use crate::model::{GroupId, PieceId};

#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleError {
    InvalidGrid { rows: u32, cols: u32 },
    InvalidDimensions { width: f64, height: f64 },
    UnsupportedAngle { degrees: f64 },
    UnknownOrientation { index: u8 },
    UnknownPiece { id: PieceId },
    UnknownGroup { id: GroupId },
    PieceGrouped { id: PieceId },
    InvalidSnapTolerance { ratio: f64 },
    InvalidDuration { ms: f64 },
    UnknownObject { handle: u32 },
    NotAGroup { handle: u32 },
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::InvalidGrid { rows, cols } => {
                write!(f, "puzzle grid must have at least one row and column, got {rows}x{cols}")
            }
            PuzzleError::InvalidDimensions { width, height } => {
                write!(f, "puzzle dimensions must be positive, got {width}x{height}")
            }
            PuzzleError::UnsupportedAngle { degrees } => {
                write!(f, "unsupported angle ({degrees}), expected a multiple of 90")
            }
            PuzzleError::UnknownOrientation { index } => {
                write!(f, "unknown orientation mode index {index}")
            }
            PuzzleError::UnknownPiece { id } => write!(f, "no piece with id {id}"),
            PuzzleError::UnknownGroup { id } => write!(f, "no live group with id {id}"),
            PuzzleError::PieceGrouped { id } => {
                write!(f, "piece {id} belongs to a group and cannot be placed alone")
            }
            PuzzleError::InvalidSnapTolerance { ratio } => {
                write!(f, "snap tolerance ratio {ratio} is outside the supported range")
            }
            PuzzleError::InvalidDuration { ms } => {
                write!(f, "rotation duration must be a non-negative number of ms, got {ms}")
            }
            PuzzleError::UnknownObject { handle } => write!(f, "no scene object {handle}"),
            PuzzleError::NotAGroup { handle } => write!(f, "scene object {handle} is not a group"),
        }
    }
}

impl std::error::Error for PuzzleError {}
