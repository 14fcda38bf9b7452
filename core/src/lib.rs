pub mod animation;
pub mod board;
pub mod config;
pub mod edge;
pub mod error;
pub mod game;
pub mod geometry;
pub mod grid;
pub mod model;
pub mod piece;
pub mod scene;
pub mod snap;
pub mod svg;

pub use board::{Board, BoardEvent, BoardSettings, RotationRejection, RotationRequest};
pub use config::{ConfigError, PuzzleConfig};
pub use edge::{EdgeAxis, EdgeCurve, EdgeProfile, EdgeRef};
pub use error::PuzzleError;
pub use game::{OrientationMode, Rotation, PUZZLE_SEED};
pub use geometry::{Corner, Corners, PathCommand, Point, Rect, Size};
pub use grid::{difficulties, Difficulty};
pub use model::{GroupId, PieceId, Target, Transform2d};
pub use piece::{Grid, Piece, PuzzleGenerator, Side};
pub use scene::{MemoryScene, ObjectHandle, Scene, Shadow};
pub use snap::SnapRecord;
pub use svg::render_grid;
