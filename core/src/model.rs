use serde::{Deserialize, Serialize};

use crate::game::Rotation;
use crate::geometry::{rotate_vec, Point};
use crate::scene::ObjectHandle;

pub type PieceId = usize;
pub type GroupId = usize;

/// Placement of a scene object: position of its local origin and clockwise
/// angle in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform2d {
    pub position: Point,
    pub angle: f64,
}

impl Transform2d {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            position: Point::new(x, y),
            angle,
        }
    }

    pub fn placed(position: Point, rotation: Rotation) -> Self {
        Self {
            position,
            angle: rotation.degrees(),
        }
    }

    pub fn apply_to(&self, local: Point) -> Point {
        self.position + rotate_vec(local, self.angle)
    }

    pub fn translated(self, delta: Point) -> Self {
        Self {
            position: self.position + delta,
            ..self
        }
    }
}

/// Something the user can grab: a loose piece or a whole group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Piece(PieceId),
    Group(GroupId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceState {
    pub handle: ObjectHandle,
    pub group: Option<GroupId>,
    /// Rotation of the piece's own object. Always `Deg0` while grouped.
    pub rotation: Rotation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupState {
    pub handle: ObjectHandle,
    pub members: Vec<PieceId>,
    pub rotation: Rotation,
}

impl GroupState {
    pub fn contains(&self, piece: PieceId) -> bool {
        self.members.contains(&piece)
    }
}
