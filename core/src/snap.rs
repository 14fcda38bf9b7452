//! Neighbour snapping and group merging.
//!
//! Only pieces that are neighbours in the grid can lock together; there is
//! no spatial search. Two neighbours snap when their top-left corners sit,
//! in the rotated frame they share, within the snap tolerance of where the
//! generated layout puts them.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardEvent};
use crate::error::PuzzleError;
use crate::game::Rotation;
use crate::geometry::{Corner, Point};
use crate::model::{GroupId, GroupState, PieceId, Target, Transform2d};
use crate::scene::{Scene, Shadow};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapRecord {
    pub piece: PieceId,
    pub neighbor: PieceId,
    pub group: GroupId,
    /// Board-space correction applied to the moved object.
    pub shift: Point,
}

impl<S: Scene> Board<S> {
    /// Snaps `target` to any aligned neighbour. Runs once per drop and after
    /// every finished rotation.
    pub fn attempt_snap(&mut self, target: Target) -> Result<Vec<SnapRecord>, PuzzleError> {
        let target = self.resolve(target)?;
        if self.is_animating(target) {
            return Ok(Vec::new());
        }
        let members = match target {
            Target::Piece(piece) => vec![piece],
            Target::Group(group) => self.group_state(group)?.members.clone(),
        };
        let mut records = Vec::new();
        for piece in members {
            for neighbor in self.grid.neighbors(piece).into_iter().flatten() {
                if let Some(record) = self.try_snap_pair(piece, neighbor)? {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    fn try_snap_pair(
        &mut self,
        piece: PieceId,
        neighbor: PieceId,
    ) -> Result<Option<SnapRecord>, PuzzleError> {
        let own_group = self.piece_state(piece)?.group;
        if own_group.is_some() && own_group == self.piece_state(neighbor)?.group {
            return Ok(None);
        }
        let moved = self.top_level(piece)?;
        if self.is_animating(moved) || self.is_animating(self.top_level(neighbor)?) {
            return Ok(None);
        }
        let rotation = self.absolute_rotation(piece)?;
        if rotation != self.absolute_rotation(neighbor)? {
            return Ok(None);
        }

        let orig_diff =
            self.grid.piece_by_id(piece)?.bounds().min - self.grid.piece_by_id(neighbor)?.bounds().min;
        let cur_diff = self.absolute_corner(piece, Corner::TopLeft)?
            - self.absolute_corner(neighbor, Corner::TopLeft)?;
        let diff = orig_diff - rotation.inverse().apply(cur_diff);
        if diff.x.abs() > self.tolerance || diff.y.abs() > self.tolerance {
            return Ok(None);
        }

        let shift = rotation.apply(diff);
        self.translate(moved, shift)?;
        let group = self.merge_groups(piece, neighbor)?;
        Ok(Some(SnapRecord {
            piece,
            neighbor,
            group,
            shift,
        }))
    }

    /// Joins the groups (or loose pieces) of `a` and `b` into one group.
    /// Both must already be aligned on the board.
    pub fn merge_groups(&mut self, a: PieceId, b: PieceId) -> Result<GroupId, PuzzleError> {
        let rotation = self.absolute_rotation(a)?;
        let group = match (self.piece_state(a)?.group, self.piece_state(b)?.group) {
            (Some(ga), Some(gb)) if ga == gb => return Ok(ga),
            (None, None) => self.regroup(&[a, b], rotation)?,
            (Some(group), None) => {
                self.absorb(group, b)?;
                group
            }
            (None, Some(group)) => {
                self.absorb(group, a)?;
                group
            }
            (Some(ga), Some(gb)) => {
                let mut members = self.group_state(ga)?.members.clone();
                members.extend_from_slice(&self.group_state(gb)?.members);
                let min = self.min_corner(&members)?;
                self.dissolve(ga)?;
                self.dissolve(gb)?;
                self.regroup_at(&members, rotation, min)?
            }
        };

        let state = self.group_state(group)?;
        let handle = state.handle;
        let size = state.members.len();
        let members = state.members.clone();
        self.scene.bring_to_front(handle)?;
        self.scene.set_shadow(handle, Some(Shadow::for_group(size)))?;
        for member in members {
            self.scene.set_shadow(self.pieces[member].handle, None)?;
        }
        debug!("piece {a} joined piece {b} in group {group} ({size} pieces)");
        self.events.push(BoardEvent::Snapped {
            piece: a,
            neighbor: b,
            group,
        });
        if size == self.pieces.len() && !self.completed {
            self.completed = true;
            info!("puzzle complete: all {size} pieces joined");
            self.events.push(BoardEvent::Completed);
        }
        Ok(group)
    }

    fn min_corner(&self, members: &[PieceId]) -> Result<Point, PuzzleError> {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        for member in members {
            for corner in Corner::ALL {
                min = min.min(self.absolute_corner(*member, corner)?);
            }
        }
        Ok(min)
    }

    fn regroup(&mut self, members: &[PieceId], rotation: Rotation) -> Result<GroupId, PuzzleError> {
        let min = self.min_corner(members)?;
        self.regroup_at(members, rotation, min)
    }

    /// Rebuilds a group from loose pieces: lays them out unrotated at their
    /// generated positions, groups them, then turns the group so its rotated
    /// box starts at `min`.
    fn regroup_at(
        &mut self,
        members: &[PieceId],
        rotation: Rotation,
        min: Point,
    ) -> Result<GroupId, PuzzleError> {
        let mut handles = Vec::with_capacity(members.len());
        for member in members {
            let origin = self.grid.piece_by_id(*member)?.bounds().min;
            let state = &mut self.pieces[*member];
            state.rotation = Rotation::Deg0;
            handles.push(state.handle);
            self.scene
                .set_transform(state.handle, Transform2d::placed(origin, Rotation::Deg0))?;
        }
        let handle = self.scene.create_group(&handles)?;
        let size = self.scene.size(handle)?;
        self.scene.set_transform(
            handle,
            Transform2d::placed(rotation.position_for_min(size, min), rotation),
        )?;

        let id = self.groups.len();
        self.groups.push(Some(GroupState {
            handle,
            members: members.to_vec(),
            rotation,
        }));
        for member in members {
            self.pieces[*member].group = Some(id);
        }
        Ok(id)
    }

    fn absorb(&mut self, group: GroupId, piece: PieceId) -> Result<(), PuzzleError> {
        let group_handle = self.group_state(group)?.handle;
        let piece_handle = self.piece_state(piece)?.handle;
        self.scene.add_to_group(group_handle, piece_handle)?;
        self.pieces[piece].group = Some(group);
        self.pieces[piece].rotation = Rotation::Deg0;
        self.group_state_mut(group)?.members.push(piece);
        Ok(())
    }

    fn dissolve(&mut self, group: GroupId) -> Result<(), PuzzleError> {
        let state = self
            .groups
            .get_mut(group)
            .and_then(Option::take)
            .ok_or(PuzzleError::UnknownGroup { id: group })?;
        self.scene.dissolve_group(state.handle)?;
        for member in state.members {
            self.pieces[member].group = None;
            self.pieces[member].rotation = state.rotation;
        }
        Ok(())
    }
}
