//! One play session: the generated grid, its scene objects and the mutable
//! piece/group state the player manipulates.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::animation::RotationAnimation;
use crate::config::{validate_duration, validate_snap_ratio, PuzzleConfig};
use crate::error::PuzzleError;
use crate::game::{scatter_layout, OrientationMode, Rotation};
use crate::geometry::{Corner, Point, Rect};
use crate::model::{GroupId, GroupState, PieceId, PieceState, Target, Transform2d};
use crate::piece::Grid;
use crate::scene::{ObjectHandle, Scene, Shadow};
use crate::snap::SnapRecord;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardSettings {
    pub orientation: OrientationMode,
    pub snap_tolerance_ratio: f64,
    pub rotation_duration_ms: f64,
}

impl BoardSettings {
    pub fn validate(&self) -> Result<(), PuzzleError> {
        validate_snap_ratio(self.snap_tolerance_ratio)?;
        validate_duration(self.rotation_duration_ms)
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self::from(&PuzzleConfig::default())
    }
}

impl From<&PuzzleConfig> for BoardSettings {
    fn from(config: &PuzzleConfig) -> Self {
        Self {
            orientation: config.orientation,
            snap_tolerance_ratio: config.snap_tolerance_ratio,
            rotation_duration_ms: config.rotation_duration_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    Snapped {
        piece: PieceId,
        neighbor: PieceId,
        group: GroupId,
    },
    RotationFinished {
        target: Target,
        rotation: Rotation,
    },
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationRejection {
    /// Orientation mode does not allow rotating.
    Fixed,
    InProgress,
    ZoomPreview,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationRequest {
    Started,
    Rejected(RotationRejection),
}

pub struct Board<S: Scene> {
    pub(crate) grid: Grid,
    pub(crate) scene: S,
    pub(crate) settings: BoardSettings,
    pub(crate) tolerance: f64,
    pub(crate) pieces: Vec<PieceState>,
    pub(crate) groups: Vec<Option<GroupState>>,
    // Targets are remembered by one member piece; group ids do not survive
    // a merge of two groups.
    selection: Vec<PieceId>,
    zoom: Option<PieceId>,
    pub(crate) animations: Vec<RotationAnimation>,
    pub(crate) events: Vec<BoardEvent>,
    pub(crate) completed: bool,
}

impl<S: Scene> Board<S> {
    /// Creates one resting path object per piece at its generated position.
    pub fn new(grid: Grid, mut scene: S, settings: BoardSettings) -> Result<Self, PuzzleError> {
        settings.validate()?;
        let mut pieces = Vec::with_capacity(grid.len());
        for piece in grid.pieces() {
            let handle = scene.create_path(&piece.outline(), piece.bounds());
            scene.set_shadow(handle, Some(Shadow::resting()))?;
            pieces.push(PieceState {
                handle,
                group: None,
                rotation: Rotation::Deg0,
            });
        }
        let tolerance = grid.snap_tolerance(settings.snap_tolerance_ratio);
        debug!(
            "board ready with {} pieces, snap tolerance {:.2}",
            pieces.len(),
            tolerance
        );
        Ok(Self {
            grid,
            scene,
            settings,
            tolerance,
            pieces,
            groups: Vec::new(),
            selection: Vec::new(),
            zoom: None,
            animations: Vec::new(),
            events: Vec::new(),
            completed: false,
        })
    }

    pub fn from_config(config: &PuzzleConfig, scene: S) -> Result<Self, PuzzleError> {
        config.validate()?;
        let grid = Grid::generate(config.width, config.height, config.rows, config.cols, config.seed)?;
        Self::new(grid, scene, BoardSettings::from(config))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Snap tolerance in board units.
    pub fn snap_tolerance(&self) -> f64 {
        self.tolerance
    }

    pub(crate) fn piece_state(&self, piece: PieceId) -> Result<&PieceState, PuzzleError> {
        self.pieces
            .get(piece)
            .ok_or(PuzzleError::UnknownPiece { id: piece })
    }

    pub(crate) fn group_state(&self, group: GroupId) -> Result<&GroupState, PuzzleError> {
        self.groups
            .get(group)
            .and_then(|entry| entry.as_ref())
            .ok_or(PuzzleError::UnknownGroup { id: group })
    }

    pub(crate) fn group_state_mut(&mut self, group: GroupId) -> Result<&mut GroupState, PuzzleError> {
        self.groups
            .get_mut(group)
            .and_then(|entry| entry.as_mut())
            .ok_or(PuzzleError::UnknownGroup { id: group })
    }

    pub fn group_of(&self, piece: PieceId) -> Result<Option<GroupId>, PuzzleError> {
        Ok(self.piece_state(piece)?.group)
    }

    pub fn group_members(&self, group: GroupId) -> Result<&[PieceId], PuzzleError> {
        Ok(&self.group_state(group)?.members)
    }

    pub fn group_count(&self) -> usize {
        self.groups.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &GroupState)> {
        self.groups
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| entry.as_ref().map(|group| (id, group)))
    }

    /// The object that moves when `piece` is grabbed.
    pub fn top_level(&self, piece: PieceId) -> Result<Target, PuzzleError> {
        Ok(match self.piece_state(piece)?.group {
            Some(group) => Target::Group(group),
            None => Target::Piece(piece),
        })
    }

    /// Re-resolves a target that may have been absorbed into a group.
    pub fn resolve(&self, target: Target) -> Result<Target, PuzzleError> {
        match target {
            Target::Piece(piece) => self.top_level(piece),
            Target::Group(group) => {
                self.group_state(group)?;
                Ok(target)
            }
        }
    }

    fn representative(&self, target: Target) -> Result<PieceId, PuzzleError> {
        match target {
            Target::Piece(piece) => {
                self.piece_state(piece)?;
                Ok(piece)
            }
            Target::Group(group) => self
                .group_state(group)?
                .members
                .first()
                .copied()
                .ok_or(PuzzleError::UnknownGroup { id: group }),
        }
    }

    pub(crate) fn handle_of(&self, target: Target) -> Result<ObjectHandle, PuzzleError> {
        match target {
            Target::Piece(piece) => Ok(self.piece_state(piece)?.handle),
            Target::Group(group) => Ok(self.group_state(group)?.handle),
        }
    }

    fn target_rotation(&self, target: Target) -> Result<Rotation, PuzzleError> {
        match target {
            Target::Piece(piece) => Ok(self.piece_state(piece)?.rotation),
            Target::Group(group) => Ok(self.group_state(group)?.rotation),
        }
    }

    /// Rotation on the board, group included.
    pub fn absolute_rotation(&self, piece: PieceId) -> Result<Rotation, PuzzleError> {
        let state = self.piece_state(piece)?;
        match state.group {
            Some(group) => Ok(self.group_state(group)?.rotation.then(state.rotation)),
            None => Ok(state.rotation),
        }
    }

    pub fn absolute_corner(&self, piece: PieceId, corner: Corner) -> Result<Point, PuzzleError> {
        self.scene
            .absolute_corner(self.piece_state(piece)?.handle, corner)
    }

    pub fn is_complete(&self) -> bool {
        if self.pieces.len() == 1 {
            return true;
        }
        self.groups()
            .any(|(_, group)| group.members.len() == self.pieces.len())
    }

    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_animating(&self, target: Target) -> bool {
        self.animations
            .iter()
            .any(|animation| animation.target == target)
    }

    pub fn rotation_in_progress(&self) -> bool {
        !self.animations.is_empty()
    }

    /// Picks up an object. Returns false while it is rotating.
    pub fn begin_drag(&mut self, target: Target) -> Result<bool, PuzzleError> {
        let target = self.resolve(target)?;
        if self.is_animating(target) {
            debug!("drag of {target:?} refused while rotating");
            return Ok(false);
        }
        let handle = self.handle_of(target)?;
        self.scene.bring_to_front(handle)?;
        self.scene.set_shadow(handle, Some(Shadow::lifted()))?;
        Ok(true)
    }

    pub fn drag_by(&mut self, target: Target, delta: Point) -> Result<(), PuzzleError> {
        let target = self.resolve(target)?;
        if self.is_animating(target) {
            return Ok(());
        }
        self.translate(target, delta)
    }

    pub(crate) fn translate(&mut self, target: Target, delta: Point) -> Result<(), PuzzleError> {
        let handle = self.handle_of(target)?;
        let transform = self.scene.transform(handle)?;
        self.scene.set_transform(handle, transform.translated(delta))
    }

    pub(crate) fn resting_shadow(&self, target: Target) -> Result<Shadow, PuzzleError> {
        Ok(match target {
            Target::Piece(_) => Shadow::resting(),
            Target::Group(group) => Shadow::for_group(self.group_state(group)?.members.len()),
        })
    }

    /// Puts an object down and tries to snap it to its neighbours.
    pub fn drop_target(&mut self, target: Target) -> Result<Vec<SnapRecord>, PuzzleError> {
        let target = self.resolve(target)?;
        let shadow = self.resting_shadow(target)?;
        let handle = self.handle_of(target)?;
        self.scene.set_shadow(handle, Some(shadow))?;
        self.attempt_snap(target)
    }

    /// Moves a loose piece so its rotated box starts at `min`.
    pub fn place_piece(
        &mut self,
        piece: PieceId,
        min: Point,
        rotation: Rotation,
    ) -> Result<(), PuzzleError> {
        let state = *self.piece_state(piece)?;
        if state.group.is_some() {
            warn!("place_piece called on grouped piece {piece}");
            return Err(PuzzleError::PieceGrouped { id: piece });
        }
        if !self.settings.orientation.allowed().contains(&rotation) {
            return Err(PuzzleError::UnsupportedAngle {
                degrees: rotation.degrees(),
            });
        }
        let size = self.scene.size(state.handle)?;
        self.scene.set_transform(
            state.handle,
            Transform2d::placed(rotation.position_for_min(size, min), rotation),
        )?;
        self.pieces[piece].rotation = rotation;
        Ok(())
    }

    /// Seeded placement of every loose piece inside `area`, using the
    /// rotations the orientation mode allows.
    pub fn scatter(&mut self, seed: u32, area: Rect) -> Result<(), PuzzleError> {
        let loose: Vec<PieceId> = (0..self.pieces.len())
            .filter(|piece| {
                self.pieces[*piece].group.is_none() && !self.is_animating(Target::Piece(*piece))
            })
            .collect();
        let mut sizes = Vec::with_capacity(loose.len());
        for piece in &loose {
            sizes.push(self.scene.size(self.pieces[*piece].handle)?);
        }
        let (slots, order) =
            scatter_layout(seed, &sizes, area, self.settings.orientation.allowed());
        for (piece, slot) in loose.iter().zip(&slots) {
            self.place_piece(*piece, slot.min, slot.rotation)?;
        }
        for index in order {
            if let Some(piece) = loose.get(index) {
                self.scene.bring_to_front(self.pieces[*piece].handle)?;
            }
        }
        debug!("scattered {} loose pieces with seed {seed:#x}", loose.len());
        Ok(())
    }

    /// Starts or ends the zoom preview of `target`. Only one object is
    /// previewed at a time; enabling another while one is active is ignored.
    /// Returns whether `target` is previewed afterwards.
    pub fn set_zoom_preview(&mut self, target: Target, enabled: bool) -> Result<bool, PuzzleError> {
        let target = self.resolve(target)?;
        let active = self.zoom_preview();
        if enabled {
            match active {
                None => self.zoom = Some(self.representative(target)?),
                Some(current) if current != target => {
                    debug!("zoom of {target:?} ignored while {current:?} is previewed");
                }
                Some(_) => {}
            }
        } else if active == Some(target) {
            self.zoom = None;
        }
        Ok(self.zoom_preview() == Some(target))
    }

    pub fn zoom_preview(&self) -> Option<Target> {
        self.zoom.and_then(|piece| self.top_level(piece).ok())
    }

    /// Starts a quarter or half turn of the object, depending on the
    /// orientation mode.
    pub fn request_rotation(&mut self, target: Target) -> Result<RotationRequest, PuzzleError> {
        let target = self.resolve(target)?;
        let Some(step) = self.settings.orientation.step() else {
            return Ok(RotationRequest::Rejected(RotationRejection::Fixed));
        };
        if self.is_animating(target) {
            return Ok(RotationRequest::Rejected(RotationRejection::InProgress));
        }
        if self.zoom_preview() == Some(target) {
            return Ok(RotationRequest::Rejected(RotationRejection::ZoomPreview));
        }
        let handle = self.handle_of(target)?;
        let start = self.scene.transform(handle)?;
        let pivot = match target {
            Target::Piece(piece) => self.grid.piece_by_id(piece)?.pivot(),
            Target::Group(_) => self.scene.size(handle)?.center(),
        };
        let animation = RotationAnimation::new(
            target,
            handle,
            start,
            pivot,
            self.target_rotation(target)?,
            step,
            self.settings.rotation_duration_ms,
        );
        if animation.is_finished() {
            self.finish_rotation(animation)?;
        } else {
            self.animations.push(animation);
        }
        Ok(RotationRequest::Started)
    }

    /// Advances running rotations by `dt_ms` milliseconds.
    pub fn tick(&mut self, dt_ms: f64) -> Result<(), PuzzleError> {
        for animation in &mut self.animations {
            animation.advance(dt_ms);
            if !animation.is_finished() {
                self.scene.set_transform(animation.handle, animation.current())?;
            }
        }
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.animations)
            .into_iter()
            .partition(RotationAnimation::is_finished);
        self.animations = running;
        for animation in done {
            self.finish_rotation(animation)?;
        }
        Ok(())
    }

    fn finish_rotation(&mut self, animation: RotationAnimation) -> Result<(), PuzzleError> {
        self.scene
            .set_transform(animation.handle, animation.final_transform())?;
        match animation.target {
            Target::Piece(piece) => {
                if let Some(state) = self.pieces.get_mut(piece) {
                    state.rotation = animation.to;
                }
            }
            Target::Group(group) => self.group_state_mut(group)?.rotation = animation.to,
        }
        debug!("{:?} turned to {:?}", animation.target, animation.to);
        self.events.push(BoardEvent::RotationFinished {
            target: animation.target,
            rotation: animation.to,
        });
        self.attempt_snap(animation.target)?;
        Ok(())
    }

    /// Adds or removes a target from the multi-selection. Returns whether
    /// it is selected afterwards.
    pub fn toggle_selection(&mut self, target: Target) -> Result<bool, PuzzleError> {
        let target = self.resolve(target)?;
        let before = self.selection.len();
        let mut kept = Vec::with_capacity(before);
        for piece in &self.selection {
            if self.top_level(*piece)? != target {
                kept.push(*piece);
            }
        }
        let removed = kept.len() != before;
        self.selection = kept;
        if removed {
            return Ok(false);
        }
        let piece = self.representative(target)?;
        self.selection.push(piece);
        Ok(true)
    }

    /// Selected objects, resolved to their current top-level object.
    pub fn selection(&self) -> Vec<Target> {
        let mut resolved: Vec<Target> = Vec::with_capacity(self.selection.len());
        for piece in &self.selection {
            if let Ok(target) = self.top_level(*piece) {
                if !resolved.contains(&target) {
                    resolved.push(target);
                }
            }
        }
        resolved
    }

    pub fn move_selection(&mut self, delta: Point) -> Result<(), PuzzleError> {
        for target in self.selection() {
            if !self.is_animating(target) {
                self.translate(target, delta)?;
            }
        }
        Ok(())
    }

    pub fn drop_selection(&mut self) -> Result<Vec<SnapRecord>, PuzzleError> {
        let mut records = Vec::new();
        for piece in self.selection.clone() {
            // Earlier drops in this loop may have merged it into a new group.
            let target = self.top_level(piece)?;
            records.extend(self.drop_target(target)?);
        }
        Ok(records)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;

    fn board() -> Board<MemoryScene> {
        let grid = Grid::generate(300.0, 100.0, 1, 3, 4).unwrap();
        Board::new(grid, MemoryScene::new(), BoardSettings::default()).unwrap()
    }

    #[test]
    fn failed_toggle_keeps_the_selection() {
        let mut board = board();
        assert!(board.toggle_selection(Target::Piece(0)).unwrap());
        assert!(board.toggle_selection(Target::Piece(2)).unwrap());
        board.selection.push(99);

        assert_eq!(
            board.toggle_selection(Target::Piece(1)).unwrap_err(),
            PuzzleError::UnknownPiece { id: 99 }
        );
        assert_eq!(board.selection, vec![0, 2, 99]);
    }

    #[test]
    fn toggle_removes_a_selected_target() {
        let mut board = board();
        board.toggle_selection(Target::Piece(0)).unwrap();
        board.toggle_selection(Target::Piece(1)).unwrap();
        assert!(!board.toggle_selection(Target::Piece(0)).unwrap());
        assert_eq!(board.selection(), vec![Target::Piece(1)]);
    }
}
