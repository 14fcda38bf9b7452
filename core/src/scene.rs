//! Renderer collaborator.
//!
//! The board never touches pixels; it asks a [`Scene`] to create path and
//! group objects, move them and report where their corners ended up.
//! [`MemoryScene`] keeps the whole scene graph in memory and nests group
//! children relative to the group *centre*, the way canvas libraries do, so
//! the engine has to go through [`Scene::absolute_corner`] for any
//! board-space position.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use crate::geometry::{path_data, rotate_vec, Corner, PathCommand, Point, Rect, Size};
use crate::model::Transform2d;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: [u8; 4],
    pub blur: f64,
    pub offset: Point,
}

impl Shadow {
    pub fn resting() -> Self {
        Self {
            color: [0, 0, 0, 96],
            blur: 3.0,
            offset: Point::new(1.0, 1.0),
        }
    }

    pub fn lifted() -> Self {
        Self {
            color: [0, 0, 0, 128],
            blur: 10.0,
            offset: Point::new(4.0, 6.0),
        }
    }

    /// Shadow for a merged group, deeper as the group grows.
    pub fn for_group(members: usize) -> Self {
        let layers = (members.max(1) as f64).sqrt().min(6.0);
        Self {
            color: [0, 0, 0, 112],
            blur: 3.0 + layers * 1.5,
            offset: Point::new(layers, layers),
        }
    }
}

pub trait Scene {
    /// Creates a path object placed at `bounds.min` with angle 0.
    fn create_path(&mut self, outline: &[PathCommand], bounds: Rect) -> ObjectHandle;

    /// Groups top-level objects without moving them visually.
    fn create_group(&mut self, members: &[ObjectHandle]) -> Result<ObjectHandle, PuzzleError>;

    /// Moves `member` into `group`, keeping its visual placement.
    fn add_to_group(&mut self, group: ObjectHandle, member: ObjectHandle) -> Result<(), PuzzleError>;

    /// Removes the group object; its children keep their visual placement.
    fn dissolve_group(&mut self, group: ObjectHandle) -> Result<(), PuzzleError>;

    /// The object's own transform. Board space for top-level objects.
    fn transform(&self, handle: ObjectHandle) -> Result<Transform2d, PuzzleError>;

    fn set_transform(&mut self, handle: ObjectHandle, transform: Transform2d) -> Result<(), PuzzleError>;

    /// Unrotated bounding box size.
    fn size(&self, handle: ObjectHandle) -> Result<Size, PuzzleError>;

    /// Board-space position of a corner of the object's own box, resolved
    /// through any enclosing group.
    fn absolute_corner(&self, handle: ObjectHandle, corner: Corner) -> Result<Point, PuzzleError>;

    fn bring_to_front(&mut self, handle: ObjectHandle) -> Result<(), PuzzleError>;

    fn set_shadow(&mut self, handle: ObjectHandle, shadow: Option<Shadow>) -> Result<(), PuzzleError>;
}

#[derive(Clone, Debug)]
enum ObjectKind {
    Path { outline: Vec<PathCommand>, origin: Point },
    Group { children: Vec<ObjectHandle> },
}

#[derive(Clone, Debug)]
struct SceneObject {
    kind: ObjectKind,
    transform: Transform2d,
    size: Size,
    parent: Option<ObjectHandle>,
    shadow: Option<Shadow>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryScene {
    objects: Vec<Option<SceneObject>>,
    order: Vec<ObjectHandle>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn object(&self, handle: ObjectHandle) -> Result<&SceneObject, PuzzleError> {
        self.objects
            .get(handle.0 as usize)
            .and_then(|entry| entry.as_ref())
            .ok_or(PuzzleError::UnknownObject { handle: handle.0 })
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> Result<&mut SceneObject, PuzzleError> {
        self.objects
            .get_mut(handle.0 as usize)
            .and_then(|entry| entry.as_mut())
            .ok_or(PuzzleError::UnknownObject { handle: handle.0 })
    }

    fn insert(&mut self, object: SceneObject) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(Some(object));
        self.order.push(handle);
        handle
    }

    fn group_children(&self, group: ObjectHandle) -> Result<Vec<ObjectHandle>, PuzzleError> {
        match &self.object(group)?.kind {
            ObjectKind::Group { children } => Ok(children.clone()),
            ObjectKind::Path { .. } => Err(PuzzleError::NotAGroup { handle: group.0 }),
        }
    }

    pub fn absolute_transform(&self, handle: ObjectHandle) -> Result<Transform2d, PuzzleError> {
        let object = self.object(handle)?;
        match object.parent {
            None => Ok(object.transform),
            Some(parent) => {
                let group = self.absolute_transform(parent)?;
                let center = self.object(parent)?.size.center();
                Ok(Transform2d {
                    position: group.apply_to(center + object.transform.position),
                    angle: group.angle + object.transform.angle,
                })
            }
        }
    }

    /// Axis-aligned board-space bounds of the rotated object.
    pub fn absolute_bounds(&self, handle: ObjectHandle) -> Result<Rect, PuzzleError> {
        let transform = self.absolute_transform(handle)?;
        let size = self.object(handle)?.size;
        Ok(placed_bounds(&transform, size))
    }

    pub fn parent(&self, handle: ObjectHandle) -> Result<Option<ObjectHandle>, PuzzleError> {
        Ok(self.object(handle)?.parent)
    }

    pub fn children(&self, handle: ObjectHandle) -> Result<Vec<ObjectHandle>, PuzzleError> {
        self.group_children(handle)
    }

    pub fn shadow(&self, handle: ObjectHandle) -> Result<Option<Shadow>, PuzzleError> {
        Ok(self.object(handle)?.shadow)
    }

    /// Top-level objects, back to front.
    pub fn stacking(&self) -> &[ObjectHandle] {
        &self.order
    }

    pub fn live_objects(&self) -> usize {
        self.objects.iter().filter(|entry| entry.is_some()).count()
    }

    fn root(&self, handle: ObjectHandle) -> Result<ObjectHandle, PuzzleError> {
        match self.object(handle)?.parent {
            Some(parent) => self.root(parent),
            None => Ok(handle),
        }
    }

    /// Pulls a nested object out to the top level at its visual placement.
    fn detach(&mut self, handle: ObjectHandle) -> Result<(), PuzzleError> {
        let Some(parent) = self.object(handle)?.parent else {
            return Ok(());
        };
        let absolute = self.absolute_transform(handle)?;
        if let ObjectKind::Group { children } = &mut self.object_mut(parent)?.kind {
            children.retain(|child| *child != handle);
        }
        let object = self.object_mut(handle)?;
        object.parent = None;
        object.transform = absolute;
        self.order.push(handle);
        Ok(())
    }

    pub fn to_svg(&self, width: f64, height: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
        );
        for handle in &self.order {
            self.write_object(&mut out, *handle, 1);
        }
        out.push_str("</svg>\n");
        out
    }

    fn write_object(&self, out: &mut String, handle: ObjectHandle, depth: usize) {
        let Ok(object) = self.object(handle) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let t = object.transform;
        let filter = object
            .shadow
            .map(|shadow| {
                let [r, g, b, a] = shadow.color;
                format!(
                    r#" style="filter: drop-shadow({}px {}px {}px rgba({r},{g},{b},{:.3}))""#,
                    shadow.offset.x,
                    shadow.offset.y,
                    shadow.blur,
                    a as f64 / 255.0
                )
            })
            .unwrap_or_default();
        match &object.kind {
            ObjectKind::Path { outline, origin } => {
                let _ = writeln!(
                    out,
                    r##"{indent}<path data-handle="{}" d="{}" transform="translate({} {}) rotate({}) translate({} {})" fill="#d8c9a8" stroke="#3a3a3a" stroke-width="1"{filter}/>"##,
                    handle.0,
                    path_data(outline),
                    t.position.x,
                    t.position.y,
                    t.angle,
                    -origin.x,
                    -origin.y,
                );
            }
            ObjectKind::Group { children } => {
                let center = object.size.center();
                let _ = writeln!(
                    out,
                    r#"{indent}<g data-handle="{}" transform="translate({} {}) rotate({}) translate({} {})"{filter}>"#,
                    handle.0, t.position.x, t.position.y, t.angle, center.x, center.y,
                );
                for child in children {
                    self.write_object(out, *child, depth + 1);
                }
                let _ = writeln!(out, "{indent}</g>");
            }
        }
    }
}

fn placed_bounds(transform: &Transform2d, size: Size) -> Rect {
    let first = transform.apply_to(Point::ZERO);
    let mut rect = Rect::from_points(first, first);
    for corner in Corner::ALL {
        rect.include(transform.apply_to(corner.offset(size)));
    }
    rect
}

impl Scene for MemoryScene {
    fn create_path(&mut self, outline: &[PathCommand], bounds: Rect) -> ObjectHandle {
        self.insert(SceneObject {
            kind: ObjectKind::Path {
                outline: outline.to_vec(),
                origin: bounds.min,
            },
            transform: Transform2d {
                position: bounds.min,
                angle: 0.0,
            },
            size: bounds.size(),
            parent: None,
            shadow: None,
        })
    }

    fn create_group(&mut self, members: &[ObjectHandle]) -> Result<ObjectHandle, PuzzleError> {
        let mut placements = Vec::with_capacity(members.len());
        let mut bounds: Option<Rect> = None;
        for member in members {
            self.detach(*member)?;
            let transform = self.object(*member)?.transform;
            let rect = placed_bounds(&transform, self.object(*member)?.size);
            bounds = Some(match bounds {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
            placements.push((*member, transform));
        }
        let rect = bounds.unwrap_or(Rect::from_points(Point::ZERO, Point::ZERO));
        let center = rect.center();
        let group = self.insert(SceneObject {
            kind: ObjectKind::Group {
                children: members.to_vec(),
            },
            transform: Transform2d {
                position: rect.min,
                angle: 0.0,
            },
            size: rect.size(),
            parent: None,
            shadow: None,
        });
        for (member, transform) in placements {
            let object = self.object_mut(member)?;
            object.parent = Some(group);
            object.transform = Transform2d {
                position: transform.position - center,
                angle: transform.angle,
            };
        }
        self.order.retain(|handle| !members.contains(handle));
        Ok(group)
    }

    fn add_to_group(&mut self, group: ObjectHandle, member: ObjectHandle) -> Result<(), PuzzleError> {
        let children = self.group_children(group)?;
        if children.contains(&member) {
            return Ok(());
        }
        self.detach(member)?;
        let group_transform = self.absolute_transform(group)?;
        let center = self.object(group)?.size.center();

        // Placements in the group's unrotated top-left frame.
        let mut locals = Vec::with_capacity(children.len() + 1);
        for child in &children {
            let t = self.object(*child)?.transform;
            locals.push((
                *child,
                Transform2d {
                    position: center + t.position,
                    angle: t.angle,
                },
            ));
        }
        let absolute = self.object(member)?.transform;
        locals.push((
            member,
            Transform2d {
                position: rotate_vec(absolute.position - group_transform.position, -group_transform.angle),
                angle: absolute.angle - group_transform.angle,
            },
        ));

        let mut bounds: Option<Rect> = None;
        for (handle, local) in &locals {
            let rect = placed_bounds(local, self.object(*handle)?.size);
            bounds = Some(match bounds {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
        }
        let rect = bounds.unwrap_or(Rect::from_points(Point::ZERO, Point::ZERO));
        let new_center = rect.size().center();

        let group_object = self.object_mut(group)?;
        group_object.transform.position = group_transform.apply_to(rect.min);
        group_object.size = rect.size();
        if let ObjectKind::Group { children } = &mut group_object.kind {
            children.push(member);
        }
        for (handle, local) in locals {
            let object = self.object_mut(handle)?;
            object.parent = Some(group);
            object.transform = Transform2d {
                position: local.position - rect.min - new_center,
                angle: local.angle,
            };
        }
        self.order.retain(|handle| *handle != member);
        Ok(())
    }

    fn dissolve_group(&mut self, group: ObjectHandle) -> Result<(), PuzzleError> {
        let children = self.group_children(group)?;
        let mut placements = Vec::with_capacity(children.len());
        for child in &children {
            placements.push((*child, self.absolute_transform(*child)?));
        }
        for (child, transform) in placements {
            let object = self.object_mut(child)?;
            object.parent = None;
            object.transform = transform;
        }
        let slot = self.order.iter().position(|handle| *handle == group);
        let at = slot.unwrap_or(self.order.len());
        if slot.is_some() {
            self.order.remove(at);
        }
        self.order.splice(at..at, children);
        self.objects[group.0 as usize] = None;
        Ok(())
    }

    fn transform(&self, handle: ObjectHandle) -> Result<Transform2d, PuzzleError> {
        Ok(self.object(handle)?.transform)
    }

    fn set_transform(&mut self, handle: ObjectHandle, transform: Transform2d) -> Result<(), PuzzleError> {
        self.object_mut(handle)?.transform = transform;
        Ok(())
    }

    fn size(&self, handle: ObjectHandle) -> Result<Size, PuzzleError> {
        Ok(self.object(handle)?.size)
    }

    fn absolute_corner(&self, handle: ObjectHandle, corner: Corner) -> Result<Point, PuzzleError> {
        let transform = self.absolute_transform(handle)?;
        Ok(transform.apply_to(corner.offset(self.object(handle)?.size)))
    }

    fn bring_to_front(&mut self, handle: ObjectHandle) -> Result<(), PuzzleError> {
        let root = self.root(handle)?;
        self.order.retain(|entry| *entry != root);
        self.order.push(root);
        Ok(())
    }

    fn set_shadow(&mut self, handle: ObjectHandle, shadow: Option<Shadow>) -> Result<(), PuzzleError> {
        self.object_mut(handle)?.shadow = shadow;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(scene: &mut MemoryScene, x: f64, y: f64, side: f64) -> ObjectHandle {
        let rect = Rect::from_points(Point::new(x, y), Point::new(x + side, y + side));
        let outline = [
            PathCommand::Move { to: rect.min },
            PathCommand::Line {
                to: Point::new(rect.max.x, rect.min.y),
            },
            PathCommand::Line { to: rect.max },
            PathCommand::Close,
        ];
        scene.create_path(&outline, rect)
    }

    fn assert_point_eq(a: Point, b: Point) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    }

    #[test]
    fn group_children_nest_around_center() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        let group = scene.create_group(&[a, b]).unwrap();

        assert_eq!(scene.transform(group).unwrap().position, Point::ZERO);
        assert_eq!(scene.size(group).unwrap(), Size::new(20.0, 10.0));
        // Child offsets are relative to the group centre (10, 5).
        assert_eq!(scene.transform(a).unwrap().position, Point::new(-10.0, -5.0));
        assert_point_eq(
            scene.absolute_corner(b, Corner::TopLeft).unwrap(),
            Point::new(10.0, 0.0),
        );
        assert_eq!(scene.stacking(), &[group]);
    }

    #[test]
    fn rotated_group_resolves_child_corners() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        let group = scene.create_group(&[a, b]).unwrap();
        scene
            .set_transform(group, Transform2d::new(100.0, 100.0, 90.0))
            .unwrap();
        // Local (10, 0) turns to (0, 10) under a clockwise quarter turn.
        assert_point_eq(
            scene.absolute_corner(b, Corner::TopLeft).unwrap(),
            Point::new(100.0, 110.0),
        );
        let bounds = scene.absolute_bounds(group).unwrap();
        assert_point_eq(bounds.min, Point::new(90.0, 100.0));
    }

    #[test]
    fn add_to_rotated_group_keeps_placement() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        let group = scene.create_group(&[a, b]).unwrap();
        scene
            .set_transform(group, Transform2d::new(50.0, 20.0, 180.0))
            .unwrap();
        let a_before = scene.absolute_corner(a, Corner::TopLeft).unwrap();

        let c = square(&mut scene, 60.0, 60.0, 10.0);
        scene
            .set_transform(c, Transform2d::new(40.0, 30.0, 180.0))
            .unwrap();
        let c_before = scene.absolute_corner(c, Corner::BottomRight).unwrap();
        scene.add_to_group(group, c).unwrap();

        assert_point_eq(scene.absolute_corner(a, Corner::TopLeft).unwrap(), a_before);
        assert_point_eq(scene.absolute_corner(c, Corner::BottomRight).unwrap(), c_before);
        assert_eq!(scene.parent(c).unwrap(), Some(group));
        assert_eq!(scene.children(group).unwrap().len(), 3);
        assert_relative_eq!(scene.transform(group).unwrap().angle, 180.0);
    }

    #[test]
    fn dissolve_restores_absolute_transforms() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        let group = scene.create_group(&[a, b]).unwrap();
        scene
            .set_transform(group, Transform2d::new(30.0, 0.0, 90.0))
            .unwrap();
        let corner = scene.absolute_corner(b, Corner::TopLeft).unwrap();
        scene.dissolve_group(group).unwrap();

        assert_eq!(scene.parent(b).unwrap(), None);
        assert_point_eq(scene.absolute_corner(b, Corner::TopLeft).unwrap(), corner);
        assert_relative_eq!(scene.transform(b).unwrap().angle, 90.0);
        assert!(scene.transform(group).is_err());
        assert_eq!(scene.stacking(), &[a, b]);
    }

    #[test]
    fn bring_to_front_lifts_root() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        let c = square(&mut scene, 30.0, 0.0, 10.0);
        let group = scene.create_group(&[a, b]).unwrap();
        scene.bring_to_front(c).unwrap();
        scene.bring_to_front(a).unwrap();
        assert_eq!(scene.stacking(), &[c, group]);
    }

    #[test]
    fn svg_contains_every_path() {
        let mut scene = MemoryScene::new();
        let a = square(&mut scene, 0.0, 0.0, 10.0);
        let b = square(&mut scene, 10.0, 0.0, 10.0);
        scene.create_group(&[a]).unwrap();
        scene.set_shadow(b, Some(Shadow::lifted())).unwrap();
        let svg = scene.to_svg(20.0, 10.0);
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("<g "));
        assert!(svg.contains("drop-shadow"));
    }
}
