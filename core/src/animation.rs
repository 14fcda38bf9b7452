use crate::game::Rotation;
use crate::geometry::{rotate_vec, Point};
use crate::model::{Target, Transform2d};
use crate::scene::ObjectHandle;

pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Quarter-turn tween of one top-level object about a fixed pivot.
#[derive(Clone, Debug)]
pub struct RotationAnimation {
    pub target: Target,
    pub handle: ObjectHandle,
    pub elapsed: f64,
    pub duration: f64,
    pub start: Transform2d,
    /// Pivot as an offset from the object's own top-left corner.
    pub pivot: Point,
    pub from: Rotation,
    pub to: Rotation,
    delta: f64,
}

impl RotationAnimation {
    pub fn new(
        target: Target,
        handle: ObjectHandle,
        start: Transform2d,
        pivot: Point,
        from: Rotation,
        step: Rotation,
        duration: f64,
    ) -> Self {
        Self {
            target,
            handle,
            elapsed: 0.0,
            duration,
            start,
            pivot,
            from,
            to: from.then(step),
            delta: step.degrees(),
        }
    }

    pub fn advance(&mut self, dt_ms: f64) {
        self.elapsed += dt_ms.max(0.0);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        smoothstep(self.elapsed / self.duration)
    }

    fn pivot_on_board(&self) -> Point {
        self.start.apply_to(self.pivot)
    }

    /// Placement at the current eased progress.
    pub fn current(&self) -> Transform2d {
        let angle = self.start.angle + self.delta * self.progress();
        Transform2d {
            position: self.pivot_on_board() - rotate_vec(self.pivot, angle),
            angle,
        }
    }

    /// Placement at the exact target right angle.
    pub fn final_transform(&self) -> Transform2d {
        Transform2d {
            position: self.pivot_on_board() - self.to.apply(self.pivot),
            angle: self.to.degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pivot_stays_fixed_through_the_turn() {
        let start = Transform2d::new(10.0, 20.0, 0.0);
        let pivot = Point::new(30.0, 15.0);
        let mut animation = RotationAnimation::new(
            Target::Piece(0),
            ObjectHandle(0),
            start,
            pivot,
            Rotation::Deg0,
            Rotation::Deg90,
            200.0,
        );
        let fixed = start.apply_to(pivot);
        for _ in 0..4 {
            animation.advance(50.0);
            let t = animation.current();
            let p = t.apply_to(pivot);
            assert_relative_eq!(p.x, fixed.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, fixed.y, epsilon = 1e-9);
        }
        assert!(animation.is_finished());
        let end = animation.final_transform();
        assert_eq!(end.angle, 90.0);
        assert_eq!(end.apply_to(pivot), fixed);
    }

    #[test]
    fn progress_eases() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!(smoothstep(0.25) < 0.25);
    }
}
