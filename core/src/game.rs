use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use crate::geometry::{normalize_angle, Corner, Point, Rect, Size};

pub const PUZZLE_SEED: u32 = 0x5EED_2520;

pub const SNAP_TOLERANCE_RATIO_DEFAULT: f64 = 0.25;
pub const SNAP_TOLERANCE_RATIO_MIN: f64 = 0.01;
pub const SNAP_TOLERANCE_RATIO_MAX: f64 = 0.5;

pub const ROTATION_DURATION_MS_DEFAULT: f64 = 250.0;
const RIGHT_ANGLE_EPS: f64 = 1e-9;

pub const TAB_SIZE_BASE: f64 = 20.0;
pub const TAB_SIZE_SPREAD: f64 = 5.0;
pub const TAB_SIZE_DIV: f64 = 200.0;
pub const JITTER_SPREAD: f64 = 5.0;
pub const JITTER_DIV: f64 = 100.0;

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

pub fn rand_unit(seed: u32, salt: u32) -> f64 {
    let mixed = splitmix32(seed ^ splitmix32(salt));
    let top = mixed >> 8;
    top as f64 / ((1u32 << 24) as f64)
}

pub fn rand_range(seed: u32, salt: u32, min: f64, max: f64) -> f64 {
    min + (max - min) * rand_unit(seed, salt)
}

/// Uniform draw from `[min, max)` truncated to `decimals` places.
pub fn rand_truncated(seed: u32, salt: u32, min: f64, max: f64, decimals: i32) -> f64 {
    let precision = 10f64.powi(decimals);
    let lo = min * precision;
    let hi = max * precision;
    (rand_unit(seed, salt) * (hi - lo) + lo).floor() / precision
}

/// Clockwise quarter turns, with the y axis pointing down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn from_degrees(degrees: f64) -> Result<Self, PuzzleError> {
        if !degrees.is_finite() {
            return Err(PuzzleError::UnsupportedAngle { degrees });
        }
        let normalized = normalize_angle(degrees);
        let turns = (normalized / 90.0).round();
        if (normalized - turns * 90.0).abs() > RIGHT_ANGLE_EPS {
            return Err(PuzzleError::UnsupportedAngle { degrees });
        }
        Ok(Self::from_quarter_turns(turns as i64))
    }

    pub fn quarter_turns(self) -> i64 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> f64 {
        self.quarter_turns() as f64 * 90.0
    }

    pub fn then(self, other: Rotation) -> Rotation {
        Self::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    pub fn inverse(self) -> Rotation {
        Self::from_quarter_turns(-self.quarter_turns())
    }

    pub fn apply(self, v: Point) -> Point {
        match self {
            Rotation::Deg0 => v,
            Rotation::Deg90 => Point::new(-v.y, v.x),
            Rotation::Deg180 => Point::new(-v.x, -v.y),
            Rotation::Deg270 => Point::new(v.y, -v.x),
        }
    }

    /// Local corner of a box that ends up at the minimum of its axis-aligned
    /// bounds once the box is rotated.
    pub fn min_corner(self) -> Corner {
        match self {
            Rotation::Deg0 => Corner::TopLeft,
            Rotation::Deg90 => Corner::BottomLeft,
            Rotation::Deg180 => Corner::BottomRight,
            Rotation::Deg270 => Corner::TopRight,
        }
    }

    /// Position for a box of `size` rotated by `self` whose axis-aligned
    /// bounds start at `min`.
    pub fn position_for_min(self, size: Size, min: Point) -> Point {
        min - self.apply(self.min_corner().offset(size))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationMode {
    #[default]
    Fixed,
    TwoFold,
    FourFold,
}

impl OrientationMode {
    /// Legacy menu index: 0 = no rotation, 1 = north/south, 2 = cardinal.
    pub fn from_index(index: u8) -> Result<Self, PuzzleError> {
        match index {
            0 => Ok(OrientationMode::Fixed),
            1 => Ok(OrientationMode::TwoFold),
            2 => Ok(OrientationMode::FourFold),
            _ => Err(PuzzleError::UnknownOrientation { index }),
        }
    }

    pub fn step(self) -> Option<Rotation> {
        match self {
            OrientationMode::Fixed => None,
            OrientationMode::TwoFold => Some(Rotation::Deg180),
            OrientationMode::FourFold => Some(Rotation::Deg90),
        }
    }

    pub fn allowed(self) -> &'static [Rotation] {
        match self {
            OrientationMode::Fixed => &[Rotation::Deg0],
            OrientationMode::TwoFold => &[Rotation::Deg0, Rotation::Deg180],
            OrientationMode::FourFold => &Rotation::ALL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterSlot {
    /// Minimum of the rotated bounding box.
    pub min: Point,
    pub rotation: Rotation,
}

/// Seeded placement for objects of the given sizes inside `area`, plus a
/// shuffled stacking order.
pub fn scatter_layout(
    seed: u32,
    sizes: &[Size],
    area: Rect,
    allowed: &[Rotation],
) -> (Vec<ScatterSlot>, Vec<usize>) {
    let mut slots = Vec::with_capacity(sizes.len());
    for (id, size) in sizes.iter().enumerate() {
        let salt = (id as u32) << 2;
        let rotation = if allowed.len() > 1 {
            let pick = (rand_unit(seed, 0xC001_u32.wrapping_add(id as u32)) * allowed.len() as f64)
                as usize;
            allowed[pick.min(allowed.len() - 1)]
        } else {
            Rotation::Deg0
        };
        let (extent_x, extent_y) = match rotation {
            Rotation::Deg90 | Rotation::Deg270 => (size.height, size.width),
            Rotation::Deg0 | Rotation::Deg180 => (size.width, size.height),
        };
        let max_x = (area.max.x - extent_x).max(area.min.x);
        let max_y = (area.max.y - extent_y).max(area.min.y);
        let x = rand_range(seed, salt, area.min.x, max_x);
        let y = rand_range(seed, salt + 1, area.min.y, max_y);
        slots.push(ScatterSlot {
            min: Point::new(x, y),
            rotation,
        });
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    for i in (1..order.len()).rev() {
        let salt = 0xC0DE_u32 + i as u32;
        let j = (rand_unit(seed, salt) * (i as f64 + 1.0)) as usize;
        order.swap(i, j.min(i));
    }
    (slots, order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_from_degrees_accepts_right_angles_only() {
        assert_eq!(Rotation::from_degrees(0.0).unwrap(), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees(450.0).unwrap(), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(-90.0).unwrap(), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(360.0).unwrap(), Rotation::Deg0);
        assert!(matches!(
            Rotation::from_degrees(45.0),
            Err(PuzzleError::UnsupportedAngle { .. })
        ));
        assert!(Rotation::from_degrees(f64::NAN).is_err());
    }

    #[test]
    fn rotation_composition() {
        assert_eq!(Rotation::Deg90.then(Rotation::Deg270), Rotation::Deg0);
        assert_eq!(Rotation::Deg270.inverse(), Rotation::Deg90);
        let v = Point::new(2.0, 5.0);
        for rotation in Rotation::ALL {
            assert_eq!(rotation.inverse().apply(rotation.apply(v)), v);
        }
    }

    #[test]
    fn position_for_min_lands_box_on_min() {
        let size = Size::new(30.0, 10.0);
        let min = Point::new(100.0, 50.0);
        for rotation in Rotation::ALL {
            let position = rotation.position_for_min(size, min);
            let lowest = Corner::ALL
                .iter()
                .map(|corner| position + rotation.apply(corner.offset(size)))
                .fold(Point::new(f64::INFINITY, f64::INFINITY), Point::min);
            assert_eq!(lowest, min, "{rotation:?}");
        }
    }

    #[test]
    fn orientation_modes() {
        assert_eq!(OrientationMode::from_index(1).unwrap(), OrientationMode::TwoFold);
        assert!(OrientationMode::from_index(3).is_err());
        assert_eq!(OrientationMode::Fixed.step(), None);
        assert_eq!(OrientationMode::FourFold.allowed().len(), 4);
    }

    #[test]
    fn scatter_stays_inside_area() {
        let sizes = vec![Size::new(40.0, 20.0); 24];
        let area = Rect::from_points(Point::new(0.0, 0.0), Point::new(400.0, 300.0));
        let (slots, order) = scatter_layout(11, &sizes, area, OrientationMode::FourFold.allowed());
        for (slot, size) in slots.iter().zip(&sizes) {
            let position = slot.rotation.position_for_min(*size, slot.min);
            for corner in Corner::ALL {
                let p = position + slot.rotation.apply(corner.offset(*size));
                assert!(p.x >= -1e-9 && p.x <= 400.0 + 1e-9);
                assert!(p.y >= -1e-9 && p.y <= 300.0 + 1e-9);
            }
        }
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..24).collect::<Vec<_>>());
        let (again, _) = scatter_layout(11, &sizes, area, OrientationMode::FourFold.allowed());
        assert_eq!(slots, again);
    }

    #[test]
    fn truncated_draws_stay_in_range() {
        for salt in 0..200 {
            let tab = rand_truncated(7, salt, TAB_SIZE_BASE, TAB_SIZE_BASE + TAB_SIZE_SPREAD, 1);
            assert!((20.0..25.0).contains(&tab));
            let unit = rand_unit(7, salt);
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
