use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::game::Rotation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn min(self, other: Point) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(self, other: Point) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Corners of an object's own (unrotated) bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Offset of this corner from the top-left corner of a box of `size`.
    pub fn offset(self, size: Size) -> Point {
        match self {
            Corner::TopLeft => Point::ZERO,
            Corner::TopRight => Point::new(size.width, 0.0),
            Corner::BottomRight => Point::new(size.width, size.height),
            Corner::BottomLeft => Point::new(0.0, size.height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn corner(&self, corner: Corner) -> Point {
        self.min + corner.offset(self.size())
    }

    pub fn include(&mut self, point: Point) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// The four corner points of a bounding box, clockwise from top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

impl From<Rect> for Corners {
    fn from(rect: Rect) -> Self {
        Self {
            tl: rect.corner(Corner::TopLeft),
            tr: rect.corner(Corner::TopRight),
            br: rect.corner(Corner::BottomRight),
            bl: rect.corner(Corner::BottomLeft),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PathCommand {
    Move { to: Point },
    Line { to: Point },
    Cubic { c1: Point, c2: Point, to: Point },
    Close,
}

impl PathCommand {
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathCommand::Move { to } | PathCommand::Line { to } | PathCommand::Cubic { to, .. } => {
                Some(to)
            }
            PathCommand::Close => None,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::Move { to } => write!(f, "M {} {}", to.x, to.y),
            PathCommand::Line { to } => write!(f, "L {} {}", to.x, to.y),
            PathCommand::Cubic { c1, c2, to } => write!(
                f,
                "C {} {} {} {} {} {}",
                c1.x, c1.y, c2.x, c2.y, to.x, to.y
            ),
            PathCommand::Close => f.write_str("Z"),
        }
    }
}

pub fn path_data(commands: &[PathCommand]) -> String {
    commands
        .iter()
        .map(|command| command.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rounds to two decimals, halves toward positive infinity.
pub fn round_coord(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

pub fn normalize_angle(mut angle: f64) -> f64 {
    angle %= 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Rotates clockwise (y axis pointing down). Right angles are exact.
pub fn rotate_vec(v: Point, angle_deg: f64) -> Point {
    if let Ok(rotation) = Rotation::from_degrees(angle_deg) {
        return rotation.apply(v);
    }
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let uu = u * u;
    let tt = t * t;
    Point::new(
        uu * u * p0.x + 3.0 * uu * t * p1.x + 3.0 * u * tt * p2.x + tt * t * p3.x,
        uu * u * p0.y + 3.0 * uu * t * p1.y + 3.0 * u * tt * p2.y + tt * t * p3.y,
    )
}

/// Parameters in (0, 1) where the derivative of one cubic coordinate vanishes.
fn cubic_extrema(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    // B'(t)/3 = qa t^2 + qb t + qc
    let qa = -a + 3.0 * b - 3.0 * c + d;
    let qb = 2.0 * (a - 2.0 * b + c);
    let qc = b - a;
    let mut roots = Vec::with_capacity(2);
    if qa.abs() < 1e-12 {
        if qb.abs() > 1e-12 {
            roots.push(-qc / qb);
        }
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            roots.push((-qb + sq) / (2.0 * qa));
            roots.push((-qb - sq) / (2.0 * qa));
        }
    }
    roots.retain(|t| *t > 0.0 && *t < 1.0);
    roots
}

pub fn cubic_bounds(p0: Point, p1: Point, p2: Point, p3: Point) -> Rect {
    let mut rect = Rect::from_points(p0, p3);
    for t in cubic_extrema(p0.x, p1.x, p2.x, p3.x)
        .into_iter()
        .chain(cubic_extrema(p0.y, p1.y, p2.y, p3.y))
    {
        rect.include(cubic_point(p0, p1, p2, p3, t));
    }
    rect
}

/// Exact extent of a path, bezier bulges included.
pub fn path_bounds(commands: &[PathCommand]) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    let mut current: Option<Point> = None;
    for command in commands {
        let segment = match *command {
            PathCommand::Move { to } | PathCommand::Line { to } => {
                let rect = match current {
                    Some(from) if matches!(command, PathCommand::Line { .. }) => {
                        Rect::from_points(from, to)
                    }
                    _ => Rect::from_points(to, to),
                };
                current = Some(to);
                rect
            }
            PathCommand::Cubic { c1, c2, to } => {
                let from = current.unwrap_or(to);
                current = Some(to);
                cubic_bounds(from, c1, c2, to)
            }
            PathCommand::Close => continue,
        };
        bounds = Some(match bounds {
            Some(rect) => rect.union(&segment),
            None => segment,
        });
    }
    bounds
}
