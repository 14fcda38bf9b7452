//! Seeded jigsaw edge curves.
//!
//! Every internal edge is described by an [`EdgeProfile`] drawn from the
//! puzzle seed and its grid location, turned into ten rounded waypoints and
//! stored once as an [`EdgeCurve`]. Both pieces bordering the edge hold an
//! [`EdgeRef`] to the same allocation, one walking it forward and the other in
//! reverse, so their outlines coincide exactly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::{
    rand_range, rand_truncated, rand_unit, JITTER_DIV, JITTER_SPREAD, TAB_SIZE_BASE,
    TAB_SIZE_DIV, TAB_SIZE_SPREAD,
};
use crate::geometry::{round_coord, PathCommand, Point};

pub const WAYPOINT_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeAxis {
    /// Runs left to right, between two rows.
    Horizontal,
    /// Runs top to bottom, between two columns.
    Vertical,
}

impl EdgeAxis {
    fn salt(self) -> u32 {
        match self {
            EdgeAxis::Horizontal => 0,
            EdgeAxis::Vertical => 1,
        }
    }
}

pub fn edge_seed(base: u32, axis: EdgeAxis, line: u32, index: u32) -> u32 {
    base ^ axis.salt().wrapping_add(1).wrapping_mul(0x9E37_79B9)
        ^ line.wrapping_mul(0x85EB_CA6B)
        ^ index.wrapping_mul(0xC2B2_AE35)
}

#[derive(Clone, Copy, Debug)]
struct EdgeDraw {
    flip: bool,
    tab: f64,
    jitter: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
}

fn edge_draw(seed: u32) -> EdgeDraw {
    let flip = rand_unit(seed, 0) > 0.5;
    let tab = rand_truncated(seed, 1, TAB_SIZE_BASE, TAB_SIZE_BASE + TAB_SIZE_SPREAD, 1)
        / TAB_SIZE_DIV;
    let jitter = rand_truncated(seed, 2, 0.0, JITTER_SPREAD, 1) / JITTER_DIV;
    EdgeDraw {
        flip,
        tab,
        jitter,
        b: rand_range(seed, 3, -jitter, jitter),
        c: rand_range(seed, 4, -jitter, jitter),
        d: rand_range(seed, 5, -jitter, jitter),
        e: rand_range(seed, 6, -jitter, jitter),
    }
}

/// Shape parameters of one internal edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeProfile {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    /// Tab size as a fraction of the edge length.
    pub tab: f64,
    pub jitter: f64,
    /// Tab points toward negative `w` when set.
    pub flip: bool,
}

impl EdgeProfile {
    /// Profile of the edge at `index` along grid line `line`.
    ///
    /// The lead-in `a` is carried over from the tail `e` of the draw one step
    /// back along the same line, so neighbouring edges join smoothly.
    pub fn generate(seed: u32, axis: EdgeAxis, line: u32, index: u32) -> Self {
        let lead = edge_draw(edge_seed(seed, axis, line, index));
        let own = edge_draw(edge_seed(seed, axis, line, index.wrapping_add(1)));
        let a = if own.flip == lead.flip { -lead.e } else { lead.e };
        Self {
            a,
            b: own.b,
            c: own.c,
            d: own.d,
            e: own.e,
            tab: own.tab,
            jitter: own.jitter,
            flip: own.flip,
        }
    }
}

/// Cell placement an edge is laid out in.
///
/// `long` runs along the edge and `wide` across it; for horizontal edges
/// that is (x, y), for vertical edges (y, x). `depth` is the cell size
/// across the edge and scales the tab.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeFrame {
    pub axis: EdgeAxis,
    pub long_start: f64,
    pub long_end: f64,
    pub wide: f64,
    pub depth: f64,
}

impl EdgeFrame {
    // Exact at both ends so edges meeting at a grid corner agree bit for bit.
    fn l(&self, v: f64) -> f64 {
        round_coord(self.long_start * (1.0 - v) + self.long_end * v)
    }

    fn w(&self, v: f64, flip: bool) -> f64 {
        let sign = if flip { -1.0 } else { 1.0 };
        round_coord(self.wide + self.depth * v * sign)
    }

    fn point(&self, l: f64, w: f64) -> Point {
        match self.axis {
            EdgeAxis::Horizontal => Point::new(l, w),
            EdgeAxis::Vertical => Point::new(w, l),
        }
    }

    pub fn start(&self) -> Point {
        self.point(self.l(0.0), self.w(0.0, false))
    }

    pub fn end(&self) -> Point {
        self.point(self.l(1.0), self.w(0.0, false))
    }
}

pub fn waypoints(profile: &EdgeProfile, frame: &EdgeFrame) -> [Point; WAYPOINT_COUNT] {
    let EdgeProfile {
        a,
        b,
        c,
        d,
        e,
        tab: t,
        flip,
        ..
    } = *profile;
    let p = |l: f64, w: f64| frame.point(frame.l(l), frame.w(w, flip));
    [
        p(0.0, 0.0),
        p(0.2, a),
        p(0.5 + b + d, -t + c),
        p(0.5 - t + b, t + c),
        p(0.5 - 2.0 * t + b - d, 3.0 * t + c),
        p(0.5 + 2.0 * t + b - d, 3.0 * t + c),
        p(0.5 + t + b, t + c),
        p(0.5 + b + d, -t + c),
        p(0.8, e),
        p(1.0, 0.0),
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeCurve {
    /// Puzzle border, `[from, to]`.
    Straight { ends: [Point; 2] },
    Tabbed {
        profile: EdgeProfile,
        waypoints: [Point; WAYPOINT_COUNT],
    },
}

impl EdgeCurve {
    pub fn straight(frame: &EdgeFrame) -> Self {
        EdgeCurve::Straight {
            ends: [frame.start(), frame.end()],
        }
    }

    pub fn tabbed(profile: EdgeProfile, frame: &EdgeFrame) -> Self {
        EdgeCurve::Tabbed {
            profile,
            waypoints: waypoints(&profile, frame),
        }
    }

    /// Points in generation order.
    pub fn points(&self) -> &[Point] {
        match self {
            EdgeCurve::Straight { ends } => ends,
            EdgeCurve::Tabbed { waypoints, .. } => waypoints,
        }
    }

    pub fn profile(&self) -> Option<&EdgeProfile> {
        match self {
            EdgeCurve::Straight { .. } => None,
            EdgeCurve::Tabbed { profile, .. } => Some(profile),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    Forward,
    Reverse,
}

/// One piece's view of a shared edge curve.
#[derive(Clone, Debug)]
pub struct EdgeRef {
    curve: Arc<EdgeCurve>,
    traversal: Traversal,
}

impl EdgeRef {
    pub fn forward(curve: Arc<EdgeCurve>) -> Self {
        Self {
            curve,
            traversal: Traversal::Forward,
        }
    }

    pub fn reverse(curve: Arc<EdgeCurve>) -> Self {
        Self {
            curve,
            traversal: Traversal::Reverse,
        }
    }

    pub fn curve(&self) -> &EdgeCurve {
        &self.curve
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    pub fn is_border(&self) -> bool {
        matches!(*self.curve, EdgeCurve::Straight { .. })
    }

    /// True when both refs point at the same stored curve.
    pub fn shares_curve(&self, other: &EdgeRef) -> bool {
        Arc::ptr_eq(&self.curve, &other.curve)
    }

    /// Points in the order this piece walks them.
    pub fn points(&self) -> Vec<Point> {
        let points = self.curve.points();
        match self.traversal {
            Traversal::Forward => points.to_vec(),
            Traversal::Reverse => points.iter().rev().copied().collect(),
        }
    }

    pub fn start(&self) -> Point {
        let points = self.curve.points();
        match self.traversal {
            Traversal::Forward => points[0],
            Traversal::Reverse => points[points.len() - 1],
        }
    }

    pub fn end(&self) -> Point {
        let points = self.curve.points();
        match self.traversal {
            Traversal::Forward => points[points.len() - 1],
            Traversal::Reverse => points[0],
        }
    }

    /// Path segments for this side, optionally led by a move to the start.
    pub fn commands(&self, with_move: bool) -> Vec<PathCommand> {
        let points = self.points();
        let mut commands = Vec::with_capacity(4);
        if with_move {
            commands.push(PathCommand::Move { to: points[0] });
        }
        match *self.curve {
            EdgeCurve::Straight { .. } => commands.push(PathCommand::Line { to: points[1] }),
            EdgeCurve::Tabbed { .. } => {
                for chunk in points[1..].chunks_exact(3) {
                    commands.push(PathCommand::Cubic {
                        c1: chunk[0],
                        c2: chunk[1],
                        to: chunk[2],
                    });
                }
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(axis: EdgeAxis) -> EdgeFrame {
        EdgeFrame {
            axis,
            long_start: 100.0,
            long_end: 200.0,
            wide: 50.0,
            depth: 100.0,
        }
    }

    #[test]
    fn profile_is_deterministic() {
        let a = EdgeProfile::generate(42, EdgeAxis::Horizontal, 1, 3);
        let b = EdgeProfile::generate(42, EdgeAxis::Horizontal, 1, 3);
        assert_eq!(a, b);
        let other = EdgeProfile::generate(43, EdgeAxis::Horizontal, 1, 3);
        assert_ne!(a, other);
    }

    #[test]
    fn profile_parameters_in_range() {
        for index in 0..64 {
            let p = EdgeProfile::generate(9, EdgeAxis::Vertical, 2, index);
            assert!((0.1..0.125).contains(&p.tab), "tab {}", p.tab);
            assert!((0.0..0.05).contains(&p.jitter));
            for v in [p.b, p.c, p.d, p.e] {
                assert!(v.abs() <= p.jitter);
            }
            assert!(p.a.abs() < 0.05);
        }
    }

    #[test]
    fn lead_in_continues_previous_tail() {
        let prev = EdgeProfile::generate(5, EdgeAxis::Horizontal, 0, 0);
        let next = EdgeProfile::generate(5, EdgeAxis::Horizontal, 0, 1);
        let expected = if next.flip == prev.flip { -prev.e } else { prev.e };
        assert_eq!(next.a, expected);
    }

    #[test]
    fn waypoints_span_the_cell() {
        let profile = EdgeProfile::generate(1, EdgeAxis::Horizontal, 1, 0);
        let points = waypoints(&profile, &frame(EdgeAxis::Horizontal));
        assert_eq!(points[0], Point::new(100.0, 50.0));
        assert_eq!(points[9], Point::new(200.0, 50.0));

        let points = waypoints(&profile, &frame(EdgeAxis::Vertical));
        assert_eq!(points[0], Point::new(50.0, 100.0));
        assert_eq!(points[9], Point::new(50.0, 200.0));
    }

    #[test]
    fn reversed_ref_walks_backwards() {
        let profile = EdgeProfile::generate(3, EdgeAxis::Horizontal, 1, 0);
        let curve = Arc::new(EdgeCurve::tabbed(profile, &frame(EdgeAxis::Horizontal)));
        let fwd = EdgeRef::forward(curve.clone());
        let rev = EdgeRef::reverse(curve);
        assert!(fwd.shares_curve(&rev));
        assert_eq!(fwd.start(), rev.end());
        assert_eq!(fwd.end(), rev.start());

        let commands = rev.commands(false);
        assert_eq!(commands.len(), 3);
        let points = fwd.points();
        assert_eq!(
            commands[0],
            PathCommand::Cubic {
                c1: points[8],
                c2: points[7],
                to: points[6],
            }
        );
        assert_eq!(commands[2].end_point(), Some(points[0]));
    }

    #[test]
    fn straight_ref_is_a_line() {
        let curve = Arc::new(EdgeCurve::straight(&EdgeFrame {
            axis: EdgeAxis::Horizontal,
            long_start: 0.0,
            long_end: 10.0,
            wide: 0.0,
            depth: 10.0,
        }));
        let edge = EdgeRef::forward(curve);
        assert!(edge.is_border());
        assert_eq!(
            edge.commands(true),
            vec![
                PathCommand::Move { to: Point::ZERO },
                PathCommand::Line {
                    to: Point::new(10.0, 0.0)
                },
            ]
        );
    }
}
