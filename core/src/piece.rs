use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::edge::{EdgeAxis, EdgeCurve, EdgeFrame, EdgeProfile, EdgeRef};
use crate::error::PuzzleError;
use crate::geometry::{path_bounds, Corners, PathCommand, Point, Rect, Size};
use crate::model::PieceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Clockwise outline order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Piece {
    id: PieceId,
    row: u32,
    col: u32,
    edges: [EdgeRef; 4],
    bounds: Rect,
    origin: Point,
}

impl Piece {
    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn edge(&self, side: Side) -> &EdgeRef {
        &self.edges[side.index()]
    }

    /// Path segments of one side. Only the top side opens with a move.
    pub fn boundary(&self, side: Side) -> Vec<PathCommand> {
        self.edge(side).commands(side == Side::Top)
    }

    /// Closed outline at the generated position.
    pub fn outline(&self) -> Vec<PathCommand> {
        let mut commands: Vec<PathCommand> =
            Side::ALL.iter().flat_map(|side| self.boundary(*side)).collect();
        commands.push(PathCommand::Close);
        commands
    }

    /// Exact bounding box at the generated position.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn original_coords(&self) -> Corners {
        Corners::from(self.bounds)
    }

    /// Rotation pivot as a fraction of the bounding box size.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Rotation pivot as an offset from the bounding box top-left.
    pub fn pivot(&self) -> Point {
        let size = self.bounds.size();
        Point::new(self.origin.x * size.width, self.origin.y * size.height)
    }

    pub fn is_border(&self) -> bool {
        self.edges.iter().any(EdgeRef::is_border)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PuzzleGenerator {
    width: f64,
    height: f64,
    rows: u32,
    cols: u32,
    seed: u32,
}

impl PuzzleGenerator {
    pub fn new(width: f64, height: f64, rows: u32, cols: u32, seed: u32) -> Result<Self, PuzzleError> {
        if rows == 0 || cols == 0 {
            return Err(PuzzleError::InvalidGrid { rows, cols });
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PuzzleError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            rows,
            cols,
            seed,
        })
    }

    fn x_at(&self, col: u32) -> f64 {
        self.width * col as f64 / self.cols as f64
    }

    fn y_at(&self, row: u32) -> f64 {
        self.height * row as f64 / self.rows as f64
    }

    fn horizontal_frame(&self, line: u32, col: u32) -> EdgeFrame {
        EdgeFrame {
            axis: EdgeAxis::Horizontal,
            long_start: self.x_at(col),
            long_end: self.x_at(col + 1),
            wide: self.y_at(line),
            depth: self.height / self.rows as f64,
        }
    }

    fn vertical_frame(&self, line: u32, row: u32) -> EdgeFrame {
        EdgeFrame {
            axis: EdgeAxis::Vertical,
            long_start: self.y_at(row),
            long_end: self.y_at(row + 1),
            wide: self.x_at(line),
            depth: self.width / self.cols as f64,
        }
    }

    /// Row lines `0..=rows`, each holding one left-to-right curve per column.
    fn generate_rows(&self) -> Vec<Vec<Arc<EdgeCurve>>> {
        (0..=self.rows)
            .map(|line| {
                (0..self.cols)
                    .map(|col| {
                        let frame = self.horizontal_frame(line, col);
                        let curve = if line == 0 || line == self.rows {
                            EdgeCurve::straight(&frame)
                        } else {
                            let profile =
                                EdgeProfile::generate(self.seed, EdgeAxis::Horizontal, line, col);
                            EdgeCurve::tabbed(profile, &frame)
                        };
                        Arc::new(curve)
                    })
                    .collect()
            })
            .collect()
    }

    /// Column lines `0..=cols`, each holding one top-to-bottom curve per row.
    fn generate_columns(&self) -> Vec<Vec<Arc<EdgeCurve>>> {
        (0..=self.cols)
            .map(|line| {
                (0..self.rows)
                    .map(|row| {
                        let frame = self.vertical_frame(line, row);
                        let curve = if line == 0 || line == self.cols {
                            EdgeCurve::straight(&frame)
                        } else {
                            let profile =
                                EdgeProfile::generate(self.seed, EdgeAxis::Vertical, line, row);
                            EdgeCurve::tabbed(profile, &frame)
                        };
                        Arc::new(curve)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn generate(&self) -> Grid {
        let rows = self.generate_rows();
        let columns = self.generate_columns();
        let row_count = self.rows as usize;
        let col_count = self.cols as usize;

        let mut pieces = Vec::with_capacity(row_count * col_count);
        let mut adjacency = Vec::with_capacity(row_count * col_count);
        for r in 0..row_count {
            for c in 0..col_count {
                let edges = [
                    EdgeRef::forward(rows[r][c].clone()),
                    EdgeRef::forward(columns[c + 1][r].clone()),
                    EdgeRef::reverse(rows[r + 1][c].clone()),
                    EdgeRef::reverse(columns[c][r].clone()),
                ];
                let id = r * col_count + c;
                pieces.push(build_piece(id, r as u32, c as u32, edges));
                adjacency.push([
                    (r > 0).then(|| id - col_count),
                    (c + 1 < col_count).then(|| id + 1),
                    (r + 1 < row_count).then(|| id + col_count),
                    (c > 0).then(|| id - 1),
                ]);
            }
        }
        debug!(
            "generated {}x{} puzzle ({} pieces) for {}x{} seed {:#x}",
            self.rows,
            self.cols,
            pieces.len(),
            self.width,
            self.height,
            self.seed
        );
        Grid {
            width: self.width,
            height: self.height,
            rows: self.rows,
            cols: self.cols,
            seed: self.seed,
            pieces,
            adjacency,
        }
    }
}

fn build_piece(id: PieceId, row: u32, col: u32, edges: [EdgeRef; 4]) -> Piece {
    let top = &edges[Side::Top.index()];
    let bottom = &edges[Side::Bottom.index()];
    let corners = [top.start(), top.end(), bottom.start(), bottom.end()];
    let center = corners
        .iter()
        .fold(Point::ZERO, |acc, corner| acc + *corner)
        .scale(0.25);

    let outline: Vec<PathCommand> = Side::ALL
        .iter()
        .flat_map(|side| edges[side.index()].commands(*side == Side::Top))
        .collect();
    let bounds = path_bounds(&outline).unwrap_or_else(|| Rect::from_points(corners[0], corners[2]));
    let size = bounds.size();
    let origin = Point::new(
        (center.x - bounds.min.x) / size.width,
        (center.y - bounds.min.y) / size.height,
    );
    Piece {
        id,
        row,
        col,
        edges,
        bounds,
        origin,
    }
}

/// A fully generated puzzle: pieces plus the static adjacency table.
#[derive(Clone, Debug)]
pub struct Grid {
    width: f64,
    height: f64,
    rows: u32,
    cols: u32,
    seed: u32,
    pieces: Vec<Piece>,
    adjacency: Vec<[Option<PieceId>; 4]>,
}

impl Grid {
    pub fn generate(width: f64, height: f64, rows: u32, cols: u32, seed: u32) -> Result<Self, PuzzleError> {
        Ok(PuzzleGenerator::new(width, height, rows, cols, seed)?.generate())
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, row: u32, col: u32) -> Option<&Piece> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.pieces.get(row as usize * self.cols as usize + col as usize)
    }

    pub fn piece_by_id(&self, id: PieceId) -> Result<&Piece, PuzzleError> {
        self.pieces.get(id).ok_or(PuzzleError::UnknownPiece { id })
    }

    pub fn neighbors(&self, id: PieceId) -> [Option<PieceId>; 4] {
        self.adjacency.get(id).copied().unwrap_or([None; 4])
    }

    pub fn neighbor(&self, id: PieceId, side: Side) -> Option<PieceId> {
        self.neighbors(id)[side.index()]
    }

    pub fn are_adjacent(&self, a: PieceId, b: PieceId) -> bool {
        self.neighbors(a).contains(&Some(b))
    }

    pub fn cell_size(&self) -> Size {
        Size::new(
            self.width / self.cols as f64,
            self.height / self.rows as f64,
        )
    }

    /// Snap tolerance in board units for a ratio of the smaller cell side.
    pub fn snap_tolerance(&self, ratio: f64) -> f64 {
        let cell = self.cell_size();
        ratio * cell.width.min(cell.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_follows_grid() {
        let grid = Grid::generate(300.0, 200.0, 2, 3, 1).unwrap();
        assert_eq!(grid.neighbors(0), [None, Some(1), Some(3), None]);
        assert_eq!(grid.neighbors(4), [Some(1), Some(5), None, Some(3)]);
        assert!(grid.are_adjacent(2, 5));
        assert!(!grid.are_adjacent(0, 4));
        assert_eq!(grid.neighbor(5, Side::Left), Some(4));
    }

    #[test]
    fn rejects_empty_grid_and_bad_dimensions() {
        assert_eq!(
            PuzzleGenerator::new(100.0, 100.0, 0, 3, 1).unwrap_err(),
            PuzzleError::InvalidGrid { rows: 0, cols: 3 }
        );
        assert!(matches!(
            PuzzleGenerator::new(-1.0, 100.0, 2, 2, 1),
            Err(PuzzleError::InvalidDimensions { .. })
        ));
        assert!(PuzzleGenerator::new(f64::INFINITY, 100.0, 2, 2, 1).is_err());
    }

    #[test]
    fn origin_is_cell_center_fraction() {
        let grid = Grid::generate(300.0, 200.0, 1, 1, 1).unwrap();
        let piece = grid.piece(0, 0).unwrap();
        assert_eq!(piece.origin(), Point::new(0.5, 0.5));
        assert_eq!(piece.pivot(), Point::new(150.0, 100.0));
        assert!(piece.is_border());
    }

    #[test]
    fn out_of_range_lookups() {
        let grid = Grid::generate(100.0, 100.0, 2, 2, 1).unwrap();
        assert!(grid.piece(2, 0).is_none());
        assert_eq!(
            grid.piece_by_id(4).unwrap_err(),
            PuzzleError::UnknownPiece { id: 4 }
        );
        assert_eq!(grid.neighbors(99), [None; 4]);
    }
}
