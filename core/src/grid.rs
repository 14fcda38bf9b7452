//! Piece-count options for an image.
//!
//! Common photo ratios get hand-picked grids whose cells are square. Any
//! other ratio is scored per target count.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub cols: u32,
    pub rows: u32,
    pub pieces: u32,
}

impl Difficulty {
    const fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            pieces: cols * rows,
        }
    }

    pub fn transposed(self) -> Self {
        Self::new(self.rows, self.cols)
    }

    pub fn label(&self) -> String {
        format!("{} pieces ({}x{})", self.pieces, self.cols, self.rows)
    }
}

const SQUARE: [Difficulty; 8] = [
    Difficulty::new(8, 8),
    Difficulty::new(10, 10),
    Difficulty::new(12, 12),
    Difficulty::new(16, 16),
    Difficulty::new(20, 20),
    Difficulty::new(24, 24),
    Difficulty::new(28, 28),
    Difficulty::new(32, 32),
];

const THREE_BY_TWO: [Difficulty; 8] = [
    Difficulty::new(9, 6),
    Difficulty::new(12, 8),
    Difficulty::new(15, 10),
    Difficulty::new(18, 12),
    Difficulty::new(21, 14),
    Difficulty::new(27, 18),
    Difficulty::new(33, 22),
    Difficulty::new(39, 26),
];

const FOUR_BY_THREE: [Difficulty; 8] = [
    Difficulty::new(8, 6),
    Difficulty::new(12, 9),
    Difficulty::new(16, 12),
    Difficulty::new(20, 15),
    Difficulty::new(24, 18),
    Difficulty::new(28, 21),
    Difficulty::new(32, 24),
    Difficulty::new(36, 27),
];

pub const TARGET_PIECE_COUNTS: [u32; 8] = [50, 100, 150, 250, 400, 600, 800, 1000];
pub const GRID_REL_COUNT_TOL: f64 = 0.05;
pub const GRID_PIECE_RATIO_MAX: f64 = 1.42;
pub const GRID_ROW_MIN: u32 = 2;
pub const GRID_ROW_WIDEN: f64 = 1.5;
pub const GRID_NEIGHBOR_COLS: i64 = 3;
pub const GRID_SCORE_COUNT: f64 = 1.0;
pub const GRID_SCORE_GRID: f64 = 1.0;
pub const GRID_SCORE_PIECE: f64 = 0.5;

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Width and height reduced by their greatest common divisor.
pub fn aspect_ratio(width: u32, height: u32) -> (u32, u32) {
    match gcd(width, height) {
        0 => (width, height),
        divisor => (width / divisor, height / divisor),
    }
}

pub fn difficulties(width: u32, height: u32) -> Vec<Difficulty> {
    match aspect_ratio(width, height) {
        (1, 1) => SQUARE.to_vec(),
        (3, 2) => THREE_BY_TWO.to_vec(),
        (2, 3) => THREE_BY_TWO.iter().map(|d| d.transposed()).collect(),
        (4, 3) => FOUR_BY_THREE.to_vec(),
        (3, 4) => FOUR_BY_THREE.iter().map(|d| d.transposed()).collect(),
        _ => {
            let mut choices: Vec<Difficulty> = TARGET_PIECE_COUNTS
                .iter()
                .filter_map(|target| best_grid_for_count(width, height, *target))
                .collect();
            choices.dedup();
            choices
        }
    }
}

/// Grid whose piece count is near `target` and whose cells are closest to
/// square for the image.
pub fn best_grid_for_count(width: u32, height: u32, target: u32) -> Option<Difficulty> {
    if target == 0 || width == 0 || height == 0 {
        return None;
    }
    let aspect = width as f64 / height as f64;
    let piece_ratio_min = 1.0 / GRID_PIECE_RATIO_MAX;
    let base = (target as f64).sqrt().ceil() as u32;
    let r_hi = ((base as f64 * GRID_ROW_WIDEN).ceil() as u32).max(GRID_ROW_MIN);
    let mut best: Option<(Difficulty, f64)> = None;
    for rows in GRID_ROW_MIN..=r_hi {
        let c0 = (target as f64 / rows as f64).round() as i64;
        for dc in -GRID_NEIGHBOR_COLS..=GRID_NEIGHBOR_COLS {
            let cols = c0 + dc;
            if cols < 2 {
                continue;
            }
            let actual = rows as f64 * cols as f64;
            let rel_err = (actual - target as f64).abs() / target as f64;
            if rel_err > GRID_REL_COUNT_TOL {
                continue;
            }
            let grid_ratio = cols as f64 / rows as f64;
            let piece_ratio = aspect / grid_ratio;
            if !(piece_ratio_min..=GRID_PIECE_RATIO_MAX).contains(&piece_ratio) {
                continue;
            }
            let eps = 1e-12;
            let score = GRID_SCORE_COUNT * rel_err.powi(2)
                + GRID_SCORE_GRID * ((grid_ratio + eps) / (aspect + eps)).ln().powi(2)
                + GRID_SCORE_PIECE * (piece_ratio + eps).ln().powi(2);
            if best.as_ref().map_or(true, |(_, best_score)| score < *best_score) {
                best = Some((Difficulty::new(cols as u32, rows), score));
            }
        }
    }
    best.map(|(choice, _)| choice)
}
