use std::fmt::Write as _;

use crate::geometry::path_data;
use crate::piece::Grid;

/// Cut pattern of the whole puzzle, one closed path per piece at its
/// generated position.
pub fn render_grid(grid: &Grid) -> String {
    let width = grid.width();
    let height = grid.height();
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
    );
    let _ = writeln!(
        out,
        r##"  <g fill="none" stroke="#202020" stroke-width="1" stroke-linejoin="round">"##
    );
    for piece in grid.pieces() {
        let _ = writeln!(
            out,
            r#"    <path id="piece-{}-{}" d="{}"/>"#,
            piece.row(),
            piece.col(),
            path_data(&piece.outline())
        );
    }
    out.push_str("  </g>\n</svg>\n");
    out
}
