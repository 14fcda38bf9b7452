use approx::assert_relative_eq;
use jigsaw_core::{
    Board, BoardEvent, Corner, MemoryScene, OrientationMode, Point, PuzzleConfig, Rotation,
    RotationRequest, Target,
};
use proptest::prelude::*;

const CELL: f64 = 100.0;

fn build_board(rows: u32, cols: u32, orientation: OrientationMode) -> Board<MemoryScene> {
    let config = PuzzleConfig {
        width: cols as f64 * CELL,
        height: rows as f64 * CELL,
        rows,
        cols,
        orientation,
        seed: 0xA11CE,
        rotation_duration_ms: 0.0,
        ..PuzzleConfig::default()
    };
    Board::from_config(&config, MemoryScene::new()).unwrap()
}

fn home(board: &Board<MemoryScene>, piece: usize) -> Point {
    board.grid().piece_by_id(piece).unwrap().bounds().min
}

fn top_left(board: &Board<MemoryScene>, piece: usize) -> Point {
    board.absolute_corner(piece, Corner::TopLeft).unwrap()
}

/// Moves every piece far away from the others.
fn spread(board: &mut Board<MemoryScene>) {
    for piece in 0..board.grid().len() {
        let min = Point::new(5000.0 + 400.0 * piece as f64, 5000.0);
        board.place_piece(piece, min, Rotation::Deg0).unwrap();
    }
}

fn drop_home(board: &mut Board<MemoryScene>, piece: usize, offset: Point) -> usize {
    let min = home(board, piece) + offset;
    board.place_piece(piece, min, Rotation::Deg0).unwrap();
    board.drop_target(Target::Piece(piece)).unwrap().len()
}

fn completions(events: &[BoardEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, BoardEvent::Completed))
        .count()
}

fn assert_point_near(actual: Point, expected: Point) {
    assert_relative_eq!(actual.x, expected.x, epsilon = 1e-6);
    assert_relative_eq!(actual.y, expected.y, epsilon = 1e-6);
}

#[test]
fn neighbours_at_home_snap_and_complete() {
    let mut board = build_board(1, 2, OrientationMode::Fixed);
    let records = board.attempt_snap(Target::Piece(0)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].neighbor, 1);
    assert_eq!(board.group_count(), 1);
    assert!(board.is_complete());
    let events = board.take_events();
    assert!(matches!(
        events[0],
        BoardEvent::Snapped {
            piece: 0,
            neighbor: 1,
            ..
        }
    ));
    assert_eq!(completions(&events), 1);
}

#[test]
fn snap_within_tolerance_aligns_exactly() {
    let mut board = build_board(2, 2, OrientationMode::Fixed);
    assert_relative_eq!(board.snap_tolerance(), 25.0);
    spread(&mut board);
    assert_eq!(drop_home(&mut board, 0, Point::ZERO), 0);
    assert_eq!(drop_home(&mut board, 1, Point::new(10.0, -8.0)), 1);

    let expected = top_left(&board, 0) + (home(&board, 1) - home(&board, 0));
    assert_point_near(top_left(&board, 1), expected);
    // The dropped piece moves, the resting one does not.
    assert_point_near(top_left(&board, 0), home(&board, 0));
}

#[test]
fn snap_outside_tolerance_does_nothing() {
    let mut board = build_board(2, 2, OrientationMode::Fixed);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    assert_eq!(drop_home(&mut board, 1, Point::new(26.0, 0.0)), 0);
    assert_eq!(drop_home(&mut board, 2, Point::new(0.0, -30.0)), 0);
    assert_eq!(board.group_count(), 0);
    assert_eq!(board.group_of(1).unwrap(), None);
}

#[test]
fn non_adjacent_pieces_never_merge() {
    let mut board = build_board(2, 2, OrientationMode::Fixed);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    // Piece 3 only touches 0 diagonally; even stacked right on top of it
    // nothing happens.
    board
        .place_piece(3, home(&board, 0), Rotation::Deg0)
        .unwrap();
    assert!(board.drop_target(Target::Piece(3)).unwrap().is_empty());
    assert_eq!(drop_home(&mut board, 3, Point::ZERO), 0);
    assert_eq!(board.group_count(), 0);
}

#[test]
fn rotation_mismatch_blocks_snap() {
    let mut board = build_board(1, 2, OrientationMode::FourFold);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    board
        .place_piece(1, home(&board, 1), Rotation::Deg90)
        .unwrap();
    assert!(board.drop_target(Target::Piece(1)).unwrap().is_empty());
    assert_eq!(board.group_count(), 0);
}

#[test]
fn rotated_pair_snaps_in_its_own_frame() {
    let mut board = build_board(1, 2, OrientationMode::FourFold);
    let rotation = Rotation::Deg90;
    board
        .place_piece(0, Point::new(1000.0, 1000.0), rotation)
        .unwrap();
    let anchor = top_left(&board, 0);

    let error = Point::new(6.0, -4.0);
    let target_tl = anchor + rotation.apply(home(&board, 1) - home(&board, 0)) + error;
    let size = board.grid().piece_by_id(1).unwrap().bounds().size();
    let min = target_tl + rotation.apply(rotation.min_corner().offset(size));
    board.place_piece(1, min, rotation).unwrap();
    assert_point_near(top_left(&board, 1), target_tl);

    let records = board.drop_target(Target::Piece(1)).unwrap();
    assert_eq!(records.len(), 1);
    assert_point_near(records[0].shift, Point::new(-6.0, 4.0));
    assert_point_near(top_left(&board, 0), anchor);
    assert_point_near(top_left(&board, 1), target_tl - error);

    let group = board.group_of(0).unwrap().unwrap();
    assert_eq!(board.group_of(1).unwrap(), Some(group));
    assert_eq!(board.absolute_rotation(1).unwrap(), rotation);
}

#[test]
fn three_by_two_scenario() {
    let mut board = build_board(2, 3, OrientationMode::Fixed);
    let grid = board.grid();
    let left = grid.piece(0, 0).unwrap().edge(jigsaw_core::Side::Right);
    let right = grid.piece(0, 1).unwrap().edge(jigsaw_core::Side::Left);
    let mut reversed = right.points();
    reversed.reverse();
    assert_eq!(left.points(), reversed);

    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    assert_eq!(drop_home(&mut board, 1, Point::ZERO), 1);
    let group = board.group_of(1).unwrap().unwrap();
    assert_eq!(board.group_members(group).unwrap().len(), 2);

    for piece in 2..6 {
        assert!(drop_home(&mut board, piece, Point::ZERO) >= 1);
    }
    assert_eq!(board.group_count(), 1);
    let group = board.group_of(5).unwrap().unwrap();
    assert_eq!(board.group_members(group).unwrap().len(), 6);
    assert!(board.is_complete());
    assert_eq!(completions(&board.take_events()), 1);

    // Dropping the finished puzzle again does not re-announce it.
    board.drop_target(Target::Group(group)).unwrap();
    assert_eq!(completions(&board.take_events()), 0);
}

#[test]
fn merging_clusters_keeps_relative_offsets() {
    let mut board = build_board(2, 2, OrientationMode::Fixed);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    drop_home(&mut board, 1, Point::ZERO);
    let upper = board.group_of(0).unwrap().unwrap();
    board.drag_by(Target::Group(upper), Point::new(500.0, 300.0)).unwrap();

    let lower_offset = Point::new(0.0, 800.0);
    drop_home(&mut board, 2, lower_offset);
    drop_home(&mut board, 3, lower_offset);
    let lower = board.group_of(3).unwrap().unwrap();
    assert_ne!(upper, lower);
    assert_eq!(board.group_count(), 2);

    let anchor = top_left(&board, 0);
    board
        .drag_by(Target::Group(lower), Point::new(507.0, 300.0 - 800.0 - 5.0))
        .unwrap();
    let records = board.drop_target(Target::Group(lower)).unwrap();
    assert!(!records.is_empty());

    assert_eq!(board.group_count(), 1);
    assert!(board.group_members(upper).is_err());
    let merged = board.group_of(2).unwrap().unwrap();
    assert_eq!(board.group_members(merged).unwrap().len(), 4);
    assert_point_near(top_left(&board, 0), anchor);
    for piece in 1..4 {
        let expected = anchor + (home(&board, piece) - home(&board, 0));
        assert_point_near(top_left(&board, piece), expected);
    }
}

#[test]
fn loose_piece_joins_rotated_group() {
    let mut board = build_board(1, 3, OrientationMode::FourFold);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    drop_home(&mut board, 1, Point::ZERO);
    let group = board.group_of(0).unwrap().unwrap();
    assert_eq!(
        board.request_rotation(Target::Group(group)).unwrap(),
        RotationRequest::Started
    );
    let rotation = board.absolute_rotation(1).unwrap();
    assert_eq!(rotation, Rotation::Deg90);

    let target_tl = top_left(&board, 1) + rotation.apply(home(&board, 2) - home(&board, 1));
    let size = board.grid().piece_by_id(2).unwrap().bounds().size();
    let min = target_tl + rotation.apply(rotation.min_corner().offset(size)) + Point::new(3.0, 3.0);
    board.place_piece(2, min, rotation).unwrap();
    let before = top_left(&board, 0);

    assert_eq!(board.drop_target(Target::Piece(2)).unwrap().len(), 1);
    assert_eq!(board.group_of(2).unwrap(), Some(group));
    let mut members = board.group_members(group).unwrap().to_vec();
    members.sort_unstable();
    assert_eq!(members, [0, 1, 2]);
    assert_eq!(board.absolute_rotation(2).unwrap(), Rotation::Deg90);
    assert_point_near(top_left(&board, 2), target_tl);
    assert_point_near(top_left(&board, 0), before);
}

#[test]
fn single_piece_puzzle_is_already_complete() {
    let mut board = build_board(1, 1, OrientationMode::Fixed);
    assert!(board.is_complete());
    assert!(board.attempt_snap(Target::Piece(0)).unwrap().is_empty());
    assert!(board.take_events().is_empty());
}

#[test]
fn stale_targets_are_reported() {
    let mut board = build_board(1, 2, OrientationMode::Fixed);
    assert!(board.attempt_snap(Target::Piece(9)).is_err());
    assert!(board.drop_target(Target::Group(0)).is_err());
    board.attempt_snap(Target::Piece(0)).unwrap();
    // A piece target resolves to the group that absorbed it.
    assert_eq!(
        board.resolve(Target::Piece(1)).unwrap(),
        Target::Group(board.group_of(1).unwrap().unwrap())
    );
}

#[test]
fn selection_moves_and_drops_together() {
    let mut board = build_board(1, 3, OrientationMode::Fixed);
    spread(&mut board);
    drop_home(&mut board, 0, Point::ZERO);
    let shift = Point::new(40.0, 40.0);
    for piece in [1, 2] {
        board
            .place_piece(piece, home(&board, piece) + shift, Rotation::Deg0)
            .unwrap();
        assert!(board.toggle_selection(Target::Piece(piece)).unwrap());
    }
    board.move_selection(Point::new(-38.0, -41.0)).unwrap();
    let records = board.drop_selection().unwrap();
    assert!(records.len() >= 2);
    assert_eq!(board.group_count(), 1);
    assert_eq!(board.selection().len(), 1);
    assert!(!board.toggle_selection(Target::Piece(2)).unwrap());
    assert!(board.selection().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    #[test]
    fn any_drop_order_completes_once(order in Just((0..9usize).collect::<Vec<_>>()).prop_shuffle()) {
        let mut board = build_board(3, 3, OrientationMode::Fixed);
        spread(&mut board);
        for piece in order {
            drop_home(&mut board, piece, Point::ZERO);
        }
        prop_assert_eq!(board.group_count(), 1);
        prop_assert!(board.is_complete());
        prop_assert_eq!(completions(&board.take_events()), 1);
    }
}
