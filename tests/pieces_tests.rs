//! Pieces tests - rotation tables, bounding boxes, and kicks

use mintris::core::pieces::{bounding_box, get_shape, try_rotate, Tetromino, ROTATION_KICKS};
use mintris::types::{PieceKind, Rotation};

// ============== Shape Tests ==============

#[test]
fn test_i_piece_shapes() {
    assert_eq!(
        get_shape(PieceKind::I, Rotation::North),
        [(0, 1), (1, 1), (2, 1), (3, 1)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::East),
        [(2, 0), (2, 1), (2, 2), (2, 3)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::South),
        [(0, 2), (1, 2), (2, 2), (3, 2)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::West),
        [(1, 0), (1, 1), (1, 2), (1, 3)]
    );
}

#[test]
fn test_o_piece_is_rotation_invariant() {
    let north = get_shape(PieceKind::O, Rotation::North);
    assert_eq!(north, [(1, 0), (2, 0), (1, 1), (2, 1)]);
    for rotation in Rotation::ALL {
        assert_eq!(get_shape(PieceKind::O, rotation), north);
    }
}

#[test]
fn test_t_piece_shapes() {
    assert_eq!(
        get_shape(PieceKind::T, Rotation::North),
        [(1, 0), (0, 1), (1, 1), (2, 1)]
    );
    assert_eq!(
        get_shape(PieceKind::T, Rotation::South),
        [(0, 1), (1, 1), (2, 1), (1, 2)]
    );
}

#[test]
fn test_every_rotation_has_four_distinct_minos() {
    for kind in PieceKind::ALL {
        for rotation in Rotation::ALL {
            let shape = get_shape(kind, rotation);
            for i in 0..4 {
                for j in i + 1..4 {
                    assert_ne!(shape[i], shape[j], "{:?} {:?}", kind, rotation);
                }
            }
        }
    }
}

#[test]
fn test_bounding_boxes() {
    assert_eq!(bounding_box(PieceKind::I), (4, 4));
    assert_eq!(bounding_box(PieceKind::O), (4, 3));
    for kind in [PieceKind::J, PieceKind::L, PieceKind::S, PieceKind::T, PieceKind::Z] {
        assert_eq!(bounding_box(kind), (3, 3));
    }
}

// ============== Rotation Tests ==============

#[test]
fn test_four_rotations_return_to_start() {
    for kind in PieceKind::ALL {
        let start = Tetromino::new(kind).centered(10);
        let mut piece = start;
        for _ in 0..4 {
            piece = try_rotate(&piece, |_| true).unwrap();
        }
        assert_eq!(piece, start);
    }
}

#[test]
fn test_kick_table_order() {
    assert_eq!(ROTATION_KICKS, [(-1, 0), (1, 0), (-2, 0), (2, 0), (0, -1)]);
}

#[test]
fn test_kicks_tried_in_order() {
    let piece = Tetromino::new(PieceKind::I).centered(10);
    let mut tried = Vec::new();
    let result = try_rotate(&piece, |candidate| {
        tried.push((candidate.x - piece.x, candidate.y - piece.y));
        false
    });
    assert!(result.is_none());
    assert_eq!(tried, vec![(0, 0), (-1, 0), (1, 0), (-2, 0), (2, 0), (0, -1)]);
}

#[test]
fn test_cells_follow_position() {
    let mut piece = Tetromino::new(PieceKind::S);
    piece.x = 4;
    piece.y = 7;
    assert_eq!(piece.cells(), [(5, 7), (6, 7), (4, 8), (5, 8)]);
    assert_eq!(piece.cells_at(0, 1), [(5, 8), (6, 8), (4, 9), (5, 9)]);
}
