// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-representation tile algebra: boxes, octagons and simplices must
//! agree when a query mixes them.

use shoveroute_planar::{IntPoint, Polyline, Tile, TileBox};

fn int_box(llx: i32, lly: i32, urx: i32, ury: i32) -> TileBox {
    TileBox::new(IntPoint::new(llx, lly), IntPoint::new(urx, ury))
}

#[test]
fn test_box_octagon_simplex_agree_on_containment() {
    let b = int_box(-50, -30, 50, 30);
    let as_octagon = Tile::Octagon(b.to_octagon());
    let as_simplex = Tile::Simplex(b.to_simplex());
    let as_box = Tile::Box(b);
    let probes = [
        (IntPoint::new(0, 0), true),
        (IntPoint::new(50, 30), true),
        (IntPoint::new(-50, 30), true),
        (IntPoint::new(51, 0), false),
        (IntPoint::new(0, -31), false),
    ];
    for (p, expected) in probes {
        assert_eq!(as_box.contains(p), expected, "box contains {:?}", p);
        assert_eq!(as_octagon.contains(p), expected, "octagon contains {:?}", p);
        assert_eq!(as_simplex.contains(p), expected, "simplex contains {:?}", p);
    }
}

#[test]
fn test_mixed_representation_intersection() {
    let left = Tile::Box(int_box(0, 0, 100, 100));
    let right = Tile::Simplex(int_box(60, -40, 200, 40).to_simplex());
    assert!(left.intersects(&right));
    let common = left.intersection(&right);
    assert!(!common.is_empty());
    assert_eq!(common.bounding_box(), int_box(60, 0, 100, 40));

    let apart = Tile::Box(int_box(300, 300, 400, 400));
    assert!(!left.intersects(&apart));
    assert!(left.intersection(&apart).is_empty());
}

#[test]
fn test_cutout_covers_complement() {
    let outer = Tile::Box(int_box(0, 0, 100, 100));
    let hole = Tile::Box(int_box(40, 40, 60, 60));
    let pieces = outer.cutout(&hole);
    assert!(!pieces.is_empty());
    // the hole interior is gone, the rest of the outer box is covered
    let interior = IntPoint::new(50, 50);
    assert!(pieces.iter().all(|piece| !piece.contains(interior)));
    for probe in [
        IntPoint::new(10, 10),
        IntPoint::new(90, 90),
        IntPoint::new(50, 20),
        IntPoint::new(20, 50),
    ] {
        assert!(
            pieces.iter().any(|piece| piece.contains(probe)),
            "complement loses {:?}",
            probe
        );
    }
}

#[test]
fn test_offset_shapes_cover_the_centerline() {
    let polyline = Polyline::from_points(&[
        IntPoint::new(0, 0),
        IntPoint::new(400, 0),
        IntPoint::new(400, 300),
    ])
    .unwrap();
    let shapes = polyline.offset_shapes(10);
    assert_eq!(shapes.len(), polyline.line_count() - 2);
    for probe in [
        IntPoint::new(200, 0),
        IntPoint::new(400, 0),
        IntPoint::new(400, 150),
    ] {
        assert!(
            shapes.iter().any(|shape| shape.contains(probe)),
            "centerline point {:?} uncovered",
            probe
        );
    }
    // a point one half width plus margin off the path is outside every shape
    let off = IntPoint::new(200, 12);
    assert!(shapes.iter().all(|shape| !shape.contains(off)));
}

#[test]
fn test_enlarged_tile_reaches_translated_probe() {
    let tile = Tile::Box(int_box(0, 0, 100, 100));
    let probe = Tile::Box(int_box(110, 0, 120, 100));
    assert!(!tile.intersects(&probe));
    assert!(tile.enlarge(10.0).intersects(&probe));
}
