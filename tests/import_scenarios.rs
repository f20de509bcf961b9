//! End-to-end imports of synthetic drawing streams.

use dff_import::attrs::{FillStyle, LineStyle};
use dff_import::escher::{PropertyBuilder, PropertyId, RecordBuilder, RecordType, ShapeFlags, ShapeType};
use dff_import::host::NodeKind;
use dff_import::images::NoBlips;
use dff_import::{
    DrawingScanner, ImportOptions, ImportSession, MapUnit, NodeId, Rect, RgbColor, Scene, SceneHost, ShapeImporter,
};

fn identity() -> ImportOptions {
    ImportOptions::new()
        .with_map_unit(MapUnit::Emu)
        .with_source_units_per_inch(914_400)
}

fn import_one(data: &[u8], options: &ImportOptions) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let mut session = ImportSession::new();
    let mut blips = NoBlips;
    let node = ShapeImporter::new(data, &mut scene, &mut blips, &mut session, options)
        .import_at(0)
        .expect("shape imported");
    (scene, node)
}

fn single_shape(shape_type: ShapeType, flags: ShapeFlags, props: Option<PropertyBuilder>, anchor: Rect) -> Vec<u8> {
    let mut b = RecordBuilder::new();
    b.container(RecordType::SpContainer, |b| {
        b.shape(shape_type.raw(), 1025, flags | ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT);
        if let Some(props) = &props {
            b.properties(props);
        }
        b.client_anchor(anchor.left, anchor.top, anchor.right, anchor.bottom);
    });
    b.into_bytes()
}

#[test]
fn rotated_and_flipped_rectangle() {
    let props = PropertyBuilder::new().signed(PropertyId::Rotation, 90 << 16);
    let data = single_shape(ShapeType::RECTANGLE, ShapeFlags::FLIP_H, Some(props), Rect::new(0, 0, 100, 200));
    let (scene, id) = import_one(&data, &identity());

    let node = scene.node(id).unwrap();
    // the stored anchor is the box of the turned shape
    assert_eq!(node.logic_rect, Rect::new(-50, 50, 150, 150));
    assert_eq!(node.logic_rect.center(), Rect::new(0, 0, 100, 200).center());
    assert!(node.flip_h);
    assert!(!node.flip_v);
    assert_eq!(node.rotation, 9000);
    assert_eq!(scene.snap_rect(id), Some(Rect::new(0, 0, 100, 200)));
}

/// A 2x scaled group at (1000, 1000): a turned and flipped rectangle on the
/// left half of its child space, an ellipse on the right half.
fn group_with_turned_child(group_flags: ShapeFlags) -> Vec<u8> {
    let mut b = RecordBuilder::new();
    b.container(RecordType::SpgrContainer, |b| {
        b.container(RecordType::SpContainer, |b| {
            b.shape(0, 1024, ShapeFlags::GROUP | ShapeFlags::HAVE_ANCHOR | group_flags);
            b.spgr(0, 0, 100, 100);
            b.client_anchor(1000, 1000, 1200, 1200);
        });
        b.container(RecordType::SpContainer, |b| {
            b.shape(
                ShapeType::RECTANGLE.raw(),
                1025,
                ShapeFlags::CHILD | ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT | ShapeFlags::FLIP_H,
            );
            b.properties(&PropertyBuilder::new().signed(PropertyId::Rotation, 90 << 16));
            b.child_anchor(0, 0, 50, 100);
        });
        b.container(RecordType::SpContainer, |b| {
            b.shape(ShapeType::ELLIPSE.raw(), 1026, ShapeFlags::CHILD | ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT);
            b.child_anchor(50, 0, 100, 100);
        });
    });
    b.into_bytes()
}

#[test]
fn turned_child_inside_a_scaled_group() {
    let (scene, id) = import_one(&group_with_turned_child(ShapeFlags::empty()), &identity());

    let group = scene.node(id).unwrap();
    assert_eq!(group.children.len(), 2);
    let turned = scene.node(group.children[0]).unwrap();
    // mapped to (1000, 1000, 1100, 1200), then swapped about its center
    assert_eq!(turned.logic_rect, Rect::new(950, 1050, 1150, 1150));
    assert_eq!(turned.logic_rect.center(), Rect::new(1000, 1000, 1100, 1200).center());
    assert!(turned.flip_h);
    assert_eq!(turned.rotation, 9000);
    assert_eq!(scene.snap_rect(group.children[0]), Some(Rect::new(1000, 1000, 1100, 1200)));

    let ellipse = scene.node(group.children[1]).unwrap();
    assert_eq!(ellipse.logic_rect, Rect::new(1100, 1000, 1200, 1200));
    assert_eq!(scene.snap_rect(id), Some(Rect::new(1000, 1000, 1200, 1200)));
}

#[test]
fn flipped_group_mirrors_its_turned_child() {
    let (scene, id) = import_one(&group_with_turned_child(ShapeFlags::FLIP_H), &identity());

    let group = scene.node(id).unwrap();
    let turned = scene.node(group.children[0]).unwrap();
    // mirrored across x = 1100, the group center
    assert_eq!(turned.logic_rect, Rect::new(1050, 1050, 1250, 1150));
    assert!(!turned.flip_h);
    assert_eq!(turned.rotation, 27000);
    assert_eq!(scene.snap_rect(group.children[0]), Some(Rect::new(1100, 1000, 1200, 1200)));

    let ellipse = scene.node(group.children[1]).unwrap();
    assert_eq!(ellipse.logic_rect, Rect::new(1000, 1000, 1100, 1200));
    assert!(ellipse.flip_h);
    assert_eq!(ellipse.rotation, 0);
}

#[test]
fn single_child_fills_its_group() {
    let mut b = RecordBuilder::new();
    b.container(RecordType::SpgrContainer, |b| {
        b.container(RecordType::SpContainer, |b| {
            b.shape(0, 1024, ShapeFlags::GROUP | ShapeFlags::HAVE_ANCHOR);
            b.spgr(0, 0, 1, 1);
            b.client_anchor(0, 0, 1000, 1000);
        });
        b.container(RecordType::SpContainer, |b| {
            b.shape(ShapeType::ELLIPSE.raw(), 1025, ShapeFlags::CHILD | ShapeFlags::HAVE_ANCHOR);
            b.child_anchor(10, 10, 110, 60);
        });
    });
    let (scene, id) = import_one(&b.into_bytes(), &identity());

    let group = scene.node(id).unwrap();
    assert!(group.is_group());
    assert_eq!(group.children.len(), 1);
    let child = scene.node(group.children[0]).unwrap();
    assert_eq!(child.logic_rect, Rect::new(0, 0, 1000, 1000));
    assert_eq!(child.parent, Some(id));
}

#[test]
fn rectangle_without_property_table() {
    let data = single_shape(ShapeType::RECTANGLE, ShapeFlags::empty(), None, Rect::new(0, 0, 576, 576));
    let (scene, id) = import_one(&data, &ImportOptions::default());

    let node = scene.node(id).unwrap();
    // one inch in 1/100 mm
    assert_eq!(node.logic_rect, Rect::new(0, 0, 2540, 2540));
    let attrs = node.attributes.as_ref().unwrap();
    match &attrs.fill {
        FillStyle::Solid { color, transparency } => {
            assert_eq!(*color, RgbColor { r: 0xFF, g: 0xFF, b: 0xFF });
            assert_eq!(*transparency, 0);
        },
        other => panic!("expected a solid fill, got {other:?}"),
    }
    match &attrs.line {
        LineStyle::Stroke(line) => assert_eq!(line.color, RgbColor { r: 0, g: 0, b: 0 }),
        LineStyle::None => panic!("expected a stroked outline"),
    }
}

#[test]
fn arc_frame_is_corrected_outside_slides() {
    let data = single_shape(ShapeType::ARC, ShapeFlags::empty(), None, Rect::new(0, 0, 100, 100));

    let (scene, id) = import_one(&data, &identity().with_slide_import(false));
    let node = scene.node(id).unwrap();
    assert_eq!(node.logic_rect, Rect::new(-100, 0, 100, 200));
    let geometry = node.attributes.as_ref().unwrap().geometry.as_ref().unwrap();
    let view_box = geometry.view_box.unwrap();
    assert_eq!((view_box.x, view_box.y, view_box.width, view_box.height), (-21_600, 0, 43_200, 43_200));

    let (scene, id) = import_one(&data, &identity());
    let node = scene.node(id).unwrap();
    assert_eq!(node.logic_rect, Rect::new(0, 0, 100, 100));
    assert!(node.attributes.as_ref().unwrap().geometry.as_ref().unwrap().view_box.is_some());
}

/// A 2x1 24-bit DIB picture record.
fn dib_record() -> Vec<u8> {
    let mut content = vec![0u8; 17];
    content.extend_from_slice(&40u32.to_le_bytes());
    content.extend_from_slice(&2i32.to_le_bytes());
    content.extend_from_slice(&1i32.to_le_bytes());
    content.extend_from_slice(&1u16.to_le_bytes());
    content.extend_from_slice(&24u16.to_le_bytes());
    content.extend_from_slice(&[0; 24]);
    // BGR pixels, rows padded to four bytes
    content.extend_from_slice(&[0x30, 0x20, 0x10, 0x00, 0xFF, 0x00, 0, 0]);
    let mut b = RecordBuilder::new();
    b.atom(0, 0x7A8, RecordType::BlipDib.into(), &content);
    b.into_bytes()
}

fn blip_store_entry(blip: &[u8]) -> Vec<u8> {
    let mut bse = vec![0x07, 0x07];
    bse.extend_from_slice(&[0xAB; 16]);
    bse.extend_from_slice(&0xFFu16.to_le_bytes());
    bse.extend_from_slice(&(blip.len() as u32).to_le_bytes());
    bse.extend_from_slice(&1u32.to_le_bytes());
    bse.extend_from_slice(&0u32.to_le_bytes());
    bse.extend_from_slice(&[0, 0, 0, 0]);
    bse.extend_from_slice(blip);
    bse
}

#[test]
fn dib_picture_through_the_blip_store() {
    let mut b = RecordBuilder::new();
    b.container(RecordType::DggContainer, |b| {
        let dgg: Vec<u8> = [1025u32, 2, 2, 1, 1, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        b.atom(0, 0, RecordType::Dgg.into(), &dgg);
        b.begin_container_with_instance(RecordType::BStoreContainer, 1);
        b.atom(2, 0x07, RecordType::Bse.into(), &blip_store_entry(&dib_record()));
        b.end_container();
    });
    b.begin_container_with_instance(RecordType::DgContainer, 1);
    b.container(RecordType::SpgrContainer, |b| {
        b.container(RecordType::SpContainer, |b| {
            b.shape(0, 1024, ShapeFlags::GROUP | ShapeFlags::PATRIARCH);
            b.spgr(0, 0, 0, 0);
        });
        b.container(RecordType::SpContainer, |b| {
            b.shape(ShapeType::PICTURE_FRAME.raw(), 1025, ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT);
            b.properties(&PropertyBuilder::new().blip(PropertyId::Pib, 1));
            b.client_anchor(0, 0, 200, 100);
        });
    });
    b.end_container();
    let data = b.into_bytes();

    let mut scanner = DrawingScanner::new(&data, identity());
    assert_eq!(scanner.blip_store().len(), 1);
    let mut scene = Scene::new();
    let page = scanner.drawings()[0].offset;
    let result = scanner.import_all(&mut scene, page, None);
    assert!(result.is_complete());
    assert_eq!(result.roots.len(), 1);

    let node = scene.node(result.roots[0]).unwrap();
    let NodeKind::Graphic(graphic) = &node.kind else {
        panic!("expected a picture node, got {:?}", node.kind);
    };
    let bitmap = graphic.as_bitmap().unwrap();
    assert_eq!(bitmap.dimensions(), (2, 1));
    assert_eq!(bitmap.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xFF]);
    assert_eq!(bitmap.get_pixel(1, 0).0, [0x00, 0xFF, 0x00, 0xFF]);

    let cached = scanner.get_blip(1).unwrap();
    assert_eq!(cached.pixel_size(), Some((2, 1)));
}
