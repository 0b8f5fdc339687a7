use super::*;
use crate::scene::model::{AreaDisplay, LayerKind, PresentationMode};
use crate::test_support::{png_bytes, temp_dir, write_ui_dir};

const DOC: &str = r#"{
    "ui_dir": "ui",
    "background": "bg.png",
    "content": {
        "mode": "still",
        "char_name": "Anna",
        "text": "[#世界,せかい]\nline two",
        "area_display": "ui_embedded"
    },
    "sprite_catalog": "sprites.json",
    "sprite_root": "sprites",
    "overlays": [
        { "kind": "image", "path": "stamp.png", "darken": true, "opacity": 40,
          "transform": { "x": 12, "y": 34, "rotation": 5, "scale": 0.5 } },
        { "kind": "sprite", "id": 9, "sprite_id": "hero", "skin_index": 1, "file_index": 0 },
        { "kind": "sprite", "sprite_id": "hero", "skin_index": 7 }
    ]
}"#;

const CATALOG: &str = r#"[
    { "id": "hero", "name_ja": "ヒーロー", "skins": [
        { "index": 0, "files": ["a.png"] },
        { "index": 1, "files": ["b.png"] }
    ] }
]"#;

#[test]
fn document_parses_tagged_overlays() {
    let doc = SceneDocument::from_json(DOC).expect("parse");
    assert_eq!(doc.content.mode, PresentationMode::Still);
    assert_eq!(doc.content.area_display, AreaDisplay::UiEmbedded);
    assert!(!doc.content.big_text);
    assert_eq!(doc.overlays.len(), 3);
    assert_eq!(
        doc.overlays[0].source,
        OverlaySourceDoc::Image {
            path: PathBuf::from("stamp.png")
        }
    );
    match &doc.overlays[1].source {
        OverlaySourceDoc::Sprite(sel) => {
            assert_eq!(sel.sprite_id, "hero");
            assert_eq!(sel.skin_index, 1);
        }
        other => panic!("unexpected source {other:?}"),
    }
    assert_eq!(doc.overlays[1].id, Some(9));
    assert_eq!(doc.overlays[0].opacity, Some(40));
}

#[test]
fn unknown_top_level_fields_are_rejected() {
    let err = SceneDocument::from_json(r#"{ "backgrund": "x.png" }"#).unwrap_err();
    assert!(matches!(err, TalkgenError::Serde(_)));
}

#[test]
fn apply_loads_the_whole_scene() {
    let root = temp_dir("document_apply");
    write_ui_dir(&root.join("ui"));
    std::fs::write(root.join("bg.png"), png_bytes(960, 540, [1, 2, 3, 255])).unwrap();
    std::fs::write(root.join("stamp.png"), png_bytes(40, 20, [9, 9, 9, 255])).unwrap();
    std::fs::write(root.join("sprites.json"), CATALOG).unwrap();
    std::fs::create_dir_all(root.join("sprites/hero")).unwrap();
    std::fs::write(
        root.join("sprites/hero/b.png"),
        png_bytes(60, 60, [5, 5, 5, 255]),
    )
    .unwrap();

    let doc = SceneDocument::from_json(DOC).expect("parse");
    let mut compositor = doc.build_compositor(&root).expect("compositor");
    let events = doc.apply_to(&mut compositor, &root).expect("apply");
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SceneEvent::DecodeFailed { .. }))
    );

    assert_eq!(
        compositor.overlay_order(),
        vec![OverlayId(0), OverlayId(9), OverlayId(10)]
    );
    let stamp = compositor.overlay(OverlayId(0)).expect("stamp");
    assert_eq!(stamp.transform().x, 12.0);
    assert_eq!(stamp.transform().scale, 0.5);
    assert!(stamp.darken());
    assert_eq!(stamp.opacity_percent(), 40);
    assert_eq!(
        compositor.placed_images(LayerKind::Overlay(OverlayId(9))).len(),
        1
    );
    // Skin 7 does not exist: the slot is kept but stays empty.
    assert!(
        compositor
            .placed_images(LayerKind::Overlay(OverlayId(10)))
            .is_empty()
    );
    assert_eq!(compositor.placed_text()[1].text, "世界");
    assert!(compositor.export().is_ok());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn sprite_overlay_without_catalog_is_an_error() {
    let root = temp_dir("document_no_catalog");
    write_ui_dir(&root.join("ui"));
    let doc = SceneDocument::from_json(
        r#"{ "ui_dir": "ui", "overlays": [ { "kind": "sprite", "sprite_id": "x" } ] }"#,
    )
    .expect("parse");
    let mut compositor = doc.build_compositor(&root).expect("compositor");
    assert!(doc.apply_to(&mut compositor, &root).is_err());
    std::fs::remove_dir_all(&root).ok();
}
