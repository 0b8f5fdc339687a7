use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::assets::store::UiAssetKind;
use crate::scene::model::{AreaDisplay, PresentationMode};
use crate::test_support::{png_source, ui_assets, ui_size};
use crate::text::measure::FixedAdvanceMeasure;

const BG: [u8; 4] = [10, 20, 30, 255];

fn compositor() -> SceneCompositor {
    SceneCompositor::with_text_measure(ui_assets(), Box::new(FixedAdvanceMeasure::default()))
        .expect("compositor")
}

fn with_background(w: u32, h: u32) -> SceneCompositor {
    let mut c = compositor();
    c.set_background(Some(png_source(w, h, BG)));
    c.run_until_idle();
    c
}

fn inputs(text: &str) -> ContentInputs {
    ContentInputs {
        char_name: "Anna".to_owned(),
        text: text.to_owned(),
        area_display: AreaDisplay::Hide,
        ..ContentInputs::default()
    }
}

fn body_texts(c: &SceneCompositor) -> Vec<String> {
    // First run is the speaker name.
    c.placed_text()
        .iter()
        .skip(1)
        .map(|run| run.text.clone())
        .collect()
}

#[test]
fn nothing_is_drawn_without_a_background() {
    let mut c = compositor();
    c.set_content(inputs("hello"));
    assert!(!c.has_pending());
    assert!(c.placed_text().is_empty());
    assert!(c.export().is_err());
}

#[test]
fn background_sets_the_canvas_and_redraws_content() {
    let mut c = compositor();
    c.set_content(inputs("hello"));
    c.set_background(Some(png_source(960, 540, BG)));
    assert_eq!(c.layer_state(LayerKind::Background), Some(LayerState::Loading));

    let first = c.pump();
    assert_eq!(
        first,
        vec![SceneEvent::Composed {
            layer: LayerKind::Background
        }]
    );
    assert_eq!(c.canvas(), Some(Canvas { width: 960, height: 540 }));
    assert_eq!(c.layer_state(LayerKind::Content), Some(LayerState::Loading));

    let second = c.pump();
    assert!(second.contains(&SceneEvent::Composed {
        layer: LayerKind::Content
    }));
    assert_eq!(c.layer_state(LayerKind::Content), Some(LayerState::Idle));
    assert_eq!(body_texts(&c), vec!["hello".to_owned()]);
    assert_eq!(c.placed_images(LayerKind::Chrome).len(), 1);
}

#[test]
fn newer_content_request_wins_over_a_pending_one() {
    let mut c = with_background(960, 540);
    c.set_content(inputs("first"));
    c.set_content(inputs("second"));
    let events = c.run_until_idle();
    let composed = events
        .iter()
        .filter(|e| {
            **e == SceneEvent::Composed {
                layer: LayerKind::Content,
            }
        })
        .count();
    assert_eq!(composed, 1);
    assert_eq!(body_texts(&c), vec!["second".to_owned()]);
}

#[test]
fn newer_background_wins_over_a_pending_one() {
    let mut c = compositor();
    c.set_background(Some(png_source(320, 180, BG)));
    c.set_background(Some(png_source(640, 360, BG)));
    c.run_until_idle();
    assert_eq!(c.canvas(), Some(Canvas { width: 640, height: 360 }));
    assert_eq!(
        c.placed_images(LayerKind::Background),
        vec![Rect::new(0.0, 0.0, 640.0, 360.0)]
    );
}

#[test]
fn layer_is_cleared_as_soon_as_a_redraw_is_requested() {
    let mut c = with_background(960, 540);
    assert!(!c.placed_text().is_empty());
    c.set_content(inputs("next"));
    assert!(c.placed_text().is_empty());
    c.run_until_idle();
    assert_eq!(body_texts(&c), vec!["next".to_owned()]);
}

#[test]
fn text_is_scaled_onto_the_surface() {
    let mut c = with_background(960, 540);
    c.set_content(ContentInputs {
        mode: PresentationMode::Still,
        text: "A\nB".to_owned(),
        ..ContentInputs::default()
    });
    c.run_until_idle();
    let runs = c.placed_text();
    let (a, b) = (runs[1], runs[2]);
    assert_eq!(a.text, "A");
    assert_eq!(b.origin.y - a.origin.y, (38.0 + 20.0) * 0.5);
    assert_eq!(a.font_size, 19.0);
}

#[test]
fn clearing_the_background_empties_the_scene() {
    let mut c = with_background(960, 540);
    c.set_background(None);
    assert_eq!(c.canvas(), None);
    assert!(c.placed_images(LayerKind::Background).is_empty());
    assert!(c.placed_images(LayerKind::Content).is_empty());
    assert!(c.placed_images(LayerKind::Chrome).is_empty());
}

#[test]
fn undecodable_background_is_reported_not_fatal() {
    let mut c = compositor();
    c.set_background(Some(AssetSource::from_bytes(b"not an image".to_vec())));
    let events = c.run_until_idle();
    assert!(matches!(
        events.as_slice(),
        [SceneEvent::DecodeFailed {
            layer: LayerKind::Background,
            ..
        }]
    ));
    assert_eq!(c.canvas(), None);
    assert!(c.placed_images(LayerKind::Background).is_empty());
}

#[test]
fn very_wide_background_is_fitted_and_exports() {
    let mut c = with_background(70_000, 2);
    assert_eq!(c.canvas(), Some(Canvas { width: 1920, height: 1 }));

    let png = c.export().expect("export");
    let img = image::load_from_memory(&png).expect("png").to_rgba8();
    assert_eq!(img.dimensions(), (1920, 1));
    assert!(c.render_view().is_ok());
}

#[test]
fn undecodable_ui_asset_empties_content_and_chrome_only() {
    let ui = UiAssets::new(UiAssetKind::ALL.into_iter().map(|kind| {
        let source = match kind {
            UiAssetKind::Arrow => AssetSource::from_bytes(b"not a png".to_vec()),
            UiAssetKind::Credit => ui_assets().get(UiAssetKind::Credit).clone(),
            other => {
                let (w, h) = ui_size(other);
                png_source(w, h, [200, 200, 200, 255])
            }
        };
        (kind, source)
    }))
    .expect("bundle");
    let mut c = SceneCompositor::with_text_measure(ui, Box::new(FixedAdvanceMeasure::default()))
        .expect("compositor");
    c.set_content(inputs("hello"));
    c.set_background(Some(png_source(192, 108, BG)));
    let events = c.run_until_idle();

    assert!(events.contains(&SceneEvent::Composed {
        layer: LayerKind::Background
    }));
    for layer in [LayerKind::Content, LayerKind::Chrome] {
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SceneEvent::DecodeFailed { layer: l, .. } if *l == layer)),
            "{layer:?} failure reported"
        );
        assert!(c.placed_images(layer).is_empty());
    }
    assert!(c.placed_text().is_empty());
    assert_eq!(c.placed_images(LayerKind::Background).len(), 1);

    let png = c.export().expect("background still exports");
    let img = image::load_from_memory(&png).expect("png").to_rgba8();
    // Where the window and the nav icon would have been.
    assert_eq!(img.get_pixel(100, 100).0, BG);
    assert_eq!(img.get_pixel(170, 6).0, BG);
}

#[test]
fn undecodable_overlay_leaves_only_its_layer_empty() {
    let mut c = with_background(960, 540);
    c.add_overlay(
        OverlayKind::Image,
        OverlayId(0),
        Some(AssetSource::from_bytes(vec![0, 1, 2])),
    )
    .expect("add");
    let events = c.run_until_idle();
    assert!(events.iter().any(|e| matches!(
        e,
        SceneEvent::DecodeFailed {
            layer: LayerKind::Overlay(OverlayId(0)),
            ..
        }
    )));
    assert!(c.placed_images(LayerKind::Overlay(OverlayId(0))).is_empty());
    assert!(!c.placed_images(LayerKind::Content).is_empty());
    assert!(c.export().is_ok());
}

#[test]
fn first_overlay_asset_is_placed_with_identity() {
    let mut c = with_background(960, 540);
    c.add_overlay(OverlayKind::Sprite, OverlayId(3), Some(png_source(100, 60, BG)))
        .expect("add");
    c.run_until_idle();
    let overlay = c.overlay(OverlayId(3)).expect("overlay");
    assert_eq!(overlay.transform(), OverlayTransform::IDENTITY);
    assert_eq!(
        c.placed_images(LayerKind::Overlay(OverlayId(3))),
        vec![Rect::new(0.0, 0.0, 50.0, 30.0)]
    );
}

#[test]
fn overlay_transform_survives_source_swaps() {
    let mut c = with_background(960, 540);
    let id = OverlayId(0);
    c.add_overlay(OverlayKind::Image, id, Some(png_source(10, 10, BG)))
        .expect("add");
    c.run_until_idle();
    let held = OverlayTransform {
        x: 300.0,
        y: 120.0,
        rotation: 15.0,
        scale: 1.25,
    };
    assert!(c.set_overlay_transform(id, held));

    assert!(c.set_overlay_source(id, Some(png_source(20, 20, BG))));
    assert!(c.set_overlay_source(id, Some(png_source(40, 40, BG))));
    c.run_until_idle();

    assert_eq!(c.overlay(id).map(|o| o.transform()), Some(held));
    assert_eq!(
        c.placed_images(LayerKind::Overlay(id)),
        vec![Rect::new(0.0, 0.0, 20.0, 20.0)]
    );
}

#[test]
fn unknown_overlay_ids_are_ignored() {
    let mut c = with_background(960, 540);
    let ghost = OverlayId(42);
    assert!(!c.remove_overlay(ghost));
    assert!(!c.reorder_overlay(ghost, ReorderDirection::Up));
    assert!(!c.set_overlay_transform(ghost, OverlayTransform::IDENTITY));
    assert!(!c.reset_overlay_transform(ghost));
    assert!(!c.set_overlay_darken(ghost, true));
    assert!(!c.set_overlay_opacity(ghost, 50));
    assert!(!c.set_overlay_source(ghost, None));
    assert_eq!(c.layer_state(LayerKind::Overlay(ghost)), None);
}

#[test]
fn overlay_ids_and_order() {
    let mut c = compositor();
    assert_eq!(c.next_overlay_id(), OverlayId(0));
    c.add_overlay(OverlayKind::Image, OverlayId(0), None).expect("add");
    c.add_overlay(OverlayKind::Sprite, OverlayId(5), None).expect("add");
    c.add_overlay(OverlayKind::Image, OverlayId(2), None).expect("add");
    assert_eq!(c.next_overlay_id(), OverlayId(6));
    assert!(c.add_overlay(OverlayKind::Image, OverlayId(5), None).is_err());

    assert!(c.reorder_overlay(OverlayId(0), ReorderDirection::Up));
    assert_eq!(c.overlay_order(), vec![OverlayId(5), OverlayId(0), OverlayId(2)]);
    assert!(!c.reorder_overlay(OverlayId(2), ReorderDirection::Up));
    assert!(!c.reorder_overlay(OverlayId(5), ReorderDirection::Down));

    assert!(c.remove_overlay(OverlayId(5)));
    assert_eq!(c.overlay_order(), vec![OverlayId(0), OverlayId(2)]);
    assert_eq!(c.next_overlay_id(), OverlayId(3));
}

#[test]
fn removing_an_overlay_drops_its_pending_load() {
    let mut c = with_background(960, 540);
    let id = OverlayId(1);
    c.add_overlay(OverlayKind::Image, id, Some(png_source(10, 10, BG)))
        .expect("add");
    c.remove_overlay(id);
    c.add_overlay(OverlayKind::Image, id, None).expect("re-add");
    let events = c.run_until_idle();
    assert!(events.is_empty());
    assert!(c.placed_images(LayerKind::Overlay(id)).is_empty());
}

#[test]
fn overlay_commands_notify_listeners() {
    let mut c = with_background(960, 540);
    let id = OverlayId(0);
    c.add_overlay(OverlayKind::Image, id, Some(png_source(10, 10, BG)))
        .expect("add");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    c.overlay_mut(id)
        .expect("overlay")
        .subscribe(move |_, t| sink.borrow_mut().push(t));
    c.run_until_idle();
    c.reset_overlay_transform(id);
    assert_eq!(
        *seen.borrow(),
        vec![OverlayTransform::IDENTITY, OverlayTransform::IDENTITY]
    );
}

fn small_scene_with_overlay() -> SceneCompositor {
    let mut c = with_background(192, 108);
    let id = OverlayId(0);
    c.add_overlay(
        OverlayKind::Image,
        id,
        Some(png_source(100, 100, [255, 255, 0, 255])),
    )
    .expect("add");
    c.run_until_idle();
    c.set_overlay_transform(
        id,
        OverlayTransform {
            x: 50.0,
            y: 40.0,
            ..OverlayTransform::IDENTITY
        },
    );
    c
}

fn frame_pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

#[test]
fn export_hides_handles_and_restores_the_view() {
    let mut c = small_scene_with_overlay();
    c.set_view_zoom(0.5).expect("zoom");
    assert!(c.handles_visible());

    let png = c.export().expect("export");
    let img = image::load_from_memory(&png).expect("png").to_rgba8();
    assert_eq!(img.dimensions(), (192, 108));
    // Inside the top-left anchor, outside the overlay itself.
    assert_eq!(img.get_pixel(46, 36).0, BG);
    // The overlay is part of the artwork.
    assert_eq!(img.get_pixel(55, 45).0, [255, 255, 0, 255]);

    assert!(c.handles_visible());
    assert_eq!(c.view_zoom(), 0.5);

    c.set_view_zoom(1.0).expect("zoom");
    let live = c.render_view().expect("view");
    assert_eq!(frame_pixel(&live, 46, 36), [255, 255, 255, 255]);
}

#[test]
fn darken_and_opacity_reach_the_export() {
    let mut c = small_scene_with_overlay();
    let id = OverlayId(0);
    assert!(c.set_overlay_darken(id, true));
    let png = c.export().expect("export");
    let img = image::load_from_memory(&png).expect("png").to_rgba8();
    assert_eq!(img.get_pixel(55, 45).0, [127, 127, 0, 255]);

    assert!(c.set_overlay_darken(id, false));
    assert!(c.set_overlay_opacity(id, 0));
    let png = c.export().expect("export");
    let img = image::load_from_memory(&png).expect("png").to_rgba8();
    assert_eq!(img.get_pixel(55, 45).0, BG);
}

#[test]
fn nav_follows_area_display() {
    let mut c = with_background(960, 540);
    c.set_content(ContentInputs {
        area_display: AreaDisplay::UiEmbedded,
        ..inputs("x")
    });
    c.run_until_idle();
    let nav = c.placed_images(LayerKind::Chrome)[0];
    assert_eq!(nav.x0, 10.0);
}
