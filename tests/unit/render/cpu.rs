use std::sync::Arc;

use super::*;
use crate::scene::{
    model::OverlayId,
    overlay::{OverlayKind, OverlayTransform},
};

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(rgba.repeat((w * h) as usize)),
    }
}

fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn view(zoom: f64, show_handles: bool) -> ViewOptions {
    ViewOptions { zoom, show_handles }
}

const CANVAS: Canvas = Canvas {
    width: 64,
    height: 32,
};

#[test]
fn image_item_fills_its_rect() {
    let items = vec![DrawItem::Image {
        image: solid(2, 2, [255, 0, 0, 255]),
        rect: Rect::new(0.0, 0.0, 32.0, 32.0),
        opacity: 1.0,
    }];
    let mut r = CpuRenderer::new(None).expect("renderer");
    let frame = r
        .render(CANVAS, view(1.0, false), &[RenderLayer::Items(&items)])
        .expect("render");
    assert_eq!((frame.width, frame.height), (64, 32));
    assert_eq!(pixel(&frame, 16, 16), [255, 0, 0, 255]);
    assert_eq!(pixel(&frame, 48, 16), [0, 0, 0, 0]);
}

#[test]
fn later_layers_draw_on_top() {
    let bottom = vec![DrawItem::Image {
        image: solid(1, 1, [255, 0, 0, 255]),
        rect: Rect::new(0.0, 0.0, 64.0, 32.0),
        opacity: 1.0,
    }];
    let top = vec![DrawItem::Image {
        image: solid(1, 1, [0, 0, 255, 255]),
        rect: Rect::new(0.0, 0.0, 32.0, 32.0),
        opacity: 1.0,
    }];
    let mut r = CpuRenderer::new(None).expect("renderer");
    let frame = r
        .render(
            CANVAS,
            view(1.0, false),
            &[RenderLayer::Items(&bottom), RenderLayer::Items(&top)],
        )
        .expect("render");
    assert_eq!(pixel(&frame, 10, 10), [0, 0, 255, 255]);
    assert_eq!(pixel(&frame, 50, 10), [255, 0, 0, 255]);
}

#[test]
fn zoom_scales_the_output() {
    let items = vec![DrawItem::Image {
        image: solid(1, 1, [0, 255, 0, 255]),
        rect: Rect::new(0.0, 0.0, 64.0, 32.0),
        opacity: 1.0,
    }];
    let mut r = CpuRenderer::new(None).expect("renderer");
    let frame = r
        .render(CANVAS, view(0.5, false), &[RenderLayer::Items(&items)])
        .expect("render");
    assert_eq!((frame.width, frame.height), (32, 16));
    assert_eq!(pixel(&frame, 16, 8), [0, 255, 0, 255]);
}

#[test]
fn invalid_zoom_is_rejected() {
    let mut r = CpuRenderer::new(None).expect("renderer");
    assert!(r.render(CANVAS, view(0.0, false), &[]).is_err());
}

fn placed_overlay() -> TransformableOverlay {
    let mut overlay = TransformableOverlay::new(OverlayId(0), OverlayKind::Image);
    let _ = overlay.begin_source();
    overlay.complete_source(solid(1, 1, [200, 100, 50, 255]), Vec2::new(20.0, 20.0));
    overlay.set_transform(OverlayTransform {
        x: 30.0,
        y: 6.0,
        ..OverlayTransform::IDENTITY
    });
    overlay
}

#[test]
fn overlay_is_drawn_at_its_transform_and_darkened() {
    let mut overlay = placed_overlay();
    let mut r = CpuRenderer::new(None).expect("renderer");
    let frame = r
        .render(CANVAS, view(1.0, false), &[RenderLayer::Overlay(&overlay)])
        .expect("render");
    assert_eq!(pixel(&frame, 40, 16), [200, 100, 50, 255]);
    assert_eq!(pixel(&frame, 10, 16), [0, 0, 0, 0]);

    overlay.set_darken(true);
    let frame = r
        .render(CANVAS, view(1.0, false), &[RenderLayer::Overlay(&overlay)])
        .expect("render");
    assert_eq!(pixel(&frame, 40, 16), [100, 50, 25, 255]);
}

#[test]
fn handles_only_when_requested() {
    let overlay = placed_overlay();
    let mut r = CpuRenderer::new(None).expect("renderer");
    // Just outside the overlay, inside the top-left anchor.
    let hidden = r
        .render(CANVAS, view(1.0, false), &[RenderLayer::Overlay(&overlay)])
        .expect("render");
    assert_eq!(pixel(&hidden, 26, 3), [0, 0, 0, 0]);

    let shown = r
        .render(CANVAS, view(1.0, true), &[RenderLayer::Overlay(&overlay)])
        .expect("render");
    assert_eq!(pixel(&shown, 26, 3), [255, 255, 255, 255]);
}
