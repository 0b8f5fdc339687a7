//! Construction of the content and chrome layers for each presentation mode.
//!
//! All constants are in design space (1920x1080) and reach the surface through
//! [`ScaleTransform`] exactly once.

use crate::{
    assets::store::{DecodeCache, DecodedAsset, UiAssetKind, UiAssets},
    foundation::core::{Point, Rect, Rgba8},
    foundation::error::TalkgenResult,
    scene::{
        model::{AreaDisplay, ContentInputs, DrawItem, PresentationMode},
        scale::ScaleTransform,
    },
    text::{
        layout::{
            DialogueLayout, RunKind, TextLayoutEngine, TextRun, TextStroke, TextStyle,
            split_lines,
        },
        measure::{FontWeight, TextMeasure},
    },
};

const NAME_FONT_SIZE: f64 = 30.0;
const CREDIT_WIDTH: f64 = 640.0;
const CREDIT_HEIGHT: f64 = 100.0;
const AREA_TOP: f64 = 22.0;
const AREA_TEXT_LEFT: f64 = 65.0;
const AREA_TEXT_TOP: f64 = 26.0;
const AREA_FONT_SIZE: f64 = 34.0;
const NAV_TOP: f64 = 30.0;
const NAV_MARGIN_LEFT: f64 = 20.0;
const NAV_MARGIN_RIGHT: f64 = 50.0;

#[derive(Clone, Copy, Debug)]
enum NameAlign {
    Center,
    Right,
}

/// Layout constants of one presentation mode.
struct WindowMetrics {
    window: UiAssetKind,
    watermark_opacity: f32,
    name_origin: (f64, f64),
    name_box_width: f64,
    name_align: NameAlign,
    name_style: TextStyle,
    body_origin: (f64, f64),
    body_font_size: f64,
    body_big_font_size: f64,
    body_style: TextStyle,
    line_gap: f64,
    arrow_origin: (f64, f64),
}

const OUTLINE_4: Option<TextStroke> = Some(TextStroke {
    color: Rgba8::BLACK,
    width: 4.0,
});

const NORMAL: WindowMetrics = WindowMetrics {
    window: UiAssetKind::TalkWindow,
    watermark_opacity: 0.3,
    name_origin: (100.0, 24.0),
    name_box_width: 355.0,
    name_align: NameAlign::Center,
    name_style: TextStyle {
        weight: FontWeight::Medium,
        fill: Rgba8::WHITE,
        stroke: None,
    },
    body_origin: (200.0, 110.0),
    body_font_size: 42.0,
    body_big_font_size: 105.0,
    body_style: TextStyle {
        weight: FontWeight::Bold,
        fill: Rgba8::BLACK,
        stroke: None,
    },
    line_gap: TextLayoutEngine::WINDOW_LINE_GAP,
    arrow_origin: (210.0, 106.0),
};

const STILL: WindowMetrics = WindowMetrics {
    window: UiAssetKind::StillBackdrop,
    watermark_opacity: 0.2,
    name_origin: (0.0, 69.0),
    name_box_width: 535.0,
    name_align: NameAlign::Right,
    name_style: TextStyle {
        weight: FontWeight::Medium,
        fill: Rgba8::WHITE,
        stroke: OUTLINE_4,
    },
    body_origin: (555.0, 64.0),
    body_font_size: 38.0,
    body_big_font_size: 95.0,
    body_style: TextStyle {
        weight: FontWeight::Medium,
        fill: Rgba8::WHITE,
        stroke: OUTLINE_4,
    },
    line_gap: TextLayoutEngine::STILL_LINE_GAP,
    arrow_origin: (575.0, 64.0),
};

impl WindowMetrics {
    fn for_mode(mode: PresentationMode) -> &'static Self {
        match mode {
            PresentationMode::Normal => &NORMAL,
            PresentationMode::Still => &STILL,
        }
    }

    fn font_size(&self, big_text: bool) -> f64 {
        if big_text {
            self.body_big_font_size
        } else {
            self.body_font_size
        }
    }
}

/// Decoded sources needed for one content/chrome redraw.
pub(crate) struct LoadedUi {
    window: DecodedAsset,
    credit: DecodedAsset,
    arrow: DecodedAsset,
    area: Option<DecodedAsset>,
    nav: DecodedAsset,
}

/// Children of the content and chrome layers after a redraw.
#[derive(Debug, Default)]
pub(crate) struct ComposedUi {
    pub(crate) content: Vec<DrawItem>,
    pub(crate) chrome: Vec<DrawItem>,
}

fn nav_kind(mode: PresentationMode) -> UiAssetKind {
    match mode {
        PresentationMode::Normal => UiAssetKind::Nav,
        PresentationMode::Still => UiAssetKind::NavFace,
    }
}

/// Decode every source `inputs` needs. This is where a redraw waits.
pub(crate) fn load_ui(
    cache: &mut DecodeCache,
    ui: &UiAssets,
    inputs: &ContentInputs,
) -> TalkgenResult<LoadedUi> {
    let metrics = WindowMetrics::for_mode(inputs.mode);
    let area = match inputs.area_display {
        AreaDisplay::Show => Some(cache.decode(ui.get(UiAssetKind::AreaName))?),
        AreaDisplay::Hide | AreaDisplay::UiEmbedded => None,
    };
    Ok(LoadedUi {
        window: cache.decode(ui.get(metrics.window))?,
        credit: cache.decode(ui.get(UiAssetKind::Credit))?,
        arrow: cache.decode(ui.get(UiAssetKind::Arrow))?,
        area,
        nav: cache.decode(ui.get(nav_kind(inputs.mode)))?,
    })
}

/// Lay out the body text of `inputs` in design space, relative to the top of the window image.
pub fn layout_dialogue(measure: &mut dyn TextMeasure, inputs: &ContentInputs) -> DialogueLayout {
    let metrics = WindowMetrics::for_mode(inputs.mode);
    let (left, top) = metrics.body_origin;
    TextLayoutEngine::new(metrics.line_gap).layout(
        measure,
        &split_lines(&inputs.text),
        Point::new(left, top),
        metrics.font_size(inputs.big_text),
        &metrics.body_style,
    )
}

/// Build both layers. Draw order inside the content layer is fixed: window, watermark, name,
/// body runs, arrow, then the area banner.
#[tracing::instrument(skip_all, fields(mode = ?inputs.mode, big = inputs.big_text))]
pub(crate) fn compose_ui(
    scale: ScaleTransform,
    measure: &mut dyn TextMeasure,
    loaded: &LoadedUi,
    inputs: &ContentInputs,
) -> TalkgenResult<ComposedUi> {
    let metrics = WindowMetrics::for_mode(inputs.mode);
    let surface_w = scale.surface_width();
    let surface_h = scale.surface_height();
    let mut content = Vec::new();

    let (win_w, win_h) = loaded.window.intrinsic_size();
    let base_y = surface_h - scale.x(win_h);
    content.push(place(
        &loaded.window,
        Rect::new(0.0, base_y, scale.x(win_w), base_y + scale.x(win_h)),
        1.0,
    )?);

    content.push(place(
        &loaded.credit,
        Rect::new(
            surface_w - scale.x(CREDIT_WIDTH),
            surface_h - scale.x(CREDIT_HEIGHT),
            surface_w,
            surface_h,
        ),
        metrics.watermark_opacity,
    )?);

    let name_width = measure.advance(&inputs.char_name, NAME_FONT_SIZE, metrics.name_style.weight);
    let slack = metrics.name_box_width - name_width;
    let name_x = metrics.name_origin.0
        + match metrics.name_align {
            NameAlign::Center => slack / 2.0,
            NameAlign::Right => slack,
        };
    let name = TextRun {
        kind: RunKind::Base,
        text: inputs.char_name.clone(),
        origin: Point::new(name_x, metrics.name_origin.1),
        font_size: NAME_FONT_SIZE,
        width: name_width,
        style: metrics.name_style,
    };
    content.push(DrawItem::Text(to_surface(&name, scale, base_y)));

    let body = layout_dialogue(measure, inputs);
    content.extend(
        body.runs
            .iter()
            .map(|run| DrawItem::Text(to_surface(run, scale, base_y))),
    );

    let font_size = metrics.font_size(inputs.big_text);
    let (arrow_w, arrow_h) = loaded.arrow.intrinsic_size();
    let arrow_nudge = if inputs.big_text { 10.0 } else { 3.0 };
    let last_line = body.line_count.saturating_sub(1) as f64;
    let arrow_x = scale.x(metrics.arrow_origin.0 + body.last_line_advance);
    let arrow_y = base_y
        + scale.x(
            metrics.arrow_origin.1 + font_size - arrow_h - arrow_nudge
                + last_line * (font_size + metrics.line_gap),
        );
    content.push(place(
        &loaded.arrow,
        Rect::new(
            arrow_x,
            arrow_y,
            arrow_x + scale.x(arrow_w),
            arrow_y + scale.x(arrow_h),
        ),
        1.0,
    )?);

    if let Some(area) = &loaded.area {
        let (area_w, area_h) = area.intrinsic_size();
        let top = scale.y(AREA_TOP);
        content.push(place(
            area,
            Rect::new(0.0, top, scale.x(area_w), top + scale.x(area_h)),
            1.0,
        )?);
        let label = TextRun {
            kind: RunKind::Base,
            text: inputs.area_name.clone(),
            origin: Point::new(AREA_TEXT_LEFT, AREA_TEXT_TOP),
            font_size: AREA_FONT_SIZE,
            width: measure.advance(&inputs.area_name, AREA_FONT_SIZE, FontWeight::Bold),
            style: TextStyle {
                weight: FontWeight::Bold,
                fill: Rgba8::WHITE,
                stroke: Some(TextStroke {
                    color: Rgba8::BLACK,
                    width: 5.0,
                }),
            },
        };
        content.push(DrawItem::Text(to_surface(&label, scale, top)));
    }

    let (nav_w, nav_h) = loaded.nav.intrinsic_size();
    let nav_x = match inputs.area_display {
        AreaDisplay::UiEmbedded => scale.x(NAV_MARGIN_LEFT),
        AreaDisplay::Show | AreaDisplay::Hide => {
            surface_w - scale.x(nav_w) - scale.x(NAV_MARGIN_RIGHT)
        }
    };
    let nav_y = scale.x(NAV_TOP);
    let chrome = vec![place(
        &loaded.nav,
        Rect::new(nav_x, nav_y, nav_x + scale.x(nav_w), nav_y + scale.x(nav_h)),
        1.0,
    )?];

    Ok(ComposedUi { content, chrome })
}

fn place(asset: &DecodedAsset, rect: Rect, opacity: f32) -> TalkgenResult<DrawItem> {
    Ok(DrawItem::Image {
        image: asset.to_image(rect.width(), rect.height())?,
        rect,
        opacity,
    })
}

/// Map a design-space run onto the surface; `top` is the surface y the run's design y is
/// relative to.
fn to_surface(run: &TextRun, scale: ScaleTransform, top: f64) -> TextRun {
    TextRun {
        kind: run.kind,
        text: run.text.clone(),
        origin: Point::new(scale.x(run.origin.x), top + scale.x(run.origin.y)),
        font_size: scale.x(run.font_size),
        width: scale.x(run.width),
        style: TextStyle {
            stroke: run.style.stroke.map(|s| TextStroke {
                color: s.color,
                width: scale.x(s.width),
            }),
            ..run.style
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/content.rs"]
mod tests;
