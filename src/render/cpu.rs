use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2},
    foundation::error::{TalkgenError, TalkgenResult},
    render::composite,
    scene::{model::DrawItem, overlay::TransformableOverlay},
    text::{
        layout::TextRun,
        measure::{FontSet, FontWeight, ParleyText},
    },
};

const ANCHOR_SIZE: f64 = 20.0;
const BORDER_DASH: [f64; 2] = [3.0, 3.0];

/// One compositing layer handed to the renderer, bottom to top.
pub(crate) enum RenderLayer<'a> {
    Items(&'a [DrawItem]),
    Overlay(&'a TransformableOverlay),
}

/// How the frame is presented.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ViewOptions {
    pub(crate) zoom: f64,
    pub(crate) show_handles: bool,
}

/// A rendered frame, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major.
    pub data: Vec<u8>,
}

struct GlyphFonts {
    shaper: ParleyText,
    medium: vello_cpu::peniko::FontData,
    bold: vello_cpu::peniko::FontData,
}

/// Rasterizes scene layers with `vello_cpu`, one pixmap per layer, composited with
/// premultiplied source-over.
pub(crate) struct CpuRenderer {
    fonts: Option<GlyphFonts>,
}

impl CpuRenderer {
    /// Without fonts, text runs are skipped.
    pub(crate) fn new(fonts: Option<&FontSet>) -> TalkgenResult<Self> {
        let fonts = match fonts {
            Some(set) => Some(GlyphFonts {
                shaper: ParleyText::new(set)?,
                medium: font_data(set.bytes(FontWeight::Medium)),
                bold: font_data(set.bytes(FontWeight::Bold)),
            }),
            None => None,
        };
        Ok(Self { fonts })
    }

    pub(crate) fn render(
        &mut self,
        canvas: Canvas,
        view: ViewOptions,
        layers: &[RenderLayer<'_>],
    ) -> TalkgenResult<FrameRGBA> {
        if !view.zoom.is_finite() || view.zoom <= 0.0 {
            return Err(TalkgenError::render("view zoom must be finite and > 0"));
        }
        let width = ((f64::from(canvas.width) * view.zoom).round() as u32).max(1);
        let height = ((f64::from(canvas.height) * view.zoom).round() as u32).max(1);
        let w: u16 = width
            .try_into()
            .map_err(|_| TalkgenError::render("frame width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| TalkgenError::render("frame height exceeds u16"))?;

        let view_affine = Affine::scale(view.zoom);
        let mut frame = vec![0u8; Canvas { width, height }.rgba_len()];

        for layer in layers {
            match layer {
                RenderLayer::Items(items) => {
                    if items.is_empty() {
                        continue;
                    }
                    let pixmap = self.paint_layer(w, h, |this, ctx| {
                        for item in items.iter() {
                            this.draw_item(ctx, view_affine, item)?;
                        }
                        Ok(())
                    })?;
                    composite::over_in_place(&mut frame, pixmap.data_as_u8_slice(), 1.0)?;
                }
                RenderLayer::Overlay(overlay) => {
                    if !overlay.items().is_empty() {
                        let local = view_affine * overlay.transform().affine();
                        let mut pixmap = self.paint_layer(w, h, |this, ctx| {
                            for item in overlay.items() {
                                this.draw_item(ctx, local, item)?;
                            }
                            Ok(())
                        })?;
                        if overlay.darken() {
                            composite::darken_in_place(pixmap.data_as_u8_slice_mut());
                        }
                        composite::over_in_place(
                            &mut frame,
                            pixmap.data_as_u8_slice(),
                            overlay.effective_opacity(),
                        )?;
                    }
                    if view.show_handles
                        && let Some(bounds) = overlay.local_bounds()
                    {
                        let pixmap = self.paint_layer(w, h, |_, ctx| {
                            draw_handles(ctx, view_affine, overlay, bounds);
                            Ok(())
                        })?;
                        composite::over_in_place(&mut frame, pixmap.data_as_u8_slice(), 1.0)?;
                    }
                }
            }
        }

        Ok(FrameRGBA {
            width,
            height,
            data: frame,
        })
    }

    fn paint_layer(
        &mut self,
        w: u16,
        h: u16,
        draw: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> TalkgenResult<()>,
    ) -> TalkgenResult<vello_cpu::Pixmap> {
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        draw(self, &mut ctx)?;
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap)
    }

    fn draw_item(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        base: Affine,
        item: &DrawItem,
    ) -> TalkgenResult<()> {
        match item {
            DrawItem::Image {
                image,
                rect,
                opacity,
            } => draw_image(ctx, base, image, *rect, *opacity),
            DrawItem::Text(run) => self.draw_text(ctx, base, run),
        }
    }

    /// Stroke first, then fill, with the line box top at `run.origin.y`.
    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        base: Affine,
        run: &TextRun,
    ) -> TalkgenResult<()> {
        if run.text.is_empty() {
            return Ok(());
        }
        let Some(fonts) = self.fonts.as_mut() else {
            tracing::debug!(text = %run.text, "no fonts loaded; skipping text run");
            return Ok(());
        };

        let layout = fonts
            .shaper
            .layout_line(&run.text, run.font_size as f32, run.style.weight)?;
        let font = match run.style.weight {
            FontWeight::Medium => &fonts.medium,
            FontWeight::Bold => &fonts.bold,
        };

        for line in layout.lines() {
            let metrics = line.metrics();
            let baseline = run.origin.y
                + run.font_size / 2.0
                + f64::from(metrics.ascent - metrics.descent) / 2.0;
            let shift = Vec2::new(run.origin.x, baseline - f64::from(metrics.baseline));
            ctx.set_transform(affine_to_cpu(base * Affine::translate(shift)));

            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let size = glyph_run.run().font_size();
                let glyphs = || {
                    glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                };

                if let Some(stroke) = run.style.stroke {
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
                    ctx.set_paint(color_to_cpu(stroke.color));
                    ctx.glyph_run(font).font_size(size).stroke_glyphs(glyphs());
                }
                ctx.set_paint(color_to_cpu(run.style.fill));
                ctx.glyph_run(font).font_size(size).fill_glyphs(glyphs());
            }
        }
        Ok(())
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    base: Affine,
    image: &PreparedImage,
    rect: Rect,
    opacity: f32,
) -> TalkgenResult<()> {
    if opacity <= 0.0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Ok(());
    }
    let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let place = Affine::translate(Vec2::new(rect.x0, rect.y0))
        * Affine::scale_non_uniform(rect.width() / iw, rect.height() / ih);

    ctx.set_transform(affine_to_cpu(base * place));
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

/// Dashed border around the overlay plus four square corner anchors in the slot color.
fn draw_handles(
    ctx: &mut vello_cpu::RenderContext,
    view: Affine,
    overlay: &TransformableOverlay,
    bounds: Rect,
) {
    let transform = overlay.transform();
    let to_surface = view * transform.affine();
    let corners = [
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
    ]
    .map(|p| to_surface * p);
    let color = color_to_cpu(overlay.color());

    let mut border = vello_cpu::kurbo::BezPath::new();
    border.move_to(point_to_cpu(corners[0]));
    for corner in &corners[1..] {
        border.line_to(point_to_cpu(*corner));
    }
    border.close_path();

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(1.0).with_dashes(0.0, BORDER_DASH));
    ctx.set_paint(color);
    ctx.stroke_path(&border);

    let half = ANCHOR_SIZE / 2.0;
    let anchor = vello_cpu::kurbo::Rect::new(-half, -half, half, half);
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(1.0));
    for corner in corners {
        let at = Affine::translate(corner.to_vec2()) * Affine::rotate(transform.rotation.to_radians());
        ctx.set_transform(affine_to_cpu(at));
        ctx.set_paint(color_to_cpu(Rgba8::WHITE));
        ctx.fill_rect(&anchor);
        ctx.set_paint(color);
        ctx.stroke_rect(&anchor);
    }
}

fn font_data(bytes: &std::sync::Arc<Vec<u8>>) -> vello_cpu::peniko::FontData {
    vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.as_ref().clone()), 0)
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> TalkgenResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TalkgenError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TalkgenError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(TalkgenError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels: Vec<_> = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
