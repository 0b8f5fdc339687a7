use std::sync::Arc;

use crate::{
    assets::store::{PreparedImage, PreparedSvg},
    foundation::error::{TalkgenError, TalkgenResult},
};

// Keeps a hostile SVG header from requesting a gigantic pixmap.
const MAX_SVG_DIM: u32 = 16_384;

/// Largest raster edge the renderer accepts.
pub(crate) const MAX_RASTER_DIM: u32 = u16::MAX as u32;

pub(crate) fn decode_image(bytes: &[u8]) -> TalkgenResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| TalkgenError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TalkgenError::decode("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn parse_svg(bytes: &[u8]) -> TalkgenResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| TalkgenError::decode(format!("parse svg tree: {e}")))?;
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

/// Rasterize `svg` stretched to exactly `width` x `height` pixels.
pub(crate) fn rasterize_svg(
    svg: &PreparedSvg,
    width: u32,
    height: u32,
) -> TalkgenResult<PreparedImage> {
    let (width, height) = (width.max(1), height.max(1));
    if width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(TalkgenError::render(format!(
            "svg raster size too large: {width}x{height} (max {MAX_SVG_DIM}x{MAX_SVG_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| TalkgenError::render("failed to allocate svg pixmap"))?;

    let size = svg.tree.size();
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&svg.tree, xform, &mut pixmap.as_mut());

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

/// Resample premultiplied pixels to `width` x `height`.
///
/// Filtering premultiplied data keeps transparent edges free of dark fringes.
pub(crate) fn resample_premul(
    img: &PreparedImage,
    width: u32,
    height: u32,
) -> TalkgenResult<PreparedImage> {
    let (width, height) = (width.max(1), height.max(1));
    if (width, height) == (img.width, img.height) {
        return Ok(img.clone());
    }
    let src = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        img.width,
        img.height,
        img.rgba8_premul.as_slice(),
    )
    .ok_or_else(|| TalkgenError::render("prepared image byte length mismatch"))?;
    let out = image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(out.into_raw()),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
