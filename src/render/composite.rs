use crate::foundation::{
    error::{TalkgenError, TalkgenResult},
    math::mul_div255_u8,
};

pub type PremulRgba8 = [u8; 4];

/// Source-over of one premultiplied pixel, with `opacity` applied to the source.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> TalkgenResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TalkgenError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Value curve of -1: every color channel is halved, alpha untouched.
///
/// Scaling a premultiplied channel is the same as scaling the straight one, so this works on
/// premultiplied data directly.
pub fn darken_in_place(rgba8_premul: &mut [u8]) {
    for px in rgba8_premul.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c /= 2;
        }
    }
}

pub fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = px[3];
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return px;
    }
    let un = |c: u8| -> u8 {
        ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
    };
    [un(px[0]), un(px[1]), un(px[2]), a]
}

/// Encode a premultiplied RGBA8 frame as PNG.
pub fn encode_png(width: u32, height: u32, rgba8_premul: &[u8]) -> TalkgenResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TalkgenError::render("frame size overflow"))?;
    if rgba8_premul.len() != expected {
        return Err(TalkgenError::render(format!(
            "frame byte length {} does not match {width}x{height}",
            rgba8_premul.len()
        )));
    }

    let straight: Vec<u8> = rgba8_premul
        .chunks_exact(4)
        .flat_map(|px| unpremultiply([px[0], px[1], px[2], px[3]]))
        .collect();
    let img = image::RgbaImage::from_raw(width, height, straight)
        .ok_or_else(|| TalkgenError::render("frame buffer rejected by png encoder"))?;

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| TalkgenError::render(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
