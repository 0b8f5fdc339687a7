use crate::foundation::core::Canvas;

/// Width of the reference canvas every layout constant is authored against.
pub const DESIGN_WIDTH: f64 = 1920.0;
/// Height of the reference canvas every layout constant is authored against.
pub const DESIGN_HEIGHT: f64 = 1080.0;

/// Maps design-space measurements onto the current render surface.
///
/// `x` and `y` are independent so a surface whose aspect differs from 16:9 keeps both axes
/// available; dialogue chrome uses `x` for sizes along both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleTransform {
    width: f64,
    height: f64,
}

impl ScaleTransform {
    /// Transform for a surface of `width` x `height` pixels.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Transform for `canvas`.
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self::new(f64::from(canvas.width), f64::from(canvas.height))
    }

    /// Horizontal design value in surface pixels.
    pub fn x(&self, value: f64) -> f64 {
        value * self.width / DESIGN_WIDTH
    }

    /// Vertical design value in surface pixels.
    pub fn y(&self, value: f64) -> f64 {
        value * self.height / DESIGN_HEIGHT
    }

    /// Surface width in pixels.
    pub fn surface_width(&self) -> f64 {
        self.width
    }

    /// Surface height in pixels.
    pub fn surface_height(&self) -> f64 {
        self.height
    }
}

/// Size of the render surface for a background of `width` x `height`: the long side is limited
/// to [`DESIGN_WIDTH`], preserving aspect.
pub fn fit_background(width: u32, height: u32) -> Canvas {
    let long_side = width.max(height);
    let limit = DESIGN_WIDTH as u32;
    if long_side <= limit {
        return Canvas { width, height };
    }
    let ratio = DESIGN_WIDTH / f64::from(long_side);
    Canvas {
        width: ((f64::from(width) * ratio).round() as u32).max(1),
        height: ((f64::from(height) * ratio).round() as u32).max(1),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scale.rs"]
mod tests;
