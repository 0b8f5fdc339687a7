#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Half-way cases round toward positive infinity, so `-2.5` reports as `-2`.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Positions are reported as whole pixels.
pub(crate) fn round_position(v: f64) -> f64 {
    round_half_up(v)
}

/// Rotations are reported with one decimal place.
pub(crate) fn round_rotation(deg: f64) -> f64 {
    round_half_up(deg * 10.0) / 10.0
}

/// Scales are reported with three decimal places.
pub(crate) fn round_scale(s: f64) -> f64 {
    round_half_up(s * 1000.0) / 1000.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
