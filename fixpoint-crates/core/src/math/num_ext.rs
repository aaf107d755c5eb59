//! Integer helpers for shifting and scaling bounds without overflowing.

pub trait NumExt: Sized {
    /// Division with rounding up.
    fn div_ceil(self, other: Self) -> Self;

    /// Division with rounding down.
    ///
    /// Note this is different from truncating, which is rounding toward zero.
    fn div_floor(self, other: Self) -> Self;

    /// Computes `scale * self + offset`, saturating at the numeric bounds.
    fn saturating_map(self, scale: Self, offset: Self) -> Self;
}

impl NumExt for i32 {
    fn div_ceil(self, other: Self) -> Self {
        let d = self / other;
        let r = self % other;
        if (r > 0 && other > 0) || (r < 0 && other < 0) {
            d + 1
        } else {
            d
        }
    }

    fn div_floor(self, other: Self) -> Self {
        let d = self / other;
        let r = self % other;
        if (r > 0 && other < 0) || (r < 0 && other > 0) {
            d - 1
        } else {
            d
        }
    }

    fn saturating_map(self, scale: Self, offset: Self) -> Self {
        self.saturating_mul(scale).saturating_add(offset)
    }
}

impl NumExt for i64 {
    fn div_ceil(self, other: Self) -> Self {
        let d = self / other;
        let r = self % other;
        if (r > 0 && other > 0) || (r < 0 && other < 0) {
            d + 1
        } else {
            d
        }
    }

    fn div_floor(self, other: Self) -> Self {
        let d = self / other;
        let r = self % other;
        if (r > 0 && other < 0) || (r < 0 && other > 0) {
            d - 1
        } else {
            d
        }
    }

    fn saturating_map(self, scale: Self, offset: Self) -> Self {
        self.saturating_mul(scale).saturating_add(offset)
    }
}

/// Narrows a 64-bit intermediate result to an `i32` bound, clamping toward the representable
/// extreme instead of wrapping.
pub fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
