//! Two's-complement fixed-point fields.
//!
//! A physical value `v` travels as `round(v * 2^frac_bits)` in a signed field
//! of `bits` width. Decoding sign-extends the raw field back to `i64` before
//! scaling.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Width and scale of a signed fixed-point field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPoint {
    /// Total field width in bits, sign bit included.
    pub bits: u32,
    /// Bits after the binary point.
    pub frac_bits: u32,
}

impl FixedPoint {
    /// Latitude in degrees.
    pub const LATITUDE: Self = Self::new(34, 25);
    /// Longitude in degrees.
    pub const LONGITUDE: Self = Self::new(34, 25);
    /// Altitude, unit given by the altitude type.
    pub const ALTITUDE: Self = Self::new(30, 8);
    /// Floor number in 1/16 floors.
    pub const FLOOR: Self = Self::new(14, 4);
    /// Height above floor in 1/4096 m.
    pub const HEIGHT_ABOVE_FLOOR: Self = Self::new(24, 12);

    pub const fn new(bits: u32, frac_bits: u32) -> Self {
        Self { bits, frac_bits }
    }

    #[inline]
    fn scale(self) -> f64 {
        f64::from(1u32 << self.frac_bits)
    }

    #[inline]
    fn mask(self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Smallest representable integer.
    #[inline]
    pub fn min_raw(self) -> i64 {
        -(1i64 << (self.bits - 1))
    }

    /// Largest representable integer.
    #[inline]
    pub fn max_raw(self) -> i64 {
        (1i64 << (self.bits - 1)) - 1
    }

    /// Smallest representable physical value.
    pub fn min_value(self) -> f64 {
        self.min_raw() as f64 / self.scale()
    }

    /// Largest representable physical value.
    pub fn max_value(self) -> f64 {
        self.max_raw() as f64 / self.scale()
    }

    /// Quantize `value` to the raw field bits.
    ///
    /// Values outside the representable range are clamped to the nearest end
    /// and reported as `RangeViolation`. NaN encodes as zero, also reported.
    ///
    /// # Arguments
    /// * `value` - Physical value
    /// * `field` - Field name for the diagnostic
    /// * `id` - Subelement the field belongs to
    /// * `diags` - Diagnostics sink
    ///
    /// # Returns
    /// Two's-complement bits, right-justified in `self.bits`.
    pub fn encode(self, value: f64, field: &str, id: u8, diags: &mut Diagnostics) -> u64 {
        if value.is_nan() {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} is NaN, encoded as 0"),
            );
            return 0;
        }

        let scaled = (value * self.scale()).round();
        let raw = if scaled < self.min_raw() as f64 {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} {value} below {}, clamped", self.min_value()),
            );
            self.min_raw()
        } else if scaled > self.max_raw() as f64 {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} {value} above {}, clamped", self.max_value()),
            );
            self.max_raw()
        } else {
            scaled as i64
        };

        (raw as u64) & self.mask()
    }

    /// Turn raw field bits back into a physical value.
    pub fn decode(self, raw: u64) -> f64 {
        sign_extend(raw, self.bits) as f64 / self.scale()
    }
}

/// Sign-extend the low `bits` of `raw` to a full `i64`.
///
/// Bits above `bits` are ignored.
pub fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    if bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b0111, 4), 7);
        assert_eq!(sign_extend(0b1000, 4), -8);
        assert_eq!(sign_extend(0b1111, 4), -1);
        assert_eq!(sign_extend(0xFF0F, 4), -1);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
        assert_eq!(sign_extend(1, 0), 0);
    }

    #[test]
    fn test_sign_extend_34_bit() {
        let top = 1u64 << 33;
        assert!(sign_extend(top, 34) < 0);
        assert_eq!(sign_extend(top, 34), -(1i64 << 33));
        assert!(sign_extend(top - 1, 34) > 0);
        assert!(FixedPoint::LATITUDE.decode(top | 1) < 0.0);
        assert!(FixedPoint::LATITUDE.decode(top - 1) >= 0.0);
    }

    #[test]
    fn test_latitude_encode() {
        let mut diags = Diagnostics::new();
        let raw = FixedPoint::LATITUDE.encode(-33.857_009_5, "latitude", 0, &mut diags);
        // Two's complement of 1136052723 in 34 bits
        assert_eq!(raw, (1u64 << 34) - 1_136_052_723);
        assert!(diags.is_empty());

        let back = FixedPoint::LATITUDE.decode(raw);
        assert!((back - -33.857_009_5).abs() < 1.0 / f64::from(1u32 << 25));
    }

    #[test]
    fn test_extremes_round_trip() {
        let mut diags = Diagnostics::new();
        for value in [-180.0, -90.0, 0.0, 90.0, 180.0] {
            let raw = FixedPoint::LONGITUDE.encode(value, "longitude", 0, &mut diags);
            assert_eq!(FixedPoint::LONGITUDE.decode(raw), value);
        }
        assert!(diags.is_empty());
    }

    #[test]
    fn test_clamp_reports() {
        let mut diags = Diagnostics::new();
        let raw = FixedPoint::FLOOR.encode(1000.0, "floor", 4, &mut diags);
        assert_eq!(raw, 0x1FFF);
        assert_eq!(FixedPoint::FLOOR.decode(raw), 8191.0 / 16.0);

        let raw = FixedPoint::FLOOR.encode(-1000.0, "floor", 4, &mut diags);
        assert_eq!(raw, 0x2000);
        assert_eq!(FixedPoint::FLOOR.decode(raw), -512.0);

        assert_eq!(diags.count(DiagnosticKind::RangeViolation), 2);
    }

    #[test]
    fn test_nan_reports() {
        let mut diags = Diagnostics::new();
        assert_eq!(FixedPoint::ALTITUDE.encode(f64::NAN, "altitude", 0, &mut diags), 0);
        assert!(diags.has(DiagnosticKind::RangeViolation));
    }

    #[test]
    fn test_rounds_to_nearest() {
        let mut diags = Diagnostics::new();
        // 11.2 * 256 = 2867.2 -> 2867
        assert_eq!(FixedPoint::ALTITUDE.encode(11.2, "altitude", 0, &mut diags), 2867);
        // 1/4096 * 0.6 rounds up to one unit
        assert_eq!(
            FixedPoint::HEIGHT_ABOVE_FLOOR.encode(0.6 / 4096.0, "height", 4, &mut diags),
            1
        );
        // Negative values are masked to field width
        assert_eq!(
            FixedPoint::HEIGHT_ABOVE_FLOOR.encode(-1.0 / 4096.0, "height", 4, &mut diags),
            0xFF_FFFF
        );
    }
}
