//! Logarithmic uncertainty codes (IETF RFC 6225 Section 2.3).
//!
//! An uncertainty `u` is carried as `code = m - ceil(log2(u))`, so larger
//! codes mean *smaller* uncertainty. Code 0 is reserved for "unknown" and
//! codes above the field maximum are reserved.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Tolerance subtracted before `ceil` so exact powers of two survive float
/// noise and `encode(decode(c)) == c` holds.
const EPSILON: f64 = 0.000_001;

/// How a physical uncertainty of exactly zero is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Zero means "unknown" and encodes as code 0.
    #[default]
    Unknown,
    /// Zero means "as small as representable" and encodes as the maximum code.
    Smallest,
}

/// Binary point and code limit of an uncertainty field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UncertaintyScale {
    /// Bits after the binary point (`m`).
    pub exponent: i32,
    /// Largest valid code; anything above is reserved.
    pub max_code: u8,
}

impl UncertaintyScale {
    /// Latitude uncertainty in degrees (6-bit code).
    pub const LATITUDE: Self = Self::new(8, 34);
    /// Longitude uncertainty in degrees (6-bit code).
    pub const LONGITUDE: Self = Self::new(8, 34);
    /// Altitude uncertainty (6-bit code).
    pub const ALTITUDE: Self = Self::new(21, 34);
    /// Height above floor uncertainty in meters (8-bit code).
    pub const FLOOR_HEIGHT: Self = Self::new(11, 24);

    pub const fn new(exponent: i32, max_code: u8) -> Self {
        Self { exponent, max_code }
    }

    /// Quantize a physical uncertainty to a code.
    ///
    /// # Arguments
    /// * `value` - Uncertainty in the field's unit
    /// * `policy` - Meaning of a zero value
    /// * `field` - Field name for diagnostics
    /// * `id` - Subelement the field belongs to
    /// * `diags` - Diagnostics sink
    ///
    /// # Returns
    /// A code in `0..=max_code`. Values too large for code 1 give 1, values
    /// too small for `max_code` give `max_code`; both are reported.
    pub fn encode(
        self,
        value: f64,
        policy: ZeroPolicy,
        field: &str,
        id: u8,
        diags: &mut Diagnostics,
    ) -> u8 {
        if value == 0.0 {
            return match policy {
                ZeroPolicy::Unknown => 0,
                ZeroPolicy::Smallest => self.max_code,
            };
        }
        if value.is_nan() || value < 0.0 {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} {value} is not a positive uncertainty, encoded as unknown"),
            );
            return 0;
        }

        let code = f64::from(self.exponent) - (value.log2() - EPSILON).ceil();
        if code <= 0.0 {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} {value} too large, using code 1"),
            );
            1
        } else if code > f64::from(self.max_code) {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} {value} too small, using code {}", self.max_code),
            );
            self.max_code
        } else {
            code as u8
        }
    }

    /// Turn a code back into a physical uncertainty.
    ///
    /// Code 0 decodes to 0 ("unknown"). Reserved codes are clamped to
    /// `max_code` and reported.
    pub fn decode(self, code: u8, field: &str, id: u8, diags: &mut Diagnostics) -> f64 {
        let code = if code > self.max_code {
            diags.report_in(
                id,
                DiagnosticKind::RangeViolation,
                format!("{field} code {code} > {}, clamped", self.max_code),
            );
            self.max_code
        } else {
            code
        };
        self.value_of(code)
    }

    /// `2^(m - code)`, or 0 for code 0. No range check.
    pub fn value_of(self, code: u8) -> f64 {
        if code == 0 {
            0.0
        } else {
            f64::from(self.exponent - i32::from(code)).exp2()
        }
    }
}
