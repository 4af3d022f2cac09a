//! Z subelement (ID 4): floor, height above floor and its uncertainty.
//!
//! IEEE 802.11-2016 Figures 9-218 and 9-219. All fields are byte-aligned and
//! big-endian:
//!
//! ```text
//! octets 0..2  STA floor info   bits 15..2 floor (1/16 floor, signed)
//!                               bits  1..0 expected to move
//! octets 2..5  height above floor (1/4096 m, signed)
//! octet  5     height above floor uncertainty code
//! ```
//!
//! Some encoders emit a 5-octet payload with only two octets of height;
//! those are decoded too, the two octets taken as an unsigned height.

#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::fixed_point::FixedPoint;
use crate::subelement::SubelementId;
use crate::uncertainty::{UncertaintyScale, ZeroPolicy};

/// Payload length in octets.
pub const PAYLOAD_LEN: usize = 6;

/// Length written by encoders that shorten the height field to two octets.
pub const SHORT_PAYLOAD_LEN: usize = 5;

const ID: u8 = SubelementId::Z;

/// Expected-to-move field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    #[default]
    Fixed,
    Variable,
    Unknown,
    Reserved,
}

impl Movement {
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Self::Fixed,
            1 => Self::Variable,
            2 => Self::Unknown,
            _ => Self::Reserved,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Fixed => 0,
            Self::Variable => 1,
            Self::Unknown => 2,
            Self::Reserved => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Fixed => "stationary",
            Self::Variable => "expected to move",
            Self::Unknown => "movement pattern unknown",
            Self::Reserved => "reserved",
        }
    }
}

/// Decoded contents of the Z subelement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorField {
    /// Floor number, 1/16 floor resolution.
    pub floor: f64,
    /// Height above the floor in meters, 1/4096 m resolution.
    pub height_above_floor: f64,
    /// Height uncertainty in meters; 0 means unknown.
    pub height_uncertainty: f64,
    pub movement: Movement,
}

/// Decode the Z subelement payload.
///
/// # Returns
/// `Ok(None)` when the length is neither 6 nor the tolerated 5; the payload
/// is skipped and reported.
pub fn decode(payload: &BitReader, diags: &mut Diagnostics) -> Result<Option<FloorField>> {
    let height_octets = match payload.len() {
        PAYLOAD_LEN => 3,
        SHORT_PAYLOAD_LEN => {
            diags.report_in(
                ID,
                DiagnosticKind::MalformedInput,
                "5-octet Z subelement, reading 2-octet height above floor",
            );
            2
        }
        other => {
            diags.report_in(
                ID,
                DiagnosticKind::MalformedInput,
                format!("unexpected Z length {other} (expected {PAYLOAD_LEN})"),
            );
            return Ok(None);
        }
    };

    let floor_info = payload.read_uint(0, 2)?;
    let height = payload.read_uint(2, height_octets)?;
    let uncertainty = payload.read_octet(2 + height_octets)?;

    let field = FloorField {
        floor: FixedPoint::FLOOR.decode(floor_info >> 2),
        // A 2-octet height is the low end of the 3-octet field, so it is
        // never negative.
        height_above_floor: FixedPoint::HEIGHT_ABOVE_FLOOR.decode(height),
        height_uncertainty: UncertaintyScale::FLOOR_HEIGHT.decode(
            uncertainty,
            "height above floor uncertainty",
            ID,
            diags,
        ),
        movement: Movement::from_code((floor_info & 0x03) as u8),
    };

    tracing::trace!(
        floor = field.floor,
        height = field.height_above_floor,
        height_uncertainty = field.height_uncertainty,
        movement = field.movement.description(),
        "decoded Z field"
    );

    Ok(Some(field))
}

/// Append the complete Z subelement (ID, length, 6-octet payload).
pub fn encode(
    out: &mut BitBuffer,
    field: &FloorField,
    policy: ZeroPolicy,
    diags: &mut Diagnostics,
) -> Result<()> {
    let floor = FixedPoint::FLOOR.encode(field.floor, "floor", ID, diags);
    let height = FixedPoint::HEIGHT_ABOVE_FLOOR.encode(
        field.height_above_floor,
        "height above floor",
        ID,
        diags,
    );
    let uncertainty = UncertaintyScale::FLOOR_HEIGHT.encode(
        field.height_uncertainty,
        policy,
        "height above floor uncertainty",
        ID,
        diags,
    );

    out.push_octet(ID);
    out.push_octet(PAYLOAD_LEN as u8);
    out.push_uint((floor << 2) | u64::from(field.movement.code()), 2)?;
    out.push_uint(height, 3)?;
    out.push_octet(uncertainty);
    Ok(())
}
