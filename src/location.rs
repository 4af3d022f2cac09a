//! LCI subelement (ID 0): latitude, longitude and altitude.
//!
//! IEEE 802.11-2016 Figure 9-215 / IETF RFC 6225. The 16-octet payload is a
//! single 128-bit field packed LSB-first per octet:
//!
//! ```text
//! bits    0..6    latitude uncertainty      6
//!         6..40   latitude                 34   (25 fractional bits)
//!        40..46   longitude uncertainty     6
//!        46..80   longitude                34   (25 fractional bits)
//!        80..84   altitude type             4
//!        84..90   altitude uncertainty      6
//!        90..120  altitude                 30   (8 fractional bits)
//!       120..123  datum                     3
//!       123       regulatory agreement      1
//!       124       dynamic enablement (DSE)  1
//!       125       dependent station         1
//!       126..128  version                   2
//! ```

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
pub const PAYLOAD_LEN: usize = 16;

/// The only version defined by IETF RFC 6225.
pub const LCI_VERSION: u8 = 1;

const ID: u8 = SubelementId::LCI;

/// Unit of the altitude field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeType {
    Undefined,
    /// Meters above the datum's vertical reference.
    #[default]
    Meters,
    /// Floors.
    Floors,
    /// Meters above ground.
    HeightAboveGround,
    /// Values 4-15, kept verbatim.
    Reserved(u8),
}

impl AltitudeType {
    pub fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => Self::Undefined,
            1 => Self::Meters,
            2 => Self::Floors,
            3 => Self::HeightAboveGround,
            other => Self::Reserved(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Meters => 1,
            Self::Floors => 2,
            Self::HeightAboveGround => 3,
            Self::Reserved(code) => code & 0x0F,
        }
    }

    /// Unit label for display.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Meters => "m",
            Self::Floors => "floors",
            Self::HeightAboveGround => "m above ground",
            Self::Reserved(_) => "reserved altitude type",
        }
    }
}

/// Geodetic reference system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datum {
    Undefined,
    #[default]
    Wgs84,
    /// NAD83 with NAVD88 vertical reference.
    Nad83Navd88,
    /// NAD83 with Mean Lower Low Water vertical reference.
    Nad83Mllw,
    /// Values 4-7, kept verbatim.
    Other(u8),
}

impl Datum {
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Self::Undefined,
            1 => Self::Wgs84,
            2 => Self::Nad83Navd88,
            3 => Self::Nad83Mllw,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Wgs84 => 1,
            Self::Nad83Navd88 => 2,
            Self::Nad83Mllw => 3,
            Self::Other(code) => code & 0x07,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Wgs84 => "WGS84",
            Self::Nad83Navd88 => "NAD83 + NAVD88 vertical reference",
            Self::Nad83Mllw => "NAD83 + MLLW vertical reference",
            Self::Other(_) => "unknown datum",
        }
    }
}

/// Decoded contents of the LCI subelement.
///
/// Uncertainties are physical values (degrees for latitude/longitude, the
/// altitude unit for altitude); 0 means unknown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeodeticField {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub latitude_uncertainty: f64,
    pub longitude_uncertainty: f64,
    pub altitude_uncertainty: f64,
    pub altitude_type: AltitudeType,
    pub datum: Datum,
    /// Operating within a national policy area or near a border.
    pub regulatory_agreement: bool,
    /// Enabling STA enables dynamic station enablement (DSE).
    pub dynamic_enablement: bool,
    /// Operating under enablement of the STA whose LCI is reported.
    pub dependent_station: bool,
    /// 2-bit version; must be [`LCI_VERSION`].
    pub version: u8,
}

impl Default for GeodeticField {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            latitude_uncertainty: 0.0,
            longitude_uncertainty: 0.0,
            altitude_uncertainty: 0.0,
            altitude_type: AltitudeType::default(),
            datum: Datum::default(),
            regulatory_agreement: false,
            dynamic_enablement: false,
            dependent_station: false,
            version: LCI_VERSION,
        }
    }
}

impl GeodeticField {
    /// Whether any coordinate is nonzero. Encoding skips the subelement
    /// otherwise unless inclusion is forced.
    pub fn has_position(&self) -> bool {
        self.latitude != 0.0 || self.longitude != 0.0 || self.altitude != 0.0
    }
}

/// Decode the LCI subelement payload.
///
/// A zero-length payload means the field is absent and yields the defaults.
/// Any length other than 0 or 16 is reported and the payload skipped.
///
/// # Returns
/// `Ok(None)` when the payload was skipped.
pub fn decode(payload: &BitReader, diags: &mut Diagnostics) -> Result<Option<GeodeticField>> {
    if payload.is_empty() {
        return Ok(Some(GeodeticField::default()));
    }
    if payload.len() != PAYLOAD_LEN {
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            format!("unexpected LCI length {} (expected {PAYLOAD_LEN})", payload.len()),
        );
        return Ok(None);
    }

    let mut bits = payload.clone();
    let lat_unc = bits.take_bits(6)? as u8;
    let lat = bits.take_bits(34)?;
    let lon_unc = bits.take_bits(6)? as u8;
    let lon = bits.take_bits(34)?;
    let alt_type = bits.take_bits(4)? as u8;
    let alt_unc = bits.take_bits(6)? as u8;
    let alt = bits.take_bits(30)?;
    let datum = bits.take_bits(3)? as u8;
    let regulatory_agreement = bits.take_bits(1)? == 1;
    let dynamic_enablement = bits.take_bits(1)? == 1;
    let dependent_station = bits.take_bits(1)? == 1;
    let version = bits.take_bits(2)? as u8;

    if bits.position() != PAYLOAD_LEN * 8 {
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            format!("LCI field used {} bits (expected 128)", bits.position()),
        );
    }
    if version != LCI_VERSION {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("LCI version {version} is not {LCI_VERSION}"),
        );
    }

    // Altitude uncertainty only has meaning for meters, but it is carried
    // for every altitude type.
    let field = GeodeticField {
        latitude: FixedPoint::LATITUDE.decode(lat),
        longitude: FixedPoint::LONGITUDE.decode(lon),
        altitude: FixedPoint::ALTITUDE.decode(alt),
        latitude_uncertainty: UncertaintyScale::LATITUDE.decode(
            lat_unc,
            "latitude uncertainty",
            ID,
            diags,
        ),
        longitude_uncertainty: UncertaintyScale::LONGITUDE.decode(
            lon_unc,
            "longitude uncertainty",
            ID,
            diags,
        ),
        altitude_uncertainty: UncertaintyScale::ALTITUDE.decode(
            alt_unc,
            "altitude uncertainty",
            ID,
            diags,
        ),
        altitude_type: AltitudeType::from_code(alt_type),
        datum: Datum::from_code(datum),
        regulatory_agreement,
        dynamic_enablement,
        dependent_station,
        version,
    };

    check_ranges(&field, diags);

    tracing::trace!(
        latitude = field.latitude,
        longitude = field.longitude,
        altitude = field.altitude,
        altitude_type = field.altitude_type.unit(),
        datum = field.datum.description(),
        "decoded LCI field"
    );

    Ok(Some(field))
}

/// Report coordinates outside the geographic range. The values are kept.
fn check_ranges(field: &GeodeticField, diags: &mut Diagnostics) {
    if field.latitude.abs() > 90.0 {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("latitude {} outside -90..90", field.latitude),
        );
    }
    if field.longitude.abs() > 180.0 {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("longitude {} outside -180..180", field.longitude),
        );
    }
}

/// Append the complete LCI subelement (ID, length, 16-octet payload).
pub fn encode(
    out: &mut BitBuffer,
    field: &GeodeticField,
    policy: ZeroPolicy,
    diags: &mut Diagnostics,
) -> Result<()> {
    check_ranges(field, diags);

    let version = if field.version > 3 {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("LCI version {} does not fit 2 bits, clamped to 3", field.version),
        );
        3
    } else {
        field.version
    };
    if version != LCI_VERSION {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("encoding LCI version {version}, only {LCI_VERSION} is defined"),
        );
    }

    let lat_unc = UncertaintyScale::LATITUDE.encode(
        field.latitude_uncertainty,
        policy,
        "latitude uncertainty",
        ID,
        diags,
    );
    let lon_unc = UncertaintyScale::LONGITUDE.encode(
        field.longitude_uncertainty,
        policy,
        "longitude uncertainty",
        ID,
        diags,
    );
    let alt_unc = UncertaintyScale::ALTITUDE.encode(
        field.altitude_uncertainty,
        policy,
        "altitude uncertainty",
        ID,
        diags,
    );

    out.push_octet(ID);
    out.push_octet(PAYLOAD_LEN as u8);
    let start = out.bit_len();

    out.append_bits(u64::from(lat_unc), 6)?;
    out.append_bits(FixedPoint::LATITUDE.encode(field.latitude, "latitude", ID, diags), 34)?;
    out.append_bits(u64::from(lon_unc), 6)?;
    out.append_bits(FixedPoint::LONGITUDE.encode(field.longitude, "longitude", ID, diags), 34)?;
    out.append_bits(u64::from(field.altitude_type.code()), 4)?;
    out.append_bits(u64::from(alt_unc), 6)?;
    out.append_bits(FixedPoint::ALTITUDE.encode(field.altitude, "altitude", ID, diags), 30)?;
    out.append_bits(u64::from(field.datum.code()), 3)?;
    out.append_bits(u64::from(field.regulatory_agreement), 1)?;
    out.append_bits(u64::from(field.dynamic_enablement), 1)?;
    out.append_bits(u64::from(field.dependent_station), 1)?;
    out.append_bits(u64::from(version), 2)?;

    debug_assert_eq!(out.bit_len() - start, PAYLOAD_LEN * 8);
    Ok(())
}
