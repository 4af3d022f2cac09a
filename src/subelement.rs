//! Subelement framing and dispatch.
//!
//! After the 3-octet measurement report header the LCI body is a run of
//! `(ID, length, payload)` triples:
//!
//! ```text
//! +----+--------+---------------------+----+--------+-----
//! | ID | length |  length octets ...  | ID | length | ...
//! +----+--------+---------------------+----+--------+-----
//! ```
//!
//! [`Framer`] walks the triples; [`decode_frame`] hands each payload to the
//! codec for its ID and [`encode`] does the reverse.

#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::bssid::{self, BssidList, IndicatorStyle};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{LciError, Result};
use crate::floor::{self, FloorField};
use crate::location::{self, GeodeticField};
use crate::uncertainty::ZeroPolicy;
use crate::usage::{self, UsagePolicyField};

/// Largest payload a 1-octet length can describe.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Subelement IDs of the LCI report (IEEE 802.11-2016 Table 9-186).
pub struct SubelementId;

impl SubelementId {
    pub const LCI: u8 = 0;
    pub const Z: u8 = 4;
    pub const USAGE: u8 = 6;
    pub const COLOCATED_BSSID: u8 = 7;

    /// Display name for an ID.
    pub fn name(id: u8) -> &'static str {
        match id {
            Self::LCI => "LCI",
            1 => "azimuth report",
            2 => "originator requesting STA MAC address",
            3 => "target MAC address",
            Self::Z => "Z",
            5 => "relative location error",
            Self::USAGE => "usage rules/policy",
            Self::COLOCATED_BSSID => "colocated BSSID list",
            221 => "vendor specific",
            _ => "unknown",
        }
    }

    /// Whether this crate decodes the payload of `id`.
    pub fn is_known(id: u8) -> bool {
        matches!(id, Self::LCI | Self::Z | Self::USAGE | Self::COLOCATED_BSSID)
    }
}

/// A subelement kept as raw octets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubelement {
    pub id: u8,
    /// Payload octets, hex encoded in JSON.
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

/// One decoded subelement.
#[derive(Clone, Debug, PartialEq)]
pub enum Subelement {
    Geodetic(GeodeticField),
    Floor(FloorField),
    UsagePolicy(UsagePolicyField),
    BssidList(BssidList),
    Unknown(RawSubelement),
}

impl Subelement {
    pub fn id(&self) -> u8 {
        match self {
            Self::Geodetic(_) => SubelementId::LCI,
            Self::Floor(_) => SubelementId::Z,
            Self::UsagePolicy(_) => SubelementId::USAGE,
            Self::BssidList(_) => SubelementId::COLOCATED_BSSID,
            Self::Unknown(raw) => raw.id,
        }
    }

    /// Octets this subelement occupies on the wire at most, ID and length
    /// included.
    pub fn max_encoded_len(&self) -> usize {
        let payload = match self {
            Self::Geodetic(_) => location::PAYLOAD_LEN,
            Self::Floor(_) => floor::PAYLOAD_LEN,
            Self::UsagePolicy(_) => 3,
            Self::BssidList(list) => list.payload_len(),
            Self::Unknown(raw) => raw.payload.len().min(MAX_PAYLOAD_LEN),
        };
        2 + payload
    }
}

/// An `(ID, payload)` triple located by the [`Framer`].
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub id: u8,
    /// Octet offset of the ID in the full input.
    pub offset: usize,
    pub payload: BitReader<'a>,
}

/// Walks the subelements of an LCI body.
#[derive(Clone, Debug)]
pub struct Framer<'a> {
    body: BitReader<'a>,
    /// Octet offset of `body` in the full input.
    base: usize,
    pos: usize,
    halted: bool,
}

impl<'a> Framer<'a> {
    /// # Arguments
    /// * `body` - Octets after the record header
    /// * `base` - Offset of `body` in the full input, for diagnostics
    pub fn new(body: BitReader<'a>, base: usize) -> Self {
        Self {
            body,
            base,
            pos: 0,
            halted: false,
        }
    }

    /// Locate the next subelement.
    ///
    /// # Returns
    /// `Ok(None)` once the body is exhausted, or after a declared length
    /// ran past the end of the input (reported, parsing halts).
    ///
    /// # Errors
    /// - `Truncated` if an ID octet has no length octet after it
    /// - `InvalidHexDigit` if the ID or length octet is not hex
    pub fn next_frame(&mut self, diags: &mut Diagnostics) -> Result<Option<Frame<'a>>> {
        if self.halted || self.pos >= self.body.len() {
            return Ok(None);
        }
        if self.pos + 2 > self.body.len() {
            return Err(LciError::Truncated {
                needed: self.base + self.pos + 2,
                available: self.base + self.body.len(),
            });
        }

        let offset = self.base + self.pos;
        let id = self.body.read_octet(self.pos)?;
        let len = usize::from(self.body.read_octet(self.pos + 1)?);
        let start = self.pos + 2;
        let remaining = self.body.len() - start;

        if len > remaining {
            diags.report_in(
                id,
                DiagnosticKind::MalformedInput,
                format!(
                    "length {len} at octet {offset} overruns input ({remaining} left), parsing stopped"
                ),
            );
            self.halted = true;
            return Ok(None);
        }

        let payload = self.body.window(start, len)?;
        self.pos = start + len;
        tracing::trace!(id, len, offset, "subelement frame");
        Ok(Some(Frame { id, offset, payload }))
    }
}

/// Decode one framed subelement.
///
/// Unknown IDs are reported and returned as [`Subelement::Unknown`]. A
/// payload with a bad hex digit is reported and skipped.
///
/// # Returns
/// `Ok(None)` when the payload was skipped.
pub fn decode_frame(frame: &Frame<'_>, diags: &mut Diagnostics) -> Result<Option<Subelement>> {
    let decoded = match frame.id {
        SubelementId::LCI => {
            location::decode(&frame.payload, diags).map(|f| f.map(Subelement::Geodetic))
        }
        SubelementId::Z => floor::decode(&frame.payload, diags).map(|f| f.map(Subelement::Floor)),
        SubelementId::USAGE => {
            usage::decode(&frame.payload, diags).map(|f| f.map(Subelement::UsagePolicy))
        }
        SubelementId::COLOCATED_BSSID => {
            bssid::decode(&frame.payload, diags).map(|f| f.map(Subelement::BssidList))
        }
        id => {
            diags.report_in(
                id,
                DiagnosticKind::UnknownSubelement,
                format!(
                    "{} subelement, {} octets at octet {} skipped",
                    SubelementId::name(id),
                    frame.payload.len(),
                    frame.offset
                ),
            );
            frame
                .payload
                .to_bytes()
                .map(|payload| Some(Subelement::Unknown(RawSubelement { id, payload })))
        }
    };

    match decoded {
        Err(err @ LciError::InvalidHexDigit { .. }) => {
            diags.report_in(
                frame.id,
                DiagnosticKind::MalformedInput,
                format!("{err}, subelement skipped"),
            );
            Ok(None)
        }
        other => other,
    }
}

/// Append one complete subelement.
///
/// # Arguments
/// * `out` - Output buffer
/// * `sub` - Subelement to write
/// * `policy` - Meaning of zero uncertainties
/// * `style` - Max BSSID indicator convention
/// * `diags` - Diagnostics sink
pub fn encode(
    out: &mut BitBuffer,
    sub: &Subelement,
    policy: ZeroPolicy,
    style: IndicatorStyle,
    diags: &mut Diagnostics,
) -> Result<()> {
    match sub {
        Subelement::Geodetic(field) => location::encode(out, field, policy, diags),
        Subelement::Floor(field) => floor::encode(out, field, policy, diags),
        Subelement::UsagePolicy(field) => usage::encode(out, field, diags),
        Subelement::BssidList(list) => bssid::encode(out, list, style, diags),
        Subelement::Unknown(raw) => {
            if raw.payload.len() > MAX_PAYLOAD_LEN {
                diags.report_in(
                    raw.id,
                    DiagnosticKind::RangeViolation,
                    format!(
                        "{} octet payload does not fit a subelement, skipped",
                        raw.payload.len()
                    ),
                );
                return Ok(());
            }
            out.push_octet(raw.id);
            out.push_octet(raw.payload.len() as u8);
            out.push_bytes(&raw.payload);
            Ok(())
        }
    }
}
