//! Whole-record encode and decode.
//!
//! An LCI report as carried in a hostapd `lci=` setting is a 3-octet
//! measurement report header followed by subelements:
//!
//! ```text
//! 01 00 08 | 00 10 <16 octets LCI> | 04 06 <Z> | 06 01 <usage> | 07 .. <BSSIDs>
//! token mode type
//! ```
//!
//! Encoding writes the subelements in ascending ID order. Decoding accepts
//! any order.

use serde::{Deserialize, Serialize};

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::bssid::{BssidList, IndicatorStyle};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{LciError, Result};
use crate::floor::{FloorField, Movement};
use crate::location::GeodeticField;
use crate::subelement::{self, Framer, RawSubelement, Subelement, SubelementId};
use crate::uncertainty::ZeroPolicy;
use crate::usage::UsagePolicyField;

/// Measurement token of the report header.
pub const MEASUREMENT_TOKEN: u8 = 0x01;
/// Measurement report mode.
pub const REPORT_MODE: u8 = 0x00;
/// Measurement type: LCI (IEEE 802.11-2016 Table 9-107).
pub const LCI_TYPE: u8 = 0x08;
/// Header length in octets.
pub const HEADER_LEN: usize = 3;

/// Everything an LCI report can carry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRecord {
    pub geodetic: Option<GeodeticField>,
    pub floor: Option<FloorField>,
    pub usage: Option<UsagePolicyField>,
    pub bssids: Option<BssidList>,
    /// Subelements with IDs this crate does not interpret.
    pub unknown: Vec<RawSubelement>,
}

/// Whether a subelement is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// Never written.
    Skip,
    /// Written when the record carries meaningful content for it.
    #[default]
    Auto,
    /// Always written, with defaults when the record has none.
    Force,
}

/// Per-call encoding choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub geodetic: Inclusion,
    pub floor: Inclusion,
    pub usage: Inclusion,
    pub bssids: Inclusion,
    pub include_unknown: bool,
    pub zero_policy: ZeroPolicy,
    pub bssid_indicator: IndicatorStyle,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            geodetic: Inclusion::Auto,
            floor: Inclusion::Auto,
            usage: Inclusion::Auto,
            bssids: Inclusion::Auto,
            include_unknown: true,
            zero_policy: ZeroPolicy::default(),
            bssid_indicator: IndicatorStyle::default(),
        }
    }
}

/// Result of [`decode`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decoded {
    pub record: LocationRecord,
    pub diagnostics: Diagnostics,
}

/// Result of [`encode`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Encoded {
    /// Lowercase hex wire text.
    pub hex: String,
    pub diagnostics: Diagnostics,
}

/// Decode LCI wire text into a record.
///
/// Anomalies inside subelements are reported in [`Decoded::diagnostics`]
/// and decoding carries on; the consumer check runs on the result.
///
/// # Errors
/// - `Truncated` if the header is shorter than 3 octets or a subelement ID
///   has no length octet
/// - `InvalidHexDigit` if a header, ID or length octet is not hex
pub fn decode(hex: &str) -> Result<Decoded> {
    let mut diags = Diagnostics::new();
    let text = hex.trim();

    if BitReader::has_odd_tail(text) {
        diags.report(
            DiagnosticKind::MalformedInput,
            format!("odd number of hex digits ({}), last one ignored", text.len()),
        );
    }

    let reader = BitReader::new(text);
    if reader.len() < HEADER_LEN {
        return Err(LciError::Truncated {
            needed: HEADER_LEN,
            available: reader.len(),
        });
    }

    let header = [reader.read_octet(0)?, reader.read_octet(1)?, reader.read_octet(2)?];
    if header != [MEASUREMENT_TOKEN, REPORT_MODE, LCI_TYPE] {
        diags.report(
            DiagnosticKind::MalformedInput,
            format!(
                "bad measurement report header {:02x} {:02x} {:02x} (expected 01 00 08)",
                header[0], header[1], header[2]
            ),
        );
    }

    let body = reader.window(HEADER_LEN, reader.len() - HEADER_LEN)?;
    let mut framer = Framer::new(body, HEADER_LEN);
    let mut record = LocationRecord::default();

    while let Some(frame) = framer.next_frame(&mut diags)? {
        let Some(sub) = subelement::decode_frame(&frame, &mut diags)? else {
            continue;
        };
        let duplicate = match sub {
            Subelement::Geodetic(field) => record.geodetic.replace(field).is_some(),
            Subelement::Floor(field) => record.floor.replace(field).is_some(),
            Subelement::UsagePolicy(field) => record.usage.replace(field).is_some(),
            Subelement::BssidList(list) => record.bssids.replace(list).is_some(),
            Subelement::Unknown(raw) => {
                record.unknown.push(raw);
                false
            }
        };
        if duplicate {
            diags.report_in(
                frame.id,
                DiagnosticKind::MalformedInput,
                format!(
                    "duplicate {} subelement at octet {}, keeping the last",
                    SubelementId::name(frame.id),
                    frame.offset
                ),
            );
        }
    }

    check_consumer_compatibility(&record, &mut diags);

    tracing::debug!(diagnostics = diags.len(), "decoded LCI record");
    Ok(Decoded {
        record,
        diagnostics: diags,
    })
}

/// Encode a record to LCI wire text.
///
/// The consumer check covers only the subelements written, after the usage
/// field is normalized.
///
/// # Errors
/// Only internal buffer faults; content problems are corrected and reported.
pub fn encode(record: &LocationRecord, options: &EncodeOptions) -> Result<Encoded> {
    let mut diags = Diagnostics::new();
    let subelements = select(record, options, &mut diags);

    let usage = subelements.iter().find_map(|sub| match sub {
        Subelement::UsagePolicy(field) => Some(field),
        _ => None,
    });
    let floor = subelements.iter().find_map(|sub| match sub {
        Subelement::Floor(field) => Some(field),
        _ => None,
    });
    check_fields(usage, floor, &mut diags);

    let capacity = HEADER_LEN + subelements.iter().map(Subelement::max_encoded_len).sum::<usize>();

    let mut out = BitBuffer::with_capacity(capacity);
    out.push_octet(MEASUREMENT_TOKEN);
    out.push_octet(REPORT_MODE);
    out.push_octet(LCI_TYPE);

    for sub in &subelements {
        subelement::encode(
            &mut out,
            sub,
            options.zero_policy,
            options.bssid_indicator,
            &mut diags,
        )?;
    }

    tracing::debug!(
        octets = out.len(),
        subelements = subelements.len(),
        diagnostics = diags.len(),
        "encoded LCI record"
    );
    Ok(Encoded {
        hex: out.to_hex(),
        diagnostics: diags,
    })
}

/// Pick the subelements to write, in ascending ID order. The usage field
/// comes back normalized.
fn select(
    record: &LocationRecord,
    options: &EncodeOptions,
    diags: &mut Diagnostics,
) -> Vec<Subelement> {
    let mut out = Vec::new();

    let geodetic = match options.geodetic {
        Inclusion::Skip => None,
        Inclusion::Auto => record.geodetic.clone().filter(GeodeticField::has_position),
        Inclusion::Force => Some(record.geodetic.clone().unwrap_or_default()),
    };
    let floor = match options.floor {
        Inclusion::Skip => None,
        Inclusion::Auto => record.floor.clone(),
        Inclusion::Force => Some(record.floor.clone().unwrap_or_default()),
    };
    let bssids = match options.bssids {
        Inclusion::Skip => None,
        Inclusion::Auto => record.bssids.clone(),
        Inclusion::Force => Some(record.bssids.clone().unwrap_or_default()),
    };
    let locates = geodetic.is_some() || floor.is_some() || bssids.is_some();
    let usage = match options.usage {
        Inclusion::Skip => None,
        Inclusion::Auto => record
            .usage
            .clone()
            .or_else(|| locates.then(UsagePolicyField::default)),
        Inclusion::Force => Some(record.usage.clone().unwrap_or_default()),
    }
    .map(|field| field.normalized(diags));

    out.extend(geodetic.map(Subelement::Geodetic));
    out.extend(floor.map(Subelement::Floor));
    out.extend(usage.map(Subelement::UsagePolicy));
    out.extend(bssids.map(Subelement::BssidList));
    if options.include_unknown {
        out.extend(record.unknown.iter().cloned().map(Subelement::Unknown));
    }

    out.sort_by_key(Subelement::id);
    out
}

/// Report field values that make Android's `ResponderLocation` discard the
/// location. The record is not changed.
pub fn check_consumer_compatibility(record: &LocationRecord, diags: &mut Diagnostics) {
    check_fields(record.usage.as_ref(), record.floor.as_ref(), diags);
}

fn check_fields(
    usage: Option<&UsagePolicyField>,
    floor: Option<&FloorField>,
    diags: &mut Diagnostics,
) {
    if let Some(usage) = usage {
        if !usage.retransmission_allowed {
            diags.report_in(
                SubelementId::USAGE,
                DiagnosticKind::ConsumerIncompatibility,
                "retransmission not allowed, location will be withheld",
            );
        }
        if usage.retention_expires_present {
            diags.report_in(
                SubelementId::USAGE,
                DiagnosticKind::ConsumerIncompatibility,
                "retention expires present, location will be withheld",
            );
        }
        if usage.expiration_hours != 0 {
            diags.report_in(
                SubelementId::USAGE,
                DiagnosticKind::ConsumerIncompatibility,
                format!("expiration {} hours, location will be withheld", usage.expiration_hours),
            );
        }
    }
    if let Some(floor) = floor {
        if floor.movement != Movement::Fixed {
            diags.report_in(
                SubelementId::Z,
                DiagnosticKind::ConsumerIncompatibility,
                format!("expected to move is {}, location will be withheld", floor.movement.code()),
            );
        }
    }
}
