//! Colocated BSSID list subelement (ID 7).
//!
//! IEEE 802.11-2016 Figure 9-225:
//!
//! ```text
//! octet 0         max BSSID indicator
//! octets 1..      N × 6-octet BSSID, N = (length - 1) / 6
//! ```
//!
//! The standard defines the indicator as 0 when no multiple-BSSID set is in
//! use; Android's `ResponderLocation` instead expects it to hold N. Both
//! conventions decode without complaint.

#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{LciError, Result};
use crate::subelement::SubelementId;

/// Octets per address.
pub const MAC_LEN: usize = 6;

/// Most addresses that fit one subelement: 1 + 6 × 42 = 253 ≤ 255.
pub const MAX_BSSIDS: usize = 42;

const ID: u8 = SubelementId::COLOCATED_BSSID;

/// A 48-bit IEEE MAC address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; MAC_LEN]);

/// Why a string is not a MAC address.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address {0:?}")]
pub struct ParseMacError(pub String);

impl MacAddress {
    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `-` or `_` separators, or 12 bare hex
    /// digits, in either case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseMacError(s.to_string());
        let text = s.trim();

        let digits: String = if text.len() == MAC_LEN * 2 {
            text.to_string()
        } else {
            let sep = text
                .chars()
                .find(|c| matches!(c, ':' | '-' | '_'))
                .ok_or_else(err)?;
            let parts: Vec<&str> = text.split(sep).collect();
            if parts.len() != MAC_LEN || parts.iter().any(|p| p.len() != 2) {
                return Err(err());
            }
            parts.concat()
        };

        let mut octets = [0u8; MAC_LEN];
        hex::decode_to_slice(&digits, &mut octets).map_err(|_| err())?;
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One slot of the list. Invalid text keeps its position so ordinals in
/// diagnostics match what the caller supplied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BssidEntry {
    Valid(MacAddress),
    Invalid(String),
}

impl BssidEntry {
    /// Parse `text`, falling back to [`BssidEntry::Invalid`].
    pub fn parse(text: &str) -> Self {
        text.parse::<MacAddress>()
            .map_or_else(|_| Self::Invalid(text.to_string()), Self::Valid)
    }

    pub fn address(&self) -> Option<MacAddress> {
        match self {
            Self::Valid(mac) => Some(*mac),
            Self::Invalid(_) => None,
        }
    }
}

impl fmt::Display for BssidEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(mac) => write!(f, "{mac}"),
            Self::Invalid(text) => write!(f, "invalid ({text})"),
        }
    }
}

/// How the max BSSID indicator is filled in when the list does not carry one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStyle {
    /// Always 0, as the standard reads.
    Standard,
    /// Number of addresses, as Android expects.
    #[default]
    EntryCount,
}

/// Decoded contents of the colocated BSSID subelement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BssidList {
    /// Indicator seen on the wire. `None` lets the encoder pick per
    /// [`IndicatorStyle`].
    pub max_indicator: Option<u8>,
    pub entries: Vec<BssidEntry>,
}

impl BssidList {
    /// Build a list from address strings; unparsable ones become
    /// [`BssidEntry::Invalid`].
    pub fn from_strs<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_indicator: None,
            entries: items.into_iter().map(|s| BssidEntry::parse(s.as_ref())).collect(),
        }
    }

    /// Valid addresses, in order.
    pub fn addresses(&self) -> impl Iterator<Item = MacAddress> + '_ {
        self.entries.iter().filter_map(BssidEntry::address)
    }

    /// Encoded payload length for the valid entries, capped at [`MAX_BSSIDS`].
    pub fn payload_len(&self) -> usize {
        1 + self.addresses().count().min(MAX_BSSIDS) * MAC_LEN
    }
}

/// Decode the colocated BSSID subelement payload.
///
/// # Returns
/// `Ok(None)` for an empty payload (no indicator octet).
pub fn decode(payload: &BitReader, diags: &mut Diagnostics) -> Result<Option<BssidList>> {
    let len = payload.len();
    if len == 0 {
        diags.report_in(ID, DiagnosticKind::MalformedInput, "empty colocated BSSID subelement");
        return Ok(None);
    }
    if (len - 1) % MAC_LEN != 0 {
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            format!(
                "colocated BSSID length {len} is not 1 + 6N, ignoring {} trailing octets",
                (len - 1) % MAC_LEN
            ),
        );
    }

    let count = (len - 1) / MAC_LEN;
    let indicator = payload.read_octet(0)?;
    if indicator != 0 && usize::from(indicator) != count {
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            format!("max BSSID indicator {indicator} does not match {count} entries"),
        );
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let window = payload.window(1 + i * MAC_LEN, MAC_LEN)?;
        match window.to_bytes() {
            Ok(bytes) => {
                let mut octets = [0u8; MAC_LEN];
                octets.copy_from_slice(&bytes);
                let mac = MacAddress(octets);
                tracing::trace!(index = i, bssid = %mac, "decoded colocated BSSID");
                entries.push(BssidEntry::Valid(mac));
            }
            // A bad digit spoils this slot only
            Err(err @ LciError::InvalidHexDigit { .. }) => {
                diags.report_in(
                    ID,
                    DiagnosticKind::MalformedInput,
                    format!("BSSID #{} {err}, kept as invalid", i + 1),
                );
                entries.push(BssidEntry::Invalid(window.raw_text()));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(Some(BssidList {
        max_indicator: Some(indicator),
        entries,
    }))
}

/// Append the complete colocated BSSID subelement.
///
/// Invalid entries are dropped and entries past [`MAX_BSSIDS`] are cut, each
/// reported. A carried `max_indicator` of 0 or of the number of addresses
/// written is re-emitted as is; any other carried value is replaced by the
/// count and reported. Without one, `style` decides.
pub fn encode(
    out: &mut BitBuffer,
    list: &BssidList,
    style: IndicatorStyle,
    diags: &mut Diagnostics,
) -> Result<()> {
    let mut addresses = Vec::with_capacity(list.entries.len().min(MAX_BSSIDS));
    for (i, entry) in list.entries.iter().enumerate() {
        match entry {
            BssidEntry::Valid(mac) => addresses.push(*mac),
            BssidEntry::Invalid(text) => diags.report_in(
                ID,
                DiagnosticKind::MalformedInput,
                format!("BSSID #{} {text:?} is not a MAC address, dropped", i + 1),
            ),
        }
    }
    if addresses.len() > MAX_BSSIDS {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("{} BSSIDs exceed the limit of {MAX_BSSIDS}, extra dropped", addresses.len()),
        );
        addresses.truncate(MAX_BSSIDS);
    }

    let indicator = match list.max_indicator {
        Some(n) if n != 0 && usize::from(n) != addresses.len() => {
            diags.report_in(
                ID,
                DiagnosticKind::PolicyInconsistency,
                format!(
                    "max BSSID indicator {n} does not match {} addresses written, using the count",
                    addresses.len()
                ),
            );
            addresses.len() as u8
        }
        Some(n) => n,
        None => match style {
            IndicatorStyle::Standard => 0,
            IndicatorStyle::EntryCount => addresses.len() as u8,
        },
    };

    out.push_octet(ID);
    out.push_octet((1 + addresses.len() * MAC_LEN) as u8);
    out.push_octet(indicator);
    for mac in &addresses {
        out.push_bytes(&mac.0);
    }
    Ok(())
}
