//! Usage Rules/Policy subelement (ID 6).
//!
//! IEEE 802.11-2016 Figure 9-222:
//!
//! ```text
//! octet 0      bit 0  retransmission allowed
//!              bit 1  retention expires relative present
//!              bit 2  STA location policy
//! octets 1..3  retention expires relative (hours, big-endian),
//!              only present when bit 1 is set
//! ```

#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

use crate::bitbuffer::BitBuffer;
use crate::bitreader::BitReader;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::subelement::SubelementId;

const ID: u8 = SubelementId::USAGE;

const RETRANSMISSION_ALLOWED: u8 = 0x01;
const RETENTION_EXPIRES_PRESENT: u8 = 0x02;
const LOCATION_POLICY: u8 = 0x04;
const RESERVED_BITS: u8 = 0xF8;
const RESERVED_SHIFT: u32 = 3;

/// Decoded contents of the usage rules/policy subelement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsagePolicyField {
    pub retransmission_allowed: bool,
    pub retention_expires_present: bool,
    /// Additional location information is available under a stricter policy.
    pub location_policy: bool,
    /// Hours until the location must be discarded. Only carried when
    /// `retention_expires_present` is set.
    pub expiration_hours: u16,
    /// Bits 3-7 of the flags octet as received, right-justified. Written
    /// back unchanged.
    pub reserved: u8,
}

impl Default for UsagePolicyField {
    fn default() -> Self {
        Self {
            retransmission_allowed: true,
            retention_expires_present: false,
            location_policy: false,
            expiration_hours: 0,
            reserved: 0,
        }
    }
}

impl UsagePolicyField {
    fn flags(&self) -> u8 {
        let mut flags = (self.reserved << RESERVED_SHIFT) & RESERVED_BITS;
        if self.retransmission_allowed {
            flags |= RETRANSMISSION_ALLOWED;
        }
        if self.retention_expires_present {
            flags |= RETENTION_EXPIRES_PRESENT;
        }
        if self.location_policy {
            flags |= LOCATION_POLICY;
        }
        flags
    }

    /// Resolve contradictions between the presence flag and the expiration.
    ///
    /// A nonzero expiration forces the flag on; a set flag with a zero
    /// expiration is cleared. Each correction is reported.
    pub fn normalized(&self, diags: &mut Diagnostics) -> UsagePolicyField {
        let mut fixed = self.clone();
        if self.retention_expires_present && self.expiration_hours == 0 {
            diags.report_in(
                ID,
                DiagnosticKind::PolicyInconsistency,
                "retention expires present but expiration is 0, clearing flag",
            );
            fixed.retention_expires_present = false;
        } else if !self.retention_expires_present && self.expiration_hours != 0 {
            diags.report_in(
                ID,
                DiagnosticKind::PolicyInconsistency,
                format!(
                    "retention expires not present but expiration is {}, setting flag",
                    self.expiration_hours
                ),
            );
            fixed.retention_expires_present = true;
        }
        fixed
    }
}

/// Decode the usage subelement payload.
///
/// # Returns
/// `Ok(None)` when the length is neither 1 nor 3.
pub fn decode(payload: &BitReader, diags: &mut Diagnostics) -> Result<Option<UsagePolicyField>> {
    let len = payload.len();
    if len != 1 && len != 3 {
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            format!("unexpected usage rules length {len} (expected 1 or 3)"),
        );
        return Ok(None);
    }

    let flags = payload.read_octet(0)?;
    if flags & RESERVED_BITS != 0 {
        diags.report_in(
            ID,
            DiagnosticKind::RangeViolation,
            format!("reserved usage bits set: {flags:#04x}, kept"),
        );
    }

    let expiration_hours = if len == 3 {
        payload.read_uint(1, 2)? as u16
    } else {
        0
    };

    let field = UsagePolicyField {
        retransmission_allowed: flags & RETRANSMISSION_ALLOWED != 0,
        retention_expires_present: flags & RETENTION_EXPIRES_PRESENT != 0,
        location_policy: flags & LOCATION_POLICY != 0,
        expiration_hours,
        reserved: (flags & RESERVED_BITS) >> RESERVED_SHIFT,
    };

    if field.retention_expires_present && len != 3 {
        diags.report_in(
            ID,
            DiagnosticKind::PolicyInconsistency,
            "retention expires present but no expiration field",
        );
    }
    if len == 3 && expiration_hours == 0 {
        // Seen in the wild as 06 03 01 00 00; should be 06 01 01
        diags.report_in(
            ID,
            DiagnosticKind::MalformedInput,
            "expiration field present with value 0",
        );
    } else if len == 3 && !field.retention_expires_present {
        diags.report_in(
            ID,
            DiagnosticKind::PolicyInconsistency,
            format!("expiration {expiration_hours} present but retention expires flag clear"),
        );
    }

    tracing::trace!(
        retransmission_allowed = field.retransmission_allowed,
        retention_expires_present = field.retention_expires_present,
        location_policy = field.location_policy,
        expiration_hours = field.expiration_hours,
        "decoded usage field"
    );

    Ok(Some(field))
}

/// Append the complete usage subelement, correcting contradictions first.
pub fn encode(
    out: &mut BitBuffer,
    field: &UsagePolicyField,
    diags: &mut Diagnostics,
) -> Result<()> {
    let field = field.normalized(diags);

    out.push_octet(ID);
    if field.retention_expires_present {
        out.push_octet(3);
        out.push_octet(field.flags());
        out.push_uint(u64::from(field.expiration_hours), 2)?;
    } else {
        out.push_octet(1);
        out.push_octet(field.flags());
    }
    Ok(())
}
