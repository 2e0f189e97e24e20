//! Credit-based shaper value encoding.
//!
//! The datasheet expresses the TQAVCC idle slope as
//!
//! ```text
//! value = link_speed / 100Mbps * 0x7736 * BW * 0.2 / 2.5
//! BW    = idleslope_kbps / (link_speed * 1000)
//! ```
//!
//! Substituting BW cancels the link speed, leaving
//! `value = idleslope_kbps * 61036 / 2_500_000`. One unit of the field is
//! therefore ~40.96 kbps regardless of the negotiated speed. Send slope and
//! lo-credit are fixed in hardware and not programmable.

use tsn_common::{TsnError, TsnResult};

/// Numerator of the idle slope scale factor.
pub const IDLESLOPE_SCALE: u64 = 61_036;
/// Denominator of the idle slope scale factor.
pub const IDLESLOPE_DIVISOR: u64 = 2_500_000;
/// Hi-credit multiplier.
pub const HICREDIT_SCALE: u32 = 0x7736;
/// Sign bias of the hi-credit register.
pub const HICREDIT_BIAS: u32 = 0x8000_0000;

/// Encode an idle slope in kbps for the TQAVCC idle slope field, rounding up.
///
/// # Errors
///
/// Returns [`TsnError::ValueOutOfRange`] if the encoding does not fit the
/// 16-bit field (idle slopes above the 2.5 Gbps line rate).
pub fn idleslope_to_cbs_value(idleslope_kbps: u32) -> TsnResult<u16> {
    let value = (u64::from(idleslope_kbps) * IDLESLOPE_SCALE).div_ceil(IDLESLOPE_DIVISOR);
    u16::try_from(value).map_err(|_| TsnError::ValueOutOfRange {
        field: "TQAVCC.IDLESLOPE",
        value: i128::from(value),
    })
}

/// Encode hi-credit for the TQAVHC register.
///
/// 32-bit wrapping arithmetic, matching the hardware credit representation.
#[must_use]
pub fn hicredit_to_register(hicredit: u32) -> u32 {
    HICREDIT_BIAS.wrapping_add(hicredit.wrapping_mul(HICREDIT_SCALE))
}
