//! i225/i226 TSN register definitions.
//!
//! Offsets and bit definitions for every register the offload engine
//! touches. All registers are 32 bits wide.
//!
//! # Reference
//! Intel Ethernet Controller I225 Datasheet, Section 8 (Programming Interface)

use static_assertions::const_assert_eq;

// ═══════════════════════════════════════════════════════════════════════════
// PACKET BUFFER SIZING
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit Packet Buffer Size.
pub const TXPBS: u32 = 0x3404;
/// Receive Packet Buffer Size.
pub const RXPBS: u32 = 0x2404;
/// DMA Transmit Maximum Packet Size.
pub const DTXMXPKTSZ: u32 = 0x355C;
/// Global Transmit Offset (launch time compensation).
pub const GTXOFFSET: u32 = 0x3310;
/// Auxiliary Timestamp Control.
pub const TSAUXC: u32 = 0xB640;

/// Default TX packet buffer layout.
pub const TXPBSIZE_DEFAULT: u32 = 0x0400_0014;
/// TX packet buffer layout with per-queue TSN partitions.
pub const TXPBSIZE_TSN: u32 = 0x0414_5145;
/// Size field of RXPBS; remaining bits are preserved on update.
pub const RXPBSIZE_SIZE_MASK: u32 = 0x0001_FFFF;
/// Default RX packet buffer size.
pub const RXPBSIZE_DEFAULT: u32 = 0x0000_00A2;
/// RX packet buffer size in TSN mode.
pub const RXPBSIZE_TSN: u32 = 0x0000_F08A;
/// Default maximum TX packet size (in 64-byte units).
pub const DTXMXPKTSZ_DEFAULT: u32 = 0x98;
/// Maximum TX packet size in TSN mode (1600 bytes).
pub const DTXMXPKTSZ_TSN: u32 = 0x19;
/// Transmit offset compensation programmed in TSN mode.
pub const GTXOFFSET_TSN: u32 = 1500;

// ═══════════════════════════════════════════════════════════════════════════
// SHAPING CONTROL
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit Qav Control.
pub const TQAVCTRL: u32 = 0x3570;

/// TSN transmit mode.
pub const TQAVCTRL_TRANSMIT_MODE_TSN: u32 = 1 << 0;
/// Frame preemption enable.
pub const TQAVCTRL_PREEMPT_ENA: u32 = 1 << 1;
/// Enhanced Qav shaping.
pub const TQAVCTRL_ENHANCED_QAV: u32 = 1 << 3;
/// Minimum fragment size field.
pub const TQAVCTRL_MIN_FRAG_MASK: u32 = 0x0000_C000;
/// Shift of the minimum fragment size field.
pub const TQAVCTRL_MIN_FRAG_SHIFT: u32 = 14;
/// Future schedule disable: next base-time write arms a future activation.
pub const TQAVCTRL_FUTSCDDIS: u32 = 1 << 23;

const_assert_eq!(TQAVCTRL_MIN_FRAG_MASK >> TQAVCTRL_MIN_FRAG_SHIFT, 0x3);

// ═══════════════════════════════════════════════════════════════════════════
// PER-QUEUE REGISTERS
// ═══════════════════════════════════════════════════════════════════════════

/// Transmit Queue Control for queue `i`.
#[must_use]
pub const fn txqctl(i: usize) -> u32 {
    0x3344 + 0x4 * i as u32
}

/// Gate start time for queue `i`.
#[must_use]
pub const fn stqt(i: usize) -> u32 {
    0x3324 + 0x4 * i as u32
}

/// Gate end time for queue `i`.
#[must_use]
pub const fn endqt(i: usize) -> u32 {
    0x3334 + 0x4 * i as u32
}

/// Qav credit control (idle slope) for queue `i`.
#[must_use]
pub const fn tqavcc(i: usize) -> u32 {
    0x3004 + 0x40 * i as u32
}

/// Qav hi-credit for queue `i`.
#[must_use]
pub const fn tqavhc(i: usize) -> u32 {
    0x300C + 0x40 * i as u32
}

/// Launch time mode.
pub const TXQCTL_QUEUE_MODE_LAUNCHT: u32 = 1 << 0;
/// Strict cycle: transmission never crosses a cycle boundary.
pub const TXQCTL_STRICT_CYCLE: u32 = 1 << 1;
/// Strict end: transmission never crosses the end of the window.
pub const TXQCTL_STRICT_END: u32 = 1 << 2;
/// Queue carries preemptible traffic.
pub const TXQCTL_PREEMPTABLE: u32 = 1 << 3;
/// CBS selector field.
pub const TXQCTL_QAV_SEL_MASK: u32 = 0x0000_00C0;
/// CBS selector: shaper 0.
pub const TXQCTL_QAV_SEL_CBS0: u32 = 0x0000_0080;
/// CBS selector: shaper 1.
pub const TXQCTL_QAV_SEL_CBS1: u32 = 0x0000_00C0;

/// Idle slope field of TQAVCC.
pub const TQAVCC_IDLESLOPE_MASK: u32 = 0xFFFF;
/// Keep accumulated credits across gate closures.
pub const TQAVCC_KEEP_CREDITS: u32 = 1 << 30;

// ═══════════════════════════════════════════════════════════════════════════
// GLOBAL SCHEDULE & CLOCK
// ═══════════════════════════════════════════════════════════════════════════

/// Base time, sub-second nanoseconds.
pub const BASET_L: u32 = 0x3314;
/// Base time, seconds.
pub const BASET_H: u32 = 0x3318;
/// Qbv cycle time.
pub const QBVCYCLET: u32 = 0x331C;
/// Qbv cycle time shadow.
pub const QBVCYCLET_S: u32 = 0x3320;

/// System time, nanoseconds (RO). Reading it latches SYSTIMH.
pub const SYSTIML: u32 = 0xB600;
/// System time, seconds (RO).
pub const SYSTIMH: u32 = 0xB604;

/// Human-readable name of a register offset, for register dumps.
#[must_use]
pub fn name(offset: u32) -> String {
    let fixed = match offset {
        TXPBS => Some("TXPBS"),
        RXPBS => Some("RXPBS"),
        DTXMXPKTSZ => Some("DTXMXPKTSZ"),
        GTXOFFSET => Some("GTXOFFSET"),
        TSAUXC => Some("TSAUXC"),
        TQAVCTRL => Some("TQAVCTRL"),
        BASET_L => Some("BASET_L"),
        BASET_H => Some("BASET_H"),
        QBVCYCLET => Some("QBVCYCLET"),
        QBVCYCLET_S => Some("QBVCYCLET_S"),
        SYSTIML => Some("SYSTIML"),
        SYSTIMH => Some("SYSTIMH"),
        _ => None,
    };
    if let Some(name) = fixed {
        return name.to_string();
    }

    for i in 0..tsn_common::MAX_TX_QUEUES {
        let per_queue = [
            (txqctl(i), "TXQCTL"),
            (stqt(i), "STQT"),
            (endqt(i), "ENDQT"),
            (tqavcc(i), "TQAVCC"),
            (tqavhc(i), "TQAVHC"),
        ];
        if let Some((_, name)) = per_queue.iter().find(|(reg, _)| *reg == offset) {
            return format!("{name}({i})");
        }
    }

    format!("0x{offset:05X}")
}
