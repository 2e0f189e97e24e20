//! Report rendering for tsnctl.
//!
//! Turns an engine run into either a JSON report (register image plus
//! statistics) or Prometheus text exposition for scraping.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tsn_common::{TsnFeature, TsnStats};
use tsn_offload::{ApplyOutcome, DeviceVariant};

/// Result of one tsnctl run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Hardware variant the configuration targeted.
    pub variant: DeviceVariant,
    /// How the reset was dispatched, if one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ApplyOutcome>,
    /// Offload statistics after the run.
    pub stats: TsnStats,
    /// Final register image keyed by register name.
    pub registers: BTreeMap<String, u32>,
}

fn push_metric(output: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {kind}");
    let _ = writeln!(output, "{name} {value}");
}

/// Format statistics for Prometheus text exposition format.
pub fn format_prometheus_metrics(stats: &TsnStats, variant: DeviceVariant) -> String {
    let mut output = String::new();

    // Committed features (1 = enabled)
    output.push_str("# HELP tsn_feature_enabled TSN feature committed to hardware\n");
    output.push_str("# TYPE tsn_feature_enabled gauge\n");
    for feature in TsnFeature::ALL {
        let _ = writeln!(
            output,
            "tsn_feature_enabled {{variant=\"{variant}\",feature=\"{}\"}} {}",
            feature.to_string().to_lowercase(),
            u8::from(stats.flags.contains(feature))
        );
    }

    push_metric(
        &mut output,
        "tsn_resets_total",
        "counter",
        "Total offload resets run",
        stats.resets_total,
    );
    push_metric(
        &mut output,
        "tsn_enables_total",
        "counter",
        "Resets that committed a TSN configuration",
        stats.enables,
    );
    push_metric(
        &mut output,
        "tsn_disables_total",
        "counter",
        "Resets that returned registers to defaults",
        stats.disables,
    );
    push_metric(
        &mut output,
        "tsn_reset_failures_total",
        "counter",
        "Resets whose enable path failed",
        stats.reset_failures,
    );
    push_metric(
        &mut output,
        "tsn_schedule_change_errors_total",
        "counter",
        "Gate schedule updates that missed their base time",
        stats.schedule_change_errors,
    );
    push_metric(
        &mut output,
        "tsn_deferred_resets_total",
        "counter",
        "Resets queued on the deferred worker",
        stats.deferred_resets,
    );
    push_metric(
        &mut output,
        "tsn_coalesced_resets_total",
        "counter",
        "Dispatches merged into a pending deferred reset",
        stats.coalesced_resets,
    );

    output
}
