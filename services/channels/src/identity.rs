//! Channel Identity Assembler: runs the header cascade end to end.
//!
//! Stage order is fixed:
//! unit -> metric suffix -> normalize -> quantity -> phase -> system -> alias.
//! Every stage after the metric suffix reads the same normalized base text.

use crate::metric::resolve_metric;
use crate::normalize::{collapse_whitespace, normalize_base, title_case};
use crate::phase::{append_phase, extract_phase, Phase};
use crate::quantity::{fallback_metric, infer_quantity, prefix_metric, Quantity};
use crate::rules::first_match;
use crate::system::{classify, SourceSystem};
use crate::unit::{extract_unit, normalize_unit};
use serde::Serialize;

/// Display-name aliases for known source collisions.
///
/// Looked up with the canonical tag after classification, which never equals
/// one of these keys, so the table currently has no effect on stored data.
pub const SOURCE_ALIASES: &[(&str, &str)] = &[
    ("Hydo Plant Power", "Hydro Plant"),
    ("Hydro Plant Power", "Hydro Plant"),
    ("Solar Array Power", "Solar Array"),
    ("SCE Main Power Pulse #1", "SCE Main"),
];

/// Structured identity of one telemetry column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelIdentity {
    pub source: SourceSystem,
    pub metric: String,
    pub unit: Option<String>,
}

/// Every intermediate value the cascade produced for one header.
///
/// Only `identity` is persisted; the rest exists for header audits and
/// debugging new vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderTrace {
    pub header: String,
    /// Unit as extracted, before phrase normalization.
    pub raw_unit: Option<String>,
    pub suffix_metric: Option<&'static str>,
    /// Lower-cased, corrected base text read by the later stages.
    pub base: String,
    /// Title-cased base, for display only.
    pub label: String,
    pub quantity: Option<Quantity>,
    pub phase: Option<Phase>,
    pub identity: ChannelIdentity,
}

/// Returns true for header text that carries no channel at all.
pub fn is_blank_header(header: &str) -> bool {
    let header = header.trim();
    header.is_empty() || header == "-"
}

/// Runs the full cascade and keeps the intermediate stages.
///
/// `None` only for blank headers (`""`, `"-"`); any other text resolves,
/// falling back to `unknown` / `value` when no rule recognises it.
pub fn trace_header(header: &str) -> Option<HeaderTrace> {
    if is_blank_header(header) {
        return None;
    }
    let header = header.trim();

    let (raw_unit, base) = extract_unit(header);
    let base = collapse_whitespace(base);

    let (suffix_metric, remainder) = match resolve_metric(&base) {
        Some(suffix) => (Some(suffix.metric), suffix.remainder),
        None => (None, base),
    };

    let text = normalize_base(&remainder);
    let label = title_case(&text);

    let quantity = infer_quantity(&text, raw_unit.as_deref());
    let metric = suffix_metric.unwrap_or_else(|| fallback_metric(quantity));
    let metric = prefix_metric(metric, quantity);

    let phase = extract_phase(&text);
    let metric = append_phase(metric, phase);

    let source = apply_source_alias(classify(&text));
    let unit = raw_unit.as_deref().map(normalize_unit);

    Some(HeaderTrace {
        header: header.to_string(),
        raw_unit,
        suffix_metric,
        base: text,
        label,
        quantity,
        phase,
        identity: ChannelIdentity { source, metric, unit },
    })
}

/// Parses one column header into its channel identity.
pub fn parse_header(header: &str) -> Option<ChannelIdentity> {
    trace_header(header).map(|trace| trace.identity)
}

/// Applies [`SOURCE_ALIASES`] to an already classified source.
///
/// An alias target that is not a canonical tag leaves the source unchanged,
/// keeping the result inside [`SourceSystem::ALL`].
fn apply_source_alias(source: SourceSystem) -> SourceSystem {
    first_match(SOURCE_ALIASES, |&(from, to)| (from == source.as_str()).then_some(to))
        .and_then(SourceSystem::from_tag)
        .unwrap_or(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(header: &str) -> (SourceSystem, String, Option<String>) {
        let identity = parse_header(header).expect("header should parse");
        (identity.source, identity.metric, identity.unit)
    }

    fn unit(u: &str) -> Option<String> {
        Some(u.to_string())
    }

    // -------------------------------------------------------------------------
    // END-TO-END HEADERS
    // -------------------------------------------------------------------------

    #[test]
    fn test_hydro_plant_ave() {
        assert_eq!(parse("Hydro Plant Ave"), (SourceSystem::Hydro, "avg".into(), None));
    }

    #[test]
    fn test_hydro_plant_ave_kw_without_parentheses() {
        // "kW" is not a unit group and not a metric suffix, so nothing
        // strips it and " ave" is picked up as phase A
        assert_eq!(parse("Hydro Plant Ave kW"), (SourceSystem::Hydro, "value_A".into(), None));
    }

    #[test]
    fn test_sce_main_pulse() {
        assert_eq!(
            parse("SCE Main Pulse #1 (kWh)"),
            (SourceSystem::Grid, "pulse_total".into(), unit("kWh"))
        );
    }

    #[test]
    fn test_sce_main_power_pulse_power_keyword_wins() {
        assert_eq!(
            parse("SCE Main Power Pulse #1 (kWh)"),
            (SourceSystem::Grid, "power".into(), unit("kWh"))
        );
    }

    #[test]
    fn test_prefixed_phase_metric() {
        assert_eq!(
            parse("Hydro Plant Power A Ave (kW)"),
            (SourceSystem::Hydro, "power_avg_A".into(), unit("kW"))
        );
    }

    #[test]
    fn test_average_rate_phrase() {
        let (source, metric, _) = parse("Solar Array Average Rate");
        assert_eq!(source, SourceSystem::Solar);
        // " a" inside "array" adds phase A on top of avg_rate
        assert_eq!(metric, "avg_rate_A");
    }

    #[test]
    fn test_flow_rate_from_keyword() {
        assert_eq!(
            parse("Booster Pump Flow Rate (gpm)"),
            (SourceSystem::BoosterPump, "flow_rate".into(), unit("gpm"))
        );
    }

    #[test]
    fn test_pressure_max() {
        assert_eq!(
            parse("Deep Well Pump Pressure Max (psi)"),
            (SourceSystem::DeepWellPump, "pressure_max".into(), unit("psi"))
        );
    }

    #[test]
    fn test_sum_phase() {
        assert_eq!(
            parse("Net Meter Power Sum (kW)"),
            (SourceSystem::Grid, "power_sum".into(), unit("kW"))
        );
    }

    #[test]
    fn test_spelling_correction_feeds_quantity() {
        assert_eq!(
            parse("Hydro Plant Pwer Demand (kW)"),
            (SourceSystem::Hydro, "power_demand".into(), unit("kW"))
        );
    }

    #[test]
    fn test_unit_phrase_and_creek_false_positive() {
        assert_eq!(
            parse("Wyman Creek Flow (gallons per minute)"),
            (SourceSystem::WymanCreek, "flow_C".into(), unit("gallons /min"))
        );
    }

    #[test]
    fn test_middle_parentheses_stay_in_base() {
        assert_eq!(
            parse("Reservoir By-Pass (North) Flow"),
            (SourceSystem::Bypass, "flow_B".into(), None)
        );
    }

    #[test]
    fn test_unrecognised_header_degrades_to_unknown_value() {
        assert_eq!(
            parse("Ambient Temperature (F)"),
            (SourceSystem::Unknown, "value".into(), unit("F"))
        );
    }

    #[test]
    fn test_unit_only_header() {
        assert_eq!(parse("(kW)"), (SourceSystem::Unknown, "power".into(), unit("kW")));
    }

    #[test]
    fn test_suffix_only_header() {
        assert_eq!(parse("Total"), (SourceSystem::Unknown, "total".into(), None));
    }

    #[test]
    fn test_scada_hits_sca() {
        assert_eq!(parse("Scada Link Status"), (SourceSystem::Sca, "status".into(), None));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(parse("  Hydro   Plant  Ave  "), parse("Hydro Plant Ave"));
    }

    // -------------------------------------------------------------------------
    // BLANK HEADERS
    // -------------------------------------------------------------------------

    #[test]
    fn test_blank_headers_do_not_parse() {
        assert_eq!(parse_header(""), None);
        assert_eq!(parse_header("   "), None);
        assert_eq!(parse_header("-"), None);
        assert_eq!(parse_header(" - "), None);
    }

    // -------------------------------------------------------------------------
    // INVARIANTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_metric_never_empty_and_source_total() {
        let headers = [
            "x", "(", ")", "()", "Rate", "Ave", "a b c", "Pulse #3", "- -", "Net Meter (kWh per hour)",
            "Solar (", "Wyman Creek Level (ft)", "Hydo Plant Power", "Status",
        ];
        for header in headers {
            let identity = parse_header(header).expect("non-blank header parses");
            assert!(!identity.metric.is_empty(), "header {header:?}");
            assert!(SourceSystem::ALL.contains(&identity.source), "header {header:?}");
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let header = "Hydro Plant Power A Ave (kW)";
        let first = parse_header(header);
        for _ in 0..10 {
            assert_eq!(parse_header(header), first);
        }
    }

    #[test]
    fn test_alias_table_is_inert_after_classification() {
        for &(from, _) in SOURCE_ALIASES {
            let identity = parse_header(from).expect("alias key parses");
            assert_ne!(identity.source, SourceSystem::Unknown, "alias key {from:?}");
        }
        for system in SourceSystem::ALL {
            assert_eq!(apply_source_alias(system), system);
        }
    }

    // -------------------------------------------------------------------------
    // TRACE
    // -------------------------------------------------------------------------

    #[test]
    fn test_trace_keeps_intermediate_stages() {
        let trace = trace_header("Hydro Plant Pwer Demand (kW)").unwrap();
        assert_eq!(trace.raw_unit.as_deref(), Some("kW"));
        assert_eq!(trace.suffix_metric, Some("demand"));
        assert_eq!(trace.base, "hydro plant power");
        assert_eq!(trace.label, "Hydro Plant Power");
        assert_eq!(trace.quantity, Some(Quantity::Power));
        assert_eq!(trace.phase, None);
    }

    #[test]
    fn test_trace_raw_unit_before_phrase_normalization() {
        let trace = trace_header("Bypass Flow (gallons per minute)").unwrap();
        assert_eq!(trace.raw_unit.as_deref(), Some("gallons per minute"));
        assert_eq!(trace.identity.unit.as_deref(), Some("gallons /min"));
    }
}
