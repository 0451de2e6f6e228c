//! Quantity Inferrer: coarse physical category from header text or unit.

use crate::rules::first_match;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Pressure,
    Flow,
    Power,
    Energy,
    Pulse,
}

impl Quantity {
    pub fn as_str(self) -> &'static str {
        match self {
            Quantity::Pressure => "pressure",
            Quantity::Flow => "flow",
            Quantity::Power => "power",
            Quantity::Energy => "energy",
            Quantity::Pulse => "pulse",
        }
    }

    /// Metric name used when no suffix rule matched the header.
    pub fn fallback_metric(self) -> &'static str {
        match self {
            Quantity::Pulse => "pulse_total",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition tested by one quantity rule. Text probes see the normalized
/// (lower-case) base text, unit probes see the lower-cased unit.
#[derive(Debug, Clone, Copy)]
enum Probe {
    TextContains(&'static str),
    TextStartsWith(&'static str),
    UnitEquals(&'static str),
    UnitContains(&'static str),
}

impl Probe {
    fn matches(self, text: &str, unit: &str) -> bool {
        match self {
            Probe::TextContains(word) => text.contains(word),
            Probe::TextStartsWith(prefix) => text.starts_with(prefix),
            Probe::UnitEquals(u) => unit == u,
            Probe::UnitContains(u) => unit.contains(u),
        }
    }
}

/// Keyword rules first, unit rules only when no keyword fired.
const QUANTITY_RULES: &[(Probe, Quantity)] = &[
    (Probe::TextContains("pressure"), Quantity::Pressure),
    (Probe::TextContains("flow"), Quantity::Flow),
    (Probe::TextContains("power"), Quantity::Power),
    (Probe::TextContains("energy"), Quantity::Energy),
    (Probe::TextStartsWith("pulse #"), Quantity::Pulse),
    (Probe::TextContains("pulse"), Quantity::Pulse),
    (Probe::UnitEquals("kw"), Quantity::Power),
    (Probe::UnitEquals("kwh"), Quantity::Energy),
    (Probe::UnitContains("psi"), Quantity::Pressure),
    (Probe::UnitContains("gpm"), Quantity::Flow),
];

/// Metrics that say nothing about what was measured and so get a
/// `{quantity}_` prefix.
pub const QUANTITY_AGNOSTIC_METRICS: &[&str] =
    &["avg", "min", "max", "rate", "avg_rate", "instantaneous", "demand"];

/// Infers the quantity for `text` (normalized base) and an optional unit.
pub fn infer_quantity(text: &str, unit: Option<&str>) -> Option<Quantity> {
    let text = text.to_lowercase();
    let unit = unit.unwrap_or_default().to_lowercase();
    first_match(QUANTITY_RULES, |&(probe, quantity)| {
        probe.matches(&text, &unit).then_some(quantity)
    })
}

/// Metric name for a header with no recognised suffix.
pub fn fallback_metric(quantity: Option<Quantity>) -> &'static str {
    quantity.map_or("value", Quantity::fallback_metric)
}

/// Prefixes a quantity-agnostic metric with its quantity.
///
/// Anything outside [`QUANTITY_AGNOSTIC_METRICS`] is returned untouched, so
/// an already prefixed name like `power_avg` never becomes `power_power_avg`.
pub fn prefix_metric(metric: &str, quantity: Option<Quantity>) -> String {
    match quantity {
        Some(q) if QUANTITY_AGNOSTIC_METRICS.contains(&metric) => format!("{q}_{metric}"),
        _ => metric.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(infer_quantity("deep well pump pressure", None), Some(Quantity::Pressure));
        assert_eq!(infer_quantity("bypass flow", None), Some(Quantity::Flow));
        assert_eq!(infer_quantity("hydro plant power", None), Some(Quantity::Power));
        assert_eq!(infer_quantity("net meter energy", None), Some(Quantity::Energy));
        assert_eq!(infer_quantity("pulse #2", None), Some(Quantity::Pulse));
        assert_eq!(infer_quantity("sce main pulse #1", None), Some(Quantity::Pulse));
    }

    #[test]
    fn test_keyword_order_power_before_pulse() {
        assert_eq!(infer_quantity("sce main power pulse #1", Some("kWh")), Some(Quantity::Power));
    }

    #[test]
    fn test_keyword_beats_unit() {
        assert_eq!(infer_quantity("bypass flow", Some("psi")), Some(Quantity::Flow));
    }

    #[test]
    fn test_unit_fallback() {
        assert_eq!(infer_quantity("hydro plant", Some("kW")), Some(Quantity::Power));
        assert_eq!(infer_quantity("hydro plant", Some("KWH")), Some(Quantity::Energy));
        assert_eq!(infer_quantity("well", Some("psig")), Some(Quantity::Pressure));
        assert_eq!(infer_quantity("well", Some("gpm avg")), Some(Quantity::Flow));
    }

    #[test]
    fn test_unit_equality_is_exact() {
        // "kw" and "kwh" are equality checks, not containment
        assert_eq!(infer_quantity("hydro plant", Some("kW demand")), None);
    }

    #[test]
    fn test_nothing_inferred() {
        assert_eq!(infer_quantity("hydro plant", None), None);
        assert_eq!(infer_quantity("ambient temperature", Some("F")), None);
    }

    #[test]
    fn test_fallback_metric_names() {
        assert_eq!(fallback_metric(Some(Quantity::Energy)), "energy");
        assert_eq!(fallback_metric(Some(Quantity::Power)), "power");
        assert_eq!(fallback_metric(Some(Quantity::Flow)), "flow");
        assert_eq!(fallback_metric(Some(Quantity::Pressure)), "pressure");
        assert_eq!(fallback_metric(Some(Quantity::Pulse)), "pulse_total");
        assert_eq!(fallback_metric(None), "value");
    }

    #[test]
    fn test_prefix_agnostic_metrics() {
        for metric in QUANTITY_AGNOSTIC_METRICS {
            assert_eq!(
                prefix_metric(metric, Some(Quantity::Flow)),
                format!("flow_{metric}")
            );
        }
    }

    #[test]
    fn test_prefix_never_doubles() {
        let once = prefix_metric("avg", Some(Quantity::Power));
        assert_eq!(once, "power_avg");
        assert_eq!(prefix_metric(&once, Some(Quantity::Power)), "power_avg");
    }

    #[test]
    fn test_prefix_skips_specific_metrics() {
        assert_eq!(prefix_metric("total", Some(Quantity::Energy)), "total");
        assert_eq!(prefix_metric("pulse_total", Some(Quantity::Pulse)), "pulse_total");
        assert_eq!(prefix_metric("avg", None), "avg");
    }
}
