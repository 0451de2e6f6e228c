//! Metric Resolver: trailing keyword -> canonical metric name.

use crate::normalize::collapse_whitespace;
use crate::rules::first_match;
use regex::Regex;
use std::sync::LazyLock;

/// Suffix patterns in precedence order. Multi-word phrases sit above the
/// single words they contain so `"Average Rate"` resolves to `avg_rate`, not
/// `rate`.
pub const METRIC_PATTERNS: &[(&str, &str)] = &[
    (r"\bave\s*rate\b$", "avg_rate"),
    (r"\bavg\s*rate\b$", "avg_rate"),
    (r"\baverage\s*rate\b$", "avg_rate"),
    (r"\brate\b$", "rate"),
    (r"\binstantaneous\b$", "instantaneous"),
    (r"\bdemand\b$", "demand"),
    (r"\bave\b$", "avg"),
    (r"\bavg\b$", "avg"),
    (r"\baverage\b$", "avg"),
    (r"\bmin\b$", "min"),
    (r"\bmax\b$", "max"),
    (r"\btotal\b$", "total"),
    (r"\bcount\b$", "count"),
    (r"\bvalue\b$", "value"),
    (r"\blevel\b$", "level"),
    (r"\bstatus\b$", "status"),
];

struct MetricRule {
    pattern: Regex,
    metric: &'static str,
}

static METRIC_RULES: LazyLock<Vec<MetricRule>> = LazyLock::new(|| {
    METRIC_PATTERNS
        .iter()
        .map(|&(pattern, metric)| MetricRule {
            pattern: Regex::new(&format!("(?i){pattern}")).expect("valid metric pattern"),
            metric,
        })
        .collect()
});

/// A resolved metric suffix and the header text left once it is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSuffix {
    pub metric: &'static str,
    pub remainder: String,
}

/// Matches `base` against [`METRIC_PATTERNS`], first rule wins.
///
/// Returns `None` when no suffix matches; the caller then falls back to the
/// quantity-derived metric name and keeps `base` as is.
pub fn resolve_metric(base: &str) -> Option<MetricSuffix> {
    first_match(&METRIC_RULES, |rule| {
        rule.pattern.find(base).map(|m| MetricSuffix {
            metric: rule.metric,
            remainder: collapse_whitespace(&base[..m.start()]),
        })
    })
}
