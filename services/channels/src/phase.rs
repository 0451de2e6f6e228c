//! Phase Extractor: electrical phase or aggregate tag inside the base text.

use crate::rules::first_substring;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    A,
    B,
    C,
    Sum,
    Avg,
    Ab,
    Bc,
    Ac,
}

impl Phase {
    /// Suffix appended to the metric name.
    pub fn tag(self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::Sum => "sum",
            Phase::Avg => "avg",
            Phase::Ab => "AB",
            Phase::Bc => "BC",
            Phase::Ac => "AC",
        }
    }
}

/// Checked in table order, not text order. The single-letter keys come first,
/// so `" a-b"` is shadowed by `" a"`; this ordering is part of the stored
/// vocabulary and must not be reshuffled.
pub const PHASE_RULES: &[(&str, Phase)] = &[
    (" a", Phase::A),
    (" b", Phase::B),
    (" c", Phase::C),
    (" sum", Phase::Sum),
    (" total", Phase::Sum),
    (" ave", Phase::Avg),
    (" average", Phase::Avg),
    (" a-b", Phase::Ab),
    (" b-c", Phase::Bc),
    (" a-c", Phase::Ac),
];

/// First phase key occurring in the lower-cased `text`. Substring match.
pub fn extract_phase(text: &str) -> Option<Phase> {
    first_substring(PHASE_RULES, &text.to_lowercase())
}

/// `metric` with `_{tag}` appended when a phase was found.
pub fn append_phase(metric: String, phase: Option<Phase>) -> String {
    match phase {
        Some(phase) => format!("{metric}_{}", phase.tag()),
        None => metric,
    }
}
