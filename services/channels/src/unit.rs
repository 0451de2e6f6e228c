//! Unit Extractor: splits a trailing `(unit)` group off a header.

use regex::Regex;
use std::sync::LazyLock;

/// Last parenthesized group at the very end of the header, no nesting inside.
static TRAILING_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)\s*$").expect("valid unit pattern"));

/// Unit phrases rewritten to their short form, applied in order.
pub const UNIT_PHRASES: &[(&str, &str)] = &[("per minute", "/min"), ("per hour", "/hr")];

/// Splits `header` into `(unit, base)`.
///
/// Only a group anchored at the end counts; `"Flow (North) Total"` keeps its
/// parentheses in the base and has no unit. When nothing matches the header
/// comes back unchanged.
pub fn extract_unit(header: &str) -> (Option<String>, &str) {
    let Some(caps) = TRAILING_UNIT.captures(header) else {
        return (None, header);
    };
    let start = caps.get(0).map_or(header.len(), |m| m.start());
    let unit = caps.get(1).map(|m| m.as_str().trim().to_string());
    (unit, header[..start].trim())
}

/// Rewrites known time-rate phrases (`"gallons per minute"` -> `"gallons /min"`).
pub fn normalize_unit(unit: &str) -> String {
    UNIT_PHRASES
        .iter()
        .fold(unit.to_string(), |acc, (phrase, short)| acc.replace(phrase, short))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_group_is_unit() {
        assert_eq!(
            extract_unit("SCE Main Power Pulse #1 (kWh)"),
            (Some("kWh".to_string()), "SCE Main Power Pulse #1")
        );
    }

    #[test]
    fn test_unit_contents_trimmed() {
        assert_eq!(
            extract_unit("Booster Pump Flow Rate ( gpm )"),
            (Some("gpm".to_string()), "Booster Pump Flow Rate")
        );
    }

    #[test]
    fn test_trailing_whitespace_after_group() {
        assert_eq!(
            extract_unit("Solar Power (kW)   "),
            (Some("kW".to_string()), "Solar Power")
        );
    }

    #[test]
    fn test_only_last_group_counts() {
        assert_eq!(
            extract_unit("Pump (North) Pressure (psi)"),
            (Some("psi".to_string()), "Pump (North) Pressure")
        );
    }

    #[test]
    fn test_middle_group_is_not_a_unit() {
        assert_eq!(
            extract_unit("Reservoir By-Pass (North) Flow"),
            (None, "Reservoir By-Pass (North) Flow")
        );
    }

    #[test]
    fn test_nested_group_is_not_a_unit() {
        assert_eq!(extract_unit("Pump (Stage (1))"), (None, "Pump (Stage (1))"));
    }

    #[test]
    fn test_empty_group() {
        assert_eq!(extract_unit("Level ()"), (Some(String::new()), "Level"));
    }

    #[test]
    fn test_no_group() {
        assert_eq!(extract_unit("Hydro Plant Ave kW"), (None, "Hydro Plant Ave kW"));
    }

    #[test]
    fn test_unit_phrases() {
        assert_eq!(normalize_unit("gallons per minute"), "gallons /min");
        assert_eq!(normalize_unit("kWh per hour"), "kWh /hr");
        assert_eq!(normalize_unit("psi"), "psi");
    }
}
