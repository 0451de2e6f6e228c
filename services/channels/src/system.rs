//! System Classifier: base text -> canonical source system.

use crate::rules::first_substring;
use serde::Serialize;
use std::fmt;

/// Canonical source systems. Every header resolves to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    WymanCreek,
    Bypass,
    DeepWellPump,
    BoosterPump,
    Grid,
    Hydro,
    Solar,
    Sca,
    Unknown,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 9] = [
        SourceSystem::WymanCreek,
        SourceSystem::Bypass,
        SourceSystem::DeepWellPump,
        SourceSystem::BoosterPump,
        SourceSystem::Grid,
        SourceSystem::Hydro,
        SourceSystem::Solar,
        SourceSystem::Sca,
        SourceSystem::Unknown,
    ];

    /// Tag stored in the `source` column.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceSystem::WymanCreek => "wyman_creek",
            SourceSystem::Bypass => "bypass",
            SourceSystem::DeepWellPump => "deep_well_pump",
            SourceSystem::BoosterPump => "booster_pump",
            SourceSystem::Grid => "grid",
            SourceSystem::Hydro => "hydro",
            SourceSystem::Solar => "solar",
            SourceSystem::Sca => "sca",
            SourceSystem::Unknown => "unknown",
        }
    }

    /// Inverse of [`SourceSystem::as_str`].
    pub fn from_tag(tag: &str) -> Option<SourceSystem> {
        Self::ALL.into_iter().find(|system| system.as_str() == tag)
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substring -> system, multi-word entries ahead of the single words they
/// overlap with. `"sca"` also hits inside words like `"scada"`.
pub const SYSTEM_RULES: &[(&str, SourceSystem)] = &[
    ("wyman creek", SourceSystem::WymanCreek),
    ("reservoir by-pass", SourceSystem::Bypass),
    ("bypass", SourceSystem::Bypass),
    ("deep well pump", SourceSystem::DeepWellPump),
    ("booster pump", SourceSystem::BoosterPump),
    ("sce", SourceSystem::Grid),
    ("net meter", SourceSystem::Grid),
    ("hydro", SourceSystem::Hydro),
    ("plant", SourceSystem::Hydro),
    ("solar", SourceSystem::Solar),
    ("sca", SourceSystem::Sca),
];

/// Classifies lower-cased `text`; anything unmatched is [`SourceSystem::Unknown`].
pub fn classify(text: &str) -> SourceSystem {
    first_substring(SYSTEM_RULES, &text.to_lowercase()).unwrap_or(SourceSystem::Unknown)
}
