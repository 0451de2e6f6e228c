//! Text Normalizer: whitespace, case and fixed spelling corrections.

/// Misspellings seen in exported headers, replaced in this order as plain
/// substrings (no word boundaries).
pub const CORRECTIONS: &[(&str, &str)] = &[
    ("pwer", "power"),
    ("curent", "current"),
    ("voltge", "voltage"),
    ("frequncy", "frequency"),
    ("enrgy", "energy"),
    ("dmand", "demand"),
    ("aparant", "apparent"),
    ("reactve", "reactive"),
    ("postive", "positive"),
    ("negtive", "negative"),
    ("sumation", "sum"),
    ("avrage", "average"),
    ("instntaneous", "instantaneous"),
    ("facotr", "factor"),
];

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cases, collapses whitespace and applies [`CORRECTIONS`].
///
/// The result is the text every later stage (quantity, phase, system) reads.
pub fn normalize_base(text: &str) -> String {
    CORRECTIONS
        .iter()
        .fold(collapse_whitespace(&text.to_lowercase()), |acc, (wrong, right)| {
            acc.replace(wrong, right)
        })
}

/// Upper-cases every letter that does not follow another letter.
///
/// `"reservoir by-pass #2"` -> `"Reservoir By-Pass #2"`. Only used for display
/// labels; nothing downstream stores it.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
