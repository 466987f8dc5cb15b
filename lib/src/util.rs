/// Default tolerance, in stars, for the nearest star-rating fallback.
pub const STAR_TOLERANCE: f64 = 0.1;

/// Relative tolerance between achieved and full-combo PP for a play to count as a true FC.
pub const FC_PP_TOLERANCE: f64 = 0.05;

/// Rank shown when no score could be matched.
pub const DEFAULT_RANK: &str = "D";

/// Trims, lowercases and collapses inner whitespace so difficulty names
/// from different sources compare equal.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.2}%", accuracy)
}

pub fn format_stars(stars: f64) -> String {
    format!("{:.2}★", stars)
}

pub fn format_pp(pp: f64) -> String {
    format!("{}pp", pp.round() as i64)
}
