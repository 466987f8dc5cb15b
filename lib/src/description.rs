use lazy_static::lazy_static;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::mods::Mods;

lazy_static! {
    static ref ACCURACY: Regex = Regex::new(r"(\d{1,3}(?:[.,]\d+)?)\s*%").unwrap();
    static ref STARS: Regex =
        Regex::new(r"(?i)(\d{1,2}(?:[.,]\d+)?)\s*(?:★|☆|\*|stars?\b)").unwrap();
    static ref PP: Regex = Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*pp\b").unwrap();
    static ref COMBO: Regex = Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*x").unwrap();
    static ref MISSES: Regex =
        Regex::new(r"(?i)\b(\d+)\s*(?:x\s*)?(?:miss(?:es)?|❌)").unwrap();
    static ref FULL_COMBO: Regex = Regex::new(r"(?:^|[\s(\[|])(?:FC|PFC|SS)(?:$|[\s)\]|,])").unwrap();
    static ref MODS_LABEL: Regex = Regex::new(r"(?i)mods?\s*[:=]\s*([A-Za-z, +]+)").unwrap();
    static ref MODS_PLUS: Regex = Regex::new(r"(?:^|\s)\+([A-Z0-9]{2}(?:[A-Z0-9]{2})*)\b").unwrap();
}

/// Play details recovered from a free-text render description or title.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayDescription {
    pub accuracy: Option<f64>,
    pub stars: Option<f64>,
    pub pp: Option<f64>,
    pub combo: Option<u32>,
    pub misses: Option<u32>,
    pub mods: Option<Mods>,
}

fn parse_decimal(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}

/// First `1234x` that is neither part of a word nor a miss count (`2x miss`).
fn parse_combo(text: &str) -> Option<u32> {
    COMBO.captures_iter(text).find_map(|c| {
        let tail = &text[c.get(0)?.end()..];

        let delimited = tail
            .chars()
            .next()
            .is_none_or(|ch| ch.is_whitespace() || matches!(ch, ',' | '/' | ')' | '|'));
        let rest = tail.trim_start();
        let is_miss = rest.starts_with('❌') || rest.get(..4).is_some_and(|w| w.eq_ignore_ascii_case("miss"));

        if !delimited || is_miss {
            return None;
        }

        c[1].replace(',', "").parse().ok()
    })
}

impl PlayDescription {
    pub fn parse(text: &str) -> Self {
        let accuracy = ACCURACY
            .captures(text)
            .and_then(|c| parse_decimal(&c[1]))
            .filter(|acc| (0.0..=100.0).contains(acc));

        let stars = STARS.captures(text).and_then(|c| parse_decimal(&c[1]));
        let pp = PP.captures(text).and_then(|c| parse_decimal(&c[1]));
        let combo = parse_combo(text);

        let misses = MISSES
            .captures(text)
            .and_then(|c| c[1].parse().ok())
            .or_else(|| FULL_COMBO.is_match(text).then_some(0));

        let mods = MODS_LABEL
            .captures(text)
            .or_else(|| MODS_PLUS.captures(text))
            .and_then(|c| c[1].trim().parse::<Mods>().ok());

        Self {
            accuracy,
            stars,
            pp,
            combo,
            misses,
            mods,
        }
    }

    /// Merges two descriptions, keeping values from `self` where present.
    pub fn or(self, other: PlayDescription) -> Self {
        Self {
            accuracy: self.accuracy.or(other.accuracy),
            stars: self.stars.or(other.stars),
            pp: self.pp.or(other.pp),
            combo: self.combo.or(other.combo),
            misses: self.misses.or(other.misses),
            mods: self.mods.or(other.mods),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_description() {
        let d = PlayDescription::parse(
            "Player: mrekk | Map: Some Song [Extra] 7.21★ | Accuracy: 98.52% | Mods: HDDT | 1234x | 2 misses | 812pp",
        );

        assert_eq!(d.accuracy, Some(98.52));
        assert_eq!(d.stars, Some(7.21));
        assert_eq!(d.pp, Some(812.0));
        assert_eq!(d.combo, Some(1234));
        assert_eq!(d.misses, Some(2));
        assert_eq!(d.mods, Some("HDDT".parse().unwrap()));
    }

    #[test]
    fn plus_mods_and_full_combo() {
        let d = PlayDescription::parse("Song Title +HDHR 99,12% FC 6.5*");

        assert_eq!(d.mods, Some("HDHR".parse().unwrap()));
        assert_eq!(d.accuracy, Some(99.12));
        assert_eq!(d.misses, Some(0));
        assert_eq!(d.stars, Some(6.5));
    }

    #[test]
    fn miss_count_is_not_combo() {
        let d = PlayDescription::parse("2x miss | 1234x | 98.50%");
        assert_eq!(d.combo, Some(1234));
        assert_eq!(d.misses, Some(2));

        let d = PlayDescription::parse("3xMiss 880x");
        assert_eq!(d.combo, Some(880));
        assert_eq!(d.misses, Some(3));

        let d = PlayDescription::parse("1 ❌ 512x/600x");
        assert_eq!(d.combo, Some(512));
        assert_eq!(d.misses, Some(1));
    }

    #[test]
    fn combo_with_thousands_separator() {
        let d = PlayDescription::parse("+HDDT 98.50% 1,234x");
        assert_eq!(d.combo, Some(1234));
        assert_eq!(d.accuracy, Some(98.5));

        // a bare `x` inside a word is not a combo
        assert_eq!(PlayDescription::parse("120xyz").combo, None);
    }

    #[test]
    fn empty_description() {
        assert_eq!(PlayDescription::parse(""), PlayDescription::default());
        assert_eq!(PlayDescription::parse("just a cool play"), PlayDescription::default());
    }

    #[test]
    fn merge_prefers_self() {
        let a = PlayDescription {
            accuracy: Some(97.0),
            ..Default::default()
        };
        let b = PlayDescription {
            accuracy: Some(90.0),
            pp: Some(300.0),
            ..Default::default()
        };

        let merged = a.or(b);
        assert_eq!(merged.accuracy, Some(97.0));
        assert_eq!(merged.pp, Some(300.0));
    }
}
