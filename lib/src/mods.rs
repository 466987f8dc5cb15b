use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

/// Scoring modifiers in the osu! stable bit layout.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mods(u32);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const NO_FAIL: Mods = Mods(1 << 0);
    pub const EASY: Mods = Mods(1 << 1);
    pub const TOUCH_DEVICE: Mods = Mods(1 << 2);
    pub const HIDDEN: Mods = Mods(1 << 3);
    pub const HARD_ROCK: Mods = Mods(1 << 4);
    pub const SUDDEN_DEATH: Mods = Mods(1 << 5);
    pub const DOUBLE_TIME: Mods = Mods(1 << 6);
    pub const RELAX: Mods = Mods(1 << 7);
    pub const HALF_TIME: Mods = Mods(1 << 8);
    pub const NIGHTCORE: Mods = Mods(1 << 9);
    pub const FLASHLIGHT: Mods = Mods(1 << 10);
    pub const AUTOPLAY: Mods = Mods(1 << 11);
    pub const SPUN_OUT: Mods = Mods(1 << 12);
    pub const AUTOPILOT: Mods = Mods(1 << 13);
    pub const PERFECT: Mods = Mods(1 << 14);
    pub const FADE_IN: Mods = Mods(1 << 20);
    pub const CINEMA: Mods = Mods(1 << 22);
    pub const SCORE_V2: Mods = Mods(1 << 29);
    pub const MIRROR: Mods = Mods(1 << 30);

    /// Display order, which is also the order acronyms are matched in.
    const ACRONYMS: &'static [(&'static str, Mods)] = &[
        ("EZ", Mods::EASY),
        ("NF", Mods::NO_FAIL),
        ("HT", Mods::HALF_TIME),
        ("HD", Mods::HIDDEN),
        ("FI", Mods::FADE_IN),
        ("HR", Mods::HARD_ROCK),
        ("DT", Mods::DOUBLE_TIME),
        ("NC", Mods::NIGHTCORE),
        ("SD", Mods::SUDDEN_DEATH),
        ("PF", Mods::PERFECT),
        ("FL", Mods::FLASHLIGHT),
        ("RX", Mods::RELAX),
        ("AP", Mods::AUTOPILOT),
        ("SO", Mods::SPUN_OUT),
        ("TD", Mods::TOUCH_DEVICE),
        ("MR", Mods::MIRROR),
        ("V2", Mods::SCORE_V2),
        ("AT", Mods::AUTOPLAY),
        ("CN", Mods::CINEMA),
    ];

    /// Lazer acronyms with no stable bit, ignored rather than rejected.
    const IGNORED: &'static [&'static str] = &["CL", "DA", "TC", "BL", "ST", "AC"];

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds mods from raw bits. NC always carries DT and PF always carries SD.
    pub const fn from_bits(bits: u32) -> Mods {
        let mut bits = bits;

        if bits & Mods::NIGHTCORE.0 != 0 {
            bits |= Mods::DOUBLE_TIME.0;
        }

        if bits & Mods::PERFECT.0 != 0 {
            bits |= Mods::SUDDEN_DEATH.0;
        }

        Mods(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Mods) {
        *self = Mods::from_bits(self.0 | other.0);
    }

    pub fn from_acronym(acronym: &str) -> Option<Mods> {
        Self::ACRONYMS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(acronym))
            .map(|(_, m)| Mods::from_bits(m.0))
    }

    /// Lenient conversion used for API payloads, skipping acronyms that
    /// have no stable equivalent.
    pub fn from_acronyms<'a>(acronyms: impl IntoIterator<Item = &'a str>) -> Mods {
        let mut mods = Mods::NONE;

        for acronym in acronyms {
            match Mods::from_acronym(acronym) {
                Some(m) => mods.insert(m),
                None => debug!("skipping mod without stable equivalent: {acronym}"),
            }
        }

        mods
    }

    /// Acronyms in display order, with DT folded into NC and SD into PF.
    pub fn acronyms(self) -> Vec<&'static str> {
        Self::ACRONYMS
            .iter()
            .filter(|(_, m)| self.contains(*m))
            .filter(|(name, _)| match *name {
                "DT" => !self.contains(Mods::NIGHTCORE),
                "SD" => !self.contains(Mods::PERFECT),
                _ => true,
            })
            .map(|(name, _)| *name)
            .collect()
    }
}

impl FromStr for Mods {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .chars()
            .filter(|c| !matches!(c, '+' | ',' | '|' | '/') && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if cleaned.is_empty() || cleaned == "NM" || cleaned == "NONE" || cleaned == "NOMOD" {
            return Ok(Mods::NONE);
        }

        if cleaned.len() % 2 != 0 || !cleaned.is_ascii() {
            return Err(crate::Error::UnknownMod(s.to_owned()));
        }

        let mut mods = Mods::NONE;

        for chunk in cleaned.as_bytes().chunks(2) {
            // chunks of an ascii string are always valid utf8
            let acronym = std::str::from_utf8(chunk).unwrap_or_default();

            if Self::IGNORED.contains(&acronym) {
                continue;
            }

            let m = Mods::from_acronym(acronym)
                .ok_or_else(|| crate::Error::UnknownMod(acronym.to_owned()))?;

            mods.insert(m);
        }

        Ok(mods)
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NM");
        }

        for acronym in self.acronyms() {
            f.write_str(acronym)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mods({self} = {})", self.0)
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Self) -> Self::Output {
        Mods::from_bits(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mods {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Which source the final mods were taken from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModsOrigin {
    Api,
    Render,
    Description,
    None,
}

/// Picks the mods to display out of the three sources that may report them.
///
/// A non-empty API score wins. An API score with no mods does not clear
/// what the render service reported. The description only fills in when
/// neither of the other two had anything.
pub fn reconcile(
    render: Option<Mods>,
    api: Option<Mods>,
    description: Option<Mods>,
) -> (Mods, ModsOrigin) {
    if let Some(api) = api.filter(|m| !m.is_empty()) {
        return (api, ModsOrigin::Api);
    }

    if let Some(render) = render.filter(|m| !m.is_empty()) {
        return (render, ModsOrigin::Render);
    }

    if let Some(description) = description.filter(|m| !m.is_empty()) {
        return (description, ModsOrigin::Description);
    }

    (Mods::NONE, ModsOrigin::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nightcore_implies_double_time() {
        let mods = Mods::from_bits(Mods::NIGHTCORE.bits());
        assert!(mods.contains(Mods::DOUBLE_TIME));
        assert_eq!(mods.bits(), 576);
        assert_eq!(mods.to_string(), "NC");

        let parsed: Mods = "HDNC".parse().unwrap();
        assert!(parsed.contains(Mods::DOUBLE_TIME | Mods::HIDDEN));
        assert_eq!(parsed.to_string(), "HDNC");
    }

    #[test]
    fn perfect_implies_sudden_death() {
        let mods: Mods = "PF".parse().unwrap();
        assert_eq!(mods.bits(), 16416);
        assert_eq!(mods.to_string(), "PF");
    }

    #[test]
    fn parses_separated_and_prefixed() {
        let expected = Mods::HIDDEN | Mods::DOUBLE_TIME;
        for input in ["HDDT", "+HDDT", "hd,dt", "HD DT", "+HD +DT", "DTHD"] {
            assert_eq!(input.parse::<Mods>().unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn nomod_spellings() {
        for input in ["", "NM", "None", "  "] {
            assert!(input.parse::<Mods>().unwrap().is_empty(), "{input}");
        }
        assert_eq!(Mods::NONE.to_string(), "NM");
    }

    #[test]
    fn rejects_unknown() {
        assert!("HDXX".parse::<Mods>().is_err());
        assert!("HDD".parse::<Mods>().is_err());
    }

    #[test]
    fn lazer_classic_is_ignored() {
        assert_eq!("HDCL".parse::<Mods>().unwrap(), Mods::HIDDEN);
        assert_eq!("CLDATCBLSTAC".parse::<Mods>().unwrap(), Mods::NONE);
        assert_eq!(Mods::from_acronyms(["HD", "CL", "DA"]), Mods::HIDDEN);
        // only the known lazer set is dropped
        assert!("HDCLXX".parse::<Mods>().is_err());
    }

    #[test]
    fn display_order_is_canonical() {
        let mods = Mods::HARD_ROCK | Mods::HIDDEN | Mods::DOUBLE_TIME;
        assert_eq!(mods.to_string(), "HDHRDT");
    }

    #[test]
    fn api_overrides_render() {
        let render = Some("HD".parse().unwrap());
        let api = Some("HDDT".parse().unwrap());
        let (mods, origin) = reconcile(render, api, None);
        assert_eq!(mods.to_string(), "HDDT");
        assert_eq!(origin, ModsOrigin::Api);
    }

    #[test]
    fn empty_api_keeps_render() {
        let render = Some("HR".parse().unwrap());
        let (mods, origin) = reconcile(render, Some(Mods::NONE), Some(Mods::EASY));
        assert_eq!(mods, Mods::HARD_ROCK);
        assert_eq!(origin, ModsOrigin::Render);
    }

    #[test]
    fn description_fills_gaps() {
        let (mods, origin) = reconcile(Some(Mods::NONE), None, Some(Mods::FLASHLIGHT));
        assert_eq!(mods, Mods::FLASHLIGHT);
        assert_eq!(origin, ModsOrigin::Description);

        let (mods, origin) = reconcile(None, None, None);
        assert!(mods.is_empty());
        assert_eq!(origin, ModsOrigin::None);
    }
}
