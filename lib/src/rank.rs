use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use palette::{Hsl, IntoColor, RgbHue, Srgb};
use serde::{Deserialize, Serialize};


fn deserialize_hex_str<'de, D: serde::de::Deserializer<'de>>(
    deserializer: D,
) -> Result<Hsl, D::Error> {
    let hex = <&str>::deserialize(deserializer)?;

    Srgb::from_str(hex)
        .map_err(serde::de::Error::custom)
        .map(Srgb::<u8>::into_format)
        .map(Srgb::<f32>::into_color)
}

fn serialize_hex_str<S: serde::Serializer>(t: &Hsl, serializer: S) -> Result<S::Ok, S::Error> {
    let (r, g, b) = hsl_to_rgb8(*t);
    let hex = format!("#{:02x}{:02x}{:02x}", r, g, b);

    serializer.serialize_str(&hex)
}

pub fn hsl_to_rgb8(hsl: Hsl) -> (u8, u8, u8) {
    let rgb: Srgb<f32> = hsl.into_color();
    let rgb: Srgb<u8> = rgb.into_format();

    rgb.into_components()
}

/// Colors used to draw a rank badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankStyle {
    pub label: Cow<'static, str>,
    #[serde(
        serialize_with = "serialize_hex_str",
        deserialize_with = "deserialize_hex_str"
    )]
    pub fill: Hsl,
    #[serde(
        serialize_with = "serialize_hex_str",
        deserialize_with = "deserialize_hex_str"
    )]
    pub glow: Hsl,
}

impl RankStyle {
    pub fn fill_rgb(&self) -> (u8, u8, u8) {
        hsl_to_rgb8(self.fill)
    }

    pub fn glow_rgb(&self) -> (u8, u8, u8) {
        hsl_to_rgb8(self.glow)
    }
}

/// Letter grade of a score, as reported by the osu! API.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Grade {
    /// Silver SS (HD/FL)
    #[serde(alias = "SSH")]
    XH = 0,
    #[serde(alias = "SS")]
    X = 1,
    SH = 2,
    S = 3,
    A = 4,
    B = 5,
    C = 6,
    #[default]
    D = 7,
    F = 8,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::XH | Grade::X => "SS",
            Grade::SH | Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn is_silver(self) -> bool {
        matches!(self, Grade::XH | Grade::SH)
    }
}

impl FromStr for Grade {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_uppercase()))
            .map_err(Into::into)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Deref for Grade {
    type Target = RankStyle;

    fn deref(&self) -> &Self::Target {
        &DEFAULT_RANK_STYLES[*self as usize]
    }
}

pub const DEFAULT_RANK_STYLES: &[RankStyle] = &[
    RankStyle {
        label: Cow::Borrowed("SS"),
        // #e6eef5
        fill: Hsl::new_srgb_const(RgbHue::new(207.69231), 0.4193549, 0.9294118),
        // #9fc4e8
        glow: Hsl::new_srgb_const(RgbHue::new(209.58904), 0.6186441, 0.7666667),
    },
    RankStyle {
        label: Cow::Borrowed("SS"),
        // #ffd95c
        fill: Hsl::new_srgb_const(RgbHue::new(45.644173), 1.0, 0.68039215),
        // #ffb21f
        glow: Hsl::new_srgb_const(RgbHue::new(39.107143), 1.0, 0.56078434),
    },
    RankStyle {
        label: Cow::Borrowed("S"),
        // #dde6ee
        fill: Hsl::new_srgb_const(RgbHue::new(208.23529), 0.33333325, 0.9),
        // #8fb3d6
        glow: Hsl::new_srgb_const(RgbHue::new(209.57747), 0.4610389, 0.6980392),
    },
    RankStyle {
        label: Cow::Borrowed("S"),
        // #ffcc22
        fill: Hsl::new_srgb_const(RgbHue::new(46.0274), 1.0, 0.56666666),
        // #ff9a1f
        glow: Hsl::new_srgb_const(RgbHue::new(33.482143), 1.0, 0.56078434),
    },
    RankStyle {
        label: Cow::Borrowed("A"),
        // #88da20
        fill: Hsl::new_srgb_const(RgbHue::new(86.12903), 0.7459893, 0.4901961),
        // #4caf1a
        glow: Hsl::new_srgb_const(RgbHue::new(99.86577), 0.7413793, 0.39411765),
    },
    RankStyle {
        label: Cow::Borrowed("B"),
        // #eebb22
        fill: Hsl::new_srgb_const(RgbHue::new(45.0), 0.86440676, 0.5333333),
        // #3f8fe8
        glow: Hsl::new_srgb_const(RgbHue::new(211.47929), 0.7860465, 0.57843137),
    },
    RankStyle {
        label: Cow::Borrowed("C"),
        // #ff8e5d
        fill: Hsl::new_srgb_const(RgbHue::new(18.148148), 1.0, 0.68235296),
        // #c44fd9
        glow: Hsl::new_srgb_const(RgbHue::new(290.86957), 0.6448598, 0.58039216),
    },
    RankStyle {
        label: Cow::Borrowed("D"),
        // #ff5a5a
        fill: Hsl::new_srgb_const(RgbHue::new(0.0), 1.0, 0.6764706),
        // #d12e2e
        glow: Hsl::new_srgb_const(RgbHue::new(0.0), 0.6422019, 0.5),
    },
    RankStyle {
        label: Cow::Borrowed("F"),
        // #9a9a9a
        fill: Hsl::new_srgb_const(RgbHue::new(0.0), 0.0, 0.6039216),
        // #555555
        glow: Hsl::new_srgb_const(RgbHue::new(0.0), 0.0, 0.33333334),
    },
];
